//! Asset movements on behalf of the engine.
//!
//! The engine never touches balances directly: every debit or credit of the
//! payment or reward asset goes through [`AssetLedger`]. On-chain this is
//! [`Psp22Ledger`], which forwards to the two token contracts.

use ink::env::call::{build_call, ExecutionInput, Selector};
use ink::env::DefaultEnvironment;
use ink::primitives::AccountId;
use presale_token::TokenError;

use crate::errors::{Error, Result};
use crate::Balance;

/// The two fungible assets custodied by the engine.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Copy, scale::Encode, scale::Decode)]
#[cfg_attr(feature = "std", derive(scale_info::TypeInfo))]
pub enum Asset {
    /// Stablecoin buyers pay with; also funds affiliate commissions.
    Payment,
    /// Project token released through vesting.
    Reward,
}

pub trait AssetLedger {
    fn balance_of(&self, asset: Asset, owner: AccountId) -> Result<Balance>;

    /// Sends `amount` out of the engine's own account.
    fn transfer(&mut self, asset: Asset, to: AccountId, amount: Balance) -> Result<()>;

    /// Pulls `amount` from `from` using the allowance granted to the engine.
    fn transfer_from(
        &mut self,
        asset: Asset,
        from: AccountId,
        to: AccountId,
        amount: Balance,
    ) -> Result<()>;
}

/// Cross-contract ledger backed by two deployed token contracts.
pub struct Psp22Ledger {
    payment_token: AccountId,
    reward_token: AccountId,
}

impl Psp22Ledger {
    pub fn new(payment_token: AccountId, reward_token: AccountId) -> Self {
        Self { payment_token, reward_token }
    }

    fn token(&self, asset: Asset) -> AccountId {
        match asset {
            Asset::Payment => self.payment_token,
            Asset::Reward => self.reward_token,
        }
    }

    fn invoke_transfer(&self, token: AccountId, input: ExecutionInput<impl scale::Encode>) -> Result<()> {
        let result = build_call::<DefaultEnvironment>()
            .call(token)
            .exec_input(input)
            .returns::<core::result::Result<(), TokenError>>()
            .try_invoke();

        match result {
            Ok(Ok(Ok(()))) => Ok(()),
            Ok(Ok(Err(err))) => Err(err.into()),
            _ => Err(Error::TransferFailed),
        }
    }
}

impl AssetLedger for Psp22Ledger {
    fn balance_of(&self, asset: Asset, owner: AccountId) -> Result<Balance> {
        let result = build_call::<DefaultEnvironment>()
            .call(self.token(asset))
            .exec_input(
                ExecutionInput::new(Selector::new(ink::selector_bytes!("balance_of")))
                    .push_arg(owner),
            )
            .returns::<Balance>()
            .try_invoke();

        match result {
            Ok(Ok(balance)) => Ok(balance),
            _ => Err(Error::TransferFailed),
        }
    }

    fn transfer(&mut self, asset: Asset, to: AccountId, amount: Balance) -> Result<()> {
        self.invoke_transfer(
            self.token(asset),
            ExecutionInput::new(Selector::new(ink::selector_bytes!("transfer")))
                .push_arg(to)
                .push_arg(amount),
        )
    }

    fn transfer_from(
        &mut self,
        asset: Asset,
        from: AccountId,
        to: AccountId,
        amount: Balance,
    ) -> Result<()> {
        self.invoke_transfer(
            self.token(asset),
            ExecutionInput::new(Selector::new(ink::selector_bytes!("transfer_from")))
                .push_arg(from)
                .push_arg(to)
                .push_arg(amount),
        )
    }
}

/// In-memory ledger for unit tests. Cross-contract calls do not run in the
/// off-chain test environment.
#[cfg(test)]
pub(crate) mod mock {
    use super::*;
    use ink::prelude::collections::BTreeMap;

    pub struct MockLedger {
        engine: AccountId,
        balances: BTreeMap<(Asset, AccountId), Balance>,
        allowances: BTreeMap<(Asset, AccountId), Balance>,
    }

    impl MockLedger {
        pub fn new(engine: AccountId) -> Self {
            Self {
                engine,
                balances: BTreeMap::new(),
                allowances: BTreeMap::new(),
            }
        }

        pub fn mint(&mut self, asset: Asset, owner: AccountId, amount: Balance) {
            *self.balances.entry((asset, owner)).or_insert(0) += amount;
        }

        /// Allowance granted by `owner` to the engine.
        pub fn approve(&mut self, asset: Asset, owner: AccountId, amount: Balance) {
            self.allowances.insert((asset, owner), amount);
        }

        pub fn balance(&self, asset: Asset, owner: AccountId) -> Balance {
            self.balances.get(&(asset, owner)).copied().unwrap_or(0)
        }

        fn move_balance(&mut self, asset: Asset, from: AccountId, to: AccountId, amount: Balance) -> Result<()> {
            let from_bal = self.balance(asset, from);
            if from_bal < amount {
                return Err(Error::InsufficientBalance);
            }
            self.balances.insert((asset, from), from_bal - amount);
            *self.balances.entry((asset, to)).or_insert(0) += amount;
            Ok(())
        }
    }

    impl AssetLedger for MockLedger {
        fn balance_of(&self, asset: Asset, owner: AccountId) -> Result<Balance> {
            Ok(self.balance(asset, owner))
        }

        fn transfer(&mut self, asset: Asset, to: AccountId, amount: Balance) -> Result<()> {
            let engine = self.engine;
            self.move_balance(asset, engine, to, amount)
        }

        fn transfer_from(
            &mut self,
            asset: Asset,
            from: AccountId,
            to: AccountId,
            amount: Balance,
        ) -> Result<()> {
            let allowance = self.allowances.get(&(asset, from)).copied().unwrap_or(0);
            if allowance < amount {
                return Err(Error::InsufficientAllowance);
            }
            self.move_balance(asset, from, to, amount)?;
            self.allowances.insert((asset, from), allowance - amount);
            Ok(())
        }
    }

    #[test]
    fn transfer_from_requires_allowance() {
        let engine = AccountId::from([0xEE; 32]);
        let buyer = AccountId::from([0x01; 32]);
        let mut ledger = MockLedger::new(engine);
        ledger.mint(Asset::Payment, buyer, 100);

        assert_eq!(
            ledger.transfer_from(Asset::Payment, buyer, engine, 50),
            Err(Error::InsufficientAllowance)
        );

        ledger.approve(Asset::Payment, buyer, 80);
        ledger.transfer_from(Asset::Payment, buyer, engine, 50).unwrap();
        assert_eq!(ledger.balance(Asset::Payment, engine), 50);
        assert_eq!(
            ledger.transfer_from(Asset::Payment, buyer, engine, 40),
            Err(Error::InsufficientAllowance)
        );
    }

    #[test]
    fn assets_are_kept_apart() {
        let engine = AccountId::from([0xEE; 32]);
        let mut ledger = MockLedger::new(engine);
        ledger.mint(Asset::Reward, engine, 10);
        assert_eq!(ledger.balance(Asset::Payment, engine), 0);
        assert_eq!(
            ledger.transfer(Asset::Payment, engine, 1),
            Err(Error::InsufficientBalance)
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_errors_map_onto_engine_errors() {
        assert_eq!(Error::from(TokenError::InsufficientBalance), Error::InsufficientBalance);
        assert_eq!(Error::from(TokenError::InsufficientAllowance), Error::InsufficientAllowance);
        assert_eq!(Error::from(TokenError::ZeroTransfer), Error::TransferFailed);
    }

    #[test]
    fn psp22_ledger_routes_assets_to_their_tokens() {
        let payment = AccountId::from([0x01; 32]);
        let reward = AccountId::from([0x02; 32]);
        let ledger = Psp22Ledger::new(payment, reward);
        assert_eq!(ledger.token(Asset::Payment), payment);
        assert_eq!(ledger.token(Asset::Reward), reward);
    }
}
