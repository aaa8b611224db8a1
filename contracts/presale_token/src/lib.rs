#![cfg_attr(not(feature = "std"), no_std, no_main)]

/// # Presale Token
///
/// Plain PSP22-style fungible token. The presale harness deploys it twice:
/// once as the project token sold in the presale (reward asset) and once as
/// the stablecoin buyers pay with (payment asset).
///
/// The presale engine only relies on `balance_of`, `transfer` and
/// `transfer_from`; buyers call `approve` before depositing.
pub use self::presale_token::{Error as TokenError, PresaleToken};

#[ink::contract]
mod presale_token {
    use ink::storage::Mapping;

    #[ink(storage)]
    #[derive(Default)]
    pub struct PresaleToken {
        balances: Mapping<AccountId, Balance>,
        allowances: Mapping<(AccountId, AccountId), Balance>,
        total_supply: Balance,
    }

    #[ink(event)]
    pub struct Transfer {
        #[ink(topic)]
        from: Option<AccountId>,
        #[ink(topic)]
        to: Option<AccountId>,
        value: Balance,
    }

    #[ink(event)]
    pub struct Approval {
        #[ink(topic)]
        owner: AccountId,
        #[ink(topic)]
        spender: AccountId,
        value: Balance,
    }

    #[derive(Debug, PartialEq, Eq, Clone, Copy, scale::Encode, scale::Decode)]
    #[cfg_attr(feature = "std", derive(scale_info::TypeInfo))]
    pub enum Error {
        InsufficientBalance,
        InsufficientAllowance,
        ZeroTransfer,
        Overflow,
    }

    pub type Result<T> = core::result::Result<T, Error>;

    impl PresaleToken {
        /// Mints the whole supply to the deployer.
        #[ink(constructor)]
        pub fn new(initial_supply: Balance) -> Self {
            let caller = Self::env().caller();
            let mut balances = Mapping::default();
            balances.insert(caller, &initial_supply);

            Self::env().emit_event(Transfer {
                from: None,
                to: Some(caller),
                value: initial_supply,
            });

            Self {
                balances,
                allowances: Mapping::default(),
                total_supply: initial_supply,
            }
        }

        #[ink(message)]
        pub fn total_supply(&self) -> Balance {
            self.total_supply
        }

        #[ink(message)]
        pub fn balance_of(&self, owner: AccountId) -> Balance {
            self.balances.get(owner).unwrap_or(0)
        }

        #[ink(message)]
        pub fn allowance(&self, owner: AccountId, spender: AccountId) -> Balance {
            self.allowances.get((owner, spender)).unwrap_or(0)
        }

        /// Sets (not increases) the amount `spender` may move out of the caller's account.
        #[ink(message)]
        pub fn approve(&mut self, spender: AccountId, value: Balance) -> Result<()> {
            let owner = self.env().caller();
            self.allowances.insert((owner, spender), &value);
            self.env().emit_event(Approval { owner, spender, value });
            Ok(())
        }

        #[ink(message)]
        pub fn transfer(&mut self, to: AccountId, value: Balance) -> Result<()> {
            let from = self.env().caller();
            self.process_transfer(from, to, value)
        }

        /// Moves `value` from `from` to `to` using the caller's allowance.
        /// The allowance is only consumed when the transfer itself succeeds.
        #[ink(message)]
        pub fn transfer_from(&mut self, from: AccountId, to: AccountId, value: Balance) -> Result<()> {
            let caller = self.env().caller();
            let allowance = self.allowance(from, caller);

            if allowance < value {
                return Err(Error::InsufficientAllowance);
            }

            self.process_transfer(from, to, value)?;
            self.allowances.insert((from, caller), &(allowance - value));
            Ok(())
        }

        fn process_transfer(&mut self, from: AccountId, to: AccountId, value: Balance) -> Result<()> {
            if value == 0 {
                return Err(Error::ZeroTransfer);
            }

            let from_bal = self.balance_of(from);
            if from_bal < value {
                return Err(Error::InsufficientBalance);
            }

            self.balances.insert(from, &(from_bal - value));
            let to_bal = self.balance_of(to);
            let new_to_bal = to_bal.checked_add(value).ok_or(Error::Overflow)?;
            self.balances.insert(to, &new_to_bal);

            self.env().emit_event(Transfer { from: Some(from), to: Some(to), value });
            Ok(())
        }
    }

    // =========================================================================
    // UNIT TESTS
    // =========================================================================

}
