#![cfg_attr(not(feature = "std"), no_std, no_main)]

pub mod errors;
pub mod ledger;
pub mod roles;
pub mod round;

pub type Balance = u128;
pub type Timestamp = u64;

pub mod constants {
    use super::{Balance, Timestamp};

    /// Fixed-point scale shared by `price` and `affiliate_fee`.
    pub const DENOMINATOR: Balance = 10_000;

    /// Length of one vesting unlock: 30 days in milliseconds.
    pub const VESTING_UNIT: Timestamp = 30 * 24 * 60 * 60 * 1_000;
}

pub use self::errors::{Error, Result};
pub use self::ledger::{Asset, AssetLedger, Psp22Ledger};
pub use self::presale::{Presale, PresaleRef};
pub use self::roles::Role;
pub use self::round::{Round, RoundTotals};

/// # Presale Engine
///
/// **Role:** custodies the project token (reward asset), sells it in
/// time-boxed rounds against a stablecoin (payment asset), and releases what
/// each buyer bought through discrete vesting unlocks.
///
/// ```text
///   buyer ──approve──► [Payment Token]
///   buyer ──deposit──► [Presale] ──transfer_from──► [Payment Token]
///                          │ credits referrer commission
///   buyer ──claim────► [Presale] ──transfer───────► [Reward Token]
/// ```
///
/// **Access:** `DefaultAdmin` administers roles and wires the two tokens
/// once via `initialize`; `Owner` creates rounds and may rescue custodied
/// balances. The deployer holds both.
///
/// **Rescue is an override.** `rescue_funds` / `rescue_token` sweep the whole
/// balance, including payment asset owed to referrers and reward asset owed
/// to buyers. Buyer safety after a rescue is an operational guarantee of the
/// role holders, not something the engine enforces.
#[ink::contract]
mod presale {
    use crate::constants::*;
    use crate::errors::{Error, Result};
    use crate::ledger::{Asset, AssetLedger, Psp22Ledger};
    use crate::roles::Role;
    use crate::round::{Round, RoundTotals};
    use ink::storage::Mapping;

    // =========================================================================
    // STORAGE
    // =========================================================================

    #[ink(storage)]
    pub struct Presale {
        roles: Mapping<(Role, AccountId), bool>,

        reward_token: Option<AccountId>,
        payment_token: Option<AccountId>,

        // ── Round registry ────────────────────────────────────────────────
        rounds: Mapping<u32, Round>,
        round_count: u32,
        round_totals: Mapping<u32, RoundTotals>,

        // ── Per (round, buyer) accounting ─────────────────────────────────
        user_deposited: Mapping<(u32, AccountId), Balance>,
        user_claimed: Mapping<(u32, AccountId), Balance>,

        affiliate_balances: Mapping<AccountId, Balance>,

        /// Reward asset sold but not yet claimed, across all rounds.
        reward_outstanding: Balance,
    }

    // =========================================================================
    // EVENTS
    // =========================================================================

    #[ink(event)]
    pub struct Initialized {
        reward_token: AccountId,
        payment_token: AccountId,
    }

    #[ink(event)]
    pub struct RoundCreated {
        #[ink(topic)]
        index: u32,
        time_to_start: Timestamp,
        time_to_end: Timestamp,
        time_to_claim: Timestamp,
        price: Balance,
        vesting_duration: u32,
    }

    #[ink(event)]
    pub struct Deposited {
        #[ink(topic)]
        round: u32,
        #[ink(topic)]
        buyer: AccountId,
        amount: Balance,
        referrer: Option<AccountId>,
        commission: Balance,
    }

    #[ink(event)]
    pub struct Claimed {
        #[ink(topic)]
        round: u32,
        #[ink(topic)]
        buyer: AccountId,
        amount: Balance,
        total_claimed: Balance,
    }

    #[ink(event)]
    pub struct AffiliateRewardClaimed {
        #[ink(topic)]
        referrer: AccountId,
        amount: Balance,
    }

    #[ink(event)]
    pub struct FundsRescued {
        #[ink(topic)]
        asset: Asset,
        to: AccountId,
        amount: Balance,
    }

    #[ink(event)]
    pub struct RoleGranted {
        #[ink(topic)]
        role: Role,
        #[ink(topic)]
        account: AccountId,
        sender: AccountId,
    }

    #[ink(event)]
    pub struct RoleRevoked {
        #[ink(topic)]
        role: Role,
        #[ink(topic)]
        account: AccountId,
        sender: AccountId,
    }

    // =========================================================================
    // IMPLEMENTATION
    // =========================================================================

    impl Presale {
        #[ink(constructor)]
        pub fn new() -> Self {
            let caller = Self::env().caller();
            let mut contract = Self {
                roles: Mapping::default(),
                reward_token: None,
                payment_token: None,
                rounds: Mapping::default(),
                round_count: 0,
                round_totals: Mapping::default(),
                user_deposited: Mapping::default(),
                user_claimed: Mapping::default(),
                affiliate_balances: Mapping::default(),
                reward_outstanding: 0,
            };

            contract.store_role(Role::DefaultAdmin, caller, caller);
            contract.store_role(Role::Owner, caller, caller);
            contract
        }

        /// Wires the two asset ledgers. Callable once.
        #[ink(message)]
        pub fn initialize(&mut self, reward_token: AccountId, payment_token: AccountId) -> Result<()> {
            self.ensure_role(Role::DefaultAdmin)?;
            if self.reward_token.is_some() || self.payment_token.is_some() {
                return Err(Error::AlreadyInitialized);
            }

            self.reward_token = Some(reward_token);
            self.payment_token = Some(payment_token);

            self.env().emit_event(Initialized { reward_token, payment_token });
            Ok(())
        }

        // =====================================================================
        // ROUND REGISTRY
        // =====================================================================

        #[ink(message)]
        #[allow(clippy::too_many_arguments)]
        pub fn create_round(
            &mut self,
            time_to_start: Timestamp,
            time_to_end: Timestamp,
            time_to_claim: Timestamp,
            min_amount: Balance,
            price: Balance,
            affiliate_fee: Balance,
            vesting_duration: u32,
        ) -> Result<u32> {
            self.ensure_role(Role::Owner)?;

            let round = Round::new(
                time_to_start,
                time_to_end,
                time_to_claim,
                min_amount,
                price,
                affiliate_fee,
                vesting_duration,
            )?;

            let index = self.round_count;
            self.round_count = index.checked_add(1).ok_or(Error::Overflow)?;
            self.rounds.insert(index, &round);
            self.round_totals.insert(index, &RoundTotals::default());

            self.env().emit_event(RoundCreated {
                index,
                time_to_start,
                time_to_end,
                time_to_claim,
                price,
                vesting_duration,
            });

            Ok(index)
        }

        #[ink(message)]
        pub fn get_round(&self, index: u32) -> Result<Round> {
            self.rounds.get(index).ok_or(Error::NotFound)
        }

        /// Same as `get_round`; kept for callers that address rounds as stages.
        #[ink(message)]
        pub fn stages(&self, index: u32) -> Result<Round> {
            self.get_round(index)
        }

        #[ink(message)]
        pub fn round_count(&self) -> u32 {
            self.round_count
        }

        #[ink(message)]
        pub fn round_totals(&self, index: u32) -> Result<RoundTotals> {
            self.round_totals.get(index).ok_or(Error::NotFound)
        }

        // =====================================================================
        // DEPOSIT / CLAIM
        // =====================================================================

        /// Buys into `round` with `amount` of payment asset. The caller must
        /// have approved the engine on the payment token beforehand.
        /// A zero `referrer` means no referral.
        #[ink(message)]
        pub fn deposit(&mut self, round: u32, amount: Balance, referrer: AccountId) -> Result<()> {
            let mut ledger = self.ledger()?;
            self.deposit_with(&mut ledger, round, amount, referrer)
        }

        /// Releases the reward asset vested so far. Returns the amount sent.
        #[ink(message)]
        pub fn claim(&mut self, round: u32) -> Result<Balance> {
            let mut ledger = self.ledger()?;
            self.claim_with(&mut ledger, round)
        }

        #[ink(message)]
        pub fn claim_affiliate_reward(&mut self) -> Result<Balance> {
            let mut ledger = self.ledger()?;
            self.claim_affiliate_reward_with(&mut ledger)
        }

        pub(crate) fn deposit_with<L: AssetLedger>(
            &mut self,
            ledger: &mut L,
            index: u32,
            amount: Balance,
            referrer: AccountId,
        ) -> Result<()> {
            self.ensure_initialized()?;
            let caller = self.env().caller();
            let now = self.env().block_timestamp();
            let round = self.get_round(index)?;

            if !round.is_open(now) {
                return Err(Error::RoundClosed);
            }
            if amount == 0 || amount < round.min_amount {
                return Err(Error::BelowMinimum);
            }
            if referrer == caller {
                return Err(Error::InvalidReferrer);
            }
            let referrer = (referrer != AccountId::from([0u8; 32])).then_some(referrer);

            let previous = self.user_deposited(index, caller);
            let deposited = previous.checked_add(amount).ok_or(Error::Overflow)?;
            // Entitlement is floored on the running total, so only the delta is newly sold.
            let sold = round
                .entitlement(deposited)?
                .checked_sub(round.entitlement(previous)?)
                .ok_or(Error::Overflow)?;
            let commission = match referrer {
                Some(_) => round.commission(amount)?,
                None => 0,
            };

            let engine = self.env().account_id();
            let outstanding = self.reward_outstanding.checked_add(sold).ok_or(Error::Overflow)?;
            if ledger.balance_of(Asset::Reward, engine)? < outstanding {
                return Err(Error::InsufficientReserve);
            }

            let mut totals = self.round_totals(index)?;
            totals.deposited = totals.deposited.checked_add(amount).ok_or(Error::Overflow)?;
            totals.sold = totals.sold.checked_add(sold).ok_or(Error::Overflow)?;
            let affiliate_balance = match referrer {
                Some(account) => self
                    .affiliate_balance(account)
                    .checked_add(commission)
                    .ok_or(Error::Overflow)?,
                None => 0,
            };

            ledger.transfer_from(Asset::Payment, caller, engine, amount)?;

            self.user_deposited.insert((index, caller), &deposited);
            self.round_totals.insert(index, &totals);
            self.reward_outstanding = outstanding;
            if let Some(account) = referrer {
                self.affiliate_balances.insert(account, &affiliate_balance);
            }

            self.env().emit_event(Deposited {
                round: index,
                buyer: caller,
                amount,
                referrer,
                commission,
            });

            Ok(())
        }

        pub(crate) fn claim_with<L: AssetLedger>(&mut self, ledger: &mut L, index: u32) -> Result<Balance> {
            self.ensure_initialized()?;
            let caller = self.env().caller();
            let now = self.env().block_timestamp();
            let round = self.get_round(index)?;

            if !round.is_claimable(now) {
                return Err(Error::ClaimNotStarted);
            }

            let claimed = self.user_claimed(index, caller);
            let payable = self.vested_at(&round, index, caller, now)?.saturating_sub(claimed);
            if payable == 0 {
                return Err(Error::NothingToClaim);
            }

            let total_claimed = claimed.checked_add(payable).ok_or(Error::Overflow)?;
            let mut totals = self.round_totals(index)?;
            totals.claimed = totals.claimed.checked_add(payable).ok_or(Error::Overflow)?;
            let outstanding = self.reward_outstanding.checked_sub(payable).ok_or(Error::Overflow)?;

            ledger.transfer(Asset::Reward, caller, payable)?;

            self.user_claimed.insert((index, caller), &total_claimed);
            self.round_totals.insert(index, &totals);
            self.reward_outstanding = outstanding;

            self.env().emit_event(Claimed {
                round: index,
                buyer: caller,
                amount: payable,
                total_claimed,
            });

            Ok(payable)
        }

        pub(crate) fn claim_affiliate_reward_with<L: AssetLedger>(&mut self, ledger: &mut L) -> Result<Balance> {
            self.ensure_initialized()?;
            let caller = self.env().caller();

            let amount = self.affiliate_balance(caller);
            if amount == 0 {
                return Err(Error::NothingToClaim);
            }

            ledger.transfer(Asset::Payment, caller, amount)?;
            self.affiliate_balances.remove(caller);

            self.env().emit_event(AffiliateRewardClaimed { referrer: caller, amount });
            Ok(amount)
        }

        fn vested_at(&self, round: &Round, index: u32, account: AccountId, now: Timestamp) -> Result<Balance> {
            let entitlement = round.entitlement(self.user_deposited(index, account))?;
            round.releasable(entitlement, now)
        }

        // =====================================================================
        // TREASURY RESCUE
        // =====================================================================

        /// Sweeps the engine's whole payment-asset balance to the caller,
        /// including commissions not yet claimed by referrers.
        #[ink(message)]
        pub fn rescue_funds(&mut self) -> Result<Balance> {
            self.ensure_role(Role::Owner)?;
            let mut ledger = self.ledger()?;
            self.rescue_with(&mut ledger, Asset::Payment)
        }

        /// Sweeps the engine's whole reward-asset balance to the caller,
        /// including tokens still vesting for buyers.
        #[ink(message)]
        pub fn rescue_token(&mut self) -> Result<Balance> {
            self.ensure_role(Role::Owner)?;
            let mut ledger = self.ledger()?;
            self.rescue_with(&mut ledger, Asset::Reward)
        }

        pub(crate) fn rescue_with<L: AssetLedger>(&mut self, ledger: &mut L, asset: Asset) -> Result<Balance> {
            self.ensure_role(Role::Owner)?;
            self.ensure_initialized()?;
            let caller = self.env().caller();
            let engine = self.env().account_id();

            let amount = ledger.balance_of(asset, engine)?;
            if amount == 0 {
                return Ok(0);
            }

            ledger.transfer(asset, caller, amount)?;

            self.env().emit_event(FundsRescued { asset, to: caller, amount });
            Ok(amount)
        }

        // =====================================================================
        // ACCESS CONTROL
        // =====================================================================

        #[ink(message)]
        pub fn has_role(&self, role: Role, account: AccountId) -> bool {
            self.roles.get((role, account)).unwrap_or(false)
        }

        #[ink(message)]
        pub fn grant_role(&mut self, role: Role, account: AccountId) -> Result<()> {
            self.ensure_role(role.admin_role())?;
            let sender = self.env().caller();
            self.store_role(role, account, sender);
            Ok(())
        }

        #[ink(message)]
        pub fn revoke_role(&mut self, role: Role, account: AccountId) -> Result<()> {
            self.ensure_role(role.admin_role())?;
            let sender = self.env().caller();
            self.clear_role(role, account, sender);
            Ok(())
        }

        /// Drops one of the caller's own roles.
        #[ink(message)]
        pub fn renounce_role(&mut self, role: Role) -> Result<()> {
            let caller = self.env().caller();
            self.clear_role(role, caller, caller);
            Ok(())
        }

        fn store_role(&mut self, role: Role, account: AccountId, sender: AccountId) {
            if self.has_role(role, account) {
                return;
            }
            self.roles.insert((role, account), &true);
            self.env().emit_event(RoleGranted { role, account, sender });
        }

        fn clear_role(&mut self, role: Role, account: AccountId, sender: AccountId) {
            if !self.has_role(role, account) {
                return;
            }
            self.roles.remove((role, account));
            self.env().emit_event(RoleRevoked { role, account, sender });
        }

        fn ensure_role(&self, role: Role) -> Result<()> {
            if !self.has_role(role, self.env().caller()) {
                return Err(Error::Unauthorized);
            }
            Ok(())
        }

        fn ensure_initialized(&self) -> Result<()> {
            if self.reward_token.is_none() || self.payment_token.is_none() {
                return Err(Error::NotInitialized);
            }
            Ok(())
        }

        fn ledger(&self) -> Result<Psp22Ledger> {
            match (self.payment_token, self.reward_token) {
                (Some(payment), Some(reward)) => Ok(Psp22Ledger::new(payment, reward)),
                _ => Err(Error::NotInitialized),
            }
        }

        // =====================================================================
        // VIEW FUNCTIONS
        // =====================================================================

        #[ink(message)]
        pub fn denominator(&self) -> Balance {
            DENOMINATOR
        }

        #[ink(message)]
        pub fn reward_token(&self) -> Option<AccountId> {
            self.reward_token
        }

        #[ink(message)]
        pub fn payment_token(&self) -> Option<AccountId> {
            self.payment_token
        }

        #[ink(message)]
        pub fn user_deposited(&self, round: u32, account: AccountId) -> Balance {
            self.user_deposited.get((round, account)).unwrap_or(0)
        }

        #[ink(message)]
        pub fn user_claimed(&self, round: u32, account: AccountId) -> Balance {
            self.user_claimed.get((round, account)).unwrap_or(0)
        }

        #[ink(message)]
        pub fn affiliate_balance(&self, account: AccountId) -> Balance {
            self.affiliate_balances.get(account).unwrap_or(0)
        }

        #[ink(message)]
        pub fn reward_outstanding(&self) -> Balance {
            self.reward_outstanding
        }

        /// Reward asset vested for `account` in `round` at the current block time.
        #[ink(message)]
        pub fn vested_amount(&self, round: u32, account: AccountId) -> Result<Balance> {
            let config = self.get_round(round)?;
            self.vested_at(&config, round, account, self.env().block_timestamp())
        }

        /// What `claim` would release right now.
        #[ink(message)]
        pub fn claimable(&self, round: u32, account: AccountId) -> Result<Balance> {
            let vested = self.vested_amount(round, account)?;
            Ok(vested.saturating_sub(self.user_claimed(round, account)))
        }
    }

    impl Default for Presale {
        fn default() -> Self {
            Self::new()
        }
    }

    // =========================================================================
    // UNIT TESTS
    // =========================================================================

}
