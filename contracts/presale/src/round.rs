use crate::constants::{DENOMINATOR, VESTING_UNIT};
use crate::errors::{Error, Result};
use crate::{Balance, Timestamp};

/// One sale stage. Immutable once registered.
#[derive(Debug, PartialEq, Eq, Clone, Copy, scale::Encode, scale::Decode)]
#[cfg_attr(
    feature = "std",
    derive(scale_info::TypeInfo, ink::storage::traits::StorageLayout)
)]
pub struct Round {
    pub time_to_start: Timestamp,
    pub time_to_end: Timestamp,
    pub time_to_claim: Timestamp,
    /// Smallest accepted deposit, in payment-asset units.
    pub min_amount: Balance,
    /// Payment-asset units per `DENOMINATOR` reward-asset units.
    pub price: Balance,
    /// Commission on each referred deposit, scaled by `DENOMINATOR`.
    pub affiliate_fee: Balance,
    /// Number of discrete unlocks. Zero releases everything at claim time.
    pub vesting_duration: u32,
}

/// Running totals of one round.
#[derive(Debug, Default, PartialEq, Eq, Clone, Copy, scale::Encode, scale::Decode)]
#[cfg_attr(
    feature = "std",
    derive(scale_info::TypeInfo, ink::storage::traits::StorageLayout)
)]
pub struct RoundTotals {
    /// Payment asset deposited.
    pub deposited: Balance,
    /// Reward asset owed to buyers (sum of entitlements).
    pub sold: Balance,
    /// Reward asset already released.
    pub claimed: Balance,
}

impl Round {
    pub fn new(
        time_to_start: Timestamp,
        time_to_end: Timestamp,
        time_to_claim: Timestamp,
        min_amount: Balance,
        price: Balance,
        affiliate_fee: Balance,
        vesting_duration: u32,
    ) -> Result<Self> {
        if time_to_start >= time_to_end || time_to_claim < time_to_end {
            return Err(Error::InvalidSchedule);
        }
        if price == 0 || affiliate_fee > DENOMINATOR {
            return Err(Error::InvalidRate);
        }

        Ok(Self {
            time_to_start,
            time_to_end,
            time_to_claim,
            min_amount,
            price,
            affiliate_fee,
            vesting_duration,
        })
    }

    pub fn is_open(&self, now: Timestamp) -> bool {
        self.time_to_start <= now && now < self.time_to_end
    }

    pub fn is_claimable(&self, now: Timestamp) -> bool {
        now >= self.time_to_claim
    }

    /// Reward asset purchasable with `deposited` payment asset (floored).
    pub fn entitlement(&self, deposited: Balance) -> Result<Balance> {
        let scaled = deposited.checked_mul(DENOMINATOR).ok_or(Error::Overflow)?;
        Ok(scaled / self.price)
    }

    /// Referral commission on a single deposit (floored).
    pub fn commission(&self, amount: Balance) -> Result<Balance> {
        let scaled = amount.checked_mul(self.affiliate_fee).ok_or(Error::Overflow)?;
        Ok(scaled / DENOMINATOR)
    }

    /// Unlocks reached at `now`. The first one happens at `time_to_claim`.
    pub fn unlocked_units(&self, now: Timestamp) -> u64 {
        if !self.is_claimable(now) {
            return 0;
        }
        (now - self.time_to_claim) / VESTING_UNIT + 1
    }

    /// Share of `entitlement` vested at `now`. Never exceeds `entitlement`.
    pub fn releasable(&self, entitlement: Balance, now: Timestamp) -> Result<Balance> {
        let units = self.unlocked_units(now);
        if units == 0 {
            return Ok(0);
        }

        let duration = u64::from(self.vesting_duration);
        if duration == 0 || units >= duration {
            return Ok(entitlement);
        }

        let vested = entitlement
            .checked_mul(Balance::from(units))
            .ok_or(Error::Overflow)?;
        Ok(vested / Balance::from(duration))
    }
}
