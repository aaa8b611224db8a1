use presale_token::TokenError;

#[derive(Debug, PartialEq, Eq, Clone, Copy, scale::Encode, scale::Decode)]
#[cfg_attr(feature = "std", derive(scale_info::TypeInfo))]
pub enum Error {
    /// Caller does not hold the role the message requires.
    Unauthorized,
    /// Round timestamps are not ordered as `start < end <= claim`.
    InvalidSchedule,
    /// Zero price, or an affiliate fee above `DENOMINATOR`.
    InvalidRate,
    /// Deposit outside `[time_to_start, time_to_end)`.
    RoundClosed,
    /// Claim before `time_to_claim`.
    ClaimNotStarted,
    BelowMinimum,
    /// Buyer named themselves as referrer.
    InvalidReferrer,
    NothingToClaim,
    /// Round index out of range.
    NotFound,
    InsufficientAllowance,
    InsufficientBalance,
    /// Engine does not hold enough reward asset to back the deposit.
    InsufficientReserve,
    AlreadyInitialized,
    NotInitialized,
    Overflow,
    /// Asset ledger call failed for a reason other than balance/allowance.
    TransferFailed,
}

impl From<TokenError> for Error {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::InsufficientBalance => Error::InsufficientBalance,
            TokenError::InsufficientAllowance => Error::InsufficientAllowance,
            _ => Error::TransferFailed,
        }
    }
}

pub type Result<T> = core::result::Result<T, Error>;
