//! Wrap fee computation
//!
//! Fees are only ever charged when collateral enters the system through
//! `wrap`. Cross-chain sends pay the messaging layer in native currency, which
//! is a separate concern handled by the transport.

use alloy_primitives::U256;

use crate::config::{FeeConfig, MANAGEMENT_FEE_FRACTION};
use crate::error::{Result, ToftError};

/// Fee owed on top of a wrapped principal
///
/// # Example
///
/// ```rust
/// use alloy_primitives::U256;
/// use toft_rs::{FeeConfig, FeeQuote};
///
/// let config = FeeConfig::default().with_management_fee(25);
/// let quote = FeeQuote::compute(U256::from(100_000), &config).unwrap();
/// assert_eq!(quote.total(), U256::from(25));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FeeQuote {
    /// Proportional management fee, rounded down
    pub base_fee: U256,
    /// Fixed per-wrap fee
    pub bridge_fee: U256,
}

impl FeeQuote {
    pub fn compute(amount: U256, config: &FeeConfig) -> Result<Self> {
        let base_fee = amount
            .checked_mul(U256::from(config.management_fee))
            .ok_or(ToftError::Overflow)?
            / U256::from(MANAGEMENT_FEE_FRACTION);

        Ok(Self {
            base_fee,
            bridge_fee: config.flat_wrap_fee,
        })
    }

    pub fn total(&self) -> U256 {
        self.base_fee.saturating_add(self.bridge_fee)
    }

    /// Principal plus fees, i.e. what the vault pulls from the depositor.
    pub fn gross(&self, amount: U256) -> Result<U256> {
        amount.checked_add(self.total()).ok_or(ToftError::Overflow)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(100_000, 25, 25)]
    #[case(1_000_000, 25, 250)]
    #[case(3_999, 25, 0)]
    #[case(4_000, 25, 1)]
    #[case(100_000, 0, 0)]
    fn test_management_fee_rounds_down(
        #[case] amount: u64,
        #[case] fee: u64,
        #[case] expected: u64,
    ) {
        let config = FeeConfig::default().with_management_fee(fee);
        let quote = FeeQuote::compute(U256::from(amount), &config).unwrap();
        assert_eq!(quote.base_fee, U256::from(expected));
        assert_eq!(quote.bridge_fee, U256::ZERO);
    }

    #[test]
    fn test_flat_fee_is_added() {
        let config = FeeConfig::default()
            .with_management_fee(25)
            .with_flat_wrap_fee(U256::from(7));
        let quote = FeeQuote::compute(U256::from(100_000), &config).unwrap();

        assert_eq!(quote.total(), U256::from(32));
        assert_eq!(quote.gross(U256::from(100_000)).unwrap(), U256::from(100_032));
    }

    #[test]
    fn test_overflow_is_reported() {
        let config = FeeConfig::default().with_management_fee(25);
        assert!(matches!(
            FeeQuote::compute(U256::MAX, &config).unwrap_err(),
            ToftError::Overflow
        ));
    }
}
