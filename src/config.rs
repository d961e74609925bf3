use alloy_primitives::U256;
use serde::{Deserialize, Serialize};

use crate::error::{Result, ToftError};

/// Denominator of the wrap management fee.
///
/// A management fee of `25` therefore charges `25 / 100_000` of the wrapped
/// amount.
pub const MANAGEMENT_FEE_FRACTION: u64 = 100_000;

/// Upper bound accepted for the management fee (0.5%)
pub const MAX_MANAGEMENT_FEE: u64 = 500;

/// Destination gas budgeted for a message when the sender passes no adapter
/// params.
pub const DEFAULT_DESTINATION_GAS: u64 = 200_000;

/// Fee parameters applied by the vault on every wrap.
///
/// # Examples
///
/// ```rust
/// use alloy_primitives::U256;
/// use toft_rs::FeeConfig;
///
/// let config = FeeConfig::default()
///     .with_management_fee(25)
///     .with_flat_wrap_fee(U256::from(1));
/// assert_eq!(config.management_fee, 25);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeConfig {
    /// Proportional fee, in units of `1 / MANAGEMENT_FEE_FRACTION`
    pub management_fee: u64,
    /// Fixed amount added to every wrap
    pub flat_wrap_fee: U256,
}

impl FeeConfig {
    pub fn with_management_fee(mut self, fee: u64) -> Self {
        self.management_fee = fee;
        self
    }

    pub fn with_flat_wrap_fee(mut self, fee: U256) -> Self {
        self.flat_wrap_fee = fee;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.management_fee > MAX_MANAGEMENT_FEE {
            return Err(ToftError::FeeTooHigh {
                fee: self.management_fee,
                max: MAX_MANAGEMENT_FEE,
            });
        }
        Ok(())
    }
}

/// Configuration for the relayer polling loop.
///
/// Controls how long the relayer waits between delivery rounds and how many
/// rounds it runs before giving up on messages that keep arriving.
///
/// # Examples
///
/// ```rust
/// use toft_rs::RelayConfig;
///
/// let config = RelayConfig::default()
///     .with_max_rounds(10)
///     .with_poll_interval_secs(2);
/// assert_eq!(config.total_timeout_secs(), 20);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayConfig {
    /// Maximum number of polling rounds before giving up.
    pub max_rounds: u32,
    /// Seconds to wait after each round that had messages to deliver.
    pub poll_interval_secs: u64,
}

impl Default for RelayConfig {
    /// 30 rounds, 5 seconds apart.
    fn default() -> Self {
        Self {
            max_rounds: 30,
            poll_interval_secs: 5,
        }
    }
}

impl RelayConfig {
    pub fn with_max_rounds(mut self, rounds: u32) -> Self {
        self.max_rounds = rounds;
        self
    }

    pub fn with_poll_interval_secs(mut self, secs: u64) -> Self {
        self.poll_interval_secs = secs;
        self
    }

    /// Returns `max_rounds * poll_interval_secs`.
    pub fn total_timeout_secs(&self) -> u64 {
        self.max_rounds as u64 * self.poll_interval_secs
    }
}

/// Pricing of the in-process messaging layer.
///
/// `native_fee = base_fee + per_byte_fee * payload_len + gas_price * gas_limit + airdrop`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeSchedule {
    pub base_fee: U256,
    pub per_byte_fee: U256,
    pub gas_price: U256,
    /// Gas used when a message carries no adapter params
    pub default_gas_limit: u64,
}

impl Default for FeeSchedule {
    /// Free messaging with [`DEFAULT_DESTINATION_GAS`].
    fn default() -> Self {
        Self {
            base_fee: U256::ZERO,
            per_byte_fee: U256::ZERO,
            gas_price: U256::ZERO,
            default_gas_limit: DEFAULT_DESTINATION_GAS,
        }
    }
}

impl FeeSchedule {
    pub fn with_base_fee(mut self, fee: U256) -> Self {
        self.base_fee = fee;
        self
    }

    pub fn with_per_byte_fee(mut self, fee: U256) -> Self {
        self.per_byte_fee = fee;
        self
    }

    pub fn with_gas_price(mut self, price: U256) -> Self {
        self.gas_price = price;
        self
    }

    pub fn with_default_gas_limit(mut self, gas: u64) -> Self {
        self.default_gas_limit = gas;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_fee_schedule_is_free() {
        let schedule = FeeSchedule::default();
        assert!(schedule.base_fee.is_zero());
        assert_eq!(schedule.default_gas_limit, DEFAULT_DESTINATION_GAS);
    }

    #[test]
    fn test_default_relay_config() {
        let config = RelayConfig::default();
        assert_eq!(config.max_rounds, 30);
        assert_eq!(config.poll_interval_secs, 5);
        assert_eq!(config.total_timeout_secs(), 150);
    }

    #[test]
    fn test_fee_config_rejects_excessive_fee() {
        let config = FeeConfig::default().with_management_fee(MAX_MANAGEMENT_FEE + 1);
        assert!(matches!(
            config.validate().unwrap_err(),
            ToftError::FeeTooHigh { fee: 501, max: 500 }
        ));
    }

    #[test]
    fn test_configs_load_from_json() {
        let relay: RelayConfig =
            serde_json::from_str(r#"{"maxRounds": 4, "pollIntervalSecs": 12}"#).unwrap();
        let expected = RelayConfig::default()
            .with_max_rounds(4)
            .with_poll_interval_secs(12);
        assert_eq!(relay, expected);

        let fees: FeeConfig =
            serde_json::from_str(r#"{"managementFee": 25, "flatWrapFee": "0x1"}"#).unwrap();
        assert_eq!(fees.management_fee, 25);
        assert_eq!(fees.flat_wrap_fee, U256::from(1u64));

        let schedule = FeeSchedule::default().with_base_fee(U256::from(5u64));
        let json = serde_json::to_string(&schedule).unwrap();
        assert!(json.contains("defaultGasLimit"));
        assert_eq!(serde_json::from_str::<FeeSchedule>(&json).unwrap(), schedule);
    }

    #[test]
    fn test_fee_config_accepts_cap() {
        let config = FeeConfig::default().with_management_fee(MAX_MANAGEMENT_FEE);
        assert!(config.validate().is_ok());
    }
}
