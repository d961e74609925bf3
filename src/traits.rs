//! Collaborator seams.
//!
//! The protocol treats the underlying collateral, yield strategies and time
//! as external collaborators. These traits describe the narrow call contract
//! it relies on, so production adapters and the in-memory doubles in
//! [`crate::testing`] are interchangeable.
//!
//! All chain-side collaborators take `&self`: like a contract handle, a value
//! implementing them is a reference to state that lives elsewhere.
//!
//! # Example: Implementing a Test Fake
//!
//! ```rust,ignore
//! use toft_rs::{Result, StrategyAccount};
//!
//! #[derive(Debug)]
//! struct NullStrategy(Address);
//!
//! impl StrategyAccount for NullStrategy {
//!     fn address(&self) -> Address { self.0 }
//!     fn deposit(&self, _: U256, _: Address, _: U256) -> Result<()> { Ok(()) }
//!     fn withdraw(&self, _: U256, _: Address, _: U256) -> Result<()> { Ok(()) }
//!     fn balance_of(&self, _: U256, _: Address) -> U256 { U256::ZERO }
//! }
//! ```

use std::fmt;
use std::time::{Duration, Instant};

use alloy_primitives::{Address, U256};
use async_trait::async_trait;

use crate::error::Result;

/// Fungible asset locked as collateral on the host chain.
///
/// # Errors
///
/// Transfers fail with `InsufficientAllowance` or `InsufficientBalance` when
/// the standard preconditions do not hold, and must not change any balance
/// when they fail.
pub trait UnderlyingAsset: fmt::Debug {
    fn address(&self) -> Address;

    fn decimals(&self) -> u8;

    fn balance_of(&self, account: Address) -> U256;

    /// Moves `amount` from `from` to `to` on behalf of `spender`, consuming
    /// allowance granted by `from`.
    fn transfer_from(&self, spender: Address, from: Address, to: Address, amount: U256)
        -> Result<()>;

    /// Moves `amount` out of `from`'s own balance.
    fn transfer(&self, from: Address, to: Address, amount: U256) -> Result<()>;
}

/// Yield-bearing account on a chain that holds bridged claim tokens for
/// individual owners.
pub trait StrategyAccount: fmt::Debug {
    /// Address holding the claim tokens credited to the strategy
    fn address(&self) -> Address;

    fn deposit(&self, asset_id: U256, owner: Address, amount: U256) -> Result<()>;

    /// # Errors
    ///
    /// `InsufficientStrategyBalance` if `owner` holds less than `amount`.
    fn withdraw(&self, asset_id: U256, owner: Address, amount: U256) -> Result<()>;

    fn balance_of(&self, asset_id: U256, owner: Address) -> U256;
}

/// Trait for time-based operations.
///
/// The relayer sleeps between polling rounds through this trait so tests can
/// fast-forward instead of waiting.
#[async_trait]
pub trait Clock: Send + Sync {
    /// Asynchronously sleeps for the given duration.
    async fn sleep(&self, duration: Duration);

    /// Returns the current instant in time.
    fn now(&self) -> Instant;
}
