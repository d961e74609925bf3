//! In-memory collaborators for tests
//!
//! Doubles for the external pieces the protocol talks to: an ERC20-like
//! underlying asset, a strategy account and a clock. Each one is a cheap
//! handle on shared state, so a test can keep a clone to inspect balances
//! after handing another clone to a token or vault.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use alloy_primitives::{Address, U256};
use async_trait::async_trait;

use crate::error::{Result, ToftError};
use crate::traits::{Clock, StrategyAccount, UnderlyingAsset};

// ============================================================================
// In-memory ERC20
// ============================================================================

#[derive(Debug, Default)]
struct Erc20State {
    balances: HashMap<Address, U256>,
    allowances: HashMap<(Address, Address), U256>,
    fail_transfers: bool,
}

/// An ERC20-like asset kept in memory.
///
/// Transfers can be switched to fail, which exercises the rollback paths of
/// the vault.
#[derive(Clone, Debug)]
pub struct InMemoryErc20 {
    address: Address,
    decimals: u8,
    state: Arc<Mutex<Erc20State>>,
}

impl InMemoryErc20 {
    pub fn new(address: Address, decimals: u8) -> Self {
        Self {
            address,
            decimals,
            state: Arc::default(),
        }
    }

    /// Credit `amount` to `to` out of thin air
    pub fn mint(&self, to: Address, amount: U256) {
        *self.state.lock().unwrap().balances.entry(to).or_default() += amount;
    }

    pub fn approve(&self, owner: Address, spender: Address, amount: U256) {
        self.state
            .lock()
            .unwrap()
            .allowances
            .insert((owner, spender), amount);
    }

    pub fn allowance(&self, owner: Address, spender: Address) -> U256 {
        self.state
            .lock()
            .unwrap()
            .allowances
            .get(&(owner, spender))
            .copied()
            .unwrap_or_default()
    }

    /// Make every subsequent `transfer` fail
    pub fn set_fail_transfers(&self, fail: bool) {
        self.state.lock().unwrap().fail_transfers = fail;
    }
}

impl Erc20State {
    fn move_funds(&mut self, from: Address, to: Address, amount: U256) -> Result<()> {
        let available = self.balances.get(&from).copied().unwrap_or_default();
        if available < amount {
            return Err(ToftError::InsufficientBalance {
                account: from,
                required: amount,
                available,
            });
        }
        *self.balances.entry(from).or_default() -= amount;
        *self.balances.entry(to).or_default() += amount;
        Ok(())
    }
}

impl UnderlyingAsset for InMemoryErc20 {
    fn address(&self) -> Address {
        self.address
    }

    fn decimals(&self) -> u8 {
        self.decimals
    }

    fn balance_of(&self, account: Address) -> U256 {
        self.state
            .lock()
            .unwrap()
            .balances
            .get(&account)
            .copied()
            .unwrap_or_default()
    }

    fn transfer_from(
        &self,
        spender: Address,
        from: Address,
        to: Address,
        amount: U256,
    ) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        let allowed = state
            .allowances
            .get(&(from, spender))
            .copied()
            .unwrap_or_default();
        if spender != from && allowed < amount {
            return Err(ToftError::InsufficientAllowance {
                owner: from,
                spender,
                required: amount,
                allowed,
            });
        }

        state.move_funds(from, to, amount)?;
        if spender != from && allowed != U256::MAX {
            state.allowances.insert((from, spender), allowed - amount);
        }
        Ok(())
    }

    fn transfer(&self, from: Address, to: Address, amount: U256) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.fail_transfers {
            return Err(ToftError::TransferFailed(format!(
                "transfer of {amount} from {from} rejected"
            )));
        }
        state.move_funds(from, to, amount)
    }
}

// ============================================================================
// In-memory strategy
// ============================================================================

/// A strategy account that only keeps per-owner positions.
#[derive(Clone, Debug)]
pub struct InMemoryStrategy {
    address: Address,
    positions: Arc<Mutex<HashMap<(U256, Address), U256>>>,
}

impl InMemoryStrategy {
    pub fn new(address: Address) -> Self {
        Self {
            address,
            positions: Arc::default(),
        }
    }
}

impl StrategyAccount for InMemoryStrategy {
    fn address(&self) -> Address {
        self.address
    }

    fn deposit(&self, asset_id: U256, owner: Address, amount: U256) -> Result<()> {
        *self
            .positions
            .lock()
            .unwrap()
            .entry((asset_id, owner))
            .or_default() += amount;
        Ok(())
    }

    fn withdraw(&self, asset_id: U256, owner: Address, amount: U256) -> Result<()> {
        let mut positions = self.positions.lock().unwrap();
        let position = positions.entry((asset_id, owner)).or_default();
        if *position < amount {
            return Err(ToftError::InsufficientStrategyBalance {
                owner,
                asset_id,
                requested: amount,
                available: *position,
            });
        }
        *position -= amount;
        Ok(())
    }

    fn balance_of(&self, asset_id: U256, owner: Address) -> U256 {
        self.positions
            .lock()
            .unwrap()
            .get(&(asset_id, owner))
            .copied()
            .unwrap_or_default()
    }
}

// ============================================================================
// Fake Clock
// ============================================================================

/// A fake clock that allows fast-forwarding time in tests.
///
/// This enables testing the relayer's polling without actually waiting.
#[derive(Clone, Debug)]
pub struct FakeClock {
    current_time: Arc<Mutex<Instant>>,
    sleep_log: Arc<Mutex<Vec<Duration>>>,
}

impl Default for FakeClock {
    fn default() -> Self {
        Self {
            current_time: Arc::new(Mutex::new(Instant::now())),
            sleep_log: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl FakeClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fast-forward the clock by the given duration
    pub fn advance(&self, duration: Duration) {
        let mut time = self.current_time.lock().unwrap();
        *time += duration;
    }

    /// Get the total time "slept" by this clock
    pub fn total_sleep_time(&self) -> Duration {
        self.sleep_log.lock().unwrap().iter().sum()
    }

    /// Get the number of times sleep was called
    pub fn sleep_count(&self) -> usize {
        self.sleep_log.lock().unwrap().len()
    }
}

#[async_trait]
impl Clock for FakeClock {
    async fn sleep(&self, duration: Duration) {
        self.sleep_log.lock().unwrap().push(duration);
        self.advance(duration);
    }

    fn now(&self) -> Instant {
        *self.current_time.lock().unwrap()
    }
}
