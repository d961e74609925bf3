//! Collateral custody on the host chain
//!
//! The vault holds the underlying asset backing the claim-token supply. Its
//! `locked_amount` is the principal that claim tokens may be redeemed
//! against; wrap fees are tracked separately in `accrued_fees` and can only
//! leave through [`Vault::harvest_fees`].
//!
//! Only the owning token instance may move funds. Balances are updated after
//! a successful pull on deposit and before the outgoing transfer on
//! withdraw, so a re-entrant call never observes funds that are not there.

use alloy_primitives::{Address, U256};
use tracing::{info, warn};

use crate::config::FeeConfig;
use crate::error::{Result, ToftError};
use crate::protocol::FeeQuote;
use crate::traits::UnderlyingAsset;

#[derive(Debug, Clone)]
pub struct Vault<A> {
    address: Address,
    owner: Address,
    asset: A,
    locked_amount: U256,
    accrued_fees: U256,
    fee_config: FeeConfig,
}

impl<A: UnderlyingAsset> Vault<A> {
    pub fn new(address: Address, owner: Address, asset: A, fee_config: FeeConfig) -> Result<Self> {
        fee_config.validate()?;
        Ok(Self {
            address,
            owner,
            asset,
            locked_amount: U256::ZERO,
            accrued_fees: U256::ZERO,
            fee_config,
        })
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn owner(&self) -> Address {
        self.owner
    }

    pub fn asset(&self) -> &A {
        &self.asset
    }

    /// Underlying balance actually held, principal and fees together.
    pub fn view_balance(&self) -> U256 {
        self.asset.balance_of(self.address)
    }

    pub fn locked_amount(&self) -> U256 {
        self.locked_amount
    }

    pub fn accrued_fees(&self) -> U256 {
        self.accrued_fees
    }

    pub fn fee_config(&self) -> &FeeConfig {
        &self.fee_config
    }

    pub fn quote(&self, amount: U256) -> Result<FeeQuote> {
        FeeQuote::compute(amount, &self.fee_config)
    }

    /// Locks `amount` pulled from `from`.
    pub fn deposit(&mut self, caller: Address, from: Address, amount: U256) -> Result<()> {
        self.deposit_with_fee(caller, from, amount, U256::ZERO)
    }

    /// Pulls `amount + fee` from `from`, locking `amount` and accruing `fee`.
    ///
    /// The owning token is the spender, so `from` must have approved it on
    /// the underlying asset.
    pub fn deposit_with_fee(
        &mut self,
        caller: Address,
        from: Address,
        amount: U256,
        fee: U256,
    ) -> Result<()> {
        self.ensure_owner(caller)?;

        let gross = amount.checked_add(fee).ok_or(ToftError::Overflow)?;
        let locked = self
            .locked_amount
            .checked_add(amount)
            .ok_or(ToftError::Overflow)?;
        let accrued = self
            .accrued_fees
            .checked_add(fee)
            .ok_or(ToftError::Overflow)?;

        self.asset
            .transfer_from(self.owner, from, self.address, gross)?;

        self.locked_amount = locked;
        self.accrued_fees = accrued;

        info!(
            vault = %self.address,
            from = %from,
            amount = %amount,
            fee = %fee,
            locked_amount = %self.locked_amount,
            event = "vault_deposit"
        );
        Ok(())
    }

    /// Releases `amount` of locked principal to `recipient`.
    pub fn withdraw(&mut self, caller: Address, recipient: Address, amount: U256) -> Result<()> {
        self.ensure_owner(caller)?;

        if amount > self.locked_amount {
            return Err(ToftError::InsufficientVaultBalance {
                requested: amount,
                locked: self.locked_amount,
            });
        }

        self.locked_amount -= amount;
        if let Err(e) = self.asset.transfer(self.address, recipient, amount) {
            self.locked_amount += amount;
            warn!(
                vault = %self.address,
                recipient = %recipient,
                amount = %amount,
                error = %e,
                event = "vault_withdraw_reverted"
            );
            return Err(e);
        }

        info!(
            vault = %self.address,
            recipient = %recipient,
            amount = %amount,
            locked_amount = %self.locked_amount,
            event = "vault_withdraw"
        );
        Ok(())
    }

    pub fn set_management_fee(&mut self, caller: Address, fee: u64) -> Result<()> {
        self.ensure_owner(caller)?;

        let config = self.fee_config.with_management_fee(fee);
        config.validate()?;
        self.fee_config = config;

        info!(vault = %self.address, management_fee = fee, event = "management_fee_set");
        Ok(())
    }

    /// Sends every accrued fee to `recipient`. Locked principal is untouched.
    pub fn harvest_fees(&mut self, caller: Address, recipient: Address) -> Result<U256> {
        self.ensure_owner(caller)?;

        let fees = std::mem::take(&mut self.accrued_fees);
        if fees.is_zero() {
            return Ok(fees);
        }
        if let Err(e) = self.asset.transfer(self.address, recipient, fees) {
            self.accrued_fees = fees;
            return Err(e);
        }

        info!(
            vault = %self.address,
            recipient = %recipient,
            amount = %fees,
            event = "fees_harvested"
        );
        Ok(fees)
    }

    fn ensure_owner(&self, caller: Address) -> Result<()> {
        if caller != self.owner {
            return Err(ToftError::Unauthorized { caller });
        }
        Ok(())
    }
}
