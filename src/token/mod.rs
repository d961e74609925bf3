// SPDX-FileCopyrightText: 2025 Tapioca DAO Contributors
//
// SPDX-License-Identifier: Apache-2.0
//! Claim token instances
//!
//! A [`BridgeToken`] is one chain's instance of a wrapped asset. Exactly one
//! instance per deployment family sits on the host chain and owns the vault;
//! wrap and unwrap only work there. Every instance can send claim tokens to
//! its trusted remotes and receive them back.
//!
//! Supply moves between chains by burn-then-mint: the source burns when the
//! transport accepts the message, the destination mints when it executes
//! it. A message that is never executed removes its amount from the global
//! supply while the collateral stays locked.

mod strategy;
mod transfer;
mod wrap;

use std::collections::BTreeMap;
use std::sync::Arc;

use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::chain::BridgeChainId;
use crate::error::{Result, ToftError};
use crate::remote::TrustedRemoteRegistry;
use crate::traits::{StrategyAccount, UnderlyingAsset};
use crate::transport::MessageTransport;
use crate::vault::Vault;

pub use strategy::StrategyOptions;
pub use transfer::CallParams;

/// ERC20 metadata of the claim token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenMetadata {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

/// Identity of a deployed instance. Fixed at deployment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenInstance {
    pub chain_id: u64,
    pub bridge_chain_id: BridgeChainId,
    pub address: Address,
    pub host_chain_id: u64,
    pub is_host_chain: bool,
    pub underlying_asset: Address,
    /// Vault address, host chain only
    pub vault: Option<Address>,
    pub metadata: TokenMetadata,
}

#[derive(Debug)]
pub struct BridgeToken<A, T> {
    instance: TokenInstance,
    owner: Address,
    transport: T,
    vault: Option<Vault<A>>,
    remotes: TrustedRemoteRegistry,
    strategy: Option<Arc<dyn StrategyAccount>>,
    balances: BTreeMap<Address, U256>,
    allowances: BTreeMap<(Address, Address), U256>,
    total_supply: U256,
    native_balance: U256,
}

impl<A: UnderlyingAsset, T: MessageTransport> BridgeToken<A, T> {
    /// Assembles an instance.
    ///
    /// The host instance must come with its vault and no other instance may
    /// have one. `owner` is the only account allowed to use the privileged
    /// setters.
    pub fn new(
        instance: TokenInstance,
        owner: Address,
        transport: T,
        vault: Option<Vault<A>>,
    ) -> Result<Self> {
        if instance.is_host_chain != (instance.chain_id == instance.host_chain_id) {
            return Err(ToftError::InvalidConfig(format!(
                "instance on chain {} disagrees with host chain {}",
                instance.chain_id, instance.host_chain_id
            )));
        }
        if instance.is_host_chain != vault.is_some() {
            return Err(ToftError::InvalidConfig(format!(
                "a vault is required on the host chain and only there (chain {})",
                instance.chain_id
            )));
        }
        if transport.bridge_chain_id() != instance.bridge_chain_id {
            return Err(ToftError::InvalidConfig(format!(
                "transport serves bridge chain {}, instance lives on {}",
                transport.bridge_chain_id(),
                instance.bridge_chain_id
            )));
        }

        Ok(Self {
            instance,
            owner,
            transport,
            vault,
            remotes: TrustedRemoteRegistry::new(),
            strategy: None,
            balances: BTreeMap::new(),
            allowances: BTreeMap::new(),
            total_supply: U256::ZERO,
            native_balance: U256::ZERO,
        })
    }

    pub fn instance(&self) -> &TokenInstance {
        &self.instance
    }

    pub fn address(&self) -> Address {
        self.instance.address
    }

    pub fn owner(&self) -> Address {
        self.owner
    }

    pub fn is_host_chain(&self) -> bool {
        self.instance.is_host_chain
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn vault(&self) -> Option<&Vault<A>> {
        self.vault.as_ref()
    }

    pub fn trusted_remotes(&self) -> &TrustedRemoteRegistry {
        &self.remotes
    }

    pub fn strategy(&self) -> Option<&Arc<dyn StrategyAccount>> {
        self.strategy.as_ref()
    }

    /// Native currency available to pay for messages sent on receipt.
    pub fn native_balance(&self) -> U256 {
        self.native_balance
    }

    pub fn name(&self) -> &str {
        &self.instance.metadata.name
    }

    pub fn symbol(&self) -> &str {
        &self.instance.metadata.symbol
    }

    pub fn decimals(&self) -> u8 {
        self.instance.metadata.decimals
    }

    pub fn total_supply(&self) -> U256 {
        self.total_supply
    }

    pub fn balance_of(&self, account: Address) -> U256 {
        self.balances.get(&account).copied().unwrap_or_default()
    }

    pub fn allowance(&self, owner: Address, spender: Address) -> U256 {
        self.allowances
            .get(&(owner, spender))
            .copied()
            .unwrap_or_default()
    }

    pub fn approve(&mut self, caller: Address, spender: Address, amount: U256) {
        self.allowances.insert((caller, spender), amount);
    }

    pub fn transfer(&mut self, caller: Address, to: Address, amount: U256) -> Result<()> {
        self.check_balance(caller, amount)?;
        self.move_balance(caller, to, amount);
        Ok(())
    }

    pub fn transfer_from(
        &mut self,
        caller: Address,
        from: Address,
        to: Address,
        amount: U256,
    ) -> Result<()> {
        self.check_allowance(from, caller, amount)?;
        self.check_balance(from, amount)?;
        self.spend_allowance(from, caller, amount);
        self.move_balance(from, to, amount);
        Ok(())
    }

    /// Adds native currency to the balance used for return messages.
    pub fn fund_native(&mut self, amount: U256) {
        self.native_balance = self.native_balance.saturating_add(amount);
    }

    pub fn set_trusted_remote(
        &mut self,
        caller: Address,
        remote_chain_id: BridgeChainId,
        remote_address: Address,
        enabled: bool,
    ) -> Result<bool> {
        self.ensure_owner(caller)?;
        let changed = self
            .remotes
            .set_trusted(remote_chain_id, remote_address, enabled);

        info!(
            token = %self.instance.address,
            remote_chain_id = %remote_chain_id,
            remote_address = %remote_address,
            enabled = enabled,
            event = "trusted_remote_updated"
        );
        Ok(changed)
    }

    pub fn set_management_fee(&mut self, caller: Address, fee: u64) -> Result<()> {
        self.ensure_owner(caller)?;
        let token = self.instance.address;
        self.host_vault_mut()?.set_management_fee(token, fee)
    }

    /// Sweeps the wrap fees accrued in the vault to `recipient`.
    pub fn harvest_fees(&mut self, caller: Address, recipient: Address) -> Result<U256> {
        self.ensure_owner(caller)?;
        let token = self.instance.address;
        self.host_vault_mut()?.harvest_fees(token, recipient)
    }

    pub fn set_strategy(
        &mut self,
        caller: Address,
        strategy: Arc<dyn StrategyAccount>,
    ) -> Result<()> {
        self.ensure_owner(caller)?;
        info!(
            token = %self.instance.address,
            strategy = %strategy.address(),
            event = "strategy_set"
        );
        self.strategy = Some(strategy);
        Ok(())
    }

    pub fn transfer_ownership(&mut self, caller: Address, new_owner: Address) -> Result<()> {
        self.ensure_owner(caller)?;
        info!(
            token = %self.instance.address,
            previous_owner = %self.owner,
            new_owner = %new_owner,
            event = "ownership_transferred"
        );
        self.owner = new_owner;
        Ok(())
    }

    fn ensure_owner(&self, caller: Address) -> Result<()> {
        if caller != self.owner {
            return Err(ToftError::Unauthorized { caller });
        }
        Ok(())
    }

    fn ensure_host(&self) -> Result<()> {
        if !self.instance.is_host_chain {
            return Err(ToftError::NotHostChain {
                chain_id: self.instance.chain_id,
                host_chain_id: self.instance.host_chain_id,
            });
        }
        Ok(())
    }

    fn host_vault(&self) -> Result<&Vault<A>> {
        self.ensure_host()?;
        let chain_id = self.instance.chain_id;
        self.vault.as_ref().ok_or_else(|| missing_vault(chain_id))
    }

    fn host_vault_mut(&mut self) -> Result<&mut Vault<A>> {
        self.ensure_host()?;
        let chain_id = self.instance.chain_id;
        self.vault.as_mut().ok_or_else(|| missing_vault(chain_id))
    }

    fn strategy_account(&self) -> Result<Arc<dyn StrategyAccount>> {
        self.strategy
            .clone()
            .ok_or(ToftError::StrategyNotConfigured {
                chain_id: self.instance.chain_id,
            })
    }

    /// Enabled remote for `chain_id`, or `UntrustedRemote`.
    fn remote_for(&self, chain_id: BridgeChainId) -> Result<Address> {
        self.remotes
            .trusted_remote(chain_id)
            .ok_or(ToftError::UntrustedRemote {
                chain_id,
                address: Address::ZERO,
            })
    }

    fn check_balance(&self, account: Address, amount: U256) -> Result<()> {
        let available = self.balance_of(account);
        if available < amount {
            return Err(ToftError::InsufficientBalance {
                account,
                required: amount,
                available,
            });
        }
        Ok(())
    }

    fn check_allowance(&self, owner: Address, spender: Address, amount: U256) -> Result<()> {
        if owner == spender {
            return Ok(());
        }
        let allowed = self.allowance(owner, spender);
        if allowed < amount {
            return Err(ToftError::InsufficientAllowance {
                owner,
                spender,
                required: amount,
                allowed,
            });
        }
        Ok(())
    }

    /// Must follow a successful `check_allowance`. `U256::MAX` never decreases.
    fn spend_allowance(&mut self, owner: Address, spender: Address, amount: U256) {
        if owner == spender {
            return;
        }
        if let Some(allowed) = self.allowances.get_mut(&(owner, spender)) {
            if *allowed != U256::MAX {
                *allowed = allowed.saturating_sub(amount);
            }
        }
    }

    fn ensure_mintable(&self, amount: U256) -> Result<()> {
        self.total_supply
            .checked_add(amount)
            .map(|_| ())
            .ok_or(ToftError::Overflow)
    }

    fn mint(&mut self, to: Address, amount: U256) -> Result<()> {
        self.total_supply = self
            .total_supply
            .checked_add(amount)
            .ok_or(ToftError::Overflow)?;
        let balance = self.balances.entry(to).or_default();
        *balance = balance.saturating_add(amount);
        Ok(())
    }

    fn burn(&mut self, from: Address, amount: U256) -> Result<()> {
        self.check_balance(from, amount)?;
        let balance = self.balances.entry(from).or_default();
        *balance -= amount;
        self.total_supply -= amount;
        Ok(())
    }

    /// Must follow a successful `check_balance`.
    fn move_balance(&mut self, from: Address, to: Address, amount: U256) {
        if let Some(balance) = self.balances.get_mut(&from) {
            *balance -= amount;
        }
        let balance = self.balances.entry(to).or_default();
        *balance = balance.saturating_add(amount);
    }
}

fn missing_vault(chain_id: u64) -> ToftError {
    ToftError::InvalidConfig(format!("host instance on chain {chain_id} has no vault"))
}
