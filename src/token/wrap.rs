use alloy_primitives::{Address, U256};
use tracing::info;

use super::BridgeToken;
use crate::error::{Result, ToftError};
use crate::protocol::FeeQuote;
use crate::spans;
use crate::traits::UnderlyingAsset;
use crate::transport::MessageTransport;

impl<A: UnderlyingAsset, T: MessageTransport> BridgeToken<A, T> {
    /// Fee charged for wrapping `amount` at the current vault settings.
    pub fn quote_wrap(&self, amount: U256) -> Result<FeeQuote> {
        self.host_vault()?.quote(amount)
    }

    /// Locks `amount` plus fees of `from`'s underlying asset and mints
    /// `amount` claim tokens to `to`.
    ///
    /// `from` must have approved this token on the underlying asset for the
    /// gross amount. When `caller != from`, `caller` additionally spends a
    /// claim-token allowance of `amount` granted by `from`.
    ///
    /// # Errors
    ///
    /// - `NotHostChain` off the host chain, before anything else is checked
    /// - `InsufficientAllowance` / `InsufficientBalance` from either asset
    pub fn wrap(
        &mut self,
        caller: Address,
        from: Address,
        to: Address,
        amount: U256,
    ) -> Result<FeeQuote> {
        let span = spans::wrap(self.instance.chain_id, from, to, amount);
        let _guard = span.enter();

        self.try_wrap(caller, from, to, amount)
            .inspect_err(spans::record_error)
    }

    /// Burns `amount` of the caller's claim tokens and releases the same
    /// amount of locked collateral to `to`.
    pub fn unwrap(&mut self, caller: Address, to: Address, amount: U256) -> Result<()> {
        let span = spans::unwrap(self.instance.chain_id, caller, to, amount);
        let _guard = span.enter();

        self.try_unwrap(caller, to, amount)
            .inspect_err(spans::record_error)
    }

    fn try_wrap(
        &mut self,
        caller: Address,
        from: Address,
        to: Address,
        amount: U256,
    ) -> Result<FeeQuote> {
        self.ensure_host()?;
        self.check_allowance(from, caller, amount)?;
        self.ensure_mintable(amount)?;

        let token = self.instance.address;
        let vault = self.host_vault_mut()?;
        let quote = vault.quote(amount)?;
        vault.deposit_with_fee(token, from, amount, quote.total())?;

        self.spend_allowance(from, caller, amount);
        self.mint(to, amount)?;

        info!(
            token = %token,
            from = %from,
            to = %to,
            amount = %amount,
            fee = %quote.total(),
            total_supply = %self.total_supply,
            event = "wrapped"
        );
        Ok(quote)
    }

    fn try_unwrap(&mut self, caller: Address, to: Address, amount: U256) -> Result<()> {
        self.ensure_host()?;
        self.check_balance(caller, amount)?;

        let locked = self.host_vault()?.locked_amount();
        if amount > locked {
            return Err(ToftError::InsufficientVaultBalance {
                requested: amount,
                locked,
            });
        }

        self.burn(caller, amount)?;
        let token = self.instance.address;
        let withdrawn = self.host_vault_mut()?.withdraw(token, to, amount);
        if let Err(e) = withdrawn {
            self.mint(caller, amount)?;
            return Err(e);
        }

        info!(
            token = %token,
            from = %caller,
            to = %to,
            amount = %amount,
            total_supply = %self.total_supply,
            event = "unwrapped"
        );
        Ok(())
    }
}
