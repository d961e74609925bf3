//! Strategy hops
//!
//! `send_to_strategy` moves claim tokens to another chain and credits them to
//! a strategy account there instead of a plain balance. Getting them back is
//! a two-hop exchange: `retrieve_from_strategy` asks the remote chain to
//! withdraw, and the remote answers with an ordinary transfer back to the
//! origin. The remote pays for that return message out of its native
//! balance, which the request can top up with an airdrop
//! ([`AdapterParams::V2`]).
//!
//! If either hop fails on arrival it is kept by the transport as a stored
//! payload; nothing here retries it.

use alloy_primitives::{Address, U256};
use bon::Builder;
use tracing::{info, warn};

use super::{BridgeToken, CallParams};
use crate::chain::BridgeChainId;
use crate::error::{Result, ToftError};
use crate::protocol::{AdapterParams, MessageNonce, Payload};
use crate::spans;
use crate::traits::UnderlyingAsset;
use crate::transport::{MessageTransport, SendRequest};

#[derive(Builder, Debug, Clone, Copy, PartialEq, Eq)]
pub struct StrategyOptions {
    /// Wrap `amount` of the underlying first (host chain only)
    #[builder(default)]
    pub wrap: bool,
    #[builder(default)]
    pub adapter_params: AdapterParams,
    pub refund_address: Address,
}

impl<A: UnderlyingAsset, T: MessageTransport> BridgeToken<A, T> {
    /// Sends `amount` of `from`'s claim tokens to the strategy account on
    /// `destination_chain_id`, credited to `to`.
    ///
    /// With `options.wrap` the amount is wrapped from `from`'s underlying
    /// balance first; the remote and the message fee are checked before
    /// wrapping.
    #[allow(clippy::too_many_arguments)]
    pub fn send_to_strategy(
        &mut self,
        caller: Address,
        from: Address,
        to: Address,
        amount: U256,
        asset_id: U256,
        destination_chain_id: BridgeChainId,
        options: StrategyOptions,
        native_fee: U256,
    ) -> Result<MessageNonce> {
        let span = spans::send_to_strategy(
            self.instance.bridge_chain_id,
            destination_chain_id,
            from,
            amount,
            asset_id,
        );
        let _guard = span.enter();

        let nonce = self
            .try_send_to_strategy(
                caller,
                from,
                to,
                amount,
                asset_id,
                destination_chain_id,
                options,
                native_fee,
            )
            .inspect_err(spans::record_error)?;

        info!(
            token = %self.instance.address,
            from = %from,
            to = %to,
            amount = %amount,
            asset_id = %asset_id,
            destination_chain_id = %destination_chain_id,
            wrapped = options.wrap,
            nonce = nonce,
            event = "sent_to_strategy"
        );
        Ok(nonce)
    }

    /// Asks `destination_chain_id` to withdraw `amount` of `from`'s strategy
    /// position and send it back here.
    ///
    /// Only `from` may ask. Nothing is debited locally; the claim tokens
    /// arrive with the return transfer.
    #[allow(clippy::too_many_arguments)]
    pub fn retrieve_from_strategy(
        &mut self,
        caller: Address,
        from: Address,
        amount: U256,
        asset_id: U256,
        destination_chain_id: BridgeChainId,
        refund_address: Address,
        adapter_params: AdapterParams,
        native_fee: U256,
    ) -> Result<MessageNonce> {
        let span = spans::retrieve_from_strategy(
            self.instance.bridge_chain_id,
            destination_chain_id,
            from,
            amount,
            asset_id,
        );
        let _guard = span.enter();

        let nonce = self
            .try_retrieve_from_strategy(
                caller,
                from,
                amount,
                asset_id,
                destination_chain_id,
                refund_address,
                adapter_params,
                native_fee,
            )
            .inspect_err(spans::record_error)?;

        info!(
            token = %self.instance.address,
            owner = %from,
            amount = %amount,
            asset_id = %asset_id,
            destination_chain_id = %destination_chain_id,
            nonce = nonce,
            event = "strategy_withdraw_requested"
        );
        Ok(nonce)
    }

    #[allow(clippy::too_many_arguments)]
    fn try_send_to_strategy(
        &mut self,
        caller: Address,
        from: Address,
        to: Address,
        amount: U256,
        asset_id: U256,
        destination_chain_id: BridgeChainId,
        options: StrategyOptions,
        native_fee: U256,
    ) -> Result<MessageNonce> {
        self.remote_for(destination_chain_id)?;
        let payload = Payload::StrategyDeposit {
            from,
            recipient: to,
            amount,
            asset_id,
        }
        .encode();

        let sender = if options.wrap {
            self.check_message_fee(
                destination_chain_id,
                &payload,
                &options.adapter_params,
                native_fee,
            )?;
            self.wrap(caller, from, from, amount)?;
            // allowance, if any, was spent by the wrap
            from
        } else {
            caller
        };

        self.dispatch(
            sender,
            from,
            destination_chain_id,
            amount,
            payload,
            CallParams {
                refund_address: options.refund_address,
                adapter_params: options.adapter_params,
            },
            native_fee,
        )
    }

    #[allow(clippy::too_many_arguments)]
    fn try_retrieve_from_strategy(
        &mut self,
        caller: Address,
        from: Address,
        amount: U256,
        asset_id: U256,
        destination_chain_id: BridgeChainId,
        refund_address: Address,
        adapter_params: AdapterParams,
        native_fee: U256,
    ) -> Result<MessageNonce> {
        if caller != from {
            return Err(ToftError::Unauthorized { caller });
        }
        let remote = self.remote_for(destination_chain_id)?;
        let payload = Payload::StrategyWithdraw {
            owner: from,
            amount,
            asset_id,
        }
        .encode();
        self.check_message_fee(destination_chain_id, &payload, &adapter_params, native_fee)?;

        self.transport.send(
            SendRequest::builder()
                .source_address(self.instance.address)
                .destination_chain_id(destination_chain_id)
                .destination_address(remote)
                .payload(payload)
                .refund_address(refund_address)
                .adapter_params(adapter_params)
                .native_fee(native_fee)
                .build(),
        )
    }

    pub(super) fn receive_strategy_deposit(
        &mut self,
        source_chain_id: BridgeChainId,
        from: Address,
        recipient: Address,
        amount: U256,
        asset_id: U256,
    ) -> Result<()> {
        let strategy = self.strategy_account()?;
        self.ensure_mintable(amount)?;

        strategy.deposit(asset_id, recipient, amount)?;
        self.mint(strategy.address(), amount)?;

        info!(
            token = %self.instance.address,
            source_chain_id = %source_chain_id,
            from = %from,
            recipient = %recipient,
            amount = %amount,
            asset_id = %asset_id,
            event = "strategy_deposit_received"
        );
        Ok(())
    }

    /// Withdraws from the strategy, burns the strategy's claim tokens and
    /// sends them back to `owner` on the origin chain.
    pub(super) fn receive_strategy_withdraw(
        &mut self,
        origin_chain_id: BridgeChainId,
        origin_address: Address,
        owner: Address,
        amount: U256,
        asset_id: U256,
    ) -> Result<()> {
        let strategy = self.strategy_account()?;

        let available = strategy.balance_of(asset_id, owner);
        if available < amount {
            return Err(ToftError::InsufficientStrategyBalance {
                owner,
                asset_id,
                requested: amount,
                available,
            });
        }
        self.check_balance(strategy.address(), amount)?;

        let payload = Payload::Transfer {
            recipient: owner,
            amount,
        }
        .encode();
        let fee = self
            .transport
            .estimate_fee(origin_chain_id, &payload, &AdapterParams::Default)?
            .native_fee;
        if fee > self.native_balance {
            return Err(ToftError::InsufficientMessageFee {
                required: fee,
                provided: self.native_balance,
            });
        }

        strategy.withdraw(asset_id, owner, amount)?;
        let sent = self.transport.send(
            SendRequest::builder()
                .source_address(self.instance.address)
                .destination_chain_id(origin_chain_id)
                .destination_address(origin_address)
                .payload(payload)
                .refund_address(self.instance.address)
                .native_fee(fee)
                .build(),
        );
        let nonce = match sent {
            Ok(nonce) => nonce,
            Err(e) => {
                if let Err(restore) = strategy.deposit(asset_id, owner, amount) {
                    warn!(error = %restore, event = "strategy_restore_failed");
                }
                return Err(e);
            }
        };

        self.burn(strategy.address(), amount)?;
        self.native_balance -= fee;

        info!(
            token = %self.instance.address,
            origin_chain_id = %origin_chain_id,
            owner = %owner,
            amount = %amount,
            asset_id = %asset_id,
            return_fee = %fee,
            nonce = nonce,
            event = "strategy_withdraw_returned"
        );
        Ok(())
    }
}
