use alloy_primitives::{Address, Bytes, U256};
use bon::Builder;
use tracing::{debug, info};

use super::BridgeToken;
use crate::chain::BridgeChainId;
use crate::error::{Result, ToftError};
use crate::protocol::{decode_recipient, AdapterParams, InboundMessage, MessageNonce, Payload};
use crate::spans;
use crate::traits::UnderlyingAsset;
use crate::transport::{FeeEstimate, MessageReceiver, MessageTransport, SendRequest};

/// Messaging options of an outbound send
#[derive(Builder, Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallParams {
    /// Receives the unused part of the native fee
    pub refund_address: Address,
    #[builder(default)]
    pub adapter_params: AdapterParams,
}

impl<A: UnderlyingAsset, T: MessageTransport> BridgeToken<A, T> {
    /// Quotes the messaging fee for sending `amount` to `to_address` on
    /// `destination_chain_id`.
    pub fn estimate_send_fee(
        &self,
        destination_chain_id: BridgeChainId,
        to_address: &[u8],
        amount: U256,
        adapter_params: &AdapterParams,
    ) -> Result<FeeEstimate> {
        let recipient = decode_recipient(to_address)?;
        let payload = Payload::Transfer { recipient, amount }.encode();
        self.transport
            .estimate_fee(destination_chain_id, &payload, adapter_params)
    }

    /// Sends `amount` of `from`'s claim tokens to `to_address` on
    /// `destination_chain_id`.
    ///
    /// `to_address` is the 32-byte left-padded recipient (see
    /// [`encode_recipient`](crate::encode_recipient)). The tokens are burnt
    /// once the transport accepts the message; the destination mints them
    /// when the message is executed there.
    ///
    /// # Errors
    ///
    /// Checked in this order, all before any state changes:
    /// `UntrustedRemote`, `InsufficientAllowance`, `InsufficientBalance`,
    /// `InsufficientMessageFee`.
    #[allow(clippy::too_many_arguments)]
    pub fn send_from(
        &mut self,
        caller: Address,
        from: Address,
        destination_chain_id: BridgeChainId,
        to_address: &[u8],
        amount: U256,
        params: CallParams,
        native_fee: U256,
    ) -> Result<MessageNonce> {
        let span = spans::send_from(
            self.instance.bridge_chain_id,
            destination_chain_id,
            from,
            amount,
        );
        let _guard = span.enter();

        self.try_send_from(
            caller,
            from,
            destination_chain_id,
            to_address,
            amount,
            params,
            native_fee,
        )
        .inspect_err(spans::record_error)
    }

    #[allow(clippy::too_many_arguments)]
    fn try_send_from(
        &mut self,
        caller: Address,
        from: Address,
        destination_chain_id: BridgeChainId,
        to_address: &[u8],
        amount: U256,
        params: CallParams,
        native_fee: U256,
    ) -> Result<MessageNonce> {
        self.remote_for(destination_chain_id)?;
        let recipient = decode_recipient(to_address)?;
        let payload = Payload::Transfer { recipient, amount }.encode();

        let nonce = self.dispatch(
            caller,
            from,
            destination_chain_id,
            amount,
            payload,
            params,
            native_fee,
        )?;

        info!(
            token = %self.instance.address,
            from = %from,
            recipient = %recipient,
            destination_chain_id = %destination_chain_id,
            amount = %amount,
            nonce = nonce,
            event = "sent"
        );
        Ok(nonce)
    }

    /// Checks, sends, then burns `amount` from `from`.
    #[allow(clippy::too_many_arguments)]
    pub(super) fn dispatch(
        &mut self,
        caller: Address,
        from: Address,
        destination_chain_id: BridgeChainId,
        amount: U256,
        payload: Bytes,
        params: CallParams,
        native_fee: U256,
    ) -> Result<MessageNonce> {
        let remote = self.remote_for(destination_chain_id)?;
        self.check_allowance(from, caller, amount)?;
        self.check_balance(from, amount)?;
        self.check_message_fee(
            destination_chain_id,
            &payload,
            &params.adapter_params,
            native_fee,
        )?;

        let request = SendRequest::builder()
            .source_address(self.instance.address)
            .destination_chain_id(destination_chain_id)
            .destination_address(remote)
            .payload(payload)
            .refund_address(params.refund_address)
            .adapter_params(params.adapter_params)
            .native_fee(native_fee)
            .build();
        let nonce = self.transport.send(request)?;

        self.spend_allowance(from, caller, amount);
        self.burn(from, amount)?;
        Ok(nonce)
    }

    pub(super) fn check_message_fee(
        &self,
        destination_chain_id: BridgeChainId,
        payload: &[u8],
        adapter_params: &AdapterParams,
        native_fee: U256,
    ) -> Result<()> {
        let estimate = self
            .transport
            .estimate_fee(destination_chain_id, payload, adapter_params)?;
        if native_fee < estimate.native_fee {
            return Err(ToftError::InsufficientMessageFee {
                required: estimate.native_fee,
                provided: native_fee,
            });
        }
        Ok(())
    }

    fn try_on_receive(&mut self, caller: Address, message: InboundMessage) -> Result<()> {
        if caller != self.transport.address() {
            return Err(ToftError::InvalidEndpointCaller { caller });
        }
        if !self
            .remotes
            .is_trusted(message.source_chain_id, message.source_address)
        {
            return Err(ToftError::UntrustedRemote {
                chain_id: message.source_chain_id,
                address: message.source_address,
            });
        }

        match Payload::decode(&message.payload)? {
            Payload::Transfer { recipient, amount } => {
                self.mint(recipient, amount)?;
                info!(
                    token = %self.instance.address,
                    source_chain_id = %message.source_chain_id,
                    recipient = %recipient,
                    amount = %amount,
                    nonce = message.nonce,
                    total_supply = %self.total_supply,
                    event = "received"
                );
                Ok(())
            }
            Payload::StrategyDeposit {
                from,
                recipient,
                amount,
                asset_id,
            } => self.receive_strategy_deposit(
                message.source_chain_id,
                from,
                recipient,
                amount,
                asset_id,
            ),
            Payload::StrategyWithdraw {
                owner,
                amount,
                asset_id,
            } => self.receive_strategy_withdraw(
                message.source_chain_id,
                message.source_address,
                owner,
                amount,
                asset_id,
            ),
        }
    }
}

impl<A: UnderlyingAsset, T: MessageTransport> MessageReceiver for BridgeToken<A, T> {
    fn receiver_id(&self) -> (BridgeChainId, Address) {
        (self.instance.bridge_chain_id, self.instance.address)
    }

    fn receive_native(&mut self, amount: U256) {
        self.native_balance = self.native_balance.saturating_add(amount);
        debug!(
            token = %self.instance.address,
            amount = %amount,
            native_balance = %self.native_balance,
            event = "native_received"
        );
    }

    /// Only the local endpoint may call this, for messages from a trusted
    /// remote. Any error leaves the token untouched.
    fn on_receive(&mut self, caller: Address, message: InboundMessage) -> Result<()> {
        let span = spans::on_receive(
            self.instance.bridge_chain_id,
            message.source_chain_id,
            message.source_address,
            message.nonce,
        );
        let _guard = span.enter();

        self.try_on_receive(caller, message)
            .inspect_err(spans::record_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::encode_recipient;
    use crate::testing::InMemoryErc20;
    use crate::token::{TokenInstance, TokenMetadata};
    use crate::transport::{LocalEndpoint, LocalNetwork};
    use alloy_primitives::address;

    const OWNER: Address = address!("00000000000000000000000000000000000fac01");
    const ENDPOINT: Address = address!("00000000000000000000000000000000000e0001");
    const TOKEN: Address = address!("0000000000000000000000000000000000070f70");
    const REMOTE: Address = address!("0000000000000000000000000000000000070f71");
    const ALICE: Address = address!("00000000000000000000000000000000000a11ce");
    const BOB: Address = address!("0000000000000000000000000000000000000b0b");

    const LOCAL_CHAIN: BridgeChainId = BridgeChainId::new(10);
    const REMOTE_CHAIN: BridgeChainId = BridgeChainId::new(20);

    fn linked_token() -> (BridgeToken<InMemoryErc20, LocalEndpoint>, LocalNetwork) {
        let network = LocalNetwork::default();
        network.endpoint(REMOTE_CHAIN, address!("00000000000000000000000000000000000e0002"));
        let instance = TokenInstance {
            chain_id: 10,
            bridge_chain_id: LOCAL_CHAIN,
            address: TOKEN,
            host_chain_id: 1,
            is_host_chain: false,
            underlying_asset: Address::ZERO,
            vault: None,
            metadata: TokenMetadata {
                name: "Tapioca OFT".to_string(),
                symbol: "TOFT".to_string(),
                decimals: 18,
            },
        };
        let token = BridgeToken::new(
            instance,
            OWNER,
            network.endpoint(LOCAL_CHAIN, ENDPOINT),
            None,
        )
        .unwrap();
        (token, network)
    }

    fn inbound(source_address: Address, recipient: Address, amount: u64) -> InboundMessage {
        InboundMessage {
            source_chain_id: REMOTE_CHAIN,
            source_address,
            nonce: 1,
            payload: Payload::Transfer {
                recipient,
                amount: U256::from(amount),
            }
            .encode(),
        }
    }

    fn params() -> CallParams {
        CallParams::builder().refund_address(ALICE).build()
    }

    #[test]
    fn test_send_requires_trusted_remote() {
        let (mut token, network) = linked_token();
        token.mint(ALICE, U256::from(100u64)).unwrap();

        let err = token
            .send_from(
                ALICE,
                ALICE,
                REMOTE_CHAIN,
                &encode_recipient(BOB),
                U256::from(100u64),
                params(),
                U256::ZERO,
            )
            .unwrap_err();
        assert!(matches!(err, ToftError::UntrustedRemote { .. }));
        assert_eq!(token.total_supply(), U256::from(100u64));
        assert_eq!(network.pending_count(), 0);

        token
            .set_trusted_remote(OWNER, REMOTE_CHAIN, REMOTE, true)
            .unwrap();
        let nonce = token
            .send_from(
                ALICE,
                ALICE,
                REMOTE_CHAIN,
                &encode_recipient(BOB),
                U256::from(100u64),
                params(),
                U256::ZERO,
            )
            .unwrap();
        assert_eq!(nonce, 1);
        assert_eq!(token.total_supply(), U256::ZERO);
        assert_eq!(network.pending_count(), 1);
    }

    #[test]
    fn test_send_checks_allowance_balance_then_fee() {
        let (mut token, network) = linked_token();
        token
            .set_trusted_remote(OWNER, REMOTE_CHAIN, REMOTE, true)
            .unwrap();
        token.mint(ALICE, U256::from(50u64)).unwrap();
        let to = encode_recipient(BOB);

        let err = token
            .send_from(
                BOB,
                ALICE,
                REMOTE_CHAIN,
                &to,
                U256::from(10u64),
                params(),
                U256::ZERO,
            )
            .unwrap_err();
        assert!(matches!(err, ToftError::InsufficientAllowance { .. }));

        let err = token
            .send_from(
                ALICE,
                ALICE,
                REMOTE_CHAIN,
                &to,
                U256::from(60u64),
                params(),
                U256::ZERO,
            )
            .unwrap_err();
        assert!(matches!(err, ToftError::InsufficientBalance { .. }));

        network.set_fee_schedule(
            crate::config::FeeSchedule::default().with_base_fee(U256::from(5u64)),
        );
        let err = token
            .send_from(
                ALICE,
                ALICE,
                REMOTE_CHAIN,
                &to,
                U256::from(10u64),
                params(),
                U256::from(4u64),
            )
            .unwrap_err();
        assert!(matches!(err, ToftError::InsufficientMessageFee { .. }));
        assert_eq!(token.balance_of(ALICE), U256::from(50u64));
        assert_eq!(network.pending_count(), 0);

        let estimate = token
            .estimate_send_fee(REMOTE_CHAIN, &to, U256::from(10u64), &AdapterParams::Default)
            .unwrap();
        assert_eq!(estimate.native_fee, U256::from(5u64));
    }

    #[test]
    fn test_send_on_behalf_spends_allowance() {
        let (mut token, _) = linked_token();
        token
            .set_trusted_remote(OWNER, REMOTE_CHAIN, REMOTE, true)
            .unwrap();
        token.mint(ALICE, U256::from(50u64)).unwrap();
        token.approve(ALICE, BOB, U256::from(20u64));

        token
            .send_from(
                BOB,
                ALICE,
                REMOTE_CHAIN,
                &encode_recipient(BOB),
                U256::from(20u64),
                params(),
                U256::ZERO,
            )
            .unwrap();
        assert_eq!(token.allowance(ALICE, BOB), U256::ZERO);
        assert_eq!(token.balance_of(ALICE), U256::from(30u64));
    }

    #[test]
    fn test_receive_mints_from_trusted_remote() {
        let (mut token, _) = linked_token();
        token
            .set_trusted_remote(OWNER, REMOTE_CHAIN, REMOTE, true)
            .unwrap();

        token
            .on_receive(ENDPOINT, inbound(REMOTE, BOB, 100))
            .unwrap();
        assert_eq!(token.balance_of(BOB), U256::from(100u64));
        assert_eq!(token.total_supply(), U256::from(100u64));
    }

    #[test]
    fn test_forged_messages_rejected() {
        let (mut token, _) = linked_token();
        token
            .set_trusted_remote(OWNER, REMOTE_CHAIN, REMOTE, true)
            .unwrap();

        let err = token
            .on_receive(ENDPOINT, inbound(BOB, BOB, 100))
            .unwrap_err();
        assert!(matches!(
            err,
            ToftError::UntrustedRemote { address, .. } if address == BOB
        ));

        let err = token
            .on_receive(ALICE, inbound(REMOTE, BOB, 100))
            .unwrap_err();
        assert!(matches!(err, ToftError::InvalidEndpointCaller { .. }));

        let mut garbage = inbound(REMOTE, BOB, 100);
        garbage.payload = Bytes::from_static(&[1, 2, 3]);
        assert!(token.on_receive(ENDPOINT, garbage).is_err());

        assert_eq!(token.total_supply(), U256::ZERO);
        assert_eq!(token.balance_of(BOB), U256::ZERO);
    }

    #[test]
    fn test_disabled_remote_rejected() {
        let (mut token, _) = linked_token();
        token
            .set_trusted_remote(OWNER, REMOTE_CHAIN, REMOTE, true)
            .unwrap();
        token
            .set_trusted_remote(OWNER, REMOTE_CHAIN, REMOTE, false)
            .unwrap();

        assert!(token
            .on_receive(ENDPOINT, inbound(REMOTE, BOB, 1))
            .is_err());
    }

    #[test]
    fn test_airdrop_increases_native_balance() {
        let (mut token, _) = linked_token();
        token.receive_native(U256::from(3u64));
        token.fund_native(U256::from(4u64));
        assert_eq!(token.native_balance(), U256::from(7u64));
        assert_eq!(token.receiver_id(), (LOCAL_CHAIN, TOKEN));
    }
}
