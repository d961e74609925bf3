// SPDX-FileCopyrightText: 2025 Tapioca DAO Contributors
//
// SPDX-License-Identifier: Apache-2.0
//! Cross-chain messaging seam
//!
//! A [`MessageTransport`] is the local handle on a chain's messaging
//! endpoint: token instances quote and send through it. On the destination
//! side the endpoint calls back into a [`MessageReceiver`]. Delivery happens
//! later and elsewhere, driven by a relayer; `send` returning is no promise
//! that the message will ever arrive.
//!
//! [`LocalNetwork`] is an in-process implementation connecting any number of
//! simulated chains.

mod local;

use alloy_primitives::{Address, Bytes, U256};
use bon::Builder;
use serde::{Deserialize, Serialize};

use crate::chain::BridgeChainId;
use crate::error::Result;
use crate::protocol::{AdapterParams, InboundMessage, MessageNonce};

pub use local::{
    Channel, DeliveryOutcome, DeliveryReport, LocalEndpoint, LocalNetwork, StoredPayload,
};

/// Messaging cost quoted by the endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeEstimate {
    pub native_fee: U256,
    pub zro_fee: U256,
}

/// An outbound message handed to the endpoint
#[derive(Builder, Debug, Clone, PartialEq, Eq)]
pub struct SendRequest {
    /// Sending token instance
    pub source_address: Address,
    pub destination_chain_id: BridgeChainId,
    pub destination_address: Address,
    pub payload: Bytes,
    /// Receives whatever part of `native_fee` the endpoint did not need
    pub refund_address: Address,
    #[builder(default)]
    pub adapter_params: AdapterParams,
    /// Native currency attached to the send
    #[builder(default)]
    pub native_fee: U256,
}

pub trait MessageTransport {
    /// Messaging chain id of the chain this endpoint lives on
    fn bridge_chain_id(&self) -> BridgeChainId;

    /// Endpoint address; the only caller allowed to deliver inbound messages
    fn address(&self) -> Address;

    fn estimate_fee(
        &self,
        destination_chain_id: BridgeChainId,
        payload: &[u8],
        adapter_params: &AdapterParams,
    ) -> Result<FeeEstimate>;

    /// Accepts a message for delivery and returns the nonce assigned on its
    /// channel.
    ///
    /// # Errors
    ///
    /// `InsufficientMessageFee` if `native_fee` is below the estimate. A
    /// failed send leaves nothing queued.
    fn send(&self, request: SendRequest) -> Result<MessageNonce>;
}

/// Destination side of the transport.
pub trait MessageReceiver {
    /// `(chain, address)` the endpoint delivers to
    fn receiver_id(&self) -> (BridgeChainId, Address);

    /// Credits a native airdrop attached to an inbound message.
    fn receive_native(&mut self, amount: U256);

    /// Applies an inbound message.
    ///
    /// An error leaves the receiver untouched; the endpoint keeps the message
    /// as a stored payload.
    fn on_receive(&mut self, caller: Address, message: InboundMessage) -> Result<()>;
}
