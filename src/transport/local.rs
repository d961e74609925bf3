//! In-process messaging network
//!
//! [`LocalNetwork`] simulates the messaging layer between any number of
//! chains inside one process. Every chain gets a [`LocalEndpoint`]; sends
//! are queued per channel and only reach their destination when someone
//! (usually the [`Relayer`](crate::Relayer)) delivers them.
//!
//! Guarantees:
//!
//! - nonces are assigned per channel, starting at 1
//! - delivery is FIFO within a channel; channels are independent
//! - each message is executed at most once by the delivery loop
//! - a message whose execution fails becomes a stored payload that blocks its
//!   channel until [`LocalNetwork::retry_payload`] succeeds or
//!   [`LocalNetwork::force_resume`] drops it
//!
//! The network lock is never held while a receiver runs, so receivers may
//! send from inside `on_receive`.

use std::collections::{BTreeMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use alloy_primitives::{Address, U256};
use tracing::{debug, info, warn};

use super::{FeeEstimate, MessageReceiver, MessageTransport, SendRequest};
use crate::chain::BridgeChainId;
use crate::config::FeeSchedule;
use crate::error::{Result, ToftError};
use crate::protocol::{AdapterParams, MessageNonce, OutboundMessage};

/// Ordered message lane between two instances
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Channel {
    pub src_chain_id: BridgeChainId,
    pub src_address: Address,
    pub dst_chain_id: BridgeChainId,
    pub dst_address: Address,
}

impl Channel {
    pub fn of(message: &OutboundMessage) -> Self {
        Self {
            src_chain_id: message.source_chain_id,
            src_address: message.source_address,
            dst_chain_id: message.destination_chain_id,
            dst_address: message.destination_address,
        }
    }

    pub fn destination(&self) -> (BridgeChainId, Address) {
        (self.dst_chain_id, self.dst_address)
    }

    fn blocked(&self) -> ToftError {
        ToftError::ChannelBlocked {
            src_chain_id: self.src_chain_id,
            src_address: self.src_address,
        }
    }

    fn nothing_stored(&self) -> ToftError {
        ToftError::NoStoredPayload {
            src_chain_id: self.src_chain_id,
            src_address: self.src_address,
        }
    }
}

/// A message whose execution failed at the destination
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredPayload {
    pub message: OutboundMessage,
    /// Error of the most recent execution attempt
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Delivered { nonce: MessageNonce },
    Stored { nonce: MessageNonce, reason: String },
}

impl DeliveryOutcome {
    pub fn is_stored(&self) -> bool {
        matches!(self, Self::Stored { .. })
    }
}

/// Counts of one or more delivery passes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    pub delivered: usize,
    pub stored: usize,
}

impl DeliveryReport {
    pub fn is_empty(&self) -> bool {
        self.delivered == 0 && self.stored == 0
    }

    pub fn merge(&mut self, other: DeliveryReport) {
        self.delivered += other.delivered;
        self.stored += other.stored;
    }

    fn record(&mut self, outcome: &DeliveryOutcome) {
        match outcome {
            DeliveryOutcome::Delivered { .. } => self.delivered += 1,
            DeliveryOutcome::Stored { .. } => self.stored += 1,
        }
    }
}

#[derive(Debug, Default)]
struct NetworkState {
    fee_schedule: FeeSchedule,
    endpoints: BTreeMap<BridgeChainId, Address>,
    outbound_nonces: BTreeMap<Channel, MessageNonce>,
    inbound_nonces: BTreeMap<Channel, MessageNonce>,
    queues: BTreeMap<Channel, VecDeque<OutboundMessage>>,
    stored: BTreeMap<Channel, StoredPayload>,
    collected_fees: BTreeMap<BridgeChainId, U256>,
    refunds: BTreeMap<Address, U256>,
    airdrops: BTreeMap<(BridgeChainId, Address), U256>,
}

impl NetworkState {
    fn quote(&self, payload_len: usize, adapter_params: &AdapterParams) -> Result<U256> {
        let schedule = &self.fee_schedule;
        let gas = U256::from(adapter_params.gas_limit(schedule.default_gas_limit));
        let airdrop = adapter_params
            .airdrop()
            .map(|(amount, _)| amount)
            .unwrap_or_default();

        schedule
            .per_byte_fee
            .checked_mul(U256::from(payload_len))
            .and_then(|bytes_fee| {
                schedule
                    .gas_price
                    .checked_mul(gas)?
                    .checked_add(bytes_fee)
            })
            .and_then(|fee| fee.checked_add(schedule.base_fee))
            .and_then(|fee| fee.checked_add(airdrop))
            .ok_or(ToftError::Overflow)
    }

    fn endpoint_address(&self, chain_id: BridgeChainId) -> Result<Address> {
        self.endpoints
            .get(&chain_id)
            .copied()
            .ok_or_else(|| ToftError::UnknownChain(format!("bridge chain id {chain_id}")))
    }
}

/// Shared handle on the simulated messaging layer
#[derive(Debug, Clone, Default)]
pub struct LocalNetwork {
    state: Arc<Mutex<NetworkState>>,
}

impl LocalNetwork {
    pub fn new(fee_schedule: FeeSchedule) -> Self {
        let network = Self::default();
        network.lock().fee_schedule = fee_schedule;
        network
    }

    /// Registers the endpoint of a chain and returns a transport handle on it.
    pub fn endpoint(&self, chain_id: BridgeChainId, address: Address) -> LocalEndpoint {
        self.lock().endpoints.insert(chain_id, address);
        LocalEndpoint {
            network: self.clone(),
            chain_id,
            address,
        }
    }

    pub fn fee_schedule(&self) -> FeeSchedule {
        self.lock().fee_schedule
    }

    pub fn set_fee_schedule(&self, fee_schedule: FeeSchedule) {
        self.lock().fee_schedule = fee_schedule;
    }

    /// Messages accepted but not yet executed, across all channels.
    pub fn pending_count(&self) -> usize {
        self.lock().queues.values().map(VecDeque::len).sum()
    }

    pub fn pending(&self, channel: Channel) -> Vec<OutboundMessage> {
        self.lock()
            .queues
            .get(&channel)
            .map(|queue| queue.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn outbound_nonce(&self, channel: Channel) -> MessageNonce {
        self.lock()
            .outbound_nonces
            .get(&channel)
            .copied()
            .unwrap_or_default()
    }

    /// Nonce of the last message taken off the channel at the destination.
    pub fn inbound_nonce(&self, channel: Channel) -> MessageNonce {
        self.lock()
            .inbound_nonces
            .get(&channel)
            .copied()
            .unwrap_or_default()
    }

    pub fn stored_payload(&self, channel: Channel) -> Option<StoredPayload> {
        self.lock().stored.get(&channel).cloned()
    }

    pub fn stored_payloads(&self) -> Vec<StoredPayload> {
        self.lock().stored.values().cloned().collect()
    }

    /// Fees kept by the messaging layer for sends from `chain_id`.
    pub fn collected_fees(&self, chain_id: BridgeChainId) -> U256 {
        self.lock()
            .collected_fees
            .get(&chain_id)
            .copied()
            .unwrap_or_default()
    }

    /// Overpaid native fees returned to `address`.
    pub fn refund_of(&self, address: Address) -> U256 {
        self.lock().refunds.get(&address).copied().unwrap_or_default()
    }

    /// Airdrops delivered to an address that is not a message receiver.
    pub fn airdropped(&self, chain_id: BridgeChainId, address: Address) -> U256 {
        self.lock()
            .airdrops
            .get(&(chain_id, address))
            .copied()
            .unwrap_or_default()
    }

    /// Executes the oldest pending message of `channel`.
    ///
    /// Returns `Ok(None)` when the channel is empty.
    ///
    /// # Errors
    ///
    /// `ChannelBlocked` while the channel holds a stored payload. A failing
    /// receiver is not an error here: it yields [`DeliveryOutcome::Stored`].
    pub fn deliver_next(
        &self,
        channel: Channel,
        receiver: &mut dyn MessageReceiver,
    ) -> Result<Option<DeliveryOutcome>> {
        ensure_serves(receiver, channel)?;

        let (message, endpoint) = {
            let mut state = self.lock();
            if state.stored.contains_key(&channel) {
                return Err(channel.blocked());
            }
            let endpoint = state.endpoint_address(channel.dst_chain_id)?;
            let Some(message) = state.queues.get_mut(&channel).and_then(VecDeque::pop_front)
            else {
                return Ok(None);
            };
            if state.queues.get(&channel).is_some_and(VecDeque::is_empty) {
                state.queues.remove(&channel);
            }
            state.inbound_nonces.insert(channel, message.nonce);
            (message, endpoint)
        };

        if let Some((amount, beneficiary)) = message.adapter_params.airdrop() {
            if receiver.receiver_id() == (channel.dst_chain_id, beneficiary) {
                receiver.receive_native(amount);
            } else {
                *self
                    .lock()
                    .airdrops
                    .entry((channel.dst_chain_id, beneficiary))
                    .or_default() += amount;
            }
        }

        let outcome = match receiver.on_receive(endpoint, message.to_inbound()) {
            Ok(()) => {
                debug!(
                    src_chain_id = %channel.src_chain_id,
                    dst_chain_id = %channel.dst_chain_id,
                    nonce = message.nonce,
                    event = "message_delivered"
                );
                DeliveryOutcome::Delivered {
                    nonce: message.nonce,
                }
            }
            Err(e) => {
                let reason = e.to_string();
                warn!(
                    src_chain_id = %channel.src_chain_id,
                    src_address = %channel.src_address,
                    dst_chain_id = %channel.dst_chain_id,
                    nonce = message.nonce,
                    error = %e,
                    event = "payload_stored"
                );
                let nonce = message.nonce;
                self.lock().stored.insert(
                    channel,
                    StoredPayload {
                        message,
                        reason: reason.clone(),
                    },
                );
                DeliveryOutcome::Stored { nonce, reason }
            }
        };

        Ok(Some(outcome))
    }

    /// One delivery pass over the messages queued when the pass starts.
    ///
    /// Channels without a matching receiver, and blocked channels, are
    /// skipped. Messages sent by receivers during the pass wait for the next
    /// one.
    pub fn deliver_pending(&self, receivers: &mut [&mut dyn MessageReceiver]) -> DeliveryReport {
        let snapshot: Vec<(Channel, usize)> = {
            let state = self.lock();
            state
                .queues
                .iter()
                .filter(|(channel, _)| !state.stored.contains_key(*channel))
                .map(|(channel, queue)| (*channel, queue.len()))
                .collect()
        };

        let mut report = DeliveryReport::default();
        for (channel, queued) in snapshot {
            let Some(receiver) = receivers
                .iter_mut()
                .find(|receiver| receiver.receiver_id() == channel.destination())
            else {
                continue;
            };

            for _ in 0..queued {
                match self.deliver_next(channel, &mut **receiver) {
                    Ok(Some(outcome)) => {
                        report.record(&outcome);
                        if outcome.is_stored() {
                            break;
                        }
                    }
                    Ok(None) => break,
                    Err(e) => {
                        debug!(error = %e, event = "channel_skipped");
                        break;
                    }
                }
            }
        }
        report
    }

    /// Messages the given receivers could execute right now.
    pub fn deliverable(&self, receivers: &[&mut dyn MessageReceiver]) -> usize {
        let state = self.lock();
        state
            .queues
            .iter()
            .filter(|(channel, _)| !state.stored.contains_key(*channel))
            .filter(|(channel, _)| {
                receivers
                    .iter()
                    .any(|receiver| receiver.receiver_id() == channel.destination())
            })
            .map(|(_, queue)| queue.len())
            .sum()
    }

    /// Re-executes the stored payload of `channel`.
    ///
    /// On success the payload is cleared and the channel resumes. On failure
    /// it stays stored and the receiver's error is returned.
    pub fn retry_payload(
        &self,
        channel: Channel,
        receiver: &mut dyn MessageReceiver,
    ) -> Result<()> {
        ensure_serves(receiver, channel)?;

        let (stored, endpoint) = {
            let state = self.lock();
            let stored = state
                .stored
                .get(&channel)
                .cloned()
                .ok_or_else(|| channel.nothing_stored())?;
            (stored, state.endpoint_address(channel.dst_chain_id)?)
        };

        match receiver.on_receive(endpoint, stored.message.to_inbound()) {
            Ok(()) => {
                self.lock().stored.remove(&channel);
                info!(
                    src_chain_id = %channel.src_chain_id,
                    nonce = stored.message.nonce,
                    event = "payload_retried"
                );
                Ok(())
            }
            Err(e) => {
                if let Some(payload) = self.lock().stored.get_mut(&channel) {
                    payload.reason = e.to_string();
                }
                Err(e)
            }
        }
    }

    /// Drops the stored payload of `channel` without executing it.
    ///
    /// Whatever the message carried is lost for good; the returned payload is
    /// the only remaining record of it.
    pub fn force_resume(&self, channel: Channel) -> Result<StoredPayload> {
        let payload = self
            .lock()
            .stored
            .remove(&channel)
            .ok_or_else(|| channel.nothing_stored())?;

        warn!(
            src_chain_id = %channel.src_chain_id,
            src_address = %channel.src_address,
            nonce = payload.message.nonce,
            event = "payload_dropped"
        );
        Ok(payload)
    }

    fn accept(&self, source_chain_id: BridgeChainId, request: SendRequest) -> Result<MessageNonce> {
        let mut state = self.lock();
        state.endpoint_address(request.destination_chain_id)?;

        let required = state.quote(request.payload.len(), &request.adapter_params)?;
        if request.native_fee < required {
            return Err(ToftError::InsufficientMessageFee {
                required,
                provided: request.native_fee,
            });
        }

        let channel = Channel {
            src_chain_id: source_chain_id,
            src_address: request.source_address,
            dst_chain_id: request.destination_chain_id,
            dst_address: request.destination_address,
        };
        let nonce = {
            let counter = state.outbound_nonces.entry(channel).or_default();
            *counter += 1;
            *counter
        };

        let airdrop = request
            .adapter_params
            .airdrop()
            .map(|(amount, _)| amount)
            .unwrap_or_default();
        *state.collected_fees.entry(source_chain_id).or_default() += required - airdrop;
        let refund = request.native_fee - required;
        if !refund.is_zero() {
            *state.refunds.entry(request.refund_address).or_default() += refund;
        }

        debug!(
            src_chain_id = %source_chain_id,
            dst_chain_id = %request.destination_chain_id,
            nonce = nonce,
            payload_len = request.payload.len(),
            native_fee = %required,
            event = "message_accepted"
        );

        state.queues.entry(channel).or_default().push_back(OutboundMessage {
            source_chain_id,
            source_address: request.source_address,
            destination_chain_id: request.destination_chain_id,
            destination_address: request.destination_address,
            nonce,
            payload: request.payload,
            adapter_params: request.adapter_params,
        });

        Ok(nonce)
    }

    fn lock(&self) -> MutexGuard<'_, NetworkState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn ensure_serves(receiver: &dyn MessageReceiver, channel: Channel) -> Result<()> {
    let (chain_id, address) = receiver.receiver_id();
    if (chain_id, address) != channel.destination() {
        return Err(ToftError::InvalidConfig(format!(
            "receiver {address} on {chain_id} does not serve channel to {} on {}",
            channel.dst_address, channel.dst_chain_id
        )));
    }
    Ok(())
}

/// One chain's endpoint on a [`LocalNetwork`]
#[derive(Debug, Clone)]
pub struct LocalEndpoint {
    network: LocalNetwork,
    chain_id: BridgeChainId,
    address: Address,
}

impl LocalEndpoint {
    pub fn network(&self) -> &LocalNetwork {
        &self.network
    }
}

impl MessageTransport for LocalEndpoint {
    fn bridge_chain_id(&self) -> BridgeChainId {
        self.chain_id
    }

    fn address(&self) -> Address {
        self.address
    }

    fn estimate_fee(
        &self,
        destination_chain_id: BridgeChainId,
        payload: &[u8],
        adapter_params: &AdapterParams,
    ) -> Result<FeeEstimate> {
        let state = self.network.lock();
        state.endpoint_address(destination_chain_id)?;
        Ok(FeeEstimate {
            native_fee: state.quote(payload.len(), adapter_params)?,
            zro_fee: U256::ZERO,
        })
    }

    fn send(&self, request: SendRequest) -> Result<MessageNonce> {
        self.network.accept(self.chain_id, request)
    }
}
