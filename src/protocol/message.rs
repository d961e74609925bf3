//! Cross-chain message format
//!
//! Every message carried between token instances is an ABI-encoded envelope
//! `(uint16 packetType, bytes body)`. The body is one of three fixed tuples:
//!
//! - `TRANSFER`: `(bytes32 recipient, uint256 amount)`
//! - `STRATEGY_DEPOSIT`: `(bytes32 from, bytes32 recipient, uint256 amount, uint256 assetId)`
//! - `STRATEGY_WITHDRAW`: `(bytes32 owner, uint256 amount, uint256 assetId)`
//!
//! Addresses travel left-padded to 32 bytes, the same way the sender encodes
//! the `toAddress` it hands to `send_from`.

use std::fmt;

use alloy_primitives::{Address, Bytes, B256, U256};
use alloy_sol_types::{sol, SolValue};

use super::AdapterParams;
use crate::chain::BridgeChainId;
use crate::error::{Result, ToftError};

/// Per-channel sequence number assigned by the transport at send time
pub type MessageNonce = u64;

sol! {
    struct TransferBody {
        bytes32 recipient;
        uint256 amount;
    }

    struct StrategyDepositBody {
        bytes32 from;
        bytes32 recipient;
        uint256 amount;
        uint256 asset_id;
    }

    struct StrategyWithdrawBody {
        bytes32 owner;
        uint256 amount;
        uint256 asset_id;
    }
}

/// Packet type tag of a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum PayloadKind {
    /// Plain cross-chain transfer of claim tokens
    Transfer = 0,
    /// Claim tokens credited to a strategy account on the destination
    StrategyDeposit = 1,
    /// Request to pull funds out of a remote strategy account
    StrategyWithdraw = 2,
}

impl PayloadKind {
    #[inline]
    pub const fn as_u16(self) -> u16 {
        self as u16
    }

    #[inline]
    pub const fn from_u16(value: u16) -> Option<Self> {
        match value {
            0 => Some(Self::Transfer),
            1 => Some(Self::StrategyDeposit),
            2 => Some(Self::StrategyWithdraw),
            _ => None,
        }
    }

    #[inline]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Transfer => "TRANSFER",
            Self::StrategyDeposit => "STRATEGY_DEPOSIT",
            Self::StrategyWithdraw => "STRATEGY_WITHDRAW",
        }
    }
}

impl fmt::Display for PayloadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Decoded message payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    Transfer {
        recipient: Address,
        amount: U256,
    },
    StrategyDeposit {
        from: Address,
        recipient: Address,
        amount: U256,
        asset_id: U256,
    },
    StrategyWithdraw {
        owner: Address,
        amount: U256,
        asset_id: U256,
    },
}

impl Payload {
    pub fn kind(&self) -> PayloadKind {
        match self {
            Self::Transfer { .. } => PayloadKind::Transfer,
            Self::StrategyDeposit { .. } => PayloadKind::StrategyDeposit,
            Self::StrategyWithdraw { .. } => PayloadKind::StrategyWithdraw,
        }
    }

    pub fn amount(&self) -> U256 {
        match self {
            Self::Transfer { amount, .. }
            | Self::StrategyDeposit { amount, .. }
            | Self::StrategyWithdraw { amount, .. } => *amount,
        }
    }

    /// Encodes the payload into its wire envelope.
    pub fn encode(&self) -> Bytes {
        let body = match self {
            Self::Transfer { recipient, amount } => TransferBody {
                recipient: recipient.into_word(),
                amount: *amount,
            }
            .abi_encode(),
            Self::StrategyDeposit {
                from,
                recipient,
                amount,
                asset_id,
            } => StrategyDepositBody {
                from: from.into_word(),
                recipient: recipient.into_word(),
                amount: *amount,
                asset_id: *asset_id,
            }
            .abi_encode(),
            Self::StrategyWithdraw {
                owner,
                amount,
                asset_id,
            } => StrategyWithdrawBody {
                owner: owner.into_word(),
                amount: *amount,
                asset_id: *asset_id,
            }
            .abi_encode(),
        };

        Bytes::from((self.kind().as_u16(), Bytes::from(body)).abi_encode())
    }

    /// Decodes a wire envelope.
    ///
    /// Fails on unknown packet types and on addresses that are not left-padded
    /// 20-byte values.
    pub fn decode(data: &[u8]) -> Result<Self> {
        let (packet_type, body) = <(u16, Bytes) as SolValue>::abi_decode(data)?;
        let kind = PayloadKind::from_u16(packet_type).ok_or_else(|| {
            ToftError::InvalidPayload(format!("unknown packet type {packet_type}"))
        })?;

        match kind {
            PayloadKind::Transfer => {
                let body = <TransferBody as SolValue>::abi_decode(&body)?;
                Ok(Self::Transfer {
                    recipient: word_to_address(body.recipient)?,
                    amount: body.amount,
                })
            }
            PayloadKind::StrategyDeposit => {
                let body = <StrategyDepositBody as SolValue>::abi_decode(&body)?;
                Ok(Self::StrategyDeposit {
                    from: word_to_address(body.from)?,
                    recipient: word_to_address(body.recipient)?,
                    amount: body.amount,
                    asset_id: body.asset_id,
                })
            }
            PayloadKind::StrategyWithdraw => {
                let body = <StrategyWithdrawBody as SolValue>::abi_decode(&body)?;
                Ok(Self::StrategyWithdraw {
                    owner: word_to_address(body.owner)?,
                    amount: body.amount,
                    asset_id: body.asset_id,
                })
            }
        }
    }
}

/// Encodes a recipient the way `send_from` expects its `to_address` argument.
pub fn encode_recipient(recipient: Address) -> Bytes {
    Bytes::from(recipient.abi_encode())
}

/// Decodes a `to_address` argument back into an EVM address.
pub fn decode_recipient(to_address: &[u8]) -> Result<Address> {
    if to_address.len() != 32 {
        return Err(ToftError::InvalidPayload(format!(
            "recipient must be 32 bytes, got {}",
            to_address.len()
        )));
    }
    word_to_address(B256::from_slice(to_address))
}

fn word_to_address(word: B256) -> Result<Address> {
    if word[..12].iter().any(|byte| *byte != 0) {
        return Err(ToftError::InvalidPayload(format!(
            "{word} is not a padded address"
        )));
    }
    Ok(Address::from_word(word))
}

/// A message as accepted by the transport on the source chain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    pub source_chain_id: BridgeChainId,
    pub source_address: Address,
    pub destination_chain_id: BridgeChainId,
    pub destination_address: Address,
    pub nonce: MessageNonce,
    pub payload: Bytes,
    pub adapter_params: AdapterParams,
}

impl OutboundMessage {
    pub fn decode_payload(&self) -> Result<Payload> {
        Payload::decode(&self.payload)
    }

    /// The view of this message handed to the destination instance.
    pub fn to_inbound(&self) -> InboundMessage {
        InboundMessage {
            source_chain_id: self.source_chain_id,
            source_address: self.source_address,
            nonce: self.nonce,
            payload: self.payload.clone(),
        }
    }
}

/// A message as delivered to the destination instance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub source_chain_id: BridgeChainId,
    pub source_address: Address,
    pub nonce: MessageNonce,
    pub payload: Bytes,
}
