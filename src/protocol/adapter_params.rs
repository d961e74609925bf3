//! Relayer instructions attached to an outbound message
//!
//! Adapter params tell the relayer how much gas to provision for the
//! destination call and, optionally, how much native currency to airdrop to
//! an address on the destination chain. They use the packed layout the
//! messaging layer expects:
//!
//! - version 1: `uint16(1) ++ uint256 gasLimit` (34 bytes)
//! - version 2: `uint16(2) ++ uint256 gasLimit ++ uint256 nativeForDst ++ address addressOnDst` (86 bytes)
//!
//! An empty byte string selects the default gas budget.

use alloy_primitives::{Address, Bytes, U256};

use crate::error::{Result, ToftError};

const V1_LEN: usize = 2 + 32;
const V2_LEN: usize = 2 + 32 + 32 + 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AdapterParams {
    /// No instructions: default destination gas, no airdrop
    #[default]
    Default,
    /// Custom destination gas
    V1 { gas_limit: u64 },
    /// Custom destination gas plus a native airdrop on the destination chain
    V2 {
        gas_limit: u64,
        native_for_dst: U256,
        address_on_dst: Address,
    },
}

impl AdapterParams {
    /// Gas the relayer must provision, falling back to `default_gas`.
    pub fn gas_limit(&self, default_gas: u64) -> u64 {
        match self {
            Self::Default => default_gas,
            Self::V1 { gas_limit } | Self::V2 { gas_limit, .. } => *gas_limit,
        }
    }

    /// Native amount and beneficiary of the destination airdrop, if any.
    pub fn airdrop(&self) -> Option<(U256, Address)> {
        match self {
            Self::V2 {
                native_for_dst,
                address_on_dst,
                ..
            } if !native_for_dst.is_zero() => Some((*native_for_dst, *address_on_dst)),
            _ => None,
        }
    }

    pub fn encode(&self) -> Bytes {
        match self {
            Self::Default => Bytes::new(),
            Self::V1 { gas_limit } => {
                let mut bytes = Vec::with_capacity(V1_LEN);
                bytes.extend_from_slice(&1u16.to_be_bytes());
                bytes.extend_from_slice(&U256::from(*gas_limit).to_be_bytes::<32>());
                Bytes::from(bytes)
            }
            Self::V2 {
                gas_limit,
                native_for_dst,
                address_on_dst,
            } => {
                let mut bytes = Vec::with_capacity(V2_LEN);
                bytes.extend_from_slice(&2u16.to_be_bytes());
                bytes.extend_from_slice(&U256::from(*gas_limit).to_be_bytes::<32>());
                bytes.extend_from_slice(&native_for_dst.to_be_bytes::<32>());
                bytes.extend_from_slice(address_on_dst.as_slice());
                Bytes::from(bytes)
            }
        }
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.is_empty() {
            return Ok(Self::Default);
        }
        if bytes.len() < 2 {
            return Err(ToftError::InvalidPayload(
                "adapter params shorter than version tag".to_string(),
            ));
        }

        let version = u16::from_be_bytes([bytes[0], bytes[1]]);
        match (version, bytes.len()) {
            (1, V1_LEN) => Ok(Self::V1 {
                gas_limit: gas_from_word(&bytes[2..34])?,
            }),
            (2, V2_LEN) => Ok(Self::V2 {
                gas_limit: gas_from_word(&bytes[2..34])?,
                native_for_dst: U256::from_be_slice(&bytes[34..66]),
                address_on_dst: Address::from_slice(&bytes[66..86]),
            }),
            (version, len) => Err(ToftError::InvalidPayload(format!(
                "adapter params version {version} with length {len}"
            ))),
        }
    }
}

fn gas_from_word(word: &[u8]) -> Result<u64> {
    u64::try_from(U256::from_be_slice(word))
        .map_err(|_| ToftError::InvalidPayload("gas limit does not fit in u64".to_string()))
}
