//! Messaging-protocol chain identifiers
//!
//! The cross-chain messaging layer numbers chains independently of their EVM
//! chain id (Ethereum is `101`, Arbitrum `110`, ...). Keeping the two apart in
//! the type system prevents passing an EVM chain id where a messaging id is
//! expected and vice versa.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Chain identifier used by the messaging transport.
///
/// # Example
///
/// ```rust
/// use toft_rs::BridgeChainId;
///
/// let arbitrum = BridgeChainId::new(110);
/// assert_eq!(arbitrum.as_u16(), 110);
/// assert_eq!(arbitrum.to_string(), "110");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BridgeChainId(u16);

impl BridgeChainId {
    /// Wraps a raw messaging chain id
    #[inline]
    pub const fn new(id: u16) -> Self {
        Self(id)
    }

    /// Returns the numeric id
    #[inline]
    pub const fn as_u16(self) -> u16 {
        self.0
    }
}

impl From<u16> for BridgeChainId {
    #[inline]
    fn from(id: u16) -> Self {
        Self(id)
    }
}

impl From<BridgeChainId> for u16 {
    #[inline]
    fn from(id: BridgeChainId) -> Self {
        id.0
    }
}

impl fmt::Display for BridgeChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
