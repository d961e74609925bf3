//! Trusted remote registry
//!
//! Each token instance keeps one entry per remote chain naming the only
//! address allowed to originate messages from that chain. The registry is the
//! sole gate for inbound messages; who may mutate it is decided by the owning
//! token.

use std::collections::BTreeMap;

use alloy_primitives::{Address, Bytes};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::chain::BridgeChainId;

/// Authorized counterpart on one remote chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrustedRemoteEntry {
    pub remote_chain_id: BridgeChainId,
    pub remote_address: Address,
    pub enabled: bool,
}

impl TrustedRemoteEntry {
    /// Packed `remote ++ local` path, as stored by the messaging endpoint.
    pub fn path(&self, local_address: Address) -> Bytes {
        let mut path = Vec::with_capacity(40);
        path.extend_from_slice(self.remote_address.as_slice());
        path.extend_from_slice(local_address.as_slice());
        Bytes::from(path)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrustedRemoteRegistry {
    entries: BTreeMap<BridgeChainId, TrustedRemoteEntry>,
}

impl TrustedRemoteRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the trusted remote for `remote_chain_id`, replacing any previous
    /// entry for that chain.
    ///
    /// Returns `true` if the stored entry changed. Calling it again with the
    /// same arguments is a no-op.
    pub fn set_trusted(
        &mut self,
        remote_chain_id: BridgeChainId,
        remote_address: Address,
        enabled: bool,
    ) -> bool {
        let entry = TrustedRemoteEntry {
            remote_chain_id,
            remote_address,
            enabled,
        };
        let previous = self.entries.insert(remote_chain_id, entry);
        let changed = previous != Some(entry);

        debug!(
            remote_chain_id = %remote_chain_id,
            remote_address = %remote_address,
            enabled = enabled,
            changed = changed,
            event = "trusted_remote_set"
        );

        changed
    }

    /// Exact match on both chain and address, enabled entries only.
    pub fn is_trusted(&self, remote_chain_id: BridgeChainId, remote_address: Address) -> bool {
        self.entries.get(&remote_chain_id).is_some_and(|entry| {
            entry.enabled && entry.remote_address == remote_address
        })
    }

    /// The enabled remote address for a chain, if any.
    pub fn trusted_remote(&self, remote_chain_id: BridgeChainId) -> Option<Address> {
        self.entries
            .get(&remote_chain_id)
            .filter(|entry| entry.enabled)
            .map(|entry| entry.remote_address)
    }

    pub fn entry(&self, remote_chain_id: BridgeChainId) -> Option<&TrustedRemoteEntry> {
        self.entries.get(&remote_chain_id)
    }

    pub fn entries(&self) -> impl Iterator<Item = &TrustedRemoteEntry> {
        self.entries.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;

    const REMOTE: Address = address!("00000000000000000000000000000000000000a1");
    const OTHER: Address = address!("00000000000000000000000000000000000000a2");
    const LOCAL: Address = address!("00000000000000000000000000000000000000b1");

    #[test]
    fn test_unknown_chain_is_untrusted() {
        let registry = TrustedRemoteRegistry::new();
        assert!(!registry.is_trusted(BridgeChainId::new(10), REMOTE));
        assert_eq!(registry.trusted_remote(BridgeChainId::new(10)), None);
    }

    #[test]
    fn test_exact_match_required() {
        let mut registry = TrustedRemoteRegistry::new();
        registry.set_trusted(BridgeChainId::new(10), REMOTE, true);

        assert!(registry.is_trusted(BridgeChainId::new(10), REMOTE));
        assert!(!registry.is_trusted(BridgeChainId::new(10), OTHER));
        assert!(!registry.is_trusted(BridgeChainId::new(11), REMOTE));
    }

    #[test]
    fn test_overwrite_replaces_previous_remote() {
        let mut registry = TrustedRemoteRegistry::new();
        registry.set_trusted(BridgeChainId::new(10), REMOTE, true);
        registry.set_trusted(BridgeChainId::new(10), OTHER, true);

        assert!(!registry.is_trusted(BridgeChainId::new(10), REMOTE));
        assert_eq!(registry.trusted_remote(BridgeChainId::new(10)), Some(OTHER));
        assert_eq!(registry.entries().count(), 1);
    }

    #[test]
    fn test_set_trusted_is_idempotent() {
        let mut registry = TrustedRemoteRegistry::new();
        assert!(registry.set_trusted(BridgeChainId::new(10), REMOTE, true));
        assert!(!registry.set_trusted(BridgeChainId::new(10), REMOTE, true));
        assert!(registry.is_trusted(BridgeChainId::new(10), REMOTE));
    }

    #[test]
    fn test_disabled_entry_rejects() {
        let mut registry = TrustedRemoteRegistry::new();
        registry.set_trusted(BridgeChainId::new(10), REMOTE, true);
        registry.set_trusted(BridgeChainId::new(10), REMOTE, false);

        assert!(!registry.is_trusted(BridgeChainId::new(10), REMOTE));
        assert_eq!(registry.trusted_remote(BridgeChainId::new(10)), None);
        assert!(registry.entry(BridgeChainId::new(10)).is_some());
    }

    #[test]
    fn test_path_is_remote_then_local() {
        let entry = TrustedRemoteEntry {
            remote_chain_id: BridgeChainId::new(10),
            remote_address: REMOTE,
            enabled: true,
        };
        let path = entry.path(LOCAL);

        assert_eq!(path.len(), 40);
        assert_eq!(&path[..20], REMOTE.as_slice());
        assert_eq!(&path[20..], LOCAL.as_slice());
    }
}
