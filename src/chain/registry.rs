//! Static per-chain metadata
//!
//! The registry is a pure lookup table: EVM chain id ↔ messaging chain id, and
//! the contracts (messaging endpoint, deterministic factory) deployed on each
//! chain. It is loaded once by an external configuration layer and never
//! mutated after the deployment coordinator takes hold of it.

use std::collections::BTreeMap;

use alloy_chains::NamedChain;
use alloy_primitives::Address;
use serde::{Deserialize, Serialize};

use super::{BridgeChain, BridgeChainId};
use crate::error::{Result, ToftError};

/// Identity of a chain in both numbering schemes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainDescriptor {
    pub chain_id: u64,
    pub bridge_chain_id: BridgeChainId,
    pub name: String,
}

impl ChainDescriptor {
    pub fn new(chain_id: u64, bridge_chain_id: BridgeChainId, name: impl Into<String>) -> Self {
        Self {
            chain_id,
            bridge_chain_id,
            name: name.into(),
        }
    }

    /// Builds the descriptor of a well-known chain.
    pub fn from_named(chain: NamedChain) -> Result<Self> {
        Ok(Self::new(
            u64::from(chain),
            chain.bridge_chain_id()?,
            chain.to_string(),
        ))
    }
}

/// Contracts deployed on a chain that the protocol talks to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainContracts {
    /// Messaging endpoint; the only caller allowed to deliver inbound messages
    pub endpoint: Address,
    /// Deterministic deployment factory, also the privileged owner of every
    /// token instance it creates
    pub factory: Address,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct ChainEntry {
    #[serde(flatten)]
    descriptor: ChainDescriptor,
    contracts: ChainContracts,
}

/// Lookup table of every chain a deployment family may span
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainRegistry {
    chains: BTreeMap<u64, ChainEntry>,
}

impl ChainRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a registry from its JSON form (a list of chains keyed by EVM id).
    pub fn from_json(json: &str) -> Result<Self> {
        let registry: Self = serde_json::from_str(json)?;
        registry.validate()?;
        Ok(registry)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Adds or replaces a chain.
    pub fn register(mut self, descriptor: ChainDescriptor, contracts: ChainContracts) -> Self {
        self.chains.insert(
            descriptor.chain_id,
            ChainEntry {
                descriptor,
                contracts,
            },
        );
        self
    }

    /// Adds a well-known chain using its canonical messaging endpoint.
    pub fn register_named(self, chain: NamedChain, factory: Address) -> Result<Self> {
        let descriptor = ChainDescriptor::from_named(chain)?;
        let contracts = ChainContracts {
            endpoint: chain.endpoint_address()?,
            factory,
        };
        Ok(self.register(descriptor, contracts))
    }

    pub fn by_chain_id(&self, chain_id: u64) -> Result<&ChainDescriptor> {
        self.chains
            .get(&chain_id)
            .map(|entry| &entry.descriptor)
            .ok_or_else(|| ToftError::UnknownChain(format!("chain id {chain_id}")))
    }

    pub fn by_bridge_chain_id(&self, bridge_chain_id: BridgeChainId) -> Result<&ChainDescriptor> {
        self.chains
            .values()
            .map(|entry| &entry.descriptor)
            .find(|descriptor| descriptor.bridge_chain_id == bridge_chain_id)
            .ok_or_else(|| ToftError::UnknownChain(format!("bridge chain id {bridge_chain_id}")))
    }

    pub fn contracts(&self, chain_id: u64) -> Result<ChainContracts> {
        self.chains
            .get(&chain_id)
            .map(|entry| entry.contracts)
            .ok_or_else(|| ToftError::UnknownChain(format!("chain id {chain_id}")))
    }

    pub fn chains(&self) -> impl Iterator<Item = &ChainDescriptor> {
        self.chains.values().map(|entry| &entry.descriptor)
    }

    pub fn len(&self) -> usize {
        self.chains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chains.is_empty()
    }

    /// Two chains may not share a messaging id, otherwise inbound messages
    /// could not be attributed to a single source.
    fn validate(&self) -> Result<()> {
        let mut seen = BTreeMap::new();
        for descriptor in self.chains() {
            if let Some(other) = seen.insert(descriptor.bridge_chain_id, descriptor.chain_id) {
                return Err(ToftError::InvalidConfig(format!(
                    "bridge chain id {} used by chains {} and {}",
                    descriptor.bridge_chain_id, other, descriptor.chain_id
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;

    const FACTORY: Address = address!("00000000000000000000000000000000000fac01");

    fn local_registry() -> ChainRegistry {
        ChainRegistry::new()
            .register(
                ChainDescriptor::new(31337, BridgeChainId::new(1), "host"),
                ChainContracts {
                    endpoint: address!("00000000000000000000000000000000000e0001"),
                    factory: FACTORY,
                },
            )
            .register(
                ChainDescriptor::new(10, BridgeChainId::new(10), "linked"),
                ChainContracts {
                    endpoint: address!("00000000000000000000000000000000000e0010"),
                    factory: FACTORY,
                },
            )
    }

    #[test]
    fn test_lookup_by_both_ids() {
        let registry = local_registry();

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.by_chain_id(10).unwrap().name, "linked");
        assert_eq!(
            registry
                .by_bridge_chain_id(BridgeChainId::new(1))
                .unwrap()
                .chain_id,
            31337
        );
    }

    #[test]
    fn test_unknown_chain() {
        let registry = local_registry();

        assert!(matches!(
            registry.by_chain_id(5).unwrap_err(),
            ToftError::UnknownChain(_)
        ));
        assert!(registry.by_bridge_chain_id(BridgeChainId::new(99)).is_err());
        assert!(registry.contracts(5).is_err());
    }

    #[test]
    fn test_register_named_chain() {
        let registry = ChainRegistry::new()
            .register_named(NamedChain::Arbitrum, FACTORY)
            .unwrap();

        let descriptor = registry.by_chain_id(42161).unwrap();
        assert_eq!(descriptor.bridge_chain_id, BridgeChainId::new(110));
        assert_eq!(
            registry.contracts(42161).unwrap().endpoint,
            NamedChain::Arbitrum.endpoint_address().unwrap()
        );
    }

    #[test]
    fn test_json_roundtrip() {
        let registry = local_registry();
        let json = registry.to_json().unwrap();
        assert_eq!(ChainRegistry::from_json(&json).unwrap(), registry);
    }

    #[test]
    fn test_duplicate_bridge_chain_id_rejected() {
        let json = r#"{
            "chains": {
                "1": {
                    "chainId": 1,
                    "bridgeChainId": 7,
                    "name": "a",
                    "contracts": {
                        "endpoint": "0x0000000000000000000000000000000000000001",
                        "factory": "0x0000000000000000000000000000000000000002"
                    }
                },
                "2": {
                    "chainId": 2,
                    "bridgeChainId": 7,
                    "name": "b",
                    "contracts": {
                        "endpoint": "0x0000000000000000000000000000000000000003",
                        "factory": "0x0000000000000000000000000000000000000004"
                    }
                }
            }
        }"#;

        assert!(matches!(
            ChainRegistry::from_json(json).unwrap_err(),
            ToftError::InvalidConfig(_)
        ));
    }
}
