use alloy_chains::NamedChain;
use alloy_primitives::Address;

use super::addresses::*;
use super::BridgeChainId;
use crate::error::{Result, ToftError};

/// Trait for chains reachable through the messaging layer
///
/// Mumbai (chain id 80001) has no [`NamedChain`] variant; register it with a
/// [`ChainDescriptor`](super::ChainDescriptor) built from
/// [`MUMBAI_BRIDGE_CHAIN_ID`] and [`MUMBAI_ENDPOINT_ADDRESS`].
pub trait BridgeChain {
    /// The messaging-layer chain id used to address this chain
    fn bridge_chain_id(&self) -> Result<BridgeChainId>;
    /// The address of the messaging endpoint contract on the chain
    fn endpoint_address(&self) -> Result<Address>;
    /// Whether the chain has a messaging endpoint at all
    fn is_bridge_supported(&self) -> bool {
        self.bridge_chain_id().is_ok()
    }
}

impl BridgeChain for NamedChain {
    fn bridge_chain_id(&self) -> Result<BridgeChainId> {
        use NamedChain::*;

        match self {
            Mainnet => Ok(ETHEREUM_BRIDGE_CHAIN_ID),
            Arbitrum => Ok(ARBITRUM_BRIDGE_CHAIN_ID),
            Optimism => Ok(OPTIMISM_BRIDGE_CHAIN_ID),
            // Testnets
            Rinkeby => Ok(RINKEBY_BRIDGE_CHAIN_ID),
            Sepolia => Ok(SEPOLIA_BRIDGE_CHAIN_ID),
            ArbitrumSepolia => Ok(ARBITRUM_SEPOLIA_BRIDGE_CHAIN_ID),
            OptimismSepolia => Ok(OPTIMISM_SEPOLIA_BRIDGE_CHAIN_ID),
            _ => Err(ToftError::ChainNotSupported {
                chain: self.to_string(),
            }),
        }
    }

    fn endpoint_address(&self) -> Result<Address> {
        use NamedChain::*;

        match self {
            Mainnet => Ok(ETHEREUM_ENDPOINT_ADDRESS),
            Arbitrum => Ok(ARBITRUM_ENDPOINT_ADDRESS),
            Optimism => Ok(OPTIMISM_ENDPOINT_ADDRESS),
            // Testnets
            Rinkeby => Ok(RINKEBY_ENDPOINT_ADDRESS),
            Sepolia => Ok(SEPOLIA_ENDPOINT_ADDRESS),
            ArbitrumSepolia => Ok(ARBITRUM_SEPOLIA_ENDPOINT_ADDRESS),
            OptimismSepolia => Ok(OPTIMISM_SEPOLIA_ENDPOINT_ADDRESS),
            _ => Err(ToftError::ChainNotSupported {
                chain: self.to_string(),
            }),
        }
    }
}
