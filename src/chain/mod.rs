//! Chain metadata: messaging chain ids, endpoint addresses and the registry
//! mapping EVM chains to the contracts the protocol uses on them.

mod addresses;
mod bridge_chain_id;
mod config;
mod registry;

pub use addresses::*;
pub use bridge_chain_id::BridgeChainId;
pub use config::BridgeChain;
pub use registry::{ChainContracts, ChainDescriptor, ChainRegistry};
