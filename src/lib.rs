//! # toft-rs
//!
//! Accounting engine for cross-chain wrapped tokens (TOFT).
//!
//! Collateral is locked in a vault on a single host chain; claim tokens
//! backed 1:1 by it circulate on every chain of the deployment family and
//! move between chains by burn-then-mint messages. The crate covers:
//!
//! - wrap/unwrap accounting on the host chain ([`BridgeToken`], [`Vault`])
//! - the cross-chain message protocol with trusted remotes
//!   ([`Payload`], [`TrustedRemoteRegistry`], [`MessageTransport`])
//! - an in-process messaging layer and relayer for simulating several chains
//!   ([`LocalNetwork`], [`Relayer`])
//! - deterministic multi-chain deployment ([`DeploymentCoordinator`])
//! - moving funds into a strategy account on another chain and back
//!
//! ## Quick Start
//!
//! ```rust
//! use alloy_primitives::{Address, B256, U256};
//! use toft_rs::testing::InMemoryErc20;
//! use toft_rs::{
//!     encode_recipient, BridgeChainId, CallParams, ChainContracts, ChainDescriptor, ChainRegistry,
//!     DeploymentCoordinator, InMemoryDeploymentStore, InstanceParams, LocalNetwork,
//!     TokenMetadata, ToftError, UnderlyingAsset,
//! };
//!
//! # fn main() -> Result<(), ToftError> {
//! let contracts = |tag: u8| ChainContracts {
//!     endpoint: Address::repeat_byte(tag),
//!     factory: Address::repeat_byte(tag + 1),
//! };
//! let registry = ChainRegistry::new()
//!     .register(ChainDescriptor::new(1, BridgeChainId::new(101), "ethereum"), contracts(0x10))
//!     .register(ChainDescriptor::new(10, BridgeChainId::new(111), "optimism"), contracts(0x20));
//!
//! let network = LocalNetwork::default();
//! let asset = InMemoryErc20::new(Address::repeat_byte(0xaa), 18);
//! let metadata = TokenMetadata {
//!     name: "Tapioca OFT".to_string(),
//!     symbol: "TOFT".to_string(),
//!     decimals: 18,
//! };
//! let mut coordinator = DeploymentCoordinator::new(registry, InMemoryDeploymentStore::new())?;
//!
//! let (mut host, _) = coordinator.create_instance(
//!     InstanceParams::builder()
//!         .chain_id(1)
//!         .host_chain_id(1)
//!         .underlying(asset.address())
//!         .salt(B256::ZERO)
//!         .metadata(metadata.clone())
//!         .asset(asset.clone())
//!         .build(),
//!     network.endpoint(BridgeChainId::new(101), Address::repeat_byte(0x10)),
//! )?;
//! let (mut linked, _) = coordinator.create_instance(
//!     InstanceParams::<InMemoryErc20>::builder()
//!         .chain_id(10)
//!         .host_chain_id(1)
//!         .underlying(asset.address())
//!         .salt(B256::ZERO)
//!         .metadata(metadata)
//!         .build(),
//!     network.endpoint(BridgeChainId::new(111), Address::repeat_byte(0x20)),
//! )?;
//! assert!(coordinator.link_instances(&mut host, &mut linked)?.is_linked());
//!
//! // Lock collateral, then send half of the claim tokens to the linked chain
//! let alice = Address::repeat_byte(0x01);
//! asset.mint(alice, U256::from(1_000));
//! asset.approve(alice, host.address(), U256::MAX);
//! host.wrap(alice, alice, alice, U256::from(1_000))?;
//!
//! let params = CallParams::builder().refund_address(alice).build();
//! host.send_from(
//!     alice,
//!     alice,
//!     BridgeChainId::new(111),
//!     &encode_recipient(alice),
//!     U256::from(500),
//!     params,
//!     U256::ZERO,
//! )?;
//! network.deliver_pending(&mut [&mut linked]);
//!
//! assert_eq!(host.total_supply() + linked.total_supply(), U256::from(1_000));
//! # Ok(())
//! # }
//! ```
//!
//! ## Public API
//!
//! - [`BridgeToken`] - one chain's claim-token instance
//! - [`Vault`] - host-chain custody of the collateral
//! - [`Payload`], [`AdapterParams`], [`FeeQuote`] - message and fee types
//! - [`MessageTransport`] / [`MessageReceiver`] - the messaging seam, with
//!   [`LocalNetwork`] as the in-process implementation
//! - [`DeploymentCoordinator`] - CREATE2 deployment and linking
//! - [`UnderlyingAsset`], [`StrategyAccount`], [`Clock`] - collaborator traits
//! - [`ToftError`] and [`Result`] - error types for error handling

mod chain;
mod config;
mod deploy;
mod error;
mod protocol;
mod relayer;
mod remote;
mod token;
mod traits;
mod transport;
mod vault;

pub use chain::{
    BridgeChain, BridgeChainId, ChainContracts, ChainDescriptor, ChainRegistry,
    ARBITRUM_BRIDGE_CHAIN_ID, ARBITRUM_ENDPOINT_ADDRESS, ARBITRUM_SEPOLIA_BRIDGE_CHAIN_ID,
    ARBITRUM_SEPOLIA_ENDPOINT_ADDRESS, ETHEREUM_BRIDGE_CHAIN_ID, ETHEREUM_ENDPOINT_ADDRESS,
    MUMBAI_BRIDGE_CHAIN_ID, MUMBAI_ENDPOINT_ADDRESS, OPTIMISM_BRIDGE_CHAIN_ID,
    OPTIMISM_ENDPOINT_ADDRESS, OPTIMISM_SEPOLIA_BRIDGE_CHAIN_ID,
    OPTIMISM_SEPOLIA_ENDPOINT_ADDRESS, RINKEBY_BRIDGE_CHAIN_ID, RINKEBY_ENDPOINT_ADDRESS,
    SEPOLIA_BRIDGE_CHAIN_ID, SEPOLIA_ENDPOINT_ADDRESS,
};
pub use config::{
    FeeConfig, FeeSchedule, RelayConfig, DEFAULT_DESTINATION_GAS, MANAGEMENT_FEE_FRACTION,
    MAX_MANAGEMENT_FEE,
};
pub use deploy::{
    Create2Factory, DeploymentCoordinator, DeploymentRecord, DeploymentStore,
    DeterministicFactory, InMemoryDeploymentStore, InstanceBlueprint, InstanceParams,
    JsonFileDeploymentStore, LinkStatus,
};
pub use error::{Result, ToftError};
pub use protocol::{
    decode_recipient, encode_recipient, AdapterParams, FeeQuote, InboundMessage, MessageNonce,
    OutboundMessage, Payload, PayloadKind,
};
pub use relayer::Relayer;
pub use remote::{TrustedRemoteEntry, TrustedRemoteRegistry};
pub use token::{BridgeToken, CallParams, StrategyOptions, TokenInstance, TokenMetadata};
pub use traits::{Clock, StrategyAccount, UnderlyingAsset};
pub use transport::{
    Channel, DeliveryOutcome, DeliveryReport, FeeEstimate, LocalEndpoint, LocalNetwork,
    MessageReceiver, MessageTransport, SendRequest, StoredPayload,
};
pub use vault::Vault;

// Runtime implementations of the collaborator traits
pub mod providers;

// Public module for advanced users who need custom instrumentation
pub mod spans;

// In-memory collaborators for tests and simulations
pub mod testing;
