//! Traced wrap, send and relay between two simulated chains
//!
//! ## Running the Example
//!
//! ```bash
//! # Every span and event of the crate
//! RUST_LOG=toft_rs=debug cargo run --example two_chain_trace
//! ```
//!
//! ## Expected Span Hierarchy
//!
//! ```text
//! toft_rs.create_instance (x2)
//! toft_rs.link_side (x2)
//! toft_rs.wrap
//! toft_rs.send_from
//! toft_rs.send_from            <- fails, error.type = "Insufficient balance for ..."
//! toft_rs.run_until_idle
//! └── toft_rs.relay_round
//!     └── toft_rs.on_receive
//! ```

use alloy_primitives::{Address, B256, U256};
use toft_rs::providers::TokioClock;
use toft_rs::testing::InMemoryErc20;
use toft_rs::{
    encode_recipient, BridgeChainId, CallParams, ChainContracts, ChainDescriptor, ChainRegistry,
    DeploymentCoordinator, InMemoryDeploymentStore, InstanceParams, LocalNetwork, RelayConfig,
    Relayer, TokenMetadata, ToftError, UnderlyingAsset,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const HOST: u64 = 1;
const LINKED: u64 = 10;

#[tokio::main]
async fn main() -> Result<(), ToftError> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("toft_rs=debug")),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_level(true)
                .with_thread_ids(false),
        )
        .init();

    let contracts = |tag: u8| ChainContracts {
        endpoint: Address::repeat_byte(tag),
        factory: Address::repeat_byte(tag + 1),
    };
    let registry = ChainRegistry::new()
        .register(
            ChainDescriptor::new(HOST, BridgeChainId::new(101), "ethereum"),
            contracts(0x10),
        )
        .register(
            ChainDescriptor::new(LINKED, BridgeChainId::new(111), "optimism"),
            contracts(0x20),
        );

    let network = LocalNetwork::default();
    let asset = InMemoryErc20::new(Address::repeat_byte(0xaa), 6);
    let metadata = TokenMetadata {
        name: "Tapioca OFT USDC".to_string(),
        symbol: "tUSDC".to_string(),
        decimals: 6,
    };
    let mut coordinator = DeploymentCoordinator::new(registry, InMemoryDeploymentStore::new())?;

    let (mut host, _) = coordinator.create_instance(
        InstanceParams::builder()
            .chain_id(HOST)
            .host_chain_id(HOST)
            .underlying(asset.address())
            .salt(B256::ZERO)
            .metadata(metadata.clone())
            .asset(asset.clone())
            .build(),
        network.endpoint(BridgeChainId::new(101), Address::repeat_byte(0x10)),
    )?;
    let (mut linked, _) = coordinator.create_instance(
        InstanceParams::<InMemoryErc20>::builder()
            .chain_id(LINKED)
            .host_chain_id(HOST)
            .underlying(asset.address())
            .salt(B256::ZERO)
            .metadata(metadata)
            .build(),
        network.endpoint(BridgeChainId::new(111), Address::repeat_byte(0x20)),
    )?;
    coordinator.link_instances(&mut host, &mut linked)?;
    coordinator.set_management_fee(&mut host, 25)?;

    let alice = Address::repeat_byte(0x01);
    let bob = Address::repeat_byte(0x02);
    asset.mint(alice, U256::from(2_000_000u64));
    asset.approve(alice, host.address(), U256::MAX);
    host.wrap(alice, alice, alice, U256::from(1_000_000u64))?;

    let params = || CallParams::builder().refund_address(alice).build();
    host.send_from(
        alice,
        alice,
        BridgeChainId::new(111),
        &encode_recipient(bob),
        U256::from(400_000u64),
        params(),
        U256::ZERO,
    )?;

    // more than alice holds; shows up as an errored span
    let rejected = host.send_from(
        alice,
        alice,
        BridgeChainId::new(111),
        &encode_recipient(bob),
        U256::from(5_000_000u64),
        params(),
        U256::ZERO,
    );
    info!(rejected = rejected.is_err(), "oversized send rejected");

    let relayer = Relayer::builder()
        .network(network.clone())
        .clock(TokioClock::new())
        .config(RelayConfig::default().with_poll_interval_secs(1))
        .build();
    let report = relayer
        .run_until_idle(&mut [&mut host, &mut linked])
        .await?;

    info!(
        delivered = report.delivered,
        host_supply = %host.total_supply(),
        linked_supply = %linked.total_supply(),
        locked = %host.vault().map(|vault| vault.locked_amount()).unwrap_or_default(),
        "relay finished"
    );
    Ok(())
}
