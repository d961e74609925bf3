//! Shared fixtures: one deployment family spread over three simulated chains.

#![allow(dead_code)]

use alloy_primitives::{address, Address, Bytes, B256, U256};
use toft_rs::testing::InMemoryErc20;
use toft_rs::{
    encode_recipient, BridgeChainId, BridgeToken, CallParams, ChainContracts, ChainDescriptor,
    ChainRegistry, DeploymentCoordinator, FeeSchedule, InMemoryDeploymentStore, InstanceParams,
    LocalEndpoint, LocalNetwork, TokenMetadata,
};

pub const HOST: u64 = 1;
pub const ARBITRUM: u64 = 42161;
pub const OPTIMISM: u64 = 10;

pub const ASSET: Address = address!("0000000000000000000000000000000000a55e70");
pub const ALICE: Address = address!("00000000000000000000000000000000000a11ce");
pub const BOB: Address = address!("0000000000000000000000000000000000000b0b");
pub const REFUND: Address = address!("00000000000000000000000000000000000000cc");

pub type Token = BridgeToken<InMemoryErc20, LocalEndpoint>;

pub fn contracts(chain_id: u64) -> ChainContracts {
    let tag = (chain_id % 200) as u8;
    ChainContracts {
        endpoint: Address::repeat_byte(tag),
        factory: Address::repeat_byte(tag + 1),
    }
}

pub fn registry() -> ChainRegistry {
    ChainRegistry::new()
        .register(
            ChainDescriptor::new(HOST, BridgeChainId::new(101), "ethereum"),
            contracts(HOST),
        )
        .register(
            ChainDescriptor::new(ARBITRUM, BridgeChainId::new(110), "arbitrum"),
            contracts(ARBITRUM),
        )
        .register(
            ChainDescriptor::new(OPTIMISM, BridgeChainId::new(111), "optimism"),
            contracts(OPTIMISM),
        )
}

pub fn metadata() -> TokenMetadata {
    TokenMetadata {
        name: "Tapioca OFT".to_string(),
        symbol: "TOFT".to_string(),
        decimals: 18,
    }
}

pub struct Family {
    pub network: LocalNetwork,
    pub coordinator: DeploymentCoordinator<InMemoryDeploymentStore>,
    pub asset: InMemoryErc20,
}

impl Family {
    pub fn new(fee_schedule: FeeSchedule) -> Self {
        Self {
            network: LocalNetwork::new(fee_schedule),
            coordinator: DeploymentCoordinator::new(registry(), InMemoryDeploymentStore::new())
                .unwrap(),
            asset: InMemoryErc20::new(ASSET, 18),
        }
    }

    pub fn bridge_id(&self, chain_id: u64) -> BridgeChainId {
        self.coordinator
            .registry()
            .by_chain_id(chain_id)
            .unwrap()
            .bridge_chain_id
    }

    pub fn endpoint(&self, chain_id: u64) -> LocalEndpoint {
        self.network
            .endpoint(self.bridge_id(chain_id), contracts(chain_id).endpoint)
    }

    pub fn params(&self, chain_id: u64) -> InstanceParams<InMemoryErc20> {
        InstanceParams::builder()
            .chain_id(chain_id)
            .host_chain_id(HOST)
            .underlying(ASSET)
            .salt(B256::repeat_byte(0x5a))
            .metadata(metadata())
            .maybe_asset((chain_id == HOST).then(|| self.asset.clone()))
            .build()
    }

    pub fn deploy(&mut self, chain_id: u64) -> Token {
        let params = self.params(chain_id);
        let endpoint = self.endpoint(chain_id);
        self.coordinator
            .create_instance(params, endpoint)
            .unwrap()
            .0
    }

    /// Funds `account` with underlying and approves the host token for it.
    pub fn fund(&self, host: &Token, account: Address, amount: u64) {
        self.asset.mint(account, U256::from(amount));
        self.asset.approve(account, host.address(), U256::MAX);
    }

    pub fn link_all(&self, host: &mut Token, linked: &mut [&mut Token]) {
        for token in linked.iter_mut() {
            assert!(self
                .coordinator
                .link_instances(host, &mut **token)
                .unwrap()
                .is_linked());
        }
    }

    pub fn link_pair(&self, a: &mut Token, b: &mut Token) {
        let (a_chain, a_address) = (a.instance().chain_id, a.address());
        let (b_chain, b_address) = (b.instance().chain_id, b.address());
        self.coordinator.link_side(a, b_chain, b_address).unwrap();
        self.coordinator.link_side(b, a_chain, a_address).unwrap();
    }
}

pub fn to(recipient: Address) -> Bytes {
    encode_recipient(recipient)
}

pub fn params() -> CallParams {
    CallParams::builder().refund_address(REFUND).build()
}

pub fn units(amount: u64) -> U256 {
    U256::from(amount)
}
