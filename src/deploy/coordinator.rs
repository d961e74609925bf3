use std::collections::BTreeMap;

use alloy_primitives::{Address, B256, U256};
use bon::Builder;
use tracing::{info, warn};

use super::blueprint::InstanceBlueprint;
use super::factory::{Create2Factory, DeterministicFactory};
use super::store::{DeploymentRecord, DeploymentStore};
use crate::chain::ChainRegistry;
use crate::config::FeeConfig;
use crate::error::{Result, ToftError};
use crate::spans;
use crate::token::{BridgeToken, TokenInstance, TokenMetadata};
use crate::traits::UnderlyingAsset;
use crate::transport::MessageTransport;
use crate::vault::Vault;

/// Inputs of [`DeploymentCoordinator::create_instance`].
///
/// `underlying` is the host-chain asset that identifies the deployment
/// family. Only the host instance is given the asset handle itself.
#[derive(Builder, Debug, Clone)]
pub struct InstanceParams<A> {
    pub chain_id: u64,
    pub host_chain_id: u64,
    pub underlying: Address,
    pub salt: B256,
    pub metadata: TokenMetadata,
    pub asset: Option<A>,
    #[builder(default)]
    pub fee_config: FeeConfig,
}

/// Trust between a host instance and one linked instance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkStatus {
    pub host_trusts_linked: bool,
    pub linked_trusts_host: bool,
}

impl LinkStatus {
    pub fn is_linked(&self) -> bool {
        self.host_trusts_linked && self.linked_trusts_host
    }
}

/// Deploys and links token instances across the chains of a registry.
///
/// Each chain's factory is the privileged owner of the instances it
/// creates, so trust and fee changes go through the coordinator.
#[derive(Debug)]
pub struct DeploymentCoordinator<S> {
    registry: ChainRegistry,
    factories: BTreeMap<u64, Box<dyn DeterministicFactory>>,
    store: S,
}

impl<S: DeploymentStore> DeploymentCoordinator<S> {
    /// Uses a [`Create2Factory`] at each chain's registered factory address.
    pub fn new(registry: ChainRegistry, store: S) -> Result<Self> {
        let mut factories: BTreeMap<u64, Box<dyn DeterministicFactory>> = BTreeMap::new();
        for descriptor in registry.chains() {
            let contracts = registry.contracts(descriptor.chain_id)?;
            factories.insert(
                descriptor.chain_id,
                Box::new(Create2Factory::new(contracts.factory)),
            );
        }

        Ok(Self {
            registry,
            factories,
            store,
        })
    }

    /// Replaces the factory of a registered chain.
    pub fn with_factory(
        mut self,
        chain_id: u64,
        factory: Box<dyn DeterministicFactory>,
    ) -> Result<Self> {
        self.registry.by_chain_id(chain_id)?;
        self.factories.insert(chain_id, factory);
        Ok(self)
    }

    pub fn registry(&self) -> &ChainRegistry {
        &self.registry
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn factory_address(&self, chain_id: u64) -> Result<Address> {
        Ok(self.factory(chain_id)?.address())
    }

    pub fn blueprint<A>(&self, params: &InstanceParams<A>) -> Result<InstanceBlueprint> {
        Ok(InstanceBlueprint {
            underlying: params.underlying,
            host_chain_id: params.host_chain_id,
            metadata: params.metadata.clone(),
            endpoint: self.registry.contracts(params.chain_id)?.endpoint,
        })
    }

    /// Address `create_instance` will produce for `params`.
    pub fn predict_address<A>(&self, params: &InstanceParams<A>) -> Result<Address> {
        let blueprint = self.blueprint(params)?;
        Ok(self
            .factory(params.chain_id)?
            .compute_address(params.salt, blueprint.init_code_hash()))
    }

    /// Deploys a token instance and records it.
    ///
    /// The host instance gets a vault at the first contract address of the
    /// token. A linked instance can only be created once its host is
    /// recorded. If the record cannot be stored the factory forgets the
    /// contract again, so the same salt can be retried.
    ///
    /// # Errors
    ///
    /// - `HostNotDeployed` for a linked instance without a host record
    /// - `AlreadyDeployed` if the predicted address already has code or is
    ///   already in the store
    /// - `InvalidConfig` if the transport or asset does not fit the chain
    pub fn create_instance<A: UnderlyingAsset, T: MessageTransport>(
        &mut self,
        params: InstanceParams<A>,
        transport: T,
    ) -> Result<(BridgeToken<A, T>, DeploymentRecord)> {
        let span = spans::create_instance(params.chain_id, params.host_chain_id, &params.salt);
        let _guard = span.enter();

        self.try_create_instance(params, transport)
            .inspect_err(spans::record_error)
    }

    fn try_create_instance<A: UnderlyingAsset, T: MessageTransport>(
        &mut self,
        params: InstanceParams<A>,
        transport: T,
    ) -> Result<(BridgeToken<A, T>, DeploymentRecord)> {
        let blueprint = self.blueprint(&params)?;
        let token_address = self.predict_address(&params)?;
        let InstanceParams {
            chain_id,
            host_chain_id,
            underlying,
            salt,
            metadata,
            asset,
            fee_config,
        } = params;

        let descriptor = self.registry.by_chain_id(chain_id)?.clone();
        self.registry.by_chain_id(host_chain_id)?;
        let endpoint = self.registry.contracts(chain_id)?.endpoint;
        if transport.bridge_chain_id() != descriptor.bridge_chain_id
            || transport.address() != endpoint
        {
            return Err(ToftError::InvalidConfig(format!(
                "transport {} on bridge chain {} is not the endpoint of chain {chain_id}",
                transport.address(),
                transport.bridge_chain_id()
            )));
        }

        let is_host_chain = chain_id == host_chain_id;
        let asset = match (is_host_chain, asset) {
            (true, Some(asset)) if asset.address() == underlying => Some(asset),
            (true, _) => {
                return Err(ToftError::InvalidConfig(format!(
                    "host instance on chain {chain_id} needs the asset {underlying}"
                )))
            }
            (false, Some(_)) => {
                return Err(ToftError::InvalidConfig(format!(
                    "only the host chain {host_chain_id} custodies {underlying}"
                )))
            }
            (false, None) => {
                if self.store.find_host(underlying, host_chain_id)?.is_none() {
                    return Err(ToftError::HostNotDeployed {
                        underlying,
                        host_chain_id,
                    });
                }
                None
            }
        };

        let factory = self.factory(chain_id)?;
        let owner = factory.address();
        let recorded = self
            .store
            .records(chain_id)?
            .iter()
            .any(|record| record.token == token_address);
        if recorded || factory.is_deployed(token_address) {
            return Err(ToftError::AlreadyDeployed {
                address: token_address,
            });
        }

        let vault = asset
            .map(|asset| Vault::new(token_address.create(1), token_address, asset, fee_config))
            .transpose()?;
        let instance = TokenInstance {
            chain_id,
            bridge_chain_id: descriptor.bridge_chain_id,
            address: token_address,
            host_chain_id,
            is_host_chain,
            underlying_asset: underlying,
            vault: vault.as_ref().map(Vault::address),
            metadata,
        };
        let record = DeploymentRecord {
            chain_id,
            name: instance.metadata.name.clone(),
            token: token_address,
            vault: instance.vault,
            underlying,
            host_chain_id,
            salt,
        };
        let token = BridgeToken::new(instance, owner, transport, vault)?;

        let factory = self.factory_mut(chain_id)?;
        let deployed = factory.create(salt, &blueprint.init_code())?;
        if deployed != token_address {
            factory.discard(deployed);
            return Err(ToftError::InvalidConfig(format!(
                "factory on chain {chain_id} deployed {deployed}, expected {token_address}"
            )));
        }
        if let Err(err) = self.store.append(record.clone()) {
            self.factory_mut(chain_id)?.discard(deployed);
            warn!(
                chain_id = chain_id,
                token = %token_address,
                error = %err,
                event = "deployment_discarded"
            );
            return Err(err);
        }

        info!(
            chain_id = chain_id,
            host_chain_id = host_chain_id,
            token = %token_address,
            vault = ?record.vault,
            event = "instance_created"
        );
        Ok((token, record))
    }

    /// Makes `local` trust `remote_address` on `remote_chain_id`.
    ///
    /// Idempotent. Returns whether anything changed.
    pub fn link_side<A: UnderlyingAsset, T: MessageTransport>(
        &self,
        local: &mut BridgeToken<A, T>,
        remote_chain_id: u64,
        remote_address: Address,
    ) -> Result<bool> {
        let span = spans::link_side(local.instance().chain_id, remote_chain_id, remote_address);
        let _guard = span.enter();

        self.try_link_side(local, remote_chain_id, remote_address)
            .inspect_err(spans::record_error)
    }

    fn try_link_side<A: UnderlyingAsset, T: MessageTransport>(
        &self,
        local: &mut BridgeToken<A, T>,
        remote_chain_id: u64,
        remote_address: Address,
    ) -> Result<bool> {
        let remote = self.registry.by_chain_id(remote_chain_id)?.bridge_chain_id;
        let authority = self.factory_address(local.instance().chain_id)?;
        local.set_trusted_remote(authority, remote, remote_address, true)
    }

    /// Links a host and a linked instance in both directions.
    ///
    /// The two sides are separate calls; if the second fails the first
    /// stays in place and [`link_side`](Self::link_side) finishes the job.
    pub fn link_instances<A1, T1, A2, T2>(
        &self,
        host: &mut BridgeToken<A1, T1>,
        linked: &mut BridgeToken<A2, T2>,
    ) -> Result<LinkStatus>
    where
        A1: UnderlyingAsset,
        T1: MessageTransport,
        A2: UnderlyingAsset,
        T2: MessageTransport,
    {
        let host_instance = host.instance().clone();
        let linked_instance = linked.instance().clone();
        if !host_instance.is_host_chain
            || linked_instance.host_chain_id != host_instance.chain_id
            || linked_instance.underlying_asset != host_instance.underlying_asset
        {
            return Err(ToftError::InvalidConfig(format!(
                "{} on chain {} is not linked to host {} on chain {}",
                linked_instance.address,
                linked_instance.chain_id,
                host_instance.address,
                host_instance.chain_id
            )));
        }

        self.link_side(host, linked_instance.chain_id, linked_instance.address)?;
        self.link_side(linked, host_instance.chain_id, host_instance.address)?;
        Ok(self.link_status(host, linked))
    }

    pub fn link_status<A1, T1, A2, T2>(
        &self,
        host: &BridgeToken<A1, T1>,
        linked: &BridgeToken<A2, T2>,
    ) -> LinkStatus
    where
        A1: UnderlyingAsset,
        T1: MessageTransport,
        A2: UnderlyingAsset,
        T2: MessageTransport,
    {
        LinkStatus {
            host_trusts_linked: host
                .trusted_remotes()
                .is_trusted(linked.instance().bridge_chain_id, linked.address()),
            linked_trusts_host: linked
                .trusted_remotes()
                .is_trusted(host.instance().bridge_chain_id, host.address()),
        }
    }

    pub fn set_management_fee<A: UnderlyingAsset, T: MessageTransport>(
        &self,
        host: &mut BridgeToken<A, T>,
        fee: u64,
    ) -> Result<()> {
        let authority = self.factory_address(host.instance().chain_id)?;
        host.set_management_fee(authority, fee)
    }

    pub fn harvest_fees<A: UnderlyingAsset, T: MessageTransport>(
        &self,
        host: &mut BridgeToken<A, T>,
        recipient: Address,
    ) -> Result<U256> {
        let authority = self.factory_address(host.instance().chain_id)?;
        host.harvest_fees(authority, recipient)
    }

    fn factory(&self, chain_id: u64) -> Result<&dyn DeterministicFactory> {
        self.factories
            .get(&chain_id)
            .map(|factory| factory.as_ref())
            .ok_or_else(|| ToftError::UnknownChain(format!("no factory on chain id {chain_id}")))
    }

    fn factory_mut(&mut self, chain_id: u64) -> Result<&mut Box<dyn DeterministicFactory>> {
        self.factories
            .get_mut(&chain_id)
            .ok_or_else(|| ToftError::UnknownChain(format!("no factory on chain id {chain_id}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::{BridgeChainId, ChainContracts, ChainDescriptor};
    use crate::config::FeeSchedule;
    use crate::deploy::InMemoryDeploymentStore;
    use crate::testing::InMemoryErc20;
    use crate::transport::{LocalEndpoint, LocalNetwork};
    use alloy_primitives::address;

    const HOST: u64 = 1;
    const LINKED: u64 = 42161;
    const ASSET: Address = address!("0000000000000000000000000000000000a55e70");
    const ALICE: Address = address!("00000000000000000000000000000000000a11ce");
    const TREASURY: Address = address!("0000000000000000000000000000000000007ea5");

    fn contracts(tag: u8) -> ChainContracts {
        ChainContracts {
            endpoint: Address::repeat_byte(tag),
            factory: Address::repeat_byte(tag + 1),
        }
    }

    fn registry() -> ChainRegistry {
        ChainRegistry::new()
            .register(
                ChainDescriptor::new(HOST, BridgeChainId::new(101), "ethereum"),
                contracts(0x10),
            )
            .register(
                ChainDescriptor::new(LINKED, BridgeChainId::new(110), "arbitrum"),
                contracts(0x20),
            )
    }

    struct Fixture {
        coordinator: DeploymentCoordinator<InMemoryDeploymentStore>,
        network: LocalNetwork,
        asset: InMemoryErc20,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                coordinator: DeploymentCoordinator::new(registry(), InMemoryDeploymentStore::new())
                    .unwrap(),
                network: LocalNetwork::new(FeeSchedule::default()),
                asset: InMemoryErc20::new(ASSET, 18),
            }
        }

        fn endpoint(&self, chain_id: u64) -> LocalEndpoint {
            let registry = self.coordinator.registry();
            let descriptor = registry.by_chain_id(chain_id).unwrap();
            let contracts = registry.contracts(chain_id).unwrap();
            self.network
                .endpoint(descriptor.bridge_chain_id, contracts.endpoint)
        }

        fn params(&self, chain_id: u64) -> InstanceParams<InMemoryErc20> {
            InstanceParams::builder()
                .chain_id(chain_id)
                .host_chain_id(HOST)
                .underlying(ASSET)
                .salt(B256::repeat_byte(0x5a))
                .metadata(TokenMetadata {
                    name: "Tapioca OFT".to_string(),
                    symbol: "TOFT".to_string(),
                    decimals: 18,
                })
                .maybe_asset((chain_id == HOST).then(|| self.asset.clone()))
                .build()
        }

        fn create(
            &mut self,
            chain_id: u64,
        ) -> Result<(BridgeToken<InMemoryErc20, LocalEndpoint>, DeploymentRecord)> {
            let params = self.params(chain_id);
            let endpoint = self.endpoint(chain_id);
            self.coordinator.create_instance(params, endpoint)
        }
    }

    #[test]
    fn test_predicted_address_is_deployed_address() {
        let mut fixture = Fixture::new();
        let predicted = fixture.coordinator.predict_address(&fixture.params(HOST)).unwrap();

        let (token, record) = fixture.create(HOST).unwrap();
        assert_eq!(token.address(), predicted);
        assert_eq!(record.token, predicted);
        assert_eq!(record.vault, Some(predicted.create(1)));
        assert_eq!(token.owner(), fixture.coordinator.factory_address(HOST).unwrap());
        assert!(token.is_host_chain());

        let err = fixture.create(HOST).unwrap_err();
        assert!(matches!(err, ToftError::AlreadyDeployed { address } if address == predicted));
        assert_eq!(fixture.coordinator.store().records(HOST).unwrap().len(), 1);
    }

    #[test]
    fn test_linked_instance_requires_host_record() {
        let mut fixture = Fixture::new();
        let err = fixture.create(LINKED).unwrap_err();
        assert!(matches!(
            err,
            ToftError::HostNotDeployed { underlying, host_chain_id }
                if underlying == ASSET && host_chain_id == HOST
        ));

        fixture.create(HOST).unwrap();
        let (linked, record) = fixture.create(LINKED).unwrap();
        assert!(!linked.is_host_chain());
        assert!(linked.vault().is_none());
        assert_eq!(record.vault, None);
    }

    /// Store whose next `failures` appends fail like a full disk.
    #[derive(Debug, Default)]
    struct FlakyStore {
        inner: InMemoryDeploymentStore,
        failures: u32,
    }

    impl DeploymentStore for FlakyStore {
        fn append(&mut self, record: DeploymentRecord) -> Result<()> {
            if self.failures > 0 {
                self.failures -= 1;
                return Err(std::io::Error::other("disk full").into());
            }
            self.inner.append(record)
        }

        fn records(&self, chain_id: u64) -> Result<Vec<DeploymentRecord>> {
            self.inner.records(chain_id)
        }
    }

    #[test]
    fn test_failed_record_can_be_retried() {
        let fixture = Fixture::new();
        let store = FlakyStore {
            failures: 1,
            ..Default::default()
        };
        let mut coordinator = DeploymentCoordinator::new(registry(), store).unwrap();
        let predicted = coordinator.predict_address(&fixture.params(HOST)).unwrap();

        let err = coordinator
            .create_instance(fixture.params(HOST), fixture.endpoint(HOST))
            .unwrap_err();
        assert!(matches!(err, ToftError::Io(_)));
        assert!(coordinator.store().records(HOST).unwrap().is_empty());

        let (token, record) = coordinator
            .create_instance(fixture.params(HOST), fixture.endpoint(HOST))
            .unwrap();
        assert_eq!(token.address(), predicted);
        assert_eq!(coordinator.store().records(HOST).unwrap(), vec![record]);
    }

    #[test]
    fn test_recorded_address_is_not_deployed_twice() {
        let mut fixture = Fixture::new();
        let (_, record) = fixture.create(HOST).unwrap();

        // fresh factories over the same log
        let mut reopened =
            DeploymentCoordinator::new(registry(), fixture.coordinator.store().clone()).unwrap();
        let err = reopened
            .create_instance(fixture.params(HOST), fixture.endpoint(HOST))
            .unwrap_err();
        assert!(matches!(err, ToftError::AlreadyDeployed { address } if address == record.token));
        assert_eq!(reopened.store().records(HOST).unwrap().len(), 1);
    }

    #[test]
    fn test_transport_must_be_chain_endpoint() {
        let mut fixture = Fixture::new();
        let params = fixture.params(HOST);
        let wrong = fixture.network.endpoint(BridgeChainId::new(101), ALICE);

        let err = fixture.coordinator.create_instance(params, wrong).unwrap_err();
        assert!(matches!(err, ToftError::InvalidConfig(_)));
    }

    #[test]
    fn test_partial_link_is_recoverable() {
        let mut fixture = Fixture::new();
        let (mut host, _) = fixture.create(HOST).unwrap();
        let (mut linked, _) = fixture.create(LINKED).unwrap();
        let coordinator = &fixture.coordinator;

        assert!(coordinator
            .link_side(&mut host, LINKED, linked.address())
            .unwrap());
        let status = coordinator.link_status(&host, &linked);
        assert!(status.host_trusts_linked);
        assert!(!status.is_linked());

        let status = coordinator.link_instances(&mut host, &mut linked).unwrap();
        assert!(status.is_linked());
        assert!(!coordinator
            .link_side(&mut linked, HOST, host.address())
            .unwrap());
    }

    #[test]
    fn test_privileged_calls_go_through_factory() {
        let mut fixture = Fixture::new();
        let (mut host, _) = fixture.create(HOST).unwrap();
        let coordinator = &fixture.coordinator;

        assert!(matches!(
            host.set_management_fee(ALICE, 25).unwrap_err(),
            ToftError::Unauthorized { caller } if caller == ALICE
        ));
        coordinator.set_management_fee(&mut host, 25).unwrap();

        fixture.asset.mint(ALICE, U256::from(100_025u64));
        fixture.asset.approve(ALICE, host.address(), U256::MAX);
        host.wrap(ALICE, ALICE, ALICE, U256::from(100_000u64)).unwrap();

        let harvested = coordinator.harvest_fees(&mut host, TREASURY).unwrap();
        assert_eq!(harvested, U256::from(25u64));
        assert_eq!(fixture.asset.balance_of(TREASURY), U256::from(25u64));
    }
}
