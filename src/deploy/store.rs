use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use alloy_primitives::{Address, B256};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;

/// One deployed instance, as kept by a [`DeploymentStore`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentRecord {
    pub chain_id: u64,
    pub name: String,
    pub token: Address,
    pub vault: Option<Address>,
    pub underlying: Address,
    pub host_chain_id: u64,
    pub salt: B256,
}

impl DeploymentRecord {
    pub fn is_host(&self) -> bool {
        self.chain_id == self.host_chain_id
    }

    /// Chain of a linked instance; `None` for the host.
    pub fn linked_chain_id(&self) -> Option<u64> {
        (!self.is_host()).then_some(self.chain_id)
    }
}

/// Append-only log of deployments, grouped by chain.
pub trait DeploymentStore: fmt::Debug {
    fn append(&mut self, record: DeploymentRecord) -> Result<()>;

    /// Records of `chain_id` in deployment order.
    fn records(&self, chain_id: u64) -> Result<Vec<DeploymentRecord>>;

    /// The host instance of the family wrapping `underlying`.
    fn find_host(
        &self,
        underlying: Address,
        host_chain_id: u64,
    ) -> Result<Option<DeploymentRecord>> {
        Ok(self
            .records(host_chain_id)?
            .into_iter()
            .find(|record| record.is_host() && record.underlying == underlying))
    }
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryDeploymentStore {
    records: BTreeMap<u64, Vec<DeploymentRecord>>,
}

impl InMemoryDeploymentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DeploymentStore for InMemoryDeploymentStore {
    fn append(&mut self, record: DeploymentRecord) -> Result<()> {
        self.records.entry(record.chain_id).or_default().push(record);
        Ok(())
    }

    fn records(&self, chain_id: u64) -> Result<Vec<DeploymentRecord>> {
        Ok(self.records.get(&chain_id).cloned().unwrap_or_default())
    }
}

/// Deployment log kept as a JSON object keyed by chain id.
///
/// ```json
/// { "1": [ { "chainId": 1, "name": "TOFT", "token": "0x...", ... } ] }
/// ```
///
/// The whole file is rewritten on every append.
#[derive(Debug, Clone)]
pub struct JsonFileDeploymentStore {
    path: PathBuf,
}

impl JsonFileDeploymentStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<BTreeMap<u64, Vec<DeploymentRecord>>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let contents = fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&contents)?)
    }
}

impl DeploymentStore for JsonFileDeploymentStore {
    fn append(&mut self, record: DeploymentRecord) -> Result<()> {
        let mut records = self.load()?;
        debug!(
            path = %self.path.display(),
            chain_id = record.chain_id,
            token = %record.token,
            event = "deployment_recorded"
        );
        records.entry(record.chain_id).or_default().push(record);
        fs::write(&self.path, serde_json::to_string_pretty(&records)?)?;
        Ok(())
    }

    fn records(&self, chain_id: u64) -> Result<Vec<DeploymentRecord>> {
        Ok(self.load()?.remove(&chain_id).unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ToftError;

    fn record(chain_id: u64, host_chain_id: u64, underlying: Address) -> DeploymentRecord {
        DeploymentRecord {
            chain_id,
            name: "Tapioca OFT".to_string(),
            token: Address::repeat_byte(chain_id as u8),
            vault: (chain_id == host_chain_id).then(|| Address::repeat_byte(0xfa)),
            underlying,
            host_chain_id,
            salt: B256::ZERO,
        }
    }

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!(
            "toft-deployments-{}-{name}.json",
            std::process::id()
        ))
    }

    #[test]
    fn test_find_host_by_underlying() {
        let underlying = Address::repeat_byte(0xaa);
        let mut store = InMemoryDeploymentStore::new();
        assert!(store.find_host(underlying, 1).unwrap().is_none());

        store.append(record(1, 1, Address::repeat_byte(0xbb))).unwrap();
        store.append(record(1, 1, underlying)).unwrap();
        store.append(record(2, 1, underlying)).unwrap();

        let host = store.find_host(underlying, 1).unwrap().unwrap();
        assert_eq!(host.underlying, underlying);
        assert!(host.is_host());
        assert_eq!(host.linked_chain_id(), None);
        assert_eq!(store.records(2).unwrap()[0].linked_chain_id(), Some(2));
        assert_eq!(store.records(1).unwrap().len(), 2);
        assert!(store.records(3).unwrap().is_empty());
    }

    #[test]
    fn test_json_file_store_appends_per_chain() {
        let path = temp_path("append");
        let _ = fs::remove_file(&path);
        let underlying = Address::repeat_byte(0xaa);

        let mut store = JsonFileDeploymentStore::new(&path);
        store.append(record(1, 1, underlying)).unwrap();
        store.append(record(2, 1, underlying)).unwrap();

        let reopened = JsonFileDeploymentStore::new(&path);
        assert_eq!(reopened.records(2).unwrap(), vec![record(2, 1, underlying)]);
        assert!(reopened.find_host(underlying, 1).unwrap().is_some());

        let raw: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert!(raw["1"][0]["hostChainId"].is_u64());
        assert!(raw["2"][0]["vault"].is_null());

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_json_file_store_rejects_garbage() {
        let path = temp_path("garbage");
        fs::write(&path, "not json").unwrap();

        let store = JsonFileDeploymentStore::new(&path);
        assert!(matches!(store.records(1).unwrap_err(), ToftError::Json(_)));

        fs::remove_file(&path).unwrap();
    }
}
