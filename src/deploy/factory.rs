use std::collections::BTreeSet;
use std::fmt;

use alloy_primitives::{keccak256, Address, B256};
use tracing::debug;

use crate::error::{Result, ToftError};

/// A contract factory whose output address depends only on its own
/// address, a salt and the init code.
pub trait DeterministicFactory: fmt::Debug {
    fn address(&self) -> Address;

    /// CREATE2 address for `salt` and `keccak256(init_code)`.
    fn compute_address(&self, salt: B256, init_code_hash: B256) -> Address {
        self.address().create2(salt, init_code_hash)
    }

    fn is_deployed(&self, address: Address) -> bool;

    /// Deploys `init_code` under `salt`.
    ///
    /// # Errors
    ///
    /// `AlreadyDeployed` if the computed address already has code.
    fn create(&mut self, salt: B256, init_code: &[u8]) -> Result<Address>;

    /// Forgets a contract created by [`create`](Self::create) whose
    /// deployment could not be completed. Returns whether it was known.
    fn discard(&mut self, address: Address) -> bool;
}

/// In-process CREATE2 factory that remembers what it deployed.
#[derive(Debug, Clone, Default)]
pub struct Create2Factory {
    address: Address,
    deployed: BTreeSet<Address>,
}

impl Create2Factory {
    pub fn new(address: Address) -> Self {
        Self {
            address,
            deployed: BTreeSet::new(),
        }
    }

    pub fn deployed(&self) -> impl Iterator<Item = &Address> {
        self.deployed.iter()
    }
}

impl DeterministicFactory for Create2Factory {
    fn address(&self) -> Address {
        self.address
    }

    fn is_deployed(&self, address: Address) -> bool {
        self.deployed.contains(&address)
    }

    fn create(&mut self, salt: B256, init_code: &[u8]) -> Result<Address> {
        let address = self.compute_address(salt, keccak256(init_code));
        if !self.deployed.insert(address) {
            return Err(ToftError::AlreadyDeployed { address });
        }

        debug!(
            factory = %self.address,
            salt = %salt,
            address = %address,
            event = "contract_created"
        );
        Ok(address)
    }

    fn discard(&mut self, address: Address) -> bool {
        self.deployed.remove(&address)
    }
}
