use alloy_primitives::{keccak256, Address, Bytes, B256, U256};
use alloy_sol_types::SolValue;

use crate::token::TokenMetadata;

const INIT_CODE_TAG: &[u8] = b"TOFT/1";

/// Constructor arguments of a token instance.
///
/// Two blueprints produce the same init code exactly when every field
/// matches, so the endpoint makes the code chain-specific.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceBlueprint {
    pub underlying: Address,
    pub host_chain_id: u64,
    pub metadata: TokenMetadata,
    pub endpoint: Address,
}

impl InstanceBlueprint {
    /// Tag followed by the ABI-encoded constructor arguments.
    pub fn init_code(&self) -> Bytes {
        let args = (
            self.underlying,
            self.host_chain_id,
            self.metadata.name.clone(),
            self.metadata.symbol.clone(),
            U256::from(self.metadata.decimals),
            self.endpoint,
        )
            .abi_encode();

        let mut code = Vec::with_capacity(INIT_CODE_TAG.len() + args.len());
        code.extend_from_slice(INIT_CODE_TAG);
        code.extend_from_slice(&args);
        code.into()
    }

    pub fn init_code_hash(&self) -> B256 {
        keccak256(self.init_code())
    }
}
