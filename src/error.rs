use alloy_primitives::{Address, U256};
use thiserror::Error;

use crate::chain::BridgeChainId;

#[derive(Error, Debug)]
pub enum ToftError {
    #[error("Operation only allowed on the host chain {host_chain_id} (current: {chain_id})")]
    NotHostChain { chain_id: u64, host_chain_id: u64 },

    #[error("Untrusted remote {address} on bridge chain {chain_id}")]
    UntrustedRemote {
        chain_id: BridgeChainId,
        address: Address,
    },

    #[error("Insufficient balance for {account}: required {required}, available {available}")]
    InsufficientBalance {
        account: Address,
        required: U256,
        available: U256,
    },

    #[error("Insufficient allowance from {owner} to {spender}: required {required}, allowed {allowed}")]
    InsufficientAllowance {
        owner: Address,
        spender: Address,
        required: U256,
        allowed: U256,
    },

    #[error("Insufficient vault balance: requested {requested}, locked {locked}")]
    InsufficientVaultBalance { requested: U256, locked: U256 },

    #[error("Insufficient message fee: required {required}, provided {provided}")]
    InsufficientMessageFee { required: U256, provided: U256 },

    #[error("Underlying asset transfer failed: {0}")]
    TransferFailed(String),

    #[error("Contract already deployed at {address}")]
    AlreadyDeployed { address: Address },

    #[error("Unauthorized caller {caller}")]
    Unauthorized { caller: Address },

    #[error("Caller {caller} is not the local messaging endpoint")]
    InvalidEndpointCaller { caller: Address },

    #[error("Unknown chain: {0}")]
    UnknownChain(String),

    #[error("Chain not supported: {chain}")]
    ChainNotSupported { chain: String },

    #[error("No host chain deployment for {underlying} on chain {host_chain_id}")]
    HostNotDeployed {
        underlying: Address,
        host_chain_id: u64,
    },

    #[error("No strategy account configured on chain {chain_id}")]
    StrategyNotConfigured { chain_id: u64 },

    #[error("Insufficient strategy balance for {owner} in asset {asset_id}: requested {requested}, available {available}")]
    InsufficientStrategyBalance {
        owner: Address,
        asset_id: U256,
        requested: U256,
        available: U256,
    },

    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Management fee {fee} exceeds maximum {max}")]
    FeeTooHigh { fee: u64, max: u64 },

    #[error("Arithmetic overflow")]
    Overflow,

    #[error("Channel from bridge chain {src_chain_id} ({src_address}) is blocked by a stored payload")]
    ChannelBlocked {
        src_chain_id: BridgeChainId,
        src_address: Address,
    },

    #[error("No stored payload for bridge chain {src_chain_id} ({src_address})")]
    NoStoredPayload {
        src_chain_id: BridgeChainId,
        src_address: Address,
    },

    #[error("Relayer gave up after {rounds} rounds with {pending} messages still deliverable")]
    RelayTimeout { rounds: u32, pending: usize },

    #[error("ABI encoding/decoding error: {0}")]
    Abi(#[from] alloy_sol_types::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ToftError>;
