// SPDX-FileCopyrightText: 2025 Tapioca DAO Contributors
//
// SPDX-License-Identifier: Apache-2.0
//! Messaging endpoint addresses and chain ids for supported chains
//!
//! This module centralizes the messaging-layer chain ids and the endpoint
//! contract address deployed on every chain the wrapped token can live on.

use alloy_primitives::{address, Address};

use super::BridgeChainId;

// Messaging chain ids

pub const ETHEREUM_BRIDGE_CHAIN_ID: BridgeChainId = BridgeChainId::new(101);
pub const ARBITRUM_BRIDGE_CHAIN_ID: BridgeChainId = BridgeChainId::new(110);
pub const OPTIMISM_BRIDGE_CHAIN_ID: BridgeChainId = BridgeChainId::new(111);
pub const RINKEBY_BRIDGE_CHAIN_ID: BridgeChainId = BridgeChainId::new(10001);
pub const MUMBAI_BRIDGE_CHAIN_ID: BridgeChainId = BridgeChainId::new(10009);
pub const SEPOLIA_BRIDGE_CHAIN_ID: BridgeChainId = BridgeChainId::new(10161);
pub const ARBITRUM_SEPOLIA_BRIDGE_CHAIN_ID: BridgeChainId = BridgeChainId::new(10231);
pub const OPTIMISM_SEPOLIA_BRIDGE_CHAIN_ID: BridgeChainId = BridgeChainId::new(10232);

// Endpoint addresses

/// <https://etherscan.io/address/0x66A71Dcef29A0fFBDBE3c6a460a3B5BC225Cd675>
pub const ETHEREUM_ENDPOINT_ADDRESS: Address = address!("66a71dcef29a0ffbdbe3c6a460a3b5bc225cd675");

/// <https://arbiscan.io/address/0x3c2269811836af69497E5F486A85D7316753cf62>
pub const ARBITRUM_ENDPOINT_ADDRESS: Address = address!("3c2269811836af69497e5f486a85d7316753cf62");

/// <https://optimistic.etherscan.io/address/0x3c2269811836af69497E5F486A85D7316753cf62>
pub const OPTIMISM_ENDPOINT_ADDRESS: Address = address!("3c2269811836af69497e5f486a85d7316753cf62");

pub const RINKEBY_ENDPOINT_ADDRESS: Address = address!("79a63d6d8bbd5c6dfc774da79bccd948eacb53fa");

pub const MUMBAI_ENDPOINT_ADDRESS: Address = address!("f69186dfba60ddb133e91e9a4b5673624293d8f8");

pub const SEPOLIA_ENDPOINT_ADDRESS: Address = address!("ae92d5ad7583ad66e49a0c67bad18f6ba52dddc1");

pub const ARBITRUM_SEPOLIA_ENDPOINT_ADDRESS: Address =
    address!("6098e96a28e02f27b1e6bd381f870f1c8bd169d3");

pub const OPTIMISM_SEPOLIA_ENDPOINT_ADDRESS: Address =
    address!("55370e0fbb5f5b8daed978ba1c075a499eb107b8");
