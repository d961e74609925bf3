// SPDX-FileCopyrightText: 2025 Tapioca DAO Contributors
//
// SPDX-License-Identifier: Apache-2.0
//! Deterministic multi-chain deployment
//!
//! Instances are created through a CREATE2-style factory so their addresses
//! can be computed before they exist, which lets operators pre-authorize a
//! remote on one chain while its counterpart is still being deployed on
//! another. Linking is two independent privileged calls; a family that is
//! trusted on one side only is a normal intermediate state.

mod blueprint;
mod coordinator;
mod factory;
mod store;

pub use blueprint::InstanceBlueprint;
pub use coordinator::{DeploymentCoordinator, InstanceParams, LinkStatus};
pub use factory::{Create2Factory, DeterministicFactory};
pub use store::{
    DeploymentRecord, DeploymentStore, InMemoryDeploymentStore, JsonFileDeploymentStore,
};
