//! Runtime environment agent supervision and brokering.
//!
//! The agent manager launches the node's environment agent, reconciles its
//! registration handshake so that exactly one agent identity is accepted at
//! a time, and forwards per-job runtime environment create and delete
//! requests to it. The module follows hexagonal architecture:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]
//! - Environment configuration in [`config`]

pub mod adapters;
pub mod config;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
