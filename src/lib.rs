//! Agent supervisor: per-node management of the runtime environment agent.
//!
//! This crate supervises a side-car agent process that materialises
//! per-job runtime environments. It launches the agent, accepts exactly one
//! live agent identity through a registration handshake, and brokers the
//! reference-counted create and delete protocol for runtime environments
//! over a lazily built RPC client.
//!
//! # Architecture
//!
//! The crate follows hexagonal architecture principles:
//!
//! - **Domain**: agent identity, registration state and launch values
//! - **Ports**: traits for process launching, agent RPC clients, retry
//!   delays and the inbound registration handler
//! - **Adapters**: tokio-backed implementations plus in-memory fakes
//!
//! Transport machinery is left to the host: it implements
//! [`agent_manager::ports::RuntimeEnvAgentClientFactory`] and dispatches
//! registrations into [`agent_manager::ports::AgentManagerServiceHandler`].
//!
//! # Modules
//!
//! - [`agent_manager`]: supervision, registration and runtime env brokering

pub mod agent_manager;
