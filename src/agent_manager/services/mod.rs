//! Service layer for agent supervision, registration and runtime env
//! brokering.

mod broker;
mod error;
mod handler;
mod manager;
mod supervisor;

pub use error::{AgentManagerError, AgentManagerResult, EMPTY_REFUSAL_MESSAGE, RuntimeEnvError};
pub use handler::{
    AgentManagerSlot, DefaultAgentManagerServiceHandler, MANAGER_UNAVAILABLE_MESSAGE,
};
pub use manager::AgentManager;
