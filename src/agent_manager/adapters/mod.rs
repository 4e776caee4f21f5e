//! Adapter implementations for agent manager ports.

pub mod memory;

mod process;
mod scheduler;

pub use process::{TokioAgentProcess, TokioAgentProcessLauncher};
pub use scheduler::TokioRetryScheduler;
