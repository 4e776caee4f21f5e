//! In-memory adapters for deterministic supervision and broker tests.

mod client;
mod launcher;
mod scheduler;

pub use client::{
    DEFAULT_RUNTIME_ENV_CONTEXT, InMemoryRuntimeEnvAgentClientFactory,
    ScriptedRuntimeEnvAgentClient,
};
pub use launcher::{InMemoryAgentProcess, InMemoryAgentProcessLauncher};
pub use scheduler::RecordingRetryScheduler;
