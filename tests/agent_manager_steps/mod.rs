//! Step definitions for agent manager behaviour scenarios.

pub mod given;
pub mod then;
pub mod when;
pub mod world;
