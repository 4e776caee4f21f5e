//! Unit tests for the agent manager module.

mod support;
