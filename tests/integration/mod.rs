//! Integration tests for the studiotree workspace tree engine

mod cli_contracts;
mod reconcile_store;
mod session_autosave;
mod support;
mod tree_properties;
mod tree_scenarios;
