//! Integration tests for manifest creation, verification and update

mod check_mode;
mod config_integration;
mod subtree;
mod write_mode;
