//! Contract tests for docklift.
//!
//! Contracts are invariants that must ALWAYS hold for the local side of the
//! tool: port assignment across a workspace, document handling, and the exit
//! codes callers script against. None of them contacts a host.
//!
//! Run with: cargo test --test contracts

mod common;

#[path = "contracts/ports.rs"]
mod ports;

#[path = "contracts/documents.rs"]
mod documents;

#[path = "contracts/exit_codes.rs"]
mod exit_codes;
