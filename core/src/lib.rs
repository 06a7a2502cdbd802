pub mod audit;
pub mod config;
pub mod crypto;
pub mod determinism;
pub mod disclosure;
pub mod ledger;
pub mod manifest;
pub mod registry;
pub mod scoring;
pub mod store;

pub mod error;
