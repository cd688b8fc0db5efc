//! CLI command implementations.

mod collections;
mod config;
mod doctor;
mod ingest;
mod init;

pub use collections::run_collections;
pub use config::run_config;
pub use doctor::run_doctor;
pub use ingest::run_ingest;
pub use init::run_init;
