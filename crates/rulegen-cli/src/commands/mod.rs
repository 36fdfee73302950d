//! Subcommand implementations.

pub mod generate;
pub mod init;
pub mod output;
pub mod verify_manifest;
