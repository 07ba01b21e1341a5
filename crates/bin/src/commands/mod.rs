//! Subcommand implementations.

pub mod health;
pub mod kid;
pub mod password;
pub mod serve;
