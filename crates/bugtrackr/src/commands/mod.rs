//! Command implementations that don't need an open workspace.

pub mod init;
