//! bugtrackr - a small bug tracker.
//!
//! Bugs are filed against a shared document store and handed to the
//! least-loaded teammate. Each user's bug list is kept live by merging two
//! store subscriptions (bugs they filed, bugs assigned to them), and a trend
//! aggregator turns submission timestamps into a per-day series.
//!
//! The crate provides both the `bugtrackr` CLI and a library.

#![forbid(unsafe_code)]

// Domain model and store
pub mod domain;
pub mod error;
pub mod id_generation;
pub mod store;

// Core engines
pub mod assignment;
pub mod filter;
pub mod reconciler;
pub mod stats;
pub mod suggestions;
pub mod trend;

// Services
pub mod notify;
pub mod session;
pub mod tracker;

// Workspace wiring and CLI
pub mod app;
pub mod cli;
pub mod commands;
pub mod config;
pub mod output;
