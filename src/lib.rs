#![forbid(unsafe_code)]

//! `geotrackd` — background location tracking session daemon.
//!
//! Callers request continuous location updates that keep running in a
//! supervised background host process even after the caller
//! disconnects. This crate owns the session lifecycle state machine,
//! durable callback registration, precondition gating, and the
//! asynchronous acknowledgement protocol.

pub mod bridge;
pub mod config;
pub mod controller;
pub mod errors;
pub mod forwarder;
pub mod gate;
pub mod host;
pub mod models;
pub mod persistence;
pub mod registry;

pub use config::GlobalConfig;
pub use errors::{AppError, Result};
