//! scuttle - panic-trigger secure-erase and shutdown orchestrator
//!
//! One operator-triggered emergency flow: lock the console, walk the device
//! tree, destroy key material and data through external destructive tools,
//! flush, and take the host down before a cold-boot attack becomes
//! practical.

pub mod actions;
pub mod cli;
pub mod config;
pub mod observability;
pub mod orchestrator;
pub mod platform;
pub mod shutdown;
pub mod walker;
