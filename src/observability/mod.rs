//! Observability for scuttle
//!
//! A panic handler cannot afford an observability layer that itself blocks,
//! allocates ambitiously, or spawns threads. This module provides exactly
//! one thing: a synchronous structured logger whose output is flushed line
//! by line as the erase and shutdown stages progress.

mod logger;

pub use logger::{Logger, Severity};
