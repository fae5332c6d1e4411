//! # Delivery dispatch server
//! The HTTP surface over the dispatch engine. It is responsible for:
//! * the rider-facing dispatch endpoints (available orders, accept, reject),
//! * the vendor proximity search,
//! * broadcasting ready orders to their eligible rider sets,
//! * pushing fire-and-forget notifications to rider devices via the push gateway, and
//! * (optionally) sweeping stale pending assignment requests on a timer.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more
//! information.

pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod integrations;
pub mod routes;
pub mod server;
pub mod sweep_worker;

#[cfg(test)]
mod endpoint_tests;
