//! Spot price CLI library
//!
//! Fetches the Elering price table, caches it on disk for a bounded time and
//! normalizes each row into a timestamp label and a price in c/kWh.

pub mod cache;
pub mod cli;
pub mod config;
pub mod pipeline;
pub mod prices;
pub mod render;
