//! Customer segmentation and aggregation for marketing campaign tables.
//!
//! The [`data`] module is the engine: it derives per-customer fields, filters
//! the population by marital status, age bracket and gender, and computes the
//! aggregate views drawn by the dashboard binary.

pub mod config;
pub mod data;
