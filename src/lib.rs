//! market-collector: periodic market-data collector
//!
//! This library provides:
//! - Spot quote fetching from CoinGecko
//! - Normalization into canonical market ticks
//! - Fan-out to Postgres, Redis and Kafka with per-asset, per-sink isolation
//! - A fixed-interval, non-overlapping scheduler
//! - Structured logging and Prometheus metrics

pub mod app;
pub mod cli;
pub mod collector;
pub mod config;
pub mod sink;
pub mod source;
pub mod telemetry;
pub mod tick;
