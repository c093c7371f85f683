//! Integration tests for market-collector

mod collector_test;
mod support;
