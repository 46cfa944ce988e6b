//! eventwatch library
//!
//! Exposes the dashboard pieces for the binary and for integration tests.

pub mod app;
pub mod cli;
pub mod config;
pub mod dashboard;
pub mod event;
pub mod fetch;
pub mod format;
pub mod poller;
pub mod ui;
