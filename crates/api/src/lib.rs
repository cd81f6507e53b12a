//! HTTP API: server wiring, routing, identity binding, request/response mapping.

pub mod app;
pub mod config;
pub mod context;
pub mod middleware;
