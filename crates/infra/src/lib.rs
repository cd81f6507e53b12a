//! Infrastructure layer: credential and transaction storage, database wiring.

pub mod db;
pub mod store;
