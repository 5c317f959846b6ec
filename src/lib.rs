//! Kiln firing controller library.
//!
//! Exposes the control core, its port traits and the host adapters so the
//! binary, integration tests and other front ends can assemble a
//! controller from the same parts.

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod config;
pub mod control;
pub mod error;
pub mod fsm;
pub mod profile;
pub mod safety;
pub mod scheduler;
pub mod sensors;
pub mod simulator;
