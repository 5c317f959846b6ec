//! Application core: control logic behind port traits.
//!
//! The service ties the emergency monitor, profile scheduler, PID
//! controller and run state machine together. All interaction with
//! hardware happens through the traits in [`ports`], so this layer is
//! fully testable without a kiln.

pub mod commands;
pub mod events;
pub mod history;
pub mod link;
pub mod ports;
pub mod runner;
pub mod service;
