//! Integration test driver for `tests/integration/` submodules.
//!
//! Each `mod` below maps to a file that exercises a subsystem against mock
//! adapters. Everything runs on the host with no hardware.

mod mock_hw;
mod reader_tests;
mod service_tests;
mod simulation_tests;
