//! Integration test driver for `tests/integration/` submodule.
//!
//! Each `mod` below maps to a file that exercises one interlock module
//! against mock adapters.  All tests run on the host (x86_64) with no
//! real hardware required.

mod counter_timer_tests;
mod menu_tests;
mod mock_hw;
mod water_jet_tests;
mod water_tank_tests;
