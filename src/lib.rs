//! CNC interlock controller library.
//!
//! Counter-timer switch controllers, the cutting water tank level
//! interlock, the water-jet cutter process FSM, fault escalation and the
//! SD-card menu interpreter.  Everything outside the [`adapters`] talks to
//! the machine through the port traits in [`app::ports`], so the whole
//! core runs on the host for tests and simulation.

#![deny(unused_must_use)]

pub mod actuation;
pub mod adapters;
pub mod app;
pub mod config;
pub mod controllers;
pub mod diagnostics;
pub mod error;
pub mod escalation;
pub mod fsm;
pub mod menu;
pub mod pins;
pub mod safety;
pub mod sensors;
pub mod timer;

pub use error::{Error, Result};
