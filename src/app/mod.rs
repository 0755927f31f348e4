//! Application core: pure domain orchestration, zero I/O.
//!
//! The interlock modules, the menu navigator and the console command
//! handling meet here.  All interaction with hardware happens through
//! **port traits** defined in [`ports`], keeping this layer fully testable
//! without real peripherals.

pub mod commands;
pub mod events;
pub mod ports;
pub mod service;

pub use service::Controller;
