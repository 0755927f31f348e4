//! Default pin assignments for the water-jet cutter board.
//!
//! Pins are named `P<port>.<bit>` as printed on the controller board.
//! Configuration may override any of them; these are only the defaults.

// ---------------------------------------------------------------------------
// Inputs
// ---------------------------------------------------------------------------

/// Cabinet door switch.  HIGH = door closed.
pub const DOOR_SWITCH: &str = "P2.12";
/// Middle float in the catch tank.  HIGH = water above the middle mark.
pub const JET_MIDDLE_FLOAT: &str = "P1.28";
/// High float in the catch tank.  HIGH = tank about to overflow.
pub const JET_HIGH_FLOAT: &str = "P1.29";

// ---------------------------------------------------------------------------
// Outputs
// ---------------------------------------------------------------------------

/// Dump valve, drains the catch tank through the filters.
pub const JET_DUMP_VALVE: &str = "P2.5";
/// Low-pressure feed pump.
pub const JET_LOW_PRESSURE_PUMP: &str = "P2.7";
/// High-pressure intensifier pump.
pub const JET_HIGH_PRESSURE_PUMP: &str = "P1.22";
