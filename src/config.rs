//! Controller configuration parameters
//!
//! Every module reads its keys from this tree.  Keys absent from the source
//! take the documented defaults below; required keys (switch names, pins
//! without a sensible default, fault menus) are checked by each module's
//! factory, which refuses to build the module when they are missing.

use serde::{Deserialize, Serialize};

/// Seconds between two displays of a fault menu from the same module.
pub const DEFAULT_FAULT_DELAY_SECONDS: u32 = 20;

/// Pin name meaning "not connected".
pub const PIN_NOT_CONNECTED: &str = "nc";

/// Root configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// Any number of independent counter-timer switch controllers.
    pub counter_timers: Vec<CounterTimerConfig>,
    pub cutting_water_tank: WaterTankConfig,
    pub waterjetcutter: WaterJetConfig,
    pub panel: PanelConfig,
    /// Rate limit for re-displaying a fault menu (seconds).
    pub fault_delay_seconds: u32,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            counter_timers: Vec::new(),
            cutting_water_tank: WaterTankConfig::default(),
            waterjetcutter: WaterJetConfig::default(),
            panel: PanelConfig::default(),
            fault_delay_seconds: DEFAULT_FAULT_DELAY_SECONDS,
        }
    }
}

// --- Counter timer ---

/// One `(switch, state-on-trigger)` pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwitchBindingConfig {
    pub name: String,
    /// State the switch takes when the timer triggers.
    #[serde(default = "default_true")]
    pub on_trigger: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CounterTimerConfig {
    /// Instance name used in replies and logs.
    pub name: String,
    pub enable: bool,
    /// Between one and five switches, driven in order.
    pub switches: Vec<SwitchBindingConfig>,
    pub threshold_seconds: f32,
    /// `singleshot` or `multishot`.
    #[serde(rename = "type")]
    pub kind: String,
    /// `level`, `below`, `rising` or `falling`.
    pub trigger: String,
    pub inverted: bool,
    /// 0 = always armed.
    pub arm_mcode: u16,
    pub disarm_mcode: u16,
    /// Menu entered when a single-shot timer fires; empty for none.
    pub menu: String,
}

impl Default for CounterTimerConfig {
    fn default() -> Self {
        Self {
            name: String::from("timer"),
            enable: false,
            switches: Vec::new(),
            threshold_seconds: 50.0,
            kind: String::from("multishot"),
            trigger: String::from("level"),
            inverted: false,
            arm_mcode: 0,
            disarm_mcode: 0,
            menu: String::new(),
        }
    }
}

// --- Cutting water tank ---

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WaterTankConfig {
    pub enable: bool,
    pub middle_float_pin: String,
    pub high_float_pin: String,
    pub dump_valve_pin: String,
    pub low_pressure_pump_pin: String,
    pub low_water_detected_menu: String,
    pub high_water_detected_menu: String,
    pub filters_blocked_menu: String,
    pub fill_cycle_seconds: u32,
    pub filter_cleaning_seconds: u32,
    pub water_level_too_low_seconds: u32,
}

impl Default for WaterTankConfig {
    fn default() -> Self {
        Self {
            enable: false,
            middle_float_pin: String::from(PIN_NOT_CONNECTED),
            high_float_pin: String::from(PIN_NOT_CONNECTED),
            dump_valve_pin: String::from(PIN_NOT_CONNECTED),
            low_pressure_pump_pin: String::from(PIN_NOT_CONNECTED),
            low_water_detected_menu: String::new(),
            high_water_detected_menu: String::new(),
            filters_blocked_menu: String::new(),
            fill_cycle_seconds: 3600,      // 1 h
            filter_cleaning_seconds: 7200, // 2 h
            water_level_too_low_seconds: 655_200,
        }
    }
}

// --- Water-jet cutter ---

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WaterJetConfig {
    pub enable: bool,
    pub door_switch_pin: String,
    pub middle_float_pin: String,
    pub high_float_pin: String,
    pub dump_valve_pin: String,
    pub low_pressure_pump_pin: String,
    pub high_pressure_pump_pin: String,
    pub error_wl_low_menu: String,
    pub error_wl_high_menu: String,
    pub error_clean_filters_menu: String,
    pub fill_cycle_seconds: u32,
    pub filter_cleaning_seconds: u32,
    pub water_level_too_low_seconds: u32,
}

impl Default for WaterJetConfig {
    fn default() -> Self {
        Self {
            enable: false,
            door_switch_pin: String::from(crate::pins::DOOR_SWITCH),
            middle_float_pin: String::from(crate::pins::JET_MIDDLE_FLOAT),
            high_float_pin: String::from(crate::pins::JET_HIGH_FLOAT),
            dump_valve_pin: String::from(crate::pins::JET_DUMP_VALVE),
            low_pressure_pump_pin: String::from(crate::pins::JET_LOW_PRESSURE_PUMP),
            high_pressure_pump_pin: String::from(crate::pins::JET_HIGH_PRESSURE_PUMP),
            error_wl_low_menu: String::new(),
            error_wl_high_menu: String::new(),
            error_clean_filters_menu: String::new(),
            fill_cycle_seconds: 20,
            filter_cleaning_seconds: 40,
            water_level_too_low_seconds: 2400,
        }
    }
}

// --- Panel ---

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PanelConfig {
    /// Directory holding the root menu.
    pub menu_root: String,
    /// Label language; selects `label-<language>` directives.
    pub language: String,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            menu_root: String::from("/sd/menu/main"),
            language: String::from("en"),
        }
    }
}

fn default_true() -> bool {
    true
}

/// A pin entry is usable when it names a real pin.
pub fn pin_is_connected(pin: &str) -> bool {
    !pin.is_empty() && !pin.eq_ignore_ascii_case(PIN_NOT_CONNECTED)
}
