//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter       | Implements         | Connects to                    |
//! |---------------|--------------------|--------------------------------|
//! | `gpio`        | DigitalIo          | embedded-hal input/output pins |
//! | `json_config` | ConfigPort         | JSON file on disk              |
//! | `log_sink`    | EventSink          | `log` output                   |
//! | `sd_card`     | MenuFs             | SD card mounted as a directory |
//! | `sim`         | embedded-hal pins  | in-memory levels (simulator)   |
//! |               | MachineState       | operator-set flags             |
//! |               | CommandChannel     | in-memory command queue        |
//! | `switches`    | SwitchRegistry     | in-memory switch modules       |
//! | `time`        | -                  | monotonic host clock           |

pub mod gpio;
pub mod json_config;
pub mod log_sink;
pub mod sd_card;
pub mod sim;
pub mod switches;
pub mod time;
