//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter        | Implements                       | Connects to                 |
//! |----------------|----------------------------------|-----------------------------|
//! | `config_file`  | ConfigPort                       | JSON file on disk           |
//! | `delay`        | embedded_hal `DelayNs`           | `std::thread::sleep`        |
//! | `hardware`     | TemperatureSource + HeaterOutput | thermocouple reader + relay |
//! | `log_sink`     | EventSink                        | `log` facade                |
//! | `profile_file` | ProfileSource                    | directory of JSON profiles  |
//! | `relay`        | HeaterOutput                     | any `OutputPin`, worker thread |
//! | `simulated`    | TemperatureSource + HeaterOutput | lumped thermal model        |
//! | `time`         | ClockPort                        | `std::time::Instant`        |

pub mod config_file;
pub mod delay;
pub mod hardware;
pub mod log_sink;
pub mod profile_file;
pub mod relay;
pub mod simulated;
pub mod time;
