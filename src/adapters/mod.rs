//! Adapters — concrete implementations of the hexagonal port traits.
//!
//! | Adapter         | Implements     | Connects to                   |
//! |-----------------|----------------|-------------------------------|
//! | `ble`           | CommandLink    | Hub GATT session (`ble` feat) |
//! | `log_sink`      | EventSink      | Log output                    |
//! | `loopback`      | CommandLink    | In-memory hub simulation      |
//! |                 | Transport      |                               |
//! | `severity_file` | SeverityPort   | Analysis result documents     |
//! | `time`          | Clock          | OS sleep                      |

#[cfg(feature = "ble")]
pub mod ble;
pub mod log_sink;
pub mod loopback;
pub mod severity_file;
pub mod time;
