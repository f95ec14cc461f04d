//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter        | Implements         | Connects to                   |
//! |----------------|--------------------|-------------------------------|
//! | `log_sink`     | NotificationSink   | `log` facade                  |
//! | `signal_queue` | NotificationSink   | Host main-loop signal queue   |
//! | `simulated`    | AssetPackManager   | In-memory pack catalog        |

pub mod log_sink;
pub mod signal_queue;
pub mod simulated;

pub use log_sink::LogNotificationSink;
pub use signal_queue::{Signal, SignalQueue};
pub use simulated::SimulatedAssetPackManager;
