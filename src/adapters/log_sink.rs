//! Log-based notification sink adapter.
//!
//! Implements [`NotificationSink`] by writing one structured line per
//! notification through the `log` facade. Useful on hosts that only need
//! a trace of what the bridge would have signalled.

use log::info;

use crate::app::events::Notification;
use crate::app::ports::NotificationSink;
use crate::codec::Value;

/// Adapter that logs every [`Notification`].
#[derive(Debug, Default)]
pub struct LogNotificationSink;

impl LogNotificationSink {
    pub fn new() -> Self {
        Self
    }
}

impl NotificationSink for LogNotificationSink {
    fn emit(&mut self, notification: &Notification) {
        let args = notification.to_message();
        let rendered: Vec<String> = args
            .iter()
            .map(|(key, value)| format!("{key}={}", render(value)))
            .collect();
        info!("SIGNAL | {} | {}", notification.signal(), rendered.join(" "));
    }
}

fn render(value: &Value) -> String {
    match value {
        Value::Int(i) => i.to_string(),
        Value::WideUnsigned(u) => u.to_string(),
        Value::Str(s) => format!("{s:?}"),
        Value::Message(m) => format!("{{{} keys}}", m.len()),
        Value::Sequence(items) => format!("[{} items]", items.len()),
    }
}
