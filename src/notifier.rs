//! User-facing feedback: desktop notifications via notify-rust (D-Bus)
//! and a best-effort haptic cue.

use std::io::Write;

use notify_rust::Notification;
use tracing::{debug, warn};

use crate::config::FeedbackConfig;

pub struct Notifier {
    notifications: bool,
    haptics: bool,
}

impl Notifier {
    pub fn new(config: &FeedbackConfig) -> Self {
        Self {
            notifications: config.notifications,
            haptics: config.haptics,
        }
    }

    /// Show a failure notice. Always printed; also sent to the desktop when enabled.
    pub fn alert(&self, summary: &str, body: &str) {
        eprintln!("\n⚠ {summary}: {body}");

        if !self.notifications {
            return;
        }

        debug!("Notification: {summary}");

        if let Err(e) = Notification::new()
            .summary(summary)
            .body(body)
            .icon("accessories-dictionary")
            .timeout(5000)
            .show()
        {
            warn!("Failed to show notification: {e}");
        }
    }

    /// Short tactile cue on a completion toggle. Terminals render it as a bell.
    pub fn haptic(&self) {
        if !self.haptics {
            return;
        }
        let mut out = std::io::stdout();
        if out.write_all(b"\x07").and_then(|()| out.flush()).is_err() {
            debug!("Haptic cue unavailable");
        }
    }
}
