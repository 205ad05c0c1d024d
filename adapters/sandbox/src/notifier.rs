//! Notifier that records every message for later inspection.

use horde_survival_core::{Notifier, OwnerId};
use parking_lot::Mutex;

/// A message delivered through the sandbox notifier.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Notification {
    /// Sent to a single owner.
    Direct {
        /// Recipient.
        owner: OwnerId,
        /// Message text.
        message: String,
    },
    /// Sent to everyone.
    Broadcast {
        /// Message text.
        message: String,
    },
}

/// Notifier that keeps every message in delivery order.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    log: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages sent to the owner, oldest first.
    #[must_use]
    pub fn messages_for(&self, owner: OwnerId) -> Vec<String> {
        self.log
            .lock()
            .iter()
            .filter_map(|notification| match notification {
                Notification::Direct {
                    owner: recipient,
                    message,
                } if *recipient == owner => Some(message.clone()),
                _ => None,
            })
            .collect()
    }

    /// Broadcast messages, oldest first.
    #[must_use]
    pub fn broadcasts(&self) -> Vec<String> {
        self.log
            .lock()
            .iter()
            .filter_map(|notification| match notification {
                Notification::Broadcast { message } => Some(message.clone()),
                Notification::Direct { .. } => None,
            })
            .collect()
    }

    /// Removes and returns everything recorded so far.
    pub fn drain(&self) -> Vec<Notification> {
        std::mem::take(&mut *self.log.lock())
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, owner: OwnerId, message: &str) {
        self.log.lock().push(Notification::Direct {
            owner,
            message: message.to_owned(),
        });
    }

    fn broadcast(&self, message: &str) {
        self.log.lock().push(Notification::Broadcast {
            message: message.to_owned(),
        });
    }
}
