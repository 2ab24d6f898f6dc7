//! Grouping of eligible recipients into one message per device token.

use cubby_core::types::id::{TrackerId, UserId};
use cubby_core::types::notification::EligibleRecipient;
use cubby_core::types::push::PushMessage;

/// Prefix of every reminder body
pub const BODY_PREFIX: &str = "Trackers due: ";

/// Separator between tracker names in a reminder body
pub const NAME_SEPARATOR: &str = ", ";

/// One reminder addressed to a single device token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationBatch {
    /// Device the reminder is sent to
    pub device_token: String,
    /// Reminder title
    pub title: String,
    /// Display names of the due trackers, first-seen order, no repeats
    pub tracker_names: Vec<String>,
    /// Every (tracker, user) pair this reminder stands for. All of them
    /// get a ledger row once the message is accepted.
    pub pairs: Vec<(TrackerId, UserId)>,
}

impl NotificationBatch {
    fn new(device_token: &str, title: &str) -> Self {
        Self {
            device_token: device_token.to_string(),
            title: title.to_string(),
            tracker_names: Vec::new(),
            pairs: Vec::new(),
        }
    }

    fn add(&mut self, recipient: &EligibleRecipient) {
        if !self.tracker_names.contains(&recipient.tracker_display_name) {
            self.tracker_names
                .push(recipient.tracker_display_name.clone());
        }
        let pair = (recipient.tracker_id, recipient.user_id);
        if !self.pairs.contains(&pair) {
            self.pairs.push(pair);
        }
    }

    /// Body text, e.g. `Trackers due: Bedsheet Change, Filter`
    pub fn body(&self) -> String {
        format!("{BODY_PREFIX}{}", self.tracker_names.join(NAME_SEPARATOR))
    }

    /// The push message for this batch
    pub fn to_message(&self) -> PushMessage {
        PushMessage::new(self.device_token.clone(), self.title.clone(), self.body())
    }
}

/// Group recipients by device token.
///
/// Batches come out in the order their token first appears in the input.
pub fn compose(recipients: &[EligibleRecipient], title: &str) -> Vec<NotificationBatch> {
    let mut batches: Vec<NotificationBatch> = Vec::new();
    for recipient in recipients {
        match batches
            .iter_mut()
            .find(|b| b.device_token == recipient.device_token)
        {
            Some(batch) => batch.add(recipient),
            None => {
                let mut batch = NotificationBatch::new(&recipient.device_token, title);
                batch.add(recipient);
                batches.push(batch);
            }
        }
    }
    batches
}
