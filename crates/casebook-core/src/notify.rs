//! Notification emitter.
//!
//! `notify` is fire-and-forget: a failed write is logged and dropped so the
//! transition that triggered it stays committed. Reads and `mark_read` do
//! report errors, and a notification addressed to someone else is reported
//! as not found.

use tracing::{info, warn};

use crate::error::{CaseError, Entity};
use crate::model::{CaseId, NewNotification, Notification, NotificationId, UserId};
use crate::store::NotificationStore;

pub struct NotificationEmitter<'a> {
    store: &'a dyn NotificationStore,
    enabled: bool,
}

impl<'a> NotificationEmitter<'a> {
    #[must_use]
    pub fn new(store: &'a dyn NotificationStore) -> Self {
        Self {
            store,
            enabled: true,
        }
    }

    /// Turn delivery on or off. A disabled emitter records nothing.
    #[must_use]
    pub const fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Record a message for `recipient`. Returns `None` when delivery is
    /// disabled or the write failed.
    pub fn notify(
        &self,
        recipient: &UserId,
        message: impl Into<String>,
        case_id: Option<&CaseId>,
    ) -> Option<Notification> {
        if !self.enabled {
            return None;
        }
        let pending = NewNotification {
            recipient: recipient.clone(),
            message: message.into(),
            case_id: case_id.cloned(),
        };
        match self.store.insert(pending) {
            Ok(notification) => {
                info!(
                    notification_id = %notification.id,
                    recipient = %notification.recipient,
                    "notification recorded"
                );
                Some(notification)
            }
            Err(err) => {
                warn!(%recipient, error = %err, "notification dropped");
                None
            }
        }
    }

    /// Mark a notification read on behalf of `requester`. Idempotent.
    ///
    /// # Errors
    ///
    /// `NotFound` when the notification does not exist or `requester` is not
    /// its recipient.
    pub fn mark_read(
        &self,
        id: &NotificationId,
        requester: &UserId,
    ) -> Result<Notification, CaseError> {
        self.store
            .mark_read(id, requester)?
            .ok_or_else(|| CaseError::not_found(Entity::Notification, id))
    }

    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub fn list(&self, recipient: &UserId, unread_only: bool) -> Result<Vec<Notification>, CaseError> {
        self.store.list_for(recipient, unread_only)
    }
}
