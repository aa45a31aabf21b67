//! SQLite-backed [`NotificationStore`].

use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, Row, params};

use super::NotificationStore;
use crate::db::{from_micros, to_micros};
use crate::error::CaseError;
use crate::model::{CaseId, NewNotification, Notification, NotificationId, UserId};

const NOTIFICATION_COLUMNS: &str =
    "notification_id, recipient_id, message, case_id, is_read, created_at_us";

pub struct SqliteNotificationStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteNotificationStore<'conn> {
    #[must_use]
    pub const fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl NotificationStore for SqliteNotificationStore<'_> {
    fn insert(&self, notification: NewNotification) -> Result<Notification, CaseError> {
        // Truncate to the stored precision so the returned record equals a reload.
        let created_at = from_micros(0, to_micros(Utc::now()))?;
        let created = Notification {
            id: NotificationId::generate(),
            recipient: notification.recipient,
            message: notification.message,
            case_id: notification.case_id,
            read: false,
            created_at,
        };
        self.conn.execute(
            "INSERT INTO notifications (
                notification_id, recipient_id, message, case_id, is_read, created_at_us
             ) VALUES (?1, ?2, ?3, ?4, 0, ?5)",
            params![
                created.id.as_str(),
                created.recipient.as_str(),
                created.message,
                created.case_id.as_ref().map(CaseId::as_str),
                to_micros(created.created_at),
            ],
        )?;
        Ok(created)
    }

    fn mark_read(
        &self,
        id: &NotificationId,
        recipient: &UserId,
    ) -> Result<Option<Notification>, CaseError> {
        self.conn.execute(
            "UPDATE notifications SET is_read = 1
             WHERE notification_id = ?1 AND recipient_id = ?2",
            params![id.as_str(), recipient.as_str()],
        )?;
        let sql = format!(
            "SELECT {NOTIFICATION_COLUMNS} FROM notifications
             WHERE notification_id = ?1 AND recipient_id = ?2"
        );
        let found = self
            .conn
            .query_row(&sql, params![id.as_str(), recipient.as_str()], row_to_notification)
            .optional()?;
        Ok(found)
    }

    fn list_for(
        &self,
        recipient: &UserId,
        unread_only: bool,
    ) -> Result<Vec<Notification>, CaseError> {
        let filter = if unread_only { " AND is_read = 0" } else { "" };
        let sql = format!(
            "SELECT {NOTIFICATION_COLUMNS} FROM notifications
             WHERE recipient_id = ?1{filter}
             ORDER BY created_at_us DESC, rowid DESC"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let notifications = stmt
            .query_map(params![recipient.as_str()], row_to_notification)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(notifications)
    }
}

fn row_to_notification(row: &Row<'_>) -> rusqlite::Result<Notification> {
    Ok(Notification {
        id: NotificationId::new(row.get::<_, String>(0)?),
        recipient: UserId::new(row.get::<_, String>(1)?),
        message: row.get(2)?,
        case_id: row.get::<_, Option<String>>(3)?.map(CaseId::new),
        read: row.get(4)?,
        created_at: from_micros(5, row.get(5)?)?,
    })
}
