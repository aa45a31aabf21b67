//! Persistence seams and their SQLite implementations.
//!
//! Stores hold no policy: they validate shape (non-empty required fields,
//! uniqueness) and trust the caller for everything else. Each SQLite store
//! borrows a `&Connection` for one unit of work and caches nothing.

pub mod cases;
pub mod notifications;
pub mod users;

pub use cases::SqliteCaseStore;
pub use notifications::SqliteNotificationStore;
pub use users::SqliteUserDirectory;

use crate::error::CaseError;
use crate::model::{
    Case, CaseId, Category, NewCase, NewNotification, Notification, NotificationId, Status, User,
    UserId,
};

/// Row-level scope for listing, derived from the actor's role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaseScope {
    Unrestricted,
    /// Cases assigned to `lawyer`, unassigned cases in `specialization`, and
    /// cases where `lawyer` appears on the access list.
    Lawyer {
        lawyer: UserId,
        specialization: Option<Category>,
    },
    Client {
        client: UserId,
    },
}

impl CaseScope {
    /// In-memory form of the predicate the SQLite store pushes into its query.
    #[must_use]
    pub fn matches(&self, case: &Case) -> bool {
        match self {
            Self::Unrestricted => true,
            Self::Lawyer {
                lawyer,
                specialization,
            } => {
                case.is_assigned_to(lawyer)
                    || (case.lawyer().is_none()
                        && specialization.is_some()
                        && case.category() == *specialization)
                    || case.grant_for(lawyer).is_some()
            }
            Self::Client { client } => case.client() == client,
        }
    }
}

/// Filter for [`CaseStore::find_matching`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaseQuery {
    pub scope: CaseScope,
    pub status: Option<Status>,
    pub limit: Option<u32>,
}

impl CaseQuery {
    #[must_use]
    pub const fn scoped(scope: CaseScope) -> Self {
        Self {
            scope,
            status: None,
            limit: None,
        }
    }
}

/// Owner of persisted case records.
pub trait CaseStore {
    /// Insert a new case in status Filed.
    ///
    /// # Errors
    ///
    /// `Validation` when title, description, client or case number is blank;
    /// `Conflict` when the case number is taken.
    fn create(&self, new_case: NewCase) -> Result<Case, CaseError>;

    /// # Errors
    ///
    /// `NotFound` when no case has this id.
    fn find_by_id(&self, id: &CaseId) -> Result<Case, CaseError>;

    /// Cases matching `query`, most recently created first.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store fails.
    fn find_matching(&self, query: &CaseQuery) -> Result<Vec<Case>, CaseError>;

    /// # Errors
    ///
    /// Returns an error if the backing store fails.
    fn case_number_exists(&self, case_number: &str) -> Result<bool, CaseError>;

    /// Persist `case`, refreshing its updated timestamp, and return the
    /// stored state. Never rewrites the client or case number, sets category
    /// only while unset, and only appends evidence and hearings.
    ///
    /// # Errors
    ///
    /// `NotFound` when the case was deleted in the meantime.
    fn save(&self, case: &Case) -> Result<Case, CaseError>;

    /// # Errors
    ///
    /// `NotFound` when no case has this id.
    fn delete_by_id(&self, id: &CaseId) -> Result<(), CaseError>;
}

/// Persistence for notifications.
pub trait NotificationStore {
    /// # Errors
    ///
    /// Returns an error if the backing store fails.
    fn insert(&self, notification: NewNotification) -> Result<Notification, CaseError>;

    /// Flip `read` to true when `recipient` owns the notification.
    /// Returns `None` when it does not exist or belongs to someone else.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store fails.
    fn mark_read(
        &self,
        id: &NotificationId,
        recipient: &UserId,
    ) -> Result<Option<Notification>, CaseError>;

    /// Notifications for `recipient`, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store fails.
    fn list_for(&self, recipient: &UserId, unread_only: bool)
    -> Result<Vec<Notification>, CaseError>;
}

/// Read-only view of the external user directory.
pub trait UserDirectory {
    /// # Errors
    ///
    /// Returns an error if the backing store fails.
    fn find(&self, id: &UserId) -> Result<Option<User>, CaseError>;
}
