//! Domain records: cases, users, notifications and their identifiers.

pub mod case;
pub mod ids;
pub mod notification;
pub mod user;

pub use case::{
    AccessGrant, Case, CaseDraft, CasePatch, Category, EvidenceRef, HearingDraft, HearingRecord,
    NewCase, ParseEnumError, Permission, Status,
};
pub use ids::{CaseId, NotificationId, UserId};
pub use notification::{NewNotification, Notification};
pub use user::{Actor, Role, User};
