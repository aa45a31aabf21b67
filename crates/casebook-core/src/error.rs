use std::fmt;

use crate::model::Status;
use crate::policy::Action;

/// Machine-readable error codes for transport mapping and operator triage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    NotInitialized,
    ConfigParseError,
    ActorRequired,
    ValidationFailed,
    CaseNotFound,
    UserNotFound,
    NotificationNotFound,
    Forbidden,
    InvalidStateTransition,
    DuplicateCaseNumber,
    StorageFailure,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::NotInitialized => "E1001",
            Self::ConfigParseError => "E1002",
            Self::ActorRequired => "E1003",
            Self::ValidationFailed => "E2001",
            Self::CaseNotFound => "E2101",
            Self::UserNotFound => "E2102",
            Self::NotificationNotFound => "E2103",
            Self::Forbidden => "E2201",
            Self::InvalidStateTransition => "E2301",
            Self::DuplicateCaseNumber => "E2401",
            Self::StorageFailure => "E5001",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::NotInitialized => "Casebook not initialized",
            Self::ConfigParseError => "Config file parse error",
            Self::ActorRequired => "Acting user required",
            Self::ValidationFailed => "Invalid input",
            Self::CaseNotFound => "Case not found",
            Self::UserNotFound => "User not found",
            Self::NotificationNotFound => "Notification not found",
            Self::Forbidden => "Action not permitted",
            Self::InvalidStateTransition => "Invalid status transition",
            Self::DuplicateCaseNumber => "Case number already exists",
            Self::StorageFailure => "Storage failure",
        }
    }

    /// Optional remediation hint that can be surfaced to operators.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::NotInitialized => Some("Run `cb init` to create the case database."),
            Self::ConfigParseError => Some("Fix syntax in .casebook/config.toml and retry."),
            Self::ActorRequired => Some("Pass --as <user-id> or set CASEBOOK_USER."),
            Self::ValidationFailed => Some("Title and description are required and must not be blank."),
            Self::CaseNotFound | Self::UserNotFound | Self::NotificationNotFound => None,
            Self::Forbidden => Some("Ask an admin or the assigned lawyer to perform this action."),
            Self::InvalidStateTransition => Some(
                "Follow valid transitions: Filed -> In Progress -> Hearing Scheduled, In Progress -> Closed, Closed -> In Progress.",
            ),
            Self::DuplicateCaseNumber => Some("Omit the case number to have one generated."),
            Self::StorageFailure => Some("Retry once. If persistent, check the database file and logs."),
        }
    }

    /// Status equivalent used by transports: not-found 404, forbidden 403,
    /// validation 400, everything else 500.
    #[must_use]
    pub const fn transport_status(self) -> u16 {
        match self {
            Self::CaseNotFound | Self::UserNotFound | Self::NotificationNotFound => 404,
            Self::Forbidden | Self::ActorRequired => 403,
            Self::ValidationFailed => 400,
            Self::NotInitialized
            | Self::ConfigParseError
            | Self::InvalidStateTransition
            | Self::DuplicateCaseNumber
            | Self::StorageFailure => 500,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Kind of record a lookup failed to find.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    Case,
    User,
    Notification,
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Case => "case",
            Self::User => "user",
            Self::Notification => "notification",
        })
    }
}

/// Errors surfaced by the case service and its collaborators.
///
/// Policy and lifecycle failures propagate to the transport boundary
/// unchanged. Notification persistence failures never appear here; the
/// emitter logs and drops them.
#[derive(Debug, thiserror::Error)]
pub enum CaseError {
    /// Malformed or missing input.
    #[error("validation failed: {0}")]
    Validation(String),

    /// A referenced case, user, or notification does not exist.
    #[error("{entity} '{id}' not found")]
    NotFound { entity: Entity, id: String },

    /// The actor lacks permission for the requested action.
    #[error("user '{actor}' may not {action} case '{case_id}'")]
    Forbidden {
        actor: String,
        action: Action,
        case_id: String,
    },

    /// The requested status change is not in the transition table.
    #[error("cannot move case '{case_id}' from {from} to {to}")]
    InvalidTransition {
        case_id: String,
        from: Status,
        to: Status,
    },

    /// Uniqueness violation.
    #[error("case number '{0}' already exists")]
    Conflict(String),

    /// The backing database failed.
    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),
}

impl CaseError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub(crate) fn not_found(entity: Entity, id: impl fmt::Display) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Machine-readable code associated with this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Validation(_) => ErrorCode::ValidationFailed,
            Self::NotFound { entity, .. } => match entity {
                Entity::Case => ErrorCode::CaseNotFound,
                Entity::User => ErrorCode::UserNotFound,
                Entity::Notification => ErrorCode::NotificationNotFound,
            },
            Self::Forbidden { .. } => ErrorCode::Forbidden,
            Self::InvalidTransition { .. } => ErrorCode::InvalidStateTransition,
            Self::Conflict(_) => ErrorCode::DuplicateCaseNumber,
            Self::Storage(_) => ErrorCode::StorageFailure,
        }
    }

    /// Optional remediation hint for operators.
    #[must_use]
    pub const fn hint(&self) -> Option<&'static str> {
        self.code().hint()
    }
}

#[cfg(test)]
mod tests {
    use super::{CaseError, Entity, ErrorCode};
    use crate::model::Status;
    use crate::policy::Action;
    use std::collections::HashSet;

    const ALL: [ErrorCode; 11] = [
        ErrorCode::NotInitialized,
        ErrorCode::ConfigParseError,
        ErrorCode::ActorRequired,
        ErrorCode::ValidationFailed,
        ErrorCode::CaseNotFound,
        ErrorCode::UserNotFound,
        ErrorCode::NotificationNotFound,
        ErrorCode::Forbidden,
        ErrorCode::InvalidStateTransition,
        ErrorCode::DuplicateCaseNumber,
        ErrorCode::StorageFailure,
    ];

    #[test]
    fn all_codes_are_unique() {
        let mut seen = HashSet::new();
        for code in ALL {
            assert!(seen.insert(code.code()), "duplicate code {}", code.code());
        }
    }

    #[test]
    fn code_format_is_machine_friendly() {
        for code in ALL {
            let raw = code.code();
            assert_eq!(raw.len(), 5);
            assert!(raw.starts_with('E'));
            assert!(raw.chars().skip(1).all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn transport_status_follows_error_kind() {
        assert_eq!(
            CaseError::not_found(Entity::Case, "c-1").code().transport_status(),
            404
        );
        assert_eq!(
            CaseError::not_found(Entity::Notification, "n-1")
                .code()
                .transport_status(),
            404
        );
        let forbidden = CaseError::Forbidden {
            actor: "u-1".into(),
            action: Action::Delete,
            case_id: "c-1".into(),
        };
        assert_eq!(forbidden.code().transport_status(), 403);
        assert_eq!(
            CaseError::validation("title is required")
                .code()
                .transport_status(),
            400
        );
        let invalid = CaseError::InvalidTransition {
            case_id: "c-1".into(),
            from: Status::Filed,
            to: Status::Closed,
        };
        assert_eq!(invalid.code().transport_status(), 500);
        assert_eq!(
            CaseError::Conflict("CASE-1".into()).code().transport_status(),
            500
        );
    }

    #[test]
    fn display_names_the_offending_record() {
        let err = CaseError::not_found(Entity::User, "u-42");
        assert_eq!(err.to_string(), "user 'u-42' not found");

        let err = CaseError::InvalidTransition {
            case_id: "c-9".into(),
            from: Status::Filed,
            to: Status::Closed,
        };
        assert_eq!(err.to_string(), "cannot move case 'c-9' from Filed to Closed");
    }
}
