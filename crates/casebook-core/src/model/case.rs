use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use super::ids::{CaseId, UserId};

/// Case lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Status {
    #[serde(rename = "Filed")]
    Filed,
    #[serde(rename = "In Progress")]
    InProgress,
    #[serde(rename = "Hearing Scheduled")]
    HearingScheduled,
    #[serde(rename = "Closed")]
    Closed,
}

impl Status {
    pub const ALL: [Self; 4] = [
        Self::Filed,
        Self::InProgress,
        Self::HearingScheduled,
        Self::Closed,
    ];

    /// Key stored in the `cases.status` column.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Filed => "filed",
            Self::InProgress => "in_progress",
            Self::HearingScheduled => "hearing_scheduled",
            Self::Closed => "closed",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Filed => "Filed",
            Self::InProgress => "In Progress",
            Self::HearingScheduled => "Hearing Scheduled",
            Self::Closed => "Closed",
        }
    }
}

/// Fixed set of practice areas. Also used as a lawyer's specialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Civil,
    Criminal,
    Family,
    Corporate,
}

impl Category {
    pub const ALL: [Self; 4] = [Self::Civil, Self::Criminal, Self::Family, Self::Corporate];

    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Civil => "civil",
            Self::Criminal => "criminal",
            Self::Family => "family",
            Self::Corporate => "corporate",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Civil => "Civil",
            Self::Criminal => "Criminal",
            Self::Family => "Family",
            Self::Corporate => "Corporate",
        }
    }
}

/// Supplemental grant level in a case's access list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Permission {
    View,
    Edit,
}

impl Permission {
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::View => "view",
            Self::Edit => "edit",
        }
    }
}

/// Reference to an uploaded file. The bytes live with the storage collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvidenceRef {
    pub file_ref: String,
    pub uploaded_by: UserId,
    pub uploaded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HearingRecord {
    pub date: DateTime<Utc>,
    pub notes: Option<String>,
    pub outcome: Option<String>,
    pub recorded_by: UserId,
    pub recorded_at: DateTime<Utc>,
}

/// Caller-supplied hearing details; the recorder is always the actor.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HearingDraft {
    pub date: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub outcome: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessGrant {
    pub user: UserId,
    pub permission: Permission,
}

/// A persisted case.
///
/// Fields are crate-visible only: outside callers read through accessors and
/// change a case exclusively through the service. Within the crate, `client`
/// and `case_number` are never reassigned after creation, `status` is written
/// only by the lifecycle engine, and `evidence`/`hearings` are only appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Case {
    pub(crate) id: CaseId,
    pub(crate) case_number: String,
    pub(crate) title: String,
    pub(crate) description: String,
    pub(crate) category: Option<Category>,
    pub(crate) client: UserId,
    pub(crate) lawyer: Option<UserId>,
    pub(crate) status: Status,
    pub(crate) evidence: Vec<EvidenceRef>,
    pub(crate) hearings: Vec<HearingRecord>,
    pub(crate) access_list: Vec<AccessGrant>,
    pub(crate) created_at: DateTime<Utc>,
    pub(crate) updated_at: DateTime<Utc>,
}

impl Case {
    #[must_use]
    pub const fn id(&self) -> &CaseId {
        &self.id
    }

    #[must_use]
    pub fn case_number(&self) -> &str {
        &self.case_number
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    #[must_use]
    pub const fn category(&self) -> Option<Category> {
        self.category
    }

    #[must_use]
    pub const fn client(&self) -> &UserId {
        &self.client
    }

    #[must_use]
    pub const fn lawyer(&self) -> Option<&UserId> {
        self.lawyer.as_ref()
    }

    #[must_use]
    pub const fn status(&self) -> Status {
        self.status
    }

    #[must_use]
    pub fn evidence(&self) -> &[EvidenceRef] {
        &self.evidence
    }

    #[must_use]
    pub fn hearings(&self) -> &[HearingRecord] {
        &self.hearings
    }

    #[must_use]
    pub fn access_list(&self) -> &[AccessGrant] {
        &self.access_list
    }

    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    #[must_use]
    pub fn is_assigned_to(&self, user: &UserId) -> bool {
        self.lawyer.as_ref() == Some(user)
    }

    /// Strongest supplemental grant held by `user`, if any.
    #[must_use]
    pub fn grant_for(&self, user: &UserId) -> Option<Permission> {
        self.access_list
            .iter()
            .filter(|grant| &grant.user == user)
            .map(|grant| grant.permission)
            .max()
    }

    /// Add or upgrade an access-list entry. Grants are never downgraded.
    pub(crate) fn grant(&mut self, user: UserId, permission: Permission) {
        if let Some(existing) = self.access_list.iter_mut().find(|g| g.user == user) {
            existing.permission = existing.permission.max(permission);
        } else {
            self.access_list.push(AccessGrant { user, permission });
        }
    }
}

/// Input accepted from a filing client.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CaseDraft {
    pub case_number: Option<String>,
    pub title: String,
    pub description: String,
    pub category: Option<Category>,
}

/// Fully-resolved record handed to the store for insertion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCase {
    pub case_number: String,
    pub title: String,
    pub description: String,
    pub category: Option<Category>,
    pub client: UserId,
}

/// Edits to a case's descriptive fields. `None` leaves a field untouched.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CasePatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<Category>,
}

/// Error returned when parsing an enum value from text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseEnumError {
    pub expected: &'static str,
    pub got: String,
}

impl fmt::Display for ParseEnumError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid {}: '{}'", self.expected, self.got)
    }
}

impl std::error::Error for ParseEnumError {}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Lowercase and fold spaces/hyphens so `In Progress`, `in-progress` and
/// `in_progress` all parse.
pub(crate) fn normalize(input: &str) -> String {
    input
        .trim()
        .to_ascii_lowercase()
        .replace([' ', '-'], "_")
}

impl FromStr for Status {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "filed" => Ok(Self::Filed),
            "in_progress" => Ok(Self::InProgress),
            "hearing_scheduled" => Ok(Self::HearingScheduled),
            "closed" => Ok(Self::Closed),
            _ => Err(ParseEnumError {
                expected: "status",
                got: s.to_string(),
            }),
        }
    }
}

impl FromStr for Category {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "civil" => Ok(Self::Civil),
            "criminal" => Ok(Self::Criminal),
            "family" => Ok(Self::Family),
            "corporate" => Ok(Self::Corporate),
            _ => Err(ParseEnumError {
                expected: "category",
                got: s.to_string(),
            }),
        }
    }
}

impl FromStr for Permission {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "view" => Ok(Self::View),
            "edit" => Ok(Self::Edit),
            _ => Err(ParseEnumError {
                expected: "permission",
                got: s.to_string(),
            }),
        }
    }
}
