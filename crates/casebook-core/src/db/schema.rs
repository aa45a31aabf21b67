//! Canonical SQLite schema for the case store.
//!
//! - `cases` keeps the scalar fields of each case
//! - `case_evidence` and `case_hearings` are append-only child tables
//! - `case_access` holds supplemental per-case grants
//! - `notifications` are addressed to users and optionally link a case
//! - `users` stands in for the external user directory
//! - `store_meta` tracks the applied schema version

/// Migration v1: users, cases, child tables and metadata.
pub const MIGRATION_V1_SQL: &str = r"
CREATE TABLE IF NOT EXISTS users (
    user_id TEXT PRIMARY KEY,
    name TEXT NOT NULL CHECK (length(trim(name)) > 0),
    role TEXT NOT NULL CHECK (role IN ('admin', 'lawyer', 'client')),
    specialization TEXT CHECK (
        specialization IS NULL
        OR specialization IN ('civil', 'criminal', 'family', 'corporate')
    ),
    created_at_us INTEGER NOT NULL,
    CHECK (role <> 'lawyer' OR specialization IS NOT NULL)
);

CREATE TABLE IF NOT EXISTS cases (
    case_id TEXT PRIMARY KEY,
    case_number TEXT NOT NULL UNIQUE CHECK (length(trim(case_number)) > 0),
    title TEXT NOT NULL CHECK (length(trim(title)) > 0),
    description TEXT NOT NULL CHECK (length(trim(description)) > 0),
    category TEXT CHECK (
        category IS NULL
        OR category IN ('civil', 'criminal', 'family', 'corporate')
    ),
    client_id TEXT NOT NULL CHECK (length(trim(client_id)) > 0),
    lawyer_id TEXT,
    status TEXT NOT NULL DEFAULT 'filed'
        CHECK (status IN ('filed', 'in_progress', 'hearing_scheduled', 'closed')),
    created_at_us INTEGER NOT NULL,
    updated_at_us INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS case_evidence (
    evidence_id INTEGER PRIMARY KEY AUTOINCREMENT,
    case_id TEXT NOT NULL REFERENCES cases(case_id) ON DELETE CASCADE,
    file_ref TEXT NOT NULL CHECK (length(trim(file_ref)) > 0),
    uploaded_by TEXT NOT NULL,
    uploaded_at_us INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS case_hearings (
    hearing_id INTEGER PRIMARY KEY AUTOINCREMENT,
    case_id TEXT NOT NULL REFERENCES cases(case_id) ON DELETE CASCADE,
    hearing_at_us INTEGER NOT NULL,
    notes TEXT,
    outcome TEXT,
    recorded_by TEXT NOT NULL,
    recorded_at_us INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS case_access (
    case_id TEXT NOT NULL REFERENCES cases(case_id) ON DELETE CASCADE,
    user_id TEXT NOT NULL,
    permission TEXT NOT NULL CHECK (permission IN ('view', 'edit')),
    granted_at_us INTEGER NOT NULL,
    PRIMARY KEY (case_id, user_id)
);

CREATE TABLE IF NOT EXISTS notifications (
    notification_id TEXT PRIMARY KEY,
    recipient_id TEXT NOT NULL,
    message TEXT NOT NULL,
    case_id TEXT,
    is_read INTEGER NOT NULL DEFAULT 0 CHECK (is_read IN (0, 1)),
    created_at_us INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS store_meta (
    id INTEGER PRIMARY KEY CHECK (id = 1),
    schema_version INTEGER NOT NULL
);

INSERT OR IGNORE INTO store_meta (id, schema_version) VALUES (1, 1);
";

/// Migration v2: read-path indexes for role-scoped listing.
pub const MIGRATION_V2_SQL: &str = r"
CREATE INDEX IF NOT EXISTS idx_cases_client_created
    ON cases(client_id, created_at_us DESC);

CREATE INDEX IF NOT EXISTS idx_cases_lawyer_created
    ON cases(lawyer_id, created_at_us DESC);

CREATE INDEX IF NOT EXISTS idx_cases_unassigned_category
    ON cases(category, created_at_us DESC) WHERE lawyer_id IS NULL;

CREATE INDEX IF NOT EXISTS idx_cases_status_created
    ON cases(status, created_at_us DESC);

CREATE INDEX IF NOT EXISTS idx_case_access_user
    ON case_access(user_id, case_id);

CREATE INDEX IF NOT EXISTS idx_case_evidence_case
    ON case_evidence(case_id, evidence_id);

CREATE INDEX IF NOT EXISTS idx_case_hearings_case
    ON case_hearings(case_id, hearing_id);

CREATE INDEX IF NOT EXISTS idx_notifications_recipient_created
    ON notifications(recipient_id, created_at_us DESC);

UPDATE store_meta
SET schema_version = 2
WHERE id = 1;
";

/// Indexes expected by list and lookup query paths.
pub const REQUIRED_INDEXES: &[&str] = &[
    "idx_cases_client_created",
    "idx_cases_lawyer_created",
    "idx_cases_unassigned_category",
    "idx_cases_status_created",
    "idx_case_access_user",
    "idx_case_evidence_case",
    "idx_case_hearings_case",
    "idx_notifications_recipient_created",
];
