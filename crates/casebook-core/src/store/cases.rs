//! SQLite-backed [`CaseStore`].
//!
//! Scalar case fields live in `cases`; evidence, hearings and access grants
//! live in child tables and are loaded alongside each case. Listing pushes
//! the role scope into the `WHERE` clause.

use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, Row, params, params_from_iter, types::ToSql};
use std::fmt::Write as _;
use tracing::{debug, info};

use super::{CaseQuery, CaseScope, CaseStore};
use crate::db::{from_micros, parse_column, to_micros};
use crate::error::{CaseError, Entity};
use crate::model::{
    AccessGrant, Case, CaseId, Category, EvidenceRef, HearingRecord, NewCase, Status, UserId,
};

const CASE_COLUMNS: &str = "c.case_id, c.case_number, c.title, c.description, c.category, \
     c.client_id, c.lawyer_id, c.status, c.created_at_us, c.updated_at_us";

pub struct SqliteCaseStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteCaseStore<'conn> {
    #[must_use]
    pub const fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn fetch(&self, id: &CaseId) -> rusqlite::Result<Option<Case>> {
        let sql = format!("SELECT {CASE_COLUMNS} FROM cases c WHERE c.case_id = ?1");
        let case = self
            .conn
            .query_row(&sql, params![id.as_str()], row_to_case)
            .optional()?;
        match case {
            Some(mut case) => {
                self.load_children(&mut case)?;
                Ok(Some(case))
            }
            None => Ok(None),
        }
    }

    fn load_children(&self, case: &mut Case) -> rusqlite::Result<()> {
        let id = case.id.as_str();

        let mut stmt = self.conn.prepare_cached(
            "SELECT file_ref, uploaded_by, uploaded_at_us
             FROM case_evidence WHERE case_id = ?1 ORDER BY evidence_id ASC",
        )?;
        case.evidence = stmt
            .query_map(params![id], |row| {
                Ok(EvidenceRef {
                    file_ref: row.get(0)?,
                    uploaded_by: UserId::new(row.get::<_, String>(1)?),
                    uploaded_at: from_micros(2, row.get(2)?)?,
                })
            })?
            .collect::<rusqlite::Result<_>>()?;

        let mut stmt = self.conn.prepare_cached(
            "SELECT hearing_at_us, notes, outcome, recorded_by, recorded_at_us
             FROM case_hearings WHERE case_id = ?1 ORDER BY hearing_id ASC",
        )?;
        case.hearings = stmt
            .query_map(params![id], |row| {
                Ok(HearingRecord {
                    date: from_micros(0, row.get(0)?)?,
                    notes: row.get(1)?,
                    outcome: row.get(2)?,
                    recorded_by: UserId::new(row.get::<_, String>(3)?),
                    recorded_at: from_micros(4, row.get(4)?)?,
                })
            })?
            .collect::<rusqlite::Result<_>>()?;

        let mut stmt = self.conn.prepare_cached(
            "SELECT user_id, permission
             FROM case_access WHERE case_id = ?1 ORDER BY granted_at_us ASC, user_id ASC",
        )?;
        case.access_list = stmt
            .query_map(params![id], |row| {
                let permission: String = row.get(1)?;
                Ok(AccessGrant {
                    user: UserId::new(row.get::<_, String>(0)?),
                    permission: parse_column(1, &permission)?,
                })
            })?
            .collect::<rusqlite::Result<_>>()?;

        Ok(())
    }
}

impl CaseStore for SqliteCaseStore<'_> {
    fn create(&self, new_case: NewCase) -> Result<Case, CaseError> {
        require_text("case number", &new_case.case_number)?;
        require_text("title", &new_case.title)?;
        require_text("description", &new_case.description)?;
        if new_case.client.is_blank() {
            return Err(CaseError::validation("client is required"));
        }
        if self.case_number_exists(&new_case.case_number)? {
            return Err(CaseError::Conflict(new_case.case_number));
        }

        let id = CaseId::generate();
        let now = to_micros(Utc::now());
        let inserted = self.conn.execute(
            "INSERT INTO cases (
                case_id, case_number, title, description, category,
                client_id, lawyer_id, status, created_at_us, updated_at_us
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, NULL, ?7, ?8, ?8)",
            params![
                id.as_str(),
                new_case.case_number,
                new_case.title,
                new_case.description,
                new_case.category.map(Category::key),
                new_case.client.as_str(),
                Status::Filed.key(),
                now,
            ],
        );
        match inserted {
            Ok(_) => {}
            Err(err) if is_unique_violation(&err) => {
                return Err(CaseError::Conflict(new_case.case_number));
            }
            Err(err) => return Err(err.into()),
        }

        info!(case_id = %id, case_number = %new_case.case_number, client = %new_case.client, "case created");
        self.find_by_id(&id)
    }

    fn find_by_id(&self, id: &CaseId) -> Result<Case, CaseError> {
        debug!(case_id = %id, "load case");
        self.fetch(id)?
            .ok_or_else(|| CaseError::not_found(Entity::Case, id))
    }

    fn find_matching(&self, query: &CaseQuery) -> Result<Vec<Case>, CaseError> {
        let mut conditions: Vec<String> = Vec::new();
        let mut param_values: Vec<Box<dyn ToSql>> = Vec::new();

        match &query.scope {
            CaseScope::Unrestricted => {}
            CaseScope::Client { client } => {
                param_values.push(Box::new(client.as_str().to_owned()));
                conditions.push(format!("c.client_id = ?{}", param_values.len()));
            }
            CaseScope::Lawyer {
                lawyer,
                specialization,
            } => {
                param_values.push(Box::new(lawyer.as_str().to_owned()));
                let lawyer_param = param_values.len();
                let mut clauses = vec![
                    format!("c.lawyer_id = ?{lawyer_param}"),
                    format!(
                        "EXISTS (SELECT 1 FROM case_access a \
                         WHERE a.case_id = c.case_id AND a.user_id = ?{lawyer_param})"
                    ),
                ];
                if let Some(specialization) = specialization {
                    param_values.push(Box::new(specialization.key()));
                    clauses.push(format!(
                        "(c.lawyer_id IS NULL AND c.category = ?{})",
                        param_values.len()
                    ));
                }
                conditions.push(format!("({})", clauses.join(" OR ")));
            }
        }

        if let Some(status) = query.status {
            param_values.push(Box::new(status.key()));
            conditions.push(format!("c.status = ?{}", param_values.len()));
        }

        let mut sql = format!("SELECT {CASE_COLUMNS} FROM cases c");
        if !conditions.is_empty() {
            let _ = write!(sql, " WHERE {}", conditions.join(" AND "));
        }
        sql.push_str(" ORDER BY c.created_at_us DESC, c.rowid DESC");
        if let Some(limit) = query.limit {
            let _ = write!(sql, " LIMIT {limit}");
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let params_ref: Vec<&dyn ToSql> = param_values.iter().map(AsRef::as_ref).collect();
        let mut cases = stmt
            .query_map(params_from_iter(params_ref), row_to_case)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        for case in &mut cases {
            self.load_children(case)?;
        }
        debug!(scope = ?query.scope, count = cases.len(), "listed cases");
        Ok(cases)
    }

    fn case_number_exists(&self, case_number: &str) -> Result<bool, CaseError> {
        let exists = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM cases WHERE case_number = ?1)",
            params![case_number],
            |row| row.get(0),
        )?;
        Ok(exists)
    }

    fn save(&self, case: &Case) -> Result<Case, CaseError> {
        require_text("title", &case.title)?;
        require_text("description", &case.description)?;

        let id = case.id.as_str();
        let tx = self.conn.unchecked_transaction()?;

        let previous: Option<i64> = tx
            .query_row(
                "SELECT updated_at_us FROM cases WHERE case_id = ?1",
                params![id],
                |row| row.get(0),
            )
            .optional()?;
        let Some(previous) = previous else {
            return Err(CaseError::not_found(Entity::Case, &case.id));
        };
        // Strictly increasing even when two saves land in the same microsecond.
        let updated = to_micros(Utc::now()).max(previous + 1);

        tx.execute(
            "UPDATE cases SET
                title = ?2,
                description = ?3,
                category = COALESCE(category, ?4),
                lawyer_id = ?5,
                status = ?6,
                updated_at_us = ?7
             WHERE case_id = ?1",
            params![
                id,
                case.title,
                case.description,
                case.category.map(Category::key),
                case.lawyer.as_ref().map(UserId::as_str),
                case.status.key(),
                updated,
            ],
        )?;

        let stored_evidence: i64 = tx.query_row(
            "SELECT COUNT(*) FROM case_evidence WHERE case_id = ?1",
            params![id],
            |row| row.get(0),
        )?;
        for entry in case
            .evidence
            .iter()
            .skip(usize::try_from(stored_evidence).unwrap_or_default())
        {
            tx.execute(
                "INSERT INTO case_evidence (case_id, file_ref, uploaded_by, uploaded_at_us)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    id,
                    entry.file_ref,
                    entry.uploaded_by.as_str(),
                    to_micros(entry.uploaded_at),
                ],
            )?;
        }

        let stored_hearings: i64 = tx.query_row(
            "SELECT COUNT(*) FROM case_hearings WHERE case_id = ?1",
            params![id],
            |row| row.get(0),
        )?;
        for hearing in case
            .hearings
            .iter()
            .skip(usize::try_from(stored_hearings).unwrap_or_default())
        {
            tx.execute(
                "INSERT INTO case_hearings (
                    case_id, hearing_at_us, notes, outcome, recorded_by, recorded_at_us
                 ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    id,
                    to_micros(hearing.date),
                    hearing.notes,
                    hearing.outcome,
                    hearing.recorded_by.as_str(),
                    to_micros(hearing.recorded_at),
                ],
            )?;
        }

        for grant in &case.access_list {
            tx.execute(
                "INSERT INTO case_access (case_id, user_id, permission, granted_at_us)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(case_id, user_id) DO UPDATE SET permission = excluded.permission",
                params![id, grant.user.as_str(), grant.permission.key(), updated],
            )?;
        }

        tx.commit()?;
        debug!(case_id = %case.id, status = %case.status, "case saved");
        self.find_by_id(&case.id)
    }

    fn delete_by_id(&self, id: &CaseId) -> Result<(), CaseError> {
        let deleted = self
            .conn
            .execute("DELETE FROM cases WHERE case_id = ?1", params![id.as_str()])?;
        if deleted == 0 {
            return Err(CaseError::not_found(Entity::Case, id));
        }
        info!(case_id = %id, "case deleted");
        Ok(())
    }
}

fn row_to_case(row: &Row<'_>) -> rusqlite::Result<Case> {
    let category: Option<String> = row.get(4)?;
    let status: String = row.get(7)?;
    Ok(Case {
        id: CaseId::new(row.get::<_, String>(0)?),
        case_number: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        category: category
            .as_deref()
            .map(|raw| parse_column(4, raw))
            .transpose()?,
        client: UserId::new(row.get::<_, String>(5)?),
        lawyer: row.get::<_, Option<String>>(6)?.map(UserId::new),
        status: parse_column(7, &status)?,
        evidence: Vec::new(),
        hearings: Vec::new(),
        access_list: Vec::new(),
        created_at: from_micros(8, row.get(8)?)?,
        updated_at: from_micros(9, row.get(9)?)?,
    })
}

fn require_text(field: &str, value: &str) -> Result<(), CaseError> {
    if value.trim().is_empty() {
        return Err(CaseError::validation(format!("{field} is required")));
    }
    Ok(())
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(inner, _)
            if inner.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}
