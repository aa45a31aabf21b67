//! SQLite-backed [`UserDirectory`].
//!
//! Credentials live with the authentication collaborator; this table only
//! carries what the case engine reads: name, role and specialization.

use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, Row, params};
use tracing::info;

use super::UserDirectory;
use crate::db::{parse_column, to_micros};
use crate::error::CaseError;
use crate::model::{Category, Role, User, UserId};

pub struct SqliteUserDirectory<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteUserDirectory<'conn> {
    #[must_use]
    pub const fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    /// Add a user. Lawyers must name a specialization; other roles must not.
    ///
    /// # Errors
    ///
    /// `Validation` on a blank name or a specialization mismatch.
    pub fn register(
        &self,
        name: &str,
        role: Role,
        specialization: Option<Category>,
    ) -> Result<User, CaseError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(CaseError::validation("name is required"));
        }
        match (role, specialization) {
            (Role::Lawyer, None) => {
                return Err(CaseError::validation("lawyers require a specialization"));
            }
            (Role::Admin | Role::Client, Some(_)) => {
                return Err(CaseError::validation(
                    "only lawyers carry a specialization",
                ));
            }
            _ => {}
        }

        let user = User {
            id: UserId::generate(),
            name: name.to_string(),
            role,
            specialization,
        };
        self.conn.execute(
            "INSERT INTO users (user_id, name, role, specialization, created_at_us)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                user.id.as_str(),
                user.name,
                role.key(),
                specialization.map(Category::key),
                to_micros(Utc::now()),
            ],
        )?;
        info!(user_id = %user.id, role = %role, "user registered");
        Ok(user)
    }

    /// All users in registration order.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn list(&self) -> Result<Vec<User>, CaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT user_id, name, role, specialization FROM users
             ORDER BY created_at_us ASC, rowid ASC",
        )?;
        let users = stmt
            .query_map([], row_to_user)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(users)
    }
}

impl UserDirectory for SqliteUserDirectory<'_> {
    fn find(&self, id: &UserId) -> Result<Option<User>, CaseError> {
        let user = self
            .conn
            .query_row(
                "SELECT user_id, name, role, specialization FROM users WHERE user_id = ?1",
                params![id.as_str()],
                row_to_user,
            )
            .optional()?;
        Ok(user)
    }
}

fn row_to_user(row: &Row<'_>) -> rusqlite::Result<User> {
    let role: String = row.get(2)?;
    let specialization: Option<String> = row.get(3)?;
    Ok(User {
        id: UserId::new(row.get::<_, String>(0)?),
        name: row.get(1)?,
        role: parse_column(2, &role)?,
        specialization: specialization
            .as_deref()
            .map(|raw| parse_column(3, raw))
            .transpose()?,
    })
}

#[cfg(test)]
mod tests {
    use super::SqliteUserDirectory;
    use crate::db;
    use crate::error::CaseError;
    use crate::model::{Category, Role, UserId};
    use crate::store::UserDirectory;

    #[test]
    fn register_and_find_lawyer() {
        let conn = db::open_in_memory().unwrap();
        let users = SqliteUserDirectory::new(&conn);

        let lawyer = users
            .register("Ada Lovelace", Role::Lawyer, Some(Category::Civil))
            .unwrap();
        let found = users.find(&lawyer.id).unwrap().unwrap();
        assert_eq!(found, lawyer);
        assert!(users.find(&UserId::new("ghost")).unwrap().is_none());
    }

    #[test]
    fn register_validates_specialization_by_role() {
        let conn = db::open_in_memory().unwrap();
        let users = SqliteUserDirectory::new(&conn);

        assert!(matches!(
            users.register("Ada", Role::Lawyer, None),
            Err(CaseError::Validation(_))
        ));
        assert!(matches!(
            users.register("Cee", Role::Client, Some(Category::Family)),
            Err(CaseError::Validation(_))
        ));
        assert!(matches!(
            users.register("  ", Role::Admin, None),
            Err(CaseError::Validation(_))
        ));
    }

    #[test]
    fn list_returns_registration_order() {
        let conn = db::open_in_memory().unwrap();
        let users = SqliteUserDirectory::new(&conn);
        users.register("First", Role::Admin, None).unwrap();
        users.register("Second", Role::Client, None).unwrap();

        let names: Vec<_> = users.list().unwrap().into_iter().map(|u| u.name).collect();
        assert_eq!(names, ["First", "Second"]);
    }
}
