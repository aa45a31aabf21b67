use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use super::case::{Category, ParseEnumError, normalize};
use super::ids::UserId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Admin,
    Lawyer,
    Client,
}

impl Role {
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Lawyer => "lawyer",
            Self::Client => "client",
        }
    }

    const fn label(self) -> &'static str {
        match self {
            Self::Admin => "Admin",
            Self::Lawyer => "Lawyer",
            Self::Client => "Client",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Role {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "admin" => Ok(Self::Admin),
            "lawyer" => Ok(Self::Lawyer),
            "client" => Ok(Self::Client),
            _ => Err(ParseEnumError {
                expected: "role",
                got: s.to_string(),
            }),
        }
    }
}

/// A user as held by the user directory. Only lawyers carry a specialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub role: Role,
    pub specialization: Option<Category>,
}

/// The authenticated user performing an operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub id: UserId,
    pub name: String,
    pub role: Role,
    pub specialization: Option<Category>,
}

impl Actor {
    pub fn admin(id: impl Into<UserId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            role: Role::Admin,
            specialization: None,
        }
    }

    pub fn lawyer(
        id: impl Into<UserId>,
        name: impl Into<String>,
        specialization: Category,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            role: Role::Lawyer,
            specialization: Some(specialization),
        }
    }

    pub fn client(id: impl Into<UserId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            role: Role::Client,
            specialization: None,
        }
    }

    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    #[must_use]
    pub fn is_lawyer(&self) -> bool {
        self.role == Role::Lawyer
    }
}

impl From<User> for Actor {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            role: user.role,
            specialization: user.specialization,
        }
    }
}

impl fmt::Display for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.id, self.role)
    }
}
