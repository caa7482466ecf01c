use std::fmt;
use std::str::FromStr;

use super::persistence::{Record, RecordError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// May create and close accounts.
    Admin,
    User,
}

impl Role {
    fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::User => "user",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    /// Roles are matched exactly, as they are written to the users file.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "user" => Ok(Role::User),
            other => Err(other.to_string()),
        }
    }
}

/// A registered user.
///
/// The password is kept and stored as plain text so existing users files stay
/// readable. It is only ever compared verbatim.
#[derive(Clone, PartialEq, Eq)]
pub struct User {
    username: String,
    password: String,
    role: Role,
}

impl User {
    pub(crate) fn new(username: impl Into<String>, password: impl Into<String>, role: Role) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            role,
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Plain equality, not constant time.
    pub fn authenticate(&self, candidate: &str) -> bool {
        self.password == candidate
    }
}

// Keeps the password out of log lines.
impl fmt::Debug for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("User")
            .field("username", &self.username)
            .field("role", &self.role)
            .finish_non_exhaustive()
    }
}

impl Record for User {
    fn to_fields(&self) -> Vec<String> {
        vec![
            self.username.clone(),
            self.password.clone(),
            self.role.to_string(),
        ]
    }

    fn from_fields(fields: &csv::StringRecord) -> Result<Self, RecordError> {
        match (fields.get(0), fields.get(1), fields.get(2)) {
            (Some(username), Some(password), Some(role)) => {
                let role = role.parse().map_err(|role| RecordError::InvalidField {
                    field: "role",
                    reason: format!("'{role}' is neither admin nor user"),
                })?;
                Ok(User::new(username, password, role))
            }
            _ => Err(RecordError::MissingField {
                expected: 3,
                found: fields.len(),
            }),
        }
    }
}
