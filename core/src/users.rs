use serde::Deserialize;
use thiserror::Error;

/// Column limit shared by `users.username` and `users.password`.
pub const MAX_FIELD_LEN: usize = 50;

/// One entry of the seed file: `[{ "fields": { "username": .., "password": .. } }, ..]`.
#[derive(Debug, Clone, Deserialize)]
pub struct SeedRecord {
    pub fields: SeedUser,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeedUser {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SeedError {
    #[error("record {index}: {field} must not be empty")]
    Empty { index: usize, field: &'static str },
    #[error("record {index}: {field} exceeds {MAX_FIELD_LEN} characters")]
    TooLong { index: usize, field: &'static str },
    #[error("record {index}: duplicate username '{username}'")]
    Duplicate { index: usize, username: String },
}

/// Check every record against the `users` column constraints before any insert.
pub fn validate_seed(records: &[SeedRecord]) -> Result<(), SeedError> {
    let mut seen = std::collections::HashSet::new();
    for (index, record) in records.iter().enumerate() {
        let user = &record.fields;
        for (field, value) in [("username", &user.username), ("password", &user.password)] {
            if value.trim().is_empty() {
                return Err(SeedError::Empty { index, field });
            }
            if value.chars().count() > MAX_FIELD_LEN {
                return Err(SeedError::TooLong { index, field });
            }
        }
        if !seen.insert(user.username.as_str()) {
            return Err(SeedError::Duplicate {
                index,
                username: user.username.clone(),
            });
        }
    }
    Ok(())
}
