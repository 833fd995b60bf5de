use thiserror::Error;

#[derive(Error, Debug)]
pub enum CompError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("{entity} not found: {key}")]
    NotFound { entity: &'static str, key: String },

    #[error("{entity} already exists: {key}")]
    DuplicateKey { entity: &'static str, key: String },

    #[error("{entity} {key} is still in use: {dependents}")]
    InUse { entity: &'static str, key: String, dependents: String },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid period: month {month}, year {year}")]
    InvalidPeriod { month: u32, year: i32 },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CompError {
    pub fn not_found(entity: &'static str, key: impl ToString) -> Self {
        CompError::NotFound { entity, key: key.to_string() }
    }

    pub fn duplicate(entity: &'static str, key: impl ToString) -> Self {
        CompError::DuplicateKey { entity, key: key.to_string() }
    }

    pub fn in_use(entity: &'static str, key: impl ToString, dependents: impl Into<String>) -> Self {
        CompError::InUse { entity, key: key.to_string(), dependents: dependents.into() }
    }
}

pub type CompResult<T> = Result<T, CompError>;
