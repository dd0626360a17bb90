use thiserror::Error;

#[derive(Error, Debug)]
pub enum SQLError {
    #[error("query error: {0}")]
    Query(String),

    #[error("execution error: {0}")]
    Execution(String),

    /// A UNIQUE or PRIMARY KEY constraint rejected a write: the row exists.
    #[error("duplicate key: {0}")]
    Duplicate(String),

    /// A CHECK, FOREIGN KEY or NOT NULL constraint rejected a write.
    #[error("constraint violation: {0}")]
    Constraint(String),

    #[error("transaction error: {0}")]
    Transaction(String),

    #[error("connection error: {0}")]
    Connection(String),
}

impl SQLError {
    /// Whether the write collided with an existing key.
    pub fn is_duplicate(&self) -> bool {
        matches!(self, SQLError::Duplicate(_))
    }
}
