use thiserror::Error;

/// Store failure, split by whether the store could be reached at all
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(#[source] sqlx::Error),

    #[error("{context}: {source}")]
    Query {
        context: &'static str,
        #[source]
        source: sqlx::Error,
    },
}

impl StoreError {
    /// Classify a driver error raised while running `context`
    pub fn query(context: &'static str, source: sqlx::Error) -> Self {
        if is_unavailable(&source) {
            StoreError::Unavailable(source)
        } else {
            StoreError::Query { context, source }
        }
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self, StoreError::Unavailable(_))
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::query("Store query failed", err)
    }
}

// SQLITE_CANTOPEN
const SQLITE_CANTOPEN: &str = "14";

fn is_unavailable(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Io(_)
        | sqlx::Error::Configuration(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed => true,
        sqlx::Error::Database(db) => db.code().as_deref() == Some(SQLITE_CANTOPEN),
        _ => false,
    }
}
