/// Errors surfaced by circle operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    /// The engagement row was written but the contact update was rejected.
    #[error("Engagement {engagement_id} was saved but the contact update failed: {source}")]
    PartialWrite {
        engagement_id: String,
        #[source]
        source: Box<Error>,
    },

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Not signed in. Run 'circle login' first.")]
    NotSignedIn,

    #[error("No .circle directory found. Run 'circle init' first.")]
    NoWorkspace,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
