use std::fmt;

#[derive(Debug, Clone, thiserror::Error)]
pub enum DashboardError {
    /// Secrets or settings are missing or malformed.
    #[error("configuration error: {0}")]
    Config(String),

    #[error("authentication failed: {0}")]
    Authentication(String),

    /// The sheet key or a worksheet name does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("survey worksheet has {found} columns, expected {expected}")]
    Schema { expected: usize, found: usize },

    #[error("survey {sid}: cannot parse date {value:?}")]
    DateParse { sid: String, value: String },

    #[error("unknown dimension {0:?}")]
    UnknownDimension(String),

    /// The selection left no period with observations.
    #[error("selection has no data")]
    EmptySelection,

    #[error("chart rendering failed: {0}")]
    Render(String),
}

pub type DashboardResult<T> = Result<T, DashboardError>;

/// A rating cell that held text outside the Likert vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct DataQualityWarning {
    pub sid: String,
    pub field: &'static str,
    pub value: String,
}

impl fmt::Display for DataQualityWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "survey {} has unrecognized {} response {:?}",
            self.sid, self.field, self.value
        )
    }
}
