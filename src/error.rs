use thiserror::Error;

#[derive(Debug, Error)]
pub enum AdsmendError {
    #[error("source ad group {group} unavailable: {reason}")]
    SourceUnavailable { group: String, reason: String },
    #[error("destination ad group {group} unavailable: {reason}")]
    DestinationUnavailable { group: String, reason: String },
    #[error("config invalid: {0}")]
    InvalidConfig(String),
    #[error("creating {entity} failed: {reason}")]
    CreationFailed { entity: String, reason: String },
}

/// Construction invariants of [`crate::engine::model::MultiSlotAd`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error("{class} count {count} outside {min}..={max}")]
    SlotCount {
        class: &'static str,
        count: usize,
        min: usize,
        max: usize,
    },
    #[error("two {class}s pinned to the same position")]
    DuplicatePin { class: &'static str },
    #[error("{0} path segments, at most 2 allowed")]
    TooManyPathSegments(usize),
}

/// Fatal to one ad's transformation, never to the run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransformError {
    #[error("insufficient content: {0}")]
    InsufficientContent(String),
    #[error("padding exhausted: no distinct {class} filler left ({have} of {need})")]
    PaddingExhausted {
        class: &'static str,
        have: usize,
        need: usize,
    },
    #[error("transformed ad invalid: {0}")]
    Invalid(#[from] ModelError),
}

impl TransformError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::InsufficientContent(_) => "INSUFFICIENT_CONTENT",
            Self::PaddingExhausted { .. } => "PADDING_EXHAUSTED",
            Self::Invalid(_) => "INVALID_CANDIDATE",
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("ad group {0} not found")]
    GroupNotFound(String),
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("creation rejected: {0}")]
    Rejected(String),
    #[error("unexpected store payload: {0}")]
    Parse(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}
