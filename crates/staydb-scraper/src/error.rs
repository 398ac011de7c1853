use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScraperError {
    /// An expected page element is missing; the site markup has drifted
    /// from the configured selectors.
    #[error("structural mismatch: {element} not found (selector: {selector})")]
    StructuralMismatch { element: String, selector: String },

    /// A detail element did not appear within the bounded wait. Recovered
    /// by the record collector; the affected fields degrade to absent.
    #[error("timed out after {waited_ms}ms waiting for {element}")]
    DetailTimeout { element: String, waited_ms: u64 },

    #[error("browser protocol error: {0}")]
    Browser(#[from] chromiumoxide::error::CdpError),

    #[error("failed to launch browser: {0}")]
    Launch(String),

    #[error("invalid page script for {context}: {reason}")]
    InvalidScript { context: String, reason: String },

    #[error("unexpected script result for {context}: {source}")]
    ScriptResult {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("no detail page is open")]
    DetailNotOpen,

    #[error("pagination limit reached: exceeded {max_pages} pages")]
    PaginationLimit { max_pages: usize },

    #[error("I/O error at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl ScraperError {
    pub(crate) fn structural(element: impl Into<String>, selector: impl Into<String>) -> Self {
        Self::StructuralMismatch {
            element: element.into(),
            selector: selector.into(),
        }
    }
}
