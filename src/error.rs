use thiserror::Error;

/// Main error type for the annotation table crate.
/// Aggregates errors from the table engine, its persistence layer and the textual inputs.
#[derive(Error, Debug)]
pub enum AnnotationTableError {
    #[error("{0}")]
    WithContextError(String),

    #[error("{0}")]
    AnyhowError(#[from] anyhow::Error),

    // Helper module errors
    #[error("{0}")]
    BytesError(#[from] crate::helpers::bytes::BytesError),

    // Table module errors
    #[error("{0}")]
    TableError(#[from] crate::table::TableError),

    #[error("{0}")]
    ContentError(#[from] crate::content::ContentError),

    #[error("{0}")]
    PersistError(#[from] crate::persist::PersistError),

    // Textual input errors
    #[error("{0}")]
    OptionsError(#[from] crate::options::OptionsError),

    #[error("{0}")]
    ReferenceError(#[from] crate::reference::ReferenceError),
}

pub(crate) trait ResultMessage<T> {
    fn with_prefix(self, message: &str) -> Result<T, AnnotationTableError>;
}

impl<T, E: Into<AnnotationTableError>> ResultMessage<T> for Result<T, E> {
    fn with_prefix(self, message: &str) -> Result<T, AnnotationTableError> {
        self.map_err(|e| AnnotationTableError::WithContextError(format!("{}: {}", message, e.into())))
    }
}
