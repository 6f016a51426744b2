use thiserror::Error;

#[derive(Error, Debug)]
pub enum DecoderError {
    #[error("Google API key not found: set {0} in the environment or a .env file")]
    MissingCredential(String),

    #[error("Unsupported file format '{0}': expected csv, tsv, xlsx, xlsm, xls, ods or txt")]
    UnsupportedFormat(String),

    #[error("Could not parse '{document}': {details}")]
    ParseError { document: String, details: String },

    #[error("Nothing to analyze: upload at least one financial statement")]
    NothingToAnalyze,

    #[error("Report generation failed: {0}")]
    CompletionFailed(String),

    #[error("Chart rendering failed: {0}")]
    ChartError(String),

    #[cfg(feature = "gemini")]
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl DecoderError {
    pub(crate) fn parse(document: impl Into<String>, details: impl std::fmt::Display) -> Self {
        DecoderError::ParseError {
            document: document.into(),
            details: details.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, DecoderError>;
