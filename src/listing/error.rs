use crate::scan::LexError;
use std::fmt;
use thiserror::Error;

/// Longest snippet of page text kept in an error
const SNIPPET_LIMIT: usize = 120;

/// The sections of a listing page, in the order they are extracted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ExtractStep {
    MainContent,
    Title,
    Price,
    Images,
    Attributes,
    Description,
    Script,
}

impl ExtractStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExtractStep::MainContent => "main-content",
            ExtractStep::Title => "title",
            ExtractStep::Price => "price",
            ExtractStep::Images => "images",
            ExtractStep::Attributes => "attributes",
            ExtractStep::Description => "description",
            ExtractStep::Script => "script",
        }
    }
}

impl fmt::Display for ExtractStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a step failed
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExtractFailure {
    #[error("marker not found before the end of the page")]
    MissingMarker,

    #[error("{0}")]
    Malformed(String),

    #[error("{0}")]
    Lex(#[from] LexError),
}

/// A listing page that could not be turned into a record
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{step} extraction failed: {failure} (near {snippet:?})")]
pub struct ExtractError {
    pub step: ExtractStep,
    pub failure: ExtractFailure,
    /// The page text the step was looking at, truncated
    pub snippet: String,
}

impl ExtractError {
    pub fn missing(step: ExtractStep) -> Self {
        Self {
            step,
            failure: ExtractFailure::MissingMarker,
            snippet: String::new(),
        }
    }

    pub fn malformed(step: ExtractStep, reason: impl Into<String>, snippet: &str) -> Self {
        Self {
            step,
            failure: ExtractFailure::Malformed(reason.into()),
            snippet: truncate(snippet),
        }
    }

    pub fn lex(step: ExtractStep, err: LexError) -> Self {
        Self {
            step,
            failure: ExtractFailure::Lex(err),
            snippet: String::new(),
        }
    }
}

fn truncate(snippet: &str) -> String {
    match snippet.char_indices().nth(SNIPPET_LIMIT) {
        Some((cut, _)) => format!("{}…", &snippet[..cut]),
        None => snippet.to_string(),
    }
}

/// Attaches the step name to lexer failures
pub(crate) trait StepContext<T> {
    fn at(self, step: ExtractStep) -> Result<T, ExtractError>;
}

impl<T> StepContext<T> for Result<T, LexError> {
    fn at(self, step: ExtractStep) -> Result<T, ExtractError> {
        self.map_err(|err| ExtractError::lex(step, err))
    }
}
