use crate::lexer::{LexError, Span};
use crate::parser::ParseError;

/// Alias for `Result<T, SaveError>`.
pub type SaveResult<T> = Result<T, SaveError>;

/// Any failure while turning member text into a value tree. Both kinds are
/// fatal to the member being parsed; neither affects other files.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SaveError {
    /// The lexer hit input that matches no token class.
    #[error(transparent)]
    Lex(#[from] LexError),

    /// The token stream violates the block grammar.
    #[error(transparent)]
    Parse(#[from] ParseError),
}

impl SaveError {
    /// The source span the failure points at, for diagnostics rendering.
    pub fn span(&self) -> &Span {
        match self {
            SaveError::Lex(e) => &e.span,
            SaveError::Parse(e) => e.span(),
        }
    }
}
