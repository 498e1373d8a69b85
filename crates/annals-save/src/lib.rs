//! Save-format front end for Annals: lexing, tree parsing, and container
//! member handling.
//!
//! The format is the nested `key = value` / braced-block text that strategy
//! saves are written in. Its one genuinely awkward property is ambiguity:
//! a repeated key means "list" and a singleton means "scalar", so the same
//! field can arrive in either shape depending on what the game had to say.
//! The parser resolves that into a single [`Value`] tree; the accessor layer
//! on `Value` absorbs the rest of the looseness (one-element list collapse,
//! numbers as strings, `yes`/`no` booleans) so downstream extraction code can
//! ask typed questions.
//!
//! Parsing is pure and stateless — parse as many members in parallel as you
//! have cores for.

/// Container members (`gamestate`, `meta`) and whole-save parsing.
pub mod container;
/// Diagnostics with source spans, rendered via ariadne.
pub mod diagnostics;
/// Error types shared by the lexer and parser.
pub mod error;
/// The streaming save-text lexer.
pub mod lexer;
/// The recursive-descent tree parser.
pub mod parser;
/// The generic save value tree and its accessor layer.
pub mod value;

/// Re-export container types.
pub use container::{MemberError, ParsedSave, SaveMembers};
/// Re-export diagnostics types.
pub use diagnostics::Diagnostic;
/// Re-export error types.
pub use error::{SaveError, SaveResult};
/// Re-export the member parse entry point.
pub use parser::parse;
/// Re-export the value tree.
pub use value::Value;
