use crate::error::SaveError;
use crate::parser;
use crate::value::Value;

/// Name of the mandatory container member holding the world state.
pub const GAMESTATE_MEMBER: &str = "gamestate";
/// Name of the optional container member holding save metadata.
pub const META_MEMBER: &str = "meta";

/// The textual members of one save container.
///
/// On disk a save is an archive with a `gamestate` member and usually a
/// `meta` member; unpacking the archive is the discovery component's job, so
/// this type starts where that job ends — at member text. `meta` may be
/// absent; `gamestate` may not.
#[derive(Debug, Clone)]
pub struct SaveMembers {
    /// Full text of the `gamestate` member.
    pub gamestate: String,
    /// Full text of the `meta` member, when the container carried one.
    pub meta: Option<String>,
}

impl SaveMembers {
    /// Container members with only a `gamestate`.
    pub fn new(gamestate: impl Into<String>) -> Self {
        Self {
            gamestate: gamestate.into(),
            meta: None,
        }
    }

    /// Attach the `meta` member's text.
    pub fn with_meta(mut self, meta: impl Into<String>) -> Self {
        self.meta = Some(meta.into());
        self
    }

    /// Parse every member independently. Members share nothing: an error in
    /// one names that member and aborts the container, but parsing itself
    /// never reads across member boundaries.
    pub fn parse(&self) -> Result<ParsedSave, MemberError> {
        let gamestate = parser::parse(&self.gamestate).map_err(|source| MemberError {
            member: GAMESTATE_MEMBER,
            source,
        })?;
        let meta = match &self.meta {
            None => None,
            Some(text) => Some(parser::parse(text).map_err(|source| MemberError {
                member: META_MEMBER,
                source,
            })?),
        };
        Ok(ParsedSave { gamestate, meta })
    }
}

/// A fully parsed save container: one value tree per member.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedSave {
    /// Parsed `gamestate` tree — the extraction engine's input.
    pub gamestate: Value,
    /// Parsed `meta` tree, when present.
    pub meta: Option<Value>,
}

/// A parse failure attributed to a specific container member.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("in save member `{member}`: {source}")]
pub struct MemberError {
    /// Which member failed to parse.
    pub member: &'static str,
    /// The underlying lex or parse failure.
    #[source]
    pub source: SaveError,
}
