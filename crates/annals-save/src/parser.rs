use std::collections::{HashMap, HashSet};

use crate::error::{SaveError, SaveResult};
use crate::lexer::{Lexer, Span, Token};
use crate::value::Value;

/// A fatal grammar violation in a save member.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// A block opened with `{` was never closed before the member ended.
    #[error("unclosed block opened at line {}", .open_span.line)]
    UnclosedBlock {
        /// Location of the `{` that never found its `}`.
        open_span: Span,
    },

    /// An `=` had no value after it.
    #[error("`=` with no following value at line {}", .span.line)]
    DanglingEq {
        /// Location of the dangling `=`.
        span: Span,
    },

    /// An `=` appeared with no key before it.
    #[error("`=` with no preceding key at line {}", .span.line)]
    MissingKey {
        /// Location of the keyless `=`.
        span: Span,
    },

    /// A `}` appeared with no block open.
    #[error("unmatched `}}` at line {}", .span.line)]
    UnmatchedClose {
        /// Location of the stray `}`.
        span: Span,
    },

    /// A token appeared where the grammar cannot accept it.
    #[error("unexpected {found} at line {} (expected {expected})", .span.line)]
    UnexpectedToken {
        /// Display form of the offending token.
        found: String,
        /// What the grammar wanted at this position.
        expected: &'static str,
        /// Location of the offending token.
        span: Span,
    },

    /// The member ended in the middle of a top-level pair.
    #[error("unexpected end of input after line {} (expected {expected})", .span.line)]
    UnexpectedEnd {
        /// What the grammar wanted when input ran out.
        expected: &'static str,
        /// Location of the last token consumed.
        span: Span,
    },
}

impl ParseError {
    /// The source span the failure points at.
    pub fn span(&self) -> &Span {
        match self {
            ParseError::UnclosedBlock { open_span } => open_span,
            ParseError::DanglingEq { span }
            | ParseError::MissingKey { span }
            | ParseError::UnmatchedClose { span }
            | ParseError::UnexpectedToken { span, .. }
            | ParseError::UnexpectedEnd { span, .. } => span,
        }
    }
}

/// Parse one save member into a value tree.
///
/// A member is an implicit brace-less map: a sequence of `key = value` pairs
/// running to end of input.
pub fn parse(source: &str) -> SaveResult<Value> {
    Parser::new(source).parse_member()
}

/// Recursive-descent parser over the token stream, with one token of
/// lookahead.
///
/// Shape detection is per block: the first item decides whether a block is a
/// map (`key = value` pairs) or a list (bare values), and the rest of the
/// block must follow suit. While a map is being built, a repeated key
/// coalesces its values into a list in encounter order — the second
/// occurrence wraps `[existing, new]`, later occurrences append. Keys the
/// grammar has never seen pass through untouched; there is no whitelist.
#[derive(Debug)]
pub struct Parser<'src> {
    tokens: Lexer<'src>,
}

impl<'src> Parser<'src> {
    /// Create a parser over the full text of a save member.
    pub fn new(source: &'src str) -> Self {
        Self {
            tokens: Lexer::new(source),
        }
    }

    /// Parse the member as an implicit top-level map.
    pub fn parse_member(mut self) -> SaveResult<Value> {
        let mut entries = HashMap::new();
        let mut coalesced = HashSet::new();
        while let Some((token, span)) = self.next_token()? {
            let key = match token {
                Token::Close => return Err(ParseError::UnmatchedClose { span }.into()),
                Token::Eq => return Err(ParseError::MissingKey { span }.into()),
                Token::Open => {
                    return Err(ParseError::UnexpectedToken {
                        found: "{".to_string(),
                        expected: "a key",
                        span,
                    }
                    .into());
                }
                scalar => key_text(scalar),
            };
            let eq_span = match self.next_token()? {
                Some((Token::Eq, eq_span)) => eq_span,
                Some((other, other_span)) => {
                    return Err(ParseError::UnexpectedToken {
                        found: other.to_string(),
                        expected: "`=`",
                        span: other_span,
                    }
                    .into());
                }
                None => {
                    return Err(ParseError::UnexpectedEnd {
                        expected: "`=`",
                        span,
                    }
                    .into());
                }
            };
            let value = self.parse_value(&eq_span)?;
            insert_pair(&mut entries, &mut coalesced, key, value);
        }
        Ok(Value::Map(entries))
    }

    /// Parse the value after an `=`.
    fn parse_value(&mut self, eq_span: &Span) -> SaveResult<Value> {
        match self.next_token()? {
            None => Err(ParseError::DanglingEq {
                span: eq_span.clone(),
            }
            .into()),
            Some((Token::Open, open_span)) => self.parse_block(open_span),
            Some((Token::Quoted(s), _)) => Ok(Value::Str(s)),
            Some((Token::Ident(s), _)) => Ok(Value::Str(s)),
            Some((Token::Int(n), _)) => Ok(Value::Int(n)),
            Some((Token::Float(n), _)) => Ok(Value::Float(n)),
            Some((other, span)) => Err(ParseError::UnexpectedToken {
                found: other.to_string(),
                expected: "a value",
                span,
            }
            .into()),
        }
    }

    /// Parse a braced block whose `{` has already been consumed. The first
    /// item decides list-versus-map.
    fn parse_block(&mut self, open_span: Span) -> SaveResult<Value> {
        let Some((first, first_span)) = self.next_token()? else {
            return Err(ParseError::UnclosedBlock { open_span }.into());
        };
        match first {
            // An empty block carries no shape of its own; the accessor layer
            // treats an empty list as "no data" either way.
            Token::Close => Ok(Value::List(Vec::new())),
            Token::Eq => Err(ParseError::MissingKey { span: first_span }.into()),
            Token::Open => {
                let first_value = self.parse_block(first_span)?;
                self.finish_list(open_span, vec![first_value])
            }
            scalar => {
                // One token of lookahead: `=` after the first scalar means a
                // map; anything else means the scalar was a list element and
                // the token we just read belongs to the list too.
                match self.next_token()? {
                    None => Err(ParseError::UnclosedBlock { open_span }.into()),
                    Some((Token::Eq, eq_span)) => {
                        let key = key_text(scalar);
                        let first_value = self.parse_value(&eq_span)?;
                        self.finish_map(open_span, key, first_value)
                    }
                    Some((Token::Close, _)) => Ok(Value::List(vec![scalar_value(scalar)])),
                    Some((Token::Open, inner_span)) => {
                        let second = self.parse_block(inner_span)?;
                        self.finish_list(open_span, vec![scalar_value(scalar), second])
                    }
                    Some((second, _)) => {
                        let items = vec![scalar_value(scalar), scalar_value(second)];
                        self.finish_list(open_span, items)
                    }
                }
            }
        }
    }

    /// Consume the rest of a list block after its first element.
    fn finish_list(&mut self, open_span: Span, mut items: Vec<Value>) -> SaveResult<Value> {
        loop {
            let Some((token, span)) = self.next_token()? else {
                return Err(ParseError::UnclosedBlock { open_span }.into());
            };
            match token {
                Token::Close => return Ok(Value::List(items)),
                Token::Open => items.push(self.parse_block(span)?),
                Token::Eq => {
                    return Err(ParseError::UnexpectedToken {
                        found: "=".to_string(),
                        expected: "a list element or `}`",
                        span,
                    }
                    .into());
                }
                scalar => items.push(scalar_value(scalar)),
            }
        }
    }

    /// Consume the rest of a map block after its first pair.
    fn finish_map(
        &mut self,
        open_span: Span,
        first_key: String,
        first_value: Value,
    ) -> SaveResult<Value> {
        let mut entries = HashMap::new();
        let mut coalesced = HashSet::new();
        insert_pair(&mut entries, &mut coalesced, first_key, first_value);
        loop {
            let Some((token, span)) = self.next_token()? else {
                return Err(ParseError::UnclosedBlock { open_span }.into());
            };
            let key = match token {
                Token::Close => return Ok(Value::Map(entries)),
                Token::Eq => return Err(ParseError::MissingKey { span }.into()),
                Token::Open => {
                    return Err(ParseError::UnexpectedToken {
                        found: "{".to_string(),
                        expected: "a key or `}`",
                        span,
                    }
                    .into());
                }
                scalar => key_text(scalar),
            };
            let eq_span = match self.next_token()? {
                Some((Token::Eq, eq_span)) => eq_span,
                Some((other, other_span)) => {
                    return Err(ParseError::UnexpectedToken {
                        found: other.to_string(),
                        expected: "`=`",
                        span: other_span,
                    }
                    .into());
                }
                None => return Err(ParseError::UnclosedBlock { open_span }.into()),
            };
            let value = self.parse_value(&eq_span)?;
            insert_pair(&mut entries, &mut coalesced, key, value);
        }
    }

    fn next_token(&mut self) -> SaveResult<Option<(Token, Span)>> {
        match self.tokens.next() {
            None => Ok(None),
            Some(Ok(pair)) => Ok(Some(pair)),
            Some(Err(e)) => Err(e.into()),
        }
    }
}

/// The map-key text of a scalar token. Integer and float keys render in
/// their canonical form; anything the game invents later stays a plain
/// string key.
fn key_text(token: Token) -> String {
    match token {
        Token::Ident(s) | Token::Quoted(s) => s,
        Token::Int(n) => n.to_string(),
        Token::Float(n) => format!("{n}"),
        Token::Open | Token::Close | Token::Eq => unreachable!("callers filter punctuation"),
    }
}

/// The value a scalar token denotes. `yes`/`no` stay strings here.
fn scalar_value(token: Token) -> Value {
    match token {
        Token::Quoted(s) | Token::Ident(s) => Value::Str(s),
        Token::Int(n) => Value::Int(n),
        Token::Float(n) => Value::Float(n),
        Token::Open | Token::Close | Token::Eq => unreachable!("callers filter punctuation"),
    }
}

/// Insert a pair into a map under the repeated-key rule: second occurrence
/// wraps `[existing, new]`, later occurrences append. `coalesced` remembers
/// which keys hold parser-made lists, so a key whose first value was a
/// genuine list still nests rather than splices.
fn insert_pair(
    entries: &mut HashMap<String, Value>,
    coalesced: &mut HashSet<String>,
    key: String,
    value: Value,
) {
    use std::collections::hash_map::Entry;
    match entries.entry(key) {
        Entry::Vacant(slot) => {
            slot.insert(value);
        }
        Entry::Occupied(mut slot) => {
            if coalesced.contains(slot.key()) {
                if let Value::List(items) = slot.get_mut() {
                    items.push(value);
                }
            } else {
                coalesced.insert(slot.key().clone());
                let previous = slot.insert(Value::List(Vec::new()));
                if let Value::List(items) = slot.get_mut() {
                    items.push(previous);
                    items.push(value);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parsed(source: &str) -> Value {
        parse(source).expect("parse error")
    }

    #[test]
    fn single_key_stays_scalar() {
        let tree = parsed("block={ a=1 }");
        let a = tree.get_path(&["block", "a"]).unwrap();
        assert_eq!(a, &Value::Int(1));
    }

    #[test]
    fn repeated_key_becomes_list() {
        let tree = parsed("block={ a=1 a=2 }");
        let a = tree.get_path(&["block", "a"]).unwrap();
        assert_eq!(a, &Value::list([1i64, 2]));
    }

    #[test]
    fn third_occurrence_appends() {
        let tree = parsed("block={ a=1 a=2 a=3 }");
        let a = tree.get_path(&["block", "a"]).unwrap();
        assert_eq!(a, &Value::list([1i64, 2, 3]));
    }

    #[test]
    fn repeated_list_valued_key_nests() {
        let tree = parsed("block={ a={ 1 2 } a={ 3 } }");
        let a = tree.get_path(&["block", "a"]).unwrap();
        assert_eq!(
            a,
            &Value::List(vec![Value::list([1i64, 2]), Value::list([3i64])])
        );
    }

    #[test]
    fn bare_values_make_a_list() {
        let tree = parsed("hyperlane_systems={ 5 12 19 }");
        let lanes = tree.get("hyperlane_systems").unwrap();
        assert_eq!(lanes, &Value::list([5i64, 12, 19]));
    }

    #[test]
    fn nested_blocks_in_lists() {
        let tree = parsed("sections={ { slot=1 } { slot=2 } }");
        let sections = tree.get("sections").unwrap().as_list().unwrap();
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[1].get("slot"), Some(&Value::Int(2)));
    }

    #[test]
    fn empty_block_is_an_empty_list() {
        let tree = parsed("modifiers={}");
        assert_eq!(tree.get("modifiers"), Some(&Value::List(Vec::new())));
    }

    #[test]
    fn member_is_an_implicit_map() {
        let tree = parsed("version=\"Cepheus v3.4.2\"\ndate=\"2214.10.01\"");
        assert_eq!(
            tree.get("date").and_then(Value::as_str),
            Some("2214.10.01")
        );
        assert_eq!(tree.entries_by_id().count(), 0);
    }

    #[test]
    fn numeric_keys_index_tables() {
        let tree = parsed("country={ 0={ name=\"Blorg\" } 1=none 7={ name=\"Xani\" } }");
        let countries = tree.get("country").unwrap();
        let mut ids: Vec<i64> = countries.entries_by_id().map(|(id, _)| id).collect();
        ids.sort_unstable();
        assert_eq!(ids, vec![0, 1, 7]);
        assert_eq!(
            countries.get("1").and_then(Value::as_str),
            Some("none"),
            "dead-country placeholders stay scalar"
        );
    }

    #[test]
    fn yes_no_stay_strings() {
        let tree = parsed("flags={ hostile=yes open=no }");
        let hostile = tree.get_path(&["flags", "hostile"]).unwrap();
        assert_eq!(hostile, &Value::Str("yes".into()));
        assert_eq!(hostile.as_yes_no(), Some(true));
    }

    #[test]
    fn unclosed_block_reports_opening_line() {
        let err = parse("a={\nb={ c=1 }\n").unwrap_err();
        match err {
            SaveError::Parse(ParseError::UnclosedBlock { open_span }) => {
                assert_eq!(open_span.line, 1);
            }
            other => panic!("expected UnclosedBlock, got {other:?}"),
        }
    }

    #[test]
    fn dangling_eq_is_fatal() {
        let err = parse("a=").unwrap_err();
        match err {
            SaveError::Parse(ParseError::DanglingEq { span }) => assert_eq!(span.line, 1),
            other => panic!("expected DanglingEq, got {other:?}"),
        }
    }

    #[test]
    fn stray_close_is_fatal() {
        let err = parse("}").unwrap_err();
        assert!(matches!(
            err,
            SaveError::Parse(ParseError::UnmatchedClose { .. })
        ));
    }

    #[test]
    fn keyless_eq_is_fatal() {
        let err = parse("a={ =1 }").unwrap_err();
        assert!(matches!(err, SaveError::Parse(ParseError::MissingKey { .. })));
    }

    #[test]
    fn lex_failure_surfaces_through_parse() {
        let err = parse("a=@").unwrap_err();
        assert!(matches!(err, SaveError::Lex(_)), "got {err:?}");
    }

    #[test]
    fn quoted_keys_are_allowed() {
        let tree = parsed("flags={ \"2.8.1\"=yes }");
        assert_eq!(
            tree.get_path(&["flags", "2.8.1"]).and_then(Value::as_yes_no),
            Some(true)
        );
    }

    #[test]
    fn realistic_fragment() {
        let source = r#"
date="2251.04.12"
player={
	{
		name="Designated"
		country=0
	}
}
country={
	0={
		name="United Nations of Earth"
		type=default
		military_power=1918.
		fleet_size=14
	}
}
"#;
        let tree = parsed(source);
        assert_eq!(tree.get("date").and_then(Value::as_str), Some("2251.04.12"));
        let player = tree.get("player").unwrap().as_list().unwrap();
        assert_eq!(player[0].get("country").and_then(Value::as_int), Some(0));
        let c0 = tree.get_path(&["country", "0"]).unwrap();
        assert_eq!(c0.get("military_power").and_then(Value::as_f64), Some(1918.0));
    }
}
