//! SQL literal, identifier and fragment handling
//!
//! Every value that reaches a statement from outside the caller's own
//! expression fragments passes through [`SqlLiteral`]. A literal is escaped
//! on its own and only then placed next to other syntax.
//!
//! Caller fragments (predicate, having, projection and group-by entries) are
//! embedded as written, so [`check_fragment`] refuses any fragment that could
//! end its enclosing clause: statement separators, comments, unbalanced
//! parentheses, unterminated quotes, and keywords that open another query.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;
use thiserror::Error;

static IDENTIFIER: OnceLock<Regex> = OnceLock::new();
static AGGREGATE: OnceLock<Regex> = OnceLock::new();

/// Keywords that start or splice in another query
const QUERY_KEYWORDS: &[&str] = &["SELECT", "FROM", "UNION", "INTERSECT", "EXCEPT", "INTO"];

fn identifier_pattern() -> &'static Regex {
    IDENTIFIER.get_or_init(|| {
        Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z_][A-Za-z0-9_]*)?$")
            .expect("identifier pattern is a valid regex")
    })
}

/// Returns true for a plain (`amount`) or dotted (`budgets.amount`) identifier
pub fn is_identifier(name: &str) -> bool {
    identifier_pattern().is_match(name)
}

fn aggregate_pattern() -> &'static Regex {
    AGGREGATE.get_or_init(|| {
        Regex::new(
            r"(?i)\b(count|sum|avg|min|max|median|any_value|array_agg|string_agg|list|group_concat|bool_and|bool_or|stddev|stddev_pop|stddev_samp|variance|var_pop|var_samp)\s*\(",
        )
        .expect("aggregate pattern is a valid regex")
    })
}

/// Returns true when a projected field calls an aggregate function
pub fn is_aggregate(field: &str) -> bool {
    aggregate_pattern().is_match(field)
}

/// Why a caller fragment cannot be embedded in a statement
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FragmentError {
    #[error("statement separator ';'")]
    Separator,
    #[error("comment marker '{0}'")]
    Comment(&'static str),
    #[error("escape character '{0}'")]
    Escape(char),
    #[error("unbalanced parentheses")]
    Unbalanced,
    #[error("unterminated quoted text")]
    Unterminated,
    #[error("keyword '{0}'")]
    Keyword(String),
}

fn check_word(word: &mut String) -> Result<(), FragmentError> {
    let upper = word.to_ascii_uppercase();
    word.clear();
    if QUERY_KEYWORDS.contains(&upper.as_str()) {
        return Err(FragmentError::Keyword(upper));
    }
    Ok(())
}

/// Checks that a caller fragment stays inside the clause it is placed in.
///
/// Quoted text (single or double quotes, doubled to escape) is skipped.
/// Backslashes are refused everywhere since some engines treat them as
/// escapes inside quotes.
pub fn check_fragment(fragment: &str) -> Result<(), FragmentError> {
    let mut depth: usize = 0;
    let mut quote: Option<char> = None;
    let mut word = String::new();
    let mut chars = fragment.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '\\' {
            return Err(FragmentError::Escape(c));
        }
        if let Some(q) = quote {
            // A doubled quote closes and immediately reopens
            if c == q {
                quote = None;
            }
            continue;
        }
        if c.is_ascii_alphanumeric() || c == '_' {
            word.push(c);
            continue;
        }
        check_word(&mut word)?;

        match (c, chars.peek().copied()) {
            ('\'', _) | ('"', _) => quote = Some(c),
            (';', _) => return Err(FragmentError::Separator),
            ('-', Some('-')) => return Err(FragmentError::Comment("--")),
            ('/', Some('*')) => return Err(FragmentError::Comment("/*")),
            ('*', Some('/')) => return Err(FragmentError::Comment("*/")),
            ('$', _) => return Err(FragmentError::Escape(c)),
            ('(', _) => depth += 1,
            (')', _) => depth = depth.checked_sub(1).ok_or(FragmentError::Unbalanced)?,
            _ => {}
        }
    }
    check_word(&mut word)?;

    if quote.is_some() {
        return Err(FragmentError::Unterminated);
    }
    if depth != 0 {
        return Err(FragmentError::Unbalanced);
    }
    Ok(())
}

/// Prefixes `field` with `qualifier` unless it is already qualified
pub fn qualify(field: &str, qualifier: Option<&str>) -> String {
    match qualifier {
        Some(q) if !field.contains('.') => format!("{}.{}", q, field),
        _ => field.to_string(),
    }
}

/// Literal values the statement grammar cannot carry
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LiteralError {
    #[error("null literal cannot be compared")]
    Null,
    #[error("{0} literal is not a scalar")]
    NotScalar(&'static str),
    #[error("string literal contains a NUL byte")]
    NulByte,
}

/// An escaped, ready-to-render literal token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlLiteral(String);

impl SqlLiteral {
    /// Quotes a string literal, doubling embedded single quotes
    pub fn string(value: &str) -> Result<Self, LiteralError> {
        if value.contains('\0') {
            return Err(LiteralError::NulByte);
        }
        let mut out = String::with_capacity(value.len() + 2);
        out.push('\'');
        for c in value.chars() {
            if c == '\'' {
                out.push('\'');
            }
            out.push(c);
        }
        out.push('\'');
        Ok(Self(out))
    }

    /// Converts a JSON scalar into a literal token
    pub fn from_json(value: &Value) -> Result<Self, LiteralError> {
        match value {
            Value::String(s) => Self::string(s),
            // serde_json renders numbers as plain digits, sign, '.', 'e'
            Value::Number(n) => Ok(Self(n.to_string())),
            Value::Bool(true) => Ok(Self("TRUE".to_string())),
            Value::Bool(false) => Ok(Self("FALSE".to_string())),
            Value::Null => Err(LiteralError::Null),
            Value::Array(_) => Err(LiteralError::NotScalar("array")),
            Value::Object(_) => Err(LiteralError::NotScalar("object")),
        }
    }

    pub fn as_sql(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SqlLiteral {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
