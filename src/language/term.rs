//! Term trees and a reader for the textual ATerm notation.
//!
//! Supported syntax: constructor applications `Cons(a, b)`, bare constructors
//! `Cons`, tuples `(a, b)`, lists `[a, b]`, string literals with `\" \\ \n \t`
//! escapes, signed integers and `//` line comments.
//!
//! Nesting is limited to [`MAX_DEPTH`] levels; deeper input is a syntax error.

use crate::message::SourceRegion;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, Serialize)]
pub struct Term {
    #[serde(flatten)]
    pub kind: TermKind,
    #[serde(skip)]
    pub region: SourceRegion,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum TermKind {
    /// Constructor application. Tuples have an empty constructor name.
    Appl { constructor: String, args: Vec<Term> },
    List { elements: Vec<Term> },
    Str { value: String },
    Int { value: i64 },
}

// Regions are positional metadata and do not take part in equality.
impl PartialEq for Term {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
    }
}

impl Term {
    pub fn new(kind: TermKind, region: SourceRegion) -> Self {
        Self { kind, region }
    }

    pub fn appl(constructor: impl Into<String>, args: Vec<Term>) -> Self {
        Self::new(
            TermKind::Appl {
                constructor: constructor.into(),
                args,
            },
            SourceRegion::default(),
        )
    }

    pub fn list(elements: Vec<Term>) -> Self {
        Self::new(TermKind::List { elements }, SourceRegion::default())
    }

    pub fn string(value: impl Into<String>) -> Self {
        Self::new(
            TermKind::Str {
                value: value.into(),
            },
            SourceRegion::default(),
        )
    }

    pub fn int(value: i64) -> Self {
        Self::new(TermKind::Int { value }, SourceRegion::default())
    }

    pub fn constructor(&self) -> Option<&str> {
        match &self.kind {
            TermKind::Appl { constructor, .. } => Some(constructor),
            _ => None,
        }
    }

    pub fn children(&self) -> &[Term] {
        match &self.kind {
            TermKind::Appl { args, .. } => args,
            TermKind::List { elements } => elements,
            _ => &[],
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match &self.kind {
            TermKind::Str { value } => Some(value),
            _ => None,
        }
    }

    /// First direct string child, the conventional name slot of a node.
    pub fn first_string(&self) -> Option<&str> {
        self.children().iter().find_map(Term::as_str)
    }

    /// Pre-order traversal.
    pub fn walk<'a>(&'a self, visit: &mut dyn FnMut(&'a Term)) {
        visit(self);
        for child in self.children() {
            child.walk(visit);
        }
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            TermKind::Appl { constructor, args } => {
                write!(f, "{}(", constructor)?;
                write_separated(f, args)?;
                write!(f, ")")
            }
            TermKind::List { elements } => {
                write!(f, "[")?;
                write_separated(f, elements)?;
                write!(f, "]")
            }
            TermKind::Str { value } => {
                write!(f, "\"")?;
                for c in value.chars() {
                    match c {
                        '"' => write!(f, "\\\"")?,
                        '\\' => write!(f, "\\\\")?,
                        '\n' => write!(f, "\\n")?,
                        '\t' => write!(f, "\\t")?,
                        c => write!(f, "{}", c)?,
                    }
                }
                write!(f, "\"")
            }
            TermKind::Int { value } => write!(f, "{}", value),
        }
    }
}

fn write_separated(f: &mut fmt::Formatter<'_>, terms: &[Term]) -> fmt::Result {
    for (i, term) in terms.iter().enumerate() {
        if i > 0 {
            write!(f, ",")?;
        }
        write!(f, "{}", term)?;
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} at {region}")]
pub struct TermSyntaxError {
    pub message: String,
    pub region: SourceRegion,
}

/// Deepest nesting of lists, tuples and applications the reader accepts.
pub const MAX_DEPTH: usize = 256;

pub fn parse_aterm(text: &str) -> Result<Term, TermSyntaxError> {
    let mut reader = Reader::new(text);
    let term = reader.term()?;
    reader.skip_trivia();
    if let Some(c) = reader.peek() {
        return Err(reader.error(format!("unexpected trailing input '{}'", c)));
    }
    Ok(term)
}

struct Reader {
    chars: Vec<char>,
    pos: usize,
    row: usize,
    column: usize,
    depth: usize,
}

impl Reader {
    fn new(text: &str) -> Self {
        Self {
            chars: text.chars().collect(),
            pos: 0,
            row: 0,
            column: 0,
            depth: 0,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_second(&self) -> Option<char> {
        self.chars.get(self.pos + 1).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        if c == '\n' {
            self.row += 1;
            self.column = 0;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn error(&self, message: impl Into<String>) -> TermSyntaxError {
        TermSyntaxError {
            message: message.into(),
            region: SourceRegion::point(self.row, self.column),
        }
    }

    fn skip_trivia(&mut self) {
        loop {
            match self.peek() {
                Some(c) if c.is_whitespace() => {
                    self.bump();
                }
                Some('/') if self.peek_second() == Some('/') => {
                    while let Some(c) = self.bump() {
                        if c == '\n' {
                            break;
                        }
                    }
                }
                _ => return,
            }
        }
    }

    fn term(&mut self) -> Result<Term, TermSyntaxError> {
        self.skip_trivia();
        if self.depth == MAX_DEPTH {
            return Err(self.error(format!("terms nested deeper than {} levels", MAX_DEPTH)));
        }
        self.depth += 1;
        let term = self.term_at_depth();
        self.depth -= 1;
        term
    }

    fn term_at_depth(&mut self) -> Result<Term, TermSyntaxError> {
        let (start_row, start_column) = (self.row, self.column);

        let kind = match self.peek() {
            Some('"') => TermKind::Str {
                value: self.string()?,
            },
            Some('[') => {
                self.bump();
                TermKind::List {
                    elements: self.sequence(']')?,
                }
            }
            Some('(') => {
                self.bump();
                TermKind::Appl {
                    constructor: String::new(),
                    args: self.sequence(')')?,
                }
            }
            Some(c) if c == '-' || c.is_ascii_digit() => TermKind::Int {
                value: self.int()?,
            },
            Some(c) if c.is_alphabetic() || c == '_' => {
                let constructor = self.identifier();
                let args = if self.peek() == Some('(') {
                    self.bump();
                    self.sequence(')')?
                } else {
                    Vec::new()
                };
                TermKind::Appl { constructor, args }
            }
            Some(c) => return Err(self.error(format!("unexpected character '{}'", c))),
            None => return Err(self.error("unexpected end of input")),
        };

        Ok(Term::new(
            kind,
            SourceRegion::new(start_row, start_column, self.row, self.column),
        ))
    }

    /// Comma separated terms up to `close`; the opening bracket is consumed.
    fn sequence(&mut self, close: char) -> Result<Vec<Term>, TermSyntaxError> {
        let mut terms = Vec::new();
        self.skip_trivia();
        if self.peek() == Some(close) {
            self.bump();
            return Ok(terms);
        }

        loop {
            terms.push(self.term()?);
            self.skip_trivia();
            match self.peek() {
                Some(',') => {
                    self.bump();
                }
                Some(c) if c == close => {
                    self.bump();
                    return Ok(terms);
                }
                Some(c) => {
                    return Err(self.error(format!("expected ',' or '{}' but found '{}'", close, c)))
                }
                None => return Err(self.error(format!("expected '{}'", close))),
            }
        }
    }

    fn identifier(&mut self) -> String {
        let mut name = String::new();
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '_' || c == '-' || c == '\'' {
                name.push(c);
                self.bump();
            } else {
                break;
            }
        }
        name
    }

    fn int(&mut self) -> Result<i64, TermSyntaxError> {
        let start = self.error("");
        let mut digits = String::new();
        if self.peek() == Some('-') {
            digits.push('-');
            self.bump();
        }
        while let Some(c) = self.peek().filter(char::is_ascii_digit) {
            digits.push(c);
            self.bump();
        }
        digits.parse().map_err(|_| TermSyntaxError {
            message: format!("invalid integer '{}'", digits),
            region: start.region,
        })
    }

    fn string(&mut self) -> Result<String, TermSyntaxError> {
        self.bump();
        let mut value = String::new();
        loop {
            match self.bump() {
                Some('"') => return Ok(value),
                Some('\\') => match self.bump() {
                    Some('"') => value.push('"'),
                    Some('\\') => value.push('\\'),
                    Some('n') => value.push('\n'),
                    Some('t') => value.push('\t'),
                    Some(c) => return Err(self.error(format!("unknown escape '\\{}'", c))),
                    None => return Err(self.error("unterminated string")),
                },
                Some(c) => value.push(c),
                None => return Err(self.error("unterminated string")),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_application() {
        let term = parse_aterm(r#"Entity("Person", [Field("name", Type("String"))])"#).unwrap();
        assert_eq!(
            term,
            Term::appl(
                "Entity",
                vec![
                    Term::string("Person"),
                    Term::list(vec![Term::appl(
                        "Field",
                        vec![Term::string("name"), Term::appl("Type", vec![Term::string("String")])]
                    )])
                ]
            )
        );
    }

    #[test]
    fn test_parse_bare_constructor_tuple_and_int() {
        let term = parse_aterm("(Nil, -42, [])").unwrap();
        assert_eq!(
            term,
            Term::appl(
                "",
                vec![Term::appl("Nil", vec![]), Term::int(-42), Term::list(vec![])]
            )
        );
    }

    #[test]
    fn test_comments_and_whitespace_are_skipped() {
        let term = parse_aterm("// header\nModule(\n  \"m\" // name\n)\n").unwrap();
        assert_eq!(term, Term::appl("Module", vec![Term::string("m")]));
    }

    #[test]
    fn test_string_escapes() {
        let term = parse_aterm(r#""a\"b\\c\nd""#).unwrap();
        assert_eq!(term.as_str(), Some("a\"b\\c\nd"));
    }

    #[test]
    fn test_regions_are_zero_based() {
        let term = parse_aterm("Module(\n  Entity(\"A\"))").unwrap();
        let entity = &term.children()[0];
        assert_eq!(entity.region.start_row, 1);
        assert_eq!(entity.region.start_column, 2);
    }

    #[test]
    fn test_syntax_error_position() {
        let err = parse_aterm("Module(\n  Entity(\"A\" \"B\"))").unwrap_err();
        assert_eq!(err.region, SourceRegion::point(1, 13));
        assert!(err.message.contains("expected ','"));
    }

    #[test]
    fn test_unterminated_string_is_error() {
        assert!(parse_aterm("\"abc").is_err());
    }

    #[test]
    fn test_trailing_input_is_error() {
        let err = parse_aterm("A() B()").unwrap_err();
        assert_eq!(err.region, SourceRegion::point(0, 4));
    }

    #[test]
    fn test_empty_input_is_error() {
        let err = parse_aterm("   ").unwrap_err();
        assert_eq!(err.message, "unexpected end of input");
    }

    #[test]
    fn test_deep_nesting_is_syntax_error() {
        let err = parse_aterm(&"[".repeat(10_000)).unwrap_err();
        assert_eq!(err.region, SourceRegion::point(0, MAX_DEPTH));
        assert!(err.message.contains("nested deeper than 256"));

        let closed = "[".repeat(10_000) + &"]".repeat(10_000);
        assert!(parse_aterm(&closed).is_err());
    }

    #[test]
    fn test_nesting_up_to_limit_is_accepted() {
        let depth = MAX_DEPTH;
        let text = "[".repeat(depth) + &"]".repeat(depth);
        let term = parse_aterm(&text).unwrap();

        let mut nodes = 0;
        term.walk(&mut |_| nodes += 1);
        assert_eq!(nodes, depth);
        assert_eq!(term.to_string(), text);

        let deeper = "[".repeat(depth + 1) + &"]".repeat(depth + 1);
        assert!(parse_aterm(&deeper).is_err());
    }

    #[test]
    fn test_display_is_canonical_aterm() {
        let term = parse_aterm("Entity( \"a\\\"b\" , [ 1 , Nil ] )").unwrap();
        assert_eq!(term.to_string(), r#"Entity("a\"b",[1,Nil()])"#);
    }

    #[test]
    fn test_walk_visits_all_nodes_in_preorder() {
        let term = parse_aterm("A(B(C), D)").unwrap();
        let mut names = Vec::new();
        term.walk(&mut |t| names.extend(t.constructor().map(str::to_string)));
        assert_eq!(names, vec!["A", "B", "C", "D"]);
    }

    #[test]
    fn test_first_string() {
        let term = parse_aterm(r#"Type(1, "Int")"#).unwrap();
        assert_eq!(term.first_string(), Some("Int"));
        assert_eq!(Term::int(1).first_string(), None);
    }

    #[test]
    fn test_serializes_without_regions() {
        let term = parse_aterm(r#"Type("Int")"#).unwrap();
        let json = serde_json::to_value(&term).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "kind": "appl",
                "constructor": "Type",
                "args": [{ "kind": "str", "value": "Int" }]
            })
        );
    }
}
