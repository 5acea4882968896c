//! Line parser for N-Quad statements.
//!
//! Accepts `<iri>`, `_:blank` and literal terms (`"text"`, `"text"@en`, `"5"^^<xs:int>`), an
//! optional graph label, and a terminating `.`. Bare words (`alice`, `name`) are accepted as
//! identifiers so hand-written data like `alice name "Alice" .` loads too. A `#` after the
//! terminator starts a comment.

use crate::NQuad;
use crate::error::ParseError;

/// Turns one trimmed, non-empty input line into a triple. Must be stateless and deterministic.
pub trait LineParser: Send + Sync {
    fn parse(&self, line: &str) -> Result<NQuad, ParseError>;
}

/// Default [`LineParser`].
#[derive(Clone, Copy, Debug, Default)]
pub struct RdfParser;

impl LineParser for RdfParser {
    fn parse(&self, line: &str) -> Result<NQuad, ParseError> {
        parse_nquad(line)
    }
}

#[derive(Debug)]
enum Term {
    Iri(String),
    Blank(String),
    Word(String),
    Literal {
        value: String,
        lang: Option<String>,
        datatype: Option<String>,
    },
}

impl Term {
    fn kind(&self) -> &'static str {
        match self {
            Term::Iri(_) => "IRI",
            Term::Blank(_) => "blank node",
            Term::Word(_) => "word",
            Term::Literal { .. } => "literal",
        }
    }

    /// Identifier form of a non-literal term.
    fn into_id(self) -> Option<String> {
        match self {
            Term::Iri(s) | Term::Blank(s) | Term::Word(s) => Some(s),
            Term::Literal { .. } => None,
        }
    }
}

struct Lexer<'a> {
    line: &'a str,
    pos: usize,
}

impl<'a> Lexer<'a> {
    fn new(line: &'a str) -> Self {
        Self { line, pos: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.line[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn peek_second(&self) -> Option<char> {
        self.rest().chars().nth(1)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
    }

    fn err(&self, reason: impl Into<String>) -> ParseError {
        ParseError::new(self.line, self.pos + 1, reason)
    }

    /// A `.` standing on its own (followed by whitespace, a comment or the end of the line).
    fn at_terminator(&self) -> bool {
        self.peek() == Some('.')
            && self
                .peek_second()
                .is_none_or(|c| c.is_whitespace() || c == '#')
    }

    fn take_while<F: Fn(char) -> bool>(&mut self, keep: F) -> &'a str {
        let start = self.pos;
        while self.peek().is_some_and(&keep) {
            self.bump();
        }
        &self.line[start..self.pos]
    }

    fn iri(&mut self) -> Result<String, ParseError> {
        self.bump(); // '<'
        let body = self.take_while(|c| c != '>' && !c.is_whitespace());
        match self.bump() {
            Some('>') if body.is_empty() => Err(self.err("empty IRI")),
            Some('>') => Ok(body.to_string()),
            _ => Err(self.err("unterminated IRI")),
        }
    }

    fn blank(&mut self) -> Result<String, ParseError> {
        self.bump(); // '_'
        self.bump(); // ':'
        let name = self.take_while(|c| !c.is_whitespace());
        if name.is_empty() {
            return Err(self.err("empty blank node label"));
        }
        Ok(format!("_:{name}"))
    }

    fn word(&mut self) -> String {
        self.take_while(|c| !c.is_whitespace()).to_string()
    }

    fn hex_escape(&mut self, digits: usize) -> Result<char, ParseError> {
        let start = self.pos;
        for _ in 0..digits {
            match self.bump() {
                Some(c) if c.is_ascii_hexdigit() => {}
                _ => return Err(self.err("bad unicode escape")),
            }
        }
        u32::from_str_radix(&self.line[start..self.pos], 16)
            .ok()
            .and_then(char::from_u32)
            .ok_or_else(|| self.err("bad unicode escape"))
    }

    fn literal(&mut self) -> Result<Term, ParseError> {
        self.bump(); // '"'
        let mut value = String::new();
        loop {
            match self.bump() {
                None => return Err(self.err("unterminated literal")),
                Some('"') => break,
                Some('\\') => {
                    let c = match self.bump() {
                        Some('t') => '\t',
                        Some('n') => '\n',
                        Some('r') => '\r',
                        Some('b') => '\u{8}',
                        Some('f') => '\u{c}',
                        Some('"') => '"',
                        Some('\'') => '\'',
                        Some('\\') => '\\',
                        Some('u') => self.hex_escape(4)?,
                        Some('U') => self.hex_escape(8)?,
                        _ => return Err(self.err("bad escape in literal")),
                    };
                    value.push(c);
                }
                Some(c) => value.push(c),
            }
        }

        let mut lang = None;
        let mut datatype = None;
        if self.peek() == Some('@') {
            self.bump();
            let tag = self.take_while(|c| c.is_ascii_alphanumeric() || c == '-');
            if tag.is_empty() {
                return Err(self.err("empty language tag"));
            }
            lang = Some(tag.to_string());
        } else if self.rest().starts_with("^^") {
            self.bump();
            self.bump();
            if self.peek() != Some('<') {
                return Err(self.err("datatype must be an IRI"));
            }
            datatype = Some(self.iri()?);
        }
        Ok(Term::Literal {
            value,
            lang,
            datatype,
        })
    }

    /// Next term, or None once the terminating `.` has been consumed.
    fn next_term(&mut self) -> Result<Option<Term>, ParseError> {
        self.skip_ws();
        let term = match self.peek() {
            None => return Err(self.err("missing '.' at end of statement")),
            Some('#') => return Err(self.err("comment before end of statement")),
            Some('.') if self.at_terminator() => {
                self.bump();
                self.skip_ws();
                if !self.rest().is_empty() && !self.rest().starts_with('#') {
                    return Err(self.err("unexpected text after '.'"));
                }
                return Ok(None);
            }
            Some('<') => Term::Iri(self.iri()?),
            Some('"') => self.literal()?,
            Some('_') if self.peek_second() == Some(':') => Term::Blank(self.blank()?),
            Some(_) => Term::Word(self.word()),
        };
        Ok(Some(term))
    }
}

/// Parse one statement: `subject predicate object [label] .`
pub fn parse_nquad(line: &str) -> Result<NQuad, ParseError> {
    let mut lexer = Lexer::new(line);
    let mut terms = Vec::with_capacity(4);
    while let Some(term) = lexer.next_term()? {
        if terms.len() == 4 {
            return Err(lexer.err("too many terms in statement"));
        }
        terms.push(term);
    }
    if terms.len() < 3 {
        return Err(ParseError::new(
            line,
            1,
            format!("expected subject, predicate and object, found {} terms", terms.len()),
        ));
    }

    let mut terms = terms.into_iter();
    let (Some(subject), Some(predicate), Some(object)) = (terms.next(), terms.next(), terms.next())
    else {
        return Err(ParseError::new(line, 1, "incomplete statement"));
    };
    let label = terms.next();

    let subject = match subject {
        Term::Literal { .. } => return Err(ParseError::new(line, 1, "subject cannot be a literal")),
        t => t.into_id().unwrap_or_default(),
    };
    let predicate = match predicate {
        Term::Iri(p) | Term::Word(p) => p,
        other => {
            return Err(ParseError::new(
                line,
                1,
                format!("predicate cannot be a {}", other.kind()),
            ));
        }
    };

    let mut nq = NQuad {
        subject,
        predicate,
        ..NQuad::default()
    };
    match object {
        Term::Literal {
            value,
            lang,
            datatype,
        } => {
            nq.object_value = Some(value);
            nq.lang = lang;
            nq.datatype = datatype;
        }
        t => nq.object_id = t.into_id(),
    }
    nq.label = match label {
        None => None,
        Some(Term::Literal { .. }) => {
            return Err(ParseError::new(line, 1, "graph label cannot be a literal"));
        }
        Some(t) => t.into_id(),
    };
    Ok(nq)
}
