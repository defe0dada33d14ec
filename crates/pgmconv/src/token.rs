//! Positioned token stream shared by the BIF readers.
//!
//! Tokens are separated by whitespace; the punctuation characters
//! `{ } ( ) [ ] | , ;` always form single-character tokens, so both
//! `discrete[2]` and `discrete [ 2 ]` tokenize the same way. Double-quoted
//! names lose their quotes. `//` starts a comment that runs to end of line.

use crate::error::{PgmError, Result};

const PUNCTUATION: &[char] = &['{', '}', '(', ')', '[', ']', '|', ',', ';'];

/// A token and the line it started on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub text: String,
    pub line: usize,
    /// Came from a quoted string; never a keyword or punctuation.
    pub quoted: bool,
}

impl Token {
    /// True for an unquoted token equal to `s`.
    pub fn is(&self, s: &str) -> bool {
        !self.quoted && self.text == s
    }
}

/// Token source with one-token lookahead.
#[derive(Debug, Clone)]
pub struct Tokens {
    tokens: Vec<Token>,
    pos: usize,
}

impl Tokens {
    /// Tokenize `src`.
    pub fn new(src: &str) -> Self {
        let mut tokens = Vec::new();
        let mut chars = src.chars().peekable();
        let mut line = 1;
        let mut current = String::new();
        let mut current_line = line;

        let flush = |current: &mut String, tokens: &mut Vec<Token>, line: usize| {
            if !current.is_empty() {
                tokens.push(Token {
                    text: std::mem::take(current),
                    line,
                    quoted: false,
                });
            }
        };

        while let Some(c) = chars.next() {
            match c {
                '\n' => {
                    flush(&mut current, &mut tokens, current_line);
                    line += 1;
                }
                c if c.is_whitespace() => flush(&mut current, &mut tokens, current_line),
                '/' if current.is_empty() && chars.peek() == Some(&'/') => {
                    for c in chars.by_ref() {
                        if c == '\n' {
                            line += 1;
                            break;
                        }
                    }
                }
                '"' => {
                    flush(&mut current, &mut tokens, current_line);
                    let start = line;
                    let mut text = String::new();
                    for c in chars.by_ref() {
                        match c {
                            '"' => break,
                            '\n' => {
                                line += 1;
                                text.push(c);
                            }
                            _ => text.push(c),
                        }
                    }
                    tokens.push(Token {
                        text,
                        line: start,
                        quoted: true,
                    });
                }
                c if PUNCTUATION.contains(&c) => {
                    flush(&mut current, &mut tokens, current_line);
                    tokens.push(Token {
                        text: c.to_string(),
                        line,
                        quoted: false,
                    });
                }
                c => {
                    if current.is_empty() {
                        current_line = line;
                    }
                    current.push(c);
                }
            }
        }
        flush(&mut current, &mut tokens, current_line);

        Self { tokens, pos: 0 }
    }

    /// Next token without consuming it.
    pub fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    /// True if the next token is the unquoted symbol `s`.
    pub fn peek_is(&self, s: &str) -> bool {
        self.peek().is_some_and(|t| t.is(s))
    }

    /// Line of the next token, or of the last one at end of stream.
    pub fn line(&self) -> usize {
        self.tokens
            .get(self.pos)
            .or_else(|| self.tokens.last())
            .map_or(1, |t| t.line)
    }

    /// Consume the next token, failing at end of stream.
    pub fn expect_any(&mut self, expected: &str) -> Result<Token> {
        self.next().ok_or_else(|| PgmError::UnexpectedEof {
            expected: expected.to_string(),
        })
    }

    /// Consume the unquoted symbol `s`.
    pub fn expect(&mut self, s: &str) -> Result<()> {
        let tok = self.expect_any(&format!("'{}'", s))?;
        if tok.is(s) {
            Ok(())
        } else {
            Err(PgmError::parse(
                tok.line,
                format!("expected '{}', found '{}'", s, tok.text),
            ))
        }
    }

    /// Consume a name (quoted or bare, but not punctuation).
    pub fn expect_name(&mut self, what: &str) -> Result<Token> {
        let tok = self.expect_any(what)?;
        if !tok.quoted && tok.text.len() == 1 && tok.text.starts_with(PUNCTUATION) {
            return Err(PgmError::parse(
                tok.line,
                format!("expected {}, found '{}'", what, tok.text),
            ));
        }
        Ok(tok)
    }

    /// Consume tokens up to and including the first unquoted one in `keywords`.
    ///
    /// Returns `None` when the stream ends first.
    pub fn skip_to(&mut self, keywords: &[&str]) -> Option<Token> {
        self.by_ref()
            .find(|t| !t.quoted && keywords.contains(&t.text.as_str()))
    }

    /// Consume a brace-delimited block whose opening `{` was already read.
    pub fn skip_block(&mut self) -> Result<()> {
        let mut depth = 1;
        while depth > 0 {
            let tok = self.expect_any("'}'")?;
            if tok.is("{") {
                depth += 1;
            } else if tok.is("}") {
                depth -= 1;
            }
        }
        Ok(())
    }
}

impl Iterator for Tokens {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        let tok = self.tokens.get(self.pos).cloned();
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }
}

/// Parse a table value token.
pub(crate) fn parse_value(tok: &Token) -> Result<f64> {
    tok.text
        .parse::<f64>()
        .map_err(|_| PgmError::parse(tok.line, format!("invalid number '{}'", tok.text)))
}
