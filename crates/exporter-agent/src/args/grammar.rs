//! Connection spec grammar: `[host ":"] port ":" file`.
//!
//! The colon separates host, port and file, but also appears inside
//! bracketed IPv6 literals (`[2001:db8::1]`) and Windows drive-letter paths
//! (`C:\agent\rules.yaml`). Parsing runs as three small stages:
//!
//! 1. [`Tokenizer`] cuts the input into [`Token`]s. A bracketed literal is one
//!    token. After the first colon, a single ASCII letter followed by a colon
//!    starts a drive path, which swallows the rest of the input. The leading
//!    token is always a host or a port, so a lone letter there is a host.
//! 2. [`parse`] classifies tokens with an explicit [`State`] machine.
//! 3. [`validate_port`] checks the port token.
//!
//! Anything that could be read two ways is rejected, never guessed.

use crate::error::ArgumentError;

/// Structurally parsed connection spec, borrowing from the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnSpec<'a> {
    /// Explicit host, brackets kept for IPv6 literals
    pub host: Option<&'a str>,
    /// Listening port
    pub port: u16,
    /// Rules file path, verbatim
    pub file: &'a str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token<'a> {
    /// `[...]`, brackets included
    Bracketed(&'a str),
    /// Text up to the next colon
    Word(&'a str),
    /// `X:...` through the end of the input
    DrivePath(&'a str),
}

struct Tokenizer<'a> {
    input: &'a str,
    /// Start of the unread input; `None` once the input is exhausted.
    pos: Option<usize>,
}

impl<'a> Tokenizer<'a> {
    const fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: Some(0),
        }
    }

    /// Next token in host position, where drive paths are not recognized.
    fn next_host_token(&mut self) -> Result<Option<Token<'a>>, ArgumentError> {
        self.read(false)
    }

    fn next_token(&mut self) -> Result<Option<Token<'a>>, ArgumentError> {
        self.read(true)
    }

    fn read(&mut self, drive_paths: bool) -> Result<Option<Token<'a>>, ArgumentError> {
        let Some(start) = self.pos else {
            return Ok(None);
        };
        let rest = &self.input[start..];

        if rest.starts_with('[') {
            let close = rest.find(']').ok_or_else(|| {
                ArgumentError::Malformed(format!("unterminated '[' in '{}'", self.input))
            })?;
            let token = &rest[..=close];
            if token.len() == 2 {
                return Err(ArgumentError::Malformed("empty bracketed host '[]'".to_string()));
            }

            let after = &rest[close + 1..];
            self.pos = if after.is_empty() {
                None
            } else if after.starts_with(':') {
                Some(start + close + 2)
            } else {
                return Err(ArgumentError::Malformed(format!(
                    "expected ':' after '{token}' but found '{after}'"
                )));
            };
            return Ok(Some(Token::Bracketed(token)));
        }

        if drive_paths && is_drive_prefix(rest) {
            self.pos = None;
            return Ok(Some(Token::DrivePath(rest)));
        }

        match rest.find(':') {
            Some(colon) => {
                self.pos = Some(start + colon + 1);
                Ok(Some(Token::Word(&rest[..colon])))
            }
            None => {
                self.pos = None;
                Ok(Some(Token::Word(rest)))
            }
        }
    }

    /// Everything not yet consumed, verbatim.
    fn remainder(&mut self) -> Option<&'a str> {
        self.pos.take().map(|start| &self.input[start..])
    }
}

/// Check whether `s` starts with a lone drive letter followed by a colon.
///
/// A single letter between two colons is never a host or a path segment of
/// its own: it is glued back onto the path that follows it.
pub fn is_drive_prefix(s: &str) -> bool {
    let bytes = s.as_bytes();
    bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}

#[derive(Debug)]
enum State<'a> {
    Start,
    ExpectPort { host: Option<&'a str> },
    ExpectFile { host: Option<&'a str>, port: u16 },
}

/// Parse a connection spec.
///
/// # Errors
///
/// Returns [`ArgumentError::Malformed`] when a required part is missing and
/// [`ArgumentError::AmbiguousHostPort`] when the port position holds
/// something other than a port number in range.
pub fn parse(conn_spec: &str) -> Result<ConnSpec<'_>, ArgumentError> {
    if conn_spec.is_empty() {
        return Err(ArgumentError::Malformed(
            "empty connection spec, expected [host:]port:file".to_string(),
        ));
    }

    let mut tokens = Tokenizer::new(conn_spec);
    let mut state = State::Start;

    loop {
        state = match state {
            State::Start => match tokens.next_host_token()? {
                Some(Token::Bracketed(host)) => State::ExpectPort { host: Some(host) },
                Some(Token::Word("")) | None => State::ExpectPort { host: None },
                Some(Token::Word(word)) if is_unsigned(word) => State::ExpectFile {
                    host: None,
                    port: validate_port(word)?,
                },
                Some(Token::Word(host)) => State::ExpectPort { host: Some(host) },
                Some(Token::DrivePath(path)) => return Err(missing_port(path)),
            },
            State::ExpectPort { host } => match tokens.next_token()? {
                Some(Token::Word("")) | None => {
                    return Err(ArgumentError::Malformed(format!(
                        "missing port in '{conn_spec}'"
                    )));
                }
                Some(Token::Word(word)) => State::ExpectFile {
                    host,
                    port: validate_port(word)?,
                },
                Some(Token::Bracketed(token)) => {
                    return Err(ArgumentError::AmbiguousHostPort(format!(
                        "expected a port after host but found '{token}'"
                    )));
                }
                Some(Token::DrivePath(path)) => return Err(missing_port(path)),
            },
            State::ExpectFile { host, port } => {
                let file = tokens
                    .remainder()
                    .filter(|file| !file.is_empty())
                    .ok_or_else(|| {
                        ArgumentError::Malformed(format!("missing rules file in '{conn_spec}'"))
                    })?;
                return Ok(ConnSpec { host, port, file });
            }
        };
    }
}

/// Check the port token: digits only, within `0..=65535`.
///
/// # Errors
///
/// Returns [`ArgumentError::AmbiguousHostPort`] otherwise. A non-numeric
/// token here means two host-like tokens precede the path.
pub fn validate_port(token: &str) -> Result<u16, ArgumentError> {
    if !is_unsigned(token) {
        return Err(ArgumentError::AmbiguousHostPort(format!(
            "expected a port but found '{token}'"
        )));
    }
    token.parse::<u16>().map_err(|_| {
        ArgumentError::AmbiguousHostPort(format!("port '{token}' is out of range 0-65535"))
    })
}

fn is_unsigned(token: &str) -> bool {
    !token.is_empty() && token.bytes().all(|b| b.is_ascii_digit())
}

fn missing_port(path: &str) -> ArgumentError {
    ArgumentError::Malformed(format!("no port before path '{path}'"))
}
