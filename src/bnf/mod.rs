//! BNF grammar expander
//!
//! The program the fixtures in this repository were written for. A grammar file holds one rule per line:
//!
//! ```text
//! S->aB|c
//! B->b
//! ```
//!
//! Expanding a symbol that has a rule produces its productions joined by `|` and wrapped in parentheses, with every
//! character of every production expanded in turn. A symbol without a rule expands to itself. For the grammar above
//! `S` expands to `(a(b)|c)`.
//!
//! Only the non-terminal name is trimmed. Whitespace inside a production is part of it, so `S -> aB|c` expands to
//! `( a( b)|c)` once `B -> b` is added.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use miette::{Diagnostic, SourceSpan};
use thiserror::Error;

/// Symbol whose expansion is written to the output file.
pub const START_SYMBOL: &str = "S";

#[derive(Debug, Error, Diagnostic)]
pub enum BnfError {
    #[error("line {line}: expected a rule of the form `A -> x|y`")]
    #[diagnostic(
        code(bnf::missing_arrow),
        help("separate the non-terminal from its productions with `->`")
    )]
    MissingArrow {
        line: usize,
        #[source_code]
        src: String,
        #[label("no `->` on this line")]
        span: SourceSpan,
    },

    #[error("rule for `{symbol}` expands into itself")]
    #[diagnostic(code(bnf::recursive_rule), help("expansion path: {path}"))]
    Recursive { symbol: String, path: String },

    #[error("failed to read grammar '{}'", .path.display())]
    #[diagnostic(code(bnf::io))]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write expansion to '{}'", .path.display())]
    #[diagnostic(code(bnf::io))]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Rules keyed by non-terminal name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Grammar {
    rules: HashMap<String, Vec<String>>,
}

impl Grammar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a grammar, one `A -> x|y` rule per non-blank line.
    ///
    /// Names are trimmed; productions are kept verbatim, whitespace included. Text after a second `->` is ignored.
    /// Trailing empty productions (`A -> x|`) are dropped. A later rule for the same non-terminal replaces an earlier
    /// one.
    pub fn parse(source: &str) -> Result<Self, BnfError> {
        let mut grammar = Self::new();
        let mut offset = 0;

        for (idx, raw) in source.split_inclusive('\n').enumerate() {
            let line = raw.trim_end_matches(['\n', '\r']);
            let start = offset;
            offset += raw.len();

            if line.trim().is_empty() {
                continue;
            }
            let mut parts = line.split("->");
            let (Some(name), Some(body)) = (parts.next(), parts.next()) else {
                return Err(BnfError::MissingArrow {
                    line: idx + 1,
                    src: source.to_string(),
                    span: (start, line.len()).into(),
                });
            };

            let mut productions: Vec<String> = body.split('|').map(str::to_string).collect();
            while productions.len() > 1 && productions.last().is_some_and(|p| p.is_empty()) {
                productions.pop();
            }
            grammar.add_rule(name.trim(), productions);
        }

        Ok(grammar)
    }

    pub fn add_rule(&mut self, name: impl Into<String>, productions: Vec<String>) {
        self.rules.insert(name.into(), productions);
    }

    pub fn productions(&self, name: &str) -> Option<&[String]> {
        self.rules.get(name).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Expand `symbol` into its regular-expression-like form.
    pub fn expand(&self, symbol: &str) -> Result<String, BnfError> {
        let mut active = Vec::new();
        self.expand_inner(symbol, &mut active)
    }

    fn expand_inner(&self, symbol: &str, active: &mut Vec<String>) -> Result<String, BnfError> {
        let Some(productions) = self.rules.get(symbol) else {
            return Ok(symbol.to_string());
        };

        if active.iter().any(|s| s == symbol) {
            let mut path = active.clone();
            path.push(symbol.to_string());
            return Err(BnfError::Recursive {
                symbol: symbol.to_string(),
                path: path.join(" -> "),
            });
        }

        active.push(symbol.to_string());
        let mut alternatives = Vec::with_capacity(productions.len());
        for production in productions {
            let mut expanded = String::new();
            let mut buf = [0u8; 4];
            for ch in production.chars() {
                expanded.push_str(&self.expand_inner(ch.encode_utf8(&mut buf), active)?);
            }
            alternatives.push(expanded);
        }
        active.pop();

        Ok(format!("({})", alternatives.join("|")))
    }
}

/// Read the grammar at `input`, expand [`START_SYMBOL`] and write the result to `output` without a trailing newline.
pub fn expand_file(input: &Path, output: &Path) -> Result<String, BnfError> {
    let source = fs::read_to_string(input).map_err(|source| BnfError::Read {
        path: input.to_path_buf(),
        source,
    })?;

    let grammar = Grammar::parse(&source)?;
    tracing::debug!(rules = grammar.len(), input = %input.display(), "loaded grammar");

    let expansion = grammar.expand(START_SYMBOL)?;
    fs::write(output, &expansion).map_err(|source| BnfError::Write {
        path: output.to_path_buf(),
        source,
    })?;
    Ok(expansion)
}
