//! Combined matcher over literal node names.
//!
//! Each literal may carry the anchor marker at its start and/or end. The
//! marker is stripped and turned into a word boundary at that edge; edges
//! without the marker match as plain substrings. A subject matches when any
//! literal occurs in it.

use regex::Regex;

use crate::error::{CoreError, Result};

/// Marker that anchors a literal to a word boundary.
pub const DEFAULT_ANCHOR: char = '^';

/// Options for building a [`PatternMatcher`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternConfig {
    pub anchor: char,
}

impl Default for PatternConfig {
    fn default() -> Self {
        Self {
            anchor: DEFAULT_ANCHOR,
        }
    }
}

impl PatternConfig {
    pub fn with_anchor(mut self, anchor: char) -> Self {
        self.anchor = anchor;
        self
    }
}

#[derive(Debug, Clone)]
pub struct PatternMatcher {
    regex: Option<Regex>,
    literals: usize,
}

impl PatternMatcher {
    /// Compile all literals into one alternation.
    ///
    /// With no literals the matcher matches nothing.
    pub fn new<I, S>(literals: I, config: &PatternConfig) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let alternatives: Vec<String> = literals
            .into_iter()
            .map(|literal| literal_to_regex(literal.as_ref(), config.anchor))
            .collect();
        let literals = alternatives.len();
        if alternatives.is_empty() {
            return Ok(Self {
                regex: None,
                literals,
            });
        }
        let source = format!("(?:{})", alternatives.join("|"));
        let regex = Regex::new(&source)
            .map_err(|err| CoreError::InvalidArgument(format!("node patterns: {err}")))?;
        Ok(Self {
            regex: Some(regex),
            literals,
        })
    }

    pub fn is_match(&self, subject: &str) -> bool {
        self.regex
            .as_ref()
            .is_some_and(|regex| regex.is_match(subject))
    }

    /// Number of literals the matcher was built from.
    pub fn len(&self) -> usize {
        self.literals
    }

    pub fn is_empty(&self) -> bool {
        self.literals == 0
    }
}

fn literal_to_regex(literal: &str, anchor: char) -> String {
    let (literal, at_start) = match literal.strip_prefix(anchor) {
        Some(rest) => (rest, true),
        None => (literal, false),
    };
    let (literal, at_end) = match literal.strip_suffix(anchor) {
        Some(rest) => (rest, true),
        None => (literal, false),
    };
    format!(
        "{}{}{}",
        boundary(at_start),
        regex::escape(literal),
        boundary(at_end)
    )
}

fn boundary(anchored: bool) -> &'static str {
    if anchored { r"\b" } else { "" }
}
