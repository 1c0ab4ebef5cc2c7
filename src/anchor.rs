//! Anchor location for patch rules.
//!
//! Rules never run regexes themselves; they describe *where* to look via an
//! [`Anchor`] and receive back an optional byte [`Span`]. This keeps the
//! fragile matching strategies in one place so they can be swapped or extended
//! without touching rule orchestration.

use regex::Regex;

/// Byte range of a located anchor within source text.
///
/// `start` is inclusive, `end` exclusive, both valid UTF-8 boundaries since
/// they come from regex matches over the same text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

/// A strategy for locating an insertion or replacement point in source text.
#[derive(Debug, Clone)]
pub enum Anchor {
    /// A literal marker string, anywhere in the text.
    Marker(&'static str),

    /// A structural regex pattern; the span of its first match.
    Pattern(Regex),

    /// A function definition by name, located at its `function <name>(`
    /// keyword. Used as a named fallback when a structural pattern misses.
    Function(&'static str),
}

impl Anchor {
    /// Compile a structural pattern anchor.
    ///
    /// Patterns are compiled once at rule construction; they are fixed
    /// strings, so a failure to compile is a programming error.
    pub fn pattern(pattern: &str) -> Anchor {
        Anchor::Pattern(Regex::new(pattern).expect("anchor pattern must compile"))
    }

    /// Locate this anchor in `source`, returning the span of the first match.
    pub fn locate(&self, source: &str) -> Option<Span> {
        match self {
            Anchor::Marker(needle) => source.find(needle).map(|start| Span {
                start,
                end: start + needle.len(),
            }),
            Anchor::Pattern(re) => re.find(source).map(|m| Span {
                start: m.start(),
                end: m.end(),
            }),
            Anchor::Function(name) => {
                let re = Regex::new(&format!(r"function\s+{}\s*\(", regex::escape(name)))
                    .expect("function anchor pattern must compile");
                re.find(source).map(|m| Span {
                    start: m.start(),
                    end: m.end(),
                })
            }
        }
    }

    /// Whether this anchor is present in `source` at all.
    pub fn is_present(&self, source: &str) -> bool {
        self.locate(source).is_some()
    }

    /// Human-readable description of the construct this anchor looks for,
    /// used in diagnostics when it cannot be resolved.
    pub fn describe(&self) -> String {
        match self {
            Anchor::Marker(needle) => format!("marker `{needle}`"),
            Anchor::Pattern(re) => format!("pattern `{}`", re.as_str()),
            Anchor::Function(name) => format!("function `{name}()`"),
        }
    }
}
