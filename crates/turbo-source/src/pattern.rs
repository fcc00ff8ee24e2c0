//! Route patterns and first-match lookup.
//!
//! Two pattern forms are supported:
//!
//! ```text
//! /category/(.*)?/:slug/            path template, matched against the route
//! /:year(\d+)/:month(\d+)?/         custom segment regex and optional params
//! /blog/:subpath*                   zero or more trailing segments
//! RegExp:(\?|&)p=(?P<id>\d+)        raw regex, matched against the full link
//! ```

use std::cmp::Reverse;
use std::collections::BTreeMap;
use std::fmt;

use regex::Regex;

/// Parameters captured by a pattern.
pub type Params = BTreeMap<String, String>;

/// Prefix marking a raw regular expression pattern.
pub const REGEXP_PREFIX: &str = "RegExp:";

const DEFAULT_SEGMENT: &str = "[^/]+";

/// Errors raised while compiling a pattern.
#[derive(Debug, thiserror::Error)]
pub enum PatternError {
    /// The generated or raw regular expression is invalid.
    #[error("invalid regex: {0}")]
    Regex(#[from] regex::Error),

    /// A `(` in a segment has no matching `)`.
    #[error("unbalanced parentheses in segment `{0}`")]
    Unbalanced(String),

    /// A `:` is not followed by a parameter name.
    #[error("missing parameter name in segment `{0}`")]
    MissingName(String),

    /// Unexpected characters after a parameter.
    #[error("unexpected `{rest}` in segment `{segment}`")]
    Trailing { segment: String, rest: String },
}

/// How a pattern is matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternKind {
    /// Path template matched against the route.
    Path,
    /// Raw regex matched against the full link, query included.
    RegExp,
}

/// A compiled route pattern.
#[derive(Debug, Clone)]
pub struct Pattern {
    source: String,
    kind: PatternKind,
    regex: Regex,
    /// (regex group name, exposed parameter name)
    groups: Vec<(String, String)>,
}

impl Pattern {
    /// Compile a pattern string.
    pub fn parse(source: &str) -> Result<Self, PatternError> {
        if let Some(raw) = source.strip_prefix(REGEXP_PREFIX) {
            let regex = Regex::new(raw)?;
            let groups = regex
                .capture_names()
                .flatten()
                .map(|name| (name.to_string(), name.to_string()))
                .collect();
            return Ok(Self {
                source: source.to_string(),
                kind: PatternKind::RegExp,
                regex,
                groups,
            });
        }

        let (body, groups) = compile_template(source)?;
        let regex = Regex::new(&format!("(?i)^{}/?$", body))?;

        Ok(Self {
            source: source.to_string(),
            kind: PatternKind::Path,
            regex,
            groups,
        })
    }

    /// The pattern as written.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// How this pattern is matched.
    pub fn kind(&self) -> PatternKind {
        self.kind
    }

    /// Whether this is a raw regex pattern.
    pub fn is_regexp(&self) -> bool {
        self.kind == PatternKind::RegExp
    }

    /// Match against a route (path templates) or link (raw regexes).
    pub fn captures(&self, route: &str, link: &str) -> Option<Params> {
        let target = match self.kind {
            PatternKind::Path => route,
            PatternKind::RegExp => link,
        };
        let caps = self.regex.captures(target)?;

        let params = self
            .groups
            .iter()
            .filter_map(|(group, name)| {
                caps.name(group)
                    .map(|m| (name.clone(), m.as_str().to_string()))
            })
            .collect();
        Some(params)
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.source)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Modifier {
    One,
    Optional,
    OneOrMore,
    ZeroOrMore,
}

#[derive(Debug)]
enum Token<'a> {
    Literal(&'a str),
    Param {
        name: Option<&'a str>,
        regex: Option<&'a str>,
        modifier: Modifier,
    },
}

impl<'a> Token<'a> {
    fn parse(segment: &'a str) -> Result<Self, PatternError> {
        let (name, rest) = if let Some(rest) = segment.strip_prefix(':') {
            let end = rest
                .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
                .unwrap_or(rest.len());
            if end == 0 {
                return Err(PatternError::MissingName(segment.to_string()));
            }
            (Some(&rest[..end]), &rest[end..])
        } else if segment.starts_with('(') {
            (None, segment)
        } else {
            return Ok(Token::Literal(segment));
        };

        let (regex, rest) = if rest.starts_with('(') {
            let close = closing_paren(rest)
                .ok_or_else(|| PatternError::Unbalanced(segment.to_string()))?;
            (Some(&rest[1..close]), &rest[close + 1..])
        } else {
            (None, rest)
        };

        let modifier = match rest {
            "" => Modifier::One,
            "?" => Modifier::Optional,
            "+" => Modifier::OneOrMore,
            "*" => Modifier::ZeroOrMore,
            other => {
                return Err(PatternError::Trailing {
                    segment: segment.to_string(),
                    rest: other.to_string(),
                })
            }
        };

        Ok(Token::Param {
            name,
            regex,
            modifier,
        })
    }
}

fn closing_paren(s: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut escaped = false;
    for (i, c) in s.char_indices() {
        match c {
            _ if escaped => escaped = false,
            '\\' => escaped = true,
            '(' => depth += 1,
            ')' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

fn compile_template(template: &str) -> Result<(String, Vec<(String, String)>), PatternError> {
    let mut body = String::new();
    let mut groups = Vec::new();
    let mut anonymous = 0usize;

    for segment in template.split('/').filter(|s| !s.is_empty()) {
        match Token::parse(segment)? {
            Token::Literal(literal) => {
                body.push('/');
                body.push_str(&regex::escape(literal));
            }
            Token::Param {
                name,
                regex,
                modifier,
            } => {
                let (group, param) = match name {
                    Some(name) => (name.to_string(), name.to_string()),
                    None => {
                        let index = anonymous;
                        anonymous += 1;
                        (format!("_{}", index), index.to_string())
                    }
                };
                let re = regex.unwrap_or(DEFAULT_SEGMENT);

                let capture = match modifier {
                    Modifier::One | Modifier::Optional => format!("(?P<{}>{})", group, re),
                    Modifier::OneOrMore | Modifier::ZeroOrMore => {
                        format!("(?P<{}>{}(?:/{})*)", group, re, re)
                    }
                };
                match modifier {
                    Modifier::One | Modifier::OneOrMore => {
                        body.push('/');
                        body.push_str(&capture);
                    }
                    Modifier::Optional | Modifier::ZeroOrMore => {
                        body.push_str(&format!("(?:/{})?", capture));
                    }
                }
                groups.push((group, param));
            }
        }
    }

    Ok((body, groups))
}

/// A named pattern with a priority and an associated callable.
///
/// Shared by handlers and redirections.
#[derive(Clone)]
pub struct PatternEntry<T> {
    /// Entry name, used in logs and lookups.
    pub name: String,
    /// Higher priorities are tried first.
    pub priority: i32,
    /// Compiled pattern.
    pub pattern: Pattern,
    /// Handler or rewrite function.
    pub func: T,
}

impl<T> PatternEntry<T> {
    /// Create an entry, compiling its pattern.
    pub fn new(
        name: impl Into<String>,
        priority: i32,
        pattern: &str,
        func: T,
    ) -> Result<Self, PatternError> {
        Ok(Self {
            name: name.into(),
            priority,
            pattern: Pattern::parse(pattern)?,
            func,
        })
    }
}

impl<T> fmt::Debug for PatternEntry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PatternEntry")
            .field("name", &self.name)
            .field("priority", &self.priority)
            .field("pattern", &self.pattern.as_str())
            .finish()
    }
}

/// A matched entry with its captured parameters.
#[derive(Debug)]
pub struct Match<'a, T> {
    /// The entry that matched.
    pub entry: &'a PatternEntry<T>,
    /// Captured parameters.
    pub params: Params,
}

impl<T> Match<'_, T> {
    /// Whether the match came from a raw regex pattern.
    pub fn is_regexp(&self) -> bool {
        self.entry.pattern.is_regexp()
    }
}

/// Sort entries by descending priority, keeping insertion order for ties.
pub fn sort_by_priority<T>(entries: &mut [PatternEntry<T>]) {
    entries.sort_by_key(|entry| Reverse(entry.priority));
}

/// Find the first entry matching the route (or link, for raw regexes).
///
/// Entries are tried by descending priority, then insertion order.
pub fn get_match<'a, T>(
    route: &str,
    link: &str,
    entries: &'a [PatternEntry<T>],
) -> Option<Match<'a, T>> {
    let mut ordered: Vec<&PatternEntry<T>> = entries.iter().collect();
    ordered.sort_by_key(|entry| Reverse(entry.priority));

    ordered.into_iter().find_map(|entry| {
        entry
            .pattern
            .captures(route, link)
            .map(|params| Match { entry, params })
    })
}
