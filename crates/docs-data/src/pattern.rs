//! Express-style path patterns compiled to regular expressions.
//!
//! Supports the subset the app's route descriptors use:
//!
//! - literal segments, matched case-insensitively
//! - `:name` parameters, matching one non-empty segment
//! - `/:name?` optional parameters, where the leading slash is optional too
//! - an optional trailing slash on the matched path
//!
//! Anything else (wildcards, groups, stray `?`) is rejected so callers can
//! skip the route instead of indexing a pattern that matches the wrong paths.

use indexmap::IndexMap;
use regex::Regex;

/// Errors raised while compiling a path pattern.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PatternError {
    #[error("missing parameter name at index {index} in {path:?}")]
    MissingName { path: String, index: usize },

    #[error("unexpected {found:?} at index {index} in {path:?}")]
    Unexpected {
        path: String,
        found: char,
        index: usize,
    },

    #[error("pattern {path:?} produced an invalid expression: {reason}")]
    Regex { path: String, reason: String },
}

/// A named parameter in a compiled pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathKey {
    pub name: String,
    pub optional: bool,
}

/// A compiled route path.
#[derive(Debug, Clone)]
pub struct PathPattern {
    source: String,
    regex: Regex,
    keys: Vec<PathKey>,
}

impl PathPattern {
    /// Compile `path` into a full-match, case-insensitive expression.
    pub fn compile(path: &str) -> Result<Self, PatternError> {
        let chars: Vec<char> = path.chars().collect();
        // A trailing slash is always optional, so drop a literal one.
        let end = if chars.len() > 1 && chars.last() == Some(&'/') {
            chars.len() - 1
        } else {
            chars.len()
        };

        let mut expr = String::from("(?i)^");
        let mut keys = Vec::new();
        let mut buf = [0u8; 4];
        let mut i = 0;
        while i < end {
            match chars[i] {
                '/' if chars.get(i + 1) == Some(&':') => {
                    let (name, next) = read_name(&chars, i + 2, end);
                    if name.is_empty() {
                        return Err(PatternError::MissingName {
                            path: path.to_string(),
                            index: i + 1,
                        });
                    }
                    let optional = next < end && chars[next] == '?';
                    expr.push_str(if optional {
                        "(?:/([^/]+?))?"
                    } else {
                        "/([^/]+?)"
                    });
                    keys.push(PathKey { name, optional });
                    i = if optional { next + 1 } else { next };
                }
                ':' => {
                    let (name, next) = read_name(&chars, i + 1, end);
                    if name.is_empty() {
                        return Err(PatternError::MissingName {
                            path: path.to_string(),
                            index: i,
                        });
                    }
                    let optional = next < end && chars[next] == '?';
                    expr.push_str(if optional { "([^/]+?)?" } else { "([^/]+?)" });
                    keys.push(PathKey { name, optional });
                    i = if optional { next + 1 } else { next };
                }
                found @ ('?' | '*' | '(' | ')') => {
                    return Err(PatternError::Unexpected {
                        path: path.to_string(),
                        found,
                        index: i,
                    });
                }
                c => {
                    expr.push_str(&regex::escape(c.encode_utf8(&mut buf)));
                    i += 1;
                }
            }
        }
        expr.push_str("/?$");

        let regex = Regex::new(&expr).map_err(|e| PatternError::Regex {
            path: path.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            source: path.to_string(),
            regex,
            keys,
        })
    }

    /// The pattern as written in the route descriptor.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn keys(&self) -> &[PathKey] {
        &self.keys
    }

    pub fn is_match(&self, path: &str) -> bool {
        self.regex.is_match(path)
    }

    /// Bind parameter values for `path`; absent optional parameters are left out.
    pub fn captures(&self, path: &str) -> Option<IndexMap<String, String>> {
        let caps = self.regex.captures(path)?;
        Some(
            self.keys
                .iter()
                .enumerate()
                .filter_map(|(i, key)| {
                    caps.get(i + 1)
                        .map(|m| (key.name.clone(), m.as_str().to_string()))
                })
                .collect(),
        )
    }
}

/// Read a parameter name starting at `start`; returns it and the index after it.
fn read_name(chars: &[char], start: usize, end: usize) -> (String, usize) {
    let mut i = start;
    while i < end && (chars[i].is_ascii_alphanumeric() || chars[i] == '_') {
        i += 1;
    }
    (chars[start..i.max(start)].iter().collect(), i)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_paths_match_exactly() {
        let p = PathPattern::compile("/api/content").unwrap();
        assert!(p.is_match("/api/content"));
        assert!(p.is_match("/api/content/"));
        assert!(p.is_match("/API/Content"));
        assert!(!p.is_match("/api/content/abc"));
        assert!(!p.is_match("/api/contents"));
        assert!(!p.is_match("/prefix/api/content"));
    }

    #[test]
    fn parameters_match_one_segment() {
        let p = PathPattern::compile("/api/content/:_id/apply").unwrap();
        assert!(p.is_match("/api/content/abc123/apply"));
        assert!(!p.is_match("/api/content//apply"));
        assert!(!p.is_match("/api/content/a/b/apply"));
        let caps = p.captures("/api/content/abc123/apply").unwrap();
        assert_eq!(caps["_id"], "abc123");
        assert_eq!(
            p.keys(),
            &[PathKey {
                name: "_id".to_string(),
                optional: false
            }]
        );
    }

    #[test]
    fn optional_parameters_may_be_absent() {
        let p = PathPattern::compile("/api/assets/:_id?").unwrap();
        assert!(p.is_match("/api/assets"));
        assert!(p.is_match("/api/assets/"));
        assert!(p.is_match("/api/assets/xyz"));
        assert!(!p.is_match("/api/assets/xyz/more"));
        assert!(p.captures("/api/assets").unwrap().is_empty());
        assert!(p.keys()[0].optional);
    }

    #[test]
    fn literal_characters_are_escaped() {
        let p = PathPattern::compile("/api/v1.0/file+name").unwrap();
        assert!(p.is_match("/api/v1.0/file+name"));
        assert!(!p.is_match("/api/v1x0/file+name"));
    }

    #[test]
    fn unusual_patterns_are_rejected() {
        assert!(matches!(
            PathPattern::compile("/api/*"),
            Err(PatternError::Unexpected { found: '*', .. })
        ));
        assert!(matches!(
            PathPattern::compile("/api/:"),
            Err(PatternError::MissingName { .. })
        ));
        assert!(matches!(
            PathPattern::compile("/api/(foo)"),
            Err(PatternError::Unexpected { found: '(', .. })
        ));
        assert!(matches!(
            PathPattern::compile("/api?"),
            Err(PatternError::Unexpected { found: '?', .. })
        ));
    }

    #[test]
    fn root_path_compiles() {
        let p = PathPattern::compile("/").unwrap();
        assert!(p.is_match("/"));
        assert!(!p.is_match("/api"));
    }
}
