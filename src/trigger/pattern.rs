//! Trigger-path pattern matching.
//!
//! Fired path names carry version suffixes (`HLT_Photon50_v3`), so mandatory
//! paths are stored as patterns. The comparison strategy is a capability
//! (`PathMatch`) chosen per trigger file.

use regex::Regex;

use crate::config::MatcherKind;
use crate::error::ConfigError;

/// Compare a configured path pattern with a fired path name.
pub trait PathMatch {
    /// Pattern text as written in the configuration.
    fn pattern(&self) -> &str;

    /// Whether `path` satisfies the pattern (whole-name match).
    fn matches(&self, path: &str) -> bool;
}

/// A compiled path pattern.
#[derive(Debug, Clone)]
pub enum PathPattern {
    Exact(String),
    /// Shell-style: `*` any run of characters, `?` one character.
    Wildcard(String),
    Regex { source: String, compiled: Regex },
}

impl PathPattern {
    pub fn compile(kind: MatcherKind, pattern: &str) -> Result<Self, ConfigError> {
        match kind {
            MatcherKind::Exact => Ok(Self::Exact(pattern.to_string())),
            MatcherKind::Wildcard => Ok(Self::Wildcard(pattern.to_string())),
            MatcherKind::Regex => {
                // Full-name match: anchor both ends.
                let compiled =
                    Regex::new(&format!("^(?:{pattern})$")).map_err(|source| ConfigError::Pattern {
                        pattern: pattern.to_string(),
                        source,
                    })?;
                Ok(Self::Regex {
                    source: pattern.to_string(),
                    compiled,
                })
            }
        }
    }
}

impl PathMatch for PathPattern {
    fn pattern(&self) -> &str {
        match self {
            PathPattern::Exact(p) | PathPattern::Wildcard(p) => p,
            PathPattern::Regex { source, .. } => source,
        }
    }

    fn matches(&self, path: &str) -> bool {
        match self {
            PathPattern::Exact(p) => p == path,
            PathPattern::Wildcard(p) => wildcard_match(p.as_bytes(), path.as_bytes()),
            PathPattern::Regex { compiled, .. } => compiled.is_match(path),
        }
    }
}

/// Iterative glob matcher with single-star backtracking.
fn wildcard_match(pattern: &[u8], text: &[u8]) -> bool {
    let (mut p, mut t) = (0usize, 0usize);
    let mut star: Option<usize> = None;
    let mut resume = 0usize;

    while t < text.len() {
        if p < pattern.len() && (pattern[p] == b'?' || pattern[p] == text[t]) {
            p += 1;
            t += 1;
        } else if p < pattern.len() && pattern[p] == b'*' {
            star = Some(p);
            resume = t;
            p += 1;
        } else if let Some(s) = star {
            p = s + 1;
            resume += 1;
            t = resume;
        } else {
            return false;
        }
    }
    while p < pattern.len() && pattern[p] == b'*' {
        p += 1;
    }
    p == pattern.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn regex_is_anchored() {
        let p = PathPattern::compile(MatcherKind::Regex, "HLT_Photon50_v.*").unwrap();
        assert!(p.matches("HLT_Photon50_v3"));
        assert!(!p.matches("HLT_Photon50"));
        assert!(!p.matches("XHLT_Photon50_v3"));
        assert!(!p.matches("HLT_Photon500_v1"));
    }

    #[test]
    fn wildcard_supports_star_and_question_mark() {
        let p = PathPattern::compile(MatcherKind::Wildcard, "HLT_Photon?0_v*").unwrap();
        assert!(p.matches("HLT_Photon50_v12"));
        assert!(p.matches("HLT_Photon90_v"));
        assert!(!p.matches("HLT_Photon135_v1"));
        assert!(wildcard_match(b"*a*b", b"xxaxxb"));
        assert!(!wildcard_match(b"*a*b", b"xxaxxbc"));
    }

    #[test]
    fn exact_requires_equality() {
        let p = PathPattern::compile(MatcherKind::Exact, "HLT_Photon50_v3").unwrap();
        assert!(p.matches("HLT_Photon50_v3"));
        assert!(!p.matches("HLT_Photon50_v4"));
        assert_eq!(p.pattern(), "HLT_Photon50_v3");
    }

    #[test]
    fn invalid_regex_is_a_config_error() {
        let err = PathPattern::compile(MatcherKind::Regex, "HLT_(Photon").unwrap_err();
        assert!(matches!(err, ConfigError::Pattern { .. }));
    }
}
