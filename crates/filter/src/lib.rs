use regex::Regex;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterKind { Prefix, Suffix, Regex }

#[derive(Error, Debug)]
pub enum FilterError {
    #[error("--pattern is required when --filter-type is specified")]
    MissingPattern,
    #[error("--filter-type is required when --pattern is specified")]
    MissingFilterType,
    #[error("invalid regex pattern '{pattern}': {source}")]
    InvalidRegex { pattern: String, #[source] source: regex::Error },
}

/// Name filter applied to Permission Set names before anything else is fetched.
#[derive(Debug, Clone, Default)]
pub enum NameFilter {
    #[default]
    All,
    Prefix(String),
    Suffix(String),
    Regex(Regex),
}

impl NameFilter {
    /// Both halves must be given together. An empty pattern counts as missing.
    pub fn new(kind: Option<FilterKind>, pattern: Option<String>) -> Result<Self, FilterError> {
        let pattern = pattern.filter(|p| !p.is_empty());
        match (kind, pattern) {
            (None, None) => Ok(NameFilter::All),
            (Some(_), None) => Err(FilterError::MissingPattern),
            (None, Some(_)) => Err(FilterError::MissingFilterType),
            (Some(FilterKind::Prefix), Some(p)) => Ok(NameFilter::Prefix(p)),
            (Some(FilterKind::Suffix), Some(p)) => Ok(NameFilter::Suffix(p)),
            (Some(FilterKind::Regex), Some(p)) => {
                let re = Regex::new(&p).map_err(|source| FilterError::InvalidRegex { pattern: p.clone(), source })?;
                Ok(NameFilter::Regex(re))
            }
        }
    }

    pub fn is_all(&self) -> bool { matches!(self, NameFilter::All) }

    pub fn matches(&self, name: &str) -> bool {
        match self {
            NameFilter::All => true,
            NameFilter::Prefix(p) => name.starts_with(p.as_str()),
            NameFilter::Suffix(s) => name.ends_with(s.as_str()),
            // leftmost match must begin at offset 0, the end stays open
            NameFilter::Regex(re) => re.find(name).is_some_and(|m| m.start() == 0),
        }
    }
}

/// One-shot form of [`NameFilter::matches`]; `kind == None` accepts every name.
pub fn matches(name: &str, kind: Option<FilterKind>, pattern: &str) -> Result<bool, FilterError> {
    let filter = match kind {
        None => NameFilter::All,
        Some(FilterKind::Prefix) => NameFilter::Prefix(pattern.to_string()),
        Some(FilterKind::Suffix) => NameFilter::Suffix(pattern.to_string()),
        Some(FilterKind::Regex) => NameFilter::Regex(
            Regex::new(pattern).map_err(|source| FilterError::InvalidRegex { pattern: pattern.to_string(), source })?,
        ),
    };
    Ok(filter.matches(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    const NAMES: &[&str] = &["AdminAccess", "ReadOnlyAccess", "DevAccess", "admin", "", "Dev"];

    #[test]
    fn no_filter_accepts_everything() {
        for n in NAMES {
            assert!(matches(n, None, "").unwrap());
            assert!(matches(n, None, "zzz").unwrap());
        }
        assert!(NameFilter::new(None, None).unwrap().is_all());
    }

    #[test]
    fn prefix_and_suffix_follow_str_semantics() {
        for n in NAMES {
            for p in ["Dev", "Access", "admin", "A", "DevAccessX"] {
                assert_eq!(matches(n, Some(FilterKind::Prefix), p).unwrap(), n.starts_with(p));
                assert_eq!(matches(n, Some(FilterKind::Suffix), p).unwrap(), n.ends_with(p));
            }
        }
    }

    #[test]
    fn prefix_is_case_sensitive() {
        assert!(!matches("AdminAccess", Some(FilterKind::Prefix), "admin").unwrap());
    }

    #[test]
    fn regex_is_anchored_at_start_only() {
        let re = Some(FilterKind::Regex);
        assert!(matches("AdminFull", re, "Admin").unwrap());
        assert!(matches("AdminFull", re, "Adm.n").unwrap());
        assert!(!matches("SuperAdmin", re, "Admin").unwrap());
        assert!(matches("SuperAdmin", re, ".*Admin").unwrap());
        assert!(matches("DevAccess", re, "Dev|Prod").unwrap());
        assert!(matches("ProdAccess", re, "Dev|Prod").unwrap());
        assert!(!matches("StageAccess", re, "Dev|Prod").unwrap());
        assert!(matches("anything", re, "x*").unwrap());
    }

    #[test]
    fn regex_later_match_does_not_count() {
        // "b" appears, but only after offset 0
        assert!(!matches("ab", Some(FilterKind::Regex), "b").unwrap());
        assert!(matches("ab", Some(FilterKind::Regex), "a?b").unwrap());
    }

    #[test]
    fn dollar_only_matches_at_the_very_end() {
        let re = Some(FilterKind::Regex);
        assert!(matches("Admin", re, "Admin$").unwrap());
        assert!(!matches("Admin\n", re, "Admin$").unwrap());
        assert!(matches("Admin\n", re, "(?m)Admin$").unwrap());
    }

    #[test]
    fn invalid_regex_fails_fast() {
        let err = NameFilter::new(Some(FilterKind::Regex), Some("(unclosed".into())).unwrap_err();
        assert!(matches!(err, FilterError::InvalidRegex { .. }));
        assert!(matches("x", Some(FilterKind::Regex), "[").is_err());
    }

    #[test]
    fn pairing_is_enforced() {
        let e = NameFilter::new(Some(FilterKind::Prefix), None).unwrap_err();
        assert_eq!(e.to_string(), "--pattern is required when --filter-type is specified");
        let e = NameFilter::new(None, Some("foo".into())).unwrap_err();
        assert_eq!(e.to_string(), "--filter-type is required when --pattern is specified");
    }

    #[test]
    fn empty_pattern_counts_as_missing() {
        assert!(matches!(
            NameFilter::new(Some(FilterKind::Suffix), Some(String::new())),
            Err(FilterError::MissingPattern)
        ));
        assert!(NameFilter::new(None, Some(String::new())).unwrap().is_all());
    }

    #[test]
    fn built_filter_matches_like_free_function() {
        let f = NameFilter::new(Some(FilterKind::Prefix), Some("Dev".into())).unwrap();
        let kept: Vec<_> = ["AdminAccess", "ReadOnlyAccess", "DevAccess"].into_iter().filter(|n| f.matches(n)).collect();
        assert_eq!(kept, vec!["DevAccess"]);
    }
}
