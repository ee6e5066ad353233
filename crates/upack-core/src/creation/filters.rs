//! Content exclusion for archive rebuilds.

/// Substring-based exclusion predicate.
///
/// A path is kept unless it contains at least one of the exclusion
/// substrings. Matching is plain, case-sensitive substring search against
/// the forward-slash relative path. Empty substrings are ignored, so an
/// accidental `""` never excludes everything.
///
/// This departs from the literal "contains none of the substrings" rule,
/// under which `""` is contained in every path and would drop every entry.
///
/// # Examples
///
/// ```
/// use upack_core::creation::ExclusionFilter;
///
/// let exclusions = vec!["com/example".to_string()];
/// let filter = ExclusionFilter::new(&exclusions);
///
/// assert!(!filter.keep("com/example/Foo.class"));
/// assert!(filter.keep("com/unity/Keep.class"));
/// ```
#[derive(Debug, Clone, Copy)]
pub struct ExclusionFilter<'a> {
    exclusions: &'a [String],
}

impl<'a> ExclusionFilter<'a> {
    /// Creates a filter over the given substrings.
    #[must_use]
    pub fn new(exclusions: &'a [String]) -> Self {
        Self { exclusions }
    }

    /// Returns `true` if `path` matches none of the exclusions.
    #[must_use]
    pub fn keep(&self, path: &str) -> bool {
        self.matching(path).is_none()
    }

    /// Returns the first exclusion contained in `path`, if any.
    #[must_use]
    pub fn matching(&self, path: &str) -> Option<&'a str> {
        self.exclusions
            .iter()
            .map(String::as_str)
            .find(|exclusion| !exclusion.is_empty() && path.contains(exclusion))
    }

    /// Returns `true` if the filter can never exclude anything.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.exclusions.iter().all(String::is_empty)
    }
}
