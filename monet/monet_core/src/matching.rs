//! Wildcard matching between capability names.
//!
//! `ns/*` is a namespace-level wildcard, not a glob. Matching is a single-level
//! relation: two wildcards of different namespaces never match, and nothing
//! beyond a single trailing `/*` is recognised.

use crate::capability::WILDCARD_SUFFIX;

/// Decide whether two capability names refer to the same or overlapping
/// capability.
///
/// When only `b` is a wildcard the arguments are swapped, so the wildcard side
/// is always evaluated as the general one.
///
/// ```
/// use monet_core::matches;
///
/// assert!(matches("foo/*", "foo/*"));
/// assert!(matches("foo/bar", "foo/bar"));
/// assert!(matches("foo/*", "foo/bar"));
/// assert!(matches("foo/bar", "foo/*"));
/// assert!(!matches("foo/*", "bar/*"));
/// assert!(!matches("foo/bar", "foo/baz"));
/// assert!(!matches("bar/bar", "baz/*"));
/// ```
pub fn matches(a: &str, b: &str) -> bool {
    if b.ends_with(WILDCARD_SUFFIX) && !a.ends_with(WILDCARD_SUFFIX) {
        match_ordered(b, a)
    } else {
        match_ordered(a, b)
    }
}

fn match_ordered(general: &str, specific: &str) -> bool {
    if general == specific {
        return true;
    }
    if general.ends_with(WILDCARD_SUFFIX) && specific.ends_with(WILDCARD_SUFFIX) {
        return false;
    }

    match general.split_once('/') {
        Some((namespace, "*")) => specific
            .strip_prefix(namespace)
            .is_some_and(|rest| rest.starts_with('/')),
        _ => false,
    }
}
