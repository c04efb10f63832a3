//! Request headers with case-insensitive lookup.
//!
//! Headers are kept as an ordered list of name/value pairs so that
//! duplicates survive until lookup time. Authentication uses
//! [`Headers::get_unique`], which rejects a header name that appears more
//! than once under any casing.

use crate::error::AuthError;

/// Ordered collection of request headers.
///
/// # Example
///
/// ```
/// use slicknode_runtime::Headers;
///
/// let headers = Headers::new().with("X-Slicknode-Timestamp", "1700000000");
/// assert_eq!(headers.get("x-slicknode-timestamp"), Some("1700000000"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    entries: Vec<(String, String)>,
}

impl Headers {
    /// Creates an empty header list.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Appends a header, keeping any existing entry with the same name.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.entries.push((name.into(), value.into()));
    }

    /// Appends a header and returns the list.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(name, value);
        self
    }

    /// Returns the first value whose name matches case-insensitively.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.matching(name).next()
    }

    /// Returns the value for `name`, failing when it occurs more than once.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::DuplicateHeader`] when two entries share the
    /// name under case-insensitive comparison.
    pub fn get_unique(&self, name: &str) -> Result<Option<&str>, AuthError> {
        let mut values = self.matching(name);
        let first = values.next();
        if values.next().is_some() {
            return Err(AuthError::DuplicateHeader {
                name: name.to_ascii_lowercase(),
            });
        }
        Ok(first)
    }

    /// Iterates over all entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    /// Returns the number of entries.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when no headers are present.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn matching<'a, 'n>(&'a self, name: &'n str) -> impl Iterator<Item = &'a str> + use<'a, 'n> {
        self.entries
            .iter()
            .filter(move |(candidate, _)| candidate.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Headers {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut headers = Self::new();
        headers.extend(iter);
        headers
    }
}

impl<K: Into<String>, V: Into<String>> Extend<(K, V)> for Headers {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (name, value) in iter {
            self.insert(name, value);
        }
    }
}

impl<K: Into<String>, V: Into<String>, const N: usize> From<[(K, V); N]> for Headers {
    fn from(pairs: [(K, V); N]) -> Self {
        pairs.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_ignores_case() {
        let headers = Headers::from([("AUTHORIZATION", "token")]);
        assert_eq!(headers.get("authorization"), Some("token"));
        assert_eq!(headers.get_unique("Authorization"), Ok(Some("token")));
    }

    #[test]
    fn values_outlive_the_lookup_name() {
        let headers = Headers::from([("X-Slicknode-Timestamp", "42")]);
        let value = {
            let name = String::from("x-slicknode-timestamp");
            headers.get(&name)
        };
        let unique = {
            let name = String::from("X-SLICKNODE-TIMESTAMP");
            headers.get_unique(&name)
        };
        assert_eq!(value, Some("42"));
        assert_eq!(unique, Ok(Some("42")));
    }

    #[test]
    fn missing_header_is_none() {
        let headers = Headers::new();
        assert_eq!(headers.get_unique("authorization"), Ok(None));
        assert!(headers.is_empty());
    }

    #[test]
    fn case_colliding_duplicates_are_rejected() {
        let headers = Headers::new()
            .with("Authorization", "a")
            .with("authorization", "b");
        assert_eq!(
            headers.get_unique("AUTHORIZATION"),
            Err(AuthError::DuplicateHeader {
                name: "authorization".into()
            })
        );
        assert_eq!(headers.get("authorization"), Some("a"));
    }

    #[test]
    fn iteration_preserves_insertion_order() {
        let headers: Headers = vec![("b", "2"), ("a", "1")].into_iter().collect();
        let names: Vec<&str> = headers.iter().map(|(name, _)| name).collect();
        assert_eq!(names, ["b", "a"]);
        assert_eq!(headers.len(), 2);
    }
}
