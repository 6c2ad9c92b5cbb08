//! Snapshot of the process environment.
//!
//! Report units read variables through an [`Environment`] instead of
//! `std::env` directly, so tests can supply a fixed set of variables.

use std::collections::BTreeMap;

/// Environment variables captured at one point in time, sorted by name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Environment {
    vars: BTreeMap<String, String>,
}

impl Environment {
    /// Captures the current process environment.
    ///
    /// Names and values that are not valid UTF-8 are converted lossily.
    pub fn capture() -> Self {
        let vars = std::env::vars_os()
            .map(|(k, v)| {
                (
                    k.to_string_lossy().into_owned(),
                    v.to_string_lossy().into_owned(),
                )
            })
            .collect();
        Self { vars }
    }

    /// Builds an environment from explicit pairs.
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Returns a variable, treating empty values as unset.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars
            .get(name)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    /// Returns true if the variable is present, even when empty.
    pub fn contains(&self, name: &str) -> bool {
        self.vars.contains_key(name)
    }

    /// Iterates variables in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Splits a `PATH`-style variable into its non-empty entries.
    pub fn split_paths(&self, name: &str) -> Vec<String> {
        self.get(name)
            .map(|v| {
                v.split(':')
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_treats_empty_as_unset() {
        let env = Environment::from_pairs([("A", "1"), ("EMPTY", "")]);
        assert_eq!(env.get("A"), Some("1"));
        assert_eq!(env.get("EMPTY"), None);
        assert!(env.contains("EMPTY"));
        assert_eq!(env.get("MISSING"), None);
    }

    #[test]
    fn test_iter_is_sorted() {
        let env = Environment::from_pairs([("b", "2"), ("a", "1"), ("C", "3")]);
        let keys: Vec<&str> = env.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["C", "a", "b"]);
    }

    #[test]
    fn test_split_paths() {
        let env = Environment::from_pairs([("PATH", "/usr/bin::/bin:")]);
        assert_eq!(env.split_paths("PATH"), vec!["/usr/bin", "/bin"]);
        assert!(env.split_paths("LD_LIBRARY_PATH").is_empty());
    }

    #[test]
    fn test_capture_sees_process_environment() {
        let env = Environment::capture();
        assert_eq!(env.len(), std::env::vars_os().count());
    }
}
