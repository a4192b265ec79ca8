//! Allowed target branches.

use std::collections::HashSet;
use std::fmt;

use crate::{ConfigurationError, ConfigurationResult};

#[cfg(test)]
#[path = "allow_list_tests.rs"]
mod tests;

/// Separator between branch names in the raw configuration value.
pub const BRANCH_SEPARATOR: char = ':';

/// Immutable set of branch names that pull requests may target.
///
/// Built once at startup and shared read-only between requests. Branch names
/// are matched exactly and case-sensitively.
///
/// # Examples
///
/// ```
/// use branch_filter_core::AllowList;
///
/// let allow_list = AllowList::try_new("main:release:main").unwrap();
/// assert_eq!(allow_list.len(), 2);
/// assert!(allow_list.contains("release"));
/// assert!(!allow_list.contains("Main"));
///
/// assert!(AllowList::try_new("").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllowList {
    branches: HashSet<String>,
}

impl AllowList {
    /// Build an allow-list from a colon-delimited list of branch names.
    ///
    /// Tokens are kept verbatim and duplicates collapse.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError::EmptyAllowList` when `raw` is empty. An
    /// empty list would drop every event, which is treated as a misconfiguration.
    pub fn try_new(raw: &str) -> ConfigurationResult<Self> {
        if raw.is_empty() {
            return Err(ConfigurationError::EmptyAllowList);
        }

        let branches = raw
            .split(BRANCH_SEPARATOR)
            .map(str::to_string)
            .collect::<HashSet<_>>();

        Ok(Self { branches })
    }

    /// Whether `branch` is one of the allowed branches.
    pub fn contains(&self, branch: &str) -> bool {
        self.branches.contains(branch)
    }

    /// Number of distinct allowed branches.
    pub fn len(&self) -> usize {
        self.branches.len()
    }

    /// Always false for a constructed allow-list.
    pub fn is_empty(&self) -> bool {
        self.branches.is_empty()
    }

    /// Iterate over the allowed branches in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.branches.iter().map(String::as_str)
    }
}

impl fmt::Display for AllowList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut branches = self.iter().collect::<Vec<_>>();
        branches.sort_unstable();
        write!(f, "{}", branches.join(&BRANCH_SEPARATOR.to_string()))
    }
}
