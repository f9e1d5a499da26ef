use std::{fmt, sync::Arc};

/// Allow-list of release (or type) identifiers, oldest first.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReleaseCatalog {
    entries: Arc<[String]>,
}

impl ReleaseCatalog {
    /// Builds a catalog from entries given oldest first.
    pub fn new<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            entries: entries.into_iter().map(Into::into).collect(),
        }
    }

    /// Parses a line-delimited allow-list.
    ///
    /// Lines are trimmed of spaces and `/`, a leading `dt=` or `type=` is
    /// dropped, and blank lines are skipped.
    pub fn parse(text: &str) -> Self {
        Self::new(text.lines().filter_map(parse_entry))
    }

    /// True when `entry` is allowed.
    pub fn contains(&self, entry: &str) -> bool {
        self.entries.iter().any(|known| known == entry)
    }

    /// Last entry of the list.
    pub fn latest(&self) -> Option<&str> {
        self.entries.last().map(String::as_str)
    }

    /// Entries, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when there are no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Display for ReleaseCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.entries.join(", "))
    }
}

fn parse_entry(line: &str) -> Option<&str> {
    let line = line
        .trim_start_matches('\u{feff}')
        .trim_matches(|c: char| matches!(c, ' ' | '\n' | '\r' | '/'));
    let line = line
        .strip_prefix("dt=")
        .or_else(|| line.strip_prefix("type="))
        .unwrap_or(line);
    (!line.is_empty()).then_some(line)
}
