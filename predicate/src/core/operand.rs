use std::{fmt, sync::Arc};

/// Reference identifying a column used inside predicates.
///
/// The name is a `.`-separated path: the first segment names a top-level
/// column, every following segment descends into a struct field. Resolution
/// against a schema happens at evaluation time, not at construction time.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ColumnRef {
    /// Canonical dotted column path.
    pub name: Arc<str>,
}

impl ColumnRef {
    /// Creates a new column reference from a dotted path.
    #[must_use]
    pub fn new<N>(name: N) -> Self
    where
        N: Into<Arc<str>>,
    {
        Self { name: name.into() }
    }

    /// Path segments, outermost first.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.name.split('.')
    }

    /// Top-level column the path starts from.
    #[must_use]
    pub fn root(&self) -> &str {
        self.segments().next().unwrap_or_default()
    }

    /// Returns true when the path descends into a struct column.
    #[must_use]
    pub fn is_nested(&self) -> bool {
        self.name.contains('.')
    }
}

impl fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl From<&str> for ColumnRef {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ColumnRef {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

#[cfg(test)]
mod tests {
    use super::ColumnRef;

    #[test]
    fn dotted_paths_split_into_segments() {
        let column = ColumnRef::new("bbox.xmin");
        assert_eq!(column.segments().collect::<Vec<_>>(), vec!["bbox", "xmin"]);
        assert_eq!(column.root(), "bbox");
        assert!(column.is_nested());
        assert!(!ColumnRef::new("name").is_nested());
    }
}
