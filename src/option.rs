/// Defaults shared by every query a [`crate::Client`] runs.
#[derive(Debug, Clone)]
pub struct ClientOptions {
    pub(crate) distance: f64,
    pub(crate) unit: String,
    pub(crate) batch_size: usize,
    pub(crate) anonymous: bool,
    pub(crate) store_options: Vec<(String, String)>,
}

impl Default for ClientOptions {
    fn default() -> Self {
        ClientOptions {
            distance: 500.0,
            unit: "m".to_owned(),
            batch_size: 8192,
            anonymous: true,
            store_options: Vec::new(),
        }
    }
}

impl ClientOptions {
    /// Buffer radius for address queries that name none.
    pub fn distance(self, distance: f64) -> Self {
        ClientOptions { distance, ..self }
    }

    /// Unit of [`ClientOptions::distance`] and of per-query distances.
    pub fn unit(self, unit: impl Into<String>) -> Self {
        ClientOptions {
            unit: unit.into(),
            ..self
        }
    }

    /// Rows per record batch read from parquet.
    pub fn batch_size(self, batch_size: usize) -> Self {
        ClientOptions { batch_size, ..self }
    }

    /// Skip request signing; the public buckets need no credentials.
    pub fn anonymous(self, anonymous: bool) -> Self {
        ClientOptions { anonymous, ..self }
    }

    /// Extra object-store builder option, e.g. `("aws_endpoint", ...)`.
    pub fn store_option(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.store_options.push((key.into(), value.into()));
        self
    }

    /// Builder options for a bucket in `region`. Explicit options come last so
    /// they override the derived ones.
    pub(crate) fn store_options_for(&self, region: Option<&str>) -> Vec<(String, String)> {
        let mut options = Vec::with_capacity(self.store_options.len() + 2);
        if let Some(region) = region {
            options.push(("aws_region".to_owned(), region.to_owned()));
        }
        if self.anonymous {
            options.push(("aws_skip_signature".to_owned(), "true".to_owned()));
        }
        options.extend(self.store_options.iter().cloned());
        options
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_options_put_explicit_entries_last() {
        let options = ClientOptions::default().store_option("aws_region", "eu-west-1");
        assert_eq!(
            options.store_options_for(Some("us-west-2")),
            vec![
                ("aws_region".to_owned(), "us-west-2".to_owned()),
                ("aws_skip_signature".to_owned(), "true".to_owned()),
                ("aws_region".to_owned(), "eu-west-1".to_owned()),
            ]
        );
        assert!(ClientOptions::default()
            .anonymous(false)
            .store_options_for(None)
            .is_empty());
    }
}
