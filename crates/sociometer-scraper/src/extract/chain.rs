use std::fmt;

/// Values a strategy can produce. Blank strings do not count as found, so a
/// selector that matches an empty element falls through to the next strategy.
pub trait Extracted {
    fn is_meaningful(&self) -> bool;
}

impl Extracted for String {
    fn is_meaningful(&self) -> bool {
        !self.trim().is_empty()
    }
}

impl Extracted for u64 {
    fn is_meaningful(&self) -> bool {
        true
    }
}

impl Extracted for chrono::DateTime<chrono::Utc> {
    fn is_meaningful(&self) -> bool {
        true
    }
}

type Strategy<S, T> = Box<dyn Fn(&S) -> Option<T> + Send + Sync>;

/// Ordered fallback strategies for one field. The first strategy returning a
/// meaningful value wins; the rest are not evaluated.
pub struct FieldChain<S, T> {
    field: &'static str,
    strategies: Vec<(&'static str, Strategy<S, T>)>,
}

impl<S, T: Extracted> FieldChain<S, T> {
    #[must_use]
    pub fn new(field: &'static str) -> Self {
        Self {
            field,
            strategies: Vec::new(),
        }
    }

    /// Appends a strategy at the lowest priority so far.
    #[must_use]
    pub fn with<F>(mut self, name: &'static str, strategy: F) -> Self
    where
        F: Fn(&S) -> Option<T> + Send + Sync + 'static,
    {
        self.strategies.push((name, Box::new(strategy)));
        self
    }

    #[must_use]
    pub fn field(&self) -> &'static str {
        self.field
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }

    /// Runs strategies in priority order. `None` means every strategy came up
    /// empty.
    pub fn extract(&self, source: &S) -> Option<T> {
        for (name, strategy) in &self.strategies {
            if let Some(value) = strategy(source).filter(Extracted::is_meaningful) {
                tracing::trace!(field = self.field, strategy = name, "field extracted");
                return Some(value);
            }
        }
        tracing::trace!(field = self.field, "no strategy produced a value");
        None
    }
}

impl<S, T> fmt::Debug for FieldChain<S, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.strategies.iter().map(|(n, _)| *n).collect();
        f.debug_struct("FieldChain")
            .field("field", &self.field)
            .field("strategies", &names)
            .finish()
    }
}
