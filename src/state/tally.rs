// Failure counters.
// Counts occurrences by job name or failure record; counts only go up.

use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FailureTally {
    counts: BTreeMap<String, u64>,
}

impl FailureTally {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, key: impl Into<String>) {
        *self.counts.entry(key.into()).or_insert(0) += 1;
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }

    /// Entries sorted by key.
    pub fn by_name(&self) -> impl Iterator<Item = (&str, u64)> {
        self.counts.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Entries sorted by descending count, ties by key.
    pub fn by_count(&self) -> Vec<(&str, u64)> {
        let mut entries: Vec<_> = self.by_name().collect();
        entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_accumulates() {
        let mut tally = FailureTally::new();
        assert!(tally.is_empty());

        tally.record("build");
        tally.record("test");
        tally.record("build");

        assert_eq!(tally.by_name().collect::<Vec<_>>(), vec![("build", 2), ("test", 1)]);
        assert_eq!(tally.total(), 3);
    }

    #[test]
    fn test_orderings() {
        let mut tally = FailureTally::new();
        for key in ["b", "a", "c", "c", "b", "c"] {
            tally.record(key);
        }

        let names: Vec<_> = tally.by_name().map(|(k, _)| k).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
        assert_eq!(tally.by_count(), vec![("c", 3), ("b", 2), ("a", 1)]);
    }
}
