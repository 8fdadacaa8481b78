//! Free text filtering over the full record set.
//!
//! The query is matched case-insensitive against every field of a record,
//! not only the displayed columns.

use rayon::prelude::*;
use tracing::trace;

use crate::schema::Record;

/// Indices of the records matching `query`, in their original order.
///
/// An empty query selects every record. The scan runs over all fields of
/// each record in parallel chunks; the indexed collect keeps the result
/// stable.
pub fn filter(records: &[Record], query: &str) -> Vec<usize> {
    if query.is_empty() {
        return (0..records.len()).collect();
    }

    let needle = query.to_lowercase();
    let matches: Vec<usize> = records
        .par_iter()
        .enumerate()
        .filter(|(_, record)| record_matches(record, &needle))
        .map(|(idx, _)| idx)
        .collect();

    trace!(
        "Filter \"{}\" matched {} of {} records",
        query,
        matches.len(),
        records.len()
    );
    matches
}

fn record_matches(record: &Record, needle: &str) -> bool {
    record
        .values()
        .any(|value| value.to_lowercase().contains(needle))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(pairs: &[(&str, &str)]) -> Record {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn sample() -> Vec<Record> {
        vec![
            record(&[("name", "Jones, B."), ("city", "Berlin")]),
            record(&[("name", "Miller, C."), ("city", "Madrid")]),
            record(&[("name", "Smith, A."), ("city", "Lisbon")]),
        ]
    }

    #[test]
    fn empty_query_is_identity() {
        let records = sample();
        assert_eq!(filter(&records, ""), vec![0, 1, 2]);
    }

    #[test]
    fn match_is_case_insensitive() {
        let records = sample();
        assert_eq!(filter(&records, "smith"), vec![2]);
        assert_eq!(filter(&records, "SMITH"), vec![2]);
    }

    #[test]
    fn result_is_an_ordered_subsequence() {
        let records = sample();
        // "i" appears in several fields across records
        let hits = filter(&records, "i");
        assert!(hits.windows(2).all(|w| w[0] < w[1]));
        for idx in &hits {
            assert!(*idx < records.len());
        }
    }

    #[test]
    fn matches_any_field_not_only_displayed_ones() {
        let records = sample();
        assert_eq!(filter(&records, "madrid"), vec![1]);
    }

    #[test]
    fn records_with_missing_fields_do_not_panic() {
        let records = vec![record(&[]), record(&[("name", "Smith, A.")])];
        assert_eq!(filter(&records, "smith"), vec![1]);
    }
}
