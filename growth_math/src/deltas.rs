//! Day-over-day delta computation
//!
//! Deltas are only meaningful over a chronologically ordered series, so every
//! entry point here restores date order before looking at neighbours.

use crate::entry::{DerivedEntry, Entry};

/// Returns true when the entries are already in ascending date order
pub fn is_chronological(entries: &[Entry]) -> bool {
    entries.windows(2).all(|pair| pair[0].date <= pair[1].date)
}

/// Stable sort by date ascending. Entries sharing a date keep their input order.
pub fn sort_chronologically(entries: &[Entry]) -> Vec<Entry> {
    let mut sorted = entries.to_vec();
    if !is_chronological(&sorted) {
        sorted.sort_by_key(|entry| entry.date);
    }
    sorted
}

/// Compute the derived series for a set of observations.
///
/// The output is sorted by date; the first entry has a delta of zero and every
/// following entry carries `count[i] - count[i - 1]`.
pub fn compute(entries: &[Entry]) -> Vec<DerivedEntry> {
    let sorted = sort_chronologically(entries);
    let mut derived = Vec::with_capacity(sorted.len());
    let mut previous: Option<u64> = None;

    for entry in sorted {
        let delta = previous.map_or(0, |prev| signed_delta(entry.count, prev));
        derived.push(DerivedEntry {
            date: entry.date,
            count: entry.count,
            delta,
        });
        previous = Some(entry.count);
    }

    derived
}

/// Project a derived series back to plain observations
pub fn project(derived: &[DerivedEntry]) -> Vec<Entry> {
    derived.iter().map(DerivedEntry::entry).collect()
}

/// Net change between the first and last observation
pub fn net_change(derived: &[DerivedEntry]) -> i64 {
    derived.iter().skip(1).map(|d| d.delta).sum()
}

// Saturates at the i64 bounds instead of wrapping.
fn signed_delta(current: u64, previous: u64) -> i64 {
    if current >= previous {
        i64::try_from(current - previous).unwrap_or(i64::MAX)
    } else {
        i64::try_from(previous - current).map_or(i64::MIN, |d| -d)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series(points: &[(&str, u64)]) -> Vec<Entry> {
        points
            .iter()
            .map(|(date, count)| Entry::parse(date, *count).unwrap())
            .collect()
    }

    #[test]
    fn test_compute_known_series() {
        let entries = series(&[("2024-01-01", 100), ("2024-01-02", 150), ("2024-01-03", 130)]);
        let deltas: Vec<i64> = compute(&entries).iter().map(|d| d.delta).collect();
        assert_eq!(deltas, vec![0, 50, -20]);
    }

    #[test]
    fn test_compute_sorts_unordered_input() {
        let entries = series(&[("2024-01-03", 130), ("2024-01-01", 100), ("2024-01-02", 150)]);
        assert!(!is_chronological(&entries));

        let derived = compute(&entries);
        let dates: Vec<String> = derived.iter().map(|d| d.date.to_string()).collect();
        assert_eq!(dates, vec!["2024-01-01", "2024-01-02", "2024-01-03"]);
        assert_eq!(derived[0].delta, 0);
        assert_eq!(derived[1].delta, 50);
        assert_eq!(derived[2].delta, -20);
    }

    #[test]
    fn test_compute_ties_keep_input_order() {
        let entries = series(&[("2024-01-02", 10), ("2024-01-01", 5), ("2024-01-02", 20)]);
        let derived = compute(&entries);
        let counts: Vec<u64> = derived.iter().map(|d| d.count).collect();
        assert_eq!(counts, vec![5, 10, 20]);
        assert_eq!(derived[2].delta, 10);
    }

    #[test]
    fn test_compute_is_idempotent() {
        let entries = series(&[
            ("2024-03-05", 900),
            ("2024-03-01", 1000),
            ("2024-03-03", 1200),
            ("2024-03-02", 1100),
        ]);
        let first = compute(&entries);
        let second = compute(&project(&first));
        assert_eq!(first, second);
    }

    #[test]
    fn test_delta_invariant_holds() {
        let entries = series(&[
            ("2023-12-30", 7),
            ("2024-01-04", 0),
            ("2023-12-31", 42),
            ("2024-01-01", 41),
        ]);
        let derived = compute(&entries);
        assert_eq!(derived[0].delta, 0);
        for i in 1..derived.len() {
            assert_eq!(
                derived[i].delta,
                derived[i].count as i64 - derived[i - 1].count as i64
            );
        }
        assert_eq!(net_change(&derived), 0 - 7);
    }

    #[test]
    fn test_compute_empty_and_single() {
        assert!(compute(&[]).is_empty());
        let single = compute(&series(&[("2024-01-01", 5)]));
        assert_eq!(single.len(), 1);
        assert_eq!(single[0].delta, 0);
    }

    #[test]
    fn test_signed_delta_saturates() {
        assert_eq!(signed_delta(u64::MAX, 0), i64::MAX);
        assert_eq!(signed_delta(0, u64::MAX), i64::MIN);
        assert_eq!(signed_delta(3, 5), -2);
    }
}
