use serde::Serialize;

use crate::watched::WatchedEntry;

/// Aggregates over the watched list.
///
/// Every average is 0 for an empty list. Entries without an external rating
/// are left out of `avg_imdb_rating`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct WatchedSummary {
    pub count: usize,
    pub avg_imdb_rating: f64,
    pub avg_user_rating: f64,
    pub avg_runtime: f64,
}

impl WatchedSummary {
    pub fn from_entries(entries: &[WatchedEntry]) -> Self {
        Self {
            count: entries.len(),
            avg_imdb_rating: average(
                entries
                    .iter()
                    .filter_map(|e| e.imdb_rating)
                    .map(f64::from),
            ),
            avg_user_rating: average(entries.iter().map(|e| f64::from(e.user_rating.get()))),
            avg_runtime: average(entries.iter().map(|e| f64::from(e.runtime))),
        }
    }
}

fn average(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, n) = values
        .filter(|v| v.is_finite())
        .fold((0.0, 0usize), |(sum, n), v| (sum + v, n + 1));

    if n == 0 {
        0.0
    } else {
        sum / n as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixtures;

    #[test]
    fn test_empty_list_is_zero() {
        let summary = WatchedSummary::from_entries(&[]);
        assert_eq!(summary, WatchedSummary::default());
        assert!(!summary.avg_imdb_rating.is_nan());
    }

    #[test]
    fn test_averages() {
        let mut a = fixtures::watched_entry("tt1", "First", 8);
        a.runtime = 100;
        a.imdb_rating = Some(7.0);
        let mut b = fixtures::watched_entry("tt2", "Second", 6);
        b.runtime = 120;
        b.imdb_rating = None;

        let summary = WatchedSummary::from_entries(&[a, b]);
        assert_eq!(summary.count, 2);
        assert_eq!(summary.avg_imdb_rating, 7.0);
        assert_eq!(summary.avg_user_rating, 7.0);
        assert_eq!(summary.avg_runtime, 110.0);
    }

    #[test]
    fn test_non_finite_ratings_skipped() {
        let mut a = fixtures::watched_entry("tt1", "First", 5);
        a.imdb_rating = Some(f32::NAN);

        let summary = WatchedSummary::from_entries(&[a]);
        assert_eq!(summary.avg_imdb_rating, 0.0);
    }
}
