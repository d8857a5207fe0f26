//! Feed Ranking Engine
//!
//! Core algorithm for the personalized movie feed. Each catalog item is
//! scored as the sum of a Gaussian recency score and the genre-preference
//! contributions of the user and of every user related to them; the catalog
//! is then sorted by score and truncated to the feed size.
//!
//! Related-user preference lookups are gathered once per call, issued
//! concurrently, and all awaited before any item is scored, so every
//! contribution is folded in before the sort.

use chrono::{NaiveDate, Utc};
use futures::future;
use std::cmp::Ordering;
use std::sync::Arc;
use tracing::debug;

use super::store::{FeedStore, GenrePreference, Movie};
use crate::error::Result;

/// Maximum number of items in a feed
pub const FEED_SIZE: usize = 10;

/// Days per year, accounting for leap years
const DAYS_PER_YEAR: f64 = 365.25;

/// Ephemeral (movie, score) pair produced while ranking
struct ScoredMovie {
    movie: Movie,
    score: f64,
}

/// Main feed ranking engine
#[derive(Clone)]
pub struct FeedEngine {
    store: Arc<dyn FeedStore>,
}

impl FeedEngine {
    pub fn new(store: Arc<dyn FeedStore>) -> Self {
        Self { store }
    }

    /// Rank the catalog for a user and return the top [`FEED_SIZE`] movies
    ///
    /// An unknown user id is not an error: it ranks with empty preference
    /// and relation sets, i.e. purely by recency. Any storage lookup
    /// failure aborts the whole call; no partial ranking is returned.
    pub async fn rank(&self, user_id: &str) -> Result<Vec<Movie>> {
        let own = self.store.preferences(user_id).await?;
        let edges = self.store.related_users(user_id).await?;

        // Fan out one preference lookup per relation edge. Every lookup
        // must resolve before any item score is finalized.
        let related = future::try_join_all(
            edges
                .iter()
                .map(|edge| self.store.preferences(&edge.related_user_id)),
        )
        .await?;

        let mut combined = own;
        combined.extend(related.into_iter().flatten());

        let catalog = self.store.catalog().await?;
        let today = Utc::now().date_naive();

        debug!(
            user_id,
            preferences = combined.len(),
            relations = edges.len(),
            catalog = catalog.len(),
            "Scoring catalog"
        );

        let mut scored: Vec<ScoredMovie> = catalog
            .into_iter()
            .map(|movie| {
                let score = score_movie(&movie, &combined, today);
                ScoredMovie { movie, score }
            })
            .collect();

        scored.sort_unstable_by(|a, b| {
            b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal)
        });
        scored.truncate(FEED_SIZE);

        Ok(scored.into_iter().map(|s| s.movie).collect())
    }
}

/// Total relevance score for one movie
///
/// Every preference whose genre is contained in the movie's genre set
/// contributes its score once; duplicate preference rows each contribute.
fn score_movie(movie: &Movie, preferences: &[GenrePreference], today: NaiveDate) -> f64 {
    let preference_score: f64 = preferences
        .iter()
        .filter(|p| movie.genres.iter().any(|g| g == &p.genre))
        .map(|p| p.score)
        .sum();

    time_score(age_years(movie.release_date, today)) + preference_score
}

/// Gaussian recency score, centered on "released today"
///
/// Bounded in (0, 1], reaching 1 only at age 0, and symmetric for past
/// and future release dates.
fn time_score(age_years: f64) -> f64 {
    (-(age_years * age_years) / 2.0).exp()
}

/// Signed age of a release date in years; negative for future dates
fn age_years(release_date: NaiveDate, today: NaiveDate) -> f64 {
    today.signed_duration_since(release_date).num_days() as f64 / DAYS_PER_YEAR
}

#[cfg(test)]
mod tests {
    use super::*;

    fn movie(id: &str, genres: &[&str], release_date: NaiveDate) -> Movie {
        Movie {
            id: id.to_string(),
            genres: genres.iter().map(|g| g.to_string()).collect(),
            release_date,
        }
    }

    fn preference(user_id: &str, genre: &str, score: f64) -> GenrePreference {
        GenrePreference {
            user_id: user_id.to_string(),
            genre: genre.to_string(),
            score,
        }
    }

    #[test]
    fn test_time_score_peaks_at_zero() {
        assert_eq!(time_score(0.0), 1.0);
        assert!(time_score(0.5) < 1.0);
        assert!(time_score(0.5) > 0.0);
    }

    #[test]
    fn test_time_score_symmetric() {
        for age in [0.25, 1.0, 3.0, 10.0] {
            assert_eq!(time_score(age), time_score(-age));
        }
    }

    #[test]
    fn test_time_score_decays_with_age() {
        assert!(time_score(1.0) > time_score(2.0));
        assert!(time_score(2.0) > time_score(10.0));
    }

    #[test]
    fn test_age_years_signed() {
        let today = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        assert_eq!(age_years(today, today), 0.0);
        assert!(age_years(NaiveDate::from_ymd_opt(2020, 6, 1).unwrap(), today) > 0.0);
        assert!(age_years(NaiveDate::from_ymd_opt(2030, 6, 1).unwrap(), today) < 0.0);
    }

    #[test]
    fn test_score_without_preferences_is_time_only() {
        let today = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        let m = movie("m1", &["Action"], today);
        assert_eq!(score_movie(&m, &[], today), 1.0);
    }

    #[test]
    fn test_matching_preference_adds_exactly_its_score() {
        let today = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        let m = movie("m1", &["Action", "Thriller"], today);

        let base = score_movie(&m, &[], today);
        let with_pref = score_movie(&m, &[preference("u1", "Action", 5.0)], today);

        assert_eq!(with_pref - base, 5.0);
    }

    #[test]
    fn test_non_matching_preference_does_not_contribute() {
        let today = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        let m = movie("m1", &["Action"], today);

        let score = score_movie(&m, &[preference("u1", "Drama", 5.0)], today);
        assert_eq!(score, 1.0);
    }

    #[test]
    fn test_duplicate_preferences_both_contribute() {
        let today = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        let m = movie("m1", &["Action"], today);
        let prefs = vec![
            preference("u1", "Action", 2.0),
            preference("u1", "Action", 3.0),
        ];

        assert_eq!(score_movie(&m, &prefs, today), 1.0 + 5.0);
    }

    #[test]
    fn test_duplicated_genre_on_movie_counts_once() {
        let today = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        let m = movie("m1", &["Action", "Action"], today);

        let score = score_movie(&m, &[preference("u1", "Action", 4.0)], today);
        assert_eq!(score, 1.0 + 4.0);
    }

    #[test]
    fn test_old_release_scores_near_zero_without_preferences() {
        let today = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        let m = movie("m2", &["Drama"], NaiveDate::from_ymd_opt(2015, 6, 1).unwrap());

        // Ten years out the Gaussian is exp(-50), effectively zero
        assert!(score_movie(&m, &[], today) < 1e-20);
    }
}
