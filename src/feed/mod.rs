//! Feed Module
//!
//! Provides the personalized movie feed for CineFeed users.
//!
//! ## Architecture
//!
//! 1. **Store** - Read-only lookups: movie catalog, per-user genre
//!    preferences, and the directed related-user graph
//! 2. **Engine** - Score and rank the catalog for one user
//!
//! ## Algorithm Overview
//!
//! Each movie's score is the sum of three signals:
//! - Recency: a Gaussian over the release date's age in years, worth at
//!   most 1.0 for a movie released today
//! - Own preferences: the user's score for every genre the movie carries
//! - Related-user preferences: the same contribution from every user the
//!   primary user is related to, unweighted and one hop deep
//!
//! The catalog is sorted by score descending and truncated to 10 items.

pub mod engine;
pub mod store;

// Re-export the types that are actually used externally
pub use engine::{FeedEngine, FEED_SIZE};
pub use store::{FeedStore, GenrePreference, Movie, PgFeedStore, RelatedUser};
