//! Feed Storage Access
//!
//! Read-only lookups the ranking engine depends on: the movie catalog,
//! per-user genre preferences, and the directed related-user graph.
//! The trait seam keeps the engine testable without a running database.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::error::Result;

/// A catalog entry
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Movie {
    pub id: String,
    /// Genre tags; matching treats this as a set (listing a genre twice
    /// does not double a preference's contribution)
    pub genres: Vec<String>,
    pub release_date: NaiveDate,
}

/// A user's affinity score for one genre
///
/// Multiple rows per (user, genre) are allowed; each contributes
/// independently when scoring.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct GenrePreference {
    pub user_id: String,
    pub genre: String,
    pub score: f64,
}

/// A directed relation edge between two users
///
/// Not necessarily symmetric; self-loops are not excluded.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct RelatedUser {
    pub user_id: String,
    pub related_user_id: String,
}

/// Read-only storage collaborator for the feed engine
#[async_trait]
pub trait FeedStore: Send + Sync {
    /// Fetch the full movie catalog
    async fn catalog(&self) -> Result<Vec<Movie>>;

    /// Fetch all genre preferences for a user (empty if none)
    async fn preferences(&self, user_id: &str) -> Result<Vec<GenrePreference>>;

    /// Fetch all outgoing relation edges for a user (empty if none)
    async fn related_users(&self, user_id: &str) -> Result<Vec<RelatedUser>>;
}

/// PostgreSQL-backed store
#[derive(Clone)]
pub struct PgFeedStore {
    pool: PgPool,
}

impl PgFeedStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FeedStore for PgFeedStore {
    async fn catalog(&self) -> Result<Vec<Movie>> {
        let movies = sqlx::query_as::<_, Movie>(
            r#"
            SELECT id, genres, release_date
            FROM movies
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(movies)
    }

    async fn preferences(&self, user_id: &str) -> Result<Vec<GenrePreference>> {
        let prefs = sqlx::query_as::<_, GenrePreference>(
            r#"
            SELECT user_id, genre, score
            FROM genre_preferences
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(prefs)
    }

    async fn related_users(&self, user_id: &str) -> Result<Vec<RelatedUser>> {
        let edges = sqlx::query_as::<_, RelatedUser>(
            r#"
            SELECT user_id, related_user_id
            FROM related_users
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(edges)
    }
}
