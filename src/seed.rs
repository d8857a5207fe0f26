//! Seed Data Loading
//!
//! One-time bulk ingestion of the movie catalog, genre preferences, and
//! related-user edges from JSON files into PostgreSQL. Runs at startup,
//! after migrations and before the API server accepts requests.
//!
//! The loader is idempotent across restarts: a non-empty catalog table
//! short-circuits the whole load. Duplicate preference rows inside a seed
//! file are preserved, they are meaningful data (duplicates sum during
//! scoring).

use serde::de::DeserializeOwned;
use sqlx::PgPool;
use std::path::Path;
use tracing::info;

use crate::config::SeedConfig;
use crate::error::{Error, Result};
use crate::feed::{GenrePreference, Movie, RelatedUser};

/// Counts of inserted seed records
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedSummary {
    pub movies: usize,
    pub preferences: usize,
    pub related_users: usize,
}

/// Load seed data if enabled and not already present
///
/// Returns `None` when seeding is disabled or the catalog is already
/// populated. All inserts run inside a single transaction; a failure rolls
/// the whole load back.
pub async fn load_seed_data(pool: &PgPool, config: &SeedConfig) -> Result<Option<SeedSummary>> {
    if !config.enabled {
        info!("Seeding disabled, skipping");
        return Ok(None);
    }

    let existing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM movies")
        .fetch_one(pool)
        .await?;

    if existing > 0 {
        info!(
            "Catalog already contains {} movies, skipping seed load",
            existing
        );
        return Ok(None);
    }

    let movies: Vec<Movie> = read_seed_file(&config.dir.join("movies.json")).await?;
    let preferences: Vec<GenrePreference> =
        read_seed_file(&config.dir.join("preferences.json")).await?;
    let related_users: Vec<RelatedUser> =
        read_seed_file(&config.dir.join("related_users.json")).await?;

    validate_movies(&movies)?;
    validate_preferences(&preferences)?;
    validate_related_users(&related_users)?;

    let mut tx = pool.begin().await?;

    for movie in &movies {
        sqlx::query(
            r#"
            INSERT INTO movies (id, genres, release_date)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(&movie.id)
        .bind(&movie.genres)
        .bind(movie.release_date)
        .execute(&mut *tx)
        .await?;
    }

    for pref in &preferences {
        sqlx::query(
            r#"
            INSERT INTO genre_preferences (user_id, genre, score)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(&pref.user_id)
        .bind(&pref.genre)
        .bind(pref.score)
        .execute(&mut *tx)
        .await?;
    }

    for edge in &related_users {
        sqlx::query(
            r#"
            INSERT INTO related_users (user_id, related_user_id)
            VALUES ($1, $2)
            "#,
        )
        .bind(&edge.user_id)
        .bind(&edge.related_user_id)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;

    let summary = SeedSummary {
        movies: movies.len(),
        preferences: preferences.len(),
        related_users: related_users.len(),
    };

    info!(
        "🌱 Seed data loaded: {} movies, {} preferences, {} related-user edges",
        summary.movies, summary.preferences, summary.related_users
    );

    Ok(Some(summary))
}

/// Read and parse one JSON seed file
async fn read_seed_file<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let file = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    let contents = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| Error::seed_with_source(file.clone(), "failed to read seed file", e))?;

    serde_json::from_str(&contents)
        .map_err(|e| Error::seed_with_source(file, "failed to parse seed file", e))
}

fn validate_movies(movies: &[Movie]) -> Result<()> {
    for movie in movies {
        if movie.id.is_empty() {
            return Err(Error::seed("movies.json", "movie with empty id"));
        }
        if movie.genres.iter().any(|g| g.is_empty()) {
            return Err(Error::seed(
                "movies.json",
                format!("movie '{}' has an empty genre tag", movie.id),
            ));
        }
    }
    Ok(())
}

fn validate_preferences(preferences: &[GenrePreference]) -> Result<()> {
    for pref in preferences {
        if pref.user_id.is_empty() || pref.genre.is_empty() {
            return Err(Error::seed(
                "preferences.json",
                "preference with empty user id or genre",
            ));
        }
        if !pref.score.is_finite() {
            return Err(Error::seed(
                "preferences.json",
                format!(
                    "preference ({}, {}) has a non-finite score",
                    pref.user_id, pref.genre
                ),
            ));
        }
    }
    Ok(())
}

fn validate_related_users(related_users: &[RelatedUser]) -> Result<()> {
    for edge in related_users {
        if edge.user_id.is_empty() || edge.related_user_id.is_empty() {
            return Err(Error::seed(
                "related_users.json",
                "relation edge with empty user id",
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::io::Write;

    #[tokio::test]
    async fn test_read_seed_file_parses_movies() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"id": "m1", "genres": ["Action"], "release_date": "2024-03-01"}}]"#
        )
        .unwrap();

        let movies: Vec<Movie> = read_seed_file(file.path()).await.unwrap();
        assert_eq!(movies.len(), 1);
        assert_eq!(movies[0].id, "m1");
        assert_eq!(movies[0].genres, vec!["Action".to_string()]);
        assert_eq!(
            movies[0].release_date,
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
        );
    }

    #[tokio::test]
    async fn test_read_seed_file_rejects_missing_fields() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"[{{"id": "m1", "genres": ["Action"]}}]"#).unwrap();

        let result: Result<Vec<Movie>> = read_seed_file(file.path()).await;
        assert!(matches!(result, Err(Error::Seed { .. })));
    }

    #[tokio::test]
    async fn test_read_seed_file_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result: Result<Vec<Movie>> = read_seed_file(&dir.path().join("movies.json")).await;
        assert!(matches!(result, Err(Error::Seed { .. })));
    }

    #[test]
    fn test_validate_movies_rejects_empty_id() {
        let movies = vec![Movie {
            id: String::new(),
            genres: vec!["Drama".to_string()],
            release_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        }];
        assert!(validate_movies(&movies).is_err());
    }

    #[test]
    fn test_validate_preferences_rejects_non_finite_score() {
        let prefs = vec![GenrePreference {
            user_id: "u1".to_string(),
            genre: "Drama".to_string(),
            score: f64::NAN,
        }];
        assert!(validate_preferences(&prefs).is_err());
    }

    #[test]
    fn test_validate_related_users_allows_self_loops() {
        let edges = vec![RelatedUser {
            user_id: "u1".to_string(),
            related_user_id: "u1".to_string(),
        }];
        assert!(validate_related_users(&edges).is_ok());
    }
}
