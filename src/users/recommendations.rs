//! Partner matching.
//!
//! A candidate matches when they are learning one of the requester's native
//! languages, or natively speak one of the requester's learning languages.
//! The match score is the number of such overlaps.

use std::collections::HashSet;

use serde::Serialize;
use sqlx::SqlitePool;

use super::db::{self, UserProfile};

const RECOMMENDATION_LIMIT: usize = 20;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub user: UserProfile,
    pub match_score: i64,
}

/// Overlap count between a candidate's languages and the requester's.
pub fn match_score(
    candidate_native: &[String],
    candidate_learning: &[String],
    my_native: &HashSet<String>,
    my_learning: &HashSet<String>,
) -> i64 {
    let learning_my_native = candidate_learning
        .iter()
        .filter(|id| my_native.contains(*id))
        .count();
    let native_in_my_learning = candidate_native
        .iter()
        .filter(|id| my_learning.contains(*id))
        .count();
    (learning_my_native + native_in_my_learning) as i64
}

/// Compatible partners for `user_id`, best match first.
///
/// At most 20 candidates are taken in store order before sorting; the sort
/// is stable, so ties keep store order.
pub async fn get_recommendations(
    pool: &SqlitePool,
    user_id: &str,
) -> Result<Vec<Recommendation>, sqlx::Error> {
    let my_native: HashSet<String> = db::native_language_ids(pool, user_id)
        .await?
        .into_iter()
        .collect();
    let my_learning: HashSet<String> = db::learning_language_ids(pool, user_id)
        .await?
        .into_iter()
        .collect();

    let mut matched = Vec::new();
    for candidate in db::list_users(pool).await? {
        if candidate.id == user_id {
            continue;
        }
        let native = db::native_language_ids(pool, &candidate.id).await?;
        let learning = db::learning_language_ids(pool, &candidate.id).await?;
        let score = match_score(&native, &learning, &my_native, &my_learning);
        if score == 0 {
            continue;
        }
        matched.push(Recommendation {
            user: db::load_profile(pool, &candidate).await?,
            match_score: score,
        });
        if matched.len() == RECOMMENDATION_LIMIT {
            break;
        }
    }

    matched.sort_by(|a, b| b.match_score.cmp(&a.match_score));
    Ok(matched)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(ids: &[&str]) -> HashSet<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    fn vecs(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn reciprocal_pair_scores_two() {
        // I'm a native English speaker learning Spanish; the candidate is the mirror.
        let my_native = set(&["en"]);
        let my_learning = set(&["es"]);
        let score = match_score(&vecs(&["es"]), &vecs(&["en"]), &my_native, &my_learning);
        assert_eq!(score, 2);
    }

    #[test]
    fn one_way_overlap_scores_one() {
        let my_native = set(&["en"]);
        let my_learning = set(&["es"]);
        let score = match_score(&vecs(&["fr"]), &vecs(&["en"]), &my_native, &my_learning);
        assert_eq!(score, 1);
    }

    #[test]
    fn disjoint_languages_score_zero() {
        let my_native = set(&["en"]);
        let my_learning = set(&["es"]);
        let score = match_score(&vecs(&["de"]), &vecs(&["fr"]), &my_native, &my_learning);
        assert_eq!(score, 0);
    }

    #[test]
    fn multiple_overlaps_accumulate() {
        let my_native = set(&["en", "fr"]);
        let my_learning = set(&["es", "de"]);
        let score = match_score(
            &vecs(&["es", "de"]),
            &vecs(&["en", "fr"]),
            &my_native,
            &my_learning,
        );
        assert_eq!(score, 4);
    }
}
