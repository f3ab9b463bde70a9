use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::Row;
use uuid::Uuid;

use crate::db::DatabaseProxy;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MasteryRecord {
    pub user_id: String,
    pub topic_id: String,
    pub mastery_level: f64,
    pub questions_attempted: i64,
    pub questions_correct: i64,
    pub last_attempted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreakRecord {
    pub user_id: String,
    pub current_streak: i64,
    pub longest_streak: i64,
    pub last_activity_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub user_id: String,
    pub username: Option<String>,
    pub full_name: Option<String>,
    pub avatar_url: Option<String>,
    pub avg_mastery: f64,
}

pub async fn select_mastery(
    proxy: &DatabaseProxy,
    user_id: Uuid,
    topic_id: Uuid,
) -> Result<Option<MasteryRecord>, sqlx::Error> {
    let row = sqlx::query(
        r#"
        SELECT "mastery_level"::float8 AS "mastery_level",
               "questions_attempted"::int8 AS "questions_attempted",
               "questions_correct"::int8 AS "questions_correct",
               "last_attempted_at"
        FROM "user_mastery"
        WHERE "user_id" = $1 AND "topic_id" = $2
        "#,
    )
    .bind(user_id)
    .bind(topic_id)
    .fetch_optional(proxy.pool())
    .await?;

    row.map(|r| -> Result<MasteryRecord, sqlx::Error> {
        Ok(MasteryRecord {
            user_id: user_id.to_string(),
            topic_id: topic_id.to_string(),
            mastery_level: r.try_get("mastery_level")?,
            questions_attempted: r.try_get("questions_attempted")?,
            questions_correct: r.try_get("questions_correct")?,
            last_attempted_at: r.try_get("last_attempted_at")?,
        })
    })
    .transpose()
}

/// Invokes the `update_mastery_level` stored procedure and returns the new level.
pub async fn call_update_mastery_level(
    proxy: &DatabaseProxy,
    user_id: Uuid,
    topic_id: Uuid,
    is_correct: bool,
) -> Result<f64, sqlx::Error> {
    sqlx::query_scalar::<_, f64>(
        r#"SELECT update_mastery_level(user_uuid => $1, topic_uuid => $2, is_correct => $3)::float8"#,
    )
    .bind(user_id)
    .bind(topic_id)
    .bind(is_correct)
    .fetch_one(proxy.pool())
    .await
}

pub async fn call_update_user_streak(proxy: &DatabaseProxy, user_id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query(r#"SELECT update_user_streak(user_uuid => $1)"#)
        .bind(user_id)
        .execute(proxy.pool())
        .await?;
    Ok(())
}

pub async fn select_streak(
    proxy: &DatabaseProxy,
    user_id: Uuid,
) -> Result<Option<StreakRecord>, sqlx::Error> {
    let row = sqlx::query(
        r#"
        SELECT "current_streak"::int8 AS "current_streak",
               "longest_streak"::int8 AS "longest_streak",
               "last_activity_date"
        FROM "user_streaks"
        WHERE "user_id" = $1
        "#,
    )
    .bind(user_id)
    .fetch_optional(proxy.pool())
    .await?;

    row.map(|r| -> Result<StreakRecord, sqlx::Error> {
        Ok(StreakRecord {
            user_id: user_id.to_string(),
            current_streak: r.try_get("current_streak")?,
            longest_streak: r.try_get("longest_streak")?,
            last_activity_date: r.try_get("last_activity_date")?,
        })
    })
    .transpose()
}

/// Average mastery per profile, highest first. Profiles without mastery rows count as 0.
pub async fn select_leaderboard(
    proxy: &DatabaseProxy,
    limit: i64,
) -> Result<Vec<LeaderboardEntry>, sqlx::Error> {
    let rows = sqlx::query(
        r#"
        SELECT p."user_id"::text AS "user_id",
               p."username",
               p."full_name",
               COALESCE(p."avatar_url", p."avatar") AS "avatar_url",
               COALESCE(AVG(m."mastery_level"), 0)::float8 AS "avg_mastery"
        FROM "profiles" p
        LEFT JOIN "user_mastery" m ON m."user_id" = p."user_id"
        GROUP BY p."user_id", p."username", p."full_name", p."avatar_url", p."avatar"
        ORDER BY "avg_mastery" DESC, p."username" ASC NULLS LAST
        LIMIT $1
        "#,
    )
    .bind(limit)
    .fetch_all(proxy.pool())
    .await?;

    rows.into_iter()
        .map(|r| -> Result<LeaderboardEntry, sqlx::Error> {
            Ok(LeaderboardEntry {
                user_id: r.try_get("user_id")?,
                username: r.try_get("username")?,
                full_name: r.try_get("full_name")?,
                avatar_url: r.try_get("avatar_url")?,
                avg_mastery: r.try_get("avg_mastery")?,
            })
        })
        .collect()
}
