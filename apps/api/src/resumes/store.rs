//! Owner-scoped queries over `resumes`. Every statement filters on `user_id`, so
//! a record owned by someone else behaves exactly like a missing one.

use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::resume::ResumeRecord;

pub async fn list_for_owner(pool: &PgPool, owner: Uuid) -> Result<Vec<ResumeRecord>, sqlx::Error> {
    sqlx::query_as::<_, ResumeRecord>(
        r#"
        SELECT id, title, data, created_at, updated_at
        FROM resumes
        WHERE user_id = $1
        ORDER BY updated_at DESC
        "#,
    )
    .bind(owner)
    .fetch_all(pool)
    .await
}

pub async fn find(pool: &PgPool, owner: Uuid, id: Uuid) -> Result<Option<ResumeRecord>, sqlx::Error> {
    sqlx::query_as::<_, ResumeRecord>(
        r#"
        SELECT id, title, data, created_at, updated_at
        FROM resumes
        WHERE id = $1 AND user_id = $2
        LIMIT 1
        "#,
    )
    .bind(id)
    .bind(owner)
    .fetch_optional(pool)
    .await
}

pub async fn create(
    pool: &PgPool,
    owner: Uuid,
    title: &str,
    data: &Value,
) -> Result<ResumeRecord, sqlx::Error> {
    sqlx::query_as::<_, ResumeRecord>(
        r#"
        INSERT INTO resumes (user_id, title, data)
        VALUES ($1, $2, $3)
        RETURNING id, title, data, created_at, updated_at
        "#,
    )
    .bind(owner)
    .bind(title)
    .bind(data)
    .fetch_one(pool)
    .await
}

/// Replaces title and data and bumps both `updated_at` and `data.updatedAt`
/// past their stored values. `None` when no such record.
pub async fn update(
    pool: &PgPool,
    owner: Uuid,
    id: Uuid,
    title: &str,
    data: &Value,
) -> Result<Option<ResumeRecord>, sqlx::Error> {
    sqlx::query_as::<_, ResumeRecord>(
        r#"
        UPDATE resumes
        SET title = $3,
            data = jsonb_set(
                $4,
                '{updatedAt}',
                to_jsonb(GREATEST(
                    COALESCE(($4->>'updatedAt')::bigint, 0),
                    COALESCE((data->>'updatedAt')::bigint, 0) + 1
                ))
            ),
            updated_at = GREATEST(now(), updated_at + interval '1 microsecond')
        WHERE id = $1 AND user_id = $2
        RETURNING id, title, data, created_at, updated_at
        "#,
    )
    .bind(id)
    .bind(owner)
    .bind(title)
    .bind(data)
    .fetch_optional(pool)
    .await
}

/// Number of rows removed (0 or 1).
pub async fn delete(pool: &PgPool, owner: Uuid, id: Uuid) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM resumes WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(owner)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}
