use std::collections::HashSet;

use crate::{
    error::StoreError,
    pagination::{Page, PageRequest},
    schema::{Id, RelationKind, RelationTarget, User, UserRow},
};

use sqlx::{Pool, Postgres};

async fn target_exists(
    target: RelationTarget,
    id: Id,
    pool: &Pool<Postgres>,
) -> Result<bool, StoreError> {
    let query = match target {
        RelationTarget::Recipe => "SELECT EXISTS (SELECT 1 FROM recipes WHERE id = $1)",
        RelationTarget::User => "SELECT EXISTS (SELECT 1 FROM users WHERE id = $1)",
    };

    let row: (bool,) = sqlx::query_as(query).bind(id).fetch_one(pool).await?;

    Ok(row.0)
}

async fn require_target(kind: RelationKind, id: Id, pool: &Pool<Postgres>) -> Result<(), StoreError> {
    let target = kind.target();
    if !target_exists(target, id, pool).await? {
        return Err(StoreError::NotFound(target.entity()));
    }
    Ok(())
}

/// Adds `(subject, target)` to the relation. The unique constraint decides
/// whether the pair already existed, so concurrent adds can't both succeed.
pub async fn add_relation(
    kind: RelationKind,
    subject: Id,
    target: Id,
    pool: &Pool<Postgres>,
) -> Result<(), StoreError> {
    require_target(kind, target, pool).await?;

    if kind == RelationKind::Subscription && subject == target {
        return Err(StoreError::SelfFollowForbidden);
    }

    let result = sqlx::query(&format!(
        "INSERT INTO {} (user_id, {}) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        kind.table(),
        kind.target_column()
    ))
    .bind(subject)
    .bind(target)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(StoreError::DuplicateRelation(kind));
    }

    log::debug!("User {subject} added {target} to {kind}");

    Ok(())
}

pub async fn remove_relation(
    kind: RelationKind,
    subject: Id,
    target: Id,
    pool: &Pool<Postgres>,
) -> Result<(), StoreError> {
    require_target(kind, target, pool).await?;

    let result = sqlx::query(&format!(
        "DELETE FROM {} WHERE user_id = $1 AND {} = $2",
        kind.table(),
        kind.target_column()
    ))
    .bind(subject)
    .bind(target)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(StoreError::RelationNotFound(kind));
    }

    log::debug!("User {subject} removed {target} from {kind}");

    Ok(())
}

/// The subset of `candidates` that `subject` is related to.
pub async fn related_targets(
    kind: RelationKind,
    subject: Id,
    candidates: &[Id],
    pool: &Pool<Postgres>,
) -> Result<HashSet<Id>, StoreError> {
    if candidates.is_empty() {
        return Ok(HashSet::new());
    }

    let column = kind.target_column();
    let rows: Vec<(Id,)> = sqlx::query_as(&format!(
        "SELECT {column} FROM {} WHERE user_id = $1 AND {column} = ANY($2)",
        kind.table()
    ))
    .bind(subject)
    .bind(candidates)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(|row| row.0).collect())
}

/// Authors followed by `subject`, most recent subscription first.
pub async fn list_subscriptions(
    subject: Id,
    request: PageRequest,
    pool: &Pool<Postgres>,
) -> Result<Page<User>, StoreError> {
    let rows: Vec<UserRow> = sqlx::query_as(
        "
        SELECT u.*, COUNT(*) OVER() AS count
        FROM subscriptions s
        INNER JOIN users u ON u.id = s.author_id
        WHERE s.user_id = $1
        ORDER BY s.id DESC
        LIMIT $2 OFFSET $3
    ",
    )
    .bind(subject)
    .bind(request.limit)
    .bind(request.offset())
    .fetch_all(pool)
    .await?;

    let total_count = rows.first().map(|row| row.count).unwrap_or(0);
    let rows = rows.into_iter().map(|row| row.user).collect();

    Page::checked(rows, total_count, request)
}
