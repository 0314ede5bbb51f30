use crate::{
    error::{is_restricted_delete, StoreError},
    jwt::SessionData,
    permissions::ActionType,
    schema::{Id, RecipeTag, Tag, TagForm},
    validation::validate_tag,
};

use sqlx::{Pool, Postgres};

pub async fn create_tag(
    form: TagForm,
    session: &SessionData,
    pool: &Pool<Postgres>,
) -> Result<Tag, StoreError> {
    session.authenticate(ActionType::ManageReferenceData)?;
    validate_tag(&form)?;

    let tag: Tag =
        sqlx::query_as("INSERT INTO tags (name, color, slug) VALUES ($1, $2, $3) RETURNING *")
            .bind(form.name.trim())
            .bind(form.color.to_uppercase())
            .bind(form.slug)
            .fetch_one(pool)
            .await?;

    Ok(tag)
}

pub async fn get_tag(id: Id, pool: &Pool<Postgres>) -> Result<Tag, StoreError> {
    let tag: Option<Tag> = sqlx::query_as("SELECT * FROM tags WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    tag.ok_or(StoreError::NotFound("tag"))
}

pub async fn list_tags(pool: &Pool<Postgres>) -> Result<Vec<Tag>, StoreError> {
    let list: Vec<Tag> = sqlx::query_as("SELECT * FROM tags ORDER BY name")
        .fetch_all(pool)
        .await?;

    Ok(list)
}

pub async fn update_tag(
    id: Id,
    form: TagForm,
    session: &SessionData,
    pool: &Pool<Postgres>,
) -> Result<Tag, StoreError> {
    session.authenticate(ActionType::ManageReferenceData)?;
    validate_tag(&form)?;

    let tag: Option<Tag> = sqlx::query_as(
        "UPDATE tags SET name = $1, color = $2, slug = $3 WHERE id = $4 RETURNING *",
    )
    .bind(form.name.trim())
    .bind(form.color.to_uppercase())
    .bind(form.slug)
    .bind(id)
    .fetch_optional(pool)
    .await?;

    tag.ok_or(StoreError::NotFound("tag"))
}

/// Tags still attached to a recipe can't be removed.
pub async fn delete_tag(id: Id, session: &SessionData, pool: &Pool<Postgres>) -> Result<(), StoreError> {
    session.authenticate(ActionType::ManageReferenceData)?;

    let result = sqlx::query("DELETE FROM tags WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await;

    match result {
        Ok(done) if done.rows_affected() == 0 => Err(StoreError::NotFound("tag")),
        Ok(_) => Ok(()),
        Err(e) if is_restricted_delete(&e) => Err(StoreError::invalid(
            "tag",
            "The tag is used by recipes and cannot be deleted",
        )),
        Err(e) => Err(e.into()),
    }
}

/// Tags of every listed recipe, in one query.
pub async fn list_recipe_tags(
    recipe_ids: &[Id],
    pool: &Pool<Postgres>,
) -> Result<Vec<RecipeTag>, StoreError> {
    let list: Vec<RecipeTag> = sqlx::query_as(
        "
        SELECT tr.recipe_id, t.id, t.name, t.color, t.slug
        FROM tag_recipes tr
        INNER JOIN tags t ON t.id = tr.tag_id
        WHERE tr.recipe_id = ANY($1)
        ORDER BY t.name
    ",
    )
    .bind(recipe_ids)
    .fetch_all(pool)
    .await?;

    Ok(list)
}

/// Ids among `ids` that don't name an existing tag.
pub async fn missing_tags(ids: &[Id], pool: &Pool<Postgres>) -> Result<Vec<Id>, StoreError> {
    let found: Vec<(Id,)> = sqlx::query_as("SELECT id FROM tags WHERE id = ANY($1)")
        .bind(ids)
        .fetch_all(pool)
        .await?;

    Ok(ids
        .iter()
        .copied()
        .filter(|id| !found.iter().any(|(found,)| found == id))
        .collect())
}
