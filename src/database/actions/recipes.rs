use crate::{
    error::StoreError,
    filters::RecipeFilter,
    jwt::SessionData,
    media::image::ImageStore,
    pagination::{Page, PageRequest},
    permissions::ActionType,
    schema::{Id, IngredientAmount, Recipe, RecipeForm, RecipeRow},
    validation::validate_recipe,
};

use super::{ingredients::missing_ingredients, tags::missing_tags};

use sqlx::{Pool, Postgres, QueryBuilder, Transaction};

pub async fn fetch_recipes(
    filter: &RecipeFilter,
    request: PageRequest,
    viewer: Option<Id>,
    pool: &Pool<Postgres>,
) -> Result<Page<Recipe>, StoreError> {
    let mut builder: QueryBuilder<Postgres> =
        QueryBuilder::new("SELECT r.*, COUNT(*) OVER() AS count FROM recipes r");

    filter.push_conditions(&mut builder, viewer);

    builder
        .push(" ORDER BY r.pub_date DESC, r.id DESC LIMIT ")
        .push_bind(request.limit)
        .push(" OFFSET ")
        .push_bind(request.offset());

    let rows: Vec<RecipeRow> = builder.build_query_as().fetch_all(pool).await?;

    let total_count = rows.first().map(|row| row.count).unwrap_or(0);
    let rows = rows.into_iter().map(|row| row.recipe).collect();

    Page::checked(rows, total_count, request)
}

pub async fn get_recipe(id: Id, pool: &Pool<Postgres>) -> Result<Recipe, StoreError> {
    let row: Option<Recipe> = sqlx::query_as("SELECT * FROM recipes WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    row.ok_or(StoreError::NotFound("recipe"))
}

/// Loads a recipe the session may modify: its author, or anyone allowed to
/// manage all recipes.
pub async fn get_recipe_mut(
    id: Id,
    session: &SessionData,
    pool: &Pool<Postgres>,
) -> Result<Recipe, StoreError> {
    session.authenticate(ActionType::ManageOwnRecipes)?;
    let recipe = get_recipe(id, pool).await?;

    if recipe.author_id == session.user_id
        || ActionType::ManageAllRecipes.authenticate(session)
    {
        Ok(recipe)
    } else {
        Err(StoreError::PermissionDenied(
            "Only the author can change this recipe".to_string(),
        ))
    }
}

pub async fn count_recipes_by_author(
    author_ids: &[Id],
    pool: &Pool<Postgres>,
) -> Result<Vec<(Id, i64)>, StoreError> {
    let rows: Vec<(Id, i64)> = sqlx::query_as(
        "SELECT author_id, COUNT(*) FROM recipes WHERE author_id = ANY($1) GROUP BY author_id",
    )
    .bind(author_ids)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Newest recipes of each listed author, at most `limit` per author when set.
pub async fn list_recipes_by_author(
    author_ids: &[Id],
    limit: Option<i64>,
    pool: &Pool<Postgres>,
) -> Result<Vec<Recipe>, StoreError> {
    let rows: Vec<Recipe> = sqlx::query_as(
        "
        SELECT id, author_id, name, image, text, cooking_time, pub_date FROM (
            SELECT r.*, ROW_NUMBER() OVER (
                PARTITION BY r.author_id ORDER BY r.pub_date DESC, r.id DESC
            ) AS position
            FROM recipes r
            WHERE r.author_id = ANY($1)
        ) ranked
        WHERE $2::BIGINT IS NULL OR position <= $2
        ORDER BY pub_date DESC, id DESC
    ",
    )
    .bind(author_ids)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Unknown ingredient or tag ids are reported before anything is written.
async fn check_references(form: &RecipeForm, pool: &Pool<Postgres>) -> Result<(), StoreError> {
    let ingredient_ids: Vec<Id> = form.ingredients.iter().map(|part| part.id).collect();

    if !missing_ingredients(&ingredient_ids, pool).await?.is_empty() {
        return Err(StoreError::NotFound("ingredient"));
    }
    if !missing_tags(&form.tags, pool).await?.is_empty() {
        return Err(StoreError::NotFound("tag"));
    }

    Ok(())
}

async fn insert_parts(
    recipe_id: Id,
    parts: &[IngredientAmount],
    tr: &mut Transaction<'_, Postgres>,
) -> Result<(), StoreError> {
    if parts.is_empty() {
        return Ok(());
    }

    let mut query_builder: QueryBuilder<Postgres> =
        QueryBuilder::new("INSERT INTO recipe_ingredients (recipe_id, ingredient_id, amount) ");

    query_builder.push_values(parts, |mut b, part| {
        b.push_bind(recipe_id)
            .push_bind(part.id)
            .push_bind(part.amount);
    });

    query_builder.build().execute(&mut **tr).await?;

    Ok(())
}

async fn insert_tags(
    recipe_id: Id,
    tags: &[Id],
    tr: &mut Transaction<'_, Postgres>,
) -> Result<(), StoreError> {
    if tags.is_empty() {
        return Ok(());
    }

    let mut query_builder: QueryBuilder<Postgres> =
        QueryBuilder::new("INSERT INTO tag_recipes (recipe_id, tag_id) ");

    query_builder.push_values(tags, |mut b, tag_id| {
        b.push_bind(recipe_id).push_bind(*tag_id);
    });

    query_builder.build().execute(&mut **tr).await?;

    Ok(())
}

async fn begin(pool: &Pool<Postgres>) -> Result<Transaction<'static, Postgres>, StoreError> {
    pool.begin().await.map_err(|e| {
        log::error!("Could not start transaction: {e}");
        StoreError::Query(e)
    })
}

async fn commit(tr: Transaction<'_, Postgres>) -> Result<(), StoreError> {
    tr.commit().await.map_err(|e| {
        log::error!("Could not commit transaction: {e}");
        StoreError::Query(e)
    })
}

/// Creates a recipe with its ingredient and tag joins in one transaction.
/// The decoded image is written first and removed again if the insert fails.
pub async fn create_recipe(
    form: RecipeForm,
    session: &SessionData,
    images: &ImageStore,
    pool: &Pool<Postgres>,
) -> Result<Recipe, StoreError> {
    session.authenticate(ActionType::CreateRecipes)?;
    validate_recipe(&form, true)?;
    check_references(&form, pool).await?;

    let image = images
        .save_data_uri(form.image.as_deref().unwrap_or_default())
        .await?;

    let result = insert_recipe(&form, &image, session.user_id, pool).await;
    if result.is_err() {
        images.remove(&image).await;
    }

    let recipe = result?;
    log::info!("User {} published recipe {}", session.user_id, recipe.id);

    Ok(recipe)
}

async fn insert_recipe(
    form: &RecipeForm,
    image: &str,
    author_id: Id,
    pool: &Pool<Postgres>,
) -> Result<Recipe, StoreError> {
    let mut tr = begin(pool).await?;

    let recipe: Recipe = sqlx::query_as(
        "
        INSERT INTO recipes (author_id, name, image, text, cooking_time)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *
    ",
    )
    .bind(author_id)
    .bind(form.name.trim())
    .bind(image)
    .bind(&form.text)
    .bind(form.cooking_time)
    .fetch_one(&mut *tr)
    .await?;

    insert_parts(recipe.id, &form.ingredients, &mut tr).await?;
    insert_tags(recipe.id, &form.tags, &mut tr).await?;

    commit(tr).await?;

    Ok(recipe)
}

/// Replaces the recipe's fields and its whole ingredient and tag sets inside
/// one transaction. Without an image the stored picture is kept.
pub async fn update_recipe(
    id: Id,
    form: RecipeForm,
    session: &SessionData,
    images: &ImageStore,
    pool: &Pool<Postgres>,
) -> Result<Recipe, StoreError> {
    let current = get_recipe_mut(id, session, pool).await?;
    validate_recipe(&form, false)?;
    check_references(&form, pool).await?;

    let new_image = match form.image.as_deref().filter(|image| !image.is_empty()) {
        Some(data) => Some(images.save_data_uri(data).await?),
        None => None,
    };
    let image = new_image.as_deref().unwrap_or(current.image.as_str());

    let result = replace_recipe(id, &form, image, pool).await;

    match (&result, new_image) {
        (Ok(_), Some(_)) => images.remove(&current.image).await,
        (Err(_), Some(new_image)) => images.remove(&new_image).await,
        _ => {}
    }

    result
}

async fn replace_recipe(
    id: Id,
    form: &RecipeForm,
    image: &str,
    pool: &Pool<Postgres>,
) -> Result<Recipe, StoreError> {
    let mut tr = begin(pool).await?;

    let recipe: Recipe = sqlx::query_as(
        "
        UPDATE recipes SET name = $1, image = $2, text = $3, cooking_time = $4
        WHERE id = $5
        RETURNING *
    ",
    )
    .bind(form.name.trim())
    .bind(image)
    .bind(&form.text)
    .bind(form.cooking_time)
    .bind(id)
    .fetch_one(&mut *tr)
    .await?;

    sqlx::query("DELETE FROM recipe_ingredients WHERE recipe_id = $1")
        .bind(id)
        .execute(&mut *tr)
        .await?;

    sqlx::query("DELETE FROM tag_recipes WHERE recipe_id = $1")
        .bind(id)
        .execute(&mut *tr)
        .await?;

    insert_parts(id, &form.ingredients, &mut tr).await?;
    insert_tags(id, &form.tags, &mut tr).await?;

    commit(tr).await?;

    Ok(recipe)
}

/// Stores a raw image upload and points the recipe at it.
pub async fn set_recipe_image(
    id: Id,
    bytes: &[u8],
    extension: &str,
    session: &SessionData,
    images: &ImageStore,
    pool: &Pool<Postgres>,
) -> Result<Recipe, StoreError> {
    let current = get_recipe_mut(id, session, pool).await?;
    let image = images.save_bytes(bytes, extension).await?;

    let result: Result<Recipe, sqlx::Error> =
        sqlx::query_as("UPDATE recipes SET image = $1 WHERE id = $2 RETURNING *")
            .bind(&image)
            .bind(id)
            .fetch_one(pool)
            .await;

    match result {
        Ok(recipe) => {
            images.remove(&current.image).await;
            Ok(recipe)
        }
        Err(e) => {
            images.remove(&image).await;
            Err(e.into())
        }
    }
}

pub async fn delete_recipe(
    id: Id,
    session: &SessionData,
    images: &ImageStore,
    pool: &Pool<Postgres>,
) -> Result<(), StoreError> {
    let recipe = get_recipe_mut(id, session, pool).await?;

    sqlx::query("DELETE FROM recipes WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    images.remove(&recipe.image).await;
    log::info!("User {} deleted recipe {}", session.user_id, id);

    Ok(())
}
