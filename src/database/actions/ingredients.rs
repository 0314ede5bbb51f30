use crate::{
    error::{is_restricted_delete, StoreError},
    filters::prefix_pattern,
    jwt::SessionData,
    permissions::ActionType,
    schema::{Id, Ingredient, IngredientForm, RecipePart},
    validation::validate_ingredient,
};

use sqlx::{Pool, Postgres};

pub async fn create_ingredient(
    form: IngredientForm,
    session: &SessionData,
    pool: &Pool<Postgres>,
) -> Result<Ingredient, StoreError> {
    session.authenticate(ActionType::ManageReferenceData)?;
    validate_ingredient(&form)?;

    let ingredient: Ingredient = sqlx::query_as(
        "INSERT INTO ingredients (name, measurement_unit) VALUES ($1, $2) RETURNING *",
    )
    .bind(form.name.trim())
    .bind(form.measurement_unit.trim())
    .fetch_one(pool)
    .await?;

    Ok(ingredient)
}

pub async fn get_ingredient(id: Id, pool: &Pool<Postgres>) -> Result<Ingredient, StoreError> {
    let ingredient: Option<Ingredient> = sqlx::query_as("SELECT * FROM ingredients WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    ingredient.ok_or(StoreError::NotFound("ingredient"))
}

/// Ingredients whose name starts with `name`, ignoring case. Without a
/// query every ingredient is returned.
pub async fn search_ingredients(
    name: Option<&str>,
    pool: &Pool<Postgres>,
) -> Result<Vec<Ingredient>, StoreError> {
    let pattern = prefix_pattern(name.unwrap_or_default().trim());

    let list: Vec<Ingredient> = sqlx::query_as(
        "SELECT * FROM ingredients WHERE lower(name) LIKE lower($1) ORDER BY name, measurement_unit",
    )
    .bind(pattern)
    .fetch_all(pool)
    .await?;

    Ok(list)
}

pub async fn update_ingredient(
    id: Id,
    form: IngredientForm,
    session: &SessionData,
    pool: &Pool<Postgres>,
) -> Result<Ingredient, StoreError> {
    session.authenticate(ActionType::ManageReferenceData)?;
    validate_ingredient(&form)?;

    let ingredient: Option<Ingredient> = sqlx::query_as(
        "UPDATE ingredients SET name = $1, measurement_unit = $2 WHERE id = $3 RETURNING *",
    )
    .bind(form.name.trim())
    .bind(form.measurement_unit.trim())
    .bind(id)
    .fetch_optional(pool)
    .await?;

    ingredient.ok_or(StoreError::NotFound("ingredient"))
}

pub async fn delete_ingredient(
    id: Id,
    session: &SessionData,
    pool: &Pool<Postgres>,
) -> Result<(), StoreError> {
    session.authenticate(ActionType::ManageReferenceData)?;

    let result = sqlx::query("DELETE FROM ingredients WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await;

    match result {
        Ok(done) if done.rows_affected() == 0 => Err(StoreError::NotFound("ingredient")),
        Ok(_) => Ok(()),
        Err(e) if is_restricted_delete(&e) => Err(StoreError::invalid(
            "ingredient",
            "The ingredient is used by recipes and cannot be deleted",
        )),
        Err(e) => Err(e.into()),
    }
}

/// Ingredient lines of every listed recipe, in one query.
pub async fn list_recipe_parts(
    recipe_ids: &[Id],
    pool: &Pool<Postgres>,
) -> Result<Vec<RecipePart>, StoreError> {
    let list: Vec<RecipePart> = sqlx::query_as(
        "
        SELECT ri.recipe_id, ri.ingredient_id, i.name, i.measurement_unit, ri.amount
        FROM recipe_ingredients ri
        INNER JOIN ingredients i ON i.id = ri.ingredient_id
        WHERE ri.recipe_id = ANY($1)
        ORDER BY ri.id
    ",
    )
    .bind(recipe_ids)
    .fetch_all(pool)
    .await?;

    Ok(list)
}

/// Ids among `ids` that don't name an existing ingredient.
pub async fn missing_ingredients(ids: &[Id], pool: &Pool<Postgres>) -> Result<Vec<Id>, StoreError> {
    let found: Vec<(Id,)> = sqlx::query_as("SELECT id FROM ingredients WHERE id = ANY($1)")
        .bind(ids)
        .fetch_all(pool)
        .await?;

    Ok(ids
        .iter()
        .copied()
        .filter(|id| !found.iter().any(|(found,)| found == id))
        .collect())
}
