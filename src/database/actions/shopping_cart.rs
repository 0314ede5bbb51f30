use crate::{
    error::StoreError,
    schema::{CartIngredient, Id},
    shopping_list::{aggregate, render, ShoppingListLine},
};

use sqlx::{Pool, Postgres};

/// Every ingredient line of every recipe in the user's cart, unsummed.
pub async fn list_cart_ingredients(
    user_id: Id,
    pool: &Pool<Postgres>,
) -> Result<Vec<CartIngredient>, StoreError> {
    let list: Vec<CartIngredient> = sqlx::query_as(
        "
        SELECT i.name, i.measurement_unit, ri.amount
        FROM shopping_cart_recipes c
        INNER JOIN recipe_ingredients ri ON ri.recipe_id = c.recipe_id
        INNER JOIN ingredients i ON i.id = ri.ingredient_id
        WHERE c.user_id = $1
    ",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(list)
}

pub async fn shopping_list(
    user_id: Id,
    pool: &Pool<Postgres>,
) -> Result<Vec<ShoppingListLine>, StoreError> {
    Ok(aggregate(list_cart_ingredients(user_id, pool).await?))
}

/// The downloadable text form of the user's shopping list. An empty cart
/// gives an empty string.
pub async fn shopping_list_text(user_id: Id, pool: &Pool<Postgres>) -> Result<String, StoreError> {
    Ok(render(&shopping_list(user_id, pool).await?))
}
