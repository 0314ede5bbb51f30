use std::collections::{HashMap, HashSet};

use serde::Serialize;
use sqlx::{Pool, Postgres};

use crate::{
    actions::{
        count_recipes_by_author, get_users_by_ids, list_recipe_parts, list_recipe_tags,
        list_recipes_by_author, related_targets,
    },
    error::StoreError,
    media::image::ImageStore,
    schema::{Id, Recipe, RelationKind, Tag, User},
};

#[derive(Serialize, Debug, Clone)]
pub struct UserView {
    pub email: String,
    pub id: Id,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub is_subscribed: bool,
}

impl UserView {
    pub fn new(user: User, is_subscribed: bool) -> Self {
        Self {
            email: user.email,
            id: user.id,
            username: user.username,
            first_name: user.first_name,
            last_name: user.last_name,
            is_subscribed,
        }
    }
}

#[derive(Serialize, Debug, Clone)]
pub struct RecipeIngredientView {
    pub id: Id,
    pub name: String,
    pub measurement_unit: String,
    pub amount: i32,
}

#[derive(Serialize, Debug, Clone)]
pub struct RecipeView {
    pub id: Id,
    pub tags: Vec<Tag>,
    pub author: UserView,
    pub ingredients: Vec<RecipeIngredientView>,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
    pub name: String,
    pub image: String,
    pub text: String,
    pub cooking_time: i32,
}

#[derive(Serialize, Debug, Clone)]
pub struct ShortRecipe {
    pub id: Id,
    pub name: String,
    pub image: String,
    pub cooking_time: i32,
}

impl ShortRecipe {
    pub fn new(recipe: Recipe, images: &ImageStore) -> Self {
        Self {
            id: recipe.id,
            name: recipe.name,
            image: images.url(&recipe.image),
            cooking_time: recipe.cooking_time,
        }
    }
}

#[derive(Serialize, Debug, Clone)]
pub struct UserWithRecipes {
    #[serde(flatten)]
    pub user: UserView,
    pub recipes: Vec<ShortRecipe>,
    pub recipes_count: i64,
}

async fn subscribed_to(
    viewer: Option<Id>,
    authors: &[Id],
    pool: &Pool<Postgres>,
) -> Result<HashSet<Id>, StoreError> {
    match viewer {
        Some(viewer) => related_targets(RelationKind::Subscription, viewer, authors, pool).await,
        None => Ok(HashSet::new()),
    }
}

pub async fn user_views(
    users: Vec<User>,
    viewer: Option<Id>,
    pool: &Pool<Postgres>,
) -> Result<Vec<UserView>, StoreError> {
    let ids: Vec<Id> = users.iter().map(|user| user.id).collect();
    let subscribed = subscribed_to(viewer, &ids, pool).await?;

    Ok(users
        .into_iter()
        .map(|user| {
            let is_subscribed = subscribed.contains(&user.id);
            UserView::new(user, is_subscribed)
        })
        .collect())
}

pub async fn user_view(
    user: User,
    viewer: Option<Id>,
    pool: &Pool<Postgres>,
) -> Result<UserView, StoreError> {
    let mut views = user_views(vec![user], viewer, pool).await?;
    views.pop().ok_or(StoreError::NotFound("user"))
}

/// Full recipe representations for one page, with a fixed number of queries
/// regardless of page size.
pub async fn recipe_views(
    recipes: Vec<Recipe>,
    viewer: Option<Id>,
    images: &ImageStore,
    pool: &Pool<Postgres>,
) -> Result<Vec<RecipeView>, StoreError> {
    let ids: Vec<Id> = recipes.iter().map(|recipe| recipe.id).collect();
    let mut author_ids: Vec<Id> = recipes.iter().map(|recipe| recipe.author_id).collect();
    author_ids.sort_unstable();
    author_ids.dedup();

    let mut tags: HashMap<Id, Vec<Tag>> = HashMap::new();
    for row in list_recipe_tags(&ids, pool).await? {
        tags.entry(row.recipe_id).or_default().push(row.tag);
    }

    let mut ingredients: HashMap<Id, Vec<RecipeIngredientView>> = HashMap::new();
    for part in list_recipe_parts(&ids, pool).await? {
        ingredients
            .entry(part.recipe_id)
            .or_default()
            .push(RecipeIngredientView {
                id: part.ingredient_id,
                name: part.name,
                measurement_unit: part.measurement_unit,
                amount: part.amount,
            });
    }

    let authors: HashMap<Id, UserView> = user_views(
        get_users_by_ids(&author_ids, pool).await?,
        viewer,
        pool,
    )
    .await?
    .into_iter()
    .map(|view| (view.id, view))
    .collect();

    let (favorited, in_cart) = match viewer {
        Some(viewer) => (
            related_targets(RelationKind::Favorite, viewer, &ids, pool).await?,
            related_targets(RelationKind::ShoppingCart, viewer, &ids, pool).await?,
        ),
        None => (HashSet::new(), HashSet::new()),
    };

    recipes
        .into_iter()
        .map(|recipe| -> Result<RecipeView, StoreError> {
            let author = authors
                .get(&recipe.author_id)
                .cloned()
                .ok_or(StoreError::NotFound("user"))?;

            Ok(RecipeView {
                id: recipe.id,
                tags: tags.remove(&recipe.id).unwrap_or_default(),
                author,
                ingredients: ingredients.remove(&recipe.id).unwrap_or_default(),
                is_favorited: favorited.contains(&recipe.id),
                is_in_shopping_cart: in_cart.contains(&recipe.id),
                name: recipe.name,
                image: images.url(&recipe.image),
                text: recipe.text,
                cooking_time: recipe.cooking_time,
            })
        })
        .collect()
}

pub async fn recipe_view(
    recipe: Recipe,
    viewer: Option<Id>,
    images: &ImageStore,
    pool: &Pool<Postgres>,
) -> Result<RecipeView, StoreError> {
    let mut views = recipe_views(vec![recipe], viewer, images, pool).await?;
    views.pop().ok_or(StoreError::NotFound("recipe"))
}

/// Authors with their newest recipes, `recipes_limit` per author when given.
pub async fn authors_with_recipes(
    authors: Vec<User>,
    viewer: Option<Id>,
    recipes_limit: Option<i64>,
    images: &ImageStore,
    pool: &Pool<Postgres>,
) -> Result<Vec<UserWithRecipes>, StoreError> {
    let ids: Vec<Id> = authors.iter().map(|author| author.id).collect();

    let counts: HashMap<Id, i64> = count_recipes_by_author(&ids, pool)
        .await?
        .into_iter()
        .collect();

    let mut recipes: HashMap<Id, Vec<ShortRecipe>> = HashMap::new();
    for recipe in list_recipes_by_author(&ids, recipes_limit, pool).await? {
        recipes
            .entry(recipe.author_id)
            .or_default()
            .push(ShortRecipe::new(recipe, images));
    }

    Ok(user_views(authors, viewer, pool)
        .await?
        .into_iter()
        .map(|user| UserWithRecipes {
            recipes: recipes.remove(&user.id).unwrap_or_default(),
            recipes_count: counts.get(&user.id).copied().unwrap_or(0),
            user,
        })
        .collect())
}
