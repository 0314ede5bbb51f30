use std::fmt::{self, Display};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type Id = i32;

#[derive(
    Clone, Copy, Debug, PartialEq, PartialOrd, sqlx::Type, Serialize, Eq, Ord, Hash, Deserialize,
)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    User,
    Admin,
}

/// Entity a relation row points at.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RelationTarget {
    Recipe,
    User,
}

impl RelationTarget {
    pub fn entity(&self) -> &'static str {
        match self {
            RelationTarget::Recipe => "recipe",
            RelationTarget::User => "user",
        }
    }
}

/// The three user-owned membership relations. All of them are
/// `(user_id, target)` pairs with a unique constraint over the pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationKind {
    Favorite,
    ShoppingCart,
    Subscription,
}

impl RelationKind {
    pub fn table(&self) -> &'static str {
        match self {
            RelationKind::Favorite => "favorite_recipes",
            RelationKind::ShoppingCart => "shopping_cart_recipes",
            RelationKind::Subscription => "subscriptions",
        }
    }

    pub fn target_column(&self) -> &'static str {
        match self {
            RelationKind::Favorite | RelationKind::ShoppingCart => "recipe_id",
            RelationKind::Subscription => "author_id",
        }
    }

    pub fn target(&self) -> RelationTarget {
        match self {
            RelationKind::Favorite | RelationKind::ShoppingCart => RelationTarget::Recipe,
            RelationKind::Subscription => RelationTarget::User,
        }
    }
}

impl Display for RelationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RelationKind::Favorite => "favorites",
            RelationKind::ShoppingCart => "shopping cart",
            RelationKind::Subscription => "subscriptions",
        };
        write!(f, "{label}")
    }
}

#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct User {
    pub id: Id,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub role: UserRole,
    pub date_joined: DateTime<Utc>,
}

#[derive(sqlx::FromRow, Debug, Clone)]
pub struct UserRow {
    #[sqlx(flatten)]
    pub user: User,
    pub count: i64,
}

#[derive(sqlx::FromRow, Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Tag {
    pub id: Id,
    pub name: String,
    pub color: String,
    pub slug: String,
}

#[derive(sqlx::FromRow, Debug, Clone)]
pub struct RecipeTag {
    pub recipe_id: Id,
    #[sqlx(flatten)]
    pub tag: Tag,
}

#[derive(sqlx::FromRow, Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Ingredient {
    pub id: Id,
    pub name: String,
    pub measurement_unit: String,
}

#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct Recipe {
    pub id: Id,
    pub author_id: Id,
    pub name: String,
    pub image: String,
    pub text: String,
    pub cooking_time: i32,
    pub pub_date: DateTime<Utc>,
}

#[derive(sqlx::FromRow, Debug, Clone)]
pub struct RecipeRow {
    #[sqlx(flatten)]
    pub recipe: Recipe,
    pub count: i64,
}

#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct RecipePart {
    pub recipe_id: Id,
    pub ingredient_id: Id,
    pub name: String,
    pub measurement_unit: String,
    pub amount: i32,
}

/// One ingredient line of one recipe in a user's shopping cart.
#[derive(sqlx::FromRow, Debug, Clone, PartialEq, Eq)]
pub struct CartIngredient {
    pub name: String,
    pub measurement_unit: String,
    pub amount: i32,
}

#[derive(Deserialize, Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub username: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    pub password: String,
}

#[derive(Deserialize, Debug, Clone)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize, Debug, Clone)]
pub struct PasswordChange {
    pub new_password: String,
    pub current_password: String,
}

#[derive(Deserialize, Debug, Clone)]
pub struct TagForm {
    pub name: String,
    pub color: String,
    pub slug: String,
}

#[derive(Deserialize, Debug, Clone)]
pub struct IngredientForm {
    pub name: String,
    pub measurement_unit: String,
}

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngredientAmount {
    pub id: Id,
    pub amount: i32,
}

/// Recipe submission for both create and update. On update the ingredient
/// and tag sets fully replace the stored ones; `image` may be omitted to keep
/// the current picture.
#[derive(Deserialize, Debug, Clone)]
pub struct RecipeForm {
    pub ingredients: Vec<IngredientAmount>,
    pub tags: Vec<Id>,
    #[serde(default)]
    pub image: Option<String>,
    pub name: String,
    pub text: String,
    pub cooking_time: i32,
}
