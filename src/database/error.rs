use std::collections::BTreeMap;

use thiserror::Error;
use warp::http::StatusCode;

use super::schema::RelationKind;

pub type FieldErrors = BTreeMap<String, Vec<String>>;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Validation failed")]
    Validation(FieldErrors),

    #[error("Already in {0}")]
    DuplicateRelation(RelationKind),

    #[error("Not in {0}")]
    RelationNotFound(RelationKind),

    #[error("Cannot subscribe to yourself")]
    SelfFollowForbidden,

    #[error("No {0} exists with specified id")]
    NotFound(&'static str),

    #[error("{0}")]
    PermissionDenied(String),

    #[error("Authentication credentials were not provided or are invalid")]
    Unauthenticated,

    #[error("Query failed: {0}")]
    Query(sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl warp::reject::Reject for StoreError {}

impl StoreError {
    pub fn invalid(field: &str, message: &str) -> Self {
        let mut errors = FieldErrors::new();
        errors.insert(field.to_string(), vec![message.to_string()]);
        Self::Validation(errors)
    }

    pub fn status(&self) -> StatusCode {
        match self {
            StoreError::Validation(_)
            | StoreError::DuplicateRelation(_)
            | StoreError::RelationNotFound(_)
            | StoreError::SelfFollowForbidden => StatusCode::BAD_REQUEST,
            StoreError::NotFound(_) => StatusCode::NOT_FOUND,
            StoreError::PermissionDenied(_) => StatusCode::FORBIDDEN,
            StoreError::Unauthenticated => StatusCode::UNAUTHORIZED,
            StoreError::Query(_) | StoreError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// What a violated constraint means to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Violation {
    Field(&'static str, &'static str),
    Duplicate(RelationKind),
    SelfFollow,
    Missing(&'static str),
}

impl From<Violation> for StoreError {
    fn from(value: Violation) -> Self {
        match value {
            Violation::Field(field, message) => StoreError::invalid(field, message),
            Violation::Duplicate(kind) => StoreError::DuplicateRelation(kind),
            Violation::SelfFollow => StoreError::SelfFollowForbidden,
            Violation::Missing(entity) => StoreError::NotFound(entity),
        }
    }
}

// Names match the constraints declared in migrations/.
const CONSTRAINT_TABLE: &[(&str, Violation)] = &[
    (
        "users_email_key",
        Violation::Field("email", "A user with that email already exists"),
    ),
    (
        "users_username_key",
        Violation::Field("username", "A user with that username already exists"),
    ),
    (
        "tags_name_key",
        Violation::Field("name", "A tag with that name already exists"),
    ),
    (
        "tags_color_key",
        Violation::Field("color", "A tag with that color already exists"),
    ),
    (
        "tags_slug_key",
        Violation::Field("slug", "A tag with that slug already exists"),
    ),
    (
        "tags_color_format",
        Violation::Field("color", "Use the #RRGGBB format for colors"),
    ),
    (
        "tags_slug_format",
        Violation::Field("slug", "Slug may contain only letters, digits, '-' and '_'"),
    ),
    (
        "ingredients_name_unit_unique",
        Violation::Field(
            "name",
            "An ingredient with that name and measurement unit already exists",
        ),
    ),
    (
        "recipes_cooking_time_range",
        Violation::Field("cooking_time", "Cooking time must be between 1 and 1440"),
    ),
    (
        "recipe_ingredients_amount_range",
        Violation::Field("amount", "Amount must be between 1 and 1000"),
    ),
    (
        "recipe_ingredients_unique",
        Violation::Field("ingredients", "Ingredients must not repeat"),
    ),
    (
        "tag_recipes_unique",
        Violation::Field("tags", "Tags must not repeat"),
    ),
    (
        "favorite_recipes_unique",
        Violation::Duplicate(RelationKind::Favorite),
    ),
    (
        "shopping_cart_recipes_unique",
        Violation::Duplicate(RelationKind::ShoppingCart),
    ),
    (
        "subscriptions_unique",
        Violation::Duplicate(RelationKind::Subscription),
    ),
    ("subscriptions_prevent_self_follow", Violation::SelfFollow),
    ("recipes_author_fkey", Violation::Missing("user")),
    ("recipe_ingredients_recipe_fkey", Violation::Missing("recipe")),
    (
        "recipe_ingredients_ingredient_fkey",
        Violation::Missing("ingredient"),
    ),
    ("tag_recipes_tag_fkey", Violation::Missing("tag")),
    ("tag_recipes_recipe_fkey", Violation::Missing("recipe")),
    ("favorite_recipes_user_fkey", Violation::Missing("user")),
    ("favorite_recipes_recipe_fkey", Violation::Missing("recipe")),
    ("shopping_cart_recipes_user_fkey", Violation::Missing("user")),
    ("shopping_cart_recipes_recipe_fkey", Violation::Missing("recipe")),
    ("subscriptions_user_fkey", Violation::Missing("user")),
    ("subscriptions_author_fkey", Violation::Missing("user")),
];

pub fn classify_constraint(constraint: &str) -> Option<Violation> {
    CONSTRAINT_TABLE
        .iter()
        .find(|(name, _)| *name == constraint)
        .map(|(_, violation)| *violation)
}

/// True when a delete was refused because rows still reference the entity.
pub fn is_restricted_delete(error: &sqlx::Error) -> bool {
    match error {
        sqlx::Error::Database(e) => e.is_foreign_key_violation(),
        _ => false,
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(value: sqlx::Error) -> Self {
        let violation = match &value {
            sqlx::Error::Database(e) => e.constraint().and_then(classify_constraint),
            _ => None,
        };

        match (violation, value) {
            (Some(violation), _) => violation.into(),
            (None, sqlx::Error::RowNotFound) => StoreError::NotFound("row"),
            (None, value) => {
                log::error!("Unhandled query error: {value}");
                StoreError::Query(value)
            }
        }
    }
}
