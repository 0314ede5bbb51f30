use std::str::FromStr;

use sqlx::{Postgres, QueryBuilder};

use super::{
    error::StoreError,
    schema::{Id, RelationKind},
};

/// Recipe list narrowing. Every present criterion must hold; `tags` matches
/// recipes carrying any of the listed slugs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecipeFilter {
    pub author: Option<Id>,
    pub tags: Vec<String>,
    pub is_favorited: Option<bool>,
    pub is_in_shopping_cart: Option<bool>,
}

impl RecipeFilter {
    /// Appends ` WHERE ...` for a query selecting from `recipes r`.
    /// Relation flags are skipped for anonymous viewers.
    pub fn push_conditions(&self, builder: &mut QueryBuilder<'_, Postgres>, viewer: Option<Id>) {
        builder.push(" WHERE TRUE");

        if let Some(author) = self.author {
            builder.push(" AND r.author_id = ").push_bind(author);
        }

        if !self.tags.is_empty() {
            builder
                .push(
                    " AND EXISTS (SELECT 1 FROM tag_recipes tr INNER JOIN tags t ON t.id = tr.tag_id WHERE tr.recipe_id = r.id AND t.slug = ANY(",
                )
                .push_bind(self.tags.clone())
                .push("))");
        }

        let Some(viewer) = viewer else {
            return;
        };

        let flags = [
            (self.is_favorited, RelationKind::Favorite),
            (self.is_in_shopping_cart, RelationKind::ShoppingCart),
        ];

        for (flag, kind) in flags {
            let Some(flag) = flag else {
                continue;
            };

            builder.push(if flag { " AND EXISTS" } else { " AND NOT EXISTS" });
            builder
                .push(format!(
                    " (SELECT 1 FROM {} m WHERE m.recipe_id = r.id AND m.user_id = ",
                    kind.table()
                ))
                .push_bind(viewer)
                .push(")");
        }
    }
}

/// Recipe list query string: filter plus `page`/`limit`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecipeQuery {
    pub filter: RecipeFilter,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl RecipeQuery {
    /// Built from raw pairs because `tags` may repeat.
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Result<Self, StoreError> {
        let mut query = Self::default();

        for (key, value) in pairs {
            match key.as_str() {
                "author" => query.filter.author = Some(parse_number(&key, &value)?),
                "tags" if !value.is_empty() => query.filter.tags.push(value),
                "is_favorited" => query.filter.is_favorited = Some(parse_flag(&key, &value)?),
                "is_in_shopping_cart" => {
                    query.filter.is_in_shopping_cart = Some(parse_flag(&key, &value)?)
                }
                "page" => query.page = Some(parse_number(&key, &value)?),
                "limit" => query.limit = Some(parse_number(&key, &value)?),
                _ => {}
            }
        }

        Ok(query)
    }
}

fn parse_flag(field: &str, value: &str) -> Result<bool, StoreError> {
    match value {
        "1" | "true" | "True" => Ok(true),
        "0" | "false" | "False" => Ok(false),
        _ => Err(StoreError::invalid(field, "Expected 0 or 1")),
    }
}

fn parse_number<T: FromStr>(field: &str, value: &str) -> Result<T, StoreError> {
    value
        .parse()
        .map_err(|_| StoreError::invalid(field, "Expected a number"))
}

/// LIKE pattern matching names that start with `query`. Case is left alone;
/// fold both sides in SQL with `lower(name) LIKE lower($1)`.
pub fn prefix_pattern(query: &str) -> String {
    let mut pattern = String::with_capacity(query.len() + 1);

    for c in query.chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }

    pattern.push('%');
    pattern
}
