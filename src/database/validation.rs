use std::{collections::HashSet, sync::OnceLock};

use regex::Regex;

use crate::{
    constants::{
        AMOUNT_MAX, AMOUNT_MIN, COOKING_TIME_MAX, COOKING_TIME_MIN, MAX_RECIPE_INGREDIENTS,
        MAX_RECIPE_TAGS, NAME_MAX_LENGTH, USER_FIELD_MAX_LENGTH,
    },
    database::{
        error::{FieldErrors, StoreError},
        schema::{IngredientForm, NewUser, RecipeForm, TagForm},
    },
};

fn color_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^#[a-fA-F0-9]{6}$").expect("valid color pattern"))
}

fn slug_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[-a-zA-Z0-9_]+$").expect("valid slug pattern"))
}

/// Collects field errors so that one response can report all of them.
#[derive(Default, Debug)]
pub struct Validator {
    errors: FieldErrors,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, field: &str, message: impl Into<String>) {
        self.errors
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn check(&mut self, ok: bool, field: &str, message: &str) {
        if !ok {
            self.push(field, message);
        }
    }

    pub fn text(&mut self, field: &str, value: &str, max_length: usize) {
        if value.trim().is_empty() {
            self.push(field, "This field may not be blank");
        } else if value.chars().count() > max_length {
            self.push(
                field,
                format!("Ensure this field has no more than {max_length} characters"),
            );
        }
    }

    pub fn finish(self) -> Result<(), StoreError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(StoreError::Validation(self.errors))
        }
    }
}

pub fn is_valid_cooking_time(minutes: i32) -> bool {
    (COOKING_TIME_MIN..=COOKING_TIME_MAX).contains(&minutes)
}

pub fn is_valid_amount(amount: i32) -> bool {
    (AMOUNT_MIN..=AMOUNT_MAX).contains(&amount)
}

pub fn is_valid_color(color: &str) -> bool {
    color_pattern().is_match(color)
}

pub fn is_valid_slug(slug: &str) -> bool {
    slug_pattern().is_match(slug)
}

/// `require_image` is set on create; an update may keep the stored picture.
pub fn validate_recipe(form: &RecipeForm, require_image: bool) -> Result<(), StoreError> {
    let mut v = Validator::new();

    v.text("name", &form.name, NAME_MAX_LENGTH);
    if form.text.trim().is_empty() {
        v.push("text", "This field may not be blank");
    }
    v.check(
        is_valid_cooking_time(form.cooking_time),
        "cooking_time",
        "Cooking time must be between 1 and 1440",
    );

    if require_image && form.image.as_deref().map_or(true, str::is_empty) {
        v.push("image", "This field is required");
    }

    if form.ingredients.is_empty() {
        v.push("ingredients", "At least one ingredient is required");
    }
    if form.ingredients.len() > MAX_RECIPE_INGREDIENTS {
        v.push(
            "ingredients",
            format!("Ensure there are no more than {MAX_RECIPE_INGREDIENTS} ingredients"),
        );
    }
    if form.tags.len() > MAX_RECIPE_TAGS {
        v.push(
            "tags",
            format!("Ensure there are no more than {MAX_RECIPE_TAGS} tags"),
        );
    }
    let mut seen = HashSet::new();
    for part in &form.ingredients {
        if !seen.insert(part.id) {
            v.push("ingredients", format!("Ingredient {} is listed twice", part.id));
        }
        if !is_valid_amount(part.amount) {
            v.push(
                "amount",
                format!("Amount of ingredient {} must be between 1 and 1000", part.id),
            );
        }
    }

    let mut seen = HashSet::new();
    for tag in &form.tags {
        if !seen.insert(*tag) {
            v.push("tags", format!("Tag {tag} is listed twice"));
        }
    }

    v.finish()
}

pub fn validate_tag(form: &TagForm) -> Result<(), StoreError> {
    let mut v = Validator::new();

    v.text("name", &form.name, NAME_MAX_LENGTH);
    v.check(
        is_valid_color(&form.color),
        "color",
        "Use the #RRGGBB format for colors",
    );
    v.check(
        is_valid_slug(&form.slug) && form.slug.len() <= NAME_MAX_LENGTH,
        "slug",
        "Slug may contain only letters, digits, '-' and '_'",
    );

    v.finish()
}

pub fn validate_ingredient(form: &IngredientForm) -> Result<(), StoreError> {
    let mut v = Validator::new();
    v.text("name", &form.name, NAME_MAX_LENGTH);
    v.text("measurement_unit", &form.measurement_unit, NAME_MAX_LENGTH);
    v.finish()
}

pub fn validate_new_user(user: &NewUser) -> Result<(), StoreError> {
    let mut v = Validator::new();

    v.text("email", &user.email, 254);
    v.check(
        user.email.contains('@'),
        "email",
        "Enter a valid email address",
    );
    v.text("username", &user.username, USER_FIELD_MAX_LENGTH);
    v.check(
        user.first_name.chars().count() <= USER_FIELD_MAX_LENGTH,
        "first_name",
        "Ensure this field has no more than 150 characters",
    );
    v.check(
        user.last_name.chars().count() <= USER_FIELD_MAX_LENGTH,
        "last_name",
        "Ensure this field has no more than 150 characters",
    );
    validate_password_into(&mut v, "password", &user.password);

    v.finish()
}

pub fn validate_password(field: &str, password: &str) -> Result<(), StoreError> {
    let mut v = Validator::new();
    validate_password_into(&mut v, field, password);
    v.finish()
}

fn validate_password_into(v: &mut Validator, field: &str, password: &str) {
    v.check(
        password.chars().count() >= 8,
        field,
        "Password must contain at least 8 characters",
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::schema::IngredientAmount;

    fn form(cooking_time: i32, ingredients: Vec<(i32, i32)>, tags: Vec<i32>) -> RecipeForm {
        RecipeForm {
            ingredients: ingredients
                .into_iter()
                .map(|(id, amount)| IngredientAmount { id, amount })
                .collect(),
            tags,
            image: Some("data:image/png;base64,AAAA".to_string()),
            name: "Pancakes".to_string(),
            text: "Mix and fry".to_string(),
            cooking_time,
        }
    }

    fn fields(result: Result<(), StoreError>) -> Vec<String> {
        match result {
            Err(StoreError::Validation(errors)) => errors.into_keys().collect(),
            Err(other) => panic!("unexpected error {other:?}"),
            Ok(()) => vec![],
        }
    }

    #[test]
    fn cooking_time_bounds() {
        assert!(!is_valid_cooking_time(0));
        assert!(is_valid_cooking_time(1));
        assert!(is_valid_cooking_time(1440));
        assert!(!is_valid_cooking_time(1441));

        assert_eq!(
            fields(validate_recipe(&form(0, vec![(1, 10)], vec![]), true)),
            vec!["cooking_time"]
        );
        assert!(validate_recipe(&form(1440, vec![(1, 10)], vec![]), true).is_ok());
    }

    #[test]
    fn amount_bounds() {
        assert!(!is_valid_amount(0));
        assert!(is_valid_amount(1));
        assert!(is_valid_amount(1000));
        assert!(!is_valid_amount(1001));
    }

    #[test]
    fn duplicate_ingredients_and_tags_are_rejected() {
        let result = validate_recipe(&form(10, vec![(1, 10), (1, 20)], vec![3, 3]), true);
        assert_eq!(fields(result), vec!["ingredients", "tags"]);
    }

    #[test]
    fn oversized_lists_are_rejected() {
        let ingredients = (1..=MAX_RECIPE_INGREDIENTS as i32 + 1).map(|id| (id, 1)).collect();
        let tags = (1..=MAX_RECIPE_TAGS as i32 + 1).collect();

        let result = validate_recipe(&form(10, ingredients, tags), true);
        assert_eq!(fields(result), vec!["ingredients", "tags"]);

        let ingredients = (1..=MAX_RECIPE_INGREDIENTS as i32).map(|id| (id, 1)).collect();
        assert!(validate_recipe(&form(10, ingredients, vec![]), true).is_ok());
    }

    #[test]
    fn image_is_required_only_on_create() {
        let mut recipe = form(10, vec![(1, 10)], vec![]);
        recipe.image = None;

        assert_eq!(fields(validate_recipe(&recipe, true)), vec!["image"]);
        assert!(validate_recipe(&recipe, false).is_ok());
    }

    #[test]
    fn color_format() {
        assert!(is_valid_color("#E26C2D"));
        assert!(is_valid_color("#abcdef"));
        assert!(!is_valid_color("E26C2D"));
        assert!(!is_valid_color("#E26C2"));
        assert!(!is_valid_color("#GGGGGG"));
    }

    #[test]
    fn tag_form() {
        let tag = TagForm {
            name: "Breakfast".into(),
            color: "red".into(),
            slug: "break fast".into(),
        };
        assert_eq!(fields(validate_tag(&tag)), vec!["color", "slug"]);
    }

    #[test]
    fn short_password_is_rejected() {
        let user = NewUser {
            email: "cook@example.com".into(),
            username: "cook".into(),
            first_name: String::new(),
            last_name: String::new(),
            password: "short".into(),
        };
        assert_eq!(fields(validate_new_user(&user)), vec!["password"]);
    }
}
