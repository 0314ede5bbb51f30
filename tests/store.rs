use foodgram_sdk::{
    actions::{
        add_relation, create_ingredient, create_recipe, create_tag, delete_ingredient,
        delete_tag, fetch_recipes, get_recipe, list_recipe_parts, login_user, register_user,
        remove_relation, search_ingredients, shopping_list_text, update_recipe,
    },
    error::StoreError,
    filters::RecipeFilter,
    jwt::{SessionData, SessionKeys},
    media::image::ImageStore,
    pagination::PageRequest,
    pool::run_migrations,
    schema::{
        Credentials, Id, Ingredient, IngredientAmount, IngredientForm, NewUser, Recipe,
        RecipeForm, RelationKind, Tag, TagForm, UserRole,
    },
};
use sqlx::{postgres::PgPoolOptions, Pool, Postgres};
use uuid::Uuid;

const PIXEL: &str = "data:image/gif;base64,R0lGODlh";

async fn pool() -> Option<Pool<Postgres>> {
    let Ok(url) = std::env::var("DATABASE_URL") else {
        eprintln!("DATABASE_URL not set, skipping");
        return None;
    };

    let pool = PgPoolOptions::new()
        .max_connections(4)
        .connect(&url)
        .await
        .expect("database reachable");
    run_migrations(&pool).await.expect("migrations apply");

    Some(pool)
}

fn unique() -> String {
    Uuid::new_v4().simple().to_string()
}

fn images() -> ImageStore {
    ImageStore::new(std::env::temp_dir().join("foodgram-store-tests"), "/media/")
}

async fn user(pool: &Pool<Postgres>, role: UserRole) -> SessionData {
    let name = unique();
    let user = register_user(
        NewUser {
            email: format!("{name}@example.com"),
            username: name,
            first_name: "Test".to_string(),
            last_name: "Cook".to_string(),
            password: "correct horse".to_string(),
        },
        pool,
    )
    .await
    .unwrap();

    SessionData {
        user_id: user.id,
        email: user.email,
        role,
    }
}

async fn ingredient(pool: &Pool<Postgres>, admin: &SessionData, name: &str, unit: &str) -> Ingredient {
    create_ingredient(
        IngredientForm {
            name: name.to_string(),
            measurement_unit: unit.to_string(),
        },
        admin,
        pool,
    )
    .await
    .unwrap()
}

async fn tag(pool: &Pool<Postgres>, admin: &SessionData) -> Tag {
    let id = unique();
    create_tag(
        TagForm {
            name: format!("tag {id}"),
            color: format!("#{}", &id[..6]),
            slug: id,
        },
        admin,
        pool,
    )
    .await
    .unwrap()
}

fn form(parts: &[(Id, i32)], tags: &[Id], cooking_time: i32) -> RecipeForm {
    RecipeForm {
        ingredients: parts
            .iter()
            .map(|(id, amount)| IngredientAmount {
                id: *id,
                amount: *amount,
            })
            .collect(),
        tags: tags.to_vec(),
        image: Some(PIXEL.to_string()),
        name: "Pancakes".to_string(),
        text: "Mix and fry.".to_string(),
        cooking_time,
    }
}

async fn recipe(
    pool: &Pool<Postgres>,
    author: &SessionData,
    parts: &[(Id, i32)],
    tags: &[Id],
) -> Recipe {
    create_recipe(form(parts, tags, 20), author, &images(), pool)
        .await
        .unwrap()
}

fn all() -> PageRequest {
    PageRequest { page: 1, limit: 100 }
}

#[tokio::test]
async fn ingredient_name_and_unit_pair_is_unique() {
    let Some(pool) = pool().await else { return };
    let admin = user(&pool, UserRole::Admin).await;
    let name = format!("Salt {}", unique());

    ingredient(&pool, &admin, &name, "g").await;

    let duplicate = create_ingredient(
        IngredientForm {
            name: name.clone(),
            measurement_unit: "g".to_string(),
        },
        &admin,
        &pool,
    )
    .await;
    assert!(matches!(duplicate, Err(StoreError::Validation(_))));

    ingredient(&pool, &admin, &name, "kg").await;
}

#[tokio::test]
async fn reference_data_is_admin_only() {
    let Some(pool) = pool().await else { return };
    let cook = user(&pool, UserRole::User).await;

    let result = create_ingredient(
        IngredientForm {
            name: unique(),
            measurement_unit: "g".to_string(),
        },
        &cook,
        &pool,
    )
    .await;

    assert!(matches!(result, Err(StoreError::PermissionDenied(_))));
}

#[tokio::test]
async fn cooking_time_bounds() {
    let Some(pool) = pool().await else { return };
    let admin = user(&pool, UserRole::Admin).await;
    let flour = ingredient(&pool, &admin, &unique(), "g").await;

    for minutes in [0, 1441] {
        let result = create_recipe(form(&[(flour.id, 1)], &[], minutes), &admin, &images(), &pool).await;
        assert!(
            matches!(result, Err(StoreError::Validation(_))),
            "{minutes} minutes should be rejected"
        );
    }

    for minutes in [1, 1440] {
        let created = create_recipe(form(&[(flour.id, 1)], &[], minutes), &admin, &images(), &pool)
            .await
            .unwrap();
        assert_eq!(created.cooking_time, minutes);
    }
}

#[tokio::test]
async fn favorite_add_and_remove_once() {
    let Some(pool) = pool().await else { return };
    let admin = user(&pool, UserRole::Admin).await;
    let cook = user(&pool, UserRole::User).await;
    let flour = ingredient(&pool, &admin, &unique(), "g").await;
    let pancakes = recipe(&pool, &admin, &[(flour.id, 100)], &[]).await;

    add_relation(RelationKind::Favorite, cook.user_id, pancakes.id, &pool)
        .await
        .unwrap();
    assert!(matches!(
        add_relation(RelationKind::Favorite, cook.user_id, pancakes.id, &pool).await,
        Err(StoreError::DuplicateRelation(RelationKind::Favorite))
    ));

    remove_relation(RelationKind::Favorite, cook.user_id, pancakes.id, &pool)
        .await
        .unwrap();
    assert!(matches!(
        remove_relation(RelationKind::Favorite, cook.user_id, pancakes.id, &pool).await,
        Err(StoreError::RelationNotFound(RelationKind::Favorite))
    ));
}

#[tokio::test]
async fn relation_to_missing_target_is_not_found() {
    let Some(pool) = pool().await else { return };
    let cook = user(&pool, UserRole::User).await;

    assert!(matches!(
        add_relation(RelationKind::ShoppingCart, cook.user_id, Id::MAX, &pool).await,
        Err(StoreError::NotFound("recipe"))
    ));
    assert!(matches!(
        add_relation(RelationKind::Subscription, cook.user_id, Id::MAX, &pool).await,
        Err(StoreError::NotFound("user"))
    ));
}

#[tokio::test]
async fn subscribing_to_yourself_is_forbidden() {
    let Some(pool) = pool().await else { return };
    let cook = user(&pool, UserRole::User).await;

    assert!(matches!(
        add_relation(RelationKind::Subscription, cook.user_id, cook.user_id, &pool).await,
        Err(StoreError::SelfFollowForbidden)
    ));
}

#[tokio::test]
async fn shopping_list_sums_across_recipes() {
    let Some(pool) = pool().await else { return };
    let admin = user(&pool, UserRole::Admin).await;
    let cook = user(&pool, UserRole::User).await;

    assert_eq!(shopping_list_text(cook.user_id, &pool).await.unwrap(), "");

    let suffix = unique();
    let flour = ingredient(&pool, &admin, &format!("Flour {suffix}"), "g").await;
    let sugar = ingredient(&pool, &admin, &format!("Sugar {suffix}"), "g").await;

    let a = recipe(&pool, &admin, &[(flour.id, 200)], &[]).await;
    let b = recipe(&pool, &admin, &[(flour.id, 300), (sugar.id, 50)], &[]).await;

    for id in [a.id, b.id] {
        add_relation(RelationKind::ShoppingCart, cook.user_id, id, &pool)
            .await
            .unwrap();
    }

    let text = shopping_list_text(cook.user_id, &pool).await.unwrap();
    assert_eq!(
        text,
        format!("Flour {suffix} (g) — 500\nSugar {suffix} (g) — 50\n")
    );
}

#[tokio::test]
async fn update_replaces_ingredient_set() {
    let Some(pool) = pool().await else { return };
    let admin = user(&pool, UserRole::Admin).await;
    let a = ingredient(&pool, &admin, &unique(), "g").await;
    let b = ingredient(&pool, &admin, &unique(), "g").await;
    let c = ingredient(&pool, &admin, &unique(), "g").await;

    let created = recipe(&pool, &admin, &[(a.id, 1), (b.id, 2)], &[]).await;

    let mut replacement = form(&[(c.id, 3)], &[], 30);
    replacement.image = None;
    let updated = update_recipe(created.id, replacement, &admin, &images(), &pool)
        .await
        .unwrap();

    let parts = list_recipe_parts(&[created.id], &pool).await.unwrap();
    assert_eq!(parts.len(), 1);
    assert_eq!(parts[0].ingredient_id, c.id);
    assert_eq!(parts[0].amount, 3);

    assert_eq!(updated.image, created.image);
    assert_eq!(updated.pub_date, created.pub_date);
    assert_eq!(updated.cooking_time, 30);
}

#[tokio::test]
async fn only_the_author_may_update() {
    let Some(pool) = pool().await else { return };
    let admin = user(&pool, UserRole::Admin).await;
    let author = user(&pool, UserRole::User).await;
    let stranger = user(&pool, UserRole::User).await;
    let flour = ingredient(&pool, &admin, &unique(), "g").await;

    let created = recipe(&pool, &author, &[(flour.id, 1)], &[]).await;

    let result = update_recipe(created.id, form(&[(flour.id, 2)], &[], 5), &stranger, &images(), &pool).await;
    assert!(matches!(result, Err(StoreError::PermissionDenied(_))));

    let mut edit = form(&[(flour.id, 2)], &[], 5);
    edit.image = None;
    update_recipe(created.id, edit, &admin, &images(), &pool)
        .await
        .unwrap();
}

#[tokio::test]
async fn tag_filter_matches_any_tag() {
    let Some(pool) = pool().await else { return };
    let admin = user(&pool, UserRole::Admin).await;
    let author = user(&pool, UserRole::User).await;
    let flour = ingredient(&pool, &admin, &unique(), "g").await;
    let breakfast = tag(&pool, &admin).await;
    let vegan = tag(&pool, &admin).await;
    let dinner = tag(&pool, &admin).await;

    let only_breakfast = recipe(&pool, &author, &[(flour.id, 1)], &[breakfast.id]).await;
    let both = recipe(&pool, &author, &[(flour.id, 1)], &[breakfast.id, vegan.id]).await;
    let only_dinner = recipe(&pool, &author, &[(flour.id, 1)], &[dinner.id]).await;

    let filter = RecipeFilter {
        author: Some(author.user_id),
        tags: vec![breakfast.slug.clone(), vegan.slug.clone()],
        ..Default::default()
    };
    let page = fetch_recipes(&filter, all(), None, &pool).await.unwrap();
    let ids: Vec<Id> = page.results.iter().map(|r| r.id).collect();

    assert_eq!(page.count, 2);
    assert!(ids.contains(&only_breakfast.id));
    assert!(ids.contains(&both.id));
    assert!(!ids.contains(&only_dinner.id));
}

#[tokio::test]
async fn favorite_flag_includes_or_excludes() {
    let Some(pool) = pool().await else { return };
    let admin = user(&pool, UserRole::Admin).await;
    let author = user(&pool, UserRole::User).await;
    let fan = user(&pool, UserRole::User).await;
    let flour = ingredient(&pool, &admin, &unique(), "g").await;

    let liked = recipe(&pool, &author, &[(flour.id, 1)], &[]).await;
    let other = recipe(&pool, &author, &[(flour.id, 1)], &[]).await;
    add_relation(RelationKind::Favorite, fan.user_id, liked.id, &pool)
        .await
        .unwrap();

    let mut filter = RecipeFilter {
        author: Some(author.user_id),
        is_favorited: Some(true),
        ..Default::default()
    };
    let page = fetch_recipes(&filter, all(), Some(fan.user_id), &pool)
        .await
        .unwrap();
    assert_eq!(page.results.iter().map(|r| r.id).collect::<Vec<_>>(), vec![liked.id]);

    filter.is_favorited = Some(false);
    let page = fetch_recipes(&filter, all(), Some(fan.user_id), &pool)
        .await
        .unwrap();
    assert_eq!(page.results.iter().map(|r| r.id).collect::<Vec<_>>(), vec![other.id]);

    let page = fetch_recipes(&filter, all(), None, &pool).await.unwrap();
    assert_eq!(page.count, 2);
}

#[tokio::test]
async fn referenced_ingredient_cannot_be_deleted() {
    let Some(pool) = pool().await else { return };
    let admin = user(&pool, UserRole::Admin).await;
    let flour = ingredient(&pool, &admin, &unique(), "g").await;
    let spare = ingredient(&pool, &admin, &unique(), "g").await;

    let created = recipe(&pool, &admin, &[(flour.id, 1)], &[]).await;

    assert!(matches!(
        delete_ingredient(flour.id, &admin, &pool).await,
        Err(StoreError::Validation(_))
    ));
    delete_ingredient(spare.id, &admin, &pool).await.unwrap();

    get_recipe(created.id, &pool).await.unwrap();
}

#[tokio::test]
async fn login_checks_password() {
    let Some(pool) = pool().await else { return };
    let cook = user(&pool, UserRole::User).await;
    let keys = SessionKeys::new(b"store-tests", chrono::Duration::hours(1)).unwrap();

    let token = login_user(
        Credentials {
            email: cook.email.clone(),
            password: "correct horse".to_string(),
        },
        &keys,
        &pool,
    )
    .await
    .unwrap();
    assert_eq!(keys.verify_jwt_session(&token).unwrap().user_id, cook.user_id);

    let wrong = login_user(
        Credentials {
            email: cook.email,
            password: "battery staple".to_string(),
        },
        &keys,
        &pool,
    )
    .await;
    assert!(matches!(wrong, Err(StoreError::Validation(_))));
}

#[tokio::test]
async fn ingredient_search_matches_non_ascii_prefix() {
    let Some(pool) = pool().await else { return };
    let admin = user(&pool, UserRole::Admin).await;
    let name = format!("Мука{}", unique());
    let flour = ingredient(&pool, &admin, &name, "г").await;

    let hits = search_ingredients(Some("Мука"), &pool).await.unwrap();
    assert!(hits.iter().any(|i| i.id == flour.id));

    let hits = search_ingredients(Some(&name), &pool).await.unwrap();
    assert_eq!(hits.iter().map(|i| i.id).collect::<Vec<_>>(), vec![flour.id]);

    let hits = search_ingredients(Some("ука"), &pool).await.unwrap();
    assert!(!hits.iter().any(|i| i.id == flour.id));
}

#[tokio::test]
async fn referenced_tag_cannot_be_deleted() {
    let Some(pool) = pool().await else { return };
    let admin = user(&pool, UserRole::Admin).await;
    let flour = ingredient(&pool, &admin, &unique(), "g").await;
    let used = tag(&pool, &admin).await;
    let spare = tag(&pool, &admin).await;

    let created = recipe(&pool, &admin, &[(flour.id, 1)], &[used.id]).await;

    assert!(matches!(
        delete_tag(used.id, &admin, &pool).await,
        Err(StoreError::Validation(_))
    ));
    delete_tag(spare.id, &admin, &pool).await.unwrap();
    assert!(matches!(
        delete_tag(spare.id, &admin, &pool).await,
        Err(StoreError::NotFound("tag"))
    ));

    get_recipe(created.id, &pool).await.unwrap();
}

#[tokio::test]
async fn shopping_cart_flag_includes_or_excludes() {
    let Some(pool) = pool().await else { return };
    let admin = user(&pool, UserRole::Admin).await;
    let author = user(&pool, UserRole::User).await;
    let shopper = user(&pool, UserRole::User).await;
    let flour = ingredient(&pool, &admin, &unique(), "g").await;

    let planned = recipe(&pool, &author, &[(flour.id, 1)], &[]).await;
    let other = recipe(&pool, &author, &[(flour.id, 1)], &[]).await;
    add_relation(RelationKind::ShoppingCart, shopper.user_id, planned.id, &pool)
        .await
        .unwrap();

    let mut filter = RecipeFilter {
        author: Some(author.user_id),
        is_in_shopping_cart: Some(true),
        ..Default::default()
    };
    let page = fetch_recipes(&filter, all(), Some(shopper.user_id), &pool)
        .await
        .unwrap();
    assert_eq!(page.results.iter().map(|r| r.id).collect::<Vec<_>>(), vec![planned.id]);

    filter.is_in_shopping_cart = Some(false);
    let page = fetch_recipes(&filter, all(), Some(shopper.user_id), &pool)
        .await
        .unwrap();
    assert_eq!(page.results.iter().map(|r| r.id).collect::<Vec<_>>(), vec![other.id]);

    let page = fetch_recipes(&filter, all(), None, &pool).await.unwrap();
    assert_eq!(page.count, 2);
}

#[tokio::test]
async fn duplicate_subscription_is_rejected() {
    let Some(pool) = pool().await else { return };
    let reader = user(&pool, UserRole::User).await;
    let author = user(&pool, UserRole::User).await;

    add_relation(RelationKind::Subscription, reader.user_id, author.user_id, &pool)
        .await
        .unwrap();

    assert!(matches!(
        add_relation(RelationKind::Subscription, reader.user_id, author.user_id, &pool).await,
        Err(StoreError::DuplicateRelation(RelationKind::Subscription))
    ));
}

#[tokio::test]
async fn concurrent_subscriptions_succeed_once() {
    let Some(pool) = pool().await else { return };
    let reader = user(&pool, UserRole::User).await;
    let author = user(&pool, UserRole::User).await;

    let tasks: Vec<_> = (0..16)
        .map(|_| {
            let pool = pool.clone();
            let (reader, author) = (reader.user_id, author.user_id);
            tokio::spawn(async move {
                add_relation(RelationKind::Subscription, reader, author, &pool).await
            })
        })
        .collect();

    let mut added = 0;
    let mut duplicates = 0;
    for task in tasks {
        match task.await.unwrap() {
            Ok(()) => added += 1,
            Err(StoreError::DuplicateRelation(RelationKind::Subscription)) => duplicates += 1,
            Err(other) => panic!("unexpected error {other:?}"),
        }
    }

    assert_eq!(added, 1);
    assert_eq!(duplicates, 15);
}
