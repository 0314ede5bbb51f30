use warp::{
    http::StatusCode,
    hyper::body::Bytes,
    reject::Rejection,
    Reply,
};

use crate::{
    actions::{
        add_relation, create_recipe, delete_recipe, fetch_recipes, get_recipe, remove_relation,
        set_recipe_image, shopping_list_text, update_recipe,
    },
    constants::SHOPPING_LIST_FILE_NAME,
    error::StoreError,
    filters::RecipeQuery,
    jwt::SessionData,
    media::image::extension_from_content_type,
    permissions::ActionType,
    schema::{Id, RecipeForm, RelationKind},
};

use super::{
    context::Context,
    representation::{recipe_view, recipe_views, ShortRecipe},
};

pub async fn list(
    pairs: Vec<(String, String)>,
    viewer: Option<SessionData>,
    context: Context,
) -> Result<impl Reply, Rejection> {
    let query = RecipeQuery::from_pairs(pairs)?;
    let request = context.pages.request(query.page, query.limit);
    let viewer = viewer.map(|s| s.user_id);

    let mut page = fetch_recipes(&query.filter, request, viewer, &context.pool).await?;

    let recipes = std::mem::take(&mut page.results);
    let views = recipe_views(recipes, viewer, &context.images, &context.pool).await?;

    Ok(warp::reply::json(&page.with_results(views)))
}

pub async fn detail(
    id: Id,
    viewer: Option<SessionData>,
    context: Context,
) -> Result<impl Reply, Rejection> {
    let recipe = get_recipe(id, &context.pool).await?;
    let view = recipe_view(
        recipe,
        viewer.map(|s| s.user_id),
        &context.images,
        &context.pool,
    )
    .await?;

    Ok(warp::reply::json(&view))
}

pub async fn create(
    form: RecipeForm,
    session: SessionData,
    context: Context,
) -> Result<impl Reply, Rejection> {
    let recipe = create_recipe(form, &session, &context.images, &context.pool).await?;
    let view = recipe_view(
        recipe,
        Some(session.user_id),
        &context.images,
        &context.pool,
    )
    .await?;

    Ok(warp::reply::with_status(
        warp::reply::json(&view),
        StatusCode::CREATED,
    ))
}

pub async fn update(
    id: Id,
    form: RecipeForm,
    session: SessionData,
    context: Context,
) -> Result<impl Reply, Rejection> {
    let recipe = update_recipe(id, form, &session, &context.images, &context.pool).await?;
    let view = recipe_view(
        recipe,
        Some(session.user_id),
        &context.images,
        &context.pool,
    )
    .await?;

    Ok(warp::reply::json(&view))
}

pub async fn upload_image(
    id: Id,
    content_type: String,
    bytes: Bytes,
    session: SessionData,
    context: Context,
) -> Result<impl Reply, Rejection> {
    let extension = extension_from_content_type(&content_type)
        .ok_or_else(|| StoreError::invalid("image", "Content-Type must be image/<format>"))?;

    let recipe = set_recipe_image(
        id,
        &bytes,
        &extension,
        &session,
        &context.images,
        &context.pool,
    )
    .await?;

    Ok(warp::reply::json(&ShortRecipe::new(recipe, &context.images)))
}

pub async fn delete(id: Id, session: SessionData, context: Context) -> Result<impl Reply, Rejection> {
    delete_recipe(id, &session, &context.images, &context.pool).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// POST on `/favorite` or `/shopping_cart`.
pub async fn add_to(
    id: Id,
    kind: RelationKind,
    session: SessionData,
    context: Context,
) -> Result<impl Reply, Rejection> {
    session.authenticate(ActionType::ManageOwnRelations)?;
    add_relation(kind, session.user_id, id, &context.pool).await?;

    let recipe = get_recipe(id, &context.pool).await?;

    Ok(warp::reply::with_status(
        warp::reply::json(&ShortRecipe::new(recipe, &context.images)),
        StatusCode::CREATED,
    ))
}

pub async fn remove_from(
    id: Id,
    kind: RelationKind,
    session: SessionData,
    context: Context,
) -> Result<impl Reply, Rejection> {
    session.authenticate(ActionType::ManageOwnRelations)?;
    remove_relation(kind, session.user_id, id, &context.pool).await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn download_shopping_cart(
    session: SessionData,
    context: Context,
) -> Result<impl Reply, Rejection> {
    let text = shopping_list_text(session.user_id, &context.pool).await?;

    Ok(warp::reply::with_header(
        text,
        "content-disposition",
        format!("attachment; filename=\"{SHOPPING_LIST_FILE_NAME}\""),
    ))
}
