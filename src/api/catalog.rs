use serde::Deserialize;
use warp::{http::StatusCode, reject::Rejection, Reply};

use crate::{
    actions::{
        create_ingredient, create_tag, delete_ingredient, delete_tag, get_ingredient, get_tag,
        list_tags, search_ingredients, update_ingredient, update_tag,
    },
    jwt::SessionData,
    schema::{Id, IngredientForm, TagForm},
};

use super::context::Context;

#[derive(Deserialize, Debug, Default)]
pub struct IngredientQuery {
    pub name: Option<String>,
}

pub async fn tags(context: Context) -> Result<impl Reply, Rejection> {
    Ok(warp::reply::json(&list_tags(&context.pool).await?))
}

pub async fn tag(id: Id, context: Context) -> Result<impl Reply, Rejection> {
    Ok(warp::reply::json(&get_tag(id, &context.pool).await?))
}

pub async fn new_tag(
    form: TagForm,
    session: SessionData,
    context: Context,
) -> Result<impl Reply, Rejection> {
    let tag = create_tag(form, &session, &context.pool).await?;

    Ok(warp::reply::with_status(
        warp::reply::json(&tag),
        StatusCode::CREATED,
    ))
}

pub async fn edit_tag(
    id: Id,
    form: TagForm,
    session: SessionData,
    context: Context,
) -> Result<impl Reply, Rejection> {
    Ok(warp::reply::json(
        &update_tag(id, form, &session, &context.pool).await?,
    ))
}

pub async fn remove_tag(
    id: Id,
    session: SessionData,
    context: Context,
) -> Result<impl Reply, Rejection> {
    delete_tag(id, &session, &context.pool).await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn ingredients(query: IngredientQuery, context: Context) -> Result<impl Reply, Rejection> {
    let list = search_ingredients(query.name.as_deref(), &context.pool).await?;

    Ok(warp::reply::json(&list))
}

pub async fn ingredient(id: Id, context: Context) -> Result<impl Reply, Rejection> {
    Ok(warp::reply::json(&get_ingredient(id, &context.pool).await?))
}

pub async fn new_ingredient(
    form: IngredientForm,
    session: SessionData,
    context: Context,
) -> Result<impl Reply, Rejection> {
    let ingredient = create_ingredient(form, &session, &context.pool).await?;

    Ok(warp::reply::with_status(
        warp::reply::json(&ingredient),
        StatusCode::CREATED,
    ))
}

pub async fn edit_ingredient(
    id: Id,
    form: IngredientForm,
    session: SessionData,
    context: Context,
) -> Result<impl Reply, Rejection> {
    Ok(warp::reply::json(
        &update_ingredient(id, form, &session, &context.pool).await?,
    ))
}

pub async fn remove_ingredient(
    id: Id,
    session: SessionData,
    context: Context,
) -> Result<impl Reply, Rejection> {
    delete_ingredient(id, &session, &context.pool).await?;

    Ok(StatusCode::NO_CONTENT)
}
