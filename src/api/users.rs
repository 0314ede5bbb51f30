use serde::Deserialize;
use warp::{http::StatusCode, reject::Rejection, Reply};

use crate::{
    actions::{
        add_relation, list_subscriptions, list_users, register_user, remove_relation,
        require_user, set_password,
    },
    error::StoreError,
    jwt::SessionData,
    permissions::ActionType,
    schema::{Id, NewUser, PasswordChange, RelationKind},
};

use super::{
    context::Context,
    representation::{authors_with_recipes, user_view, user_views, UserView},
};

#[derive(Deserialize, Debug, Default)]
pub struct UserListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub recipes_limit: Option<i64>,
}

impl UserListQuery {
    fn recipes_limit(&self) -> Option<i64> {
        self.recipes_limit.filter(|limit| *limit >= 0)
    }
}

pub async fn list(
    query: UserListQuery,
    viewer: Option<SessionData>,
    context: Context,
) -> Result<impl Reply, Rejection> {
    let request = context.pages.request(query.page, query.limit);
    let mut page = list_users(request, &context.pool).await?;

    let users = std::mem::take(&mut page.results);
    let views = user_views(users, viewer.map(|s| s.user_id), &context.pool).await?;

    Ok(warp::reply::json(&page.with_results(views)))
}

pub async fn register(new_user: NewUser, context: Context) -> Result<impl Reply, Rejection> {
    let user = register_user(new_user, &context.pool).await?;
    let view = UserView::new(user, false);

    Ok(warp::reply::with_status(
        warp::reply::json(&view),
        StatusCode::CREATED,
    ))
}

pub async fn me(session: SessionData, context: Context) -> Result<impl Reply, Rejection> {
    let user = require_user(session.user_id, &context.pool).await?;
    let view = user_view(user, Some(session.user_id), &context.pool).await?;

    Ok(warp::reply::json(&view))
}

pub async fn detail(
    id: Id,
    viewer: Option<SessionData>,
    context: Context,
) -> Result<impl Reply, Rejection> {
    let user = require_user(id, &context.pool).await?;
    let view = user_view(user, viewer.map(|s| s.user_id), &context.pool).await?;

    Ok(warp::reply::json(&view))
}

pub async fn change_password(
    change: PasswordChange,
    session: SessionData,
    context: Context,
) -> Result<impl Reply, Rejection> {
    set_password(change, &session, &context.pool).await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn subscriptions(
    query: UserListQuery,
    session: SessionData,
    context: Context,
) -> Result<impl Reply, Rejection> {
    let request = context.pages.request(query.page, query.limit);
    let mut page = list_subscriptions(session.user_id, request, &context.pool).await?;

    let authors = std::mem::take(&mut page.results);
    let views = authors_with_recipes(
        authors,
        Some(session.user_id),
        query.recipes_limit(),
        &context.images,
        &context.pool,
    )
    .await?;

    Ok(warp::reply::json(&page.with_results(views)))
}

pub async fn subscribe(
    id: Id,
    query: UserListQuery,
    session: SessionData,
    context: Context,
) -> Result<impl Reply, Rejection> {
    session.authenticate(ActionType::ManageOwnRelations)?;
    add_relation(RelationKind::Subscription, session.user_id, id, &context.pool).await?;

    let author = require_user(id, &context.pool).await?;
    let mut views = authors_with_recipes(
        vec![author],
        Some(session.user_id),
        query.recipes_limit(),
        &context.images,
        &context.pool,
    )
    .await?;

    match views.pop() {
        Some(view) => Ok(warp::reply::with_status(
            warp::reply::json(&view),
            StatusCode::CREATED,
        )),
        None => Err(StoreError::NotFound("user").into()),
    }
}

pub async fn unsubscribe(
    id: Id,
    session: SessionData,
    context: Context,
) -> Result<impl Reply, Rejection> {
    session.authenticate(ActionType::ManageOwnRelations)?;
    remove_relation(RelationKind::Subscription, session.user_id, id, &context.pool).await?;

    Ok(StatusCode::NO_CONTENT)
}
