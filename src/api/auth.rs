use serde_json::json;
use warp::{http::StatusCode, reject::Rejection, Reply};

use crate::{actions::login_user, jwt::SessionData, schema::Credentials};

use super::context::Context;

pub async fn login(credentials: Credentials, context: Context) -> Result<impl Reply, Rejection> {
    let token = login_user(credentials, &context.keys, &context.pool).await?;

    Ok(warp::reply::json(&json!({ "auth_token": token })))
}

/// Tokens are stateless and simply expire.
pub async fn logout(session: SessionData) -> Result<impl Reply, Rejection> {
    log::debug!("User {} logged out", session.user_id);

    Ok(StatusCode::NO_CONTENT)
}
