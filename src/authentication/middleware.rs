use std::sync::Arc;

use warp::{reject::Rejection, Filter};

use crate::error::StoreError;

use super::jwt::{SessionData, SessionKeys};

/// Resolves the acting user from the `Authorization` header. A missing header
/// means an anonymous request; a header carrying a bad token is rejected.
pub fn with_possible_session(
    keys: Arc<SessionKeys>,
) -> impl Filter<Extract = (Option<SessionData>,), Error = Rejection> + Clone {
    warp::header::optional::<String>("authorization").and_then(move |header: Option<String>| {
        let keys = keys.clone();
        async move {
            match header {
                Some(header) => keys
                    .verify_header(&header)
                    .map(Some)
                    .map_err(Rejection::from),
                None => Ok(None),
            }
        }
    })
}

pub fn with_session(
    keys: Arc<SessionKeys>,
) -> impl Filter<Extract = (SessionData,), Error = Rejection> + Clone {
    with_possible_session(keys).and_then(|session: Option<SessionData>| async move {
        session.ok_or_else(|| Rejection::from(StoreError::Unauthenticated))
    })
}
