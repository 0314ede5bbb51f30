use std::convert::Infallible;

use serde_json::{json, Value};
use warp::{
    filters::body::BodyDeserializeError,
    http::StatusCode,
    reject::{
        InvalidHeader, InvalidQuery, MethodNotAllowed, MissingHeader, PayloadTooLarge, Rejection,
        UnsupportedMediaType,
    },
    Reply,
};

use crate::error::StoreError;

fn detail(message: impl ToString) -> Value {
    json!({ "detail": message.to_string() })
}

fn store_error_body(error: &StoreError) -> Value {
    match error {
        StoreError::Validation(fields) => json!(fields),
        StoreError::Query(_) | StoreError::Internal(_) => {
            log::error!("Request failed: {error}");
            detail("Internal server error")
        }
        other => detail(other),
    }
}

/// Turns every rejection into a JSON response.
pub async fn handle_rejection(rejection: Rejection) -> Result<impl Reply, Infallible> {
    let (status, body) = if rejection.is_not_found() {
        (StatusCode::NOT_FOUND, detail("Not found"))
    } else if let Some(error) = rejection.find::<StoreError>() {
        (error.status(), store_error_body(error))
    } else if let Some(e) = rejection.find::<BodyDeserializeError>() {
        (StatusCode::BAD_REQUEST, json!({ "non_field_errors": [e.to_string()] }))
    } else if let Some(e) = rejection.find::<InvalidQuery>() {
        (StatusCode::BAD_REQUEST, detail(e))
    } else if let Some(e) = rejection.find::<MissingHeader>() {
        (StatusCode::BAD_REQUEST, detail(e))
    } else if let Some(e) = rejection.find::<InvalidHeader>() {
        (StatusCode::BAD_REQUEST, detail(e))
    } else if let Some(e) = rejection.find::<PayloadTooLarge>() {
        (StatusCode::PAYLOAD_TOO_LARGE, detail(e))
    } else if let Some(e) = rejection.find::<UnsupportedMediaType>() {
        (StatusCode::UNSUPPORTED_MEDIA_TYPE, detail(e))
    } else if rejection.find::<MethodNotAllowed>().is_some() {
        (StatusCode::METHOD_NOT_ALLOWED, detail("Method not allowed"))
    } else {
        log::error!("Unhandled rejection: {rejection:?}");
        (StatusCode::INTERNAL_SERVER_ERROR, detail("Internal server error"))
    };

    Ok(warp::reply::with_status(warp::reply::json(&body), status))
}
