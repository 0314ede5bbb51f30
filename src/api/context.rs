use std::{convert::Infallible, sync::Arc};

use sqlx::{Pool, Postgres};
use warp::Filter;

use crate::{
    config::Config, error::StoreError, jwt::SessionKeys, media::image::ImageStore,
    pagination::PageSettings,
};

/// Everything a handler needs, cloned into each request.
#[derive(Clone)]
pub struct Context {
    pub pool: Pool<Postgres>,
    pub keys: Arc<SessionKeys>,
    pub images: Arc<ImageStore>,
    pub pages: PageSettings,
}

impl Context {
    pub fn new(config: &Config, pool: Pool<Postgres>) -> Result<Self, StoreError> {
        Ok(Self {
            pool,
            keys: Arc::new(SessionKeys::new(
                config.jwt_secret.as_bytes(),
                config.session_lifetime(),
            )?),
            images: Arc::new(ImageStore::new(&config.media_root, &config.media_url)),
            pages: config.page_settings(),
        })
    }
}

pub fn with_context(context: Context) -> impl Filter<Extract = (Context,), Error = Infallible> + Clone {
    warp::any().map(move || context.clone())
}
