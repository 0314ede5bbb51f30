mod database {
    pub mod actions;
    pub mod error;
    pub mod filters;
    pub mod pagination;
    pub mod pool;
    pub mod schema;
    pub mod shopping_list;
    pub mod validation;
}
mod authentication {
    pub mod cryptography;
    pub mod jwt;
    pub mod middleware;
    pub mod permissions;
}
pub mod api {
    pub mod auth;
    pub mod catalog;
    pub mod context;
    pub mod recipes;
    pub mod rejection;
    pub mod representation;
    pub mod routes;
    pub mod users;
}
pub mod media {
    pub mod image;
}
pub mod config;
mod constants;

pub use authentication::*;
pub use constants::*;
pub use database::*;
