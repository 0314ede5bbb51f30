use std::convert::Infallible;

use serde::de::DeserializeOwned;
use warp::{filters::BoxedFilter, reject::Rejection, Filter, Reply};

use crate::{
    constants::MAX_BODY_BYTES,
    middleware::{with_possible_session, with_session},
    schema::{Id, RelationKind},
};

use super::{
    auth, catalog,
    catalog::IngredientQuery,
    context::{with_context, Context},
    recipes,
    rejection::handle_rejection,
    users,
    users::UserListQuery,
};

fn json_body<T: DeserializeOwned + Send>() -> impl Filter<Extract = (T,), Error = Rejection> + Clone {
    warp::body::content_length_limit(MAX_BODY_BYTES).and(warp::body::json())
}

fn relation(kind: RelationKind) -> impl Filter<Extract = (RelationKind,), Error = Infallible> + Clone {
    warp::any().map(move || kind)
}

fn auth_routes(context: &Context) -> BoxedFilter<(impl Reply,)> {
    let ctx = with_context(context.clone());
    let session = with_session(context.keys.clone());

    let login = warp::path!("api" / "auth" / "token" / "login")
        .and(warp::post())
        .and(json_body())
        .and(ctx)
        .and_then(auth::login);

    let logout = warp::path!("api" / "auth" / "token" / "logout")
        .and(warp::post())
        .and(session)
        .and_then(auth::logout);

    login.or(logout).boxed()
}

fn user_routes(context: &Context) -> BoxedFilter<(impl Reply,)> {
    let ctx = with_context(context.clone());
    let session = with_session(context.keys.clone());
    let maybe_session = with_possible_session(context.keys.clone());

    let list = warp::path!("api" / "users")
        .and(warp::get())
        .and(warp::query::<UserListQuery>())
        .and(maybe_session.clone())
        .and(ctx.clone())
        .and_then(users::list);

    let register = warp::path!("api" / "users")
        .and(warp::post())
        .and(json_body())
        .and(ctx.clone())
        .and_then(users::register);

    let me = warp::path!("api" / "users" / "me")
        .and(warp::get())
        .and(session.clone())
        .and(ctx.clone())
        .and_then(users::me);

    let set_password = warp::path!("api" / "users" / "set_password")
        .and(warp::post())
        .and(json_body())
        .and(session.clone())
        .and(ctx.clone())
        .and_then(users::change_password);

    let subscriptions = warp::path!("api" / "users" / "subscriptions")
        .and(warp::get())
        .and(warp::query::<UserListQuery>())
        .and(session.clone())
        .and(ctx.clone())
        .and_then(users::subscriptions);

    let detail = warp::path!("api" / "users" / Id)
        .and(warp::get())
        .and(maybe_session)
        .and(ctx.clone())
        .and_then(users::detail);

    let subscribe = warp::path!("api" / "users" / Id / "subscribe")
        .and(warp::post())
        .and(warp::query::<UserListQuery>())
        .and(session.clone())
        .and(ctx.clone())
        .and_then(users::subscribe);

    let unsubscribe = warp::path!("api" / "users" / Id / "subscribe")
        .and(warp::delete())
        .and(session)
        .and(ctx)
        .and_then(users::unsubscribe);

    list.or(register)
        .or(me)
        .or(set_password)
        .or(subscriptions)
        .or(detail)
        .or(subscribe)
        .or(unsubscribe)
        .boxed()
}

fn catalog_routes(context: &Context) -> BoxedFilter<(impl Reply,)> {
    let ctx = with_context(context.clone());
    let session = with_session(context.keys.clone());

    let tags = warp::path!("api" / "tags")
        .and(warp::get())
        .and(ctx.clone())
        .and_then(catalog::tags);

    let new_tag = warp::path!("api" / "tags")
        .and(warp::post())
        .and(json_body())
        .and(session.clone())
        .and(ctx.clone())
        .and_then(catalog::new_tag);

    let tag = warp::path!("api" / "tags" / Id)
        .and(warp::get())
        .and(ctx.clone())
        .and_then(catalog::tag);

    let edit_tag = warp::path!("api" / "tags" / Id)
        .and(warp::patch())
        .and(json_body())
        .and(session.clone())
        .and(ctx.clone())
        .and_then(catalog::edit_tag);

    let remove_tag = warp::path!("api" / "tags" / Id)
        .and(warp::delete())
        .and(session.clone())
        .and(ctx.clone())
        .and_then(catalog::remove_tag);

    let ingredients = warp::path!("api" / "ingredients")
        .and(warp::get())
        .and(warp::query::<IngredientQuery>())
        .and(ctx.clone())
        .and_then(catalog::ingredients);

    let new_ingredient = warp::path!("api" / "ingredients")
        .and(warp::post())
        .and(json_body())
        .and(session.clone())
        .and(ctx.clone())
        .and_then(catalog::new_ingredient);

    let ingredient = warp::path!("api" / "ingredients" / Id)
        .and(warp::get())
        .and(ctx.clone())
        .and_then(catalog::ingredient);

    let edit_ingredient = warp::path!("api" / "ingredients" / Id)
        .and(warp::patch())
        .and(json_body())
        .and(session.clone())
        .and(ctx.clone())
        .and_then(catalog::edit_ingredient);

    let remove_ingredient = warp::path!("api" / "ingredients" / Id)
        .and(warp::delete())
        .and(session)
        .and(ctx)
        .and_then(catalog::remove_ingredient);

    tags.or(new_tag)
        .or(tag)
        .or(edit_tag)
        .or(remove_tag)
        .or(ingredients)
        .or(new_ingredient)
        .or(ingredient)
        .or(edit_ingredient)
        .or(remove_ingredient)
        .boxed()
}

/// `POST` adds the recipe to the relation, `DELETE` takes it out.
fn relation_routes(
    segment: &'static str,
    kind: RelationKind,
    context: &Context,
) -> BoxedFilter<(impl Reply,)> {
    let ctx = with_context(context.clone());
    let session = with_session(context.keys.clone());

    let path = warp::path("api")
        .and(warp::path("recipes"))
        .and(warp::path::param::<Id>())
        .and(warp::path(segment))
        .and(warp::path::end());

    let add = path
        .clone()
        .and(warp::post())
        .and(relation(kind))
        .and(session.clone())
        .and(ctx.clone())
        .and_then(recipes::add_to);

    let remove = path
        .and(warp::delete())
        .and(relation(kind))
        .and(session)
        .and(ctx)
        .and_then(recipes::remove_from);

    add.or(remove).boxed()
}

fn recipe_routes(context: &Context) -> BoxedFilter<(impl Reply,)> {
    let ctx = with_context(context.clone());
    let session = with_session(context.keys.clone());
    let maybe_session = with_possible_session(context.keys.clone());

    let list = warp::path!("api" / "recipes")
        .and(warp::get())
        .and(warp::query::<Vec<(String, String)>>())
        .and(maybe_session.clone())
        .and(ctx.clone())
        .and_then(recipes::list);

    let create = warp::path!("api" / "recipes")
        .and(warp::post())
        .and(json_body())
        .and(session.clone())
        .and(ctx.clone())
        .and_then(recipes::create);

    let download = warp::path!("api" / "recipes" / "download_shopping_cart")
        .and(warp::get())
        .and(session.clone())
        .and(ctx.clone())
        .and_then(recipes::download_shopping_cart);

    let detail = warp::path!("api" / "recipes" / Id)
        .and(warp::get())
        .and(maybe_session)
        .and(ctx.clone())
        .and_then(recipes::detail);

    let update = warp::path!("api" / "recipes" / Id)
        .and(warp::patch())
        .and(json_body())
        .and(session.clone())
        .and(ctx.clone())
        .and_then(recipes::update);

    let delete = warp::path!("api" / "recipes" / Id)
        .and(warp::delete())
        .and(session.clone())
        .and(ctx.clone())
        .and_then(recipes::delete);

    let image = warp::path!("api" / "recipes" / Id / "image")
        .and(warp::put())
        .and(warp::header::<String>("content-type"))
        .and(warp::body::content_length_limit(MAX_BODY_BYTES))
        .and(warp::body::bytes())
        .and(session.clone())
        .and(ctx.clone())
        .and_then(recipes::upload_image);

    let favorite = relation_routes("favorite", RelationKind::Favorite, context);
    let shopping_cart = relation_routes("shopping_cart", RelationKind::ShoppingCart, context);

    list.or(create)
        .or(download)
        .or(detail)
        .or(update)
        .or(delete)
        .or(image)
        .or(favorite)
        .or(shopping_cart)
        .boxed()
}

/// Stored images, served below the path of the configured media url.
fn media_routes(context: &Context) -> BoxedFilter<(impl Reply,)> {
    let prefix = context
        .images
        .route_segments()
        .into_iter()
        .fold(warp::any().boxed(), |prefix, segment| {
            prefix.and(warp::path(segment)).boxed()
        });

    prefix
        .and(warp::fs::dir(context.images.root().to_path_buf()))
        .boxed()
}

pub fn routes(context: Context) -> impl Filter<Extract = (impl Reply,), Error = Infallible> + Clone {
    let media = media_routes(&context);

    auth_routes(&context)
        .or(user_routes(&context))
        .or(catalog_routes(&context))
        .or(recipe_routes(&context))
        .or(media)
        .recover(handle_rejection)
        .with(warp::log("foodgram::api"))
}
