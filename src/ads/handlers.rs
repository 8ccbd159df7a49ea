use axum::{
    extract::{Path, State},
    response::Redirect,
    routing::get,
    Form, Json, Router,
};
use time::OffsetDateTime;
use tracing::instrument;

use super::dto::{AdForm, AdInput, AdView};
use super::services;
use crate::{auth::AuthUser, error::AppResult, state::AppState};

const ALL: &str = "/Ad/All";
const CART: &str = "/Ad/Cart";

pub fn ad_routes() -> Router<AppState> {
    Router::new()
        .route(ALL, get(all))
        .route("/Ad/Add", get(add_form).post(add))
        .route("/Ad/AddToCart/:id", get(add_to_cart))
        .route(CART, get(cart))
        .route("/Ad/RemoveFromCart/:id", get(remove_from_cart))
        .route("/Ad/Edit/:id", get(edit_form).post(edit))
}

#[instrument(skip(state))]
pub async fn all(
    State(state): State<AppState>,
    AuthUser(_user_id): AuthUser,
) -> AppResult<Json<Vec<AdView>>> {
    Ok(Json(services::list_all(state.ads.as_ref()).await?))
}

#[instrument(skip(state))]
pub async fn add_form(
    State(state): State<AppState>,
    AuthUser(_user_id): AuthUser,
) -> AppResult<Json<AdForm>> {
    Ok(Json(services::empty_form(state.ads.as_ref()).await?))
}

#[instrument(skip(state))]
pub async fn add(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Form(input): Form<AdInput>,
) -> AppResult<Redirect> {
    services::create_ad(state.ads.as_ref(), user_id, input, OffsetDateTime::now_utc()).await?;
    Ok(Redirect::to(ALL))
}

#[instrument(skip(state))]
pub async fn add_to_cart(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<i32>,
) -> AppResult<Redirect> {
    services::add_to_cart(state.ads.as_ref(), user_id, id).await?;
    Ok(Redirect::to(CART))
}

#[instrument(skip(state))]
pub async fn cart(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> AppResult<Json<Vec<AdView>>> {
    Ok(Json(services::cart(state.ads.as_ref(), user_id).await?))
}

#[instrument(skip(state))]
pub async fn remove_from_cart(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<i32>,
) -> AppResult<Redirect> {
    services::remove_from_cart(state.ads.as_ref(), user_id, id).await?;
    Ok(Redirect::to(ALL))
}

#[instrument(skip(state))]
pub async fn edit_form(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<i32>,
) -> AppResult<Json<AdForm>> {
    Ok(Json(services::edit_form(state.ads.as_ref(), user_id, id).await?))
}

#[instrument(skip(state))]
pub async fn edit(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<i32>,
    Form(input): Form<AdInput>,
) -> AppResult<Redirect> {
    services::update_ad(state.ads.as_ref(), user_id, id, input).await?;
    Ok(Redirect::to(ALL))
}
