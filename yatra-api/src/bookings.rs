use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use yatra_booking::{BookingPolicy, BookingWithTravel, MyBookings};
use yatra_core::search::Page;

use crate::middleware::Claims;
use crate::views::BookingView;
use crate::{error::AppError, state::AppState};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/bookings", get(my_bookings))
        .route("/bookings/{id}", get(booking_detail))
        .route("/bookings/{id}/cancel", post(cancel_booking))
}

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct MyBookingsResponse {
    pub bookings: Page<BookingView>,
    pub upcoming: Vec<BookingView>,
    pub past: Vec<BookingView>,
    pub cancelled: Vec<BookingView>,
}

fn views(entries: &[BookingWithTravel], policy: &BookingPolicy, now: DateTime<Utc>) -> Vec<BookingView> {
    entries.iter().map(|e| BookingView::new(e, policy, now)).collect()
}

async fn my_bookings(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(query): Query<PageQuery>,
) -> Result<Json<MyBookingsResponse>, AppError> {
    let user_id = claims.user_id()?;
    let now = Utc::now();

    let all = state.bookings.list_bookings_for_user(user_id).await?;
    let split = MyBookings::partition(&all, now);
    let page = Page::from_ordered(all, query.page.unwrap_or(1).max(1));

    Ok(Json(MyBookingsResponse {
        bookings: page.map(|entry| BookingView::new(&entry, &state.policy, now)),
        upcoming: views(&split.upcoming, &state.policy, now),
        past: views(&split.past, &state.policy, now),
        cancelled: views(&split.cancelled, &state.policy, now),
    }))
}

async fn booking_detail(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<Json<BookingView>, AppError> {
    let entry = state
        .bookings
        .get_booking_for_user(id, claims.user_id()?)
        .await?
        .ok_or_else(|| AppError::NotFoundError("Booking not found".to_string()))?;

    Ok(Json(BookingView::new(&entry, &state.policy, Utc::now())))
}

async fn cancel_booking(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<Json<BookingView>, AppError> {
    let now = Utc::now();
    let entry = state
        .bookings
        .cancel_booking(id, claims.user_id()?, &state.policy, now)
        .await?;

    Ok(Json(BookingView::new(&entry, &state.policy, now)))
}
