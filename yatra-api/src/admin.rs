use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Form, Json, Router,
};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;
use yatra_catalog::{NewTravelOption, TravelType};
use yatra_core::search::{BookingFilter, Page, TravelOptionFilter, UserFilter};
use yatra_core::ValidationErrors;
use yatra_shared::Paise;

use crate::views::{BookingListingView, TravelOptionView, UserView};
use crate::{error::AppError, state::AppState};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/admin/users", get(list_users))
        .route("/admin/travel-options", get(list_travel_options).post(create_travel_option))
        .route("/admin/travel-options/{id}", post(update_travel_option))
        .route("/admin/travel-options/{id}/deactivate", post(deactivate_travel_option))
        .route("/admin/bookings", get(list_bookings))
}

// ============================================================================
// Request Types
// ============================================================================

/// Travel option form as submitted; prices in rupees, times in RFC 3339 or `YYYY-MM-DDTHH:MM` (UTC).
#[derive(Debug, Default, Deserialize)]
pub struct TravelOptionForm {
    #[serde(default)]
    pub travel_type: String,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub destination: String,
    #[serde(default)]
    pub departure_datetime: String,
    #[serde(default)]
    pub arrival_datetime: String,
    #[serde(default)]
    pub price: String,
    #[serde(default)]
    pub total_seats: String,
    /// Read on creation only, blank means every seat is free. Updates keep booked seats booked.
    #[serde(default)]
    pub available_seats: String,
    #[serde(default)]
    pub operator_name: String,
    #[serde(default)]
    pub service_number: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub is_active: Option<String>,
}

fn parse_datetime(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            ["%Y-%m-%dT%H:%M", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"]
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
                .map(|naive| naive.and_utc())
        })
}

fn parse_flag(raw: Option<&str>) -> Result<bool, ()> {
    match raw.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
        None | Some("") => Ok(true),
        Some("true" | "on" | "1" | "yes") => Ok(true),
        Some("false" | "off" | "0" | "no") => Ok(false),
        Some(_) => Err(()),
    }
}

impl TravelOptionForm {
    pub fn validate(&self) -> Result<NewTravelOption, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let travel_type = self.travel_type.parse::<TravelType>().unwrap_or_else(|e| {
            errors.add("travel_type", e.to_string());
            TravelType::Flight
        });

        let source = self.source.trim().to_string();
        if source.is_empty() {
            errors.add("source", "This field is required.");
        }
        let destination = self.destination.trim().to_string();
        if destination.is_empty() {
            errors.add("destination", "This field is required.");
        }

        let departure_datetime = parse_datetime(&self.departure_datetime).unwrap_or_else(|| {
            errors.add("departure_datetime", "Enter a valid date/time.");
            DateTime::<Utc>::MIN_UTC
        });
        let arrival_datetime = match self.arrival_datetime.trim() {
            "" => None,
            raw => parse_datetime(raw).or_else(|| {
                errors.add("arrival_datetime", "Enter a valid date/time.");
                None
            }),
        };

        let price = self.price.parse::<Paise>().unwrap_or_else(|_| {
            errors.add("price", "Enter a number with at most 2 decimal places.");
            Paise::ZERO
        });

        let total_seats = self.total_seats.trim().parse::<i32>().unwrap_or_else(|_| {
            errors.add("total_seats", "Enter a whole number.");
            0
        });
        let available_seats = match self.available_seats.trim() {
            "" => total_seats,
            raw => raw.parse::<i32>().unwrap_or_else(|_| {
                errors.add("available_seats", "Enter a whole number.");
                0
            }),
        };

        let is_active = parse_flag(self.is_active.as_deref()).unwrap_or_else(|_| {
            errors.add("is_active", "Enter true or false.");
            true
        });

        errors.into_result(NewTravelOption {
            travel_type,
            source,
            destination,
            departure_datetime,
            arrival_datetime,
            price,
            total_seats,
            available_seats,
            operator_name: self.operator_name.trim().to_string(),
            service_number: self.service_number.trim().to_string(),
            description: self.description.trim().to_string(),
            is_active,
        })
    }
}

// ============================================================================
// Users
// ============================================================================

async fn list_users(
    State(state): State<AppState>,
    Query(filter): Query<UserFilter>,
) -> Result<Json<Page<UserView>>, AppError> {
    let page = state.users.list_users(&filter).await?;
    Ok(Json(page.map(|user| UserView::from(&user))))
}

// ============================================================================
// Travel Options
// ============================================================================

async fn list_travel_options(
    State(state): State<AppState>,
    Query(filter): Query<TravelOptionFilter>,
) -> Result<Json<Page<TravelOptionView>>, AppError> {
    let page = state.travel.list_travel_options(&filter).await?;
    Ok(Json(page.map(|option| TravelOptionView::from(&option))))
}

async fn create_travel_option(
    State(state): State<AppState>,
    Form(form): Form<TravelOptionForm>,
) -> Result<(StatusCode, Json<TravelOptionView>), AppError> {
    let option = state.travel.create_travel_option(form.validate()?).await?;
    Ok((StatusCode::CREATED, Json(TravelOptionView::from(&option))))
}

async fn update_travel_option(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Form(form): Form<TravelOptionForm>,
) -> Result<Json<TravelOptionView>, AppError> {
    let option = state.travel.update_travel_option(id, form.validate()?).await?;
    tracing::info!("Travel option updated: {}", option);
    Ok(Json(TravelOptionView::from(&option)))
}

async fn deactivate_travel_option(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<TravelOptionView>, AppError> {
    let option = state.travel.deactivate_travel_option(id).await?;
    Ok(Json(TravelOptionView::from(&option)))
}

// ============================================================================
// Bookings
// ============================================================================

async fn list_bookings(
    State(state): State<AppState>,
    Query(filter): Query<BookingFilter>,
) -> Result<Json<Page<BookingListingView>>, AppError> {
    let now = Utc::now();
    let page = state.bookings.list_bookings(&filter).await?;
    Ok(Json(page.map(|listing| BookingListingView::new(listing, &state.policy, now))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn form() -> TravelOptionForm {
        TravelOptionForm {
            travel_type: "train".to_string(),
            source: "Chennai".to_string(),
            destination: "Bangalore".to_string(),
            departure_datetime: "2025-04-02T06:00".to_string(),
            arrival_datetime: "2025-04-02T17:00:00+05:30".to_string(),
            price: "845.50".to_string(),
            total_seats: "72".to_string(),
            operator_name: "Indian Railways".to_string(),
            service_number: "12007".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_form_parses_rupees_and_times() {
        let option = form().validate().unwrap();
        assert_eq!(option.travel_type, TravelType::Train);
        assert_eq!(option.price, Paise(84_550));
        assert_eq!(option.departure_datetime, Utc.with_ymd_and_hms(2025, 4, 2, 6, 0, 0).unwrap());
        assert_eq!(option.arrival_datetime, Some(Utc.with_ymd_and_hms(2025, 4, 2, 11, 30, 0).unwrap()));
        assert_eq!(option.available_seats, 72);
        assert!(option.is_active);
    }

    #[test]
    fn test_form_collects_every_error() {
        let bad = TravelOptionForm {
            travel_type: "ship".to_string(),
            departure_datetime: "tomorrow".to_string(),
            price: "12.345".to_string(),
            total_seats: "many".to_string(),
            is_active: Some("maybe".to_string()),
            ..form()
        };
        let errors = bad.validate().unwrap_err();
        for field in ["travel_type", "departure_datetime", "price", "total_seats", "is_active"] {
            assert!(errors.contains(field), "missing error for {}", field);
        }
    }

    #[test]
    fn test_inactive_flag_and_explicit_seats() {
        let option = TravelOptionForm {
            is_active: Some("off".to_string()),
            available_seats: "10".to_string(),
            ..form()
        }
        .validate()
        .unwrap();
        assert!(!option.is_active);
        assert_eq!(option.available_seats, 10);
    }
}
