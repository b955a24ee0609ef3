use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Extension, Form, Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use yatra_booking::NewBooking;
use yatra_catalog::{quote, TravelType, INDIAN_CITIES};
use yatra_core::identity::{is_valid_email, normalize_phone, User};
use yatra_core::search::{Page, TravelFilter, TravelSearchQuery};
use yatra_core::ValidationErrors;

use crate::accounts::current_user;
use crate::middleware::Claims;
use crate::views::{BookingView, TravelOptionView};
use crate::{error::AppError, state::AppState};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/travel/search", get(search))
        .route("/travel/{id}", get(detail))
}

#[derive(Debug, Serialize)]
pub struct TravelTypeChoice {
    pub value: &'static str,
    pub label: &'static str,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub results: Page<TravelOptionView>,
    pub filters: TravelFilter,
    pub cities: &'static [&'static str],
    pub travel_types: Vec<TravelTypeChoice>,
}

async fn search(
    State(state): State<AppState>,
    Query(query): Query<TravelSearchQuery>,
) -> Result<Json<SearchResponse>, AppError> {
    let filter = query.filter();
    let results = state.travel.search(&filter, query.page(), Utc::now()).await?;

    Ok(Json(SearchResponse {
        results: results.map(|option| TravelOptionView::from(&option)),
        filters: filter,
        cities: INDIAN_CITIES,
        travel_types: TravelType::ALL
            .iter()
            .map(|t| TravelTypeChoice {
                value: t.as_str(),
                label: t.label(),
            })
            .collect(),
    }))
}

#[derive(Debug, Deserialize)]
pub struct DetailQuery {
    pub seats: Option<i32>,
}

#[derive(Debug, Serialize)]
pub struct FareView {
    pub seats: i32,
    pub per_seat: String,
    pub total: String,
}

#[derive(Debug, Serialize)]
pub struct DetailResponse {
    pub travel_option: TravelOptionView,
    pub fare: Option<FareView>,
}

async fn detail(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<DetailQuery>,
) -> Result<Json<DetailResponse>, AppError> {
    let option = state
        .travel
        .get_travel_option(id)
        .await?
        .ok_or_else(|| AppError::NotFoundError("Travel option not found".to_string()))?;

    let fare = quote(&option, query.seats.unwrap_or(1)).ok().map(|fare| FareView {
        seats: fare.seats,
        per_seat: fare.per_seat.format_inr(),
        total: fare.total.format_inr(),
    });

    Ok(Json(DetailResponse {
        travel_option: TravelOptionView::from(&option),
        fare,
    }))
}

/// Booking form as submitted
#[derive(Debug, Default, Deserialize)]
pub struct BookingForm {
    #[serde(default)]
    pub num_seats: String,
    #[serde(default)]
    pub contact_phone: String,
    #[serde(default)]
    pub contact_email: String,
    /// JSON object or array; blank means none
    #[serde(default)]
    pub passenger_details: String,
    #[serde(default)]
    pub special_requests: String,
}

impl BookingForm {
    /// Validated request, with blank contact details taken from `user`.
    pub fn into_request(self, user: &User, travel_option_id: Uuid) -> Result<NewBooking, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let num_seats = match self.num_seats.trim().parse::<i32>() {
            Ok(n) if n >= 1 => n,
            Ok(_) => {
                errors.add("num_seats", "Ensure this value is greater than or equal to 1.");
                0
            }
            Err(_) => {
                errors.add("num_seats", "Enter a whole number.");
                0
            }
        };

        let contact_phone = match self.contact_phone.trim() {
            "" => String::new(),
            raw => normalize_phone(raw).unwrap_or_else(|msg| {
                errors.add("contact_phone", msg);
                String::new()
            }),
        };

        let contact_email = self.contact_email.trim().to_lowercase();
        if !contact_email.is_empty() && !is_valid_email(&contact_email) {
            errors.add("contact_email", "Enter a valid email address.");
        }

        let passenger_details = match self.passenger_details.trim() {
            "" => serde_json::json!({}),
            raw => serde_json::from_str(raw).unwrap_or_else(|_| {
                errors.add("passenger_details", "Enter valid JSON.");
                serde_json::Value::Null
            }),
        };

        let request = NewBooking {
            contact_phone,
            contact_email,
            passenger_details,
            special_requests: self.special_requests.trim().to_string(),
            ..NewBooking::new(user.id, travel_option_id, num_seats)
        }
        .with_contact_defaults(user.phone.expose(), &user.email);

        errors.into_result(request)
    }
}

pub(crate) async fn book(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Form(form): Form<BookingForm>,
) -> Result<(StatusCode, Json<BookingView>), AppError> {
    let user = current_user(&state, &claims).await?;
    let request = form.into_request(&user, id)?;

    let now = Utc::now();
    let booked = state.bookings.create_booking(request, &state.policy, now).await?;

    Ok((StatusCode::CREATED, Json(BookingView::new(&booked, &state.policy, now))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use yatra_core::identity::NewUser;
    use yatra_shared::Masked;

    fn user() -> User {
        NewUser {
            username: "asha".to_string(),
            email: "asha@example.in".to_string(),
            phone: Masked::from("+919812345678"),
            password_hash: Masked::from("hash"),
            first_name: "Asha".to_string(),
            last_name: "Iyer".to_string(),
            date_of_birth: None,
            gender: None,
            is_staff: false,
        }
        .into_user(Utc::now())
    }

    #[test]
    fn test_blank_contact_falls_back_to_account() {
        let form = BookingForm {
            num_seats: "2".to_string(),
            ..Default::default()
        };
        let request = form.into_request(&user(), Uuid::new_v4()).unwrap();
        assert_eq!(request.num_seats, 2);
        assert_eq!(request.contact_phone, "+919812345678");
        assert_eq!(request.contact_email, "asha@example.in");
        assert_eq!(request.passenger_details, serde_json::json!({}));
    }

    #[test]
    fn test_contact_phone_is_normalized() {
        let form = BookingForm {
            num_seats: "1".to_string(),
            contact_phone: "98765 43210".to_string(),
            passenger_details: r#"[{"name": "Asha Iyer", "age": 34}]"#.to_string(),
            ..Default::default()
        };
        let request = form.into_request(&user(), Uuid::new_v4()).unwrap();
        assert_eq!(request.contact_phone, "+919876543210");
        assert_eq!(request.passenger_details[0]["age"], 34);
    }

    #[test]
    fn test_all_field_errors_reported() {
        let form = BookingForm {
            num_seats: "0".to_string(),
            contact_phone: "12345".to_string(),
            contact_email: "not-an-email".to_string(),
            passenger_details: "{oops".to_string(),
            ..Default::default()
        };
        let errors = form.into_request(&user(), Uuid::new_v4()).unwrap_err();
        for field in ["num_seats", "contact_phone", "contact_email", "passenger_details"] {
            assert!(errors.contains(field), "missing error for {}", field);
        }
    }
}
