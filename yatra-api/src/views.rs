//! Response bodies. Phone numbers and Aadhaar only ever leave in display form.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use uuid::Uuid;
use yatra_booking::{BookingPolicy, BookingStatus, BookingWithTravel};
use yatra_catalog::{TravelOption, TravelType};
use yatra_core::identity::{state_name, User};
use yatra_core::search::BookingListing;

#[derive(Debug, Serialize)]
pub struct UserView {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub phone: String,
    pub first_name: String,
    pub last_name: String,
    pub full_name: String,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<&'static str>,
    pub address: String,
    pub city: String,
    pub state: Option<String>,
    pub state_name: Option<&'static str>,
    pub pin_code: String,
    pub aadhaar_number: String,
    pub is_staff: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserView {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            phone: user.display_phone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            full_name: user.full_name(),
            date_of_birth: user.date_of_birth,
            gender: user.gender.map(|g| g.label()),
            address: user.address.clone(),
            city: user.city.clone(),
            state: user.state.clone(),
            state_name: user.state.as_deref().and_then(state_name),
            pin_code: user.pin_code.clone(),
            aadhaar_number: user.masked_aadhaar(),
            is_staff: user.is_staff,
            is_active: user.is_active,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TravelOptionView {
    pub id: Uuid,
    pub travel_type: TravelType,
    pub travel_type_label: &'static str,
    pub source: String,
    pub destination: String,
    pub departure_datetime: DateTime<Utc>,
    pub arrival_datetime: Option<DateTime<Utc>>,
    pub duration: String,
    pub price: String,
    pub total_seats: i32,
    pub available_seats: i32,
    pub occupancy_percentage: f64,
    pub operator_name: String,
    pub service_number: String,
    pub description: String,
    pub is_active: bool,
    pub is_available: bool,
}

impl From<&TravelOption> for TravelOptionView {
    fn from(option: &TravelOption) -> Self {
        Self {
            id: option.id,
            travel_type: option.travel_type,
            travel_type_label: option.travel_type.label(),
            source: option.source.clone(),
            destination: option.destination.clone(),
            departure_datetime: option.departure_datetime,
            arrival_datetime: option.arrival_datetime,
            duration: option.duration_display(),
            price: option.formatted_price(),
            total_seats: option.total_seats,
            available_seats: option.available_seats,
            occupancy_percentage: option.occupancy_percentage(),
            operator_name: option.operator_name.clone(),
            service_number: option.service_number.clone(),
            description: option.description.clone(),
            is_active: option.is_active,
            is_available: option.is_available(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct BookingView {
    pub id: Uuid,
    pub booking_reference: String,
    pub status: BookingStatus,
    pub num_seats: i32,
    pub total_price: String,
    pub per_seat_price: String,
    pub contact_phone: String,
    pub contact_email: String,
    pub passenger_details: serde_json::Value,
    pub special_requests: String,
    pub booking_date: DateTime<Utc>,
    pub can_cancel: bool,
    pub travel_option: TravelOptionView,
}

impl BookingView {
    pub fn new(entry: &BookingWithTravel, policy: &BookingPolicy, now: DateTime<Utc>) -> Self {
        let booking = &entry.booking;
        Self {
            id: booking.id,
            booking_reference: booking.booking_reference.clone(),
            status: booking.status,
            num_seats: booking.num_seats,
            total_price: booking.formatted_total_price(),
            per_seat_price: booking.formatted_per_seat_price(),
            contact_phone: booking.contact_phone.clone(),
            contact_email: booking.contact_email.clone(),
            passenger_details: booking.passenger_details.clone(),
            special_requests: booking.special_requests.clone(),
            booking_date: booking.booking_date,
            can_cancel: policy.can_be_cancelled(booking, &entry.travel_option, now),
            travel_option: TravelOptionView::from(&entry.travel_option),
        }
    }
}

/// Admin list row
#[derive(Debug, Serialize)]
pub struct BookingListingView {
    pub username: String,
    pub user_email: String,
    #[serde(flatten)]
    pub booking: BookingView,
}

impl BookingListingView {
    pub fn new(listing: BookingListing, policy: &BookingPolicy, now: DateTime<Utc>) -> Self {
        let entry = BookingWithTravel {
            booking: listing.booking,
            travel_option: listing.travel_option,
        };
        Self {
            username: listing.username,
            user_email: listing.user_email,
            booking: BookingView::new(&entry, policy, now),
        }
    }
}
