use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;
use yatra_catalog::TravelOption;
use yatra_shared::Paise;

/// Booking status in the lifecycle
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(BookingStatus::Pending),
            "confirmed" => Ok(BookingStatus::Confirmed),
            "cancelled" => Ok(BookingStatus::Cancelled),
            other => Err(format!("unknown booking status: {}", other)),
        }
    }
}

/// A user's reservation of seats on one departure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Booking {
    pub id: Uuid,
    pub user_id: Uuid,
    pub travel_option_id: Uuid,
    pub num_seats: i32,
    pub total_price: Paise,
    pub status: BookingStatus,
    pub booking_reference: String,
    pub contact_phone: String,
    pub contact_email: String,
    pub passenger_details: serde_json::Value,
    pub special_requests: String,
    pub booking_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    /// Builds a confirmed booking from a validated request
    pub fn confirmed(
        new: NewBooking,
        total_price: Paise,
        booking_reference: String,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: new.user_id,
            travel_option_id: new.travel_option_id,
            num_seats: new.num_seats,
            total_price,
            status: BookingStatus::Confirmed,
            booking_reference,
            contact_phone: new.contact_phone,
            contact_email: new.contact_email,
            passenger_details: new.passenger_details,
            special_requests: new.special_requests,
            booking_date: now,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn formatted_total_price(&self) -> String {
        self.total_price.format_inr()
    }

    pub fn per_seat_price(&self) -> Paise {
        self.total_price.per_unit(i64::from(self.num_seats))
    }

    pub fn formatted_per_seat_price(&self) -> String {
        self.per_seat_price().format_inr()
    }

    pub fn is_cancelled(&self) -> bool {
        self.status == BookingStatus::Cancelled
    }
}

/// Booking request before seats are taken and a reference is assigned
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewBooking {
    pub user_id: Uuid,
    pub travel_option_id: Uuid,
    pub num_seats: i32,
    /// Explicit total; when absent the fare is price times seats
    pub total_price: Option<Paise>,
    pub contact_phone: String,
    pub contact_email: String,
    pub passenger_details: serde_json::Value,
    pub special_requests: String,
}

impl NewBooking {
    pub fn new(user_id: Uuid, travel_option_id: Uuid, num_seats: i32) -> Self {
        Self {
            user_id,
            travel_option_id,
            num_seats,
            total_price: None,
            contact_phone: String::new(),
            contact_email: String::new(),
            passenger_details: serde_json::json!({}),
            special_requests: String::new(),
        }
    }

    /// Fills blank contact fields from the account owner.
    pub fn with_contact_defaults(mut self, phone: &str, email: &str) -> Self {
        if self.contact_phone.trim().is_empty() {
            self.contact_phone = phone.to_string();
        }
        if self.contact_email.trim().is_empty() {
            self.contact_email = email.to_string();
        }
        self
    }
}

/// A booking joined with the departure it holds seats on
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BookingWithTravel {
    pub booking: Booking,
    pub travel_option: TravelOption,
}

impl BookingWithTravel {
    pub fn is_upcoming(&self, now: DateTime<Utc>) -> bool {
        self.booking.status == BookingStatus::Confirmed && self.travel_option.departure_datetime >= now
    }

    pub fn is_past(&self, now: DateTime<Utc>) -> bool {
        self.travel_option.departure_datetime < now
    }
}

impl fmt::Display for BookingWithTravel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Booking {} - {} to {}",
            self.booking.booking_reference, self.travel_option.source, self.travel_option.destination
        )
    }
}

/// A user's bookings split by where they are in their lifecycle
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct MyBookings {
    pub upcoming: Vec<BookingWithTravel>,
    pub past: Vec<BookingWithTravel>,
    pub cancelled: Vec<BookingWithTravel>,
}

impl MyBookings {
    /// Partitions bookings: cancelled first, then past departures, the rest are upcoming.
    pub fn partition(bookings: &[BookingWithTravel], now: DateTime<Utc>) -> Self {
        let mut split = MyBookings::default();
        for entry in bookings {
            if entry.booking.is_cancelled() {
                split.cancelled.push(entry.clone());
            } else if entry.is_past(now) {
                split.past.push(entry.clone());
            } else if entry.is_upcoming(now) {
                split.upcoming.push(entry.clone());
            }
        }
        split
    }
}
