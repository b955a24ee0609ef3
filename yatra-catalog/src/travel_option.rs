use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;
use yatra_shared::Paise;

use crate::cities::is_known_city;

/// Mode of transport for a departure
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TravelType {
    Flight,
    Train,
    Bus,
}

impl TravelType {
    pub const ALL: [TravelType; 3] = [TravelType::Flight, TravelType::Train, TravelType::Bus];

    pub fn as_str(&self) -> &'static str {
        match self {
            TravelType::Flight => "flight",
            TravelType::Train => "train",
            TravelType::Bus => "bus",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TravelType::Flight => "Flight",
            TravelType::Train => "Train",
            TravelType::Bus => "Bus",
        }
    }
}

impl fmt::Display for TravelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TravelType {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "flight" => Ok(TravelType::Flight),
            "train" => Ok(TravelType::Train),
            "bus" => Ok(TravelType::Bus),
            other => Err(CatalogError::UnknownTravelType(other.to_string())),
        }
    }
}

/// One scheduled, bookable departure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TravelOption {
    pub id: Uuid,
    pub travel_type: TravelType,
    pub source: String,
    pub destination: String,
    pub departure_datetime: DateTime<Utc>,
    pub arrival_datetime: Option<DateTime<Utc>>,
    pub price: Paise,
    pub total_seats: i32,
    pub available_seats: i32,
    pub operator_name: String,
    pub service_number: String,
    pub description: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Editable fields of a departure, used for both creation and admin updates
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewTravelOption {
    pub travel_type: TravelType,
    pub source: String,
    pub destination: String,
    pub departure_datetime: DateTime<Utc>,
    pub arrival_datetime: Option<DateTime<Utc>>,
    pub price: Paise,
    pub total_seats: i32,
    pub available_seats: i32,
    #[serde(default)]
    pub operator_name: String,
    #[serde(default)]
    pub service_number: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("Source and destination cannot be the same.")]
    SameSourceAndDestination,

    #[error("Unknown city: {0}")]
    UnknownCity(String),

    #[error("Unknown travel type: {0}")]
    UnknownTravelType(String),

    #[error("Total seats must be at least 1.")]
    InvalidTotalSeats,

    #[error("Available seats cannot be negative.")]
    NegativeAvailableSeats,

    #[error("Available seats cannot exceed total seats.")]
    AvailableExceedsTotal { available: i32, total: i32 },

    #[error("Arrival time must be after departure time.")]
    ArrivalNotAfterDeparture,

    #[error("Price must be at least ₹0.01.")]
    InvalidPrice,

    #[error("Total seats cannot be fewer than the {booked} seats already booked.")]
    TotalBelowBooked { total: i32, booked: i32 },
}

fn check_departure(
    source: &str,
    destination: &str,
    departure: DateTime<Utc>,
    arrival: Option<DateTime<Utc>>,
    price: Paise,
    total_seats: i32,
    available_seats: i32,
) -> Result<(), CatalogError> {
    if !is_known_city(source) {
        return Err(CatalogError::UnknownCity(source.to_string()));
    }
    if !is_known_city(destination) {
        return Err(CatalogError::UnknownCity(destination.to_string()));
    }
    if source == destination {
        return Err(CatalogError::SameSourceAndDestination);
    }
    if price.as_i64() < 1 {
        return Err(CatalogError::InvalidPrice);
    }
    if total_seats < 1 {
        return Err(CatalogError::InvalidTotalSeats);
    }
    if available_seats < 0 {
        return Err(CatalogError::NegativeAvailableSeats);
    }
    if available_seats > total_seats {
        return Err(CatalogError::AvailableExceedsTotal {
            available: available_seats,
            total: total_seats,
        });
    }
    if let Some(arrival) = arrival {
        if arrival <= departure {
            return Err(CatalogError::ArrivalNotAfterDeparture);
        }
    }
    Ok(())
}

impl NewTravelOption {
    pub fn validate(&self) -> Result<(), CatalogError> {
        check_departure(
            &self.source,
            &self.destination,
            self.departure_datetime,
            self.arrival_datetime,
            self.price,
            self.total_seats,
            self.available_seats,
        )
    }
}

impl TravelOption {
    /// Materializes a validated draft with a fresh id
    pub fn create(new: NewTravelOption, now: DateTime<Utc>) -> Result<Self, CatalogError> {
        new.validate()?;
        Ok(Self {
            id: Uuid::new_v4(),
            travel_type: new.travel_type,
            source: new.source,
            destination: new.destination,
            departure_datetime: new.departure_datetime,
            arrival_datetime: new.arrival_datetime,
            price: new.price,
            total_seats: new.total_seats,
            available_seats: new.available_seats,
            operator_name: new.operator_name,
            service_number: new.service_number,
            description: new.description,
            is_active: new.is_active,
            created_at: now,
            updated_at: now,
        })
    }

    /// Overwrites the editable fields, keeping id and creation time.
    ///
    /// `update.available_seats` is ignored: booked seats stay booked, and a change
    /// to `total_seats` moves the free count by the same amount.
    pub fn apply(&mut self, update: NewTravelOption, now: DateTime<Utc>) -> Result<(), CatalogError> {
        let booked = self.booked_seats();
        if update.total_seats >= 1 && update.total_seats < booked {
            return Err(CatalogError::TotalBelowBooked {
                total: update.total_seats,
                booked,
            });
        }
        let available_seats = update.total_seats - booked;
        check_departure(
            &update.source,
            &update.destination,
            update.departure_datetime,
            update.arrival_datetime,
            update.price,
            update.total_seats,
            available_seats,
        )?;

        self.travel_type = update.travel_type;
        self.source = update.source;
        self.destination = update.destination;
        self.departure_datetime = update.departure_datetime;
        self.arrival_datetime = update.arrival_datetime;
        self.price = update.price;
        self.total_seats = update.total_seats;
        self.available_seats = available_seats;
        self.operator_name = update.operator_name;
        self.service_number = update.service_number;
        self.description = update.description;
        self.is_active = update.is_active;
        self.updated_at = now;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), CatalogError> {
        check_departure(
            &self.source,
            &self.destination,
            self.departure_datetime,
            self.arrival_datetime,
            self.price,
            self.total_seats,
            self.available_seats,
        )
    }

    pub fn formatted_price(&self) -> String {
        self.price.format_inr()
    }

    /// Journey length as `"2h 15m"`
    pub fn duration_display(&self) -> String {
        match self.arrival_datetime {
            Some(arrival) => {
                let minutes = (arrival - self.departure_datetime).num_minutes();
                format!("{}h {}m", minutes / 60, minutes % 60)
            }
            None => "Duration not available".to_string(),
        }
    }

    pub fn is_available(&self) -> bool {
        self.is_active && self.available_seats > 0
    }

    pub fn has_departed(&self, now: DateTime<Utc>) -> bool {
        self.departure_datetime <= now
    }

    /// Occupied share of seats in percent, one decimal place
    pub fn occupancy_percentage(&self) -> f64 {
        (self.utilization() * 1000.0).round() / 10.0
    }
}

impl fmt::Display for TravelOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} from {} to {} on {}",
            self.travel_type.label(),
            self.source,
            self.destination,
            self.departure_datetime.format("%d/%m/%Y %H:%M")
        )
    }
}
