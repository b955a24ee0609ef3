use serde::{Deserialize, Serialize};
use yatra_shared::Paise;

use crate::travel_option::{TravelOption, TravelType};

/// Price breakdown for a number of seats on one departure
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Fare {
    pub per_seat: Paise,
    pub seats: i32,
    pub total: Paise,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PricingError {
    #[error("Seat count must be positive, got {0}")]
    InvalidSeats(i32),

    #[error("Fare total out of range")]
    Overflow,
}

/// Fare for `seats` seats: unit price times seat count.
pub fn quote(option: &TravelOption, seats: i32) -> Result<Fare, PricingError> {
    if seats < 1 {
        return Err(PricingError::InvalidSeats(seats));
    }

    let total = option
        .price
        .checked_mul(i64::from(seats))
        .ok_or(PricingError::Overflow)?;

    Ok(Fare {
        per_seat: option.price,
        seats,
        total,
    })
}

/// Typical fare range per mode of transport, in whole rupees
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceBand {
    pub min_rupees: i64,
    pub max_rupees: i64,
}

impl PriceBand {
    pub fn for_travel_type(travel_type: TravelType) -> Self {
        match travel_type {
            TravelType::Flight => PriceBand { min_rupees: 2500, max_rupees: 8000 },
            TravelType::Train => PriceBand { min_rupees: 300, max_rupees: 2500 },
            TravelType::Bus => PriceBand { min_rupees: 200, max_rupees: 1500 },
        }
    }

    pub fn contains(&self, price: Paise) -> bool {
        price >= Paise::from_rupees(self.min_rupees) && price <= Paise::from_rupees(self.max_rupees)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::travel_option::tests::sample_option;

    #[test]
    fn test_quote_multiplies_unit_price() {
        let option = sample_option();
        let fare = quote(&option, 3).unwrap();
        assert_eq!(fare.per_seat, Paise::from_rupees(4500));
        assert_eq!(fare.total, Paise::from_rupees(13_500));
        assert_eq!(fare.total.format_inr(), "₹13,500.00");
    }

    #[test]
    fn test_quote_rejects_non_positive_seats() {
        let option = sample_option();
        assert_eq!(quote(&option, 0), Err(PricingError::InvalidSeats(0)));
        assert_eq!(quote(&option, -2), Err(PricingError::InvalidSeats(-2)));
    }

    #[test]
    fn test_price_bands() {
        let flight = PriceBand::for_travel_type(TravelType::Flight);
        assert!(flight.contains(Paise::from_rupees(4500)));
        assert!(!flight.contains(Paise::from_rupees(2499)));

        let bus = PriceBand::for_travel_type(TravelType::Bus);
        assert!(bus.contains(Paise::from_rupees(1500)));
        assert!(!bus.contains(Paise(150_001)));
    }
}
