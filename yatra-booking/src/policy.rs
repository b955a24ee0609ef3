use chrono::{DateTime, Duration, Utc};
use yatra_catalog::TravelOption;
use yatra_shared::Paise;

use crate::models::{Booking, BookingStatus, NewBooking};

pub const DEFAULT_CANCELLATION_WINDOW_MINUTES: i64 = 120;
pub const DEFAULT_MAX_SEATS_PER_BOOKING: i32 = 10;

/// Business rules for taking and giving back seats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookingPolicy {
    /// Minimum lead time before departure for a cancellation
    pub cancellation_window: Duration,
    pub max_seats_per_booking: i32,
}

impl Default for BookingPolicy {
    fn default() -> Self {
        Self {
            cancellation_window: Duration::minutes(DEFAULT_CANCELLATION_WINDOW_MINUTES),
            max_seats_per_booking: DEFAULT_MAX_SEATS_PER_BOOKING,
        }
    }
}

impl BookingPolicy {
    pub fn new(cancellation_window_minutes: i64, max_seats_per_booking: i32) -> Self {
        Self {
            cancellation_window: Duration::minutes(cancellation_window_minutes),
            max_seats_per_booking,
        }
    }

    /// Seat count must be positive and within the per-booking cap.
    pub fn check_seat_count(&self, num_seats: i32) -> Result<(), BookingError> {
        if num_seats < 1 {
            return Err(BookingError::InvalidSeatCount(num_seats));
        }
        if num_seats > self.max_seats_per_booking {
            return Err(BookingError::TooManySeats {
                requested: num_seats,
                max: self.max_seats_per_booking,
            });
        }
        Ok(())
    }

    /// Everything that must hold before seats are taken from `option`.
    pub fn check_bookable(
        &self,
        option: &TravelOption,
        num_seats: i32,
        now: DateTime<Utc>,
    ) -> Result<(), BookingError> {
        self.check_seat_count(num_seats)?;

        if !option.is_active {
            return Err(BookingError::Inactive);
        }
        if option.has_departed(now) {
            return Err(BookingError::Departed);
        }
        if num_seats > option.available_seats {
            return Err(BookingError::InsufficientSeats {
                requested: num_seats,
                available: option.available_seats,
            });
        }
        Ok(())
    }

    /// Amount charged: the explicit override, else unit price times seats.
    pub fn total_price(&self, option: &TravelOption, request: &NewBooking) -> Result<Paise, BookingError> {
        match request.total_price {
            Some(total) => Ok(total),
            None => option
                .price
                .checked_mul(i64::from(request.num_seats))
                .ok_or(BookingError::PriceOverflow),
        }
    }

    pub fn check_cancellable(
        &self,
        booking: &Booking,
        option: &TravelOption,
        now: DateTime<Utc>,
    ) -> Result<(), BookingError> {
        match booking.status {
            BookingStatus::Confirmed => {}
            BookingStatus::Cancelled => return Err(BookingError::AlreadyCancelled),
            other => return Err(BookingError::InvalidStatus(other)),
        }

        if option.has_departed(now) {
            return Err(BookingError::Departed);
        }

        if option.departure_datetime - now < self.cancellation_window {
            return Err(BookingError::CancellationWindowClosed {
                minutes: self.cancellation_window.num_minutes(),
            });
        }
        Ok(())
    }

    pub fn can_be_cancelled(&self, booking: &Booking, option: &TravelOption, now: DateTime<Utc>) -> bool {
        self.check_cancellable(booking, option, now).is_ok()
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum BookingError {
    #[error("Booking not found")]
    NotFound,

    #[error("Travel option not found")]
    TravelOptionNotFound,

    #[error("Number of seats must be at least 1, got {0}.")]
    InvalidSeatCount(i32),

    #[error("At most {max} seats can be booked at once.")]
    TooManySeats { requested: i32, max: i32 },

    #[error("Only {available} seats are available.")]
    InsufficientSeats { requested: i32, available: i32 },

    #[error("This travel option is not available for booking.")]
    Inactive,

    #[error("Cannot book or cancel travel that has already departed.")]
    Departed,

    #[error("This booking is already cancelled.")]
    AlreadyCancelled,

    #[error("Bookings in status {0} cannot be cancelled.")]
    InvalidStatus(BookingStatus),

    #[error("Bookings can only be cancelled at least {minutes} minutes before departure.")]
    CancellationWindowClosed { minutes: i64 },

    #[error("Booking total out of range")]
    PriceOverflow,

    #[error("Could not allocate a unique booking reference")]
    ReferenceExhausted,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::tests::{booking_for, departure_at};
    use chrono::TimeZone;
    use uuid::Uuid;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 8, 0, 0).unwrap()
    }

    #[test]
    fn test_bookable_happy_path() {
        let policy = BookingPolicy::default();
        let option = departure_at(now() + Duration::days(1), 4);
        assert!(policy.check_bookable(&option, 4, now()).is_ok());
    }

    #[test]
    fn test_bookable_rejections() {
        let policy = BookingPolicy::default();
        let option = departure_at(now() + Duration::days(1), 4);

        assert_eq!(policy.check_bookable(&option, 0, now()), Err(BookingError::InvalidSeatCount(0)));
        assert_eq!(
            policy.check_bookable(&option, 5, now()),
            Err(BookingError::InsufficientSeats { requested: 5, available: 4 })
        );
        assert_eq!(
            policy.check_bookable(&option, 11, now()),
            Err(BookingError::TooManySeats { requested: 11, max: 10 })
        );

        let mut inactive = option.clone();
        inactive.is_active = false;
        assert_eq!(policy.check_bookable(&inactive, 1, now()), Err(BookingError::Inactive));

        let departed = departure_at(now(), 4);
        assert_eq!(policy.check_bookable(&departed, 1, now()), Err(BookingError::Departed));
    }

    #[test]
    fn test_total_price_default_and_override() {
        let policy = BookingPolicy::default();
        let option = departure_at(now() + Duration::days(1), 40);

        let mut request = NewBooking::new(Uuid::new_v4(), option.id, 2);
        assert_eq!(policy.total_price(&option, &request), Ok(Paise::from_rupees(1700)));

        request.total_price = Some(Paise::from_rupees(1500));
        assert_eq!(policy.total_price(&option, &request), Ok(Paise::from_rupees(1500)));
    }

    #[test]
    fn test_cancel_one_hour_before_departure_fails() {
        let policy = BookingPolicy::default();
        let option = departure_at(now() + Duration::hours(1), 10);
        let booking = booking_for(&option, 2, now() - Duration::days(1));

        assert_eq!(
            policy.check_cancellable(&booking, &option, now()),
            Err(BookingError::CancellationWindowClosed { minutes: 120 })
        );
        assert!(!policy.can_be_cancelled(&booking, &option, now()));
    }

    #[test]
    fn test_cancel_exactly_two_hours_before_succeeds() {
        let policy = BookingPolicy::default();
        let option = departure_at(now() + Duration::hours(2), 10);
        let booking = booking_for(&option, 2, now() - Duration::days(1));
        assert!(policy.can_be_cancelled(&booking, &option, now()));

        let just_inside = now() + Duration::seconds(1);
        assert!(!policy.can_be_cancelled(&booking, &option, just_inside));
    }

    #[test]
    fn test_cancel_requires_confirmed_status() {
        let policy = BookingPolicy::default();
        let option = departure_at(now() + Duration::days(2), 10);
        let mut booking = booking_for(&option, 2, now());

        booking.status = BookingStatus::Cancelled;
        assert_eq!(
            policy.check_cancellable(&booking, &option, now()),
            Err(BookingError::AlreadyCancelled)
        );

        booking.status = BookingStatus::Pending;
        assert_eq!(
            policy.check_cancellable(&booking, &option, now()),
            Err(BookingError::InvalidStatus(BookingStatus::Pending))
        );
    }

    #[test]
    fn test_cancel_after_departure_fails() {
        let policy = BookingPolicy::default();
        let option = departure_at(now() - Duration::minutes(5), 10);
        let booking = booking_for(&option, 1, now() - Duration::days(1));
        assert_eq!(policy.check_cancellable(&booking, &option, now()), Err(BookingError::Departed));
    }

    #[test]
    fn test_configured_window() {
        let policy = BookingPolicy::new(30, 4);
        let option = departure_at(now() + Duration::hours(1), 10);
        let booking = booking_for(&option, 1, now());
        assert!(policy.can_be_cancelled(&booking, &option, now()));
        assert_eq!(policy.check_seat_count(5), Err(BookingError::TooManySeats { requested: 5, max: 4 }));
    }
}
