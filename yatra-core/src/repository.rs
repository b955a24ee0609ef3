use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;
use yatra_booking::{BookingPolicy, BookingWithTravel, NewBooking};
use yatra_catalog::{NewTravelOption, TravelOption};

use crate::identity::{NewUser, ProfileUpdate, User};
use crate::search::{BookingFilter, BookingListing, Page, TravelFilter, TravelOptionFilter, UserFilter};
use crate::CoreResult;

/// Repository trait for account data access
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Fails with `CoreError::Conflict` when username, email or phone is taken.
    async fn create_user(&self, user: NewUser) -> CoreResult<User>;

    async fn get_user(&self, id: Uuid) -> CoreResult<Option<User>>;

    /// Looks an account up by username or, failing that, by email.
    async fn find_by_login(&self, login: &str) -> CoreResult<Option<User>>;

    async fn update_profile(&self, id: Uuid, update: ProfileUpdate) -> CoreResult<User>;

    async fn list_users(&self, filter: &UserFilter) -> CoreResult<Page<User>>;
}

/// Repository trait for the travel catalog
#[async_trait]
pub trait TravelRepository: Send + Sync {
    async fn create_travel_option(&self, option: NewTravelOption) -> CoreResult<TravelOption>;

    async fn get_travel_option(&self, id: Uuid) -> CoreResult<Option<TravelOption>>;

    async fn update_travel_option(&self, id: Uuid, update: NewTravelOption) -> CoreResult<TravelOption>;

    async fn deactivate_travel_option(&self, id: Uuid) -> CoreResult<TravelOption>;

    /// Bookable departures matching `filter`, earliest first.
    async fn search(&self, filter: &TravelFilter, page: u32, now: DateTime<Utc>) -> CoreResult<Page<TravelOption>>;

    async fn list_travel_options(&self, filter: &TravelOptionFilter) -> CoreResult<Page<TravelOption>>;

    /// Deletes the catalog (and bookings against it) and inserts `options`. Returns the count inserted.
    async fn replace_catalog(&self, options: Vec<NewTravelOption>) -> CoreResult<u64>;
}

/// Repository trait for bookings; owns the seat-count read-modify-write.
#[async_trait]
pub trait BookingRepository: Send + Sync {
    /// Takes the seats and records a confirmed booking as one unit.
    async fn create_booking(
        &self,
        request: NewBooking,
        policy: &BookingPolicy,
        now: DateTime<Utc>,
    ) -> CoreResult<BookingWithTravel>;

    /// Cancels the caller's booking and gives its seats back as one unit.
    async fn cancel_booking(
        &self,
        booking_id: Uuid,
        user_id: Uuid,
        policy: &BookingPolicy,
        now: DateTime<Utc>,
    ) -> CoreResult<BookingWithTravel>;

    async fn get_booking_for_user(&self, booking_id: Uuid, user_id: Uuid) -> CoreResult<Option<BookingWithTravel>>;

    /// Newest first
    async fn list_bookings_for_user(&self, user_id: Uuid) -> CoreResult<Vec<BookingWithTravel>>;

    async fn list_bookings(&self, filter: &BookingFilter) -> CoreResult<Page<BookingListing>>;
}
