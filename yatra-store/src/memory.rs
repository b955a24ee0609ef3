use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::Mutex;
use uuid::Uuid;
use yatra_booking::{
    generate_reference, Booking, BookingError, BookingPolicy, BookingStatus, BookingWithTravel, NewBooking,
};
use yatra_catalog::{NewTravelOption, TravelOption};
use yatra_core::identity::{NewUser, ProfileUpdate, User};
use yatra_core::repository::{BookingRepository, TravelRepository, UserRepository};
use yatra_core::search::{BookingFilter, BookingListing, Page, TravelFilter, TravelOptionFilter, UserFilter};
use yatra_core::{CoreError, CoreResult};

use crate::booking_repo::MAX_REFERENCE_ATTEMPTS;
use crate::user_repo::user_conflict;

#[derive(Default)]
struct State {
    users: HashMap<Uuid, User>,
    travel_options: HashMap<Uuid, TravelOption>,
    bookings: HashMap<Uuid, Booking>,
}

impl State {
    fn conflicting_user(&self, skip: Option<Uuid>, username: Option<&str>, email: &str, phone: &str) -> Option<CoreError> {
        self.users
            .values()
            .filter(|u| Some(u.id) != skip)
            .find_map(|u| {
                if username.is_some_and(|name| name == u.username) {
                    Some(user_conflict("username"))
                } else if u.email.eq_ignore_ascii_case(email) {
                    Some(user_conflict("email"))
                } else if u.phone.expose() == phone {
                    Some(user_conflict("phone"))
                } else {
                    None
                }
            })
    }

    fn with_travel(&self, booking: &Booking) -> CoreResult<BookingWithTravel> {
        let travel_option = self
            .travel_options
            .get(&booking.travel_option_id)
            .cloned()
            .ok_or(CoreError::NotFound("Travel option"))?;
        Ok(BookingWithTravel {
            booking: booking.clone(),
            travel_option,
        })
    }
}

/// Repositories over process memory, used by tests and local demos.
///
/// A single lock guards all three tables, so every booking and cancellation
/// is applied as one unit.
#[derive(Default)]
pub struct InMemoryStore {
    state: Mutex<State>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Grants or revokes staff access. Accounts only change role out of band.
    pub async fn set_staff(&self, id: Uuid, is_staff: bool) -> CoreResult<()> {
        let mut state = self.state.lock().await;
        let user = state.users.get_mut(&id).ok_or(CoreError::NotFound("User"))?;
        user.is_staff = is_staff;
        Ok(())
    }

    pub async fn set_active(&self, id: Uuid, is_active: bool) -> CoreResult<()> {
        let mut state = self.state.lock().await;
        let user = state.users.get_mut(&id).ok_or(CoreError::NotFound("User"))?;
        user.is_active = is_active;
        Ok(())
    }
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn create_user(&self, user: NewUser) -> CoreResult<User> {
        let mut state = self.state.lock().await;
        if let Some(conflict) = state.conflicting_user(None, Some(&user.username), &user.email, user.phone.expose()) {
            return Err(conflict);
        }
        let user = user.into_user(Utc::now());
        state.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn get_user(&self, id: Uuid) -> CoreResult<Option<User>> {
        Ok(self.state.lock().await.users.get(&id).cloned())
    }

    async fn find_by_login(&self, login: &str) -> CoreResult<Option<User>> {
        let login = login.trim();
        let state = self.state.lock().await;
        let by_username = state.users.values().find(|u| u.username == login);
        let found = by_username.or_else(|| state.users.values().find(|u| u.email.eq_ignore_ascii_case(login)));
        Ok(found.cloned())
    }

    async fn update_profile(&self, id: Uuid, update: ProfileUpdate) -> CoreResult<User> {
        let mut state = self.state.lock().await;
        if let Some(conflict) = state.conflicting_user(Some(id), None, &update.email, &update.phone) {
            return Err(conflict);
        }
        let user = state.users.get_mut(&id).ok_or(CoreError::NotFound("User"))?;
        user.apply_profile(update, Utc::now());
        Ok(user.clone())
    }

    async fn list_users(&self, filter: &UserFilter) -> CoreResult<Page<User>> {
        let state = self.state.lock().await;
        let mut users: Vec<User> = state.users.values().filter(|u| filter.matches(u)).cloned().collect();
        users.sort_by(|a, b| a.username.cmp(&b.username));
        Ok(Page::from_ordered(users, filter.page()))
    }
}

#[async_trait]
impl TravelRepository for InMemoryStore {
    async fn create_travel_option(&self, option: NewTravelOption) -> CoreResult<TravelOption> {
        let option = TravelOption::create(option, Utc::now())?;
        self.state.lock().await.travel_options.insert(option.id, option.clone());
        Ok(option)
    }

    async fn get_travel_option(&self, id: Uuid) -> CoreResult<Option<TravelOption>> {
        Ok(self.state.lock().await.travel_options.get(&id).cloned())
    }

    async fn update_travel_option(&self, id: Uuid, update: NewTravelOption) -> CoreResult<TravelOption> {
        let mut state = self.state.lock().await;
        let option = state.travel_options.get_mut(&id).ok_or(CoreError::NotFound("Travel option"))?;
        option.apply(update, Utc::now())?;
        Ok(option.clone())
    }

    async fn deactivate_travel_option(&self, id: Uuid) -> CoreResult<TravelOption> {
        let mut state = self.state.lock().await;
        let option = state.travel_options.get_mut(&id).ok_or(CoreError::NotFound("Travel option"))?;
        option.is_active = false;
        option.updated_at = Utc::now();
        Ok(option.clone())
    }

    async fn search(&self, filter: &TravelFilter, page: u32, now: DateTime<Utc>) -> CoreResult<Page<TravelOption>> {
        let state = self.state.lock().await;
        let mut found: Vec<TravelOption> = state
            .travel_options
            .values()
            .filter(|o| filter.matches(o, now))
            .cloned()
            .collect();
        found.sort_by_key(|o| o.departure_datetime);
        Ok(Page::from_ordered(found, page))
    }

    async fn list_travel_options(&self, filter: &TravelOptionFilter) -> CoreResult<Page<TravelOption>> {
        let state = self.state.lock().await;
        let mut found: Vec<TravelOption> = state
            .travel_options
            .values()
            .filter(|o| filter.matches(o))
            .cloned()
            .collect();
        found.sort_by_key(|o| o.departure_datetime);
        Ok(Page::from_ordered(found, filter.page()))
    }

    async fn replace_catalog(&self, options: Vec<NewTravelOption>) -> CoreResult<u64> {
        let now = Utc::now();
        let options = options
            .into_iter()
            .map(|new| TravelOption::create(new, now))
            .collect::<Result<Vec<_>, _>>()?;

        let mut state = self.state.lock().await;
        state.bookings.clear();
        state.travel_options = options.into_iter().map(|o| (o.id, o)).collect();
        Ok(state.travel_options.len() as u64)
    }
}

#[async_trait]
impl BookingRepository for InMemoryStore {
    async fn create_booking(
        &self,
        request: NewBooking,
        policy: &BookingPolicy,
        now: DateTime<Utc>,
    ) -> CoreResult<BookingWithTravel> {
        let mut state = self.state.lock().await;

        let option = state
            .travel_options
            .get(&request.travel_option_id)
            .ok_or(BookingError::TravelOptionNotFound)?;
        policy.check_bookable(option, request.num_seats, now)?;
        let total_price = policy.total_price(option, &request)?;

        let reference = (0..MAX_REFERENCE_ATTEMPTS)
            .map(|_| generate_reference())
            .find(|candidate| !state.bookings.values().any(|b| &b.booking_reference == candidate))
            .ok_or(BookingError::ReferenceExhausted)?;

        let option = state
            .travel_options
            .get_mut(&request.travel_option_id)
            .ok_or(BookingError::TravelOptionNotFound)?;
        option
            .reserve_seats(request.num_seats)
            .map_err(|e| CoreError::Storage(e.to_string()))?;
        option.updated_at = now;
        let travel_option = option.clone();

        let booking = Booking::confirmed(request, total_price, reference, now);
        state.bookings.insert(booking.id, booking.clone());

        tracing::info!("Booking {} confirmed", booking.booking_reference);
        Ok(BookingWithTravel { booking, travel_option })
    }

    async fn cancel_booking(
        &self,
        booking_id: Uuid,
        user_id: Uuid,
        policy: &BookingPolicy,
        now: DateTime<Utc>,
    ) -> CoreResult<BookingWithTravel> {
        let mut state = self.state.lock().await;

        let booking = state
            .bookings
            .get(&booking_id)
            .filter(|b| b.user_id == user_id)
            .cloned()
            .ok_or(BookingError::NotFound)?;
        let option = state
            .travel_options
            .get_mut(&booking.travel_option_id)
            .ok_or(CoreError::NotFound("Travel option"))?;

        policy.check_cancellable(&booking, option, now)?;
        option
            .release_seats(booking.num_seats)
            .map_err(|e| CoreError::Storage(e.to_string()))?;
        option.updated_at = now;
        let travel_option = option.clone();

        let stored = state.bookings.get_mut(&booking_id).ok_or(BookingError::NotFound)?;
        stored.status = BookingStatus::Cancelled;
        stored.updated_at = now;
        let booking = stored.clone();

        tracing::info!("Booking {} cancelled", booking.booking_reference);
        Ok(BookingWithTravel { booking, travel_option })
    }

    async fn get_booking_for_user(&self, booking_id: Uuid, user_id: Uuid) -> CoreResult<Option<BookingWithTravel>> {
        let state = self.state.lock().await;
        match state.bookings.get(&booking_id).filter(|b| b.user_id == user_id) {
            Some(booking) => state.with_travel(booking).map(Some),
            None => Ok(None),
        }
    }

    async fn list_bookings_for_user(&self, user_id: Uuid) -> CoreResult<Vec<BookingWithTravel>> {
        let state = self.state.lock().await;
        let mut bookings: Vec<&Booking> = state.bookings.values().filter(|b| b.user_id == user_id).collect();
        bookings.sort_by(|a, b| b.booking_date.cmp(&a.booking_date));
        bookings.into_iter().map(|b| state.with_travel(b)).collect()
    }

    async fn list_bookings(&self, filter: &BookingFilter) -> CoreResult<Page<BookingListing>> {
        let state = self.state.lock().await;
        let mut listings = Vec::new();
        for booking in state.bookings.values() {
            let entry = state.with_travel(booking)?;
            let (username, user_email) = state
                .users
                .get(&booking.user_id)
                .map(|u| (u.username.clone(), u.email.clone()))
                .unwrap_or_default();
            let listing = BookingListing {
                booking: entry.booking,
                travel_option: entry.travel_option,
                username,
                user_email,
            };
            if filter.matches(&listing) {
                listings.push(listing);
            }
        }
        listings.sort_by(|a, b| b.booking.booking_date.cmp(&a.booking.booking_date));
        Ok(Page::from_ordered(listings, filter.page()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use std::sync::Arc;
    use yatra_catalog::{CatalogError, TravelType};
    use yatra_shared::{Masked, Paise};

    fn departure(now: DateTime<Utc>, hours_ahead: i64, available: i32) -> NewTravelOption {
        let departure = now + Duration::hours(hours_ahead);
        NewTravelOption {
            travel_type: TravelType::Bus,
            source: "Mumbai".to_string(),
            destination: "Goa".to_string(),
            departure_datetime: departure,
            arrival_datetime: Some(departure + Duration::hours(10)),
            price: Paise::from_rupees(1100),
            total_seats: 40,
            available_seats: available,
            operator_name: "MSRTC".to_string(),
            service_number: "BUS-2040".to_string(),
            description: String::new(),
            is_active: true,
        }
    }

    fn account(username: &str, phone: &str) -> NewUser {
        NewUser {
            username: username.to_string(),
            email: format!("{}@example.in", username),
            phone: Masked::from(phone),
            password_hash: Masked::from("hash"),
            first_name: "Test".to_string(),
            last_name: "User".to_string(),
            date_of_birth: None,
            gender: None,
            is_staff: false,
        }
    }

    #[tokio::test]
    async fn test_booking_takes_and_cancel_restores_seats() {
        let store = InMemoryStore::new();
        let policy = BookingPolicy::default();
        let now = Utc::now();
        let user = store.create_user(account("priya", "+919800000001")).await.unwrap();
        let option = store.create_travel_option(departure(now, 48, 12)).await.unwrap();

        let booked = store
            .create_booking(NewBooking::new(user.id, option.id, 3), &policy, now)
            .await
            .unwrap();
        assert_eq!(booked.travel_option.available_seats, 9);
        assert_eq!(booked.booking.total_price, Paise::from_rupees(3300));
        assert_eq!(booked.booking.status, BookingStatus::Confirmed);

        let cancelled = store.cancel_booking(booked.booking.id, user.id, &policy, now).await.unwrap();
        assert_eq!(cancelled.booking.status, BookingStatus::Cancelled);
        assert_eq!(cancelled.travel_option.available_seats, 12);

        let again = store.cancel_booking(booked.booking.id, user.id, &policy, now).await;
        assert!(matches!(again, Err(CoreError::Booking(BookingError::AlreadyCancelled))));
        let option = store.get_travel_option(option.id).await.unwrap().unwrap();
        assert_eq!(option.available_seats, 12);
    }

    #[tokio::test]
    async fn test_failed_booking_mutates_nothing() {
        let store = InMemoryStore::new();
        let policy = BookingPolicy::default();
        let now = Utc::now();
        let user = store.create_user(account("ravi", "+919800000002")).await.unwrap();
        let option = store.create_travel_option(departure(now, 24, 2)).await.unwrap();

        let result = store.create_booking(NewBooking::new(user.id, option.id, 3), &policy, now).await;
        assert!(matches!(
            result,
            Err(CoreError::Booking(BookingError::InsufficientSeats { requested: 3, available: 2 }))
        ));

        let missing = store.create_booking(NewBooking::new(user.id, Uuid::new_v4(), 1), &policy, now).await;
        assert!(matches!(missing, Err(CoreError::Booking(BookingError::TravelOptionNotFound))));

        assert_eq!(store.get_travel_option(option.id).await.unwrap().unwrap().available_seats, 2);
        assert!(store.list_bookings_for_user(user.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_only_owner_can_cancel() {
        let store = InMemoryStore::new();
        let policy = BookingPolicy::default();
        let now = Utc::now();
        let owner = store.create_user(account("meera", "+919800000003")).await.unwrap();
        let other = store.create_user(account("kabir", "+919800000004")).await.unwrap();
        let option = store.create_travel_option(departure(now, 24, 10)).await.unwrap();

        let booked = store
            .create_booking(NewBooking::new(owner.id, option.id, 1), &policy, now)
            .await
            .unwrap();

        let result = store.cancel_booking(booked.booking.id, other.id, &policy, now).await;
        assert!(matches!(result, Err(CoreError::Booking(BookingError::NotFound))));
        assert!(store.get_booking_for_user(booked.booking.id, other.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_cancel_inside_window_is_refused() {
        let store = InMemoryStore::new();
        let policy = BookingPolicy::default();
        let now = Utc::now();
        let user = store.create_user(account("anita", "+919800000005")).await.unwrap();
        let option = store.create_travel_option(departure(now, 1, 10)).await.unwrap();

        let booked = store
            .create_booking(NewBooking::new(user.id, option.id, 2), &policy, now)
            .await
            .unwrap();
        let result = store.cancel_booking(booked.booking.id, user.id, &policy, now).await;
        assert!(matches!(
            result,
            Err(CoreError::Booking(BookingError::CancellationWindowClosed { .. }))
        ));
        assert_eq!(store.get_travel_option(option.id).await.unwrap().unwrap().available_seats, 8);
    }

    #[tokio::test]
    async fn test_admin_edit_keeps_booked_seats() {
        let store = InMemoryStore::new();
        let policy = BookingPolicy::new(120, 40);
        let now = Utc::now();
        let user = store.create_user(account("farhan", "+919800000006")).await.unwrap();
        let option = store.create_travel_option(departure(now, 48, 40)).await.unwrap();

        let booked = store
            .create_booking(NewBooking::new(user.id, option.id, 5), &policy, now)
            .await
            .unwrap();

        let repriced = NewTravelOption {
            price: Paise::from_rupees(1250),
            ..departure(now, 48, 40)
        };
        let edited = store.update_travel_option(option.id, repriced).await.unwrap();
        assert_eq!(edited.available_seats, 35);
        assert_eq!(edited.price, Paise::from_rupees(1250));

        let oversell = store.create_booking(NewBooking::new(user.id, option.id, 36), &policy, now).await;
        assert!(matches!(
            oversell,
            Err(CoreError::Booking(BookingError::InsufficientSeats { requested: 36, available: 35 }))
        ));

        let shrunk = NewTravelOption {
            total_seats: 4,
            available_seats: 4,
            ..departure(now, 48, 40)
        };
        let result = store.update_travel_option(option.id, shrunk).await;
        assert!(matches!(
            result,
            Err(CoreError::Catalog(CatalogError::TotalBelowBooked { total: 4, booked: 5 }))
        ));

        let cancelled = store.cancel_booking(booked.booking.id, user.id, &policy, now).await.unwrap();
        assert_eq!(cancelled.travel_option.available_seats, 40);
        assert_eq!(cancelled.travel_option.total_seats, 40);
    }

    #[tokio::test]
    async fn test_concurrent_bookings_for_last_seats() {
        let store = Arc::new(InMemoryStore::new());
        let policy = BookingPolicy::default();
        let now = Utc::now();
        let option_id = store.create_travel_option(departure(now, 24, 2)).await.unwrap().id;

        let mut handles = Vec::new();
        for i in 0..8 {
            let store = store.clone();
            let user = store
                .create_user(account(&format!("rider{}", i), &format!("+91980000010{}", i)))
                .await
                .unwrap();
            handles.push(tokio::spawn(async move {
                store
                    .create_booking(NewBooking::new(user.id, option_id, 2), &policy, now)
                    .await
            }));
        }

        let mut succeeded = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                succeeded += 1;
            }
        }
        assert_eq!(succeeded, 1);
        assert_eq!(store.get_travel_option(option_id).await.unwrap().unwrap().available_seats, 0);
    }

    #[tokio::test]
    async fn test_duplicate_accounts_conflict() {
        let store = InMemoryStore::new();
        store.create_user(account("sanjay", "+919800000006")).await.unwrap();

        let same_name = store.create_user(account("sanjay", "+919800000007")).await;
        assert!(matches!(same_name, Err(CoreError::Conflict(_))));

        let same_phone = store.create_user(account("sunil", "+919800000006")).await;
        assert!(matches!(same_phone, Err(CoreError::Conflict(msg)) if msg.contains("phone")));
    }

    #[tokio::test]
    async fn test_login_by_username_or_email() {
        let store = InMemoryStore::new();
        let user = store.create_user(account("deepa", "+919800000008")).await.unwrap();

        assert_eq!(store.find_by_login("deepa").await.unwrap().unwrap().id, user.id);
        assert_eq!(store.find_by_login("DEEPA@example.in").await.unwrap().unwrap().id, user.id);
        assert!(store.find_by_login("nobody").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_search_orders_by_departure() {
        let store = InMemoryStore::new();
        let now = Utc::now();
        let later = store.create_travel_option(departure(now, 30, 5)).await.unwrap();
        let sooner = store.create_travel_option(departure(now, 6, 5)).await.unwrap();
        store.create_travel_option(departure(now, 12, 0)).await.unwrap();

        let filter = TravelFilter {
            source: Some("Mumbai".to_string()),
            ..Default::default()
        };
        let page = store.search(&filter, 1, now).await.unwrap();
        let ids: Vec<Uuid> = page.items.iter().map(|o| o.id).collect();
        assert_eq!(ids, vec![sooner.id, later.id]);
    }
}
