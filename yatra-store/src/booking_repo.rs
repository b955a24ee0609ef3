use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};
use std::collections::HashMap;
use uuid::Uuid;
use yatra_booking::{
    generate_reference, Booking, BookingError, BookingPolicy, BookingStatus, BookingWithTravel, NewBooking,
};
use yatra_catalog::TravelOption;
use yatra_core::repository::BookingRepository;
use yatra_core::search::{BookingFilter, BookingListing, Page, PAGE_SIZE};
use yatra_core::{CoreError, CoreResult};
use yatra_shared::Paise;

use crate::database::{push_contains_any, storage_error};
use crate::travel_repo::{into_options, TravelOptionRow};

/// Attempts at a fresh reference before giving up
pub const MAX_REFERENCE_ATTEMPTS: usize = 5;

pub struct PgBookingRepository {
    pool: PgPool,
}

impl PgBookingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn travel_options_by_id(&self, ids: Vec<Uuid>) -> CoreResult<HashMap<Uuid, TravelOption>> {
        let rows = sqlx::query_as::<_, TravelOptionRow>("SELECT * FROM travel_options WHERE id = ANY($1)")
            .bind(ids)
            .fetch_all(&self.pool)
            .await
            .map_err(storage_error)?;
        Ok(into_options(rows)?.into_iter().map(|o| (o.id, o)).collect())
    }

    async fn with_travel(&self, bookings: Vec<Booking>) -> CoreResult<Vec<BookingWithTravel>> {
        let ids = bookings.iter().map(|b| b.travel_option_id).collect();
        let options = self.travel_options_by_id(ids).await?;
        bookings
            .into_iter()
            .map(|booking| {
                options
                    .get(&booking.travel_option_id)
                    .cloned()
                    .map(|travel_option| BookingWithTravel { booking, travel_option })
                    .ok_or(CoreError::NotFound("Travel option"))
            })
            .collect()
    }
}

#[derive(sqlx::FromRow)]
struct BookingRow {
    id: Uuid,
    user_id: Uuid,
    travel_option_id: Uuid,
    num_seats: i32,
    total_price_paise: i64,
    status: String,
    booking_reference: String,
    contact_phone: String,
    contact_email: String,
    passenger_details: serde_json::Value,
    special_requests: String,
    booking_date: DateTime<Utc>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<BookingRow> for Booking {
    type Error = CoreError;

    fn try_from(row: BookingRow) -> Result<Self, Self::Error> {
        let status: BookingStatus = row.status.parse().map_err(CoreError::Storage)?;
        Ok(Booking {
            id: row.id,
            user_id: row.user_id,
            travel_option_id: row.travel_option_id,
            num_seats: row.num_seats,
            total_price: Paise(row.total_price_paise),
            status,
            booking_reference: row.booking_reference,
            contact_phone: row.contact_phone,
            contact_email: row.contact_email,
            passenger_details: row.passenger_details,
            special_requests: row.special_requests,
            booking_date: row.booking_date,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn into_bookings(rows: Vec<BookingRow>) -> CoreResult<Vec<Booking>> {
    rows.into_iter().map(Booking::try_from).collect()
}

fn push_admin_filters(qb: &mut QueryBuilder<'_, Postgres>, filter: &BookingFilter) {
    qb.push(
        " FROM bookings b \
         JOIN users u ON u.id = b.user_id \
         JOIN travel_options t ON t.id = b.travel_option_id \
         WHERE TRUE",
    );
    match filter.status() {
        Some(Ok(status)) => {
            qb.push(" AND b.status = ").push_bind(status.as_str());
        }
        Some(Err(_)) => {
            qb.push(" AND FALSE");
        }
        None => {}
    }
    if let Some(travel_type) = filter.travel_type() {
        qb.push(" AND t.travel_type = ").push_bind(travel_type);
    }
    if let Some(q) = filter.search_term() {
        push_contains_any(
            qb,
            &["b.booking_reference", "u.username", "u.email", "b.contact_phone", "b.contact_email"],
            &q,
        );
    }
}

#[async_trait]
impl BookingRepository for PgBookingRepository {
    async fn create_booking(
        &self,
        request: NewBooking,
        policy: &BookingPolicy,
        now: DateTime<Utc>,
    ) -> CoreResult<BookingWithTravel> {
        policy.check_seat_count(request.num_seats)?;

        let mut tx = self.pool.begin().await.map_err(storage_error)?;

        // Conditional decrement: matches only while every booking precondition still holds.
        let decremented = sqlx::query_as::<_, TravelOptionRow>(
            r#"
            UPDATE travel_options
            SET available_seats = available_seats - $2, updated_at = $3
            WHERE id = $1 AND is_active AND departure_datetime > $3 AND available_seats >= $2
            RETURNING *
            "#,
        )
        .bind(request.travel_option_id)
        .bind(request.num_seats)
        .bind(now)
        .fetch_optional(&mut *tx)
        .await
        .map_err(storage_error)?;

        let travel_option = match decremented {
            Some(row) => TravelOption::try_from(row)?,
            None => {
                let current = sqlx::query_as::<_, TravelOptionRow>("SELECT * FROM travel_options WHERE id = $1")
                    .bind(request.travel_option_id)
                    .fetch_optional(&mut *tx)
                    .await
                    .map_err(storage_error)?;
                let option = current
                    .map(TravelOption::try_from)
                    .transpose()?
                    .ok_or(BookingError::TravelOptionNotFound)?;
                policy.check_bookable(&option, request.num_seats, now)?;
                // Seats went between the update and the re-read
                return Err(BookingError::InsufficientSeats {
                    requested: request.num_seats,
                    available: option.available_seats,
                }
                .into());
            }
        };

        let total_price = policy.total_price(&travel_option, &request)?;

        for attempt in 1..=MAX_REFERENCE_ATTEMPTS {
            let booking = Booking::confirmed(request.clone(), total_price, generate_reference(), now);

            let inserted = sqlx::query_as::<_, BookingRow>(
                r#"
                INSERT INTO bookings (id, user_id, travel_option_id, num_seats, total_price_paise, status,
                                      booking_reference, contact_phone, contact_email, passenger_details,
                                      special_requests, booking_date, created_at, updated_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
                ON CONFLICT (booking_reference) DO NOTHING
                RETURNING *
                "#,
            )
            .bind(booking.id)
            .bind(booking.user_id)
            .bind(booking.travel_option_id)
            .bind(booking.num_seats)
            .bind(booking.total_price.as_i64())
            .bind(booking.status.as_str())
            .bind(&booking.booking_reference)
            .bind(&booking.contact_phone)
            .bind(&booking.contact_email)
            .bind(&booking.passenger_details)
            .bind(&booking.special_requests)
            .bind(booking.booking_date)
            .bind(booking.created_at)
            .bind(booking.updated_at)
            .fetch_optional(&mut *tx)
            .await
            .map_err(storage_error)?;

            match inserted {
                Some(row) => {
                    tx.commit().await.map_err(storage_error)?;
                    let booking = Booking::try_from(row)?;
                    tracing::info!(
                        "Booking {} confirmed: {} seat(s) on {}",
                        booking.booking_reference,
                        booking.num_seats,
                        travel_option
                    );
                    return Ok(BookingWithTravel { booking, travel_option });
                }
                None => {
                    tracing::warn!(
                        "Booking reference collision on {} (attempt {}/{})",
                        booking.booking_reference,
                        attempt,
                        MAX_REFERENCE_ATTEMPTS
                    );
                }
            }
        }

        tx.rollback().await.map_err(storage_error)?;
        Err(BookingError::ReferenceExhausted.into())
    }

    async fn cancel_booking(
        &self,
        booking_id: Uuid,
        user_id: Uuid,
        policy: &BookingPolicy,
        now: DateTime<Utc>,
    ) -> CoreResult<BookingWithTravel> {
        let mut tx = self.pool.begin().await.map_err(storage_error)?;

        let booking = sqlx::query_as::<_, BookingRow>("SELECT * FROM bookings WHERE id = $1 AND user_id = $2 FOR UPDATE")
            .bind(booking_id)
            .bind(user_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(storage_error)?
            .map(Booking::try_from)
            .transpose()?
            .ok_or(BookingError::NotFound)?;

        let option = sqlx::query_as::<_, TravelOptionRow>("SELECT * FROM travel_options WHERE id = $1 FOR UPDATE")
            .bind(booking.travel_option_id)
            .fetch_one(&mut *tx)
            .await
            .map_err(storage_error)?;
        let option = TravelOption::try_from(option)?;

        if let Err(err) = policy.check_cancellable(&booking, &option, now) {
            tracing::warn!("Cancellation of {} refused: {}", booking.booking_reference, err);
            return Err(err.into());
        }

        let cancelled = sqlx::query_as::<_, BookingRow>(
            r#"
            UPDATE bookings SET status = 'cancelled', updated_at = $2
            WHERE id = $1 AND status = 'confirmed'
            RETURNING *
            "#,
        )
        .bind(booking.id)
        .bind(now)
        .fetch_optional(&mut *tx)
        .await
        .map_err(storage_error)?
        .ok_or(BookingError::AlreadyCancelled)?;

        let restored = sqlx::query_as::<_, TravelOptionRow>(
            r#"
            UPDATE travel_options SET available_seats = available_seats + $2, updated_at = $3
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(option.id)
        .bind(booking.num_seats)
        .bind(now)
        .fetch_one(&mut *tx)
        .await
        .map_err(storage_error)?;

        tx.commit().await.map_err(storage_error)?;

        let booking = Booking::try_from(cancelled)?;
        tracing::info!(
            "Booking {} cancelled, {} seat(s) released",
            booking.booking_reference,
            booking.num_seats
        );
        Ok(BookingWithTravel {
            booking,
            travel_option: TravelOption::try_from(restored)?,
        })
    }

    async fn get_booking_for_user(&self, booking_id: Uuid, user_id: Uuid) -> CoreResult<Option<BookingWithTravel>> {
        let row = sqlx::query_as::<_, BookingRow>("SELECT * FROM bookings WHERE id = $1 AND user_id = $2")
            .bind(booking_id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(storage_error)?;

        match row {
            Some(row) => {
                let mut found = self.with_travel(vec![Booking::try_from(row)?]).await?;
                Ok(found.pop())
            }
            None => Ok(None),
        }
    }

    async fn list_bookings_for_user(&self, user_id: Uuid) -> CoreResult<Vec<BookingWithTravel>> {
        let rows = sqlx::query_as::<_, BookingRow>(
            "SELECT * FROM bookings WHERE user_id = $1 ORDER BY booking_date DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(storage_error)?;

        self.with_travel(into_bookings(rows)?).await
    }

    async fn list_bookings(&self, filter: &BookingFilter) -> CoreResult<Page<BookingListing>> {
        let page = filter.page();

        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*)");
        push_admin_filters(&mut count, filter);
        let total: i64 = count
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(storage_error)?;

        let mut query = QueryBuilder::<Postgres>::new("SELECT b.*");
        push_admin_filters(&mut query, filter);
        query
            .push(" ORDER BY b.booking_date DESC LIMIT ")
            .push_bind(i64::from(PAGE_SIZE))
            .push(" OFFSET ")
            .push_bind(Page::<BookingListing>::offset(page));
        let rows: Vec<BookingRow> = query
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(storage_error)?;

        let bookings = self.with_travel(into_bookings(rows)?).await?;

        let user_ids: Vec<Uuid> = bookings.iter().map(|b| b.booking.user_id).collect();
        let owners: HashMap<Uuid, (String, String)> =
            sqlx::query_as::<_, (Uuid, String, String)>("SELECT id, username, email FROM users WHERE id = ANY($1)")
                .bind(user_ids)
                .fetch_all(&self.pool)
                .await
                .map_err(storage_error)?
                .into_iter()
                .map(|(id, username, email)| (id, (username, email)))
                .collect();

        let listings = bookings
            .into_iter()
            .map(|entry| {
                let (username, user_email) = owners.get(&entry.booking.user_id).cloned().unwrap_or_default();
                BookingListing {
                    booking: entry.booking,
                    travel_option: entry.travel_option,
                    username,
                    user_email,
                }
            })
            .collect();

        Ok(Page::new(listings, page, total.max(0) as u64))
    }
}
