use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;
use yatra_catalog::{NewTravelOption, TravelOption, TravelType};
use yatra_core::repository::TravelRepository;
use yatra_core::search::{Page, TravelFilter, TravelOptionFilter, PAGE_SIZE};
use yatra_core::{CoreError, CoreResult};
use yatra_shared::Paise;

use crate::database::{push_contains_any, storage_error};

const INSERT_CHUNK: usize = 500;

pub struct PgTravelRepository {
    pool: PgPool,
}

impl PgTravelRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct TravelOptionRow {
    id: Uuid,
    travel_type: String,
    source: String,
    destination: String,
    departure_datetime: DateTime<Utc>,
    arrival_datetime: Option<DateTime<Utc>>,
    price_paise: i64,
    total_seats: i32,
    available_seats: i32,
    operator_name: String,
    service_number: String,
    description: String,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<TravelOptionRow> for TravelOption {
    type Error = CoreError;

    fn try_from(row: TravelOptionRow) -> Result<Self, Self::Error> {
        let travel_type: TravelType = row
            .travel_type
            .parse()
            .map_err(|e: yatra_catalog::CatalogError| CoreError::Storage(e.to_string()))?;
        Ok(TravelOption {
            id: row.id,
            travel_type,
            source: row.source,
            destination: row.destination,
            departure_datetime: row.departure_datetime,
            arrival_datetime: row.arrival_datetime,
            price: Paise(row.price_paise),
            total_seats: row.total_seats,
            available_seats: row.available_seats,
            operator_name: row.operator_name,
            service_number: row.service_number,
            description: row.description,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

pub(crate) fn into_options(rows: Vec<TravelOptionRow>) -> CoreResult<Vec<TravelOption>> {
    rows.into_iter().map(TravelOption::try_from).collect()
}

fn push_search_filters(qb: &mut QueryBuilder<'_, Postgres>, filter: &TravelFilter, now: DateTime<Utc>) {
    qb.push(" WHERE is_active AND available_seats > 0 AND departure_datetime > ")
        .push_bind(now);
    if let Some(source) = &filter.source {
        qb.push(" AND source = ").push_bind(source.clone());
    }
    if let Some(destination) = &filter.destination {
        qb.push(" AND destination = ").push_bind(destination.clone());
    }
    if let Some(travel_type) = &filter.travel_type {
        qb.push(" AND travel_type = ").push_bind(travel_type.clone());
    }
    if let Some(date) = filter.date {
        qb.push(" AND (departure_datetime AT TIME ZONE 'UTC')::date = ")
            .push_bind(date);
    }
}

fn push_admin_filters(qb: &mut QueryBuilder<'_, Postgres>, filter: &TravelOptionFilter) {
    qb.push(" WHERE TRUE");
    if let Some(travel_type) = filter.travel_type() {
        qb.push(" AND travel_type = ").push_bind(travel_type);
    }
    if let Some(source) = filter.source() {
        qb.push(" AND source = ").push_bind(source);
    }
    if let Some(destination) = filter.destination() {
        qb.push(" AND destination = ").push_bind(destination);
    }
    if let Some(is_active) = filter.is_active {
        qb.push(" AND is_active = ").push_bind(is_active);
    }
    if let Some(q) = filter.search_term() {
        push_contains_any(qb, &["source", "destination", "operator_name", "service_number"], &q);
    }
}

async fn count(qb: &mut QueryBuilder<'_, Postgres>, pool: &PgPool) -> CoreResult<u64> {
    let total: i64 = qb
        .build_query_scalar()
        .fetch_one(pool)
        .await
        .map_err(storage_error)?;
    Ok(total.max(0) as u64)
}

#[async_trait]
impl TravelRepository for PgTravelRepository {
    async fn create_travel_option(&self, option: NewTravelOption) -> CoreResult<TravelOption> {
        let option = TravelOption::create(option, Utc::now())?;

        let row = sqlx::query_as::<_, TravelOptionRow>(
            r#"
            INSERT INTO travel_options (id, travel_type, source, destination, departure_datetime,
                                        arrival_datetime, price_paise, total_seats, available_seats,
                                        operator_name, service_number, description, is_active,
                                        created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            RETURNING *
            "#,
        )
        .bind(option.id)
        .bind(option.travel_type.as_str())
        .bind(&option.source)
        .bind(&option.destination)
        .bind(option.departure_datetime)
        .bind(option.arrival_datetime)
        .bind(option.price.as_i64())
        .bind(option.total_seats)
        .bind(option.available_seats)
        .bind(&option.operator_name)
        .bind(&option.service_number)
        .bind(&option.description)
        .bind(option.is_active)
        .bind(option.created_at)
        .bind(option.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(storage_error)?;

        tracing::info!("Travel option created: {}", option);
        row.try_into()
    }

    async fn get_travel_option(&self, id: Uuid) -> CoreResult<Option<TravelOption>> {
        let row = sqlx::query_as::<_, TravelOptionRow>("SELECT * FROM travel_options WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(storage_error)?;
        row.map(TravelOption::try_from).transpose()
    }

    async fn update_travel_option(&self, id: Uuid, update: NewTravelOption) -> CoreResult<TravelOption> {
        let mut tx = self.pool.begin().await.map_err(storage_error)?;

        let current = sqlx::query_as::<_, TravelOptionRow>("SELECT * FROM travel_options WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(storage_error)?
            .ok_or(CoreError::NotFound("Travel option"))?;

        let mut option = TravelOption::try_from(current)?;
        option.apply(update, Utc::now())?;

        let row = sqlx::query_as::<_, TravelOptionRow>(
            r#"
            UPDATE travel_options
            SET travel_type = $2, source = $3, destination = $4, departure_datetime = $5,
                arrival_datetime = $6, price_paise = $7, total_seats = $8, available_seats = $9,
                operator_name = $10, service_number = $11, description = $12, is_active = $13,
                updated_at = $14
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(option.travel_type.as_str())
        .bind(&option.source)
        .bind(&option.destination)
        .bind(option.departure_datetime)
        .bind(option.arrival_datetime)
        .bind(option.price.as_i64())
        .bind(option.total_seats)
        .bind(option.available_seats)
        .bind(&option.operator_name)
        .bind(&option.service_number)
        .bind(&option.description)
        .bind(option.is_active)
        .bind(option.updated_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(storage_error)?;

        tx.commit().await.map_err(storage_error)?;
        row.try_into()
    }

    async fn deactivate_travel_option(&self, id: Uuid) -> CoreResult<TravelOption> {
        let row = sqlx::query_as::<_, TravelOptionRow>(
            "UPDATE travel_options SET is_active = FALSE, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage_error)?
        .ok_or(CoreError::NotFound("Travel option"))?;

        tracing::info!("Travel option {} deactivated", id);
        row.try_into()
    }

    async fn search(&self, filter: &TravelFilter, page: u32, now: DateTime<Utc>) -> CoreResult<Page<TravelOption>> {
        let mut total = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM travel_options");
        push_search_filters(&mut total, filter, now);
        let total = count(&mut total, &self.pool).await?;

        let mut query = QueryBuilder::<Postgres>::new("SELECT * FROM travel_options");
        push_search_filters(&mut query, filter, now);
        query
            .push(" ORDER BY departure_datetime ASC LIMIT ")
            .push_bind(i64::from(PAGE_SIZE))
            .push(" OFFSET ")
            .push_bind(Page::<TravelOption>::offset(page));
        let rows: Vec<TravelOptionRow> = query
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(storage_error)?;

        Ok(Page::new(into_options(rows)?, page, total))
    }

    async fn list_travel_options(&self, filter: &TravelOptionFilter) -> CoreResult<Page<TravelOption>> {
        let page = filter.page();

        let mut total = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM travel_options");
        push_admin_filters(&mut total, filter);
        let total = count(&mut total, &self.pool).await?;

        let mut query = QueryBuilder::<Postgres>::new("SELECT * FROM travel_options");
        push_admin_filters(&mut query, filter);
        query
            .push(" ORDER BY departure_datetime ASC LIMIT ")
            .push_bind(i64::from(PAGE_SIZE))
            .push(" OFFSET ")
            .push_bind(Page::<TravelOption>::offset(page));
        let rows: Vec<TravelOptionRow> = query
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(storage_error)?;

        Ok(Page::new(into_options(rows)?, page, total))
    }

    async fn replace_catalog(&self, options: Vec<NewTravelOption>) -> CoreResult<u64> {
        let now = Utc::now();
        let options = options
            .into_iter()
            .map(|new| TravelOption::create(new, now))
            .collect::<Result<Vec<_>, _>>()?;

        let mut tx = self.pool.begin().await.map_err(storage_error)?;

        sqlx::query("TRUNCATE travel_options CASCADE")
            .execute(&mut *tx)
            .await
            .map_err(storage_error)?;

        let mut inserted = 0;
        for chunk in options.chunks(INSERT_CHUNK) {
            let mut qb = QueryBuilder::<Postgres>::new(
                "INSERT INTO travel_options (id, travel_type, source, destination, departure_datetime, \
                 arrival_datetime, price_paise, total_seats, available_seats, operator_name, \
                 service_number, description, is_active, created_at, updated_at) ",
            );
            qb.push_values(chunk, |mut b, option| {
                b.push_bind(option.id)
                    .push_bind(option.travel_type.as_str())
                    .push_bind(option.source.clone())
                    .push_bind(option.destination.clone())
                    .push_bind(option.departure_datetime)
                    .push_bind(option.arrival_datetime)
                    .push_bind(option.price.as_i64())
                    .push_bind(option.total_seats)
                    .push_bind(option.available_seats)
                    .push_bind(option.operator_name.clone())
                    .push_bind(option.service_number.clone())
                    .push_bind(option.description.clone())
                    .push_bind(option.is_active)
                    .push_bind(option.created_at)
                    .push_bind(option.updated_at);
            });
            let result = qb.build().execute(&mut *tx).await.map_err(storage_error)?;
            inserted += result.rows_affected();
        }

        tx.commit().await.map_err(storage_error)?;
        tracing::info!("Catalog replaced with {} travel options", inserted);
        Ok(inserted)
    }
}
