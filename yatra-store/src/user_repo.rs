use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;
use yatra_core::identity::{NewUser, ProfileUpdate, User};
use yatra_core::repository::UserRepository;
use yatra_core::search::{Page, UserFilter, PAGE_SIZE};
use yatra_core::{CoreError, CoreResult};
use yatra_shared::Masked;

use crate::database::{push_contains_any, storage_error, unique_violation};

pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    username: String,
    email: String,
    phone: String,
    password_hash: String,
    first_name: String,
    last_name: String,
    date_of_birth: Option<NaiveDate>,
    gender: Option<String>,
    address: String,
    city: String,
    state: Option<String>,
    pin_code: String,
    aadhaar_number: String,
    is_staff: bool,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            username: row.username,
            email: row.email,
            phone: Masked::new(row.phone),
            password_hash: Masked::new(row.password_hash),
            first_name: row.first_name,
            last_name: row.last_name,
            date_of_birth: row.date_of_birth,
            gender: row.gender.as_deref().and_then(|g| g.parse().ok()),
            address: row.address,
            city: row.city,
            state: row.state.map(|s| s.trim().to_string()),
            pin_code: row.pin_code,
            aadhaar_number: Masked::new(row.aadhaar_number),
            is_staff: row.is_staff,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Translates a unique-constraint name on `users` into the message shown to the user.
pub(crate) fn user_conflict(constraint: &str) -> CoreError {
    let message = if constraint.contains("username") {
        "A user with that username already exists."
    } else if constraint.contains("email") {
        "A user with that email already exists."
    } else if constraint.contains("phone") {
        "A user with that phone number already exists."
    } else {
        "A user with these details already exists."
    };
    CoreError::Conflict(message.to_string())
}

fn map_write_error(err: sqlx::Error) -> CoreError {
    match unique_violation(&err) {
        Some(constraint) => user_conflict(&constraint),
        None => storage_error(err),
    }
}

fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, filter: &UserFilter) {
    if let Some(is_staff) = filter.is_staff {
        qb.push(" AND is_staff = ").push_bind(is_staff);
    }
    if let Some(is_active) = filter.is_active {
        qb.push(" AND is_active = ").push_bind(is_active);
    }
    if let Some(state) = filter.state() {
        qb.push(" AND state = ").push_bind(state);
    }
    if let Some(gender) = filter.gender() {
        qb.push(" AND gender = ").push_bind(gender);
    }
    if let Some(q) = filter.search_term() {
        push_contains_any(qb, &["username", "first_name", "last_name", "email", "phone"], &q);
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn create_user(&self, user: NewUser) -> CoreResult<User> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (id, username, email, phone, password_hash, first_name, last_name,
                               date_of_birth, gender, is_staff)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&user.username)
        .bind(&user.email)
        .bind(user.phone.expose())
        .bind(user.password_hash.expose())
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(user.date_of_birth)
        .bind(user.gender.map(|g| g.code()))
        .bind(user.is_staff)
        .fetch_one(&self.pool)
        .await
        .map_err(map_write_error)?;

        tracing::info!("User registered: {}", row.username);
        Ok(row.into())
    }

    async fn get_user(&self, id: Uuid) -> CoreResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(storage_error)?;
        Ok(row.map(User::from))
    }

    async fn find_by_login(&self, login: &str) -> CoreResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT * FROM users
            WHERE username = $1 OR LOWER(email) = LOWER($1)
            ORDER BY (username = $1) DESC
            LIMIT 1
            "#,
        )
        .bind(login.trim())
        .fetch_optional(&self.pool)
        .await
        .map_err(storage_error)?;
        Ok(row.map(User::from))
    }

    async fn update_profile(&self, id: Uuid, update: ProfileUpdate) -> CoreResult<User> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            UPDATE users
            SET first_name = $2, last_name = $3, email = $4, phone = $5, date_of_birth = $6,
                gender = $7, address = $8, city = $9, state = $10, pin_code = $11,
                aadhaar_number = $12, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&update.first_name)
        .bind(&update.last_name)
        .bind(&update.email)
        .bind(&update.phone)
        .bind(update.date_of_birth)
        .bind(update.gender.map(|g| g.code()))
        .bind(&update.address)
        .bind(&update.city)
        .bind(&update.state)
        .bind(&update.pin_code)
        .bind(&update.aadhaar_number)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_write_error)?;

        row.map(User::from).ok_or(CoreError::NotFound("User"))
    }

    async fn list_users(&self, filter: &UserFilter) -> CoreResult<Page<User>> {
        let page = filter.page();

        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM users WHERE TRUE");
        push_filters(&mut count, filter);
        let total: i64 = count
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(storage_error)?;

        let mut query = QueryBuilder::<Postgres>::new("SELECT * FROM users WHERE TRUE");
        push_filters(&mut query, filter);
        query
            .push(" ORDER BY username LIMIT ")
            .push_bind(i64::from(PAGE_SIZE))
            .push(" OFFSET ")
            .push_bind(Page::<User>::offset(page));
        let rows: Vec<UserRow> = query
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(storage_error)?;

        Ok(Page::new(
            rows.into_iter().map(User::from).collect(),
            page,
            total.max(0) as u64,
        ))
    }
}
