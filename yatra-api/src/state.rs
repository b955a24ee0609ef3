use std::sync::Arc;
use yatra_booking::BookingPolicy;
use yatra_core::repository::{BookingRepository, TravelRepository, UserRepository};
use yatra_store::RedisClient;

#[derive(Clone)]
pub struct AuthConfig {
    pub secret: String,
    pub expiration: u64,
}

#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserRepository>,
    pub travel: Arc<dyn TravelRepository>,
    pub bookings: Arc<dyn BookingRepository>,
    /// Rate limiting is skipped when unset
    pub redis: Option<Arc<RedisClient>>,
    pub auth: AuthConfig,
    pub policy: BookingPolicy,
    pub rate_limit_per_minute: u32,
}

impl AppState {
    pub fn new(
        users: Arc<dyn UserRepository>,
        travel: Arc<dyn TravelRepository>,
        bookings: Arc<dyn BookingRepository>,
        auth: AuthConfig,
    ) -> Self {
        Self {
            users,
            travel,
            bookings,
            redis: None,
            auth,
            policy: BookingPolicy::default(),
            rate_limit_per_minute: 100,
        }
    }

    /// All three repositories backed by one store.
    pub fn from_store<S>(store: Arc<S>, auth: AuthConfig) -> Self
    where
        S: UserRepository + TravelRepository + BookingRepository + 'static,
    {
        Self::new(store.clone(), store.clone(), store, auth)
    }

    pub fn with_redis(mut self, redis: RedisClient) -> Self {
        self.redis = Some(Arc::new(redis));
        self
    }

    pub fn with_policy(mut self, policy: BookingPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_rate_limit(mut self, per_minute: u32) -> Self {
        self.rate_limit_per_minute = per_minute;
        self
    }
}
