pub mod app_config;
pub mod booking_repo;
pub mod database;
pub mod memory;
pub mod redis_repo;
pub mod travel_repo;
pub mod user_repo;

pub use app_config::Config;
pub use booking_repo::PgBookingRepository;
pub use database::DbClient;
pub use memory::InMemoryStore;
pub use redis_repo::RedisClient;
pub use travel_repo::PgTravelRepository;
pub use user_repo::PgUserRepository;
