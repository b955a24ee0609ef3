pub mod cities;
pub mod generator;
pub mod inventory;
pub mod pricing;
pub mod travel_option;

pub use cities::{is_known_city, INDIAN_CITIES};
pub use generator::SampleGenerator;
pub use inventory::InventoryError;
pub use pricing::{quote, Fare, PriceBand, PricingError};
pub use travel_option::{CatalogError, NewTravelOption, TravelOption, TravelType};
