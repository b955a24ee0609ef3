pub mod models;
pub mod policy;
pub mod reference;

pub use models::{Booking, BookingStatus, BookingWithTravel, MyBookings, NewBooking};
pub use policy::{BookingError, BookingPolicy};
pub use reference::{generate_reference, is_well_formed};
