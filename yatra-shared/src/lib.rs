pub mod money;
pub mod pii;

pub use money::{MoneyError, Paise};
pub use pii::Masked;
