use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// An amount in Indian Rupees held in paise (1/100 rupee).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Paise(pub i64);

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum MoneyError {
    #[error("Invalid amount: {0}")]
    Invalid(String),

    #[error("Amount out of range")]
    Overflow,
}

impl Paise {
    pub const ZERO: Paise = Paise(0);

    pub const fn from_rupees(rupees: i64) -> Self {
        Paise(rupees * 100)
    }

    pub const fn as_i64(self) -> i64 {
        self.0
    }

    /// Price for `quantity` units, `None` on overflow.
    pub fn checked_mul(self, quantity: i64) -> Option<Paise> {
        self.0.checked_mul(quantity).map(Paise)
    }

    /// Share of this amount per unit, rounded down to the paisa.
    pub fn per_unit(self, quantity: i64) -> Paise {
        if quantity <= 0 {
            return Paise::ZERO;
        }
        Paise(self.0 / quantity)
    }

    /// Formats as `₹12,345.67`.
    pub fn format_inr(&self) -> String {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let rupees = (abs / 100).to_string();
        let paise = abs % 100;

        let mut grouped = String::with_capacity(rupees.len() + rupees.len() / 3);
        for (i, ch) in rupees.chars().enumerate() {
            if i > 0 && (rupees.len() - i) % 3 == 0 {
                grouped.push(',');
            }
            grouped.push(ch);
        }

        format!("{}₹{}.{:02}", sign, grouped, paise)
    }
}

impl fmt::Display for Paise {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{}{}.{:02}", sign, abs / 100, abs % 100)
    }
}

/// Parses rupee amounts such as `2500`, `2500.5`, `2,500.50` or `₹2500.00`.
impl FromStr for Paise {
    type Err = MoneyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let cleaned: String = s
            .trim()
            .trim_start_matches('₹')
            .chars()
            .filter(|c| *c != ',')
            .collect();

        let (whole, frac) = match cleaned.split_once('.') {
            Some((w, f)) => (w, f),
            None => (cleaned.as_str(), ""),
        };

        let valid_whole = !whole.is_empty() && whole.chars().all(|c| c.is_ascii_digit());
        let valid_frac = frac.len() <= 2 && frac.chars().all(|c| c.is_ascii_digit());
        if !valid_whole || !valid_frac {
            return Err(MoneyError::Invalid(s.to_string()));
        }

        let rupees: i64 = whole.parse().map_err(|_| MoneyError::Overflow)?;
        let paise: i64 = match frac.len() {
            0 => 0,
            1 => frac.parse::<i64>().map_err(|_| MoneyError::Invalid(s.to_string()))? * 10,
            _ => frac.parse::<i64>().map_err(|_| MoneyError::Invalid(s.to_string()))?,
        };

        rupees
            .checked_mul(100)
            .and_then(|p| p.checked_add(paise))
            .map(Paise)
            .ok_or(MoneyError::Overflow)
    }
}
