use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// A wrapper for personal data (phone numbers, Aadhaar numbers) that masks its
/// value in Debug and Display output.
///
/// Serialization passes the real value through, since API responses and the
/// database need it. Use the explicit display helpers on the owning type when
/// rendering a partial value to users.
#[derive(Clone, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(transparent)]
pub struct Masked<T>(pub T);

impl<T> fmt::Debug for Masked<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "********")
    }
}

impl<T> fmt::Display for Masked<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "********")
    }
}

impl<T: Serialize> Serialize for Masked<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.0.serialize(serializer)
    }
}

impl<T> Masked<T> {
    pub fn new(value: T) -> Self {
        Self(value)
    }

    pub fn expose(&self) -> &T {
        &self.0
    }

    pub fn into_inner(self) -> T {
        self.0
    }
}

impl From<String> for Masked<String> {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for Masked<String> {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_and_display_are_masked() {
        let phone = Masked::from("+919876543210");
        assert_eq!(format!("{:?}", phone), "********");
        assert_eq!(format!("{}", phone), "********");
        assert_eq!(phone.expose(), "+919876543210");
    }

    #[test]
    fn test_serialize_passes_value_through() {
        let aadhaar = Masked::from("123412341234");
        let json = serde_json::to_string(&aadhaar).unwrap();
        assert_eq!(json, "\"123412341234\"");

        let back: Masked<String> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, aadhaar);
    }
}
