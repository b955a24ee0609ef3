/// Cities served by the catalog. Source and destination must be one of these.
pub const INDIAN_CITIES: &[&str] = &[
    "Agra",
    "Ahmedabad",
    "Amritsar",
    "Bangalore",
    "Bhopal",
    "Bhubaneswar",
    "Chandigarh",
    "Chennai",
    "Coimbatore",
    "Dehradun",
    "Delhi",
    "Goa",
    "Guwahati",
    "Hyderabad",
    "Indore",
    "Jaipur",
    "Kochi",
    "Kolkata",
    "Lucknow",
    "Madurai",
    "Mumbai",
    "Mysore",
    "Nagpur",
    "Patna",
    "Pune",
    "Srinagar",
    "Surat",
    "Thiruvananthapuram",
    "Udaipur",
    "Varanasi",
    "Visakhapatnam",
];

pub fn is_known_city(name: &str) -> bool {
    INDIAN_CITIES.contains(&name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_city_lookup_is_exact() {
        assert!(is_known_city("Delhi"));
        assert!(!is_known_city("delhi"));
        assert!(!is_known_city(""));
    }

    #[test]
    fn test_cities_sorted_and_unique() {
        let mut sorted = INDIAN_CITIES.to_vec();
        sorted.sort();
        sorted.dedup();
        assert_eq!(sorted, INDIAN_CITIES.to_vec());
    }
}
