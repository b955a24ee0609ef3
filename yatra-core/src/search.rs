use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use yatra_booking::{Booking, BookingStatus};
use yatra_catalog::TravelOption;

use crate::identity::User;

pub const PAGE_SIZE: u32 = 10;

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn contains_ci(haystack: &str, needle_lower: &str) -> bool {
    haystack.to_lowercase().contains(needle_lower)
}

/// Query string of the public search page
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TravelSearchQuery {
    pub source: Option<String>,
    pub destination: Option<String>,
    pub travel_type: Option<String>,
    /// `YYYY-MM-DD`; ignored when it does not parse
    pub date: Option<String>,
    pub page: Option<u32>,
}

impl TravelSearchQuery {
    pub fn filter(&self) -> TravelFilter {
        TravelFilter {
            source: non_empty(&self.source),
            destination: non_empty(&self.destination),
            travel_type: non_empty(&self.travel_type).map(|t| t.to_lowercase()),
            date: non_empty(&self.date).and_then(|d| NaiveDate::parse_from_str(&d, "%Y-%m-%d").ok()),
        }
    }

    pub fn page(&self) -> u32 {
        self.page.unwrap_or(1).max(1)
    }
}

/// Exact-match narrowing of bookable departures
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TravelFilter {
    pub source: Option<String>,
    pub destination: Option<String>,
    pub travel_type: Option<String>,
    /// Calendar date of departure, in UTC
    pub date: Option<NaiveDate>,
}

impl TravelFilter {
    /// Bookable (active, departing after `now`, seats left) and matching every given filter.
    pub fn matches(&self, option: &TravelOption, now: DateTime<Utc>) -> bool {
        if !option.is_active || option.departure_datetime <= now || option.available_seats <= 0 {
            return false;
        }
        if let Some(source) = &self.source {
            if &option.source != source {
                return false;
            }
        }
        if let Some(destination) = &self.destination {
            if &option.destination != destination {
                return false;
            }
        }
        if let Some(travel_type) = &self.travel_type {
            if option.travel_type.as_str() != travel_type.as_str() {
                return false;
            }
        }
        if let Some(date) = self.date {
            if option.departure_datetime.date_naive() != date {
                return false;
            }
        }
        true
    }
}

/// One page of an ordered result set
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub per_page: u32,
    pub total: u64,
    pub num_pages: u32,
    pub has_next: bool,
    pub has_previous: bool,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, page: u32, total: u64) -> Self {
        let page = page.max(1);
        let num_pages = total.div_ceil(u64::from(PAGE_SIZE)).max(1) as u32;
        Self {
            items,
            page,
            per_page: PAGE_SIZE,
            total,
            num_pages,
            has_next: page < num_pages,
            has_previous: page > 1,
        }
    }

    /// Cuts page `page` out of an already ordered result set.
    pub fn from_ordered(all: Vec<T>, page: u32) -> Self {
        let page = page.max(1);
        let total = all.len() as u64;
        let start = (page - 1).saturating_mul(PAGE_SIZE) as usize;
        let items = all.into_iter().skip(start).take(PAGE_SIZE as usize).collect();
        Self::new(items, page, total)
    }

    pub fn offset(page: u32) -> i64 {
        i64::from(page.max(1) - 1) * i64::from(PAGE_SIZE)
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            per_page: self.per_page,
            total: self.total,
            num_pages: self.num_pages,
            has_next: self.has_next,
            has_previous: self.has_previous,
        }
    }
}

/// Admin user list: filters plus free-text search
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserFilter {
    pub is_staff: Option<bool>,
    pub is_active: Option<bool>,
    pub state: Option<String>,
    pub gender: Option<String>,
    /// Searches username, names, email and phone
    pub q: Option<String>,
    pub page: Option<u32>,
}

impl UserFilter {
    pub fn search_term(&self) -> Option<String> {
        non_empty(&self.q).map(|q| q.to_lowercase())
    }

    pub fn state(&self) -> Option<String> {
        non_empty(&self.state)
    }

    pub fn gender(&self) -> Option<String> {
        non_empty(&self.gender)
    }

    pub fn page(&self) -> u32 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn matches(&self, user: &User) -> bool {
        if self.is_staff.is_some_and(|staff| staff != user.is_staff) {
            return false;
        }
        if self.is_active.is_some_and(|active| active != user.is_active) {
            return false;
        }
        if let Some(state) = self.state() {
            if user.state.as_deref() != Some(state.as_str()) {
                return false;
            }
        }
        if let Some(gender) = self.gender() {
            if user.gender.map(|g| g.code()) != Some(gender.as_str()) {
                return false;
            }
        }
        match self.search_term() {
            Some(q) => [
                user.username.as_str(),
                user.first_name.as_str(),
                user.last_name.as_str(),
                user.email.as_str(),
                user.phone.expose().as_str(),
            ]
            .iter()
            .any(|field| contains_ci(field, &q)),
            None => true,
        }
    }
}

/// Admin travel option list
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TravelOptionFilter {
    pub travel_type: Option<String>,
    pub source: Option<String>,
    pub destination: Option<String>,
    pub is_active: Option<bool>,
    /// Searches source, destination, operator and service number
    pub q: Option<String>,
    pub page: Option<u32>,
}

impl TravelOptionFilter {
    pub fn travel_type(&self) -> Option<String> {
        non_empty(&self.travel_type).map(|t| t.to_lowercase())
    }

    pub fn source(&self) -> Option<String> {
        non_empty(&self.source)
    }

    pub fn destination(&self) -> Option<String> {
        non_empty(&self.destination)
    }

    pub fn search_term(&self) -> Option<String> {
        non_empty(&self.q).map(|q| q.to_lowercase())
    }

    pub fn page(&self) -> u32 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn matches(&self, option: &TravelOption) -> bool {
        if let Some(travel_type) = self.travel_type() {
            if option.travel_type.as_str() != travel_type {
                return false;
            }
        }
        if self.source().is_some_and(|s| s != option.source) {
            return false;
        }
        if self.destination().is_some_and(|d| d != option.destination) {
            return false;
        }
        if self.is_active.is_some_and(|active| active != option.is_active) {
            return false;
        }
        match self.search_term() {
            Some(q) => [
                option.source.as_str(),
                option.destination.as_str(),
                option.operator_name.as_str(),
                option.service_number.as_str(),
            ]
            .iter()
            .any(|field| contains_ci(field, &q)),
            None => true,
        }
    }
}

/// A booking as shown in the admin list, with its owner and departure
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct BookingListing {
    pub booking: Booking,
    pub travel_option: TravelOption,
    pub username: String,
    pub user_email: String,
}

/// Admin booking list
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BookingFilter {
    pub status: Option<String>,
    pub travel_type: Option<String>,
    /// Searches reference, owner username and email, contact phone and email
    pub q: Option<String>,
    pub page: Option<u32>,
}

impl BookingFilter {
    /// Parsed status filter; an unknown status matches nothing.
    pub fn status(&self) -> Option<Result<BookingStatus, String>> {
        non_empty(&self.status).map(|s| s.parse::<BookingStatus>())
    }

    pub fn travel_type(&self) -> Option<String> {
        non_empty(&self.travel_type).map(|t| t.to_lowercase())
    }

    pub fn search_term(&self) -> Option<String> {
        non_empty(&self.q).map(|q| q.to_lowercase())
    }

    pub fn page(&self) -> u32 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn matches(&self, listing: &BookingListing) -> bool {
        match self.status() {
            Some(Ok(status)) if status != listing.booking.status => return false,
            Some(Err(_)) => return false,
            _ => {}
        }
        if let Some(travel_type) = self.travel_type() {
            if listing.travel_option.travel_type.as_str() != travel_type {
                return false;
            }
        }
        match self.search_term() {
            Some(q) => [
                listing.booking.booking_reference.as_str(),
                listing.username.as_str(),
                listing.user_email.as_str(),
                listing.booking.contact_phone.as_str(),
                listing.booking.contact_email.as_str(),
            ]
            .iter()
            .any(|field| contains_ci(field, &q)),
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use yatra_catalog::{NewTravelOption, TravelType};
    use yatra_shared::Paise;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 2, 27, 9, 0, 0).unwrap()
    }

    fn option(source: &str, destination: &str, departure: DateTime<Utc>, available: i32) -> TravelOption {
        TravelOption::create(
            NewTravelOption {
                travel_type: TravelType::Flight,
                source: source.to_string(),
                destination: destination.to_string(),
                departure_datetime: departure,
                arrival_datetime: None,
                price: Paise::from_rupees(5200),
                total_seats: 180,
                available_seats: available,
                operator_name: "Vistara".to_string(),
                service_number: "UK-0945".to_string(),
                description: String::new(),
                is_active: true,
            },
            now(),
        )
        .unwrap()
    }

    fn query(source: &str, destination: &str, date: &str) -> TravelSearchQuery {
        TravelSearchQuery {
            source: Some(source.to_string()),
            destination: Some(destination.to_string()),
            travel_type: None,
            date: Some(date.to_string()),
            page: None,
        }
    }

    #[test]
    fn test_search_query_deserialization() {
        let raw = r#"{"source": "Delhi", "destination": "", "date": "2025-03-01", "page": 2}"#;
        let parsed: TravelSearchQuery = serde_json::from_str(raw).unwrap();
        let filter = parsed.filter();
        assert_eq!(filter.source.as_deref(), Some("Delhi"));
        assert_eq!(filter.destination, None);
        assert_eq!(filter.date, NaiveDate::from_ymd_opt(2025, 3, 1));
        assert_eq!(parsed.page(), 2);
    }

    #[test]
    fn test_bad_date_is_ignored() {
        let filter = query("Delhi", "Mumbai", "01-03-2025").filter();
        assert_eq!(filter.date, None);
        assert_eq!(filter.source.as_deref(), Some("Delhi"));
    }

    #[test]
    fn test_delhi_mumbai_on_date() {
        let day = Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap();
        let filter = query("Delhi", "Mumbai", "2025-03-01").filter();

        let morning = option("Delhi", "Mumbai", day + Duration::hours(7), 20);
        assert!(filter.matches(&morning, now()));

        let next_day = option("Delhi", "Mumbai", day + Duration::hours(25), 20);
        assert!(!filter.matches(&next_day, now()));

        let wrong_way = option("Mumbai", "Delhi", day + Duration::hours(7), 20);
        assert!(!filter.matches(&wrong_way, now()));

        let sold_out = option("Delhi", "Mumbai", day + Duration::hours(9), 0);
        assert!(!filter.matches(&sold_out, now()));

        let mut inactive = morning.clone();
        inactive.is_active = false;
        assert!(!filter.matches(&inactive, now()));

        assert!(!filter.matches(&morning, day + Duration::hours(7)));
    }

    #[test]
    fn test_travel_type_filter_is_exact() {
        let day = Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap();
        let flight = option("Delhi", "Mumbai", day, 5);

        let mut filter = TravelFilter { travel_type: Some("flight".to_string()), ..Default::default() };
        assert!(filter.matches(&flight, now()));
        filter.travel_type = Some("ferry".to_string());
        assert!(!filter.matches(&flight, now()));
    }

    #[test]
    fn test_pagination() {
        let page = Page::from_ordered((1..=23).collect::<Vec<_>>(), 3);
        assert_eq!(page.items, vec![21, 22, 23]);
        assert_eq!(page.num_pages, 3);
        assert!(!page.has_next);
        assert!(page.has_previous);

        let empty: Page<i32> = Page::from_ordered(Vec::new(), 1);
        assert_eq!(empty.num_pages, 1);
        assert!(!empty.has_next);
        assert_eq!(Page::<i32>::offset(2), 10);
    }

    #[test]
    fn test_admin_travel_filter_search() {
        let day = Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap();
        let flight = option("Delhi", "Mumbai", day, 5);

        let filter = TravelOptionFilter { q: Some("vista".to_string()), ..Default::default() };
        assert!(filter.matches(&flight));

        let filter = TravelOptionFilter { q: Some("uk-09".to_string()), is_active: Some(false), ..Default::default() };
        assert!(!filter.matches(&flight));
    }
}
