use chrono::{DateTime, Duration, Timelike, Utc};
use rand::Rng;
use yatra_shared::Paise;

use crate::pricing::PriceBand;
use crate::travel_option::{NewTravelOption, TravelType};

/// Popular city pairs served by the sample catalog, both directions listed.
pub const ROUTES: [(&str, &str); 30] = [
    ("Delhi", "Mumbai"),
    ("Mumbai", "Delhi"),
    ("Bangalore", "Chennai"),
    ("Chennai", "Bangalore"),
    ("Delhi", "Bangalore"),
    ("Bangalore", "Delhi"),
    ("Mumbai", "Pune"),
    ("Pune", "Mumbai"),
    ("Delhi", "Jaipur"),
    ("Jaipur", "Delhi"),
    ("Chennai", "Hyderabad"),
    ("Hyderabad", "Chennai"),
    ("Mumbai", "Ahmedabad"),
    ("Ahmedabad", "Mumbai"),
    ("Delhi", "Chandigarh"),
    ("Chandigarh", "Delhi"),
    ("Bangalore", "Hyderabad"),
    ("Hyderabad", "Bangalore"),
    ("Mumbai", "Goa"),
    ("Goa", "Mumbai"),
    ("Delhi", "Lucknow"),
    ("Lucknow", "Delhi"),
    ("Chennai", "Kochi"),
    ("Kochi", "Chennai"),
    ("Mumbai", "Indore"),
    ("Indore", "Mumbai"),
    ("Delhi", "Amritsar"),
    ("Amritsar", "Delhi"),
    ("Bangalore", "Mysore"),
    ("Mysore", "Bangalore"),
];

pub const DAYS_AHEAD: i64 = 30;

const DEPARTURE_MINUTES: [i64; 4] = [0, 15, 30, 45];

fn operators(travel_type: TravelType) -> &'static [&'static str] {
    match travel_type {
        TravelType::Flight => &["IndiGo", "SpiceJet", "Air India", "Vistara", "GoFirst"],
        TravelType::Train => &[
            "Indian Railways",
            "Rajdhani Express",
            "Shatabdi Express",
            "Duronto Express",
        ],
        TravelType::Bus => &["Redbus", "KSRTC", "MSRTC", "Volvo", "Private Operators"],
    }
}

fn seat_totals(travel_type: TravelType) -> [i32; 4] {
    match travel_type {
        TravelType::Flight => [150, 180, 200, 250],
        TravelType::Train => [200, 300, 500, 800],
        TravelType::Bus => [40, 45, 50, 55],
    }
}

fn pick<'a, T, R: Rng + ?Sized>(rng: &mut R, items: &'a [T]) -> &'a T {
    &items[rng.gen_range(0..items.len())]
}

/// Builds synthetic departures for the demo catalog.
pub struct SampleGenerator<R> {
    rng: R,
}

impl<R: Rng> SampleGenerator<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }

    /// Every route, for each of the next [`DAYS_AHEAD`] days, gets one to three departures.
    pub fn generate(&mut self, now: DateTime<Utc>) -> Vec<NewTravelOption> {
        let mut options = Vec::new();
        for days_ahead in 1..=DAYS_AHEAD {
            let travel_date = now + Duration::days(days_ahead);
            for (source, destination) in ROUTES {
                let count = self.rng.gen_range(1..=3);
                for _ in 0..count {
                    options.push(self.departure(travel_date, source, destination));
                }
            }
        }
        options
    }

    fn departure(&mut self, travel_date: DateTime<Utc>, source: &str, destination: &str) -> NewTravelOption {
        let rng = &mut self.rng;
        let travel_type = *pick(rng, &TravelType::ALL);

        let start_of_day = travel_date - Duration::seconds(i64::from(travel_date.num_seconds_from_midnight()))
            - Duration::nanoseconds(i64::from(travel_date.nanosecond()));
        let hour = rng.gen_range(6..=23);
        let minute = *pick(rng, &DEPARTURE_MINUTES);
        let departure = start_of_day + Duration::hours(hour) + Duration::minutes(minute);

        let (journey_hours, journey_minutes) = match travel_type {
            TravelType::Flight => (rng.gen_range(1..=4), *pick(rng, &[0, 15, 30, 45])),
            TravelType::Train => (rng.gen_range(4..=24), *pick(rng, &[0, 15, 30])),
            TravelType::Bus => (rng.gen_range(4..=16), *pick(rng, &[0, 30])),
        };
        let arrival = departure + Duration::hours(journey_hours) + Duration::minutes(journey_minutes);

        let band = PriceBand::for_travel_type(travel_type);
        let price = Paise::from_rupees(rng.gen_range(band.min_rupees..=band.max_rupees));

        let total_seats = *pick(rng, &seat_totals(travel_type));
        let available_seats = rng.gen_range(total_seats / 10..=total_seats * 9 / 10);

        let operator = *pick(rng, operators(travel_type));
        let service_number = match travel_type {
            TravelType::Flight => {
                let prefix: String = operator.chars().take(2).collect::<String>().to_uppercase();
                format!("{}-{}", prefix, rng.gen_range(1000..=9999u32))
            }
            TravelType::Train => rng.gen_range(10000..=99999u32).to_string(),
            TravelType::Bus => format!("BUS-{}", rng.gen_range(1000..=9999u32)),
        };

        NewTravelOption {
            travel_type,
            source: source.to_string(),
            destination: destination.to_string(),
            departure_datetime: departure,
            arrival_datetime: Some(arrival),
            price,
            total_seats,
            available_seats,
            operator_name: operator.to_string(),
            service_number,
            description: format!(
                "{} service from {} to {} operated by {}",
                travel_type.label(),
                source,
                destination,
                operator
            ),
            is_active: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn generated() -> (DateTime<Utc>, Vec<NewTravelOption>) {
        let now = Utc.with_ymd_and_hms(2025, 2, 20, 17, 42, 13).unwrap();
        let mut generator = SampleGenerator::new(StdRng::seed_from_u64(7));
        (now, generator.generate(now))
    }

    #[test]
    fn test_volume_per_route_and_day() {
        let (_, options) = generated();
        let routes_days = ROUTES.len() * DAYS_AHEAD as usize;
        assert!(options.len() >= routes_days);
        assert!(options.len() <= routes_days * 3);
    }

    #[test]
    fn test_generated_options_are_valid() {
        let (now, options) = generated();
        for option in &options {
            option.validate().unwrap();
            assert!(option.departure_datetime > now);
            assert!(option.departure_datetime <= now + Duration::days(DAYS_AHEAD + 1));

            let hour = option.departure_datetime.hour();
            assert!((6..=23).contains(&hour));
            assert_eq!(option.departure_datetime.minute() % 15, 0);
            assert_eq!(option.departure_datetime.second(), 0);

            assert!(PriceBand::for_travel_type(option.travel_type).contains(option.price));
            assert!(seat_totals(option.travel_type).contains(&option.total_seats));
            assert!(option.available_seats >= option.total_seats / 10);
            assert!(option.available_seats <= option.total_seats * 9 / 10);
            assert!(operators(option.travel_type).contains(&option.operator_name.as_str()));
        }
    }

    #[test]
    fn test_service_number_shapes() {
        let (_, options) = generated();
        for option in &options {
            let number = &option.service_number;
            match option.travel_type {
                TravelType::Flight => {
                    let (prefix, digits) = number.split_once('-').unwrap();
                    assert_eq!(prefix.len(), 2);
                    assert_eq!(prefix, prefix.to_uppercase());
                    assert_eq!(digits.len(), 4);
                }
                TravelType::Train => {
                    assert_eq!(number.len(), 5);
                    assert!(number.chars().all(|c| c.is_ascii_digit()));
                }
                TravelType::Bus => assert!(number.starts_with("BUS-")),
            }
        }
    }

    #[test]
    fn test_journey_length_by_mode() {
        let (_, options) = generated();
        for option in &options {
            let arrival = option.arrival_datetime.unwrap();
            let minutes = (arrival - option.departure_datetime).num_minutes();
            let (min, max) = match option.travel_type {
                TravelType::Flight => (60, 4 * 60 + 45),
                TravelType::Train => (4 * 60, 24 * 60 + 30),
                TravelType::Bus => (4 * 60, 16 * 60 + 30),
            };
            assert!(minutes >= min && minutes <= max, "{} minutes for {}", minutes, option.travel_type);
        }
    }
}
