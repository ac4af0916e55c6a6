//! World clock for a fixed set of cities

use crate::models::CityTime;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;

/// Supported cities, in display order
pub const CITIES: &[(&str, Tz)] = &[
    ("dhaka", chrono_tz::Asia::Dhaka),
    ("kolkata", chrono_tz::Asia::Kolkata),
    ("london", chrono_tz::Europe::London),
    ("new_york", chrono_tz::America::New_York),
    ("tokyo", chrono_tz::Asia::Tokyo),
];

/// Normalize a user-supplied city name: `New York`, `new-york` and
/// `newyork` all become `new_york`
fn normalize(city: &str) -> String {
    let lowered: String = city
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| if c == ' ' || c == '-' { '_' } else { c })
        .collect();

    match lowered.as_str() {
        "newyork" | "nyc" => "new_york".to_string(),
        "calcutta" => "kolkata".to_string(),
        "dacca" => "dhaka".to_string(),
        _ => lowered,
    }
}

/// Time zone of a supported city
pub fn lookup(city: &str) -> Option<(&'static str, Tz)> {
    let key = normalize(city);
    CITIES.iter().find(|(name, _)| *name == key).copied()
}

/// Local time of `city` at `now`
pub fn city_time_at(city: &str, now: DateTime<Utc>) -> Option<CityTime> {
    let (name, tz) = lookup(city)?;
    Some(render(name, tz, now))
}

/// Local time of `city` right now
pub fn city_time(city: &str) -> Option<CityTime> {
    city_time_at(city, Utc::now())
}

/// Local time of every supported city right now
pub fn all_cities() -> Vec<CityTime> {
    let now = Utc::now();
    CITIES.iter().map(|(name, tz)| render(name, *tz, now)).collect()
}

fn render(name: &str, tz: Tz, now: DateTime<Utc>) -> CityTime {
    let local = now.with_timezone(&tz);
    CityTime {
        city: name.to_string(),
        timezone: tz.name().to_string(),
        time: local.to_rfc3339(),
        display: local.format("%I:%M %p").to_string(),
    }
}
