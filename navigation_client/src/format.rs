use chrono::{DateTime, Local, TimeZone, Utc};

const METERS_PER_MILE: f64 = 1609.34;
const FEET_PER_MILE: f64 = 5280.0;

pub fn format_distance(meters: f64) -> String {
    if !(meters > 0.0) {
        return "0 m".into();
    }
    if meters < 1000.0 {
        return format!("{} m", meters.round());
    }

    let kms = meters / 1000.0;
    if kms >= 10.0 {
        format!("{kms:.1} km")
    } else {
        format!("{kms:.2} km")
    }
}

pub fn format_distance_imperial(meters: f64) -> String {
    if !(meters > 0.0) {
        return "0 mi".into();
    }

    let miles = meters / METERS_PER_MILE;
    if miles < 0.2 {
        return format!("{} ft", (miles * FEET_PER_MILE).round());
    }
    if miles >= 10.0 {
        format!("{miles:.1} mi")
    } else {
        format!("{miles:.2} mi")
    }
}

/// Whole minutes, with hours once there is at least one.
pub fn format_duration(seconds: f64) -> String {
    if !(seconds > 0.0) {
        return "0m".into();
    }

    let total = seconds.floor() as u64;
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;

    if hours == 0 {
        format!("{minutes}m")
    } else {
        format!("{hours}h {minutes}m")
    }
}

/// Wall-clock arrival time in the local zone.
pub fn format_eta(eta: Option<DateTime<Utc>>) -> String {
    format_eta_in(eta, &Local)
}

pub fn format_eta_in<Tz: TimeZone>(eta: Option<DateTime<Utc>>, zone: &Tz) -> String
where
    Tz::Offset: std::fmt::Display,
{
    match eta {
        Some(eta) => eta.with_timezone(zone).format("%H:%M").to_string(),
        None => "--:--".into(),
    }
}
