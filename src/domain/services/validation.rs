use chrono::NaiveDate;
use crate::domain::models::booking::StayQuote;

pub const MAX_NIGHTS: i64 = 365;

/// Checks a stay window against `today`. Every violated rule is reported.
pub fn validate_dates(check_in: NaiveDate, check_out: NaiveDate, today: NaiveDate) -> Vec<String> {
    let mut errors = validate_date_order(check_in, check_out);
    if check_in < today {
        errors.insert(0, "Check-in date cannot be in the past".to_string());
    }
    errors
}

/// The date rules that do not depend on the current day.
pub fn validate_date_order(check_in: NaiveDate, check_out: NaiveDate) -> Vec<String> {
    let mut errors = Vec::new();
    if check_out <= check_in {
        errors.push("Check-out date must be after check-in date".to_string());
    } else {
        let nights = (check_out - check_in).num_days();
        if nights > MAX_NIGHTS {
            errors.push(format!("Booking cannot exceed {} nights", MAX_NIGHTS));
        }
    }
    errors
}

/// Structural checks on a create request, followed by the date rules.
pub fn validate_create(
    room_id: i64,
    guest_id: i64,
    check_in: NaiveDate,
    check_out: NaiveDate,
    today: NaiveDate,
) -> Vec<String> {
    let mut errors = Vec::new();
    if room_id <= 0 {
        errors.push("Room id must be a positive number".to_string());
    }
    if guest_id <= 0 {
        errors.push("Guest id must be a positive number".to_string());
    }
    errors.extend(validate_dates(check_in, check_out, today));
    errors
}

pub fn quote_stay(check_in: NaiveDate, check_out: NaiveDate, price_per_night: f64) -> StayQuote {
    let nights = (check_out - check_in).num_days();
    StayQuote {
        nights,
        total_amount: nights as f64 * price_per_night,
    }
}
