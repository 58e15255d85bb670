use std::fmt;
use std::str::FromStr;
use serde::{Deserialize, Serialize};
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::FromRow;
use thiserror::Error;
use crate::domain::models::room::Room;
use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    CheckedIn,
    CheckedOut,
    Cancelled,
}

#[derive(Debug, Error)]
#[error("unknown booking status '{0}'")]
pub struct UnknownStatus(pub String);

impl BookingStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            BookingStatus::Pending => "Pending",
            BookingStatus::Confirmed => "Confirmed",
            BookingStatus::CheckedIn => "CheckedIn",
            BookingStatus::CheckedOut => "CheckedOut",
            BookingStatus::Cancelled => "Cancelled",
        }
    }

    /// Transition table of the booking lifecycle.
    pub fn allowed_transitions(self) -> &'static [BookingStatus] {
        use BookingStatus::*;
        match self {
            Pending => &[Confirmed, CheckedIn, Cancelled],
            Confirmed => &[CheckedIn, Cancelled],
            CheckedIn => &[CheckedOut],
            CheckedOut | Cancelled => &[],
        }
    }

    pub fn can_transition_to(self, next: BookingStatus) -> bool {
        self.allowed_transitions().contains(&next)
    }

    pub fn is_terminal(self) -> bool {
        self.allowed_transitions().is_empty()
    }

    /// Verb used in error messages for the action that moves a booking into `self`.
    /// No transition targets `Pending`, so its verb only ever describes a rejected move.
    pub fn action(self) -> &'static str {
        match self {
            BookingStatus::Pending => "return to pending",
            BookingStatus::Confirmed => "confirm",
            BookingStatus::CheckedIn => "check in",
            BookingStatus::CheckedOut => "check out",
            BookingStatus::Cancelled => "cancel",
        }
    }

    pub fn transition_to(self, next: BookingStatus) -> Result<BookingStatus, AppError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(AppError::InvalidStatus { action: next.action(), status: self })
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookingStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pending" => Ok(BookingStatus::Pending),
            "confirmed" => Ok(BookingStatus::Confirmed),
            "checkedin" => Ok(BookingStatus::CheckedIn),
            "checkedout" => Ok(BookingStatus::CheckedOut),
            "cancelled" => Ok(BookingStatus::Cancelled),
            _ => Err(UnknownStatus(s.to_string())),
        }
    }
}

impl TryFrom<String> for BookingStatus {
    type Error = UnknownStatus;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: i64,
    pub room_id: i64,
    pub room_number: String,
    pub room_type: String,
    pub price_per_night: f64,
    pub guest_id: i64,
    pub check_in_date: NaiveDate,
    pub check_out_date: NaiveDate,
    pub number_of_nights: i64,
    pub total_amount: f64,
    #[sqlx(try_from = "String")]
    pub status: BookingStatus,
    pub cancellation_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub cancelled_at: Option<DateTime<Utc>>,
}

pub struct NewBookingParams<'a> {
    pub guest_id: i64,
    pub room: &'a Room,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub quote: StayQuote,
}

/// Nights and total for a stay at a fixed nightly price.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StayQuote {
    pub nights: i64,
    pub total_amount: f64,
}

impl Booking {
    /// Builds a pending booking. The id is assigned by the database on insert.
    pub fn new(params: NewBookingParams<'_>) -> Self {
        let now = Utc::now();
        Self {
            id: 0,
            room_id: params.room.id,
            room_number: params.room.room_number.clone(),
            room_type: params.room.room_type.clone(),
            price_per_night: params.room.price_per_night,
            guest_id: params.guest_id,
            check_in_date: params.check_in,
            check_out_date: params.check_out,
            number_of_nights: params.quote.nights,
            total_amount: params.quote.total_amount,
            status: BookingStatus::Pending,
            cancellation_reason: None,
            created_at: now,
            updated_at: now,
            cancelled_at: None,
        }
    }

    /// Moves the booking along the lifecycle, stamping the relevant timestamps.
    pub fn transition(&mut self, next: BookingStatus) -> Result<(), AppError> {
        self.status = self.status.transition_to(next)?;
        let now = Utc::now();
        self.updated_at = now;
        if next == BookingStatus::Cancelled {
            self.cancelled_at = Some(now);
        }
        Ok(())
    }

    pub fn snapshot_room(&mut self, room: &Room) {
        self.room_id = room.id;
        self.room_number = room.room_number.clone();
        self.room_type = room.room_type.clone();
        self.price_per_night = room.price_per_night;
    }

    pub fn apply_quote(&mut self, quote: StayQuote) {
        self.number_of_nights = quote.nights;
        self.total_amount = quote.total_amount;
    }
}

/// A booking reloaded together with its guest.
#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
#[serde(rename_all = "camelCase")]
pub struct BookingDetails {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub booking: Booking,
    pub guest_first_name: String,
    pub guest_last_name: String,
    pub guest_email: String,
}

impl BookingDetails {
    pub fn guest_name(&self) -> String {
        format!("{} {}", self.guest_first_name, self.guest_last_name)
    }
}

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingFilter {
    pub guest_id: Option<i64>,
    pub room_id: Option<i64>,
    pub status: Option<BookingStatus>,
    pub room_type: Option<String>,
    pub check_in_from: Option<NaiveDate>,
    pub check_in_to: Option<NaiveDate>,
    pub check_out_from: Option<NaiveDate>,
    pub check_out_to: Option<NaiveDate>,
    pub min_amount: Option<f64>,
    pub max_amount: Option<f64>,
    pub created_from: Option<DateTime<Utc>>,
    pub created_to: Option<DateTime<Utc>>,
    pub search_term: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
    pub page_number: Option<i64>,
    pub page_size: Option<i64>,
}
