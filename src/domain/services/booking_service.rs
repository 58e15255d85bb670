use std::future::Future;
use std::sync::Arc;
use chrono::{Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use crate::domain::models::booking::{
    Booking, BookingDetails, BookingFilter, BookingStatus, NewBookingParams,
};
use crate::domain::models::pagination::Page;
use crate::domain::models::room::Room;
use crate::domain::ports::{BookingRepository, GuestRepository, RoomCatalog, UnitOfWork};
use crate::domain::services::validation::{quote_stay, validate_create, validate_date_order, validate_dates};
use crate::error::AppError;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingCommand {
    pub room_id: i64,
    pub guest_id: i64,
    pub check_in_date: NaiveDate,
    pub check_out_date: NaiveDate,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBookingCommand {
    pub room_id: Option<i64>,
    pub check_in_date: Option<NaiveDate>,
    pub check_out_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityResult {
    pub available: bool,
    pub room_id: i64,
    pub room_number: String,
    pub check_in_date: NaiveDate,
    pub check_out_date: NaiveDate,
    pub message: String,
}

pub struct BookingService {
    uow: Arc<dyn UnitOfWork>,
    bookings: Arc<dyn BookingRepository>,
    guests: Arc<dyn GuestRepository>,
    rooms: Arc<dyn RoomCatalog>,
}

impl BookingService {
    pub fn new(
        uow: Arc<dyn UnitOfWork>,
        bookings: Arc<dyn BookingRepository>,
        guests: Arc<dyn GuestRepository>,
        rooms: Arc<dyn RoomCatalog>,
    ) -> Self {
        Self { uow, bookings, guests, rooms }
    }

    fn today() -> NaiveDate {
        Utc::now().date_naive()
    }

    /// Runs `work` inside one transaction: commit on success, rollback on any error.
    async fn transactional<T, F, Fut>(&self, operation: &'static str, work: F) -> Result<T, AppError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, AppError>>,
    {
        self.uow.begin_transaction().await?;

        let outcome = match work().await {
            Ok(value) => self.uow.save_changes().await.map(|rows| (value, rows)),
            Err(e) => Err(e),
        };

        match outcome {
            Ok((value, rows)) => {
                self.uow.commit_transaction().await.inspect_err(|e| {
                    error!(operation, "Commit failed: {:?}", e);
                })?;
                info!(operation, rows, "Transaction committed");
                Ok(value)
            }
            Err(e) => {
                if let Err(rollback_err) = self.uow.rollback_transaction().await {
                    error!(operation, "Rollback failed: {:?}", rollback_err);
                }
                if e.is_infrastructure() {
                    error!(operation, "Operation failed: {:?}", e);
                } else {
                    warn!(operation, "Operation rejected: {}", e);
                }
                Err(e)
            }
        }
    }

    async fn load(&self, id: i64) -> Result<Booking, AppError> {
        self.bookings.find_by_id(id).await?
            .ok_or_else(|| AppError::NotFound(format!("Booking with id {} not found", id)))
    }

    async fn load_details(&self, id: i64) -> Result<BookingDetails, AppError> {
        self.bookings.find_details(id).await?
            .ok_or_else(|| AppError::NotFound(format!("Booking with id {} not found", id)))
    }

    async fn fetch_room(&self, room_id: i64) -> Result<Room, AppError> {
        self.rooms.get_room(room_id).await?
            .ok_or_else(|| AppError::NotFound(format!("Room with id {} not found", room_id)))
    }

    pub async fn create(&self, command: CreateBookingCommand) -> Result<BookingDetails, AppError> {
        self.transactional("create_booking", || self.create_in_tx(command)).await
    }

    async fn create_in_tx(&self, command: CreateBookingCommand) -> Result<BookingDetails, AppError> {
        let errors = validate_create(
            command.room_id,
            command.guest_id,
            command.check_in_date,
            command.check_out_date,
            Self::today(),
        );
        if !errors.is_empty() {
            return Err(AppError::ValidationErrors(errors));
        }

        let guest = self.guests.find_by_id(command.guest_id).await?
            .ok_or_else(|| AppError::NotFound(format!("Guest with id {} not found", command.guest_id)))?;

        let room = self.fetch_room(command.room_id).await?;

        let available = self.bookings
            .is_room_available(room.id, command.check_in_date, command.check_out_date, None)
            .await?;
        if !available {
            return Err(AppError::Conflict(format!(
                "Room {} is not available from {} to {}",
                room.room_number, command.check_in_date, command.check_out_date
            )));
        }

        let quote = quote_stay(command.check_in_date, command.check_out_date, room.price_per_night);
        let booking = Booking::new(NewBookingParams {
            guest_id: guest.id,
            room: &room,
            check_in: command.check_in_date,
            check_out: command.check_out_date,
            quote,
        });

        let created = self.bookings.create(&booking).await?;
        info!(
            booking_id = created.id,
            guest_id = guest.id,
            room_id = room.id,
            "Booking created for {} night(s), total {:.2}",
            quote.nights,
            quote.total_amount
        );

        self.load_details(created.id).await
    }

    pub async fn update(&self, id: i64, command: UpdateBookingCommand) -> Result<BookingDetails, AppError> {
        self.transactional("update_booking", || self.update_in_tx(id, command)).await
    }

    async fn update_in_tx(&self, id: i64, command: UpdateBookingCommand) -> Result<BookingDetails, AppError> {
        let mut booking = self.load(id).await?;

        if booking.status.is_terminal() {
            return Err(AppError::InvalidStatus { action: "update", status: booking.status });
        }

        let room_id = command.room_id.unwrap_or(booking.room_id);
        let check_in = command.check_in_date.unwrap_or(booking.check_in_date);
        let check_out = command.check_out_date.unwrap_or(booking.check_out_date);

        let room_changed = room_id != booking.room_id;
        let dates_changed = check_in != booking.check_in_date || check_out != booking.check_out_date;

        if room_id <= 0 {
            return Err(AppError::ValidationErrors(vec!["Room id must be a positive number".to_string()]));
        }

        if dates_changed {
            // An unchanged check-in may legitimately lie in the past (e.g. extending a stay).
            let errors = if check_in != booking.check_in_date {
                validate_dates(check_in, check_out, Self::today())
            } else {
                validate_date_order(check_in, check_out)
            };
            if !errors.is_empty() {
                return Err(AppError::ValidationErrors(errors));
            }
        }

        if !room_changed && !dates_changed {
            return self.load_details(id).await;
        }

        if room_changed {
            let room = self.fetch_room(room_id).await?;
            booking.snapshot_room(&room);
        }

        let available = self.bookings
            .is_room_available(room_id, check_in, check_out, Some(booking.id))
            .await?;
        if !available {
            return Err(AppError::Conflict(format!(
                "Room {} is not available from {} to {}",
                booking.room_number, check_in, check_out
            )));
        }

        booking.check_in_date = check_in;
        booking.check_out_date = check_out;
        booking.apply_quote(quote_stay(check_in, check_out, booking.price_per_night));
        booking.updated_at = Utc::now();

        let updated = self.bookings.update(&booking).await?;
        info!(booking_id = updated.id, room_id = updated.room_id, "Booking updated");

        self.load_details(id).await
    }

    pub async fn cancel(&self, id: i64, reason: Option<String>) -> Result<BookingDetails, AppError> {
        self.transactional("cancel_booking", || async move {
            let mut booking = self.load(id).await?;

            match booking.status {
                BookingStatus::Cancelled => {
                    return Err(AppError::Conflict("Booking is already cancelled".into()));
                }
                BookingStatus::CheckedOut => {
                    return Err(AppError::Conflict("Cannot cancel a booking that has already been checked out".into()));
                }
                _ => {}
            }

            booking.transition(BookingStatus::Cancelled)?;
            booking.cancellation_reason = reason.filter(|r| !r.trim().is_empty());
            self.bookings.update(&booking).await?;
            info!(booking_id = id, "Booking cancelled");

            self.load_details(id).await
        })
        .await
    }

    pub async fn confirm(&self, id: i64) -> Result<BookingDetails, AppError> {
        self.transactional("confirm_booking", || self.move_to(id, BookingStatus::Confirmed)).await
    }

    pub async fn check_in(&self, id: i64) -> Result<BookingDetails, AppError> {
        self.transactional("check_in_booking", || async move {
            let booking = self.load(id).await?;
            booking.status.transition_to(BookingStatus::CheckedIn)?;

            if Self::today() < booking.check_in_date {
                return Err(AppError::Validation(format!(
                    "Check-in not allowed before the check-in date ({})",
                    booking.check_in_date
                )));
            }

            self.apply_transition(booking, BookingStatus::CheckedIn).await
        })
        .await
    }

    pub async fn check_out(&self, id: i64) -> Result<BookingDetails, AppError> {
        self.transactional("check_out_booking", || self.move_to(id, BookingStatus::CheckedOut)).await
    }

    async fn move_to(&self, id: i64, next: BookingStatus) -> Result<BookingDetails, AppError> {
        let booking = self.load(id).await?;
        self.apply_transition(booking, next).await
    }

    async fn apply_transition(&self, mut booking: Booking, next: BookingStatus) -> Result<BookingDetails, AppError> {
        let previous = booking.status;
        booking.transition(next)?;
        self.bookings.update(&booking).await?;
        info!(booking_id = booking.id, "Booking status {} -> {}", previous, next);
        self.load_details(booking.id).await
    }

    pub async fn check_availability(
        &self,
        room_id: i64,
        check_in: NaiveDate,
        check_out: NaiveDate,
    ) -> Result<AvailabilityResult, AppError> {
        let errors = validate_dates(check_in, check_out, Self::today());
        if !errors.is_empty() {
            return Err(AppError::ValidationErrors(errors));
        }

        let room = self.fetch_room(room_id).await?;
        let available = self.bookings.is_room_available(room.id, check_in, check_out, None).await?;

        let message = if available {
            format!("Room {} is available for the selected dates", room.room_number)
        } else {
            format!("Room {} is already booked for the selected dates", room.room_number)
        };

        Ok(AvailabilityResult {
            available,
            room_id: room.id,
            room_number: room.room_number,
            check_in_date: check_in,
            check_out_date: check_out,
            message,
        })
    }

    pub async fn get(&self, id: i64) -> Result<BookingDetails, AppError> {
        self.load_details(id).await
    }

    pub async fn list(&self, filter: &BookingFilter) -> Result<Page<BookingDetails>, AppError> {
        self.bookings.list_filtered(filter).await
    }

    pub async fn list_by_guest(&self, guest_id: i64) -> Result<Vec<BookingDetails>, AppError> {
        if self.guests.find_by_id(guest_id).await?.is_none() {
            return Err(AppError::NotFound(format!("Guest with id {} not found", guest_id)));
        }
        self.bookings.list_by_guest(guest_id).await
    }

    pub async fn list_by_room(&self, room_id: i64) -> Result<Vec<BookingDetails>, AppError> {
        self.bookings.list_by_room(room_id).await
    }

    pub async fn upcoming(&self, days: i64) -> Result<Vec<BookingDetails>, AppError> {
        if !(1..=365).contains(&days) {
            return Err(AppError::Validation("Days must be between 1 and 365".into()));
        }
        let today = Self::today();
        self.bookings.list_upcoming(today, today + Duration::days(days)).await
    }

    pub async fn active(&self) -> Result<Vec<BookingDetails>, AppError> {
        self.bookings.list_active(Self::today()).await
    }
}
