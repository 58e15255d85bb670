use chrono::NaiveDate;
use serde::Deserialize;
use validator::Validate;

#[derive(Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 3, max = 50, message = "Username must be between 3 and 50 characters"))]
    pub username: String,
    #[validate(email(message = "Email address is not valid"))]
    pub email: String,
    #[validate(length(min = 8, max = 128, message = "Password must be between 8 and 128 characters"))]
    pub password: String,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateGuestRequest {
    #[validate(length(min = 1, max = 100, message = "First name is required (max 100 characters)"))]
    pub first_name: String,
    #[validate(length(min = 1, max = 100, message = "Last name is required (max 100 characters)"))]
    pub last_name: String,
    #[validate(email(message = "Email address is not valid"))]
    pub email: String,
    #[validate(length(min = 5, max = 30, message = "Phone must be between 5 and 30 characters"))]
    pub phone: String,
    #[validate(length(max = 250, message = "Address cannot exceed 250 characters"))]
    pub address: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
}

#[derive(Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateGuestRequest {
    #[validate(length(min = 1, max = 100, message = "First name cannot be empty (max 100 characters)"))]
    pub first_name: Option<String>,
    #[validate(length(min = 1, max = 100, message = "Last name cannot be empty (max 100 characters)"))]
    pub last_name: Option<String>,
    #[validate(email(message = "Email address is not valid"))]
    pub email: Option<String>,
    #[validate(length(min = 5, max = 30, message = "Phone must be between 5 and 30 characters"))]
    pub phone: Option<String>,
    #[validate(length(max = 250, message = "Address cannot exceed 250 characters"))]
    pub address: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
}

#[derive(Deserialize)]
pub struct GuestEmailQuery {
    pub email: String,
}

#[derive(Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateRoomRequest {
    #[validate(length(min = 1, max = 10, message = "Room number is required (max 10 characters)"))]
    pub room_number: String,
    #[validate(length(min = 1, max = 50, message = "Room type is required (max 50 characters)"))]
    pub room_type: String,
    #[validate(range(exclusive_min = 0.0, message = "Price per night must be greater than zero"))]
    pub price_per_night: f64,
    #[validate(range(min = 1, max = 20, message = "Capacity must be between 1 and 20"))]
    pub capacity: i64,
    pub is_available: Option<bool>,
    #[validate(length(max = 500, message = "Description cannot exceed 500 characters"))]
    pub description: Option<String>,
}

#[derive(Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRoomRequest {
    #[validate(length(min = 1, max = 10, message = "Room number cannot be empty (max 10 characters)"))]
    pub room_number: Option<String>,
    #[validate(length(min = 1, max = 50, message = "Room type cannot be empty (max 50 characters)"))]
    pub room_type: Option<String>,
    #[validate(range(exclusive_min = 0.0, message = "Price per night must be greater than zero"))]
    pub price_per_night: Option<f64>,
    #[validate(range(min = 1, max = 20, message = "Capacity must be between 1 and 20"))]
    pub capacity: Option<i64>,
    pub is_available: Option<bool>,
    #[validate(length(max = 500, message = "Description cannot exceed 500 characters"))]
    pub description: Option<String>,
}

#[derive(Deserialize, Default)]
pub struct CancelBookingRequest {
    pub reason: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckAvailabilityRequest {
    pub room_id: i64,
    pub check_in_date: NaiveDate,
    pub check_out_date: NaiveDate,
}

#[derive(Deserialize)]
pub struct UpcomingQuery {
    pub days: Option<i64>,
}
