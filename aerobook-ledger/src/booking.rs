use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use aerobook_catalog::flight::{ParseEnumError, SeatClass};
use aerobook_catalog::pricing::PetType;
use aerobook_core::money::Cents;
use aerobook_core::{BookingId, CustomerId, FlightId};

/// Booking lifecycle: ACTIVE confirms into COMPLETED, and either of the
/// two can be cancelled. CANCELLED is terminal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    Active,
    Cancelled,
    Completed,
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BookingStatus::Active => "ACTIVE",
            BookingStatus::Cancelled => "CANCELLED",
            BookingStatus::Completed => "COMPLETED",
        };
        f.write_str(s)
    }
}

impl FromStr for BookingStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "ACTIVE" => Ok(BookingStatus::Active),
            "CANCELLED" => Ok(BookingStatus::Cancelled),
            "COMPLETED" => Ok(BookingStatus::Completed),
            other => Err(ParseEnumError {
                field: "booking status",
                value: other.to_string(),
            }),
        }
    }
}

/// One booking of one seat on one flight.
///
/// The entity holds plain ids for its customer and flight; cross-entity
/// bookkeeping (seat reservation, back references, uniqueness rules) is
/// the ledger's job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: BookingId,
    pub customer_id: CustomerId,
    pub flight_id: FlightId,
    pub booking_date: NaiveDate,
    pub seat_class: SeatClass,
    pub seat_number: String,
    pub price_cents: Cents,
    pub discount_percent: f64,
    pub manual_discount: bool,
    pub pet_type: Option<PetType>,
    pub pet_charge_cents: Cents,
    status: BookingStatus,
}

impl Booking {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        id: BookingId,
        customer_id: CustomerId,
        flight_id: FlightId,
        booking_date: NaiveDate,
        seat_class: SeatClass,
        seat_number: String,
        price_cents: Cents,
        discount_percent: f64,
        manual_discount: bool,
        pet_type: Option<PetType>,
        pet_charge_cents: Cents,
    ) -> Self {
        Self {
            id,
            customer_id,
            flight_id,
            booking_date,
            seat_class,
            seat_number,
            price_cents,
            discount_percent,
            manual_discount,
            pet_type,
            pet_charge_cents,
            status: BookingStatus::Active,
        }
    }

    /// Reconstructs a booking in a given status, used when replaying
    /// persisted records.
    pub(crate) fn with_status(mut self, status: BookingStatus) -> Self {
        self.status = status;
        self
    }

    pub fn status(&self) -> BookingStatus {
        self.status
    }

    /// A live booking holds its seat: ACTIVE or COMPLETED.
    pub fn is_live(&self) -> bool {
        matches!(self.status, BookingStatus::Active | BookingStatus::Completed)
    }

    /// Whether the state machine permits moving to `to` from the current
    /// status. Re-asserting the current status is a permitted no-op.
    pub fn can_transition(&self, to: BookingStatus) -> bool {
        if self.status == to {
            return true;
        }
        matches!(
            (self.status, to),
            (BookingStatus::Active, BookingStatus::Completed)
                | (BookingStatus::Active, BookingStatus::Cancelled)
                | (BookingStatus::Completed, BookingStatus::Cancelled)
        )
    }

    pub fn transition(&mut self, to: BookingStatus) -> Result<(), BookingError> {
        if !self.can_transition(to) {
            return Err(BookingError::InvalidTransition {
                from: self.status,
                to,
            });
        }
        self.status = to;
        Ok(())
    }

    /// Confirms the booking.
    pub fn complete(&mut self) -> Result<(), BookingError> {
        self.transition(BookingStatus::Completed)
    }

    /// Cancels the booking. Terminal; the caller releases the seat and
    /// detaches back references.
    pub fn cancel(&mut self) -> Result<(), BookingError> {
        self.transition(BookingStatus::Cancelled)
    }

    /// What rebooking needs to carry forward from a cancelled booking.
    pub fn snapshot(&self) -> CancelledBooking {
        CancelledBooking {
            flight_id: self.flight_id,
            seat_class: self.seat_class,
            seat_number: self.seat_number.clone(),
            price_cents: self.price_cents,
            discount_percent: self.discount_percent,
            manual_discount: self.manual_discount,
            pet_type: self.pet_type,
            pet_charge_cents: self.pet_charge_cents,
        }
    }
}

/// Snapshot of a cancelled booking, the input to rebooking. Rebooking
/// creates a brand new booking from this data; the original id is gone
/// for good.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancelledBooking {
    pub flight_id: FlightId,
    pub seat_class: SeatClass,
    pub seat_number: String,
    pub price_cents: Cents,
    pub discount_percent: f64,
    pub manual_discount: bool,
    pub pet_type: Option<PetType>,
    pub pet_charge_cents: Cents,
}

#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    #[error("Invalid status transition from {from} to {to}")]
    InvalidTransition {
        from: BookingStatus,
        to: BookingStatus,
    },
}
