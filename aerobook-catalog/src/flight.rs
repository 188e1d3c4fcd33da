use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use aerobook_core::{BookingId, FlightId};

use crate::inventory::SeatInventory;

/// Cabin classes. Each class has independent capacity and pricing.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SeatClass {
    Economy,
    Business,
    First,
}

impl SeatClass {
    pub const ALL: [SeatClass; 3] = [SeatClass::Economy, SeatClass::Business, SeatClass::First];

    pub fn as_str(&self) -> &'static str {
        match self {
            SeatClass::Economy => "ECONOMY",
            SeatClass::Business => "BUSINESS",
            SeatClass::First => "FIRST",
        }
    }
}

impl fmt::Display for SeatClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SeatClass {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "ECONOMY" => Ok(SeatClass::Economy),
            "BUSINESS" => Ok(SeatClass::Business),
            "FIRST" => Ok(SeatClass::First),
            other => Err(ParseEnumError {
                field: "seat class",
                value: other.to_string(),
            }),
        }
    }
}

/// Operational status of a flight.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FlightStatus {
    Scheduled,
    Delayed,
    Cancelled,
    Completed,
}

impl fmt::Display for FlightStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FlightStatus::Scheduled => "SCHEDULED",
            FlightStatus::Delayed => "DELAYED",
            FlightStatus::Cancelled => "CANCELLED",
            FlightStatus::Completed => "COMPLETED",
        };
        f.write_str(s)
    }
}

impl FromStr for FlightStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "SCHEDULED" => Ok(FlightStatus::Scheduled),
            "DELAYED" => Ok(FlightStatus::Delayed),
            "CANCELLED" => Ok(FlightStatus::Cancelled),
            "COMPLETED" => Ok(FlightStatus::Completed),
            other => Err(ParseEnumError {
                field: "flight status",
                value: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("Invalid {field}: {value}")]
pub struct ParseEnumError {
    pub field: &'static str,
    pub value: String,
}

/// Descriptive attributes for a new flight, before an id is assigned.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlightDetails {
    pub flight_number: String,
    pub airline: String,
    pub origin: String,
    pub destination: String,
    pub departure: DateTime<Utc>,
    pub arrival: Option<DateTime<Utc>>,
    pub international: bool,
}

/// A flight and its seat inventory.
///
/// Booking back references are non-owning ids resolved through the
/// ledger's lookup tables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Flight {
    pub id: FlightId,
    pub flight_number: String,
    pub airline: String,
    pub origin: String,
    pub destination: String,
    pub departure: DateTime<Utc>,
    pub arrival: Option<DateTime<Utc>>,
    pub international: bool,
    pub status: FlightStatus,
    inventory: SeatInventory,
    bookings: Vec<BookingId>,
}

impl Flight {
    pub fn new(id: FlightId, details: FlightDetails) -> Self {
        Self {
            id,
            flight_number: details.flight_number,
            airline: details.airline,
            origin: details.origin,
            destination: details.destination,
            departure: details.departure,
            arrival: details.arrival,
            international: details.international,
            status: FlightStatus::Scheduled,
            inventory: SeatInventory::new(),
            bookings: Vec::new(),
        }
    }

    pub fn inventory(&self) -> &SeatInventory {
        &self.inventory
    }

    pub fn inventory_mut(&mut self) -> &mut SeatInventory {
        &mut self.inventory
    }

    /// A flight counts as departed unless its departure instant is
    /// strictly in the future.
    pub fn has_departed(&self, now: DateTime<Utc>) -> bool {
        self.departure <= now
    }

    /// Ids of live bookings on this flight, in insertion order.
    pub fn bookings(&self) -> &[BookingId] {
        &self.bookings
    }

    pub fn attach_booking(&mut self, booking_id: BookingId) {
        self.bookings.push(booking_id);
    }

    pub fn detach_booking(&mut self, booking_id: BookingId) {
        self.bookings.retain(|id| *id != booking_id);
    }

    /// Total seats still available across every class.
    pub fn available_seats(&self) -> u32 {
        SeatClass::ALL
            .iter()
            .map(|class| self.inventory.available(*class))
            .sum()
    }
}
