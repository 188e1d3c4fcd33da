use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{BookingId, CustomerId};

/// A registered customer.
///
/// The customer keeps non-owning references (ids) to its bookings; the
/// booking objects themselves live in the ledger's global collection.
/// Uniqueness of bookings per flight is enforced by the ledger at
/// insertion time, not here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Customer {
    pub id: CustomerId,
    pub name: String,
    pub phone: String,
    pub age: u32,
    pub address: String,
    pub country: String,
    pub passport_number: String,
    pub passport_expiry: NaiveDate,
    pub disabled: bool,
    pub email: String,
    pub date_of_birth: NaiveDate,
    pub gender: String,
    bookings: Vec<BookingId>,
}

/// Registration details for a new customer, before an id is assigned.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerDetails {
    pub name: String,
    pub phone: String,
    pub age: u32,
    pub address: String,
    pub country: String,
    pub passport_number: String,
    pub passport_expiry: NaiveDate,
    pub disabled: bool,
    pub email: String,
    pub date_of_birth: NaiveDate,
    pub gender: String,
}

impl Customer {
    pub fn new(id: CustomerId, details: CustomerDetails) -> Self {
        Self {
            id,
            name: details.name,
            phone: details.phone,
            age: details.age,
            address: details.address,
            country: details.country,
            // Passport numbers compare case-insensitively system-wide.
            passport_number: details.passport_number.to_uppercase(),
            passport_expiry: details.passport_expiry,
            disabled: details.disabled,
            email: details.email,
            date_of_birth: details.date_of_birth,
            gender: details.gender,
            bookings: Vec::new(),
        }
    }

    /// Ids of this customer's live bookings, in insertion order.
    pub fn bookings(&self) -> &[BookingId] {
        &self.bookings
    }

    pub fn attach_booking(&mut self, booking_id: BookingId) {
        self.bookings.push(booking_id);
    }

    pub fn detach_booking(&mut self, booking_id: BookingId) {
        self.bookings.retain(|id| *id != booking_id);
    }
}
