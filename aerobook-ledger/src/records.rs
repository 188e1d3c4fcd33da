use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use aerobook_catalog::flight::SeatClass;
use aerobook_catalog::inventory::{normalize_seat, InventoryError};
use aerobook_catalog::pricing::PetType;
use aerobook_core::money::Cents;
use aerobook_core::{BookingId, CustomerId, FlightId};

use crate::booking::{Booking, BookingStatus};
use crate::ledger::{Ledger, LedgerError};

/// Flat, storage-ready image of a booking. Field order matches the
/// persisted line layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingRecord {
    pub booking_id: BookingId,
    pub customer_id: CustomerId,
    pub flight_id: FlightId,
    pub booking_date: NaiveDate,
    pub seat_class: SeatClass,
    pub price_cents: Cents,
    pub status: BookingStatus,
    pub seat_number: String,
    pub discount_percent: f64,
    pub manual_discount: bool,
    pub pet_type: Option<PetType>,
    pub pet_charge_cents: Cents,
}

impl From<&Booking> for BookingRecord {
    fn from(booking: &Booking) -> Self {
        Self {
            booking_id: booking.id,
            customer_id: booking.customer_id,
            flight_id: booking.flight_id,
            booking_date: booking.booking_date,
            seat_class: booking.seat_class,
            price_cents: booking.price_cents,
            status: booking.status(),
            seat_number: booking.seat_number.clone(),
            discount_percent: booking.discount_percent,
            manual_discount: booking.manual_discount,
            pet_type: booking.pet_type,
            pet_charge_cents: booking.pet_charge_cents,
        }
    }
}

impl Ledger {
    /// Every booking as a record, ascending by id. Cancelled bookings
    /// are included so history survives a save/load cycle.
    pub fn export_bookings(&self) -> Vec<BookingRecord> {
        self.bookings.values().map(BookingRecord::from).collect()
    }

    /// Replays one persisted record into the ledger. The customer and
    /// flight it references must already be loaded. Live records take
    /// their seat back and re-attach the back references; cancelled
    /// records only land in the global collection. The id counter is
    /// kept ahead of every replayed id.
    pub fn import_booking(&mut self, record: BookingRecord) -> Result<(), LedgerError> {
        if self.bookings.contains_key(&record.booking_id) {
            return Err(LedgerError::DuplicateBookingId(record.booking_id));
        }
        if !self.customers.contains_key(&record.customer_id) {
            return Err(LedgerError::CustomerNotFound(record.customer_id));
        }
        let seat_number = normalize_seat(&record.seat_number);
        let live = matches!(
            record.status,
            BookingStatus::Active | BookingStatus::Completed
        );

        let flight = self
            .flights
            .get(&record.flight_id)
            .ok_or(LedgerError::FlightNotFound(record.flight_id))?;
        if live {
            if self
                .find_live_booking(record.customer_id, record.flight_id)
                .is_some()
            {
                return Err(LedgerError::DuplicateBooking {
                    customer_id: record.customer_id,
                    flight_id: record.flight_id,
                });
            }
            if !flight.inventory().is_seat_free(record.seat_class, &seat_number) {
                return Err(LedgerError::Inventory(InventoryError::SeatTaken {
                    class: record.seat_class,
                    seat: seat_number,
                }));
            }
            if flight.inventory().available(record.seat_class) == 0 {
                return Err(LedgerError::Inventory(InventoryError::NoCapacity {
                    class: record.seat_class,
                }));
            }
        }

        let booking = Booking::new(
            record.booking_id,
            record.customer_id,
            record.flight_id,
            record.booking_date,
            record.seat_class,
            seat_number.clone(),
            record.price_cents,
            record.discount_percent,
            record.manual_discount,
            record.pet_type,
            record.pet_charge_cents,
        )
        .with_status(record.status);

        if live {
            let flight = self
                .flights
                .get_mut(&record.flight_id)
                .ok_or(LedgerError::FlightNotFound(record.flight_id))?;
            flight
                .inventory_mut()
                .reserve(record.seat_class, &seat_number)?;
            flight.attach_booking(record.booking_id);
            if let Some(customer) = self.customers.get_mut(&record.customer_id) {
                customer.attach_booking(record.booking_id);
            }
        }

        self.bookings.insert(record.booking_id, booking);
        self.next_booking_id = self.next_booking_id.max(record.booking_id + 1);
        Ok(())
    }
}
