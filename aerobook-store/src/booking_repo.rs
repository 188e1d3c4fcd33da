use std::fs;
use std::io::Write as _;

use aerobook_catalog::pricing::PetType;
use aerobook_ledger::{BookingRecord, Ledger};

use crate::codec::{read_lines, Fields, SEPARATOR};
use crate::{DataManager, StoreError};

/// Twelve `::`-separated fields per line, matching the record layout:
/// booking id, customer id, flight id, booking date, seat class, price
/// (cents), status, seat number, discount percent, manual-discount flag,
/// pet type (empty for none), pet charge (cents).
///
/// Loading replays each record through the ledger, so seat occupancy,
/// back references and the id counter are re-derived rather than stored.
pub struct BookingFileRepository {
    path: String,
}

impl BookingFileRepository {
    pub fn new(path: &str) -> Self {
        Self {
            path: path.to_string(),
        }
    }

    fn parse_line(&self, line_no: usize, line: &str) -> Result<BookingRecord, StoreError> {
        let fields = Fields::split(&self.path, line_no, line, 12)?;

        let pet_type = PetType::parse_optional(fields.raw(10))
            .map_err(|e| fields.error("pet type", e))?;

        Ok(BookingRecord {
            booking_id: fields.parse(0, "booking id")?,
            customer_id: fields.parse(1, "customer id")?,
            flight_id: fields.parse(2, "flight id")?,
            booking_date: fields.parse(3, "booking date")?,
            seat_class: fields.parse(4, "seat class")?,
            price_cents: fields.parse(5, "price")?,
            status: fields.parse(6, "booking status")?,
            seat_number: fields.text(7),
            discount_percent: fields.parse(8, "discount percent")?,
            manual_discount: fields.parse(9, "manual discount flag")?,
            pet_type,
            pet_charge_cents: fields.parse(11, "pet charge")?,
        })
    }

    fn format_line(record: &BookingRecord) -> String {
        [
            record.booking_id.to_string(),
            record.customer_id.to_string(),
            record.flight_id.to_string(),
            record.booking_date.to_string(),
            record.seat_class.to_string(),
            record.price_cents.to_string(),
            record.status.to_string(),
            record.seat_number.clone(),
            record.discount_percent.to_string(),
            record.manual_discount.to_string(),
            record.pet_type.map(|p| p.to_string()).unwrap_or_default(),
            record.pet_charge_cents.to_string(),
        ]
        .join(SEPARATOR)
    }
}

impl DataManager for BookingFileRepository {
    fn load(&self, ledger: &mut Ledger) -> Result<(), StoreError> {
        for (idx, line) in read_lines(&self.path)?.iter().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let record = self.parse_line(idx + 1, line)?;
            ledger.import_booking(record)?;
        }
        Ok(())
    }

    fn store(&self, ledger: &Ledger) -> Result<(), StoreError> {
        let mut out = fs::File::create(&self.path)?;
        for record in ledger.export_bookings() {
            writeln!(out, "{}", Self::format_line(&record))?;
        }
        Ok(())
    }
}
