use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use aerobook_catalog::flight::SeatClass;
use aerobook_catalog::inventory::{normalize_seat, InventoryError};
use aerobook_catalog::pricing::PetType;
use aerobook_core::money::Cents;
use aerobook_core::{BookingId, FlightId};

use crate::booking::BookingStatus;
use crate::ledger::{Ledger, LedgerError};

/// Flat fee added to the booking's price whenever an edit succeeds.
pub const UPDATE_FEE_CENTS: Cents = 1_000;

/// Pet change requested as part of an edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PetUpdate {
    Add(PetType),
    Remove,
}

/// Partial update to an existing booking. Fields left as `None` keep
/// their current value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BookingUpdate {
    pub flight_id: Option<FlightId>,
    pub booking_date: Option<NaiveDate>,
    pub status: Option<BookingStatus>,
    pub seat_class: Option<SeatClass>,
    pub seat_number: Option<String>,
    pub price_cents: Option<Cents>,
    pub pet: Option<PetUpdate>,
}

/// Applies staff edits to bookings. Every edit is validated in full
/// against the ledger before any field, seat map or back reference is
/// touched, and a successful edit adds the flat update fee.
pub struct ChangeHandler;

impl ChangeHandler {
    /// Applies `update` to the booking, returning the booking's new
    /// price. Seat moves release the old seat and reserve the new one;
    /// moving to a different flight re-validates departure exactly as at
    /// creation; a status change to CANCELLED behaves like a
    /// cancellation (seat released, back references detached, record
    /// kept).
    pub fn apply(
        ledger: &mut Ledger,
        booking_id: BookingId,
        update: BookingUpdate,
        now: DateTime<Utc>,
    ) -> Result<Cents, LedgerError> {
        let booking = ledger
            .bookings
            .get(&booking_id)
            .ok_or(LedgerError::BookingNotFound(booking_id))?;

        let old_flight_id = booking.flight_id;
        let old_class = booking.seat_class;
        let old_seat = booking.seat_number.clone();
        let customer_id = booking.customer_id;
        let was_live = booking.is_live();

        // Resolve targets.
        let new_flight_id = update.flight_id.unwrap_or(old_flight_id);
        let new_class = update.seat_class.unwrap_or(old_class);
        let new_seat = match &update.seat_number {
            Some(seat) => {
                let seat = normalize_seat(seat);
                if seat.is_empty() {
                    return Err(LedgerError::Validation(
                        "seat number must not be empty".to_string(),
                    ));
                }
                seat
            }
            None => old_seat.clone(),
        };
        let seat_moved =
            new_flight_id != old_flight_id || new_class != old_class || new_seat != old_seat;

        // ---- validation, no mutation yet -----------------------------

        if let Some(price) = update.price_cents {
            if price < 0 {
                return Err(LedgerError::Validation(format!(
                    "price must not be negative, got {price}"
                )));
            }
        }
        // The price a successful edit would leave behind must not go
        // negative either: a pet refund against a freshly lowered price
        // can undercut zero even when the input price is valid.
        let pet_delta = match update.pet {
            Some(PetUpdate::Add(pet)) if booking.pet_charge_cents == 0 => {
                ledger.pricing.pet_charge(Some(pet))
            }
            Some(PetUpdate::Remove) => -booking.pet_charge_cents,
            _ => 0,
        };
        let resulting_price =
            update.price_cents.unwrap_or(booking.price_cents) + pet_delta + UPDATE_FEE_CENTS;
        if resulting_price < 0 {
            return Err(LedgerError::Validation(format!(
                "edit would leave a negative price of {resulting_price}"
            )));
        }
        if let Some(status) = update.status {
            if !booking.can_transition(status) {
                return Err(LedgerError::Booking(
                    crate::booking::BookingError::InvalidTransition {
                        from: booking.status(),
                        to: status,
                    },
                ));
            }
        }

        let flight = ledger
            .flights
            .get(&new_flight_id)
            .ok_or(LedgerError::FlightNotFound(new_flight_id))?;

        if was_live && seat_moved {
            if new_flight_id != old_flight_id {
                if flight.has_departed(now) {
                    return Err(LedgerError::FlightDeparted(new_flight_id));
                }
                if ledger.find_live_booking(customer_id, new_flight_id).is_some() {
                    return Err(LedgerError::DuplicateBooking {
                        customer_id,
                        flight_id: new_flight_id,
                    });
                }
            }
            if !flight.inventory().is_seat_free(new_class, &new_seat) {
                return Err(LedgerError::Inventory(InventoryError::SeatTaken {
                    class: new_class,
                    seat: new_seat,
                }));
            }
            // Moving within the same flight and class reuses the slot
            // the old seat occupies, so capacity only matters otherwise.
            let same_slot = new_flight_id == old_flight_id && new_class == old_class;
            if !same_slot && flight.inventory().available(new_class) == 0 {
                return Err(LedgerError::Inventory(InventoryError::NoCapacity {
                    class: new_class,
                }));
            }
        }

        // ---- mutation ------------------------------------------------

        if was_live && seat_moved {
            if let Some(old_flight) = ledger.flights.get_mut(&old_flight_id) {
                old_flight.inventory_mut().release(old_class, &old_seat);
                if new_flight_id != old_flight_id {
                    old_flight.detach_booking(booking_id);
                }
            }
            let new_flight = ledger
                .flights
                .get_mut(&new_flight_id)
                .ok_or(LedgerError::FlightNotFound(new_flight_id))?;
            new_flight.inventory_mut().reserve(new_class, &new_seat)?;
            if new_flight_id != old_flight_id {
                new_flight.attach_booking(booking_id);
            }
        }

        let booking = ledger
            .bookings
            .get_mut(&booking_id)
            .ok_or(LedgerError::BookingNotFound(booking_id))?;

        booking.flight_id = new_flight_id;
        booking.seat_class = new_class;
        booking.seat_number = new_seat;
        if let Some(date) = update.booking_date {
            booking.booking_date = date;
        }
        if let Some(price) = update.price_cents {
            booking.price_cents = price;
        }
        match update.pet {
            // Adding a pet when one is already charged only swaps the
            // type; the charge is applied once.
            Some(PetUpdate::Add(pet)) => {
                booking.pet_type = Some(pet);
                if booking.pet_charge_cents == 0 {
                    booking.pet_charge_cents = ledger.pricing.pet_charge(Some(pet));
                    booking.price_cents += booking.pet_charge_cents;
                }
            }
            Some(PetUpdate::Remove) => {
                booking.pet_type = None;
                booking.price_cents -= booking.pet_charge_cents;
                booking.pet_charge_cents = 0;
            }
            None => {}
        }

        let mut cancelled = false;
        if let Some(status) = update.status {
            cancelled = status == BookingStatus::Cancelled && booking.status() != status;
            booking.transition(status)?;
        }

        booking.price_cents += UPDATE_FEE_CENTS;
        let new_price = booking.price_cents;
        let (final_flight, final_class, final_seat) =
            (booking.flight_id, booking.seat_class, booking.seat_number.clone());

        if cancelled {
            if let Some(flight) = ledger.flights.get_mut(&final_flight) {
                flight.inventory_mut().release(final_class, &final_seat);
                flight.detach_booking(booking_id);
            }
            if let Some(customer) = ledger.customers.get_mut(&customer_id) {
                customer.detach_booking(booking_id);
            }
        }

        tracing::info!(booking_id, price = new_price, "booking updated");
        Ok(new_price)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::tests::{sample_customer, sample_flight};
    use crate::ledger::BookingRequest;
    use chrono::{DateTime, Duration, Utc};

    fn setup() -> (Ledger, BookingId, FlightId, DateTime<Utc>) {
        let mut ledger = Ledger::new();
        let now = Utc::now();
        let customer_id = ledger
            .register_customer(sample_customer("P100", 30, false))
            .unwrap();
        let flight_id = ledger.add_flight(sample_flight(now + Duration::days(30)));
        let booking_id = ledger
            .create_booking(
                BookingRequest {
                    customer_id,
                    flight_id,
                    seat_class: SeatClass::Economy,
                    seat_number: "12A".to_string(),
                    pet_type: None,
                    manual_discount_percent: None,
                },
                now,
            )
            .unwrap();
        (ledger, booking_id, flight_id, now)
    }

    #[test]
    fn test_seat_move_releases_old_and_charges_fee() {
        let (mut ledger, booking_id, flight_id, now) = setup();

        let price = ChangeHandler::apply(
            &mut ledger,
            booking_id,
            BookingUpdate {
                seat_number: Some("14c".to_string()),
                ..Default::default()
            },
            now,
        )
        .unwrap();

        assert_eq!(price, 10_000 + UPDATE_FEE_CENTS);
        let inventory = ledger.flight(flight_id).unwrap().inventory();
        assert!(inventory.is_seat_free(SeatClass::Economy, "12A"));
        assert!(!inventory.is_seat_free(SeatClass::Economy, "14C"));
        assert_eq!(inventory.booked(SeatClass::Economy), 1);
        assert_eq!(ledger.booking(booking_id).unwrap().seat_number, "14C");
    }

    #[test]
    fn test_move_to_taken_seat_rejected_without_mutation() {
        let (mut ledger, booking_id, flight_id, now) = setup();
        let other = ledger
            .register_customer(sample_customer("P200", 40, false))
            .unwrap();
        ledger
            .create_booking(
                BookingRequest {
                    customer_id: other,
                    flight_id,
                    seat_class: SeatClass::Economy,
                    seat_number: "14C".to_string(),
                    pet_type: None,
                    manual_discount_percent: None,
                },
                now,
            )
            .unwrap();

        let err = ChangeHandler::apply(
            &mut ledger,
            booking_id,
            BookingUpdate {
                seat_number: Some("14C".to_string()),
                ..Default::default()
            },
            now,
        )
        .unwrap_err();

        assert!(matches!(err, LedgerError::Inventory(InventoryError::SeatTaken { .. })));
        let booking = ledger.booking(booking_id).unwrap();
        assert_eq!(booking.seat_number, "12A");
        // Failed edit charges nothing.
        assert_eq!(booking.price_cents, 10_000);
    }

    #[test]
    fn test_move_to_other_flight_rewires_references() {
        let (mut ledger, booking_id, old_flight, now) = setup();
        let new_flight = ledger.add_flight(sample_flight(now + Duration::days(40)));

        ChangeHandler::apply(
            &mut ledger,
            booking_id,
            BookingUpdate {
                flight_id: Some(new_flight),
                ..Default::default()
            },
            now,
        )
        .unwrap();

        assert!(ledger.flight(old_flight).unwrap().bookings().is_empty());
        assert_eq!(ledger.flight(new_flight).unwrap().bookings(), &[booking_id]);
        assert!(ledger
            .flight(old_flight)
            .unwrap()
            .inventory()
            .is_seat_free(SeatClass::Economy, "12A"));
        assert!(!ledger
            .flight(new_flight)
            .unwrap()
            .inventory()
            .is_seat_free(SeatClass::Economy, "12A"));
    }

    #[test]
    fn test_repeated_pet_add_charges_once() {
        let (mut ledger, booking_id, _, now) = setup();

        let first = ChangeHandler::apply(
            &mut ledger,
            booking_id,
            BookingUpdate {
                pet: Some(PetUpdate::Add(PetType::Cat)),
                ..Default::default()
            },
            now,
        )
        .unwrap();
        // $100 + $15 pet + $10 fee.
        assert_eq!(first, 12_500);

        let second = ChangeHandler::apply(
            &mut ledger,
            booking_id,
            BookingUpdate {
                pet: Some(PetUpdate::Add(PetType::Dog)),
                ..Default::default()
            },
            now,
        )
        .unwrap();
        // Type swap only adds the update fee, never a second pet charge.
        assert_eq!(second, 13_500);
        let booking = ledger.booking(booking_id).unwrap();
        assert_eq!(booking.pet_type, Some(PetType::Dog));
        assert_eq!(booking.pet_charge_cents, 1_500);
    }

    #[test]
    fn test_pet_remove_refunds_charge() {
        let (mut ledger, booking_id, _, now) = setup();
        ChangeHandler::apply(
            &mut ledger,
            booking_id,
            BookingUpdate {
                pet: Some(PetUpdate::Add(PetType::Bird)),
                ..Default::default()
            },
            now,
        )
        .unwrap();

        let price = ChangeHandler::apply(
            &mut ledger,
            booking_id,
            BookingUpdate {
                pet: Some(PetUpdate::Remove),
                ..Default::default()
            },
            now,
        )
        .unwrap();

        // 12_500 - 1_500 pet charge + 1_000 fee.
        assert_eq!(price, 12_000);
        let booking = ledger.booking(booking_id).unwrap();
        assert_eq!(booking.pet_type, None);
        assert_eq!(booking.pet_charge_cents, 0);
    }

    #[test]
    fn test_negative_price_rejected() {
        let (mut ledger, booking_id, _, now) = setup();

        let err = ChangeHandler::apply(
            &mut ledger,
            booking_id,
            BookingUpdate {
                price_cents: Some(-1),
                ..Default::default()
            },
            now,
        )
        .unwrap_err();
        assert!(matches!(err, LedgerError::Validation(_)));
    }

    #[test]
    fn test_pet_remove_on_lowered_price_rejected() {
        let mut ledger = Ledger::new();
        let now = Utc::now();
        let customer_id = ledger
            .register_customer(sample_customer("P100", 30, false))
            .unwrap();
        let flight_id = ledger.add_flight(sample_flight(now + Duration::days(30)));
        let booking_id = ledger
            .create_booking(
                BookingRequest {
                    customer_id,
                    flight_id,
                    seat_class: SeatClass::Economy,
                    seat_number: "12A".to_string(),
                    pet_type: Some(PetType::Cat),
                    manual_discount_percent: None,
                },
                now,
            )
            .unwrap();

        // 0 price - $15 pet refund + $10 fee would land at -$5.
        let err = ChangeHandler::apply(
            &mut ledger,
            booking_id,
            BookingUpdate {
                price_cents: Some(0),
                pet: Some(PetUpdate::Remove),
                ..Default::default()
            },
            now,
        )
        .unwrap_err();

        assert!(matches!(err, LedgerError::Validation(_)));
        let booking = ledger.booking(booking_id).unwrap();
        assert_eq!(booking.price_cents, 11_500);
        assert_eq!(booking.pet_type, Some(PetType::Cat));
        assert_eq!(booking.pet_charge_cents, 1_500);
    }

    #[test]
    fn test_move_to_departed_flight_rejected() {
        let (mut ledger, booking_id, old_flight, now) = setup();
        let departed = ledger.add_flight(sample_flight(now - Duration::hours(2)));

        let err = ChangeHandler::apply(
            &mut ledger,
            booking_id,
            BookingUpdate {
                flight_id: Some(departed),
                ..Default::default()
            },
            now,
        )
        .unwrap_err();

        assert!(matches!(err, LedgerError::FlightDeparted(id) if id == departed));
        let booking = ledger.booking(booking_id).unwrap();
        assert_eq!(booking.flight_id, old_flight);
        assert!(!ledger
            .flight(old_flight)
            .unwrap()
            .inventory()
            .is_seat_free(SeatClass::Economy, "12A"));
        assert!(ledger.flight(departed).unwrap().bookings().is_empty());
    }

    #[test]
    fn test_edit_to_cancelled_releases_seat() {
        let (mut ledger, booking_id, flight_id, now) = setup();

        ChangeHandler::apply(
            &mut ledger,
            booking_id,
            BookingUpdate {
                status: Some(BookingStatus::Cancelled),
                ..Default::default()
            },
            now,
        )
        .unwrap();

        assert_eq!(
            ledger.booking(booking_id).unwrap().status(),
            BookingStatus::Cancelled
        );
        assert!(ledger
            .flight(flight_id)
            .unwrap()
            .inventory()
            .is_seat_free(SeatClass::Economy, "12A"));
        assert!(ledger.flight(flight_id).unwrap().bookings().is_empty());
    }

    #[test]
    fn test_cancelled_booking_cannot_be_reactivated() {
        let (mut ledger, booking_id, _, now) = setup();
        ChangeHandler::apply(
            &mut ledger,
            booking_id,
            BookingUpdate {
                status: Some(BookingStatus::Cancelled),
                ..Default::default()
            },
            now,
        )
        .unwrap();

        let err = ChangeHandler::apply(
            &mut ledger,
            booking_id,
            BookingUpdate {
                status: Some(BookingStatus::Active),
                ..Default::default()
            },
            now,
        )
        .unwrap_err();
        assert!(matches!(err, LedgerError::Booking(_)));
    }
}
