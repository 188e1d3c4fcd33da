//! End-to-end booking flows against an in-memory ledger.

use chrono::{DateTime, Duration, NaiveDate, Utc};

use aerobook_catalog::flight::{FlightDetails, SeatClass};
use aerobook_catalog::pricing::PetType;
use aerobook_core::customer::CustomerDetails;
use aerobook_ledger::{
    BookingRequest, BookingStatus, BookingUpdate, ChangeHandler, Ledger, PetUpdate,
    REBOOKING_FEE_CENTS, UPDATE_FEE_CENTS,
};

fn customer(passport: &str, age: u32, disabled: bool) -> CustomerDetails {
    CustomerDetails {
        name: "Jordan Blake".to_string(),
        phone: "0121 555 0100".to_string(),
        age,
        address: "5 Corporation St".to_string(),
        country: "UK".to_string(),
        passport_number: passport.to_string(),
        passport_expiry: NaiveDate::from_ymd_opt(2033, 6, 30).unwrap(),
        disabled,
        email: "jordan@example.com".to_string(),
        date_of_birth: NaiveDate::from_ymd_opt(1988, 11, 2).unwrap(),
        gender: "M".to_string(),
    }
}

fn flight(departure: DateTime<Utc>) -> FlightDetails {
    FlightDetails {
        flight_number: "AB404".to_string(),
        airline: "Aerobook Air".to_string(),
        origin: "LHR".to_string(),
        destination: "CDG".to_string(),
        departure,
        arrival: Some(departure + Duration::minutes(80)),
        international: true,
    }
}

fn request(
    customer_id: u32,
    flight_id: u32,
    class: SeatClass,
    seat: &str,
    pet: Option<PetType>,
) -> BookingRequest {
    BookingRequest {
        customer_id,
        flight_id,
        seat_class: class,
        seat_number: seat.to_string(),
        pet_type: pet,
        manual_discount_percent: None,
    }
}

#[test]
fn plain_booking_charges_base_price() {
    let mut ledger = Ledger::new();
    let now = Utc::now();
    let cid = ledger.register_customer(customer("Q100", 35, false)).unwrap();
    let fid = ledger.add_flight(flight(now + Duration::days(10)));

    let id = ledger
        .create_booking(request(cid, fid, SeatClass::Economy, "10a", None), now)
        .unwrap();

    let booking = ledger.booking(id).unwrap();
    assert_eq!(booking.price_cents, 10_000);
    assert_eq!(booking.discount_percent, 0.0);
    assert_eq!(booking.status(), BookingStatus::Completed);
    assert_eq!(booking.seat_number, "10A");
}

#[test]
fn small_cabin_fills_up_with_child_discount() {
    let mut ledger = Ledger::new();
    let now = Utc::now();
    let child = ledger.register_customer(customer("Q150", 10, false)).unwrap();
    let adult = ledger.register_customer(customer("Q151", 30, false)).unwrap();
    let third = ledger.register_customer(customer("Q152", 30, false)).unwrap();
    let fid = ledger.add_flight(flight(now + Duration::days(10)));
    ledger.set_capacity(fid, SeatClass::Economy, 2).unwrap();

    // Age 10 gets the 10% child discount on the $100 base.
    let first = ledger
        .create_booking(request(child, fid, SeatClass::Economy, "1A", None), now)
        .unwrap();
    assert_eq!(ledger.booking(first).unwrap().price_cents, 9_000);

    assert!(ledger
        .create_booking(request(adult, fid, SeatClass::Economy, "1A", None), now)
        .is_err());
    ledger
        .create_booking(request(adult, fid, SeatClass::Economy, "1B", None), now)
        .unwrap();
    // Cabin is now full.
    assert!(ledger
        .create_booking(request(third, fid, SeatClass::Economy, "1C", None), now)
        .is_err());
}

#[test]
fn discounted_business_booking_with_pet() {
    let mut ledger = Ledger::new();
    let now = Utc::now();
    let cid = ledger.register_customer(customer("Q200", 64, true)).unwrap();
    let fid = ledger.add_flight(flight(now + Duration::days(10)));

    let id = ledger
        .create_booking(
            request(cid, fid, SeatClass::Business, "2C", Some(PetType::Dog)),
            now,
        )
        .unwrap();

    // $250 business, 15% senior + 5% disability, plus $15 pet.
    let booking = ledger.booking(id).unwrap();
    assert_eq!(booking.discount_percent, 20.0);
    assert_eq!(booking.pet_charge_cents, 1_500);
    assert_eq!(booking.price_cents, 21_500);
}

#[test]
fn cancel_frees_seat_for_another_customer() {
    let mut ledger = Ledger::new();
    let now = Utc::now();
    let alice = ledger.register_customer(customer("Q300", 30, false)).unwrap();
    let bob = ledger.register_customer(customer("Q301", 45, false)).unwrap();
    let fid = ledger.add_flight(flight(now + Duration::days(10)));

    ledger
        .create_booking(request(alice, fid, SeatClass::First, "1A", None), now)
        .unwrap();
    assert!(ledger
        .create_booking(request(bob, fid, SeatClass::First, "1A", None), now)
        .is_err());

    ledger.cancel_booking(alice, fid).unwrap();
    let id = ledger
        .create_booking(request(bob, fid, SeatClass::First, "1A", None), now)
        .unwrap();
    assert_eq!(ledger.booking(id).unwrap().customer_id, bob);
}

#[test]
fn rebooking_costs_prior_price_plus_fee() {
    let mut ledger = Ledger::new();
    let now = Utc::now();
    let cid = ledger.register_customer(customer("Q400", 30, false)).unwrap();
    let fid = ledger.add_flight(flight(now + Duration::days(10)));

    ledger
        .create_booking(request(cid, fid, SeatClass::Economy, "12A", None), now)
        .unwrap();
    let snapshot = ledger.cancel_booking(cid, fid).unwrap();
    let rebooked = ledger.rebook_cancelled(cid, &snapshot, now).unwrap();

    assert_eq!(
        ledger.booking(rebooked).unwrap().price_cents,
        10_000 + REBOOKING_FEE_CENTS
    );
}

#[test]
fn each_edit_charges_the_update_fee_once() {
    let mut ledger = Ledger::new();
    let now = Utc::now();
    let cid = ledger.register_customer(customer("Q500", 30, false)).unwrap();
    let fid = ledger.add_flight(flight(now + Duration::days(10)));
    let id = ledger
        .create_booking(request(cid, fid, SeatClass::Economy, "12A", None), now)
        .unwrap();

    let after_move = ChangeHandler::apply(
        &mut ledger,
        id,
        BookingUpdate {
            seat_number: Some("15F".to_string()),
            ..Default::default()
        },
        now,
    )
    .unwrap();
    assert_eq!(after_move, 10_000 + UPDATE_FEE_CENTS);

    let after_pet = ChangeHandler::apply(
        &mut ledger,
        id,
        BookingUpdate {
            pet: Some(PetUpdate::Add(PetType::Cat)),
            ..Default::default()
        },
        now,
    )
    .unwrap();
    assert_eq!(after_pet, after_move + 1_500 + UPDATE_FEE_CENTS);

    // Re-adding a pet swaps the type without a second pet charge.
    let after_swap = ChangeHandler::apply(
        &mut ledger,
        id,
        BookingUpdate {
            pet: Some(PetUpdate::Add(PetType::Bird)),
            ..Default::default()
        },
        now,
    )
    .unwrap();
    assert_eq!(after_swap, after_pet + UPDATE_FEE_CENTS);
    assert_eq!(ledger.booking(id).unwrap().pet_type, Some(PetType::Bird));
}

#[test]
fn export_import_rebuilds_seat_maps_and_ids() {
    let mut ledger = Ledger::new();
    let now = Utc::now();
    let cid = ledger.register_customer(customer("Q600", 30, false)).unwrap();
    let fid = ledger.add_flight(flight(now + Duration::days(10)));

    ledger
        .create_booking(request(cid, fid, SeatClass::Economy, "12A", None), now)
        .unwrap();
    ledger.cancel_booking(cid, fid).unwrap();
    ledger
        .create_booking(request(cid, fid, SeatClass::Business, "3D", None), now)
        .unwrap();

    let records = ledger.export_bookings();

    // Back references are re-derived by import, so the customer is
    // rebuilt from its details without any.
    let mut reloaded = Ledger::new();
    reloaded
        .insert_customer(aerobook_core::customer::Customer::new(
            cid,
            customer("Q600", 30, false),
        ))
        .unwrap();
    reloaded
        .insert_flight(aerobook_catalog::flight::Flight::new(
            fid,
            flight(now + Duration::days(10)),
        ))
        .unwrap();
    for record in records {
        reloaded.import_booking(record).unwrap();
    }
    reloaded.reseed_booking_ids();

    let inventory = reloaded.flight(fid).unwrap().inventory();
    assert!(inventory.is_seat_free(SeatClass::Economy, "12A"));
    assert!(!inventory.is_seat_free(SeatClass::Business, "3D"));
    assert_eq!(reloaded.bookings().count(), 2);

    // Fresh ids continue past everything replayed.
    let other = reloaded.register_customer(customer("Q601", 30, false)).unwrap();
    let next = reloaded
        .create_booking(request(other, fid, SeatClass::Economy, "20B", None), now)
        .unwrap();
    assert_eq!(next, 3);
}
