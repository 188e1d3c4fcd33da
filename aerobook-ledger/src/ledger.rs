use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use aerobook_catalog::flight::{Flight, FlightDetails, FlightStatus, SeatClass};
use aerobook_catalog::inventory::{normalize_seat, InventoryError};
use aerobook_catalog::pricing::{PetType, PricingConfig, PricingEngine, PricingError};
use aerobook_core::customer::{Customer, CustomerDetails};
use aerobook_core::money::Cents;
use aerobook_core::{BookingId, CustomerDirectory, CustomerId, CustomerProfile, FlightId};

use crate::booking::{Booking, BookingError, CancelledBooking};

/// Flat fee added on top of the prior price when a cancelled booking is
/// rebooked.
pub const REBOOKING_FEE_CENTS: Cents = 1_000;

/// Input for creating a booking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingRequest {
    pub customer_id: CustomerId,
    pub flight_id: FlightId,
    pub seat_class: SeatClass,
    pub seat_number: String,
    pub pet_type: Option<PetType>,
    /// Staff-entered override; bypasses the automatic age/disability rules.
    pub manual_discount_percent: Option<f64>,
}

/// The aggregate root: single source of truth for customers, flights and
/// bookings, and the only place cross-entity invariants are enforced.
///
/// Every operation either fully succeeds or fails without touching state:
/// all validation happens before the first mutation.
pub struct Ledger {
    pub(crate) customers: HashMap<CustomerId, Customer>,
    pub(crate) flights: HashMap<FlightId, Flight>,
    // BTreeMap so enumeration comes out in ascending booking-id order,
    // which is also the persisted order.
    pub(crate) bookings: BTreeMap<BookingId, Booking>,
    customers_by_passport: HashMap<String, CustomerId>,
    pub(crate) pricing: PricingEngine,
    next_customer_id: CustomerId,
    next_flight_id: FlightId,
    pub(crate) next_booking_id: BookingId,
}

impl Ledger {
    pub fn new() -> Self {
        Self::with_pricing(PricingConfig::default())
    }

    pub fn with_pricing(config: PricingConfig) -> Self {
        Self {
            customers: HashMap::new(),
            flights: HashMap::new(),
            bookings: BTreeMap::new(),
            customers_by_passport: HashMap::new(),
            pricing: PricingEngine::new(config),
            next_customer_id: 1,
            next_flight_id: 1,
            next_booking_id: 1,
        }
    }

    // ------------------------------------------------------------------
    // Customers
    // ------------------------------------------------------------------

    /// Registers a new customer with an auto-assigned id. Passport
    /// numbers are unique system-wide.
    pub fn register_customer(&mut self, details: CustomerDetails) -> Result<CustomerId, LedgerError> {
        let passport = details.passport_number.to_uppercase();
        if self.customers_by_passport.contains_key(&passport) {
            return Err(LedgerError::DuplicatePassport(passport));
        }

        let id = self.next_customer_id;
        self.customers.insert(id, Customer::new(id, details));
        self.customers_by_passport.insert(passport, id);
        self.next_customer_id += 1;

        tracing::info!(customer_id = id, "customer registered");
        Ok(id)
    }

    /// Inserts a fully-formed customer, keeping the id counter ahead of
    /// the highest id seen. Load-time path.
    pub fn insert_customer(&mut self, customer: Customer) -> Result<(), LedgerError> {
        if self.customers.contains_key(&customer.id) {
            return Err(LedgerError::DuplicateCustomerId(customer.id));
        }
        let passport = customer.passport_number.to_uppercase();
        if self.customers_by_passport.contains_key(&passport) {
            return Err(LedgerError::DuplicatePassport(passport));
        }

        self.next_customer_id = self.next_customer_id.max(customer.id + 1);
        self.customers_by_passport.insert(passport, customer.id);
        self.customers.insert(customer.id, customer);
        Ok(())
    }

    pub fn customer(&self, id: CustomerId) -> Result<&Customer, LedgerError> {
        self.customers.get(&id).ok_or(LedgerError::CustomerNotFound(id))
    }

    pub fn customer_by_passport(&self, passport_number: &str) -> Option<&Customer> {
        let id = self.customers_by_passport.get(&passport_number.to_uppercase())?;
        self.customers.get(id)
    }

    pub fn customers(&self) -> impl Iterator<Item = &Customer> {
        self.customers.values()
    }

    /// Overwrites a customer's details in place, keeping their id and
    /// booking references. Passport uniqueness is re-validated when the
    /// passport number changes.
    pub fn update_customer(
        &mut self,
        id: CustomerId,
        details: CustomerDetails,
    ) -> Result<(), LedgerError> {
        let old_passport = self
            .customers
            .get(&id)
            .ok_or(LedgerError::CustomerNotFound(id))?
            .passport_number
            .clone();

        let new_passport = details.passport_number.to_uppercase();
        if new_passport != old_passport {
            if self.customers_by_passport.contains_key(&new_passport) {
                return Err(LedgerError::DuplicatePassport(new_passport));
            }
            self.customers_by_passport.remove(&old_passport);
            self.customers_by_passport.insert(new_passport.clone(), id);
        }

        let customer = self
            .customers
            .get_mut(&id)
            .ok_or(LedgerError::CustomerNotFound(id))?;
        customer.name = details.name;
        customer.phone = details.phone;
        customer.age = details.age;
        customer.address = details.address;
        customer.country = details.country;
        customer.passport_number = new_passport;
        customer.passport_expiry = details.passport_expiry;
        customer.disabled = details.disabled;
        customer.email = details.email;
        customer.date_of_birth = details.date_of_birth;
        customer.gender = details.gender;

        tracing::info!(customer_id = id, "customer details updated");
        Ok(())
    }

    /// Removes a customer, cascading removal of every booking they own.
    /// Seats held by live bookings are released first.
    pub fn remove_customer(&mut self, id: CustomerId) -> Result<(), LedgerError> {
        let customer = self.customers.get(&id).ok_or(LedgerError::CustomerNotFound(id))?;
        let booking_ids: Vec<BookingId> = customer.bookings().to_vec();

        for booking_id in booking_ids {
            if let Some(booking) = self.bookings.remove(&booking_id) {
                if let Some(flight) = self.flights.get_mut(&booking.flight_id) {
                    if booking.is_live() {
                        flight
                            .inventory_mut()
                            .release(booking.seat_class, &booking.seat_number);
                    }
                    flight.detach_booking(booking_id);
                }
            }
        }
        // Cancelled bookings are only referenced from the global list.
        self.bookings.retain(|_, b| b.customer_id != id);

        let customer = self.customers.remove(&id).ok_or(LedgerError::CustomerNotFound(id))?;
        self.customers_by_passport
            .remove(&customer.passport_number.to_uppercase());

        tracing::info!(customer_id = id, "customer removed with all owned bookings");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Flights
    // ------------------------------------------------------------------

    /// Adds a flight with an auto-assigned id and the default cabin
    /// layout and prices.
    pub fn add_flight(&mut self, details: FlightDetails) -> FlightId {
        let id = self.next_flight_id;
        self.flights.insert(id, Flight::new(id, details));
        self.next_flight_id += 1;
        id
    }

    /// Inserts a fully-formed flight, keeping the id counter ahead.
    /// Load-time path.
    pub fn insert_flight(&mut self, flight: Flight) -> Result<(), LedgerError> {
        if self.flights.contains_key(&flight.id) {
            return Err(LedgerError::DuplicateFlightId(flight.id));
        }
        self.next_flight_id = self.next_flight_id.max(flight.id + 1);
        self.flights.insert(flight.id, flight);
        Ok(())
    }

    pub fn flight(&self, id: FlightId) -> Result<&Flight, LedgerError> {
        self.flights.get(&id).ok_or(LedgerError::FlightNotFound(id))
    }

    pub fn flights(&self) -> impl Iterator<Item = &Flight> {
        self.flights.values()
    }

    /// Capacity and price changes go through the ledger so the
    /// shrink-below-booked and negative-price rules cannot be bypassed.
    pub fn set_capacity(
        &mut self,
        flight_id: FlightId,
        class: SeatClass,
        capacity: u32,
    ) -> Result<(), LedgerError> {
        let flight = self
            .flights
            .get_mut(&flight_id)
            .ok_or(LedgerError::FlightNotFound(flight_id))?;
        flight.inventory_mut().set_capacity(class, capacity)?;
        Ok(())
    }

    pub fn set_base_price(
        &mut self,
        flight_id: FlightId,
        class: SeatClass,
        price_cents: Cents,
    ) -> Result<(), LedgerError> {
        let flight = self
            .flights
            .get_mut(&flight_id)
            .ok_or(LedgerError::FlightNotFound(flight_id))?;
        flight.inventory_mut().set_base_price_cents(class, price_cents)?;
        Ok(())
    }

    pub fn set_flight_status(
        &mut self,
        flight_id: FlightId,
        status: FlightStatus,
    ) -> Result<(), LedgerError> {
        let flight = self
            .flights
            .get_mut(&flight_id)
            .ok_or(LedgerError::FlightNotFound(flight_id))?;
        flight.status = status;
        Ok(())
    }

    /// Removes a flight, cascading removal of every booking that
    /// references it across every customer.
    pub fn remove_flight(&mut self, id: FlightId) -> Result<(), LedgerError> {
        if !self.flights.contains_key(&id) {
            return Err(LedgerError::FlightNotFound(id));
        }

        let doomed: Vec<BookingId> = self
            .bookings
            .values()
            .filter(|b| b.flight_id == id)
            .map(|b| b.id)
            .collect();

        for booking_id in &doomed {
            if let Some(booking) = self.bookings.remove(booking_id) {
                if let Some(customer) = self.customers.get_mut(&booking.customer_id) {
                    customer.detach_booking(booking.id);
                }
            }
        }
        self.flights.remove(&id);

        tracing::info!(flight_id = id, bookings = doomed.len(), "flight removed with its bookings");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Bookings
    // ------------------------------------------------------------------

    /// Books a seat. Validates everything up front, then reserves the
    /// seat, constructs the booking as confirmed (COMPLETED) and wires
    /// the back references.
    pub fn create_booking(
        &mut self,
        request: BookingRequest,
        now: DateTime<Utc>,
    ) -> Result<BookingId, LedgerError> {
        let seat_number = normalize_seat(&request.seat_number);
        if seat_number.is_empty() {
            return Err(LedgerError::Validation("seat number must not be empty".to_string()));
        }

        let customer = self
            .customers
            .get(&request.customer_id)
            .ok_or(LedgerError::CustomerNotFound(request.customer_id))?;
        let flight = self
            .flights
            .get(&request.flight_id)
            .ok_or(LedgerError::FlightNotFound(request.flight_id))?;

        if flight.has_departed(now) {
            return Err(LedgerError::FlightDeparted(request.flight_id));
        }
        if self.find_live_booking(request.customer_id, request.flight_id).is_some() {
            return Err(LedgerError::DuplicateBooking {
                customer_id: request.customer_id,
                flight_id: request.flight_id,
            });
        }
        if flight.inventory().available(request.seat_class) == 0 {
            return Err(LedgerError::Inventory(InventoryError::NoCapacity {
                class: request.seat_class,
            }));
        }
        if !flight.inventory().is_seat_free(request.seat_class, &seat_number) {
            return Err(LedgerError::Inventory(InventoryError::SeatTaken {
                class: request.seat_class,
                seat: seat_number,
            }));
        }

        let profile = CustomerProfile {
            age: customer.age,
            disabled: customer.disabled,
            has_booking_for_flight: false,
        };
        let discount = self
            .pricing
            .discount_for(&profile, request.manual_discount_percent)?;
        let pet_charge = self.pricing.pet_charge(request.pet_type);
        let base = self.pricing.base_price(flight, request.seat_class);
        let price = self.pricing.final_price(base, discount.percent, pet_charge);

        let id = self.next_booking_id;
        let mut booking = Booking::new(
            id,
            request.customer_id,
            request.flight_id,
            now.date_naive(),
            request.seat_class,
            seat_number.clone(),
            price,
            discount.percent,
            discount.manual,
            request.pet_type,
            pet_charge,
        );
        // Bookings are confirmed at creation.
        booking.complete()?;

        // Validation is done; mutations below cannot fail.
        let flight = self
            .flights
            .get_mut(&request.flight_id)
            .ok_or(LedgerError::FlightNotFound(request.flight_id))?;
        flight.inventory_mut().reserve(request.seat_class, &seat_number)?;
        flight.attach_booking(id);
        if let Some(customer) = self.customers.get_mut(&request.customer_id) {
            customer.attach_booking(id);
        }
        self.bookings.insert(id, booking);
        self.next_booking_id += 1;

        tracing::info!(
            booking_id = id,
            customer_id = request.customer_id,
            flight_id = request.flight_id,
            class = %request.seat_class,
            seat = %seat_number,
            price = price,
            "booking created"
        );
        Ok(id)
    }

    /// Cancels the customer's live booking on a flight: flips the status,
    /// releases the seat, detaches the back references, and keeps the
    /// CANCELLED record in the global collection. Returns the snapshot a
    /// later rebooking can be built from.
    pub fn cancel_booking(
        &mut self,
        customer_id: CustomerId,
        flight_id: FlightId,
    ) -> Result<CancelledBooking, LedgerError> {
        if !self.customers.contains_key(&customer_id) {
            return Err(LedgerError::CustomerNotFound(customer_id));
        }
        if !self.flights.contains_key(&flight_id) {
            return Err(LedgerError::FlightNotFound(flight_id));
        }
        let booking_id = self
            .find_live_booking(customer_id, flight_id)
            .ok_or(LedgerError::BookingForFlightNotFound {
                customer_id,
                flight_id,
            })?;

        let booking = self
            .bookings
            .get_mut(&booking_id)
            .ok_or(LedgerError::BookingNotFound(booking_id))?;
        booking.cancel()?;
        let snapshot = booking.snapshot();
        let (seat_class, seat_number) = (booking.seat_class, booking.seat_number.clone());

        if let Some(flight) = self.flights.get_mut(&flight_id) {
            flight.inventory_mut().release(seat_class, &seat_number);
            flight.detach_booking(booking_id);
        }
        if let Some(customer) = self.customers.get_mut(&customer_id) {
            customer.detach_booking(booking_id);
        }

        tracing::info!(booking_id, customer_id, flight_id, "booking cancelled");
        Ok(snapshot)
    }

    /// Creates a brand new booking from a cancelled one's snapshot,
    /// re-validating departure, capacity and seat availability exactly as
    /// at creation. The new booking keeps the old seat class, seat and
    /// pet data and costs the prior price plus the rebooking fee.
    pub fn rebook_cancelled(
        &mut self,
        customer_id: CustomerId,
        snapshot: &CancelledBooking,
        now: DateTime<Utc>,
    ) -> Result<BookingId, LedgerError> {
        if !self.customers.contains_key(&customer_id) {
            return Err(LedgerError::CustomerNotFound(customer_id));
        }
        let flight = self
            .flights
            .get(&snapshot.flight_id)
            .ok_or(LedgerError::FlightNotFound(snapshot.flight_id))?;

        if flight.has_departed(now) {
            return Err(LedgerError::FlightDeparted(snapshot.flight_id));
        }
        if self.find_live_booking(customer_id, snapshot.flight_id).is_some() {
            return Err(LedgerError::DuplicateBooking {
                customer_id,
                flight_id: snapshot.flight_id,
            });
        }
        if flight.inventory().available(snapshot.seat_class) == 0 {
            return Err(LedgerError::Inventory(InventoryError::NoCapacity {
                class: snapshot.seat_class,
            }));
        }
        if !flight.inventory().is_seat_free(snapshot.seat_class, &snapshot.seat_number) {
            return Err(LedgerError::Inventory(InventoryError::SeatTaken {
                class: snapshot.seat_class,
                seat: snapshot.seat_number.clone(),
            }));
        }

        let id = self.next_booking_id;
        let mut booking = Booking::new(
            id,
            customer_id,
            snapshot.flight_id,
            now.date_naive(),
            snapshot.seat_class,
            normalize_seat(&snapshot.seat_number),
            snapshot.price_cents + REBOOKING_FEE_CENTS,
            snapshot.discount_percent,
            snapshot.manual_discount,
            snapshot.pet_type,
            snapshot.pet_charge_cents,
        );
        booking.complete()?;

        let flight = self
            .flights
            .get_mut(&snapshot.flight_id)
            .ok_or(LedgerError::FlightNotFound(snapshot.flight_id))?;
        flight
            .inventory_mut()
            .reserve(snapshot.seat_class, &snapshot.seat_number)?;
        flight.attach_booking(id);
        if let Some(customer) = self.customers.get_mut(&customer_id) {
            customer.attach_booking(id);
        }
        self.bookings.insert(id, booking);
        self.next_booking_id += 1;

        tracing::info!(
            booking_id = id,
            customer_id,
            flight_id = snapshot.flight_id,
            "cancelled booking rebooked"
        );
        Ok(id)
    }

    pub fn booking(&self, id: BookingId) -> Result<&Booking, LedgerError> {
        self.bookings.get(&id).ok_or(LedgerError::BookingNotFound(id))
    }

    /// All bookings, ascending by id.
    pub fn bookings(&self) -> impl Iterator<Item = &Booking> {
        self.bookings.values()
    }

    pub fn bookings_for_customer(
        &self,
        customer_id: CustomerId,
    ) -> Result<Vec<&Booking>, LedgerError> {
        let customer = self.customer(customer_id)?;
        Ok(customer
            .bookings()
            .iter()
            .filter_map(|id| self.bookings.get(id))
            .collect())
    }

    /// Id of the customer's live (ACTIVE or COMPLETED) booking for a
    /// flight, if any. At most one exists by invariant.
    pub fn find_live_booking(
        &self,
        customer_id: CustomerId,
        flight_id: FlightId,
    ) -> Option<BookingId> {
        let customer = self.customers.get(&customer_id)?;
        customer
            .bookings()
            .iter()
            .filter_map(|id| self.bookings.get(id))
            .find(|b| b.flight_id == flight_id && b.is_live())
            .map(|b| b.id)
    }

    /// Moves the booking-id counter past every id currently in the
    /// collection. Called after a bulk load so replayed ids are never
    /// handed out again.
    pub fn reseed_booking_ids(&mut self) {
        let next = self.bookings.keys().next_back().map_or(1, |id| id + 1);
        self.next_booking_id = self.next_booking_id.max(next);
    }

    pub fn next_booking_id(&self) -> BookingId {
        self.next_booking_id
    }

    /// Counts of everything the ledger owns, plus revenue across live
    /// bookings.
    pub fn summary(&self) -> serde_json::Value {
        let revenue_cents: Cents = self
            .bookings
            .values()
            .filter(|b| b.is_live())
            .map(|b| b.price_cents)
            .sum();
        serde_json::json!({
            "customers": self.customers.len(),
            "flights": self.flights.len(),
            "bookings": self.bookings.len(),
            "revenue_cents": revenue_cents,
            "revenue": aerobook_core::money::format_cents(revenue_cents),
        })
    }
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new()
    }
}

impl CustomerDirectory for Ledger {
    fn profile(&self, customer_id: CustomerId, flight_id: FlightId) -> Option<CustomerProfile> {
        let customer = self.customers.get(&customer_id)?;
        Some(CustomerProfile {
            age: customer.age,
            disabled: customer.disabled,
            has_booking_for_flight: self.find_live_booking(customer_id, flight_id).is_some(),
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("Customer with ID {0} not found")]
    CustomerNotFound(CustomerId),

    #[error("Flight with ID {0} not found")]
    FlightNotFound(FlightId),

    #[error("Booking with ID {0} not found")]
    BookingNotFound(BookingId),

    #[error("No booking found for customer {customer_id} on flight {flight_id}")]
    BookingForFlightNotFound {
        customer_id: CustomerId,
        flight_id: FlightId,
    },

    #[error("Customer {customer_id} already has a booking for flight {flight_id}")]
    DuplicateBooking {
        customer_id: CustomerId,
        flight_id: FlightId,
    },

    #[error("Customer with passport {0} already exists")]
    DuplicatePassport(String),

    #[error("Customer with ID {0} already exists")]
    DuplicateCustomerId(CustomerId),

    #[error("Flight with ID {0} already exists")]
    DuplicateFlightId(FlightId),

    #[error("Booking with ID {0} already exists")]
    DuplicateBookingId(BookingId),

    #[error("Flight {0} has already departed")]
    FlightDeparted(FlightId),

    #[error(transparent)]
    Inventory(#[from] InventoryError),

    #[error(transparent)]
    Pricing(#[from] PricingError),

    #[error(transparent)]
    Booking(#[from] BookingError),

    #[error("Validation failed: {0}")]
    Validation(String),
}
