use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use aerobook_core::money::{dollars, Cents};

use crate::flight::SeatClass;

/// Seat accounting for a single cabin class.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CabinState {
    capacity: u32,
    booked: u32,
    base_price_cents: Cents,
    /// Uppercased literal seat numbers currently held by live bookings.
    /// Invariant: `occupied.len() == booked as usize`.
    occupied: HashSet<String>,
}

impl CabinState {
    fn new(capacity: u32, base_price_cents: Cents) -> Self {
        Self {
            capacity,
            booked: 0,
            base_price_cents,
            occupied: HashSet::new(),
        }
    }

    fn available(&self) -> u32 {
        self.capacity.saturating_sub(self.booked)
    }
}

/// Authoritative seat inventory for one flight.
///
/// Owns per-class capacity, booked count, base price, and the set of
/// occupied seat numbers. Reservation and release keep the booked count
/// and the occupied set in step as one logical operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeatInventory {
    cabins: HashMap<SeatClass, CabinState>,
}

impl SeatInventory {
    /// Inventory with the standard cabin layout: 60 economy at $100,
    /// 25 business at $250, 15 first at $500.
    pub fn new() -> Self {
        let mut cabins = HashMap::new();
        cabins.insert(SeatClass::Economy, CabinState::new(60, dollars(100)));
        cabins.insert(SeatClass::Business, CabinState::new(25, dollars(250)));
        cabins.insert(SeatClass::First, CabinState::new(15, dollars(500)));
        Self { cabins }
    }

    pub fn capacity(&self, class: SeatClass) -> u32 {
        self.cabins.get(&class).map_or(0, |c| c.capacity)
    }

    /// Sets the capacity for a class. Shrinking below the current booked
    /// count is rejected; availability can never go negative.
    pub fn set_capacity(&mut self, class: SeatClass, capacity: u32) -> Result<(), InventoryError> {
        let cabin = self.cabin_mut(class);
        if capacity < cabin.booked {
            return Err(InventoryError::CapacityBelowBooked {
                class,
                requested: capacity,
                booked: cabin.booked,
            });
        }
        cabin.capacity = capacity;
        Ok(())
    }

    pub fn booked(&self, class: SeatClass) -> u32 {
        self.cabins.get(&class).map_or(0, |c| c.booked)
    }

    pub fn available(&self, class: SeatClass) -> u32 {
        self.cabins.get(&class).map_or(0, |c| c.available())
    }

    pub fn base_price_cents(&self, class: SeatClass) -> Cents {
        self.cabins.get(&class).map_or(0, |c| c.base_price_cents)
    }

    pub fn set_base_price_cents(
        &mut self,
        class: SeatClass,
        price_cents: Cents,
    ) -> Result<(), InventoryError> {
        if price_cents < 0 {
            return Err(InventoryError::NegativePrice { class, price_cents });
        }
        self.cabin_mut(class).base_price_cents = price_cents;
        Ok(())
    }

    /// Seat numbers are case-normalized before any comparison, so "12a"
    /// and "12A" name the same seat.
    pub fn is_seat_free(&self, class: SeatClass, seat_number: &str) -> bool {
        let seat = normalize_seat(seat_number);
        self.cabins
            .get(&class)
            .map_or(true, |c| !c.occupied.contains(&seat))
    }

    /// Takes a seat: adds it to the occupied set and increments the booked
    /// count as one logical operation.
    pub fn reserve(&mut self, class: SeatClass, seat_number: &str) -> Result<(), InventoryError> {
        let seat = normalize_seat(seat_number);
        let cabin = self.cabin_mut(class);

        if cabin.occupied.contains(&seat) {
            return Err(InventoryError::SeatTaken { class, seat });
        }
        if cabin.available() == 0 {
            return Err(InventoryError::NoCapacity { class });
        }

        cabin.occupied.insert(seat);
        cabin.booked += 1;
        Ok(())
    }

    /// Gives a seat back. Releasing a seat that was never reserved is
    /// tolerated with a warning; the booked count never goes below zero.
    pub fn release(&mut self, class: SeatClass, seat_number: &str) {
        let seat = normalize_seat(seat_number);
        let cabin = self.cabin_mut(class);

        if cabin.occupied.remove(&seat) {
            cabin.booked = cabin.booked.saturating_sub(1);
        } else {
            tracing::warn!(%class, seat, "release of a seat that was not reserved; ignoring");
        }
    }

    /// Occupied seat numbers for a class, unordered.
    pub fn occupied_seats(&self, class: SeatClass) -> impl Iterator<Item = &str> {
        self.cabins
            .get(&class)
            .into_iter()
            .flat_map(|c| c.occupied.iter().map(String::as_str))
    }

    fn cabin_mut(&mut self, class: SeatClass) -> &mut CabinState {
        self.cabins.entry(class).or_insert_with(|| CabinState::new(0, 0))
    }
}

impl Default for SeatInventory {
    fn default() -> Self {
        Self::new()
    }
}

pub fn normalize_seat(seat_number: &str) -> String {
    seat_number.trim().to_uppercase()
}

#[derive(Debug, thiserror::Error)]
pub enum InventoryError {
    #[error("Seat {seat} in {class} class is already taken")]
    SeatTaken { class: SeatClass, seat: String },

    #[error("No seats available in {class} class")]
    NoCapacity { class: SeatClass },

    #[error("Cannot shrink {class} capacity to {requested}: {booked} seats already booked")]
    CapacityBelowBooked {
        class: SeatClass,
        requested: u32,
        booked: u32,
    },

    #[error("Price for {class} class must be non-negative, got {price_cents} cents")]
    NegativePrice { class: SeatClass, price_cents: Cents },
}
