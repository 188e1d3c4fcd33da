pub mod app_config;
pub mod booking_repo;
pub mod codec;
pub mod customer_repo;
pub mod flight_repo;

use aerobook_ledger::{Ledger, LedgerError};

pub use app_config::Config;
pub use booking_repo::BookingFileRepository;
pub use customer_repo::CustomerFileRepository;
pub use flight_repo::FlightFileRepository;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("{file} line {line}: {message}")]
    Parse {
        file: String,
        line: usize,
        message: String,
    },

    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

/// One persisted slice of the system (flights, customers or bookings).
pub trait DataManager {
    fn load(&self, ledger: &mut Ledger) -> Result<(), StoreError>;
    fn store(&self, ledger: &Ledger) -> Result<(), StoreError>;
}

/// Orchestrates the per-file repositories. Load order matters: bookings
/// reference customers and flights, so those are replayed first.
pub struct FileStore {
    managers: Vec<Box<dyn DataManager>>,
}

impl FileStore {
    pub fn new(config: &Config) -> Self {
        Self {
            managers: vec![
                Box::new(FlightFileRepository::new(&config.data.flights_file)),
                Box::new(CustomerFileRepository::new(&config.data.customers_file)),
                Box::new(BookingFileRepository::new(&config.data.bookings_file)),
            ],
        }
    }

    /// Rebuilds a ledger from the data files. Seat occupancy and id
    /// counters come out re-derived from the live booking records.
    pub fn load(&self) -> Result<Ledger, StoreError> {
        let mut ledger = Ledger::new();
        for manager in &self.managers {
            manager.load(&mut ledger)?;
        }
        ledger.reseed_booking_ids();
        tracing::info!(summary = %ledger.summary(), "ledger loaded from data files");
        Ok(ledger)
    }

    /// Writes the full system state back to the data files.
    pub fn store(&self, ledger: &Ledger) -> Result<(), StoreError> {
        for manager in &self.managers {
            manager.store(ledger)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aerobook_catalog::flight::{FlightDetails, SeatClass};
    use aerobook_core::customer::CustomerDetails;
    use aerobook_ledger::BookingRequest;
    use crate::app_config::DataConfig;
    use chrono::{Duration, NaiveDate, Utc};

    fn config_in(dir: &std::path::Path) -> Config {
        Config {
            data: DataConfig {
                flights_file: dir.join("flights.txt").to_string_lossy().into_owned(),
                customers_file: dir.join("customers.txt").to_string_lossy().into_owned(),
                bookings_file: dir.join("bookings.txt").to_string_lossy().into_owned(),
            },
        }
    }

    #[test]
    fn test_full_system_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(&config_in(dir.path()));

        let now = Utc::now();
        let mut ledger = Ledger::new();
        let customer_id = ledger
            .register_customer(CustomerDetails {
                name: "Maya Lindqvist".to_string(),
                phone: "0700 900123".to_string(),
                age: 64,
                address: "3 Kungsgatan".to_string(),
                country: "Sweden".to_string(),
                passport_number: "SE998877".to_string(),
                passport_expiry: NaiveDate::from_ymd_opt(2031, 2, 28).unwrap(),
                disabled: true,
                email: "maya@example.com".to_string(),
                date_of_birth: NaiveDate::from_ymd_opt(1961, 8, 10).unwrap(),
                gender: "F".to_string(),
            })
            .unwrap();
        let flight_id = ledger.add_flight(FlightDetails {
            flight_number: "AB910".to_string(),
            airline: "Aerobook Air".to_string(),
            origin: "ARN".to_string(),
            destination: "LHR".to_string(),
            departure: now + Duration::days(21),
            arrival: Some(now + Duration::days(21) + Duration::hours(2)),
            international: true,
        });
        ledger.set_capacity(flight_id, SeatClass::First, 8).unwrap();
        ledger
            .create_booking(
                BookingRequest {
                    customer_id,
                    flight_id,
                    seat_class: SeatClass::Business,
                    seat_number: "2C".to_string(),
                    pet_type: Some(aerobook_catalog::pricing::PetType::Dog),
                    manual_discount_percent: None,
                },
                now,
            )
            .unwrap();
        ledger.cancel_booking(customer_id, flight_id).unwrap();
        ledger
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

        store.store(&ledger).unwrap();
        let reloaded = store.load().unwrap();

        let customer = reloaded.customer(customer_id).unwrap();
        assert_eq!(customer.name, "Maya Lindqvist");
        assert_eq!(customer.passport_number, "SE998877");
        assert!(customer.disabled);

        let flight = reloaded.flight(flight_id).unwrap();
        assert_eq!(flight.flight_number, "AB910");
        assert_eq!(flight.inventory().capacity(SeatClass::First), 8);
        assert_eq!(flight.inventory().booked(SeatClass::Economy), 1);
        assert!(flight.inventory().is_seat_free(SeatClass::Business, "2C"));
        assert!(!flight.inventory().is_seat_free(SeatClass::Economy, "12A"));

        assert_eq!(reloaded.bookings().count(), 2);
        assert_eq!(reloaded.next_booking_id(), 3);
    }

    #[test]
    fn test_missing_files_load_as_empty_system() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(&config_in(dir.path()));

        let ledger = store.load().unwrap();
        assert_eq!(ledger.customers().count(), 0);
        assert_eq!(ledger.flights().count(), 0);
        assert_eq!(ledger.bookings().count(), 0);
    }
}
