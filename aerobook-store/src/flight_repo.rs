use std::fs;
use std::io::Write as _;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use aerobook_catalog::flight::{Flight, FlightDetails, FlightStatus, SeatClass};
use aerobook_core::money::Cents;
use aerobook_ledger::Ledger;

use crate::codec::{read_lines, Fields, SEPARATOR};
use crate::{DataManager, StoreError};

/// Seventeen `::`-separated fields per line:
/// id, flight number, origin, destination, departure date,
/// economy/business/first capacity, economy/business/first price (cents),
/// status, departure time, arrival time, arrival date, airline,
/// international flag. Empty arrival time and date mean no arrival.
pub struct FlightFileRepository {
    path: String,
}

impl FlightFileRepository {
    pub fn new(path: &str) -> Self {
        Self {
            path: path.to_string(),
        }
    }

    fn parse_line(&self, line_no: usize, line: &str) -> Result<Flight, StoreError> {
        let fields = Fields::split(&self.path, line_no, line, 17)?;

        let id = fields.parse(0, "flight id")?;
        let departure_date: NaiveDate = fields.parse(4, "departure date")?;
        let departure_time: NaiveTime = fields.parse(12, "departure time")?;
        let departure = NaiveDateTime::new(departure_date, departure_time).and_utc();

        let arrival = if fields.raw(13).is_empty() && fields.raw(14).is_empty() {
            None
        } else {
            let time: NaiveTime = fields.parse(13, "arrival time")?;
            let date: NaiveDate = fields.parse(14, "arrival date")?;
            Some(NaiveDateTime::new(date, time).and_utc())
        };

        let mut flight = Flight::new(
            id,
            FlightDetails {
                flight_number: fields.text(1),
                airline: fields.text(15),
                origin: fields.text(2),
                destination: fields.text(3),
                departure,
                arrival,
                international: fields.parse(16, "international flag")?,
            },
        );
        flight.status = fields.parse::<FlightStatus>(11, "flight status")?;

        let capacities: [(SeatClass, usize); 3] = [
            (SeatClass::Economy, 5),
            (SeatClass::Business, 6),
            (SeatClass::First, 7),
        ];
        for (class, idx) in capacities {
            let capacity: u32 = fields.parse(idx, "capacity")?;
            flight
                .inventory_mut()
                .set_capacity(class, capacity)
                .map_err(|e| fields.error("capacity", e))?;
        }
        let prices: [(SeatClass, usize); 3] = [
            (SeatClass::Economy, 8),
            (SeatClass::Business, 9),
            (SeatClass::First, 10),
        ];
        for (class, idx) in prices {
            let price: Cents = fields.parse(idx, "price")?;
            flight
                .inventory_mut()
                .set_base_price_cents(class, price)
                .map_err(|e| fields.error("price", e))?;
        }

        Ok(flight)
    }

    fn format_line(flight: &Flight) -> String {
        let inventory = flight.inventory();
        let (arrival_time, arrival_date) = match flight.arrival {
            Some(arrival) => (arrival.time().to_string(), arrival.date_naive().to_string()),
            None => (String::new(), String::new()),
        };
        [
            flight.id.to_string(),
            flight.flight_number.clone(),
            flight.origin.clone(),
            flight.destination.clone(),
            flight.departure.date_naive().to_string(),
            inventory.capacity(SeatClass::Economy).to_string(),
            inventory.capacity(SeatClass::Business).to_string(),
            inventory.capacity(SeatClass::First).to_string(),
            inventory.base_price_cents(SeatClass::Economy).to_string(),
            inventory.base_price_cents(SeatClass::Business).to_string(),
            inventory.base_price_cents(SeatClass::First).to_string(),
            flight.status.to_string(),
            flight.departure.time().to_string(),
            arrival_time,
            arrival_date,
            flight.airline.clone(),
            flight.international.to_string(),
        ]
        .join(SEPARATOR)
    }
}

impl DataManager for FlightFileRepository {
    fn load(&self, ledger: &mut Ledger) -> Result<(), StoreError> {
        for (idx, line) in read_lines(&self.path)?.iter().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let flight = self.parse_line(idx + 1, line)?;
            ledger.insert_flight(flight)?;
        }
        Ok(())
    }

    fn store(&self, ledger: &Ledger) -> Result<(), StoreError> {
        let mut flights: Vec<&Flight> = ledger.flights().collect();
        flights.sort_by_key(|f| f.id);

        let mut out = fs::File::create(&self.path)?;
        for flight in flights {
            writeln!(out, "{}", Self::format_line(flight))?;
        }
        Ok(())
    }
}
