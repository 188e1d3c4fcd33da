pub mod customer;
pub mod directory;
pub mod money;

/// Identifier assigned to a customer by the ledger. Monotonically
/// increasing, reseeded after bulk load.
pub type CustomerId = u32;

/// Identifier assigned to a flight by the ledger.
pub type FlightId = u32;

/// Identifier assigned to a booking by the ledger. Never reused, even
/// after cancellation.
pub type BookingId = u32;

pub use customer::Customer;
pub use directory::{CustomerDirectory, CustomerProfile};
