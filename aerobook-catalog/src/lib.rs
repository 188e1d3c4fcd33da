pub mod flight;
pub mod inventory;
pub mod pricing;

pub use flight::{Flight, FlightDetails, FlightStatus, SeatClass};
pub use inventory::{InventoryError, SeatInventory};
pub use pricing::{Discount, PetType, PricingEngine};
