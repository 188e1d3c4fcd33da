pub mod booking;
pub mod changes;
pub mod ledger;
pub mod records;

pub use booking::{Booking, BookingError, BookingStatus, CancelledBooking};
pub use changes::{BookingUpdate, ChangeHandler, PetUpdate, UPDATE_FEE_CENTS};
pub use ledger::{BookingRequest, Ledger, LedgerError, REBOOKING_FEE_CENTS};
pub use records::BookingRecord;
