use crate::{CustomerId, FlightId};

/// The slice of customer data the pricing and booking rules need.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CustomerProfile {
    pub age: u32,
    pub disabled: bool,
    /// True if the customer already holds an ACTIVE or COMPLETED booking
    /// for the flight the profile was requested against.
    pub has_booking_for_flight: bool,
}

/// Read-only seam over whatever holds customer records.
///
/// The ledger implements this over its own maps; an external customer
/// directory could equally provide it.
pub trait CustomerDirectory {
    fn profile(&self, customer_id: CustomerId, flight_id: FlightId) -> Option<CustomerProfile>;
}
