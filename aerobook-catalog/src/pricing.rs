use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use aerobook_core::money::Cents;
use aerobook_core::CustomerProfile;

use crate::flight::{Flight, SeatClass};

/// Pets that may accompany a passenger. Anything else is rejected when
/// parsing input, before it reaches the pricing engine.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PetType {
    Cat,
    Dog,
    Bird,
}

impl PetType {
    /// Parses an optional pet field; empty strings and "none" mean no pet.
    pub fn parse_optional(value: &str) -> Result<Option<PetType>, PricingError> {
        let trimmed = value.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("none") {
            return Ok(None);
        }
        trimmed.parse().map(Some)
    }
}

impl fmt::Display for PetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PetType::Cat => "cat",
            PetType::Dog => "dog",
            PetType::Bird => "bird",
        };
        f.write_str(s)
    }
}

impl FromStr for PetType {
    type Err = PricingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "cat" => Ok(PetType::Cat),
            "dog" => Ok(PetType::Dog),
            "bird" => Ok(PetType::Bird),
            other => Err(PricingError::UnknownPetType(other.to_string())),
        }
    }
}

/// A resolved discount: the percentage applied and whether it was a
/// manual override rather than the automatic age/disability rules.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Discount {
    pub percent: f64,
    pub manual: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricingConfig {
    pub child_age_max: u32,
    pub senior_age_min: u32,
    pub child_discount_percent: f64,
    pub senior_discount_percent: f64,
    pub disability_discount_percent: f64,
    pub pet_charge_cents: Cents,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            child_age_max: 12,
            senior_age_min: 60,
            child_discount_percent: 10.0,
            senior_discount_percent: 15.0,
            disability_discount_percent: 5.0,
            pet_charge_cents: 1_500,
        }
    }
}

/// Price computation for bookings.
///
/// Two distinct price functions exist on purpose: `dynamic_price` adds a
/// time-to-departure surcharge and is display-only; bookings are charged
/// from `base_price`.
pub struct PricingEngine {
    config: PricingConfig,
}

impl PricingEngine {
    pub fn new(config: PricingConfig) -> Self {
        Self { config }
    }

    /// The flat per-class price configured on the flight. This is the
    /// figure bookings are charged from.
    pub fn base_price(&self, flight: &Flight, class: SeatClass) -> Cents {
        flight.inventory().base_price_cents(class)
    }

    /// Display price with the time-to-departure surcharge applied:
    /// +25% once departure is due or past, +20% within a day, +10% within
    /// three days, otherwise the base price.
    pub fn dynamic_price(&self, flight: &Flight, class: SeatClass, now: DateTime<Utc>) -> Cents {
        let minutes_until_departure = (flight.departure - now).num_minutes();

        let surcharge_percent = if minutes_until_departure <= 0 {
            25.0
        } else if minutes_until_departure <= 24 * 60 {
            20.0
        } else if minutes_until_departure <= 3 * 24 * 60 {
            10.0
        } else {
            0.0
        };

        let base = self.base_price(flight, class);
        (base as f64 * (1.0 + surcharge_percent / 100.0)).round() as Cents
    }

    /// Resolves the discount for a customer.
    ///
    /// A manual override is used verbatim after range validation and
    /// flagged as manual. Otherwise the automatic rules apply: age 12 and
    /// under earns 10%, age 60 and over earns 15% (the brackets are
    /// mutually exclusive), plus 5% for disability. The automatic total
    /// is capped at 100% so a price can never go negative.
    pub fn discount_for(
        &self,
        profile: &CustomerProfile,
        manual_override: Option<f64>,
    ) -> Result<Discount, PricingError> {
        if let Some(percent) = manual_override {
            if !(0.0..=100.0).contains(&percent) {
                return Err(PricingError::InvalidDiscount(percent));
            }
            return Ok(Discount {
                percent,
                manual: true,
            });
        }

        let mut percent = 0.0;
        if profile.age <= self.config.child_age_max {
            percent += self.config.child_discount_percent;
        } else if profile.age >= self.config.senior_age_min {
            percent += self.config.senior_discount_percent;
        }
        if profile.disabled {
            percent += self.config.disability_discount_percent;
        }

        Ok(Discount {
            percent: percent.min(100.0),
            manual: false,
        })
    }

    /// Flat charge for an accompanying pet; zero when travelling without one.
    pub fn pet_charge(&self, pet: Option<PetType>) -> Cents {
        match pet {
            Some(_) => self.config.pet_charge_cents,
            None => 0,
        }
    }

    /// `base × (1 − discount/100) + pet charge`, rounded to the cent.
    /// Deterministic and never negative for valid discounts.
    pub fn final_price(&self, base: Cents, discount_percent: f64, pet_charge: Cents) -> Cents {
        let discounted = (base as f64 * (1.0 - discount_percent / 100.0)).round() as Cents;
        (discounted + pet_charge).max(0)
    }
}

impl Default for PricingEngine {
    fn default() -> Self {
        Self::new(PricingConfig::default())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PricingError {
    #[error("Invalid discount percentage: {0} (must be between 0 and 100)")]
    InvalidDiscount(f64),

    #[error("Unknown pet type: {0} (only cat, dog, or bird are allowed)")]
    UnknownPetType(String),
}
