use std::fs;
use std::io::Write as _;

use chrono::NaiveDate;

use aerobook_core::customer::{Customer, CustomerDetails};
use aerobook_ledger::Ledger;

use crate::codec::{read_lines, Fields, SEPARATOR};
use crate::{DataManager, StoreError};

/// Twelve `::`-separated fields per line: id, name, phone, age, address,
/// country, passport number, passport expiry, disabled flag, email,
/// date of birth, gender. An empty date of birth falls back to
/// 1900-01-01 for records predating the field.
pub struct CustomerFileRepository {
    path: String,
}

impl CustomerFileRepository {
    pub fn new(path: &str) -> Self {
        Self {
            path: path.to_string(),
        }
    }

    fn parse_line(&self, line_no: usize, line: &str) -> Result<Customer, StoreError> {
        let fields = Fields::split(&self.path, line_no, line, 12)?;

        let id = fields.parse(0, "customer id")?;
        let date_of_birth = if fields.raw(10).is_empty() {
            NaiveDate::from_ymd_opt(1900, 1, 1).unwrap_or_default()
        } else {
            fields.parse(10, "date of birth")?
        };

        Ok(Customer::new(
            id,
            CustomerDetails {
                name: fields.text(1),
                phone: fields.text(2),
                age: fields.parse(3, "age")?,
                address: fields.text(4),
                country: fields.text(5),
                passport_number: fields.text(6),
                passport_expiry: fields.parse(7, "passport expiry")?,
                disabled: fields.parse(8, "disabled flag")?,
                email: fields.text(9),
                date_of_birth,
                gender: fields.text(11),
            },
        ))
    }

    fn format_line(customer: &Customer) -> String {
        [
            customer.id.to_string(),
            customer.name.clone(),
            customer.phone.clone(),
            customer.age.to_string(),
            customer.address.clone(),
            customer.country.clone(),
            customer.passport_number.clone(),
            customer.passport_expiry.to_string(),
            customer.disabled.to_string(),
            customer.email.clone(),
            customer.date_of_birth.to_string(),
            customer.gender.clone(),
        ]
        .join(SEPARATOR)
    }
}

impl DataManager for CustomerFileRepository {
    fn load(&self, ledger: &mut Ledger) -> Result<(), StoreError> {
        for (idx, line) in read_lines(&self.path)?.iter().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let customer = self.parse_line(idx + 1, line)?;
            ledger.insert_customer(customer)?;
        }
        Ok(())
    }

    fn store(&self, ledger: &Ledger) -> Result<(), StoreError> {
        let mut customers: Vec<&Customer> = ledger.customers().collect();
        customers.sort_by_key(|c| c.id);

        let mut out = fs::File::create(&self.path)?;
        for customer in customers {
            writeln!(out, "{}", Self::format_line(customer))?;
        }
        Ok(())
    }
}
