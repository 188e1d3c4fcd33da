/// All monetary amounts in the system are integer cents. `10_000` is
/// $100.00. Keeping amounts integral makes price computation
/// deterministic; formatting to two decimals happens only at display
/// time.
pub type Cents = i64;

/// Formats an amount of cents as a dollar string, e.g. `21500` -> `"$215.00"`.
pub fn format_cents(amount: Cents) -> String {
    let sign = if amount < 0 { "-" } else { "" };
    let abs = amount.unsigned_abs();
    format!("{}${}.{:02}", sign, abs / 100, abs % 100)
}

/// Converts whole dollars to cents. Convenient for fixed charges and tests.
pub const fn dollars(amount: i64) -> Cents {
    amount * 100
}
