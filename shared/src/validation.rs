//! Validation utilities shared by the API and the dashboard

use chrono::NaiveDate;
use rust_decimal::Decimal;

// ============================================================================
// Inventory Validations
// ============================================================================

/// Validate an order or supply quantity
pub fn validate_quantity(quantity: i32) -> Result<(), &'static str> {
    if quantity <= 0 {
        return Err("Quantity must be positive");
    }
    Ok(())
}

/// Largest price or unit cost a `NUMERIC(12,2)` column holds
pub const MAX_PRICE: Decimal = Decimal::from_parts(3_567_587_327, 232, 0, false, 2); // 999_999_999_999e-2

/// Largest order or supply total a `NUMERIC(14,2)` column holds
pub const MAX_LINE_TOTAL: Decimal = Decimal::from_parts(276_447_231, 23_283, 0, false, 2); // 99_999_999_999_999e-2

/// Validate a price or unit cost
pub fn validate_price(price: Decimal) -> Result<(), &'static str> {
    if price < Decimal::ZERO {
        return Err("Price cannot be negative");
    }
    if price > MAX_PRICE {
        return Err("Price exceeds the maximum of 9999999999.99");
    }
    Ok(())
}

/// Price times quantity, refused when it would not fit a stored total
pub fn line_total(unit_price: Decimal, quantity: i32) -> Result<Decimal, &'static str> {
    validate_price(unit_price)?;
    validate_quantity(quantity)?;
    unit_price
        .checked_mul(Decimal::from(quantity))
        .filter(|total| *total <= MAX_LINE_TOTAL)
        .ok_or("Total exceeds the maximum of 999999999999.99")
}

/// Validate that a medicine expires after it was manufactured
pub fn validate_shelf_life(
    manufacture_date: NaiveDate,
    expiry_date: NaiveDate,
) -> Result<(), &'static str> {
    if expiry_date <= manufacture_date {
        return Err("Expiry date must be after manufacture date");
    }
    Ok(())
}

/// Validate stock counters supplied when a medicine is registered
pub fn validate_stock_levels(stock_quantity: i32, minimum_stock: i32) -> Result<(), &'static str> {
    if stock_quantity < 0 {
        return Err("Stock quantity cannot be negative");
    }
    if minimum_stock < 0 {
        return Err("Minimum stock cannot be negative");
    }
    Ok(())
}

// ============================================================================
// General Validations
// ============================================================================

/// Validate email format (basic check)
pub fn validate_email(email: &str) -> Result<(), &'static str> {
    if email.contains('@') && email.contains('.') && email.len() >= 5 {
        Ok(())
    } else {
        Err("Invalid email format")
    }
}

/// Validate phone number format.
/// Accepts digits with optional leading `+`, spaces, dashes and parentheses.
pub fn validate_phone(phone: &str) -> Result<(), &'static str> {
    let allowed = |c: char| c.is_ascii_digit() || matches!(c, ' ' | '-' | '(' | ')');
    let body = phone.strip_prefix('+').unwrap_or(phone);
    if !body.chars().all(allowed) {
        return Err("Phone number contains invalid characters");
    }

    let digits = body.chars().filter(|c| c.is_ascii_digit()).count();
    if !(7..=15).contains(&digits) {
        return Err("Phone number must have between 7 and 15 digits");
    }
    Ok(())
}
