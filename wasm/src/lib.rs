//! WebAssembly module for the Pharmaceutical Distribution dashboard
//!
//! Provides client-side computation for:
//! - Stock and expiry alerts from the fetched medicine list
//! - Order status transitions, to enable or disable action buttons
//! - Stock coverage and order value previews
//! - Form validation before submission

use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use wasm_bindgen::prelude::*;

use shared::{compute_alerts, Medicine, OrderAction, OrderStatus, StockLedger};

/// Compute alerts as JSON from a JSON array of medicines.
/// `today` is an ISO date (`YYYY-MM-DD`).
#[wasm_bindgen]
pub fn compute_medicine_alerts(
    medicines_json: &str,
    today: &str,
    expiry_warning_days: i32,
) -> Result<String, JsValue> {
    alerts_json(medicines_json, today, expiry_warning_days as i64).map_err(js_error)
}

/// Today's date in the browser's local time zone, as `YYYY-MM-DD`
#[wasm_bindgen]
pub fn today_iso() -> String {
    let now = js_sys::Date::new_0();
    format!(
        "{:04}-{:02}-{:02}",
        now.get_full_year(),
        now.get_month() + 1,
        now.get_date()
    )
}

/// Status an order would move to, or an error if the action is not allowed
#[wasm_bindgen]
pub fn next_order_status(current: &str, action: &str) -> Result<String, JsValue> {
    next_status(current, action).map_err(js_error)
}

/// Whether `stock` covers an order of `quantity`
#[wasm_bindgen]
pub fn can_fulfill(stock: i32, quantity: i32) -> bool {
    quantity > 0 && StockLedger::new(stock).can_cover(quantity)
}

/// Stock left after approving an order, or `None` when it cannot be approved
#[wasm_bindgen]
pub fn stock_after_approval(stock: i32, quantity: i32) -> Option<i32> {
    let mut ledger = StockLedger::new(stock);
    ledger.withdraw(quantity).ok()
}

/// Order value as a decimal string (`unit_price` is a decimal string)
#[wasm_bindgen]
pub fn order_value(unit_price: &str, quantity: i32) -> Result<String, JsValue> {
    value_of(unit_price, quantity).map_err(js_error)
}

/// Validation message for a medicine's dates, or `None` if they are acceptable
#[wasm_bindgen]
pub fn validate_medicine_dates(manufacture_date: &str, expiry_date: &str) -> Option<String> {
    let parse = |s: &str| NaiveDate::parse_from_str(s, "%Y-%m-%d");
    match (parse(manufacture_date), parse(expiry_date)) {
        (Ok(manufacture), Ok(expiry)) => shared::validate_shelf_life(manufacture, expiry)
            .err()
            .map(str::to_string),
        _ => Some("Dates must be formatted as YYYY-MM-DD".to_string()),
    }
}

/// Validation message for a store phone number, or `None` if it is acceptable
#[wasm_bindgen]
pub fn validate_store_phone(phone: &str) -> Option<String> {
    shared::validate_phone(phone).err().map(str::to_string)
}

/// Validation message for a user email, or `None` if it is acceptable
#[wasm_bindgen]
pub fn validate_user_email(email: &str) -> Option<String> {
    shared::validate_email(email.trim()).err().map(str::to_string)
}

fn alerts_json(medicines_json: &str, today: &str, expiry_warning_days: i64) -> Result<String, String> {
    let medicines: Vec<Medicine> = serde_json::from_str(medicines_json)
        .map_err(|e| format!("Invalid medicines JSON: {}", e))?;
    let today = NaiveDate::parse_from_str(today, "%Y-%m-%d")
        .map_err(|e| format!("Invalid date '{}': {}", today, e))?;

    let alerts = compute_alerts(&medicines, today, expiry_warning_days);
    serde_json::to_string(&alerts).map_err(|e| e.to_string())
}

fn next_status(current: &str, action: &str) -> Result<String, String> {
    let current = OrderStatus::from_str(current)?;
    let action = match action {
        "approve" => OrderAction::Approve,
        "reject" => OrderAction::Reject,
        "deliver" => OrderAction::Deliver,
        other => return Err(format!("Unknown order action '{}'", other)),
    };

    current
        .apply(action)
        .map(|next| next.as_str().to_string())
        .map_err(|e| e.to_string())
}

fn value_of(unit_price: &str, quantity: i32) -> Result<String, String> {
    let price = Decimal::from_str(unit_price.trim())
        .map_err(|e| format!("Invalid price '{}': {}", unit_price, e))?;
    shared::line_total(price, quantity)
        .map(|total| total.to_string())
        .map_err(str::to_string)
}

fn js_error(message: String) -> JsValue {
    let value = JsValue::from_str(&message);
    web_sys::console::warn_1(&value);
    value
}
