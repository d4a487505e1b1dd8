//! Field-level rules for catalog payloads.
//!
//! Stateless checks plug into `#[validate(custom = "...")]`; the constructors
//! at the bottom build the errors for rules that need the database.

use rust_decimal::Decimal;
use std::borrow::Cow;
use validator::{ValidationError, ValidationErrors};

pub const PRICE_MINIMUM: &str = "Price must be greater than 1€";
pub const PRICE_MAX_DIGITS: &str = "Ensure that there are no more than 4 digits in total.";
pub const PRICE_MAX_DECIMAL_PLACES: &str = "Ensure that there are no more than 2 decimal places.";
pub const PRICE_MAX_WHOLE_DIGITS: &str =
    "Ensure that there are no more than 2 digits before the decimal point.";
pub const NAME_NOT_IN_DESCRIPTION: &str = "Name must be in description";
pub const CATEGORY_EXISTS: &str = "Category already exists";
pub const PRODUCT_MUST_BE_ACTIVE: &str = "The associated product must be active";
pub const CATEGORY_MUST_BE_ACTIVE: &str = "The associated category must be active";

const MAX_DIGITS: u32 = 4;
const DECIMAL_PLACES: u32 = 2;

fn error(code: &'static str, message: impl Into<Cow<'static, str>>) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(message.into());
    err
}

/// Price must be at least 1 and fit a `DECIMAL(4, 2)` column.
pub fn validate_price(price: &Decimal) -> Result<(), ValidationError> {
    if *price < Decimal::ONE {
        return Err(error("price_minimum", PRICE_MINIMUM));
    }

    let normalized = price.normalize();
    let decimals = normalized.scale();
    let significant = normalized.mantissa().unsigned_abs().to_string().len() as u32;
    let digits = significant.max(decimals);
    let whole_digits = digits - decimals;

    if digits > MAX_DIGITS {
        return Err(error("max_digits", PRICE_MAX_DIGITS));
    }
    if decimals > DECIMAL_PLACES {
        return Err(error("max_decimal_places", PRICE_MAX_DECIMAL_PLACES));
    }
    if whole_digits > MAX_DIGITS - DECIMAL_PLACES {
        return Err(error("max_whole_digits", PRICE_MAX_WHOLE_DIGITS));
    }
    Ok(())
}

/// The category description has to mention the category name verbatim.
pub fn check_name_in_description(name: &str, description: &str) -> Result<(), ValidationError> {
    if description.contains(name) {
        Ok(())
    } else {
        Err(error("name_in_description", NAME_NOT_IN_DESCRIPTION))
    }
}

pub fn category_exists() -> ValidationError {
    error("unique", CATEGORY_EXISTS)
}

pub fn product_inactive() -> ValidationError {
    error("inactive", PRODUCT_MUST_BE_ACTIVE)
}

pub fn category_inactive() -> ValidationError {
    error("inactive", CATEGORY_MUST_BE_ACTIVE)
}

pub fn does_not_exist(id: i32) -> ValidationError {
    error(
        "does_not_exist",
        format!("Invalid pk \"{id}\" - object does not exist."),
    )
}

/// Turns collected field errors into a result.
pub fn into_result(errors: ValidationErrors) -> Result<(), ValidationErrors> {
    if errors.errors().is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
