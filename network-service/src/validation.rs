//! Field-level input checks applied before anything reaches the hierarchy.

use rust_decimal::Decimal;

use crate::errors::ServiceError;
use network_shared::{NewNode, NewProduct, NodeUpdate, ProductUpdate};

const MAX_NAME_LEN: usize = 255;
const MAX_EMAIL_LEN: usize = 254;
const MAX_COUNTRY_LEN: usize = 100;
const MAX_CITY_LEN: usize = 100;
const MAX_STREET_LEN: usize = 255;
const MAX_HOUSE_NUMBER_LEN: usize = 20;
const MAX_MODEL_LEN: usize = 100;

/// Debt holds at most 12 digits, two of them after the point.
const DEBT_INTEGER_DIGITS: u32 = 10;
/// Price holds at most 10 digits, two of them after the point.
const PRICE_INTEGER_DIGITS: u32 = 8;

fn text(field: &str, value: &str, max_len: usize) -> Result<(), ServiceError> {
    if value.trim().is_empty() {
        return Err(ServiceError::invalid(format!("{field} must not be blank")));
    }
    let len = value.chars().count();
    if len > max_len {
        return Err(ServiceError::invalid(format!(
            "{field} is {len} characters long, at most {max_len} allowed"
        )));
    }
    Ok(())
}

fn email(value: &str) -> Result<(), ServiceError> {
    text("email", value, MAX_EMAIL_LEN)?;
    let valid = match value.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !value.chars().any(char::is_whitespace)
        }
        None => false,
    };
    if valid {
        Ok(())
    } else {
        Err(ServiceError::invalid(format!("{value:?} is not a valid email address")))
    }
}

fn amount(field: &str, value: Decimal, integer_digits: u32) -> Result<(), ServiceError> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(ServiceError::invalid(format!("{field} must not be negative")));
    }
    if value.normalize().scale() > 2 {
        return Err(ServiceError::invalid(format!(
            "{field} allows at most 2 decimal places"
        )));
    }
    if value >= Decimal::from(10u64.pow(integer_digits)) {
        return Err(ServiceError::invalid(format!(
            "{field} allows at most {integer_digits} digits before the decimal point"
        )));
    }
    Ok(())
}

/// Check every field of a node about to be created.
pub fn new_node(node: &NewNode) -> Result<(), ServiceError> {
    text("name", &node.name, MAX_NAME_LEN)?;
    email(&node.email)?;
    text("country", &node.country, MAX_COUNTRY_LEN)?;
    text("city", &node.city, MAX_CITY_LEN)?;
    text("street", &node.street, MAX_STREET_LEN)?;
    text("house_number", &node.house_number, MAX_HOUSE_NUMBER_LEN)?;
    amount("debt", node.debt, DEBT_INTEGER_DIGITS)
}

/// Check the fields a node update sets.
pub fn node_update(update: &NodeUpdate) -> Result<(), ServiceError> {
    if let Some(name) = &update.name {
        text("name", name, MAX_NAME_LEN)?;
    }
    if let Some(value) = &update.email {
        email(value)?;
    }
    if let Some(country) = &update.country {
        text("country", country, MAX_COUNTRY_LEN)?;
    }
    if let Some(city) = &update.city {
        text("city", city, MAX_CITY_LEN)?;
    }
    if let Some(street) = &update.street {
        text("street", street, MAX_STREET_LEN)?;
    }
    if let Some(house_number) = &update.house_number {
        text("house_number", house_number, MAX_HOUSE_NUMBER_LEN)?;
    }
    Ok(())
}

/// Check every field of a product about to be created.
pub fn new_product(product: &NewProduct) -> Result<(), ServiceError> {
    text("name", &product.name, MAX_NAME_LEN)?;
    text("model", &product.model, MAX_MODEL_LEN)?;
    amount("price", product.price, PRICE_INTEGER_DIGITS)
}

/// Check the fields a product update sets.
pub fn product_update(update: &ProductUpdate) -> Result<(), ServiceError> {
    if let Some(name) = &update.name {
        text("name", name, MAX_NAME_LEN)?;
    }
    if let Some(model) = &update.model {
        text("model", model, MAX_MODEL_LEN)?;
    }
    if let Some(price) = update.price {
        amount("price", price, PRICE_INTEGER_DIGITS)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use network_shared::NodeType;
    use rust_decimal_macros::dec;

    fn valid_node() -> NewNode {
        NewNode::new("Plant", NodeType::Factory)
            .with_email("plant@example.com")
            .with_address("Germany", "Berlin", "Main st", "1")
    }

    #[test]
    fn test_accepts_complete_node() {
        assert!(new_node(&valid_node()).is_ok());
        assert!(new_node(&valid_node().with_debt(dec!(9999999999.99))).is_ok());
    }

    #[test]
    fn test_rejects_blank_and_long_fields() {
        let blank = NewNode {
            name: "  ".into(),
            ..valid_node()
        };
        assert!(matches!(new_node(&blank), Err(ServiceError::InvalidInput(_))));

        let long = NewNode {
            house_number: "1".repeat(21),
            ..valid_node()
        };
        assert!(new_node(&long).is_err());
    }

    #[test]
    fn test_rejects_bad_email() {
        for bad in ["plant", "@example.com", "plant@", "plant@example", "a b@example.com", "a@b@c.com"] {
            let node = valid_node().with_email(bad);
            assert!(new_node(&node).is_err(), "{bad} should be rejected");
        }
    }

    #[test]
    fn test_debt_bounds() {
        assert!(new_node(&valid_node().with_debt(dec!(-1))).is_err());
        assert!(new_node(&valid_node().with_debt(dec!(1.005))).is_err());
        assert!(new_node(&valid_node().with_debt(dec!(10000000000))).is_err());
        assert!(new_node(&valid_node().with_debt(dec!(1.500))).is_ok());
    }

    #[test]
    fn test_update_checks_only_present_fields() {
        assert!(node_update(&NodeUpdate::default()).is_ok());
        assert!(node_update(&NodeUpdate::default().with_email("nope")).is_err());
        assert!(node_update(&NodeUpdate::default().with_city("")).is_err());
    }

    #[test]
    fn test_product_price_bounds() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let product = NewProduct::new("Phone", "X1", date).with_price(dec!(99999999.99));
        assert!(new_product(&product).is_ok());

        let too_big = NewProduct::new("Phone", "X1", date).with_price(dec!(100000000));
        assert!(new_product(&too_big).is_err());

        let update = ProductUpdate {
            model: Some("M".repeat(101)),
            ..Default::default()
        };
        assert!(product_update(&update).is_err());
    }
}
