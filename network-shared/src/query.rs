//! Listing filters and ordering.
//!
//! Exact-match filters mirror the listing parameters of the API; `search`
//! is a case-insensitive substring match over a fixed set of text fields.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::node::{NetworkNode, NodeType};
use crate::product::Product;

/// Filter for node listings. Empty filter matches everything.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeFilter {
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub node_type: Option<NodeType>,
    /// Searched in name and email.
    #[serde(default)]
    pub search: Option<String>,
}

impl NodeFilter {
    pub fn with_country(mut self, country: impl Into<String>) -> Self {
        self.country = Some(country.into());
        self
    }

    pub fn with_city(mut self, city: impl Into<String>) -> Self {
        self.city = Some(city.into());
        self
    }

    pub fn with_node_type(mut self, node_type: NodeType) -> Self {
        self.node_type = Some(node_type);
        self
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    /// Check whether a node passes every set criterion.
    pub fn matches(&self, node: &NetworkNode) -> bool {
        if let Some(ref country) = self.country {
            if &node.country != country {
                return false;
            }
        }
        if let Some(ref city) = self.city {
            if &node.city != city {
                return false;
            }
        }
        if let Some(node_type) = self.node_type {
            if node.node_type != node_type {
                return false;
            }
        }
        match self.search.as_deref().map(str::trim) {
            Some(term) if !term.is_empty() => {
                contains_ignore_case(&node.name, term) || contains_ignore_case(&node.email, term)
            }
            _ => true,
        }
    }
}

/// Filter for product listings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductFilter {
    #[serde(default)]
    pub release_date: Option<NaiveDate>,
    #[serde(default)]
    pub model: Option<String>,
    /// Searched in name and model.
    #[serde(default)]
    pub search: Option<String>,
}

impl ProductFilter {
    /// Check whether a product passes every set criterion.
    pub fn matches(&self, product: &Product) -> bool {
        if let Some(release_date) = self.release_date {
            if product.release_date != release_date {
                return false;
            }
        }
        if let Some(ref model) = self.model {
            if &product.model != model {
                return false;
            }
        }
        match self.search.as_deref().map(str::trim) {
            Some(term) if !term.is_empty() => {
                contains_ignore_case(&product.name, term) || contains_ignore_case(&product.model, term)
            }
            _ => true,
        }
    }
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Fields a product listing may be ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductSortField {
    Price,
    ReleaseDate,
    Name,
}

/// Ordering of a product listing, written as `price` or `-price`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductOrdering {
    pub field: ProductSortField,
    pub descending: bool,
}

impl ProductOrdering {
    pub fn ascending(field: ProductSortField) -> Self {
        Self {
            field,
            descending: false,
        }
    }

    pub fn descending(field: ProductSortField) -> Self {
        Self {
            field,
            descending: true,
        }
    }

    /// Compare two products under this ordering. Ties fall back to the id so
    /// listings are stable across pages.
    pub fn compare(&self, a: &Product, b: &Product) -> Ordering {
        let ord = match self.field {
            ProductSortField::Price => a.price.cmp(&b.price),
            ProductSortField::ReleaseDate => a.release_date.cmp(&b.release_date),
            ProductSortField::Name => a.name.cmp(&b.name),
        };
        let ord = if self.descending { ord.reverse() } else { ord };
        ord.then_with(|| a.id.cmp(&b.id))
    }
}

impl fmt::Display for ProductOrdering {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let field = match self.field {
            ProductSortField::Price => "price",
            ProductSortField::ReleaseDate => "release_date",
            ProductSortField::Name => "name",
        };
        if self.descending {
            write!(f, "-{}", field)
        } else {
            f.write_str(field)
        }
    }
}

impl FromStr for ProductOrdering {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (descending, name) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s),
        };
        let field = match name {
            "price" => ProductSortField::Price,
            "release_date" => ProductSortField::ReleaseDate,
            "name" => ProductSortField::Name,
            other => return Err(format!("cannot order products by '{}'", other)),
        };
        Ok(Self { field, descending })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::NewNode;
    use crate::product::NewProduct;
    use rust_decimal_macros::dec;

    fn node(name: &str, email: &str, country: &str, city: &str, node_type: NodeType) -> NetworkNode {
        NewNode::new(name, node_type)
            .with_email(email)
            .with_address(country, city, "Main", "1")
            .into_node(0)
    }

    #[test]
    fn test_empty_filter_matches_all() {
        let n = node("A", "a@example.com", "DE", "Berlin", NodeType::Factory);
        assert!(NodeFilter::default().matches(&n));
    }

    #[test]
    fn test_node_filter_exact_fields() {
        let n = node("A", "a@example.com", "DE", "Berlin", NodeType::Retail);

        assert!(NodeFilter::default().with_country("DE").matches(&n));
        assert!(!NodeFilter::default().with_country("de").matches(&n));
        assert!(NodeFilter::default()
            .with_city("Berlin")
            .with_node_type(NodeType::Retail)
            .matches(&n));
        assert!(!NodeFilter::default()
            .with_node_type(NodeType::Factory)
            .matches(&n));
    }

    #[test]
    fn test_node_search_name_or_email() {
        let n = node("Mega Store", "sales@shop.example", "DE", "Berlin", NodeType::Retail);

        assert!(NodeFilter::default().with_search("mega").matches(&n));
        assert!(NodeFilter::default().with_search("SHOP").matches(&n));
        assert!(!NodeFilter::default().with_search("berlin").matches(&n));
        assert!(NodeFilter::default().with_search("  ").matches(&n));
    }

    #[test]
    fn test_product_filter_and_search() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let product = NewProduct::new("Galaxy Phone", "TP-100", date).into_product();

        assert!(ProductFilter {
            model: Some("TP-100".into()),
            ..Default::default()
        }
        .matches(&product));
        assert!(ProductFilter {
            search: Some("tp-1".into()),
            ..Default::default()
        }
        .matches(&product));
        assert!(!ProductFilter {
            release_date: NaiveDate::from_ymd_opt(2023, 1, 1),
            ..Default::default()
        }
        .matches(&product));
    }

    #[test]
    fn test_parse_ordering() {
        let ordering: ProductOrdering = "-price".parse().unwrap();
        assert_eq!(ordering, ProductOrdering::descending(ProductSortField::Price));
        assert_eq!(ordering.to_string(), "-price");
        assert!("quantity".parse::<ProductOrdering>().is_err());
    }

    #[test]
    fn test_ordering_compare() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let cheap = NewProduct::new("B", "M", date).with_price(dec!(1)).into_product();
        let pricey = NewProduct::new("A", "M", date).with_price(dec!(5)).into_product();

        let asc = ProductOrdering::ascending(ProductSortField::Price);
        assert_eq!(asc.compare(&cheap, &pricey), Ordering::Less);
        let desc = ProductOrdering::descending(ProductSortField::Price);
        assert_eq!(desc.compare(&cheap, &pricey), Ordering::Greater);
        let by_name = ProductOrdering::ascending(ProductSortField::Name);
        assert_eq!(by_name.compare(&cheap, &pricey), Ordering::Greater);
    }
}
