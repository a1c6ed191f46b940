//! Product catalog types.

use std::collections::BTreeSet;
use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An item in the catalog and the set of nodes where it is available.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    /// Model designator.
    pub model: String,
    pub release_date: NaiveDate,
    pub price: Decimal,
    /// Quantity in stock.
    pub quantity: u32,
    /// Nodes stocking this product.
    #[serde(default)]
    pub node_ids: BTreeSet<Uuid>,
}

impl Product {
    /// Whether the product is available at the given node.
    pub fn is_available_at(&self, node_id: &Uuid) -> bool {
        self.node_ids.contains(node_id)
    }

    /// Apply a partial update.
    pub fn apply(&mut self, update: &ProductUpdate) {
        if let Some(ref name) = update.name {
            self.name = name.clone();
        }
        if let Some(ref model) = update.model {
            self.model = model.clone();
        }
        if let Some(release_date) = update.release_date {
            self.release_date = release_date;
        }
        if let Some(price) = update.price {
            self.price = price.round_dp(2);
        }
        if let Some(quantity) = update.quantity {
            self.quantity = quantity;
        }
        if let Some(ref node_ids) = update.node_ids {
            self.node_ids = node_ids.clone();
        }
    }
}

impl fmt::Display for Product {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.name, self.model)
    }
}

/// Attributes for creating a product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewProduct {
    pub name: String,
    pub model: String,
    pub release_date: NaiveDate,
    #[serde(default)]
    pub price: Decimal,
    #[serde(default)]
    pub quantity: u32,
    #[serde(default)]
    pub node_ids: BTreeSet<Uuid>,
}

impl NewProduct {
    pub fn new(name: impl Into<String>, model: impl Into<String>, release_date: NaiveDate) -> Self {
        Self {
            name: name.into(),
            model: model.into(),
            release_date,
            price: Decimal::ZERO,
            quantity: 0,
            node_ids: BTreeSet::new(),
        }
    }

    pub fn with_price(mut self, price: Decimal) -> Self {
        self.price = price;
        self
    }

    pub fn with_quantity(mut self, quantity: u32) -> Self {
        self.quantity = quantity;
        self
    }

    pub fn with_nodes(mut self, node_ids: impl IntoIterator<Item = Uuid>) -> Self {
        self.node_ids = node_ids.into_iter().collect();
        self
    }

    /// Build the stored product with a fresh identifier.
    pub fn into_product(self) -> Product {
        Product {
            id: Uuid::new_v4(),
            name: self.name,
            model: self.model,
            release_date: self.release_date,
            price: self.price.round_dp(2),
            quantity: self.quantity,
            node_ids: self.node_ids,
        }
    }
}

/// Partial update of a product. `node_ids`, when present, replaces the set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub release_date: Option<NaiveDate>,
    #[serde(default)]
    pub price: Option<Decimal>,
    #[serde(default)]
    pub quantity: Option<u32>,
    #[serde(default)]
    pub node_ids: Option<BTreeSet<Uuid>>,
}

/// Reference to a node, as embedded in product views.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeRef {
    pub id: Uuid,
    pub name: String,
}

/// Product with its node set expanded into `{id, name}` references.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductView {
    pub id: Uuid,
    pub name: String,
    pub model: String,
    pub release_date: NaiveDate,
    pub price: Decimal,
    pub quantity: u32,
    pub nodes: Vec<NodeRef>,
}

impl ProductView {
    /// Build a view from a product and the references of its nodes.
    pub fn new(product: Product, nodes: Vec<NodeRef>) -> Self {
        Self {
            id: product.id,
            name: product.name,
            model: product.model,
            release_date: product.release_date,
            price: product.price,
            quantity: product.quantity,
            nodes,
        }
    }
}
