//! Network node types.
//!
//! A network node is a participant in the supply hierarchy. Each node names at
//! most one supplier; the inverse relation (a node's clients) is derived by
//! querying for nodes that name it, and is never stored on the node itself.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

/// Classification of a network node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeType {
    /// A manufacturer. Always a root of the hierarchy.
    Factory,
    /// A retail network.
    Retail,
    /// An individual entrepreneur.
    Entrepreneur,
}

impl NodeType {
    /// All node types, in declaration order.
    pub const ALL: [NodeType; 3] = [NodeType::Factory, NodeType::Retail, NodeType::Entrepreneur];

    /// Stored code of the node type (`factory`, `retail`, `entrepreneur`).
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeType::Factory => "factory",
            NodeType::Retail => "retail",
            NodeType::Entrepreneur => "entrepreneur",
        }
    }

    /// Human readable label.
    pub fn label(&self) -> &'static str {
        match self {
            NodeType::Factory => "Factory",
            NodeType::Retail => "Retail Network",
            NodeType::Entrepreneur => "Individual Entrepreneur",
        }
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string does not name a node type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseNodeTypeError(pub String);

impl fmt::Display for ParseNodeTypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown node type '{}', expected one of: factory, retail, entrepreneur",
            self.0
        )
    }
}

impl std::error::Error for ParseNodeTypeError {}

impl FromStr for NodeType {
    type Err = ParseNodeTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "factory" => Ok(NodeType::Factory),
            "retail" => Ok(NodeType::Retail),
            "entrepreneur" => Ok(NodeType::Entrepreneur),
            other => Err(ParseNodeTypeError(other.to_string())),
        }
    }
}

/// A participant in the supply hierarchy.
///
/// `level` is owned by the hierarchy subsystem: it always equals the number of
/// supplier hops from this node to a root. Nothing outside that subsystem
/// should assign it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkNode {
    /// Unique identifier assigned at creation.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// Contact email.
    pub email: String,
    /// Country of the node's address.
    pub country: String,
    /// City of the node's address.
    pub city: String,
    /// Street of the node's address.
    pub street: String,
    /// House number of the node's address.
    pub house_number: String,
    /// The node's supplier, absent for roots.
    pub supplier_id: Option<Uuid>,
    /// Debt owed to the supplier.
    pub debt: Decimal,
    /// Node classification.
    pub node_type: NodeType,
    /// Creation timestamp, set once.
    pub created_at: DateTime<Utc>,
    /// Distance from the nearest root.
    pub level: u32,
}

impl NetworkNode {
    /// Whether this node has no supplier.
    pub fn is_root(&self) -> bool {
        self.supplier_id.is_none()
    }

    /// Whether this node is a factory.
    pub fn is_factory(&self) -> bool {
        self.node_type == NodeType::Factory
    }

    /// Short summary used when this node is shown as someone's supplier.
    pub fn summary(&self) -> SupplierSummary {
        SupplierSummary {
            id: self.id,
            name: self.name.clone(),
            city: self.city.clone(),
        }
    }

    /// Apply the non-hierarchy fields of a partial update.
    ///
    /// The supplier link and node type are applied too; callers are expected
    /// to have validated the resulting pair beforehand. `level` is untouched.
    pub fn apply(&mut self, update: &NodeUpdate) {
        if let Some(ref name) = update.name {
            self.name = name.clone();
        }
        if let Some(ref email) = update.email {
            self.email = email.clone();
        }
        if let Some(ref country) = update.country {
            self.country = country.clone();
        }
        if let Some(ref city) = update.city {
            self.city = city.clone();
        }
        if let Some(ref street) = update.street {
            self.street = street.clone();
        }
        if let Some(ref house_number) = update.house_number {
            self.house_number = house_number.clone();
        }
        if let Some(node_type) = update.node_type {
            self.node_type = node_type;
        }
        if let Some(supplier_id) = update.supplier_id {
            self.supplier_id = supplier_id;
        }
    }
}

impl fmt::Display for NetworkNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Compact view of a supplier, embedded in node detail responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupplierSummary {
    pub id: Uuid,
    pub name: String,
    pub city: String,
}

/// Attributes for creating a node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewNode {
    pub name: String,
    pub email: String,
    pub country: String,
    pub city: String,
    pub street: String,
    pub house_number: String,
    pub node_type: NodeType,
    #[serde(default)]
    pub supplier_id: Option<Uuid>,
    /// Opening debt. Only settable at creation time.
    #[serde(default)]
    pub debt: Decimal,
}

impl NewNode {
    /// Create a request with the given name and type and empty contact data.
    pub fn new(name: impl Into<String>, node_type: NodeType) -> Self {
        Self {
            name: name.into(),
            email: String::new(),
            country: String::new(),
            city: String::new(),
            street: String::new(),
            house_number: String::new(),
            node_type,
            supplier_id: None,
            debt: Decimal::ZERO,
        }
    }

    /// Set the contact email.
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = email.into();
        self
    }

    /// Set all address fields.
    pub fn with_address(
        mut self,
        country: impl Into<String>,
        city: impl Into<String>,
        street: impl Into<String>,
        house_number: impl Into<String>,
    ) -> Self {
        self.country = country.into();
        self.city = city.into();
        self.street = street.into();
        self.house_number = house_number.into();
        self
    }

    /// Set the supplier.
    pub fn with_supplier(mut self, supplier_id: Uuid) -> Self {
        self.supplier_id = Some(supplier_id);
        self
    }

    /// Set the opening debt.
    pub fn with_debt(mut self, debt: Decimal) -> Self {
        self.debt = debt;
        self
    }

    /// Build the stored node with a fresh identifier and timestamp.
    pub fn into_node(self, level: u32) -> NetworkNode {
        NetworkNode {
            id: Uuid::new_v4(),
            name: self.name,
            email: self.email,
            country: self.country,
            city: self.city,
            street: self.street,
            house_number: self.house_number,
            supplier_id: self.supplier_id,
            debt: self.debt.round_dp(2),
            node_type: self.node_type,
            created_at: Utc::now(),
            level,
        }
    }
}

/// Partial update of a node.
///
/// Fields left `None` are unchanged. `supplier_id` distinguishes "leave as is"
/// (`None`) from "clear the supplier" (`Some(None)`). There is deliberately no
/// debt field: debt only changes through the clear-debt operation.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct NodeUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub street: Option<String>,
    #[serde(default)]
    pub house_number: Option<String>,
    #[serde(default)]
    pub node_type: Option<NodeType>,
    #[serde(default, deserialize_with = "deserialize_present")]
    pub supplier_id: Option<Option<Uuid>>,
}

impl NodeUpdate {
    /// An update that only changes the supplier link.
    pub fn supplier(supplier_id: Option<Uuid>) -> Self {
        Self {
            supplier_id: Some(supplier_id),
            ..Default::default()
        }
    }

    /// Set the name to update.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the email to update.
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Set the city to update.
    pub fn with_city(mut self, city: impl Into<String>) -> Self {
        self.city = Some(city.into());
        self
    }

    /// Set the node type to update.
    pub fn with_node_type(mut self, node_type: NodeType) -> Self {
        self.node_type = Some(node_type);
        self
    }

    /// Check if any fields are set for update.
    pub fn has_updates(&self) -> bool {
        self.name.is_some()
            || self.email.is_some()
            || self.country.is_some()
            || self.city.is_some()
            || self.street.is_some()
            || self.house_number.is_some()
            || self.node_type.is_some()
            || self.supplier_id.is_some()
    }
}

/// Maps a present JSON field (including `null`) to `Some(..)`, so that an
/// absent field stays `None` through `#[serde(default)]`.
fn deserialize_present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}
