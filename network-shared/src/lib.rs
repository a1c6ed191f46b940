//! # Network Shared
//!
//! Shared types for the supply network service: network nodes and their
//! supplier links, products, listing filters, pagination and aggregate
//! statistics. These types carry no storage or hierarchy logic of their own.

pub mod node;
pub mod pagination;
pub mod product;
pub mod query;
pub mod statistics;

pub use node::{NetworkNode, NewNode, NodeType, NodeUpdate, ParseNodeTypeError, SupplierSummary};
pub use pagination::{Page, PageOutOfRange, PageRequest, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
pub use product::{NewProduct, NodeRef, Product, ProductUpdate, ProductView};
pub use query::{NodeFilter, ProductFilter, ProductOrdering, ProductSortField};
pub use statistics::NetworkStatistics;

/// Identifier of a network node.
pub type NodeId = uuid::Uuid;

/// Identifier of a product.
pub type ProductId = uuid::Uuid;
