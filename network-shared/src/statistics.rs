//! Aggregate statistics over the network.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::node::NetworkNode;

/// Totals and breakdowns reported by the statistics endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NetworkStatistics {
    pub total_nodes: usize,
    /// Debt summed across all nodes.
    pub total_debt: Decimal,
    pub nodes_by_level: BTreeMap<u32, usize>,
    pub nodes_by_country: BTreeMap<String, usize>,
}

impl NetworkStatistics {
    /// Aggregate over a full listing of nodes.
    pub fn from_nodes<'a>(nodes: impl IntoIterator<Item = &'a NetworkNode>) -> Self {
        let mut stats = Self::default();
        for node in nodes {
            stats.total_nodes += 1;
            stats.total_debt += node.debt;
            *stats.nodes_by_level.entry(node.level).or_insert(0) += 1;
            *stats
                .nodes_by_country
                .entry(node.country.clone())
                .or_insert(0) += 1;
        }
        stats
    }
}
