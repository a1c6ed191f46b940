//! Product catalogue operations.

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::{info, instrument};
use uuid::Uuid;

use crate::errors::ServiceError;
use crate::validation;
use network_hierarchy::HierarchyMutator;
use network_repository::{NodeRepository, ProductRepository};
use network_shared::{
    NewProduct, NodeRef, Page, PageRequest, Product, ProductFilter, ProductOrdering,
    ProductSortField, ProductUpdate, ProductView,
};

/// Expand a product's node set into `{id, name}` references.
///
/// Nodes removed since the product was last written are skipped.
pub(crate) async fn product_view(
    nodes: &dyn NodeRepository,
    product: Product,
) -> Result<ProductView, ServiceError> {
    let mut refs = Vec::with_capacity(product.node_ids.len());
    for id in &product.node_ids {
        if let Some(node) = nodes.get_node(id).await? {
            refs.push(NodeRef {
                id: node.id,
                name: node.name,
            });
        }
    }
    Ok(ProductView::new(product, refs))
}

/// CRUD and listing over products.
///
/// Writes hold the shared side of the hierarchy gate. Node deletion removes
/// product links under the exclusive side, so a product write never links a
/// node that is being deleted.
pub struct ProductService {
    products: Arc<dyn ProductRepository>,
    mutator: Arc<HierarchyMutator>,
    max_page_size: usize,
}

impl ProductService {
    /// Create a new product service.
    pub fn new(
        products: Arc<dyn ProductRepository>,
        mutator: Arc<HierarchyMutator>,
        max_page_size: usize,
    ) -> Self {
        Self {
            products,
            mutator,
            max_page_size,
        }
    }

    fn nodes(&self) -> &dyn NodeRepository {
        self.mutator.repository().as_ref()
    }

    async fn ensure_nodes_exist(&self, ids: &BTreeSet<Uuid>) -> Result<(), ServiceError> {
        let mut missing = Vec::new();
        for id in ids {
            if self.nodes().get_node(id).await?.is_none() {
                missing.push(id.to_string());
            }
        }
        if missing.is_empty() {
            Ok(())
        } else {
            Err(ServiceError::not_found(format!(
                "network nodes {}",
                missing.join(", ")
            )))
        }
    }

    /// Create a product available at the given nodes.
    #[instrument(skip(self, new), fields(name = %new.name, model = %new.model))]
    pub async fn create(&self, new: NewProduct) -> Result<ProductView, ServiceError> {
        validation::new_product(&new)?;
        let _gate = self.mutator.read_guard().await;
        self.ensure_nodes_exist(&new.node_ids).await?;

        let product = new.into_product();
        self.products.save_product(&product).await?;
        info!(product_id = %product.id, nodes = product.node_ids.len(), "Created product");

        product_view(self.nodes(), product).await
    }

    /// Fetch one product with its node references.
    pub async fn get(&self, id: Uuid) -> Result<ProductView, ServiceError> {
        let _gate = self.mutator.read_guard().await;
        let product = self.load(&id).await?;
        product_view(self.nodes(), product).await
    }

    /// Apply a partial update. A present `node_ids` replaces the node set.
    #[instrument(skip(self, update))]
    pub async fn update(&self, id: Uuid, update: ProductUpdate) -> Result<ProductView, ServiceError> {
        validation::product_update(&update)?;
        let _gate = self.mutator.read_guard().await;
        let mut product = self.load(&id).await?;
        if let Some(ref node_ids) = update.node_ids {
            self.ensure_nodes_exist(node_ids).await?;
        }

        product.apply(&update);
        self.products.save_product(&product).await?;
        info!(product_id = %product.id, "Updated product");

        product_view(self.nodes(), product).await
    }

    /// Remove a product.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: Uuid) -> Result<(), ServiceError> {
        if !self.products.delete_product(&id).await? {
            return Err(ServiceError::not_found(format!("product {}", id)));
        }
        info!(product_id = %id, "Deleted product");
        Ok(())
    }

    /// List products matching `filter`, ordered by `ordering` (by name when
    /// absent), one page at a time.
    pub async fn list(
        &self,
        filter: &ProductFilter,
        ordering: Option<ProductOrdering>,
        page: PageRequest,
    ) -> Result<Page<ProductView>, ServiceError> {
        let _gate = self.mutator.read_guard().await;
        let ordering = ordering.unwrap_or(ProductOrdering::ascending(ProductSortField::Name));

        let mut matching: Vec<Product> = self
            .products
            .list_products()
            .await?
            .into_iter()
            .filter(|p| filter.matches(p))
            .collect();
        matching.sort_by(|a, b| ordering.compare(a, b));

        let page = Page::paginate(matching, page, self.max_page_size)?;
        let mut views = Vec::with_capacity(page.results.len());
        let Page {
            count,
            page: number,
            page_size,
            has_next,
            has_previous,
            results,
        } = page;
        for product in results {
            views.push(product_view(self.nodes(), product).await?);
        }

        Ok(Page {
            count,
            page: number,
            page_size,
            has_next,
            has_previous,
            results: views,
        })
    }

    async fn load(&self, id: &Uuid) -> Result<Product, ServiceError> {
        self.products
            .get_product(id)
            .await?
            .ok_or_else(|| ServiceError::not_found(format!("product {}", id)))
    }
}
