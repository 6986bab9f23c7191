//! Product Service - Business logic layer

use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;
use validator::Validate;

use crate::error::{ProductError, ProductResult};
use crate::models::{CreateProduct, Pagination, Product, ProductPage, SearchTerm, UpdateProduct};
use crate::repository::ProductRepository;

/// Product service providing the catalog operations
///
/// The service layer handles validation and lookup resolution, and
/// orchestrates repository operations.
pub struct ProductService<R: ProductRepository> {
    repository: Arc<R>,
}

impl<R: ProductRepository> ProductService<R> {
    /// Create a new ProductService with the given repository
    pub fn new(repository: R) -> Self {
        Self {
            repository: Arc::new(repository),
        }
    }

    /// Create a new product with its image records
    #[instrument(skip(self, input), fields(product_title = %input.title))]
    pub async fn create_product(&self, input: CreateProduct) -> ProductResult<Product> {
        input
            .validate()
            .map_err(|e| ProductError::Validation(e.to_string()))?;

        self.repository.create(input).await
    }

    /// List products with pagination
    #[instrument(skip(self))]
    pub async fn list_products(&self, pagination: Pagination) -> ProductResult<ProductPage> {
        self.repository.list(pagination).await
    }

    /// Get a product by id, slug, or title
    #[instrument(skip(self))]
    pub async fn get_product(&self, term: &str) -> ProductResult<Product> {
        let search = SearchTerm::parse(term);
        self.repository
            .get_by_term(&search)
            .await?
            .ok_or_else(|| ProductError::NotFound(term.to_string()))
    }

    /// Update a product, optionally replacing its image set
    #[instrument(skip(self, input))]
    pub async fn update_product(&self, id: Uuid, input: UpdateProduct) -> ProductResult<Product> {
        input
            .validate()
            .map_err(|e| ProductError::Validation(e.to_string()))?;

        self.repository.update(id, input).await
    }

    /// Delete a product (and, by cascade, its images)
    #[instrument(skip(self))]
    pub async fn delete_product(&self, id: Uuid) -> ProductResult<()> {
        if !self.repository.delete(id).await? {
            return Err(ProductError::NotFound(id.to_string()));
        }
        Ok(())
    }
}

impl<R: ProductRepository> Clone for ProductService<R> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
        }
    }
}
