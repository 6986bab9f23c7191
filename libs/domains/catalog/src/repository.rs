use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{ProductError, ProductResult};
use crate::models::{
    slugify, CreateProduct, Pagination, Product, ProductPage, SearchTerm, UpdateProduct,
};

/// Repository trait for Product persistence
///
/// Implementations own the lookup resolution and the atomicity of
/// multi-record writes (product + image set).
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// Persist a new product together with its image records
    async fn create(&self, input: CreateProduct) -> ProductResult<Product>;

    /// Resolve a search term to a product, images included
    async fn get_by_term(&self, term: &SearchTerm) -> ProductResult<Option<Product>>;

    /// One page of products plus the total count
    async fn list(&self, pagination: Pagination) -> ProductResult<ProductPage>;

    /// Merge partial fields (and optionally replace the image set) as one
    /// atomic write, returning the persisted state
    async fn update(&self, id: Uuid, input: UpdateProduct) -> ProductResult<Product>;

    /// Delete a product by id; reports whether a row was removed
    async fn delete(&self, id: Uuid) -> ProductResult<bool>;
}

/// In-memory implementation of ProductRepository (for development/testing)
#[derive(Debug, Default, Clone)]
pub struct InMemoryProductRepository {
    products: Arc<RwLock<HashMap<Uuid, Product>>>,
}

impl InMemoryProductRepository {
    pub fn new() -> Self {
        Self {
            products: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

/// Mirror of the unique constraints enforced by the database schema.
/// Same-title-different-casing collides on the derived slug instead, exactly
/// as it would against the real constraints.
fn duplicate_of(
    products: &HashMap<Uuid, Product>,
    title: &str,
    slug: &str,
    except: Option<Uuid>,
) -> Option<String> {
    products
        .values()
        .filter(|p| Some(p.id) != except)
        .find_map(|p| {
            if p.title == title {
                Some(format!("Key (title)=({}) already exists", p.title))
            } else if p.slug == slug {
                Some(format!("Key (slug)=({}) already exists", p.slug))
            } else {
                None
            }
        })
}

#[async_trait]
impl ProductRepository for InMemoryProductRepository {
    async fn create(&self, input: CreateProduct) -> ProductResult<Product> {
        let mut products = self.products.write().await;

        let slug = input.normalized_slug();
        if let Some(detail) = duplicate_of(&products, &input.title, &slug, None) {
            return Err(ProductError::Duplicate(detail));
        }

        let product = Product::new(input);
        products.insert(product.id, product.clone());

        tracing::info!(product_id = %product.id, "Created product");
        Ok(product)
    }

    async fn get_by_term(&self, term: &SearchTerm) -> ProductResult<Option<Product>> {
        let products = self.products.read().await;

        let found = match term {
            SearchTerm::Id(id) => products.get(id),
            SearchTerm::Text(text) => {
                let slug = text.to_lowercase();
                products
                    .values()
                    .find(|p| p.title.eq_ignore_ascii_case(text) || p.slug == slug)
            }
        };

        Ok(found.cloned())
    }

    async fn list(&self, pagination: Pagination) -> ProductResult<ProductPage> {
        let products = self.products.read().await;

        let mut all: Vec<Product> = products.values().cloned().collect();
        // Insertion order (created_at, id as tiebreak)
        all.sort_by(|a, b| (a.created_at, a.id).cmp(&(b.created_at, b.id)));

        let total = all.len() as u64;
        let records: Vec<Product> = all
            .into_iter()
            .skip(pagination.offset as usize)
            .take(pagination.limit as usize)
            .collect();

        Ok(ProductPage { total, records })
    }

    async fn update(&self, id: Uuid, input: UpdateProduct) -> ProductResult<Product> {
        let mut products = self.products.write().await;

        let existing = products
            .get(&id)
            .ok_or_else(|| ProductError::NotFound(id.to_string()))?;

        let title = input.title.clone().unwrap_or_else(|| existing.title.clone());
        let slug = input
            .slug
            .as_deref()
            .map(slugify)
            .unwrap_or_else(|| existing.slug.clone());

        if let Some(detail) = duplicate_of(&products, &title, &slug, Some(id)) {
            return Err(ProductError::Duplicate(detail));
        }

        let product = products.get_mut(&id).expect("checked above");
        product.apply_update(input);
        let updated = product.clone();

        tracing::info!(product_id = %id, "Updated product");
        Ok(updated)
    }

    async fn delete(&self, id: Uuid) -> ProductResult<bool> {
        let mut products = self.products.write().await;

        if products.remove(&id).is_some() {
            tracing::info!(product_id = %id, "Deleted product");
            Ok(true)
        } else {
            Ok(false)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Gender;

    fn create_input(title: &str, images: Vec<&str>) -> CreateProduct {
        CreateProduct {
            title: title.to_string(),
            price: 10.0,
            description: None,
            slug: None,
            stock: 3,
            sizes: vec!["M".to_string()],
            gender: Gender::Unisex,
            tags: vec![],
            images: images.into_iter().map(String::from).collect(),
        }
    }

    #[tokio::test]
    async fn test_create_and_get_product() {
        let repo = InMemoryProductRepository::new();

        let created = repo
            .create(create_input("Test Shirt", vec!["a.jpg", "b.jpg"]))
            .await
            .unwrap();
        assert_eq!(created.title, "Test Shirt");
        assert_eq!(created.slug, "test_shirt");
        assert_eq!(created.images, vec!["a.jpg", "b.jpg"]);

        let fetched = repo
            .get_by_term(&SearchTerm::Id(created.id))
            .await
            .unwrap();
        assert_eq!(fetched.unwrap().id, created.id);
    }

    #[tokio::test]
    async fn test_get_by_title_and_slug_case_insensitive() {
        let repo = InMemoryProductRepository::new();
        let created = repo
            .create(create_input("Test Shirt", vec![]))
            .await
            .unwrap();

        for term in ["Test Shirt", "TEST SHIRT", "test_shirt", "TEST_SHIRT"] {
            let found = repo
                .get_by_term(&SearchTerm::parse(term))
                .await
                .unwrap()
                .unwrap_or_else(|| panic!("'{}' should resolve", term));
            assert_eq!(found.id, created.id);
        }
    }

    #[tokio::test]
    async fn test_duplicate_title_error() {
        let repo = InMemoryProductRepository::new();
        repo.create(create_input("Same Title", vec![])).await.unwrap();

        let result = repo.create(create_input("same title", vec![])).await;
        assert!(matches!(result, Err(ProductError::Duplicate(_))));
    }

    #[tokio::test]
    async fn test_list_pagination_reports_full_total() {
        let repo = InMemoryProductRepository::new();
        for i in 0..5 {
            repo.create(create_input(&format!("Product {}", i), vec![]))
                .await
                .unwrap();
        }

        let page = repo
            .list(Pagination {
                limit: 2,
                offset: 0,
            })
            .await
            .unwrap();
        assert_eq!(page.total, 5);
        assert_eq!(page.records.len(), 2);

        let out_of_range = repo
            .list(Pagination {
                limit: 2,
                offset: 10,
            })
            .await
            .unwrap();
        assert_eq!(out_of_range.total, 5);
        assert!(out_of_range.records.is_empty());
    }

    #[tokio::test]
    async fn test_update_replaces_image_set() {
        let repo = InMemoryProductRepository::new();
        let created = repo
            .create(create_input("Shirt", vec!["a.jpg", "b.jpg"]))
            .await
            .unwrap();

        let updated = repo
            .update(
                created.id,
                UpdateProduct {
                    images: Some(vec!["c.jpg".to_string()]),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.images, vec!["c.jpg"]);
    }

    #[tokio::test]
    async fn test_update_nonexistent_fails_not_found() {
        let repo = InMemoryProductRepository::new();
        let id = Uuid::new_v4();

        let result = repo.update(id, UpdateProduct::default()).await;
        assert!(matches!(result, Err(ProductError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_update_to_duplicate_title_fails() {
        let repo = InMemoryProductRepository::new();
        repo.create(create_input("First", vec![])).await.unwrap();
        let second = repo.create(create_input("Second", vec![])).await.unwrap();

        let result = repo
            .update(
                second.id,
                UpdateProduct {
                    title: Some("First".to_string()),
                    slug: Some("first".to_string()),
                    ..Default::default()
                },
            )
            .await;
        assert!(matches!(result, Err(ProductError::Duplicate(_))));
    }

    #[tokio::test]
    async fn test_delete_reports_whether_row_existed() {
        let repo = InMemoryProductRepository::new();
        let created = repo.create(create_input("Shirt", vec![])).await.unwrap();

        assert!(repo.delete(created.id).await.unwrap());
        assert!(!repo.delete(created.id).await.unwrap());
    }
}
