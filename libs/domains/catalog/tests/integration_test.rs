//! Integration tests for the Catalog domain
//!
//! These tests use real PostgreSQL via testcontainers to ensure:
//! - Unique constraints are enforced and translated
//! - The write/update transaction commits or rolls back as one unit
//! - Lookup resolution works for ids, slugs, and titles
//! - Cascade delete removes child image rows

use domain_catalog::entity::product_image;
use domain_catalog::*;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use test_utils::{assertions::*, TestDatabase, TestDataBuilder};
use uuid::Uuid;

fn create_input(title: String, images: Vec<&str>) -> CreateProduct {
    CreateProduct {
        title,
        price: 29.99,
        description: Some("Integration test product".to_string()),
        slug: None,
        stock: 10,
        sizes: vec!["S".to_string(), "M".to_string()],
        gender: Gender::Unisex,
        tags: vec!["shirt".to_string()],
        images: images.into_iter().map(String::from).collect(),
    }
}

async fn stored_image_urls(db: &TestDatabase, product_id: Uuid) -> Vec<String> {
    let mut rows = product_image::Entity::find()
        .filter(product_image::Column::ProductId.eq(product_id))
        .all(&db.connection())
        .await
        .unwrap();
    rows.sort_by_key(|row| row.id);
    rows.into_iter().map(|row| row.url).collect()
}

// ============================================================================
// Repository Tests
// ============================================================================

#[tokio::test]
async fn test_create_product_with_images() {
    let db = TestDatabase::new().await;
    let repo = PgProductRepository::new(db.connection());
    let builder = TestDataBuilder::from_test_name("create_with_images");

    let input = create_input(
        builder.name("product", "main"),
        vec!["one.jpg", "two.jpg", "three.jpg"],
    );

    let created = repo.create(input.clone()).await.unwrap();

    // Returned object carries the URLs in the supplied order
    assert_eq!(created.title, input.title);
    assert_eq!(created.images, vec!["one.jpg", "two.jpg", "three.jpg"]);

    // Exactly N child rows reference the new product
    let stored = stored_image_urls(&db, created.id).await;
    assert_eq!(stored, vec!["one.jpg", "two.jpg", "three.jpg"]);

    // Reloading flattens the images the same way
    let retrieved = repo
        .get_by_term(&SearchTerm::Id(created.id))
        .await
        .unwrap();
    let retrieved = assert_some(retrieved, "product should exist");
    assert_uuid_eq(retrieved.id, created.id, "retrieved product id");
    assert_eq!(retrieved.images, vec!["one.jpg", "two.jpg", "three.jpg"]);
}

#[tokio::test]
async fn test_duplicate_title_is_a_client_error_and_persists_nothing() {
    let db = TestDatabase::new().await;
    let repo = PgProductRepository::new(db.connection());
    let builder = TestDataBuilder::from_test_name("duplicate_title");

    let title = builder.name("product", "duplicate");

    let mut first = create_input(title.clone(), vec![]);
    first.slug = Some(format!("{}-a", title));
    repo.create(first).await.unwrap();

    // Same title, different slug: the title constraint must trip
    let mut second = create_input(title.clone(), vec!["orphan.jpg"]);
    second.slug = Some(format!("{}-b", title));

    let result = repo.create(second).await;
    assert!(
        matches!(result, Err(ProductError::Duplicate(_))),
        "Expected Duplicate error, got {:?}",
        result
    );

    // Neither the second product nor its images survived
    let page = repo.list(Pagination::default()).await.unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(stored_image_urls(&db, page.records[0].id).await.len(), 0);
}

#[tokio::test]
async fn test_duplicate_slug_is_a_client_error() {
    let db = TestDatabase::new().await;
    let repo = PgProductRepository::new(db.connection());
    let builder = TestDataBuilder::from_test_name("duplicate_slug");

    let slug = builder.name("slug", "shared");

    let mut first = create_input(builder.name("product", "a"), vec![]);
    first.slug = Some(slug.clone());
    repo.create(first).await.unwrap();

    let mut second = create_input(builder.name("product", "b"), vec![]);
    second.slug = Some(slug);

    let result = repo.create(second).await;
    assert!(matches!(result, Err(ProductError::Duplicate(_))));
}

#[tokio::test]
async fn test_lookup_resolves_title_and_slug_case_insensitively() {
    let db = TestDatabase::new().await;
    let repo = PgProductRepository::new(db.connection());
    let builder = TestDataBuilder::from_test_name("lookup_casing");

    let title = builder.name("product", "lookup");
    let created = repo.create(create_input(title.clone(), vec![])).await.unwrap();

    let terms = [
        title.clone(),
        title.to_uppercase(),
        created.slug.clone(),
        created.slug.to_uppercase(),
    ];

    for term in terms {
        let found = repo
            .get_by_term(&SearchTerm::parse(&term))
            .await
            .unwrap()
            .unwrap_or_else(|| panic!("term '{}' should resolve", term));
        assert_uuid_eq(found.id, created.id, "resolved product id");
    }
}

#[tokio::test]
async fn test_update_replaces_image_set_wholesale() {
    let db = TestDatabase::new().await;
    let repo = PgProductRepository::new(db.connection());
    let builder = TestDataBuilder::from_test_name("update_images");

    let created = repo
        .create(create_input(
            builder.name("product", "update"),
            vec!["a.jpg", "b.jpg"],
        ))
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

    // Response reflects persisted state
    assert_eq!(updated.images, vec!["c.jpg"]);

    // Rows for a.jpg and b.jpg no longer exist
    let stored = stored_image_urls(&db, created.id).await;
    assert_eq!(stored, vec!["c.jpg"]);
}

#[tokio::test]
async fn test_update_rolls_back_image_replacement_when_save_fails() {
    let db = TestDatabase::new().await;
    let repo = PgProductRepository::new(db.connection());
    let builder = TestDataBuilder::from_test_name("update_rollback");

    let taken_title = builder.name("product", "taken");
    repo.create(create_input(taken_title.clone(), vec![]))
        .await
        .unwrap();

    let victim = repo
        .create(create_input(
            builder.name("product", "victim"),
            vec!["a.jpg", "b.jpg"],
        ))
        .await
        .unwrap();

    // The image delete+insert succeeds inside the transaction, then the
    // scalar save trips the unique title constraint
    let result = repo
        .update(
            victim.id,
            UpdateProduct {
                title: Some(taken_title),
                images: Some(vec!["c.jpg".to_string()]),
                ..Default::default()
            },
        )
        .await;

    assert!(
        matches!(result, Err(ProductError::Duplicate(_))),
        "Expected Duplicate error, got {:?}",
        result
    );

    // No partial image replacement survived the rollback
    let stored = stored_image_urls(&db, victim.id).await;
    assert_eq!(stored, vec!["a.jpg", "b.jpg"]);

    let reloaded = repo
        .get_by_term(&SearchTerm::Id(victim.id))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(reloaded.title, victim.title);
}

#[tokio::test]
async fn test_update_nonexistent_product_fails_not_found() {
    let db = TestDatabase::new().await;
    let repo = PgProductRepository::new(db.connection());

    let id = Uuid::new_v4();
    let result = repo
        .update(
            id,
            UpdateProduct {
                title: Some("anything".to_string()),
                ..Default::default()
            },
        )
        .await;

    assert!(matches!(result, Err(ProductError::NotFound(_))));
}

#[tokio::test]
async fn test_list_pagination_reports_full_total() {
    let db = TestDatabase::new().await;
    let repo = PgProductRepository::new(db.connection());
    let builder = TestDataBuilder::from_test_name("list_pagination");

    for i in 0..5 {
        repo.create(create_input(
            builder.name("product", &format!("p{}", i)),
            vec![],
        ))
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

    // Out-of-range offset yields an empty page, not an error
    let empty = repo
        .list(Pagination {
            limit: 2,
            offset: 10,
        })
        .await
        .unwrap();
    assert_eq!(empty.total, 5);
    assert!(empty.records.is_empty());
}

#[tokio::test]
async fn test_delete_cascades_to_images() {
    let db = TestDatabase::new().await;
    let repo = PgProductRepository::new(db.connection());
    let builder = TestDataBuilder::from_test_name("delete_cascade");

    let created = repo
        .create(create_input(
            builder.name("product", "doomed"),
            vec!["a.jpg", "b.jpg"],
        ))
        .await
        .unwrap();

    assert!(repo.delete(created.id).await.unwrap());

    let gone = repo.get_by_term(&SearchTerm::Id(created.id)).await.unwrap();
    assert!(gone.is_none(), "product should be deleted");

    assert_eq!(stored_image_urls(&db, created.id).await.len(), 0);

    // Second delete reports that nothing was removed
    assert!(!repo.delete(created.id).await.unwrap());
}

// ============================================================================
// Service Tests
// ============================================================================

#[tokio::test]
async fn test_service_not_found_embeds_search_term() {
    let db = TestDatabase::new().await;
    let service = ProductService::new(PgProductRepository::new(db.connection()));

    let missing_id = Uuid::new_v4();
    let result = service.get_product(&missing_id.to_string()).await;

    match result {
        Err(ProductError::NotFound(term)) => assert_eq!(term, missing_id.to_string()),
        other => panic!("Expected NotFound, got {:?}", other),
    }
}

#[tokio::test]
async fn test_service_delete_missing_product_is_not_found() {
    let db = TestDatabase::new().await;
    let service = ProductService::new(PgProductRepository::new(db.connection()));

    let result = service.delete_product(Uuid::new_v4()).await;
    assert!(matches!(result, Err(ProductError::NotFound(_))));
}

#[tokio::test]
async fn test_service_update_returns_reloaded_state() {
    let db = TestDatabase::new().await;
    let service = ProductService::new(PgProductRepository::new(db.connection()));
    let builder = TestDataBuilder::from_test_name("service_update_reload");

    let created = service
        .create_product(create_input(
            builder.name("product", "reload"),
            vec!["a.jpg"],
        ))
        .await
        .unwrap();

    let updated = service
        .update_product(
            created.id,
            UpdateProduct {
                price: Some(99.5),
                stock: Some(0),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.price, 99.5);
    assert_eq!(updated.stock, 0);
    // Untouched fields and images survive a scalar-only update
    assert_eq!(updated.title, created.title);
    assert_eq!(updated.images, vec!["a.jpg"]);
    assert!(updated.updated_at > created.updated_at);
}
