use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use axum_helpers::{UuidPath, ValidatedJson};
use std::sync::Arc;
use utoipa::OpenApi;

use crate::error::ProductResult;
use crate::models::{CreateProduct, Pagination, Product, ProductPage, UpdateProduct};
use crate::repository::ProductRepository;
use crate::service::ProductService;

const TAG: &str = "products";

/// OpenAPI documentation for the Products API
#[derive(OpenApi)]
#[openapi(
    paths(
        list_products,
        create_product,
        get_product,
        update_product,
        delete_product,
    ),
    components(schemas(Product, ProductPage, CreateProduct, UpdateProduct, Pagination)),
    tags(
        (name = TAG, description = "Product catalog endpoints")
    )
)]
pub struct ApiDoc;

/// Create the product router with all HTTP endpoints
pub fn router<R: ProductRepository + 'static>(service: ProductService<R>) -> Router {
    let shared_service = Arc::new(service);

    Router::new()
        .route("/", get(list_products).post(create_product))
        .route(
            "/{term}",
            get(get_product)
                .patch(update_product)
                .delete(delete_product),
        )
        .with_state(shared_service)
}

/// List products with pagination
#[utoipa::path(
    get,
    path = "",
    tag = TAG,
    params(Pagination),
    responses(
        (status = 200, description = "One page of products plus the total count", body = ProductPage),
        (status = 500, description = "Internal server error")
    )
)]
async fn list_products<R: ProductRepository>(
    State(service): State<Arc<ProductService<R>>>,
    Query(pagination): Query<Pagination>,
) -> ProductResult<Json<ProductPage>> {
    let page = service.list_products(pagination).await?;
    Ok(Json(page))
}

/// Create a new product
#[utoipa::path(
    post,
    path = "",
    tag = TAG,
    request_body = CreateProduct,
    responses(
        (status = 201, description = "Product created successfully", body = Product),
        (status = 400, description = "Validation failure or duplicate title/slug"),
        (status = 500, description = "Internal server error")
    )
)]
async fn create_product<R: ProductRepository>(
    State(service): State<Arc<ProductService<R>>>,
    ValidatedJson(input): ValidatedJson<CreateProduct>,
) -> ProductResult<impl IntoResponse> {
    let product = service.create_product(input).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

/// Get a product by id, slug, or title
#[utoipa::path(
    get,
    path = "/{term}",
    tag = TAG,
    params(
        ("term" = String, Path, description = "Product id (UUID), slug, or title")
    ),
    responses(
        (status = 200, description = "Product found", body = Product),
        (status = 404, description = "No product matches the term"),
        (status = 500, description = "Internal server error")
    )
)]
async fn get_product<R: ProductRepository>(
    State(service): State<Arc<ProductService<R>>>,
    Path(term): Path<String>,
) -> ProductResult<Json<Product>> {
    let product = service.get_product(&term).await?;
    Ok(Json(product))
}

/// Update a product; a supplied image list replaces the stored set
#[utoipa::path(
    patch,
    path = "/{id}",
    tag = TAG,
    params(
        ("id" = Uuid, Path, description = "Product ID")
    ),
    request_body = UpdateProduct,
    responses(
        (status = 200, description = "Product updated successfully", body = Product),
        (status = 400, description = "Invalid UUID, validation failure, or duplicate title/slug"),
        (status = 404, description = "Product not found"),
        (status = 500, description = "Internal server error")
    )
)]
async fn update_product<R: ProductRepository>(
    State(service): State<Arc<ProductService<R>>>,
    UuidPath(id): UuidPath,
    ValidatedJson(input): ValidatedJson<UpdateProduct>,
) -> ProductResult<Json<Product>> {
    let product = service.update_product(id, input).await?;
    Ok(Json(product))
}

/// Delete a product and its images
#[utoipa::path(
    delete,
    path = "/{id}",
    tag = TAG,
    params(
        ("id" = Uuid, Path, description = "Product ID")
    ),
    responses(
        (status = 204, description = "Product deleted successfully"),
        (status = 400, description = "Invalid UUID"),
        (status = 404, description = "Product not found"),
        (status = 500, description = "Internal server error")
    )
)]
async fn delete_product<R: ProductRepository>(
    State(service): State<Arc<ProductService<R>>>,
    UuidPath(id): UuidPath,
) -> ProductResult<impl IntoResponse> {
    service.delete_product(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
