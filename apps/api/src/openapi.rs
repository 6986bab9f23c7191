use utoipa::OpenApi;

/// Aggregated OpenAPI documentation for the catalog API
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Catalog API",
        description = "Product catalog backend: products with owned image records"
    ),
    nest(
        (path = "/api/products", api = domain_catalog::handlers::ApiDoc)
    )
)]
pub struct ApiDoc;
