use chrono::{DateTime, Utc};
use regex::Regex;
use sea_orm::{DeriveActiveEnum, EnumIter};
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use strum::Display;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

/// Characters allowed to survive slug normalization
static NON_SLUG_CHARS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^a-z0-9_-]").unwrap());

/// Normalize a raw slug or title into its stored slug form.
///
/// Lowercased, spaces become underscores, apostrophes are dropped, and any
/// remaining character outside `[a-z0-9_-]` is stripped so the result is
/// URL-safe.
pub fn slugify(raw: &str) -> String {
    let lowered = raw
        .trim()
        .to_lowercase()
        .replace(' ', "_")
        .replace('\'', "");
    NON_SLUG_CHARS.replace_all(&lowered, "").into_owned()
}

/// Target audience for a product
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    Display,
    Default,
    DeriveActiveEnum,
    EnumIter,
    ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "product_gender")]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Gender {
    #[sea_orm(string_value = "men")]
    Men,
    #[sea_orm(string_value = "women")]
    Women,
    #[sea_orm(string_value = "kid")]
    Kid,
    #[default]
    #[sea_orm(string_value = "unisex")]
    Unisex,
}

/// Product aggregate - the external representation
///
/// Child image records are always presented flattened to their URL strings,
/// in insertion order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Product {
    /// Unique identifier
    pub id: Uuid,
    /// Product title (unique across the catalog)
    pub title: String,
    /// Price in the shop currency
    pub price: f64,
    /// Optional long-form description
    pub description: Option<String>,
    /// URL-safe unique identifier, derived from the title when not supplied
    pub slug: String,
    /// Units in stock
    pub stock: i32,
    /// Available sizes
    pub sizes: Vec<String>,
    /// Target audience
    pub gender: Gender,
    /// Tags for search and organization
    pub tags: Vec<String>,
    /// Image URLs, insertion-ordered
    pub images: Vec<String>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

/// DTO for creating a new product
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateProduct {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[serde(default)]
    #[validate(range(min = 0.0))]
    pub price: f64,
    pub description: Option<String>,
    /// Optional explicit slug; derived from the title when absent
    #[validate(length(min = 1))]
    pub slug: Option<String>,
    #[serde(default)]
    #[validate(range(min = 0))]
    pub stock: i32,
    pub sizes: Vec<String>,
    pub gender: Gender,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Image URLs; each becomes an owned child record
    #[serde(default)]
    pub images: Vec<String>,
}

impl CreateProduct {
    /// The slug this product will be stored under
    pub fn normalized_slug(&self) -> String {
        match &self.slug {
            Some(slug) => slugify(slug),
            None => slugify(&self.title),
        }
    }
}

/// DTO for partially updating an existing product
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateProduct {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    #[validate(range(min = 0.0))]
    pub price: Option<f64>,
    pub description: Option<String>,
    #[validate(length(min = 1))]
    pub slug: Option<String>,
    #[validate(range(min = 0))]
    pub stock: Option<i32>,
    pub sizes: Option<Vec<String>>,
    pub gender: Option<Gender>,
    pub tags: Option<Vec<String>>,
    /// When supplied, the stored image set is replaced wholesale
    pub images: Option<Vec<String>>,
}

/// Pagination parameters for listing products
#[derive(Debug, Clone, Deserialize, ToSchema, IntoParams)]
pub struct Pagination {
    /// Maximum number of results
    #[serde(default = "default_limit")]
    pub limit: u64,
    /// Number of results to skip
    #[serde(default)]
    pub offset: u64,
}

fn default_limit() -> u64 {
    10
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            limit: default_limit(),
            offset: 0,
        }
    }
}

/// One page of products plus the total row count
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProductPage {
    /// Total number of products in the catalog (ignores pagination)
    pub total: u64,
    /// The requested page
    pub records: Vec<Product>,
}

/// Lookup resolver: decides how an incoming search string is matched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchTerm {
    /// The term parses as a UUID: match the primary key
    Id(Uuid),
    /// Anything else: match the title (case-insensitive) or the slug
    Text(String),
}

impl SearchTerm {
    pub fn parse(term: &str) -> Self {
        match Uuid::parse_str(term) {
            Ok(id) => SearchTerm::Id(id),
            Err(_) => SearchTerm::Text(term.to_string()),
        }
    }
}

impl Product {
    /// Create a new product from a CreateProduct DTO
    pub fn new(input: CreateProduct) -> Self {
        let now = Utc::now();
        let slug = input.normalized_slug();
        Self {
            id: Uuid::now_v7(),
            title: input.title,
            price: input.price,
            description: input.description,
            slug,
            stock: input.stock,
            sizes: input.sizes,
            gender: input.gender,
            tags: input.tags,
            images: input.images,
            created_at: now,
            updated_at: now,
        }
    }

    /// Merge partial update fields onto this product
    pub fn apply_update(&mut self, update: UpdateProduct) {
        if let Some(title) = update.title {
            self.title = title;
        }
        if let Some(price) = update.price {
            self.price = price;
        }
        if let Some(description) = update.description {
            self.description = Some(description);
        }
        if let Some(slug) = update.slug {
            self.slug = slugify(&slug);
        }
        if let Some(stock) = update.stock {
            self.stock = stock;
        }
        if let Some(sizes) = update.sizes {
            self.sizes = sizes;
        }
        if let Some(gender) = update.gender {
            self.gender = gender;
        }
        if let Some(tags) = update.tags {
            self.tags = tags;
        }
        if let Some(images) = update.images {
            self.images = images;
        }
        self.updated_at = Utc::now();
    }
}
