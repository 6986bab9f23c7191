use async_trait::async_trait;
use sea_orm::sea_query::{Expr, ExprTrait, Func};
use sea_orm::ActiveValue::Set;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection,
    DatabaseTransaction, DbErr, EntityTrait, LoaderTrait, ModelTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, SqlErr, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    entity::{product, product_image},
    error::{ProductError, ProductResult},
    models::{slugify, CreateProduct, Pagination, Product, ProductPage, SearchTerm, UpdateProduct},
    repository::ProductRepository,
};

pub struct PgProductRepository {
    db: DatabaseConnection,
}

impl PgProductRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Translate a persistence failure into the domain taxonomy.
    ///
    /// Unique-constraint violations carry their detail to the caller; any
    /// other database error is logged here and surfaced opaquely.
    fn map_db_err(err: DbErr) -> ProductError {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(detail)) => ProductError::Duplicate(detail),
            _ => {
                tracing::error!("Unexpected database error: {:?}", err);
                ProductError::Internal("Unexpected error, check logs".to_string())
            }
        }
    }

    /// Load the image URLs owned by a product, in insertion (id) order
    async fn load_image_urls<C: ConnectionTrait>(
        conn: &C,
        model: &product::Model,
    ) -> ProductResult<Vec<String>> {
        let images = model
            .find_related(product_image::Entity)
            .order_by_asc(product_image::Column::Id)
            .all(conn)
            .await
            .map_err(Self::map_db_err)?;

        Ok(images.into_iter().map(|image| image.url).collect())
    }

    /// Insert one child row per image URL for the given product
    async fn insert_images<C: ConnectionTrait>(
        conn: &C,
        product_id: Uuid,
        urls: &[String],
    ) -> Result<(), DbErr> {
        if urls.is_empty() {
            return Ok(());
        }

        let rows = urls.iter().map(|url| product_image::ActiveModel {
            url: Set(url.clone()),
            product_id: Set(product_id),
            ..Default::default()
        });
        product_image::Entity::insert_many(rows).exec(conn).await?;

        Ok(())
    }

    /// The write half of update: image replacement + scalar merge.
    ///
    /// Runs entirely on the supplied transaction so the caller can commit or
    /// roll back the whole unit.
    async fn apply_update(
        txn: &DatabaseTransaction,
        model: product::Model,
        input: UpdateProduct,
    ) -> ProductResult<()> {
        let product_id = model.id;

        if let Some(urls) = &input.images {
            // Replace the image set wholesale: delete all, insert new
            product_image::Entity::delete_many()
                .filter(product_image::Column::ProductId.eq(product_id))
                .exec(txn)
                .await
                .map_err(Self::map_db_err)?;

            Self::insert_images(txn, product_id, urls)
                .await
                .map_err(Self::map_db_err)?;
        }

        let mut active: product::ActiveModel = model.into();
        if let Some(title) = input.title {
            active.title = Set(title);
        }
        if let Some(price) = input.price {
            active.price = Set(price);
        }
        if let Some(description) = input.description {
            active.description = Set(Some(description));
        }
        if let Some(slug) = input.slug {
            active.slug = Set(slugify(&slug));
        }
        if let Some(stock) = input.stock {
            active.stock = Set(stock);
        }
        if let Some(sizes) = input.sizes {
            active.sizes = Set(serde_json::to_value(&sizes).expect("Failed to serialize sizes"));
        }
        if let Some(gender) = input.gender {
            active.gender = Set(gender);
        }
        if let Some(tags) = input.tags {
            active.tags = Set(serde_json::to_value(&tags).expect("Failed to serialize tags"));
        }
        active.updated_at = Set(chrono::Utc::now().into());

        active.update(txn).await.map_err(Self::map_db_err)?;
        Ok(())
    }
}

#[async_trait]
impl ProductRepository for PgProductRepository {
    async fn create(&self, input: CreateProduct) -> ProductResult<Product> {
        let image_urls = input.images.clone();
        let active_model: product::ActiveModel = input.into();

        // Product row + image rows persist as one unit
        let txn = self.db.begin().await.map_err(Self::map_db_err)?;

        let inserted = async {
            let model = active_model.insert(&txn).await?;
            Self::insert_images(&txn, model.id, &image_urls).await?;
            Ok::<product::Model, DbErr>(model)
        }
        .await;

        let model = match inserted {
            Ok(model) => model,
            Err(e) => {
                txn.rollback().await.ok();
                return Err(Self::map_db_err(e));
            }
        };

        txn.commit().await.map_err(Self::map_db_err)?;

        tracing::info!(product_id = %model.id, "Created product");
        // Echo the images back in the supplied order
        Ok(model.into_product(image_urls))
    }

    async fn get_by_term(&self, term: &SearchTerm) -> ProductResult<Option<Product>> {
        let model = match term {
            SearchTerm::Id(id) => product::Entity::find_by_id(*id).one(&self.db).await,
            SearchTerm::Text(text) => {
                // No tie-break between the two predicates: both columns are
                // unique, the query engine's first row wins
                product::Entity::find()
                    .filter(
                        Condition::any()
                            .add(
                                Expr::expr(Func::upper(Expr::col(product::Column::Title)))
                                    .eq(text.to_uppercase()),
                            )
                            .add(product::Column::Slug.eq(text.to_lowercase())),
                    )
                    .one(&self.db)
                    .await
            }
        }
        .map_err(Self::map_db_err)?;

        let Some(model) = model else {
            return Ok(None);
        };

        let urls = Self::load_image_urls(&self.db, &model).await?;
        Ok(Some(model.into_product(urls)))
    }

    async fn list(&self, pagination: Pagination) -> ProductResult<ProductPage> {
        let total = product::Entity::find()
            .count(&self.db)
            .await
            .map_err(Self::map_db_err)?;

        let models = product::Entity::find()
            .order_by_asc(product::Column::CreatedAt)
            .order_by_asc(product::Column::Id)
            .limit(pagination.limit)
            .offset(pagination.offset)
            .all(&self.db)
            .await
            .map_err(Self::map_db_err)?;

        let images = models
            .load_many(product_image::Entity, &self.db)
            .await
            .map_err(Self::map_db_err)?;

        let records = models
            .into_iter()
            .zip(images)
            .map(|(model, mut imgs)| {
                imgs.sort_by_key(|img| img.id);
                model.into_product(imgs.into_iter().map(|img| img.url).collect())
            })
            .collect();

        Ok(ProductPage { total, records })
    }

    async fn update(&self, id: Uuid, input: UpdateProduct) -> ProductResult<Product> {
        // Existence check happens before any transaction is opened
        let model = product::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(Self::map_db_err)?
            .ok_or_else(|| ProductError::NotFound(id.to_string()))?;

        let txn = self.db.begin().await.map_err(Self::map_db_err)?;

        match Self::apply_update(&txn, model, input).await {
            Ok(()) => {
                txn.commit().await.map_err(Self::map_db_err)?;
            }
            Err(e) => {
                txn.rollback().await.ok();
                return Err(e);
            }
        }

        tracing::info!(product_id = %id, "Updated product");

        // Return the persisted state, not the in-memory write
        self.get_by_term(&SearchTerm::Id(id))
            .await?
            .ok_or_else(|| ProductError::NotFound(id.to_string()))
    }

    async fn delete(&self, id: Uuid) -> ProductResult<bool> {
        let result = product::Entity::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(Self::map_db_err)?;

        if result.rows_affected > 0 {
            tracing::info!(product_id = %id, "Deleted product");
            Ok(true)
        } else {
            Ok(false)
        }
    }
}
