//! SeaORM entities for the `products` and `product_images` tables

pub mod product {
    use crate::models::Gender;
    use sea_orm::entity::prelude::*;
    use sea_orm::ActiveValue::Set;
    use serde::{Deserialize, Serialize};

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
    #[sea_orm(table_name = "products")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub id: Uuid,
        #[sea_orm(unique)]
        pub title: String,
        pub price: f64,
        #[sea_orm(column_type = "Text", nullable)]
        pub description: Option<String>,
        #[sea_orm(unique)]
        pub slug: String,
        pub stock: i32,
        pub sizes: Json, // JSONB field
        pub gender: Gender,
        pub tags: Json, // JSONB field
        pub created_at: DateTimeWithTimeZone,
        pub updated_at: DateTimeWithTimeZone,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {
        #[sea_orm(has_many = "super::product_image::Entity")]
        ProductImage,
    }

    impl Related<super::product_image::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::ProductImage.def()
        }
    }

    impl ActiveModelBehavior for ActiveModel {}

    // Conversion from Sea-ORM Model to the flattened domain Product
    impl Model {
        pub fn into_product(self, images: Vec<String>) -> crate::models::Product {
            // Parse list fields from JSON
            let sizes: Vec<String> = serde_json::from_value(self.sizes).unwrap_or_default();
            let tags: Vec<String> = serde_json::from_value(self.tags).unwrap_or_default();

            crate::models::Product {
                id: self.id,
                title: self.title,
                price: self.price,
                description: self.description,
                slug: self.slug,
                stock: self.stock,
                sizes,
                gender: self.gender,
                tags,
                images,
                created_at: self.created_at.into(),
                updated_at: self.updated_at.into(),
            }
        }
    }

    // Conversion from domain CreateProduct to Sea-ORM ActiveModel.
    // Image URLs are not part of the product row; callers persist them as
    // child records.
    impl From<crate::models::CreateProduct> for ActiveModel {
        fn from(input: crate::models::CreateProduct) -> Self {
            let slug = input.normalized_slug();
            let sizes_json =
                serde_json::to_value(&input.sizes).expect("Failed to serialize sizes");
            let tags_json = serde_json::to_value(&input.tags).expect("Failed to serialize tags");

            ActiveModel {
                id: Set(Uuid::now_v7()),
                title: Set(input.title),
                price: Set(input.price),
                description: Set(input.description),
                slug: Set(slug),
                stock: Set(input.stock),
                sizes: Set(sizes_json),
                gender: Set(input.gender),
                tags: Set(tags_json),
                created_at: Set(chrono::Utc::now().into()),
                updated_at: Set(chrono::Utc::now().into()),
            }
        }
    }
}

pub mod product_image {
    use sea_orm::entity::prelude::*;
    use serde::{Deserialize, Serialize};

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
    #[sea_orm(table_name = "product_images")]
    pub struct Model {
        #[sea_orm(primary_key)]
        pub id: i32,
        #[sea_orm(column_type = "Text")]
        pub url: String,
        pub product_id: Uuid,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {
        #[sea_orm(
            belongs_to = "super::product::Entity",
            from = "Column::ProductId",
            to = "super::product::Column::Id",
            on_delete = "Cascade"
        )]
        Product,
    }

    impl Related<super::product::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::Product.def()
        }
    }

    impl ActiveModelBehavior for ActiveModel {}
}
