use sea_orm_migration::sea_query::extension::postgres::Type;
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create product_gender enum
        manager
            .create_type(
                Type::create()
                    .as_enum(ProductGender::Enum)
                    .values([
                        ProductGender::Men,
                        ProductGender::Women,
                        ProductGender::Kid,
                        ProductGender::Unisex,
                    ])
                    .to_owned(),
            )
            .await?;

        // Create products table
        manager
            .create_table(
                Table::create()
                    .table(Products::Table)
                    .if_not_exists()
                    .col(pk_uuid(Products::Id))
                    .col(string_uniq(Products::Title))
                    .col(double(Products::Price).default(0.0))
                    .col(text_null(Products::Description))
                    .col(string_uniq(Products::Slug))
                    .col(integer(Products::Stock).default(0))
                    .col(json_binary(Products::Sizes))
                    .col(
                        ColumnDef::new(Products::Gender)
                            .enumeration(
                                ProductGender::Enum,
                                [
                                    ProductGender::Men,
                                    ProductGender::Women,
                                    ProductGender::Kid,
                                    ProductGender::Unisex,
                                ],
                            )
                            .not_null(),
                    )
                    .col(json_binary(Products::Tags))
                    .col(
                        timestamp_with_time_zone(Products::CreatedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        timestamp_with_time_zone(Products::UpdatedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // Create product_images table
        manager
            .create_table(
                Table::create()
                    .table(ProductImages::Table)
                    .if_not_exists()
                    .col(pk_auto(ProductImages::Id))
                    .col(text(ProductImages::Url))
                    .col(uuid(ProductImages::ProductId))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_product_images_product_id")
                            .from(ProductImages::Table, ProductImages::ProductId)
                            .to(Products::Table, Products::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create indexes
        manager
            .create_index(
                Index::create()
                    .name("idx_product_images_product_id")
                    .table(ProductImages::Table)
                    .col(ProductImages::ProductId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_products_created_at")
                    .table(Products::Table)
                    .col(Products::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ProductImages::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Products::Table).to_owned())
            .await?;

        manager
            .drop_type(Type::drop().name(ProductGender::Enum).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum Products {
    Table,
    Id,
    Title,
    Price,
    Description,
    Slug,
    Stock,
    Sizes,
    Gender,
    Tags,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum ProductImages {
    Table,
    Id,
    Url,
    ProductId,
}

#[derive(DeriveIden)]
enum ProductGender {
    #[sea_orm(iden = "product_gender")]
    Enum,
    #[sea_orm(iden = "men")]
    Men,
    #[sea_orm(iden = "women")]
    Women,
    #[sea_orm(iden = "kid")]
    Kid,
    #[sea_orm(iden = "unisex")]
    Unisex,
}
