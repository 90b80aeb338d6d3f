use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250301_000001_create_location_tables::Migration),
            Box::new(m20250301_000002_create_stock_tables::Migration),
            Box::new(m20250301_000003_create_quotation_tables::Migration),
        ]
    }
}

// Migration implementations

mod m20250301_000001_create_location_tables {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250301_000001_create_location_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Warehouses::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Warehouses::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Warehouses::Name).string().not_null())
                        .col(ColumnDef::new(Warehouses::Code).string().not_null())
                        .col(ColumnDef::new(Warehouses::Address).string().null())
                        .col(ColumnDef::new(Warehouses::Description).string().null())
                        .col(ColumnDef::new(Warehouses::IsActive).boolean().not_null())
                        .col(ColumnDef::new(Warehouses::IsDeleted).boolean().not_null())
                        .col(ColumnDef::new(Warehouses::CreatedAt).timestamp().not_null())
                        .col(ColumnDef::new(Warehouses::UpdatedAt).timestamp().not_null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(RackGroups::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(RackGroups::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(RackGroups::WarehouseId).uuid().not_null())
                        .col(ColumnDef::new(RackGroups::Name).string().not_null())
                        .col(ColumnDef::new(RackGroups::Code).string().not_null())
                        .col(ColumnDef::new(RackGroups::Description).string().null())
                        .col(ColumnDef::new(RackGroups::IsActive).boolean().not_null())
                        .col(ColumnDef::new(RackGroups::IsDeleted).boolean().not_null())
                        .col(ColumnDef::new(RackGroups::CreatedAt).timestamp().not_null())
                        .col(ColumnDef::new(RackGroups::UpdatedAt).timestamp().not_null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_rack_groups_warehouse")
                        .table(RackGroups::Table)
                        .col(RackGroups::WarehouseId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(RackLevels::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(RackLevels::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(RackLevels::RackGroupId).uuid().not_null())
                        .col(ColumnDef::new(RackLevels::LevelNumber).integer().not_null())
                        .col(ColumnDef::new(RackLevels::Name).string().null())
                        .col(ColumnDef::new(RackLevels::IsActive).boolean().not_null())
                        .col(ColumnDef::new(RackLevels::IsDeleted).boolean().not_null())
                        .col(ColumnDef::new(RackLevels::CreatedAt).timestamp().not_null())
                        .col(ColumnDef::new(RackLevels::UpdatedAt).timestamp().not_null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_rack_levels_group")
                        .table(RackLevels::Table)
                        .col(RackLevels::RackGroupId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(RackSlots::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(RackSlots::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(RackSlots::RackLevelId).uuid().not_null())
                        .col(ColumnDef::new(RackSlots::SlotNumber).integer().not_null())
                        .col(ColumnDef::new(RackSlots::Name).string().null())
                        .col(ColumnDef::new(RackSlots::IsActive).boolean().not_null())
                        .col(ColumnDef::new(RackSlots::IsDeleted).boolean().not_null())
                        .col(ColumnDef::new(RackSlots::CreatedAt).timestamp().not_null())
                        .col(ColumnDef::new(RackSlots::UpdatedAt).timestamp().not_null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_rack_slots_level")
                        .table(RackSlots::Table)
                        .col(RackSlots::RackLevelId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(RackSlots::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(RackLevels::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(RackGroups::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Warehouses::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum Warehouses {
        Table,
        Id,
        Name,
        Code,
        Address,
        Description,
        IsActive,
        IsDeleted,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    pub(super) enum RackGroups {
        Table,
        Id,
        WarehouseId,
        Name,
        Code,
        Description,
        IsActive,
        IsDeleted,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    pub(super) enum RackLevels {
        Table,
        Id,
        RackGroupId,
        LevelNumber,
        Name,
        IsActive,
        IsDeleted,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    pub(super) enum RackSlots {
        Table,
        Id,
        RackLevelId,
        SlotNumber,
        Name,
        IsActive,
        IsDeleted,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20250301_000002_create_stock_tables {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250301_000002_create_stock_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(StockItems::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(StockItems::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(StockItems::WarehouseId).uuid().not_null())
                        .col(ColumnDef::new(StockItems::RackGroupId).uuid().not_null())
                        .col(ColumnDef::new(StockItems::RackLevelId).uuid().not_null())
                        .col(ColumnDef::new(StockItems::RackSlotId).uuid().not_null())
                        .col(ColumnDef::new(StockItems::ProductId).uuid().not_null())
                        .col(ColumnDef::new(StockItems::VariantId).string().not_null())
                        .col(ColumnDef::new(StockItems::VariantName).string().null())
                        .col(ColumnDef::new(StockItems::VariantSku).string().null())
                        .col(
                            ColumnDef::new(StockItems::Quantity)
                                .decimal_len(19, 4)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockItems::ReservedQuantity)
                                .decimal_len(19, 4)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockItems::MinStock)
                                .decimal_len(19, 4)
                                .not_null(),
                        )
                        .col(ColumnDef::new(StockItems::FullAddress).string().null())
                        .col(ColumnDef::new(StockItems::CreatedAt).timestamp().not_null())
                        .col(ColumnDef::new(StockItems::UpdatedAt).timestamp().not_null())
                        .to_owned(),
                )
                .await?;

            // One ledger row per location + product + variant key
            manager
                .create_index(
                    Index::create()
                        .name("idx_stock_items_key")
                        .table(StockItems::Table)
                        .col(StockItems::WarehouseId)
                        .col(StockItems::RackGroupId)
                        .col(StockItems::RackLevelId)
                        .col(StockItems::RackSlotId)
                        .col(StockItems::ProductId)
                        .col(StockItems::VariantId)
                        .unique()
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_stock_items_product")
                        .table(StockItems::Table)
                        .col(StockItems::ProductId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(StockMovements::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(StockMovements::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockMovements::MovementType)
                                .string()
                                .not_null(),
                        )
                        .col(ColumnDef::new(StockMovements::WarehouseId).uuid().not_null())
                        .col(ColumnDef::new(StockMovements::RackGroupId).uuid().null())
                        .col(ColumnDef::new(StockMovements::RackLevelId).uuid().null())
                        .col(ColumnDef::new(StockMovements::RackSlotId).uuid().null())
                        .col(
                            ColumnDef::new(StockMovements::TargetWarehouseId)
                                .uuid()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(StockMovements::TargetRackGroupId)
                                .uuid()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(StockMovements::TargetRackLevelId)
                                .uuid()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(StockMovements::TargetRackSlotId)
                                .uuid()
                                .null(),
                        )
                        .col(ColumnDef::new(StockMovements::ProductId).uuid().not_null())
                        .col(ColumnDef::new(StockMovements::VariantId).string().not_null())
                        .col(ColumnDef::new(StockMovements::VariantName).string().null())
                        .col(
                            ColumnDef::new(StockMovements::Quantity)
                                .decimal_len(19, 4)
                                .not_null(),
                        )
                        .col(ColumnDef::new(StockMovements::SourceAddress).string().null())
                        .col(ColumnDef::new(StockMovements::TargetAddress).string().null())
                        .col(ColumnDef::new(StockMovements::Reference).string().null())
                        .col(ColumnDef::new(StockMovements::Note).string().null())
                        .col(
                            ColumnDef::new(StockMovements::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_stock_movements_warehouse_created")
                        .table(StockMovements::Table)
                        .col(StockMovements::WarehouseId)
                        .col(StockMovements::CreatedAt)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(InventoryCounts::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(InventoryCounts::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryCounts::WarehouseId)
                                .uuid()
                                .not_null(),
                        )
                        .col(ColumnDef::new(InventoryCounts::RackGroupId).uuid().null())
                        .col(ColumnDef::new(InventoryCounts::RackLevelId).uuid().null())
                        .col(ColumnDef::new(InventoryCounts::RackSlotId).uuid().null())
                        .col(ColumnDef::new(InventoryCounts::ProductId).uuid().not_null())
                        .col(
                            ColumnDef::new(InventoryCounts::VariantId)
                                .string()
                                .not_null(),
                        )
                        .col(ColumnDef::new(InventoryCounts::VariantName).string().null())
                        .col(ColumnDef::new(InventoryCounts::FullAddress).string().null())
                        .col(
                            ColumnDef::new(InventoryCounts::SystemQuantity)
                                .decimal_len(19, 4)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryCounts::CountedQuantity)
                                .decimal_len(19, 4)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryCounts::Difference)
                                .decimal_len(19, 4)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryCounts::IsApproved)
                                .boolean()
                                .not_null(),
                        )
                        .col(ColumnDef::new(InventoryCounts::Note).string().null())
                        .col(
                            ColumnDef::new(InventoryCounts::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .col(ColumnDef::new(InventoryCounts::ApprovedAt).timestamp().null())
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(InventoryCounts::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(StockMovements::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(StockItems::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum StockItems {
        Table,
        Id,
        WarehouseId,
        RackGroupId,
        RackLevelId,
        RackSlotId,
        ProductId,
        VariantId,
        VariantName,
        VariantSku,
        Quantity,
        ReservedQuantity,
        MinStock,
        FullAddress,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    pub(super) enum StockMovements {
        Table,
        Id,
        MovementType,
        WarehouseId,
        RackGroupId,
        RackLevelId,
        RackSlotId,
        TargetWarehouseId,
        TargetRackGroupId,
        TargetRackLevelId,
        TargetRackSlotId,
        ProductId,
        VariantId,
        VariantName,
        Quantity,
        SourceAddress,
        TargetAddress,
        Reference,
        Note,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    pub(super) enum InventoryCounts {
        Table,
        Id,
        WarehouseId,
        RackGroupId,
        RackLevelId,
        RackSlotId,
        ProductId,
        VariantId,
        VariantName,
        FullAddress,
        SystemQuantity,
        CountedQuantity,
        Difference,
        IsApproved,
        Note,
        CreatedAt,
        ApprovedAt,
    }
}

mod m20250301_000003_create_quotation_tables {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250301_000003_create_quotation_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Quotations::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Quotations::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Quotations::Number).string().not_null())
                        .col(ColumnDef::new(Quotations::OfferStatus).string().not_null())
                        .col(
                            ColumnDef::new(Quotations::DeliveryStatus)
                                .string()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Quotations::RejectionReason).string().null())
                        .col(ColumnDef::new(Quotations::DeliveredAt).timestamp().null())
                        .col(ColumnDef::new(Quotations::CreatedAt).timestamp().not_null())
                        .col(ColumnDef::new(Quotations::UpdatedAt).timestamp().not_null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(QuotationLines::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(QuotationLines::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(QuotationLines::QuotationId)
                                .uuid()
                                .not_null(),
                        )
                        .col(ColumnDef::new(QuotationLines::ProductId).uuid().null())
                        .col(ColumnDef::new(QuotationLines::VariantId).string().null())
                        .col(ColumnDef::new(QuotationLines::ModelName).string().null())
                        .col(
                            ColumnDef::new(QuotationLines::Quantity)
                                .decimal_len(19, 4)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(QuotationLines::IsOptional)
                                .boolean()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(QuotationLines::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_quotation_lines_quotation")
                        .table(QuotationLines::Table)
                        .col(QuotationLines::QuotationId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(StockReservations::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(StockReservations::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockReservations::QuotationId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockReservations::QuotationLineId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockReservations::StockItemId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockReservations::ProductId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockReservations::VariantId)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockReservations::Quantity)
                                .decimal_len(19, 4)
                                .not_null(),
                        )
                        .col(ColumnDef::new(StockReservations::Status).string().not_null())
                        .col(
                            ColumnDef::new(StockReservations::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockReservations::ReleasedAt)
                                .timestamp()
                                .null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_stock_reservations_quotation_status")
                        .table(StockReservations::Table)
                        .col(StockReservations::QuotationId)
                        .col(StockReservations::Status)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_stock_reservations_stock_item")
                        .table(StockReservations::Table)
                        .col(StockReservations::StockItemId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(StockReservations::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(QuotationLines::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Quotations::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum Quotations {
        Table,
        Id,
        Number,
        OfferStatus,
        DeliveryStatus,
        RejectionReason,
        DeliveredAt,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    pub(super) enum QuotationLines {
        Table,
        Id,
        QuotationId,
        ProductId,
        VariantId,
        ModelName,
        Quantity,
        IsOptional,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    pub(super) enum StockReservations {
        Table,
        Id,
        QuotationId,
        QuotationLineId,
        StockItemId,
        ProductId,
        VariantId,
        Quantity,
        Status,
        CreatedAt,
        ReleasedAt,
    }
}
