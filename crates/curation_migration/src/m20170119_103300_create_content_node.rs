use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::ConnectionTrait;

/// 链首迁移，没有前置依赖
pub const DEPENDS_ON: Option<&str> = None;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // 频道表
        manager
            .create_table(
                Table::create()
                    .table(Channel::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Channel::Id).string_len(32).not_null().primary_key())
                    .col(ColumnDef::new(Channel::Name).string_len(200).not_null())
                    .col(ColumnDef::new(Channel::Description).string_len(400).not_null().default(""))
                    .col(ColumnDef::new(Channel::Deleted).boolean().not_null().default(false))
                    .col(
                        ColumnDef::new(Channel::CreatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // 内容节点表，parent_id 自引用构成内容树
        manager
            .create_table(
                Table::create()
                    .table(ContentNode::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(ContentNode::Id).string_len(32).not_null().primary_key())
                    .col(ColumnDef::new(ContentNode::ContentId).string_len(32).not_null())
                    .col(ColumnDef::new(ContentNode::ParentId).string_len(32).null())
                    .col(ColumnDef::new(ContentNode::ChannelId).string_len(32).not_null())
                    .col(ColumnDef::new(ContentNode::Title).string_len(200).not_null())
                    .col(ColumnDef::new(ContentNode::Description).text().not_null().default(""))
                    .col(ColumnDef::new(ContentNode::Kind).string_len(200).not_null())
                    .col(ColumnDef::new(ContentNode::SortOrder).integer().not_null().default(1))
                    .col(
                        ColumnDef::new(ContentNode::CreatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_content_node_channel")
                            .from(ContentNode::Table, ContentNode::ChannelId)
                            .to(Channel::Table, Channel::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_content_node_parent")
                            .from(ContentNode::Table, ContentNode::ParentId)
                            .to(ContentNode::Table, ContentNode::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_content_node_parent_id")
                    .table(ContentNode::Table)
                    .col(ContentNode::ParentId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_content_node_channel_id")
                    .table(ContentNode::Table)
                    .col(ContentNode::ChannelId)
                    .to_owned(),
            )
            .await?;

        // 写锁表，单行记录，事务开始时更新它以立即获取 SQLite 写锁
        manager
            .create_table(
                Table::create()
                    .table(WriteLock::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(WriteLock::Id).integer().not_null().primary_key())
                    .col(ColumnDef::new(WriteLock::Ts).integer().not_null().default(0))
                    .to_owned(),
            )
            .await?;
        manager
            .get_connection()
            .execute_unprepared("INSERT OR IGNORE INTO _write_lock (id, ts) VALUES (1, 0)")
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(WriteLock::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ContentNode::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Channel::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Channel {
    Table,
    Id,
    Name,
    Description,
    Deleted,
    CreatedAt,
}

#[derive(DeriveIden)]
pub enum ContentNode {
    Table,
    Id,
    ContentId,
    ParentId,
    ChannelId,
    Title,
    Description,
    Kind,
    SortOrder,
    CreatedAt,
}

#[derive(DeriveIden)]
pub enum WriteLock {
    #[sea_orm(iden = "_write_lock")]
    Table,
    Id,
    Ts,
}
