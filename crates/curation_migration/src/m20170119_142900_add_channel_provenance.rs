use sea_orm_migration::prelude::*;

/// 本迁移必须在内容节点表建立之后执行
pub const DEPENDS_ON: Option<&str> = Some("m20170119_103300_create_content_node");

/// 频道 ID 为 32 位十六进制 UUID
pub const CHANNEL_ID_LEN: u32 = 32;

/// 为内容节点添加溯源字段：
/// - original_channel_id：节点最初创作所在频道
/// - source_channel_id：节点最近一次复制/导入的来源频道
///
/// 两列均可为空，由应用层写入，迁移本身不回填数据。
#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let table = ContentNode::Table.to_string();
        if !manager.has_table(&table).await? {
            return Err(DbErr::Migration(format!(
                "表 {} 不存在，请先执行依赖迁移 {}",
                table,
                DEPENDS_ON.unwrap_or_default()
            )));
        }

        for column in [ContentNode::OriginalChannelId, ContentNode::SourceChannelId] {
            let name = column.to_string();
            if manager.has_column(&table, &name).await? {
                return Err(DbErr::Migration(format!("列 {}.{} 已存在", table, name)));
            }
        }

        // SQLite 不支持单次 ALTER TABLE 添加多列，需要分开执行
        manager
            .alter_table(
                Table::alter()
                    .table(ContentNode::Table)
                    .add_column(channel_id_column(ContentNode::OriginalChannelId))
                    .to_owned(),
            )
            .await?;

        manager
            .alter_table(
                Table::alter()
                    .table(ContentNode::Table)
                    .add_column(channel_id_column(ContentNode::SourceChannelId))
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .alter_table(
                Table::alter()
                    .table(ContentNode::Table)
                    .drop_column(ContentNode::SourceChannelId)
                    .to_owned(),
            )
            .await?;

        manager
            .alter_table(
                Table::alter()
                    .table(ContentNode::Table)
                    .drop_column(ContentNode::OriginalChannelId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }
}

/// 可空的 varchar(32)；SQLite 不校验 varchar 长度，额外附加 CHECK 约束
fn channel_id_column(column: ContentNode) -> ColumnDef {
    let check = Expr::expr(Func::char_length(Expr::col(column.clone()))).lte(CHANNEL_ID_LEN);
    ColumnDef::new(column).string_len(CHANNEL_ID_LEN).null().check(check).to_owned()
}

#[derive(DeriveIden, Clone)]
enum ContentNode {
    Table,
    OriginalChannelId,
    SourceChannelId,
}
