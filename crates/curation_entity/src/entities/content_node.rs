use sea_orm::entity::prelude::*;
use sea_orm::ActiveValue;
use serde::{Deserialize, Serialize};

/// 溯源字段允许的最大字符数
pub const CHANNEL_ID_MAX_LEN: usize = 32;

/// 内容节点
///
/// `original_channel_id` 与 `source_channel_id` 由系统维护，只在复制节点时写入，
/// 普通编辑路径不应修改它们。
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "content_node")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false, column_type = "String(StringLen::N(32))")]
    pub id: String,
    #[sea_orm(column_type = "String(StringLen::N(32))")]
    pub content_id: String,
    #[sea_orm(column_type = "String(StringLen::N(32))", nullable)]
    pub parent_id: Option<String>,
    #[sea_orm(column_type = "String(StringLen::N(32))")]
    pub channel_id: String,
    pub title: String,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    pub kind: String,
    pub sort_order: i32,
    pub created_at: String,
    /// 节点最初创作所在的频道
    #[sea_orm(column_type = "String(StringLen::N(32))", nullable)]
    pub original_channel_id: Option<String>,
    /// 节点最近一次复制的来源频道
    #[sea_orm(column_type = "String(StringLen::N(32))", nullable)]
    pub source_channel_id: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::channel::Entity",
        from = "Column::ChannelId",
        to = "super::channel::Column::Id",
        on_delete = "Cascade"
    )]
    Channel,
    #[sea_orm(belongs_to = "Entity", from = "Column::ParentId", to = "Column::Id", on_delete = "Cascade")]
    Parent,
}

impl Related<super::channel::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Channel.def()
    }
}

/// 检查溯源字段长度，超过 [`CHANNEL_ID_MAX_LEN`] 时拒绝写入
pub fn validate_provenance(model: &ActiveModel) -> Result<(), DbErr> {
    let fields = [
        ("original_channel_id", &model.original_channel_id),
        ("source_channel_id", &model.source_channel_id),
    ];
    for (field, value) in fields {
        if let ActiveValue::Set(Some(v)) | ActiveValue::Unchanged(Some(v)) = value {
            let len = v.chars().count();
            if len > CHANNEL_ID_MAX_LEN {
                return Err(DbErr::Custom(format!(
                    "{} 长度为 {}，超过上限 {}",
                    field, len, CHANNEL_ID_MAX_LEN
                )));
            }
        }
    }
    Ok(())
}

#[async_trait::async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C>(self, _db: &C, _insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        validate_provenance(&self)?;
        Ok(self)
    }
}
