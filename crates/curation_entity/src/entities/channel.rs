use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// 频道：内容树的顶层容器
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "channel")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false, column_type = "String(StringLen::N(32))")]
    pub id: String,
    pub name: String,
    pub description: String,
    pub deleted: bool,
    pub created_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::content_node::Entity")]
    ContentNode,
}

impl Related<super::content_node::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ContentNode.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
