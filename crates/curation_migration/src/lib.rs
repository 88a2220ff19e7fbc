pub use sea_orm_migration::prelude::*;

mod m20170119_103300_create_content_node;
mod m20170119_142900_add_channel_provenance;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20170119_103300_create_content_node::Migration),
            Box::new(m20170119_142900_add_channel_provenance::Migration),
        ]
    }
}

/// 每个迁移声明的前置依赖，顺序与 [`Migrator::migrations`] 一致
pub fn dependency_chain() -> Vec<(&'static str, Option<&'static str>)> {
    vec![
        (
            "m20170119_103300_create_content_node",
            m20170119_103300_create_content_node::DEPENDS_ON,
        ),
        (
            "m20170119_142900_add_channel_provenance",
            m20170119_142900_add_channel_provenance::DEPENDS_ON,
        ),
    ]
}
