use std::collections::HashMap;

use curation_entity::entities::{channel, content_node, prelude::*};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use tracing::{debug, info};

use crate::database::begin_write_transaction;
use crate::error::CurationError;
use crate::ids::{new_hex_id, ChannelId};
use crate::provenance::{provenance_for_copy, Provenance};
use crate::utils::now_standard_string;

/// 新建节点所需的字段，溯源字段由系统维护，不在此列
#[derive(Debug, Clone)]
pub struct NewNode {
    pub channel_id: ChannelId,
    pub parent_id: Option<String>,
    pub title: String,
    pub description: String,
    pub kind: String,
}

/// 内容服务，负责频道、节点的创建以及带溯源信息的复制
#[derive(Clone)]
pub struct ContentService {
    db: DatabaseConnection,
}

impl ContentService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn create_channel(&self, name: &str, description: &str) -> Result<channel::Model, CurationError> {
        let channel = channel::ActiveModel {
            id: Set(ChannelId::generate().into()),
            name: Set(name.to_owned()),
            description: Set(description.to_owned()),
            deleted: Set(false),
            created_at: Set(now_standard_string()),
        }
        .insert(&self.db)
        .await?;
        info!("创建频道「{}」({})", channel.name, channel.id);
        Ok(channel)
    }

    /// 软删除频道，已删除的频道不再接收新节点或复制
    pub async fn delete_channel(&self, id: &ChannelId) -> Result<channel::Model, CurationError> {
        let mut channel: channel::ActiveModel = find_channel(&self.db, id).await?.into();
        channel.deleted = Set(true);
        let channel = channel.update(&self.db).await?;
        info!("已删除频道「{}」({})", channel.name, channel.id);
        Ok(channel)
    }

    /// 在频道中创作新节点，追加到同级节点末尾
    pub async fn create_node(&self, new: NewNode) -> Result<content_node::Model, CurationError> {
        let channel = find_channel(&self.db, &new.channel_id).await?;
        check_parent(&self.db, &new.channel_id, new.parent_id.as_deref()).await?;
        let sort_order = next_sort_order(&self.db, &channel.id, new.parent_id.as_deref()).await?;

        let node = content_node::ActiveModel {
            id: Set(new_hex_id()),
            content_id: Set(new_hex_id()),
            parent_id: Set(new.parent_id),
            channel_id: Set(channel.id),
            title: Set(new.title),
            description: Set(new.description),
            kind: Set(new.kind),
            sort_order: Set(sort_order),
            created_at: Set(now_standard_string()),
            original_channel_id: Set(None),
            source_channel_id: Set(None),
        }
        .insert(&self.db)
        .await?;
        debug!("创建节点「{}」({})", node.title, node.id);
        Ok(node)
    }

    /// 将节点及其整个子树复制到目标频道（可指定目标父节点），返回复制出的根节点
    ///
    /// 每个复制出的节点都获得新 ID，保留 content_id，并按 [`provenance_for_copy`] 写入溯源字段。
    pub async fn copy_node(
        &self,
        node_id: &str,
        target_channel: &ChannelId,
        target_parent: Option<&str>,
    ) -> Result<content_node::Model, CurationError> {
        let txn = begin_write_transaction(&self.db).await?;

        let target = find_channel(&txn, target_channel).await?;
        check_parent(&txn, target_channel, target_parent).await?;
        let root = find_node(&txn, node_id).await?;
        // 先完整收集子树再写入，复制到自身子树中也不会把新节点卷入遍历
        let subtree = collect_subtree(&txn, root).await?;
        let root_sort_order = next_sort_order(&txn, &target.id, target_parent).await?;

        let mut id_map: HashMap<String, String> = HashMap::with_capacity(subtree.len());
        let mut copied_root = None;
        for (index, source) in subtree.iter().enumerate() {
            let (parent_id, sort_order) = if index == 0 {
                (target_parent.map(str::to_owned), root_sort_order)
            } else {
                let parent = source.parent_id.as_ref().and_then(|p| id_map.get(p)).cloned();
                (parent, source.sort_order)
            };
            let (original_channel_id, source_channel_id) = provenance_for_copy(source);

            let copy = content_node::ActiveModel {
                id: Set(new_hex_id()),
                content_id: Set(source.content_id.clone()),
                parent_id: Set(parent_id),
                channel_id: Set(target.id.clone()),
                title: Set(source.title.clone()),
                description: Set(source.description.clone()),
                kind: Set(source.kind.clone()),
                sort_order: Set(sort_order),
                created_at: Set(now_standard_string()),
                original_channel_id: Set(Some(original_channel_id)),
                source_channel_id: Set(Some(source_channel_id)),
            }
            .insert(&txn)
            .await?;

            id_map.insert(source.id.clone(), copy.id.clone());
            copied_root.get_or_insert(copy);
        }

        txn.commit().await?;

        let copied_root = copied_root.ok_or_else(|| CurationError::NodeNotFound(node_id.to_owned()))?;
        info!(
            "已将节点 {} 及 {} 个子节点复制到频道「{}」，新节点 {}",
            node_id,
            subtree.len() - 1,
            target.name,
            copied_root.id
        );
        Ok(copied_root)
    }

    pub async fn provenance(&self, node_id: &str) -> Result<Provenance, CurationError> {
        let node = find_node(&self.db, node_id).await?;
        Ok(Provenance::from(&node))
    }

    /// 所有最初创作于 `channel` 的复制节点
    pub async fn nodes_originating_from(&self, channel: &ChannelId) -> Result<Vec<content_node::Model>, CurationError> {
        Ok(ContentNode::find()
            .filter(content_node::Column::OriginalChannelId.eq(channel.as_str()))
            .order_by_asc(content_node::Column::ChannelId)
            .order_by_asc(content_node::Column::SortOrder)
            .all(&self.db)
            .await?)
    }
}

async fn find_channel<C: ConnectionTrait>(db: &C, id: &ChannelId) -> Result<channel::Model, CurationError> {
    Channel::find_by_id(id.as_str())
        .filter(channel::Column::Deleted.eq(false))
        .one(db)
        .await?
        .ok_or_else(|| CurationError::ChannelNotFound(id.to_string()))
}

async fn find_node<C: ConnectionTrait>(db: &C, id: &str) -> Result<content_node::Model, CurationError> {
    ContentNode::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| CurationError::NodeNotFound(id.to_owned()))
}

async fn check_parent<C: ConnectionTrait>(db: &C, channel: &ChannelId, parent: Option<&str>) -> Result<(), CurationError> {
    if let Some(parent_id) = parent {
        let parent = find_node(db, parent_id).await?;
        if parent.channel_id != channel.as_str() {
            return Err(CurationError::ParentOutsideChannel {
                parent: parent.id,
                channel: channel.to_string(),
            });
        }
    }
    Ok(())
}

async fn next_sort_order<C: ConnectionTrait>(db: &C, channel_id: &str, parent: Option<&str>) -> Result<i32, CurationError> {
    let query = ContentNode::find().filter(content_node::Column::ChannelId.eq(channel_id));
    let query = match parent {
        Some(parent_id) => query.filter(content_node::Column::ParentId.eq(parent_id)),
        None => query.filter(content_node::Column::ParentId.is_null()),
    };
    let last = query.order_by_desc(content_node::Column::SortOrder).one(db).await?;
    Ok(last.map_or(1, |node| node.sort_order + 1))
}

/// 广度优先收集子树，父节点总在子节点之前
async fn collect_subtree<C: ConnectionTrait>(
    db: &C,
    root: content_node::Model,
) -> Result<Vec<content_node::Model>, CurationError> {
    let mut nodes = vec![root];
    let mut cursor = 0;
    while cursor < nodes.len() {
        let children = ContentNode::find()
            .filter(content_node::Column::ParentId.eq(nodes[cursor].id.as_str()))
            .order_by_asc(content_node::Column::SortOrder)
            .all(db)
            .await?;
        nodes.extend(children);
        cursor += 1;
    }
    Ok(nodes)
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use sea_orm::{DbErr, PaginatorTrait};

    use super::*;
    use crate::database::memory_database;

    async fn service() -> ContentService {
        ContentService::new(memory_database().await)
    }

    async fn channel_id(service: &ContentService, name: &str) -> ChannelId {
        service.create_channel(name, "").await.unwrap().id.parse().unwrap()
    }

    async fn node(service: &ContentService, channel: &ChannelId, parent: Option<&str>, title: &str) -> content_node::Model {
        service
            .create_node(NewNode {
                channel_id: channel.clone(),
                parent_id: parent.map(str::to_owned),
                title: title.to_owned(),
                description: String::new(),
                kind: if parent.is_none() { "topic" } else { "video" }.to_owned(),
            })
            .await
            .unwrap()
    }

    async fn children(service: &ContentService, parent: &str) -> Vec<content_node::Model> {
        ContentNode::find()
            .filter(content_node::Column::ParentId.eq(parent))
            .order_by_asc(content_node::Column::SortOrder)
            .all(&service.db)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_authored_node_has_no_provenance() {
        let service = service().await;
        let channel = channel_id(&service, "数学").await;
        let topic = node(&service, &channel, None, "分数").await;

        assert_eq!(topic.original_channel_id, None);
        assert_eq!(topic.source_channel_id, None);
        let provenance = service.provenance(&topic.id).await.unwrap();
        assert_eq!(provenance.origin, channel.as_str());
        assert!(!provenance.is_copy);
    }

    #[tokio::test]
    async fn test_create_node_appends_to_siblings() {
        let service = service().await;
        let channel = channel_id(&service, "数学").await;
        let topic = node(&service, &channel, None, "分数").await;
        let first = node(&service, &channel, Some(&topic.id), "一").await;
        let second = node(&service, &channel, Some(&topic.id), "二").await;

        assert_eq!(topic.sort_order, 1);
        assert_eq!(first.sort_order, 1);
        assert_eq!(second.sort_order, 2);
    }

    #[tokio::test]
    async fn test_create_node_validates_channel_and_parent() {
        let service = service().await;
        let math = channel_id(&service, "数学").await;
        let physics = channel_id(&service, "物理").await;
        let topic = node(&service, &math, None, "分数").await;

        let err = service
            .create_node(NewNode {
                channel_id: physics.clone(),
                parent_id: Some(topic.id.clone()),
                title: "力学".to_owned(),
                description: String::new(),
                kind: "video".to_owned(),
            })
            .await
            .unwrap_err();
        assert_matches!(err, CurationError::ParentOutsideChannel { .. });

        let err = service
            .create_node(NewNode {
                channel_id: ChannelId::generate(),
                parent_id: None,
                title: "无主".to_owned(),
                description: String::new(),
                kind: "topic".to_owned(),
            })
            .await
            .unwrap_err();
        assert_matches!(err, CurationError::ChannelNotFound(_));
    }

    #[tokio::test]
    async fn test_copy_subtree_sets_provenance() {
        let service = service().await;
        let math = channel_id(&service, "数学").await;
        let target = channel_id(&service, "合辑").await;
        let topic = node(&service, &math, None, "分数").await;
        let first = node(&service, &math, Some(&topic.id), "一").await;
        let second = node(&service, &math, Some(&topic.id), "二").await;
        let existing = node(&service, &target, None, "已有主题").await;

        let copy = service.copy_node(&topic.id, &target, None).await.unwrap();

        assert_ne!(copy.id, topic.id);
        assert_eq!(copy.content_id, topic.content_id);
        assert_eq!(copy.channel_id, target.as_str());
        assert_eq!(copy.parent_id, None);
        assert_eq!(copy.sort_order, existing.sort_order + 1);
        assert_eq!(copy.original_channel_id.as_deref(), Some(math.as_str()));
        assert_eq!(copy.source_channel_id.as_deref(), Some(math.as_str()));

        let copied_children = children(&service, &copy.id).await;
        let titles: Vec<&str> = copied_children.iter().map(|n| n.title.as_str()).collect();
        assert_eq!(titles, vec!["一", "二"]);
        for (child, source) in copied_children.iter().zip([&first, &second]) {
            assert_eq!(child.content_id, source.content_id);
            assert_eq!(child.channel_id, target.as_str());
            assert_eq!(child.original_channel_id.as_deref(), Some(math.as_str()));
            assert_eq!(child.source_channel_id.as_deref(), Some(math.as_str()));
        }

        // 源节点保持不变
        let source = service.provenance(&topic.id).await.unwrap();
        assert_eq!(source.original_channel_id, None);
        assert_eq!(source.source_channel_id, None);
    }

    #[tokio::test]
    async fn test_copy_of_copy_keeps_original_channel() {
        let service = service().await;
        let a = channel_id(&service, "A").await;
        let b = channel_id(&service, "B").await;
        let c = channel_id(&service, "C").await;
        let topic = node(&service, &a, None, "分数").await;

        let in_b = service.copy_node(&topic.id, &b, None).await.unwrap();
        let in_c = service.copy_node(&in_b.id, &c, None).await.unwrap();

        let provenance = service.provenance(&in_c.id).await.unwrap();
        assert_eq!(provenance.original_channel_id.as_deref(), Some(a.as_str()));
        assert_eq!(provenance.source_channel_id.as_deref(), Some(b.as_str()));
        assert_eq!(provenance.origin, a.as_str());

        let derived = service.nodes_originating_from(&a).await.unwrap();
        let ids: Vec<&str> = derived.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(derived.len(), 2);
        assert!(ids.contains(&in_b.id.as_str()));
        assert!(ids.contains(&in_c.id.as_str()));
        assert!(service.nodes_originating_from(&b).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_copy_into_own_subtree_terminates() {
        let service = service().await;
        let math = channel_id(&service, "数学").await;
        let topic = node(&service, &math, None, "分数").await;
        let child = node(&service, &math, Some(&topic.id), "一").await;
        node(&service, &math, Some(&topic.id), "二").await;

        let copy = service.copy_node(&topic.id, &math, Some(&child.id)).await.unwrap();

        assert_eq!(copy.parent_id.as_deref(), Some(child.id.as_str()));
        assert_eq!(children(&service, &copy.id).await.len(), 2);
        assert_eq!(ContentNode::find().count(&service.db).await.unwrap(), 6);
    }

    #[tokio::test]
    async fn test_deleted_channel_rejects_nodes_and_copies() {
        let service = service().await;
        let math = channel_id(&service, "数学").await;
        let archive = channel_id(&service, "归档").await;
        let topic = node(&service, &math, None, "分数").await;

        let deleted = service.delete_channel(&archive).await.unwrap();
        assert!(deleted.deleted);

        let err = service.copy_node(&topic.id, &archive, None).await.unwrap_err();
        assert_matches!(err, CurationError::ChannelNotFound(_));
        let err = service
            .create_node(NewNode {
                channel_id: archive.clone(),
                parent_id: None,
                title: "新主题".to_owned(),
                description: String::new(),
                kind: "topic".to_owned(),
            })
            .await
            .unwrap_err();
        assert_matches!(err, CurationError::ChannelNotFound(_));
        assert_matches!(service.delete_channel(&archive).await, Err(CurationError::ChannelNotFound(_)));
        assert_eq!(ContentNode::find().count(&service.db).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_copy_rejects_parent_from_other_channel() {
        let service = service().await;
        let math = channel_id(&service, "数学").await;
        let target = channel_id(&service, "合辑").await;
        let topic = node(&service, &math, None, "分数").await;
        let other_topic = node(&service, &math, None, "小数").await;

        let err = service
            .copy_node(&topic.id, &target, Some(&other_topic.id))
            .await
            .unwrap_err();
        assert_matches!(err, CurationError::ParentOutsideChannel { .. });
        assert_eq!(ContentNode::find().count(&service.db).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_copy_missing_node_writes_nothing() {
        let service = service().await;
        let target = channel_id(&service, "合辑").await;

        let err = service.copy_node(&"0".repeat(32), &target, None).await.unwrap_err();
        assert_matches!(err, CurationError::NodeNotFound(_));
        assert_eq!(ContentNode::find().count(&service.db).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_entity_provenance_round_trip_and_length_limit() {
        let service = service().await;
        let channel = channel_id(&service, "数学").await;
        let topic = node(&service, &channel, None, "分数").await;

        let mut active: content_node::ActiveModel = topic.clone().into();
        active.original_channel_id = Set(Some("a".repeat(32)));
        active.source_channel_id = Set(None);
        active.update(&service.db).await.unwrap();

        let stored = ContentNode::find_by_id(topic.id.as_str()).one(&service.db).await.unwrap().unwrap();
        assert_eq!(stored.original_channel_id, Some("a".repeat(32)));
        assert_eq!(stored.source_channel_id, None);

        let mut active: content_node::ActiveModel = stored.into();
        active.source_channel_id = Set(Some("b".repeat(33)));
        let err = active.update(&service.db).await.unwrap_err();
        assert_matches!(err, DbErr::Custom(_));
    }
}
