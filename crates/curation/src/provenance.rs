use curation_entity::entities::content_node;
use serde::Serialize;

/// 节点的溯源信息
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Provenance {
    pub node_id: String,
    pub channel_id: String,
    pub original_channel_id: Option<String>,
    pub source_channel_id: Option<String>,
    /// 节点最初创作所在的频道；本地创作的节点没有记录，即为其所在频道
    pub origin: String,
    /// 是否由其它频道复制而来
    pub is_copy: bool,
}

impl From<&content_node::Model> for Provenance {
    fn from(node: &content_node::Model) -> Self {
        let origin = node
            .original_channel_id
            .clone()
            .unwrap_or_else(|| node.channel_id.clone());
        Self {
            node_id: node.id.clone(),
            channel_id: node.channel_id.clone(),
            original_channel_id: node.original_channel_id.clone(),
            source_channel_id: node.source_channel_id.clone(),
            origin,
            is_copy: node.source_channel_id.is_some(),
        }
    }
}

/// 复制 `source` 时新节点应写入的 (original_channel_id, source_channel_id)
///
/// 来源频道总是 `source` 当前所在频道；原始频道沿用 `source` 已有的记录，
/// 没有记录时说明 `source` 是本地创作，原始频道即来源频道。
pub fn provenance_for_copy(source: &content_node::Model) -> (String, String) {
    let original = source
        .original_channel_id
        .clone()
        .unwrap_or_else(|| source.channel_id.clone());
    (original, source.channel_id.clone())
}
