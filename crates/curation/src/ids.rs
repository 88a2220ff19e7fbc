use std::fmt;
use std::str::FromStr;

use curation_entity::entities::content_node::CHANNEL_ID_MAX_LEN;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::CurationError;

/// 生成 32 位十六进制标识（不带连字符的 UUID v4）
pub fn new_hex_id() -> String {
    Uuid::new_v4().simple().to_string()
}

/// 频道 ID，格式与 [`new_hex_id`] 一致
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ChannelId(String);

impl ChannelId {
    pub fn generate() -> Self {
        Self(new_hex_id())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for ChannelId {
    type Err = CurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.len() != CHANNEL_ID_MAX_LEN || !s.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(CurationError::InvalidChannelId(s.to_owned()));
        }
        Ok(Self(s.to_ascii_lowercase()))
    }
}

impl TryFrom<String> for ChannelId {
    type Error = CurationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ChannelId> for String {
    fn from(value: ChannelId) -> Self {
        value.0
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
