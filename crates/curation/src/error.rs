use sea_orm::DbErr;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CurationError {
    #[error("invalid channel id: {0}")]
    InvalidChannelId(String),
    #[error("channel not found: {0}")]
    ChannelNotFound(String),
    #[error("content node not found: {0}")]
    NodeNotFound(String),
    #[error("parent node {parent} does not belong to channel {channel}")]
    ParentOutsideChannel { parent: String, channel: String },
    #[error(transparent)]
    Database(#[from] DbErr),
}
