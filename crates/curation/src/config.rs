use clap::{Parser, Subcommand};

pub const DEFAULT_DATABASE_URL: &str = "sqlite://curation.sqlite?mode=rwc";

#[derive(Parser, Debug)]
#[command(name = "curation", version, about = "内容策展存储：频道、内容树与节点溯源")]
pub struct Args {
    /// SQLite 数据库地址
    #[arg(long, env = "CURATION_DATABASE_URL", default_value = DEFAULT_DATABASE_URL)]
    pub database_url: String,

    /// 日志级别
    #[arg(long, env = "CURATION_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// 数据库迁移
    Migrate {
        #[command(subcommand)]
        action: MigrateAction,
    },
    /// 频道管理
    Channel {
        #[command(subcommand)]
        action: ChannelAction,
    },
    /// 内容节点管理
    Node {
        #[command(subcommand)]
        action: NodeAction,
    },
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum MigrateAction {
    /// 应用待执行的迁移
    Up {
        #[arg(long)]
        steps: Option<u32>,
    },
    /// 回滚已应用的迁移（默认一步）
    Down {
        #[arg(long)]
        steps: Option<u32>,
    },
    /// 查看迁移状态
    Status,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum ChannelAction {
    Create {
        name: String,
        #[arg(long, default_value = "")]
        description: String,
    },
    /// 软删除频道
    Delete { channel: String },
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum NodeAction {
    /// 在频道中创作节点
    Create {
        #[arg(long)]
        channel: String,
        #[arg(long)]
        parent: Option<String>,
        #[arg(long, default_value = "topic")]
        kind: String,
        #[arg(long, default_value = "")]
        description: String,
        title: String,
    },
    /// 复制节点及其子树到目标频道
    Copy {
        node: String,
        #[arg(long)]
        target_channel: String,
        #[arg(long)]
        target_parent: Option<String>,
    },
    /// 查看节点溯源信息
    Provenance { node: String },
    /// 列出最初创作于某频道的复制节点
    Derived { channel: String },
}
