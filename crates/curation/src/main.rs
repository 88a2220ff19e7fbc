mod config;
mod content;
mod database;
mod error;
mod ids;
mod provenance;
mod utils;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use tracing::info;

use crate::config::{Args, ChannelAction, Command, MigrateAction, NodeAction};
use crate::content::{ContentService, NewNode};
use crate::ids::ChannelId;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    utils::init_logger(&args.log_level)?;

    match args.command {
        Command::Migrate { action } => run_migrate(&args.database_url, action).await,
        Command::Channel { action } => {
            let service = ContentService::new(database::setup_database(&args.database_url).await?);
            run_channel(&service, action).await
        }
        Command::Node { action } => {
            let service = ContentService::new(database::setup_database(&args.database_url).await?);
            run_node(&service, action).await
        }
    }
}

async fn run_migrate(database_url: &str, action: MigrateAction) -> Result<()> {
    match action {
        MigrateAction::Up { steps } => {
            database::migrate_database(database_url, steps).await?;
            info!("迁移已应用");
        }
        MigrateAction::Down { steps } => {
            database::rollback_database(database_url, steps).await?;
            info!("迁移已回滚");
        }
        MigrateAction::Status => print_json(&database::migration_status(database_url).await?)?,
    }
    Ok(())
}

async fn run_channel(service: &ContentService, action: ChannelAction) -> Result<()> {
    match action {
        ChannelAction::Create { name, description } => {
            print_json(&service.create_channel(&name, &description).await?)
        }
        ChannelAction::Delete { channel } => {
            let channel: ChannelId = channel.parse()?;
            print_json(&service.delete_channel(&channel).await?)
        }
    }
}

async fn run_node(service: &ContentService, action: NodeAction) -> Result<()> {
    match action {
        NodeAction::Create {
            channel,
            parent,
            kind,
            description,
            title,
        } => {
            let node = service
                .create_node(NewNode {
                    channel_id: channel.parse()?,
                    parent_id: parent,
                    title,
                    description,
                    kind,
                })
                .await?;
            print_json(&node)
        }
        NodeAction::Copy {
            node,
            target_channel,
            target_parent,
        } => {
            let target: ChannelId = target_channel.parse()?;
            let copy = service
                .copy_node(&node, &target, target_parent.as_deref())
                .await
                .with_context(|| format!("复制节点 {} 失败", node))?;
            print_json(&copy)
        }
        NodeAction::Provenance { node } => print_json(&service.provenance(&node).await?),
        NodeAction::Derived { channel } => {
            let channel: ChannelId = channel.parse()?;
            print_json(&service.nodes_originating_from(&channel).await?)
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
