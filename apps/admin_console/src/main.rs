mod clipboard;
mod config;
mod render;

use std::{path::PathBuf, sync::Arc};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use client_core::{HttpGateway, OrderGateway, OrderListViewModel, SubmitOutcome};
use shared::{
    domain::{AutoId, OrderId, StatusId, UserId},
    protocol::CreateOrderRequest,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::{clipboard::CopyMethod, config::Settings};

#[derive(Parser, Debug)]
#[command(name = "admin-console", about = "Logistics order administration")]
struct Cli {
    /// TOML settings file; defaults to ./admin.toml when present.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show the order table.
    Orders {
        #[arg(long, default_value = "")]
        search: String,
        /// Sort statuses Z to A.
        #[arg(long)]
        desc: bool,
    },
    Statuses,
    /// Move an order to another status.
    SetStatus { order_id: i64, status_id: i64 },
    Users {
        #[arg(long, default_value_t = 0)]
        page: u32,
        #[arg(long, default_value_t = 20)]
        size: u32,
    },
    ConfirmUser { user_id: i64 },
    Vehicles,
    CreateOrder {
        #[arg(long = "auto-id", required = true)]
        auto_ids: Vec<i64>,
        #[arg(long, default_value = "New order")]
        description: String,
        #[arg(long)]
        vin: String,
        /// Copy the new order code to the clipboard.
        #[arg(long)]
        copy: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = config::load_settings(cli.config.as_deref())?;
    init_tracing(&settings);
    info!(settings = ?settings, "admin console starting");

    let gateway = Arc::new(build_gateway(&settings)?);

    match cli.command {
        Command::Orders { search, desc } => {
            let view_model = open_order_list(&gateway, &settings).await;
            view_model.set_search_query(search).await;
            if desc {
                view_model.toggle_sort().await;
            }
            print!("{}", render::order_table(&view_model.snapshot().await));
        }
        Command::Statuses => {
            let statuses = gateway.fetch_statuses().await?;
            print!("{}", render::status_table(&statuses));
        }
        Command::SetStatus {
            order_id,
            status_id,
        } => {
            let view_model = open_order_list(&gateway, &settings).await;
            if let Some(error) = view_model.snapshot().await.error {
                bail!("failed to load orders: {error}");
            }
            if !view_model
                .select_order_for_status_change(OrderId(order_id))
                .await
            {
                bail!("order {order_id} is not in the loaded list");
            }
            match view_model.submit_status_change(StatusId(status_id)).await {
                SubmitOutcome::Applied => {
                    let snapshot = view_model.snapshot().await;
                    match (snapshot.success, snapshot.error) {
                        (Some(message), _) => println!("{message}"),
                        (None, Some(error)) => {
                            println!("status changed; list refresh failed: {error}")
                        }
                        (None, None) => println!("status changed"),
                    }
                }
                SubmitOutcome::Failed(err) => {
                    return Err(err).context("failed to change order status")
                }
                SubmitOutcome::Ignored(reason) => bail!("status change ignored: {reason:?}"),
            }
        }
        Command::Users { page, size } => {
            let users = gateway.list_users(page, size).await?;
            print!(
                "{}",
                render::user_table(&users.content, page, users.total_pages)
            );
        }
        Command::ConfirmUser { user_id } => {
            gateway.confirm_user(UserId(user_id)).await?;
            println!("confirmed user_id={user_id}");
        }
        Command::Vehicles => {
            let vehicles = gateway.list_vehicles().await?;
            print!("{}", render::vehicle_list(&vehicles));
        }
        Command::CreateOrder {
            auto_ids,
            description,
            vin,
            copy,
        } => {
            let request = CreateOrderRequest {
                auto_ids: auto_ids.into_iter().map(AutoId).collect(),
                description,
                vin,
            };
            let created = gateway.create_order(&request).await?;
            println!("created order code={} id={}", created.code, created.id);
            if copy {
                let code = created.code.clone();
                match tokio::task::spawn_blocking(move || clipboard::copy_text(&code)).await?? {
                    Some(CopyMethod::System) => println!("code copied to clipboard"),
                    Some(CopyMethod::Terminal) => println!("code sent to terminal clipboard"),
                    None => println!("nothing to copy"),
                }
            }
        }
    }

    Ok(())
}

/// `RUST_LOG` wins; otherwise the configured level applies. Logs go to
/// stderr so tables on stdout stay clean.
fn init_tracing(settings: &Settings) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(settings.log_level.as_str()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn build_gateway(settings: &Settings) -> Result<HttpGateway> {
    let session = settings.session()?;
    let http = reqwest::Client::builder()
        .timeout(settings.request_timeout())
        .build()
        .context("failed to build http client")?;
    Ok(HttpGateway::with_client(http, Arc::new(session)))
}

async fn open_order_list(
    gateway: &Arc<HttpGateway>,
    settings: &Settings,
) -> Arc<OrderListViewModel> {
    let gateway: Arc<dyn OrderGateway> = gateway.clone();
    let view_model = OrderListViewModel::with_config(gateway, settings.view_model_config());
    view_model.activate().await;
    view_model
}
