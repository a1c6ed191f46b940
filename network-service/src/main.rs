use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use rust_decimal::Decimal;
use serde_json::Value;
use tracing::{error, info};
use uuid::Uuid;

use network_service::{Dependencies, LogFormat, Settings};
use network_shared::{
    NewNode, NodeFilter, NodeType, NodeUpdate, PageRequest, ProductFilter, ProductOrdering,
    DEFAULT_PAGE_SIZE,
};

#[derive(Parser)]
#[command(name = "network")]
#[command(about = "Inspect and edit a supply network snapshot", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Snapshot file (overrides NETWORK_SNAPSHOT_PATH)
    #[arg(long, global = true)]
    snapshot: Option<PathBuf>,
}

#[derive(Args)]
struct PageArgs {
    /// Page number, starting at 1
    #[arg(long, default_value_t = 1)]
    page: usize,

    /// Results per page
    #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
    page_size: usize,
}

impl PageArgs {
    fn request(&self) -> PageRequest {
        PageRequest::new(self.page, self.page_size)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Print aggregate statistics
    Stats,
    /// List nodes, newest first
    List {
        #[arg(long)]
        country: Option<String>,
        #[arg(long)]
        city: Option<String>,
        #[arg(long)]
        node_type: Option<NodeType>,
        /// Case-insensitive search in name and email
        #[arg(long)]
        search: Option<String>,
        #[command(flatten)]
        page: PageArgs,
    },
    /// Show a node with its supplier and products
    Show { id: Uuid },
    /// Create a node
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        node_type: NodeType,
        #[arg(long)]
        email: String,
        #[arg(long)]
        country: String,
        #[arg(long)]
        city: String,
        #[arg(long)]
        street: String,
        #[arg(long)]
        house_number: String,
        #[arg(long)]
        supplier: Option<Uuid>,
        /// Opening debt
        #[arg(long)]
        debt: Option<Decimal>,
    },
    /// Change contact details or type of a node
    Update {
        id: Uuid,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        country: Option<String>,
        #[arg(long)]
        city: Option<String>,
        #[arg(long)]
        street: Option<String>,
        #[arg(long)]
        house_number: Option<String>,
        #[arg(long)]
        node_type: Option<NodeType>,
    },
    /// Point a node at a supplier; without --supplier the node becomes a root
    SetSupplier {
        id: Uuid,
        #[arg(long)]
        supplier: Option<Uuid>,
    },
    /// Delete a node; its clients become roots
    Delete { id: Uuid },
    /// Zero the debt of the given nodes
    ClearDebt {
        #[arg(required = true)]
        ids: Vec<Uuid>,
    },
    /// Report every hierarchy invariant violation
    Check,
    /// Recompute stale levels, below --root or everywhere
    Repair {
        #[arg(long)]
        root: Option<Uuid>,
    },
    /// List products
    Products {
        #[arg(long)]
        model: Option<String>,
        #[arg(long)]
        release_date: Option<NaiveDate>,
        /// Case-insensitive search in name and model
        #[arg(long)]
        search: Option<String>,
        /// price, release_date or name; prefix with - for descending
        #[arg(long, allow_hyphen_values = true)]
        ordering: Option<ProductOrdering>,
        #[command(flatten)]
        page: PageArgs,
    },
}

impl Commands {
    fn mutates(&self) -> bool {
        matches!(
            self,
            Self::Create { .. }
                | Self::Update { .. }
                | Self::SetSupplier { .. }
                | Self::Delete { .. }
                | Self::ClearDebt { .. }
                | Self::Repair { .. }
        )
    }
}

fn init_tracing(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Text => builder.init(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    // No subscriber yet: a bad setting is reported by the returned error alone.
    let mut settings = Settings::from_env().context("invalid settings")?;
    init_tracing(settings.log_format);

    let cli = Cli::parse();
    if let Some(path) = cli.snapshot {
        settings = settings.with_snapshot_path(path);
    }

    let deps = Dependencies::new(&settings)
        .await
        .context("failed to load the network")?;

    let mutates = cli.command.mutates();
    let result = execute(cli.command, &deps).await;

    // Rejected commands leave the store as it was; a partial cascade has
    // already committed part of its work. Either way the snapshot matches
    // the store.
    if mutates {
        deps.persist().await.context("failed to write the snapshot")?;
    }

    match result {
        Ok(value) => {
            println!("{}", serde_json::to_string_pretty(&value)?);
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "Command failed");
            Err(e)
        }
    }
}

async fn execute(command: Commands, deps: &Dependencies) -> Result<Value> {
    let value = match command {
        Commands::Stats => serde_json::to_value(deps.nodes.statistics().await?)?,
        Commands::List {
            country,
            city,
            node_type,
            search,
            page,
        } => {
            let filter = NodeFilter {
                country,
                city,
                node_type,
                search,
            };
            serde_json::to_value(deps.nodes.list(&filter, page.request()).await?)?
        }
        Commands::Show { id } => serde_json::to_value(deps.nodes.detail(id).await?)?,
        Commands::Create {
            name,
            node_type,
            email,
            country,
            city,
            street,
            house_number,
            supplier,
            debt,
        } => {
            let mut new = NewNode::new(name, node_type)
                .with_email(email)
                .with_address(country, city, street, house_number);
            new.supplier_id = supplier;
            if let Some(debt) = debt {
                new = new.with_debt(debt);
            }
            let node = deps.nodes.create(new).await?;
            info!(node_id = %node.id, "Node created");
            serde_json::to_value(node)?
        }
        Commands::Update {
            id,
            name,
            email,
            country,
            city,
            street,
            house_number,
            node_type,
        } => {
            let update = NodeUpdate {
                name,
                email,
                country,
                city,
                street,
                house_number,
                node_type,
                supplier_id: None,
            };
            serde_json::to_value(deps.nodes.update(id, update).await?)?
        }
        Commands::SetSupplier { id, supplier } => {
            serde_json::to_value(deps.nodes.set_supplier(id, supplier).await?)?
        }
        Commands::Delete { id } => serde_json::to_value(deps.nodes.delete(id).await?)?,
        Commands::ClearDebt { ids } => {
            let cleared = deps.nodes.clear_debt(&ids).await?;
            serde_json::json!({ "cleared": cleared })
        }
        Commands::Check => {
            let violations = deps.nodes.audit().await?;
            serde_json::json!({ "consistent": violations.is_empty(), "violations": violations })
        }
        Commands::Repair { root } => serde_json::to_value(deps.nodes.repair(root).await?)?,
        Commands::Products {
            model,
            release_date,
            search,
            ordering,
            page,
        } => {
            let filter = ProductFilter {
                release_date,
                model,
                search,
            };
            serde_json::to_value(deps.products.list(&filter, ordering, page.request()).await?)?
        }
    };
    Ok(value)
}
