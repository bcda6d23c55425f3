use std::path::PathBuf;

use clap::{Parser, Subcommand};
use uuid::Uuid;

use litper_parsing::ImportFormat;
use litper_types::{Country, PedidoEvent, RiskLevel};

#[derive(Parser)]
#[command(name = "litper", version, about = "Logistics tracking back office")]
pub struct Cli {
    /// State directory (default: $LITPER_STATE_DIR or ~/.litper)
    #[arg(long, global = true)]
    pub state_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Import a carrier report, sheet export or phone list
    Import {
        /// File to read, or "-" for stdin
        path: PathBuf,
        /// report, table or phones
        #[arg(long, default_value = "report")]
        format: ImportFormat,
        /// Carrier for lines that don't name one
        #[arg(long)]
        carrier: Option<String>,
        /// Country for phone validation (co, cl, ec)
        #[arg(long)]
        country: Option<Country>,
    },
    /// Dashboard summary
    Status {
        /// Skip the backend even if one is configured
        #[arg(long)]
        local: bool,
        /// Also print the daily trend for this many days
        #[arg(long)]
        trends: Option<u32>,
    },
    /// Shipments that need attention, most severe first
    Risk {
        /// Only this tier (normal, watch, attention, urgent)
        #[arg(long)]
        level: Option<RiskLevel>,
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    /// Show one shipment with its risk and events
    Shipment {
        /// Guía
        guide: String,
        /// Regenerate the AI tracking summary
        #[arg(long)]
        refresh: bool,
    },
    /// Delivery exceptions
    Novedades {
        #[command(subcommand)]
        action: NovedadAction,
    },
    /// Customer orders
    Pedidos {
        #[command(subcommand)]
        action: PedidoAction,
    },
    /// Ask the assistant about the current shipments
    Ask {
        #[arg(required = true, num_args = 1..)]
        message: Vec<String>,
        /// Answer from the rules only
        #[arg(long)]
        no_llm: bool,
    },
    /// Run the HTTP API
    Serve {
        /// Overrides bind_addr from the config
        #[arg(long)]
        bind: Option<String>,
    },
    /// Agent city simulation
    City {
        /// Advance the simulation this many ticks first
        #[arg(long, default_value_t = 0)]
        ticks: u32,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
pub enum NovedadAction {
    /// Open novedades for shipments with an issue
    Detect,
    /// List all novedades
    List,
    /// Suggested response for a novedad
    Plan { id: Uuid },
    /// Record a contact attempt
    Start { id: Uuid },
    /// Close a novedad
    Resolve { id: Uuid, resolution: String },
    /// Hand a novedad to a supervisor
    Escalate { id: Uuid, reason: String },
    Stats,
}

#[derive(Subcommand)]
pub enum PedidoAction {
    /// Create a new order
    Create {
        #[arg(long)]
        customer: String,
        #[arg(long, default_value = "")]
        city: String,
        #[arg(long)]
        product: String,
        #[arg(long)]
        value: f64,
        #[arg(long)]
        phone: Option<String>,
    },
    /// List all orders
    List,
    /// Apply a lifecycle event (confirm, dispatch, deliver, cancel, return)
    Transition {
        id: Uuid,
        event: PedidoEvent,
        /// Guía to attach on dispatch
        #[arg(long)]
        guide: Option<String>,
    },
    Stats,
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Write a default config file
    Init,
    /// Print the current configuration
    Show,
}
