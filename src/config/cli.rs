use crate::core::query::{ProductFilter, SearchField};
use crate::domain::model::ServiceKind;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "mcp-devstack")]
#[command(about = "Operator tool for the Redis / PostgreSQL / Elasticsearch / Qdrant MCP demo stack")]
#[command(version)]
pub struct CliConfig {
    /// Environment file with connection settings
    #[arg(long, global = true, default_value = ".env", env = "MCP_DEVSTACK_ENV_FILE")]
    pub env_file: PathBuf,

    /// Secrets file (TOML) overriding the environment
    #[arg(long, global = true, default_value = ".streamlit/secrets.toml", env = "MCP_DEVSTACK_SECRETS_FILE")]
    pub secrets_file: PathBuf,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Probe every backing service
    Status {
        /// Re-check every N seconds until interrupted
        #[arg(long)]
        watch: Option<u64>,
        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show key figures of the seeded data
    Summary {
        /// Include sessions, counters, customers and orders
        #[arg(long)]
        detailed: bool,
        #[arg(long)]
        json: bool,
    },
    /// Load the test data set into the services
    Seed {
        /// Restrict seeding to these services
        #[arg(long, value_delimiter = ',')]
        only: Vec<ServiceKind>,
        /// Log CPU and memory usage per service
        #[arg(long)]
        monitor: bool,
    },
    /// Run a query directly against one service
    Query {
        #[command(subcommand)]
        target: QueryTarget,
    },
    /// Sales, customer and cache statistics
    Analyze,
    /// Ask the assistant a single question
    Ask {
        question: String,
        #[command(flatten)]
        assistant: AssistantArgs,
    },
    /// Interactive assistant session
    Chat {
        #[command(flatten)]
        assistant: AssistantArgs,
        /// Print sample questions and exit
        #[arg(long)]
        samples: bool,
    },
    /// Validate templates, the compose manifest and look for leaked secrets
    Check(CheckArgs),
    /// Probe the MCP server endpoints
    Endpoints,
    /// Check the local toolchain and service ports
    Diagnose,
}

#[derive(Debug, Clone, Subcommand)]
pub enum QueryTarget {
    /// Whitelisted Redis command (KEYS, GET, HGETALL, SMEMBERS, LRANGE)
    Redis {
        #[arg(required = true, num_args = 1.., trailing_var_arg = true, allow_hyphen_values = true)]
        command: Vec<String>,
    },
    /// Read-only SQL against PostgreSQL
    Sql {
        query: String,
        /// Write the result as CSV into this directory
        #[arg(long)]
        csv: Option<PathBuf>,
    },
    /// Full-text search over blog articles
    Search {
        term: String,
        #[arg(long, value_enum, default_value_t = SearchFieldArg::All)]
        field: SearchFieldArg,
    },
    /// Filter products in the vector index
    Products(ProductArgs),
    /// Products similar to the given product id
    Similar {
        id: u64,
        #[command(flatten)]
        filter: ProductArgs,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SearchFieldArg {
    All,
    Title,
    Content,
    Category,
    Author,
}

#[derive(Debug, Clone, Args)]
pub struct ProductArgs {
    #[arg(long)]
    pub category: Option<String>,
    #[arg(long, default_value_t = 0)]
    pub min_price: u64,
    #[arg(long, default_value_t = 100_000)]
    pub max_price: u64,
    #[arg(long, default_value_t = 5)]
    pub limit: usize,
}

impl From<SearchFieldArg> for SearchField {
    fn from(arg: SearchFieldArg) -> Self {
        match arg {
            SearchFieldArg::All => SearchField::All,
            SearchFieldArg::Title => SearchField::Title,
            SearchFieldArg::Content => SearchField::Content,
            SearchFieldArg::Category => SearchField::Category,
            SearchFieldArg::Author => SearchField::Author,
        }
    }
}

impl From<&ProductArgs> for ProductFilter {
    fn from(args: &ProductArgs) -> Self {
        ProductFilter {
            category: args.category.clone(),
            min_price: args.min_price,
            max_price: args.max_price,
            limit: args.limit,
        }
    }
}

#[derive(Debug, Clone, Args)]
pub struct AssistantArgs {
    /// Answer with the built-in demo response instead of calling the API
    #[arg(long)]
    pub offline: bool,
    /// Skip the service readiness gate
    #[arg(long)]
    pub force: bool,
}

#[derive(Debug, Clone, Args)]
pub struct CheckArgs {
    #[arg(long, default_value = ".env.template")]
    pub env_template: PathBuf,
    #[arg(long, default_value = "secrets.toml.template")]
    pub secrets_template: PathBuf,
    #[arg(long, default_value = "docker-compose.mcp-demo.yml")]
    pub compose: PathBuf,
    /// Directory scanned for leaked secrets
    #[arg(long, default_value = ".")]
    pub scan_root: PathBuf,
    /// Also probe the running services
    #[arg(long)]
    pub live: bool,
}
