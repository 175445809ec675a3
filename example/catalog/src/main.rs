use catalog::product::catalog;
use catalog::report::{self, ReportOptions};
use clap::{Parser, Subcommand, ValueEnum};
use fluent_query_rust_lib::operations::ReactiveOperations;
use fluent_query_rust_lib::template::memory::{InMemoryTemplate, IndexingMode};
use fluent_query_rust_lib::template::mongodb::MongoDbTemplate;
use fluent_query_rust_lib::{QueryConfig, ScanConsistency};
use tracing::{Level, info};
use tracing_subscriber::fmt::layer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Registry};

#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum Consistency {
    #[default]
    NotBounded,
    RequestPlus,
}

impl From<Consistency> for ScanConsistency {
    fn from(value: Consistency) -> Self {
        match value {
            Consistency::NotBounded => ScanConsistency::NotBounded,
            Consistency::RequestPlus => ScanConsistency::RequestPlus,
        }
    }
}

#[derive(clap::Args, Clone, Debug)]
pub struct QueryArgs {
    #[clap(long)]
    category: Option<String>,
    #[clap(long)]
    max_price_cents: Option<u64>,
    #[clap(long)]
    limit: Option<u64>,
    /// Remove the matching products once reported.
    #[clap(long)]
    purge: bool,
}

impl From<&QueryArgs> for ReportOptions {
    fn from(args: &QueryArgs) -> Self {
        ReportOptions {
            category: args.category.clone(),
            max_price_cents: args.max_price_cents,
            limit: args.limit,
            purge: args.purge,
        }
    }
}

#[derive(Subcommand, Clone, Debug)]
pub enum Commands {
    /// Query a seeded in-memory catalog.
    Memory {
        #[clap(long)]
        deferred_index: bool,
        #[clap(flatten)]
        query: QueryArgs,
    },
    /// Query a catalog stored in MongoDB.
    Mongo {
        #[clap(short, long, env = "MONGO_URI_SECRET")]
        mongo_uri: String,
        #[clap(long, default_value = "catalog")]
        database: String,
        #[clap(long)]
        seed: bool,
        #[clap(flatten)]
        query: QueryArgs,
    },
}

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[clap(long, global = true)]
    pub log_level: Option<Level>,
    #[clap(long, global = true, env = "CATALOG_COLLECTION", default_value = "shop.products")]
    pub collection: String,
    #[clap(long, global = true, value_enum, default_value_t = Consistency::NotBounded)]
    pub consistency: Consistency,
    #[clap(subcommand)]
    pub command: Commands,
}

impl Cli {
    fn config(&self) -> QueryConfig {
        QueryConfig::new(self.collection.clone(), self.consistency.into())
    }

    pub async fn execute(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync + 'static>> {
        match &self.command {
            Commands::Memory {
                deferred_index,
                query,
            } => {
                let indexing = if *deferred_index {
                    IndexingMode::Deferred
                } else {
                    IndexingMode::Immediate
                };
                let template = InMemoryTemplate::new()
                    .with_bucket_name("shop")
                    .with_indexing(indexing);
                for product in catalog() {
                    template.upsert(&self.collection, &product).await?;
                }
                let operations = ReactiveOperations::new(template).with_config(self.config());
                let summary = report::run(&operations, &query.into()).await?;
                info!(?summary, "Report done");
            }
            Commands::Mongo {
                mongo_uri,
                database,
                seed,
                query,
            } => {
                let client = mongodb::Client::with_uri_str(mongo_uri).await?;
                let template = MongoDbTemplate::new(client.database(database));
                if *seed {
                    for product in catalog() {
                        template.upsert(&self.collection, &product).await?;
                    }
                }
                let operations = ReactiveOperations::new(template).with_config(self.config());
                let summary = report::run(&operations, &query.into()).await?;
                info!(?summary, "Report done");
            }
        }
        Ok(())
    }
}

fn init_tracing(log_level: Level) {
    let filter = EnvFilter::from_default_env()
        .add_directive("info".parse().unwrap())
        .add_directive(format!("catalog={log_level}").parse().unwrap())
        .add_directive(format!("fluent_query_rust_lib={log_level}").parse().unwrap());
    let l = layer::<Registry>();
    let registry = tracing_subscriber::registry();

    registry
        .with(
            l.with_file(true)
                .with_line_number(true)
                .with_target(false)
                .compact(),
        )
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync + 'static>> {
    let cli = Cli::parse();
    init_tracing(cli.log_level.unwrap_or(Level::INFO));

    cli.execute().await?;
    Ok(())
}
