use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use hierarchy::http::HttpServer;
use hierarchy::{Config, HierarchyService, SparqlClient, TraversalRequest};
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "hierarchy")]
#[command(about = "Ancestor and descendant traversal over concept hierarchies")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP service (default)
    Serve {
        /// Port to listen on (overrides http_server.port)
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Print the descendants of a concept as JSON
    Descendants {
        hierarchy: String,
        concept: String,
        /// Number of hops below the concept
        #[arg(short, long)]
        levels: Option<usize>,
        #[command(flatten)]
        filter: FilterArgs,
    },
    /// Print the ancestors of a concept as JSON
    Ancestors {
        hierarchy: String,
        concept: String,
        #[command(flatten)]
        filter: FilterArgs,
    },
}

#[derive(clap::Args, Debug)]
struct FilterArgs {
    /// Filter uuid to apply
    #[arg(short, long)]
    filter: Option<String>,

    /// Filter template parameter, as name=value (repeatable)
    #[arg(long = "param", value_parser = parse_param)]
    params: Vec<(String, String)>,
}

impl FilterArgs {
    fn apply(self, mut request: TraversalRequest) -> TraversalRequest {
        if let Some(filter) = self.filter {
            request = request.with_filter(filter);
        }
        for (name, value) in self.params {
            request = request.with_param(name, value);
        }
        request
    }
}

fn parse_param(raw: &str) -> std::result::Result<(String, String), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected name=value, got {:?}", raw))?;
    let name = name.trim().trim_start_matches("filter-");
    if name.is_empty() {
        return Err(format!("empty parameter name in {:?}", raw));
    }
    Ok((name.to_string(), value.to_string()))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration first so its log level can seed the logger
    let config = Config::load()?;

    env_logger::Builder::from_env(
        env_logger::Env::default()
            .filter_or("RUST_LOG", &config.service.log_level)
    ).init();

    let store = Arc::new(
        SparqlClient::new(&config.sparql).context("Failed to create SPARQL client")?,
    );
    log::info!("Graph store: {}", store.endpoint());
    let service = Arc::new(HierarchyService::new(store, &config));

    match cli.command.unwrap_or(Command::Serve { port: None }) {
        Command::Serve { port } => {
            log::info!("Starting hierarchy service v{}", env!("CARGO_PKG_VERSION"));
            let port = port.unwrap_or(config.http_server.port);
            HttpServer::new(service, &config.http_server).run(port).await?;
        }
        Command::Descendants {
            hierarchy,
            concept,
            levels,
            filter,
        } => {
            let mut request = TraversalRequest::new(hierarchy, concept);
            if let Some(levels) = levels {
                request = request.with_levels(levels);
            }
            let data = service.fetch_descendants(&filter.apply(request)).await?;
            println!("{}", serde_json::to_string_pretty(&serde_json::json!({ "data": data }))?);
        }
        Command::Ancestors {
            hierarchy,
            concept,
            filter,
        } => {
            let request = filter.apply(TraversalRequest::new(hierarchy, concept));
            let data = service.fetch_ancestors(&request).await?;
            println!("{}", serde_json::to_string_pretty(&serde_json::json!({ "data": data }))?);
        }
    }

    Ok(())
}
