//! graph-ingest CLI - load and query the task/workflow knowledge graph

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::info;

use graph_ingest::client::FalkorClient;
use graph_ingest::config::ImportConfig;
use graph_ingest::ingestion::{CompositeObserver, FileObserver, IngestionObserver, SourceFormat, TracingObserver};
use graph_ingest::loader::{run_import, verify};
use graph_ingest::query::catalog::Row;
use graph_ingest::query::Catalog;

#[derive(Parser)]
#[command(name = "graph-ingest")]
#[command(about = "Load CSV/RTF tables into a graph store and query the result")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct Connection {
    /// JSON config file (flags below override it)
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[arg(long)]
    host: Option<String>,

    #[arg(long)]
    port: Option<u16>,

    /// Target graph name
    #[arg(short, long)]
    graph: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Load all five tables, create indexes and verify
    Import {
        #[command(flatten)]
        conn: Connection,

        /// Directory holding the table files
        #[arg(short, long)]
        data_dir: Option<PathBuf>,

        /// Source format (csv or rtf)
        #[arg(short, long, value_parser = parse_format)]
        format: Option<SourceFormat>,

        /// Record edge rows that created no relationship as errors
        #[arg(long)]
        strict_edges: bool,

        /// Skip index creation
        #[arg(long)]
        no_indexes: bool,

        /// Skip post-load verification
        #[arg(long)]
        no_verify: bool,

        /// Also append table/row events to this file
        #[arg(long)]
        log_file: Option<PathBuf>,
    },

    /// Run the verification queries against an existing graph
    Verify {
        #[command(flatten)]
        conn: Connection,

        /// Role for the sample traversal
        #[arg(long)]
        role: Option<String>,

        /// Workflow id for the sample traversal
        #[arg(long)]
        workflow: Option<String>,
    },

    /// Read-only lookups
    Query {
        #[command(flatten)]
        conn: Connection,

        /// Print rows as JSON
        #[arg(long)]
        json: bool,

        #[command(subcommand)]
        query: QueryCommand,
    },
}

#[derive(Subcommand)]
enum QueryCommand {
    /// List all roles
    Roles,
    /// Tasks for one role
    TasksByRole { role: String },
    /// Workflow details and its tasks in sequence order
    Workflow { workflow_id: String },
    /// Dependencies of one task
    Dependencies { task_id: String },
    /// Search tasks by keyword
    Search { keyword: String },
    /// Workflows of one complexity level
    Complexity { level: String },
    /// Roles involved per workflow
    Collaboration,
    /// Raw read-only Cypher
    Cypher { query: String },
}

fn parse_format(s: &str) -> Result<SourceFormat, String> {
    SourceFormat::from_extension(s).ok_or_else(|| format!("unknown format '{s}' (expected csv or rtf)"))
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    if let Err(e) = run(Cli::parse()) {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Import {
            conn,
            data_dir,
            format,
            strict_edges,
            no_indexes,
            no_verify,
            log_file,
        } => {
            let mut cfg = load_config(&conn)?;
            if let Some(dir) = data_dir {
                cfg.data_dir = dir;
            }
            if let Some(f) = format {
                cfg.format = f;
            }
            cfg.strict_edges |= strict_edges;
            cfg.create_indexes &= !no_indexes;
            cfg.verify &= !no_verify;
            if log_file.is_some() {
                cfg.log_file = log_file;
            }
            import(&cfg)
        }
        Commands::Verify { conn, role, workflow } => {
            let mut cfg = load_config(&conn)?;
            if let Some(r) = role {
                cfg.sample_role = r;
            }
            if let Some(w) = workflow {
                cfg.sample_workflow = w;
            }
            run_verify(&cfg)
        }
        Commands::Query { conn, json, query } => run_query(&load_config(&conn)?, query, json),
    }
}

fn load_config(conn: &Connection) -> Result<ImportConfig> {
    let mut cfg = match &conn.config {
        Some(path) => ImportConfig::from_path(path)?,
        None => ImportConfig::default(),
    };
    if let Some(host) = &conn.host {
        cfg.host = host.clone();
    }
    if let Some(port) = conn.port {
        cfg.port = port;
    }
    if let Some(graph) = &conn.graph {
        cfg.graph = graph.clone();
    }
    Ok(cfg)
}

fn connect(cfg: &ImportConfig) -> Result<FalkorClient> {
    let mut client = FalkorClient::connect(&cfg.host, cfg.port)
        .with_context(|| format!("connecting to {}:{}", cfg.host, cfg.port))?;
    client.ping().context("graph store did not answer PING")?;
    info!(addr = client.addr(), graph = %cfg.graph, "connected");
    Ok(client)
}

fn import(cfg: &ImportConfig) -> Result<()> {
    let sources = cfg.resolve_sources()?;

    let mut observers: Vec<Arc<dyn IngestionObserver>> = vec![Arc::new(TracingObserver)];
    if let Some(path) = &cfg.log_file {
        observers.push(Arc::new(FileObserver::new(path)));
    }
    let observer: Arc<dyn IngestionObserver> = Arc::new(CompositeObserver::new(observers));

    let client = connect(cfg)?;
    let report = run_import(client, &sources, cfg.load_options(Some(observer)), &cfg.post_load())?;
    println!("{report}");
    Ok(())
}

fn run_verify(cfg: &ImportConfig) -> Result<()> {
    let mut client = connect(cfg)?;
    let report = verify(&mut client, &cfg.graph, Some(&cfg.sample()));
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn run_query(cfg: &ImportConfig, query: QueryCommand, json: bool) -> Result<()> {
    let mut catalog = Catalog::new(connect(cfg)?, cfg.graph.clone());

    let rows: Vec<Row> = match query {
        QueryCommand::Roles => {
            let roles = catalog.all_roles()?;
            println!("Available roles: {}", roles.join(", "));
            return Ok(());
        }
        QueryCommand::TasksByRole { role } => catalog.tasks_by_role(&role)?,
        QueryCommand::Workflow { workflow_id } => {
            match catalog.workflow_details(&workflow_id)? {
                Some(details) => print_rows(&[details], json)?,
                None => {
                    println!("Workflow not found");
                    return Ok(());
                }
            }
            catalog.workflow_tasks(&workflow_id)?
        }
        QueryCommand::Dependencies { task_id } => catalog.task_dependencies(&task_id)?,
        QueryCommand::Search { keyword } => catalog.search_tasks_by_keyword(&keyword)?,
        QueryCommand::Complexity { level } => catalog.workflows_by_complexity(&level)?,
        QueryCommand::Collaboration => catalog.role_collaboration_map()?,
        QueryCommand::Cypher { query } => catalog.cypher(&query)?,
    };

    print_rows(&rows, json)
}

fn print_rows(rows: &[Row], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(rows)?);
        return Ok(());
    }
    if rows.is_empty() {
        println!("(no results)");
    }
    for row in rows {
        let line = row
            .iter()
            .map(|(k, v)| match v {
                serde_json::Value::String(s) => format!("{k}={s}"),
                other => format!("{k}={other}"),
            })
            .collect::<Vec<_>>()
            .join("  ");
        println!("  {line}");
    }
    Ok(())
}
