//! poem CLI - Command line interface for poem_engine
//!
//! Every invocation loads the snapshot file, applies one command at the next
//! simulated block, and saves the result.

use anyhow::Context;
use clap::{Parser, Subcommand};
use poem_engine::events::{self, TrajectoryPoint};
use poem_engine::{
    Address, Chain, GraphView, NodeIndex, NodeSpec, NodeStore, Poem, PoemConfig, Snapshot,
    TokenId, VERSION,
};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "poem")]
#[command(about = "A shared generative poem driven by a tiny token population")]
#[command(version)]
struct Cli {
    /// Path to the snapshot file
    #[arg(short, long, default_value = "poem.snap")]
    state: PathBuf,

    /// Output format (json or text)
    #[arg(short, long, default_value = "json")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
enum OutputFormat {
    Json,
    Text,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new poem
    Init {
        /// JSON config file
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Start with no nodes instead of the default poem
        #[arg(long)]
        empty: bool,
        /// Label the simulated chain's genesis is derived from
        #[arg(long, default_value = "default")]
        genesis: String,
        /// Overwrite an existing snapshot
        #[arg(long)]
        force: bool,
    },

    // === Graph Commands ===
    /// Write a node (only before the first mint)
    NodeWrite {
        /// Node index, 1..=25
        index: NodeIndex,
        /// Text fragment
        value: String,
        /// Left child, 0 for none
        #[arg(short, long, default_value_t = 0)]
        left: NodeIndex,
        /// Right child, 0 for none
        #[arg(short, long, default_value_t = 0)]
        right: NodeIndex,
        /// Comma-separated sibling indices
        #[arg(short = 'S', long, value_delimiter = ',')]
        siblings: Vec<NodeIndex>,
    },

    /// Read a node
    Node {
        /// Node index, 1..=25
        index: NodeIndex,
    },

    /// Show the graph's levels and path count
    Graph,

    // === Lifecycle Commands ===
    /// Mint the next token
    Mint {
        /// Recipient address
        to: Address,
    },

    /// Transfer a token
    Transfer {
        from: Address,
        to: Address,
        token: TokenId,
    },

    /// Burn a token, advancing the poem one step
    Burn {
        holder: Address,
        token: TokenId,
    },

    /// Let blocks pass
    Hold {
        /// Number of blocks
        blocks: u64,
    },

    /// Apply a JSON event log
    Replay {
        /// Event log file
        log: PathBuf,
        /// Print the trajectory without saving
        #[arg(long)]
        dry_run: bool,
    },

    // === Views ===
    /// Show position, seed and supply
    Status,

    /// Print the verse so far
    Verse,

    /// Show one token, or every live token
    Token {
        id: Option<TokenId>,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init {
            config,
            empty,
            genesis,
            force,
        } => {
            if cli.state.exists() && !force {
                anyhow::bail!(
                    "{} already exists (use --force to overwrite)",
                    cli.state.display()
                );
            }
            let config = match config {
                Some(path) => PoemConfig::load(&path)?,
                None => PoemConfig::default(),
            };
            let poem = if empty {
                Poem::new(config)?
            } else {
                Poem::with_default_graph(config)?
            };
            let snapshot = Snapshot::new(poem, Chain::from_label(&genesis));
            snapshot.save(&cli.state)?;
            output(
                &cli.format,
                &serde_json::json!({
                    "status": "ok",
                    "message": format!("Created poem at {}", cli.state.display()),
                    "encoding": snapshot.poem.config().encoding,
                    "nodes": snapshot.poem.nodes().len(),
                    "version": VERSION
                }),
            );
        }

        Commands::NodeWrite {
            index,
            value,
            left,
            right,
            siblings,
        } => {
            let mut snapshot = open_state(&cli.state)?;
            let spec = NodeSpec::new(index, value)
                .children(left, right)
                .siblings(&siblings);
            snapshot.poem.write_node(&spec)?;
            snapshot.save(&cli.state)?;
            output(
                &cli.format,
                &serde_json::json!({
                    "status": "ok",
                    "index": index
                }),
            );
        }

        Commands::Node { index } => {
            let snapshot = open_state(&cli.state)?;
            let node = snapshot.poem.read_node(index)?;
            output(
                &cli.format,
                &serde_json::json!({
                    "index": node.index,
                    "value": node.value.text(),
                    "raw": node.value.to_hex(),
                    "left_child": node.left_child,
                    "right_child": node.right_child,
                    "siblings": node.siblings
                }),
            );
        }

        Commands::Graph => {
            let snapshot = open_state(&cli.state)?;
            let view = GraphView::new(snapshot.poem.nodes());
            // a partial graph is reported, not treated as a failure
            let levels = view.levels().ok();
            let paths = view.count_paths().ok();
            let valid = view.validate_diamond();
            output(
                &cli.format,
                &serde_json::json!({
                    "encoding": snapshot.poem.config().encoding,
                    "nodes": snapshot.poem.nodes().len(),
                    "levels": levels,
                    "paths": paths,
                    "valid": valid.is_ok(),
                    "problem": valid.err().map(|e| e.to_string())
                }),
            );
        }

        Commands::Mint { to } => {
            let mut snapshot = open_state(&cli.state)?;
            let block = snapshot.chain.next_block();
            let token = snapshot.poem.mint(&to, &block)?;
            snapshot.save(&cli.state)?;
            output(
                &cli.format,
                &serde_json::json!({
                    "status": "ok",
                    "token": token,
                    "to": to,
                    "block": block.number,
                    "seed": snapshot.poem.seed()
                }),
            );
        }

        Commands::Transfer { from, to, token } => {
            let mut snapshot = open_state(&cli.state)?;
            let block = snapshot.chain.next_block();
            snapshot.poem.transfer(&from, &to, token, &block)?;
            snapshot.save(&cli.state)?;
            output(
                &cli.format,
                &serde_json::json!({
                    "status": "ok",
                    "token": token,
                    "from": from,
                    "to": to,
                    "block": block.number,
                    "seed": snapshot.poem.seed()
                }),
            );
        }

        Commands::Burn { holder, token } => {
            let mut snapshot = open_state(&cli.state)?;
            let block = snapshot.chain.next_block();
            let receipt = snapshot.poem.burn(&holder, token, &block)?;
            snapshot.save(&cli.state)?;
            output(
                &cli.format,
                &serde_json::json!({
                    "status": "ok",
                    "token": token,
                    "block": block.number,
                    "step": receipt.step,
                    "path": snapshot.poem.path(),
                    "curr_step": snapshot.poem.curr_step(),
                    "seed": receipt.seed
                }),
            );
        }

        Commands::Hold { blocks } => {
            let mut snapshot = open_state(&cli.state)?;
            let head = snapshot.chain.advance(blocks)?;
            snapshot.save(&cli.state)?;
            output(
                &cli.format,
                &serde_json::json!({
                    "status": "ok",
                    "block": head.number
                }),
            );
        }

        Commands::Replay { log, dry_run } => {
            let mut snapshot = open_state(&cli.state)?;
            let content = std::fs::read_to_string(&log)
                .with_context(|| format!("Failed to read {}", log.display()))?;
            let events = events::parse_log(&content)?;
            let trajectory: Vec<TrajectoryPoint> =
                events::replay(&mut snapshot.poem, &mut snapshot.chain, &events)?;
            if !dry_run {
                snapshot.save(&cli.state)?;
            }
            output(
                &cli.format,
                &serde_json::json!({
                    "status": "ok",
                    "events": events.len(),
                    "saved": !dry_run,
                    "trajectory": trajectory
                }),
            );
        }

        Commands::Status => {
            let snapshot = open_state(&cli.state)?;
            let poem = &snapshot.poem;
            output(
                &cli.format,
                &serde_json::json!({
                    "state": cli.state.display().to_string(),
                    "block": snapshot.chain.head().number,
                    "path": poem.path(),
                    "curr_step": poem.curr_step(),
                    "complete": poem.machine().is_complete(),
                    "seed": poem.seed(),
                    "frozen": poem.is_frozen(),
                    "minted": poem.ledger().minted(),
                    "live": poem.ledger().live(),
                    "max_supply": poem.ledger().limits().max_supply
                }),
            );
        }

        Commands::Verse => {
            let snapshot = open_state(&cli.state)?;
            let verse = snapshot.poem.verse()?;
            match cli.format {
                OutputFormat::Json => output(
                    &cli.format,
                    &serde_json::json!({
                        "curr_step": snapshot.poem.curr_step(),
                        "verse": verse
                    }),
                ),
                OutputFormat::Text => println!("{}", verse),
            }
        }

        Commands::Token { id } => {
            let snapshot = open_state(&cli.state)?;
            match id {
                Some(id) => {
                    let view = snapshot.poem.token_view(id)?;
                    output(&cli.format, &serde_json::to_value(view)?);
                }
                None => {
                    let views = snapshot.poem.token_views()?;
                    output(
                        &cli.format,
                        &serde_json::json!({
                            "count": views.len(),
                            "tokens": views
                        }),
                    );
                }
            }
        }
    }

    Ok(())
}

fn open_state(path: &Path) -> anyhow::Result<Snapshot> {
    Snapshot::load(path).with_context(|| {
        format!(
            "Failed to open {} (run `poem init` first)",
            path.display()
        )
    })
}

fn output(format: &OutputFormat, value: &serde_json::Value) {
    let rendered = match format {
        OutputFormat::Json => serde_json::to_string(value),
        OutputFormat::Text => serde_json::to_string_pretty(value),
    };
    match rendered {
        Ok(text) => println!("{}", text),
        Err(e) => eprintln!("Failed to render output: {}", e),
    }
}
