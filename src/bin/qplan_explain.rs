//! Plan inspection binary
//!
//! Usage: qplan-explain <plan.json> [--check] [--pretty]
//!
//! Prints the EXPLAIN text and structural hash of a serialized plan.
//!
//! Exit codes:
//!   0 - Success
//!   2 - Plan file could not be read
//!   3 - Plan could not be reconstructed
//!   4 - Round trip check failed

use std::path::PathBuf;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use qplan::planner::{ExplainOutput, PlanNode};

#[derive(Parser)]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Explain a serialized query plan")]
struct Cli {
    /// Serialized plan (JSON)
    plan: PathBuf,

    /// Re-serialize the plan and verify it reads back unchanged
    #[arg(long, env = "QPLAN_CHECK")]
    check: bool,

    /// Also print the normalized JSON form
    #[arg(long)]
    pretty: bool,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let Cli {
        plan: path,
        check,
        pretty,
    } = Cli::parse();

    let text = match std::fs::read_to_string(&path) {
        Ok(t) => t,
        Err(e) => {
            eprintln!("ERROR: Failed to read {}: {}", path.display(), e);
            std::process::exit(2);
        }
    };

    let plan = match PlanNode::from_json_str(&text) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("ERROR: {}", e);
            std::process::exit(3);
        }
    };
    info!(nodes = plan.tree_size(), root = %plan.node_type(), "Loaded plan");

    print!("{}", ExplainOutput::format(&plan));
    println!("hash: {:016x}", plan.plan_hash());

    if pretty {
        match plan.to_json_pretty() {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("ERROR: {}", e);
                std::process::exit(3);
            }
        }
    }

    if check {
        let reread = plan
            .to_json_string()
            .and_then(|json| PlanNode::from_json_str(&json));
        match reread {
            Ok(back) if back == plan && back.plan_hash() == plan.plan_hash() => {
                println!("round trip: ok");
            }
            Ok(_) => {
                eprintln!("ERROR: Round trip produced a different plan");
                std::process::exit(4);
            }
            Err(e) => {
                eprintln!("ERROR: Round trip failed: {}", e);
                std::process::exit(4);
            }
        }
    }

    std::process::exit(0);
}
