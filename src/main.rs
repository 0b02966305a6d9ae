use std::fs;
use std::io::{self, Read};
use std::process;

use clap::{Parser, Subcommand};
use erdpaste::{RenderOptions, decode_share, encode_share, parse_to_json, render_schema};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "erdpaste")]
#[command(version)]
#[command(about = "Turn a Rails schema.rb into an ER diagram", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the graph JSON for a schema
    Parse {
        /// Schema file, or `-` for stdin
        #[arg(value_name = "INPUT")]
        input: String,
    },
    /// Render a schema as SVG
    Render {
        /// Schema file, or `-` for stdin
        #[arg(value_name = "INPUT")]
        input: String,

        /// Output file (default: stdout)
        #[arg(short, long, value_name = "FILE")]
        output: Option<String>,

        /// Hide columns past the first few rows
        #[arg(short, long)]
        compact: bool,

        /// Highlight this table and its neighbors
        #[arg(short, long, value_name = "TABLE")]
        select: Option<String>,

        /// Highlight depth: a hop count or `all`
        #[arg(short, long, value_name = "DEPTH")]
        depth: Option<String>,

        /// Focus the table with this name and dim the rest
        #[arg(long, value_name = "QUERY")]
        search: Option<String>,

        /// Color links by table pair instead of by position
        #[arg(long)]
        color_by_relationship: bool,

        #[arg(long, value_name = "PX")]
        width: Option<f64>,

        #[arg(long, value_name = "PX")]
        height: Option<f64>,
    },
    /// Print a share token for a schema
    Encode {
        /// Schema file, or `-` for stdin
        #[arg(value_name = "INPUT")]
        input: String,
    },
    /// Print the graph and schema carried by a share token
    Decode {
        #[arg(value_name = "TOKEN")]
        token: String,
    },
}

fn read_input(path: &str) -> Result<String, String> {
    if path == "-" {
        let mut text = String::new();
        io::stdin()
            .read_to_string(&mut text)
            .map_err(|e| format!("Failed to read stdin: {e}"))?;
        return Ok(text);
    }
    fs::read_to_string(path).map_err(|e| format!("Failed to read {path}: {e}"))
}

fn run(cli: Cli) -> Result<(), String> {
    match cli.command {
        Command::Parse { input } => {
            let text = read_input(&input)?;
            let json = parse_to_json(&text).map_err(|e| e.to_json())?;
            println!("{json}");
        }
        Command::Render {
            input,
            output,
            compact,
            select,
            depth,
            search,
            color_by_relationship,
            width,
            height,
        } => {
            let text = read_input(&input)?;
            let options = RenderOptions {
                compact,
                width,
                height,
                select,
                depth,
                search,
                color_by_relationship,
            };
            let svg = render_schema(&text, &options).map_err(|e| e.to_json())?;
            match output {
                Some(path) => {
                    fs::write(&path, &svg).map_err(|e| format!("Failed to write {path}: {e}"))?
                }
                None => print!("{svg}"),
            }
        }
        Command::Encode { input } => {
            let text = read_input(&input)?;
            let graph = parse_to_json(&text).map_err(|e| e.to_json())?;
            let token = encode_share(&graph, &text).map_err(|e| e.to_json())?;
            println!("{token}");
        }
        Command::Decode { token } => {
            let json = decode_share(&token).map_err(|e| e.to_json())?;
            println!("{json}");
        }
    }
    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_writer(io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    if let Err(e) = run(Cli::parse()) {
        eprintln!("{e}");
        process::exit(1);
    }
}
