use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;
mod config;
mod fixture;
mod logging;
mod report;
mod server;
mod users;

use commands::{crawl, demo, serve};

/// demodocus - accessibility-focused state-space crawler and graph analyzer.
#[derive(Parser)]
#[command(name = "demodocus")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Crawl a site's state space and score it for user-ability accessibility", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    crawl: crawl::CrawlArgs,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the local replay server over a previously written output directory.
    Serve(serve::ServeArgs),

    /// Load one bundled fixture scenario and print its initial state.
    Demo(demo::DemoArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let result = match cli.command {
        Some(Commands::Serve(args)) => serve::run(args).await,
        Some(Commands::Demo(args)) => demo::run(args).await,
        None => crawl::run(cli.crawl).await,
    };

    if let Err(err) = &result {
        eprintln!("error: {err:#}");
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_subcommand_parses_as_default_crawl() {
        let cli = Cli::try_parse_from(["demodocus", "toggle-page"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.crawl.entry_point.as_deref(), Some("toggle-page"));
    }

    #[test]
    fn serve_subcommand_parses_output_dir_and_addr() {
        let cli = Cli::try_parse_from(["demodocus", "serve", "--output-dir", "out", "--addr", "127.0.0.1:5000"]).unwrap();
        match cli.command {
            Some(Commands::Serve(args)) => {
                assert_eq!(args.output_dir.to_string_lossy(), "out");
                assert_eq!(args.addr.port(), 5000);
            }
            _ => panic!("expected Serve subcommand"),
        }
    }

    #[test]
    fn demo_subcommand_defaults_to_toggle_page() {
        let cli = Cli::try_parse_from(["demodocus", "demo"]).unwrap();
        match cli.command {
            Some(Commands::Demo(args)) => assert_eq!(args.scenario, "toggle-page"),
            _ => panic!("expected Demo subcommand"),
        }
    }

    #[test]
    fn default_path_accepts_input_file_flag() {
        let cli = Cli::try_parse_from(["demodocus", "-i", "entries.txt"]).unwrap();
        assert_eq!(cli.crawl.input_file.unwrap().to_string_lossy(), "entries.txt");
    }
}
