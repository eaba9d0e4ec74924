//! `serve`: start the local replay server over a previously written
//! `output_dir` (§4.15, §6). Independent of crawl sequencing — it only
//! reads files a prior `crawl` run (or anything shaped like its output)
//! already wrote.

use crate::{logging, server};
use anyhow::Result;
use clap::Args;
use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Directory holding a crawl's report output (same as `--output-dir`
    /// on the `crawl` command).
    #[arg(long, default_value = "output")]
    pub output_dir: PathBuf,

    /// Address to bind the replay server to.
    #[arg(long, default_value = "127.0.0.1:4000")]
    pub addr: SocketAddr,

    /// Debug-level logging.
    #[arg(short = 'd', long)]
    pub debug: bool,

    /// Info-level logging.
    #[arg(short = 'v', long)]
    pub verbose: bool,
}

pub async fn run(args: ServeArgs) -> Result<()> {
    logging::init(logging::Verbosity::from_flags(args.debug, args.verbose), "info");
    server::serve(args.output_dir, args.addr).await
}
