use anyhow::Result;
use clap::Parser;
use helixnet_lib::app::{App, RunMode, ShutdownManager};
use helixnet_lib::error::RunnerError;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// How evolution targets are driven
    #[arg(short, long, value_enum, default_value = "steady")]
    mode: RunMode,

    /// Config file path. Defaults to ./config.toml if present
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Seed for every random choice
    #[arg(long)]
    seed: Option<u64>,

    /// Run length in seconds, 0 runs until ctrl-c
    #[arg(long)]
    duration_secs: Option<u64>,

    /// Initial base node count
    #[arg(long)]
    initial_nodes: Option<usize>,

    /// Frame rate of the animation loop
    #[arg(long)]
    fps: Option<u64>,

    /// Print the effective configuration as TOML and exit
    #[arg(long)]
    dump_config: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    helixnet_core::metrics::init_logging();
    let args = Args::parse();

    let required = args.config.is_some();
    let path = args.config.unwrap_or_else(|| PathBuf::from("config.toml"));
    let mut config = App::load_config(&path, required)?;

    if let Some(seed) = args.seed {
        config.runtime.seed = Some(seed);
    }
    if let Some(secs) = args.duration_secs {
        config.runtime.duration_secs = secs;
    }
    if let Some(nodes) = args.initial_nodes {
        config.runtime.initial_nodes = nodes;
    }
    if let Some(fps) = args.fps {
        config.runtime.target_fps = fps;
    }
    config
        .validate()
        .map_err(|e| RunnerError::InvalidArgument(e.to_string()))?;

    if args.dump_config {
        println!("{}", toml::to_string_pretty(&config)?);
        return Ok(());
    }

    let shutdown = ShutdownManager::new();
    shutdown.listen_for_ctrl_c();

    let mut app = App::new(config, args.mode);
    let res = app.run(&shutdown).await;
    shutdown.cleanup(&app);
    res
}
