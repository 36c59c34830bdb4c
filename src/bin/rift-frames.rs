use std::io::Read;
use std::path::PathBuf;
use std::process;

use anyhow::Context;
use clap::{Parser, Subcommand};
use rift_frames::common::config::{Config, config_file, restore_file};
use rift_frames::common::log;
use rift_frames::layout_engine::{FrameTree, LayoutEngine, Rect};
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "rift-frames")]
#[command(about = "Drive the frame tree layout engine from the command line")]
struct Cli {
    /// Configuration file. Defaults to the user config, or built-in defaults
    /// when that does not exist.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Monitor rectangle the layout is computed for.
    #[arg(long, global = true, default_value = "1920x1080+0+0")]
    rect: Rect,

    /// Log at debug level unless RIFT_FRAMES_LOG says otherwise.
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a command script, one command per line; reads stdin without SCRIPT.
    Run {
        script: Option<PathBuf>,

        /// Start from the state saved by a previous `--save`.
        #[arg(long)]
        restore: bool,

        /// Save the resulting state for a later `--restore`.
        #[arg(long)]
        save: bool,
    },
    /// Parse a layout description and print it normalized.
    Check {
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        description: Vec<String>,
    },
}

fn load_config(path: Option<PathBuf>) -> anyhow::Result<Config> {
    let path = path.unwrap_or_else(config_file);
    let mut config = Config::read_or_default(&path)
        .with_context(|| format!("could not read config {}", path.display()))?;
    for issue in config.validate() {
        warn!("config: {issue}");
    }
    let fixed = config.auto_fix_values();
    if fixed > 0 {
        info!(fixed, "corrected invalid config values");
    }
    Ok(config)
}

fn run_script(
    config: &Config,
    rect: Rect,
    script: Option<PathBuf>,
    restore: bool,
    save: bool,
) -> anyhow::Result<i32> {
    let text = match &script {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("could not read script {}", path.display()))?,
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };

    let mut engine = if restore {
        LayoutEngine::restore_state(&restore_file(), config.settings.clone())
            .context("could not restore saved state")?
    } else {
        LayoutEngine::new(config)?
    };
    engine.set_screen(rect);

    let mut status = 0;
    for (number, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let argv: Vec<&str> = line.split_whitespace().collect();
        match engine.run(&argv) {
            Ok(output) if output.is_empty() => {}
            Ok(output) => println!("{}", output.trim_end()),
            Err(err) => {
                eprintln!("line {}: {line}: {err}", number + 1);
                if status == 0 {
                    status = err.code();
                }
            }
        }
    }

    let result = engine.compute_layout(rect);
    println!("{}", serde_json::to_string_pretty(&result)?);

    if save {
        engine.save_state(&restore_file())?;
    }
    Ok(status)
}

fn check(config: &Config, description: &[String]) -> i32 {
    let text = description.join(" ");
    let mut tree = FrameTree::new(config.settings.default_frame_layout);
    let root = tree.root();
    match tree.load(root, &text, &|_| true, config.settings.max_alignment_depth) {
        Ok(rest) => {
            println!("{}", tree.dump(root));
            if !rest.is_empty() {
                eprintln!("ignored trailing input: {rest}");
            }
            0
        }
        Err(err) => {
            eprintln!("{err}");
            2
        }
    }
}

fn main() {
    let cli: Cli = Parser::parse();
    log::init_logging(if cli.verbose { "debug" } else { "warn" });

    let result = load_config(cli.config).and_then(|config| match cli.command {
        Commands::Run { script, restore, save } => run_script(&config, cli.rect, script, restore, save),
        Commands::Check { description } => Ok(check(&config, &description)),
    });
    match result {
        Ok(status) => process::exit(status),
        Err(err) => {
            eprintln!("rift-frames: {err:#}");
            process::exit(1);
        }
    }
}
