use anyhow::Context;
use clap::Parser;
use std::{
    env,
    path::PathBuf,
    str::FromStr,
};
use tracing_subscriber::{
    Layer,
    filter::EnvFilter,
    layer::SubscriberExt,
    registry,
};

#[cfg(feature = "env")]
use dotenvy::dotenv;

pub mod run;

#[derive(Parser, Debug)]
#[clap(
    name = "graphql-endpoint",
    about = "Serves a GraphQL schema over HTTP",
    version,
    rename_all = "kebab-case"
)]
pub struct Opt {
    #[clap(subcommand)]
    command: Endpoint,
}

#[derive(Debug, Parser)]
pub enum Endpoint {
    Run(run::Command),
}

pub const LOG_FILTER: &str = "RUST_LOG";
pub const HUMAN_LOGGING: &str = "HUMAN_LOGGING";

#[cfg(feature = "env")]
fn init_environment() -> Option<PathBuf> {
    dotenv().ok()
}

#[cfg(not(feature = "env"))]
fn init_environment() -> Option<PathBuf> {
    None
}

fn human_logging() -> anyhow::Result<bool> {
    match env::var(HUMAN_LOGGING) {
        Ok(value) => bool::from_str(&value).with_context(|| {
            format!("Expected `true` or `false` to be provided for `{HUMAN_LOGGING}`")
        }),
        Err(_) => Ok(true),
    }
}

pub fn init_logging() -> anyhow::Result<()> {
    let filter = match env::var_os(LOG_FILTER) {
        Some(_) => EnvFilter::try_from_default_env()
            .with_context(|| format!("Invalid `{LOG_FILTER}` provided"))?,
        None => EnvFilter::new("info"),
    };

    let layer = tracing_subscriber::fmt::Layer::default().with_writer(std::io::stderr);

    let fmt = if human_logging()? {
        layer
            .with_ansi(true)
            .with_level(true)
            .with_line_number(true)
            .boxed()
    } else {
        // machine parseable
        layer
            .with_ansi(false)
            .with_level(true)
            .with_line_number(true)
            .json()
            .boxed()
    };

    let subscriber = registry::Registry::default().with(filter).with(fmt);

    tracing::subscriber::set_global_default(subscriber)
        .context("Setting the global tracing subscriber failed")?;
    Ok(())
}

pub async fn run_cli() -> anyhow::Result<()> {
    // `.env` first so that `RUST_LOG` and `HUMAN_LOGGING` may come from it.
    let env_file = init_environment();
    init_logging()?;
    if let Some(path) = env_file {
        let path = path.display();
        tracing::info!("Loaded environment variables from {path}");
    }

    let opt = Opt::try_parse();
    if opt.is_err() {
        // Without a subcommand the server is started with the `run` flags.
        if let Ok(command) = run::Command::try_parse() {
            return run::exec(command).await
        }
    }

    match opt {
        Ok(opt) => match opt.command {
            Endpoint::Run(command) => run::exec(command).await,
        },
        Err(e) => e.exit(),
    }
}
