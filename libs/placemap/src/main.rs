use clap::Parser;
use placemap::{config::Config, error::Error};

#[tokio::main(flavor = "current_thread")]
async fn main() -> miette::Result<()> {
    let _ = tracing_subscriber::fmt::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive("info".parse().expect("invalid filter"))
                .from_env_lossy(),
        )
        .try_init();

    let args = Cli::parse();
    let config = match Config::parse(args.config.clone()) {
        Ok(config) => config,
        Err(Error::ConfigNotFound) if args.config.is_none() => {
            let mut config = Config::default();
            config.apply_env();
            config
        }
        Err(err) => return Err(err.into()),
    };
    args.inner.run(config).await
}

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to the config file
    #[arg(short, long)]
    config: Option<String>,
    #[clap(flatten)]
    inner: placemap::cli::Args,
}
