use clap::Parser;
use terra_app::{AppError, AssetPaths, PlatformDirs, run};
use terra_config::{CliArgs, Config};

fn main() {
    if let Err(err) = try_main() {
        eprintln!("ERROR : {err}");
        std::process::exit(1);
    }
}

fn try_main() -> Result<(), AppError> {
    let args = CliArgs::parse();
    let dirs = PlatformDirs::resolve_and_create()?;
    let config_dir = args.config.clone().unwrap_or_else(|| dirs.config_dir.clone());

    let mut config = Config::load_or_create(&config_dir)?;
    config.apply_cli_overrides(&args);

    terra_log::init_logging(Some(&dirs.log_dir), cfg!(debug_assertions), Some(&config));
    tracing::info!(config = %config_dir.display(), logs = %dirs.log_dir.display(), "Terra explorer starting");

    let assets = AssetPaths::from_config(&config.assets);
    run(config, assets)
}
