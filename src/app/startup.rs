//! Application startup and command dispatch

use crate::app::cli::args::{Args, Command};
use crate::app::cli::config::{load_config, HostConfig};
use crate::app::cli::display::display_listing;
use crate::core::error_handling::{exit_code_for, log_error_with_context};
use crate::core::logging::init_logging;
use crate::core::shutdown::ShutdownCoordinator;
use crate::core::version::long_version;
use crate::notifications::api::{Event, SystemEvent, SystemEventType};
use crate::plugin::api::{PluginManager, PluginResult};
use clap::Parser;

/// Parse the command line and run the selected command. Returns the exit code.
pub async fn startup() -> i32 {
    run_with_args(Args::parse()).await
}

pub async fn run_with_args(args: Args) -> i32 {
    let mut config = match load_config(args.config_file.as_deref()).await {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            return exit_code_for(&e);
        }
    };
    config.apply_args(&args);

    if let Err(e) = init_logging(&config.logging) {
        eprintln!("Could not initialise logging: {}", e);
    }
    log::debug!("bundlehost {}", long_version());

    let manager = PluginManager::builder()
        .config(config.manager.clone())
        .build();

    let result = execute(&args.command, &manager, &config).await;
    manager.close().await;

    match result {
        Ok(()) => 0,
        Err(e) => {
            log_error_with_context(&e, command_context(&args.command));
            exit_code_for(&e)
        }
    }
}

fn command_context(command: &Command) -> &'static str {
    match command {
        Command::List { .. } => "Listing bundles",
        Command::Inspect { .. } => "Inspecting bundle",
        Command::Run { .. } => "Running bundle host",
    }
}

/// Run one command against a fresh manager. The caller closes the manager.
pub async fn execute(
    command: &Command,
    manager: &PluginManager,
    config: &HostConfig,
) -> PluginResult<()> {
    match command {
        Command::List { discover, plugin } => {
            load_configured_bundles(manager, config).await;
            if *discover {
                manager.discover_process_wide().await;
            }

            let mut bundles = Vec::new();
            for name in manager.bundle_names().await {
                if let Some(info) = manager.bundle_info(&name).await {
                    bundles.push(info);
                }
            }
            let plugins = match plugin {
                Some(name) => manager.find_plugins(name).await?,
                None => manager.plugin_summaries().await,
            };
            display_listing(&bundles, &plugins, config.logging.color);
            Ok(())
        }
        Command::Inspect { bundle } => {
            let info = manager.load_bundle(&bundle.display().to_string()).await?;
            match serde_json::to_string_pretty(&info) {
                Ok(json) => println!("{}", json),
                Err(e) => log::error!("Could not render descriptor of '{}': {}", info.name, e),
            }
            Ok(())
        }
        Command::Run { discover } => {
            let loaded = load_configured_bundles(manager, config).await;
            if *discover || config.manager.auto_discover {
                manager.discover_process_wide().await;
            }
            log::info!(
                "Hosting {} bundle(s) and {} plugin(s); press Ctrl-C to stop",
                loaded,
                manager.plugin_count().await
            );

            manager
                .publish(Event::System(SystemEvent::new(SystemEventType::Startup)))
                .await;
            ShutdownCoordinator::guard(|_coordinator, mut shutdown_rx| async move {
                let _ = shutdown_rx.recv().await;
            })
            .await;
            Ok(())
        }
    }
}

async fn load_configured_bundles(manager: &PluginManager, config: &HostConfig) -> usize {
    let Some(dir) = config.bundle_dir() else {
        log::warn!("No bundle directory configured");
        return 0;
    };
    if !dir.is_dir() {
        log::info!("Bundle directory {} does not exist", dir.display());
        return 0;
    }

    let loaded = manager.load_bundles_from_dir(&dir).await;
    log::debug!("Loaded {} bundle(s) from {}", loaded.len(), dir.display());
    loaded.len()
}
