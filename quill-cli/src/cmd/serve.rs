use anyhow::Result;
use clap::{Arg, ArgAction, ArgMatches, Command};
use notify::Watcher;
use notify_debouncer_mini::{DebounceEventResult, new_debouncer};
use quill_dev_server::{LiveServer, LiveServerConfig, Reloader};
use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use super::build::{add_build_args, build_site};
use crate::config::QuillConfig;

pub fn make_subcommand() -> Command {
    add_build_args(Command::new("serve"))
        .about("Start development server with live reload")
        .arg(
            Arg::new("port")
                .long("port")
                .value_name("PORT")
                .help("Port to serve on [default: 3000]"),
        )
        .arg(
            Arg::new("host")
                .long("host")
                .value_name("HOST")
                .help("Host to bind to [default: 127.0.0.1]"),
        )
        .arg(
            Arg::new("open")
                .long("open")
                .help("Open browser automatically")
                .action(ArgAction::SetTrue),
        )
}

pub async fn execute(args: &ArgMatches) -> Result<()> {
    let config = QuillConfig::load(args)?;
    let build = config.build.clone();

    build_site(&config, Some((build.host.as_str(), build.port)))?;

    let server = LiveServer::new(LiveServerConfig {
        host: build.host.clone(),
        port: build.port,
        root: PathBuf::from(&build.output),
        open: build.open,
    });
    let reloader = server.reloader();

    let server_handle = tokio::spawn(async move {
        if let Err(e) = server.run().await {
            log::error!("Dev server error: {}", e);
        }
    });

    let watch_args = args.clone();
    let watcher_handle = tokio::spawn(async move {
        if let Err(e) = watch_sources(config, watch_args, reloader).await {
            log::error!("Source watcher error: {}", e);
        }
    });

    let _ = tokio::try_join!(server_handle, watcher_handle)?;

    Ok(())
}

/// Inputs whose changes trigger a rebuild.
fn watched_paths(config: &QuillConfig) -> Vec<PathBuf> {
    let build = &config.build;
    [&build.posts, &build.theme, &build.static_dir, &build.config]
        .into_iter()
        .map(PathBuf::from)
        .filter(|path| path.exists())
        .collect()
}

fn is_source_change(path: &Path, sources: &[PathBuf]) -> bool {
    let path = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
    sources.iter().any(|source| {
        let source = source.canonicalize().unwrap_or_else(|_| source.clone());
        path.starts_with(&source)
    })
}

async fn watch_sources(config: QuillConfig, args: ArgMatches, reloader: Reloader) -> Result<()> {
    let (tx, mut rx) = tokio::sync::mpsc::channel(100);

    let mut debouncer = new_debouncer(
        Duration::from_millis(500),
        move |res: DebounceEventResult| {
            if let Ok(events) = res {
                for event in events {
                    let _ = tx.blocking_send(event.path);
                }
            }
        },
    )?;

    let sources = watched_paths(&config);
    for path in &sources {
        let mode = if path.is_dir() {
            notify::RecursiveMode::Recursive
        } else {
            notify::RecursiveMode::NonRecursive
        };
        debouncer.watcher().watch(path, mode)?;
        log::info!("Watching {}", path.display());
    }

    while let Some(path) = rx.recv().await {
        if !is_source_change(&path, &sources) {
            continue;
        }
        log::info!("Changed: {}", path.display());

        // Reload so edits to quill.toml apply too
        let config = match QuillConfig::load(&args) {
            Ok(config) => config,
            Err(e) => {
                log::error!("Invalid configuration: {:#}", e);
                continue;
            }
        };

        let build = &config.build;
        match build_site(&config, Some((build.host.as_str(), build.port))) {
            Ok(_) => {
                reloader.reload();
            }
            Err(e) => log::error!("Build error: {:#}", e),
        }
    }

    Ok(())
}
