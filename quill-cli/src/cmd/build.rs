use anyhow::{Context, Result};
use clap::{Arg, ArgAction, ArgMatches, Command};
use quill_core::{BuildReport, SiteBuilder};

use crate::config::QuillConfig;

pub fn add_build_args(command: Command) -> Command {
    command
        .arg(
            Arg::new("posts")
                .short('p')
                .long("posts")
                .value_name("DIR")
                .help("Directory containing one folder per post"),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .value_name("DIR")
                .help("Output directory for generated site"),
        )
        .arg(
            Arg::new("theme")
                .short('t')
                .long("theme")
                .value_name("DIR")
                .help("Directory of templates overriding the built-in ones"),
        )
        .arg(
            Arg::new("static")
                .long("static")
                .value_name("DIR")
                .help("Files copied verbatim into the output"),
        )
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help(
                    "Configuration file [default: ./quill.toml]; the repository's quill.toml \
                     is a complete sample with tags and materials",
                ),
        )
        .arg(
            Arg::new("drafts")
                .long("drafts")
                .help("Include posts marked as draft")
                .action(ArgAction::SetTrue),
        )
}

pub fn make_subcommand() -> Command {
    add_build_args(Command::new("build")).about("Build the static site")
}

/// Builds the whole site once. `livereload` is the dev server address
/// pages should connect back to.
pub fn build_site(config: &QuillConfig, livereload: Option<(&str, u16)>) -> Result<BuildReport> {
    let build = &config.build;

    let mut builder = SiteBuilder::new()
        .posts_dir(&build.posts)
        .output_dir(&build.output)
        .theme_dir(&build.theme)
        .static_dir(&build.static_dir)
        .config(config.site.clone())
        .include_drafts(build.drafts);
    if let Some((host, port)) = livereload {
        builder = builder.livereload(host, port);
    }

    let site = builder
        .build()
        .with_context(|| format!("Failed to load site from {}", build.posts))?;
    let report = site.render_all()?;

    Ok(report)
}

pub fn execute(args: &ArgMatches) -> Result<()> {
    let config = QuillConfig::load(args)?;
    let report = build_site(&config, None)?;

    log::info!(
        "Site built in {} ({} pages, {} static files)",
        config.build.output,
        report.pages,
        report.static_files
    );

    Ok(())
}
