use anyhow::Result;
use clap::ArgMatches;
use config::{Config as ConfigBuilder, Environment, File};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

pub const DEFAULT_CONFIG_FILE: &str = "./quill.toml";

/// Complete configuration that merges CLI args, env vars, config files, and defaults
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct QuillConfig {
    /// Build configuration
    pub build: BuildConfig,
    /// Site configuration (from quill-core)
    #[serde(flatten)]
    pub site: quill_core::config::Config,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BuildConfig {
    /// Directory holding one folder per post
    pub posts: String,
    /// Output directory for generated site
    pub output: String,
    /// Template overrides
    pub theme: String,
    /// Copied verbatim into the output
    pub static_dir: String,
    /// Configuration file path
    pub config: String,
    /// Host for dev server
    pub host: String,
    /// Port for dev server
    pub port: u16,
    /// Open browser automatically
    pub open: bool,
    /// Render posts marked `draft: true`
    pub drafts: bool,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            posts: "./posts".to_string(),
            output: "./out".to_string(),
            theme: "./theme".to_string(),
            static_dir: "./static".to_string(),
            config: DEFAULT_CONFIG_FILE.to_string(),
            host: "127.0.0.1".to_string(),
            port: 3000,
            open: false,
            drafts: false,
        }
    }
}

impl QuillConfig {
    /// Load configuration with cascading precedence:
    /// 1. CLI arguments (highest priority)
    /// 2. Environment variables (QUILL_*)
    /// 3. Configuration file
    /// 4. Defaults (lowest priority)
    pub fn load(args: &ArgMatches) -> Result<Self> {
        let config_file = string_arg(args, "config")
            .cloned()
            .unwrap_or_else(|| DEFAULT_CONFIG_FILE.to_string());

        let mut builder = ConfigBuilder::builder();

        builder = builder.add_source(ConfigBuilder::try_from(&Self::default())?);

        if Path::new(&config_file).exists() {
            log::debug!("Reading configuration from {}", config_file);
            builder = builder.add_source(File::from(Path::new(&config_file)));
        }

        builder = builder.add_source(
            Environment::with_prefix("QUILL")
                .prefix_separator("_")
                .separator("__"), // Use double underscore for nested keys
        );

        let mut cli_overrides = HashMap::new();
        for (arg, key) in [
            ("posts", "build.posts"),
            ("output", "build.output"),
            ("theme", "build.theme"),
            ("static", "build.static_dir"),
            ("config", "build.config"),
            ("host", "build.host"),
        ] {
            if let Some(value) = string_arg(args, arg) {
                cli_overrides.insert(key.to_string(), value.clone());
            }
        }
        if let Some(port) = string_arg(args, "port") {
            let port: u16 = port
                .parse()
                .map_err(|_| anyhow::anyhow!("Invalid port: {}", port))?;
            cli_overrides.insert("build.port".to_string(), port.to_string());
        }
        for (flag, key) in [("open", "build.open"), ("drafts", "build.drafts")] {
            if flag_arg(args, flag) {
                cli_overrides.insert(key.to_string(), "true".to_string());
            }
        }

        if !cli_overrides.is_empty() {
            builder = builder.add_source(ConfigBuilder::try_from(&cli_overrides)?);
        }

        let config = builder.build()?;
        let quill_config: QuillConfig = config.try_deserialize()?;

        Ok(quill_config)
    }
}

// Only args defined for the running subcommand are present
fn string_arg<'a>(args: &'a ArgMatches, id: &str) -> Option<&'a String> {
    args.try_get_one::<String>(id).unwrap_or(None)
}

fn flag_arg(args: &ArgMatches, id: &str) -> bool {
    matches!(args.try_get_one::<bool>(id), Ok(Some(true)))
}
