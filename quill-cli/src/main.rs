mod cmd;
mod config;
mod logging;

use anyhow::Result;
use clap::Command;

#[tokio::main]
async fn main() -> Result<()> {
    logging::init_logging();

    let matches = Command::new("quill")
        .about("Static generator for a bilingual blog")
        .version(env!("CARGO_PKG_VERSION"))
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(cmd::build::make_subcommand())
        .subcommand(cmd::serve::make_subcommand())
        .get_matches();

    match matches.subcommand() {
        Some(("build", args)) => cmd::build::execute(args),
        Some(("serve", args)) => cmd::serve::execute(args).await,
        _ => unreachable!("subcommand_required is set"),
    }
}
