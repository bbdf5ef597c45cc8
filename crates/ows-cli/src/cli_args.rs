use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "ows")]
#[command(about = "Compile and run OWS scripts")]
pub(crate) struct Cli {
    #[command(subcommand)]
    pub(crate) command: Mode,
}

#[derive(Debug, Subcommand)]
pub(crate) enum Mode {
    /// Compile every script under a directory.
    Check(CheckArgs),
    /// Compile and run the scripts on behalf of one actor.
    Run(RunArgs),
}

#[derive(Debug, Args)]
pub(crate) struct CheckArgs {
    #[arg(long = "scripts-dir")]
    pub(crate) scripts_dir: String,
}

#[derive(Debug, Args)]
pub(crate) struct RunArgs {
    #[arg(long = "scripts-dir")]
    pub(crate) scripts_dir: String,
    #[arg(long = "start-label")]
    pub(crate) start_label: Option<String>,
    /// Id or unique name of the acting character.
    #[arg(long = "actor")]
    pub(crate) actor: Option<String>,
    /// JSON file with `characters` and `entities` arrays.
    #[arg(long = "actors")]
    pub(crate) actors: Option<String>,
    /// NAME=VALUE, where VALUE is JSON or plain text.
    #[arg(long = "bind")]
    pub(crate) bind: Vec<String>,
}
