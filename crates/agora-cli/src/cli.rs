use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "agora", about = "Agora: replicated posts over content-addressed links", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// TOML configuration file; missing keys use defaults
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run agents that alternately post to one base, then paginate it
    Demo(DemoArgs),
    /// Serve one agent over HTTP
    Serve(ServeArgs),
    /// Print the effective configuration as TOML
    Config,
}

#[derive(Args)]
pub struct DemoArgs {
    #[arg(long, default_value = "2")]
    pub agents: usize,
    #[arg(long, default_value = "10")]
    pub posts: usize,
    #[arg(long, default_value = "community1")]
    pub base: String,
    /// Page size of the first listing
    #[arg(long, default_value = "7")]
    pub limit: u32,
}

#[derive(Args)]
pub struct ServeArgs {
    /// Overrides `server.bind_addr`
    #[arg(long)]
    pub bind: Option<String>,
    /// Overrides `server.agent_name`
    #[arg(long)]
    pub name: Option<String>,
}
