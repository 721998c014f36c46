use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "rumbot")]
#[command(author, version, about = "Telegram bot for a pirate role-play crew", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Run the bot (long polling)
    Run,

    /// Delete resource log entries older than the retention window and exit
    PurgeLogs,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
