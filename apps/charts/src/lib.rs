use clap::{Parser, Subcommand};

pub mod config;
pub mod pipeline;

#[derive(Debug, Parser)]
#[command(version, about = "Publish EMA charts for a fixed set of crypto assets")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand, PartialEq, Eq)]
pub enum Command {
    /// Fetch, chart, upload and record every configured asset (default)
    Run,
    /// Delete a previously uploaded chart
    Delete {
        /// Delete hash returned by the image host at upload time
        delete_hash: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_is_the_default() {
        let cli = Cli::try_parse_from(["charts"]).unwrap();
        assert_eq!(cli.command.unwrap_or(Command::Run), Command::Run);
    }

    #[test]
    fn parses_delete() {
        let cli = Cli::try_parse_from(["charts", "delete", "xyz"]).unwrap();
        assert_eq!(
            cli.command,
            Some(Command::Delete {
                delete_hash: "xyz".to_string()
            })
        );
    }
}
