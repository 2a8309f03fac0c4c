use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use flathash_hint::TypeHintingMode;

#[derive(Parser)]
#[command(
    name = "flathash",
    about = "Flatten JSON documents into hash records and back",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Type hinting mode; overrides the configuration file
    #[arg(long, global = true)]
    pub mode: Option<Mode>,

    /// TOML mapper configuration
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Record format written by `flatten` and read by `unflatten`
    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum Mode {
    Neutral,
    Lenient,
}

impl From<Mode> for TypeHintingMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Neutral => TypeHintingMode::Neutral,
            Mode::Lenient => TypeHintingMode::Lenient,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// One `key=value` line per entry
    Text,
    /// A JSON object of string values
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Flatten a JSON document into a hash record
    Flatten(FlattenArgs),
    /// Rebuild a JSON document from a hash record
    Unflatten(UnflattenArgs),
    /// Show the segments of a path key
    ParseKey(ParseKeyArgs),
}

#[derive(Args)]
pub struct FlattenArgs {
    /// JSON input; stdin when omitted
    pub file: Option<PathBuf>,
}

#[derive(Args)]
pub struct UnflattenArgs {
    /// Record input; stdin when omitted
    pub file: Option<PathBuf>,
}

#[derive(Args)]
pub struct ParseKeyArgs {
    pub key: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_flatten_from_stdin() {
        let cli = Cli::try_parse_from(["flathash", "flatten"]).unwrap();
        if let Command::Flatten(args) = cli.command {
            assert!(args.file.is_none());
        } else {
            panic!("wrong command");
        }
        assert!(cli.mode.is_none());
        assert_eq!(cli.format, OutputFormat::Text);
    }

    #[test]
    fn parse_unflatten_with_file() {
        let cli = Cli::try_parse_from(["flathash", "unflatten", "person.txt"]).unwrap();
        if let Command::Unflatten(args) = cli.command {
            assert_eq!(args.file, Some(PathBuf::from("person.txt")));
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn parse_key_command() {
        let cli = Cli::try_parse_from(["flathash", "parse-key", "persons[0].@class"]).unwrap();
        if let Command::ParseKey(args) = cli.command {
            assert_eq!(args.key, "persons[0].@class");
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn parse_global_options() {
        let cli = Cli::try_parse_from([
            "flathash",
            "flatten",
            "--mode",
            "neutral",
            "--config",
            "flathash.toml",
            "--format",
            "json",
        ])
        .unwrap();
        assert_eq!(cli.mode, Some(Mode::Neutral));
        assert_eq!(cli.config, Some(PathBuf::from("flathash.toml")));
        assert_eq!(cli.format, OutputFormat::Json);
        assert_eq!(TypeHintingMode::from(Mode::Lenient), TypeHintingMode::Lenient);
    }

    #[test]
    fn rejects_unknown_mode() {
        assert!(Cli::try_parse_from(["flathash", "--mode", "strict", "flatten"]).is_err());
    }
}
