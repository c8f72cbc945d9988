use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "upchain",
    about = "UpChain: tamper-evident upload ledger with content fingerprints",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the upload server
    Serve(ServeArgs),
    /// Print the content fingerprint of a file
    Fingerprint(FingerprintArgs),
    /// Validate the chain recorded in a journal
    Verify(VerifyArgs),
    /// List blocks recorded in a journal, newest first
    Log(LogArgs),
}

#[derive(Args)]
pub struct ServeArgs {
    /// TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// Override the configured listen address
    #[arg(long)]
    pub bind: Option<String>,
}

#[derive(Args)]
pub struct FingerprintArgs {
    pub path: PathBuf,
    /// Declared file type; defaults to the path's extension
    #[arg(long)]
    pub ext: Option<String>,
    #[arg(long, default_value = "4096")]
    pub chunk_size: usize,
}

#[derive(Args)]
pub struct VerifyArgs {
    #[arg(long)]
    pub journal: PathBuf,
}

#[derive(Args)]
pub struct LogArgs {
    #[arg(long)]
    pub journal: PathBuf,
    #[arg(short = 'n', long, default_value = "20")]
    pub limit: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_serve_defaults() {
        let cli = Cli::try_parse_from(["upchain", "serve"]).unwrap();
        if let Command::Serve(args) = cli.command {
            assert!(args.config.is_none());
            assert!(args.bind.is_none());
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn parse_serve_with_overrides() {
        let cli = Cli::try_parse_from(["upchain", "serve", "-c", "upchain.toml", "--bind", "0.0.0.0:8080"]).unwrap();
        if let Command::Serve(args) = cli.command {
            assert_eq!(args.config, Some(PathBuf::from("upchain.toml")));
            assert_eq!(args.bind.as_deref(), Some("0.0.0.0:8080"));
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn parse_fingerprint() {
        let cli = Cli::try_parse_from(["upchain", "fingerprint", "scan.bin", "--ext", "dcm", "--chunk-size", "512"]).unwrap();
        if let Command::Fingerprint(args) = cli.command {
            assert_eq!(args.path, PathBuf::from("scan.bin"));
            assert_eq!(args.ext.as_deref(), Some("dcm"));
            assert_eq!(args.chunk_size, 512);
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn fingerprint_requires_a_path() {
        assert!(Cli::try_parse_from(["upchain", "fingerprint"]).is_err());
    }

    #[test]
    fn parse_verify() {
        let cli = Cli::try_parse_from(["upchain", "verify", "--journal", "chain.journal"]).unwrap();
        assert!(matches!(cli.command, Command::Verify(_)));
        assert!(Cli::try_parse_from(["upchain", "verify"]).is_err());
    }

    #[test]
    fn parse_log_limit() {
        let cli = Cli::try_parse_from(["upchain", "log", "--journal", "c.journal", "-n", "5"]).unwrap();
        if let Command::Log(args) = cli.command {
            assert_eq!(args.limit, 5);
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn parse_verbose() {
        let cli = Cli::try_parse_from(["upchain", "--verbose", "serve"]).unwrap();
        assert!(cli.verbose);
    }

    #[test]
    fn parse_json_format() {
        let cli = Cli::try_parse_from(["upchain", "--format", "json", "verify", "--journal", "j"]).unwrap();
        assert_eq!(cli.format, OutputFormat::Json);
    }
}
