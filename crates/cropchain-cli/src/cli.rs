use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "cropchain",
    about = "CropChain: farm-to-shelf product custody ledger",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Configuration file; defaults apply if it does not exist
    #[arg(long, global = true, default_value = "cropchain.toml")]
    pub config: PathBuf,

    /// Ledger journal path, overriding the configuration
    #[arg(long, global = true)]
    pub ledger: Option<PathBuf>,

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
    /// Register a new product; the farmer becomes its first holder
    Create(CreateArgs),
    /// Hand a product to a carrier
    Ship(TransferArgs),
    /// Record delivery of a product
    Receive(TransferArgs),
    /// Show the current record of a product
    Read(IdArgs),
    /// Check whether a product is registered
    Exists(IdArgs),
    /// Show every recorded state of a product, oldest first
    History(HistoryArgs),
    /// Check a product's history for integrity violations
    Verify(IdArgs),
    /// Start the REST server
    Serve(ServeArgs),
}

#[derive(Args)]
pub struct CreateArgs {
    pub id: String,
    #[arg(long = "type")]
    pub product_type: String,
    #[arg(long)]
    pub farmer: String,
    #[arg(long)]
    pub price_hash: String,
    #[arg(long, default_value = "")]
    pub ipfs_hash: String,
}

#[derive(Args)]
pub struct TransferArgs {
    pub id: String,
    pub new_owner: String,
}

#[derive(Args)]
pub struct IdArgs {
    pub id: String,
}

#[derive(Args)]
pub struct HistoryArgs {
    pub id: String,
    /// Collapse history into custody spans
    #[arg(long)]
    pub trail: bool,
}

#[derive(Args)]
pub struct ServeArgs {
    /// Listen address, overriding the configuration
    #[arg(long)]
    pub bind: Option<SocketAddr>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_create() {
        let cli = Cli::try_parse_from([
            "cropchain", "create", "P1", "--type", "grain", "--farmer", "farmerA",
            "--price-hash", "h1",
        ])
        .unwrap();
        if let Command::Create(args) = cli.command {
            assert_eq!(args.id, "P1");
            assert_eq!(args.product_type, "grain");
            assert_eq!(args.farmer, "farmerA");
            assert_eq!(args.price_hash, "h1");
            assert_eq!(args.ipfs_hash, "");
        } else { panic!("wrong command"); }
    }

    #[test]
    fn create_requires_farmer() {
        assert!(Cli::try_parse_from(["cropchain", "create", "P1", "--type", "grain"]).is_err());
    }

    #[test]
    fn parse_ship_and_receive() {
        let cli = Cli::try_parse_from(["cropchain", "ship", "P1", "shipperB"]).unwrap();
        if let Command::Ship(args) = cli.command {
            assert_eq!(args.id, "P1");
            assert_eq!(args.new_owner, "shipperB");
        } else { panic!("wrong command"); }

        let cli = Cli::try_parse_from(["cropchain", "receive", "P1", "retailerC"]).unwrap();
        assert!(matches!(cli.command, Command::Receive(_)));
    }

    #[test]
    fn parse_history_trail() {
        let cli = Cli::try_parse_from(["cropchain", "history", "P1", "--trail"]).unwrap();
        if let Command::History(args) = cli.command {
            assert!(args.trail);
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_serve() {
        let cli = Cli::try_parse_from(["cropchain", "serve", "--bind", "0.0.0.0:8080"]).unwrap();
        if let Command::Serve(args) = cli.command {
            assert_eq!(args.bind, Some("0.0.0.0:8080".parse().unwrap()));
        } else { panic!("wrong command"); }
    }

    #[test]
    fn global_flags_default() {
        let cli = Cli::try_parse_from(["cropchain", "exists", "P1"]).unwrap();
        assert_eq!(cli.config, PathBuf::from("cropchain.toml"));
        assert!(cli.ledger.is_none());
        assert!(!cli.verbose);
        assert_eq!(cli.format, OutputFormat::Text);
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "cropchain", "read", "P1", "--ledger", "/tmp/l.journal", "--format", "json", "-v",
        ])
        .unwrap();
        assert_eq!(cli.ledger, Some(PathBuf::from("/tmp/l.journal")));
        assert_eq!(cli.format, OutputFormat::Json);
        assert!(cli.verbose);
    }
}
