use std::sync::Arc;

use anyhow::Context;
use colored::Colorize;
use cropchain_ledger::{
    CustodyTrail, ProductContract, TransferReceipt, ValidationReport,
};
use cropchain_server::CropchainServer;
use cropchain_state::{BackingLedger, FileLedger};
use cropchain_types::{HistoryEntry, Product, ProductId};
use serde::Serialize;
use serde_json::json;
use tracing::debug;

use crate::cli::*;
use crate::config::CliConfig;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let mut config = CliConfig::load(&cli.config)?;
    if let Some(path) = cli.ledger {
        config.ledger.path = path;
    }
    debug!(path = %config.ledger.path.display(), sync = ?config.ledger.sync, "opening ledger");

    let ledger = FileLedger::open(&config.ledger.path, config.ledger.sync)
        .with_context(|| format!("opening ledger {}", config.ledger.path.display()))?;
    let contract = ProductContract::new(Arc::new(ledger));
    let out = Output(cli.format);

    match cli.command {
        Command::Create(args) => cmd_create(&contract, out, args),
        Command::Ship(args) => {
            let receipt = contract.ship_product(&ProductId::new(args.id), &args.new_owner)?;
            out.receipt(&receipt)
        }
        Command::Receive(args) => {
            let receipt = contract.receive_product(&ProductId::new(args.id), &args.new_owner)?;
            out.receipt(&receipt)
        }
        Command::Read(args) => {
            let product = contract.read_product(&ProductId::new(args.id))?;
            out.product(&product)
        }
        Command::Exists(args) => cmd_exists(&contract, out, args),
        Command::History(args) => cmd_history(&contract, out, args),
        Command::Verify(args) => {
            let report = contract.verify_product(&ProductId::new(args.id))?;
            out.report(&report)
        }
        Command::Serve(args) => {
            if let Some(bind) = args.bind {
                config.server.bind_addr = bind;
            }
            cmd_serve(contract, config)
        }
    }
}

fn cmd_create<L: BackingLedger>(
    contract: &ProductContract<L>,
    out: Output,
    args: CreateArgs,
) -> anyhow::Result<()> {
    let product = contract.create_product(
        args.id,
        &args.product_type,
        &args.farmer,
        &args.price_hash,
        &args.ipfs_hash,
    )?;
    if out.is_json() {
        return out.json(&product);
    }
    println!("{} Created product {}", "✓".green().bold(), product.id.as_str().yellow().bold());
    print_product(&product);
    Ok(())
}

fn cmd_exists<L: BackingLedger>(
    contract: &ProductContract<L>,
    out: Output,
    args: IdArgs,
) -> anyhow::Result<()> {
    let exists = contract.product_exists(&ProductId::new(args.id.clone()))?;
    if out.is_json() {
        return out.json(&json!({ "exists": exists }));
    }
    if exists {
        println!("{} {} exists", "✓".green(), args.id.yellow());
    } else {
        println!("{} {} does not exist", "✗".red(), args.id.yellow());
    }
    Ok(())
}

fn cmd_history<L: BackingLedger>(
    contract: &ProductContract<L>,
    out: Output,
    args: HistoryArgs,
) -> anyhow::Result<()> {
    let id = ProductId::new(args.id);
    if args.trail {
        let trail = contract.custody_trail(&id)?;
        return out.trail(&trail);
    }
    let history = contract.product_history(&id)?;
    out.history(&id, &history)
}

fn cmd_serve(contract: ProductContract<FileLedger>, config: CliConfig) -> anyhow::Result<()> {
    let runtime = tokio::runtime::Runtime::new().context("starting async runtime")?;
    println!(
        "CropChain server on {} (ledger: {})",
        config.server.bind_addr.to_string().bold(),
        config.ledger.path.display()
    );
    runtime.block_on(CropchainServer::new(config.server, contract).serve())?;
    Ok(())
}

#[derive(Clone, Copy)]
struct Output(OutputFormat);

impl Output {
    fn is_json(self) -> bool {
        self.0 == OutputFormat::Json
    }

    fn json<T: Serialize + ?Sized>(self, value: &T) -> anyhow::Result<()> {
        println!("{}", serde_json::to_string_pretty(value)?);
        Ok(())
    }

    fn product(self, product: &Product) -> anyhow::Result<()> {
        if self.is_json() {
            return self.json(product);
        }
        println!("Product {}", product.id.as_str().yellow().bold());
        print_product(product);
        Ok(())
    }

    fn receipt(self, receipt: &TransferReceipt) -> anyhow::Result<()> {
        if self.is_json() {
            return self.json(receipt);
        }
        println!(
            "{} {} {}: {} → {}",
            "✓".green().bold(),
            receipt.product.id.as_str().yellow().bold(),
            receipt.event.to_string().cyan(),
            receipt.previous_owner,
            receipt.product.owner.bold()
        );
        Ok(())
    }

    fn history(self, id: &ProductId, history: &[HistoryEntry]) -> anyhow::Result<()> {
        if self.is_json() {
            return self.json(history);
        }
        if history.is_empty() {
            println!("No history for {}.", id.as_str().yellow());
            return Ok(());
        }
        for (i, entry) in history.iter().enumerate() {
            let marker = if entry.is_delete {
                "deleted".red()
            } else {
                entry.record.owner.as_str().green()
            };
            println!(
                "{}  {}  {}  {}",
                format!("#{}", i + 1).yellow(),
                entry.tx_id.short_hex().dimmed(),
                entry.timestamp.to_rfc3339(),
                marker
            );
        }
        Ok(())
    }

    fn trail(self, trail: &CustodyTrail) -> anyhow::Result<()> {
        if self.is_json() {
            return self.json(trail);
        }
        println!(
            "Custody of {} (producer: {})",
            trail.id.as_str().yellow().bold(),
            trail.producer.as_deref().unwrap_or("-")
        );
        for span in &trail.spans {
            println!("  {}  since {}", span.holder.bold(), span.since);
        }
        match trail.current_holder() {
            Some(holder) => println!("  Current holder: {}", holder.green()),
            None if trail.deleted => println!("  {}", "Record deleted".red()),
            None => println!("  No custody recorded."),
        }
        Ok(())
    }

    fn report(self, report: &ValidationReport) -> anyhow::Result<()> {
        if self.is_json() {
            return self.json(report);
        }
        if report.is_valid() {
            println!(
                "{} Custody trail of {} verified ({} entries)",
                "✓".green().bold(),
                report.id.as_str().yellow(),
                report.entry_count
            );
            return Ok(());
        }
        println!(
            "{} {} violation(s) in {}",
            "✗".red().bold(),
            report.violations.len(),
            report.id.as_str().yellow()
        );
        for v in &report.violations {
            println!(
                "  #{} {} {:?}: {}",
                v.index + 1,
                v.tx_id.short_hex().dimmed(),
                v.kind,
                v.description
            );
        }
        anyhow::bail!("custody trail of {} failed verification", report.id)
    }
}

fn print_product(product: &Product) {
    println!("  Type:          {}", product.product_type);
    println!("  Farmer:        {}", product.farmer);
    println!("  Owner:         {}", product.owner.bold());
    println!("  Timestamp:     {}", product.timestamp);
    println!("  Price hash:    {}", product.market_price_hash.dimmed());
    println!("  Certification: {}", product.certification_ipfs_hash.dimmed());
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use cropchain_state::JournalSync;
    use std::path::Path;

    fn run(ledger: &Path, args: &[&str]) -> anyhow::Result<()> {
        let ledger = ledger.to_str().unwrap();
        let mut argv = vec!["cropchain", "--ledger", ledger, "--config", "/nonexistent.toml"];
        argv.extend_from_slice(args);
        run_command(Cli::try_parse_from(argv).unwrap())
    }

    fn reopen(path: &Path) -> ProductContract<FileLedger> {
        ProductContract::new(Arc::new(FileLedger::open(path, JournalSync::EveryWrite).unwrap()))
    }

    #[test]
    fn create_ship_receive_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.journal");

        run(&path, &["create", "P1", "--type", "grain", "--farmer", "farmerA", "--price-hash", "h"])
            .unwrap();
        run(&path, &["ship", "P1", "shipperB"]).unwrap();
        run(&path, &["receive", "P1", "retailerC"]).unwrap();
        run(&path, &["--format", "json", "history", "P1"]).unwrap();
        run(&path, &["history", "P1", "--trail"]).unwrap();
        run(&path, &["verify", "P1"]).unwrap();

        let contract = reopen(&path);
        let product = contract.read_product(&"P1".into()).unwrap();
        assert_eq!(product.owner, "retailerC");
        assert_eq!(contract.product_history(&"P1".into()).unwrap().len(), 3);
    }

    #[test]
    fn duplicate_create_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.journal");
        let create = ["create", "P1", "--type", "grain", "--farmer", "f", "--price-hash", "h"];
        run(&path, &create).unwrap();
        let err = run(&path, &create).unwrap_err();
        assert!(err.to_string().contains("already exists"));
    }

    #[test]
    fn read_missing_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = run(&dir.path().join("l.journal"), &["read", "ghost"]).unwrap_err();
        assert!(err.to_string().contains("does not exist"));
        run(&dir.path().join("l.journal"), &["exists", "ghost"]).unwrap();
    }

    #[test]
    fn verify_fails_on_tampered_history() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.journal");
        run(&path, &["create", "P1", "--type", "grain", "--farmer", "farmerA", "--price-hash", "h"])
            .unwrap();

        {
            let contract = reopen(&path);
            let mut forged = contract.read_product(&"P1".into()).unwrap();
            forged.farmer = "mallory".into();
            let bytes = cropchain_types::codec::encode(&forged).unwrap();
            contract.ledger().put_state("P1", &bytes).unwrap();
        }

        let err = run(&path, &["verify", "P1"]).unwrap_err();
        assert!(err.to_string().contains("failed verification"));
    }
}
