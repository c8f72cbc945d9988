use std::path::Path;

use anyhow::{bail, Context};
use colored::Colorize;
use serde_json::json;
use upchain_fingerprint::{ContentFingerprinter, DigestBasis, Fingerprint};
use upchain_journal::BlockJournal;
use upchain_ledger::{Block, StreamValidator, ValidationReport};
use upchain_server::{ServerConfig, UpchainServer};

use crate::cli::*;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Serve(args) => cmd_serve(args),
        Command::Fingerprint(args) => cmd_fingerprint(args, cli.format),
        Command::Verify(args) => cmd_verify(args, cli.format),
        Command::Log(args) => cmd_log(args, cli.format),
    }
}

fn cmd_serve(args: ServeArgs) -> anyhow::Result<()> {
    let mut config = match &args.config {
        Some(path) => ServerConfig::load(path)?,
        None => ServerConfig::default(),
    };
    if let Some(bind) = &args.bind {
        config.bind_addr = bind.parse().with_context(|| format!("invalid bind address {bind:?}"))?;
    }
    if config.tokens.is_empty() {
        tracing::warn!("no tokens configured; every upload will be rejected");
    }

    let server = UpchainServer::new(config)?;
    println!("{} UpChain server on {}", "▶".green().bold(), server.config().bind_addr.to_string().bold());
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(server.serve())?;
    Ok(())
}

fn cmd_fingerprint(args: FingerprintArgs, format: OutputFormat) -> anyhow::Result<()> {
    let ext = match args.ext {
        Some(ext) => ext,
        None => args
            .path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_string(),
    };
    let fingerprinter = ContentFingerprinter::new().with_chunk_size(args.chunk_size);
    let fingerprint = fingerprinter.fingerprint_detailed(&args.path, &ext)?;
    println!("{}", render_fingerprint(&args.path, &fingerprint, format)?);
    Ok(())
}

fn cmd_verify(args: VerifyArgs, format: OutputFormat) -> anyhow::Result<()> {
    let blocks = read_journal(&args.journal)?;
    let report = StreamValidator::validate_blocks(&blocks);
    println!("{}", render_report(&report, format)?);
    if !report.is_valid() {
        bail!("chain in {} failed validation", args.journal.display());
    }
    Ok(())
}

fn cmd_log(args: LogArgs, format: OutputFormat) -> anyhow::Result<()> {
    let blocks = read_journal(&args.journal)?;
    let newest: Vec<&Block> = blocks.iter().rev().take(args.limit).collect();
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&newest)?),
        OutputFormat::Text => {
            for block in newest {
                println!("{}", render_block_line(block));
            }
        }
    }
    Ok(())
}

fn read_journal(path: &Path) -> anyhow::Result<Vec<Block>> {
    BlockJournal::read_blocks(path).with_context(|| format!("cannot read journal {}", path.display()))
}

fn render_fingerprint(path: &Path, fingerprint: &Fingerprint, format: OutputFormat) -> anyhow::Result<String> {
    Ok(match format {
        OutputFormat::Json => serde_json::to_string_pretty(&json!({
            "path": path.display().to_string(),
            "fingerprint": fingerprint,
        }))?,
        OutputFormat::Text => {
            let basis = match fingerprint.basis {
                DigestBasis::ExtractedText(kind) => format!("{kind} text").cyan(),
                DigestBasis::RawBytes => "raw bytes".dimmed(),
            };
            format!("{}  {} ({})", fingerprint.digest.as_str().yellow(), path.display(), basis)
        }
    })
}

fn render_report(report: &ValidationReport, format: OutputFormat) -> anyhow::Result<String> {
    if format == OutputFormat::Json {
        return Ok(serde_json::to_string_pretty(report)?);
    }
    if report.is_valid() {
        return Ok(format!(
            "{} Chain valid: {} blocks",
            "✓".green().bold(),
            report.block_count.to_string().bold()
        ));
    }
    let mut out = format!(
        "{} Chain invalid: {} blocks, {} violations",
        "✗".red().bold(),
        report.block_count,
        report.violations.len().to_string().red()
    );
    for v in &report.violations {
        out.push_str(&format!("\n  #{} {:?}: {}", v.index, v.kind, v.description));
    }
    Ok(out)
}

fn render_block_line(block: &Block) -> String {
    format!(
        "{} {}  owner {}  {}  {}",
        format!("#{}", block.index).yellow().bold(),
        block.hash.short().dimmed(),
        block.owner_id,
        block.timestamp,
        block.file_name
    )
}

#[cfg(test)]
mod tests {
    use std::fs;

    use upchain_journal::{DurableLedger, JournalConfig};
    use upchain_ledger::{LedgerReader, LedgerWriter};
    use upchain_types::OwnerId;

    use super::*;

    fn plain() {
        colored::control::set_override(false);
    }

    #[test]
    fn text_fingerprint_line() {
        plain();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hello.txt");
        fs::write(&path, "hello world").unwrap();
        let fp = ContentFingerprinter::new().fingerprint_detailed(&path, "txt").unwrap();

        let line = render_fingerprint(&path, &fp, OutputFormat::Text).unwrap();
        assert!(line.starts_with("b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"));
        assert!(line.ends_with("(txt text)"));
    }

    #[test]
    fn json_fingerprint() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blob.bin");
        fs::write(&path, b"").unwrap();
        let fp = ContentFingerprinter::new().fingerprint_detailed(&path, "bin").unwrap();

        let out = render_fingerprint(&path, &fp, OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["fingerprint"]["basis"], "raw_bytes");
    }

    #[test]
    fn report_rendering() {
        plain();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chain.journal");
        {
            let durable = DurableLedger::open(&path, JournalConfig::default()).unwrap();
            durable.append_next(OwnerId::new(1), "a.txt", "/u/a.txt").unwrap();
            assert_eq!(durable.block_count(), 2);
        }

        let mut blocks = read_journal(&path).unwrap();
        let ok = render_report(&StreamValidator::validate_blocks(&blocks), OutputFormat::Text).unwrap();
        assert_eq!(ok, "✓ Chain valid: 2 blocks");

        blocks[1].file_path = "/elsewhere".into();
        let bad = render_report(&StreamValidator::validate_blocks(&blocks), OutputFormat::Text).unwrap();
        assert!(bad.starts_with("✗ Chain invalid: 2 blocks, 1 violations"));
        assert!(bad.contains("#1 HashMismatch"));
    }

    #[test]
    fn verify_fails_on_missing_journal() {
        let dir = tempfile::tempdir().unwrap();
        let args = VerifyArgs {
            journal: dir.path().join("absent.journal"),
        };
        assert!(cmd_verify(args, OutputFormat::Text).is_err());
    }

    #[test]
    fn block_line_shows_index_and_name() {
        plain();
        let ledger = upchain_ledger::Ledger::new().unwrap();
        let block = ledger.append_next(OwnerId::new(3), "scan.dcm", "/u/scan.dcm").unwrap();
        let line = render_block_line(&block);
        assert!(line.starts_with("#1 "));
        assert!(line.contains("owner 3"));
        assert!(line.ends_with("scan.dcm"));
    }
}
