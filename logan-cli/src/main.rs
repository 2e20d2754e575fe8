//! Logan CLI Application
//!
//! Command-line front end for the logan-decoder library. It adds the
//! application-layer glue the library deliberately leaves out:
//! - Persisted AES key/IV settings (TOML)
//! - JSON export of the decoded entries
//! - Parse history (capped, newest first)
//! - Human-readable statistics summary

use anyhow::{Context, Result};
use clap::Parser;
use logan_decoder::{
    HistorySink, LoganParser, OutputSink, ParseRecord, ParseResult, StaticKeyProvider,
};
use std::fs;
use std::path::{Path, PathBuf};

mod export;
mod history;
mod settings;

use export::JsonExporter;
use history::HistoryStore;
use settings::{Settings, SettingsKeyProvider};

/// Logan Log Parser - decode Logan mobile log containers
#[derive(Parser, Debug)]
#[command(name = "logan-cli")]
#[command(about = "Decode Logan mobile log files", long_about = None)]
#[command(version)]
struct Args {
    /// Path to the Logan log file to decode
    #[arg(short, long, value_name = "FILE")]
    log: Option<PathBuf>,

    /// AES key (16 ASCII characters; overrides the settings file)
    #[arg(long, value_name = "KEY")]
    key: Option<String>,

    /// AES IV (16 ASCII characters; overrides the settings file)
    #[arg(long, value_name = "IV")]
    iv: Option<String>,

    /// Settings file with persisted key material
    #[arg(short, long, value_name = "FILE", default_value = "logan-settings.toml")]
    settings: PathBuf,

    /// Directory for the exported JSON (default: next to the input file)
    #[arg(short, long, value_name = "DIR")]
    output_dir: Option<PathBuf>,

    /// History file recording past parses
    #[arg(long, value_name = "FILE", default_value = "logan-history.json")]
    history_file: PathBuf,

    /// Show recent parse history and exit
    #[arg(long)]
    history: bool,

    /// Verbosity level (can be repeated: -v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(args.verbose, args.quiet);

    log::info!("Logan CLI v{}", env!("CARGO_PKG_VERSION"));
    log::info!("Using decoder library v{}", logan_decoder::VERSION);

    if args.history {
        return show_history(&HistoryStore::new(&args.history_file));
    }

    let Some(log_path) = args.log.clone() else {
        println!("Logan Log Parser - No input specified");
        println!("\nQuick Start:");
        println!("  logan-cli --log app.logan");
        println!("  logan-cli --log app.logan --key 0123456789012345 --iv 0123456789012345");
        println!("\nRecent parses:");
        println!("  logan-cli --history");
        println!("\nUse --help for more options");
        return Ok(());
    };

    // Resolve key material: command-line flags beat the settings file
    let mut settings = Settings::load(&args.settings)?;
    if let Some(key) = &args.key {
        settings.aes_key = key.clone();
    }
    if let Some(iv) = &args.iv {
        settings.aes_iv = iv.clone();
    }
    settings.validate()?;
    if settings.is_using_default_keys() {
        log::debug!("Using the default Logan key material");
    }

    let parser = LoganParser::new(SettingsKeyProvider::new(settings));
    let exporter = JsonExporter::new(args.output_dir.clone());
    let history = HistoryStore::new(&args.history_file);

    let (result, output_path) = run_parse(&parser, &exporter, &history, &log_path)?;
    if !args.quiet {
        print_summary(&result, &output_path);
    }
    Ok(())
}

/// Drive one parse through the collaborators: decode, export, record history.
/// Failed parses are recorded in the history too, then surfaced to the caller.
fn run_parse<P, S, H>(
    parser: &LoganParser<P>,
    sink: &S,
    history: &H,
    log_path: &Path,
) -> Result<(ParseResult, PathBuf)>
where
    P: logan_decoder::KeyProvider,
    S: OutputSink,
    H: HistorySink,
{
    let file_size = fs::metadata(log_path).map(|m| m.len()).unwrap_or(0);

    match parser.parse_file(log_path) {
        Ok(result) => {
            let output_path = sink
                .write_entries(log_path, &result)
                .context("Failed to write decoded entries")?;
            history
                .record(ParseRecord::success(
                    log_path,
                    &output_path,
                    file_size,
                    result.entries.len(),
                ))
                .context("Failed to record parse history")?;
            Ok((result, output_path))
        }
        Err(e) => {
            history
                .record(ParseRecord::failure(log_path, file_size, e.to_string()))
                .context("Failed to record parse history")?;
            Err(anyhow::Error::new(e).context(format!("Failed to parse {:?}", log_path)))
        }
    }
}

/// Print the per-parse statistics summary
fn print_summary(result: &ParseResult, output_path: &Path) {
    let stats = &result.stats;

    println!("═══════════════════════════════════════════════");
    println!("  Logan Parse Summary");
    println!("═══════════════════════════════════════════════\n");
    println!("✓ Decoded {} log entries", result.entries.len());
    println!("  Output: {:?}\n", output_path);

    println!("📊 Blocks:");
    println!("  Total:      {}", stats.total_blocks);
    println!("  Succeeded:  {}", stats.successful_blocks);
    println!("  Failed:     {}", stats.failed_blocks);
    println!("  Success rate: {:.2}%", stats.block_success_rate() * 100.0);

    println!("\n📦 Decompression methods:");
    println!("  gzip:       {}", stats.gzip_blocks);
    println!("  zlib:       {}", stats.zlib_blocks);
    println!("  plaintext:  {}", stats.passthrough_blocks);

    println!("\n📄 Lines:");
    println!("  Structured: {}", stats.structured_lines);
    println!("  Plain text: {}", stats.plain_text_lines);
    println!("  Empty:      {}", stats.empty_lines);

    if stats.failed_blocks > 0 {
        println!(
            "\n⚠️  {} block(s) failed to decode - the log may be incomplete",
            stats.failed_blocks
        );
    }
}

/// Print the recorded parse history, newest first
fn show_history(store: &HistoryStore) -> Result<()> {
    let records = store.load();
    if records.is_empty() {
        println!("No parse history yet");
        return Ok(());
    }

    println!("Recent parses ({}):\n", records.len());
    for record in &records {
        let status = if record.success { "✓" } else { "✗" };
        println!(
            "{} {} [{}] {} entries, {}",
            status,
            record.timestamp.format("%Y-%m-%d %H:%M:%S"),
            record.file_size_formatted(),
            record.entry_count,
            record.source_path.display(),
        );
        if let Some(message) = &record.error_message {
            println!("    error: {}", message);
        }
    }
    Ok(())
}

/// Initialize logging based on verbosity level
fn init_logging(verbose: u8, quiet: bool) {
    use env_logger::Builder;
    use log::LevelFilter;
    use std::io::Write;

    let level = if quiet {
        LevelFilter::Error
    } else {
        match verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };

    Builder::new()
        .filter_level(level)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {}] {}",
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use aes::cipher::generic_array::GenericArray;
    use aes::cipher::{BlockEncrypt, KeyInit};
    use aes::Aes128;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use logan_decoder::KeyMaterial;
    use std::io::Write;

    /// Build a one-block Logan container for the default key material
    fn container(text: &str) -> Vec<u8> {
        let keys = KeyMaterial::default();

        let mut enc = GzEncoder::new(Vec::new(), Compression::default());
        enc.write_all(text.as_bytes()).unwrap();
        let compressed = enc.finish().unwrap();

        let pad = 16 - compressed.len() % 16;
        let mut padded = compressed;
        padded.extend(std::iter::repeat(pad as u8).take(pad));

        let cipher = Aes128::new(GenericArray::from_slice(keys.key()));
        let mut ciphertext = Vec::with_capacity(padded.len());
        let mut chain = *keys.iv();
        for block in padded.chunks_exact(16) {
            let mut buf = GenericArray::clone_from_slice(block);
            for (b, prev) in buf.iter_mut().zip(chain.iter()) {
                *b ^= prev;
            }
            cipher.encrypt_block(&mut buf);
            ciphertext.extend_from_slice(&buf);
            chain.copy_from_slice(&buf);
        }

        let mut data = vec![0x01];
        data.extend_from_slice(&(ciphertext.len() as u32).to_be_bytes());
        data.extend_from_slice(&ciphertext);
        data
    }

    #[test]
    fn test_run_parse_exports_and_records_history() {
        let dir = tempfile::tempdir().unwrap();
        let log_path = dir.path().join("app.logan");
        fs::write(&log_path, container("{\"c\":\"hello\",\"f\":\"3\"}\n")).unwrap();

        let parser = LoganParser::new(StaticKeyProvider::default());
        let exporter = JsonExporter::default();
        let store = HistoryStore::new(dir.path().join("history.json"));

        let (result, output_path) = run_parse(&parser, &exporter, &store, &log_path).unwrap();
        assert_eq!(result.entries.len(), 1);
        assert_eq!(output_path, dir.path().join("app_logs.json"));
        assert!(output_path.exists());

        let records = store.load();
        assert_eq!(records.len(), 1);
        assert!(records[0].success);
        assert_eq!(records[0].entry_count, 1);
        assert_eq!(records[0].output_path.as_deref(), Some(output_path.as_path()));
    }

    #[test]
    fn test_run_parse_records_failures() {
        let dir = tempfile::tempdir().unwrap();
        let log_path = dir.path().join("garbage.logan");
        fs::write(&log_path, [0x00u8, 0x42, 0x43]).unwrap();

        let parser = LoganParser::new(StaticKeyProvider::default());
        let exporter = JsonExporter::default();
        let store = HistoryStore::new(dir.path().join("history.json"));

        assert!(run_parse(&parser, &exporter, &store, &log_path).is_err());

        let records = store.load();
        assert_eq!(records.len(), 1);
        assert!(!records[0].success);
        assert!(records[0].error_message.is_some());
        assert!(records[0].output_path.is_none());
    }
}
