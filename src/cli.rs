// Command-line front end for Revdelta.
//
// Each subcommand loads a history file, performs one store operation and,
// for `add`, writes the history back atomically.

use std::fs::File;
use std::io::{self, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::process;

use clap::{ArgAction, Args, Parser, Subcommand, ValueHint};
use serde::Serialize;

use crate::diff::DeltaStats;
use crate::io::{self as history_io, hex_digest};
use crate::store::config::DEFAULT_CHECKPOINT_INTERVAL;
use crate::store::{StoreOptions, VersionStore};

const BUF_SIZE: usize = 64 * 1024;

// ---------------------------------------------------------------------------
// Clap CLI definition
// ---------------------------------------------------------------------------

/// Delta-compressed text version history.
#[derive(Parser, Debug)]
#[command(
    name = "revdelta",
    version,
    about = "Delta-compressed text version history",
    arg_required_else_help = true
)]
struct Cli {
    #[command(subcommand)]
    command: Cmd,

    /// Force overwrite existing output files.
    #[arg(short = 'f', long, global = true)]
    force: bool,

    /// Quiet mode (suppress non-error output).
    #[arg(short = 'q', long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Verbose mode (use multiple times for more detail).
    #[arg(short = 'v', long, global = true, action = ArgAction::Count)]
    verbose: u8,

    /// Output results as JSON.
    #[arg(long = "json", global = true)]
    json_output: bool,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Append a new version read from a file or stdin.
    Add(AddArgs),
    /// Print a version.
    Get(GetArgs),
    /// List every version with its delta statistics.
    Log(HistoryArgs),
    /// Print the edit script that produces a version.
    Delta(VersionArgs),
    /// Print the first version whose text equals the input.
    Find(FindArgs),
    /// Load a history, replaying every delta, and report its size.
    Verify(HistoryArgs),
    /// Print build/configuration details.
    Config,
}

#[derive(Args, Debug, Clone)]
struct StoreTuningArgs {
    /// Keep an in-memory copy of every Nth version (0 disables).
    #[arg(long = "checkpoint-interval", default_value_t = DEFAULT_CHECKPOINT_INTERVAL)]
    checkpoint_interval: usize,

    /// Do not build the prefix index.
    #[arg(long = "no-prefix-index")]
    no_prefix_index: bool,
}

#[derive(Args, Debug)]
struct HistoryArgs {
    /// History file.
    #[arg(value_hint = ValueHint::FilePath)]
    history: PathBuf,

    #[command(flatten)]
    tuning: StoreTuningArgs,
}

#[derive(Args, Debug)]
struct AddArgs {
    /// History file (created if missing).
    #[arg(value_hint = ValueHint::FilePath)]
    history: PathBuf,

    /// Text file to add (default: stdin).
    #[arg(value_hint = ValueHint::FilePath)]
    input: Option<PathBuf>,

    #[command(flatten)]
    tuning: StoreTuningArgs,
}

#[derive(Args, Debug)]
struct GetArgs {
    /// History file.
    #[arg(value_hint = ValueHint::FilePath)]
    history: PathBuf,

    /// Version number (1-based).
    version: usize,

    /// Output file (default: stdout).
    #[arg(long, short = 'o', value_hint = ValueHint::FilePath)]
    output: Option<PathBuf>,

    #[command(flatten)]
    tuning: StoreTuningArgs,
}

#[derive(Args, Debug)]
struct VersionArgs {
    /// History file.
    #[arg(value_hint = ValueHint::FilePath)]
    history: PathBuf,

    /// Version number (1-based).
    version: usize,

    #[command(flatten)]
    tuning: StoreTuningArgs,
}

#[derive(Args, Debug)]
struct FindArgs {
    /// History file.
    #[arg(value_hint = ValueHint::FilePath)]
    history: PathBuf,

    /// Text file to look up (default: stdin).
    #[arg(value_hint = ValueHint::FilePath)]
    input: Option<PathBuf>,

    #[command(flatten)]
    tuning: StoreTuningArgs,
}

/// Flags shared by every subcommand.
#[derive(Debug, Clone, Copy)]
struct Globals {
    force: bool,
    quiet: bool,
    verbose: u8,
    json_output: bool,
}

impl From<&Cli> for Globals {
    fn from(cli: &Cli) -> Self {
        Self {
            force: cli.force,
            quiet: cli.quiet,
            verbose: cli.verbose.min(2),
            json_output: cli.json_output,
        }
    }
}

fn store_options(tuning: &StoreTuningArgs) -> StoreOptions {
    StoreOptions {
        checkpoint_interval: tuning.checkpoint_interval,
        prefix_index: !tuning.no_prefix_index,
    }
}

#[cfg(any(test, feature = "fuzzing"))]
pub fn fuzz_try_parse_args(args: &[String]) {
    let argv: Vec<String> = std::iter::once("revdelta".to_string())
        .chain(args.iter().cloned())
        .collect();
    if let Ok(cli) = Cli::try_parse_from(argv) {
        let _ = Globals::from(&cli);
    }
}

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

fn read_text(input: Option<&Path>) -> Result<String, String> {
    let mut buf = Vec::new();
    match input {
        Some(path) => {
            File::open(path)
                .and_then(|mut f| f.read_to_end(&mut buf))
                .map_err(|e| format!("input file: {}: {e}", path.display()))?;
        }
        None => {
            io::stdin()
                .lock()
                .read_to_end(&mut buf)
                .map_err(|e| format!("stdin: {e}"))?;
        }
    }
    String::from_utf8(buf).map_err(|_| "input is not valid UTF-8 text".to_string())
}

fn open_history(path: &Path, tuning: &StoreTuningArgs) -> Result<VersionStore, String> {
    history_io::load_file(path, store_options(tuning))
        .map(|(store, _)| store)
        .map_err(|e| format!("{}: {e}", path.display()))
}

fn print_json<T: Serialize>(value: &T) -> Result<(), String> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    serde_json::to_writer_pretty(&mut out, value).map_err(|e| format!("json: {e}"))?;
    writeln!(out).map_err(|e| format!("write: {e}"))
}

fn report(result: Result<(), String>) -> i32 {
    match result {
        Ok(()) => 0,
        Err(msg) => {
            eprintln!("revdelta: {msg}");
            1
        }
    }
}

// ---------------------------------------------------------------------------
// add
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct AddReport {
    version: usize,
    chars: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    delta: Option<DeltaStats>,
    bytes: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha256: Option<String>,
}

fn cmd_add(g: Globals, args: &AddArgs) -> Result<(), String> {
    let text = read_text(args.input.as_deref())?;
    let mut store = history_io::load_or_default(&args.history, store_options(&args.tuning))
        .map_err(|e| format!("{}: {e}", args.history.display()))?;

    let chars = text.chars().count();
    let version = store.add_version(text);
    let stats = history_io::save_file(&store, &args.history)
        .map_err(|e| format!("{}: {e}", args.history.display()))?;

    let report = AddReport {
        version,
        chars,
        delta: store.delta(version).map(|d| d.stats()),
        bytes: stats.bytes,
        sha256: stats.sha256.as_ref().map(hex_digest),
    };

    if g.json_output {
        return print_json(&report);
    }
    if !g.quiet {
        match report.delta {
            Some(d) => eprintln!(
                "revdelta: version {version}: +{} -{} ({} kept)",
                d.inserts, d.deletes, d.keeps
            ),
            None => eprintln!("revdelta: version {version}: base ({chars} chars)"),
        }
        if g.verbose > 0 {
            eprintln!(
                "revdelta: {}: {} bytes",
                args.history.display(),
                report.bytes
            );
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// get
// ---------------------------------------------------------------------------

fn cmd_get(g: Globals, args: &GetArgs) -> Result<(), String> {
    let store = open_history(&args.history, &args.tuning)?;
    let text = store.get_version(args.version).map_err(|e| e.to_string())?;

    match &args.output {
        Some(path) => {
            if path.exists() && !g.force {
                return Err(format!(
                    "output file exists, use -f to overwrite: {}",
                    path.display()
                ));
            }
            let file =
                File::create(path).map_err(|e| format!("output file: {}: {e}", path.display()))?;
            let mut w = BufWriter::with_capacity(BUF_SIZE, file);
            w.write_all(text.as_bytes())
                .and_then(|()| w.flush())
                .map_err(|e| format!("write: {e}"))?;
        }
        None => {
            let stdout = io::stdout();
            let mut out = stdout.lock();
            out.write_all(text.as_bytes())
                .and_then(|()| out.flush())
                .map_err(|e| format!("write: {e}"))?;
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// log
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct LogEntry {
    version: usize,
    chars: usize,
    #[serde(flatten)]
    delta: DeltaStats,
}

fn cmd_log(g: Globals, args: &HistoryArgs) -> Result<(), String> {
    let store = open_history(&args.history, &args.tuning)?;

    let mut entries = Vec::with_capacity(store.len());
    for (i, text) in store.versions().enumerate() {
        let text = text.map_err(|e| e.to_string())?;
        let version = i + 1;
        entries.push(LogEntry {
            version,
            chars: text.chars().count(),
            delta: store.delta(version).map(|d| d.stats()).unwrap_or_default(),
        });
    }

    if g.json_output {
        return print_json(&entries);
    }
    for e in &entries {
        if e.version == 1 {
            println!("{:>6}  {:>8} chars  base", e.version, e.chars);
        } else {
            println!(
                "{:>6}  {:>8} chars  +{} -{} ={}",
                e.version, e.chars, e.delta.inserts, e.delta.deletes, e.delta.keeps
            );
        }
    }
    if g.verbose > 0 {
        if let Some(p) = store.prefix_stats() {
            eprintln!(
                "revdelta: prefix index: {} nodes for {} chars ({} shared)",
                p.nodes,
                p.total_chars,
                p.shared_chars()
            );
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// delta
// ---------------------------------------------------------------------------

fn cmd_delta(g: Globals, args: &VersionArgs) -> Result<(), String> {
    let store = open_history(&args.history, &args.tuning)?;
    // Validates the range with the store's own error.
    store.get_version(args.version).map_err(|e| e.to_string())?;

    let Some(delta) = store.delta(args.version) else {
        return Err(format!("version {} is the base; it has no delta", args.version));
    };

    if g.json_output {
        return print_json(delta);
    }
    print!("{delta}");
    if !g.quiet {
        let s = delta.stats();
        eprintln!(
            "revdelta: version {}: {} ops, +{} -{} ={}",
            args.version,
            delta.len(),
            s.inserts,
            s.deletes,
            s.keeps
        );
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// find
// ---------------------------------------------------------------------------

fn cmd_find(g: Globals, args: &FindArgs) -> Result<(), String> {
    let text = read_text(args.input.as_deref())?;
    let store = open_history(&args.history, &args.tuning)?;

    match store.find_version(&text).map_err(|e| e.to_string())? {
        Some(version) if g.json_output => print_json(&version),
        Some(version) => {
            println!("{version}");
            Ok(())
        }
        None => Err("no version matches the input".to_string()),
    }
}

// ---------------------------------------------------------------------------
// verify
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct VerifyReport {
    versions: usize,
    bytes: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha256: Option<String>,
}

fn cmd_verify(g: Globals, args: &HistoryArgs) -> Result<(), String> {
    let (_, stats) = history_io::load_file(&args.history, store_options(&args.tuning))
        .map_err(|e| format!("{}: {e}", args.history.display()))?;

    let report = VerifyReport {
        versions: stats.versions,
        bytes: stats.bytes,
        sha256: stats.sha256.as_ref().map(hex_digest),
    };
    if g.json_output {
        return print_json(&report);
    }
    if !g.quiet {
        println!("versions={}", report.versions);
        println!("bytes={}", report.bytes);
        if let Some(sha) = &report.sha256 {
            println!("sha256={sha}");
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// config
// ---------------------------------------------------------------------------

fn cmd_config() -> i32 {
    let version = env!("CARGO_PKG_VERSION");
    eprintln!("revdelta version {version} (Rust)");

    let file_io = cfg!(feature = "file-io") as u8;
    eprintln!("FILE_IO={file_io}");
    eprintln!("DEFAULT_CHECKPOINT_INTERVAL={DEFAULT_CHECKPOINT_INTERVAL}");
    eprintln!("BUF_SIZE={BUF_SIZE}");

    0
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn log_filter(g: Globals) -> &'static str {
    if g.quiet {
        return "error";
    }
    match g.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    }
}

/// Main CLI entry point. Parses arguments via clap, dispatches commands.
pub fn run() -> ! {
    let cli = Cli::parse();
    let g = Globals::from(&cli);

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_filter(g)))
        .format_timestamp(None)
        .format_target(false)
        .init();

    let exit_code = match &cli.command {
        Cmd::Add(args) => report(cmd_add(g, args)),
        Cmd::Get(args) => report(cmd_get(g, args)),
        Cmd::Log(args) => report(cmd_log(g, args)),
        Cmd::Delta(args) => report(cmd_delta(g, args)),
        Cmd::Find(args) => report(cmd_find(g, args)),
        Cmd::Verify(args) => report(cmd_verify(g, args)),
        Cmd::Config => cmd_config(),
    };

    process::exit(exit_code);
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
