// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

//! CLI tool for poking at chained hash tables

use chain_table::{
    coding::{decode_i64, encode_i64},
    hash, Config, HashStrategy, HashTable, Node, Status, DEFAULT_MIN_BUCKETS,
};
use clap::{ArgAction, CommandFactory, Parser, Subcommand, ValueEnum};
use humansize::{format_size, BINARY};
use rustyline::DefaultEditor;
use std::cmp::Ordering;
use std::io::{self, BufRead, IsTerminal, Write};
use std::time::Instant;
use tracing_subscriber::{
    filter::{EnvFilter, LevelFilter},
    prelude::*,
    registry::Registry,
};

macro_rules! die {
    ($fmt:literal, $($arg:tt)*) => {{
        eprintln!($fmt, $($arg)*);
        std::process::exit(1);
    }};

    ($msg:literal) => {{
        eprintln!($msg);
        std::process::exit(1);
    }};

    () => {{
        eprintln!("Program terminated unexpectedly");
        std::process::exit(1);
    }};
}

#[allow(unused_imports)]
use tracing::{debug, error, info, trace, warn};

pub fn init_tracing(quiet: bool, verbose: u8) -> LevelFilter {
    let level_filter = if quiet {
        LevelFilter::ERROR
    } else {
        match verbose {
            0 => LevelFilter::WARN,
            1 => LevelFilter::INFO,
            2 => LevelFilter::DEBUG,
            _ => LevelFilter::TRACE,
        }
    };

    // Bridge log crate macros to tracing (the library logs through log::*)
    if tracing_log::LogTracer::init().is_err() {
        die!("INTERNAL ERROR: setting log tracer failed");
    }

    let registry = Registry::default();

    let env_filter = EnvFilter::builder()
        .with_default_directive(level_filter.into())
        .with_env_var("HTAB_LOG")
        .from_env_lossy()
        .add_directive(
            "rustyline=warn"
                .parse()
                .expect("Failed to parse rustyline directive"),
        );

    let subscriber = registry.with(env_filter).with(
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .compact(),
    );

    if tracing::subscriber::set_global_default(subscriber).is_err() {
        die!("INTERNAL ERROR: setting default tracing::subscriber failed");
    }

    let prev_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        tracing_panic::panic_hook(info);
        prev_hook(info); // daisy-chain to old panic hook
    }));

    level_filter
}

/// Accepts decimal or `0x` prefixed hexadecimal
fn parse_u64(s: &str) -> Result<u64, String> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => s.parse(),
    };
    parsed.map_err(|e| e.to_string())
}

/// Hash strategy, picked at runtime
#[derive(Copy, Clone, Debug, Default, ValueEnum)]
enum Hasher {
    /// Seeded FNV-1 (add, then multiply), C string compare
    #[default]
    Fnv,

    /// XXH3 64-bit, byte-wise compare
    Xxh3,
}

impl HashStrategy for Hasher {
    fn hash(&self, key: &[u8], seed: u64) -> u64 {
        match self {
            Self::Fnv => hash::Fnv1.hash(key, seed),
            Self::Xxh3 => hash::Xxh3.hash(key, seed),
        }
    }

    fn compare(&self, a: &[u8], b: &[u8]) -> Ordering {
        match self {
            Self::Fnv => hash::Fnv1.compare(a, b),
            Self::Xxh3 => hash::Xxh3.compare(a, b),
        }
    }
}

/// CLI tool for poking at chained hash tables
#[derive(Parser, Debug)]
#[command(name = "htab")]
#[command(about = "CLI tool for poking at chained hash tables")]
struct ToolArgs {
    /// Suppress all output except for errors. This overrides the -v flag.
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Turn on verbose output. Supply -v multiple times to increase verbosity.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Hash seed (decimal or 0x-prefixed hex)
    #[arg(long, value_parser = parse_u64, value_name = "SEED")]
    seed: Option<u64>,

    /// Initial bucket count, the table never shrinks below it (power of two)
    #[arg(long, default_value_t = DEFAULT_MIN_BUCKETS, value_name = "N")]
    min_buckets: u32,

    /// Keep the bucket array at its largest size when deleting
    #[arg(long, default_value_t = false)]
    no_shrink: bool,

    /// Hash & compare strategy
    #[arg(long, value_enum, default_value_t = Hasher::Fnv)]
    hasher: Hasher,

    /// Command to run (if omitted, starts interactive shell)
    #[command(subcommand)]
    command: Option<ToolCommand>,
}

#[derive(Subcommand, Debug, Clone)]
enum ToolCommand {
    /// Get the value for a key
    Get {
        /// The key to look up
        key: String,
    },
    /// Set a key-value pair
    Set {
        /// The key to set
        key: String,
        /// The value to store
        value: String,
    },
    /// Delete a key
    Del {
        /// The key to delete
        key: String,
    },
    /// Get the value for an integer key
    Iget {
        /// The integer key to look up
        #[arg(allow_negative_numbers = true)]
        key: i64,
    },
    /// Set a value under an integer key
    Iset {
        /// The integer key to set
        #[arg(allow_negative_numbers = true)]
        key: i64,
        /// The value to store
        value: String,
    },
    /// Delete an integer key
    Idel {
        /// The integer key to delete
        #[arg(allow_negative_numbers = true)]
        key: i64,
    },
    /// List all keys (sorted), optionally filtered by prefix
    #[command(visible_alias = "list", visible_alias = "ls")]
    Scan {
        /// Optional prefix to filter keys
        prefix: Option<String>,
    },
    /// Count the number of items (cached and by walking every chain)
    Count,
    /// Show table statistics
    Info,
    /// Show the hash seed, or rehash the table with a new one
    Seed {
        /// New seed (decimal or 0x-prefixed hex)
        #[arg(value_parser = parse_u64)]
        value: Option<u64>,
    },
    /// Show the key bytes of an integer
    Encode {
        /// The integer to encode
        #[arg(allow_negative_numbers = true)]
        value: i64,
    },
    /// Decode key bytes (hex) back into an integer
    Decode {
        /// Hex bytes, e.g. "89 02 01" or "890201"
        #[arg(required = true, num_args = 1..)]
        hex: Vec<String>,
    },
    /// Insert keys "1".."N", delete them again, then do the same with integer keys
    Stress {
        /// Number of keys
        #[arg(default_value_t = 1000)]
        n: u32,
    },
}

// Internal shell commands, include all external tool commands
#[derive(Parser, Debug)]
#[command(name = "")]
#[command(no_binary_name = true)]
#[command(disable_version_flag = true)]
#[command(help_template = "
{version}

Available Commands:

{subcommands}

Use `help COMMAND` or `COMMAND --help` for more details.

")]

struct ShellArgs {
    #[command(subcommand)]
    command: ShellCommand,
}

// Shell commands (including ones not available from CLI)
#[derive(Subcommand, Debug, Clone)]
enum ShellCommand {
    #[command(flatten)]
    ToolCmd(ToolCommand),

    /// Exit the current shell
    #[command(visible_alias = "quit")]
    Exit,
    /// Remove every entry
    Clear,
}

/// Settings a table is built from
#[derive(Copy, Clone, Debug)]
struct Options {
    seed: Option<u64>,
    min_buckets: u32,
    shrink: bool,
    hasher: Hasher,
}

impl Options {
    fn build(self) -> chain_table::Result<HashTable<String, Hasher>> {
        let mut config = Config::new()
            .min_buckets(self.min_buckets)
            .shrink(self.shrink);

        if let Some(seed) = self.seed {
            config = config.seed(seed);
        }

        config.hash_strategy(self.hasher).build()
    }
}

struct Session {
    table: HashTable<String, Hasher>,
    options: Options,
}

impl Session {
    fn open(options: Options) -> chain_table::Result<Self> {
        Ok(Self {
            table: options.build()?,
            options,
        })
    }
}

/// Printable form of a stored key
fn format_key(node: &Node<String>) -> String {
    if let Ok(s) = std::str::from_utf8(node.key()) {
        if !s.chars().any(char::is_control) {
            return s.to_string();
        }
    }

    match node.key_as_int() {
        Ok(n) => format!("#{n}"),
        Err(_) => format!("{:?}", node.key()),
    }
}

fn format_hex(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect::<Vec<_>>()
        .join(" ")
}

fn parse_hex(parts: &[String]) -> Result<Vec<u8>, String> {
    let digits = parts.concat().replace([' ', ':'], "");

    if digits.len() % 2 != 0 {
        return Err(format!("odd number of hex digits in {digits:?}"));
    }

    (0..digits.len())
        .step_by(2)
        .map(|i| {
            digits
                .get(i..i + 2)
                .ok_or_else(|| "invalid hex".to_string())
                .and_then(|pair| u8::from_str_radix(pair, 16).map_err(|e| e.to_string()))
        })
        .collect()
}

fn print_status(status: Status) {
    match status {
        Status::Ok => println!("OK (set)"),
        Status::UpdatedExisting => println!("OK (updated)"),
        Status::CapacityDegraded => println!("OK (set, {status})"),
    }
}

fn print_info(session: &Session) {
    let table = &session.table;

    println!("Buckets: {} (min {})", table.bucket_count(), table.min_buckets());
    println!("Entries: {}", table.count());
    println!("Max chain length: {}", table.max_chain_length());

    let histogram = table
        .chain_lengths()
        .iter()
        .enumerate()
        .filter(|(_, n)| **n > 0)
        .map(|(len, n)| format!("{len}:{n}"))
        .collect::<Vec<_>>()
        .join(" ");
    println!("Chain lengths: {histogram}");

    println!("Seed: {:#018x}", table.seed());
    println!("Hasher: {:?}", session.options.hasher);
    println!("Shrink: {}", if table.shrink_enabled() { "on" } else { "off" });
    println!("Degraded: {}", if table.is_degraded() { "yes" } else { "no" });
    println!(
        "Approximate memory: {}",
        format_size(table.approximate_memory(), BINARY)
    );
}

fn handle_get(session: &Session, key: &str) {
    match session.table.find(key) {
        Ok(Some(node)) => println!("{}", node.value()),
        Ok(None) => println!("(not found)"),
        Err(e) => eprintln!("Error: {}", e),
    }
}

fn handle_set(session: &mut Session, key: &str, value: &str) {
    match session.table.insert(key, value.to_string()) {
        Ok(status) => print_status(status),
        Err(e) => eprintln!("Error: {}", e),
    }
}

fn handle_del(session: &mut Session, key: &str) {
    match session.table.delete(key) {
        Ok(Some(_)) => println!("OK"),
        Ok(None) => println!("(not found)"),
        Err(e) => eprintln!("Error: {}", e),
    }
}

fn handle_iget(session: &Session, key: i64) {
    match session.table.find_int(key) {
        Some(node) => println!("{}", node.value()),
        None => println!("(not found)"),
    }
}

fn handle_iset(session: &mut Session, key: i64, value: &str) {
    match session.table.insert_int(key, value.to_string()) {
        Ok(status) => print_status(status),
        Err(e) => eprintln!("Error: {}", e),
    }
}

fn handle_idel(session: &mut Session, key: i64) {
    match session.table.delete_int(key) {
        Some(_) => println!("OK"),
        None => println!("(not found)"),
    }
}

fn handle_scan(session: &Session, prefix: Option<&str>) {
    let mut items = session
        .table
        .iter()
        .filter(|node| prefix.is_none_or(|p| node.key().starts_with(p.as_bytes())))
        .map(|node| (format_key(node), node.value().as_str()))
        .collect::<Vec<_>>();

    items.sort_unstable();

    for (key, value) in &items {
        println!("{} = {}", key, value);
    }
    println!("OK ({} items)", items.len());
}

fn handle_count(session: &Session) {
    let cached = session.table.count();
    let walked = session.table.count_by_walk();

    if cached == walked {
        println!("{}", cached);
    } else {
        eprintln!("WARNING: cached count {} does not match walk {}", cached, walked);
        println!("{}", walked);
    }
}

fn handle_seed(session: &mut Session, value: Option<u64>) {
    match value {
        Some(seed) => {
            session.table.set_seed(seed);
            session.options.seed = Some(seed);
            println!("OK (rehashed {} items)", session.table.count());
        }
        None => println!("{:#018x}", session.table.seed()),
    }
}

fn handle_encode(value: i64) {
    println!("{}", format_hex(&encode_i64(value)));
}

fn handle_decode(hex: &[String]) {
    let bytes = match parse_hex(hex) {
        Ok(bytes) => bytes,
        Err(e) => {
            eprintln!("Error: {}", e);
            return;
        }
    };

    match decode_i64(&bytes) {
        Ok(n) => println!("{}", n),
        Err(e) => eprintln!("Error: {}", e),
    }
}

fn handle_stress(options: Options, n: u32) {
    let mut table = match options.build() {
        Ok(table) => table,
        Err(e) => {
            eprintln!("Error: {}", e);
            return;
        }
    };

    let start = Instant::now();

    for i in 1..=n {
        if let Err(e) = table.insert(i.to_string(), String::new()) {
            eprintln!("Error: {}", e);
            return;
        }
    }
    println!(
        "inserted {} string keys: count={} walked={} max chain={} buckets={}",
        n,
        table.count(),
        table.count_by_walk(),
        table.max_chain_length(),
        table.bucket_count(),
    );

    for i in 1..=n {
        if let Err(e) = table.delete(i.to_string()) {
            eprintln!("Error: {}", e);
            return;
        }
    }
    println!(
        "deleted {} string keys: count={} walked={} buckets={}",
        n,
        table.count(),
        table.count_by_walk(),
        table.bucket_count(),
    );

    for i in 1..=i64::from(n) {
        if let Err(e) = table.insert_int(i, String::new()) {
            eprintln!("Error: {}", e);
            return;
        }
    }
    println!(
        "inserted {} integer keys: count={} walked={} max chain={} buckets={}",
        n,
        table.count(),
        table.count_by_walk(),
        table.max_chain_length(),
        table.bucket_count(),
    );

    for i in 1..=i64::from(n) {
        table.delete_int(i);
    }
    println!(
        "deleted {} integer keys: count={} walked={} buckets={}",
        n,
        table.count(),
        table.count_by_walk(),
        table.bucket_count(),
    );

    table.free_all();

    println!("OK ({:?})", start.elapsed());
}

/// Result of executing a command
enum CommandResult {
    Continue,
    Exit,
}

/// Execute a parsed command
fn execute_command(session: &mut Session, cmd: ToolCommand) -> CommandResult {
    match cmd {
        ToolCommand::Get { key } => handle_get(session, &key),
        ToolCommand::Set { key, value } => handle_set(session, &key, &value),
        ToolCommand::Del { key } => handle_del(session, &key),
        ToolCommand::Iget { key } => handle_iget(session, key),
        ToolCommand::Iset { key, value } => handle_iset(session, key, &value),
        ToolCommand::Idel { key } => handle_idel(session, key),
        ToolCommand::Scan { prefix } => handle_scan(session, prefix.as_deref()),
        ToolCommand::Count => handle_count(session),
        ToolCommand::Info => print_info(session),
        ToolCommand::Seed { value } => handle_seed(session, value),
        ToolCommand::Encode { value } => handle_encode(value),
        ToolCommand::Decode { hex } => handle_decode(&hex),
        ToolCommand::Stress { n } => handle_stress(session.options, n),
    }
    CommandResult::Continue
}

/// Execute a shell-only command
fn execute_shell_command(session: &mut Session, cmd: ShellCommand) -> CommandResult {
    match cmd {
        ShellCommand::ToolCmd(tool_cmd) => execute_command(session, tool_cmd),
        ShellCommand::Exit => CommandResult::Exit,
        ShellCommand::Clear => {
            let count = session.table.count();
            session.table.clear();
            println!("OK (cleared {} items)", count);
            CommandResult::Continue
        }
    }
}

/// Parse and run a shell command line
fn run_shell_command(session: &mut Session, line: &str) -> CommandResult {
    let line = line.trim();
    if line.is_empty() {
        return CommandResult::Continue;
    }

    let tokens = match shlex::split(line) {
        Some(t) if !t.is_empty() => t,
        Some(_) => return CommandResult::Continue,
        None => {
            eprintln!("error: unclosed quote");
            return CommandResult::Continue;
        }
    };

    match ShellArgs::try_parse_from(&tokens) {
        Ok(args) => execute_shell_command(session, args.command),
        Err(e) => {
            // Print clap's error message
            eprintln!("{}", e);
            CommandResult::Continue
        }
    }
}

fn run_shell(session: &mut Session) {
    if io::stdin().is_terminal() {
        run_shell_interactive(session);
    } else {
        run_shell_non_interactive(session);
    }
}

fn run_shell_interactive(session: &mut Session) {
    println!("Welcome to the hash table shell");
    println!("Type 'help' for available commands, 'exit' to quit.\n");

    let mut rl = match DefaultEditor::new() {
        Ok(editor) => editor,
        Err(e) => {
            eprintln!("Error initializing line editor: {}", e);
            return;
        }
    };

    loop {
        match rl.readline("htab> ") {
            Ok(line) => {
                let _ = rl.add_history_entry(&line);
                if let CommandResult::Exit = run_shell_command(session, &line) {
                    break;
                }
            }
            Err(rustyline::error::ReadlineError::Interrupted) => {
                // Ignore Ctrl+C, just show a new prompt
                continue;
            }
            Err(rustyline::error::ReadlineError::Eof) => {
                println!();
                break;
            }
            Err(e) => {
                eprintln!("Error reading input: {}", e);
                break;
            }
        }
    }
}

fn run_shell_non_interactive(session: &mut Session) {
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        if stdout.flush().is_err() {
            die!("can't flush stdout");
        }

        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) => {
                // EOF
                break;
            }
            Ok(_) => {
                if let CommandResult::Exit = run_shell_command(session, &line) {
                    break;
                }
            }
            Err(e) => {
                die!("Error reading input: {}", e);
            }
        }
    }
}

fn main() {
    let args = ToolArgs::parse();
    let level_filter = init_tracing(args.quiet, args.verbose);

    let cmd = ToolArgs::command();

    info!(
        "starting {} ({} {}), log level: {level_filter}",
        cmd.get_name(),
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION")
    );

    let options = Options {
        seed: args.seed,
        min_buckets: args.min_buckets,
        shrink: !args.no_shrink,
        hasher: args.hasher,
    };

    let mut session = match Session::open(options) {
        Ok(s) => s,
        Err(e) => die!("Error creating table: {}", e),
    };

    match args.command {
        Some(cmd) => {
            execute_command(&mut session, cmd);
        }
        None => run_shell(&mut session),
    }
}
