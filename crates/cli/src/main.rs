//! # CLI - EddyKV Interactive Shell
//!
//! A REPL-style command-line interface for the EddyKV caching window store.
//! Reads commands from stdin, executes them against the store, and prints
//! results to stdout. Designed for both interactive use and scripted testing
//! (pipe commands via stdin).
//!
//! ## Commands
//!
//! ```text
//! PUT key start value          Write a value into the window starting at `start`
//! DEL key start                Delete the record of a window (cached tombstone)
//! GET key start                Look up one window (prints value or "(nil)")
//! FETCH key from to            Windows of one key starting in [from, to]
//! BFETCH key from to           Same, newest first
//! RANGE kfrom kto from to      Windows of keys in [kfrom, kto]; `*` is open
//! BRANGE kfrom kto from to     Same, descending
//! ALL / BALL                   Every record, ascending / descending
//! FLUSH                        Apply dirty cache entries to the store
//! STATS                        Print store debug info
//! EXIT / QUIT                  Shut down
//! ```
//!
//! ## Configuration
//!
//! ```text
//! EDDY_WINDOW_SIZE_MS      window length in ms             (default: 60000)
//! EDDY_SEGMENT_INTERVAL_MS segment length in ms            (default: 3600000)
//! EDDY_KEY_SCHEMA          window | key-first | time-first (default: window)
//! EDDY_RETAIN_DUPLICATES   keep every put of a window      (default: false)
//! RUST_LOG                 log filter, written to stderr
//! ```
//!
//! ## Example
//!
//! ```text
//! $ cargo run -p cli
//! EddyKV started (schema=window, window=60000ms, segment=3600000ms, retain_duplicates=false)
//! > PUT clicks 0 12
//! OK
//! > FETCH clicks 0 60000
//! clicks@[0,60000) -> 12
//! (1 entries)
//! > EXIT
//! bye
//! ```

use anyhow::Result;
use config::StoreConfig;
use engine::{CachingWindowStore, WindowStoreIterator};
use std::io::{self, BufRead, Write};
use tracing_subscriber::EnvFilter;

/// A parsed shell command.
#[derive(Debug, PartialEq, Eq)]
enum Command {
    Put {
        key: String,
        start: i64,
        value: String,
    },
    Del {
        key: String,
        start: i64,
    },
    Get {
        key: String,
        start: i64,
    },
    Fetch {
        key: String,
        from: i64,
        to: i64,
        forward: bool,
    },
    Range {
        key_from: Option<String>,
        key_to: Option<String>,
        from: i64,
        to: i64,
        forward: bool,
    },
    All {
        forward: bool,
    },
    Flush,
    Stats,
    Exit,
}

const USAGE_PUT: &str = "ERR usage: PUT key start value";
const USAGE_DEL: &str = "ERR usage: DEL key start";
const USAGE_GET: &str = "ERR usage: GET key start";
const USAGE_FETCH: &str = "ERR usage: FETCH key from to";
const USAGE_RANGE: &str = "ERR usage: RANGE kfrom kto from to";

/// Parses one input line. `Ok(None)` for a blank line, `Err` carries the
/// message to print.
fn parse_command(line: &str) -> std::result::Result<Option<Command>, String> {
    let mut parts = line.split_whitespace();
    let Some(cmd) = parts.next() else {
        return Ok(None);
    };
    let args: Vec<&str> = parts.collect();
    let upper = cmd.to_uppercase();

    let command = match upper.as_str() {
        "PUT" => {
            if args.len() < 3 {
                return Err(USAGE_PUT.to_string());
            }
            Command::Put {
                key: args[0].to_string(),
                start: parse_time(args[1], USAGE_PUT)?,
                value: args[2..].join(" "),
            }
        }
        "DEL" | "GET" => {
            let usage = if upper == "DEL" { USAGE_DEL } else { USAGE_GET };
            let [key, start] = args[..] else {
                return Err(usage.to_string());
            };
            let key = key.to_string();
            let start = parse_time(start, usage)?;
            if upper == "DEL" {
                Command::Del { key, start }
            } else {
                Command::Get { key, start }
            }
        }
        "FETCH" | "BFETCH" => {
            let [key, from, to] = args[..] else {
                return Err(USAGE_FETCH.to_string());
            };
            Command::Fetch {
                key: key.to_string(),
                from: parse_time(from, USAGE_FETCH)?,
                to: parse_time(to, USAGE_FETCH)?,
                forward: upper == "FETCH",
            }
        }
        "RANGE" | "BRANGE" => {
            let [key_from, key_to, from, to] = args[..] else {
                return Err(USAGE_RANGE.to_string());
            };
            Command::Range {
                key_from: open_bound(key_from),
                key_to: open_bound(key_to),
                from: parse_time(from, USAGE_RANGE)?,
                to: parse_time(to, USAGE_RANGE)?,
                forward: upper == "RANGE",
            }
        }
        "ALL" => Command::All { forward: true },
        "BALL" => Command::All { forward: false },
        "FLUSH" => Command::Flush,
        "STATS" => Command::Stats,
        "EXIT" | "QUIT" => Command::Exit,
        _ => return Err(format!("unknown command: {}", cmd)),
    };
    Ok(Some(command))
}

fn parse_time(raw: &str, usage: &str) -> std::result::Result<i64, String> {
    raw.parse()
        .map_err(|_| format!("{} (bad timestamp: {})", usage, raw))
}

fn open_bound(raw: &str) -> Option<String> {
    (raw != "*").then(|| raw.to_string())
}

/// Prints every entry of a range read followed by a count line.
fn print_entries(iter: Result<WindowStoreIterator>) {
    let iter = match iter {
        Ok(iter) => iter,
        Err(e) => {
            println!("ERR fetch failed: {}", e);
            return;
        }
    };
    let mut count = 0;
    for item in iter {
        match item {
            Ok((key, value)) => {
                println!(
                    "{}@{} -> {}",
                    String::from_utf8_lossy(key.key()),
                    key.window(),
                    String::from_utf8_lossy(&value)
                );
                count += 1;
            }
            Err(e) => {
                println!("ERR fetch failed: {}", e);
                return;
            }
        }
    }
    if count == 0 {
        println!("(empty)");
    } else {
        println!("({} entries)", count);
    }
}

/// Runs one command. Returns `false` once the shell should stop.
fn execute(store: &mut CachingWindowStore, command: Command) -> bool {
    match command {
        Command::Put { key, start, value } => {
            match store.put(key.into_bytes(), value.into_bytes(), start) {
                Ok(()) => println!("OK"),
                Err(e) => println!("ERR put failed: {}", e),
            }
        }
        Command::Del { key, start } => match store.delete(key.into_bytes(), start) {
            Ok(()) => println!("OK"),
            Err(e) => println!("ERR del failed: {}", e),
        },
        Command::Get { key, start } => match store.fetch_one(key.as_bytes(), start) {
            Ok(Some(v)) => println!("{}", String::from_utf8_lossy(&v)),
            Ok(None) => println!("(nil)"),
            Err(e) => println!("ERR read failed: {}", e),
        },
        Command::Fetch {
            key,
            from,
            to,
            forward,
        } => {
            let iter = if forward {
                store.fetch(key.as_bytes(), from, to)
            } else {
                store.backward_fetch(key.as_bytes(), from, to)
            };
            print_entries(iter);
        }
        Command::Range {
            key_from,
            key_to,
            from,
            to,
            forward,
        } => {
            let key_from = key_from.as_deref().map(str::as_bytes);
            let key_to = key_to.as_deref().map(str::as_bytes);
            let iter = if forward {
                store.fetch_range(key_from, key_to, from, to)
            } else {
                store.backward_fetch_range(key_from, key_to, from, to)
            };
            print_entries(iter);
        }
        Command::All { forward } => {
            print_entries(if forward {
                store.all()
            } else {
                store.backward_all()
            });
        }
        Command::Flush => match store.flush() {
            Ok(n) => println!(
                "OK (flushed={}, store={}, segments={})",
                n,
                store.store_len(),
                store.segment_count()
            ),
            Err(e) => println!("ERR flush failed: {}", e),
        },
        Command::Stats => println!("{:?}", store),
        Command::Exit => {
            println!("bye");
            return false;
        }
    }
    true
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let config = StoreConfig::from_env()?;
    let mut store = CachingWindowStore::new(config)?;

    println!(
        "EddyKV started (schema={}, window={}ms, segment={}ms, retain_duplicates={})",
        config.schema, config.window_size, config.segment_interval, config.retain_duplicates
    );
    println!("Commands: PUT key start value | GET key start | DEL key start");
    println!("          FETCH | BFETCH key from to | RANGE | BRANGE kfrom kto from to");
    println!("          ALL | BALL | FLUSH | STATS | EXIT");
    print!("> ");
    io::stdout().flush().ok();

    let stdin = io::stdin();

    for line in stdin.lock().lines() {
        let line = line?;
        match parse_command(&line) {
            Ok(Some(command)) => {
                if !execute(&mut store, command) {
                    break;
                }
            }
            Ok(None) => {}
            Err(msg) => println!("{}", msg),
        }

        print!("> ");
        io::stdout().flush().ok();
    }

    Ok(())
}
