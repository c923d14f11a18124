//! Replays an insert/delete script and prints the tree after every line.
//!
//! Usage: `bptree-replay <script> [degree]`
//!
//! Keys are strings and pointers are signed integers. Set `RUST_LOG` (for
//! example `RUST_LOG=bptree=debug`) to watch splits and merges as they happen.

use std::env;
use std::fs;
use std::process::ExitCode;

use bptree::{playback, BPlusTree, PlaybackError, DEFAULT_DEGREE};
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = env::args().collect();
    let Some(path) = args.get(1) else {
        eprintln!("usage: bptree-replay <script> [degree]");
        return ExitCode::FAILURE;
    };
    let degree = match args.get(2).map(|arg| arg.parse::<usize>()) {
        None => DEFAULT_DEGREE,
        Some(Ok(degree)) => degree,
        Some(Err(err)) => {
            eprintln!("invalid degree `{}`: {}", args[2], err);
            return ExitCode::FAILURE;
        }
    };

    let script = match fs::read_to_string(path) {
        Ok(script) => script,
        Err(err) => {
            eprintln!("{}", PlaybackError::from(err));
            return ExitCode::FAILURE;
        }
    };
    let mut tree = match BPlusTree::<String, i64>::new(degree) {
        Ok(tree) => tree,
        Err(err) => {
            eprintln!("{}", err);
            return ExitCode::FAILURE;
        }
    };

    let replay = playback::replay(&mut tree, &script);
    for (index, frame) in replay.frames.iter().enumerate() {
        println!("{} : {}", index, frame.text);
        print!("{}", frame.tree);
    }

    match replay.error {
        None => ExitCode::SUCCESS,
        Some(err) => {
            if let Some(text) = err.text() {
                eprintln!("{}", text);
            }
            eprintln!("{}", err);
            ExitCode::FAILURE
        }
    }
}
