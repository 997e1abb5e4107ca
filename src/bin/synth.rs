//! Print a synthetic branch log and commit log.

use specter::*;
use std::env;
use std::process::exit;

fn main() {
    let args: Vec<String> = env::args().collect();
    if args.len() < 3 {
        println!("usage: {} <branch|commit> <num decodes> [seed]", args[0]);
        return;
    }

    let len = match args[2].parse::<usize>() {
        Ok(len) => len,
        Err(e) => {
            eprintln!("[!] bad length '{}': {}", args[2], e);
            exit(1);
        },
    };
    let seed = args.get(3).and_then(|s| s.parse::<u64>().ok()).unwrap_or(0);

    let cfg = SynthConfig { len, ..SynthConfig::default() };
    let trace = SyntheticTrace::generate(&cfg, seed);
    let lines = match args[1].as_str() {
        "branch" => trace.branch_log(),
        "commit" => trace.commit_log(),
        other => {
            eprintln!("[!] unknown log '{}'", other);
            exit(1);
        },
    };
    for line in lines {
        println!("{}", line);
    }
}
