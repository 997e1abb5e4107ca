//! Classify every decoded instruction in a commit log as retired or squashed.

use specter::*;
use std::env;
use std::fs::File;
use std::io::BufWriter;
use std::process::exit;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

fn print_stats(name: &str, stats: &ParseStats) {
    println!("  {:10} {:>10} lines, {:>10} events ({} malformed, {} below floor)",
        name, stats.lines, stats.accepted, stats.malformed, stats.below_floor);
}

fn main() {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::from_default_env())
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .expect("setting default subscriber failed");

    let args: Vec<String> = env::args().collect();
    if args.len() < 3 {
        println!("usage: {} <branch log> <commit log> [speculative.csv]", args[0]);
        return;
    }

    let out = match Pipeline::default().run_files(&args[1], &args[2]) {
        Ok(out) => out,
        Err(e) => {
            eprintln!("[!] {}", e);
            exit(1);
        },
    };

    println!("[*] Parsed logs (horizon {:x?})", out.horizon);
    print_stats("branch", &out.branch_stats);
    print_stats("decode", &out.decode_stats);
    print_stats("writeback", &out.writeback_stats);

    let c = &out.correlation;
    println!("[*] {} decodes: {} retired, {} speculative ({:.2}%), {} orphan writebacks",
        c.num_decodes(), c.num_retired(), c.num_speculative(),
        c.speculation_rate() * 100.0, c.orphans.len());

    let p = &out.projection;
    println!("[*] {} branches: {} taken, {} not taken, {} jumps",
        p.branches.len(), p.taken().len(), p.not_taken().len(), p.jumps().len());

    let stat = SpeculationStats::from_decodes(&c.decodes);
    println!("[*] {} unique instructions, {} squashed at least once, {} never retired",
        stat.num_unique(), stat.num_ever_squashed(), stat.num_never_retired());
    println!(" {:<16} | {:<10} | {:<10} | {:<}", "PC", "Decodes", "Squashed", "Longest run");
    println!("------------------+------------+------------+------------");
    for (pc, data) in stat.most_speculated(16) {
        println!(" {:016x} | {:<10} | {:<10} | {:<}",
            pc, data.occ, data.speculative(), data.longest_squash_run());
    }

    if let Some(path) = args.get(3) {
        let res = File::create(path).and_then(|f| {
            Projection::write_points(&p.speculative, BufWriter::new(f))
        });
        match res {
            Ok(()) => println!("[*] Wrote {} points to '{}'", p.speculative.len(), path),
            Err(e) => {
                eprintln!("[!] failed to write '{}': {}", path, e);
                exit(1);
            },
        }
    }
}
