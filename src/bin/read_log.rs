//! Dump the events of one kind found in a log.

use specter::*;
use std::env;
use std::process::exit;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

fn dump<E: LogRecord + std::fmt::Debug>(path: &str, floor: u64) -> Result<()> {
    let mut parser = LogParser::<_, E>::new(LogReader::open(path)?, floor);
    for event in parser.by_ref() {
        println!("{:x?}", event);
    }
    let stats = parser.stats();
    parser.into_inner().finish()?;
    println!("[*] Loaded {} {} events from '{}' ({} malformed, {} below floor)",
        stats.accepted, E::KIND, path, stats.malformed, stats.below_floor);
    Ok(())
}

fn main() {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::from_default_env())
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .expect("setting default subscriber failed");

    let args: Vec<String> = env::args().collect();
    if args.len() < 3 {
        println!("usage: {} <branch|decode|writeback|memory> <log file>", args[0]);
        return;
    }

    let kind: EventKind = match args[1].parse() {
        Ok(kind) => kind,
        Err(e) => {
            eprintln!("[!] {}", e);
            exit(1);
        },
    };

    let floor = PipelineConfig::default().address_floor;
    let res = match kind {
        EventKind::Branch => dump::<BranchEvent>(&args[2], floor),
        EventKind::Decode => dump::<DecodeEvent>(&args[2], floor),
        EventKind::Writeback => dump::<WritebackEvent>(&args[2], floor),
        EventKind::Memory => dump::<MemoryEvent>(&args[2], floor),
    };
    if let Err(e) = res {
        eprintln!("[!] {}", e);
        exit(1);
    }
}
