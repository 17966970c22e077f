#![allow(clippy::uninlined_format_args)]

use log::{debug, info};
use retro::{backends, Error, Flags, Limits, Regex};
use std::{
    fs,
    path::{Path, PathBuf},
    time::Instant,
};
use structopt::StructOpt;

#[derive(Debug, StructOpt)]
#[structopt(name = "retro-tool")]
struct Opt {
    /// The regular expression.
    pattern: String,

    /// The flags of the regular expression: 'n' skips anchor checks, 'm'
    /// memoizes the backtracker.
    #[structopt(long, short, parse(from_str = Flags::from))]
    flags: Option<Flags>,

    /// Use the PikeVM backend for execution.
    #[structopt(long)]
    pikevm: bool,

    /// Search for matches anywhere, instead of matching a prefix.
    #[structopt(long)]
    search: bool,

    /// Maximum number of instructions executed per match attempt.
    #[structopt(long)]
    max_steps: Option<usize>,

    /// Dump the IR to stdout.
    #[structopt(long)]
    dump_ir: bool,

    /// Dump the bytecode to stdout.
    #[structopt(long)]
    dump_bytecode: bool,

    /// Dump all regular expression compilation phases to stdout.
    #[structopt(long)]
    dump_phases: bool,

    /// The input values to match against.
    #[structopt(conflicts_with_all = &["bench", "file"])]
    inputs: Vec<String>,

    /// Match against the contents of a specified file.
    #[structopt(long, conflicts_with_all = &["bench", "inputs"])]
    file: Option<PathBuf>,

    /// Benchmark the matches of the specified file.
    #[structopt(long, conflicts_with_all = &["file", "inputs"])]
    bench: Option<PathBuf>,
}

/// Which executor runs the program.
#[derive(Debug, Copy, Clone)]
enum Backend {
    Backtrack,
    #[cfg(feature = "backend-pikevm")]
    PikeVM,
}

fn prefix_match(re: &Regex, backend: Backend, input: &[u8]) -> Result<Option<usize>, Error> {
    match backend {
        Backend::Backtrack => backends::match_prefix::<backends::BacktrackExecutor>(re, input),
        #[cfg(feature = "backend-pikevm")]
        Backend::PikeVM => backends::match_prefix::<backends::PikeVMExecutor>(re, input),
    }
}

/// \return the ranges of all matches, or the error which ended the search.
fn search(re: &Regex, backend: Backend, input: &[u8]) -> Result<Vec<retro::Range>, Error> {
    macro_rules! collect {
        ($executor:ty) => {{
            let mut matches = backends::find::<$executor>(re, input, 0);
            let ranges: Vec<_> = matches.by_ref().map(|m| m.range()).collect();
            match matches.error() {
                Some(err) => Err(err.clone()),
                None => Ok(ranges),
            }
        }};
    }
    match backend {
        Backend::Backtrack => collect!(backends::BacktrackExecutor),
        #[cfg(feature = "backend-pikevm")]
        Backend::PikeVM => collect!(backends::PikeVMExecutor),
    }
}

fn exec_re_on_input(re: &Regex, backend: Backend, search_mode: bool, input: &[u8]) {
    if search_mode {
        match search(re, backend, input) {
            Ok(ranges) if ranges.is_empty() => println!("No match"),
            Ok(ranges) => println!(
                "Match: {:?} ({}..{}), total: {}",
                String::from_utf8_lossy(&input[ranges[0].clone()]),
                ranges[0].start,
                ranges[0].end,
                ranges.len()
            ),
            Err(err) => println!("Error: {}", err),
        }
    } else {
        match prefix_match(re, backend, input) {
            Ok(Some(end)) => println!("Match: 0..{}", end),
            Ok(None) => println!("No match"),
            Err(err) => println!("Error: {}", err),
        }
    }
}

fn bench_re_on_path(re: &Regex, backend: Backend, path: &Path) {
    let contents = match fs::read(path) {
        Ok(contents) => contents,
        Err(err) => {
            println!("{}: {}", err, path.display());
            return;
        }
    };
    // Warmup
    let _ = search(re, backend, &contents);
    let start = Instant::now();
    for _ in 0..25 {
        let _ = search(re, backend, &contents);
    }
    let duration = start.elapsed();
    println!("{} ms", duration.as_millis());
}

fn main() -> Result<(), Error> {
    env_logger::init();
    let args = Opt::from_args();

    let flags = args.flags.unwrap_or_default();
    let mut limits = Limits::default();
    if let Some(max_steps) = args.max_steps {
        limits.max_steps = max_steps;
    }
    info!("pattern {:?} flags {:?}", args.pattern, flags.to_string());

    let ire = backends::try_parse(args.pattern.as_bytes(), flags, &limits)?;
    if args.dump_phases || args.dump_ir {
        println!("IR:\n{}", ire);
    }

    let cr = backends::emit(ire, &limits)?;
    if args.dump_phases || args.dump_bytecode {
        println!("Bytecode:\n{:?}", cr);
    }
    let re: Regex = cr.into();

    let backend = if args.pikevm {
        #[cfg(feature = "backend-pikevm")]
        {
            Backend::PikeVM
        }
        #[cfg(not(feature = "backend-pikevm"))]
        {
            println!("PikeVM backend not available. Compile with --features backend-pikevm");
            std::process::exit(1);
        }
    } else {
        Backend::Backtrack
    };
    debug!("using {:?} backend", backend);

    if let Some(ref path) = args.file {
        match fs::read(path) {
            Ok(contents) => exec_re_on_input(&re, backend, args.search, &contents),
            Err(err) => println!("{}: {}", err, path.display()),
        };
    } else if let Some(ref path) = args.bench {
        bench_re_on_path(&re, backend, path);
    } else {
        for input in args.inputs {
            exec_re_on_input(&re, backend, args.search, input.as_bytes());
        }
    }
    Ok(())
}
