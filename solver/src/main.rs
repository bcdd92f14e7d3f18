use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::num::NonZero;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand};
use cpfsat::format::{read_problem, write_problem};
use cpfsat::grid::{Grid, GridBuilder};
use cpfsat::{CancellationToken, Outcome, Pruning, Schedule, SearchConfig, SearchDriver, VarisatOracle};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

const NOT_SOLVED: u8 = 1;
const UNREADABLE: u8 = 2;
const MISSING_INPUT: u8 = 3;

const WAIT_SLICE: Duration = Duration::from_millis(50);

/// Cooperative pathfinding through SAT.
#[derive(Parser, Debug)]
#[command(name = "cpf", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Find a schedule of minimal makespan for a problem file.
    Solve(SolveArgs),
    /// Check a result file against its problem file.
    Verify(VerifyArgs),
    /// Write a random square grid problem.
    Generate(GenerateArgs),
}

#[derive(Args, Debug)]
struct SolveArgs {
    /// Problem file to solve [required]
    #[arg(long)]
    input: Option<PathBuf>,
    /// Smallest makespan to try
    #[arg(long, default_value_t = 0)]
    min_makespan: usize,
    /// Largest makespan to try
    #[arg(long, default_value_t = usize::MAX)]
    max_makespan: usize,
    /// Give up after this many seconds
    #[arg(long)]
    max_time: Option<f64>,
    /// Allocate every variable instead of only the reachable ones
    #[arg(long)]
    no_mdd: bool,
    /// Where to write the schedule; standard output if absent
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct VerifyArgs {
    /// Problem file
    #[arg(long)]
    graph: PathBuf,
    /// Result file produced for that problem
    #[arg(long)]
    result: PathBuf,
    /// Print every time step; the problem must be a square grid
    #[arg(long)]
    show_as_grid: bool,
}

#[derive(Args, Debug)]
struct GenerateArgs {
    /// Side of the grid
    #[arg(long, default_value = "4")]
    size: NonZero<usize>,
    /// Percentage of cells which are walls
    #[arg(long, default_value_t = 20)]
    wall_percent: usize,
    /// Percentage of cells which hold an agent
    #[arg(long, default_value_t = 10)]
    agent_percent: usize,
    /// Seed for the generator; random if absent
    #[arg(long)]
    seed: Option<u64>,
    /// Where to write the problem; standard output if absent
    #[arg(long)]
    output: Option<PathBuf>,
    /// Draw the grid, to the given file or standard output
    #[arg(long, num_args = 0..=1)]
    display: Option<Option<PathBuf>>,
}

fn enable_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .init();
}

fn open(path: &Path) -> Result<BufReader<File>, ExitCode> {
    File::open(path).map(BufReader::new).map_err(|err| {
        error!(path = %path.display(), "unable to read file: {err}");
        ExitCode::from(UNREADABLE)
    })
}

fn create(path: Option<&Path>) -> Result<Box<dyn Write>, ExitCode> {
    match path {
        None => Ok(Box::new(io::stdout().lock())),
        Some(path) => File::create(path)
            .map(|file| Box::new(BufWriter::new(file)) as Box<dyn Write>)
            .map_err(|err| {
                error!(path = %path.display(), "unable to write file: {err}");
                ExitCode::from(UNREADABLE)
            }),
    }
}

fn solve(args: SolveArgs) -> Result<ExitCode> {
    let Some(input) = args.input else {
        error!("parameter --input required");
        return Ok(ExitCode::from(MISSING_INPUT));
    };

    let reader = match open(&input) {
        Ok(reader) => reader,
        Err(code) => return Ok(code),
    };
    let problem = match read_problem(reader) {
        Ok(problem) => problem,
        Err(err) => {
            error!(path = %input.display(), "{err}");
            return Ok(ExitCode::from(NOT_SOLVED));
        }
    };
    info!(nodes = problem.graph().size(), edges = problem.graph().edge_count(), agents = problem.agents().len(), "problem loaded");

    let config = SearchConfig::default()
        .with_min_makespan(args.min_makespan)
        .with_max_makespan(args.max_makespan)
        .with_pruning(if args.no_mdd { Pruning::Disabled } else { Pruning::Reachability });

    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    if let Err(err) = ctrlc::set_handler(move || interrupt.cancel()) {
        warn!("unable to install the interrupt handler: {err}");
    }

    let deadline = match args.max_time {
        Some(seconds) => Instant::now().checked_add(Duration::try_from_secs_f64(seconds).context("invalid --max-time")?),
        None => None,
    };

    let (tx, rx) = mpsc::channel();
    let worker_cancel = cancel.clone();
    thread::spawn(move || {
        let report = SearchDriver::new(config).run(&problem, &mut VarisatOracle::new(), &worker_cancel);
        // the receiver is gone once the run was abandoned
        let _ = tx.send(report);
    });

    let report = loop {
        match rx.recv_timeout(WAIT_SLICE) {
            Ok(report) => break report?,
            Err(RecvTimeoutError::Disconnected) => return Err(anyhow!("search thread stopped without a report")),
            Err(RecvTimeoutError::Timeout) => {}
        }

        if cancel.is_cancelled() {
            warn!("interrupted; no solution found in time");
            return Ok(ExitCode::from(NOT_SOLVED));
        }
        if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
            cancel.cancel();
            warn!("time budget exhausted; no solution found in time");
            return Ok(ExitCode::from(NOT_SOLVED));
        }
    };

    match report.outcome {
        Outcome::Solved { makespan, schedule } => {
            info!(makespan, elapsed_ms = report.elapsed.as_millis() as u64, "writing schedule");
            let mut out = match create(args.output.as_deref()) {
                Ok(out) => out,
                Err(code) => return Ok(code),
            };
            write!(out, "{schedule}").context("failed to write schedule")?;
            out.flush()?;
            Ok(ExitCode::SUCCESS)
        }
        Outcome::Aborted { makespan } => {
            warn!(makespan, "search aborted");
            Ok(ExitCode::from(NOT_SOLVED))
        }
        Outcome::Exhausted => {
            warn!(attempts = report.attempts.len(), "no makespan in range is feasible");
            Ok(ExitCode::from(NOT_SOLVED))
        }
    }
}

fn verify(args: VerifyArgs) -> Result<ExitCode> {
    let problem = match open(&args.graph) {
        Ok(reader) => read_problem(reader).with_context(|| format!("reading {}", args.graph.display()))?,
        Err(code) => return Ok(code),
    };
    let schedule = match open(&args.result) {
        Ok(reader) => Schedule::read(reader).with_context(|| format!("reading {}", args.result.display()))?,
        Err(code) => return Ok(code),
    };

    let violations = schedule.violations(&problem);
    for violation in &violations {
        println!("{violation}");
    }
    println!("Verification done");

    if args.show_as_grid {
        let Some(grid) = Grid::from_problem(problem) else {
            error!("the problem is not a square grid");
            return Ok(ExitCode::from(NOT_SOLVED));
        };

        println!("Showing time steps:");
        for time in 0..=schedule.makespan().unwrap_or(0) {
            println!("t={time}");
            println!("{}", grid.render(&schedule, time));
        }
    }

    Ok(if violations.is_empty() { ExitCode::SUCCESS } else { ExitCode::from(NOT_SOLVED) })
}

fn generate(args: GenerateArgs) -> Result<ExitCode> {
    let seed = args.seed.unwrap_or_else(rand::random);
    info!(seed, size = args.size.get(), "generating grid");
    let mut rng = ChaCha8Rng::seed_from_u64(seed);

    let grid = match GridBuilder::random(args.size, args.wall_percent, args.agent_percent, &mut rng).build() {
        Ok(grid) => grid,
        Err(reasons) => {
            error!(?reasons, "unable to generate a grid");
            return Ok(ExitCode::from(NOT_SOLVED));
        }
    };

    let mut out = match create(args.output.as_deref()) {
        Ok(out) => out,
        Err(code) => return Ok(code),
    };
    write_problem(&mut out, grid.problem()).context("failed to write problem")?;
    out.flush()?;

    if let Some(display) = args.display {
        let mut out = match create(display.as_deref()) {
            Ok(out) => out,
            Err(code) => return Ok(code),
        };
        write!(out, "{}", grid.render_layout())?;
        out.flush()?;
    }

    Ok(ExitCode::SUCCESS)
}

fn main() -> ExitCode {
    enable_tracing();

    let cli = Cli::parse();
    let result = match cli.command {
        Command::Solve(args) => solve(args),
        Command::Verify(args) => verify(args),
        Command::Generate(args) => generate(args),
    };

    result.unwrap_or_else(|err| {
        error!("{err:#}");
        ExitCode::from(NOT_SOLVED)
    })
}
