//! CLI for generating marketplace workloads.

use std::{collections::HashSet, fs::File, io::BufWriter, path::PathBuf, thread, time::Instant};

use clap::{Parser, ValueEnum};
use eyre::{eyre, WrapErr};
use marketplace_workload::{
    AnnounceWorkload, CalculateResultWorkload, JsonLinesAdapter, RecordingAdapter, Request,
    RoundArguments, SutAdapter, SystemClock, Verb, WorkerContext, WorkloadModule,
};
use rand::{rngs::StdRng, SeedableRng};
use tracing_subscriber::EnvFilter;

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum WorkloadKind {
    CalculateResult,
    Announce,
}

#[derive(Parser, Debug)]
#[clap(rename_all = "kebab-case")]
#[command(author, version, about = "Marketplace workload generator", long_about = None)]
struct Args {
    /// The workload module every worker runs.
    #[clap(long, value_enum, default_value_t = WorkloadKind::CalculateResult)]
    workload: WorkloadKind,
    /// Number of concurrent workers.
    #[clap(long, default_value_t = 4)]
    workers: u32,
    /// Submissions per worker.
    #[clap(long, default_value_t = 10)]
    rounds: usize,
    /// Round arguments in YAML format.
    #[clap(long, value_name = "FILE")]
    config: Option<PathBuf>,
    /// Overrides `accountPhasePrefix` from the config file.
    #[clap(long)]
    account_phase_prefix: Option<String>,
    /// Overrides `txnPerBatch` from the config file.
    #[clap(long)]
    txn_per_batch: Option<usize>,
    /// Seed for the per-worker random sources; entropy if omitted.
    #[clap(long)]
    seed: Option<u64>,
    /// Writes every generated request to this file as JSON lines.
    #[clap(long, value_name = "FILE")]
    output: Option<PathBuf>,
}

/// What a worker handed to its adapter.
struct WorkerReport {
    worker_index: u32,
    requests: Vec<Request>,
    elapsed_ms: f64,
}

fn main() -> eyre::Result<()> {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let mut round_args = match &args.config {
        Some(path) => RoundArguments::load(path).wrap_err("Failed to load round arguments")?,
        None => RoundArguments::default(),
    };
    if let Some(prefix) = &args.account_phase_prefix {
        round_args.account_phase_prefix = Some(prefix.clone());
    }
    if let Some(n) = args.txn_per_batch {
        round_args.txn_per_batch = Some(n);
    }

    tracing::info!(
        workload = ?args.workload,
        workers = args.workers,
        rounds = args.rounds,
        "Starting workload generation"
    );

    let reports = thread::scope(|scope| {
        let handles: Vec<_> = (0..args.workers)
            .map(|worker_index| {
                let args = &args;
                let round_args = &round_args;
                scope.spawn(move || run_worker(args, round_args, worker_index))
            })
            .collect();

        handles
            .into_iter()
            .map(|handle| {
                handle
                    .join()
                    .map_err(|_| eyre!("worker thread panicked"))?
            })
            .collect::<eyre::Result<Vec<_>>>()
    })?;

    println!("{:>8} | {:>10} | {:>10}", "worker", "requests", "elapsed");
    for report in &reports {
        println!(
            "{:>8} | {:>10} | {:>7.2} ms",
            report.worker_index,
            report.requests.len(),
            report.elapsed_ms
        );
    }

    if args.workload == WorkloadKind::Announce {
        check_unique_managers(&reports)?;
    }

    if let Some(path) = &args.output {
        let file = File::create(path)
            .wrap_err_with(|| format!("Failed to create {}", path.display()))?;
        let mut sink = JsonLinesAdapter::new(BufWriter::new(file));
        for report in reports {
            sink.send_requests(report.requests)
                .map_err(|e| eyre!("Failed to write requests: {e}"))?;
        }
        tracing::info!(requests = sink.written(), path = %path.display(), "Wrote requests");
    }

    Ok(())
}

/// Initializes one worker's module and drives it for the configured rounds.
fn run_worker(
    args: &Args,
    round_args: &RoundArguments,
    worker_index: u32,
) -> eyre::Result<WorkerReport> {
    let ctx = WorkerContext::new(worker_index, args.workers, 0);
    let mut module: Box<dyn WorkloadModule> = match args.workload {
        WorkloadKind::CalculateResult => Box::new(
            CalculateResultWorkload::initialize(ctx, round_args, SystemClock)
                .wrap_err_with(|| format!("Failed to initialize worker {worker_index}"))?,
        ),
        WorkloadKind::Announce => {
            let rng = match args.seed {
                Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(u64::from(worker_index))),
                None => StdRng::from_entropy(),
            };
            Box::new(
                AnnounceWorkload::initialize(ctx, round_args, rng, SystemClock)
                    .wrap_err_with(|| format!("Failed to initialize worker {worker_index}"))?,
            )
        }
    };

    let mut sut = RecordingAdapter::default();
    let start = Instant::now();
    for _ in 0..args.rounds {
        module.submit_transaction(&mut sut)?;
    }
    let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;
    module.cleanup();

    Ok(WorkerReport {
        worker_index,
        requests: sut.into_requests(),
        elapsed_ms,
    })
}

/// Fails if two announce requests minted the same manager account.
fn check_unique_managers(reports: &[WorkerReport]) -> eyre::Result<()> {
    let mut seen = HashSet::new();
    for request in reports.iter().flat_map(|r| &r.requests) {
        if request.verb != Verb::Announce {
            continue;
        }
        if let Some(manager) = request.args.get(3).and_then(|arg| arg.as_str()) {
            if !seen.insert(manager) {
                return Err(eyre!("manager account {manager} was announced twice"));
            }
        }
    }
    tracing::info!(accounts = seen.len(), "All announced manager accounts are unique");
    Ok(())
}
