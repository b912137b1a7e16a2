//! restake-apy CLI: protocols, breakdown, realtime, blend, recommend, report, verify.

use clap::{Args, Parser, Subcommand};
use restake_apy::realtime::{SeededJitter, UniformJitter};
use restake_apy::verify::verify_snapshot;
use restake_apy::{
    recommend_allocation, spawn_refresh, Allocation, ApyEngine, ApySnapshot, ProtocolConfig,
    RealtimeConfig, ReportData, ReportSnapshot,
};
use restake_apy_report::render_report;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()))
        .with_writer(std::io::stderr)
        .init();
    let cli = Cli::parse();
    match cli.command {
        Command::Protocols(args) => run_protocols(&cli.engine, args),
        Command::Breakdown(args) => run_breakdown(&cli.engine, args),
        Command::Realtime(args) => run_realtime(&cli.engine, args),
        Command::Blend(args) => run_blend(&cli.engine, args),
        Command::Recommend(args) => run_recommend(&cli.engine, args),
        Command::Report(args) => run_report(&cli.engine, args),
        Command::Verify(args) => run_verify(args),
    }
}

#[derive(Parser)]
#[command(name = "restake-apy")]
#[command(author = "gorusys <goru.connector@outlook.com>")]
#[command(about = "APY aggregation for multi-protocol restaking")]
struct Cli {
    #[command(flatten)]
    engine: EngineArgs,
    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
struct EngineArgs {
    /// Protocols JSON file (default: $RESTAKE_PROTOCOLS_PATH, ./config/protocols.json, ./protocols.json, built-in).
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Seed for the realtime jitter; random when omitted.
    #[arg(long, global = true)]
    seed: Option<u64>,
    /// Simulated fetch latency for realtime APY.
    #[arg(long, global = true, default_value_t = 0)]
    latency_ms: u64,
}

#[derive(Subcommand)]
enum Command {
    /// List configured protocols and their static APY.
    Protocols(ProtocolsArgs),
    /// Show the APY breakdown for one protocol.
    Breakdown(BreakdownArgs),
    /// Simulated realtime APY for one protocol.
    Realtime(RealtimeArgs),
    /// Blend APYs by allocation weights.
    Blend(BlendArgs),
    /// Suggest weights from APY and risk scores.
    Recommend(RecommendArgs),
    /// Generate HTML report, snapshot JSON, and fingerprint.
    Report(ReportArgs),
    /// Verify a snapshot's fingerprint.
    Verify(VerifyArgs),
}

#[derive(Parser)]
struct ProtocolsArgs {
    #[arg(long)]
    json: bool,
}

#[derive(Parser)]
struct BreakdownArgs {
    #[arg(long)]
    protocol: String,
    #[arg(long)]
    json: bool,
}

#[derive(Parser)]
struct RealtimeArgs {
    #[arg(long)]
    protocol: String,
    /// Keep refreshing on an interval.
    #[arg(long)]
    watch: bool,
    /// Refresh period; defaults to the engine's refresh interval (60 s).
    #[arg(long)]
    interval_secs: Option<u64>,
    /// Stop after this many refreshes (with --watch).
    #[arg(long)]
    ticks: Option<u64>,
}

#[derive(Parser)]
struct BlendArgs {
    /// Allocation as id=weight, repeatable. Defaults to eigenLayer=100.
    #[arg(long = "alloc")]
    alloc: Vec<String>,
    /// Blend realtime APYs instead of static totals.
    #[arg(long)]
    realtime: bool,
    /// Staked amount to split across protocols.
    #[arg(long)]
    amount: Option<f64>,
}

#[derive(Parser)]
struct RecommendArgs {
    /// Protocols to score, repeatable. Defaults to every configured protocol.
    #[arg(long = "protocol")]
    protocols: Vec<String>,
    /// Staked amount to split by the recommended weights.
    #[arg(long)]
    amount: Option<f64>,
}

#[derive(Parser)]
struct ReportArgs {
    #[arg(long = "alloc")]
    alloc: Vec<String>,
    #[arg(long)]
    realtime: bool,
    #[arg(long)]
    amount: Option<f64>,
    #[arg(long)]
    out: Option<PathBuf>,
    #[arg(long, default_value = "./reports")]
    reports_dir: PathBuf,
}

#[derive(Parser)]
struct VerifyArgs {
    #[arg(long)]
    snapshot: PathBuf,
}

fn build_engine(args: &EngineArgs) -> Result<ApyEngine, Box<dyn std::error::Error>> {
    let config = ProtocolConfig::resolve(args.config.as_deref())?;
    if let Some(source) = &config.source {
        info!(source = %source.display(), "protocol config");
    }
    let registry = config.into_registry()?;
    let realtime = RealtimeConfig {
        simulated_latency_ms: args.latency_ms,
        ..Default::default()
    };
    let engine = ApyEngine::new(registry).with_config(realtime);
    Ok(match args.seed {
        Some(seed) => engine.with_jitter(SeededJitter::new(seed)),
        None => engine.with_jitter(UniformJitter::default()),
    })
}

fn parse_allocation(pairs: &[String]) -> Result<Allocation, Box<dyn std::error::Error>> {
    if pairs.is_empty() {
        return Ok(Allocation::single(restake_apy::ids::EIGEN_LAYER));
    }
    let allocation = Allocation::parse_pairs(pairs)?;
    if !allocation.is_normalized(1e-6) {
        warn!(
            total = allocation.total(),
            "allocation weights do not sum to 100; blended APY is not a weighted average"
        );
    }
    Ok(allocation)
}

fn realtime_snapshot(
    engine: &ApyEngine,
    allocation: &Allocation,
) -> Result<ApySnapshot, Box<dyn std::error::Error>> {
    let ids: Vec<String> = allocation.ids().map(str::to_string).collect();
    let rt = tokio::runtime::Runtime::new()?;
    Ok(rt.block_on(engine.realtime_snapshot(&ids, 1)))
}

fn run_protocols(args: &EngineArgs, p: ProtocolsArgs) -> Result<(), Box<dyn std::error::Error>> {
    let engine = build_engine(args)?;
    let registry = engine.registry();
    if p.json {
        let rows: Vec<_> = registry
            .entries()
            .map(|e| {
                serde_json::json!({
                    "id": e.id,
                    "name": e.display_name(),
                    "params": e.params,
                    "breakdown": restake_apy::compute_breakdown(&e.params),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }
    for e in registry.entries() {
        let b = restake_apy::compute_breakdown(&e.params);
        println!(
            "{}\t{}\t{:.2}%\t{}",
            e.id,
            e.display_name(),
            b.total,
            e.params.compounding_frequency
        );
    }
    Ok(())
}

fn run_breakdown(args: &EngineArgs, b: BreakdownArgs) -> Result<(), Box<dyn std::error::Error>> {
    let engine = build_engine(args)?;
    let breakdown = engine.apy_breakdown(&b.protocol)?;
    if b.json {
        println!("{}", serde_json::to_string_pretty(&breakdown)?);
        return Ok(());
    }
    println!("protocol\t{}", b.protocol);
    println!("base\t{:.4}%", breakdown.base);
    println!("protocol\t{:.4}%", breakdown.protocol);
    println!("mev\t{:.4}%", breakdown.mev);
    println!("total\t{:.4}%", breakdown.total);
    Ok(())
}

fn run_realtime(args: &EngineArgs, r: RealtimeArgs) -> Result<(), Box<dyn std::error::Error>> {
    let engine = build_engine(args)?;
    let rt = tokio::runtime::Runtime::new()?;
    if !r.watch {
        let apy = rt.block_on(engine.realtime_apy(&r.protocol))?;
        println!("{:.4}", apy);
        return Ok(());
    }
    // unknown ids would only be skipped by the refresher
    engine.registry().get(&r.protocol)?;
    let period = r
        .interval_secs
        .map_or_else(|| engine.config().refresh_interval(), Duration::from_secs);
    let engine = Arc::new(engine);
    rt.block_on(async {
        let handle = spawn_refresh(engine, vec![r.protocol.clone()], period);
        let mut rx = handle.subscribe();
        while rx.changed().await.is_ok() {
            let snap = rx.borrow_and_update().clone();
            if let Some(apy) = snap.apys.get(&r.protocol) {
                println!("{}\t{:.4}", snap.sequence, apy);
            }
            if r.ticks.is_some_and(|n| snap.sequence >= n) {
                handle.stop();
                break;
            }
        }
    });
    Ok(())
}

fn run_blend(args: &EngineArgs, b: BlendArgs) -> Result<(), Box<dyn std::error::Error>> {
    let engine = build_engine(args)?;
    let allocation = parse_allocation(&b.alloc)?;
    let apys = if b.realtime {
        realtime_snapshot(&engine, &allocation)?.apys
    } else {
        let mut apys = std::collections::BTreeMap::new();
        for id in allocation.ids() {
            apys.insert(id.to_string(), engine.apy_breakdown(id)?.total);
        }
        apys
    };
    for entry in allocation.entries() {
        let apy = apys.get(&entry.id).copied().unwrap_or(0.0);
        println!("{}\t{:.2}%\t{:.4}%", entry.id, entry.weight, apy);
    }
    if let Some(amount) = b.amount {
        for (id, share) in allocation.split_amount(amount) {
            println!("amount\t{}\t{:.4}", id, share);
        }
    }
    println!("combined\t{:.4}%", allocation.blended_apy(&apys));
    Ok(())
}

fn run_recommend(args: &EngineArgs, r: RecommendArgs) -> Result<(), Box<dyn std::error::Error>> {
    let engine = build_engine(args)?;
    let registry = engine.registry();
    let ids: Vec<String> = if r.protocols.is_empty() {
        registry.ids().map(str::to_string).collect()
    } else {
        r.protocols
    };
    let rec = recommend_allocation(registry, ids.as_slice())?;
    for ((id, score), entry) in rec.scores.iter().zip(rec.allocation.entries()) {
        println!("{}\tscore={:.4}\t{:.2}%", id, score, entry.weight);
    }
    if let Some(amount) = r.amount {
        for (id, share) in rec.recommended_amounts(amount) {
            println!("amount\t{}\t{:.4}", id, share);
        }
    }
    Ok(())
}

fn run_report(args: &EngineArgs, r: ReportArgs) -> Result<(), Box<dyn std::error::Error>> {
    let engine = build_engine(args)?;
    let allocation = parse_allocation(&r.alloc)?;
    let realtime = if r.realtime {
        Some(realtime_snapshot(&engine, &allocation)?)
    } else {
        None
    };
    let snapshot = ReportSnapshot::build(&engine, &allocation, realtime.as_ref(), r.amount)?;
    let data = ReportData::new(snapshot)?;
    std::fs::create_dir_all(&r.reports_dir)?;
    let stem = format!(
        "apy-{}",
        data.fingerprint_sha256.chars().take(12).collect::<String>()
    );
    let html_path = r
        .out
        .unwrap_or_else(|| r.reports_dir.join(format!("{}.html", stem)));
    let snapshot_path = r.reports_dir.join(format!("{}.snapshot.json", stem));
    let hash_path = r.reports_dir.join(format!("{}.snapshot.sha256", stem));
    render_report(&data, &html_path)?;
    std::fs::write(
        &snapshot_path,
        serde_json::to_string_pretty(&data.snapshot)?,
    )?;
    std::fs::write(&hash_path, format!("{}\n", data.fingerprint_sha256))?;
    info!(?html_path, ?snapshot_path, ?hash_path, "report complete");
    println!("{}", data.fingerprint_sha256);
    Ok(())
}

fn run_verify(args: VerifyArgs) -> Result<(), Box<dyn std::error::Error>> {
    let snapshot_json = std::fs::read_to_string(&args.snapshot)?;
    let snapshot: ReportSnapshot = serde_json::from_str(&snapshot_json)?;
    let sha256_path = args
        .snapshot
        .parent()
        .unwrap_or(std::path::Path::new("."))
        .join(format!(
            "{}.sha256",
            args.snapshot
                .file_stem()
                .unwrap_or_default()
                .to_string_lossy()
        ));
    let expected = std::fs::read_to_string(sha256_path).ok();
    let result = verify_snapshot(&snapshot, expected.as_deref())?;
    if result.matches {
        println!("OK\t{}", result.snapshot_hash);
    } else {
        eprintln!(
            "MISMATCH\tcomputed={}\texpected={:?}",
            result.snapshot_hash, result.expected_hash
        );
        std::process::exit(1);
    }
    Ok(())
}
