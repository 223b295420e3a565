use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use log::{debug, info, warn, LevelFilter};
use serde::Serialize;

use chipprobe_core::config::load_custom_config;
use chipprobe_core::cpu::toggle_cache;
use chipprobe_core::format::comparison_chart;
use chipprobe_core::hardware::CacheFeature;
use chipprobe_core::profiles::{find_profile, SimulatedMachine, PROFILES};
use chipprobe_core::score::hardware_comment;
use chipprobe_core::{
    detect_hardware, BenchRunner, BenchSettings, BenchmarkResults, HardwareDescription, NativeWorkload, Preemptive,
    SystemTimer,
};

const CHART_WIDTH: usize = 40;

#[derive(Parser, Debug)]
#[command(name = "chipprobe", version, about = "Identifies Amiga hardware and benchmarks it")]
struct Args {
    /// Simulated machine to classify
    #[arg(long, default_value = "a1200")]
    profile: String,

    /// Only identify the hardware
    #[arg(long)]
    no_bench: bool,

    /// Benchmark overrides, one benchmark per line
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Print both records as JSON
    #[arg(long)]
    json: bool,

    /// Log every detection and benchmark step
    #[arg(long)]
    debug: bool,

    /// Flip a cache before benchmarking (ICache, DCache, IBurst, DBurst, CBack)
    #[arg(long = "toggle-cache", value_name = "CACHE")]
    toggle_cache: Vec<String>,

    /// List the simulated machines and exit
    #[arg(long)]
    list: bool,

    /// Read the custom chip registers of the machine we are running on
    #[cfg(target_arch = "m68k")]
    #[arg(long)]
    mmio: bool,
}

#[derive(Serialize)]
struct Report<'a> {
    hardware: &'a HardwareDescription,
    #[serde(skip_serializing_if = "Option::is_none")]
    benchmarks: Option<&'a BenchmarkResults>,
}

fn init_logging(debug: bool) {
    let level = if debug { LevelFilter::Debug } else { LevelFilter::Warn };
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .format_timestamp(None)
        .init();
}

fn machine(args: &Args) -> Result<SimulatedMachine> {
    let Some(profile) = find_profile(&args.profile) else {
        let names: Vec<&str> = PROFILES.iter().map(|p| p.name).collect();
        bail!("unknown profile '{}', expected one of: {}", args.profile, names.join(", "));
    };
    info!("profile {}: {}", profile.name, profile.summary);
    Ok(profile.build())
}

#[cfg(target_arch = "m68k")]
fn detect(args: &Args, machine: &mut SimulatedMachine) -> HardwareDescription {
    if args.mmio {
        // SAFETY: --mmio is only offered on the target, where the custom chip
        // space is identity mapped and this process is the only prober.
        let mut bus = unsafe { chipprobe_core::MmioBus::identity() };
        return detect_hardware(&mut bus, &mut machine.host);
    }
    detect_hardware(&mut machine.bus, &mut machine.host)
}

#[cfg(not(target_arch = "m68k"))]
fn detect(_args: &Args, machine: &mut SimulatedMachine) -> HardwareDescription {
    detect_hardware(&mut machine.bus, &mut machine.host)
}

fn toggle_caches(args: &Args, hw: &mut HardwareDescription, machine: &mut SimulatedMachine) -> Result<()> {
    for name in &args.toggle_cache {
        let Some(feature) = CacheFeature::ALL.iter().find(|f| f.label().eq_ignore_ascii_case(name)) else {
            bail!("unknown cache '{name}'");
        };
        match toggle_cache(hw, &mut machine.host, *feature) {
            Some(enabled) => info!("{} now {}", feature.label(), if enabled { "on" } else { "off" }),
            None => warn!("{} not available on a {}", feature.label(), hw.cpu.label()),
        }
    }
    Ok(())
}

fn bench_settings(args: &Args) -> Result<BenchSettings> {
    match &args.config {
        Some(path) => load_custom_config(path).with_context(|| format!("loading {}", path.display())),
        None => Ok(BenchSettings::default()),
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.debug);

    if args.list {
        for profile in PROFILES.iter() {
            println!("{:<8} {}", profile.name, profile.summary);
        }
        return Ok(());
    }

    let settings = bench_settings(&args)?;
    let mut machine = machine(&args)?;
    let mut hw = detect(&args, &mut machine);
    toggle_caches(&args, &mut hw, &mut machine)?;

    let results = if args.no_bench {
        None
    } else {
        let mut timer = SystemTimer::new();
        let mut tasks = Preemptive;
        let mut workload = NativeWorkload::new();
        let mut results = BenchmarkResults::default();
        let mut runner = BenchRunner::new(Some(&mut timer), &mut tasks, &mut workload, settings);
        let code_address = hw.code_address;
        runner.run_benchmarks(&mut hw, code_address, &mut results);
        debug!("benchmarks done: {results:?}");
        Some(results)
    };

    if args.json {
        let report = Report { hardware: &hw, benchmarks: results.as_ref() };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    print!("{hw}");
    match &results {
        Some(results) => {
            println!("---");
            print!("{results}");
            println!();
            print!("{}", comparison_chart(results, CHART_WIDTH));
        }
        None => println!("Verdict      : {}", hardware_comment(&hw)),
    }

    Ok(())
}
