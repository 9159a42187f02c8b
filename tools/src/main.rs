//! reform-runner: headless reform computation for ubiplan.
//!
//! Usage:
//!   reform-runner --data-dir ./data --state US --level federal \
//!       --rate 10 --repeal income_tax --benefits ctc,snap --exclude children
//!   reform-runner --synthetic --seed 42 --units 500 --states 6 --rate 25
//!
//! --rate is the flat-tax slider value in percent (0-50).

use anyhow::Result;
use std::env;
use std::sync::Arc;
use ubiplan_core::{
    config::EngineConfig,
    data::MicroData,
    engine::ReformEngine,
    selection::{BenefitComponent, ReformLevel, ReformSelection, TaxComponent, UbiExclusion},
    synthetic::{self, SyntheticConfig},
};

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let synthetic = args.iter().any(|a| a == "--synthetic");
    let json = args.iter().any(|a| a == "--json");
    let data_dir = str_arg(&args, "--data-dir").unwrap_or("./data");
    let state = str_arg(&args, "--state").unwrap_or("US");
    let level = ReformLevel::from_key(str_arg(&args, "--level").unwrap_or("federal"))?;
    let rate_pct: f64 = parse_arg(&args, "--rate", 0.0);

    let selection = ReformSelection {
        level,
        state: state.to_string(),
        income_tax_rate: rate_pct / 100.0,
        repealed_taxes: list_arg(&args, "--repeal", TaxComponent::from_key)?,
        repealed_benefits: list_arg(&args, "--benefits", BenefitComponent::from_key)?,
        excluded: list_arg(&args, "--exclude", UbiExclusion::from_key)?,
    };

    let (data, config) = if synthetic {
        let cfg = SyntheticConfig {
            seed: parse_arg(&args, "--seed", 42u64),
            state_count: parse_arg(&args, "--states", 4usize),
            unit_count: parse_arg(&args, "--units", 400usize),
        };
        println!("reform-runner (synthetic dataset)");
        println!("  seed:   {}", cfg.seed);
        println!("  units:  {}", cfg.unit_count);
        println!("  states: {}", cfg.state_count);
        println!();
        (synthetic::generate(&cfg)?, EngineConfig::default())
    } else {
        (MicroData::load(data_dir)?, EngineConfig::load(data_dir)?)
    };

    let engine = ReformEngine::new(Arc::new(data), config);
    log::debug!("selection: {}", serde_json::to_string(&selection)?);
    let report = engine.compute_reform(&selection)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!(
        "Reform results for {} ({}-level, {:.0}% flat tax):",
        report.state,
        report.level.key(),
        rate_pct
    );
    println!();
    println!("{report}");
    println!();
    println!("Economic overview (% change vs baseline):");
    for (label, value) in report.overview_series() {
        println!("  {label:<14} {value:>8.1}%");
    }
    println!();
    println!("Poverty rate breakdown (% change vs baseline):");
    for (label, value) in report.breakdown_series() {
        println!("  {label:<26} {value:>8.1}%");
    }

    Ok(())
}

fn str_arg<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    str_arg(args, flag)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn list_arg<T>(
    args: &[String],
    flag: &str,
    parse: impl Fn(&str) -> ubiplan_core::error::EngineResult<T>,
) -> Result<Vec<T>> {
    match str_arg(args, flag) {
        None => Ok(Vec::new()),
        Some(raw) => raw
            .split(',')
            .filter(|s| !s.is_empty())
            .map(|s| parse(s.trim()).map_err(Into::into))
            .collect(),
    }
}
