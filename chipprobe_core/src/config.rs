use std::path::Path;

use crate::bench::BenchSettings;
use crate::error::ConfigError;
use crate::timing::Calibration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BenchKind {
    Dhrystone,
    Mflops,
    Memory,
    CpuMhz,
    FpuMhz,
}

impl BenchKind {
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "dhrystone" => Some(BenchKind::Dhrystone),
            "mflops" => Some(BenchKind::Mflops),
            "memory" => Some(BenchKind::Memory),
            "cpu_mhz" => Some(BenchKind::CpuMhz),
            "fpu_mhz" => Some(BenchKind::FpuMhz),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            BenchKind::Dhrystone => "dhrystone",
            BenchKind::Mflops => "mflops",
            BenchKind::Memory => "memory",
            BenchKind::CpuMhz => "cpu_mhz",
            BenchKind::FpuMhz => "fpu_mhz",
        }
    }
}

const KEYS: [&str; 7] = ["loops", "min_us", "max_loops", "attempts", "max_multiplier", "bytes", "passes"];

fn parse_value(key: &'static str, value: &str, line: usize) -> Result<u64, ConfigError> {
    match value.parse::<u64>() {
        Ok(n) if n > 0 || key == "min_us" => Ok(n),
        _ => Err(ConfigError::InvalidValue { key, value: value.to_string(), line }),
    }
}

fn apply_calibration(cal: &mut Calibration, count_key: &str, key: &str, value: u64) -> bool {
    match key {
        k if k == count_key => cal.base_count = value,
        "min_us" => cal.min_elapsed_us = value,
        "max_multiplier" => cal.max_multiplier = value,
        _ => return false,
    }
    true
}

/// Applies `key=value` to the settings of `kind`. False when the key has no
/// meaning for that benchmark.
fn apply(settings: &mut BenchSettings, kind: BenchKind, key: &str, value: u64) -> bool {
    match kind {
        BenchKind::Dhrystone => {
            let d = &mut settings.dhrystone;
            match key {
                "loops" => d.loops = value,
                "min_us" => d.min_us = value,
                "max_loops" => d.max_loops = value,
                "attempts" => d.attempts = u32::try_from(value).unwrap_or(u32::MAX),
                _ => return false,
            }
            true
        }
        BenchKind::Mflops => apply_calibration(&mut settings.mflops, "loops", key, value),
        BenchKind::CpuMhz => apply_calibration(&mut settings.cpu_mhz, "loops", key, value),
        BenchKind::FpuMhz => apply_calibration(&mut settings.fpu_mhz, "loops", key, value),
        BenchKind::Memory => {
            if key == "bytes" {
                settings.memory.bytes = usize::try_from(value).unwrap_or(usize::MAX);
                true
            } else {
                apply_calibration(&mut settings.memory.calibration, "passes", key, value)
            }
        }
    }
}

/// Parses benchmark overrides. Benchmarks and keys that are not mentioned keep
/// their defaults.
pub fn parse_config(text: &str) -> Result<BenchSettings, ConfigError> {
    let mut settings = BenchSettings::default();

    for (line_no, raw_line) in text.lines().enumerate() {
        let line = raw_line.trim();
        let line_no = line_no + 1;

        // skip blank lines and comments
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let mut parts = line.split_whitespace();
        let Some(bench_name) = parts.next() else {
            continue;
        };
        let kind = BenchKind::parse(bench_name)
            .ok_or_else(|| ConfigError::UnknownBenchmark { name: bench_name.to_string(), line: line_no })?;

        for token in parts {
            let known = token
                .split_once('=')
                .and_then(|(key, value)| KEYS.iter().find(|k| **k == key).map(|k| (*k, value)));
            let Some((key, value)) = known else {
                return Err(ConfigError::UnknownToken { token: token.to_string(), line: line_no });
            };

            let value = parse_value(key, value, line_no)?;
            if !apply(&mut settings, kind, key, value) {
                return Err(ConfigError::NotApplicable { key, benchmark: kind.name(), line: line_no });
            }
        }
    }

    Ok(settings)
}

pub fn load_custom_config(path: &Path) -> Result<BenchSettings, ConfigError> {
    let text = std::fs::read_to_string(path)
        .map_err(|source| ConfigError::Io { path: path.display().to_string(), source })?;
    parse_config(&text)
}
