use serde::Serialize;

use crate::bench::BenchmarkResults;
use crate::format::NOT_AVAILABLE;
use crate::hardware::{CpuFamily, HardwareDescription};

/// Dhrystones per second of a VAX 11/780, the 1 MIPS reference.
pub const VAX_DHRYSTONES: u64 = 1757;

/// MIPS in hundredths.
pub fn mips_index(dhrystones: u32) -> u32 {
    (dhrystones as u64 * 100 / VAX_DHRYSTONES) as u32
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReferenceSystem {
    pub name: &'static str,
    pub cpu: &'static str,
    pub mhz: u32,
    pub dhrystones: u32,
    /// Hundredths.
    pub mips: u32,
    /// Hundredths, 0 without FPU.
    pub mflops: u32,
}

impl ReferenceSystem {
    /// Fixed-width label for bar charts, e.g. `"A600  68000 7MHz"`.
    pub fn label(&self) -> String {
        format!("{:<5} {:<5} {}MHz", self.name, self.cpu, self.mhz)
    }

    /// `dhrystones` relative to this system, in percent.
    pub fn percent_of(&self, dhrystones: u32) -> u32 {
        if self.dhrystones == 0 {
            return 0;
        }
        (dhrystones as u64 * 100 / self.dhrystones as u64) as u32
    }
}

pub const REFERENCE_SYSTEMS: [ReferenceSystem; 6] = [
    ReferenceSystem { name: "A600", cpu: "68000", mhz: 7, dhrystones: 1001, mips: 56, mflops: 0 },
    ReferenceSystem { name: "B2000", cpu: "68000", mhz: 7, dhrystones: 1408, mips: 81, mflops: 0 },
    ReferenceSystem { name: "A1200", cpu: "EC020", mhz: 14, dhrystones: 2550, mips: 145, mflops: 0 },
    ReferenceSystem { name: "A3000", cpu: "68030", mhz: 25, dhrystones: 8300, mips: 475, mflops: 285 },
    ReferenceSystem { name: "A4000", cpu: "68040", mhz: 25, dhrystones: 32809, mips: 1867, mflops: 504 },
    ReferenceSystem { name: "A4000", cpu: "68060", mhz: 50, dhrystones: 91000, mips: 5200, mflops: 685 },
];

/// Bar chart scale: the largest of the references and a measured current
/// result, never below 1000.
pub fn max_dhrystones(results: &BenchmarkResults) -> u32 {
    let references = REFERENCE_SYSTEMS.iter().map(|r| r.dhrystones).max().unwrap_or(0);
    let current = if results.measured() { results.dhrystones } else { 0 };
    references.max(current).max(1000)
}

/// Ascending thresholds; the last one met wins.
pub const COMMENT_LADDER: [(u32, &str); 9] = [
    (0, "What can I say!"),
    (980, "Classic Amiga"),
    (1300, "Good speed"),
    (2000, "Fast system"),
    (7000, "Very fast!"),
    (30000, "Blazingly fast!"),
    (80000, "Ridiculous speed!"),
    (130000, "Ludicrous speed!"),
    (200000, "WARP 11!"),
];

pub fn comment(results: &BenchmarkResults) -> &'static str {
    if !results.measured() {
        return NOT_AVAILABLE;
    }
    COMMENT_LADDER
        .iter()
        .rev()
        .find(|(threshold, _)| results.dhrystones >= *threshold)
        .map_or(COMMENT_LADDER[0].1, |(_, text)| *text)
}

/// Verdict from the detected CPU and its clock alone, for when nothing was
/// benchmarked.
pub fn hardware_comment(hw: &HardwareDescription) -> &'static str {
    use CpuFamily::*;
    let (cpu, mhz) = (hw.cpu, hw.cpu_mhz);
    let rung = if cpu.at_least(M68060) && mhz >= 5000 {
        5
    } else if cpu.at_least(M68040) && mhz >= 2500 {
        4
    } else if cpu.at_least(M68030) && mhz >= 2500 {
        3
    } else if cpu.at_least(M68020) && mhz >= 1400 {
        2
    } else if matches!(cpu, M68000 | M68010) {
        1
    } else {
        0
    };
    COMMENT_LADDER[rung].1
}
