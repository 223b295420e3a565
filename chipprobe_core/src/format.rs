//! Human readable rendering of the two records.

use std::fmt;

use crate::bench::BenchmarkResults;
use crate::derive::{MemoryLocation, KB, MB};
use crate::hardware::{CacheFeature, HardwareDescription, RomInfo};
use crate::score::{comment, max_dhrystones, REFERENCE_SYSTEMS};
use crate::workload::MemoryClass;

pub const NOT_AVAILABLE: &str = "N/A";

/// Renders a fixed point value in hundredths as `x.yy`.
pub fn format_scaled(hundredths: u64) -> String {
    format!("{}.{:02}", hundredths / 100, hundredths % 100)
}

/// Clock in hundredths of MHz, "N/A" when not measured.
pub fn format_mhz(hundredths: u32) -> String {
    if hundredths == 0 {
        NOT_AVAILABLE.to_string()
    } else {
        format_scaled(hundredths as u64)
    }
}

/// Byte count with a binary K/M/G suffix and two fractional digits.
pub fn format_size(bytes: u64) -> String {
    const GB: u64 = 1024 * MB as u64;
    for (unit, suffix) in [(GB, "G"), (MB as u64, "M"), (KB as u64, "K")] {
        if bytes >= unit {
            let scaled = bytes / unit * 100 + bytes % unit * 100 / unit;
            return format!("{}{suffix}", format_scaled(scaled));
        }
    }
    bytes.to_string()
}

/// Bandwidth in MB/s (10^6 bytes), "N/A" for zero.
pub fn format_speed(bytes_per_second: u64) -> String {
    if bytes_per_second == 0 {
        NOT_AVAILABLE.to_string()
    } else {
        format!("{} MB/s", format_scaled(bytes_per_second / 10_000))
    }
}

pub fn format_rom(rom: &RomInfo) -> String {
    let mut text = format!("{}.{} ({}K)", rom.version, rom.revision, rom.size_kb);
    if rom.has_patch() {
        text.push_str(&format!(", running {}.{}", rom.patch_version, rom.patch_revision));
    }
    text
}

fn on_off(enabled: bool) -> &'static str {
    if enabled {
        "on"
    } else {
        "off"
    }
}

/// One entry per available cache feature, e.g. `ICache:on DCache:off`.
pub fn format_cache(hw: &HardwareDescription) -> String {
    let entries: Vec<String> = CacheFeature::ALL
        .iter()
        .filter(|feature| hw.cache.available.get(**feature))
        .map(|feature| format!("{}:{}", feature.label(), on_off(hw.cache.enabled.get(*feature))))
        .collect();
    if entries.is_empty() {
        NOT_AVAILABLE.to_string()
    } else {
        entries.join(" ")
    }
}

impl fmt::Display for HardwareDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CPU          : {}", self.cpu.label())?;
        if self.cpu_revision != 0 {
            write!(f, " rev {}", self.cpu_revision)?;
        }
        writeln!(f, " @ {} MHz", format_mhz(self.cpu_mhz))?;
        if self.superscalar_enabled {
            writeln!(f, " Superscalar : on")?;
        }

        if self.fpu.is_present() {
            writeln!(
                f,
                "FPU          : {} @ {} MHz{}",
                self.fpu.label(),
                format_mhz(self.fpu_mhz),
                if self.fpu_enabled { "" } else { " (no support library)" }
            )?;
        } else {
            writeln!(f, "FPU          : {}", self.fpu.label())?;
        }
        writeln!(f, "MMU          : {} ({})", self.mmu.label(), if self.mmu_enabled { "in use" } else { "unused" })?;
        writeln!(f, "VBR          : ${:08X}", self.vbr)?;
        writeln!(f, "Code at      : ${:08X} ({})", self.code_address, MemoryLocation::of(self.code_address).label())?;
        writeln!(f, "Caches       : {}", format_cache(self))?;

        writeln!(f, "Agnus        : {} (rev {:#04x})", self.agnus.label(), self.agnus_rev)?;
        writeln!(f, "Denise       : {} (rev {:#04x})", self.denise.label(), self.denise_rev)?;
        writeln!(f, "Paula        : {} (rev {:#04x})", self.paula.label(), self.paula_rev)?;
        writeln!(f, " Max chip RAM: {}", format_size(self.max_chip_ram as u64))?;

        write!(f, "Gary         : {}", self.bus_controller.label())?;
        if self.gary_rev != 0 {
            write!(f, " (rev {:#04x})", self.gary_rev)?;
        }
        writeln!(f)?;
        writeln!(f, "Ramsey       : {}", self.memory_controller.label())?;
        if self.memory_controller.is_present() {
            let r = &self.ramsey;
            writeln!(
                f,
                " Page: {}  Burst: {}  Wrap: {}  1M chips: {}  Skip: {}  Refresh: {}",
                on_off(r.page_mode),
                on_off(r.burst_mode),
                on_off(r.wrap_mode),
                on_off(r.size_1m),
                on_off(r.skip_mode),
                r.refresh_rate
            )?;
            writeln!(f, " Max board RAM: {}", format_size(self.max_board_ram as u64))?;
        }
        writeln!(f, "SCSI DMA     : {}", self.dma_controller.label())?;
        writeln!(f, "Clock        : {}", self.clock.label())?;

        let slots = match (self.has_zorro_slots, self.zorro_iii, self.has_pcmcia) {
            (true, true, _) => "Zorro III",
            (true, false, _) => "Zorro II",
            (false, _, true) => "PCMCIA",
            _ => NOT_AVAILABLE,
        };
        writeln!(f, "Expansion    : {slots}")?;

        writeln!(
            f,
            "Video        : {} {}Hz / {}Hz, supply {}Hz",
            self.timing.standard.label(),
            self.timing.horiz_hz,
            self.timing.vert_hz,
            self.timing.supply_hz
        )?;
        if self.eclock_hz == 0 {
            writeln!(f, "E-clock      : {NOT_AVAILABLE}")?;
        } else {
            writeln!(f, "E-clock      : {}Hz", self.eclock_hz)?;
        }
        writeln!(f, "Kickstart    : {}", format_rom(&self.rom))?;

        Ok(())
    }
}

impl fmt::Display for BenchmarkResults {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.valid {
            writeln!(f, "Benchmarks   : {NOT_AVAILABLE}")?;
            return Ok(());
        }

        if self.measured() {
            writeln!(f, "Dhrystones   : {}", self.dhrystones)?;
            writeln!(f, "MIPS         : {}", format_scaled(self.mips as u64))?;
        } else {
            writeln!(f, "Dhrystones   : {NOT_AVAILABLE}")?;
            writeln!(f, "MIPS         : {NOT_AVAILABLE}")?;
        }
        if self.mflops == 0 {
            writeln!(f, "MFLOPS       : {NOT_AVAILABLE}")?;
        } else {
            writeln!(f, "MFLOPS       : {} ({} FLOPS)", format_scaled(self.mflops as u64), self.flops)?;
        }
        for class in MemoryClass::ALL {
            writeln!(f, "{:<4} speed   : {}", class.label(), format_speed(self.memory_speed(class)))?;
        }
        writeln!(f, "Verdict      : {}", comment(self))?;

        Ok(())
    }
}

/// Bar chart of the reference systems with the current machine appended.
/// Once measured, each reference row also shows the current machine's score
/// as a percentage of it.
pub fn comparison_chart(results: &BenchmarkResults, width: usize) -> String {
    let scale = max_dhrystones(results) as u64;
    let bar = |dhrystones: u32| "#".repeat((dhrystones as u64 * width as u64 / scale) as usize);

    let mut out = String::new();
    for reference in REFERENCE_SYSTEMS.iter() {
        let row = format!("{:<18} {:>6} {}", reference.label(), reference.dhrystones, bar(reference.dhrystones));
        if results.measured() {
            out.push_str(&format!("{row:<width$} {:>6}%\n", reference.percent_of(results.dhrystones), width = width + 26));
        } else {
            out.push_str(&row);
            out.push('\n');
        }
    }
    if results.measured() {
        out.push_str(&format!("{:<18} {:>6} {}\n", "This machine", results.dhrystones, bar(results.dhrystones)));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hardware::{CacheFlags, CpuFamily, FpuFamily};

    #[test]
    fn scaled_values_keep_two_digits() {
        assert_eq!(format_scaled(2500), "25.00");
        assert_eq!(format_scaled(709), "7.09");
        assert_eq!(format_scaled(5), "0.05");
        assert_eq!(format_mhz(0), "N/A");
    }

    #[test]
    fn sizes_pick_the_largest_unit() {
        assert_eq!(format_size(512), "512");
        assert_eq!(format_size(512 * 1024), "512.00K");
        assert_eq!(format_size(1536 * 1024), "1.50M");
        assert_eq!(format_size(2 * 1024 * 1024 * 1024), "2.00G");
    }

    #[test]
    fn speeds_in_megabytes() {
        assert_eq!(format_speed(106_665_581), "106.66 MB/s");
        assert_eq!(format_speed(0), "N/A");
    }

    #[test]
    fn rom_mentions_a_soft_kicked_update() {
        let rom = RomInfo { version: 40, revision: 68, patch_version: 40, patch_revision: 68, size_kb: 512 };
        assert_eq!(format_rom(&rom), "40.68 (512K)");
        let patched = RomInfo { patch_version: 47, patch_revision: 96, ..rom };
        assert_eq!(format_rom(&patched), "40.68 (512K), running 47.96");
    }

    #[test]
    fn only_available_caches_are_listed() {
        let mut hw = HardwareDescription::default();
        assert_eq!(format_cache(&hw), "N/A");
        hw.cache.available = CacheFlags { icache: true, dcache: true, ..CacheFlags::NONE };
        hw.cache.enabled = CacheFlags { icache: true, ..CacheFlags::NONE };
        assert_eq!(format_cache(&hw), "ICache:on DCache:off");
    }

    #[test]
    fn description_renders_unmeasured_clocks_as_na() {
        let hw = HardwareDescription { cpu: CpuFamily::M68030, fpu: FpuFamily::M68882, ..Default::default() };
        let text = hw.to_string();
        assert!(text.contains("CPU          : 68030 @ N/A MHz"));
        assert!(text.contains("FPU          : 68882 @ N/A MHz (no support library)"));
        assert!(text.contains("E-clock      : N/A"));
        assert!(text.contains("Code at      : $00000000 (CHIP RAM)"));
    }

    #[test]
    fn eclock_in_hertz_when_known() {
        let hw = HardwareDescription { eclock_hz: 709_379, ..Default::default() };
        assert!(hw.to_string().contains("E-clock      : 709379Hz"));
    }

    #[test]
    fn timerless_run_renders_scores_as_na() {
        let results = BenchmarkResults { valid: true, ..Default::default() };
        let text = results.to_string();
        assert!(text.contains("Dhrystones   : N/A"));
        assert!(text.contains("MIPS         : N/A"));
        assert!(text.contains("Verdict      : N/A"));
        assert!(!text.contains(": 0\n"));
    }

    #[test]
    fn invalid_results_render_as_one_line() {
        assert_eq!(BenchmarkResults::default().to_string(), "Benchmarks   : N/A\n");
        let results = BenchmarkResults { dhrystones: 8300, mips: 472, chip_speed: 3_000_000, valid: true, ..Default::default() };
        let text = results.to_string();
        assert!(text.contains("MIPS         : 4.72"));
        assert!(text.contains("MFLOPS       : N/A"));
        assert!(text.contains("CHIP speed   : 3.00 MB/s"));
        assert!(text.contains("FAST speed   : N/A"));
        assert!(text.contains("Verdict      : Very fast!"));
    }

    #[test]
    fn chart_appends_the_current_machine() {
        let results = BenchmarkResults { dhrystones: 91000, valid: true, ..Default::default() };
        let chart = comparison_chart(&results, 10);
        let last = chart.lines().last().unwrap();
        assert!(last.starts_with("This machine"));
        assert!(last.ends_with("##########"));
        assert_eq!(chart.lines().count(), REFERENCE_SYSTEMS.len() + 1);

        let first = chart.lines().next().unwrap();
        assert!(first.starts_with("A600  68000 7MHz"));
        assert!(first.ends_with("  9090%"));
        let fastest = chart.lines().nth(REFERENCE_SYSTEMS.len() - 1).unwrap();
        assert!(fastest.ends_with("   100%"));
    }

    #[test]
    fn chart_without_a_score_lists_only_the_references() {
        let results = BenchmarkResults { valid: true, ..Default::default() };
        let chart = comparison_chart(&results, 10);
        assert_eq!(chart.lines().count(), REFERENCE_SYSTEMS.len());
        assert!(!chart.contains("This machine"));
        assert!(!chart.contains('%'));
    }
}
