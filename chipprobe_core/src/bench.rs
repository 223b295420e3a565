use log::{debug, warn};
use serde::Serialize;

use crate::derive::runs_from_fast_ram;
use crate::hardware::{CpuFamily, FpuFamily, HardwareDescription};
use crate::score::mips_index;
use crate::timing::{calibrate, without_overhead, Calibration, Stopwatch, TaskSwitching, Timer};
use crate::workload::{MemoryClass, Workload, FLOPS_PER_STEP};

pub const CPU_LOOPS: u64 = 14680;
pub const FPU_LOOPS: u64 = 1200;
pub const BASE_FACTOR: u64 = 136_000;
pub const MAX_MULTIPLY: u64 = 1000;
pub const MIN_MHZ_MEASURE_US: u64 = 2000;
pub const FLOPS_BASE_LOOPS: u64 = 50_000;
pub const MIN_FLOP_MEASURE_US: u64 = 4000;
pub const FLOP_LOOP_OPS: u64 = FLOPS_PER_STEP;
pub const FLOP_INIT_OPS: u64 = 3;
pub const MEMORY_BUFFER_BYTES: usize = 64 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct BenchmarkResults {
    pub dhrystones: u32,
    /// Hundredths.
    pub mips: u32,
    pub flops: u64,
    /// Hundredths.
    pub mflops: u32,
    /// Bytes per second.
    pub chip_speed: u64,
    pub fast_speed: u64,
    pub rom_speed: u64,
    pub valid: bool,
}

impl BenchmarkResults {
    /// A finished run that produced a Dhrystone score. Without a timer the
    /// run completes but measures nothing.
    pub fn measured(&self) -> bool {
        self.valid && self.dhrystones > 0
    }

    pub fn memory_speed(&self, class: MemoryClass) -> u64 {
        match class {
            MemoryClass::Chip => self.chip_speed,
            MemoryClass::Fast => self.fast_speed,
            MemoryClass::Rom => self.rom_speed,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DhrystoneSettings {
    pub loops: u64,
    pub min_us: u64,
    pub max_loops: u64,
    pub attempts: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemorySettings {
    pub bytes: usize,
    /// `base_count` is the number of passes over the buffer.
    pub calibration: Calibration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BenchSettings {
    pub dhrystone: DhrystoneSettings,
    pub mflops: Calibration,
    pub memory: MemorySettings,
    pub cpu_mhz: Calibration,
    pub fpu_mhz: Calibration,
}

impl Default for BenchSettings {
    fn default() -> Self {
        BenchSettings {
            dhrystone: DhrystoneSettings { loops: 1000, min_us: 2_000_000, max_loops: 5_000_000, attempts: 3 },
            mflops: Calibration {
                base_count: FLOPS_BASE_LOOPS,
                start_multiplier: 1,
                max_multiplier: MAX_MULTIPLY,
                min_elapsed_us: MIN_FLOP_MEASURE_US,
            },
            memory: MemorySettings {
                bytes: MEMORY_BUFFER_BYTES,
                calibration: Calibration { base_count: 16, start_multiplier: 1, max_multiplier: 64, min_elapsed_us: 20_000 },
            },
            cpu_mhz: Calibration {
                base_count: CPU_LOOPS,
                start_multiplier: 1,
                max_multiplier: MAX_MULTIPLY,
                min_elapsed_us: MIN_MHZ_MEASURE_US,
            },
            fpu_mhz: Calibration {
                base_count: FPU_LOOPS,
                start_multiplier: 1,
                max_multiplier: MAX_MULTIPLY,
                min_elapsed_us: MIN_MHZ_MEASURE_US,
            },
        }
    }
}

/// Empirical correction applied to the loop timing: the result is scaled by
/// `factor` and the measured time by `count_scale`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Correction {
    pub factor: u64,
    pub count_scale: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CorrectionClass {
    M68000ChipRam,
    M68000FastRam,
    M68020To030,
    M68040,
    M68060Superscalar,
    M68060Scalar,
    M68060NoMmu,
    M68080Superscalar,
    M68080Scalar,
    Unknown,
}

pub const CPU_CORRECTIONS: [(CorrectionClass, Correction); 10] = [
    (CorrectionClass::M68000ChipRam, Correction { factor: 282, count_scale: 1 }),
    (CorrectionClass::M68000FastRam, Correction { factor: 204, count_scale: 1 }),
    (CorrectionClass::M68020To030, Correction { factor: 88, count_scale: 1 }),
    (CorrectionClass::M68040, Correction { factor: 3253, count_scale: 100 }),
    (CorrectionClass::M68060Superscalar, Correction { factor: 1085, count_scale: 100 }),
    (CorrectionClass::M68060Scalar, Correction { factor: 1085, count_scale: 50 }),
    (CorrectionClass::M68060NoMmu, Correction { factor: 1085, count_scale: 20 }),
    (CorrectionClass::M68080Superscalar, Correction { factor: 1085, count_scale: 100 }),
    (CorrectionClass::M68080Scalar, Correction { factor: 1085, count_scale: 50 }),
    (CorrectionClass::Unknown, Correction { factor: 100, count_scale: 1 }),
];

const COPROCESSOR_CORRECTION: u64 = 79;

pub fn correction_class(cpu: CpuFamily, fast_ram: bool, mmu_enabled: bool, superscalar: bool) -> CorrectionClass {
    use CpuFamily::*;
    match cpu {
        M68000 | M68010 if fast_ram => CorrectionClass::M68000FastRam,
        M68000 | M68010 => CorrectionClass::M68000ChipRam,
        M68020 | M68EC020 | M68030 | M68EC030 => CorrectionClass::M68020To030,
        M68040 | M68LC040 | M68EC040 => CorrectionClass::M68040,
        M68060 | M68EC060 | M68LC060 if !mmu_enabled => CorrectionClass::M68060NoMmu,
        M68060 | M68EC060 | M68LC060 if superscalar => CorrectionClass::M68060Superscalar,
        M68060 | M68EC060 | M68LC060 => CorrectionClass::M68060Scalar,
        // the 68080 has no MMU to switch off
        M68080 if superscalar => CorrectionClass::M68080Superscalar,
        M68080 => CorrectionClass::M68080Scalar,
        Unknown => CorrectionClass::Unknown,
    }
}

pub fn cpu_correction(class: CorrectionClass) -> Correction {
    CPU_CORRECTIONS
        .iter()
        .find(|(c, _)| *c == class)
        .map_or(Correction { factor: 100, count_scale: 1 }, |(_, correction)| *correction)
}

/// Typical clock when the loop ran too fast to measure.
pub fn nominal_cpu_mhz(cpu: CpuFamily) -> u32 {
    use CpuFamily::*;
    match cpu {
        M68000 | M68010 | Unknown => 709,
        M68020 | M68EC020 => 1418,
        M68030 | M68EC030 => 2500,
        M68040 | M68LC040 | M68EC040 => 2500,
        M68060 | M68EC060 | M68LC060 => 5000,
        M68080 => 8000,
    }
}

pub fn nominal_fpu_mhz(fpu: FpuFamily) -> u32 {
    match fpu {
        FpuFamily::M68881 => 1400,
        FpuFamily::M68882 => 2500,
        FpuFamily::M68040 | FpuFamily::M68060 => 5000,
        FpuFamily::M68080 => 8000,
        FpuFamily::None | FpuFamily::Unknown => 0,
    }
}

/// Next Dhrystone run count after a too-short attempt.
pub fn next_dhrystone_loops(loops: u64, elapsed_us: u64, settings: &DhrystoneSettings) -> u64 {
    let next = if elapsed_us < 100 {
        loops.saturating_mul(16)
    } else {
        let scaled = (settings.min_us as u128 * loops as u128 / elapsed_us as u128) as u64;
        scaled.saturating_add(loops).max(loops.saturating_mul(2))
    };
    next.min(settings.max_loops)
}

fn saturate(value: u128) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}

fn saturate64(value: u128) -> u64 {
    u64::try_from(value).unwrap_or(u64::MAX)
}

/// Runs the timed workloads. Without a timer every measurement reports 0.
pub struct BenchRunner<'a> {
    stopwatch: Option<Stopwatch<'a>>,
    workload: &'a mut dyn Workload,
    settings: BenchSettings,
}

impl<'a> BenchRunner<'a> {
    pub fn new(
        timer: Option<&'a mut dyn Timer>,
        tasks: &'a mut dyn TaskSwitching,
        workload: &'a mut dyn Workload,
        settings: BenchSettings,
    ) -> Self {
        if timer.is_none() {
            warn!("no timer available, benchmarks will report N/A");
        }
        let stopwatch = timer.map(|timer| Stopwatch::new(timer, tasks));
        BenchRunner { stopwatch, workload, settings }
    }

    pub fn has_timer(&self) -> bool {
        self.stopwatch.is_some()
    }

    fn time(&mut self, f: impl FnOnce(&mut dyn Workload)) -> Option<u64> {
        let stopwatch = self.stopwatch.as_mut()?;
        let workload = &mut *self.workload;
        Some(stopwatch.measure(|| f(workload)).1)
    }

    fn loop_overhead(&mut self, iterations: u64) -> u64 {
        self.time(|w| w.empty_loop(iterations)).unwrap_or(0)
    }

    pub fn dhrystone(&mut self) -> u32 {
        if !self.has_timer() {
            return 0;
        }
        let settings = self.settings.dhrystone;
        let attempts = settings.attempts.max(1);
        let mut loops = settings.loops.max(1);
        let mut elapsed = 0;

        for attempt in 1..=attempts {
            let mut verified = false;
            elapsed = self.time(|w| verified = w.dhrystone(loops)).unwrap_or(0);
            if !verified {
                warn!("dhrystone self-check failed after {loops} runs");
                return 0;
            }
            if elapsed >= settings.min_us || loops >= settings.max_loops || attempt == attempts {
                break;
            }
            loops = next_dhrystone_loops(loops, elapsed, &settings);
        }

        debug!("dhrystone: {loops} runs in {elapsed}us");
        if elapsed == 0 {
            return 0;
        }
        saturate(loops as u128 * 1_000_000 / elapsed as u128)
    }

    /// FLOPS and MFLOPS (hundredths). Zero when the FPU is missing or unusable.
    pub fn mflops(&mut self, hw: &HardwareDescription) -> (u64, u32) {
        if !hw.fpu.is_present() || !hw.fpu_enabled || !self.has_timer() {
            return (0, 0);
        }
        let cal = self.settings.mflops;
        let run = calibrate(&cal, |n| self.time(|w| w.flops(n)).unwrap_or(0));
        let overhead = self.loop_overhead(run.iterations);
        let elapsed = without_overhead(run.elapsed_us, overhead);
        debug!("flops: {} iterations in {elapsed}us ({overhead}us overhead)", run.iterations);
        if elapsed == 0 {
            return (0, 0);
        }

        let ops = run.iterations as u128 * FLOP_LOOP_OPS as u128 + FLOP_INIT_OPS as u128;
        (saturate64(ops * 1_000_000 / elapsed as u128), saturate(ops * 100 / elapsed as u128))
    }

    /// Read bandwidth in bytes per second, 0 if the region is unavailable.
    pub fn memory_speed(&mut self, class: MemoryClass) -> u64 {
        if !self.has_timer() {
            return 0;
        }
        let settings = self.settings.memory;
        let Some(region) = self.workload.memory_region(class, settings.bytes) else {
            debug!("no {} region to read", class.label());
            return 0;
        };
        if region.is_empty() {
            return 0;
        }

        let run = calibrate(&settings.calibration, |passes| {
            self.time(|w| w.read_region(&region, passes)).unwrap_or(0)
        });
        let overhead = self.loop_overhead(run.iterations * region.loops_per_pass());
        let elapsed = without_overhead(run.elapsed_us, overhead);
        debug!("{} read: {} passes in {elapsed}us", class.label(), run.iterations);
        if elapsed == 0 {
            return 0;
        }
        saturate64(region.len() as u128 * run.iterations as u128 * 1_000_000 / elapsed as u128)
    }

    /// CPU clock in hundredths of MHz.
    pub fn cpu_mhz(&mut self, hw: &HardwareDescription, code_address: u32) -> u32 {
        if !self.has_timer() {
            return 0;
        }
        let mut cal = self.settings.cpu_mhz;
        if hw.cpu.at_least(CpuFamily::M68040) {
            cal.start_multiplier = (cal.max_multiplier / 16).max(1);
            cal.max_multiplier = cal.max_multiplier.saturating_mul(16);
        }

        let run = calibrate(&cal, |n| self.loop_overhead(n));
        if run.elapsed_us == 0 {
            return nominal_cpu_mhz(hw.cpu);
        }

        let class = correction_class(hw.cpu, runs_from_fast_ram(code_address), hw.mmu_enabled, hw.superscalar_enabled);
        let correction = cpu_correction(class);
        debug!("cpu clock: x{} in {}us, {class:?}", run.multiplier, run.elapsed_us);

        let numerator = BASE_FACTOR as u128 * run.iterations as u128 * correction.factor as u128;
        let denominator = CPU_LOOPS as u128 * run.elapsed_us as u128 * correction.count_scale as u128;
        saturate(numerator / denominator)
    }

    /// FPU clock in hundredths of MHz. Integrated units run at the CPU clock.
    pub fn fpu_mhz(&mut self, hw: &HardwareDescription, cpu_mhz: u32) -> u32 {
        if !hw.fpu.is_present() || !self.has_timer() {
            return 0;
        }
        use CpuFamily::*;
        match hw.cpu {
            M68LC040 | M68EC040 | M68LC060 | M68EC060 => return 0,
            M68040 | M68060 | M68080 => return cpu_mhz,
            _ => {}
        }

        let cal = self.settings.fpu_mhz;
        let run = calibrate(&cal, |n| self.time(|w| w.fpu_divide_loop(n)).unwrap_or(0));
        let overhead = self.loop_overhead(run.iterations);
        let count = without_overhead(run.elapsed_us, overhead);
        if count == 0 {
            return nominal_fpu_mhz(hw.fpu);
        }

        let factor = match hw.fpu {
            FpuFamily::M68881 | FpuFamily::M68882 => COPROCESSOR_CORRECTION,
            _ => 1,
        };
        let numerator = BASE_FACTOR as u128 * run.iterations as u128 * factor as u128;
        saturate(numerator / (FPU_LOOPS as u128 * count as u128))
    }

    /// Full benchmark pass. `results` is reset first and only marked valid at
    /// the end; the measured clocks go into `hw`.
    pub fn run_benchmarks(&mut self, hw: &mut HardwareDescription, code_address: u32, results: &mut BenchmarkResults) {
        *results = BenchmarkResults::default();

        debug!("bench: dhrystone");
        results.dhrystones = self.dhrystone();
        results.mips = mips_index(results.dhrystones);

        if hw.fpu.is_present() {
            if hw.fpu_enabled {
                debug!("bench: mflops");
                (results.flops, results.mflops) = self.mflops(hw);
            } else {
                debug!("bench: FPU support library missing, skipping mflops");
            }
        }

        debug!("bench: memory");
        results.chip_speed = self.memory_speed(MemoryClass::Chip);
        results.fast_speed = self.memory_speed(MemoryClass::Fast);
        results.rom_speed = self.memory_speed(MemoryClass::Rom);

        debug!("bench: clocks");
        hw.cpu_mhz = self.cpu_mhz(hw, code_address);
        hw.fpu_mhz = self.fpu_mhz(hw, hw.cpu_mhz);

        results.valid = true;
    }
}
