//! Scripted stand-ins for the machine: a register map with programmable
//! behaviour, a host with fixed answers, a manually advanced clock and a
//! workload whose cost is a simple linear model.
//!
//! Used by the unit tests and by the named machine profiles, so the whole
//! detection and benchmark pipeline can run away from real hardware.

use std::cell::Cell;
use std::collections::BTreeMap;
use std::rc::Rc;

use crate::bus::{RegisterAccess, Width};
use crate::hardware::CpuFamily;
use crate::host::{CpuProbe, SystemServices};
use crate::platform::AlignedBuffer;
use crate::timing::{EClockVal, TaskSwitching, Timer};
use crate::workload::{MemoryClass, MemoryRegion, Workload, READ_ALIGNMENT};

/// How far a mirror chain is followed before it reads as zero.
const MAX_MIRROR_DEPTH: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Register {
    /// Always reads the same value, writes are dropped.
    Fixed(u32),
    /// Stores the bits selected by `write_mask`.
    Latch { value: u32, write_mask: u32 },
    /// Reads step through `values`; the last one repeats.
    Sequence { values: Vec<u32>, next: usize },
    /// Reads another register through a mask. Writes go to the target.
    Mirror { of: u32, and: u32, or: u32 },
    /// Shifts `id` out through bit 7, one bit per read, MSB first. Any write
    /// restarts at the top bit.
    SerialId { id: u8, low: u8, cursor: u32 },
}

impl Register {
    pub fn latch(value: u32, write_mask: u32) -> Self {
        Register::Latch { value, write_mask }
    }

    pub fn sequence(values: Vec<u32>) -> Self {
        Register::Sequence { values, next: 0 }
    }

    pub fn mirror(of: u32) -> Self {
        Register::Mirror { of, and: u32::MAX, or: 0 }
    }

    pub fn serial_id(id: u8, low: u8) -> Self {
        Register::SerialId { id, low, cursor: 0 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessKind {
    Read,
    Write,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Access {
    pub kind: AccessKind,
    pub address: u32,
    pub width: Width,
    pub value: u32,
}

/// Register map driven by a script. Unmapped addresses read pseudo-random
/// noise, like an undecoded bus does.
#[derive(Debug, Clone)]
pub struct ScriptedBus {
    registers: BTreeMap<u32, Register>,
    log: Vec<Access>,
    noise: (u64, u64),
}

impl ScriptedBus {
    pub fn new(seed: u64) -> Self {
        let s0 = seed.wrapping_mul(0x9E37_79B9_7F4A_7C15) | 1;
        let s1 = seed ^ 0xD1B5_4A32_D192_ED03;
        ScriptedBus { registers: BTreeMap::new(), log: Vec::new(), noise: (s0, s1) }
    }

    pub fn with(mut self, address: u32, register: Register) -> Self {
        self.set(address, register);
        self
    }

    pub fn set(&mut self, address: u32, register: Register) {
        self.registers.insert(address, register);
    }

    /// Current value without side effects. Unmapped reads as 0.
    pub fn peek(&self, address: u32) -> u32 {
        self.peek_at(address, 0)
    }

    fn peek_at(&self, address: u32, depth: usize) -> u32 {
        match self.registers.get(&address) {
            None => 0,
            Some(Register::Fixed(value)) => *value,
            Some(Register::Latch { value, .. }) => *value,
            Some(Register::Sequence { values, next }) => {
                values.get(*next).or(values.last()).copied().unwrap_or(0)
            }
            Some(Register::Mirror { of, and, or }) => {
                if depth >= MAX_MIRROR_DEPTH {
                    return 0;
                }
                (self.peek_at(*of, depth + 1) & and) | or
            }
            Some(Register::SerialId { id, low, cursor }) => {
                (((*id as u32) << *cursor) & 0x80) | (*low as u32 & 0x7F)
            }
        }
    }

    pub fn log(&self) -> &[Access] {
        &self.log
    }

    pub fn reads_of(&self, address: u32) -> usize {
        self.log.iter().filter(|a| a.kind == AccessKind::Read && a.address == address).count()
    }

    pub fn writes(&self) -> impl Iterator<Item = &Access> + '_ {
        self.log.iter().filter(|a| a.kind == AccessKind::Write)
    }

    pub fn writes_to(&self, address: u32) -> Vec<u32> {
        self.writes().filter(|a| a.address == address).map(|a| a.value).collect()
    }

    // xorshift128+
    fn next_noise(&mut self) -> u32 {
        let (s1, s0) = self.noise;
        let next = s1 ^ (s1 << 23) ^ s0 ^ (s1 >> 18) ^ (s0 >> 5);
        self.noise = (s0, next);
        (next.wrapping_add(s0) >> 32) as u32
    }

    fn store(&mut self, address: u32, value: u32, depth: usize) {
        let forward = match self.registers.get_mut(&address) {
            Some(Register::Latch { value: current, write_mask }) => {
                *current = (*current & !*write_mask) | (value & *write_mask);
                None
            }
            Some(Register::SerialId { cursor, .. }) => {
                *cursor = 0;
                None
            }
            Some(Register::Mirror { of, .. }) => Some(*of),
            _ => None,
        };
        if let Some(target) = forward {
            if depth < MAX_MIRROR_DEPTH {
                self.store(target, value, depth + 1);
            }
        }
    }
}

impl RegisterAccess for ScriptedBus {
    fn read(&mut self, address: u32, width: Width) -> u32 {
        let value = match self.registers.get_mut(&address) {
            None => self.next_noise(),
            Some(Register::Sequence { values, next }) => {
                let value = values.get(*next).or(values.last()).copied().unwrap_or(0);
                if *next < values.len() {
                    *next += 1;
                }
                value
            }
            Some(Register::SerialId { id, low, cursor }) => {
                let value = (((*id as u32) << *cursor) & 0x80) | (*low as u32 & 0x7F);
                *cursor = (*cursor + 1) % 8;
                value
            }
            Some(_) => self.peek(address),
        };
        let value = value & width.mask();
        self.log.push(Access { kind: AccessKind::Read, address, width, value });
        value
    }

    fn write(&mut self, address: u32, width: Width, value: u32) {
        let value = value & width.mask();
        self.log.push(Access { kind: AccessKind::Write, address, width, value });
        self.store(address, value, 0);
    }
}

/// Host with scripted answers. Probe counters let tests check that a probe
/// was skipped.
#[derive(Debug, Clone, Default)]
pub struct SimulatedHost {
    pub attn: u16,
    pub pcr: Option<u32>,
    pub mmu: bool,
    pub fpu: bool,
    pub vbr: u32,
    pub cacr: u32,
    pub modules: Vec<String>,
    pub resources: Vec<String>,
    pub pal: bool,
    pub exec: (u16, u16),
    pub eclock: u32,
    pub code_address: u32,

    pub mmu_probes: u32,
    pub fpu_probes: u32,
    pub vbr_reads: u32,
    pub cacr_reads: u32,
}

impl CpuProbe for SimulatedHost {
    fn attn_flags(&mut self) -> u16 {
        self.attn
    }

    fn processor_config(&mut self) -> Option<u32> {
        self.pcr
    }

    fn has_mmu(&mut self, _family: CpuFamily) -> bool {
        self.mmu_probes += 1;
        self.mmu
    }

    fn has_fpu(&mut self) -> bool {
        self.fpu_probes += 1;
        self.fpu
    }

    fn vector_base(&mut self) -> u32 {
        self.vbr_reads += 1;
        self.vbr
    }

    fn cache_control(&mut self, bits: u32, mask: u32) -> u32 {
        self.cacr_reads += 1;
        let old = self.cacr;
        self.cacr = (old & !mask) | (bits & mask);
        old
    }
}

impl SystemServices for SimulatedHost {
    fn module_loaded(&mut self, name: &str) -> bool {
        self.modules.iter().any(|m| m == name)
    }

    fn resource_present(&mut self, name: &str) -> bool {
        self.resources.iter().any(|r| r == name)
    }

    fn display_is_pal(&mut self) -> bool {
        self.pal
    }

    fn exec_version(&mut self) -> (u16, u16) {
        self.exec
    }

    fn eclock_frequency(&mut self) -> u32 {
        self.eclock
    }

    fn code_address(&mut self) -> u32 {
        self.code_address
    }
}

/// Shared tick counter; clones advance the same clock.
#[derive(Debug, Clone, Default)]
pub struct ManualClock(Rc<Cell<u64>>);

impl ManualClock {
    pub fn advance(&self, ticks: u64) {
        self.0.set(self.0.get().saturating_add(ticks));
    }

    pub fn now(&self) -> u64 {
        self.0.get()
    }
}

#[derive(Debug)]
pub struct ScriptedTimer {
    clock: ManualClock,
    frequency: u32,
}

impl ScriptedTimer {
    pub fn new(frequency: u32) -> Self {
        ScriptedTimer { clock: ManualClock::default(), frequency }
    }

    pub fn clock(&self) -> ManualClock {
        self.clock.clone()
    }
}

impl Timer for ScriptedTimer {
    fn read_eclock(&mut self) -> (EClockVal, u32) {
        (EClockVal::from_ticks(self.clock.now()), self.frequency)
    }
}

#[derive(Debug, Default)]
pub struct CountingTasks {
    pub forbids: u32,
    pub permits: u32,
    pub depth: u32,
}

impl TaskSwitching for CountingTasks {
    fn forbid(&mut self) {
        self.forbids += 1;
        self.depth += 1;
    }

    fn permit(&mut self) {
        self.permits += 1;
        self.depth = self.depth.saturating_sub(1);
    }
}

/// Workload that does no work but advances a clock. Costs are microseconds per
/// thousand iterations (per KiB for memory reads), assuming a 1 MHz timer.
#[derive(Debug)]
pub struct SimWorkload {
    clock: ManualClock,
    pub empty_loop_per_k: u64,
    pub fpu_divide_per_k: u64,
    pub flops_per_k: u64,
    pub dhrystone_per_k: u64,
    pub read_per_kib: u64,
    /// Whether a ROM window can be read.
    pub rom: bool,
    pub dhrystone_ok: bool,
    pub calls: Vec<(&'static str, u64)>,
}

impl SimWorkload {
    pub fn new(clock: ManualClock) -> Self {
        SimWorkload {
            clock,
            empty_loop_per_k: 0,
            fpu_divide_per_k: 0,
            flops_per_k: 0,
            dhrystone_per_k: 0,
            read_per_kib: 0,
            rom: true,
            dhrystone_ok: true,
            calls: Vec::new(),
        }
    }

    fn spend(&mut self, name: &'static str, count: u64, per_k: u64) {
        self.calls.push((name, count));
        self.clock.advance((count as u128 * per_k as u128 / 1000) as u64);
    }

    fn runs_of(&self, name: &str) -> Vec<u64> {
        self.calls.iter().filter(|(n, _)| *n == name).map(|(_, count)| *count).collect()
    }

    pub fn dhrystone_runs(&self) -> Vec<u64> {
        self.runs_of("dhrystone")
    }

    pub fn empty_loop_runs(&self) -> Vec<u64> {
        self.runs_of("empty_loop")
    }
}

impl Workload for SimWorkload {
    fn empty_loop(&mut self, iterations: u64) {
        self.spend("empty_loop", iterations, self.empty_loop_per_k);
    }

    fn fpu_divide_loop(&mut self, iterations: u64) {
        self.spend("fpu_divide", iterations, self.fpu_divide_per_k);
    }

    fn flops(&mut self, iterations: u64) {
        self.spend("flops", iterations, self.flops_per_k);
    }

    fn dhrystone(&mut self, runs: u64) -> bool {
        self.spend("dhrystone", runs, self.dhrystone_per_k);
        self.dhrystone_ok
    }

    fn memory_region(&mut self, class: MemoryClass, bytes: usize) -> Option<MemoryRegion> {
        if class == MemoryClass::Rom && !self.rom {
            return None;
        }
        AlignedBuffer::new(bytes, READ_ALIGNMENT).ok().map(MemoryRegion::owned)
    }

    fn read_region(&mut self, region: &MemoryRegion, passes: u64) {
        self.calls.push(("read", passes));
        let kib = region.len() as u128 * passes as u128;
        self.clock.advance((kib * self.read_per_kib as u128 / 1024) as u64);
    }
}
