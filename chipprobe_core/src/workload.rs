//! The code that gets timed. On the target these are tight assembly loops; the
//! native implementation keeps the same shape in portable Rust so the
//! calibration has something with realistic scaling to measure.

use std::hint::black_box;
use std::ops::{Add, Div, Mul, Sub};

use log::debug;
use serde::Serialize;

use crate::dhrystone::Dhrystone;
use crate::platform::AlignedBuffer;

/// Bytes consumed by one inner iteration of the memory read loop.
pub const BYTES_PER_READ_LOOP: usize = 128;
pub const READ_ALIGNMENT: usize = 16;
/// Floating point operations in one pass of [`flop_step`].
pub const FLOPS_PER_STEP: u64 = 9;

/// One pass of the FLOPS kernel.
fn flop_step<T>(a: T, b: T, c: T) -> (T, T, T)
where
    T: Copy + Add<Output = T> + Sub<Output = T> + Mul<Output = T> + Div<Output = T> + From<f32>,
{
    let a = black_box(a * b + c);
    let b = black_box(b - c * T::from(0.125));
    let c = black_box((a + b) / T::from(3.0));
    let a = black_box(a - c);
    let b = black_box(b + T::from(1.0));
    let c = black_box(c * T::from(0.5));
    (a, b, c)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum MemoryClass {
    Chip,
    Fast,
    Rom,
}

impl MemoryClass {
    pub const ALL: [MemoryClass; 3] = [MemoryClass::Chip, MemoryClass::Fast, MemoryClass::Rom];

    pub fn label(self) -> &'static str {
        match self {
            MemoryClass::Chip => "CHIP",
            MemoryClass::Fast => "FAST",
            MemoryClass::Rom => "ROM",
        }
    }
}

/// A block the memory benchmark reads from. Either owned or a fixed window
/// such as the Kickstart ROM.
#[derive(Debug)]
pub struct MemoryRegion {
    start: *const u8,
    len: usize,
    _owner: Option<AlignedBuffer>,
}

impl MemoryRegion {
    /// Shrinks the usable part to whole read loops past a 16 byte boundary.
    fn trimmed(start: *const u8, len: usize, owner: Option<AlignedBuffer>) -> Self {
        let skew = start.align_offset(READ_ALIGNMENT).min(len);
        let usable = (len - skew) / BYTES_PER_READ_LOOP * BYTES_PER_READ_LOOP;
        MemoryRegion { start: start.wrapping_add(skew), len: usable, _owner: owner }
    }

    pub fn owned(buffer: AlignedBuffer) -> Self {
        let (start, len) = (buffer.as_ptr(), buffer.len());
        Self::trimmed(start, len, Some(buffer))
    }

    /// # Safety
    /// `address..address + len` must stay mapped and readable for the
    /// lifetime of the region.
    pub unsafe fn fixed(address: usize, len: usize) -> Self {
        Self::trimmed(address as *const u8, len, None)
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn loops_per_pass(&self) -> u64 {
        (self.len / BYTES_PER_READ_LOOP) as u64
    }

    pub fn as_ptr(&self) -> *const u8 {
        self.start
    }
}

/// Everything the benchmarks time, one method per measured loop.
pub trait Workload {
    /// Counted-down empty loop; doubles as the loop overhead reference.
    fn empty_loop(&mut self, iterations: u64);

    /// Repeated floating point division on a single register.
    fn fpu_divide_loop(&mut self, iterations: u64);

    /// Mixed floating point kernel, nine operations per iteration.
    fn flops(&mut self, iterations: u64);

    /// Dhrystone 2.1. Returns false if the benchmark could not be set up or
    /// produced wrong results.
    fn dhrystone(&mut self, runs: u64) -> bool;

    /// A region of the requested memory class, `None` when unavailable.
    fn memory_region(&mut self, class: MemoryClass, bytes: usize) -> Option<MemoryRegion>;

    /// Reads the whole region `passes` times, 128 bytes per inner loop.
    fn read_region(&mut self, region: &MemoryRegion, passes: u64);
}

/// Portable workloads for the host the tool runs on.
#[derive(Debug, Default)]
pub struct NativeWorkload {
    dhrystone: Dhrystone,
}

impl NativeWorkload {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Workload for NativeWorkload {
    fn empty_loop(&mut self, iterations: u64) {
        let mut count = black_box(iterations);
        while count != 0 {
            count = black_box(count - 1);
        }
    }

    fn fpu_divide_loop(&mut self, iterations: u64) {
        let mut fp1 = black_box(1.0f64);
        for _ in 0..iterations {
            fp1 = black_box(fp1 / fp1);
        }
        black_box(fp1);
    }

    fn flops(&mut self, iterations: u64) {
        let (mut a, mut b, mut c) = black_box((1.5f64, 2.25f64, 0.5f64));
        for _ in 0..iterations {
            (a, b, c) = flop_step(a, b, c);
        }
        black_box((a, b, c));
    }

    fn dhrystone(&mut self, runs: u64) -> bool {
        self.dhrystone.run(runs);
        self.dhrystone.verify(runs)
    }

    fn memory_region(&mut self, class: MemoryClass, bytes: usize) -> Option<MemoryRegion> {
        match class {
            // no separate chip bus here, both classes are ordinary heap
            MemoryClass::Chip | MemoryClass::Fast => {
                match AlignedBuffer::new(bytes, READ_ALIGNMENT) {
                    Ok(buffer) => Some(MemoryRegion::owned(buffer)),
                    Err(err) => {
                        debug!("{} buffer: {err}", class.label());
                        None
                    }
                }
            }
            MemoryClass::Rom => None,
        }
    }

    fn read_region(&mut self, region: &MemoryRegion, passes: u64) {
        let base = region.as_ptr() as *const u64;
        let words_per_loop = BYTES_PER_READ_LOOP / 8;
        for _ in 0..passes {
            let mut sum = 0u64;
            for block in 0..region.loops_per_pass() as usize {
                for word in 0..words_per_loop {
                    // SAFETY: the region spans loops_per_pass * 128 aligned bytes
                    sum ^= unsafe { std::ptr::read_volatile(base.add(block * words_per_loop + word)) };
                }
            }
            black_box(sum);
        }
    }
}
