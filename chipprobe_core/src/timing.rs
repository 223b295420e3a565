use std::time::Instant;

use log::trace;

/// 64-bit E-clock counter split the way the timer hardware reports it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EClockVal {
    pub hi: u32,
    pub lo: u32,
}

impl EClockVal {
    pub fn from_ticks(ticks: u64) -> Self {
        EClockVal { hi: (ticks >> 32) as u32, lo: ticks as u32 }
    }

    pub fn ticks(self) -> u64 {
        ((self.hi as u64) << 32) | self.lo as u64
    }
}

/// Converts a tick interval to microseconds. A counter that went backwards or
/// a zero frequency yields 0.
pub fn eclock_diff_us(start: EClockVal, end: EClockVal, frequency: u32) -> u64 {
    if frequency == 0 {
        return 0;
    }
    let ticks = end.ticks().saturating_sub(start.ticks());
    (ticks as u128 * 1_000_000 / frequency as u128) as u64
}

pub trait Timer {
    /// Current counter value and the counter frequency in Hz.
    fn read_eclock(&mut self) -> (EClockVal, u32);
}

/// Scheduler control. Between `forbid` and `permit` no other task may run.
pub trait TaskSwitching {
    fn forbid(&mut self);
    fn permit(&mut self);
}

/// Keeps task switching off for its lifetime.
pub struct ForbidGuard<'a, T: TaskSwitching + ?Sized> {
    tasks: &'a mut T,
}

impl<'a, T: TaskSwitching + ?Sized> ForbidGuard<'a, T> {
    pub fn new(tasks: &'a mut T) -> Self {
        tasks.forbid();
        ForbidGuard { tasks }
    }
}

impl<T: TaskSwitching + ?Sized> Drop for ForbidGuard<'_, T> {
    fn drop(&mut self) {
        self.tasks.permit();
    }
}

/// Hosts without a cooperative scheduler have nothing to switch off.
#[derive(Debug, Default)]
pub struct Preemptive;

impl TaskSwitching for Preemptive {
    fn forbid(&mut self) {}
    fn permit(&mut self) {}
}

/// Monotonic microsecond counter for hosts without an E-clock.
#[derive(Debug)]
pub struct SystemTimer {
    origin: Instant,
}

impl SystemTimer {
    pub const FREQUENCY: u32 = 1_000_000;

    pub fn new() -> Self {
        SystemTimer { origin: Instant::now() }
    }
}

impl Default for SystemTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl Timer for SystemTimer {
    fn read_eclock(&mut self) -> (EClockVal, u32) {
        let micros = self.origin.elapsed().as_micros() as u64;
        (EClockVal::from_ticks(micros), Self::FREQUENCY)
    }
}

pub struct Stopwatch<'a> {
    timer: &'a mut dyn Timer,
    tasks: &'a mut dyn TaskSwitching,
}

impl<'a> Stopwatch<'a> {
    pub fn new(timer: &'a mut dyn Timer, tasks: &'a mut dyn TaskSwitching) -> Self {
        Stopwatch { timer, tasks }
    }

    /// Runs `f` with task switching off and returns its result together with
    /// the elapsed microseconds.
    pub fn measure<R>(&mut self, f: impl FnOnce() -> R) -> (R, u64) {
        let guard = ForbidGuard::new(&mut *self.tasks);
        let (start, _) = self.timer.read_eclock();
        let result = f();
        let (end, frequency) = self.timer.read_eclock();
        drop(guard);
        (result, eclock_diff_us(start, end, frequency))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Calibration {
    pub base_count: u64,
    pub start_multiplier: u64,
    pub max_multiplier: u64,
    pub min_elapsed_us: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Calibrated {
    pub multiplier: u64,
    pub iterations: u64,
    pub elapsed_us: u64,
    pub attempts: u32,
}

/// Doubles the work until one run takes at least `min_elapsed_us` or the
/// multiplier ceiling is reached. The multiplier never exceeds the ceiling.
pub fn calibrate(cal: &Calibration, mut run: impl FnMut(u64) -> u64) -> Calibrated {
    let max = cal.max_multiplier.max(1);
    let mut multiplier = cal.start_multiplier.clamp(1, max);
    let mut attempts = 0;

    loop {
        let iterations = cal.base_count.saturating_mul(multiplier);
        let elapsed_us = run(iterations);
        attempts += 1;
        trace!("calibrate: x{multiplier} {iterations} iterations in {elapsed_us}us");

        if elapsed_us >= cal.min_elapsed_us || multiplier >= max {
            return Calibrated { multiplier, iterations, elapsed_us, attempts };
        }
        multiplier = multiplier.saturating_mul(2).min(max);
    }
}

/// Subtracts measured loop overhead, never returning less than 1µs for a
/// non-empty measurement.
pub fn without_overhead(elapsed_us: u64, overhead_us: u64) -> u64 {
    if elapsed_us == 0 {
        0
    } else if elapsed_us > overhead_us {
        elapsed_us - overhead_us
    } else {
        1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{CountingTasks, ScriptedTimer};

    #[test]
    fn tick_difference_in_microseconds() {
        let start = EClockVal { hi: 0, lo: 0xFFFF_FF00 };
        let end = EClockVal { hi: 1, lo: 0x0000_0100 };
        // 0x200 ticks at 709379 Hz
        assert_eq!(eclock_diff_us(start, end, 709_379), 721);
        assert_eq!(eclock_diff_us(end, start, 709_379), 0);
        assert_eq!(eclock_diff_us(start, end, 0), 0);
    }

    #[test]
    fn split_counter_round_trips() {
        let ticks = 0x0000_0012_3456_789A;
        assert_eq!(EClockVal::from_ticks(ticks).ticks(), ticks);
    }

    #[test]
    fn guard_permits_on_every_exit_path() {
        let mut tasks = CountingTasks::default();
        {
            let _guard = ForbidGuard::new(&mut tasks);
        }
        assert_eq!((tasks.forbids, tasks.permits), (1, 1));

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = ForbidGuard::new(&mut tasks);
            panic!("workload blew up");
        }));
        assert!(result.is_err());
        assert_eq!((tasks.forbids, tasks.permits), (2, 2));
        assert_eq!(tasks.depth, 0);
    }

    #[test]
    fn stopwatch_measures_between_forbid_and_permit() {
        let mut timer = ScriptedTimer::new(1_000_000);
        let clock = timer.clock();
        let mut tasks = CountingTasks::default();
        let (value, elapsed) = {
            let mut stopwatch = Stopwatch::new(&mut timer, &mut tasks);
            stopwatch.measure(|| {
                clock.advance(1500);
                7
            })
        };
        assert_eq!((value, elapsed), (7, 1500));
        assert_eq!(tasks.permits, 1);
    }

    #[test]
    fn calibration_doubles_until_threshold() {
        let cal = Calibration { base_count: 100, start_multiplier: 1, max_multiplier: 1000, min_elapsed_us: 2000 };
        let out = calibrate(&cal, |iterations| iterations * 3);
        // 100 -> 300us ... 800 -> 2400us
        assert_eq!(out.multiplier, 8);
        assert_eq!(out.iterations, 800);
        assert_eq!(out.elapsed_us, 2400);
        assert_eq!(out.attempts, 4);
    }

    #[test]
    fn calibration_stops_at_the_ceiling() {
        let cal = Calibration { base_count: 14680, start_multiplier: 62, max_multiplier: 16000, min_elapsed_us: 2000 };
        let out = calibrate(&cal, |_| 0);
        assert_eq!(out.multiplier, 16000);
        assert_eq!(out.iterations, 14680 * 16000);
    }

    #[test]
    fn overhead_floor() {
        assert_eq!(without_overhead(500, 100), 400);
        assert_eq!(without_overhead(100, 500), 1);
        assert_eq!(without_overhead(0, 500), 0);
    }
}
