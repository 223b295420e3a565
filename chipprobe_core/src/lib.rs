//! Identification of Amiga hardware from its fixed register map, plus the
//! calibrated benchmarks that turn it into comparable numbers.

pub mod bench;
pub mod bus;
pub mod chipset;
pub mod clock;
pub mod config;
pub mod cpu;
pub mod derive;
pub mod dhrystone;
pub mod error;
pub mod format;
pub mod hardware;
pub mod host;
pub mod platform;
pub mod profiles;
pub mod regs;
pub mod score;
pub mod sim;
pub mod system_chips;
pub mod timing;
pub mod workload;

use log::debug;

pub use bench::{BenchRunner, BenchSettings, BenchmarkResults};
pub use bus::{MmioBus, RegisterAccess, Width};
pub use hardware::HardwareDescription;
pub use host::{CpuProbe, Host, SystemServices};
pub use timing::{Preemptive, SystemTimer, TaskSwitching, Timer};
pub use workload::{NativeWorkload, Workload};

/// Runs every detector once, in dependency order, and returns the finished
/// description. Later probes only look at fields filled in before them.
pub fn detect_hardware<B, H>(bus: &mut B, host: &mut H) -> HardwareDescription
where
    B: RegisterAccess + ?Sized,
    H: Host + ?Sized,
{
    let mut hw = HardwareDescription::default();

    let cpu = cpu::detect_cpu(bus, host);
    hw.cpu = cpu.family;
    hw.cpu_revision = cpu.revision;
    hw.superscalar_enabled = cpu.superscalar;
    debug!("cpu: {} rev {}", hw.cpu.label(), hw.cpu_revision);

    (hw.fpu, hw.fpu_enabled) = cpu::detect_fpu(host, hw.cpu);
    debug!("fpu: {} (enabled: {})", hw.fpu.label(), hw.fpu_enabled);

    (hw.mmu, hw.mmu_enabled) = cpu::detect_mmu(host, hw.cpu);
    debug!("mmu: {} (enabled: {})", hw.mmu.label(), hw.mmu_enabled);

    hw.vbr = cpu::detect_vbr(host, hw.cpu);
    hw.code_address = host.code_address();
    debug!("running from ${:08X}", hw.code_address);

    (hw.paula, hw.paula_rev) = chipset::detect_paula(bus);
    (hw.denise, hw.denise_rev) = chipset::detect_denise(bus, hw.paula);
    (hw.agnus, hw.agnus_rev) = chipset::detect_agnus(bus, hw.paula);

    let gary = system_chips::detect_gary(bus);
    hw.bus_controller = gary.controller;
    hw.gary_rev = gary.revision;
    debug!("bus controller: {}", hw.bus_controller.label());

    let ramsey = system_chips::detect_ramsey(bus, hw.bus_controller);
    hw.memory_controller = ramsey.controller;
    hw.ramsey_rev = ramsey.revision;
    hw.ramsey = ramsey.config;
    debug!("memory controller: {}", hw.memory_controller.label());

    let dma = system_chips::detect_dma(bus, hw.memory_controller);
    hw.dma_controller = dma.controller;
    hw.dma_rev = dma.revision;
    debug!("scsi dma: {}", hw.dma_controller.label());

    let slots = system_chips::detect_slots(host, hw.bus_controller, hw.memory_controller);
    hw.has_zorro_slots = slots.zorro;
    hw.zorro_iii = slots.zorro_iii;
    hw.has_pcmcia = slots.pcmcia;

    hw.clock = clock::detect_clock(bus, hw.bus_controller);
    debug!("clock: {}", hw.clock.label());

    hw.timing = derive::screen_timing(host.display_is_pal());
    hw.eclock_hz = host.eclock_frequency();

    cpu::refresh_cache_status(&mut hw, host);

    hw.rom = derive::detect_rom(bus, host);
    debug!("kickstart {}.{}, {}K", hw.rom.version, hw.rom.revision, hw.rom.size_kb);

    hw.max_chip_ram = derive::max_chip_ram(hw.agnus);
    hw.max_board_ram = derive::max_board_ram(hw.memory_controller, &hw.ramsey);

    hw
}
