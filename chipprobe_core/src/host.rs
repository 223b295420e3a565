use crate::hardware::CpuFamily;

/// Processor-level probes that cannot be expressed as plain register reads.
///
/// On the real machine these are supervisor-mode instruction sequences with
/// trap handlers; the MMU/FPU probes trap on missing silicon and report `false`.
pub trait CpuProbe {
    /// Exec attention flags, see [`crate::regs::attn`].
    fn attn_flags(&mut self) -> u16;

    /// 68060 processor configuration register, `None` when not a 68060.
    fn processor_config(&mut self) -> Option<u32>;

    /// Executes an MMU instruction appropriate for `family`.
    fn has_mmu(&mut self, family: CpuFamily) -> bool;

    /// Executes an FPU instruction; `false` if it line-F traps.
    fn has_fpu(&mut self) -> bool;

    /// Vector base register. Only valid on a 68010 or newer.
    fn vector_base(&mut self) -> u32;

    /// Sets the CACR bits selected by `mask` to `bits`, returning the previous
    /// contents. `cache_control(0, 0)` reads without changing anything.
    fn cache_control(&mut self, bits: u32, mask: u32) -> u32;
}

/// Operating system queries used during classification.
pub trait SystemServices {
    fn module_loaded(&mut self, name: &str) -> bool;
    fn resource_present(&mut self, name: &str) -> bool;
    fn display_is_pal(&mut self) -> bool;
    /// Exec library version and revision.
    fn exec_version(&mut self) -> (u16, u16);
    fn eclock_frequency(&mut self) -> u32;
    /// Address the running code was loaded at.
    fn code_address(&mut self) -> u32;
}

pub trait Host: CpuProbe + SystemServices {}

impl<T: CpuProbe + SystemServices + ?Sized> Host for T {}

pub const FPU040_LIBRARY: &str = "68040.library";
pub const FPU060_LIBRARY: &str = "68060.library";
pub const MMU_LIBRARY: &str = "mmu.library";
pub const CARD_RESOURCE: &str = "card.resource";
