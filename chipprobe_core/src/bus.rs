use std::ptr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Width {
    Byte,
    Word,
    Long,
}

impl Width {
    pub fn mask(self) -> u32 {
        match self {
            Width::Byte => 0xFF,
            Width::Word => 0xFFFF,
            Width::Long => 0xFFFF_FFFF,
        }
    }
}

/// Raw access to the fixed physical register map.
///
/// Reads and writes are never cached or retried. A register that does not exist
/// reads back as whatever the bus happens to hold, so callers must recognise
/// implausible patterns themselves. Some registers are write-triggered, which is
/// why reads take `&mut self` as well.
pub trait RegisterAccess {
    fn read(&mut self, address: u32, width: Width) -> u32;
    fn write(&mut self, address: u32, width: Width, value: u32);

    fn read_byte(&mut self, address: u32) -> u8 {
        self.read(address, Width::Byte) as u8
    }

    fn read_word(&mut self, address: u32) -> u16 {
        self.read(address, Width::Word) as u16
    }

    fn read_long(&mut self, address: u32) -> u32 {
        self.read(address, Width::Long)
    }

    fn write_byte(&mut self, address: u32, value: u8) {
        self.write(address, Width::Byte, value as u32)
    }

    fn write_word(&mut self, address: u32, value: u16) {
        self.write(address, Width::Word, value as u32)
    }

    fn write_long(&mut self, address: u32, value: u32) {
        self.write(address, Width::Long, value)
    }

    /// Throwaway read used to clear a value still lingering on the data bus.
    fn settle(&mut self, address: u32) {
        let _ = self.read(address, Width::Word);
    }
}

impl<T: RegisterAccess + ?Sized> RegisterAccess for &mut T {
    fn read(&mut self, address: u32, width: Width) -> u32 {
        (**self).read(address, width)
    }

    fn write(&mut self, address: u32, width: Width, value: u32) {
        (**self).write(address, width, value)
    }
}

/// Volatile access to memory-mapped registers.
///
/// On the real machine the register window is identity mapped (`base == 0`).
/// A non-zero base relocates every address, which is only useful to point the
/// bus at an ordinary buffer.
#[derive(Debug)]
pub struct MmioBus {
    base: usize,
}

impl MmioBus {
    /// # Safety
    /// The caller must be running on the target machine with the custom chip
    /// space mapped at its physical addresses and must own the bus exclusively.
    pub unsafe fn identity() -> Self {
        MmioBus { base: 0 }
    }

    /// # Safety
    /// Every address later passed to this bus, added to `base`, must be valid
    /// and suitably aligned for the access width.
    pub unsafe fn relocated(base: *mut u8) -> Self {
        MmioBus { base: base as usize }
    }

    fn at(&self, address: u32) -> usize {
        self.base.wrapping_add(address as usize)
    }
}

impl RegisterAccess for MmioBus {
    fn read(&mut self, address: u32, width: Width) -> u32 {
        let addr = self.at(address);
        // SAFETY: validity of the address is the constructor's contract
        unsafe {
            match width {
                Width::Byte => ptr::read_volatile(addr as *const u8) as u32,
                Width::Word => ptr::read_volatile(addr as *const u16) as u32,
                Width::Long => ptr::read_volatile(addr as *const u32),
            }
        }
    }

    fn write(&mut self, address: u32, width: Width, value: u32) {
        let addr = self.at(address);
        // SAFETY: see read
        unsafe {
            match width {
                Width::Byte => ptr::write_volatile(addr as *mut u8, value as u8),
                Width::Word => ptr::write_volatile(addr as *mut u16, value as u16),
                Width::Long => ptr::write_volatile(addr as *mut u32, value),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relocated_bus_reads_and_writes_through_the_window() {
        let mut window = vec![0u32; 16];
        let mut bus = unsafe { MmioBus::relocated(window.as_mut_ptr() as *mut u8) };

        bus.write_long(8, 0xDEAD_BEEF);
        assert_eq!(bus.read_long(8), 0xDEAD_BEEF);

        bus.write_word(4, 0x1234);
        assert_eq!(bus.read_word(4), 0x1234);

        bus.write_byte(0, 0x5A);
        assert_eq!(bus.read_byte(0), 0x5A);

        drop(bus);
        assert_eq!(window[2], 0xDEAD_BEEF);
    }

    #[test]
    fn width_masks() {
        assert_eq!(Width::Byte.mask(), 0xFF);
        assert_eq!(Width::Word.mask(), 0xFFFF);
        assert_eq!(Width::Long.mask(), u32::MAX);
    }
}
