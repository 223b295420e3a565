use log::debug;

use crate::bus::RegisterAccess;
use crate::hardware::{AgnusFamily, DeniseFamily, PaulaFamily};
use crate::regs;

/// Extra reads used to tell a real Denise id from an OCS Denise driving noise.
const DENISE_STABILITY_READS: usize = 32;

pub fn detect_paula<B: RegisterAccess + ?Sized>(bus: &mut B) -> (PaulaFamily, u16) {
    let rev = bus.read_word(regs::PAULA_ID) & regs::PAULA_ID_MASK;
    let family = match rev {
        0 => PaulaFamily::Original,
        2 => PaulaFamily::Saga,
        _ => PaulaFamily::Unknown,
    };
    debug!("paula rev {rev:#04x}: {}", family.label());
    (family, rev)
}

pub fn detect_denise<B: RegisterAccess + ?Sized>(bus: &mut B, paula: PaulaFamily) -> (DeniseFamily, u16) {
    let first = bus.read_word(regs::DENISE_ID) & 0xFF;
    let stable = (0..DENISE_STABILITY_READS).all(|_| bus.read_word(regs::DENISE_ID) & 0xFF == first);
    let rev = if stable { first } else { 0 };

    let family = if paula == PaulaFamily::Saga {
        DeniseFamily::Isabel
    } else {
        match rev {
            0x00 => DeniseFamily::Ocs,
            0xFC => DeniseFamily::Ecs,
            0xF8 => DeniseFamily::Lisa,
            0xF0 | 0xF1 => DeniseFamily::Monica,
            _ => DeniseFamily::Unknown,
        }
    };
    debug!("denise rev {rev:#04x} (stable: {stable}): {}", family.label());
    (family, rev)
}

pub fn detect_agnus<B: RegisterAccess + ?Sized>(bus: &mut B, paula: PaulaFamily) -> (AgnusFamily, u16) {
    let rev = (bus.read_word(regs::VPOSR) >> regs::AGNUS_ID_SHIFT) & regs::AGNUS_ID_MASK;

    let family = if paula == PaulaFamily::Saga {
        AgnusFamily::Saga
    } else {
        match rev {
            0x00 => AgnusFamily::OcsPal,
            0x10 => AgnusFamily::OcsNtsc,
            0x20 => AgnusFamily::EcsPal,
            0x30 => AgnusFamily::EcsNtsc,
            0x22 | 0x23 => AgnusFamily::AlicePal,
            0x32 | 0x33 => AgnusFamily::AliceNtsc,
            _ => AgnusFamily::Unknown,
        }
    };
    debug!("agnus rev {rev:#04x}: {}", family.label());
    (family, rev)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{Register, ScriptedBus};

    #[test]
    fn paula_revision_masks_bit_zero() {
        let mut bus = ScriptedBus::new(3).with(regs::PAULA_ID, Register::Fixed(0xFF01));
        assert_eq!(detect_paula(&mut bus), (PaulaFamily::Original, 0));

        let mut bus = ScriptedBus::new(3).with(regs::PAULA_ID, Register::Fixed(0x0003));
        assert_eq!(detect_paula(&mut bus), (PaulaFamily::Saga, 2));

        let mut bus = ScriptedBus::new(3).with(regs::PAULA_ID, Register::Fixed(0x0010));
        assert_eq!(detect_paula(&mut bus).0, PaulaFamily::Unknown);
    }

    #[test]
    fn stable_denise_ids_are_decoded() {
        for (id, family) in [
            (0xFFFC, DeniseFamily::Ecs),
            (0xFFF8, DeniseFamily::Lisa),
            (0x00F1, DeniseFamily::Monica),
            (0x0042, DeniseFamily::Unknown),
        ] {
            let mut bus = ScriptedBus::new(3).with(regs::DENISE_ID, Register::Fixed(id));
            assert_eq!(detect_denise(&mut bus, PaulaFamily::Original).0, family);
            assert_eq!(bus.reads_of(regs::DENISE_ID), 1 + DENISE_STABILITY_READS);
        }
    }

    #[test]
    fn a_single_disagreeing_read_means_ocs() {
        let mut values = vec![0xFC; 20];
        values.push(0xF8);
        let mut bus = ScriptedBus::new(3).with(regs::DENISE_ID, Register::sequence(values));
        assert_eq!(detect_denise(&mut bus, PaulaFamily::Original), (DeniseFamily::Ocs, 0));
    }

    #[test]
    fn unmapped_denise_reads_as_ocs() {
        let mut bus = ScriptedBus::new(99);
        assert_eq!(detect_denise(&mut bus, PaulaFamily::Original).0, DeniseFamily::Ocs);
    }

    #[test]
    fn saga_paula_overrides_denise_and_agnus() {
        let mut bus = ScriptedBus::new(3)
            .with(regs::DENISE_ID, Register::Fixed(0xFC))
            .with(regs::VPOSR, Register::Fixed(0x2200));
        assert_eq!(detect_denise(&mut bus, PaulaFamily::Saga).0, DeniseFamily::Isabel);
        assert_eq!(detect_agnus(&mut bus, PaulaFamily::Saga).0, AgnusFamily::Saga);
    }

    #[test]
    fn agnus_ids() {
        for (vposr, family) in [
            (0x0000, AgnusFamily::OcsPal),
            (0x1000, AgnusFamily::OcsNtsc),
            (0x2001, AgnusFamily::EcsPal),
            (0x3000, AgnusFamily::EcsNtsc),
            (0x2300, AgnusFamily::AlicePal),
            (0xB200, AgnusFamily::AliceNtsc),
            (0x4000, AgnusFamily::Unknown),
        ] {
            let mut bus = ScriptedBus::new(3).with(regs::VPOSR, Register::Fixed(vposr));
            assert_eq!(detect_agnus(&mut bus, PaulaFamily::Original).0, family, "vposr {vposr:#06x}");
        }
    }
}
