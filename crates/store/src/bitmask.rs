//! Byte-indexed write gate.
//!
//! When a bitmask is installed, a write is permitted byte-by-byte: bit
//! `i` (LSB-first within byte `i / 8`) gates byte offset `i`. Bytes past
//! the end of the bitmask buffer are treated as gated off. Reads,
//! deletes, and truncates are never affected.

#[derive(Debug, Default)]
pub(crate) struct BitmaskGate {
    bits: Option<Vec<u8>>,
}

impl BitmaskGate {
    pub fn set(&mut self, buf: Vec<u8>) {
        self.bits = Some(buf);
    }

    pub fn clear(&mut self) {
        self.bits = None;
    }

    /// Whether a write to absolute byte offset `i` is permitted.
    pub fn permits(&self, i: u64) -> bool {
        let Some(buf) = &self.bits else {
            return true;
        };
        let byte_idx = (i / 8) as usize;
        let bit_idx = (i % 8) as u32;
        buf.get(byte_idx)
            .map(|b| b & (1 << bit_idx) != 0)
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_bitmask_permits_everything() {
        let gate = BitmaskGate::default();
        assert!(gate.permits(0));
        assert!(gate.permits(1_000_000));
    }

    #[test]
    fn bits_are_lsb_first_within_byte() {
        let mut gate = BitmaskGate::default();
        gate.set(vec![0b0000_0010]); // bit 1 set -> byte offset 1 permitted
        assert!(!gate.permits(0));
        assert!(gate.permits(1));
        assert!(!gate.permits(2));
    }

    #[test]
    fn bytes_past_buffer_end_are_gated_off() {
        let mut gate = BitmaskGate::default();
        gate.set(vec![0xFF]);
        assert!(gate.permits(7));
        assert!(!gate.permits(8));
    }

    #[test]
    fn clear_restores_unconditional_permission() {
        let mut gate = BitmaskGate::default();
        gate.set(vec![0x00]);
        assert!(!gate.permits(0));
        gate.clear();
        assert!(gate.permits(0));
    }
}
