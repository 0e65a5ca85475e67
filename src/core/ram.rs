//! Sparse byte-addressable memory.
//!
//! Covers the full 32-bit address space; any byte never written reads as
//! zero. Accesses are little-endian and 1, 2 or 4 bytes wide, with the
//! width decoded from the two-bit `memSize` line through a truth table.
//! Sub-word loads are sign- or zero-extended to 32 bits under the
//! `memUnsigned` control; word loads fill the bus and ignore it.

use std::collections::BTreeMap;

use super::wires::Wires;
use super::Component;
use crate::common::{Bits, SimError, TruthTable};

#[cfg(feature = "strict-align")]
use super::wires::MemAddrSrc;

pub struct Ram {
    bytes: BTreeMap<u32, u8>,
    out: Bits,
    sizes: TruthTable<u32>,
}

impl Ram {
    pub fn new() -> Self {
        let sizes = TruthTable::new(&[2])
            .row(&["00"], 1)
            .row(&["01"], 2)
            .row(&["10"], 4);
        Self {
            bytes: BTreeMap::new(),
            out: Bits::zero(32),
            sizes,
        }
    }

    /// Reads `size` bytes at `addr`, little-endian, unwritten bytes zero.
    pub fn load(&self, addr: u32, size: u32) -> u32 {
        let mut value = 0u32;
        for k in (0..size).rev() {
            let byte = self
                .bytes
                .get(&addr.wrapping_add(k))
                .copied()
                .unwrap_or(0);
            value = (value << 8) | byte as u32;
        }
        value
    }

    /// Writes the low `size` bytes of `value` at `addr`, little-endian.
    pub fn store(&mut self, addr: u32, size: u32, value: u32) {
        for k in 0..size {
            self.bytes
                .insert(addr.wrapping_add(k), (value >> (8 * k)) as u8);
        }
    }

    /// Writes a byte slice starting at `addr`.
    pub fn store_bytes(&mut self, addr: u32, data: &[u8]) {
        for (k, byte) in data.iter().enumerate() {
            self.bytes.insert(addr.wrapping_add(k as u32), *byte);
        }
    }

    /// Iterates over every explicitly written byte in address order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, u8)> + '_ {
        self.bytes.iter().map(|(addr, byte)| (*addr, *byte))
    }
}

impl Default for Ram {
    fn default() -> Self {
        Self::new()
    }
}

impl Component for Ram {
    fn rising_edge(&mut self, w: &mut Wires) -> Result<(), SimError> {
        let addr = w.mem_address.to_u64() as u32;
        let size = *self
            .sizes
            .lookup(&[w.mem_size])
            .expect("memSize truth table");

        #[cfg(feature = "strict-align")]
        if w.mem_addr_src == MemAddrSrc::AluOut && addr % size != 0 {
            return Err(SimError::MisalignedAccess { addr, size });
        }

        if w.mem_write {
            self.store(addr, size, w.read_data2.to_u64() as u32);
        }

        let raw = self.load(addr, size);
        let value = if size == 4 || w.mem_unsigned {
            raw
        } else {
            Bits::unsigned(raw as u64, 8 * size)
                .sign_extend(32)
                .to_u64() as u32
        };
        self.out = Bits::unsigned(value as u64, 32);
        Ok(())
    }

    fn falling_edge(&mut self, w: &mut Wires) {
        w.mem_read_data = self.out;
    }
}
