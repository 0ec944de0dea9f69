//! RAM and ROM storage.
//!
//! Storage lives outside the translator: the bus works out a chip select and
//! a row/column pair, then goes through [`Memory`] to touch the cells.

use crate::core::Component;
use crate::device::sam::RamAddress;

/// Cell accessor for dynamic RAM.
pub trait Memory {
    fn read_cell(&self, bank: u8, row: u8, col: u8) -> u8;
    fn write_cell(&mut self, bank: u8, row: u8, col: u8, data: u8);

    #[inline]
    fn read_at(&self, addr: RamAddress) -> u8 {
        self.read_cell(addr.bank, addr.row, addr.col)
    }

    #[inline]
    fn write_at(&mut self, addr: RamAddress, data: u8) {
        self.write_cell(addr.bank, addr.row, addr.col, data)
    }
}

/// Up to two banks of 256x256 cells.
#[derive(Clone, Debug)]
pub struct Ram {
    cells: Vec<u8>,
    banks: u8,
}

impl Ram {
    pub fn new(banks: u8) -> Self {
        let banks = banks.clamp(1, 2);
        Self {
            cells: vec![0; usize::from(banks) << 16],
            banks,
        }
    }

    pub fn banks(&self) -> u8 {
        self.banks
    }

    #[inline]
    fn index(&self, bank: u8, row: u8, col: u8) -> usize {
        (usize::from(bank % self.banks) << 16) | (usize::from(col) << 8) | usize::from(row)
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.cells
    }

    /// Replace the contents, e.g. from a snapshot. Extra bytes are ignored.
    pub fn load(&mut self, data: &[u8]) {
        let n = data.len().min(self.cells.len());
        self.cells[..n].copy_from_slice(&data[..n]);
    }
}

impl Default for Ram {
    fn default() -> Self {
        Self::new(1)
    }
}

impl Memory for Ram {
    #[inline]
    fn read_cell(&self, bank: u8, row: u8, col: u8) -> u8 {
        self.cells[self.index(bank, row, col)]
    }

    #[inline]
    fn write_cell(&mut self, bank: u8, row: u8, col: u8, data: u8) {
        let i = self.index(bank, row, col);
        self.cells[i] = data;
    }
}

impl Component for Ram {
    fn name(&self) -> &'static str {
        "RAM"
    }

    fn reset(&mut self) {
        // DRAM contents survive a reset
    }
}

/// Read-only image, mirrored across its select window.
#[derive(Clone, Debug, Default)]
pub struct Rom {
    data: Vec<u8>,
}

impl Rom {
    pub fn new(data: Vec<u8>) -> Self {
        Self { data }
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Byte at `offset`, wrapping on the image size. Empty sockets read 0xFF.
    #[inline]
    pub fn read(&self, offset: usize) -> u8 {
        if self.data.is_empty() {
            0xFF
        } else {
            self.data[offset % self.data.len()]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cells_are_distinct_per_bank() {
        let mut ram = Ram::new(2);
        ram.write_cell(0, 1, 2, 0xAA);
        ram.write_cell(1, 1, 2, 0x55);
        assert_eq!(ram.read_cell(0, 1, 2), 0xAA);
        assert_eq!(ram.read_cell(1, 1, 2), 0x55);
        assert_eq!(ram.read_at(RamAddress { bank: 0, row: 1, col: 2 }), 0xAA);
    }

    #[test]
    fn rom_mirrors_and_empty_reads_ff() {
        let rom = Rom::new(vec![1, 2, 3, 4]);
        assert_eq!(rom.read(5), 2);
        assert_eq!(Rom::default().read(0), 0xFF);
    }
}
