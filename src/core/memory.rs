// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 itsakeyfut
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Data memory and the three parallel instruction-memory views.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Sparse, byte-addressable data memory presenting 64-bit little-endian
/// word accesses.
///
/// Backed by a `HashMap<u64, u8>` rather than an array: addresses used by
/// LDUR/STUR in practice are sparse (a handful of stack/heap slots), so a
/// hashmap avoids allocating the full address space while keeping reads of
/// untouched bytes at zero.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DataMemory {
    bytes: HashMap<u64, u8>,
}

impl DataMemory {
    /// Builds an empty data memory; every address reads as zero.
    pub fn new() -> Self {
        DataMemory::default()
    }

    /// Reads a little-endian 64-bit word starting at `addr`. Untouched
    /// bytes read as zero. Alignment is not enforced.
    pub fn read_word(&self, addr: u64) -> u64 {
        let mut word = 0u64;
        for i in 0..8u64 {
            let byte = self.bytes.get(&addr.wrapping_add(i)).copied().unwrap_or(0);
            word |= (byte as u64) << (8 * i);
        }
        word
    }

    /// Writes a little-endian 64-bit word starting at `addr`.
    pub fn write_word(&mut self, addr: u64, value: u64) {
        for i in 0..8u64 {
            let byte = ((value >> (8 * i)) & 0xFF) as u8;
            self.bytes.insert(addr.wrapping_add(i), byte);
        }
    }

    /// Clears all stored bytes.
    pub fn reset(&mut self) {
        self.bytes.clear();
    }

    /// Returns every 8-byte-aligned word address that has at least one
    /// non-zero byte, paired with its word value, sorted by address. Used
    /// by the CLI's state dump and by `inspect()`.
    pub fn enumerate_nonzero(&self) -> Vec<(u64, u64)> {
        let mut aligned_addrs: Vec<u64> = self
            .bytes
            .keys()
            .map(|&addr| addr - (addr % 8))
            .collect::<std::collections::BTreeSet<_>>()
            .into_iter()
            .collect();
        aligned_addrs.sort_unstable();
        aligned_addrs
            .into_iter()
            .map(|addr| (addr, self.read_word(addr)))
            .filter(|&(_, word)| word != 0)
            .collect()
    }

    /// Returns a deep copy for snapshotting.
    pub fn snapshot(&self) -> DataMemory {
        self.clone()
    }

    /// Replaces the live contents with a previously captured snapshot.
    pub fn restore(&mut self, snapshot: &DataMemory) {
        self.bytes = snapshot.bytes.clone();
    }
}

/// One instruction as held by the three parallel instruction-memory views.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstructionEntry {
    /// Canonical text with labels already replaced by literal byte offsets —
    /// the form actually executed.
    pub processed: String,
    /// The original source line, kept for display.
    pub raw: String,
    /// An optional 32-bit encoding string; unused mnemonics leave this empty.
    pub binary: Option<String>,
}

/// Instruction memory: three parallel views keyed by 4-byte-aligned byte
/// address. Populated once by the assembler and immutable thereafter.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct InstructionMemory {
    entries: HashMap<u64, InstructionEntry>,
}

impl InstructionMemory {
    /// Builds an empty instruction memory.
    pub fn new() -> Self {
        InstructionMemory::default()
    }

    /// Inserts or replaces the entry at `addr`.
    pub fn insert(&mut self, addr: u64, entry: InstructionEntry) {
        self.entries.insert(addr, entry);
    }

    /// Looks up the entry at `addr`, if any instruction was assembled there.
    pub fn get(&self, addr: u64) -> Option<&InstructionEntry> {
        self.entries.get(&addr)
    }

    /// Total number of assembled instructions.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if no instructions have been loaded.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The byte address one past the highest loaded instruction; `PC`
    /// reaching or exceeding this address means the program has finished.
    pub fn end_address(&self) -> u64 {
        self.entries.keys().max().map_or(0, |max| max + 4)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn word_round_trips_little_endian() {
        let mut mem = DataMemory::new();
        mem.write_word(0x100, 0x0102_0304_0506_0708);
        assert_eq!(mem.read_word(0x100), 0x0102_0304_0506_0708);
    }

    #[test]
    fn uninitialized_reads_are_zero() {
        let mem = DataMemory::new();
        assert_eq!(mem.read_word(0x2000), 0);
    }

    #[test]
    fn enumerate_nonzero_skips_zero_words() {
        let mut mem = DataMemory::new();
        mem.write_word(0x10, 42);
        mem.write_word(0x20, 0);
        assert_eq!(mem.enumerate_nonzero(), vec![(0x10, 42)]);
    }

    #[test]
    fn reset_clears_memory() {
        let mut mem = DataMemory::new();
        mem.write_word(0x10, 42);
        mem.reset();
        assert_eq!(mem.read_word(0x10), 0);
    }

    #[test]
    fn snapshot_restore_round_trips() {
        let mut mem = DataMemory::new();
        mem.write_word(0x10, 42);
        let snap = mem.snapshot();
        mem.write_word(0x10, 99);
        mem.restore(&snap);
        assert_eq!(mem.read_word(0x10), 42);
    }

    #[test]
    fn instruction_memory_end_address_follows_highest_entry() {
        let mut imem = InstructionMemory::new();
        imem.insert(
            0,
            InstructionEntry {
                processed: "ADDI X1, XZR, #5".into(),
                raw: "ADDI X1, XZR, #5".into(),
                binary: None,
            },
        );
        imem.insert(
            4,
            InstructionEntry {
                processed: "ADDI X2, XZR, #7".into(),
                raw: "ADDI X2, XZR, #7".into(),
                binary: None,
            },
        );
        assert_eq!(imem.end_address(), 8);
    }
}
