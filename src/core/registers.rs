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

//! The 32-register LEGv8 general-purpose register file.

use serde::{Deserialize, Serialize};

/// Reset value of the stack pointer (X28 / SP).
pub const INITIAL_SP: u64 = 0x007F_FFFF_FF00;

/// Index of the zero register. Reads return 0; writes are dropped.
pub const XZR: usize = 31;

/// X0..X30 general-purpose registers plus the hardwired XZR at index 31.
///
/// `read`/`write` accept either a bare index (`0..=31`) or one of the
/// named aliases (`SP`, `FP`, `LR`, `XZR`) resolved via [`resolve_name`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterFile {
    regs: [u64; 32],
}

impl RegisterFile {
    /// Builds a register file in its post-reset state: SP = [`INITIAL_SP`],
    /// everything else zero.
    pub fn new() -> Self {
        let mut regs = [0u64; 32];
        regs[28] = INITIAL_SP;
        RegisterFile { regs }
    }

    /// Reads a register by index. Index 31 (XZR) always reads as 0.
    pub fn read(&self, index: usize) -> u64 {
        if index == XZR {
            0
        } else {
            self.regs[index]
        }
    }

    /// Writes a register by index. Writes to index 31 (XZR) are silently
    /// discarded.
    pub fn write(&mut self, index: usize, value: u64) {
        if index != XZR {
            self.regs[index] = value;
        }
    }

    /// Restores the post-reset state (see [`RegisterFile::new`]).
    pub fn reset(&mut self) {
        *self = RegisterFile::new();
    }

    /// Returns a deep copy of the current register contents for snapshotting.
    pub fn snapshot(&self) -> RegisterFile {
        self.clone()
    }

    /// Replaces the live register contents with a previously captured
    /// snapshot.
    pub fn restore(&mut self, snapshot: &RegisterFile) {
        self.regs = snapshot.regs;
    }
}

impl Default for RegisterFile {
    fn default() -> Self {
        RegisterFile::new()
    }
}

/// Resolves a register name (`X0`..`X30`, `XZR`, `SP`, `FP`, `LR`,
/// case-insensitive) to its register-file index, or `None` if it is not a
/// recognized name.
pub fn resolve_name(name: &str) -> Option<usize> {
    let name = name.trim();
    let upper = name.to_ascii_uppercase();
    match upper.as_str() {
        "XZR" => Some(XZR),
        "SP" => Some(28),
        "FP" => Some(29),
        "LR" => Some(30),
        _ => {
            let digits = upper.strip_prefix('X')?;
            let index: usize = digits.parse().ok()?;
            if index <= 31 {
                Some(index)
            } else {
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_state_matches_spec() {
        let rf = RegisterFile::new();
        assert_eq!(rf.read(28), INITIAL_SP);
        for i in 0..28 {
            assert_eq!(rf.read(i), 0);
        }
        assert_eq!(rf.read(XZR), 0);
    }

    #[test]
    fn xzr_write_is_dropped() {
        let mut rf = RegisterFile::new();
        rf.write(XZR, 0xDEAD_BEEF);
        assert_eq!(rf.read(XZR), 0);
    }

    #[test]
    fn write_then_read_round_trips() {
        let mut rf = RegisterFile::new();
        rf.write(5, 42);
        assert_eq!(rf.read(5), 42);
    }

    #[test]
    fn aliases_resolve_to_expected_indices() {
        assert_eq!(resolve_name("sp"), Some(28));
        assert_eq!(resolve_name("FP"), Some(29));
        assert_eq!(resolve_name("Lr"), Some(30));
        assert_eq!(resolve_name("XZR"), Some(XZR));
        assert_eq!(resolve_name("X3"), Some(3));
        assert_eq!(resolve_name("X32"), None);
        assert_eq!(resolve_name("bogus"), None);
    }

    #[test]
    fn snapshot_restore_round_trips() {
        let mut rf = RegisterFile::new();
        rf.write(1, 5);
        let snap = rf.snapshot();
        rf.write(1, 99);
        rf.restore(&snap);
        assert_eq!(rf.read(1), 5);
    }
}
