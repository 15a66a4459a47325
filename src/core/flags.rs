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

//! The NZCV condition-flags register and conditional-branch predicates.

use serde::{Deserialize, Serialize};

use crate::core::alu::AluResult;

/// N, Z, C, V condition flags. Zero-initialized at reset, matching the
/// original's `FlagsRegister.__init__`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FlagsRegister {
    pub negative: bool,
    pub zero: bool,
    pub carry: bool,
    pub overflow: bool,
}

impl FlagsRegister {
    /// Builds an all-clear flags register.
    pub fn new() -> Self {
        FlagsRegister::default()
    }

    /// Updates N, Z, C from `result`, and V only when the ALU produced an
    /// explicit overflow bit (logical operations report `None`, leaving V
    /// untouched).
    pub fn update(&mut self, result: &AluResult) {
        self.negative = result.negative;
        self.zero = result.zero;
        self.carry = result.carry;
        if let Some(overflow) = result.overflow {
            self.overflow = overflow;
        }
    }

    /// Clears all four flags.
    pub fn reset(&mut self) {
        *self = FlagsRegister::default();
    }

    /// Evaluates a conditional-branch predicate mnemonic (`EQ`, `NE`, `LT`,
    /// `LE`, `GT`, `GE`, `LO`, `LS`, `HI`, `HS`, case-insensitive).
    /// Returns `None` for an unrecognized mnemonic.
    pub fn evaluate(&self, cond: &str) -> Option<bool> {
        let n = self.negative;
        let z = self.zero;
        let c = self.carry;
        let v = self.overflow;
        Some(match cond.to_ascii_uppercase().as_str() {
            "EQ" => z,
            "NE" => !z,
            "LT" => n != v,
            "LE" => z || (n != v),
            "GT" => !z && (n == v),
            "GE" => n == v,
            "LO" => !c,
            "LS" => !c || z,
            "HI" => c && !z,
            "HS" => c,
            _ => return None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_is_all_clear() {
        let flags = FlagsRegister::new();
        assert!(!flags.negative && !flags.zero && !flags.carry && !flags.overflow);
    }

    #[test]
    fn update_sets_nzc_and_v_when_present() {
        let mut flags = FlagsRegister::new();
        let result = AluResult {
            value: 0,
            negative: false,
            zero: true,
            carry: true,
            overflow: Some(true),
        };
        flags.update(&result);
        assert!(flags.zero);
        assert!(flags.carry);
        assert!(flags.overflow);
    }

    #[test]
    fn update_leaves_v_when_none() {
        let mut flags = FlagsRegister::new();
        flags.overflow = true;
        let result = AluResult {
            value: 1,
            negative: false,
            zero: false,
            carry: false,
            overflow: None,
        };
        flags.update(&result);
        assert!(flags.overflow, "logical ops must not clear V");
    }

    #[test]
    fn eq_and_ne_follow_zero() {
        let mut flags = FlagsRegister::new();
        flags.zero = true;
        assert_eq!(flags.evaluate("eq"), Some(true));
        assert_eq!(flags.evaluate("NE"), Some(false));
    }

    #[test]
    fn lo_and_hs_follow_carry() {
        let mut flags = FlagsRegister::new();
        flags.carry = true;
        assert_eq!(flags.evaluate("HS"), Some(true));
        assert_eq!(flags.evaluate("LO"), Some(false));
    }

    #[test]
    fn unknown_condition_is_none() {
        let flags = FlagsRegister::new();
        assert_eq!(flags.evaluate("zz"), None);
    }
}
