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

//! The control unit: a static opcode -> control-signal-bundle table,
//! grounded verbatim in the original's `ControlUnit.INSTRUCTION_TABLE` where
//! it defines an opcode, and extended consistently for the mnemonics it
//! omits (`ADDS`/`SUBS`/`ANDS`, the ten conditional branches, `LSL`/`LSR`).

use log::warn;
use serde::{Deserialize, Serialize};

/// The WB-mux selector: which value is written back to the register file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MemToReg {
    /// Write the ALU result.
    Alu,
    /// Write the value read from data memory.
    Memory,
    /// No register is written (`RegWrite = 0`).
    None,
}

/// The control unit's coarse ALUOp classification, shown in traces. The
/// actual ALU operation used by the Execute handler comes from
/// [`crate::core::alu::alu_op_for_mnemonic`], which is more precise than
/// this three-way split; this field exists to mirror the original's
/// `ALUOp` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ControlAluOp {
    /// R-format: the ALU operation is chosen by the instruction itself.
    RTypeDispatch,
    /// I-format and loads/stores: always an add.
    ImmediateAdd,
    /// CBZ/CBNZ: a subtract used only for its zero flag.
    BranchCompare,
    /// Unconditional branch, flag-driven branch, or NOP: the ALU is unused.
    None,
}

/// The full set of control signals the control unit emits for one opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlBundle {
    pub reg_write: bool,
    pub alu_src: bool,
    pub mem_read: bool,
    pub mem_write: bool,
    pub mem_to_reg: MemToReg,
    pub branch: bool,
    pub uncond_branch: bool,
    pub flag_branch: bool,
    pub flag_write: bool,
    pub reg2_loc: bool,
    pub alu_op: ControlAluOp,
}

impl ControlBundle {
    const fn r_type(flag_write: bool) -> Self {
        ControlBundle {
            reg_write: true,
            alu_src: false,
            mem_read: false,
            mem_write: false,
            mem_to_reg: MemToReg::Alu,
            branch: false,
            uncond_branch: false,
            flag_branch: false,
            flag_write,
            reg2_loc: false,
            alu_op: ControlAluOp::RTypeDispatch,
        }
    }

    const fn i_type(flag_write: bool) -> Self {
        ControlBundle {
            reg_write: true,
            alu_src: true,
            mem_read: false,
            mem_write: false,
            mem_to_reg: MemToReg::Alu,
            branch: false,
            uncond_branch: false,
            flag_branch: false,
            flag_write,
            reg2_loc: false,
            alu_op: ControlAluOp::ImmediateAdd,
        }
    }

    const fn load() -> Self {
        ControlBundle {
            reg_write: true,
            alu_src: true,
            mem_read: true,
            mem_write: false,
            mem_to_reg: MemToReg::Memory,
            branch: false,
            uncond_branch: false,
            flag_branch: false,
            flag_write: false,
            reg2_loc: false,
            alu_op: ControlAluOp::ImmediateAdd,
        }
    }

    const fn store() -> Self {
        ControlBundle {
            reg_write: false,
            alu_src: true,
            mem_read: false,
            mem_write: true,
            mem_to_reg: MemToReg::None,
            branch: false,
            uncond_branch: false,
            flag_branch: false,
            flag_write: false,
            reg2_loc: true,
            alu_op: ControlAluOp::ImmediateAdd,
        }
    }

    const fn cbranch() -> Self {
        ControlBundle {
            reg_write: false,
            alu_src: false,
            mem_read: false,
            mem_write: false,
            mem_to_reg: MemToReg::None,
            branch: true,
            uncond_branch: false,
            flag_branch: false,
            flag_write: false,
            reg2_loc: false,
            alu_op: ControlAluOp::BranchCompare,
        }
    }

    const fn ubranch() -> Self {
        ControlBundle {
            reg_write: false,
            alu_src: false,
            mem_read: false,
            mem_write: false,
            mem_to_reg: MemToReg::None,
            branch: false,
            uncond_branch: true,
            flag_branch: false,
            flag_write: false,
            reg2_loc: false,
            alu_op: ControlAluOp::None,
        }
    }

    const fn fbranch() -> Self {
        ControlBundle {
            reg_write: false,
            alu_src: false,
            mem_read: false,
            mem_write: false,
            mem_to_reg: MemToReg::None,
            branch: false,
            uncond_branch: false,
            flag_branch: true,
            flag_write: false,
            reg2_loc: false,
            alu_op: ControlAluOp::None,
        }
    }

    const fn nop() -> Self {
        ControlBundle {
            reg_write: false,
            alu_src: false,
            mem_read: false,
            mem_write: false,
            mem_to_reg: MemToReg::None,
            branch: false,
            uncond_branch: false,
            flag_branch: false,
            flag_write: false,
            reg2_loc: false,
            alu_op: ControlAluOp::None,
        }
    }
}

const COND_BRANCHES: &[&str] = &[
    "B.EQ", "B.NE", "B.LT", "B.LE", "B.GT", "B.GE", "B.LO", "B.LS", "B.HI", "B.HS",
];

/// Static opcode -> control-bundle lookup.
pub struct ControlUnit;

impl ControlUnit {
    /// Looks up the control bundle for `opcode` (case-insensitive). Unknown
    /// opcodes default to NOP-equivalent signals and log a warning rather
    /// than failing — matching the original's tolerant lookup.
    pub fn lookup(opcode: &str) -> ControlBundle {
        let upper = opcode.to_ascii_uppercase();
        match upper.as_str() {
            "ADD" | "SUB" | "AND" | "ORR" | "EOR" | "MUL" | "DIV" | "LSL" | "LSR" => {
                ControlBundle::r_type(false)
            }
            "ADDS" | "SUBS" | "ANDS" => ControlBundle::r_type(true),
            "ADDI" | "SUBI" | "ANDI" | "ORRI" | "EORI" => ControlBundle::i_type(false),
            "ADDIS" | "SUBIS" => ControlBundle::i_type(true),
            "LDUR" => ControlBundle::load(),
            "STUR" => ControlBundle::store(),
            "CBZ" | "CBNZ" => ControlBundle::cbranch(),
            "B" => ControlBundle::ubranch(),
            "NOP" => ControlBundle::nop(),
            other if COND_BRANCHES.contains(&other) => ControlBundle::fbranch(),
            _ => {
                warn!("unknown opcode '{}': treating as NOP", opcode);
                ControlBundle::nop()
            }
        }
    }
}
