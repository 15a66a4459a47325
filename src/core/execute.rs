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

//! Execute, Memory and Write-Back stage handlers, dispatched over the
//! decoded record rather than a binary opcode/funct pair (generalized from
//! the teacher's `execute_instruction`/`execute_special` match dispatch).

use crate::core::alu::{alu_op_for_mnemonic, Alu, AluResult};
use crate::core::bits::branch_target;
use crate::core::control::{ControlAluOp, ControlBundle};
use crate::core::decode::DecodedRecord;
use crate::core::error::{EmulatorError, Result};
use crate::core::memory::DataMemory;

/// Everything the Execute stage produces for one instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecuteOutcome {
    /// The value the Memory/WriteBack stages see as "the ALU result".
    pub alu_value: u64,
    /// The ALU's zero flag output, used by CBZ/CBNZ regardless of `FlagWrite`.
    pub alu_zero: bool,
    /// Full NZCV computation, present only when the ALU actually ran
    /// (absent for unconditional/flag-driven branches and NOP).
    pub alu_result: Option<AluResult>,
    /// The branch target, present for `B`, `B.cond`, and taken `CBZ`/`CBNZ`.
    pub branch_target: Option<u64>,
}

/// Runs the Execute stage.
///
/// `alu_input1`/`alu_input2` are the already-mux-selected ALU operands: the
/// driver resolves the ALUSrc and Reg2Loc muxes before calling this.
/// `pc_of_instruction` is the address of the instruction being executed
/// (not PC+4), used for branch-target computation.
pub fn execute(
    record: &DecodedRecord,
    control: &ControlBundle,
    alu_input1: u64,
    alu_input2: u64,
    pc_of_instruction: u64,
) -> Result<ExecuteOutcome> {
    match control.alu_op {
        ControlAluOp::None => {
            let target = match record {
                DecodedRecord::B { offset } => Some(branch_target(pc_of_instruction, *offset)),
                DecodedRecord::CondB { offset, .. } => {
                    Some(branch_target(pc_of_instruction, *offset))
                }
                _ => None,
            };
            Ok(ExecuteOutcome {
                alu_value: 0,
                alu_zero: false,
                alu_result: None,
                branch_target: target,
            })
        }
        ControlAluOp::RTypeDispatch | ControlAluOp::ImmediateAdd | ControlAluOp::BranchCompare => {
            let op = alu_op_for_mnemonic(record.opcode()).ok_or_else(|| {
                EmulatorError::ArithmeticError {
                    message: format!("no ALU operation defined for '{}'", record.opcode()),
                }
            })?;
            let result = Alu::execute(alu_input1, alu_input2, op)?;
            let target = if let DecodedRecord::Cb { offset, .. } = record {
                Some(branch_target(pc_of_instruction, *offset))
            } else {
                None
            };
            Ok(ExecuteOutcome {
                alu_value: result.value,
                alu_zero: result.zero,
                alu_result: Some(result),
                branch_target: target,
            })
        }
    }
}

/// Runs the Memory stage. Returns the loaded word for LDUR; `None` for
/// every other instruction (STUR writes immediately and returns nothing).
pub fn memory(
    control: &ControlBundle,
    address: u64,
    store_value: u64,
    data_memory: &mut DataMemory,
) -> Option<u64> {
    if control.mem_write {
        data_memory.write_word(address, store_value);
        None
    } else if control.mem_read {
        Some(data_memory.read_word(address))
    } else {
        None
    }
}

/// Identifies the Write-Back destination register, if any. The handler
/// only describes intent; the driver performs the actual register write.
pub fn writeback_destination(record: &DecodedRecord, control: &ControlBundle) -> Option<usize> {
    if !control.reg_write {
        return None;
    }
    match record {
        DecodedRecord::R { rd, .. } => Some(*rd),
        DecodedRecord::I { rd, .. } => Some(*rd),
        DecodedRecord::DLoad { rt, .. } => Some(*rt),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::control::ControlUnit;
    use crate::core::decode::decode;

    #[test]
    fn r_type_add_executes() {
        let record = decode("ADD X3, X1, X2").unwrap();
        let control = ControlUnit::lookup("ADD");
        let outcome = execute(&record, &control, 5, 7, 0).unwrap();
        assert_eq!(outcome.alu_value, 12);
        assert!(outcome.alu_result.is_some());
        assert_eq!(outcome.branch_target, None);
    }

    #[test]
    fn unconditional_branch_computes_target() {
        let record = decode("B 8").unwrap();
        let control = ControlUnit::lookup("B");
        let outcome = execute(&record, &control, 0, 0, 0x10).unwrap();
        assert_eq!(outcome.branch_target, Some(0x18));
        assert!(outcome.alu_result.is_none());
    }

    #[test]
    fn cbz_computes_target_and_zero_flag() {
        let record = decode("CBZ X1, 8").unwrap();
        let control = ControlUnit::lookup("CBZ");
        let outcome = execute(&record, &control, 0, 0, 0x10).unwrap();
        assert!(outcome.alu_zero);
        assert_eq!(outcome.branch_target, Some(0x18));
    }

    #[test]
    fn memory_stage_writes_then_reads_back() {
        let control = ControlUnit::lookup("STUR");
        let mut mem = DataMemory::new();
        assert_eq!(memory(&control, 0x100, 42, &mut mem), None);
        assert_eq!(mem.read_word(0x100), 42);

        let load_control = ControlUnit::lookup("LDUR");
        assert_eq!(memory(&load_control, 0x100, 0, &mut mem), Some(42));
    }

    #[test]
    fn writeback_destination_follows_reg_write() {
        let record = decode("ADDI X1, XZR, #5").unwrap();
        let control = ControlUnit::lookup("ADDI");
        assert_eq!(writeback_destination(&record, &control), Some(1));

        let store = decode("STUR X1, [SP, #0]").unwrap();
        let store_control = ControlUnit::lookup("STUR");
        assert_eq!(writeback_destination(&store, &store_control), None);
    }
}
