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

//! The micro-step driver: a five-stage state machine that replaces the
//! reference implementation's generator-with-live-locals shape. Per
//! instruction working values live in [`InstructionWork`], owned by the
//! driver for the duration of one instruction and mutated only at the
//! stage designated to write each field.

use std::collections::HashMap;

use log::{debug, trace};
use serde::{Deserialize, Serialize};

use crate::core::bits::pc_plus_4;
use crate::core::control::{ControlBundle, ControlUnit};
use crate::core::decode::{decode, DecodedRecord, RegOrShamt};
use crate::core::error::EmulatorError;
use crate::core::execute::{execute, memory, writeback_destination};
use crate::core::flags::FlagsRegister;
use crate::core::memory::{DataMemory, InstructionMemory};
use crate::core::registers::RegisterFile;

/// The structured output of a single micro-step, suitable for a
/// visualization layer to render. The block/wire-name vocabulary is owned
/// by that layer, not this crate, so they are plain `String`s rather than
/// a closed enum.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceRecord {
    pub stage: String,
    pub micro_step_index: usize,
    pub log: String,
    pub active_blocks: Vec<String>,
    pub active_paths: Vec<String>,
    pub animated_signals: HashMap<String, String>,
    pub control_signals: Option<ControlBundle>,
}

/// The result of a single `step()` call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StepOutcome {
    /// An intermediate stage (0-3) completed.
    MicroStep { record: TraceRecord },
    /// Stage 4 (Write-Back/PC update) just finished.
    InstructionComplete {
        record: TraceRecord,
        next_pc: u64,
        next_instruction_text: Option<String>,
    },
    /// PC has left instruction memory; no instruction to fetch.
    ProgramFinished { reason: String },
    /// Execution aborted; simulation is halted until `reset()`/`load()`.
    Error { kind: String, message: String },
}

/// Per-instruction scratch state, live for micro-steps 0..=4 of one
/// instruction and discarded on `InstructionComplete` or `Error`.
#[derive(Debug, Clone, Default)]
struct InstructionWork {
    pc_of_instruction: u64,
    pc_plus_4: u64,
    raw_text: String,
    processed_text: String,
    record: Option<DecodedRecord>,
    control: Option<ControlBundle>,
    operand1: u64,
    operand2: u64,
    store_value: u64,
    alu_value: u64,
    alu_zero: bool,
    branch_target: Option<u64>,
    mem_value: Option<u64>,
    destination: Option<usize>,
}

/// The five-stage micro-step state machine.
pub struct Driver {
    micro_step_index: usize,
    work: InstructionWork,
    halted: bool,
}

impl Driver {
    pub fn new() -> Self {
        Driver {
            micro_step_index: 0,
            work: InstructionWork::default(),
            halted: false,
        }
    }

    /// Resets the driver to "about to start a fresh instruction".
    pub fn reset(&mut self) {
        self.micro_step_index = 0;
        self.work = InstructionWork::default();
        self.halted = false;
    }

    /// True if the driver is at the start of a new instruction (no partial
    /// micro-step is in flight). History snapshots are only valid here.
    pub fn at_instruction_boundary(&self) -> bool {
        self.micro_step_index == 0 && !self.halted
    }

    fn error_outcome(&mut self, err: EmulatorError) -> StepOutcome {
        self.halted = true;
        let kind = match &err {
            EmulatorError::SyntaxError { .. } => "SyntaxError",
            EmulatorError::ArithmeticError { .. } => "ArithmeticError",
            EmulatorError::MemoryAccess { .. } => "MemoryAccess",
            EmulatorError::InstructionFetch { .. } => "InstructionFetch",
            EmulatorError::RegisterWrite { .. } => "RegisterWrite",
            EmulatorError::LoadError { .. } => "LoadError",
            EmulatorError::NotLoaded => "NotLoaded",
            EmulatorError::ProgramFinished { .. } => "ProgramFinished",
            EmulatorError::IoError { .. } => "IoError",
        }
        .to_string();
        StepOutcome::Error {
            kind,
            message: err.to_string(),
        }
    }

    /// Drives the state machine forward by one micro-step.
    #[allow(clippy::too_many_arguments)]
    pub fn step(
        &mut self,
        pc: &mut u64,
        regs: &mut RegisterFile,
        data_memory: &mut DataMemory,
        flags: &mut FlagsRegister,
        instructions: &InstructionMemory,
    ) -> StepOutcome {
        if self.halted {
            return StepOutcome::Error {
                kind: "NotLoaded".to_string(),
                message: EmulatorError::NotLoaded.to_string(),
            };
        }

        match self.micro_step_index {
            0 => self.stage_fetch(pc, instructions),
            1 => self.stage_decode(&*regs),
            2 => self.stage_execute(flags),
            3 => self.stage_memory(data_memory),
            4 => self.stage_writeback(pc, regs, instructions, &*flags),
            _ => unreachable!("micro-step index out of range"),
        }
    }

    fn stage_fetch(&mut self, pc: &mut u64, instructions: &InstructionMemory) -> StepOutcome {
        let entry = match instructions.get(*pc) {
            Some(entry) => entry,
            None => {
                if instructions.is_empty() || *pc >= instructions.end_address() {
                    self.halted = true;
                    return StepOutcome::ProgramFinished {
                        reason: format!("PC=0x{:016X} has no instruction", *pc),
                    };
                }
                return self.error_outcome(EmulatorError::InstructionFetch { address: *pc });
            }
        };

        self.work = InstructionWork {
            pc_of_instruction: *pc,
            pc_plus_4: pc_plus_4(*pc),
            raw_text: entry.raw.clone(),
            processed_text: entry.processed.clone(),
            ..Default::default()
        };

        trace!("fetch: pc=0x{:016X} instr='{}'", pc, self.work.raw_text);
        let record = TraceRecord {
            stage: "Fetch".to_string(),
            micro_step_index: 0,
            log: format!("fetched '{}' at 0x{:016X}", self.work.raw_text, *pc),
            active_blocks: vec!["PC".to_string(), "InstructionMemory".to_string()],
            active_paths: vec!["pc_plus_4".to_string()],
            animated_signals: HashMap::from([(
                "pc".to_string(),
                format!("0x{:016X}", self.work.pc_of_instruction),
            )]),
            control_signals: None,
        };
        self.micro_step_index = 1;
        StepOutcome::MicroStep { record }
    }

    fn stage_decode(&mut self, regs: &RegisterFile) -> StepOutcome {
        let decoded = match decode(&self.work.processed_text) {
            Ok(record) => record,
            Err(err) => return self.error_outcome(err),
        };
        let control = ControlUnit::lookup(decoded.opcode());

        let (operand1, operand2, store_value) = match &decoded {
            DecodedRecord::R { rn, rm, .. } => {
                let op1 = regs.read(*rn);
                let op2 = match rm {
                    RegOrShamt::Reg(idx) => regs.read(*idx),
                    RegOrShamt::Shamt(v) => *v as u64,
                };
                (op1, op2, 0)
            }
            DecodedRecord::I { rn, imm, .. } => (regs.read(*rn), *imm as u64, 0),
            DecodedRecord::DLoad { rn, imm, .. } => (regs.read(*rn), *imm as u64, 0),
            DecodedRecord::DStore { rn, rt, imm, .. } => {
                (regs.read(*rn), *imm as u64, regs.read(*rt))
            }
            DecodedRecord::Cb { rt, .. } => (regs.read(*rt), 0, 0),
            DecodedRecord::B { .. } | DecodedRecord::CondB { .. } | DecodedRecord::Nop => {
                (0, 0, 0)
            }
        };

        self.work.operand1 = operand1;
        self.work.operand2 = operand2;
        self.work.store_value = store_value;
        let opcode = decoded.opcode().to_string();
        self.work.record = Some(decoded);
        self.work.control = Some(control);

        debug!("decode: opcode={} control={:?}", opcode, control);
        let record = TraceRecord {
            stage: "Decode".to_string(),
            micro_step_index: 1,
            log: format!("decoded '{}' ({})", self.work.raw_text, opcode),
            active_blocks: vec!["Control".to_string(), "Registers".to_string()],
            active_paths: vec!["reg_read_1".to_string(), "reg_read_2".to_string()],
            animated_signals: HashMap::from([
                ("operand1".to_string(), format!("0x{:X}", operand1)),
                ("operand2".to_string(), format!("0x{:X}", operand2)),
            ]),
            control_signals: Some(control),
        };
        self.micro_step_index = 2;
        StepOutcome::MicroStep { record }
    }

    fn stage_execute(&mut self, flags: &mut FlagsRegister) -> StepOutcome {
        let decoded = self.work.record.as_ref().expect("decode ran first");
        let control = self.work.control.expect("decode ran first");

        // `operand2` was already resolved to the correct ALUSrc-mux input
        // (register value or sign-extended immediate/shift-amount) during
        // Decode/Register-read, per format.
        let outcome = match execute(
            decoded,
            &control,
            self.work.operand1,
            self.work.operand2,
            self.work.pc_of_instruction,
        ) {
            Ok(outcome) => outcome,
            Err(err) => return self.error_outcome(err),
        };

        if control.flag_write {
            if let Some(alu_result) = &outcome.alu_result {
                flags.update(alu_result);
            }
        }

        let alu_op = crate::core::alu::alu_op_for_mnemonic(decoded.opcode());

        self.work.alu_value = outcome.alu_value;
        self.work.alu_zero = outcome.alu_zero;
        self.work.branch_target = outcome.branch_target;

        let mut animated_signals = HashMap::from([(
            "alu_result".to_string(),
            format!("0x{:X}", outcome.alu_value),
        )]);
        if let Some(alu_op) = alu_op {
            animated_signals.insert(
                "alu_control_bits".to_string(),
                alu_op.control_bits().to_string(),
            );
        }

        let record = TraceRecord {
            stage: "Execute".to_string(),
            micro_step_index: 2,
            log: format!(
                "execute '{}' -> 0x{:X} (zero={})",
                self.work.raw_text, outcome.alu_value, outcome.alu_zero
            ),
            active_blocks: vec!["ALU".to_string()],
            active_paths: vec!["alu_src_mux".to_string()],
            animated_signals,
            control_signals: Some(control),
        };
        self.micro_step_index = 3;
        StepOutcome::MicroStep { record }
    }

    fn stage_memory(&mut self, data_memory: &mut DataMemory) -> StepOutcome {
        let control = self.work.control.expect("decode ran first");
        let mem_value = memory(
            &control,
            self.work.alu_value,
            self.work.store_value,
            data_memory,
        );
        self.work.mem_value = mem_value;

        let record = TraceRecord {
            stage: "Memory".to_string(),
            micro_step_index: 3,
            log: match mem_value {
                Some(value) => format!("loaded 0x{:X} from 0x{:X}", value, self.work.alu_value),
                None if control.mem_write => {
                    format!("stored 0x{:X} at 0x{:X}", self.work.store_value, self.work.alu_value)
                }
                None => "memory stage not active".to_string(),
            },
            active_blocks: if control.mem_read || control.mem_write {
                vec!["DataMemory".to_string()]
            } else {
                vec![]
            },
            active_paths: vec![],
            animated_signals: HashMap::new(),
            control_signals: Some(control),
        };
        self.micro_step_index = 4;
        StepOutcome::MicroStep { record }
    }

    fn stage_writeback(
        &mut self,
        pc: &mut u64,
        regs: &mut RegisterFile,
        instructions: &InstructionMemory,
        flags: &FlagsRegister,
    ) -> StepOutcome {
        let decoded = self.work.record.as_ref().expect("decode ran first");
        let control = self.work.control.expect("decode ran first");

        let write_value = match control.mem_to_reg {
            crate::core::control::MemToReg::Memory => self.work.mem_value.unwrap_or(0),
            crate::core::control::MemToReg::Alu => self.work.alu_value,
            crate::core::control::MemToReg::None => 0,
        };
        self.work.destination = writeback_destination(decoded, &control);
        if let Some(dest) = self.work.destination {
            regs.write(dest, write_value);
        }

        let flag_taken = if control.flag_branch {
            if let DecodedRecord::CondB { cond, .. } = decoded {
                flags.evaluate(cond).unwrap_or(false)
            } else {
                false
            }
        } else {
            false
        };

        let pc_src = control.uncond_branch
            || (control.branch && self.work.alu_zero == cbz_zero_target(decoded))
            || (control.flag_branch && flag_taken);

        let next_pc = if pc_src {
            self.work.branch_target.unwrap_or(self.work.pc_plus_4)
        } else {
            self.work.pc_plus_4
        };
        *pc = next_pc;

        debug!("writeback: dest={:?} value=0x{:X} next_pc=0x{:016X}", self.work.destination, write_value, next_pc);
        let record = TraceRecord {
            stage: "WriteBack".to_string(),
            micro_step_index: 4,
            log: format!("writeback, next pc=0x{:016X}", next_pc),
            active_blocks: vec!["Registers".to_string(), "PC".to_string()],
            active_paths: vec!["mem_to_reg_mux".to_string(), "pc_src_mux".to_string()],
            animated_signals: HashMap::from([(
                "next_pc".to_string(),
                format!("0x{:016X}", next_pc),
            )]),
            control_signals: Some(control),
        };

        let next_text = instructions.get(next_pc).map(|entry| entry.processed.clone());
        self.micro_step_index = 0;
        self.work = InstructionWork::default();
        StepOutcome::InstructionComplete {
            record,
            next_pc,
            next_instruction_text: next_text,
        }
    }
}

impl Default for Driver {
    fn default() -> Self {
        Driver::new()
    }
}

/// CBZ/CBNZ take the branch when the tested register is (zero / nonzero)
/// respectively; this maps the decoded opcode to which ALU-zero reading
/// means "take the branch".
fn cbz_zero_target(decoded: &DecodedRecord) -> bool {
    match decoded {
        DecodedRecord::Cb { opcode, .. } => opcode != "CBNZ",
        _ => false,
    }
}
