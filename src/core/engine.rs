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

//! The engine façade: `load`/`step`/`rewind`/`reset`/`inspect`, grounded in
//! the teacher's `System` façade (`System::new`/`load_bios`/`reset`/`step`)
//! generalized to this simulator's micro-step/instruction-boundary/
//! termination/error distinctions via [`StepOutcome`].

use log::info;
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};

use crate::core::assembler::Assembler;
use crate::core::driver::{Driver, StepOutcome};
use crate::core::error::{EmulatorError, Result};
use crate::core::flags::FlagsRegister;
use crate::core::history::{HistoryEngine, Snapshot};
use crate::core::memory::{DataMemory, InstructionMemory};
use crate::core::registers::RegisterFile;

/// A point-in-time read-only view of the machine, exposed to callers via
/// `inspect()` and to the CLI's `--dump-state` convenience via `Serialize`.
#[derive(Debug, Clone)]
pub struct CpuState {
    pub pc: u64,
    pub registers: [u64; 32],
    pub memory: Vec<(u64, u64)>,
    pub flags: FlagsRegister,
}

impl Serialize for CpuState {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("CpuState", 4)?;
        state.serialize_field("pc", &format!("0x{:016X}", self.pc))?;
        let registers: Vec<String> = self
            .registers
            .iter()
            .map(|v| format!("0x{:016X}", v))
            .collect();
        state.serialize_field("registers", &registers)?;
        let memory: Vec<(String, String)> = self
            .memory
            .iter()
            .map(|(addr, value)| (format!("0x{:016X}", addr), format!("0x{:016X}", value)))
            .collect();
        state.serialize_field("memory", &memory)?;
        state.serialize_field("flags", &self.flags)?;
        state.end()
    }
}

/// The simulator's top-level entry point.
pub struct Engine {
    pc: u64,
    registers: RegisterFile,
    data_memory: DataMemory,
    flags: FlagsRegister,
    instructions: InstructionMemory,
    labels: std::collections::HashMap<String, u64>,
    driver: Driver,
    history: HistoryEngine,
    loaded: bool,
}

impl Engine {
    /// Builds an engine with no program loaded.
    pub fn new() -> Self {
        Engine {
            pc: 0,
            registers: RegisterFile::new(),
            data_memory: DataMemory::new(),
            flags: FlagsRegister::new(),
            instructions: InstructionMemory::new(),
            labels: std::collections::HashMap::new(),
            driver: Driver::new(),
            history: HistoryEngine::new(),
            loaded: false,
        }
    }

    /// Assembles `source` and resets all machine state to post-load
    /// defaults (PC=0, registers/memory/flags/history cleared).
    pub fn load(&mut self, source: &str) -> Result<()> {
        let program = Assembler::assemble(source)?;
        self.instructions = program.instructions;
        self.labels = program.labels;
        self.registers = RegisterFile::new();
        self.data_memory = DataMemory::new();
        self.flags = FlagsRegister::new();
        self.pc = 0;
        self.driver.reset();
        self.history.clear();
        self.loaded = true;
        info!(
            "loaded program: {} instruction(s), {} label(s)",
            self.instructions.len(),
            self.labels.len()
        );
        Ok(())
    }

    fn snapshot_if_boundary(&mut self) {
        if !self.driver.at_instruction_boundary() {
            return;
        }
        let cursor_text = self
            .instructions
            .get(self.pc)
            .map(|entry| entry.raw.clone())
            .unwrap_or_default();
        self.history.push(Snapshot {
            pc: self.pc,
            registers: self.registers.snapshot(),
            data_memory: self.data_memory.snapshot(),
            flags: self.flags,
            labels: self.labels.clone(),
            cursor_address: self.pc,
            cursor_text,
        });
    }

    /// Advances the simulation by one micro-step.
    pub fn step(&mut self) -> Result<StepOutcome> {
        if !self.loaded {
            return Err(EmulatorError::NotLoaded);
        }

        self.snapshot_if_boundary();

        let outcome = self.driver.step(
            &mut self.pc,
            &mut self.registers,
            &mut self.data_memory,
            &mut self.flags,
            &self.instructions,
        );

        if let StepOutcome::Error { .. } = &outcome {
            self.loaded = false;
        }

        Ok(outcome)
    }

    /// Restores the machine to the state captured at the most recent
    /// instruction boundary, discarding the current (possibly partial)
    /// instruction.
    pub fn rewind(&mut self) -> Result<()> {
        let snapshot = self.history.rewind().ok_or(EmulatorError::NotLoaded)?;
        self.history.clear_future();
        self.pc = snapshot.pc;
        self.registers.restore(&snapshot.registers);
        self.data_memory.restore(&snapshot.data_memory);
        self.flags = snapshot.flags;
        self.labels = snapshot.labels;
        self.driver.reset();
        self.loaded = true;
        Ok(())
    }

    /// True if at least one rewind is available.
    pub fn can_rewind(&self) -> bool {
        self.history.can_rewind()
    }

    /// Clears all machine state but keeps the currently assembled program.
    pub fn reset(&mut self) {
        self.registers = RegisterFile::new();
        self.data_memory = DataMemory::new();
        self.flags = FlagsRegister::new();
        self.pc = 0;
        self.driver.reset();
        self.history.clear();
        self.loaded = !self.instructions.is_empty();
    }

    /// A read-only snapshot of the current machine state.
    pub fn inspect(&self) -> CpuState {
        let mut registers = [0u64; 32];
        for (i, slot) in registers.iter_mut().enumerate() {
            *slot = self.registers.read(i);
        }
        CpuState {
            pc: self.pc,
            registers,
            memory: self.data_memory.enumerate_nonzero(),
            flags: self.flags,
        }
    }

    /// Current program counter.
    pub fn pc(&self) -> u64 {
        self.pc
    }

    /// True once a program has been successfully loaded and has not yet
    /// hit a fatal runtime error.
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }
}

impl Default for Engine {
    fn default() -> Self {
        Engine::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_instruction(engine: &mut Engine) -> StepOutcome {
        loop {
            let outcome = engine.step().unwrap();
            if !matches!(outcome, StepOutcome::MicroStep { .. }) {
                return outcome;
            }
        }
    }

    #[test]
    fn simple_arithmetic_scenario() {
        let mut engine = Engine::new();
        engine
            .load("ADDI X1, XZR, #5\nADDI X2, XZR, #7\nADD X3, X1, X2\n")
            .unwrap();
        for _ in 0..3 {
            assert!(matches!(
                run_instruction(&mut engine),
                StepOutcome::InstructionComplete { .. }
            ));
        }
        let state = engine.inspect();
        assert_eq!(state.pc, 0x0C);
        assert_eq!(state.registers[1], 5);
        assert_eq!(state.registers[2], 7);
        assert_eq!(state.registers[3], 12);
    }

    #[test]
    fn memory_round_trip_scenario() {
        let mut engine = Engine::new();
        engine
            .load("ADDI X1, XZR, #42\nSTUR X1, [SP, #0]\nLDUR X2, [SP, #0]\n")
            .unwrap();
        for _ in 0..3 {
            run_instruction(&mut engine);
        }
        let state = engine.inspect();
        assert_eq!(state.registers[2], 0x2A);
        assert_eq!(
            state
                .memory
                .iter()
                .find(|(addr, _)| *addr == crate::core::registers::INITIAL_SP),
            Some(&(crate::core::registers::INITIAL_SP, 0x2A))
        );
    }

    #[test]
    fn rewind_restores_pre_instruction_state() {
        let mut engine = Engine::new();
        engine
            .load("ADDI X1, XZR, #5\nADDI X2, XZR, #7\nADD X3, X1, X2\n")
            .unwrap();
        for _ in 0..3 {
            run_instruction(&mut engine);
        }
        engine.rewind().unwrap();
        let state = engine.inspect();
        assert_eq!(state.pc, 0x08);
        assert_eq!(state.registers[1], 5);
        assert_eq!(state.registers[2], 7);
        assert_eq!(state.registers[3], 0);

        assert!(matches!(
            run_instruction(&mut engine),
            StepOutcome::InstructionComplete { .. }
        ));
        assert_eq!(engine.inspect().registers[3], 12);
    }

    #[test]
    fn divide_by_zero_halts_with_error() {
        let mut engine = Engine::new();
        engine
            .load("ADDI X1, XZR, #10\nADDI X2, XZR, #0\nDIV X3, X1, X2\n")
            .unwrap();
        run_instruction(&mut engine);
        run_instruction(&mut engine);
        let outcome = run_instruction(&mut engine);
        assert!(matches!(outcome, StepOutcome::Error { .. }));
        assert!(engine.step().is_err());
    }

    #[test]
    fn step_before_load_is_not_loaded_error() {
        let mut engine = Engine::new();
        assert_eq!(engine.step().unwrap_err(), EmulatorError::NotLoaded);
    }

    #[test]
    fn load_and_reset_push_no_snapshot_of_their_own() {
        let mut engine = Engine::new();
        engine
            .load("ADDI X1, XZR, #5\nADDI X2, XZR, #7\n")
            .unwrap();
        assert_eq!(engine.history.len(), 0);

        run_instruction(&mut engine);
        assert_eq!(
            engine.history.len(),
            1,
            "one instruction boundary crossed should push exactly one snapshot"
        );

        run_instruction(&mut engine);
        assert_eq!(engine.history.len(), 2);

        engine.reset();
        assert_eq!(engine.history.len(), 0);
    }
}
