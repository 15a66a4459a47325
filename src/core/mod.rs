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

//! Core simulation components
//!
//! This module contains every hardware-modeling unit of the datapath:
//! - Bit utilities (sign-extension, PC adders)
//! - Register file
//! - Data and instruction memory
//! - ALU and flags register
//! - Control unit
//! - Instruction decoder
//! - Execute/Memory/Write-Back stage handlers
//! - Assembler (two-pass label resolution)
//! - Micro-step driver
//! - History engine (snapshot-based rewind)
//! - Engine facade

pub mod alu;
pub mod assembler;
pub mod bits;
pub mod control;
pub mod decode;
pub mod driver;
pub mod engine;
pub mod error;
pub mod execute;
pub mod flags;
pub mod history;
pub mod memory;
pub mod registers;

// Re-export commonly used types
pub use alu::{Alu, AluOp};
pub use assembler::Assembler;
pub use control::{ControlBundle, ControlUnit, MemToReg};
pub use driver::StepOutcome;
pub use engine::Engine;
pub use error::{EmulatorError, Result};
pub use flags::FlagsRegister;
pub use history::HistoryEngine;
pub use memory::{DataMemory, InstructionMemory};
pub use registers::RegisterFile;
