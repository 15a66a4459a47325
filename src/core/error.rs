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

/// Simulator error types
use std::fmt;

/// Result type for simulator operations
pub type Result<T> = std::result::Result<T, EmulatorError>;

/// Simulator error types
///
/// These map one-to-one onto the error classes a caller can observe: load
/// errors reject a whole program, the four runtime classes each correspond
/// to one driver stage, and `ProgramFinished` is terminal rather than an
/// error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmulatorError {
    /// Assembler rejected the program (duplicate/undefined label, malformed line)
    LoadError {
        /// Human-readable diagnostic
        message: String,
        /// Source line number, when known
        line: Option<usize>,
    },

    /// A step/rewind/inspect was requested before a program was loaded
    NotLoaded,

    /// Decode-stage failure: wrong operand count/form, or an immediate that
    /// does not parse
    SyntaxError {
        /// Human-readable diagnostic
        message: String,
    },

    /// Execute-stage failure (divide-by-zero, unsupported ALU operation)
    ArithmeticError {
        /// Human-readable diagnostic
        message: String,
    },

    /// Memory-stage failure (only reachable if an implementation enforces
    /// address bounds)
    MemoryAccess {
        /// The address that was accessed
        address: u64,
    },

    /// Fetch-stage failure: no instruction at the given PC
    InstructionFetch {
        /// The program counter that had no instruction
        address: u64,
    },

    /// Write-Back stage failure (destination register could not be resolved)
    RegisterWrite {
        /// Human-readable diagnostic
        message: String,
    },

    /// Terminal, not an error: PC left the instruction memory after a
    /// successful Write-Back
    ProgramFinished {
        /// Why the program is considered finished
        reason: String,
    },

    /// I/O error (snapshot file operations)
    IoError {
        /// Error message
        message: String,
    },
}

impl fmt::Display for EmulatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EmulatorError::LoadError { message, line } => match line {
                Some(line) => write!(f, "Load error at line {}: {}", line, message),
                None => write!(f, "Load error: {}", message),
            },
            EmulatorError::NotLoaded => write!(f, "No program is loaded"),
            EmulatorError::SyntaxError { message } => write!(f, "Syntax error: {}", message),
            EmulatorError::ArithmeticError { message } => {
                write!(f, "Arithmetic error: {}", message)
            }
            EmulatorError::MemoryAccess { address } => {
                write!(f, "Invalid memory access at address 0x{:016X}", address)
            }
            EmulatorError::InstructionFetch { address } => {
                write!(f, "No instruction at PC=0x{:016X}", address)
            }
            EmulatorError::RegisterWrite { message } => {
                write!(f, "Register write error: {}", message)
            }
            EmulatorError::ProgramFinished { reason } => write!(f, "Program finished: {}", reason),
            EmulatorError::IoError { message } => write!(f, "I/O error: {}", message),
        }
    }
}

impl std::error::Error for EmulatorError {}

impl From<std::io::Error> for EmulatorError {
    fn from(err: std::io::Error) -> Self {
        EmulatorError::IoError {
            message: err.to_string(),
        }
    }
}
