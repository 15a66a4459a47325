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

//! Two-pass assembler: label resolution followed by branch-offset
//! substitution, grounded in the original `Assembler.parse`.

use std::collections::HashMap;

use log::debug;

use crate::core::error::{EmulatorError, Result};
use crate::core::memory::{InstructionEntry, InstructionMemory};

const BRANCH_OPCODES: &[&str] = &["B", "CBZ", "CBNZ"];

/// Output of a successful assembly: the three instruction-memory views plus
/// the label table, all keyed by byte address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembledProgram {
    pub instructions: InstructionMemory,
    pub labels: HashMap<String, u64>,
}

struct RawLine {
    address: u64,
    text: String,
    line_number: usize,
}

/// Stateless two-pass assembler.
pub struct Assembler;

impl Assembler {
    /// Assembles `source` into an [`AssembledProgram`].
    ///
    /// Pass 1 builds the label table and records each instruction's raw
    /// text at its byte address (four bytes per instruction). Pass 2
    /// rewrites the last operand of any branch instruction that names a
    /// label into the label's byte offset from the branch instruction.
    pub fn assemble(source: &str) -> Result<AssembledProgram> {
        let (raw_lines, labels) = Self::pass1(source)?;
        let instructions = Self::pass2(&raw_lines, &labels)?;
        debug!(
            "assembled {} instruction(s), {} label(s)",
            instructions.len(),
            labels.len()
        );
        Ok(AssembledProgram {
            instructions,
            labels,
        })
    }

    fn pass1(source: &str) -> Result<(Vec<RawLine>, HashMap<String, u64>)> {
        let mut labels = HashMap::new();
        let mut raw_lines = Vec::new();
        let mut address: u64 = 0;

        for (idx, raw) in source.lines().enumerate() {
            let line_number = idx + 1;
            let without_comment = match raw.find("//") {
                Some(pos) => &raw[..pos],
                None => raw,
            };
            let trimmed = without_comment.trim();
            if trimmed.is_empty() || trimmed.starts_with('.') {
                continue;
            }

            let (label, instruction) = match trimmed.split_once(':') {
                Some((label, rest)) => (Some(label.trim()), rest.trim()),
                None => (None, trimmed),
            };

            if let Some(label) = label {
                let key = label.to_ascii_uppercase();
                if labels.insert(key, address).is_some() {
                    return Err(EmulatorError::LoadError {
                        message: format!("duplicate label '{}'", label),
                        line: Some(line_number),
                    });
                }
            }

            if instruction.is_empty() {
                continue;
            }

            raw_lines.push(RawLine {
                address,
                text: instruction.to_string(),
                line_number,
            });
            address += 4;
        }

        Ok((raw_lines, labels))
    }

    fn pass2(
        raw_lines: &[RawLine],
        labels: &HashMap<String, u64>,
    ) -> Result<InstructionMemory> {
        let mut instructions = InstructionMemory::new();

        for line in raw_lines {
            let processed = Self::resolve_branch(line, labels)?;
            instructions.insert(
                line.address,
                InstructionEntry {
                    processed,
                    raw: line.text.clone(),
                    binary: None,
                },
            );
        }

        Ok(instructions)
    }

    fn resolve_branch(line: &RawLine, labels: &HashMap<String, u64>) -> Result<String> {
        let mut parts: Vec<&str> = line.text.split_whitespace().collect();
        if parts.is_empty() {
            return Ok(line.text.clone());
        }
        let opcode = parts[0].to_ascii_uppercase();
        let is_branch = BRANCH_OPCODES.contains(&opcode.as_str()) || opcode.starts_with("B.");
        if !is_branch {
            return Ok(line.text.clone());
        }

        let last_idx = parts.len() - 1;
        let last = parts[last_idx].trim_end_matches(',');
        if last.parse::<i64>().is_ok() {
            return Ok(line.text.clone());
        }

        let key = last.to_ascii_uppercase();
        let target = *labels.get(&key).ok_or_else(|| EmulatorError::LoadError {
            message: format!("undefined label '{}'", last),
            line: Some(line.line_number),
        })?;
        let offset = target as i64 - line.address as i64;
        let offset_str = offset.to_string();
        parts[last_idx] = &offset_str;
        Ok(parts.join(" "))
    }
}
