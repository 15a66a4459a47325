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

//! Per-format instruction decoding: processed instruction text -> a
//! [`DecodedRecord`].

use crate::core::error::{EmulatorError, Result};
use crate::core::registers;

/// The second R-format ALU input: either a register or, for `LSL`/`LSR`,
/// an immediate shift amount.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegOrShamt {
    Reg(usize),
    Shamt(i64),
}

/// A decoded instruction, tagged by addressing format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodedRecord {
    /// `op Rd, Rn, Rm` or `op Rd, Rn, #shamt` (LSL/LSR).
    R {
        opcode: String,
        rd: usize,
        rn: usize,
        rm: RegOrShamt,
    },
    /// `op Rd, Rn, #imm` — 12-bit signed immediate.
    I {
        opcode: String,
        rd: usize,
        rn: usize,
        imm: i64,
    },
    /// `op Rt, [Rn, #imm]` — 9-bit signed immediate, Rt is the destination.
    DLoad {
        opcode: String,
        rt: usize,
        rn: usize,
        imm: i64,
    },
    /// `op Rt, [Rn, #imm]` — 9-bit signed immediate, Rt is the source.
    DStore {
        opcode: String,
        rt: usize,
        rn: usize,
        imm: i64,
    },
    /// `op Rt, offset` — 19-bit signed byte offset.
    Cb {
        opcode: String,
        rt: usize,
        offset: i64,
    },
    /// `B offset` — 26-bit signed byte offset.
    B { offset: i64 },
    /// `B.cond offset` — 19-bit signed byte offset, flag-driven.
    CondB { cond: String, offset: i64 },
    /// No operands.
    Nop,
}

impl DecodedRecord {
    /// The opcode mnemonic this record was decoded from, uppercased.
    pub fn opcode(&self) -> &str {
        match self {
            DecodedRecord::R { opcode, .. } => opcode,
            DecodedRecord::I { opcode, .. } => opcode,
            DecodedRecord::DLoad { opcode, .. } => opcode,
            DecodedRecord::DStore { opcode, .. } => opcode,
            DecodedRecord::Cb { opcode, .. } => opcode,
            DecodedRecord::B { .. } => "B",
            DecodedRecord::CondB { .. } => "B.cond",
            DecodedRecord::Nop => "NOP",
        }
    }
}

/// Splits `text` into an uppercased opcode and its raw operand text.
fn split_opcode(text: &str) -> Result<(String, String)> {
    let text = text.trim();
    let mut parts = text.splitn(2, char::is_whitespace);
    let opcode = parts.next().unwrap_or("").to_string();
    if opcode.is_empty() {
        return Err(EmulatorError::SyntaxError {
            message: "empty instruction".to_string(),
        });
    }
    let rest = parts.next().unwrap_or("").to_string();
    Ok((opcode.to_ascii_uppercase(), rest))
}

/// Tokenizes operand text on `, ( ) [ ]` and whitespace, dropping empties.
fn tokenize(operands: &str) -> Vec<String> {
    operands
        .chars()
        .map(|c| if ",()[]".contains(c) { ' ' } else { c })
        .collect::<String>()
        .split_whitespace()
        .map(|s| s.to_string())
        .collect()
}

fn strip_immediate(token: &str) -> &str {
    token.strip_prefix('#').unwrap_or(token)
}

fn parse_reg(token: &str) -> Result<usize> {
    registers::resolve_name(token).ok_or_else(|| EmulatorError::SyntaxError {
        message: format!("not a register: '{}'", token),
    })
}

fn parse_imm(token: &str) -> Result<i64> {
    strip_immediate(token)
        .parse::<i64>()
        .map_err(|_| EmulatorError::SyntaxError {
            message: format!("not an integer immediate: '{}'", token),
        })
}

fn expect_operands(tokens: &[String], count: usize, opcode: &str) -> Result<()> {
    if tokens.len() != count {
        Err(EmulatorError::SyntaxError {
            message: format!(
                "{} expects {} operand(s), got {}",
                opcode,
                count,
                tokens.len()
            ),
        })
    } else {
        Ok(())
    }
}

const SHIFT_MNEMONICS: &[&str] = &["LSL", "LSR"];
const R_MNEMONICS: &[&str] = &[
    "ADD", "ADDS", "SUB", "SUBS", "AND", "ANDS", "ORR", "EOR", "MUL", "DIV", "LSL", "LSR",
];
const I_MNEMONICS: &[&str] = &[
    "ADDI", "ADDIS", "SUBI", "SUBIS", "ANDI", "ORRI", "EORI",
];
const CB_MNEMONICS: &[&str] = &["CBZ", "CBNZ"];

/// Decodes one processed instruction line into a [`DecodedRecord`].
///
/// # Example
///
/// ```
/// use legv8_sim::core::decode::decode;
///
/// let record = decode("ADDI X1, XZR, #5").unwrap();
/// assert_eq!(record.opcode(), "ADDI");
/// ```
pub fn decode(text: &str) -> Result<DecodedRecord> {
    let (opcode, rest) = split_opcode(text)?;
    let tokens = tokenize(&rest);

    if opcode == "NOP" {
        return Ok(DecodedRecord::Nop);
    }

    if opcode == "B" {
        expect_operands(&tokens, 1, &opcode)?;
        let offset = parse_imm(&tokens[0])?;
        return Ok(DecodedRecord::B { offset });
    }

    if let Some(cond) = opcode.strip_prefix("B.") {
        expect_operands(&tokens, 1, &opcode)?;
        let offset = parse_imm(&tokens[0])?;
        return Ok(DecodedRecord::CondB {
            cond: cond.to_string(),
            offset,
        });
    }

    if CB_MNEMONICS.contains(&opcode.as_str()) {
        expect_operands(&tokens, 2, &opcode)?;
        let rt = parse_reg(&tokens[0])?;
        let offset = parse_imm(&tokens[1])?;
        return Ok(DecodedRecord::Cb { opcode, rt, offset });
    }

    if opcode == "LDUR" {
        expect_operands(&tokens, 3, &opcode)?;
        let rt = parse_reg(&tokens[0])?;
        let rn = parse_reg(&tokens[1])?;
        let imm = parse_imm(&tokens[2])?;
        return Ok(DecodedRecord::DLoad { opcode, rt, rn, imm });
    }

    if opcode == "STUR" {
        expect_operands(&tokens, 3, &opcode)?;
        let rt = parse_reg(&tokens[0])?;
        let rn = parse_reg(&tokens[1])?;
        let imm = parse_imm(&tokens[2])?;
        return Ok(DecodedRecord::DStore { opcode, rt, rn, imm });
    }

    if I_MNEMONICS.contains(&opcode.as_str()) {
        expect_operands(&tokens, 3, &opcode)?;
        let rd = parse_reg(&tokens[0])?;
        let rn = parse_reg(&tokens[1])?;
        let imm = parse_imm(&tokens[2])?;
        return Ok(DecodedRecord::I { opcode, rd, rn, imm });
    }

    if R_MNEMONICS.contains(&opcode.as_str()) {
        expect_operands(&tokens, 3, &opcode)?;
        let rd = parse_reg(&tokens[0])?;
        let rn = parse_reg(&tokens[1])?;
        let rm = if SHIFT_MNEMONICS.contains(&opcode.as_str()) && tokens[2].starts_with('#') {
            RegOrShamt::Shamt(parse_imm(&tokens[2])?)
        } else {
            RegOrShamt::Reg(parse_reg(&tokens[2])?)
        };
        return Ok(DecodedRecord::R { opcode, rd, rn, rm });
    }

    Err(EmulatorError::SyntaxError {
        message: format!("unrecognized opcode '{}'", opcode),
    })
}
