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

use legv8_sim::core::alu::{Alu, AluOp};
use legv8_sim::core::assembler::Assembler;
use legv8_sim::core::bits::sign_extend;
use legv8_sim::core::driver::StepOutcome;
use legv8_sim::core::engine::Engine;
use legv8_sim::core::registers::{RegisterFile, XZR};
use proptest::prelude::*;

fn run_instruction(engine: &mut Engine) -> StepOutcome {
    loop {
        let outcome = engine.step().unwrap();
        if !matches!(outcome, StepOutcome::MicroStep { .. }) {
            return outcome;
        }
    }
}

proptest! {
    /// XZR immutability: no sequence of writes ever changes what a read of
    /// X31 yields.
    #[test]
    fn xzr_write_is_always_discarded(value in any::<u64>()) {
        let mut regs = RegisterFile::new();
        regs.write(XZR, value);
        prop_assert_eq!(regs.read(XZR), 0);
    }

    /// Sign-extension: for k in [1, 64) and v < 2^k, sign_extend(v, k) read
    /// as signed 64-bit equals v reinterpreted as signed k-bit.
    #[test]
    fn sign_extend_matches_signed_k_bit_reinterpretation(k in 1u32..64, raw in any::<u64>()) {
        let v = raw & ((1u64 << k) - 1);
        let extended = sign_extend(v, k);
        let sign_bit = (v >> (k - 1)) & 1;
        let expected = if sign_bit == 1 {
            (v as i64).wrapping_sub(1i64.wrapping_shl(k))
        } else {
            v as i64
        };
        prop_assert_eq!(extended, expected);
    }

    /// Addition wrap: alu.add(a, b).value == (a + b) mod 2^64.
    #[test]
    fn add_wraps_modulo_2_to_the_64(a in any::<u64>(), b in any::<u64>()) {
        let result = Alu::execute(a, b, AluOp::Add).unwrap();
        prop_assert_eq!(result.value, a.wrapping_add(b));
    }

    /// Round-trip snapshot: restoring a register file's snapshot reproduces
    /// every register exactly.
    #[test]
    fn register_file_snapshot_round_trips(values in proptest::collection::vec(any::<u64>(), 32)) {
        let mut regs = RegisterFile::new();
        for (i, v) in values.iter().enumerate() {
            regs.write(i, *v);
        }
        let snap = regs.snapshot();
        let mut restored = RegisterFile::new();
        restored.restore(&snap);
        for i in 0..32 {
            prop_assert_eq!(restored.read(i), regs.read(i));
        }
    }

    /// Label resolution idempotence: assembling the same source twice
    /// yields identical processed instruction views and label tables.
    #[test]
    fn assembling_twice_is_idempotent(a in 0i64..1000, b in 0i64..1000) {
        let source = format!(
            "start: ADDI X1, XZR, #{a}\n       ADDI X2, XZR, #{b}\n       B start\n"
        );
        let first = Assembler::assemble(&source).unwrap();
        let second = Assembler::assemble(&source).unwrap();
        prop_assert_eq!(&first.labels, &second.labels);
        for addr in first.labels.values().chain(std::iter::once(&0u64)) {
            prop_assert_eq!(first.instructions.get(*addr).map(|e| e.raw.clone()), second.instructions.get(*addr).map(|e| e.raw.clone()));
        }
    }

    /// Rewind correctness: running N instructions then rewinding M <= N
    /// yields the same observable state as running only the first N - M.
    #[test]
    fn rewind_matches_running_fewer_instructions(n in 1usize..6, m in 0usize..6) {
        let m = m.min(n);
        let source = "ADDI X1, XZR, #1\nADDI X1, X1, #1\nADDI X1, X1, #1\nADDI X1, X1, #1\nADDI X1, X1, #1\nADDI X1, X1, #1\n";

        let mut full = Engine::new();
        full.load(source).unwrap();
        for _ in 0..n {
            run_instruction(&mut full);
        }
        for _ in 0..m {
            full.rewind().unwrap();
        }

        let mut partial = Engine::new();
        partial.load(source).unwrap();
        for _ in 0..(n - m) {
            run_instruction(&mut partial);
        }

        prop_assert_eq!(full.inspect().pc, partial.inspect().pc);
        prop_assert_eq!(full.inspect().registers, partial.inspect().registers);
    }

    /// Deterministic trace: two fresh runs of the same program from reset
    /// produce identical final states.
    #[test]
    fn identical_programs_produce_identical_final_states(a in 0i64..500, b in 0i64..500) {
        let source = format!(
            "ADDI X1, XZR, #{a}\nADDI X2, XZR, #{b}\nADD X3, X1, X2\n"
        );
        let mut first = Engine::new();
        first.load(&source).unwrap();
        for _ in 0..3 {
            run_instruction(&mut first);
        }

        let mut second = Engine::new();
        second.load(&source).unwrap();
        for _ in 0..3 {
            run_instruction(&mut second);
        }

        prop_assert_eq!(first.inspect().pc, second.inspect().pc);
        prop_assert_eq!(first.inspect().registers, second.inspect().registers);
    }
}
