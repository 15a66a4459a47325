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

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};
use legv8_sim::core::engine::Engine;

fn single_micro_step_benchmark(c: &mut Criterion) {
    c.bench_function("engine_micro_step", |b| {
        let mut engine = Engine::new();
        engine.load("NOP\n").unwrap();
        b.iter(|| {
            black_box(engine.step().unwrap());
        });
    });
}

fn instruction_completion_benchmark(c: &mut Criterion) {
    c.bench_function("engine_instruction_complete", |b| {
        let mut engine = Engine::new();
        engine.load("loop: ADDI X1, X1, #1\nB loop\n").unwrap();
        b.iter(|| {
            for _ in 0..5 {
                black_box(engine.step().unwrap());
            }
        });
    });
}

fn assembler_benchmark(c: &mut Criterion) {
    let source = "ADDI X1, XZR, #5\nADDI X2, XZR, #7\nADD X3, X1, X2\nSTUR X3, [SP, #0]\nLDUR X4, [SP, #0]\n";
    c.bench_function("assembler_parse", |b| {
        b.iter(|| {
            black_box(legv8_sim::core::assembler::Assembler::assemble(black_box(source)).unwrap());
        });
    });
}

criterion_group!(
    benches,
    single_micro_step_benchmark,
    instruction_completion_benchmark,
    assembler_benchmark
);
criterion_main!(benches);
