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

//! LEGv8 micro-step simulator core library
//!
//! This library provides the core emulation components for a pedagogical
//! LEGv8 simulator: a two-pass assembler, a single-cycle datapath driven one
//! micro-step at a time, and a snapshot-based rewind engine.
//!
//! # Example
//!
//! ```
//! use legv8_sim::core::engine::Engine;
//!
//! let mut engine = Engine::new();
//! engine.load("ADDI X1, XZR, #5").unwrap();
//! let _ = engine.step().unwrap();
//! ```

pub mod core;
