// Copyright 2025 Chisomo Makombo Sakala
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

//! # Antsi
//!
//! `antsi` exposes ANTs command-line tools to a workflow engine. For each tool
//! it checks typed inputs, renders the exact command line, predicts the files
//! the tool will write, and can launch the tool and verify those files.
//!
//! The library is what a workflow engine links against; the `antsi` binary is
//! a thin JSON-printing driver around it.
//!
//! ## Core Modules
//!
//! * [`interfaces`]: The tool adapters: template construction, `ImageMath`,
//!   `ConvertTransformFile`, and the image-type header inspector.
//! * [`interface`]: The `Interface` trait every adapter implements, plus the
//!   shared validation rules.
//! * [`command`]: Typed arguments and the ordered `CommandLine` they render to.
//! * [`runner`]: Launches a validated command with `tokio::process` and checks
//!   its predicted outputs.
//! * [`config`]: Loads interface inputs from TOML/JSON files and the environment.
//! * [`filename`]: Base name and extension splitting shared by the adapters.
//! * [`cli`]: Defines the `clap`-based command-line interface.
//! * [`error`]: Defines the custom error types for the library.
//! * [`logging`]: Provides the `setup_tracing` utility.

pub mod cli;
pub mod command;
pub mod config;
pub mod error;
pub mod filename;
pub mod interface;
pub mod interfaces;
pub mod logging;
pub mod runner;
