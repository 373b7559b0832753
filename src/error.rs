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
use std::path::PathBuf;
use thiserror::Error;

/// Top-level error enum for the antsi library.
#[derive(Error, Debug)]
pub enum AntsError {
  #[error("Invalid inputs: {0}")]
  Validation(#[from] ValidationError),

  #[error("{interface}: {reason}")]
  Unsupported {
    interface: &'static str,
    reason: &'static str,
  },

  #[error("Failed to read image header: {path}")]
  Header {
    path: PathBuf,
    #[source]
    source: nifti::error::NiftiError,
  },

  #[error("Tool execution failed: {0}")]
  Run(#[from] RunError),

  #[error("Configuration error: {0}")]
  Config(#[from] ConfigError),
}

/// Errors raised while checking inputs, before any process is started.
#[derive(Error, Debug)]
pub enum ValidationError {
  #[error("{interface}: mandatory input '{name}' is not set")]
  MissingMandatory {
    interface: &'static str,
    name: &'static str,
  },

  #[error("{interface}: inputs {names:?} are mutually exclusive")]
  MutuallyExclusive {
    interface: &'static str,
    names: Vec<&'static str>,
  },

  #[error("{interface}: one of {names:?} must be set")]
  MissingOneOf {
    interface: &'static str,
    names: Vec<&'static str>,
  },

  #[error("{interface}: file for '{name}' does not exist: {path}")]
  FileNotFound {
    interface: &'static str,
    name: &'static str,
    path: PathBuf,
  },

  #[error("{interface}: '{name}' has more than one file named {basename}")]
  DuplicateBasename {
    interface: &'static str,
    name: &'static str,
    basename: String,
  },

  #[error("{interface}: '{name}' must not be empty")]
  EmptyList {
    interface: &'static str,
    name: &'static str,
  },

  #[error("{interface}: '{name}' = {value} is out of range ({expected})")]
  OutOfRange {
    interface: &'static str,
    name: &'static str,
    value: String,
    expected: &'static str,
  },
}

/// Errors related to launching the external tool (src/runner.rs).
#[derive(Error, Debug)]
pub enum RunError {
  #[error("Failed to spawn {command}")]
  Spawn {
    command: String,
    #[source]
    source: std::io::Error,
  },

  #[error("Failed to stage input {path} into {dir}")]
  Stage {
    path: PathBuf,
    dir: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("Failed to take {target} pipe of {command}")]
  Pipe {
    command: String,
    target: &'static str,
  },

  #[error("Failed to wait for {command}")]
  Wait {
    command: String,
    #[source]
    source: std::io::Error,
  },

  #[error("Failed to read {target} stream")]
  ReadStream {
    target: &'static str,
    #[source]
    source: std::io::Error,
  },

  #[error("Stream reader task failed")]
  Task(#[from] tokio::task::JoinError),

  #[error("{command} exited with status {code:?}")]
  NonZeroExit { command: String, code: Option<i32> },

  #[error("Expected output was not produced: {0}")]
  MissingOutput(PathBuf),
}

/// Errors related to loading interface inputs (src/config.rs).
#[derive(Error, Debug)]
pub enum ConfigError {
  #[error("Inputs file not found: {0}")]
  InputsNotFound(PathBuf),

  #[error("Failed to extract inputs: {0}")]
  Extract(#[from] Box<figment::Error>),
}
