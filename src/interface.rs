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
use crate::command::Argument;
use crate::command::CommandLine;
use crate::error::AntsError;
use crate::error::ValidationError;
use serde::Serialize;
use std::path::Path;

/// Paths a tool is expected to have written after a successful run.
pub trait OutputFiles {
  fn files(&self) -> Vec<&Path>;
}

/// Adapter between typed inputs and one external command-line tool.
///
/// Implementors declare how inputs are checked, rendered and which files the
/// tool leaves behind. Nothing here touches the filesystem apart from
/// existence checks during validation.
pub trait Interface {
  type Outputs: Serialize + OutputFiles;

  /// Name used in errors and log spans.
  const NAME: &'static str;

  /// Executable name, resolved on `PATH` unless the launcher overrides it.
  fn program(&self) -> &'static str;

  fn validate(&self) -> Result<(), ValidationError>;

  /// Arguments for already validated inputs.
  fn arguments(&self) -> Vec<Argument>;

  /// Extra environment for the child process.
  fn environment(&self) -> Vec<(String, String)> {
    Vec::new()
  }

  /// Files that must sit in the working directory because the command line
  /// refers to them by base name only.
  fn staged_inputs(&self) -> Vec<&Path> {
    Vec::new()
  }

  /// Predicts output paths from the inputs alone, relative to `cwd`.
  fn list_outputs(&self, cwd: &Path) -> Result<Self::Outputs, AntsError>;

  /// Validates the inputs and renders the full command line.
  fn command_line(&self) -> Result<CommandLine, ValidationError> {
    self.validate()?;
    Ok(CommandLine::new(
      self.program(),
      self.arguments(),
      self.environment(),
    ))
  }
}

pub(crate) fn require_file(
  interface: &'static str,
  name: &'static str,
  path: &Path,
) -> Result<(), ValidationError> {
  if path.exists() {
    Ok(())
  } else {
    Err(ValidationError::FileNotFound {
      interface,
      name,
      path: path.to_path_buf(),
    })
  }
}

pub(crate) fn require_non_empty<T>(
  interface: &'static str,
  name: &'static str,
  items: &[T],
) -> Result<(), ValidationError> {
  if items.is_empty() {
    Err(ValidationError::EmptyList { interface, name })
  } else {
    Ok(())
  }
}

pub(crate) fn require_set<T>(
  interface: &'static str,
  name: &'static str,
  value: Option<&T>,
) -> Result<(), ValidationError> {
  match value {
    Some(_) => Ok(()),
    None => Err(ValidationError::MissingMandatory { interface, name }),
  }
}

/// Checks a mandatory mutual-exclusion group: exactly one member is set.
pub(crate) fn exactly_one(
  interface: &'static str,
  group: &[(&'static str, bool)],
) -> Result<(), ValidationError> {
  let names: Vec<&'static str> = group.iter().map(|(name, _)| *name).collect();
  match group.iter().filter(|(_, set)| *set).count() {
    1 => Ok(()),
    0 => Err(ValidationError::MissingOneOf { interface, names }),
    _ => Err(ValidationError::MutuallyExclusive { interface, names }),
  }
}
