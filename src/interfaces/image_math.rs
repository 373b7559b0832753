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
use super::Dimension;
use crate::command::ArgValue;
use crate::command::Argument;
use crate::command::Position;
use crate::error::AntsError;
use crate::error::ValidationError;
use crate::filename::absolute_in;
use crate::filename::split_filename;
use crate::interface::Interface;
use crate::interface::OutputFiles;
use crate::interface::require_file;
use crate::interface::require_set;
use serde::Deserialize;
use serde::Serialize;
use std::path::Path;
use std::path::PathBuf;

const NAME: &str = "ImageMath";

/// Inputs of `ImageMath <dim> <out> <operation> <in> [secondary...]`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ImageMath {
  #[serde(default)]
  pub dimension: Dimension,

  pub in_file: Option<PathBuf>,

  /// Generated from `in_file` and `operation` when not given.
  #[serde(default)]
  pub out_file: Option<PathBuf>,

  pub operation: Option<String>,

  #[serde(default)]
  pub secondary_arg: Option<String>,

  #[serde(default)]
  pub secondary_file: Option<PathBuf>,
}

impl ImageMath {
  pub fn new(in_file: impl Into<PathBuf>, operation: impl Into<String>) -> Self {
    ImageMath {
      in_file: Some(in_file.into()),
      operation: Some(operation.into()),
      ..Default::default()
    }
  }

  /// The output file name, explicit or `<in-stem>_<operation><in-ext>`.
  pub fn out_file(&self) -> Result<PathBuf, ValidationError> {
    if let Some(out_file) = &self.out_file {
      return Ok(out_file.clone());
    }

    let (in_file, operation) = self.mandatory()?;
    let (_, fname, ext) = split_filename(in_file);
    Ok(PathBuf::from(format!("{fname}_{operation}{ext}")))
  }

  fn mandatory(&self) -> Result<(&Path, &str), ValidationError> {
    let in_file = self.in_file.as_deref().ok_or(ValidationError::MissingMandatory {
      interface: NAME,
      name: "in_file",
    })?;
    let operation = self
      .operation
      .as_deref()
      .ok_or(ValidationError::MissingMandatory {
        interface: NAME,
        name: "operation",
      })?;
    Ok((in_file, operation))
  }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageMathOutputs {
  pub out_file: PathBuf,
}

impl OutputFiles for ImageMathOutputs {
  fn files(&self) -> Vec<&Path> {
    vec![self.out_file.as_path()]
  }
}

impl Interface for ImageMath {
  type Outputs = ImageMathOutputs;

  const NAME: &'static str = NAME;

  fn program(&self) -> &'static str {
    "ImageMath"
  }

  fn validate(&self) -> Result<(), ValidationError> {
    require_set(NAME, "in_file", self.in_file.as_ref())?;
    require_set(NAME, "operation", self.operation.as_ref())?;

    if let Some(in_file) = &self.in_file {
      require_file(NAME, "in_file", in_file)?;
    }
    if let Some(secondary_file) = &self.secondary_file {
      require_file(NAME, "secondary_file", secondary_file)?;
    }
    Ok(())
  }

  fn arguments(&self) -> Vec<Argument> {
    let mut args = vec![Argument::positional(
      "dimension",
      Position::Leading(0),
      ArgValue::Int(self.dimension.into()),
    )];

    if let Ok(out_file) = self.out_file() {
      args.push(Argument::positional(
        "out_file",
        Position::Leading(1),
        ArgValue::File(out_file),
      ));
    }
    if let Some(operation) = &self.operation {
      args.push(Argument::positional(
        "operation",
        Position::Leading(2),
        ArgValue::Str(operation.clone()),
      ));
    }
    if let Some(in_file) = &self.in_file {
      args.push(Argument::positional(
        "in_file",
        Position::Leading(3),
        ArgValue::File(in_file.clone()),
      ));
    }
    if let Some(secondary_arg) = self.secondary_arg.as_ref().filter(|s| !s.is_empty()) {
      args.push(Argument::positional(
        "secondary_arg",
        Position::Unordered,
        ArgValue::Str(secondary_arg.clone()),
      ));
    }
    if let Some(secondary_file) = &self.secondary_file {
      args.push(Argument::positional(
        "secondary_file",
        Position::Unordered,
        ArgValue::File(secondary_file.clone()),
      ));
    }

    args
  }

  fn list_outputs(&self, cwd: &Path) -> Result<ImageMathOutputs, AntsError> {
    let out_file = self.out_file()?;
    Ok(ImageMathOutputs {
      out_file: absolute_in(cwd, &out_file),
    })
  }
}
