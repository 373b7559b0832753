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

const NAME: &str = "ConvertTransformFile";

/// Inputs of `ConvertTransformFile <dim> <in> <out>`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConvertTransformFile {
  #[serde(default)]
  pub dimension: Dimension,

  pub in_transform: Option<PathBuf>,

  /// Defaults to the input name with its extension replaced by `.txt`.
  #[serde(default)]
  pub out_transform: Option<PathBuf>,
}

impl ConvertTransformFile {
  pub fn new(in_transform: impl Into<PathBuf>) -> Self {
    ConvertTransformFile {
      in_transform: Some(in_transform.into()),
      ..Default::default()
    }
  }

  pub fn out_transform(&self) -> Result<PathBuf, ValidationError> {
    if let Some(out_transform) = &self.out_transform {
      return Ok(out_transform.clone());
    }

    let in_transform = self
      .in_transform
      .as_deref()
      .ok_or(ValidationError::MissingMandatory {
        interface: NAME,
        name: "in_transform",
      })?;
    let (_, fname, _) = split_filename(in_transform);
    Ok(PathBuf::from(format!("{fname}.txt")))
  }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConvertTransformOutputs {
  pub out_transform: PathBuf,
}

impl OutputFiles for ConvertTransformOutputs {
  fn files(&self) -> Vec<&Path> {
    vec![self.out_transform.as_path()]
  }
}

impl Interface for ConvertTransformFile {
  type Outputs = ConvertTransformOutputs;

  const NAME: &'static str = NAME;

  fn program(&self) -> &'static str {
    "ConvertTransformFile"
  }

  fn validate(&self) -> Result<(), ValidationError> {
    if self.dimension == Dimension::Four {
      return Err(ValidationError::OutOfRange {
        interface: NAME,
        name: "dimension",
        value: self.dimension.to_string(),
        expected: "2 or 3",
      });
    }

    require_set(NAME, "in_transform", self.in_transform.as_ref())?;
    if let Some(in_transform) = &self.in_transform {
      require_file(NAME, "in_transform", in_transform)?;
    }
    Ok(())
  }

  fn arguments(&self) -> Vec<Argument> {
    let mut args = vec![Argument::positional(
      "dimension",
      Position::Leading(0),
      ArgValue::Int(self.dimension.into()),
    )];

    if let Some(in_transform) = &self.in_transform {
      args.push(Argument::positional(
        "in_transform",
        Position::Leading(1),
        ArgValue::File(in_transform.clone()),
      ));
    }
    if let Ok(out_transform) = self.out_transform() {
      args.push(Argument::positional(
        "out_transform",
        Position::Leading(2),
        ArgValue::File(out_transform),
      ));
    }

    args
  }

  fn list_outputs(&self, cwd: &Path) -> Result<ConvertTransformOutputs, AntsError> {
    let out_transform = self.out_transform()?;
    Ok(ConvertTransformOutputs {
      out_transform: absolute_in(cwd, &out_transform),
    })
  }
}
