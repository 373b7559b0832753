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

//! Adapters for the individual ANTs tools.

pub mod convert_transform;
pub mod image_math;
pub mod image_type;
pub mod template;

pub use convert_transform::ConvertTransformFile;
pub use image_math::ImageMath;
pub use image_type::ImageType;
pub use image_type::image_type;
pub use template::TemplateConstruction;

use serde::Deserialize;
use serde::Serialize;
use std::fmt;

/// Spatial dimensionality passed to ANTs tools as `2`, `3` or `4`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Dimension {
  Two = 2,
  #[default]
  Three = 3,
  Four = 4,
}

impl TryFrom<u8> for Dimension {
  type Error = String;

  fn try_from(value: u8) -> Result<Self, Self::Error> {
    match value {
      2 => Ok(Dimension::Two),
      3 => Ok(Dimension::Three),
      4 => Ok(Dimension::Four),
      other => Err(format!("dimension must be 2, 3 or 4, got {other}")),
    }
  }
}

impl From<Dimension> for u8 {
  fn from(value: Dimension) -> Self {
    value as u8
  }
}

impl From<Dimension> for i64 {
  fn from(value: Dimension) -> Self {
    value as i64
  }
}

impl fmt::Display for Dimension {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", *self as u8)
  }
}
