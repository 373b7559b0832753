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

//! Picks the `--input-image-type` code for `antsApplyTransforms` from an
//! image header.

use crate::error::AntsError;
use crate::interface::require_file;
use nifti::NiftiHeader;
use serde::Serialize;
use std::path::Path;

/// `antsApplyTransforms --input-image-type` codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(into = "u8")]
pub enum ImageType {
  Scalar = 0,
  Vector = 1,
  Tensor = 2,
  TimeSeries = 3,
}

impl From<ImageType> for u8 {
  fn from(value: ImageType) -> Self {
    value as u8
  }
}

impl ImageType {
  /// Four dimensional images are time series, anything else is scalar.
  pub fn from_ndim(ndim: u16) -> Self {
    if ndim == 4 {
      ImageType::TimeSeries
    } else {
      ImageType::Scalar
    }
  }
}

/// Reads only the header of `path` (`.nii`, `.nii.gz`, `.hdr`) and classifies it.
pub fn image_type(path: &Path) -> Result<ImageType, AntsError> {
  require_file("GetImageType", "image", path)?;

  let header = NiftiHeader::from_file(path).map_err(|source| AntsError::Header {
    path: path.to_path_buf(),
    source,
  })?;
  let ndim = header.dim[0];
  let image_type = ImageType::from_ndim(ndim);

  tracing::debug!(path = %path.display(), ndim, ?image_type, "Inspected image header");
  Ok(image_type)
}
