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
use std::path::Path;
use std::path::PathBuf;

/// Extensions made of more than one suffix that must stay together.
const COMPOUND_EXTENSIONS: [&str; 3] = [".nii.gz", ".tar.gz", ".niml.dset"];

/// Splits a path into its directory, base name and extension.
///
/// `/data/brain.nii.gz` becomes (`/data`, `brain`, `.nii.gz`). The extension
/// keeps its leading dot and is empty when the file name has none.
pub fn split_filename(path: &Path) -> (PathBuf, String, String) {
  let dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
  let name = path
    .file_name()
    .map(|n| n.to_string_lossy().into_owned())
    .unwrap_or_default();

  for ext in COMPOUND_EXTENSIONS {
    if name.len() > ext.len() && name.to_ascii_lowercase().ends_with(ext) {
      let stem = name[..name.len() - ext.len()].to_string();
      let ext = name[name.len() - ext.len()..].to_string();
      return (dir, stem, ext);
    }
  }

  // Leading dots mark hidden files, not extensions.
  match name.rfind('.') {
    Some(idx) if idx > 0 => (dir, name[..idx].to_string(), name[idx..].to_string()),
    _ => (dir, name, String::new()),
  }
}

/// The file name of `path` with its directory stripped.
pub fn basename(path: &Path) -> String {
  path
    .file_name()
    .map(|n| n.to_string_lossy().into_owned())
    .unwrap_or_else(|| path.to_string_lossy().into_owned())
}

/// Resolves `path` against `cwd` unless it is already absolute.
pub fn absolute_in(cwd: &Path, path: &Path) -> PathBuf {
  if path.is_absolute() {
    path.to_path_buf()
  } else {
    cwd.join(path)
  }
}
