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

//! `antsMultivariateTemplateConstruction2.sh`: builds an unbiased template
//! from a set of images and registers every input to it.

use super::Dimension;
use crate::command::ArgValue;
use crate::command::Argument;
use crate::command::Position;
use crate::error::AntsError;
use crate::error::ValidationError;
use crate::filename::basename;
use crate::filename::split_filename;
use crate::interface::Interface;
use crate::interface::OutputFiles;
use crate::interface::exactly_one;
use crate::interface::require_file;
use crate::interface::require_non_empty;
use serde::Deserialize;
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;
use std::path::Path;
use std::path::PathBuf;

const NAME: &str = "MultivariateTemplateConstruction2";
const DEFAULT_PREFIX: &str = "antsBTP";

/// Pinned to 1 in the child environment so the script's own `-c`/`-j`
/// dispatch is the only source of parallelism.
pub const THREAD_ENV_VARS: [&str; 2] = ["ITK_GLOBAL_DEFAULT_NUMBER_OF_THREADS", "NSLOTS"];

/// Statistic used to summarize images into the template (`-a`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum ImageStatistic {
  Mean = 0,
  NormalizedMean = 1,
  Median = 2,
}

impl TryFrom<u8> for ImageStatistic {
  type Error = String;

  fn try_from(value: u8) -> Result<Self, Self::Error> {
    match value {
      0 => Ok(ImageStatistic::Mean),
      1 => Ok(ImageStatistic::NormalizedMean),
      2 => Ok(ImageStatistic::Median),
      other => Err(format!("image_statistic must be 0, 1 or 2, got {other}")),
    }
  }
}

impl From<ImageStatistic> for u8 {
  fn from(value: ImageStatistic) -> Self {
    value as u8
  }
}

/// Parallel dispatch mode of the script (`-c`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum ParallelControl {
  #[default]
  Serial = 0,
  SgeQsub = 1,
  Pexec = 2,
  XGrid = 3,
  PbsQsub = 4,
  Slurm = 5,
}

impl TryFrom<u8> for ParallelControl {
  type Error = String;

  fn try_from(value: u8) -> Result<Self, Self::Error> {
    match value {
      0 => Ok(ParallelControl::Serial),
      1 => Ok(ParallelControl::SgeQsub),
      2 => Ok(ParallelControl::Pexec),
      3 => Ok(ParallelControl::XGrid),
      4 => Ok(ParallelControl::PbsQsub),
      5 => Ok(ParallelControl::Slurm),
      other => Err(format!("parallel_control must be between 0 and 5, got {other}")),
    }
  }
}

impl From<ParallelControl> for u8 {
  fn from(value: ParallelControl) -> Self {
    value as u8
  }
}

/// Transformation model (`-t`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Transform {
  #[default]
  #[serde(rename = "BSplineSyN")]
  BSplineSyN,
  #[serde(rename = "SyN")]
  SyN,
  #[serde(rename = "Affine")]
  Affine,
}

impl fmt::Display for Transform {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      Transform::BSplineSyN => "BSplineSyN",
      Transform::SyN => "SyN",
      Transform::Affine => "Affine",
    };
    f.write_str(name)
  }
}

/// One subject: a single image, or one image per modality.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ImageInput {
  Single(PathBuf),
  Modalities(Vec<PathBuf>),
}

impl ImageInput {
  pub fn files(&self) -> &[PathBuf] {
    match self {
      ImageInput::Single(path) => std::slice::from_ref(path),
      ImageInput::Modalities(paths) => paths,
    }
  }

  /// The file whose name drives the transform naming.
  pub fn primary(&self) -> Option<&Path> {
    self.files().first().map(PathBuf::as_path)
  }
}

impl From<&str> for ImageInput {
  fn from(path: &str) -> Self {
    ImageInput::Single(PathBuf::from(path))
  }
}

fn default_iteration_limit() -> u32 {
  4
}

fn default_one() -> u32 {
  1
}

fn default_true() -> bool {
  true
}

fn default_metric() -> String {
  "CC".to_string()
}

fn default_gradient_step() -> f64 {
  0.25
}

/// Inputs of `antsMultivariateTemplateConstruction2.sh`.
///
/// Exactly one of `input_images` and `input_file` must be given.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TemplateConstruction {
  #[serde(default)]
  pub dimension: Dimension,

  /// A csv/txt manifest listing the images.
  #[serde(default)]
  pub input_file: Option<PathBuf>,

  #[serde(default)]
  pub input_images: Option<Vec<ImageInput>>,

  #[serde(default)]
  pub image_statistic: Option<ImageStatistic>,

  #[serde(default = "default_iteration_limit")]
  pub iteration_limit: u32,

  #[serde(default)]
  pub backup_images: Option<bool>,

  #[serde(default)]
  pub parallel_control: ParallelControl,

  #[serde(default = "default_one")]
  pub num_cores: u32,

  /// Number of modalities per subject, e.g. 3 for T1, T2 and FA.
  #[serde(default = "default_one")]
  pub num_modalities: u32,

  #[serde(default)]
  pub modality_weights: Option<Vec<f64>>,

  #[serde(default = "default_true")]
  pub n4_bias_correct: bool,

  #[serde(default = "default_metric")]
  pub metric: String,

  #[serde(default)]
  pub transform: Transform,

  #[serde(default)]
  pub output_prefix: Option<String>,

  #[serde(default = "default_gradient_step")]
  pub gradient_step: f64,

  #[serde(default)]
  pub use_full_affine: bool,

  #[serde(default = "default_true")]
  pub usefloat: bool,
}

impl Default for TemplateConstruction {
  fn default() -> Self {
    TemplateConstruction {
      dimension: Dimension::default(),
      input_file: None,
      input_images: None,
      image_statistic: None,
      iteration_limit: default_iteration_limit(),
      backup_images: None,
      parallel_control: ParallelControl::default(),
      num_cores: default_one(),
      num_modalities: default_one(),
      modality_weights: None,
      n4_bias_correct: true,
      metric: default_metric(),
      transform: Transform::default(),
      output_prefix: None,
      gradient_step: default_gradient_step(),
      use_full_affine: false,
      usefloat: true,
    }
  }
}

impl TemplateConstruction {
  pub fn with_images(images: impl IntoIterator<Item = ImageInput>) -> Self {
    TemplateConstruction {
      input_images: Some(images.into_iter().collect()),
      ..Default::default()
    }
  }

  pub fn with_input_file(path: impl Into<PathBuf>) -> Self {
    TemplateConstruction {
      input_file: Some(path.into()),
      ..Default::default()
    }
  }

  pub fn prefix(&self) -> &str {
    self.output_prefix.as_deref().unwrap_or(DEFAULT_PREFIX)
  }
}

/// Files written by a successful template construction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TemplateOutputs {
  /// One template per modality.
  pub templates: Vec<PathBuf>,
  /// `[affine, warp]` per input.
  pub forward_transforms: Vec<[PathBuf; 2]>,
  /// `[inverse warp, affine]` per input; the affine is the forward one.
  pub reverse_transforms: Vec<[PathBuf; 2]>,
}

impl OutputFiles for TemplateOutputs {
  fn files(&self) -> Vec<&Path> {
    // The reverse pair repeats the forward affine, so only its warp is new.
    self
      .templates
      .iter()
      .chain(self.forward_transforms.iter().flatten())
      .chain(self.reverse_transforms.iter().map(|[inv_warp, _]| inv_warp))
      .map(PathBuf::as_path)
      .collect()
  }
}

impl Interface for TemplateConstruction {
  type Outputs = TemplateOutputs;

  const NAME: &'static str = NAME;

  fn program(&self) -> &'static str {
    "antsMultivariateTemplateConstruction2.sh"
  }

  fn validate(&self) -> Result<(), ValidationError> {
    exactly_one(
      NAME,
      &[
        ("input_images", self.input_images.is_some()),
        ("input_file", self.input_file.is_some()),
      ],
    )?;

    if let Some(input_file) = &self.input_file {
      require_file(NAME, "input_file", input_file)?;
    }

    if let Some(images) = &self.input_images {
      require_non_empty(NAME, "input_images", images)?;
      // The script sees base names only, so two files may not share one.
      let mut seen = HashSet::new();
      for image in images {
        require_non_empty(NAME, "input_images", image.files())?;
        for file in image.files() {
          require_file(NAME, "input_images", file)?;
          let name = basename(file);
          if !seen.insert(name.clone()) {
            return Err(ValidationError::DuplicateBasename {
              interface: NAME,
              name: "input_images",
              basename: name,
            });
          }
        }
      }
    }

    if self.num_modalities == 0 {
      return Err(ValidationError::OutOfRange {
        interface: NAME,
        name: "num_modalities",
        value: self.num_modalities.to_string(),
        expected: "at least 1",
      });
    }

    if self.num_cores == 0 {
      return Err(ValidationError::OutOfRange {
        interface: NAME,
        name: "num_cores",
        value: self.num_cores.to_string(),
        expected: "at least 1",
      });
    }

    Ok(())
  }

  fn arguments(&self) -> Vec<Argument> {
    let mut args = vec![
      Argument::flag("dimension", "-d", ArgValue::Int(self.dimension.into())),
      Argument::flag(
        "iteration_limit",
        "-i",
        ArgValue::Int(self.iteration_limit.into()),
      ),
      Argument::flag(
        "parallel_control",
        "-c",
        ArgValue::Int(u8::from(self.parallel_control).into()),
      ),
      Argument::flag("num_cores", "-j", ArgValue::Int(self.num_cores.into())),
      Argument::flag(
        "num_modalities",
        "-k",
        ArgValue::Int(self.num_modalities.into()),
      ),
      Argument::flag(
        "n4_bias_correct",
        "-n",
        ArgValue::Bool(self.n4_bias_correct),
      ),
      Argument::flag("metric", "-m", ArgValue::Str(self.metric.clone())),
      Argument::flag("transform", "-t", ArgValue::Str(self.transform.to_string())),
      Argument::flag(
        "gradient_step",
        "-g",
        ArgValue::Float {
          value: self.gradient_step,
          precision: 3,
        },
      ),
      Argument::flag(
        "use_full_affine",
        "-y",
        ArgValue::Bool(self.use_full_affine),
      ),
      Argument::flag("usefloat", "-e", ArgValue::Bool(self.usefloat)),
    ];

    if let Some(statistic) = self.image_statistic {
      args.push(Argument::flag(
        "image_statistic",
        "-a",
        ArgValue::Int(u8::from(statistic).into()),
      ));
    }

    if let Some(backup) = self.backup_images {
      args.push(Argument::flag("backup_images", "-b", ArgValue::Bool(backup)));
    }

    if let Some(weights) = &self.modality_weights {
      let items = weights
        .iter()
        .map(|&value| ArgValue::Float {
          value,
          precision: 3,
        })
        .collect();
      args.push(Argument::flag(
        "modality_weights",
        "-w",
        ArgValue::Joined {
          items,
          separator: "x",
        },
      ));
    }

    if let Some(prefix) = &self.output_prefix {
      args.push(Argument::flag(
        "output_prefix",
        "-o",
        ArgValue::Str(prefix.clone()),
      ));
    }

    if let Some(input_file) = &self.input_file {
      args.push(Argument::positional(
        "input_file",
        Position::Trailing,
        ArgValue::File(input_file.clone()),
      ));
    }

    if let Some(images) = &self.input_images {
      // The script runs next to its inputs, so only base names are passed.
      let names = images
        .iter()
        .flat_map(ImageInput::files)
        .map(|file| ArgValue::Str(basename(file)))
        .collect();
      args.push(Argument::positional(
        "input_images",
        Position::Trailing,
        ArgValue::List(names),
      ));
    }

    args
  }

  fn environment(&self) -> Vec<(String, String)> {
    THREAD_ENV_VARS
      .iter()
      .map(|var| (var.to_string(), "1".to_string()))
      .collect()
  }

  fn staged_inputs(&self) -> Vec<&Path> {
    self
      .input_images
      .iter()
      .flatten()
      .flat_map(ImageInput::files)
      .map(PathBuf::as_path)
      .collect()
  }

  fn list_outputs(&self, cwd: &Path) -> Result<TemplateOutputs, AntsError> {
    if self.input_file.is_some() {
      return Err(AntsError::Unsupported {
        interface: NAME,
        reason: "output prediction is not implemented for manifest (input_file) inputs",
      });
    }

    let Some(images) = &self.input_images else {
      return Err(
        ValidationError::MissingOneOf {
          interface: NAME,
          names: vec!["input_images", "input_file"],
        }
        .into(),
      );
    };

    let prefix = self.prefix();
    let mut forward_transforms = Vec::with_capacity(images.len());
    let mut reverse_transforms = Vec::with_capacity(images.len());

    for (num, image) in images.iter().enumerate() {
      let primary = image.primary().ok_or(ValidationError::EmptyList {
        interface: NAME,
        name: "input_images",
      })?;
      let (_, fname, _) = split_filename(primary);

      let affine = cwd.join(format!("{prefix}{fname}{num}0GenericAffine.mat"));
      let warp = cwd.join(format!("{prefix}{fname}{num}1Warp.nii.gz"));
      let inv_warp = cwd.join(format!("{prefix}{fname}{num}1InverseWarp.nii.gz"));

      forward_transforms.push([affine.clone(), warp]);
      reverse_transforms.push([inv_warp, affine]);
    }

    let templates = (0..self.num_modalities)
      .map(|tnum| cwd.join(format!("{prefix}template{tnum}.nii.gz")))
      .collect();

    tracing::debug!(
      inputs = images.len(),
      modalities = self.num_modalities,
      "Predicted template construction outputs"
    );

    Ok(TemplateOutputs {
      templates,
      forward_transforms,
      reverse_transforms,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::fs;
  use tempfile::TempDir;
  use tempfile::tempdir;

  fn touch_all(dir: &TempDir, names: &[&str]) -> Vec<ImageInput> {
    names
      .iter()
      .map(|name| {
        let path = dir.path().join(name);
        fs::write(&path, b"").unwrap();
        ImageInput::Single(path)
      })
      .collect()
  }

  #[test]
  fn default_command_line() {
    let dir = tempdir().unwrap();
    let images = touch_all(&dir, &["a.nii.gz", "b.nii.gz"]);
    let cmd = TemplateConstruction::with_images(images).command_line().unwrap();

    assert_eq!(
      cmd.to_string(),
      "antsMultivariateTemplateConstruction2.sh -d 3 -g 0.250 -i 4 -m CC -n 1 -j 1 -k 1 \
       -c 0 -t BSplineSyN -y 0 -e 1 a.nii.gz b.nii.gz"
    );
  }

  #[test]
  fn formatting_is_deterministic() {
    let dir = tempdir().unwrap();
    let images = touch_all(&dir, &["a.nii.gz", "b.nii.gz"]);
    let inputs = TemplateConstruction {
      modality_weights: Some(vec![1.0, 0.5]),
      output_prefix: Some("tpl_".to_string()),
      image_statistic: Some(ImageStatistic::Median),
      ..TemplateConstruction::with_images(images)
    };

    let first = inputs.command_line().unwrap();
    let second = inputs.command_line().unwrap();
    assert_eq!(first.args, second.args);
    assert_eq!(first.env, second.env);
  }

  #[test]
  fn optional_flags_render_when_set() {
    let dir = tempdir().unwrap();
    let images = touch_all(&dir, &["a.nii.gz"]);
    let inputs = TemplateConstruction {
      modality_weights: Some(vec![1.0, 0.5]),
      output_prefix: Some("tpl_".to_string()),
      image_statistic: Some(ImageStatistic::Median),
      backup_images: Some(true),
      num_modalities: 2,
      parallel_control: ParallelControl::Pexec,
      num_cores: 8,
      transform: Transform::SyN,
      ..TemplateConstruction::with_images(images)
    };
    let line = inputs.command_line().unwrap().to_string();

    assert!(line.contains("-w 1.000x0.500"));
    assert!(line.contains("-o tpl_"));
    assert!(line.contains("-a 2"));
    assert!(line.contains("-b 1"));
    assert!(line.contains("-c 2 -t SyN"));
    assert!(line.contains("-j 8 -k 2"));
    assert!(line.ends_with(" a.nii.gz"));
  }

  #[test]
  fn multi_modality_inputs_pass_every_file() {
    let dir = tempdir().unwrap();
    let files = touch_all(&dir, &["s1_T1w.nii.gz", "s1_T2w.nii.gz"]);
    let files: Vec<PathBuf> = files
      .into_iter()
      .flat_map(|i| i.files().to_vec())
      .collect();
    let inputs = TemplateConstruction {
      num_modalities: 2,
      ..TemplateConstruction::with_images([ImageInput::Modalities(files)])
    };

    let cmd = inputs.command_line().unwrap();
    assert_eq!(cmd.args[cmd.args.len() - 2..], ["s1_T1w.nii.gz", "s1_T2w.nii.gz"]);
    assert_eq!(inputs.staged_inputs().len(), 2);
  }

  #[test]
  fn threads_are_pinned_in_child_environment() {
    let dir = tempdir().unwrap();
    let images = touch_all(&dir, &["a.nii.gz"]);
    let cmd = TemplateConstruction::with_images(images).command_line().unwrap();

    assert_eq!(cmd.env["ITK_GLOBAL_DEFAULT_NUMBER_OF_THREADS"], "1");
    assert_eq!(cmd.env["NSLOTS"], "1");
  }

  #[test]
  fn manifest_and_image_list_are_mutually_exclusive() {
    let dir = tempdir().unwrap();
    let images = touch_all(&dir, &["a.nii.gz"]);
    let manifest = dir.path().join("images.csv");
    fs::write(&manifest, "a.nii.gz\n").unwrap();

    let inputs = TemplateConstruction {
      input_file: Some(manifest),
      ..TemplateConstruction::with_images(images)
    };
    assert!(matches!(
      inputs.validate(),
      Err(ValidationError::MutuallyExclusive { .. })
    ));

    let neither = TemplateConstruction::default();
    assert!(matches!(
      neither.command_line(),
      Err(ValidationError::MissingOneOf { .. })
    ));
  }

  #[test]
  fn missing_input_image_fails_validation() {
    let inputs = TemplateConstruction::with_images([ImageInput::from("/no/such/a.nii.gz")]);
    assert!(matches!(
      inputs.validate(),
      Err(ValidationError::FileNotFound { .. })
    ));
  }

  #[test]
  fn images_sharing_a_base_name_fail_validation() {
    let dir = tempdir().unwrap();
    let first = dir.path().join("sub1").join("T1w.nii.gz");
    let second = dir.path().join("sub2").join("T1w.nii.gz");
    for file in [&first, &second] {
      fs::create_dir_all(file.parent().unwrap()).unwrap();
      fs::write(file, b"").unwrap();
    }

    let inputs = TemplateConstruction::with_images([
      ImageInput::Single(first),
      ImageInput::Single(second),
    ]);
    assert!(matches!(
      inputs.validate(),
      Err(ValidationError::DuplicateBasename { ref basename, .. }) if basename == "T1w.nii.gz"
    ));
  }

  #[test]
  fn manifest_input_renders_as_trailing_file() {
    let dir = tempdir().unwrap();
    let manifest = dir.path().join("images.csv");
    fs::write(&manifest, "a.nii.gz\n").unwrap();

    let cmd = TemplateConstruction::with_input_file(&manifest)
      .command_line()
      .unwrap();
    assert_eq!(cmd.args.last().unwrap(), &manifest.display().to_string());
  }

  #[test]
  fn predicts_forward_and_reverse_transforms() {
    let inputs = TemplateConstruction::with_images([
      ImageInput::from("a.nii.gz"),
      ImageInput::from("b.nii.gz"),
    ]);
    let outputs = inputs.list_outputs(Path::new("/work")).unwrap();

    let p = PathBuf::from;
    assert_eq!(
      outputs.forward_transforms,
      vec![
        [
          p("/work/antsBTPa00GenericAffine.mat"),
          p("/work/antsBTPa01Warp.nii.gz")
        ],
        [
          p("/work/antsBTPb10GenericAffine.mat"),
          p("/work/antsBTPb11Warp.nii.gz")
        ],
      ]
    );
    assert_eq!(
      outputs.reverse_transforms,
      vec![
        [
          p("/work/antsBTPa01InverseWarp.nii.gz"),
          p("/work/antsBTPa00GenericAffine.mat")
        ],
        [
          p("/work/antsBTPb11InverseWarp.nii.gz"),
          p("/work/antsBTPb10GenericAffine.mat")
        ],
      ]
    );
    assert_eq!(outputs.templates, vec![p("/work/antsBTPtemplate0.nii.gz")]);
    // Shared affine is listed once for the existence check.
    assert_eq!(outputs.files().len(), 1 + 4 + 2);
  }

  #[test]
  fn predicts_one_template_per_modality() {
    let inputs = TemplateConstruction {
      num_modalities: 2,
      ..TemplateConstruction::with_images([ImageInput::Modalities(vec![
        PathBuf::from("/data/sub1_T1w.nii.gz"),
        PathBuf::from("/data/sub1_T2w.nii.gz"),
      ])])
    };
    let outputs = inputs.list_outputs(Path::new("/work")).unwrap();

    assert_eq!(
      outputs.templates,
      vec![
        PathBuf::from("/work/antsBTPtemplate0.nii.gz"),
        PathBuf::from("/work/antsBTPtemplate1.nii.gz"),
      ]
    );
    // Only the first modality names the transforms.
    assert_eq!(
      outputs.forward_transforms[0][0],
      PathBuf::from("/work/antsBTPsub1_T1w00GenericAffine.mat")
    );
  }

  #[test]
  fn custom_prefix_is_used_in_predictions() {
    let inputs = TemplateConstruction {
      output_prefix: Some("tpl_".to_string()),
      ..TemplateConstruction::with_images([ImageInput::from("x/a.nii")])
    };
    let outputs = inputs.list_outputs(Path::new("/work")).unwrap();
    assert_eq!(
      outputs.forward_transforms[0][1],
      PathBuf::from("/work/tpl_a01Warp.nii.gz")
    );
  }

  #[test]
  fn manifest_input_cannot_predict_outputs() {
    let inputs = TemplateConstruction::with_input_file("images.csv");
    let err = inputs.list_outputs(Path::new("/work")).unwrap_err();
    assert!(matches!(err, AntsError::Unsupported { .. }));
  }

  #[test]
  fn deserializes_with_defaults() {
    let inputs: TemplateConstruction = serde_json::from_str(
      r#"{"input_images": ["a.nii.gz", ["b_T1w.nii.gz", "b_T2w.nii.gz"]], "transform": "Affine"}"#,
    )
    .unwrap();

    assert_eq!(inputs.iteration_limit, 4);
    assert_eq!(inputs.gradient_step, 0.25);
    assert_eq!(inputs.metric, "CC");
    assert_eq!(inputs.transform, Transform::Affine);
    assert_eq!(inputs.prefix(), "antsBTP");
    assert_eq!(inputs.input_images.as_ref().unwrap()[1].files().len(), 2);

    assert!(serde_json::from_str::<TemplateConstruction>(r#"{"parallel_control": 9}"#).is_err());
    assert!(serde_json::from_str::<TemplateConstruction>(r#"{"transform": "Rigid"}"#).is_err());
  }
}
