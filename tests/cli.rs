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
use assert_cmd::cargo;
use assert_cmd::prelude::*;
use ndarray::Array;
use nifti::writer::WriterOptions;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::process::Command;
use tempfile::tempdir;

fn antsi() -> Command {
  let mut cmd = Command::new(cargo::cargo_bin!("antsi"));
  cmd.env("CLICOLOR", "0");
  cmd
}

#[test]
fn test_image_math_cmdline() {
  let temp = tempdir().unwrap();
  let in_file = temp.path().join("brain.nii.gz");
  fs::write(&in_file, b"").unwrap();
  let inputs = temp.path().join("inputs.json");
  fs::write(
    &inputs,
    serde_json::json!({ "in_file": in_file, "operation": "m" }).to_string(),
  )
  .unwrap();

  let output = antsi()
    .arg("cmdline")
    .arg("image-math")
    .arg("--inputs")
    .arg(&inputs)
    .output()
    .unwrap();
  assert!(output.status.success());

  let json: Value = serde_json::from_slice(&output.stdout).unwrap();
  assert_eq!(json["command"], "ImageMath");
  assert_eq!(json["args"][0], "3");
  assert_eq!(json["args"][1], "brain_m.nii.gz");
  assert_eq!(json["args"][2], "m");
  assert_eq!(json["args"][3], in_file.display().to_string());
}

#[test]
fn test_template_outputs_prediction() {
  let temp = tempdir().unwrap();
  let inputs = temp.path().join("inputs.toml");
  fs::write(
    &inputs,
    r#"
      input_images = ["a.nii.gz", "b.nii.gz"]
      num_modalities = 2
    "#,
  )
  .unwrap();

  let output = antsi()
    .arg("outputs")
    .arg("template-construction")
    .arg("--inputs")
    .arg(&inputs)
    .arg("--cwd")
    .arg("/work")
    .output()
    .unwrap();
  assert!(output.status.success());

  let json: Value = serde_json::from_slice(&output.stdout).unwrap();
  assert_eq!(
    json["forward_transforms"],
    serde_json::json!([
      ["/work/antsBTPa00GenericAffine.mat", "/work/antsBTPa01Warp.nii.gz"],
      ["/work/antsBTPb10GenericAffine.mat", "/work/antsBTPb11Warp.nii.gz"],
    ])
  );
  assert_eq!(
    json["reverse_transforms"][1],
    serde_json::json!([
      "/work/antsBTPb11InverseWarp.nii.gz",
      "/work/antsBTPb10GenericAffine.mat"
    ])
  );
  assert_eq!(
    json["templates"],
    serde_json::json!(["/work/antsBTPtemplate0.nii.gz", "/work/antsBTPtemplate1.nii.gz"])
  );
}

#[test]
fn test_template_manifest_outputs_not_supported() {
  let temp = tempdir().unwrap();
  let inputs = temp.path().join("inputs.toml");
  fs::write(&inputs, r#"input_file = "images.csv""#).unwrap();

  antsi()
    .arg("outputs")
    .arg("template-construction")
    .arg("--inputs")
    .arg(&inputs)
    .assert()
    .failure()
    .stdout(predicate::str::is_empty())
    .stderr(predicate::str::contains("not implemented for manifest"));
}

#[test]
fn test_template_xor_validation() {
  let temp = tempdir().unwrap();
  let image = temp.path().join("a.nii.gz");
  let manifest = temp.path().join("images.csv");
  fs::write(&image, b"").unwrap();
  fs::write(&manifest, "a.nii.gz\n").unwrap();
  let inputs = temp.path().join("inputs.json");
  fs::write(
    &inputs,
    serde_json::json!({ "input_images": [image], "input_file": manifest }).to_string(),
  )
  .unwrap();

  antsi()
    .arg("cmdline")
    .arg("template-construction")
    .arg("--inputs")
    .arg(&inputs)
    .assert()
    .failure()
    .stderr(predicate::str::contains("mutually exclusive"));
}

#[test]
fn test_env_overrides_inputs() {
  let temp = tempdir().unwrap();
  let xfm = temp.path().join("xfm.mat");
  fs::write(&xfm, b"").unwrap();

  antsi()
    .arg("outputs")
    .arg("convert-transform-file")
    .arg("--cwd")
    .arg("/work")
    .env("ANTSI_INPUT_IN_TRANSFORM", &xfm)
    .assert()
    .success()
    .stdout(predicate::str::contains(r#"{"out_transform":"/work/xfm.txt"}"#));
}

#[test]
fn test_image_type() {
  let temp = tempdir().unwrap();
  let dwi = temp.path().join("dwi.nii.gz");
  let t1 = temp.path().join("t1.nii.gz");
  WriterOptions::new(&dwi)
    .write_nifti(&Array::<f32, _>::zeros((3, 3, 3, 2)))
    .unwrap();
  WriterOptions::new(&t1)
    .write_nifti(&Array::<f32, _>::zeros((3, 3, 3)))
    .unwrap();

  antsi()
    .arg("image-type")
    .arg(&dwi)
    .assert()
    .success()
    .stdout(predicate::str::contains(r#"{"image_type":3}"#));

  antsi()
    .arg("image-type")
    .arg(&t1)
    .assert()
    .success()
    .stdout(predicate::str::contains(r#"{"image_type":0}"#));
}

#[cfg(unix)]
#[test]
fn test_run_with_fake_tool() {
  use std::os::unix::fs::PermissionsExt;

  let temp = tempdir().unwrap();
  let bin = temp.path().join("bin");
  let work = temp.path().join("work");
  fs::create_dir_all(&bin).unwrap();
  fs::create_dir_all(&work).unwrap();

  let in_file = temp.path().join("brain.nii.gz");
  fs::write(&in_file, b"").unwrap();

  let script = bin.join("ImageMath");
  fs::write(&script, "#!/bin/sh\necho \"ImageMath $*\"\ntouch \"$2\"\n").unwrap();
  fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();

  let inputs = temp.path().join("inputs.toml");
  fs::write(
    &inputs,
    format!(
      "in_file = \"{}\"\noperation = \"Normalize\"\n",
      in_file.display()
    ),
  )
  .unwrap();

  antsi()
    .arg("run")
    .arg("image-math")
    .arg("--inputs")
    .arg(&inputs)
    .arg("--cwd")
    .arg(&work)
    .arg("--bin-dir")
    .arg(&bin)
    .assert()
    .success()
    .stdout(predicate::str::contains("brain_Normalize.nii.gz"))
    .stderr(predicate::str::contains("ImageMath finished"));

  assert!(work.join("brain_Normalize.nii.gz").exists());
}

#[cfg(unix)]
#[test]
fn test_run_propagates_tool_failure() {
  use std::os::unix::fs::PermissionsExt;

  let temp = tempdir().unwrap();
  let xfm = temp.path().join("xfm.mat");
  fs::write(&xfm, b"").unwrap();

  let script = temp.path().join("ConvertTransformFile");
  fs::write(&script, "#!/bin/sh\necho 'cannot read transform' >&2\nexit 2\n").unwrap();
  fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();

  antsi()
    .arg("run")
    .arg("convert-transform-file")
    .arg("--cwd")
    .arg(temp.path())
    .env("ANTSI_BIN_DIR", temp.path())
    .env("ANTSI_INPUT_IN_TRANSFORM", &xfm)
    .assert()
    .failure()
    .stderr(predicate::str::contains("cannot read transform"))
    .stderr(predicate::str::contains("exited with status Some(2)"));
}
