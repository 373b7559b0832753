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
use clap::Args;
use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(version, about = "Typed command lines and output prediction for ANTs tools")]
pub struct Cli {
  #[command(subcommand)]
  pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
  /// Validate inputs and print the command line as JSON.
  Cmdline(InterfaceArgs),

  /// Print the output paths the tool will produce.
  Outputs {
    #[command(flatten)]
    interface: InterfaceArgs,

    /// Directory the tool runs in. Defaults to the current directory.
    #[arg(long, env = "ANTSI_CWD")]
    cwd: Option<PathBuf>,
  },

  /// Run the tool and print its outputs once they all exist.
  Run(RunArgs),

  /// Print the `--input-image-type` code of a NIfTI image.
  ImageType {
    /// Path to a .nii, .nii.gz or .hdr file.
    image: PathBuf,
  },
}

/// Which tool to drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum InterfaceKind {
  /// antsMultivariateTemplateConstruction2.sh
  TemplateConstruction,
  /// ImageMath
  ImageMath,
  /// ConvertTransformFile
  ConvertTransformFile,
}

#[derive(Debug, Args)]
pub struct InterfaceArgs {
  #[arg(value_enum)]
  pub interface: InterfaceKind,

  /// TOML or JSON file with the interface inputs. Fields can also be set
  /// through `ANTSI_INPUT_<FIELD>` environment variables.
  #[arg(long)]
  pub inputs: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct RunArgs {
  #[command(flatten)]
  pub interface: InterfaceArgs,

  /// Working directory of the tool. Defaults to the current directory.
  #[arg(long, env = "ANTSI_CWD")]
  pub cwd: Option<PathBuf>,

  /// Directory containing the ANTs binaries. Uses `PATH` when omitted.
  #[arg(long, env = "ANTSI_BIN_DIR")]
  pub bin_dir: Option<PathBuf>,

  /// Link input images into the working directory before running.
  #[arg(long)]
  pub stage_inputs: bool,
}
