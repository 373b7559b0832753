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
use crate::command::CommandLine;
use crate::error::AntsError;
use crate::error::RunError;
use crate::filename::basename;
use crate::interface::Interface;
use crate::interface::OutputFiles;
use std::fs;
use std::io;
use std::path::Path;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::io::AsyncBufReadExt;
use tokio::io::AsyncRead;
use tokio::io::BufReader;
use tokio::process::Command;
use tracing::Instrument;

/// Where and how an external tool is launched.
#[derive(Debug, Clone)]
pub struct Launcher {
  /// Working directory of the child; predicted outputs are resolved here.
  pub cwd: PathBuf,

  /// Directory holding the ANTs binaries. `PATH` lookup when `None`.
  pub bin_dir: Option<PathBuf>,

  /// Link base-name-only inputs into `cwd` before launching.
  pub stage_inputs: bool,
}

impl Launcher {
  pub fn new(cwd: impl Into<PathBuf>) -> Self {
    Launcher {
      cwd: cwd.into(),
      bin_dir: None,
      stage_inputs: false,
    }
  }

  fn program_path(&self, program: &str) -> PathBuf {
    match &self.bin_dir {
      Some(dir) => dir.join(program),
      None => PathBuf::from(program),
    }
  }
}

/// Validates, launches the tool, and returns its outputs once every predicted
/// file exists. External failures are reported as-is and never retried.
pub async fn run<I: Interface>(
  interface: &I,
  launcher: &Launcher,
) -> Result<I::Outputs, AntsError> {
  let span = tracing::info_span!("run_interface", interface = I::NAME);

  async {
    let command_line = interface.command_line()?;

    if launcher.stage_inputs {
      stage_inputs(&interface.staged_inputs(), &launcher.cwd)?;
    }

    execute(&command_line, launcher).await?;

    let outputs = interface.list_outputs(&launcher.cwd)?;
    for path in outputs.files() {
      if !path.exists() {
        return Err(RunError::MissingOutput(path.to_path_buf()).into());
      }
    }

    tracing::info!("{} finished", I::NAME);
    Ok(outputs)
  }
  .instrument(span)
  .await
}

/// Makes files available in `dir` under their base names. An existing entry
/// is kept only when it resolves to the same file.
fn stage_inputs(files: &[&Path], dir: &Path) -> Result<(), RunError> {
  for file in files {
    let target = dir.join(basename(file));
    if fs::symlink_metadata(&target).is_ok() {
      same_file(file, &target).map_err(|source| RunError::Stage {
        path: file.to_path_buf(),
        dir: dir.to_path_buf(),
        source,
      })?;
      continue;
    }

    tracing::debug!(from = %file.display(), to = %target.display(), "Staging input");
    let staged = std::path::absolute(file).and_then(|source| link_or_copy(&source, &target));
    staged.map_err(|source| RunError::Stage {
      path: file.to_path_buf(),
      dir: dir.to_path_buf(),
      source,
    })?;
  }
  Ok(())
}

fn same_file(file: &Path, target: &Path) -> io::Result<()> {
  if fs::canonicalize(file)? == fs::canonicalize(target)? {
    Ok(())
  } else {
    Err(io::Error::new(
      io::ErrorKind::AlreadyExists,
      format!("{} is a different file", target.display()),
    ))
  }
}

#[cfg(unix)]
fn link_or_copy(source: &Path, target: &Path) -> io::Result<()> {
  std::os::unix::fs::symlink(source, target)
}

#[cfg(not(unix))]
fn link_or_copy(source: &Path, target: &Path) -> io::Result<()> {
  fs::copy(source, target).map(|_| ())
}

/// Spawns the command, forwards its output to the log and waits for it.
async fn execute(command_line: &CommandLine, launcher: &Launcher) -> Result<(), RunError> {
  let program = launcher.program_path(&command_line.command);
  let command_str = command_line.to_string();

  let mut cmd = Command::new(&program);
  cmd
    .args(&command_line.args)
    .envs(&command_line.env)
    .current_dir(&launcher.cwd)
    .stdin(Stdio::null())
    .stdout(Stdio::piped())
    .stderr(Stdio::piped())
    .kill_on_drop(true);

  tracing::info!(cwd = %launcher.cwd.display(), "Running: {}", command_str);
  tracing::debug!(cmd = ?cmd, "Spawning tool");
  let mut child = cmd.spawn().map_err(|source| RunError::Spawn {
    command: program.display().to_string(),
    source,
  })?;

  let stdout = child.stdout.take().ok_or_else(|| RunError::Pipe {
    command: command_str.clone(),
    target: "stdout",
  })?;
  let stderr = child.stderr.take().ok_or_else(|| RunError::Pipe {
    command: command_str.clone(),
    target: "stderr",
  })?;

  let stdout_task = tokio::spawn(
    read_and_log(stdout, "stdout").instrument(tracing::info_span!("stream", target = "stdout")),
  );
  let stderr_task = tokio::spawn(
    read_and_log(stderr, "stderr").instrument(tracing::info_span!("stream", target = "stderr")),
  );

  let status = child.wait().await.map_err(|source| RunError::Wait {
    command: command_str.clone(),
    source,
  })?;

  stdout_task.await??;
  stderr_task.await??;

  if !status.success() {
    tracing::error!(code = ?status.code(), "Tool process failed");
    return Err(RunError::NonZeroExit {
      command: command_str,
      code: status.code(),
    });
  }

  Ok(())
}

/// Reads lines from a child stream and logs them.
async fn read_and_log<R: AsyncRead + Unpin>(
  stream: R,
  target: &'static str,
) -> Result<(), RunError> {
  let mut reader = BufReader::new(stream).lines();

  while let Some(line) = reader
    .next_line()
    .await
    .map_err(|source| RunError::ReadStream { target, source })?
  {
    match target {
      "stderr" => tracing::warn!(target, "{}", line),
      _ => tracing::info!(target, "{}", line),
    }
  }
  Ok(())
}
