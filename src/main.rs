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
use Commands::Cmdline;
use Commands::ImageType;
use Commands::Outputs;
use Commands::Run;
use antsi::cli::Cli;
use antsi::cli::Commands;
use antsi::cli::InterfaceArgs;
use antsi::cli::InterfaceKind;
use antsi::cli::RunArgs;
use antsi::config::load_inputs;
use antsi::interface::Interface;
use antsi::interfaces::ConvertTransformFile;
use antsi::interfaces::ImageMath;
use antsi::interfaces::TemplateConstruction;
use antsi::interfaces::image_type;
use antsi::logging::setup_tracing;
use antsi::runner::Launcher;
use antsi::runner::run;
use anyhow::Result;
use clap::Parser;
use serde_json::Value;
use serde_json::json;
use std::path::PathBuf;
use tracing::Instrument;

/// What to do with a loaded interface.
enum Action {
  Cmdline,
  Outputs(PathBuf),
  Run(Launcher),
}

#[tokio::main]
async fn main() -> Result<()> {
  let _guard = setup_tracing()?;

  let Cli { command } = Cli::parse();
  let main_span = tracing::info_span!("antsi");

  let result = match command {
    Cmdline(interface) => dispatch(interface, Action::Cmdline).instrument(main_span).await?,
    Outputs { interface, cwd } => {
      let cwd = resolve_cwd(cwd)?;
      dispatch(interface, Action::Outputs(cwd))
        .instrument(main_span)
        .await?
    }
    Run(RunArgs {
      interface,
      cwd,
      bin_dir,
      stage_inputs,
    }) => {
      let launcher = Launcher {
        cwd: resolve_cwd(cwd)?,
        bin_dir,
        stage_inputs,
      };
      dispatch(interface, Action::Run(launcher))
        .instrument(main_span)
        .await?
    }
    ImageType { image } => {
      let _enter = main_span.enter();
      json!({ "image_type": image_type(&image)? })
    }
  };

  println!("{}", serde_json::to_string(&result)?);
  Ok(())
}

fn resolve_cwd(cwd: Option<PathBuf>) -> Result<PathBuf> {
  match cwd {
    Some(cwd) => Ok(cwd),
    None => Ok(std::env::current_dir()?),
  }
}

async fn dispatch(
  InterfaceArgs { interface, inputs }: InterfaceArgs,
  action: Action,
) -> Result<Value> {
  let inputs = inputs.as_deref();
  match interface {
    InterfaceKind::TemplateConstruction => {
      handle(load_inputs::<TemplateConstruction>(inputs)?, action).await
    }
    InterfaceKind::ImageMath => handle(load_inputs::<ImageMath>(inputs)?, action).await,
    InterfaceKind::ConvertTransformFile => {
      handle(load_inputs::<ConvertTransformFile>(inputs)?, action).await
    }
  }
}

async fn handle<I: Interface>(interface: I, action: Action) -> Result<Value> {
  let value = match action {
    Action::Cmdline => serde_json::to_value(interface.command_line()?)?,
    Action::Outputs(cwd) => serde_json::to_value(interface.list_outputs(&cwd)?)?,
    Action::Run(launcher) => {
      tracing::info!("Running {}...", I::NAME);
      serde_json::to_value(run(&interface, &launcher).await?)?
    }
  };
  Ok(value)
}
