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
use crate::error::ConfigError;
use figment::Figment;
use figment::providers::Env;
use figment::providers::Format;
use figment::providers::Json;
use figment::providers::Toml;
use serde::de::DeserializeOwned;
use std::path::Path;

/// Environment variables with this prefix override fields of the inputs,
/// e.g. `ANTSI_INPUT_NUM_CORES=8`.
pub const INPUT_ENV_PREFIX: &str = "ANTSI_INPUT_";

/// Builds the provider chain for interface inputs.
///
/// The inputs file is read as JSON when it ends in `.json` and as TOML
/// otherwise; environment overrides are merged on top.
pub fn inputs_figment(path: Option<&Path>) -> Figment {
  let figment = match path {
    Some(path) if path.extension().is_some_and(|ext| ext == "json") => {
      Figment::new().merge(Json::file(path))
    }
    Some(path) => Figment::new().merge(Toml::file(path)),
    None => Figment::new(),
  };

  figment.merge(Env::prefixed(INPUT_ENV_PREFIX))
}

/// Loads and type-checks interface inputs. Unset fields take the
/// interface's defaults.
pub fn load_inputs<T: DeserializeOwned>(path: Option<&Path>) -> Result<T, ConfigError> {
  if let Some(path) = path {
    // Figment silently skips missing files.
    if !path.exists() {
      return Err(ConfigError::InputsNotFound(path.to_path_buf()));
    }
    tracing::debug!(path = %path.display(), "Loading interface inputs");
  }

  inputs_figment(path)
    .extract()
    .map_err(|e| ConfigError::Extract(Box::new(e)))
}
