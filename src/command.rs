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
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// A typed argument value and the rule used to render it as tokens.
#[derive(Debug, Clone, PartialEq)]
pub enum ArgValue {
  Int(i64),
  /// A float printed with a fixed number of decimals.
  Float { value: f64, precision: usize },
  Str(String),
  /// Rendered as `1` or `0`.
  Bool(bool),
  File(PathBuf),
  /// Every item becomes its own token.
  List(Vec<ArgValue>),
  /// Items concatenated into a single token with `separator` between them.
  Joined {
    items: Vec<ArgValue>,
    separator: &'static str,
  },
}

impl ArgValue {
  fn render(&self) -> Vec<String> {
    match self {
      ArgValue::Int(v) => vec![v.to_string()],
      ArgValue::Float { value, precision } => vec![format!("{:.*}", *precision, value)],
      ArgValue::Str(s) => vec![s.clone()],
      ArgValue::Bool(b) => vec![u8::from(*b).to_string()],
      ArgValue::File(p) => vec![p.display().to_string()],
      ArgValue::List(items) => items.iter().flat_map(ArgValue::render).collect(),
      ArgValue::Joined { items, separator } => {
        let parts: Vec<String> = items.iter().flat_map(ArgValue::render).collect();
        vec![parts.join(separator)]
      }
    }
  }
}

/// Where an argument lands on the command line.
///
/// Leading arguments come first in ordinal order, unordered ones follow
/// sorted by name, and trailing ones close the line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Position {
  Leading(usize),
  Unordered,
  Trailing,
}

/// A single resolved command-line argument.
#[derive(Debug, Clone, PartialEq)]
pub struct Argument {
  pub name: &'static str,
  pub flag: Option<&'static str>,
  pub position: Position,
  pub value: ArgValue,
}

impl Argument {
  /// A `flag value` pair with no fixed position.
  pub fn flag(name: &'static str, flag: &'static str, value: ArgValue) -> Self {
    Argument {
      name,
      flag: Some(flag),
      position: Position::Unordered,
      value,
    }
  }

  /// A bare value at a fixed position.
  pub fn positional(name: &'static str, position: Position, value: ArgValue) -> Self {
    Argument {
      name,
      flag: None,
      position,
      value,
    }
  }

  pub fn tokens(&self) -> Vec<String> {
    let mut tokens: Vec<String> = self.flag.iter().map(|f| f.to_string()).collect();
    tokens.extend(self.value.render());
    tokens
  }
}

/// Holds the program, ordered arguments and environment for one tool call.
///
/// This is the only artifact handed to the subprocess launcher.
#[derive(Debug, Clone, Serialize)]
pub struct CommandLine {
  /// The program to execute (e.g., "ImageMath").
  pub command: String,

  /// Rendered argument tokens in final order.
  #[serde(skip_serializing_if = "Vec::is_empty")]
  pub args: Vec<String>,

  /// Environment variables set for the child process only.
  #[serde(skip_serializing_if = "BTreeMap::is_empty")]
  pub env: BTreeMap<String, String>,
}

impl CommandLine {
  pub fn new(
    command: impl Into<String>,
    mut arguments: Vec<Argument>,
    env: impl IntoIterator<Item = (String, String)>,
  ) -> Self {
    arguments.sort_by(|a, b| (a.position, a.name).cmp(&(b.position, b.name)));
    let args = arguments.iter().flat_map(Argument::tokens).collect();

    CommandLine {
      command: command.into(),
      args,
      env: env.into_iter().collect(),
    }
  }
}

impl fmt::Display for CommandLine {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.command)?;
    for arg in &self.args {
      write!(f, " {arg}")?;
    }
    Ok(())
  }
}
