use std::fmt::Display;
use std::io::Write;
use std::str::FromStr;
use std::path::PathBuf;
use anyhow::{Context, Result};
use structopt::StructOpt;
use clap::arg_enum;

use ridesched::pipeline::Artifacts;
use ridesched::solver::{SolverBackend, Z3Backend};

clap::arg_enum! {
  #[derive(Debug, Copy, Clone)]
  pub enum SolverKind {
    Z3,
    Gurobi,
  }
}

impl SolverKind {
  pub fn backend(self) -> Result<Box<dyn SolverBackend>> {
    match self {
      SolverKind::Z3 => Ok(Box::new(Z3Backend)),
      #[cfg(feature = "grb")]
      SolverKind::Gurobi => Ok(Box::new(ridesched::solver::GurobiBackend::new()?)),
      #[cfg(not(feature = "grb"))]
      SolverKind::Gurobi => Err(anyhow::anyhow!("built without the `grb` feature")),
    }
  }
}

#[derive(Clone, Debug, StructOpt)]
pub struct OutputOptions {
  /// Route file, one line per vehicle.
  #[structopt(long="output", short="o", default_value="out.txt")]
  pub file: PathBuf,
  /// Write a JSON summary of the run here.
  #[structopt(long)]
  pub summary: Option<PathBuf>,
  /// Write a JSON log here, in addition to stderr.
  #[structopt(long)]
  pub log: Option<PathBuf>,
}

#[derive(Clone, Debug, StructOpt)]
pub struct ArtifactOptions {
  #[structopt(long="model", default_value="model.lp")]
  pub model: PathBuf,
  #[structopt(long="solution", default_value="model.sol")]
  pub solution: PathBuf,
  #[structopt(long="no-artifacts")]
  pub disabled: bool,
}

impl ArtifactOptions {
  pub fn artifacts(&self) -> Artifacts {
    if self.disabled {
      Artifacts::default()
    } else {
      Artifacts { model: Some(self.model.clone()), solution: Some(self.solution.clone()) }
    }
  }
}

pub fn clap_range_validator<T>(minval: Option<T>, maxval: Option<T>) -> impl Fn(String) -> Result<(), String>
    where
        T: FromStr + PartialOrd + Display + Copy,
        T::Err: Display
{
    return move |val| {
        let x: T = val.parse().map_err(|e: T::Err| e.to_string())?;
        if let Some(y) = minval {
            if x < y { return Err(format!("must be at least {}", y)); }
        }
        if let Some(y) = maxval {
            if x > y { return Err(format!("must be at most {}", y)); }
        }
        return Ok(());
    };
}

pub fn write_file(path: &PathBuf, f: impl FnOnce(&mut std::io::BufWriter<std::fs::File>) -> Result<()>) -> Result<()> {
  let file = std::fs::File::create(path).with_context(|| format!("unable to create {}", path.display()))?;
  let mut writer = std::io::BufWriter::new(file);
  f(&mut writer)
    .and_then(|()| Ok(writer.flush()?))
    .with_context(|| format!("unable to write {}", path.display()))
}
