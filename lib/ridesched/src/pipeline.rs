//! Chains the stages from a loaded instance to vehicle routes.
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use anyhow::Result;
use tracing::*;

use crate::Error;
use crate::data::*;
use crate::encoder::encode;
use crate::feasibility::precompute;
use crate::routes::{reconstruct, Route};
use crate::simulate::{score, Score};
use crate::solver::{SolveStatus, SolverBackend};
use crate::verify;

/// Where to write the model and solution files; `None` skips the file.
#[derive(Debug, Clone, Default)]
pub struct Artifacts {
    pub model: Option<PathBuf>,
    pub solution: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct Outcome {
    pub routes: Vec<Route>,
    pub status: SolveStatus,
    pub objective: i64,
    pub score: Score,
    pub violations: usize,
    pub size_info: HashMap<String, isize>,
}

impl Outcome {
    pub fn to_json(&self, data: &RideInstance) -> json::JsonValue {
        json::object!{
            instance: data.id.clone(),
            status: format!("{:?}", self.status),
            objective: self.objective,
            upper_bound: data.score_upper_bound(),
            score: self.score.total(),
            rides_completed: self.score.rides_completed,
            rides_on_time: self.score.rides_on_time,
            violations: self.violations,
            model: self.size_info.clone(),
            routes: self.routes.clone(),
        }
    }
}

/// Runs precompute, encode, solve and reconstruct on `data`.
///
/// Fails with [`Error::Solver`] if the backend errors or panics, and with
/// [`Error::NoSolution`] if it finishes without an assignment.
#[instrument(level="info", skip_all, fields(id=%data.id, backend=backend.name()))]
pub fn run(data: &RideInstance, backend: &mut dyn SolverBackend, artifacts: &Artifacts) -> Result<Outcome> {
    let feas = precompute(data);
    let enc = encode(data, &feas);

    if let Some(path) = &artifacts.model {
        backend.write_model(&enc.model, path)?;
        debug!(path=%path.display(), "wrote model");
    }

    let model = &enc.model;
    let sol = match panic::catch_unwind(AssertUnwindSafe(|| backend.optimize(model))) {
        Ok(Ok(sol)) => sol,
        Ok(Err(e)) => return Err(Error::Solver(format!("{:#}", e)).into()),
        Err(_) => return Err(Error::Solver(format!("{} backend panicked", backend.name())).into()),
    };
    if !sol.status.has_solution() {
        error!(status=?sol.status, "no solution");
        return Err(Error::NoSolution(sol.status).into());
    }

    if let Some(path) = &artifacts.solution {
        backend.write_solution(model, &sol, path)?;
        debug!(path=%path.display(), "wrote solution");
    }

    let routes = reconstruct(data.n_vehicles, &feas, &enc.vars, &sol);
    let violations = verify::check(data, &feas, &enc.vars, &sol, &routes).len();
    let score = score(data, &routes);
    let objective = sol.objective.map_or(0, |x| x.round() as i64);
    if score.total() < objective {
        warn!(objective, score=score.total(), "simulated score below model objective");
    }
    info!(objective, score=score.total(), rides=score.rides_completed, "done");

    Ok(Outcome {
        routes,
        status: sol.status,
        objective,
        score,
        violations,
        size_info: enc.size_info,
    })
}
