//! Gurobi backend.  Needs the `grb` feature and a Gurobi licence at run time.
use std::path::Path;
use anyhow::{anyhow, Result};
use grb::{attr, param, Status};
use tracing::*;

use super::{Solution, SolveStatus, SolverBackend};
use crate::mip::{LinExpr, Model, Sense, VarType};

/// A [`Model`] loaded into Gurobi.
struct Loaded {
    name: String,
    shape: (usize, usize),
    model: grb::Model,
    vars: Vec<grb::Var>,
}

impl Loaded {
    fn matches(&self, model: &Model) -> bool {
        self.name == model.name && self.shape == (model.num_vars(), model.num_constrs())
    }
}

/// Branch-and-cut with Gurobi.  Model and solution files are written with Gurobi's own
/// writer, so their format follows the file extension.
pub struct GurobiBackend {
    env: grb::Env,
    loaded: Option<Loaded>,
}

impl GurobiBackend {
    pub fn new() -> Result<Self> {
        let mut env = grb::Env::empty()?;
        env.set(param::OutputFlag, 0)?;
        Ok(GurobiBackend { env: env.start()?, loaded: None })
    }

    fn load(&mut self, model: &Model) -> Result<&mut Loaded> {
        let reuse = self.loaded.as_ref().map_or(false, |l| l.matches(model));
        if !reuse {
            self.loaded = Some(translate(&self.env, model)?);
        }
        self.loaded.as_mut().ok_or_else(|| anyhow!("model was not loaded"))
    }
}

fn grb_linear(vars: &[grb::Var], expr: &LinExpr) -> grb::expr::LinExpr {
    let mut e = grb::expr::LinExpr::new();
    for &(v, c) in expr.terms() {
        e.add_term(c as f64, vars[v.index()]);
    }
    e.add_constant(expr.constant() as f64);
    e
}

#[instrument(level="debug", skip_all, fields(model=%model.name))]
fn translate(env: &grb::Env, model: &Model) -> Result<Loaded> {
    let mut m = grb::Model::with_env(&model.name, env)?;

    let vars = model.vars().iter()
        .map(|info| {
            let vtype = match info.vtype {
                VarType::Binary => grb::VarType::Binary,
                VarType::Integer => grb::VarType::Integer,
            };
            m.add_var(&info.name, vtype, 0.0, info.lb as f64, info.ub as f64, std::iter::empty())
        })
        .collect::<grb::Result<Vec<_>>>()?;

    for (name, c) in model.constraints() {
        let lhs = grb_linear(&vars, &c.expr);
        let rhs = c.rhs as f64;
        let ineq = match c.sense {
            Sense::Le => grb::c!(lhs <= rhs),
            Sense::Ge => grb::c!(lhs >= rhs),
            Sense::Eq => grb::c!(lhs == rhs),
        };
        m.add_constr(name, ineq)?;
    }

    m.set_objective(grb_linear(&vars, model.objective()), grb::ModelSense::Maximize)?;
    m.update()?;
    Ok(Loaded {
        name: model.name.clone(),
        shape: (model.num_vars(), model.num_constrs()),
        model: m,
        vars,
    })
}

fn path_str(path: &Path) -> Result<&str> {
    path.to_str().ok_or_else(|| anyhow!("{} is not valid UTF-8", path.display()))
}

impl SolverBackend for GurobiBackend {
    fn name(&self) -> &'static str { "gurobi" }

    #[instrument(level="info", name="gurobi_optimize", skip(self, model), fields(model=%model.name))]
    fn optimize(&mut self, model: &Model) -> Result<Solution> {
        let loaded = self.load(model)?;
        let m = &mut loaded.model;
        m.optimize()?;

        let status = m.status()?;
        debug!(?status);
        let status = match status {
            Status::Optimal => SolveStatus::Optimal,
            Status::Infeasible => SolveStatus::Infeasible,
            Status::Unbounded | Status::InfOrUnbd => SolveStatus::Unbounded,
            _ if m.get_attr(attr::SolCount)? > 0 => SolveStatus::FeasibleSuboptimal,
            _ => SolveStatus::Error,
        };
        if !status.has_solution() {
            return Ok(Solution::without_assignment(status));
        }

        let values = m.get_obj_attr_batch(attr::X, loaded.vars.iter().copied())?;
        let obj = m.get_attr(attr::ObjVal)?;
        info!(obj, ?status, "solution found");
        Ok(Solution::new(status, obj, values))
    }

    fn write_model(&mut self, model: &Model, path: &Path) -> Result<()> {
        let loaded = self.load(model)?;
        loaded.model.write(path_str(path)?)?;
        Ok(())
    }

    fn write_solution(&mut self, model: &Model, sol: &Solution, path: &Path) -> Result<()> {
        if !sol.status.has_solution() {
            return Err(anyhow!("no solution to write"));
        }
        match &self.loaded {
            Some(l) if l.matches(model) => {
                l.model.write(path_str(path)?)?;
                Ok(())
            },
            _ => Err(anyhow!("{} has not been optimised by this backend", model.name)),
        }
    }
}
