//! The seam between the model and whatever optimises it.
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use anyhow::{anyhow, Context, Result};
use tracing::*;

use crate::mip::{LinExpr, Model, Sense, Var};

/// Binary values at or above `1 - SELECTION_TOLERANCE` count as selected.
pub const SELECTION_TOLERANCE: f64 = 1e-6;

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SolveStatus {
    Optimal,
    FeasibleSuboptimal,
    Infeasible,
    Unbounded,
    Error,
}

impl SolveStatus {
    #[inline]
    pub fn has_solution(&self) -> bool {
        matches!(self, SolveStatus::Optimal | SolveStatus::FeasibleSuboptimal)
    }
}

/// Result of an `optimize` call.  Values are only readable when the status carries an
/// assignment.
#[derive(Debug, Clone)]
pub struct Solution {
    pub status: SolveStatus,
    pub objective: Option<f64>,
    values: Vec<f64>,
}

impl Solution {
    pub fn new(status: SolveStatus, objective: f64, values: Vec<f64>) -> Self {
        Solution { status, objective: Some(objective), values }
    }

    pub fn without_assignment(status: SolveStatus) -> Self {
        debug_assert!(!status.has_solution());
        Solution { status, objective: None, values: Vec::new() }
    }

    #[inline]
    pub fn value(&self, var: Var) -> Option<f64> {
        if self.status.has_solution() {
            self.values.get(var.index()).copied()
        } else {
            None
        }
    }

    #[inline]
    pub fn is_selected(&self, var: Var) -> bool {
        self.value(var).map_or(false, |x| x >= 1.0 - SELECTION_TOLERANCE)
    }

    /// Integer value of `var`, rounded; 0 when there is no assignment.
    #[inline]
    pub fn int_value(&self, var: Var) -> i64 {
        self.value(var).map_or(0, |x| x.round() as i64)
    }

    /// Writes `# Objective value = ...` followed by one `name value` line per variable.
    pub fn write_sol(&self, model: &Model, mut w: impl Write) -> io::Result<()> {
        match self.objective {
            Some(obj) => writeln!(w, "# Objective value = {}", obj)?,
            None => writeln!(w, "# No solution (status {:?})", self.status)?,
        }
        for (var, info) in model.var_iter() {
            if let Some(x) = self.value(var) {
                writeln!(w, "{} {}", info.name, x)?;
            }
        }
        Ok(())
    }
}

pub(crate) fn write_file(path: &Path, f: impl FnOnce(&mut BufWriter<File>) -> io::Result<()>) -> Result<()> {
    let file = File::create(path).with_context(|| format!("unable to create {}", path.display()))?;
    let mut w = BufWriter::new(file);
    f(&mut w)
        .and_then(|()| w.flush())
        .with_context(|| format!("unable to write {}", path.display()))
}

pub trait SolverBackend {
    fn name(&self) -> &'static str;

    /// Maximises the model's objective.  `Err` means the solver itself failed; a model
    /// without solution is reported through [`Solution::status`].
    fn optimize(&mut self, model: &Model) -> Result<Solution>;

    /// Writes `model` in the backend's native format; CPLEX LP text unless overridden.
    fn write_model(&mut self, model: &Model, path: &Path) -> Result<()> {
        write_file(path, |w| model.write_lp(w))
    }

    /// Writes the solution returned by the last `optimize` call on `model`.
    fn write_solution(&mut self, model: &Model, sol: &Solution, path: &Path) -> Result<()> {
        write_file(path, |w| sol.write_sol(model, w))
    }
}

#[cfg(feature = "grb")]
mod gurobi;
#[cfg(feature = "grb")]
pub use gurobi::GurobiBackend;


/// Exact optimisation with z3's `Optimize` engine over integer arithmetic.
#[derive(Debug, Default, Clone)]
pub struct Z3Backend;

fn z3_linear<'ctx>(ctx: &'ctx z3::Context, vars: &[z3::ast::Int<'ctx>], expr: &LinExpr) -> z3::ast::Int<'ctx> {
    use z3::ast::Int;
    let mut terms: Vec<Int<'ctx>> = expr.terms().iter()
        .map(|&(v, c)| match c {
            1 => vars[v.index()].clone(),
            c => Int::mul(ctx, &[&Int::from_i64(ctx, c), &vars[v.index()]]),
        })
        .collect();
    if expr.constant() != 0 || terms.is_empty() {
        terms.push(Int::from_i64(ctx, expr.constant()));
    }
    if terms.len() == 1 {
        return terms.pop().unwrap_or_else(|| Int::from_i64(ctx, 0));
    }
    let refs: Vec<&Int<'ctx>> = terms.iter().collect();
    Int::add(ctx, &refs)
}

impl SolverBackend for Z3Backend {
    fn name(&self) -> &'static str { "z3" }

    #[instrument(level="info", name="z3_optimize", skip(self, model), fields(model=%model.name))]
    fn optimize(&mut self, model: &Model) -> Result<Solution> {
        use z3::ast::{Ast, Int};

        let cfg = z3::Config::new();
        let ctx = z3::Context::new(&cfg);
        let opt = z3::Optimize::new(&ctx);

        let vars: Vec<Int> = model.vars().iter()
            .map(|info| Int::new_const(&ctx, info.name.as_str()))
            .collect();

        for (v, info) in vars.iter().zip(model.vars()) {
            opt.assert(&v.ge(&Int::from_i64(&ctx, info.lb)));
            opt.assert(&v.le(&Int::from_i64(&ctx, info.ub)));
        }

        for (name, c) in model.constraints() {
            let lhs = z3_linear(&ctx, &vars, &c.expr);
            let rhs = Int::from_i64(&ctx, c.rhs);
            trace!(%name, "assert");
            let b = match c.sense {
                Sense::Le => lhs.le(&rhs),
                Sense::Ge => lhs.ge(&rhs),
                Sense::Eq => lhs._eq(&rhs),
            };
            opt.assert(&b);
        }

        let objective = z3_linear(&ctx, &vars, model.objective());
        opt.maximize(&objective);

        let status = opt.check(&[]);
        debug!(?status);
        match status {
            z3::SatResult::Unsat => Ok(Solution::without_assignment(SolveStatus::Infeasible)),
            z3::SatResult::Unknown => {
                warn!("z3 could not decide the model");
                Ok(Solution::without_assignment(SolveStatus::Error))
            },
            z3::SatResult::Sat => {
                let m = opt.get_model().ok_or_else(|| anyhow!("z3 reported sat but returned no model"))?;
                let eval = |x: &Int| m.eval(x, true).and_then(|val| val.as_i64());
                let values = vars.iter()
                    .zip(model.vars())
                    .map(|(x, info)| eval(x)
                        .map(|val| val as f64)
                        .ok_or_else(|| anyhow!("no value for {}", info.name)))
                    .collect::<Result<Vec<_>>>()?;
                let obj = eval(&objective).ok_or_else(|| anyhow!("objective has no value"))?;
                info!(obj, "optimal solution found");
                Ok(Solution::new(SolveStatus::Optimal, obj as f64, values))
            },
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::init_test_logging;

    #[test]
    fn tolerance() {
        let mut m = Model::new("t");
        let vars: Vec<Var> = (0..4).map(|k| m.add_binary(format!("b{}", k))).collect();
        let sol = Solution::new(SolveStatus::Optimal, 0.0, vec![1.0, 0.9999999, 0.5, 1e-9]);
        let selected: Vec<bool> = vars.iter().map(|&v| sol.is_selected(v)).collect();
        assert_eq!(selected, vec![true, true, false, false]);
    }

    #[test]
    fn no_values_without_assignment() {
        let mut m = Model::new("t");
        let x = m.add_binary("x".to_string());
        let sol = Solution::without_assignment(SolveStatus::Infeasible);
        assert_eq!(sol.value(x), None);
        assert!(!sol.is_selected(x));
        assert_eq!(sol.int_value(x), 0);
    }

    #[test]
    fn z3_knapsack() -> Result<()> {
        init_test_logging(None::<&str>);
        let mut m = Model::new("knapsack");
        let x: Vec<Var> = (0..3).map(|k| m.add_binary(format!("x{}", k))).collect();
        let n = m.add_integer("n".to_string(), 0, 4);
        m.add_constr("weight".to_string(), (x[0] * 3 + x[1] * 4 + x[2] * 2 + n).le(6));
        m.set_objective(x[0] * 5 + x[1] * 6 + x[2] * 3 + n);
        let sol = Z3Backend.optimize(&m)?;
        assert_eq!(sol.status, SolveStatus::Optimal);
        // x1 + x2 and x0 + x2 + n=1 both reach 9
        assert_eq!(sol.objective, Some(9.0));
        let total: f64 = m.objective().eval(|v| sol.value(v).unwrap());
        assert_eq!(total, 9.0);
        for (_, c) in m.constraints() {
            assert!(c.is_satisfied(|v| sol.value(v).unwrap(), 1e-9));
        }
        Ok(())
    }

    #[test]
    fn z3_infeasible() -> Result<()> {
        let mut m = Model::new("infeasible");
        let x = m.add_binary("x".to_string());
        let y = m.add_binary("y".to_string());
        m.add_constr("both".to_string(), (x + y).ge(3));
        let sol = Z3Backend.optimize(&m)?;
        assert_eq!(sol.status, SolveStatus::Infeasible);
        assert_eq!(sol.objective, None);
        Ok(())
    }

    #[test]
    fn sol_format() -> Result<()> {
        let mut m = Model::new("t");
        m.add_binary("x".to_string());
        m.add_integer("d".to_string(), 0, 3);
        let sol = Solution::new(SolveStatus::Optimal, 4.0, vec![1.0, 2.0]);
        let mut buf = Vec::new();
        sol.write_sol(&m, &mut buf)?;
        assert_eq!(String::from_utf8(buf)?, "# Objective value = 4\nx 1\nd 2\n");
        Ok(())
    }
}
