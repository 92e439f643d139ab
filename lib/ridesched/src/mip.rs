//! A small solver-agnostic representation of integer linear programs.
//!
//! Expressions are built with ordinary arithmetic on [`Var`], [`LinExpr`] and `i64`
//! (`(1 - x) * m`, `a + b`, ...) and turned into constraints with
//! [`LinExpr::le`], [`LinExpr::ge`] and [`LinExpr::equal`].
use std::fmt;
use std::io::{self, Write};
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Neg, Sub};
use itertools::Itertools;

use crate::Map;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct Var(usize);

impl Var {
  #[inline]
  pub fn index(&self) -> usize { self.0 }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum VarType {
  Binary,
  Integer,
}

#[derive(Debug, Clone)]
pub struct VarInfo {
  pub name: String,
  pub vtype: VarType,
  pub lb: i64,
  pub ub: i64,
}

#[derive(Debug, Clone, Default)]
pub struct LinExpr {
  terms: Vec<(Var, i64)>,
  constant: i64,
}

impl LinExpr {
  pub fn new() -> Self { Self::default() }

  pub fn terms(&self) -> &[(Var, i64)] { &self.terms }

  pub fn constant(&self) -> i64 { self.constant }

  /// Merges repeated variables and drops zero coefficients, keeping first-occurrence order.
  pub fn simplified(self) -> Self {
    let mut coeffs: Map<Var, i64> = Map::default();
    let mut order = Vec::with_capacity(self.terms.len());
    for (var, c) in self.terms {
      let entry = coeffs.entry(var).or_insert_with(|| { order.push(var); 0 });
      *entry += c;
    }
    let terms = order.into_iter()
      .filter_map(|v| match coeffs[&v] { 0 => None, c => Some((v, c)) })
      .collect();
    LinExpr { terms, constant: self.constant }
  }

  pub fn eval(&self, value: impl Fn(Var) -> f64) -> f64 {
    self.constant as f64 + self.terms.iter().map(|&(v, c)| c as f64 * value(v)).sum::<f64>()
  }

  pub fn le(self, rhs: impl Into<LinExpr>) -> Constraint {
    Constraint::new(self - rhs.into(), Sense::Le)
  }

  pub fn ge(self, rhs: impl Into<LinExpr>) -> Constraint {
    Constraint::new(self - rhs.into(), Sense::Ge)
  }

  pub fn equal(self, rhs: impl Into<LinExpr>) -> Constraint {
    Constraint::new(self - rhs.into(), Sense::Eq)
  }
}

impl From<Var> for LinExpr {
  fn from(v: Var) -> Self { LinExpr { terms: vec![(v, 1)], constant: 0 } }
}

impl From<i64> for LinExpr {
  fn from(c: i64) -> Self { LinExpr { terms: Vec::new(), constant: c } }
}

impl<T: Into<LinExpr>> Add<T> for LinExpr {
  type Output = LinExpr;
  fn add(mut self, rhs: T) -> LinExpr {
    self += rhs;
    self
  }
}

impl<T: Into<LinExpr>> AddAssign<T> for LinExpr {
  fn add_assign(&mut self, rhs: T) {
    let rhs = rhs.into();
    self.terms.extend(rhs.terms);
    self.constant += rhs.constant;
  }
}

impl<T: Into<LinExpr>> Sub<T> for LinExpr {
  type Output = LinExpr;
  fn sub(self, rhs: T) -> LinExpr { self + (-rhs.into()) }
}

impl Neg for LinExpr {
  type Output = LinExpr;
  fn neg(self) -> LinExpr { self * -1 }
}

impl Mul<i64> for LinExpr {
  type Output = LinExpr;
  fn mul(mut self, k: i64) -> LinExpr {
    self.terms.iter_mut().for_each(|(_, c)| *c *= k);
    self.constant *= k;
    self
  }
}

impl<T: Into<LinExpr>> Add<T> for Var {
  type Output = LinExpr;
  fn add(self, rhs: T) -> LinExpr { LinExpr::from(self) + rhs }
}

impl<T: Into<LinExpr>> Sub<T> for Var {
  type Output = LinExpr;
  fn sub(self, rhs: T) -> LinExpr { LinExpr::from(self) - rhs }
}

impl Mul<i64> for Var {
  type Output = LinExpr;
  fn mul(self, k: i64) -> LinExpr { LinExpr { terms: vec![(self, k)], constant: 0 } }
}

macro_rules! impl_const_lhs_ops {
  ($($rhs:ty),+) => {$(
    impl Add<$rhs> for i64 {
      type Output = LinExpr;
      fn add(self, rhs: $rhs) -> LinExpr { LinExpr::from(rhs) + self }
    }

    impl Sub<$rhs> for i64 {
      type Output = LinExpr;
      fn sub(self, rhs: $rhs) -> LinExpr { LinExpr::from(self) - rhs }
    }

    impl Mul<$rhs> for i64 {
      type Output = LinExpr;
      fn mul(self, rhs: $rhs) -> LinExpr { LinExpr::from(rhs) * self }
    }
  )+};
}

impl_const_lhs_ops!(Var, LinExpr);

impl Sum<Var> for LinExpr {
  fn sum<I: Iterator<Item=Var>>(iter: I) -> Self {
    LinExpr { terms: iter.map(|v| (v, 1)).collect(), constant: 0 }
  }
}

impl Sum<LinExpr> for LinExpr {
  fn sum<I: Iterator<Item=LinExpr>>(iter: I) -> Self {
    iter.fold(LinExpr::new(), |acc, e| acc + e)
  }
}


#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Sense {
  Le,
  Ge,
  Eq,
}

impl fmt::Display for Sense {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      Sense::Le => "<=",
      Sense::Ge => ">=",
      Sense::Eq => "=",
    })
  }
}

/// `expr sense rhs`, where `expr` has no constant part.
#[derive(Debug, Clone)]
pub struct Constraint {
  pub expr: LinExpr,
  pub sense: Sense,
  pub rhs: i64,
}

impl Constraint {
  fn new(diff: LinExpr, sense: Sense) -> Self {
    let rhs = -diff.constant;
    let expr = LinExpr { terms: diff.terms, constant: 0 }.simplified();
    Constraint { expr, sense, rhs }
  }

  pub fn is_satisfied(&self, value: impl Fn(Var) -> f64, tol: f64) -> bool {
    let lhs = self.expr.eval(value);
    let rhs = self.rhs as f64;
    match self.sense {
      Sense::Le => lhs <= rhs + tol,
      Sense::Ge => lhs >= rhs - tol,
      Sense::Eq => (lhs - rhs).abs() <= tol,
    }
  }
}


/// A maximisation problem over integer and binary variables.
#[derive(Debug, Clone, Default)]
pub struct Model {
  pub name: String,
  vars: Vec<VarInfo>,
  constrs: Vec<(String, Constraint)>,
  objective: LinExpr,
}

impl Model {
  pub fn new(name: &str) -> Self {
    Model { name: name.to_string(), ..Default::default() }
  }

  fn add_var(&mut self, name: String, vtype: VarType, lb: i64, ub: i64) -> Var {
    debug_assert!(lb <= ub, "empty domain for {}", name);
    let v = Var(self.vars.len());
    self.vars.push(VarInfo { name, vtype, lb, ub });
    v
  }

  pub fn add_binary(&mut self, name: String) -> Var {
    self.add_var(name, VarType::Binary, 0, 1)
  }

  pub fn add_integer(&mut self, name: String, lb: i64, ub: i64) -> Var {
    self.add_var(name, VarType::Integer, lb, ub)
  }

  pub fn add_constr(&mut self, name: String, c: Constraint) {
    self.constrs.push((name, c));
  }

  pub fn set_objective(&mut self, obj: LinExpr) {
    self.objective = obj.simplified();
  }

  pub fn objective(&self) -> &LinExpr { &self.objective }

  pub fn vars(&self) -> &[VarInfo] { &self.vars }

  pub fn var(&self, v: Var) -> &VarInfo { &self.vars[v.0] }

  pub fn var_iter(&self) -> impl Iterator<Item=(Var, &VarInfo)> {
    self.vars.iter().enumerate().map(|(k, info)| (Var(k), info))
  }

  pub fn constraints(&self) -> &[(String, Constraint)] { &self.constrs }

  pub fn num_vars(&self) -> usize { self.vars.len() }

  pub fn num_constrs(&self) -> usize { self.constrs.len() }

  fn write_expr(&self, w: &mut impl Write, expr: &LinExpr) -> io::Result<()> {
    for (k, &(v, c)) in expr.terms().iter().enumerate() {
      if k > 0 && k % 8 == 0 {
        write!(w, "\n  ")?;
      }
      let name = &self.vars[v.0].name;
      let coeff = match c.abs() {
        1 => String::new(),
        a => format!("{} ", a),
      };
      match (k, c < 0) {
        (0, false) => write!(w, "{}{}", coeff, name)?,
        (0, true) => write!(w, "-{}{}", coeff, name)?,
        (_, false) => write!(w, " + {}{}", coeff, name)?,
        (_, true) => write!(w, " - {}{}", coeff, name)?,
      }
    }
    Ok(())
  }

  /// Writes the model in CPLEX LP format.
  pub fn write_lp(&self, mut w: impl Write) -> io::Result<()> {
    writeln!(w, "\\ Model {}", self.name)?;
    writeln!(w, "Maximize")?;
    write!(w, "  obj:")?;
    if !self.objective.terms().is_empty() {
      write!(w, " ")?;
      self.write_expr(&mut w, &self.objective)?;
    }
    if self.objective.constant() != 0 {
      write!(w, " + {}", self.objective.constant())?;
    }
    writeln!(w)?;

    writeln!(w, "Subject To")?;
    for (name, c) in &self.constrs {
      if c.expr.terms().is_empty() {
        writeln!(w, "\\ {}: 0 {} {}", name, c.sense, c.rhs)?;
        continue;
      }
      write!(w, "  {}: ", name)?;
      self.write_expr(&mut w, &c.expr)?;
      writeln!(w, " {} {}", c.sense, c.rhs)?;
    }

    writeln!(w, "Bounds")?;
    for info in self.vars.iter().filter(|v| v.vtype == VarType::Integer) {
      writeln!(w, "  {} <= {} <= {}", info.lb, info.name, info.ub)?;
    }

    for (header, vtype) in [("Binaries", VarType::Binary), ("Generals", VarType::Integer)].iter() {
      let names = self.vars.iter().filter(|v| v.vtype == *vtype).map(|v| v.name.as_str()).collect_vec();
      if names.is_empty() { continue; }
      writeln!(w, "{}", header)?;
      for chunk in names.chunks(8) {
        writeln!(w, "  {}", chunk.join(" "))?;
      }
    }
    writeln!(w, "End")?;
    Ok(())
  }
}
