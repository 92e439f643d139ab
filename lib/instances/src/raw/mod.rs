pub mod rides;
use std::borrow::Cow;

pub trait FromRaw<T> where Self: Sized {
  fn from_raw(raw: T, id: Cow<str>) -> Self;
}


pub mod metrics {
  use num_traits::Signed;

  pub trait Metric {
    fn compute<T: Signed + Copy>(p1: (T, T), p2: (T, T)) -> T;
  }


  /// L1 distance on the grid: vehicles move one cell per turn along either axis.
  pub struct Manhattan();

  impl Metric for Manhattan {
    #[inline]
    fn compute<T: Signed + Copy>(p1: (T, T), p2: (T, T)) -> T {
      (p1.0 - p2.0).abs() + (p1.1 - p2.1).abs()
    }
  }

}
