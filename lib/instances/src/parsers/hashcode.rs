use std::path::Path;
use crate::{Result, InputParseError};
use crate::raw::rides::*;
use super::{
  ParseInstance,
  nom_prelude::*
};

/// Ride file on disk.
#[derive(Debug, Copy, Clone)]
pub struct HashcodeFmt<P>(pub P);

/// Ride file contents already in memory.
#[derive(Debug, Copy, Clone)]
pub struct HashcodeStr<'a>(pub &'a str);

impl<P: AsRef<Path>> ParseInstance<HashcodeFmt<P>> for Hashcode {
  fn parse(path: HashcodeFmt<P>) -> Result<Hashcode> {
    let path = path.0.as_ref();
    let data = std::fs::read_to_string(path)?;
    Hashcode::parse(HashcodeStr(&data))
  }
}

impl<'a> ParseInstance<HashcodeStr<'a>> for Hashcode {
  fn parse(input: HashcodeStr<'a>) -> Result<Hashcode> {
    let data = input.0;
    let instance = match parsers::hashcode(data).finish() {
      Ok((_, instance)) => instance,
      Err(e) => return Err(
        InputParseError::Syntax(error::convert_error(data, e)).into()
      ),
    };
    if instance.rides.len() != instance.num_rides {
      return Err(InputParseError::RideCount {
        expected: instance.num_rides,
        found: instance.rides.len(),
      }.into());
    }
    Ok(instance)
  }
}


mod parsers {
  use super::*;
  use crate::parsers::common::*;

  type Header = (usize, usize, usize, usize, i64, i64);

  fn header<'a, E>(input: &'a str) -> IResult<&'a str, Header, E>
    where
      E: ParseError<&'a str> + FromExternalError<&'a str, ParseIntError>
  {
    // rows cols vehicles rides bonus turns
    terminated(tuple((
      blank_then(usize_),
      blank_then(usize_),
      blank_then(usize_),
      blank_then(usize_),
      blank_then(i64_),
      blank_then(i64_),
    )), end_of_record)(input)
  }

  fn ride<'a, E>(input: &'a str) -> IResult<&'a str, RawRide, E>
    where
      E: ParseError<&'a str> + FromExternalError<&'a str, ParseIntError>
  {
    // 0 0 1 3 2 9
    let (i, (sx, sy, ex, ey, earliest_start, latest_end)) = terminated(tuple((
      blank_then(i64_),
      blank_then(i64_),
      blank_then(i64_),
      blank_then(i64_),
      blank_then(i64_),
      blank_then(i64_),
    )), end_of_record)(input)?;
    Ok((i, RawRide { start: (sx, sy), end: (ex, ey), earliest_start, latest_end }))
  }

  pub fn hashcode(input: &str) -> IResult<&str, Hashcode, error::VerboseError<&str>> {
    let (i, (rows, cols, num_vehicles, num_rides, bonus, num_turns)) =
      error::context("header", header)(input)?;
    let (i, rides) = many0(error::context("ride", ride))(i)?;
    let (i, _) = multispace0(i)?;
    let (i, _) = eof(i)?;

    Ok((i, Hashcode {
      rows,
      cols,
      num_vehicles,
      num_rides,
      bonus,
      num_turns,
      rides,
    }))
  }
}


#[cfg(test)]
mod tests {
  use super::*;

  const EXAMPLE: &str = "3 4 2 3 2 10\n0 0 1 3 2 9\n1 2 1 0 0 9\n2 0 2 2 0 9\n";

  #[test]
  fn example() -> Result<()> {
    let raw = Hashcode::parse(HashcodeStr(EXAMPLE))?;
    assert_eq!((raw.rows, raw.cols, raw.num_vehicles, raw.num_rides), (3, 4, 2, 3));
    assert_eq!((raw.bonus, raw.num_turns), (2, 10));
    assert_eq!(raw.rides[0], RawRide { start: (0, 0), end: (1, 3), earliest_start: 2, latest_end: 9 });
    assert_eq!(raw.rides[2].end, (2, 2));
    Ok(())
  }

  #[test]
  fn example_file() -> Result<()> {
    let raw = Hashcode::parse(HashcodeFmt("../../data/a_example.in"))?;
    assert_eq!(raw.rides.len(), 3);
    Ok(())
  }

  #[test]
  fn tolerant_whitespace() -> Result<()> {
    let raw = Hashcode::parse(HashcodeStr("1 1  1 1 0 5\r\n\t0 0 0 1 0 5   \n\n\n"))?;
    assert_eq!(raw.rides[0].end, (0, 1));
    // no newline after the last record
    let raw = Hashcode::parse(HashcodeStr("1 1 1 1 0 5\n0 0 0 1 0 5"))?;
    assert_eq!(raw.rides.len(), 1);
    Ok(())
  }

  #[test]
  fn ride_count_mismatch() {
    let err = Hashcode::parse(HashcodeStr("3 4 2 2 2 10\n0 0 1 3 2 9\n")).unwrap_err();
    assert_eq!(
      err.downcast_ref::<InputParseError>(),
      Some(&InputParseError::RideCount { expected: 2, found: 1 })
    );
  }

  #[test]
  fn malformed_ride() {
    let err = Hashcode::parse(HashcodeStr("3 4 2 2 2 10\n0 0 1 3 2 9\n0 0 x 3 2 9\n")).unwrap_err();
    assert!(matches!(err.downcast_ref::<InputParseError>(), Some(InputParseError::Syntax(_))));
  }

  #[test]
  fn truncated_header() {
    let err = Hashcode::parse(HashcodeStr("3 4 2\n")).unwrap_err();
    assert!(matches!(err.downcast_ref::<InputParseError>(), Some(InputParseError::Syntax(_))));
  }

  #[test]
  fn missing_file() {
    assert!(Hashcode::parse(HashcodeFmt("does/not/exist.in")).is_err());
  }
}
