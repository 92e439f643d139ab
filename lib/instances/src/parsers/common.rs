use super::nom_prelude::*;

pub fn usize_<'a, E>(input: &'a str) -> IResult<&'a str, usize, E>
  where
    E: ParseError<&'a str> + error::FromExternalError<&'a str, ParseIntError>
{
  map_res(digit1, usize::from_str)(input)
}

pub fn i64_<'a, E>(input: &'a str) -> IResult<&'a str, i64, E>
  where
    E: ParseError<&'a str> + error::FromExternalError<&'a str, ParseIntError>
{
  map_res(
    recognize(
      pair(
        opt(char('-')),
        digit1
      )
    ), i64::from_str)(input)
}

/// A token preceded by optional blanks (spaces or tabs).
pub fn blank_then<'a, O, E, F>(f: F) -> impl FnMut(&'a str) -> IResult<&'a str, O, E>
  where
    F: Parser<&'a str, O, E>,
    E: ParseError<&'a str>
{
  preceded(space0, f)
}

/// Trailing blanks, then either a line break or the end of input.
pub fn end_of_record<'a, E>(input: &'a str) -> IResult<&'a str, (), E>
  where
    E: ParseError<&'a str>
{
  value((), pair(space0, alt_line_end))(input)
}

fn alt_line_end<'a, E>(input: &'a str) -> IResult<&'a str, &'a str, E>
  where
    E: ParseError<&'a str>
{
  nom::branch::alt((line_ending, eof))(input)
}
