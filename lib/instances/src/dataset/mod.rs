use std::path::Path;
use std::borrow::Cow;
use anyhow::{Context, Result};

use crate::parsers::{ParseInstance, HashcodeFmt, HashcodeStr};
use crate::raw::{FromRaw, rides::Hashcode};

pub mod rides;
use rides::RideInstance;


fn instance_id(path: &Path) -> Cow<str> {
  path.file_stem()
    .map(|s| s.to_string_lossy())
    .unwrap_or(Cow::Borrowed("instance"))
}

/// Read, parse and validate a ride instance.  Every input problem is reported here,
/// before anything downstream sees the data.
pub fn load_instance(path: impl AsRef<Path>) -> Result<RideInstance> {
  let path = path.as_ref();
  let raw = Hashcode::parse(HashcodeFmt(path)).context(format!("failed to load {:?}", path))?;
  let instance = RideInstance::from_raw(raw, instance_id(path));
  instance.validate().context(format!("invalid instance {:?}", path))?;
  Ok(instance)
}

/// Like [`load_instance`], but from the text of an instance file.
pub fn parse_instance(text: &str, id: &str) -> Result<RideInstance> {
  let raw = Hashcode::parse(HashcodeStr(text))?;
  let instance = RideInstance::from_raw(raw, Cow::Borrowed(id));
  instance.validate()?;
  Ok(instance)
}
