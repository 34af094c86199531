
///
/// The error plumbing shared by every crate in the workspace. Errors are
/// carried as `anyhow::Error`; `error!` builds one from a format string.
///
pub use anyhow::{anyhow as error, bail, ensure, Context, Error, Result};
