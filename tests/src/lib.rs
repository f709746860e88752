//! End-to-end scenarios across the descry crates, run against scripted command output.

pub mod util;

#[cfg(test)]
mod discovery;
