// src/lib.rs
//! TraqCheck console core: candidate intake, resume extraction review and
//! identity-document verification, driven against the candidate backend.

pub mod candidates;
pub mod common;
pub mod console;
pub mod services;

#[cfg(test)]
pub(crate) mod testing;
