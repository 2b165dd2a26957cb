//! Diagnostics shared by every stage of the compiler.
//!
//! Each [`errors::Error`] pairs an [`errors::ErrorImpl`] variant with the
//! source position it refers to. Severity and originating phase are derived
//! from the variant.

pub mod errors;

#[cfg(test)]
mod tests;
