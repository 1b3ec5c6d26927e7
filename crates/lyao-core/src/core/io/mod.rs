//! Writers for the input files consumed by the transport executable.
//!
//! Both files are positional: the transport reader does not look at keys or
//! headers, so every number is emitted with the exact printf-style layout it
//! expects. [`format`] holds the C-compatible number formatting shared by the
//! writers, and [`atomic`] the temp-file-then-rename helper used for every
//! file this crate produces. [`traits::InputFile`] ties them together.

pub mod atomic;
pub mod driver;
pub mod format;
pub mod los_input;
pub mod traits;
