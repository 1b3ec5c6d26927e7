//! # LYAO Core Library
//!
//! Parsers, writers and run orchestration around two external programs: the
//! `shadow` observer-geometry executable and the `LYAO_RT` radiative-transfer
//! executable. The physics lives in those programs; this library moves data
//! between their fixed-format text files and typed Rust values, and drives
//! grid sweeps over day-of-year, f10.7 flux and time of day.
//!
//! ## Layout
//!
//! - **[`core`]: Formats and models.** Stateless parsers and writers for every
//!   file the executables read or write (shadow output lines, the sunrise/sunset
//!   calendar, `inputs_los.dat`, `infile.dat`, `H_alpha.source`, `hab_los.dat`),
//!   plus the time-window resolver and site presets.
//!
//! - **[`engine`]: Execution plumbing.** Sweep configuration, typed errors,
//!   progress events, the external-command seam and the archive layout.
//!
//! - **[`workflows`]: The public entry point.** [`workflows::sweep::run`] executes
//!   a full parameter sweep and archives every run.

pub mod core;
pub mod engine;
pub mod workflows;
