//! CLI library components for the MODS transpiler.

pub mod logging;
