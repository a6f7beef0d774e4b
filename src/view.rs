/// Selection state machine and view recomputation
pub mod controller;
/// Immutable snapshot of the derived views
pub mod frame;
/// Post-processing configuration
pub mod settings;
/// Interface to the solver's stored solutions
pub mod solution;
