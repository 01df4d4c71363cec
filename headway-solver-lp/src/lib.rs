//! Linear-programming solver adapters for Headway.
//!
//! This crate provides the two [`SolverAdapter`](headway_core::SolverAdapter)
//! variants used by the buffer search: [`LpRelaxationSolver`], which treats
//! trip counts as continuous, and [`IntegerSolver`], which keeps them
//! integral. Both translate the backend-neutral
//! [`ConstraintModel`](headway_core::ConstraintModel) into a `good_lp` problem
//! solved by the pure-Rust `microlp` backend, so no native solver library is
//! required.
//!
//! Backend faults, including panics inside `microlp`, surface as
//! [`SolveStatus::Error`](headway_core::SolveStatus::Error) and are never
//! reported as infeasibility.
//!
//! Branch and bound can take minutes on some feasible models. A solver built
//! with a time limit runs each solve on a worker thread and reports an error
//! once the limit passes; the abandoned worker finishes in the background and
//! its answer is discarded.

#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]

mod adapter;
mod backend;

pub use adapter::{
    DEFAULT_SOLVE_TIME_LIMIT, IntegerSolver, LpRelaxationSolver, adapter_for,
    adapter_with_time_limit,
};
