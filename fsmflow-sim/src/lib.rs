//! Simulated FSM generator board.
//!
//! [`SimBackend`] implements the [`fsmflow::Backend`] contract in software: it loads the packed
//! transition table through a transient buffer, evaluates it tick by tick against the pins tied by
//! a [`Wiring`], and fills a trace buffer. Like the real analyzer, the capture starts at an
//! arbitrary phase of the machine and its first sample is unreliable.

// # Tries to deny all lints (`rustc -W help`).
#![deny(absolute_paths_not_starting_with_crate)]
#![deny(anonymous_parameters)]
#![deny(deprecated_in_future)]
#![deny(explicit_outlives_requirements)]
#![deny(keyword_idents)]
#![deny(macro_use_extern_crate)]
#![deny(missing_debug_implementations)]
#![deny(non_ascii_idents)]
#![deny(rust_2018_idioms)]
#![deny(trivial_numeric_casts)]
#![deny(unsafe_op_in_unsafe_fn)]
#![deny(unused_extern_crates)]
#![deny(unused_import_braces)]
#![deny(unused_qualifications)]
//
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::missing_crate_level_docs)]
#![deny(unreachable_pub)]
//
#![allow(elided_lifetimes_in_paths)]

mod backend;
mod board;
mod engine;
pub mod scenarios;

pub use backend::*;
pub use board::*;
pub use engine::*;
