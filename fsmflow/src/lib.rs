//! FsmFlow: FSM pattern-generator compilation and captured-trace verification.
//!
//! A symbolic [`FsmSpec`] is validated against board [`HardwareLimits`] and compiled into a dense
//! bit-level transition table ([`CompiledFsm`]). A [`Session`] drives a hardware [`Backend`]
//! through its configure/arm/start/stop protocol, and the resulting waveform capture is decoded by
//! the [`codec`] and verified by the cyclic [`matcher`].

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
#![deny(rustdoc::private_intra_doc_links)]
#![deny(rustdoc::missing_crate_level_docs)]
#![deny(rustdoc::private_doc_tests)]
#![deny(rustdoc::invalid_codeblock_attributes)]
#![deny(rustdoc::invalid_html_tags)]
#![deny(rustdoc::invalid_rust_codeblocks)]
#![deny(rustdoc::bare_urls)]
#![deny(unreachable_pub)]
//
#![allow(clippy::needless_lifetimes)]
#![allow(elided_lifetimes_in_paths)]

pub mod codec;
pub mod compiler;
pub mod limits;
pub mod matcher;
pub mod session;
pub mod spec;
pub mod utils;

pub use codec::{CodecError, Level};
pub use compiler::{compile, compile_with, CompileOptions, CompiledFsm, FsmRow, ValidationError};
pub use limits::HardwareLimits;
pub use matcher::{Lane, LaneFailure, Verdict};
pub use session::{Analyzer, Backend, Capture, ClockRate, Session, SessionError, SessionState};
pub use spec::{FsmSpec, OutputPattern, Pin, Port, StateRef, Ternary};
pub use utils::*;
