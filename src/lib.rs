#![warn(missing_docs)]
#![allow(clippy::new_ret_no_self)]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! Run legacy streaming DSP blocks unmodified inside a buffer/port driven dataflow host.
//!
//! Legacy blocks describe their input/output ratio through a *forecast* function and expect to
//! be called with a pull/push `general_work`. The host owns fixed buffers, exposes
//! reserve/consume/produce primitives, and carries metadata as port-relative *labels* instead of
//! absolute stream *tags*. The [`runtime`] module bridges the two models:
//!
//! * forecast resolution: find the largest output count the available input can satisfy,
//! * work invocation: hand the host buffers to the kernel and apply produce/consume,
//! * tag/label translation with delay and relative-rate rebasing,
//! * circular buffer selection for blocks with history,
//! * activate/deactivate lifecycle.
//!
//! ## Example
//! Run a [`Copy`](blocks::Copy) block against the in-memory host:
//! ```
//! use blockbridge::blocks::Copy;
//! use blockbridge::runtime::Mocker;
//!
//! let mut mocker = Mocker::new(Copy::<f32>::new());
//! mocker.init();
//! mocker.input(0, vec![1.0f32, 2.0, 3.0]);
//! mocker.init_output::<f32>(0, 16);
//! mocker.run();
//! mocker.deinit();
//!
//! let (items, _labels) = mocker.output::<f32>(0);
//! assert_eq!(items, vec![1.0, 2.0, 3.0]);
//! ```

// make the crate available as `blockbridge` internally, so that doc examples and
// library code use the same paths.
extern crate self as blockbridge;
/// Logging macros
#[macro_use]
pub extern crate tracing;

// re-exports
pub use anyhow;
pub use num_complex;

pub mod blocks;
pub mod runtime;
