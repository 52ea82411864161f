//! ## Adapter Runtime
//!
//! The host framework is modelled by the traits in [`host`]. A legacy block is a [`Kernel`] plus
//! its [`BlockMeta`]; [`WrappedKernel`] adapts the pair to the host's execution contract.
use thiserror::Error;

mod block;
mod block_meta;
pub mod buffer;
pub mod config;
mod executor;
pub mod forecast;
pub mod host;
mod io_signature;
mod kernel;
mod logging;
pub mod mocker;
mod object;
pub mod registry;
pub mod stream_io;
mod sync_block;
pub mod tag;

pub use block::Block;
pub use block::Lifecycle;
pub use block::SET_NUM_INPUTS;
pub use block::SET_NUM_OUTPUTS;
pub use block::WrappedKernel;
pub use block_meta::BlockMeta;
pub use block_meta::BlockMetaBuilder;
pub use blockbridge_types::ArgDescription;
pub use blockbridge_types::BlockDescription;
pub use blockbridge_types::Pmt;
pub use blockbridge_types::PmtKind;
pub use buffer::BufferManagerArgs;
pub use buffer::BufferRequest;
pub use executor::Executor;
pub use executor::WorkOutcome;
pub use host::BlockHost;
pub use host::DType;
pub use host::InputPort;
pub use host::OutputPort;
pub use host::WorkInfo;
pub use io_signature::IoSignature;
pub use kernel::Kernel;
pub use kernel::WORK_CALLED_PRODUCE;
pub use kernel::WORK_DONE;
pub use mocker::Mocker;
pub use object::Object;
pub use object::object_to_pmt;
pub use object::pmt_to_object;
pub use registry::BlockRegistry;
pub use stream_io::StreamIo;
pub use sync_block::SyncBlock;
pub use sync_block::SyncDecimator;
pub use sync_block::SyncInterpolator;
pub use sync_block::SyncKernel;
pub use tag::Label;
pub use tag::OffsetRebase;
pub use tag::Symbol;
pub use tag::Tag;
pub use tag::TagPropagationPolicy;

/// Result type used by kernels and the adapter.
pub type Result<T, E = anyhow::Error> = std::result::Result<T, E>;

/// Initialize logging.
///
/// Installs a `tracing` subscriber with the level from [`config`]. Calling it more than once is
/// harmless.
pub fn init() {
    logging::init();
}

/// Adapter errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// The host called a handler the block does not register.
    #[error("Handler {0} does not exist")]
    InvalidHandler(String),
    /// A handler was called with arguments it cannot interpret.
    #[error("Invalid arguments for handler {0}")]
    InvalidArguments(String),
    /// Lifecycle transition that is not allowed from the current state.
    #[error("Block {block}: cannot {operation} while {state:?}")]
    InvalidLifecycle {
        /// Block type name
        block: String,
        /// Current state
        state: Lifecycle,
        /// Requested operation
        operation: &'static str,
    },
    /// Work was requested without an executor.
    #[error("Block {0} is not activated")]
    NotActivated(String),
    /// The kernel returned an error.
    #[error("Kernel error ({0})")]
    KernelError(String),
    /// Registry lookup failed.
    #[error("No block registered at {0}")]
    UnknownBlock(String),
    /// Registry path already taken.
    #[error("Block path {0} already registered")]
    DuplicateBlock(String),
    /// Error in runtime
    #[error("Runtime error ({0})")]
    RuntimeError(String),
}
