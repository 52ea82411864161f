#![warn(missing_docs)]
//! # Blockbridge Types
//!
//! Types shared between the adapter runtime and the hosts that load adapted blocks: the
//! polymorphic value model of legacy stream tags and the serializable block descriptions
//! published by the registry.
mod description;
pub use description::ArgDescription;
pub use description::BlockDescription;

mod pmt;
pub use pmt::Pmt;
pub use pmt::PmtAny;
pub use pmt::PmtConversionError;
pub use pmt::PmtKind;
