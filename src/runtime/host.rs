//! Host framework interface
//!
//! The host owns ports, buffers and labels. The adapter only reaches them through a
//! [`BlockHost`] handed to every call; references obtained from it must not outlive that call.
use std::fmt;

use crate::runtime::BufferManagerArgs;
use crate::runtime::Label;

/// Host data type of a stream port.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DType {
    name: String,
    size: usize,
}

impl DType {
    /// Create a data type.
    pub fn new(name: impl Into<String>, size: usize) -> DType {
        DType {
            name: name.into(),
            size,
        }
    }

    /// Opaque data type for legacy signatures, which only know item widths.
    pub fn from_item_size(size: usize) -> DType {
        DType::new(format!("GrIoSig{size}"), size)
    }

    /// Type name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Item size in bytes
    pub fn size(&self) -> usize {
        self.size
    }

    /// Assert that `T` has the item size of this type.
    ///
    /// # Panics
    ///
    /// Panics on a size mismatch.
    pub fn check_item_type<T>(&self) {
        assert_eq!(
            std::mem::size_of::<T>(),
            self.size,
            "item type {} does not match port type {}",
            std::any::type_name::<T>(),
            self
        );
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.name, self.size)
    }
}

/// Snapshot of the buffers the host offers for one work invocation.
#[derive(Debug, Clone, Default)]
pub struct WorkInfo {
    /// Minimum element count over all ports
    pub min_elements: usize,
    /// Minimum element count over input ports
    pub min_in_elements: usize,
    /// Maximum element count over input ports
    pub max_in_elements: usize,
    /// Minimum element count (free space) over output ports
    pub min_out_elements: usize,
    /// Start of the readable window of every input port
    pub input_pointers: Vec<*const u8>,
    /// Start of the writable window of every output port
    pub output_pointers: Vec<*mut u8>,
}

/// Input port, owned by the host.
pub trait InputPort {
    /// Port data type
    fn dtype(&self) -> &DType;
    /// Readable items in the current window
    fn elements(&self) -> usize;
    /// Items consumed since the port was created
    fn total_elements(&self) -> u64;
    /// Consume items. Takes effect at the end of the work invocation.
    fn consume(&mut self, items: usize);
    /// Visible labels, indices relative to [`total_elements`](InputPort::total_elements)
    fn labels(&self) -> &[Label];
    /// Remove a visible label.
    fn remove_label(&mut self, label: &Label);
    /// Minimum number of items that must be readable before work is called
    fn set_reserve(&mut self, items: usize);
    /// Current reserve
    fn reserve(&self) -> usize;
}

/// Output port, owned by the host.
pub trait OutputPort {
    /// Port data type
    fn dtype(&self) -> &DType;
    /// Writable items in the current window
    fn elements(&self) -> usize;
    /// Items produced since the port was created
    fn total_elements(&self) -> u64;
    /// Produce items. Takes effect at the end of the work invocation.
    fn produce(&mut self, items: usize);
    /// Post a label, index relative to [`total_elements`](OutputPort::total_elements)
    fn post_label(&mut self, label: Label);
}

/// Host side of an adapted block.
pub trait BlockHost {
    /// Set the block name.
    fn set_name(&mut self, name: &str);
    /// Create input port `index`.
    fn setup_input(&mut self, index: usize, dtype: DType);
    /// Create output port `index`.
    fn setup_output(&mut self, index: usize, dtype: DType);
    /// Announce a callable handler.
    fn register_call(&mut self, name: &str);
    /// Number of input ports
    fn num_inputs(&self) -> usize;
    /// Number of output ports
    fn num_outputs(&self) -> usize;
    /// Input port `index`
    fn input(&self, index: usize) -> &dyn InputPort;
    /// Input port `index`, mutably
    fn input_mut(&mut self, index: usize) -> &mut dyn InputPort;
    /// Output port `index`
    fn output(&self, index: usize) -> &dyn OutputPort;
    /// Output port `index`, mutably
    fn output_mut(&mut self, index: usize) -> &mut dyn OutputPort;
    /// Buffers of the current work invocation
    fn work_info(&self) -> &WorkInfo;
    /// Arguments of the host's default buffer manager
    fn default_buffer_args(&self) -> BufferManagerArgs {
        BufferManagerArgs::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_dtype() {
        let d = DType::from_item_size(8);
        assert_eq!(d.name(), "GrIoSig8");
        assert_eq!(d.size(), 8);
        assert_eq!(d.to_string(), "GrIoSig8(8)");
    }
}
