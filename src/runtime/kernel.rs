use crate::runtime::BlockMeta;
use crate::runtime::Result;
use crate::runtime::StreamIo;

/// Returned by [`Kernel::general_work`] when the block will not produce anymore.
pub const WORK_DONE: isize = -1;
/// Returned by [`Kernel::general_work`] when the block called [`StreamIo::produce`] itself.
pub const WORK_CALLED_PRODUCE: isize = -2;

/// Kernel
///
/// Processing contract of a legacy block.
pub trait Kernel: Send {
    /// Estimate the input items needed to produce `noutput_items`.
    ///
    /// Must not have side effects. The default asks for `noutput_items + history - 1` items on
    /// every input.
    fn forecast(&self, noutput_items: usize, ninput_items_required: &mut [usize], meta: &BlockMeta) {
        ninput_items_required.fill(noutput_items + meta.history() - 1);
    }

    /// Process stream data
    ///
    /// `ninput_items` holds the readable items per input, including the history window. Consume
    /// through `io`. A positive return value is produced on every output; [`WORK_DONE`] ends the
    /// stream; other values produce nothing.
    fn general_work(
        &mut self,
        noutput_items: usize,
        ninput_items: &[usize],
        io: &mut StreamIo,
        meta: &mut BlockMeta,
    ) -> Result<isize>;

    /// Called on activation.
    fn start(&mut self, _meta: &mut BlockMeta) -> Result<()> {
        Ok(())
    }

    /// Called on deactivation.
    fn stop(&mut self, _meta: &mut BlockMeta) -> Result<()> {
        Ok(())
    }
}
