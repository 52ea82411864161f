use std::cmp;

use crate::runtime::BlockMeta;
use crate::runtime::BlockMetaBuilder;
use crate::runtime::IoSignature;
use crate::runtime::Result;
use crate::runtime::StreamIo;
use crate::runtime::SyncBlock;
use crate::runtime::SyncKernel;
use crate::runtime::WORK_DONE;
use crate::runtime::WrappedKernel;

/// Copies only a given number of samples and stops.
///
/// # Inputs
///
/// `0`: Input
///
/// # Outputs
///
/// `0`: Output
///
/// # Usage
/// ```
/// use blockbridge::blocks::Head;
/// use blockbridge::runtime::Mocker;
/// use blockbridge::runtime::WorkOutcome;
///
/// let mut mocker = Mocker::new(Head::<u32>::new(3));
/// mocker.init();
/// mocker.input(0, vec![1u32, 2, 3, 4, 5]);
/// mocker.init_output::<u32>(0, 8);
/// assert_eq!(mocker.run(), WorkOutcome::Done);
///
/// let (items, _) = mocker.output::<u32>(0);
/// assert_eq!(items, vec![1, 2, 3]);
/// ```
pub struct Head<T: core::marker::Copy + Send + 'static> {
    n_items: u64,
    _type: std::marker::PhantomData<T>,
}

impl<T: core::marker::Copy + Send + 'static> Head<T> {
    /// Create Head block
    pub fn new(n_items: u64) -> WrappedKernel<SyncBlock<Self>> {
        let size = std::mem::size_of::<T>();
        SyncBlock::wrap(
            Head::<T> {
                n_items,
                _type: std::marker::PhantomData,
            },
            BlockMetaBuilder::new("Head")
                .input(IoSignature::make(1, Some(1), size))
                .output(IoSignature::make(1, Some(1), size)),
        )
    }

    /// Items still to be copied
    pub fn remaining(&self) -> u64 {
        self.n_items
    }
}

#[doc(hidden)]
impl<T: core::marker::Copy + Send + 'static> SyncKernel for Head<T> {
    fn work(
        &mut self,
        noutput_items: usize,
        io: &mut StreamIo,
        _meta: &mut BlockMeta,
    ) -> Result<isize> {
        if self.n_items == 0 {
            return Ok(WORK_DONE);
        }

        let (i, o) = io.input_output::<T, T>(0, 0);

        let mut m = cmp::min(self.n_items as usize, noutput_items);
        m = cmp::min(m, cmp::min(i.len(), o.len()));
        o[..m].copy_from_slice(&i[..m]);
        self.n_items -= m as u64;

        Ok(m as isize)
    }
}
