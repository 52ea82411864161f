use std::cmp;

use crate::runtime::BlockMeta;
use crate::runtime::BlockMetaBuilder;
use crate::runtime::IoSignature;
use crate::runtime::Result;
use crate::runtime::StreamIo;
use crate::runtime::SyncBlock;
use crate::runtime::SyncKernel;
use crate::runtime::WrappedKernel;

/// Copy input samples to the output.
///
/// # Inputs
///
/// `0`: Input
///
/// # Outputs
///
/// `0`: Output
pub struct Copy<T: core::marker::Copy + Send + 'static> {
    _type: std::marker::PhantomData<T>,
}

impl<T: core::marker::Copy + Send + 'static> Copy<T> {
    /// Create [`struct@Copy`] block
    pub fn new() -> WrappedKernel<SyncBlock<Self>> {
        let size = std::mem::size_of::<T>();
        SyncBlock::wrap(
            Self {
                _type: std::marker::PhantomData,
            },
            BlockMetaBuilder::new("Copy")
                .input(IoSignature::make(1, Some(1), size))
                .output(IoSignature::make(1, Some(1), size)),
        )
    }
}

#[doc(hidden)]
impl<T: core::marker::Copy + Send + 'static> SyncKernel for Copy<T> {
    fn work(
        &mut self,
        noutput_items: usize,
        io: &mut StreamIo,
        _meta: &mut BlockMeta,
    ) -> Result<isize> {
        let (i, o) = io.input_output::<T, T>(0, 0);

        let m = cmp::min(noutput_items, cmp::min(i.len(), o.len()));
        o[..m].copy_from_slice(&i[..m]);

        Ok(m as isize)
    }
}
