use std::cmp;

use crate::runtime::BlockMeta;
use crate::runtime::BlockMetaBuilder;
use crate::runtime::IoSignature;
use crate::runtime::Result;
use crate::runtime::StreamIo;
use crate::runtime::SyncDecimator;
use crate::runtime::SyncKernel;
use crate::runtime::WrappedKernel;

/// Keep the last sample of every `n`.
///
/// Tags are rebased to the decimated rate.
pub struct KeepOneInN<T: Copy + Send + 'static> {
    n: usize,
    _type: std::marker::PhantomData<T>,
}

impl<T: Copy + Send + 'static> KeepOneInN<T> {
    /// Create KeepOneInN block
    ///
    /// # Panics
    ///
    /// Panics if `n` is zero.
    pub fn new(n: usize) -> WrappedKernel<SyncDecimator<Self>> {
        let size = std::mem::size_of::<T>();
        SyncDecimator::wrap(
            KeepOneInN {
                n,
                _type: std::marker::PhantomData,
            },
            n,
            BlockMetaBuilder::new("KeepOneInN")
                .input(IoSignature::make(1, Some(1), size))
                .output(IoSignature::make(1, Some(1), size)),
        )
    }
}

#[doc(hidden)]
impl<T: Copy + Send + 'static> SyncKernel for KeepOneInN<T> {
    fn work(
        &mut self,
        noutput_items: usize,
        io: &mut StreamIo,
        _meta: &mut BlockMeta,
    ) -> Result<isize> {
        let (i, o) = io.input_output::<T, T>(0, 0);

        let m = cmp::min(noutput_items, cmp::min(i.len() / self.n, o.len()));
        for (k, v) in o[..m].iter_mut().enumerate() {
            *v = i[k * self.n + self.n - 1];
        }

        Ok(m as isize)
    }
}
