use std::cmp;

use crate::runtime::BlockMeta;
use crate::runtime::BlockMetaBuilder;
use crate::runtime::IoSignature;
use crate::runtime::Result;
use crate::runtime::StreamIo;
use crate::runtime::SyncInterpolator;
use crate::runtime::SyncKernel;
use crate::runtime::WrappedKernel;

/// Repeat every input sample `interpolation` times.
pub struct Repeat<T: Copy + Send + 'static> {
    interpolation: usize,
    _type: std::marker::PhantomData<T>,
}

impl<T: Copy + Send + 'static> Repeat<T> {
    /// Create Repeat block
    ///
    /// # Panics
    ///
    /// Panics if `interpolation` is zero.
    pub fn new(interpolation: usize) -> WrappedKernel<SyncInterpolator<Self>> {
        let size = std::mem::size_of::<T>();
        SyncInterpolator::wrap(
            Repeat {
                interpolation,
                _type: std::marker::PhantomData,
            },
            interpolation,
            BlockMetaBuilder::new("Repeat")
                .input(IoSignature::make(1, Some(1), size))
                .output(IoSignature::make(1, Some(1), size)),
        )
    }
}

#[doc(hidden)]
impl<T: Copy + Send + 'static> SyncKernel for Repeat<T> {
    fn work(
        &mut self,
        noutput_items: usize,
        io: &mut StreamIo,
        _meta: &mut BlockMeta,
    ) -> Result<isize> {
        let (i, o) = io.input_output::<T, T>(0, 0);

        let n = cmp::min(noutput_items, o.len()) / self.interpolation;
        let n = cmp::min(n, i.len());
        for (chunk, v) in o.chunks_exact_mut(self.interpolation).zip(&i[..n]) {
            chunk.fill(*v);
        }

        Ok((n * self.interpolation) as isize)
    }
}
