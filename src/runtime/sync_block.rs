use crate::runtime::BlockMeta;
use crate::runtime::BlockMetaBuilder;
use crate::runtime::Kernel;
use crate::runtime::Result;
use crate::runtime::StreamIo;
use crate::runtime::WrappedKernel;

/// Fixed-rate processing
///
/// Kernels of blocks with a constant input/output ratio only implement `work`. The wrappers
/// derive the forecast and consume the inputs.
pub trait SyncKernel: Send {
    /// Produce up to `noutput_items` on every output. Returns the number produced.
    fn work(&mut self, noutput_items: usize, io: &mut StreamIo, meta: &mut BlockMeta)
    -> Result<isize>;

    /// Called on activation.
    fn start(&mut self, _meta: &mut BlockMeta) -> Result<()> {
        Ok(())
    }

    /// Called on deactivation.
    fn stop(&mut self, _meta: &mut BlockMeta) -> Result<()> {
        Ok(())
    }
}

/// One input item per output item
pub struct SyncBlock<K> {
    /// Wrapped kernel
    pub kernel: K,
}

impl<K: SyncKernel + 'static> SyncBlock<K> {
    /// Wrap a kernel into a block.
    pub fn wrap(kernel: K, meta: BlockMetaBuilder) -> WrappedKernel<SyncBlock<K>> {
        WrappedKernel::new(SyncBlock { kernel }, meta.relative_rate(1.0).build())
    }
}

impl<K: SyncKernel> Kernel for SyncBlock<K> {
    fn general_work(
        &mut self,
        noutput_items: usize,
        _ninput_items: &[usize],
        io: &mut StreamIo,
        meta: &mut BlockMeta,
    ) -> Result<isize> {
        let r = self.kernel.work(noutput_items, io, meta)?;
        if r > 0 {
            io.consume_each(r);
        }
        Ok(r)
    }

    fn start(&mut self, meta: &mut BlockMeta) -> Result<()> {
        self.kernel.start(meta)
    }

    fn stop(&mut self, meta: &mut BlockMeta) -> Result<()> {
        self.kernel.stop(meta)
    }
}

/// `decimation` input items per output item
pub struct SyncDecimator<K> {
    /// Wrapped kernel
    pub kernel: K,
    decimation: usize,
}

impl<K: SyncKernel + 'static> SyncDecimator<K> {
    /// Wrap a kernel into a block.
    ///
    /// # Panics
    ///
    /// Panics if `decimation` is zero.
    pub fn wrap(
        kernel: K,
        decimation: usize,
        meta: BlockMetaBuilder,
    ) -> WrappedKernel<SyncDecimator<K>> {
        assert!(decimation > 0, "decimation must be positive");
        WrappedKernel::new(
            SyncDecimator { kernel, decimation },
            meta.relative_rate(1.0 / decimation as f64).build(),
        )
    }
}

impl<K> SyncDecimator<K> {
    /// Input items per output item
    pub fn decimation(&self) -> usize {
        self.decimation
    }
}

impl<K: SyncKernel> Kernel for SyncDecimator<K> {
    fn forecast(&self, noutput_items: usize, ninput_items_required: &mut [usize], meta: &BlockMeta) {
        ninput_items_required.fill(noutput_items * self.decimation + meta.history() - 1);
    }

    fn general_work(
        &mut self,
        noutput_items: usize,
        _ninput_items: &[usize],
        io: &mut StreamIo,
        meta: &mut BlockMeta,
    ) -> Result<isize> {
        let r = self.kernel.work(noutput_items, io, meta)?;
        if r > 0 {
            io.consume_each(r * self.decimation as isize);
        }
        Ok(r)
    }

    fn start(&mut self, meta: &mut BlockMeta) -> Result<()> {
        self.kernel.start(meta)
    }

    fn stop(&mut self, meta: &mut BlockMeta) -> Result<()> {
        self.kernel.stop(meta)
    }
}

/// `interpolation` output items per input item
pub struct SyncInterpolator<K> {
    /// Wrapped kernel
    pub kernel: K,
    interpolation: usize,
}

impl<K: SyncKernel + 'static> SyncInterpolator<K> {
    /// Wrap a kernel into a block.
    ///
    /// # Panics
    ///
    /// Panics if `interpolation` is zero.
    pub fn wrap(
        kernel: K,
        interpolation: usize,
        meta: BlockMetaBuilder,
    ) -> WrappedKernel<SyncInterpolator<K>> {
        assert!(interpolation > 0, "interpolation must be positive");
        WrappedKernel::new(
            SyncInterpolator {
                kernel,
                interpolation,
            },
            meta.relative_rate(interpolation as f64).build(),
        )
    }
}

impl<K> SyncInterpolator<K> {
    /// Output items per input item
    pub fn interpolation(&self) -> usize {
        self.interpolation
    }
}

impl<K: SyncKernel> Kernel for SyncInterpolator<K> {
    fn forecast(&self, noutput_items: usize, ninput_items_required: &mut [usize], meta: &BlockMeta) {
        ninput_items_required.fill(noutput_items / self.interpolation + meta.history() - 1);
    }

    fn general_work(
        &mut self,
        noutput_items: usize,
        _ninput_items: &[usize],
        io: &mut StreamIo,
        meta: &mut BlockMeta,
    ) -> Result<isize> {
        let r = self.kernel.work(noutput_items, io, meta)?;
        if r > 0 {
            io.consume_each(r / self.interpolation as isize);
        }
        Ok(r)
    }

    fn start(&mut self, meta: &mut BlockMeta) -> Result<()> {
        self.kernel.start(meta)
    }

    fn stop(&mut self, meta: &mut BlockMeta) -> Result<()> {
        self.kernel.stop(meta)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::IoSignature;

    struct Nop;

    impl SyncKernel for Nop {
        fn work(&mut self, n: usize, _io: &mut StreamIo, _meta: &mut BlockMeta) -> Result<isize> {
            Ok(n as isize)
        }
    }

    fn builder(history: usize) -> BlockMetaBuilder {
        BlockMetaBuilder::new("Nop")
            .input(IoSignature::make(1, None, 4))
            .output(IoSignature::make(1, None, 4))
            .history(history)
    }

    #[test]
    fn forecasts() {
        let mut r = [0; 2];

        let b = SyncBlock::wrap(Nop, builder(3));
        b.kernel.forecast(10, &mut r, &b.meta);
        assert_eq!(r, [12, 12]);
        assert_eq!(b.meta.relative_rate(), 1.0);

        let b = SyncDecimator::wrap(Nop, 4, builder(1));
        b.kernel.forecast(10, &mut r, &b.meta);
        assert_eq!(r, [40, 40]);
        assert_eq!(b.meta.relative_rate(), 0.25);
        assert_eq!(b.kernel.decimation(), 4);

        let b = SyncInterpolator::wrap(Nop, 3, builder(1));
        b.kernel.forecast(10, &mut r, &b.meta);
        assert_eq!(r, [3, 3]);
        assert_eq!(b.meta.relative_rate(), 3.0);
        assert_eq!(b.kernel.interpolation(), 3);
    }
}
