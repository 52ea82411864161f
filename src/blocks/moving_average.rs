use std::ops::AddAssign;
use std::ops::Mul;
use std::ops::SubAssign;

use crate::runtime::BlockMeta;
use crate::runtime::BlockMetaBuilder;
use crate::runtime::IoSignature;
use crate::runtime::Result;
use crate::runtime::StreamIo;
use crate::runtime::SyncBlock;
use crate::runtime::SyncKernel;
use crate::runtime::WrappedKernel;

/// Scaled sum over a sliding window of `length` samples.
///
/// Output `k` is `scale * (x[k] + ... + x[k + length - 1])`, so the first output needs `length`
/// input samples. The window is kept as block history, which makes the host allocate a circular
/// buffer for the input.
///
/// # Usage
/// ```
/// use blockbridge::blocks::MovingAverage;
/// use blockbridge::runtime::Mocker;
///
/// let mut mocker = Mocker::new(MovingAverage::<f32>::new(2, 0.5));
/// mocker.init();
/// mocker.input(0, vec![1.0f32, 3.0, 5.0, 7.0]);
/// mocker.init_output::<f32>(0, 8);
/// mocker.run();
///
/// let (items, _) = mocker.output::<f32>(0);
/// assert_eq!(items, vec![2.0, 4.0, 6.0]);
/// ```
pub struct MovingAverage<T> {
    length: usize,
    scale: f32,
    _type: std::marker::PhantomData<T>,
}

impl<T> MovingAverage<T>
where
    T: Copy + Default + Send + AddAssign + SubAssign + Mul<f32, Output = T> + 'static,
{
    /// Create MovingAverage block
    ///
    /// # Panics
    ///
    /// Panics if `length` is zero.
    pub fn new(length: usize, scale: f32) -> WrappedKernel<SyncBlock<Self>> {
        assert!(length > 0, "length must be positive");
        let size = std::mem::size_of::<T>();
        SyncBlock::wrap(
            MovingAverage {
                length,
                scale,
                _type: std::marker::PhantomData,
            },
            BlockMetaBuilder::new("MovingAverage")
                .input(IoSignature::make(1, Some(1), size))
                .output(IoSignature::make(1, Some(1), size))
                .history(length),
        )
    }
}

#[doc(hidden)]
impl<T> SyncKernel for MovingAverage<T>
where
    T: Copy + Default + Send + AddAssign + SubAssign + Mul<f32, Output = T> + 'static,
{
    fn work(
        &mut self,
        noutput_items: usize,
        io: &mut StreamIo,
        _meta: &mut BlockMeta,
    ) -> Result<isize> {
        let (i, o) = io.input_output::<T, T>(0, 0);

        let n = noutput_items
            .min(o.len())
            .min((i.len() + 1).saturating_sub(self.length));
        if n == 0 {
            return Ok(0);
        }

        let mut sum = T::default();
        for v in &i[..self.length - 1] {
            sum += *v;
        }
        for k in 0..n {
            sum += i[k + self.length - 1];
            o[k] = sum * self.scale;
            sum -= i[k];
        }

        Ok(n as isize)
    }
}
