use std::cmp;

use crate::runtime::BlockMeta;
use crate::runtime::BlockMetaBuilder;
use crate::runtime::IoSignature;
use crate::runtime::Kernel;
use crate::runtime::Result;
use crate::runtime::StreamIo;
use crate::runtime::Tag;
use crate::runtime::TagPropagationPolicy;
use crate::runtime::WORK_CALLED_PRODUCE;
use crate::runtime::WrappedKernel;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Pad(usize),
    Copy,
    Skip(usize),
}

/// Delays samples.
///
/// A positive delay inserts zeros before the stream, a negative delay drops samples from its
/// start. Tags move with their samples; tags on dropped samples are discarded.
///
/// # Inputs
///
/// `0`: Stream to delay
///
/// # Outputs
///
/// `0`: Delayed stream
pub struct Delay<T: Copy + Send + 'static> {
    state: State,
    skip: u64,
    tags: Vec<Tag>,
    _type: std::marker::PhantomData<T>,
}

impl<T: Copy + Send + 'static> Delay<T> {
    /// Delay by `n` samples, a negative `n` skips samples.
    pub fn new(n: isize) -> WrappedKernel<Self> {
        let state = match n.cmp(&0) {
            cmp::Ordering::Greater => State::Pad(n.unsigned_abs()),
            cmp::Ordering::Equal => State::Copy,
            cmp::Ordering::Less => State::Skip(n.unsigned_abs()),
        };
        let size = std::mem::size_of::<T>();

        WrappedKernel::new(
            Self {
                state,
                skip: if n < 0 { n.unsigned_abs() as u64 } else { 0 },
                tags: Vec::new(),
                _type: std::marker::PhantomData,
            },
            BlockMetaBuilder::new("Delay")
                .input(IoSignature::make(1, Some(1), size))
                .output(IoSignature::make(1, Some(1), size))
                .attr_delay(if n > 0 { n as u64 } else { 0 })
                .tag_propagation_policy(TagPropagationPolicy::Custom)
                .build(),
        )
    }
}

#[doc(hidden)]
impl<T: Copy + Send + 'static> Kernel for Delay<T> {
    fn forecast(&self, noutput_items: usize, ninput_items_required: &mut [usize], _meta: &BlockMeta) {
        let n = match self.state {
            State::Pad(_) => 0,
            State::Skip(_) => 1,
            State::Copy => noutput_items,
        };
        ninput_items_required.fill(n);
    }

    fn general_work(
        &mut self,
        noutput_items: usize,
        ninput_items: &[usize],
        io: &mut StreamIo,
        meta: &mut BlockMeta,
    ) -> Result<isize> {
        match self.state {
            State::Pad(n) => {
                let m = cmp::min(noutput_items, n);
                io.output_bytes(0)[..m * std::mem::size_of::<T>()].fill(0);
                io.produce(0, m as isize);

                self.state = if m == n {
                    State::Copy
                } else {
                    State::Pad(n - m)
                };
            }
            State::Skip(n) => {
                let m = cmp::min(ninput_items[0], n);
                io.consume(0, m as isize);

                self.state = if m == n {
                    State::Copy
                } else {
                    State::Skip(n - m)
                };
            }
            State::Copy => {
                let (i, o) = io.input_output::<T, T>(0, 0);
                let m = cmp::min(noutput_items, cmp::min(i.len(), o.len()));
                o[..m].copy_from_slice(&i[..m]);

                // tags are read shifted by the delay
                let d = meta.attr_delay();
                io.get_tags_in_window(&mut self.tags, 0, d, d + m as u64, None);
                for t in self.tags.iter_mut() {
                    t.offset -= self.skip;
                    io.add_item_tag(0, t);
                }

                io.consume(0, m as isize);
                io.produce(0, m as isize);
            }
        }

        Ok(WORK_CALLED_PRODUCE)
    }
}
