use std::cmp;

use crate::runtime::BlockMeta;
use crate::runtime::BlockMetaBuilder;
use crate::runtime::IoSignature;
use crate::runtime::Kernel;
use crate::runtime::Result;
use crate::runtime::StreamIo;
use crate::runtime::Tag;
use crate::runtime::WORK_DONE;
use crate::runtime::WrappedKernel;

/// Stream samples from a vector.
///
/// Tags are given relative to the start of the vector and are posted every time their sample
/// is produced. With `repeat`, the vector is streamed over and over.
///
/// # Outputs
///
/// `0`: Samples
pub struct VectorSource<T: Copy + Send + 'static> {
    items: Vec<T>,
    tags: Vec<Tag>,
    repeat: bool,
    n_copied: usize,
}

impl<T: Copy + Send + 'static> VectorSource<T> {
    /// Create VectorSource block
    pub fn new(items: Vec<T>, tags: Vec<Tag>, repeat: bool) -> WrappedKernel<Self> {
        let tags: Vec<Tag> = tags
            .into_iter()
            .filter(|t| {
                let keep = (t.offset as usize) < items.len();
                if !keep {
                    warn!("VectorSource: dropping tag {} beyond the vector", t.key);
                }
                keep
            })
            .collect();

        WrappedKernel::new(
            VectorSource {
                items,
                tags,
                repeat,
                n_copied: 0,
            },
            BlockMetaBuilder::new("VectorSource")
                .output(IoSignature::make(1, Some(1), std::mem::size_of::<T>()))
                .build(),
        )
    }
}

#[doc(hidden)]
impl<T: Copy + Send + 'static> Kernel for VectorSource<T> {
    fn general_work(
        &mut self,
        noutput_items: usize,
        _ninput_items: &[usize],
        io: &mut StreamIo,
        _meta: &mut BlockMeta,
    ) -> Result<isize> {
        let len = self.items.len();
        if len == 0 || (!self.repeat && self.n_copied == len) {
            return Ok(WORK_DONE);
        }

        let base = io.nitems_written(0);
        let o = io.output::<T>(0);

        let n = if self.repeat {
            let n = cmp::min(noutput_items, o.len());
            for (k, v) in o[..n].iter_mut().enumerate() {
                *v = self.items[(self.n_copied + k) % len];
            }
            for t in self.tags.iter() {
                let mut k = (t.offset as usize + len - self.n_copied) % len;
                while k < n {
                    io.add_item_tag(0, &Tag::new(base + k as u64, t.key.clone(), t.value.clone()));
                    k += len;
                }
            }
            n
        } else {
            let n = cmp::min(cmp::min(noutput_items, o.len()), len - self.n_copied);
            o[..n].copy_from_slice(&self.items[self.n_copied..self.n_copied + n]);
            for t in self.tags.iter() {
                let offset = t.offset as usize;
                if offset >= self.n_copied && offset < self.n_copied + n {
                    let offset = base + (offset - self.n_copied) as u64;
                    io.add_item_tag(0, &Tag::new(offset, t.key.clone(), t.value.clone()));
                }
            }
            n
        };

        self.n_copied = if self.repeat {
            (self.n_copied + n) % len
        } else {
            self.n_copied + n
        };

        Ok(n as isize)
    }
}
