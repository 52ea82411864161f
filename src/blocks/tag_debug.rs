use crate::runtime::BlockMeta;
use crate::runtime::BlockMetaBuilder;
use crate::runtime::IoSignature;
use crate::runtime::Result;
use crate::runtime::StreamIo;
use crate::runtime::Symbol;
use crate::runtime::SyncBlock;
use crate::runtime::SyncKernel;
use crate::runtime::Tag;
use crate::runtime::WrappedKernel;

/// Drop samples, collecting tags.
///
/// Tags are logged with the `name` as prefix to help differentiate the output from multiple
/// tag debug blocks. With a key filter, only tags with that key are collected.
///
/// # Inputs
///
/// `0`: Stream to drop
///
/// # Outputs
///
/// No outputs
///
/// # Usage
/// ```
/// use blockbridge::blocks::TagDebug;
/// use blockbridge::runtime::Mocker;
/// use blockbridge::runtime::Pmt;
/// use blockbridge::runtime::Tag;
///
/// let mut mocker = Mocker::new(TagDebug::<f32>::new("foo", None));
/// mocker.init();
/// mocker.input_with_tags(0, vec![0.0f32; 8], vec![Tag::new(5, "sob", Pmt::Null)]);
/// mocker.run();
///
/// assert_eq!(mocker.kernel().kernel.tags(), &[Tag::new(5, "sob", Pmt::Null)]);
/// ```
pub struct TagDebug<T: Send + 'static> {
    name: String,
    key: Option<Symbol>,
    display: bool,
    tags: Vec<Tag>,
    window: Vec<Tag>,
    _type: std::marker::PhantomData<T>,
}

impl<T: Send + 'static> TagDebug<T> {
    /// Create TagDebug block
    pub fn new(name: impl Into<String>, key: Option<&str>) -> WrappedKernel<SyncBlock<Self>> {
        SyncBlock::wrap(
            TagDebug::<T> {
                name: name.into(),
                key: key.map(Symbol::new),
                display: true,
                tags: Vec::new(),
                window: Vec::new(),
                _type: std::marker::PhantomData,
            },
            BlockMetaBuilder::new("TagDebug")
                .input(IoSignature::make(1, Some(1), std::mem::size_of::<T>())),
        )
    }

    /// Collected tags
    pub fn tags(&self) -> &[Tag] {
        &self.tags
    }

    /// Log every tag on arrival.
    pub fn set_display(&mut self, display: bool) {
        self.display = display;
    }
}

#[doc(hidden)]
impl<T: Send + 'static> SyncKernel for TagDebug<T> {
    fn work(
        &mut self,
        noutput_items: usize,
        io: &mut StreamIo,
        _meta: &mut BlockMeta,
    ) -> Result<isize> {
        let n = noutput_items.min(io.input_bytes(0).len() / std::mem::size_of::<T>().max(1));
        let start = io.nitems_read(0);
        io.get_tags_in_range(
            &mut self.window,
            0,
            start,
            start + n as u64,
            self.key.as_ref(),
        );

        for t in self.window.drain(..) {
            if self.display {
                info!(
                    "TagDebug {}: offset {} -- {} = {}",
                    self.name, t.offset, t.key, t.value
                );
            }
            self.tags.push(t);
        }

        Ok(n as isize)
    }
}
