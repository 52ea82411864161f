/// Stream signature of a legacy block.
///
/// Describes how many streams a block accepts on one side and the item width of each. If there
/// are more streams than widths, the last width repeats.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IoSignature {
    min_streams: usize,
    max_streams: Option<usize>,
    item_sizes: Vec<usize>,
}

impl IoSignature {
    /// Signature with a single item width.
    ///
    /// `max_streams` of `None` means unbounded.
    pub fn make(min_streams: usize, max_streams: Option<usize>, item_size: usize) -> IoSignature {
        IoSignature::makev(min_streams, max_streams, vec![item_size])
    }

    /// Signature with distinct widths for the first and the remaining streams.
    pub fn make2(
        min_streams: usize,
        max_streams: Option<usize>,
        item_size1: usize,
        item_size2: usize,
    ) -> IoSignature {
        IoSignature::makev(min_streams, max_streams, vec![item_size1, item_size2])
    }

    /// Signature with one width per stream.
    pub fn makev(
        min_streams: usize,
        max_streams: Option<usize>,
        item_sizes: Vec<usize>,
    ) -> IoSignature {
        if let Some(max) = max_streams {
            assert!(min_streams <= max, "min_streams {min_streams} > max_streams {max}");
        }
        IoSignature {
            min_streams,
            max_streams,
            item_sizes,
        }
    }

    /// Signature without streams.
    pub fn empty() -> IoSignature {
        IoSignature::makev(0, Some(0), Vec::new())
    }

    /// Minimum number of streams
    pub fn min_streams(&self) -> usize {
        self.min_streams
    }

    /// Maximum number of streams, `None` if unbounded
    pub fn max_streams(&self) -> Option<usize> {
        self.max_streams
    }

    /// Check if the number of streams is unbounded.
    pub fn is_unbounded(&self) -> bool {
        self.max_streams.is_none()
    }

    /// Item width of stream `index`, `0` if the signature has no widths.
    pub fn item_size(&self, index: usize) -> usize {
        match self.item_sizes.get(index) {
            Some(s) => *s,
            None => self.item_sizes.last().copied().unwrap_or(0),
        }
    }

    /// Declared item widths
    pub fn item_sizes(&self) -> &[usize] {
        &self.item_sizes
    }
}
