//! In-memory host for tests
//!
//! [`MockHost`] implements [`BlockHost`] on plain vectors and applies consume and produce when a
//! work invocation ends. [`Mocker`] drives a single block through it.
use std::mem;
use std::ptr;

use crate::runtime::Block;
use crate::runtime::BlockHost;
use crate::runtime::BufferManagerArgs;
use crate::runtime::DType;
use crate::runtime::Error;
use crate::runtime::InputPort;
use crate::runtime::Kernel;
use crate::runtime::Label;
use crate::runtime::Lifecycle;
use crate::runtime::OffsetRebase;
use crate::runtime::OutputPort;
use crate::runtime::Pmt;
use crate::runtime::Tag;
use crate::runtime::WorkInfo;
use crate::runtime::WorkOutcome;
use crate::runtime::WrappedKernel;
use crate::runtime::tag;

// Byte storage with 8-byte alignment, so that typed views of the items are aligned.
#[derive(Debug, Default)]
struct ItemBuffer {
    words: Vec<u64>,
    len: usize,
}

impl ItemBuffer {
    fn zeroed(len: usize) -> ItemBuffer {
        ItemBuffer {
            words: vec![0; len.div_ceil(8)],
            len,
        }
    }

    fn len(&self) -> usize {
        self.len
    }

    fn as_ptr(&self) -> *const u8 {
        self.words.as_ptr().cast()
    }

    fn as_mut_ptr(&mut self) -> *mut u8 {
        self.words.as_mut_ptr().cast()
    }

    fn extend(&mut self, bytes: &[u8]) {
        let len = self.len + bytes.len();
        self.words.resize(len.div_ceil(8), 0);
        unsafe {
            ptr::copy_nonoverlapping(bytes.as_ptr(), self.as_mut_ptr().add(self.len), bytes.len());
        }
        self.len = len;
    }

    fn bytes(&self, start: usize, end: usize) -> &[u8] {
        assert!(start <= end && end <= self.len);
        unsafe { std::slice::from_raw_parts(self.as_ptr().add(start), end - start) }
    }
}

fn as_bytes<T: Copy>(items: &[T]) -> &[u8] {
    unsafe { std::slice::from_raw_parts(items.as_ptr().cast(), mem::size_of_val(items)) }
}

fn from_bytes<T: Copy>(bytes: &[u8]) -> Vec<T> {
    bytes
        .chunks_exact(mem::size_of::<T>())
        .map(|c| unsafe { ptr::read_unaligned(c.as_ptr().cast::<T>()) })
        .collect()
}

/// In-memory input port
#[derive(Debug)]
pub struct MockInput {
    dtype: DType,
    buffer: ItemBuffer,
    read: usize,
    total: u64,
    pending: usize,
    labels: Vec<Label>,
    reserve: usize,
}

impl MockInput {
    /// Create empty port
    pub fn new(dtype: DType) -> MockInput {
        MockInput {
            dtype,
            buffer: ItemBuffer::default(),
            read: 0,
            total: 0,
            pending: 0,
            labels: Vec::new(),
            reserve: 0,
        }
    }

    fn item_size(&self) -> usize {
        self.dtype.size().max(1)
    }

    /// Append items.
    pub fn push_items<T: Copy>(&mut self, items: &[T]) {
        self.dtype.check_item_type::<T>();
        self.buffer.extend(as_bytes(items));
    }

    /// Add a label, index relative to [`total_elements`](InputPort::total_elements).
    pub fn push_label(&mut self, label: Label) {
        self.labels.push(label);
    }

    fn ptr(&self) -> *const u8 {
        self.buffer.as_ptr().wrapping_add(self.read * self.item_size())
    }

    fn consumed_labels(&self) -> Vec<Label> {
        let n = self.pending.min(self.elements()) as i64;
        self.labels.iter().filter(|l| l.index < n).cloned().collect()
    }

    fn commit(&mut self) -> bool {
        let available = self.elements();
        if self.pending > available {
            warn!(
                "consumed {} items with only {} available",
                self.pending, available
            );
        }
        let n = self.pending.min(available);
        self.pending = 0;
        if n == 0 {
            return false;
        }

        self.read += n;
        self.total += n as u64;
        let n = n as i64;
        self.labels.retain(|l| l.index >= n);
        for l in self.labels.iter_mut() {
            l.index -= n;
        }
        true
    }
}

impl InputPort for MockInput {
    fn dtype(&self) -> &DType {
        &self.dtype
    }
    fn elements(&self) -> usize {
        self.buffer.len() / self.item_size() - self.read
    }
    fn total_elements(&self) -> u64 {
        self.total
    }
    fn consume(&mut self, items: usize) {
        self.pending += items;
    }
    fn labels(&self) -> &[Label] {
        &self.labels
    }
    fn remove_label(&mut self, label: &Label) {
        if let Some(i) = self
            .labels
            .iter()
            .position(|l| l.index == label.index && l.id == label.id)
        {
            self.labels.remove(i);
        }
    }
    fn set_reserve(&mut self, items: usize) {
        self.reserve = items;
    }
    fn reserve(&self) -> usize {
        self.reserve
    }
}

/// In-memory output port with fixed capacity
#[derive(Debug)]
pub struct MockOutput {
    dtype: DType,
    buffer: ItemBuffer,
    capacity: usize,
    written: usize,
    total: u64,
    pending: usize,
    posted: Vec<Label>,
    tags: Vec<Tag>,
}

impl MockOutput {
    /// Create port without buffer space
    pub fn new(dtype: DType) -> MockOutput {
        MockOutput {
            dtype,
            buffer: ItemBuffer::default(),
            capacity: 0,
            written: 0,
            total: 0,
            pending: 0,
            posted: Vec::new(),
            tags: Vec::new(),
        }
    }

    fn item_size(&self) -> usize {
        self.dtype.size().max(1)
    }

    /// Resize the buffer to `items`, keeping produced items that fit.
    pub fn set_capacity(&mut self, items: usize) {
        let size = self.item_size();
        let mut buffer = ItemBuffer::zeroed(items * size);
        self.written = self.written.min(items);
        let keep = self.written * size;
        unsafe {
            ptr::copy_nonoverlapping(self.buffer.as_ptr(), buffer.as_mut_ptr(), keep);
        }
        self.buffer = buffer;
        self.capacity = items;
    }

    /// Items produced since the last [`take`](MockOutput::take)
    pub fn items<T: Copy>(&self) -> Vec<T> {
        self.dtype.check_item_type::<T>();
        from_bytes(self.buffer.bytes(0, self.written * self.item_size()))
    }

    /// Posted labels as tags with absolute offsets
    pub fn tags(&self) -> &[Tag] {
        &self.tags
    }

    /// Labels as posted, indices relative to the total at posting time
    pub fn posted(&self) -> &[Label] {
        &self.posted
    }

    /// Remove and return produced items and tags.
    pub fn take<T: Copy>(&mut self) -> (Vec<T>, Vec<Tag>) {
        let items = self.items::<T>();
        self.written = 0;
        self.posted.clear();
        (items, mem::take(&mut self.tags))
    }

    fn ptr(&mut self) -> *mut u8 {
        let offset = self.written * self.item_size();
        self.buffer.as_mut_ptr().wrapping_add(offset)
    }

    fn commit(&mut self) -> bool {
        let free = self.elements();
        if self.pending > free {
            warn!("produced {} items with only {} free", self.pending, free);
        }
        let n = self.pending.min(free);
        self.pending = 0;
        self.written += n;
        self.total += n as u64;
        n > 0
    }
}

impl OutputPort for MockOutput {
    fn dtype(&self) -> &DType {
        &self.dtype
    }
    fn elements(&self) -> usize {
        self.capacity - self.written
    }
    fn total_elements(&self) -> u64 {
        self.total
    }
    fn produce(&mut self, items: usize) {
        self.pending += items;
    }
    fn post_label(&mut self, label: Label) {
        match tag::label_to_tag(&label, self.total, OffsetRebase::default()) {
            Some(t) => self.tags.push(t),
            None => warn!("label {} posted before the start of the stream", label.id),
        }
        self.posted.push(label);
    }
}

/// In-memory host
///
/// Consume and produce calls accumulate during a work invocation and are applied by
/// [`commit`](MockHost::commit).
#[derive(Debug, Default)]
pub struct MockHost {
    name: String,
    /// Input ports
    pub inputs: Vec<MockInput>,
    /// Output ports
    pub outputs: Vec<MockOutput>,
    calls: Vec<String>,
    work_info: WorkInfo,
    buffer_args: Option<BufferManagerArgs>,
}

impl MockHost {
    /// Create host without ports
    pub fn new() -> MockHost {
        MockHost::default()
    }

    /// Block name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Registered calls
    pub fn calls(&self) -> &[String] {
        &self.calls
    }

    /// Override the default buffer manager arguments.
    pub fn set_default_buffer_args(&mut self, args: BufferManagerArgs) {
        self.buffer_args = Some(args);
    }

    /// Snapshot the buffers for the next work invocation.
    pub fn prepare(&mut self) {
        let ins: Vec<usize> = self.inputs.iter().map(|p| p.elements()).collect();
        let outs: Vec<usize> = self.outputs.iter().map(|p| p.elements()).collect();
        self.work_info = WorkInfo {
            min_elements: ins.iter().chain(outs.iter()).copied().min().unwrap_or(0),
            min_in_elements: ins.iter().copied().min().unwrap_or(0),
            max_in_elements: ins.iter().copied().max().unwrap_or(0),
            min_out_elements: outs.iter().copied().min().unwrap_or(0),
            input_pointers: self.inputs.iter().map(|p| p.ptr()).collect(),
            output_pointers: self.outputs.iter_mut().map(|p| p.ptr()).collect(),
        };
    }

    /// Labels covered by the pending consume of every input.
    pub fn consumed_labels(&self) -> Vec<Vec<Label>> {
        self.inputs.iter().map(|p| p.consumed_labels()).collect()
    }

    /// Apply pending consume and produce. Returns `true` if any items moved.
    pub fn commit(&mut self) -> bool {
        let mut progress = false;
        for p in self.inputs.iter_mut() {
            progress |= p.commit();
        }
        for p in self.outputs.iter_mut() {
            progress |= p.commit();
        }
        progress
    }

    /// Drop pending consume and produce.
    pub fn discard(&mut self) {
        for p in self.inputs.iter_mut() {
            p.pending = 0;
        }
        for p in self.outputs.iter_mut() {
            p.pending = 0;
        }
    }
}

impl BlockHost for MockHost {
    fn set_name(&mut self, name: &str) {
        self.name = name.to_string();
    }
    fn setup_input(&mut self, index: usize, dtype: DType) {
        if index < self.inputs.len() {
            self.inputs[index] = MockInput::new(dtype);
        } else {
            assert_eq!(index, self.inputs.len(), "inputs are set up in order");
            self.inputs.push(MockInput::new(dtype));
        }
    }
    fn setup_output(&mut self, index: usize, dtype: DType) {
        if index < self.outputs.len() {
            self.outputs[index] = MockOutput::new(dtype);
        } else {
            assert_eq!(index, self.outputs.len(), "outputs are set up in order");
            self.outputs.push(MockOutput::new(dtype));
        }
    }
    fn register_call(&mut self, name: &str) {
        self.calls.push(name.to_string());
    }
    fn num_inputs(&self) -> usize {
        self.inputs.len()
    }
    fn num_outputs(&self) -> usize {
        self.outputs.len()
    }
    fn input(&self, index: usize) -> &dyn InputPort {
        &self.inputs[index]
    }
    fn input_mut(&mut self, index: usize) -> &mut dyn InputPort {
        &mut self.inputs[index]
    }
    fn output(&self, index: usize) -> &dyn OutputPort {
        &self.outputs[index]
    }
    fn output_mut(&mut self, index: usize) -> &mut dyn OutputPort {
        &mut self.outputs[index]
    }
    fn work_info(&self) -> &WorkInfo {
        &self.work_info
    }
    fn default_buffer_args(&self) -> BufferManagerArgs {
        self.buffer_args.clone().unwrap_or_default()
    }
}

/// Mocker for a block
///
/// A harness to run a block without a host framework. Used for unit tests and benchmarking.
/// The block is initialized on construction.
pub struct Mocker<K: Kernel> {
    block: WrappedKernel<K>,
    host: MockHost,
}

impl<K: Kernel + 'static> Mocker<K> {
    /// Create mocker
    pub fn new(mut block: WrappedKernel<K>) -> Self {
        let mut host = MockHost::new();
        if block.lifecycle() == Lifecycle::Constructed {
            if let Err(e) = block.initialize(&mut host) {
                warn!("initializing block failed: {e}");
            }
        }
        Mocker { block, host }
    }

    /// Wrapped block
    pub fn block(&self) -> &WrappedKernel<K> {
        &self.block
    }

    /// Wrapped block, mutably
    pub fn block_mut(&mut self) -> &mut WrappedKernel<K> {
        &mut self.block
    }

    /// Kernel of the block
    pub fn kernel(&self) -> &K {
        &self.block.kernel
    }

    /// Host
    pub fn host(&self) -> &MockHost {
        &self.host
    }

    /// Host, mutably
    pub fn host_mut(&mut self) -> &mut MockHost {
        &mut self.host
    }

    /// Issue a host call on the block.
    pub fn call(&mut self, name: &str, args: &[Pmt]) -> Result<Pmt, Error> {
        self.block.call(&mut self.host, name, args)
    }

    /// Add input items
    pub fn input<T: Copy + 'static>(&mut self, id: usize, data: Vec<T>) {
        self.input_with_tags(id, data, Vec::new());
    }

    /// Add input items and tags
    ///
    /// Tag offsets count from the first item of `data`.
    pub fn input_with_tags<T: Copy + 'static>(&mut self, id: usize, data: Vec<T>, tags: Vec<Tag>) {
        let port = &mut self.host.inputs[id];
        let base = port.elements() as i64;
        for t in tags.iter() {
            port.push_label(Label {
                index: base + t.offset as i64,
                ..tag::tag_to_label(t, 0)
            });
        }
        port.push_items(&data);
    }

    /// Set the buffer space of an output, in items.
    pub fn init_output<T: Copy + 'static>(&mut self, id: usize, capacity: usize) {
        let port = &mut self.host.outputs[id];
        port.dtype().check_item_type::<T>();
        port.set_capacity(capacity);
    }

    /// Activate the block.
    pub fn init(&mut self) {
        if let Err(e) = self.block.activate() {
            panic!("activating {} failed: {e}", self.block.meta.name());
        }
    }

    /// Deactivate the block.
    pub fn deinit(&mut self) {
        if let Err(e) = self.block.deactivate() {
            panic!("deactivating {} failed: {e}", self.block.meta.name());
        }
    }

    /// One work cycle: work, propagate consumed labels, commit.
    pub fn step(&mut self) -> Result<WorkOutcome, Error> {
        self.cycle().map(|(outcome, _)| outcome)
    }

    fn cycle(&mut self) -> Result<(WorkOutcome, bool), Error> {
        self.host.prepare();
        let outcome = match self.block.work(&mut self.host) {
            Ok(o) => o,
            Err(e) => {
                self.host.discard();
                return Err(e);
            }
        };
        for (i, labels) in self.host.consumed_labels().iter().enumerate() {
            self.block.propagate_labels(&mut self.host, i, labels);
        }
        let progress = self.host.commit();
        Ok((outcome, progress))
    }

    /// Run work cycles until the block is done or stops making progress.
    pub fn try_run(&mut self) -> Result<WorkOutcome, Error> {
        loop {
            match self.cycle()? {
                (o @ WorkOutcome::Called { .. }, true) => {
                    trace!("mocker: {o:?}");
                }
                (o, _) => return Ok(o),
            }
        }
    }

    /// Run work cycles until the block is done or stops making progress.
    ///
    /// # Panics
    ///
    /// Panics if the block returns an error.
    pub fn run(&mut self) -> WorkOutcome {
        match self.try_run() {
            Ok(o) => o,
            Err(e) => panic!("running {} failed: {e}", self.block.meta.name()),
        }
    }

    /// Produced items and tags of an output
    pub fn output<T: Copy + 'static>(&self, id: usize) -> (Vec<T>, Vec<Tag>) {
        let port = &self.host.outputs[id];
        (port.items::<T>(), port.tags().to_vec())
    }

    /// Take produced items and tags of an output, freeing the buffer space.
    pub fn take_output<T: Copy + 'static>(&mut self, id: usize) -> (Vec<T>, Vec<Tag>) {
        self.host.outputs[id].take::<T>()
    }
}
