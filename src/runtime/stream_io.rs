//! Work-time access to the host buffers
use std::mem;
use std::slice;

use crate::runtime::BlockHost;
use crate::runtime::DType;
use crate::runtime::OffsetRebase;
use crate::runtime::Symbol;
use crate::runtime::Tag;
use crate::runtime::tag;

/// Stream hooks handed to [`Kernel::general_work`](crate::runtime::Kernel::general_work).
///
/// Wraps the host for the duration of one work invocation. Consume and produce calls take effect
/// when the invocation ends, so [`nitems_read`](StreamIo::nitems_read) and
/// [`nitems_written`](StreamIo::nitems_written) stay constant during work.
pub struct StreamIo<'a> {
    host: &'a mut dyn BlockHost,
    rebase: OffsetRebase,
    input_pointers: Vec<*const u8>,
    output_pointers: Vec<*mut u8>,
}

// Typed window of `elements` items at `ptr`, `None` if there is nothing to view.
fn view<T>(ptr: *const u8, dtype: &DType, elements: usize) -> Option<(*const T, usize)> {
    dtype.check_item_type::<T>();
    if ptr.is_null() || elements == 0 {
        return None;
    }
    let ptr = ptr.cast::<T>();
    assert!(
        ptr.is_aligned(),
        "window of port type {dtype} is not aligned for {}",
        std::any::type_name::<T>()
    );
    Some((ptr, elements))
}

fn disjoint<A, B>(a: (*const A, usize), b: (*const B, usize)) -> bool {
    let a_start = a.0.addr();
    let a_end = a_start + a.1 * mem::size_of::<A>();
    let b_start = b.0.addr();
    let b_end = b_start + b.1 * mem::size_of::<B>();
    a_end <= b_start || b_end <= a_start
}

unsafe fn to_slice<'b, T>(v: Option<(*const T, usize)>) -> &'b [T] {
    match v {
        Some((ptr, len)) => unsafe { slice::from_raw_parts(ptr, len) },
        None => &[],
    }
}

unsafe fn to_slice_mut<'b, T>(v: Option<(*mut T, usize)>) -> &'b mut [T] {
    match v {
        Some((ptr, len)) => unsafe { slice::from_raw_parts_mut(ptr, len) },
        None => &mut [],
    }
}

impl<'a> StreamIo<'a> {
    /// Wrap the host, reading tags with `rebase`.
    pub fn new(host: &'a mut dyn BlockHost, rebase: OffsetRebase) -> StreamIo<'a> {
        let info = host.work_info();
        let input_pointers = info.input_pointers.clone();
        let output_pointers = info.output_pointers.clone();
        StreamIo {
            host,
            rebase,
            input_pointers,
            output_pointers,
        }
    }

    /// Number of inputs
    pub fn num_inputs(&self) -> usize {
        self.host.num_inputs()
    }

    /// Number of outputs
    pub fn num_outputs(&self) -> usize {
        self.host.num_outputs()
    }

    fn input_view<T>(&self, index: usize) -> Option<(*const T, usize)> {
        let port = self.host.input(index);
        let ptr = self.input_pointers.get(index).copied()?;
        view(ptr, port.dtype(), port.elements())
    }

    fn output_view<T>(&self, index: usize) -> Option<(*mut T, usize)> {
        let port = self.host.output(index);
        let ptr = self.output_pointers.get(index).copied()?;
        view::<T>(ptr, port.dtype(), port.elements()).map(|(p, len)| (p.cast_mut(), len))
    }

    /// Readable window of input `index`, starting with the history items.
    ///
    /// # Panics
    ///
    /// Panics if `T` does not match the item size of the port, or the window is not aligned for
    /// `T`.
    pub fn input<T: Copy>(&self, index: usize) -> &[T] {
        match self.input_view::<T>(index) {
            Some((ptr, len)) => unsafe { slice::from_raw_parts(ptr, len) },
            None => &[],
        }
    }

    /// Writable window of output `index`.
    ///
    /// The window is borrowed from `self`, so only one can be live at a time. Use
    /// [`input_output`](StreamIo::input_output) or [`split`](StreamIo::split) to access several
    /// buffers at once.
    ///
    /// ```compile_fail
    /// # use blockbridge::runtime::StreamIo;
    /// fn twice(io: &mut StreamIo) {
    ///     let a = io.output::<u32>(0);
    ///     let b = io.output::<u32>(0);
    ///     a[0] = b[0];
    /// }
    /// ```
    ///
    /// # Panics
    ///
    /// Panics if `T` does not match the item size of the port, or the window is not aligned for
    /// `T`.
    pub fn output<T: Copy>(&mut self, index: usize) -> &mut [T] {
        match self.output_view::<T>(index) {
            Some((ptr, len)) => unsafe { slice::from_raw_parts_mut(ptr, len) },
            None => &mut [],
        }
    }

    /// Input `input` and output `output` at the same time.
    ///
    /// # Panics
    ///
    /// Panics like [`input`](StreamIo::input) and [`output`](StreamIo::output), or if the host
    /// hands out overlapping windows.
    pub fn input_output<I: Copy, O: Copy>(
        &mut self,
        input: usize,
        output: usize,
    ) -> (&[I], &mut [O]) {
        let i = self.input_view::<I>(input);
        let o = self.output_view::<O>(output);
        if let (Some(i), Some(o)) = (i, o) {
            assert!(
                disjoint(i, (o.0.cast_const(), o.1)),
                "input {input} overlaps output {output}"
            );
        }
        unsafe { (to_slice(i), to_slice_mut(o)) }
    }

    /// All inputs and all outputs at the same time.
    ///
    /// # Panics
    ///
    /// Panics like [`input`](StreamIo::input) and [`output`](StreamIo::output), or if the host
    /// hands out overlapping windows.
    pub fn split<I: Copy, O: Copy>(&mut self) -> (Vec<&[I]>, Vec<&mut [O]>) {
        let inputs: Vec<_> = (0..self.num_inputs())
            .map(|i| self.input_view::<I>(i))
            .collect();
        let outputs: Vec<_> = (0..self.num_outputs())
            .map(|o| self.output_view::<O>(o))
            .collect();

        for (k, o) in outputs.iter().enumerate() {
            let Some(o) = o else { continue };
            let o = (o.0.cast_const(), o.1);
            for (j, i) in inputs.iter().enumerate() {
                if let Some(i) = i {
                    assert!(disjoint(*i, o), "input {j} overlaps output {k}");
                }
            }
            for (j, p) in outputs[..k].iter().enumerate() {
                if let Some(p) = p {
                    assert!(disjoint((p.0.cast_const(), p.1), o), "output {j} overlaps output {k}");
                }
            }
        }

        unsafe {
            (
                inputs.into_iter().map(|i| to_slice(i)).collect(),
                outputs.into_iter().map(|o| to_slice_mut(o)).collect(),
            )
        }
    }

    /// Readable window of input `index` as raw bytes
    pub fn input_bytes(&self, index: usize) -> &[u8] {
        let port = self.host.input(index);
        let len = port.elements() * port.dtype().size();
        match self.input_pointers.get(index) {
            Some(ptr) if !ptr.is_null() && len > 0 => unsafe { slice::from_raw_parts(*ptr, len) },
            _ => &[],
        }
    }

    /// Writable window of output `index` as raw bytes
    pub fn output_bytes(&mut self, index: usize) -> &mut [u8] {
        let port = self.host.output(index);
        let len = port.elements() * port.dtype().size();
        match self.output_pointers.get(index) {
            Some(ptr) if !ptr.is_null() && len > 0 => unsafe {
                slice::from_raw_parts_mut(*ptr, len)
            },
            _ => &mut [],
        }
    }

    /// Consume items on one input. Negative counts are ignored.
    pub fn consume(&mut self, index: usize, items: isize) {
        if items < 0 {
            return;
        }
        self.host.input_mut(index).consume(items as usize);
    }

    /// Consume items on every input. Negative counts are ignored.
    pub fn consume_each(&mut self, items: isize) {
        if items < 0 {
            return;
        }
        for i in 0..self.host.num_inputs() {
            self.host.input_mut(i).consume(items as usize);
        }
    }

    /// Produce items on one output. Negative counts are ignored.
    pub fn produce(&mut self, index: usize, items: isize) {
        if items < 0 {
            return;
        }
        self.host.output_mut(index).produce(items as usize);
    }

    /// Items consumed on input `index` before this invocation
    pub fn nitems_read(&self, index: usize) -> u64 {
        self.host.input(index).total_elements()
    }

    /// Items produced on output `index` before this invocation
    pub fn nitems_written(&self, index: usize) -> u64 {
        self.host.output(index).total_elements()
    }

    /// Attach a tag to output `index`.
    ///
    /// # Panics
    ///
    /// Panics if the offset lies before [`nitems_written`](StreamIo::nitems_written).
    pub fn add_item_tag(&mut self, index: usize, tag: &Tag) {
        tag::post_tag(self.host.output_mut(index), tag);
    }

    /// Remove a tag from input `index`, so that it is not propagated.
    ///
    /// Returns `false` if the tag is not visible.
    pub fn remove_item_tag(&mut self, index: usize, tag: &Tag) -> bool {
        tag::remove_tag(self.host.input_mut(index), tag, self.rebase.delay)
    }

    /// Tags of input `index` with absolute offset in `[start, end)`.
    pub fn get_tags_in_range(
        &self,
        v: &mut Vec<Tag>,
        index: usize,
        start: u64,
        end: u64,
        key: Option<&Symbol>,
    ) {
        tag::tags_in_range(v, self.host.input(index), start, end, key, self.rebase);
    }

    /// Tags of input `index` in `[start, end)` relative to [`nitems_read`](StreamIo::nitems_read).
    pub fn get_tags_in_window(
        &self,
        v: &mut Vec<Tag>,
        index: usize,
        start: u64,
        end: u64,
        key: Option<&Symbol>,
    ) {
        let base = self.nitems_read(index);
        self.get_tags_in_range(v, index, base + start, base + end, key);
    }
}
