use crate::runtime::BlockHost;
use crate::runtime::BlockMeta;
use crate::runtime::Error;
use crate::runtime::Kernel;
use crate::runtime::StreamIo;
use crate::runtime::WORK_DONE;
use crate::runtime::forecast;

/// Result of one work stimulus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkOutcome {
    /// The host offered no buffer space, nothing was attempted.
    Idle,
    /// Not enough input for a single output item.
    Deferred,
    /// `general_work` was called.
    Called {
        /// Output items requested from the kernel
        noutput_items: usize,
        /// Kernel return value
        ret: isize,
    },
    /// The kernel returned [`WORK_DONE`].
    Done,
}

/// Per-activation work state.
///
/// Created on activation, dropped on deactivation.
#[derive(Debug, Default)]
pub struct Executor {
    ninput_items: Vec<usize>,
    ninput_items_required: Vec<usize>,
    iterations: u64,
    items_produced: u64,
}

impl Executor {
    /// Create executor state for `num_inputs` inputs.
    pub fn new(num_inputs: usize) -> Executor {
        Executor {
            ninput_items: vec![0; num_inputs],
            ninput_items_required: vec![0; num_inputs],
            iterations: 0,
            items_produced: 0,
        }
    }

    /// Number of `general_work` calls
    pub fn iterations(&self) -> u64 {
        self.iterations
    }

    /// Items produced per output through positive return values
    pub fn items_produced(&self) -> u64 {
        self.items_produced
    }

    /// Resolve the output count, call the kernel, and apply its return value.
    pub fn run_one_iteration<K: Kernel + ?Sized>(
        &mut self,
        kernel: &mut K,
        meta: &mut BlockMeta,
        host: &mut dyn BlockHost,
    ) -> Result<WorkOutcome, Error> {
        let num_inputs = host.num_inputs();
        let num_outputs = host.num_outputs();
        self.ninput_items.resize(num_inputs, 0);
        self.ninput_items_required.resize(num_inputs, 0);
        for (i, n) in self.ninput_items.iter_mut().enumerate() {
            *n = host.input(i).elements();
        }

        let info = host.work_info();
        let candidate = if num_outputs > 0 {
            info.min_out_elements
        } else {
            (info.max_in_elements as f64 * meta.relative_rate()).round() as usize
        };

        let noutput_items = {
            let meta = &*meta;
            let kernel = &*kernel;
            forecast::resolve(
                candidate,
                &self.ninput_items,
                &mut self.ninput_items_required,
                |n, required| kernel.forecast(n, required, meta),
            )
        };
        let Some(noutput_items) = noutput_items else {
            trace!(
                "{}: deferring, candidate {} available {:?}",
                meta.name(),
                candidate,
                self.ninput_items
            );
            return Ok(WorkOutcome::Deferred);
        };

        let ret = {
            let mut io = StreamIo::new(host, meta.read_rebase());
            kernel
                .general_work(noutput_items, &self.ninput_items, &mut io, meta)
                .map_err(|e| Error::KernelError(format!("{}: {e:#}", meta.name())))?
        };
        self.iterations += 1;

        if ret > 0 {
            for o in 0..num_outputs {
                host.output_mut(o).produce(ret as usize);
            }
            self.items_produced += ret as u64;
        } else if ret == WORK_DONE {
            debug!("{}: work done after {} items", meta.name(), self.items_produced);
            return Ok(WorkOutcome::Done);
        }

        Ok(WorkOutcome::Called { noutput_items, ret })
    }
}
