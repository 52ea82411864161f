use std::any::Any;
use std::fmt;

use crate::runtime::BlockHost;
use crate::runtime::BlockMeta;
use crate::runtime::BufferRequest;
use crate::runtime::DType;
use crate::runtime::Error;
use crate::runtime::Executor;
use crate::runtime::IoSignature;
use crate::runtime::Kernel;
use crate::runtime::Label;
use crate::runtime::Pmt;
use crate::runtime::WorkOutcome;
use crate::runtime::buffer;
use crate::runtime::config;

/// Host call adding input ports
pub const SET_NUM_INPUTS: &str = "setNumInputs";
/// Host call adding output ports
pub const SET_NUM_OUTPUTS: &str = "setNumOutputs";

/// Lifecycle of an adapted block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    /// Created, no ports yet
    Constructed,
    /// Ports set up
    Initialized,
    /// Executor alive, work may be called
    Activated,
    /// Executor released, may be activated again
    Deactivated,
}

/// Block interface, implemented for [`WrappedKernel`]s
pub trait Block: Send + Any {
    /// Cast block to [std::any::Any].
    fn as_any(&self) -> &dyn Any;
    /// Cast block to [std::any::Any] mutably.
    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// Block settings
    fn meta(&self) -> &BlockMeta;
    /// Block settings, mutably
    fn meta_mut(&mut self) -> &mut BlockMeta;
    /// Current lifecycle state
    fn lifecycle(&self) -> Lifecycle;
    /// Executor of the current activation
    fn executor(&self) -> Option<&Executor>;

    /// Register name, ports, and calls with the host.
    fn initialize(&mut self, host: &mut dyn BlockHost) -> Result<(), Error>;
    /// Handle a host call.
    fn call(&mut self, host: &mut dyn BlockHost, name: &str, args: &[Pmt]) -> Result<Pmt, Error>;
    /// Start the kernel and create a fresh executor.
    fn activate(&mut self) -> Result<(), Error>;
    /// Release the executor and stop the kernel.
    fn deactivate(&mut self) -> Result<(), Error>;
    /// Handle a work stimulus.
    fn work(&mut self, host: &mut dyn BlockHost) -> Result<WorkOutcome, Error>;
    /// Forward labels consumed on input `input` according to the propagation policy.
    fn propagate_labels(&mut self, host: &mut dyn BlockHost, input: usize, labels: &[Label]);
    /// Buffer manager for input `index`.
    fn input_buffer_manager(&self, host: &dyn BlockHost, index: usize) -> BufferRequest;
    /// Buffer manager for output `index`.
    fn output_buffer_manager(&self, host: &dyn BlockHost, index: usize) -> BufferRequest;
}

impl fmt::Debug for dyn Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Block")
            .field("type_name", &self.meta().type_name())
            .field("lifecycle", &self.lifecycle())
            .finish()
    }
}

/// Legacy kernel adapted to the host
pub struct WrappedKernel<K: Kernel> {
    /// Block metadata
    pub meta: BlockMeta,
    /// Kernel
    pub kernel: K,
    executor: Option<Executor>,
    lifecycle: Lifecycle,
}

impl<K: Kernel + 'static> WrappedKernel<K> {
    /// Wrap a kernel
    pub fn new(kernel: K, meta: BlockMeta) -> Self {
        WrappedKernel {
            meta,
            kernel,
            executor: None,
            lifecycle: Lifecycle::Constructed,
        }
    }

    fn invalid(&self, operation: &'static str) -> Error {
        Error::InvalidLifecycle {
            block: self.meta.type_name().to_string(),
            state: self.lifecycle,
            operation,
        }
    }

    fn setup_ports(
        host: &mut dyn BlockHost,
        signature: &IoSignature,
        mut setup: impl FnMut(&mut dyn BlockHost, usize, DType),
    ) {
        for (i, size) in signature.item_sizes().iter().enumerate() {
            if signature.max_streams().is_some_and(|max| i >= max) {
                break;
            }
            setup(&mut *host, i, DType::from_item_size(*size));
        }
    }

    fn num_ports_arg(name: &str, args: &[Pmt]) -> Result<usize, Error> {
        match args {
            [p] => usize::try_from(p).map_err(|_| Error::InvalidArguments(name.to_string())),
            _ => Err(Error::InvalidArguments(name.to_string())),
        }
    }

    fn set_num_inputs(host: &mut dyn BlockHost, num: usize) {
        for i in host.num_inputs()..num {
            assert!(i > 0, "{SET_NUM_INPUTS}: no input port to clone the type from");
            let dtype = host.input(i - 1).dtype().clone();
            host.setup_input(i, dtype);
        }
    }

    fn set_num_outputs(host: &mut dyn BlockHost, num: usize) {
        for i in host.num_outputs()..num {
            assert!(i > 0, "{SET_NUM_OUTPUTS}: no output port to clone the type from");
            let dtype = host.output(i - 1).dtype().clone();
            host.setup_output(i, dtype);
        }
    }
}

impl<K: Kernel + 'static> Block for WrappedKernel<K> {
    fn as_any(&self) -> &dyn Any {
        self
    }
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn meta(&self) -> &BlockMeta {
        &self.meta
    }
    fn meta_mut(&mut self) -> &mut BlockMeta {
        &mut self.meta
    }
    fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }
    fn executor(&self) -> Option<&Executor> {
        self.executor.as_ref()
    }

    fn initialize(&mut self, host: &mut dyn BlockHost) -> Result<(), Error> {
        if self.lifecycle != Lifecycle::Constructed {
            return Err(self.invalid("initialize"));
        }

        host.set_name(self.meta.name());
        Self::setup_ports(host, self.meta.input_signature(), |h, i, t| {
            h.setup_input(i, t)
        });
        Self::setup_ports(host, self.meta.output_signature(), |h, i, t| {
            h.setup_output(i, t)
        });
        host.register_call(SET_NUM_INPUTS);
        host.register_call(SET_NUM_OUTPUTS);

        debug!(
            "{}: initialized with {} inputs, {} outputs",
            self.meta.name(),
            host.num_inputs(),
            host.num_outputs()
        );
        self.lifecycle = Lifecycle::Initialized;
        Ok(())
    }

    fn call(&mut self, host: &mut dyn BlockHost, name: &str, args: &[Pmt]) -> Result<Pmt, Error> {
        match name {
            SET_NUM_INPUTS => {
                let num = Self::num_ports_arg(name, args)?;
                Self::set_num_inputs(host, num);
                Ok(Pmt::Null)
            }
            SET_NUM_OUTPUTS => {
                let num = Self::num_ports_arg(name, args)?;
                Self::set_num_outputs(host, num);
                Ok(Pmt::Null)
            }
            _ => Err(Error::InvalidHandler(name.to_string())),
        }
    }

    fn activate(&mut self) -> Result<(), Error> {
        match self.lifecycle {
            Lifecycle::Initialized | Lifecycle::Deactivated => {}
            _ => return Err(self.invalid("activate")),
        }

        self.kernel
            .start(&mut self.meta)
            .map_err(|e| Error::KernelError(format!("{}: start: {e:#}", self.meta.name())))?;
        let num_inputs = self.meta.input_signature().item_sizes().len();
        self.executor = Some(Executor::new(num_inputs));
        self.lifecycle = Lifecycle::Activated;
        debug!("{}: activated", self.meta.name());
        Ok(())
    }

    fn deactivate(&mut self) -> Result<(), Error> {
        if self.lifecycle != Lifecycle::Activated {
            return Err(self.invalid("deactivate"));
        }

        if let Some(e) = self.executor.take() {
            debug!(
                "{}: deactivated after {} work calls",
                self.meta.name(),
                e.iterations()
            );
        }
        self.lifecycle = Lifecycle::Deactivated;
        self.kernel
            .stop(&mut self.meta)
            .map_err(|e| Error::KernelError(format!("{}: stop: {e:#}", self.meta.name())))
    }

    fn work(&mut self, host: &mut dyn BlockHost) -> Result<WorkOutcome, Error> {
        let WrappedKernel {
            meta,
            kernel,
            executor,
            ..
        } = self;
        let executor = executor
            .as_mut()
            .ok_or_else(|| Error::NotActivated(meta.name().to_string()))?;

        if host.work_info().min_elements == 0 {
            return Ok(WorkOutcome::Idle);
        }

        let reserve = meta.history() + 1;
        for i in 0..host.num_inputs() {
            host.input_mut(i).set_reserve(reserve);
        }

        executor.run_one_iteration(kernel, meta, host)
    }

    fn propagate_labels(&mut self, host: &mut dyn BlockHost, input: usize, labels: &[Label]) {
        if labels.is_empty() {
            return;
        }
        let n = self.meta.tag_propagation_policy().propagate(
            host,
            input,
            labels,
            self.meta.propagation_rebase(),
        );
        trace!("{}: propagated {} labels from input {}", self.meta.name(), n, input);
    }

    fn input_buffer_manager(&self, host: &dyn BlockHost, index: usize) -> BufferRequest {
        buffer::history_buffer_request(
            self.meta.history(),
            host.input(index).dtype().size(),
            &host.default_buffer_args(),
            config::config().history_factor,
        )
    }

    fn output_buffer_manager(&self, _host: &dyn BlockHost, _index: usize) -> BufferRequest {
        BufferRequest::HostDefault
    }
}
