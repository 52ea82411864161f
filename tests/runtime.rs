use anyhow::Result;
use blockbridge::blocks::Copy;
use blockbridge::blocks::MovingAverage;
use blockbridge::runtime::Block;
use blockbridge::runtime::BlockMeta;
use blockbridge::runtime::BlockMetaBuilder;
use blockbridge::runtime::BufferManagerArgs;
use blockbridge::runtime::BufferRequest;
use blockbridge::runtime::Error;
use blockbridge::runtime::InputPort;
use blockbridge::runtime::IoSignature;
use blockbridge::runtime::Kernel;
use blockbridge::runtime::Lifecycle;
use blockbridge::runtime::Mocker;
use blockbridge::runtime::Pmt;
use blockbridge::runtime::SET_NUM_INPUTS;
use blockbridge::runtime::SET_NUM_OUTPUTS;
use blockbridge::runtime::StreamIo;
use blockbridge::runtime::Tag;
use blockbridge::runtime::TagPropagationPolicy;
use blockbridge::runtime::WorkOutcome;
use blockbridge::runtime::WrappedKernel;
use blockbridge::runtime::buffer::CIRCULAR;
use blockbridge::runtime::config;
use blockbridge::runtime::mocker::MockHost;

/// Copies input 0 to all outputs.
struct Fanout;

impl Fanout {
    fn block(outputs: usize, delay: u64, policy: TagPropagationPolicy) -> WrappedKernel<Fanout> {
        WrappedKernel::new(
            Fanout,
            BlockMetaBuilder::new("Fanout")
                .input(IoSignature::make(1, Some(1), 4))
                .output(IoSignature::makev(1, Some(outputs), vec![4; outputs]))
                .attr_delay(delay)
                .tag_propagation_policy(policy)
                .build(),
        )
    }
}

impl Kernel for Fanout {
    fn general_work(
        &mut self,
        noutput_items: usize,
        ninput_items: &[usize],
        io: &mut StreamIo,
        _meta: &mut BlockMeta,
    ) -> Result<isize> {
        let n = noutput_items.min(ninput_items[0]);
        let (i, mut outputs) = io.split::<u32, u32>();
        for o in outputs.iter_mut() {
            o[..n].copy_from_slice(&i[0][..n]);
        }
        io.consume(0, n as isize);
        Ok(n as isize)
    }
}

/// Returns a bogus negative count.
struct Bogus;

impl Kernel for Bogus {
    fn general_work(
        &mut self,
        _noutput_items: usize,
        _ninput_items: &[usize],
        io: &mut StreamIo,
        _meta: &mut BlockMeta,
    ) -> Result<isize> {
        io.consume(0, -5);
        io.produce(0, -5);
        Ok(-5)
    }
}

fn bogus() -> WrappedKernel<Bogus> {
    WrappedKernel::new(
        Bogus,
        BlockMetaBuilder::new("Bogus")
            .input(IoSignature::make(1, Some(1), 4))
            .output(IoSignature::make(1, Some(1), 4))
            .build(),
    )
}

/// Reads its 4-byte input as 8-byte items.
struct WrongType;

impl Kernel for WrongType {
    fn general_work(
        &mut self,
        _noutput_items: usize,
        _ninput_items: &[usize],
        io: &mut StreamIo,
        _meta: &mut BlockMeta,
    ) -> Result<isize> {
        Ok(io.input::<u64>(0).len() as isize)
    }
}

/// Fails every work call.
struct Failing;

impl Kernel for Failing {
    fn general_work(
        &mut self,
        _noutput_items: usize,
        _ninput_items: &[usize],
        _io: &mut StreamIo,
        _meta: &mut BlockMeta,
    ) -> Result<isize> {
        anyhow::bail!("broken")
    }
}

#[test]
fn lifecycle() {
    let mut mocker = Mocker::new(Copy::<f32>::new());
    assert_eq!(mocker.block().lifecycle(), Lifecycle::Initialized);
    assert!(mocker.block().executor().is_none());
    assert_eq!(mocker.host().name(), "Copy");
    assert_eq!(mocker.host().calls(), &[SET_NUM_INPUTS, SET_NUM_OUTPUTS]);

    assert!(matches!(mocker.step(), Err(Error::NotActivated(_))));

    mocker.init();
    assert_eq!(mocker.block().lifecycle(), Lifecycle::Activated);
    mocker.input(0, vec![1.0f32; 8]);
    mocker.init_output::<f32>(0, 8);
    mocker.run();
    assert_eq!(mocker.block().executor().map(|e| e.iterations()), Some(1));
    assert_eq!(mocker.block().executor().map(|e| e.items_produced()), Some(8));

    assert!(matches!(
        mocker.block_mut().activate(),
        Err(Error::InvalidLifecycle { .. })
    ));

    mocker.deinit();
    assert_eq!(mocker.block().lifecycle(), Lifecycle::Deactivated);
    assert!(mocker.block().executor().is_none());
    assert!(matches!(
        mocker.block_mut().deactivate(),
        Err(Error::InvalidLifecycle { .. })
    ));

    // reactivation starts with a fresh executor
    mocker.init();
    assert_eq!(mocker.block().executor().map(|e| e.iterations()), Some(0));
}

#[test]
fn initialize_twice_fails() {
    let mut mocker = Mocker::new(Copy::<u8>::new());
    let mut host = MockHost::new();
    assert!(matches!(
        mocker.block_mut().initialize(&mut host),
        Err(Error::InvalidLifecycle {
            state: Lifecycle::Initialized,
            ..
        })
    ));
}

#[test]
fn idle_without_items() {
    let mut mocker = Mocker::new(Copy::<f32>::new());
    mocker.init();
    mocker.init_output::<f32>(0, 8);
    assert_eq!(mocker.step().ok(), Some(WorkOutcome::Idle));

    mocker.input(0, vec![1.0f32]);
    mocker.init_output::<f32>(0, 0);
    assert_eq!(mocker.step().ok(), Some(WorkOutcome::Idle));
}

#[test]
fn negative_counts_are_ignored() {
    let mut mocker = Mocker::new(bogus());
    mocker.init();
    mocker.input(0, vec![1u32, 2, 3]);
    mocker.init_output::<u32>(0, 8);

    let outcome = mocker.step().ok();
    assert_eq!(
        outcome,
        Some(WorkOutcome::Called {
            noutput_items: 3,
            ret: -5
        })
    );
    assert!(mocker.output::<u32>(0).0.is_empty());
    assert_eq!(mocker.host().inputs[0].total_elements(), 0);
}

#[test]
fn kernel_errors_surface() {
    let mut mocker = Mocker::new(WrappedKernel::new(
        Failing,
        BlockMetaBuilder::new("Failing")
            .input(IoSignature::make(1, Some(1), 4))
            .output(IoSignature::make(1, Some(1), 4))
            .build(),
    ));
    mocker.init();
    mocker.input(0, vec![1u32, 2, 3]);
    mocker.init_output::<u32>(0, 8);

    match mocker.try_run() {
        Err(Error::KernelError(s)) => assert!(s.contains("broken")),
        o => panic!("unexpected outcome {o:?}"),
    }
}

#[test]
#[should_panic(expected = "does not match port type")]
fn wrong_item_type_panics() {
    let mut mocker = Mocker::new(WrappedKernel::new(
        WrongType,
        BlockMetaBuilder::new("WrongType")
            .input(IoSignature::make(1, Some(1), 4))
            .output(IoSignature::make(1, Some(1), 4))
            .build(),
    ));
    mocker.init();
    mocker.input(0, vec![1u32, 2, 3]);
    mocker.init_output::<u32>(0, 8);
    mocker.run();
}

#[test]
fn broadcast_with_delay() {
    let mut mocker = Mocker::new(Fanout::block(2, 2, TagPropagationPolicy::Broadcast));
    mocker.init();
    mocker.init_output::<u32>(0, 256);
    mocker.init_output::<u32>(1, 256);
    mocker.input_with_tags(
        0,
        vec![0u32; 128],
        vec![Tag::new(100, "burst", Pmt::U64(100))],
    );
    mocker.run();

    for o in 0..2 {
        let (items, tags) = mocker.output::<u32>(o);
        assert_eq!(items.len(), 128);
        assert_eq!(tags, vec![Tag::new(102, "burst", Pmt::U64(100))]);
    }
}

#[test]
fn one_to_one_with_delay() {
    let mut mocker = Mocker::new(Fanout::block(2, 2, TagPropagationPolicy::OneToOne));
    mocker.init();
    mocker.init_output::<u32>(0, 256);
    mocker.init_output::<u32>(1, 256);
    mocker.input_with_tags(
        0,
        vec![0u32; 128],
        vec![Tag::new(100, "burst", Pmt::Null)],
    );
    mocker.run();

    assert_eq!(
        mocker.output::<u32>(0).1,
        vec![Tag::new(102, "burst", Pmt::Null)]
    );
    assert!(mocker.output::<u32>(1).1.is_empty());
}

#[test]
fn suppress_and_custom_drop_tags() {
    for policy in [TagPropagationPolicy::Suppress, TagPropagationPolicy::Custom] {
        let mut mocker = Mocker::new(Fanout::block(1, 0, policy));
        mocker.init();
        mocker.init_output::<u32>(0, 16);
        mocker.input_with_tags(0, vec![0u32; 8], vec![Tag::new(3, "x", Pmt::Null)]);
        mocker.run();

        let (items, tags) = mocker.output::<u32>(0);
        assert_eq!(items.len(), 8);
        assert!(tags.is_empty());
    }
}

#[test]
fn unknown_policy_propagates_nothing() {
    assert_eq!(
        TagPropagationPolicy::from_raw(42),
        TagPropagationPolicy::Custom
    );
    assert_eq!(
        TagPropagationPolicy::from_raw(2),
        TagPropagationPolicy::OneToOne
    );
}

#[test]
fn port_count_calls() -> Result<()> {
    let mut mocker = Mocker::new(Copy::<u8>::new());
    mocker.call(SET_NUM_INPUTS, &[Pmt::U64(3)])?;
    mocker.call(SET_NUM_OUTPUTS, &[Pmt::U64(2)])?;
    assert_eq!(mocker.host().inputs.len(), 3);
    assert_eq!(mocker.host().outputs.len(), 2);

    // shrinking is not supported, the call does nothing
    mocker.call(SET_NUM_INPUTS, &[Pmt::U64(1)])?;
    assert_eq!(mocker.host().inputs.len(), 3);

    assert_eq!(
        mocker.call(SET_NUM_INPUTS, &[Pmt::symbol("two")]),
        Err(Error::InvalidArguments(SET_NUM_INPUTS.to_string()))
    );
    assert_eq!(
        mocker.call("setFoo", &[]),
        Err(Error::InvalidHandler("setFoo".to_string()))
    );
    Ok(())
}

#[test]
fn history_gets_circular_input_buffer() {
    let mut mocker = Mocker::new(MovingAverage::<f32>::new(40, 1.0));
    mocker.host_mut().set_default_buffer_args(BufferManagerArgs {
        buffer_size: 1024,
        num_buffers: 2,
    });

    let block = mocker.block();
    let request = block.input_buffer_manager(mocker.host(), 0);
    assert_eq!(
        request,
        BufferRequest::Named {
            name: CIRCULAR.to_string(),
            args: BufferManagerArgs {
                buffer_size: 1024usize.max(41 * 4 * config::config().history_factor),
                num_buffers: 2,
            },
        }
    );
    assert!(block.output_buffer_manager(mocker.host(), 0).is_host_default());

    let copy = Mocker::new(Copy::<f32>::new());
    assert!(
        copy.block()
            .input_buffer_manager(copy.host(), 0)
            .is_host_default()
    );
}
