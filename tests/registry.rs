use anyhow::Result;
use blockbridge::runtime::Block;
use blockbridge::runtime::BlockRegistry;
use blockbridge::runtime::Error;
use blockbridge::runtime::InputPort;
use blockbridge::runtime::Lifecycle;
use blockbridge::runtime::OutputPort;
use blockbridge::runtime::Pmt;
use blockbridge::runtime::mocker::MockHost;
use blockbridge::runtime::registry::DOCS_PREFIX;
use blockbridge::runtime::registry::block_path;
use blockbridge::runtime::registry::docs_path;

#[test]
fn builtin_paths() {
    let r = BlockRegistry::with_builtin();
    let paths: Vec<&str> = r.paths().collect();
    assert_eq!(
        paths,
        vec![
            "/blocks/copy",
            "/blocks/delay",
            "/blocks/head",
            "/blocks/keep_one_in_n",
            "/blocks/moving_average",
            "/blocks/repeat",
            "/blocks/tag_debug",
            "/blocks/vector_source",
        ]
    );
    for p in paths {
        assert!(r.description(p).is_some(), "{p} has no description");
    }
}

#[test]
fn paths_follow_namespace() {
    assert_eq!(block_path("gr::blocks", "copy"), "/gr/blocks/copy");
    assert_eq!(block_path("", "copy"), "/copy");
    assert_eq!(docs_path("/gr/blocks/copy"), format!("{DOCS_PREFIX}/gr/blocks/copy"));
}

#[test]
fn make_and_run() -> Result<()> {
    let r = BlockRegistry::with_builtin();
    let mut block = r.make("/blocks/keep_one_in_n", &[Pmt::symbol("i16"), Pmt::U64(4)])?;
    assert_eq!(block.lifecycle(), Lifecycle::Constructed);
    assert_eq!(block.meta().relative_rate(), 0.25);

    let mut host = MockHost::new();
    block.initialize(&mut host)?;
    assert_eq!(host.inputs.len(), 1);
    assert_eq!(host.outputs.len(), 1);
    assert_eq!(host.inputs[0].dtype().size(), 2);
    Ok(())
}

#[test]
fn vector_source_type_follows_items() -> Result<()> {
    let r = BlockRegistry::with_builtin();
    let mut block = r.make(
        "/blocks/vector_source",
        &[Pmt::VecU64(vec![1, 2, 3]), Pmt::Bool(true)],
    )?;
    let mut host = MockHost::new();
    block.initialize(&mut host)?;
    assert!(host.inputs.is_empty());
    assert_eq!(host.outputs[0].dtype().size(), 8);
    Ok(())
}

#[test]
fn bad_arguments() {
    let r = BlockRegistry::with_builtin();
    assert_eq!(
        r.make("/blocks/nope", &[]).err(),
        Some(Error::UnknownBlock("/blocks/nope".to_string()))
    );
    for args in [
        vec![],
        vec![Pmt::symbol("f64")],
        vec![Pmt::U64(1)],
    ] {
        assert!(matches!(
            r.make("/blocks/copy", &args),
            Err(Error::InvalidArguments(_))
        ));
    }
    assert!(matches!(
        r.make("/blocks/keep_one_in_n", &[Pmt::symbol("f32"), Pmt::U64(0)]),
        Err(Error::InvalidArguments(_))
    ));
    assert!(matches!(
        r.make("/blocks/moving_average", &[Pmt::symbol("u8"), Pmt::U64(4)]),
        Err(Error::InvalidArguments(_))
    ));
}

#[test]
fn duplicate_registration() {
    let mut r = BlockRegistry::with_builtin();
    assert_eq!(
        blockbridge::blocks::register(&mut r),
        Err(Error::DuplicateBlock("/blocks/copy".to_string()))
    );
}

#[test]
fn description_json() -> Result<()> {
    let r = BlockRegistry::with_builtin();
    let json = r.description_json("/blocks/delay").expect("delay is described");
    let v: serde_json::Value = serde_json::from_str(&json)?;
    assert_eq!(v["path"], "/blocks/delay");
    assert_eq!(v["name"], "Delay");
    assert_eq!(v["args"][1]["name"], "delay");
    Ok(())
}
