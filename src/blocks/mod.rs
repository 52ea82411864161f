//! ## Stream blocks
//! | Block | Usage | Base |
//! |---|---|---|
//! | [Copy] | Copy input samples to the output | sync |
//! | [Delay] | Delay or skip samples, moving tags along | general |
//! | [Head] | Stop after a given number of samples | sync |
//! | [KeepOneInN] | Keep the last of every `n` samples | decimator |
//! | [MovingAverage] | Scaled sum over a sliding window | sync, history |
//! | [Repeat] | Repeat every sample `n` times | interpolator |
//!
//! ## Source/sink blocks
//! | Block | Usage | Base |
//! |---|---|---|
//! | [VectorSource] | Stream samples and tags from a vector | general |
//! | [TagDebug] | Drop samples, collecting tags | sync |
//!
//! All blocks are registered under `/blocks/...` by [`BlockRegistry::with_builtin`]. The first
//! factory argument selects the item type: `f32`, `c32`, `u8`, `i16`, or `u32`.
use anyhow::anyhow;
use anyhow::bail;
use num_complex::Complex32;

use crate::runtime::ArgDescription;
use crate::runtime::Block;
use crate::runtime::BlockDescription;
use crate::runtime::Error;
use crate::runtime::Kernel;
use crate::runtime::Pmt;
use crate::runtime::Result;
use crate::runtime::WrappedKernel;
use crate::runtime::registry::BlockRegistry;
use crate::runtime::registry::block_path;

mod copy;
pub use copy::Copy;

mod delay;
pub use delay::Delay;

mod head;
pub use head::Head;

mod keep_one_in_n;
pub use keep_one_in_n::KeepOneInN;

mod moving_average;
pub use moving_average::MovingAverage;

mod repeat;
pub use repeat::Repeat;

mod tag_debug;
pub use tag_debug::TagDebug;

mod vector_source;
pub use vector_source::VectorSource;

/// Namespace of the builtin blocks
pub const NAMESPACE: &str = "blocks";

// Expand `$body` with `$t` bound to the item type named by `$kind`.
macro_rules! with_item_type {
    ($kind:expr, |$t:ident| $body:expr) => {
        match $kind {
            "f32" => {
                type $t = f32;
                $body
            }
            "c32" => {
                type $t = Complex32;
                $body
            }
            "u8" => {
                type $t = u8;
                $body
            }
            "i16" => {
                type $t = i16;
                $body
            }
            "u32" => {
                type $t = u32;
                $body
            }
            k => bail!("unsupported item type {k}"),
        }
    };
}

fn boxed<K: Kernel + 'static>(block: WrappedKernel<K>) -> Result<Box<dyn Block>> {
    Ok(Box::new(block))
}

fn arg<'a>(args: &'a [Pmt], index: usize, name: &str) -> Result<&'a Pmt> {
    args.get(index)
        .ok_or_else(|| anyhow!("missing argument {index} ({name})"))
}

fn item_type(args: &[Pmt]) -> Result<&str> {
    arg(args, 0, "type")?
        .as_symbol()
        .ok_or_else(|| anyhow!("item type must be a symbol"))
}

fn usize_arg(args: &[Pmt], index: usize, name: &str) -> Result<usize> {
    usize::try_from(arg(args, index, name)?).map_err(|_| anyhow!("{name} must be unsigned"))
}

fn describe(
    class: &str,
    name: &str,
    args: &[(&str, &str, Option<&str>)],
    docs: &[&str],
) -> BlockDescription {
    BlockDescription {
        path: block_path(NAMESPACE, class),
        name: name.to_string(),
        keywords: vec![class.to_string(), NAMESPACE.to_string()],
        categories: vec!["Stream".to_string()],
        args: args
            .iter()
            .map(|(name, kind, default)| ArgDescription {
                name: name.to_string(),
                kind: kind.to_string(),
                default: default.map(str::to_string),
            })
            .collect(),
        docs: docs.iter().map(|d| d.to_string()).collect(),
    }
    .normalized()
}

const TYPE_ARG: (&str, &str, Option<&str>) = ("type", "Symbol", Some("f32"));

/// Register the blocks of this module.
pub fn register(r: &mut BlockRegistry) -> Result<(), Error> {
    r.register(&block_path(NAMESPACE, "copy"), |args| {
        with_item_type!(item_type(args)?, |T| boxed(Copy::<T>::new()))
    })?;
    r.register_description(describe(
        "copy",
        "Copy",
        &[TYPE_ARG],
        &["Copy input samples to the output."],
    ))?;

    r.register(&block_path(NAMESPACE, "head"), |args| {
        let n = usize_arg(args, 1, "n_items")? as u64;
        with_item_type!(item_type(args)?, |T| boxed(Head::<T>::new(n)))
    })?;
    r.register_description(describe(
        "head",
        "Head",
        &[TYPE_ARG, ("n_items", "U64", None)],
        &["Copies only a given number of samples and stops."],
    ))?;

    r.register(&block_path(NAMESPACE, "keep_one_in_n"), |args| {
        let n = usize_arg(args, 1, "n")?;
        if n == 0 {
            bail!("n must be positive");
        }
        with_item_type!(item_type(args)?, |T| boxed(KeepOneInN::<T>::new(n)))
    })?;
    r.register_description(describe(
        "keep_one_in_n",
        "Keep One in N",
        &[TYPE_ARG, ("n", "U64", None)],
        &["Keep the last sample of every n."],
    ))?;

    r.register(&block_path(NAMESPACE, "repeat"), |args| {
        let n = usize_arg(args, 1, "interpolation")?;
        if n == 0 {
            bail!("interpolation must be positive");
        }
        with_item_type!(item_type(args)?, |T| boxed(Repeat::<T>::new(n)))
    })?;
    r.register_description(describe(
        "repeat",
        "Repeat",
        &[TYPE_ARG, ("interpolation", "U64", None)],
        &["Repeat every input sample interpolation times."],
    ))?;

    r.register(&block_path(NAMESPACE, "moving_average"), |args| {
        let length = usize_arg(args, 1, "length")?;
        if length == 0 {
            bail!("length must be positive");
        }
        let scale = match args.get(2) {
            Some(p) => f64::try_from(p)? as f32,
            None => 1.0,
        };
        match item_type(args)? {
            "f32" => boxed(MovingAverage::<f32>::new(length, scale)),
            "c32" => boxed(MovingAverage::<Complex32>::new(length, scale)),
            k => bail!("unsupported item type {k}"),
        }
    })?;
    r.register_description(describe(
        "moving_average",
        "Moving Average",
        &[
            TYPE_ARG,
            ("length", "U64", None),
            ("scale", "F64", Some("1.0")),
        ],
        &[
            "Scaled sum over a sliding window of length samples.",
            "Supports f32 and c32 items.",
        ],
    ))?;

    r.register(&block_path(NAMESPACE, "delay"), |args| {
        let n = i64::try_from(arg(args, 1, "delay")?)? as isize;
        with_item_type!(item_type(args)?, |T| boxed(Delay::<T>::new(n)))
    })?;
    r.register_description(describe(
        "delay",
        "Delay",
        &[TYPE_ARG, ("delay", "I64", None)],
        &[
            "Delays samples.",
            "Negative values drop samples from the start of the stream.",
        ],
    ))?;

    r.register(&block_path(NAMESPACE, "vector_source"), |args| {
        let repeat = match args.get(1) {
            Some(p) => bool::try_from(p)?,
            None => false,
        };
        match arg(args, 0, "items")? {
            Pmt::VecF32(v) => boxed(VectorSource::new(v.clone(), Vec::new(), repeat)),
            Pmt::VecCF32(v) => boxed(VectorSource::new(v.clone(), Vec::new(), repeat)),
            Pmt::VecU64(v) => boxed(VectorSource::new(v.clone(), Vec::new(), repeat)),
            Pmt::Blob(v) => boxed(VectorSource::new(v.clone(), Vec::new(), repeat)),
            p => bail!("cannot stream items of kind {}", p.kind()),
        }
    })?;
    r.register_description(describe(
        "vector_source",
        "Vector Source",
        &[("items", "VecF32", None), ("repeat", "Bool", Some("false"))],
        &[
            "Stream samples from a vector.",
            "The item type follows the vector: VecF32, VecCF32, VecU64, or Blob.",
        ],
    ))?;

    r.register(&block_path(NAMESPACE, "tag_debug"), |args| {
        let name = match args.get(1) {
            Some(p) => p
                .as_symbol()
                .ok_or_else(|| anyhow!("name must be a symbol"))?
                .to_string(),
            None => "TagDebug".to_string(),
        };
        let key = match args.get(2) {
            Some(p) => Some(
                p.as_symbol()
                    .ok_or_else(|| anyhow!("key must be a symbol"))?
                    .to_string(),
            ),
            None => None,
        };
        with_item_type!(item_type(args)?, |T| boxed(TagDebug::<T>::new(
            name.clone(),
            key.as_deref()
        )))
    })?;
    r.register_description(describe(
        "tag_debug",
        "Tag Debug",
        &[
            TYPE_ARG,
            ("name", "Symbol", Some("TagDebug")),
            ("key", "Symbol", None),
        ],
        &["Drop samples, collecting tags."],
    ))?;

    Ok(())
}
