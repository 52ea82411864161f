//! Stream tags and host labels
//!
//! A [`Tag`] carries an absolute offset: the number of items on the port before the tagged one,
//! counted since the block was created. A host [`Label`] carries an index relative to the port's
//! [`total_elements`](crate::runtime::InputPort::total_elements) at the time it is read or
//! posted. Reading adds the block's attribute delay, so for every label read back
//! `tag.offset == label.index + total_elements + delay`, scaled by the relative rate where one
//! applies.
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::runtime::BlockHost;
use crate::runtime::InputPort;
use crate::runtime::Object;
use crate::runtime::OutputPort;
use crate::runtime::Pmt;
use crate::runtime::object_to_pmt;
use crate::runtime::pmt_to_object;

/// Interned tag key.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Symbol(Arc<str>);

impl Symbol {
    /// Create a symbol.
    pub fn new(s: &str) -> Symbol {
        Symbol(Arc::from(s))
    }

    /// Symbol name
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}", self.0)
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Symbol {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Symbol::new(s))
    }
}

impl From<&str> for Symbol {
    fn from(s: &str) -> Self {
        Symbol::new(s)
    }
}

impl From<String> for Symbol {
    fn from(s: String) -> Self {
        Symbol(Arc::from(s))
    }
}

impl PartialEq<str> for Symbol {
    fn eq(&self, other: &str) -> bool {
        &*self.0 == other
    }
}

/// Stream tag of the legacy block model.
#[derive(Debug, Clone, PartialEq)]
pub struct Tag {
    /// Absolute item offset
    pub offset: u64,
    /// Key
    pub key: Symbol,
    /// Value
    pub value: Pmt,
}

impl Tag {
    /// Create a tag.
    pub fn new(offset: u64, key: impl Into<Symbol>, value: impl Into<Pmt>) -> Tag {
        Tag {
            offset,
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Host label.
#[derive(Debug, Clone)]
pub struct Label {
    /// Label id, the tag key as string
    pub id: String,
    /// Payload
    pub data: Object,
    /// Item index relative to the port's running total
    pub index: i64,
}

impl Label {
    /// Create a label.
    pub fn new(id: impl Into<String>, data: Object, index: i64) -> Label {
        Label {
            id: id.into(),
            data,
            index,
        }
    }
}

/// Offset correction applied when labels cross the block.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OffsetRebase {
    /// Attribute delay of the block in items
    pub delay: u64,
    /// Output items per input item
    pub relative_rate: f64,
}

impl OffsetRebase {
    /// Create a rebase rule.
    pub fn new(delay: u64, relative_rate: f64) -> OffsetRebase {
        OffsetRebase {
            delay,
            relative_rate,
        }
    }

    /// Rebase that only adds the delay.
    pub fn delay(delay: u64) -> OffsetRebase {
        OffsetRebase::new(delay, 1.0)
    }

    fn scale(&self, position: i64) -> i64 {
        if self.relative_rate == 1.0 {
            position
        } else {
            // f64::round rounds half away from zero
            (position as f64 * self.relative_rate).round() as i64
        }
    }

    /// Shift a relative index by the delay and scale it to the output rate.
    pub fn shift(&self, index: i64) -> i64 {
        self.scale(index + self.delay as i64)
    }
}

impl Default for OffsetRebase {
    fn default() -> Self {
        OffsetRebase::new(0, 1.0)
    }
}

/// Absolute offset of a label read from a port with `total_elements` consumed items.
pub fn rebase_offset(index: i64, total_elements: u64, rebase: OffsetRebase) -> i64 {
    rebase.shift(index + total_elements as i64)
}

/// Convert a tag into a label for an output port that produced `total_elements` items.
///
/// # Panics
///
/// Panics if the tag points at an item that was already produced.
pub fn tag_to_label(tag: &Tag, total_elements: u64) -> Label {
    assert!(
        tag.offset >= total_elements,
        "tag {} at offset {} precedes the {} items already produced",
        tag.key,
        tag.offset,
        total_elements
    );
    Label {
        id: tag.key.to_string(),
        data: pmt_to_object(&tag.value),
        index: (tag.offset - total_elements) as i64,
    }
}

/// Convert a label read from an input port with `total_elements` consumed items into a tag.
///
/// Returns `None` if the rebased offset is negative.
pub fn label_to_tag(label: &Label, total_elements: u64, rebase: OffsetRebase) -> Option<Tag> {
    let offset = rebase_offset(label.index, total_elements, rebase);
    let offset = u64::try_from(offset).ok()?;
    Some(Tag {
        offset,
        key: Symbol::new(&label.id),
        value: object_to_pmt(&label.data),
    })
}

/// Post a tag to an output port.
pub fn post_tag(port: &mut dyn OutputPort, tag: &Tag) {
    let label = tag_to_label(tag, port.total_elements());
    port.post_label(label);
}

/// Remove the label a tag was read from.
///
/// Matches on key and on the offset without rate scaling. Returns `false` if no such label is
/// visible anymore.
pub fn remove_tag(port: &mut dyn InputPort, tag: &Tag, delay: u64) -> bool {
    let total = port.total_elements() as i64;
    let target = tag.offset as i64 - delay as i64;
    let found = port
        .labels()
        .iter()
        .find(|l| l.index + total == target && tag.key == *l.id.as_str())
        .cloned();
    match found {
        Some(label) => {
            port.remove_label(&label);
            true
        }
        None => false,
    }
}

/// Collect the tags of an input port with rebased offset in `[start, end)`.
///
/// `v` is cleared first. Without a `key`, all tags match. Tags keep the order of the port's
/// labels.
pub fn tags_in_range(
    v: &mut Vec<Tag>,
    port: &dyn InputPort,
    start: u64,
    end: u64,
    key: Option<&Symbol>,
    rebase: OffsetRebase,
) {
    v.clear();
    let total = port.total_elements();
    for label in port.labels() {
        let offset = rebase_offset(label.index, total, rebase);
        if offset < 0 || (offset as u64) < start || (offset as u64) >= end {
            continue;
        }
        if let Some(k) = key {
            if *k != *label.id.as_str() {
                continue;
            }
        }
        v.push(Tag {
            offset: offset as u64,
            key: Symbol::new(&label.id),
            value: object_to_pmt(&label.data),
        });
    }
}

/// How labels consumed on an input are forwarded to the outputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TagPropagationPolicy {
    /// Never forward.
    Suppress,
    /// Forward from every input to every output.
    #[default]
    Broadcast,
    /// Forward from input `i` to output `i` only.
    OneToOne,
    /// The kernel forwards tags itself, the adapter does nothing.
    Custom,
}

impl TagPropagationPolicy {
    /// Map the legacy numeric selector.
    ///
    /// `0` suppress, `1` broadcast, `2` one-to-one, `3` custom. Unknown values forward nothing.
    pub fn from_raw(v: i32) -> TagPropagationPolicy {
        match v {
            0 => TagPropagationPolicy::Suppress,
            1 => TagPropagationPolicy::Broadcast,
            2 => TagPropagationPolicy::OneToOne,
            3 => TagPropagationPolicy::Custom,
            v => {
                debug!("unknown tag propagation policy {v}, not propagating");
                TagPropagationPolicy::Custom
            }
        }
    }

    /// Forward `labels`, consumed on input `input` during this work call, to the outputs.
    ///
    /// Indices are shifted by the delay and scaled by the rate of `rebase`. Returns the number of
    /// labels posted.
    pub fn propagate(
        &self,
        host: &mut dyn BlockHost,
        input: usize,
        labels: &[Label],
        rebase: OffsetRebase,
    ) -> usize {
        let shifted = || {
            labels.iter().map(move |l| Label {
                index: rebase.shift(l.index),
                ..l.clone()
            })
        };

        match self {
            TagPropagationPolicy::Suppress | TagPropagationPolicy::Custom => 0,
            TagPropagationPolicy::OneToOne => {
                if input >= host.num_outputs() {
                    return 0;
                }
                let port = host.output_mut(input);
                let mut n = 0;
                for label in shifted() {
                    port.post_label(label);
                    n += 1;
                }
                n
            }
            TagPropagationPolicy::Broadcast => {
                let mut n = 0;
                for label in shifted() {
                    for o in 0..host.num_outputs() {
                        host.output_mut(o).post_label(label.clone());
                        n += 1;
                    }
                }
                n
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::DType;
    use crate::runtime::mocker::MockHost;

    fn host(inputs: usize, outputs: usize) -> MockHost {
        let mut h = MockHost::new();
        for i in 0..inputs {
            h.setup_input(i, DType::from_item_size(4));
        }
        for o in 0..outputs {
            h.setup_output(o, DType::from_item_size(4));
        }
        h
    }

    #[test]
    fn tag_to_label_is_relative() {
        let tag = Tag::new(120, "burst", Pmt::Bool(true));
        let label = tag_to_label(&tag, 100);
        assert_eq!(label.id, "burst");
        assert_eq!(label.index, 20);
        assert_eq!(label.data.extract::<bool>(), Some(&true));
    }

    #[test]
    #[should_panic(expected = "precedes")]
    fn tag_in_the_past_panics() {
        tag_to_label(&Tag::new(99, "late", Pmt::Null), 100);
    }

    #[test]
    fn label_to_tag_rebases() {
        let label = Label::new("freq", Object::new(2.4e9f64), 5);
        let tag = label_to_tag(&label, 1000, OffsetRebase::delay(3)).unwrap();
        assert_eq!(tag.offset, 1008);
        assert_eq!(tag.key, Symbol::new("freq"));
        assert_eq!(tag.value, Pmt::F64(2.4e9));

        let tag = label_to_tag(&label, 1000, OffsetRebase::new(3, 0.5)).unwrap();
        assert_eq!(tag.offset, 504);

        let label = Label::new("early", Object::null(), -10);
        assert!(label_to_tag(&label, 5, OffsetRebase::default()).is_none());
    }

    #[test]
    fn rate_rounds_half_away_from_zero() {
        let r = OffsetRebase::new(0, 0.5);
        assert_eq!(r.shift(5), 3);
        assert_eq!(r.shift(-5), -3);
        assert_eq!(r.shift(4), 2);
    }

    #[test]
    fn range_query_filters_offset_and_key() {
        let mut h = host(1, 0);
        h.inputs[0].push_items(&[0u32; 20]);
        h.inputs[0].consume(10);
        h.commit();
        h.inputs[0].push_label(Label::new("a", Object::new(1u64), 0));
        h.inputs[0].push_label(Label::new("b", Object::new(2u64), 4));
        h.inputs[0].push_label(Label::new("a", Object::new(3u64), 9));

        let mut v = vec![Tag::new(0, "stale", Pmt::Null)];
        tags_in_range(&mut v, h.input(0), 10, 19, None, OffsetRebase::default());
        assert_eq!(
            v.iter().map(|t| t.offset).collect::<Vec<_>>(),
            vec![10, 14]
        );

        let key = Symbol::new("a");
        tags_in_range(&mut v, h.input(0), 0, 100, Some(&key), OffsetRebase::delay(1));
        assert_eq!(
            v.iter().map(|t| (t.offset, t.value.clone())).collect::<Vec<_>>(),
            vec![(11, Pmt::U64(1)), (20, Pmt::U64(3))]
        );
    }

    #[test]
    fn remove_matches_offset_and_key() {
        let mut h = host(1, 0);
        h.inputs[0].push_label(Label::new("a", Object::null(), 2));
        h.inputs[0].push_label(Label::new("b", Object::null(), 2));

        // wrong key at the right offset
        assert!(!remove_tag(h.input_mut(0), &Tag::new(4, "c", Pmt::Null), 2));
        assert_eq!(h.input(0).labels().len(), 2);

        assert!(remove_tag(h.input_mut(0), &Tag::new(4, "b", Pmt::Null), 2));
        assert_eq!(h.input(0).labels().len(), 1);
        assert_eq!(h.input(0).labels()[0].id, "a");

        // already gone
        assert!(!remove_tag(h.input_mut(0), &Tag::new(4, "b", Pmt::Null), 2));
    }

    #[test]
    fn one_to_one_only_reaches_matching_output() {
        let mut h = host(2, 2);
        let labels = vec![Label::new("x", Object::null(), 100)];
        let n = TagPropagationPolicy::OneToOne.propagate(&mut h, 1, &labels, OffsetRebase::delay(2));
        assert_eq!(n, 1);
        assert!(h.outputs[0].posted().is_empty());
        assert_eq!(h.outputs[1].posted()[0].index, 102);

        // no matching output
        let mut h = host(2, 1);
        assert_eq!(
            TagPropagationPolicy::OneToOne.propagate(&mut h, 1, &labels, OffsetRebase::default()),
            0
        );
    }

    #[test]
    fn broadcast_reaches_all_outputs() {
        let mut h = host(1, 3);
        let labels = vec![
            Label::new("x", Object::null(), 10),
            Label::new("y", Object::null(), 11),
        ];
        let n =
            TagPropagationPolicy::Broadcast.propagate(&mut h, 0, &labels, OffsetRebase::new(0, 2.0));
        assert_eq!(n, 6);
        for o in 0..3 {
            let idx: Vec<i64> = h.outputs[o].posted().iter().map(|l| l.index).collect();
            assert_eq!(idx, vec![20, 22]);
        }
    }

    #[test]
    fn suppress_and_unknown_policies_do_nothing() {
        let mut h = host(1, 1);
        let labels = vec![Label::new("x", Object::null(), 0)];
        for p in [
            TagPropagationPolicy::Suppress,
            TagPropagationPolicy::Custom,
            TagPropagationPolicy::from_raw(42),
        ] {
            assert_eq!(p.propagate(&mut h, 0, &labels, OffsetRebase::default()), 0);
        }
        assert!(h.outputs[0].posted().is_empty());
    }

    #[test]
    fn raw_policy_values() {
        assert_eq!(TagPropagationPolicy::from_raw(0), TagPropagationPolicy::Suppress);
        assert_eq!(TagPropagationPolicy::from_raw(1), TagPropagationPolicy::Broadcast);
        assert_eq!(TagPropagationPolicy::from_raw(2), TagPropagationPolicy::OneToOne);
        assert_eq!(TagPropagationPolicy::from_raw(-1), TagPropagationPolicy::Custom);
    }
}
