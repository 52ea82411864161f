use crate::runtime::IoSignature;
use crate::runtime::OffsetRebase;
use crate::runtime::TagPropagationPolicy;

/// Settings of a legacy block.
#[derive(Debug, Clone)]
pub struct BlockMeta {
    type_name: String,
    instance_name: Option<String>,
    input_signature: IoSignature,
    output_signature: IoSignature,
    history: usize,
    relative_rate: f64,
    attr_delay: u64,
    tag_propagation_policy: TagPropagationPolicy,
}

impl BlockMeta {
    /// Legacy class name
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Name given to this instance, if any
    pub fn instance_name(&self) -> Option<&str> {
        self.instance_name.as_deref()
    }

    /// Name this instance.
    pub fn set_instance_name(&mut self, name: &str) {
        self.instance_name = Some(name.to_string());
    }

    /// Instance name, falling back to the type name.
    pub fn name(&self) -> &str {
        self.instance_name().unwrap_or(&self.type_name)
    }

    /// Input ports
    pub fn input_signature(&self) -> &IoSignature {
        &self.input_signature
    }

    /// Output ports
    pub fn output_signature(&self) -> &IoSignature {
        &self.output_signature
    }

    /// Number of items visible per input, including the current one.
    pub fn history(&self) -> usize {
        self.history
    }

    /// Set the history window. Values below one are raised to one.
    pub fn set_history(&mut self, history: usize) {
        self.history = history.max(1);
    }

    /// Output items per input item
    pub fn relative_rate(&self) -> f64 {
        self.relative_rate
    }

    /// Set output items per input item.
    ///
    /// # Panics
    ///
    /// Panics if `rate` is not positive.
    pub fn set_relative_rate(&mut self, rate: f64) {
        assert!(rate > 0.0, "relative rate must be positive, got {rate}");
        self.relative_rate = rate;
    }

    /// Tag offset correction in items
    pub fn attr_delay(&self) -> u64 {
        self.attr_delay
    }

    /// Set the tag offset correction.
    pub fn set_attr_delay(&mut self, delay: u64) {
        self.attr_delay = delay;
    }

    /// How tags move from inputs to outputs
    pub fn tag_propagation_policy(&self) -> TagPropagationPolicy {
        self.tag_propagation_policy
    }

    /// Set how tags move from inputs to outputs.
    pub fn set_tag_propagation_policy(&mut self, policy: TagPropagationPolicy) {
        self.tag_propagation_policy = policy;
    }

    /// Rebase used when reading tags: delay only.
    pub fn read_rebase(&self) -> OffsetRebase {
        OffsetRebase::delay(self.attr_delay)
    }

    /// Rebase used when forwarding tags: delay and rate.
    pub fn propagation_rebase(&self) -> OffsetRebase {
        OffsetRebase::new(self.attr_delay, self.relative_rate)
    }
}

/// Fluent constructor for [`BlockMeta`].
pub struct BlockMetaBuilder {
    meta: BlockMeta,
}

impl BlockMetaBuilder {
    /// Start with no ports, history 1, rate 1 and no delay.
    pub fn new(type_name: &str) -> BlockMetaBuilder {
        BlockMetaBuilder {
            meta: BlockMeta {
                type_name: type_name.to_string(),
                instance_name: None,
                input_signature: IoSignature::empty(),
                output_signature: IoSignature::empty(),
                history: 1,
                relative_rate: 1.0,
                attr_delay: 0,
                tag_propagation_policy: TagPropagationPolicy::default(),
            },
        }
    }

    /// Instance name
    pub fn instance_name(mut self, name: &str) -> BlockMetaBuilder {
        self.meta.set_instance_name(name);
        self
    }

    /// Input signature
    pub fn input(mut self, signature: IoSignature) -> BlockMetaBuilder {
        self.meta.input_signature = signature;
        self
    }

    /// Output signature
    pub fn output(mut self, signature: IoSignature) -> BlockMetaBuilder {
        self.meta.output_signature = signature;
        self
    }

    /// Values below one are raised to one.
    pub fn history(mut self, history: usize) -> BlockMetaBuilder {
        self.meta.set_history(history);
        self
    }

    /// # Panics
    ///
    /// Panics if `rate` is not positive.
    pub fn relative_rate(mut self, rate: f64) -> BlockMetaBuilder {
        self.meta.set_relative_rate(rate);
        self
    }

    /// Tag offset correction
    pub fn attr_delay(mut self, delay: u64) -> BlockMetaBuilder {
        self.meta.set_attr_delay(delay);
        self
    }

    /// Tag propagation policy
    pub fn tag_propagation_policy(mut self, policy: TagPropagationPolicy) -> BlockMetaBuilder {
        self.meta.set_tag_propagation_policy(policy);
        self
    }

    /// Finish the builder.
    pub fn build(self) -> BlockMeta {
        self.meta
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let m = BlockMetaBuilder::new("Copy").build();
        assert_eq!(m.name(), "Copy");
        assert_eq!(m.history(), 1);
        assert_eq!(m.relative_rate(), 1.0);
        assert_eq!(m.attr_delay(), 0);
        assert_eq!(m.tag_propagation_policy(), TagPropagationPolicy::Broadcast);
        assert_eq!(m.input_signature().max_streams(), Some(0));
    }

    #[test]
    fn history_is_at_least_one() {
        let m = BlockMetaBuilder::new("X").history(0).build();
        assert_eq!(m.history(), 1);
    }

    #[test]
    #[should_panic(expected = "positive")]
    fn zero_rate() {
        BlockMetaBuilder::new("X").relative_rate(0.0);
    }

    #[test]
    fn rebases() {
        let m = BlockMetaBuilder::new("X")
            .instance_name("x0")
            .relative_rate(0.25)
            .attr_delay(4)
            .build();
        assert_eq!(m.name(), "x0");
        assert_eq!(m.read_rebase(), OffsetRebase::new(4, 1.0));
        assert_eq!(m.propagation_rebase(), OffsetRebase::new(4, 0.25));
    }
}
