//! Buffer manager selection
//!
//! The host allocates buffers before the first work call. Blocks with a history window read
//! behind the consume position, which needs a circular buffer that keeps the window contiguous.
use crate::runtime::config;

/// Name of the host's circular buffer manager
pub const CIRCULAR: &str = "circular";

/// Sizing of a host buffer manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BufferManagerArgs {
    /// Bytes per buffer
    pub buffer_size: usize,
    /// Number of buffers
    pub num_buffers: usize,
}

impl Default for BufferManagerArgs {
    fn default() -> Self {
        let c = config::config();
        BufferManagerArgs {
            buffer_size: c.buffer_size,
            num_buffers: c.num_buffers,
        }
    }
}

/// Buffer manager a port asks the host for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BufferRequest {
    /// Use whatever the host would use anyway.
    HostDefault,
    /// Use a named host buffer manager with explicit sizing.
    Named {
        /// Manager name
        name: String,
        /// Sizing
        args: BufferManagerArgs,
    },
}

impl BufferRequest {
    /// Check if the host default is requested.
    pub fn is_host_default(&self) -> bool {
        matches!(self, BufferRequest::HostDefault)
    }

    /// Buffer size in bytes this request results in.
    pub fn buffer_size(&self, defaults: &BufferManagerArgs) -> usize {
        match self {
            BufferRequest::HostDefault => defaults.buffer_size,
            BufferRequest::Named { args, .. } => args.buffer_size,
        }
    }
}

/// Buffer request of an input port for a block with `history`.
///
/// With `history > 1`, a [`CIRCULAR`] buffer of at least `(history + 1) * item_size * factor`
/// bytes, never smaller than the default. Otherwise the host default.
pub fn history_buffer_request(
    history: usize,
    item_size: usize,
    defaults: &BufferManagerArgs,
    factor: usize,
) -> BufferRequest {
    if history <= 1 {
        return BufferRequest::HostDefault;
    }

    let require = (history + 1) * item_size * factor;
    let mut args = defaults.clone();
    args.buffer_size = args.buffer_size.max(require);
    BufferRequest::Named {
        name: CIRCULAR.to_string(),
        args,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn defaults(buffer_size: usize) -> BufferManagerArgs {
        BufferManagerArgs {
            buffer_size,
            num_buffers: 4,
        }
    }

    #[test]
    fn no_history_uses_host_default() {
        let d = defaults(4096);
        let r = history_buffer_request(1, 8, &d, 8);
        assert!(r.is_host_default());
        assert_eq!(r.buffer_size(&d), 4096);
        assert!(history_buffer_request(0, 8, &d, 8).is_host_default());
    }

    #[test]
    fn history_requests_circular() {
        let d = defaults(0);
        let r = history_buffer_request(4, 8, &d, 8);
        assert_eq!(
            r,
            BufferRequest::Named {
                name: "circular".to_string(),
                args: defaults(320),
            }
        );
    }

    #[test]
    fn default_wins_when_larger() {
        let d = defaults(32768);
        let r = history_buffer_request(4, 8, &d, 8);
        assert!(!r.is_host_default());
        assert_eq!(r.buffer_size(&d), 32768);
    }
}
