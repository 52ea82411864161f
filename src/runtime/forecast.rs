//! Forecast resolution
//!
//! Legacy blocks only state their input/output ratio through a forecast function, which has no
//! inverse in general. The resolver searches downward from the output space the host offers.

/// Find the largest output count `n <= candidate` the available input can satisfy.
///
/// `forecast(n, required)` fills `required` with the items needed per input to produce `n`
/// outputs. Returns `None` if no `n > 0` is feasible. Blocks without inputs are feasible for any
/// positive candidate.
pub fn resolve<F>(
    candidate: usize,
    available: &[usize],
    required: &mut [usize],
    mut forecast: F,
) -> Option<usize>
where
    F: FnMut(usize, &mut [usize]),
{
    debug_assert_eq!(available.len(), required.len());

    let mut n = candidate;
    while n > 0 {
        forecast(n, required);
        if required.iter().zip(available).all(|(r, a)| r <= a) {
            return Some(n);
        }
        n -= 1;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_rate_with_history() {
        let available = [10, 7];
        let mut required = [0; 2];
        let n = resolve(64, &available, &mut required, |n, r| r.fill(n + 3 - 1));
        assert_eq!(n, Some(5));
        assert_eq!(required, [7, 7]);
    }

    #[test]
    fn decimator() {
        let available = [17];
        let mut required = [0];
        let n = resolve(100, &available, &mut required, |n, r| r.fill(n * 4));
        assert_eq!(n, Some(4));
    }

    #[test]
    fn exhausted() {
        let mut required = [0];
        assert_eq!(resolve(8, &[3], &mut required, |n, r| r.fill(n * 4)), None);
        assert_eq!(resolve(0, &[100], &mut required, |n, r| r.fill(n)), None);
    }

    #[test]
    fn source() {
        let mut calls = 0;
        let n = resolve(512, &[], &mut [], |_, _| calls += 1);
        assert_eq!(n, Some(512));
        assert_eq!(calls, 1);
    }
}
