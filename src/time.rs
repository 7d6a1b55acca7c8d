//! Tick/nanosecond conversion with the same rounding as the native library.
//!
//! The whole-second part is computed in integers so large tick counts do not
//! lose precision in a double; only the fractional remainder is rounded.
//! Results outside the `i64` range saturate.

const NS_PER_SEC: i64 = 1_000_000_000;

fn saturate(value: i128) -> i64 {
    value.clamp(i64::MIN.into(), i64::MAX.into()) as i64
}

/// Convert a tick count at `rate` ticks per second into nanoseconds
pub fn ticks_to_time_ns(ticks: i64, rate: f64) -> i64 {
    let rate_int = rate as i64;
    if rate_int == 0 {
        return (ticks as f64 * NS_PER_SEC as f64 / rate).round() as i64;
    }
    let full = ticks / rate_int;
    let err = ticks - full * rate_int;
    let part = full as f64 * (rate - rate_int as f64);
    let frac = ((err as f64 - part) * NS_PER_SEC as f64) / rate;
    saturate(i128::from(full) * i128::from(NS_PER_SEC) + frac.round() as i128)
}

/// Convert nanoseconds into a tick count at `rate` ticks per second
pub fn time_ns_to_ticks(time_ns: i64, rate: f64) -> i64 {
    let rate_int = rate as i64;
    let full = time_ns / NS_PER_SEC;
    let err = time_ns - full * NS_PER_SEC;
    let part = full as f64 * (rate - rate_int as f64);
    let frac = part + (err as f64 * rate) / NS_PER_SEC as f64;
    saturate(i128::from(full) * i128::from(rate_int) + frac.round() as i128)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_rate() {
        assert_eq!(ticks_to_time_ns(1_000_000, 1e6), NS_PER_SEC);
        assert_eq!(time_ns_to_ticks(NS_PER_SEC, 1e6), 1_000_000);
        assert_eq!(ticks_to_time_ns(3, 2.0), 1_500_000_000);
    }

    #[test]
    fn test_round_trip_fractional_rate() {
        let rate = 61.44e6 / 7.0;
        for ticks in [0, 1, 12_345, 8_777_142, 9_876_543_210] {
            let ns = ticks_to_time_ns(ticks, rate);
            assert_eq!(time_ns_to_ticks(ns, rate), ticks, "ticks {}", ticks);
        }
    }

    #[test]
    fn test_sub_hertz_rate() {
        assert_eq!(ticks_to_time_ns(1, 0.5), 2 * NS_PER_SEC);
        assert_eq!(time_ns_to_ticks(2 * NS_PER_SEC, 0.5), 1);
    }

    #[test]
    fn test_out_of_range_saturates() {
        assert_eq!(ticks_to_time_ns(i64::MAX, 1e6), i64::MAX);
        assert_eq!(ticks_to_time_ns(i64::MIN, 1e6), i64::MIN);
        assert_eq!(time_ns_to_ticks(i64::MAX, 1e12), i64::MAX);
        assert_eq!(time_ns_to_ticks(i64::MIN, 1e12), i64::MIN);

        // Large but representable values stay exact
        assert_eq!(ticks_to_time_ns(9_000_000_000_000, 1e6), 9_000_000_000_000_000);
        assert_eq!(time_ns_to_ticks(9_000_000_000_000_000, 1e6), 9_000_000_000_000);
    }

    #[test]
    fn test_negative_time() {
        assert_eq!(ticks_to_time_ns(-1_000_000, 1e6), -NS_PER_SEC);
        assert_eq!(time_ns_to_ticks(-NS_PER_SEC, 1e6), -1_000_000);
    }
}
