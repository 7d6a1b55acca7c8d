use super::buffer::NativeArray;
use crate::native::ffi::RangeRaw;
use crate::native::NativeApi;
use crate::types::Range;

impl From<RangeRaw> for Range {
    fn from(raw: RangeRaw) -> Self {
        Range::new(raw.minimum, raw.maximum, raw.step)
    }
}

impl From<Range> for RangeRaw {
    fn from(range: Range) -> Self {
        RangeRaw {
            minimum: range.minimum,
            maximum: range.maximum,
            step: range.step,
        }
    }
}

/// Convert consecutive native range records, in order and unvalidated
pub fn decode_ranges(list: &[RangeRaw]) -> Vec<Range> {
    list.iter().copied().map(Range::from).collect()
}

/// Decode and free a native range array.
///
/// # Safety
/// `ptr`/`len` must come from `api` and not be released elsewhere.
pub(crate) unsafe fn take_ranges(api: &dyn NativeApi, ptr: *mut RangeRaw, len: usize) -> Vec<Range> {
    let array = NativeArray::ranges(api, ptr, len);
    decode_ranges(array.as_slice())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_keeps_values_as_delivered() {
        let raw = [
            RangeRaw { minimum: 24e6, maximum: 1.766e9, step: 0.0 },
            RangeRaw { minimum: 10.0, maximum: -10.0, step: 0.5 },
        ];

        let ranges = decode_ranges(&raw);

        assert_eq!(ranges.len(), 2);
        assert!(ranges[0].is_continuous());
        assert_eq!(ranges[1], Range::new(10.0, -10.0, 0.5));
    }
}
