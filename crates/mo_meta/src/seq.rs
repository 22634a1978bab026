//! Integer sequence helpers used to lay out the descriptor arrays.
//!
//! All functions are pure. The `const` ones can size arrays in `const` items.
//! [`iota`] is not used by the generator; it is kept for callers that build
//! index lists of their own.

use alloc::vec::Vec;

/// Returns `0..n` as a vector.
///
/// ```
/// assert_eq!(mo_meta::seq::iota(4), vec![0, 1, 2, 3]);
/// ```
#[inline]
pub fn iota(n: u32) -> Vec<u32> {
    (0..n).collect()
}

/// Returns `a` followed by `b`.
///
/// ```
/// use mo_meta::seq::{concat, iota, ones};
///
/// assert_eq!(concat(&iota(2), &ones(2)), vec![0, 1, 1, 1]);
/// ```
pub fn concat(a: &[u32], b: &[u32]) -> Vec<u32> {
    let mut out = Vec::with_capacity(a.len() + b.len());
    out.extend_from_slice(a);
    out.extend_from_slice(b);
    out
}

/// Returns `n` ones.
///
/// String index 1 is the empty string, so this is the name list of a
/// method whose argument names were omitted.
#[inline]
pub fn ones(n: usize) -> Vec<u32> {
    alloc::vec![1; n]
}

/// Sums `values` in `const` context.
pub const fn sum(values: &[u32]) -> u32 {
    let mut total = 0;
    let mut i = 0;
    while i < values.len() {
        total += values[i];
        i += 1;
    }
    total
}

/// Words used by the parameter block of a callable with `argc` arguments:
/// one return type, then a type and a name per argument.
#[inline(always)]
pub const fn param_block_len(argc: u32) -> u32 {
    1 + 2 * argc
}

/// Sums the parameter block lengths of all `argcs` in `const` context.
pub const fn param_area_len(argcs: &[u32]) -> u32 {
    argcs.len() as u32 + 2 * sum(argcs)
}

/// `out[0] = 0`, `out[i] = out[i - 1] + values[i - 1]`.
pub fn exclusive_prefix_sums(values: &[u32]) -> Vec<u32> {
    values
        .iter()
        .scan(0u32, |acc, &v| {
            let at = *acc;
            *acc += v;
            Some(at)
        })
        .collect()
}

/// Returns the parameter block offset of each callable, starting at `base`.
///
/// ```
/// use mo_meta::seq::param_offsets;
///
/// // argc 0, 2, 1 -> blocks of 1, 5, 3 words
/// assert_eq!(param_offsets(40, &[0, 2, 1]), vec![40, 41, 46]);
/// ```
pub fn param_offsets(base: u32, argcs: &[u32]) -> Vec<u32> {
    let lens: Vec<u32> = argcs.iter().map(|&k| param_block_len(k)).collect();
    exclusive_prefix_sums(&lens)
        .into_iter()
        .map(|offset| base + offset)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_inputs() {
        assert!(iota(0).is_empty());
        assert!(ones(0).is_empty());
        assert_eq!(sum(&[]), 0);
        assert!(param_offsets(14, &[]).is_empty());
        assert_eq!(param_area_len(&[]), 0);
    }

    #[test]
    fn zero_arg_block_is_one_word() {
        assert_eq!(param_block_len(0), 1);
        assert_eq!(param_area_len(&[0, 0, 3]), 1 + 1 + 7);
    }

    #[test]
    fn const_sum() {
        const TOTAL: u32 = sum(&[1, 2, 3, 4]);
        assert_eq!(TOTAL, 10);
    }

    #[test]
    fn offsets_follow_block_lengths() {
        let argcs = [1, 0, 3];
        let offsets = param_offsets(0, &argcs);
        for i in 1..argcs.len() {
            assert_eq!(offsets[i] - offsets[i - 1], param_block_len(argcs[i - 1]));
        }
    }
}
