//! Interval merging

use ipcon_core::AddressRange;

/// Merge ranges into a sorted list of disjoint, non-adjacent ranges
///
/// Overlapping and directly adjacent ranges collapse into one. The output
/// covers exactly the same addresses as the input and is minimal in length.
///
/// # Examples
///
/// ```
/// use ipcon_core::AddressRange;
/// use ipcon_engine::merge;
///
/// let merged = merge(vec![
///     AddressRange::new(10, 19).unwrap(),
///     AddressRange::new(0, 9).unwrap(),
///     AddressRange::new(30, 40).unwrap(),
/// ]);
/// assert_eq!(merged, vec![
///     AddressRange::new(0, 19).unwrap(),
///     AddressRange::new(30, 40).unwrap(),
/// ]);
/// ```
pub fn merge<I>(ranges: I) -> Vec<AddressRange>
where
    I: IntoIterator<Item = AddressRange>,
{
    let mut sorted: Vec<AddressRange> = ranges.into_iter().collect();
    sorted.sort_unstable();

    let mut merged = Vec::new();
    let mut iter = sorted.into_iter();
    let Some(mut current) = iter.next() else {
        return merged;
    };

    for range in iter {
        if current.touches(&range) {
            current = current.cover(&range);
        } else {
            merged.push(current);
            current = range;
        }
    }
    merged.push(current);

    merged
}
