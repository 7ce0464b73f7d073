/// Return the index of the ancestor of `index` at `height`.
///
/// Height 0 is the leaf level. Heights of 64 and above always map to the
/// root position 0, so callers may walk past the top of a `u64` tree
/// without overflowing the shift.
pub fn ancestor_index(index: u64, height: u32) -> u64 {
    index.checked_shr(height).unwrap_or(0)
}

/// Index of the sibling of a node at the same height.
pub fn sibling_index(index: u64) -> u64 {
    index ^ 1
}

/// Returns `true` if the node at `index` is the left child of its parent.
pub fn is_left_child(index: u64) -> bool {
    index & 1 == 0
}

/// Number of levels (leaf level included) of a tree holding `leaf_count`
/// leaves.
///
/// ```text
/// leaves:  1  2  3  4  5  8  9  16  17
/// height:  1  2  3  3  4  4  5   5   6
/// ```
///
/// An empty tree has height 0.
pub fn tree_height(leaf_count: u64) -> u32 {
    match leaf_count {
        0 | 1 => leaf_count as u32,
        n => 65 - (n - 1).leading_zeros(),
    }
}

/// Heights at which the leaf at `index` has a left sibling, ascending.
///
/// These are the set bits of `index`: at each of them the subtree
/// containing the leaf is a right child, so everything in its left sibling
/// is complete before the leaf arrives. Sequential leaf hashing consumes the
/// sibling digests in exactly this order.
pub fn left_sibling_heights(index: u64) -> impl Iterator<Item = u32> {
    (0..u64::BITS).filter(move |height| (index >> height) & 1 == 1)
}

/// Returns the exact number of node hash calls for adding the leaf with
/// the given 0-based index.
///
/// Every trailing one bit of the index is a parked left sibling that gets
/// merged. The leaf hash itself is not included.
pub fn hash_count_for_add(leaf_index: u64) -> u32 {
    leaf_index.trailing_ones()
}
