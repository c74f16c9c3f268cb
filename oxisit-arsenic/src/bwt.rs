//! Inverse Burrows-Wheeler transform.
//!
//! A decoded block holds the last column of the sorted rotation matrix. The
//! inverse table maps each row to the row holding the next byte of the
//! original text, so starting at the transform index and repeatedly following
//! the table walks the block in original order.

/// Build the inverse table for `block` into `table`.
///
/// Position `cum[b]` (the number of bytes smaller than `b`, advanced once per
/// occurrence) receives the index of each occurrence of `b`, in block order.
pub fn inverse_table_into(block: &[u8], table: &mut Vec<u32>) {
    let mut counts = [0usize; 256];
    for &b in block {
        counts[b as usize] += 1;
    }

    let mut cumulative = [0usize; 256];
    let mut sum = 0;
    for (slot, &count) in cumulative.iter_mut().zip(&counts) {
        *slot = sum;
        sum += count;
    }

    table.clear();
    table.resize(block.len(), 0);
    for (i, &b) in block.iter().enumerate() {
        table[cumulative[b as usize]] = i as u32;
        cumulative[b as usize] += 1;
    }
}

/// Build the inverse table for `block`.
pub fn inverse_table(block: &[u8]) -> Vec<u32> {
    let mut table = Vec::with_capacity(block.len());
    inverse_table_into(block, &mut table);
    table
}

/// Invert a whole block in one pass.
///
/// Returns an empty vector when `index` is outside the block.
pub fn inverse_transform(block: &[u8], index: usize) -> Vec<u8> {
    if index >= block.len() {
        return Vec::new();
    }

    let table = inverse_table(block);
    let mut result = Vec::with_capacity(block.len());
    let mut idx = index;
    for _ in 0..block.len() {
        idx = table[idx] as usize;
        result.push(block[idx]);
    }
    result
}

/// Forward transform: the last column of the sorted rotations and the row
/// holding the unrotated input.
#[cfg(any(test, feature = "fixture"))]
pub fn forward_transform(data: &[u8]) -> (Vec<u8>, usize) {
    let n = data.len();
    if n == 0 {
        return (Vec::new(), 0);
    }

    let mut rows: Vec<usize> = (0..n).collect();
    rows.sort_by(|&a, &b| {
        (0..n)
            .map(|i| data[(a + i) % n].cmp(&data[(b + i) % n]))
            .find(|o| o.is_ne())
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let index = rows.iter().position(|&r| r == 0).unwrap_or(0);
    let last_column = rows.iter().map(|&r| data[(r + n - 1) % n]).collect();
    (last_column, index)
}
