//! Length alignment for encoded vectors.
//!
//! Alignment is always anchored at the tail: `pad_to` places new zeros
//! before the existing content and `truncate_to` drops leading elements, so
//! the most recent positions of a vector survive both operations. Applied
//! in two phases: once per segment file, then once globally across all
//! segments.

/// Grow `vector` to `length` by inserting zeros at the front. Vectors
/// already at or beyond `length` are left untouched.
pub fn pad_to(vector: &mut Vec<f64>, length: usize) {
    if vector.len() >= length {
        return;
    }
    let missing = length - vector.len();
    vector.splice(0..0, std::iter::repeat(0.0).take(missing));
}

/// Shrink `vector` to `length` by removing leading elements. Vectors
/// already at or below `length` are left untouched.
pub fn truncate_to(vector: &mut Vec<f64>, length: usize) {
    if vector.len() <= length {
        return;
    }
    let excess = vector.len() - length;
    vector.drain(0..excess);
}

/// Force `vector` to exactly `length`, padding or truncating as needed.
pub fn align_to(vector: &mut Vec<f64>, length: usize) {
    pad_to(vector, length);
    truncate_to(vector, length);
}
