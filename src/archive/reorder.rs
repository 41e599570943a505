//! Position moves over ordered track lists.
//!
//! Every operation leaves the `order` fields as the contiguous sequence
//! `0..len`, matching the items' positions.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReorderError {
    #[error("Index out of range: {index} (length {len})")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Invalid track order: {0}")]
    InvalidPermutation(String),
}

pub trait Ordered {
    fn order(&self) -> usize;
    fn set_order(&mut self, order: usize);
}

/// Removes the item at `from` and reinserts it at `to`, then renumbers.
pub fn move_song<T: Ordered>(items: &mut Vec<T>, from: usize, to: usize) -> Result<(), ReorderError> {
    let len = items.len();
    for index in [from, to] {
        if index >= len {
            return Err(ReorderError::IndexOutOfRange { index, len });
        }
    }

    let item = items.remove(from);
    items.insert(to, item);
    renumber(items);
    Ok(())
}

/// Sets every item's `order` to its position.
pub fn renumber<T: Ordered>(items: &mut [T]) {
    for (position, item) in items.iter_mut().enumerate() {
        item.set_order(position);
    }
}

/// Checks that `target` is a permutation of `0..len`.
pub fn validate_permutation(target: &[usize], len: usize) -> Result<(), ReorderError> {
    if target.len() != len {
        return Err(ReorderError::InvalidPermutation(format!(
            "expected {} positions, got {}",
            len,
            target.len()
        )));
    }
    let mut seen = vec![false; len];
    for &position in target {
        if position >= len {
            return Err(ReorderError::InvalidPermutation(format!(
                "position {} out of range",
                position
            )));
        }
        if seen[position] {
            return Err(ReorderError::InvalidPermutation(format!(
                "position {} repeated",
                position
            )));
        }
        seen[position] = true;
    }
    Ok(())
}

/// Rearranges `items` so that the item currently at `target[i]` ends up at
/// position `i`, using only [`move_song`] steps. Returns the moves applied.
pub fn reorder_to<T: Ordered>(
    items: &mut Vec<T>,
    target: &[usize],
) -> Result<Vec<(usize, usize)>, ReorderError> {
    validate_permutation(target, items.len())?;

    // current[p] = original position of the item now at p
    let mut current: Vec<usize> = (0..items.len()).collect();
    let mut moves = Vec::new();
    for (destination, wanted) in target.iter().enumerate() {
        let from = current
            .iter()
            .position(|original| original == wanted)
            .ok_or_else(|| ReorderError::InvalidPermutation(format!("lost position {}", wanted)))?;
        if from != destination {
            move_song(items, from, destination)?;
            let original = current.remove(from);
            current.insert(destination, original);
            moves.push((from, destination));
        }
    }
    renumber(items);
    Ok(moves)
}
