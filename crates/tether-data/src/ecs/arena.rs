// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Generational storage with index recycling.

/// One cell of the arena. `value` is `Some` only while the cell is occupied.
#[derive(Debug, Clone)]
struct Cell<T> {
    generation: u32,
    value: Option<T>,
}

/// A dense list of cells addressed by `(index, generation)` pairs.
///
/// Freed indices are kept in a free list and handed out again with a bumped
/// generation, so a handle to a removed value never resolves to the value
/// that later reuses its cell.
#[derive(Debug, Clone)]
pub(crate) struct Arena<T> {
    cells: Vec<Cell<T>>,
    free: Vec<u32>,
    alive: usize,
}

impl<T> Arena<T> {
    /// Creates a new, empty arena.
    pub fn new() -> Self {
        Self {
            cells: Vec::new(),
            free: Vec::new(),
            alive: 0,
        }
    }

    /// Stores `value` in a recycled or new cell and returns its `(index, generation)`.
    pub fn insert(&mut self, value: T) -> (u32, u32) {
        self.alive += 1;
        if let Some(index) = self.free.pop() {
            let cell = &mut self.cells[index as usize];
            cell.generation += 1;
            cell.value = Some(value);
            (index, cell.generation)
        } else {
            let index = self.cells.len() as u32;
            self.cells.push(Cell {
                generation: 0,
                value: Some(value),
            });
            (index, 0)
        }
    }

    pub fn get(&self, index: u32, generation: u32) -> Option<&T> {
        self.cells
            .get(index as usize)
            .filter(|cell| cell.generation == generation)
            .and_then(|cell| cell.value.as_ref())
    }

    pub fn get_mut(&mut self, index: u32, generation: u32) -> Option<&mut T> {
        self.cells
            .get_mut(index as usize)
            .filter(|cell| cell.generation == generation)
            .and_then(|cell| cell.value.as_mut())
    }

    /// Empties the cell and puts its index on the free list.
    pub fn remove(&mut self, index: u32, generation: u32) -> Option<T> {
        let cell = self.cells.get_mut(index as usize)?;
        if cell.generation != generation {
            return None;
        }
        let value = cell.value.take()?;
        self.free.push(index);
        self.alive -= 1;
        Some(value)
    }

    /// Number of occupied cells.
    pub fn len(&self) -> usize {
        self.alive
    }

    /// Iterates over occupied cells in index order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, u32, &T)> {
        self.cells.iter().enumerate().filter_map(|(index, cell)| {
            cell.value
                .as_ref()
                .map(|value| (index as u32, cell.generation, value))
        })
    }
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recycled_index_bumps_generation() {
        let mut arena = Arena::new();
        let (i, g) = arena.insert("a");
        assert_eq!(arena.remove(i, g), Some("a"));
        let (i2, g2) = arena.insert("b");
        assert_eq!(i2, i);
        assert_eq!(g2, g + 1);
        assert_eq!(arena.get(i, g), None);
        assert_eq!(arena.get(i2, g2), Some(&"b"));
    }

    #[test]
    fn stale_remove_is_ignored() {
        let mut arena = Arena::new();
        let (i, g) = arena.insert(1);
        arena.remove(i, g);
        let _ = arena.insert(2);
        assert_eq!(arena.remove(i, g), None);
        assert_eq!(arena.len(), 1);
    }

    #[test]
    fn iter_skips_empty_cells() {
        let mut arena = Arena::new();
        let a = arena.insert(10);
        let _b = arena.insert(20);
        arena.remove(a.0, a.1);
        let values: Vec<_> = arena.iter().map(|(_, _, v)| *v).collect();
        assert_eq!(values, vec![20]);
    }
}
