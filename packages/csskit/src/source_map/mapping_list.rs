//! Mapping List
//!
//! Keeps mappings in generated order. Appending in order is O(1); an
//! out-of-order append only marks the list for a single sort on next read.

use super::mapping::{compare_by_generated_positions_inflated, Mapping};
use std::cell::{Cell, Ref, RefCell};
use std::cmp::Ordering;

#[derive(Debug, Clone)]
pub struct MappingList {
    mappings: RefCell<Vec<Mapping>>,
    sorted: Cell<bool>,
    last: Option<Mapping>,
}

impl Default for MappingList {
    fn default() -> Self {
        Self::new()
    }
}

impl MappingList {
    pub fn new() -> Self {
        MappingList {
            mappings: RefCell::new(Vec::new()),
            sorted: Cell::new(true),
            last: None,
        }
    }

    pub fn add(&mut self, mapping: Mapping) {
        let in_order = self
            .last
            .as_ref()
            .map_or(true, |last| generated_position_after(last, &mapping));
        if in_order {
            self.last = Some(mapping.clone());
        } else {
            self.sorted.set(false);
        }
        self.mappings.get_mut().push(mapping);
    }

    pub fn len(&self) -> usize {
        self.mappings.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Visit mappings in insertion order without sorting.
    pub fn unsorted_for_each(&self, mut callback: impl FnMut(&Mapping)) {
        for mapping in self.mappings.borrow().iter() {
            callback(mapping);
        }
    }

    /// Mutable access in storage order. Any tie-breaker may change, so the
    /// list is resorted on next read.
    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Mapping> {
        self.sorted.set(false);
        self.mappings.get_mut().iter_mut()
    }

    /// Mappings sorted by generated position.
    pub fn to_array(&self) -> Ref<'_, [Mapping]> {
        if !self.sorted.get() {
            self.mappings
                .borrow_mut()
                .sort_by(compare_by_generated_positions_inflated);
            self.sorted.set(true);
        }
        Ref::map(self.mappings.borrow(), |mappings| mappings.as_slice())
    }
}

fn generated_position_after(a: &Mapping, b: &Mapping) -> bool {
    let (line_a, line_b) = (a.generated.line, b.generated.line);
    let (column_a, column_b) = (a.generated.column, b.generated.column);
    line_b > line_a
        || (line_b == line_a && column_b >= column_a)
        || compare_by_generated_positions_inflated(a, b) != Ordering::Greater
}
