//! Index-linked circular singly linked list.
//!
//! Pending updates and per-render effect lists share this shape: `last`
//! points at the newest entry and `last.next` at the oldest, so appending is
//! O(1) and iteration starts from the oldest entry. Links are indices into a
//! backing vector instead of pointers.

const DETACHED: usize = usize::MAX;

struct ListNode<T> {
    value: Option<T>,
    next: usize,
}

pub struct CircularList<T> {
    nodes: Vec<ListNode<T>>,
    last: Option<usize>,
}

impl<T> Default for CircularList<T> {
    fn default() -> Self {
        Self {
            nodes: Vec::new(),
            last: None,
        }
    }
}

impl<T> CircularList<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.last.is_none()
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    /// Splice `value` in as the newest entry.
    pub fn push(&mut self, value: T) {
        let index = self.nodes.len();
        let next = match self.last {
            // First entry: a ring of one.
            None => index,
            Some(last) => {
                let first = self.nodes[last].next;
                self.nodes[last].next = index;
                first
            }
        };
        self.nodes.push(ListNode {
            value: Some(value),
            next,
        });
        self.last = Some(index);
    }

    /// The newest entry.
    pub fn last(&self) -> Option<&T> {
        self.last.and_then(|last| self.nodes[last].value.as_ref())
    }

    /// The oldest entry.
    pub fn first(&self) -> Option<&T> {
        let last = self.last?;
        self.nodes[self.nodes[last].next].value.as_ref()
    }

    /// Walk the ring once, oldest first.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            list: self,
            cursor: self.last.map(|last| self.nodes[last].next),
        }
    }

    /// Detach every pending entry, oldest first, leaving the list empty.
    ///
    /// The ring is broken at `last` before the walk so the traversal ends on
    /// a detached link instead of wrapping around.
    pub fn take_all(&mut self) -> Vec<T> {
        let Some(last) = self.last.take() else {
            return Vec::new();
        };
        let mut cursor = self.nodes[last].next;
        self.nodes[last].next = DETACHED;

        let mut drained = Vec::with_capacity(self.nodes.len());
        while cursor != DETACHED {
            let node = &mut self.nodes[cursor];
            if let Some(value) = node.value.take() {
                drained.push(value);
            }
            cursor = node.next;
        }
        self.nodes.clear();
        drained
    }
}

pub struct Iter<'a, T> {
    list: &'a CircularList<T>,
    cursor: Option<usize>,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        let index = self.cursor?;
        let node = &self.list.nodes[index];
        self.cursor = if Some(index) == self.list.last {
            None
        } else {
            Some(node.next)
        };
        node.value.as_ref()
    }
}

impl<T> FromIterator<T> for CircularList<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut list = Self::new();
        for value in iter {
            list.push(value);
        }
        list
    }
}

#[cfg(test)]
#[path = "tests/list_tests.rs"]
mod tests;
