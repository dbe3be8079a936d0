use std::iter::{Chain, Copied};
use std::ops::Index;
use std::slice;

use crate::model::hierarchy::ItemId;
use crate::model::item::ItemKind;

/// Forward cursor over item handles. Borrows the backing storage, never allocates.
pub type ItemIter<'a> = Copied<slice::Iter<'a, ItemId>>;

/// Cursor over a [`Children`] view: the first list, then the second.
pub type ChildrenIter<'a> = Chain<ItemIter<'a>, ItemIter<'a>>;

/// Insertion-ordered list of child handles, typed by the kind it holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemList {
    element: ItemKind,
    items: Vec<ItemId>,
}

impl ItemList {
    pub fn new(element: ItemKind) -> Self {
        ItemList {
            element,
            items: Vec::new(),
        }
    }

    /// The kind of item this list holds.
    pub fn element_kind(&self) -> ItemKind {
        self.element
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<ItemId> {
        self.items.get(index).copied()
    }

    pub fn iter(&self) -> ItemIter<'_> {
        self.items.iter().copied()
    }

    pub fn as_slice(&self) -> &[ItemId] {
        &self.items
    }

    pub fn contains(&self, id: ItemId) -> bool {
        self.items.contains(&id)
    }

    pub(crate) fn push(&mut self, id: ItemId) {
        self.items.push(id);
    }

    /// Remove `id` if this list holds items of `kind`. Returns whether it was removed.
    pub(crate) fn remove(&mut self, id: ItemId, kind: ItemKind) -> bool {
        if kind != self.element {
            return false;
        }
        match self.items.iter().position(|&x| x == id) {
            Some(pos) => {
                self.items.remove(pos);
                true
            }
            None => false,
        }
    }

    pub(crate) fn clear(&mut self) {
        self.items.clear();
    }
}

impl Index<usize> for ItemList {
    type Output = ItemId;

    fn index(&self, index: usize) -> &ItemId {
        &self.items[index]
    }
}

impl<'a> IntoIterator for &'a ItemList {
    type Item = ItemId;
    type IntoIter = ItemIter<'a>;

    fn into_iter(self) -> ItemIter<'a> {
        self.iter()
    }
}

/// Read-only view over up to two lists, presented as one sequence.
///
/// For notebooks and section groups the first list is the sections and the
/// second the section groups. Index and count arithmetic forward to the
/// backing lists; nothing is copied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Children<'a> {
    first: &'a [ItemId],
    second: &'a [ItemId],
}

impl<'a> Children<'a> {
    pub fn empty() -> Self {
        Children {
            first: &[],
            second: &[],
        }
    }

    pub(crate) fn single(list: &'a ItemList) -> Self {
        Children {
            first: list.as_slice(),
            second: &[],
        }
    }

    pub(crate) fn pair(first: &'a ItemList, second: &'a ItemList) -> Self {
        Children {
            first: first.as_slice(),
            second: second.as_slice(),
        }
    }

    pub(crate) fn from_slices(first: &'a [ItemId], second: &'a [ItemId]) -> Self {
        Children { first, second }
    }

    pub fn len(&self) -> usize {
        self.first.len() + self.second.len()
    }

    pub fn is_empty(&self) -> bool {
        self.first.is_empty() && self.second.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<ItemId> {
        if index < self.first.len() {
            Some(self.first[index])
        } else {
            self.second.get(index - self.first.len()).copied()
        }
    }

    pub fn iter(&self) -> ChildrenIter<'a> {
        self.first.iter().copied().chain(self.second.iter().copied())
    }

    pub fn position(&self, id: ItemId) -> Option<usize> {
        self.iter().position(|x| x == id)
    }

    pub fn contains(&self, id: ItemId) -> bool {
        self.position(id).is_some()
    }
}

impl<'a> IntoIterator for Children<'a> {
    type Item = ItemId;
    type IntoIter = ChildrenIter<'a>;

    fn into_iter(self) -> ChildrenIter<'a> {
        self.iter()
    }
}
