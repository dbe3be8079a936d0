//! Depth-first walks over a hierarchy.
//!
//! Every walk is an explicit-stack, pre-order iterator. Children are pushed
//! in collection order and popped from the top, so sibling subtrees come out
//! last-to-first: for a notebook with sections `[a, b]` and section group
//! `[g]`, the walk yields the notebook, then `g`'s subtree, then `b`, then `a`.
//!
//! Walks over the whole [`Root`](crate::model::Root) take its notebooks, then
//! its open sections, as sources and drain each source completely before
//! starting the next.

use std::iter::{self, Once, Rev};

use crate::error::Result;
use crate::model::{ChildrenIter, Hierarchy, ItemData, ItemId, ItemIter, ItemRef};
use crate::ops::pool::{PooledStack, StackPool};

/// Predicate type of the unfiltered walks.
pub type Unfiltered<'h> = fn(&ItemRef<'h>) -> bool;

fn everything(_: &ItemRef<'_>) -> bool {
    true
}

/// Pre-order walk. `St` is the stack storage, pooled or owned.
pub struct PreOrder<'h, S, St, P> {
    hierarchy: &'h Hierarchy,
    sources: S,
    stack: St,
    predicate: P,
}

/// Pre-order walk on a pooled stack.
pub type Descendants<'h, S, P> = PreOrder<'h, S, PooledStack<'static>, P>;

/// Pre-order walk on a stack of its own.
pub type Traverse<'h, S, P> = PreOrder<'h, S, Vec<ItemId>, P>;

impl<'h, S, St, P> Iterator for PreOrder<'h, S, St, P>
where
    S: Iterator<Item = ItemId>,
    St: AsMut<Vec<ItemId>>,
    P: FnMut(&ItemRef<'h>) -> bool,
{
    type Item = ItemRef<'h>;

    fn next(&mut self) -> Option<ItemRef<'h>> {
        loop {
            let id = match self.stack.as_mut().pop() {
                Some(id) => id,
                None => self.sources.next()?,
            };
            let Some(item) = self.hierarchy.get(id) else {
                continue;
            };
            self.stack.as_mut().extend(item.children().iter());
            if (self.predicate)(&item) {
                return Some(item);
            }
        }
    }
}

impl AsMut<Vec<ItemId>> for PooledStack<'_> {
    fn as_mut(&mut self) -> &mut Vec<ItemId> {
        self
    }
}

/// `source` and everything below it.
pub fn descendants(
    hierarchy: &Hierarchy,
    source: ItemId,
) -> Result<Descendants<'_, Once<ItemId>, Unfiltered<'_>>> {
    descendants_where(hierarchy, source, everything)
}

/// `source` and everything below it that matches `predicate`.
pub fn descendants_where<'h, P>(
    hierarchy: &'h Hierarchy,
    source: ItemId,
    predicate: P,
) -> Result<Descendants<'h, Once<ItemId>, P>>
where
    P: FnMut(&ItemRef<'h>) -> bool,
{
    hierarchy.item(source)?;
    Ok(PreOrder {
        hierarchy,
        sources: iter::once(source),
        stack: StackPool::shared().rent(),
        predicate,
    })
}

/// Every item reachable from the root.
pub fn root_descendants(hierarchy: &Hierarchy) -> Descendants<'_, ChildrenIter<'_>, Unfiltered<'_>> {
    root_descendants_where(hierarchy, everything)
}

pub fn root_descendants_where<'h, P>(
    hierarchy: &'h Hierarchy,
    predicate: P,
) -> Descendants<'h, ChildrenIter<'h>, P>
where
    P: FnMut(&ItemRef<'h>) -> bool,
{
    PreOrder {
        hierarchy,
        sources: hierarchy.root().items(),
        stack: StackPool::shared().rent(),
        predicate,
    }
}

/// Same walk as [`descendants`], without touching the shared pool.
pub fn traverse(hierarchy: &Hierarchy, source: ItemId) -> Result<Traverse<'_, Once<ItemId>, Unfiltered<'_>>> {
    traverse_where(hierarchy, source, everything)
}

pub fn traverse_where<'h, P>(
    hierarchy: &'h Hierarchy,
    source: ItemId,
    predicate: P,
) -> Result<Traverse<'h, Once<ItemId>, P>>
where
    P: FnMut(&ItemRef<'h>) -> bool,
{
    hierarchy.item(source)?;
    Ok(PreOrder {
        hierarchy,
        sources: iter::once(source),
        stack: Vec::new(),
        predicate,
    })
}

/// Pages below a source, yielded straight from each section's page list
/// instead of going through the stack.
///
/// Produces pages in exactly the order a [`descendants`] walk filtered to
/// pages would.
pub struct AllPages<'h, S, P> {
    hierarchy: &'h Hierarchy,
    sources: S,
    stack: PooledStack<'static>,
    pages: Rev<ItemIter<'h>>,
    predicate: P,
}

impl<'h, S, P> Iterator for AllPages<'h, S, P>
where
    S: Iterator<Item = ItemId>,
    P: FnMut(&ItemRef<'h>) -> bool,
{
    type Item = ItemRef<'h>;

    fn next(&mut self) -> Option<ItemRef<'h>> {
        loop {
            if let Some(page) = self.pages.next() {
                match self.hierarchy.get(page) {
                    Some(item) if (self.predicate)(&item) => return Some(item),
                    _ => continue,
                }
            }

            let id = match self.stack.pop() {
                Some(id) => id,
                None => self.sources.next()?,
            };
            let Some(item) = self.hierarchy.get(id) else {
                continue;
            };
            match item.data() {
                ItemData::Section(section) => self.pages = section.pages().iter().rev(),
                ItemData::Page(_) => {
                    if (self.predicate)(&item) {
                        return Some(item);
                    }
                }
                _ => self.stack.extend(item.children().iter()),
            }
        }
    }
}

fn no_pages<'h>() -> Rev<ItemIter<'h>> {
    [].iter().copied().rev()
}

pub fn all_pages(hierarchy: &Hierarchy, source: ItemId) -> Result<AllPages<'_, Once<ItemId>, Unfiltered<'_>>> {
    all_pages_where(hierarchy, source, everything)
}

pub fn all_pages_where<'h, P>(
    hierarchy: &'h Hierarchy,
    source: ItemId,
    predicate: P,
) -> Result<AllPages<'h, Once<ItemId>, P>>
where
    P: FnMut(&ItemRef<'h>) -> bool,
{
    hierarchy.item(source)?;
    Ok(AllPages {
        hierarchy,
        sources: iter::once(source),
        stack: StackPool::shared().rent(),
        pages: no_pages(),
        predicate,
    })
}

/// Every page reachable from the root, open sections included.
pub fn root_all_pages(hierarchy: &Hierarchy) -> AllPages<'_, ChildrenIter<'_>, Unfiltered<'_>> {
    root_all_pages_where(hierarchy, everything)
}

pub fn root_all_pages_where<'h, P>(hierarchy: &'h Hierarchy, predicate: P) -> AllPages<'h, ChildrenIter<'h>, P>
where
    P: FnMut(&ItemRef<'h>) -> bool,
{
    AllPages {
        hierarchy,
        sources: hierarchy.root().items(),
        stack: StackPool::shared().rent(),
        pages: no_pages(),
        predicate,
    }
}
