//! Upward and sideways navigation: ancestors and siblings.

use crate::error::Result;
use crate::model::{Children, ChildrenIter, Hierarchy, ItemId, ItemRef};
use crate::ops::traverse::Unfiltered;

fn everything(_: &ItemRef<'_>) -> bool {
    true
}

/// Parent, grandparent, and so on up to the notebook (or the open section
/// at the top of a detached chain).
pub struct Ancestors<'h, P> {
    hierarchy: &'h Hierarchy,
    next: Option<ItemId>,
    predicate: P,
}

impl<'h, P> Iterator for Ancestors<'h, P>
where
    P: FnMut(&ItemRef<'h>) -> bool,
{
    type Item = ItemRef<'h>;

    fn next(&mut self) -> Option<ItemRef<'h>> {
        loop {
            let item = self.hierarchy.get(self.next?)?;
            self.next = item.parent().map(|p| p.handle());
            if (self.predicate)(&item) {
                return Some(item);
            }
        }
    }
}

pub fn ancestors(hierarchy: &Hierarchy, origin: ItemId) -> Result<Ancestors<'_, Unfiltered<'_>>> {
    ancestors_where(hierarchy, origin, everything)
}

pub fn ancestors_where<'h, P>(hierarchy: &'h Hierarchy, origin: ItemId, predicate: P) -> Result<Ancestors<'h, P>>
where
    P: FnMut(&ItemRef<'h>) -> bool,
{
    let origin = hierarchy.item(origin)?;
    Ok(Ancestors {
        hierarchy,
        next: origin.parent().map(|p| p.handle()),
        predicate,
    })
}

/// The ordered set `item` is a member of: its parent's children, or the
/// root notebook list for a top-level notebook. Detached items have none.
pub fn siblings(item: ItemRef<'_>) -> Children<'_> {
    if let Some(parent) = item.parent() {
        return parent.children();
    }
    match item.as_notebook() {
        Some(nb) if nb.is_in_root() => Children::single(item.hierarchy().root().notebooks()),
        _ => Children::empty(),
    }
}

/// Siblings strictly before the origin, in order.
pub struct BeforeSelf<'h, P> {
    hierarchy: &'h Hierarchy,
    siblings: ChildrenIter<'h>,
    origin: ItemId,
    predicate: P,
}

impl<'h, P> Iterator for BeforeSelf<'h, P>
where
    P: FnMut(&ItemRef<'h>) -> bool,
{
    type Item = ItemRef<'h>;

    fn next(&mut self) -> Option<ItemRef<'h>> {
        loop {
            let id = self.siblings.next()?;
            if id == self.origin {
                self.siblings = Children::empty().iter();
                return None;
            }
            match self.hierarchy.get(id) {
                Some(item) if (self.predicate)(&item) => return Some(item),
                _ => {}
            }
        }
    }
}

pub fn before_self(hierarchy: &Hierarchy, origin: ItemId) -> Result<BeforeSelf<'_, Unfiltered<'_>>> {
    before_self_where(hierarchy, origin, everything)
}

pub fn before_self_where<'h, P>(
    hierarchy: &'h Hierarchy,
    origin: ItemId,
    predicate: P,
) -> Result<BeforeSelf<'h, P>>
where
    P: FnMut(&ItemRef<'h>) -> bool,
{
    let item = hierarchy.item(origin)?;
    Ok(BeforeSelf {
        hierarchy,
        siblings: siblings(item).iter(),
        origin,
        predicate,
    })
}

/// Siblings strictly after the origin, in order.
pub struct AfterSelf<'h, P> {
    hierarchy: &'h Hierarchy,
    siblings: ChildrenIter<'h>,
    origin: ItemId,
    past_origin: bool,
    predicate: P,
}

impl<'h, P> Iterator for AfterSelf<'h, P>
where
    P: FnMut(&ItemRef<'h>) -> bool,
{
    type Item = ItemRef<'h>;

    fn next(&mut self) -> Option<ItemRef<'h>> {
        if !self.past_origin {
            self.past_origin = true;
            let origin = self.origin;
            self.siblings.by_ref().find(|&id| id == origin)?;
        }
        loop {
            let id = self.siblings.next()?;
            match self.hierarchy.get(id) {
                Some(item) if (self.predicate)(&item) => return Some(item),
                _ => {}
            }
        }
    }
}

pub fn after_self(hierarchy: &Hierarchy, origin: ItemId) -> Result<AfterSelf<'_, Unfiltered<'_>>> {
    after_self_where(hierarchy, origin, everything)
}

pub fn after_self_where<'h, P>(
    hierarchy: &'h Hierarchy,
    origin: ItemId,
    predicate: P,
) -> Result<AfterSelf<'h, P>>
where
    P: FnMut(&ItemRef<'h>) -> bool,
{
    let item = hierarchy.item(origin)?;
    Ok(AfterSelf {
        hierarchy,
        siblings: siblings(item).iter(),
        origin,
        past_origin: false,
        predicate,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HierarchyError;
    use crate::model::ItemKind;
    use crate::parse::{HierarchyParser, StreamingParser};
    use pretty_assertions::assert_eq;

    const SNAPSHOT: &str = r#"<one:Notebooks xmlns:one="http://schemas.microsoft.com/office/onenote/2013/onenote">
  <one:Notebook ID="n0" name="n0"/>
  <one:Notebook ID="n1" name="n1">
    <one:Section ID="s0" name="s0"/>
    <one:Section ID="s1" name="s1">
      <one:Page ID="p0" name="p0"/>
    </one:Section>
    <one:SectionGroup ID="g0" name="g0">
      <one:SectionGroup ID="g1" name="g1">
        <one:Section ID="s2" name="s2">
          <one:Page ID="p1" name="p1"/>
        </one:Section>
      </one:SectionGroup>
    </one:SectionGroup>
  </one:Notebook>
  <one:Notebook ID="n2" name="n2"/>
  <one:Notebook ID="n3" name="n3"/>
  <one:OpenSections ID="open">
    <one:Section ID="o0" name="o0"/>
  </one:OpenSections>
</one:Notebooks>"#;

    fn find(h: &Hierarchy, id: &str) -> ItemId {
        crate::ops::item_ops::find_by_id(h, id).unwrap().handle()
    }

    fn ids<'h>(items: impl Iterator<Item = ItemRef<'h>>) -> Vec<&'h str> {
        items.map(|i| i.id()).collect()
    }

    #[test]
    fn test_ancestors_near_to_far() {
        let h = StreamingParser.parse_root(SNAPSHOT).unwrap();
        assert_eq!(
            ids(ancestors(&h, find(&h, "p1")).unwrap()),
            vec!["s2", "g1", "g0", "n1"]
        );
        assert_eq!(ancestors(&h, find(&h, "n1")).unwrap().count(), 0);
        assert_eq!(ancestors(&h, find(&h, "o0")).unwrap().count(), 0);
    }

    #[test]
    fn test_ancestors_where() {
        let h = StreamingParser.parse_root(SNAPSHOT).unwrap();
        let groups = ancestors_where(&h, find(&h, "p1"), |i| i.kind() == ItemKind::SectionGroup);
        assert_eq!(ids(groups.unwrap()), vec!["g1", "g0"]);
    }

    #[test]
    fn test_notebook_siblings_come_from_root() {
        let h = StreamingParser.parse_root(SNAPSHOT).unwrap();
        let n1 = find(&h, "n1");
        assert_eq!(ids(before_self(&h, n1).unwrap()), vec!["n0"]);
        assert_eq!(ids(after_self(&h, n1).unwrap()), vec!["n2", "n3"]);
    }

    #[test]
    fn test_sibling_partition_spans_both_collections() {
        let h = StreamingParser.parse_root(SNAPSHOT).unwrap();
        let g0 = find(&h, "g0");
        assert_eq!(ids(before_self(&h, g0).unwrap()), vec!["s0", "s1"]);
        assert_eq!(after_self(&h, g0).unwrap().count(), 0);

        let s0 = find(&h, "s0");
        assert_eq!(before_self(&h, s0).unwrap().count(), 0);
        assert_eq!(ids(after_self(&h, s0).unwrap()), vec!["s1", "g0"]);
        let sections = after_self_where(&h, s0, |i| i.kind() == ItemKind::Section);
        assert_eq!(ids(sections.unwrap()), vec!["s1"]);
    }

    #[test]
    fn test_detached_items_have_no_siblings() {
        let mut h = StreamingParser.parse_root(SNAPSHOT).unwrap();
        let xml = r#"<one:Notebook xmlns:one="http://schemas.microsoft.com/office/onenote/2013/onenote" ID="loose" name="loose"/>"#;
        let loose = StreamingParser.parse(&mut h, xml, None).unwrap();
        assert_eq!(before_self(&h, loose).unwrap().count(), 0);
        assert_eq!(after_self(&h, loose).unwrap().count(), 0);
        // open sections have no parent and no root link
        let o0 = find(&h, "o0");
        assert_eq!(after_self(&h, o0).unwrap().count(), 0);
    }

    #[test]
    fn test_dead_origin_rejected() {
        let mut h = StreamingParser.parse_root(SNAPSHOT).unwrap();
        let s0 = find(&h, "s0");
        h.remove(s0).unwrap();
        assert!(matches!(ancestors(&h, s0), Err(HierarchyError::InvalidArgument(_))));
        assert!(matches!(before_self(&h, s0), Err(HierarchyError::InvalidArgument(_))));
        assert!(matches!(after_self(&h, s0), Err(HierarchyError::InvalidArgument(_))));
    }
}
