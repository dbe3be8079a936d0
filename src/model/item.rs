use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::collection::{Children, ItemList};
use crate::model::hierarchy::ItemId;

/// The four concrete hierarchy variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    Notebook,
    SectionGroup,
    Section,
    Page,
}

impl ItemKind {
    /// Local element name used by the store's XML.
    pub fn element_name(self) -> &'static str {
        match self {
            ItemKind::Notebook => "Notebook",
            ItemKind::SectionGroup => "SectionGroup",
            ItemKind::Section => "Section",
            ItemKind::Page => "Page",
        }
    }

    pub fn from_element_name(name: &str) -> Option<ItemKind> {
        match name {
            "Notebook" => Some(ItemKind::Notebook),
            "SectionGroup" => Some(ItemKind::SectionGroup),
            "Section" => Some(ItemKind::Section),
            "Page" => Some(ItemKind::Page),
            _ => None,
        }
    }

    /// Human-readable name, as used in messages.
    pub const fn name(self) -> &'static str {
        match self {
            ItemKind::Notebook => "notebook",
            ItemKind::SectionGroup => "section group",
            ItemKind::Section => "section",
            ItemKind::Page => "page",
        }
    }

    /// Whether an item of this kind may own a child of kind `child`.
    pub fn accepts(self, child: ItemKind) -> bool {
        match self {
            ItemKind::Notebook | ItemKind::SectionGroup => {
                matches!(child, ItemKind::Section | ItemKind::SectionGroup)
            }
            ItemKind::Section => child == ItemKind::Page,
            ItemKind::Page => false,
        }
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

/// An RGB color as written in the `color` attribute (`#RRGGBB`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Color { r, g, b }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

/// Fields every hierarchy item carries.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemHeader {
    /// Store-assigned identity. Never changes after the item is first parsed.
    pub id: String,
    pub name: String,
    pub is_unread: bool,
    pub last_modified: DateTime<Utc>,
}

impl Default for ItemHeader {
    fn default() -> Self {
        ItemHeader {
            id: String::new(),
            name: String::new(),
            is_unread: false,
            last_modified: DateTime::<Utc>::UNIX_EPOCH,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Notebook {
    /// The `nickname` attribute; what the application shows.
    pub display_name: String,
    pub path: String,
    pub color: Option<Color>,
    pub(crate) sections: ItemList,
    pub(crate) section_groups: ItemList,
    /// Set while the notebook sits in its hierarchy's root list.
    pub(crate) in_root: bool,
}

impl Notebook {
    pub fn sections(&self) -> &ItemList {
        &self.sections
    }

    pub fn section_groups(&self) -> &ItemList {
        &self.section_groups
    }

    pub fn is_in_root(&self) -> bool {
        self.in_root
    }
}

impl Default for Notebook {
    fn default() -> Self {
        Notebook {
            display_name: String::new(),
            path: String::new(),
            color: None,
            sections: ItemList::new(ItemKind::Section),
            section_groups: ItemList::new(ItemKind::SectionGroup),
            in_root: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SectionGroup {
    pub path: String,
    pub is_recycle_bin: bool,
    pub(crate) sections: ItemList,
    pub(crate) section_groups: ItemList,
}

impl SectionGroup {
    pub fn sections(&self) -> &ItemList {
        &self.sections
    }

    pub fn section_groups(&self) -> &ItemList {
        &self.section_groups
    }
}

impl Default for SectionGroup {
    fn default() -> Self {
        SectionGroup {
            path: String::new(),
            is_recycle_bin: false,
            sections: ItemList::new(ItemKind::Section),
            section_groups: ItemList::new(ItemKind::SectionGroup),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    pub path: String,
    pub color: Option<Color>,
    pub is_locked: bool,
    pub is_encrypted: bool,
    pub is_in_recycle_bin: bool,
    /// The special section inside a recycle bin that holds deleted pages.
    pub is_deleted_pages: bool,
    pub(crate) pages: ItemList,
}

impl Section {
    pub fn pages(&self) -> &ItemList {
        &self.pages
    }
}

impl Default for Section {
    fn default() -> Self {
        Section {
            path: String::new(),
            color: None,
            is_locked: false,
            is_encrypted: false,
            is_in_recycle_bin: false,
            is_deleted_pages: false,
            pages: ItemList::new(ItemKind::Page),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    /// Indentation level within the section, starting at 1 for top-level pages.
    pub level: u32,
    pub created: DateTime<Utc>,
    pub is_in_recycle_bin: bool,
}

impl Default for Page {
    fn default() -> Self {
        Page {
            level: 0,
            created: DateTime::<Utc>::UNIX_EPOCH,
            is_in_recycle_bin: false,
        }
    }
}

/// Kind-specific payload of a hierarchy item.
#[derive(Debug, Clone, PartialEq)]
pub enum ItemData {
    Notebook(Notebook),
    SectionGroup(SectionGroup),
    Section(Section),
    Page(Page),
}

impl ItemData {
    pub(crate) fn blank(kind: ItemKind) -> Self {
        match kind {
            ItemKind::Notebook => ItemData::Notebook(Notebook::default()),
            ItemKind::SectionGroup => ItemData::SectionGroup(SectionGroup::default()),
            ItemKind::Section => ItemData::Section(Section::default()),
            ItemKind::Page => ItemData::Page(Page::default()),
        }
    }

    pub fn kind(&self) -> ItemKind {
        match self {
            ItemData::Notebook(_) => ItemKind::Notebook,
            ItemData::SectionGroup(_) => ItemKind::SectionGroup,
            ItemData::Section(_) => ItemKind::Section,
            ItemData::Page(_) => ItemKind::Page,
        }
    }

    /// Sections then section groups for containers, pages for a section,
    /// nothing for a page.
    pub fn children(&self) -> Children<'_> {
        match self {
            ItemData::Notebook(nb) => Children::pair(&nb.sections, &nb.section_groups),
            ItemData::SectionGroup(sg) => Children::pair(&sg.sections, &sg.section_groups),
            ItemData::Section(s) => Children::single(&s.pages),
            ItemData::Page(_) => Children::empty(),
        }
    }

    /// Append `child` to the collection that holds items of `kind`.
    /// Returns false when this variant cannot own such a child.
    pub(crate) fn push_child(&mut self, child: ItemId, kind: ItemKind) -> bool {
        match self.lists_mut() {
            (Some(sections), Some(groups), _) => match kind {
                ItemKind::Section => sections.push(child),
                ItemKind::SectionGroup => groups.push(child),
                _ => return false,
            },
            (_, _, Some(pages)) if kind == ItemKind::Page => pages.push(child),
            _ => return false,
        }
        true
    }

    /// Remove `child` from whichever owned collection is typed for `kind`.
    pub(crate) fn remove_child(&mut self, child: ItemId, kind: ItemKind) -> bool {
        match self.lists_mut() {
            (Some(sections), Some(groups), _) => {
                sections.remove(child, kind) || groups.remove(child, kind)
            }
            (_, _, Some(pages)) => pages.remove(child, kind),
            _ => false,
        }
    }

    /// Empty every owned collection, returning what was in them.
    pub(crate) fn take_children(&mut self) -> Vec<ItemId> {
        let mut taken = Vec::new();
        let (sections, groups, pages) = self.lists_mut();
        for list in [sections, groups, pages].into_iter().flatten() {
            taken.extend(list.iter());
            list.clear();
        }
        taken
    }

    fn lists_mut(
        &mut self,
    ) -> (
        Option<&mut ItemList>,
        Option<&mut ItemList>,
        Option<&mut ItemList>,
    ) {
        match self {
            ItemData::Notebook(nb) => (Some(&mut nb.sections), Some(&mut nb.section_groups), None),
            ItemData::SectionGroup(sg) => {
                (Some(&mut sg.sections), Some(&mut sg.section_groups), None)
            }
            ItemData::Section(s) => (None, None, Some(&mut s.pages)),
            ItemData::Page(_) => (None, None, None),
        }
    }
}

/// One arena slot's payload: header, parent link and variant data.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub header: ItemHeader,
    pub(crate) parent: Option<ItemId>,
    pub data: ItemData,
}

impl Node {
    pub(crate) fn blank(kind: ItemKind) -> Self {
        Node {
            header: ItemHeader::default(),
            parent: None,
            data: ItemData::blank(kind),
        }
    }

    pub fn kind(&self) -> ItemKind {
        self.data.kind()
    }

    pub fn parent(&self) -> Option<ItemId> {
        self.parent
    }

    pub fn key(&self) -> ItemKey {
        ItemKey {
            kind: self.kind(),
            id: self.header.id.clone(),
        }
    }
}

/// Identity key: two items are the same store item iff kind and id match.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ItemKey {
    pub kind: ItemKind,
    pub id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts() {
        assert!(ItemKind::Notebook.accepts(ItemKind::Section));
        assert!(ItemKind::Notebook.accepts(ItemKind::SectionGroup));
        assert!(!ItemKind::Notebook.accepts(ItemKind::Page));
        assert!(!ItemKind::Notebook.accepts(ItemKind::Notebook));
        assert!(ItemKind::SectionGroup.accepts(ItemKind::SectionGroup));
        assert!(ItemKind::Section.accepts(ItemKind::Page));
        assert!(!ItemKind::Section.accepts(ItemKind::Section));
        assert!(!ItemKind::Page.accepts(ItemKind::Page));
    }

    #[test]
    fn test_element_names() {
        for kind in [
            ItemKind::Notebook,
            ItemKind::SectionGroup,
            ItemKind::Section,
            ItemKind::Page,
        ] {
            assert_eq!(ItemKind::from_element_name(kind.element_name()), Some(kind));
        }
        assert_eq!(ItemKind::from_element_name("OpenSections"), None);
        assert_eq!(ItemKind::from_element_name("notebook"), None);
    }

    #[test]
    fn test_kind_names() {
        assert_eq!(ItemKind::SectionGroup.name(), "section group");
        assert_eq!(ItemKind::Page.to_string(), ItemKind::Page.name());
        assert_eq!(format!("{:>8}", ItemKind::Section), " section");
    }

    #[test]
    fn test_color_display() {
        assert_eq!(Color::new(0xEE, 0x95, 0x97).to_string(), "#EE9597");
        assert_eq!(Color::new(0, 0, 0x0A).to_string(), "#00000A");
    }

    #[test]
    fn test_push_child_routes_by_kind() {
        let mut data = ItemData::blank(ItemKind::Notebook);
        let a = ItemId::from_parts(1, 0);
        let b = ItemId::from_parts(2, 0);
        assert!(data.push_child(a, ItemKind::Section));
        assert!(data.push_child(b, ItemKind::SectionGroup));
        assert!(!data.push_child(b, ItemKind::Page));

        let children: Vec<_> = data.children().iter().collect();
        assert_eq!(children, vec![a, b]);

        // typed removal ignores a mismatched kind
        assert!(!data.remove_child(a, ItemKind::Page));
        assert!(data.remove_child(a, ItemKind::Section));
        assert_eq!(data.children().len(), 1);
    }

    #[test]
    fn test_page_has_no_children() {
        let mut data = ItemData::blank(ItemKind::Page);
        assert!(data.children().is_empty());
        assert!(!data.push_child(ItemId::from_parts(0, 0), ItemKind::Page));
        assert!(data.take_children().is_empty());
    }
}
