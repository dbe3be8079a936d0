use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::model::{Hierarchy, ItemData, ItemKind, ItemRef, PathConfig};
use crate::ops::item_ops;

// ---------------------------------------------------------------------------
// JSON output structs
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct ItemJson {
    pub kind: ItemKind,
    pub id: String,
    pub name: String,
    pub path: String,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub unread: bool,
    pub last_modified: DateTime<Utc>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ItemJson>,
}

#[derive(Serialize)]
pub struct TreeJson {
    pub notebooks: Vec<ItemJson>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub open_sections: Vec<ItemJson>,
}

#[derive(Serialize, Default, Debug, PartialEq)]
pub struct StatsJson {
    pub notebooks: usize,
    pub section_groups: usize,
    pub sections: usize,
    pub pages: usize,
}

#[derive(Serialize)]
pub struct PageJson {
    pub id: String,
    pub name: String,
    pub path: String,
    pub level: u32,
    pub created: DateTime<Utc>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub in_recycle_bin: bool,
}

// ---------------------------------------------------------------------------
// Conversion
// ---------------------------------------------------------------------------

fn relative_path(item: ItemRef<'_>, paths: &PathConfig) -> String {
    item_ops::relative_path(item, paths.use_display_name, &paths.separator)
}

/// One item without its children.
pub fn item_to_json(item: ItemRef<'_>, paths: &PathConfig) -> ItemJson {
    ItemJson {
        kind: item.kind(),
        id: item.id().to_string(),
        name: item.name().to_string(),
        path: relative_path(item, paths),
        unread: item.is_unread(),
        last_modified: item.last_modified(),
        children: Vec::new(),
    }
}

pub fn subtree_to_json(item: ItemRef<'_>, paths: &PathConfig) -> ItemJson {
    let hierarchy = item.hierarchy();
    let mut json = item_to_json(item, paths);
    json.children = item
        .children()
        .iter()
        .filter_map(|id| hierarchy.get(id))
        .map(|child| subtree_to_json(child, paths))
        .collect();
    json
}

pub fn tree_to_json(hierarchy: &Hierarchy, paths: &PathConfig) -> TreeJson {
    let root = hierarchy.root();
    let convert = |ids: &crate::model::ItemList| -> Vec<ItemJson> {
        ids.iter()
            .filter_map(|id| hierarchy.get(id))
            .map(|item| subtree_to_json(item, paths))
            .collect()
    };
    TreeJson {
        notebooks: convert(root.notebooks()),
        open_sections: root.open_sections().map(|open| convert(open.sections())).unwrap_or_default(),
    }
}

pub fn page_to_json(page: ItemRef<'_>, paths: &PathConfig) -> Option<PageJson> {
    let data = page.as_page()?;
    Some(PageJson {
        id: page.id().to_string(),
        name: page.name().to_string(),
        path: relative_path(page, paths),
        level: data.level,
        created: data.created,
        in_recycle_bin: data.is_in_recycle_bin,
    })
}

/// Tally items by kind.
pub fn count_kinds<'h>(items: impl Iterator<Item = ItemRef<'h>>) -> StatsJson {
    let mut stats = StatsJson::default();
    for item in items {
        match item.kind() {
            ItemKind::Notebook => stats.notebooks += 1,
            ItemKind::SectionGroup => stats.section_groups += 1,
            ItemKind::Section => stats.sections += 1,
            ItemKind::Page => stats.pages += 1,
        }
    }
    stats
}

// ---------------------------------------------------------------------------
// Human-readable formatting
// ---------------------------------------------------------------------------

fn kind_char(kind: ItemKind) -> char {
    match kind {
        ItemKind::Notebook => 'N',
        ItemKind::SectionGroup => 'G',
        ItemKind::Section => 'S',
        ItemKind::Page => 'P',
    }
}

/// Format a single item as a one-line summary
pub fn format_item_line(item: ItemRef<'_>) -> String {
    let mut line = format!("[{}] ", kind_char(item.kind()));
    match item.data() {
        ItemData::Notebook(nb) if !nb.display_name.is_empty() && nb.display_name != item.name() => {
            line.push_str(&format!("{} ({})", nb.display_name, item.name()));
        }
        _ => line.push_str(item.name()),
    }

    let mut flags = Vec::new();
    if let Some(section) = item.as_section() {
        if section.is_locked {
            flags.push("locked");
        }
        if section.is_encrypted {
            flags.push("encrypted");
        }
    }
    if item_ops::is_in_recycle_bin(item) {
        flags.push("recycle bin");
    }
    if item.is_unread() {
        flags.push("unread");
    }
    if !flags.is_empty() {
        line.push_str(&format!(" <{}>", flags.join(", ")));
    }
    line
}

/// Format an item with its descendants, indented two spaces per level
pub fn format_item_tree(item: ItemRef<'_>, indent: usize) -> Vec<String> {
    let hierarchy = item.hierarchy();
    let mut lines = vec![format!("{}{}", "  ".repeat(indent), format_item_line(item))];
    for child in item.children().iter().filter_map(|id| hierarchy.get(id)) {
        lines.extend(format_item_tree(child, indent + 1));
    }
    lines
}

pub fn format_tree(hierarchy: &Hierarchy) -> Vec<String> {
    let root = hierarchy.root();
    let mut lines = Vec::new();
    for notebook in root.notebooks().iter().filter_map(|id| hierarchy.get(id)) {
        lines.extend(format_item_tree(notebook, 0));
    }
    if let Some(open) = root.open_sections() {
        lines.push("Open sections".to_string());
        for section in open.sections().iter().filter_map(|id| hierarchy.get(id)) {
            lines.extend(format_item_tree(section, 1));
        }
    }
    lines
}

pub fn format_stats(stats: &StatsJson) -> Vec<String> {
    [
        ("notebooks", stats.notebooks),
        ("section groups", stats.section_groups),
        ("sections", stats.sections),
        ("pages", stats.pages),
    ]
    .into_iter()
    .map(|(label, count)| format!("{:<16}{:>5}", label, count))
    .collect()
}
