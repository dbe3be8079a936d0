//! Attribute table shared by both parser engines.

use chrono::{DateTime, NaiveDateTime, Utc};

use crate::error::{HierarchyError, Result};
use crate::model::{Color, ItemData, Node};

/// Apply one attribute, by local name, to a node being built.
/// Attributes that do not apply to the node's kind are ignored.
pub(crate) fn apply(node: &mut Node, name: &str, value: &str) -> Result<()> {
    let header = &mut node.header;
    match name {
        "ID" => header.id = value.to_string(),
        "name" => header.name = value.to_string(),
        "isUnread" => header.is_unread = parse_bool(name, value)?,
        "lastModifiedTime" => header.last_modified = parse_timestamp(name, value)?,
        _ => apply_specific(&mut node.data, name, value)?,
    }
    Ok(())
}

fn apply_specific(data: &mut ItemData, name: &str, value: &str) -> Result<()> {
    match data {
        ItemData::Notebook(nb) => match name {
            "nickname" => nb.display_name = value.to_string(),
            "path" => nb.path = value.to_string(),
            "color" => nb.color = parse_color(value)?,
            _ => {}
        },
        ItemData::SectionGroup(sg) => match name {
            "path" => sg.path = value.to_string(),
            "isRecycleBin" => sg.is_recycle_bin = parse_bool(name, value)?,
            _ => {}
        },
        ItemData::Section(s) => match name {
            "path" => s.path = value.to_string(),
            "color" => s.color = parse_color(value)?,
            "encrypted" => s.is_encrypted = parse_bool(name, value)?,
            "locked" => s.is_locked = parse_bool(name, value)?,
            "isInRecycleBin" => s.is_in_recycle_bin = parse_bool(name, value)?,
            "isDeletedPages" => s.is_deleted_pages = parse_bool(name, value)?,
            _ => {}
        },
        ItemData::Page(p) => match name {
            "isInRecycleBin" => p.is_in_recycle_bin = parse_bool(name, value)?,
            "pageLevel" => {
                p.level = value.trim().parse().map_err(|_| invalid(name, value))?
            }
            "dateTime" => p.created = parse_timestamp(name, value)?,
            _ => {}
        },
    }
    Ok(())
}

/// Parse a `#RRGGBB` color. `none` means no color.
pub fn parse_color(value: &str) -> Result<Option<Color>> {
    let value = value.trim();
    if value.eq_ignore_ascii_case("none") {
        return Ok(None);
    }
    let hex = value
        .strip_prefix('#')
        .filter(|h| h.len() == 6 && h.is_ascii())
        .ok_or_else(|| invalid("color", value))?;
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| invalid("color", value));
    Ok(Some(Color::new(channel(0)?, channel(2)?, channel(4)?)))
}

/// Parse an ISO-8601 timestamp. Offsets are honored and normalized to UTC;
/// a value without an offset is taken to be UTC already.
pub fn parse_timestamp(name: &str, value: &str) -> Result<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .map_err(|_| invalid(name, value))
}

/// Parse `true`/`false`, ignoring case.
pub fn parse_bool(name: &str, value: &str) -> Result<bool> {
    let value = value.trim();
    if value.eq_ignore_ascii_case("true") {
        Ok(true)
    } else if value.eq_ignore_ascii_case("false") {
        Ok(false)
    } else {
        Err(invalid(name, value))
    }
}

fn invalid(name: &str, value: &str) -> HierarchyError {
    HierarchyError::InvalidAttribute {
        name: name.to_string(),
        value: value.to_string(),
    }
}
