use onetree::HierarchyError;
use onetree::model::{Hierarchy, ItemKind};
use onetree::ops::root_descendants;
use onetree::parse::{DomParser, HierarchyParser, ParserEngine, StreamingParser, write_hierarchy, write_item};
use pretty_assertions::assert_eq;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

fn load_fixture(name: &str) -> String {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures").join(name);
    fs::read_to_string(&path).unwrap_or_else(|e| panic!("Could not read fixture {}: {}", name, e))
}

fn kind_counts(hierarchy: &Hierarchy) -> HashMap<ItemKind, usize> {
    let mut counts = HashMap::new();
    for item in root_descendants(hierarchy) {
        *counts.entry(item.kind()).or_insert(0) += 1;
    }
    counts
}

const NS: &str = "xmlns:one=\"http://schemas.microsoft.com/office/onenote/2013/onenote\"";

fn malformed() -> HierarchyError {
    HierarchyError::MalformedXml(String::new())
}

fn no_element() -> HierarchyError {
    HierarchyError::UnsupportedNodeType(String::new())
}

fn unsupported() -> HierarchyError {
    HierarchyError::UnsupportedElement(String::new())
}

fn same_kind(a: &HierarchyError, b: &HierarchyError) -> bool {
    std::mem::discriminant(a) == std::mem::discriminant(b)
}

// ============================================================================
// Engine equivalence
// ============================================================================

#[test]
fn engines_build_identical_trees() {
    let xml = load_fixture("hierarchy.xml");
    let streamed = StreamingParser.parse_root(&xml).unwrap();
    let loaded = DomParser.parse_root(&xml).unwrap();
    assert_eq!(streamed, loaded);
}

#[test]
fn engines_agree_on_fragments() {
    let xml = load_fixture("hierarchy.xml");
    let full = StreamingParser.parse_root(&xml).unwrap();
    let nb3 = full.root().notebooks()[3];
    let fragment = write_item(&full, nb3).unwrap();

    let mut a = Hierarchy::new();
    let mut b = Hierarchy::new();
    StreamingParser.parse(&mut a, &fragment, None).unwrap();
    DomParser.parse(&mut b, &fragment, None).unwrap();
    assert_eq!(a, b);
}

#[test]
fn engines_normalize_attribute_whitespace() {
    let xml = format!(
        "<one:Section {NS} ID=\"s\" name=\"a\tb\">\r\n  <one:Page ID=\"p\" name=\"line\r\nbreak&#10;kept\"/>\r\n</one:Section>"
    );
    let mut a = Hierarchy::new();
    let mut b = Hierarchy::new();
    let streamed = StreamingParser.parse(&mut a, &xml, None).unwrap();
    DomParser.parse(&mut b, &xml, None).unwrap();
    assert_eq!(a, b);

    let section = a.item(streamed).unwrap();
    assert_eq!(section.name(), "a b");
    let page = a.item(section.children().get(0).unwrap()).unwrap();
    assert_eq!(page.name(), "line break\nkept");
}

#[test]
fn engines_agree_on_errors() {
    let cases = [
        (String::new(), no_element()),
        ("plain text".to_string(), no_element()),
        ("<!-- only a comment -->".to_string(), no_element()),
        ("<?xml version=\"1.0\"?>hello".to_string(), no_element()),
        ("<![CDATA[x]]>".to_string(), no_element()),
        (format!("<one:Notebooks {NS}><one:Notebook ID=\"n\""), malformed()),
        (
            "<one:Notebooks xmlns:one=\"urn:x\"><one:Notebook ID=\"n\"".to_string(),
            malformed(),
        ),
        (
            format!("<one:Notebooks {NS}><one:Notebook ID=\"n\" isUnread=\"maybe\"/></one:Notebooks>"),
            HierarchyError::InvalidAttribute {
                name: String::new(),
                value: String::new(),
            },
        ),
        (
            format!(
                "<one:Notebooks {NS}><one:Notebook ID=\"n\" isUnread=\"maybe\"/><one:Notebook ID=\"m\" ID=\"m\"/></one:Notebooks>"
            ),
            malformed(),
        ),
        (format!("<one:Outline {NS}/>"), unsupported()),
        ("<x:Notebooks xmlns:x=\"urn:not-onenote\"/>".to_string(), unsupported()),
        ("<one:Notebooks ID=\"x\"/>".to_string(), malformed()),
        (format!("<one:Notebooks {NS}/><one:Notebooks {NS}/>"), malformed()),
        (format!("<one:Notebooks {NS}/>trailing"), malformed()),
        (format!("<!DOCTYPE x><one:Notebooks {NS}/>"), malformed()),
    ];
    for (xml, expected) in &cases {
        let streamed = ParserEngine::Streaming.parse_root(xml).unwrap_err();
        let loaded = ParserEngine::Dom.parse_root(xml).unwrap_err();
        assert!(
            same_kind(&streamed, expected) && same_kind(&loaded, expected),
            "unexpected errors for {:?}: {} vs {}",
            xml,
            streamed,
            loaded
        );
    }
}

#[test]
fn engines_agree_on_fragment_errors() {
    let cases = [
        ("<one:Section ID=\"x\" name=\"x\"/>".to_string(), malformed()),
        (
            format!("<one:Section {NS} ID=\"x\" name=\"x\"/><one:Section {NS} ID=\"y\" name=\"y\"/>"),
            malformed(),
        ),
        (
            "<x:Section xmlns:x=\"urn:not-onenote\" ID=\"x\" name=\"x\"/>".to_string(),
            unsupported(),
        ),
        (
            format!("<one:Section {NS} ID=\"x\" name=\"x\"><one:Page ID=\"p\" x:name=\"p\"/></one:Section>"),
            malformed(),
        ),
    ];
    for (xml, expected) in &cases {
        let mut a = Hierarchy::new();
        let mut b = Hierarchy::new();
        let streamed = StreamingParser.parse(&mut a, xml, None).unwrap_err();
        let loaded = DomParser.parse(&mut b, xml, None).unwrap_err();
        assert!(
            same_kind(&streamed, expected) && same_kind(&loaded, expected),
            "unexpected errors for {:?}: {} vs {}",
            xml,
            streamed,
            loaded
        );
        assert!(a.is_empty() && b.is_empty());
    }
}

#[test]
fn engines_skip_foreign_namespaces_alike() {
    let xml = format!(
        "<one:Notebooks {NS} xmlns:x=\"urn:not-onenote\">\
           <x:Notebook ID=\"foreign\" name=\"foreign\"/>\
           <one:Notebook ID=\"n\" name=\"n\">\
             <x:Section ID=\"fs\" name=\"fs\"/>\
             <one:Section ID=\"s\" name=\"s\"><Page ID=\"bare\" name=\"bare\"/></one:Section>\
           </one:Notebook>\
         </one:Notebooks>"
    );
    let streamed = StreamingParser.parse_root(&xml).unwrap();
    let loaded = DomParser.parse_root(&xml).unwrap();
    assert_eq!(streamed, loaded);
    assert_eq!(streamed.len(), 2);
}

// ============================================================================
// Counts and XML round-trip
// ============================================================================

#[test]
fn fixture_kind_counts() {
    let xml = load_fixture("hierarchy.xml");
    let h = StreamingParser.parse_root(&xml).unwrap();
    let counts = kind_counts(&h);
    assert_eq!(counts[&ItemKind::Notebook], 4);
    assert_eq!(counts[&ItemKind::SectionGroup], 7);
    assert_eq!(counts[&ItemKind::Section], 22);
    assert_eq!(counts[&ItemKind::Page], 31);
    assert_eq!(h.len(), 64);
}

#[test]
fn round_trip_preserves_counts() {
    let xml = load_fixture("hierarchy.xml");
    for engine in [ParserEngine::Streaming, ParserEngine::Dom] {
        let original = engine.parse_root(&xml).unwrap();
        let rewritten = write_hierarchy(&original);
        let reparsed = engine.parse_root(&rewritten).unwrap();
        assert_eq!(kind_counts(&reparsed), kind_counts(&original));
    }
}

#[test]
fn round_trip_is_lossless_for_tracked_fields() {
    let xml = load_fixture("hierarchy.xml");
    let original = StreamingParser.parse_root(&xml).unwrap();
    let rewritten = write_hierarchy(&original);
    assert_eq!(DomParser.parse_root(&rewritten).unwrap(), original);
    // writing is deterministic
    assert_eq!(write_hierarchy(&StreamingParser.parse_root(&rewritten).unwrap()), rewritten);
}
