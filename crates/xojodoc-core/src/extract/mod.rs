//! Page extraction.
//!
//! Turns one documentation page into a [`ClassRecord`] plus its properties and methods.
//! The page is first reduced to [`PageFields`], a fixed set of optional fields where
//! `None` means the field could not be located. Only a page with both a name and a
//! module becomes an [`ExtractedPage`]; anything else is reported as "no data".
//!
//! Extraction never fails: malformed sections are skipped one by one.

mod members;
mod text;

use crate::error::{DocError, Result};
use crate::models::{ClassRecord, MethodRecord, PropertyRecord};
use members::{legacy_methods, legacy_properties, ColumnMap, MemberKind, MemberTable};
use scraper::{ElementRef, Html, Selector};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::LazyLock;
use text::{code_text, element_text, has_ancestor, heading_text, non_empty, slug};
use tracing::debug;

static TITLE_HEADING: LazyLock<Selector> = LazyLock::new(|| Selector::parse("h1").unwrap());
static SECTION: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("section, div.section").unwrap());
static PARAGRAPH: LazyLock<Selector> = LazyLock::new(|| Selector::parse("p").unwrap());
static CODE_BLOCK: LazyLock<Selector> = LazyLock::new(|| Selector::parse("pre").unwrap());
static TABLE: LazyLock<Selector> = LazyLock::new(|| Selector::parse("table").unwrap());
static MODULE_META: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"meta[name="module"]"#).unwrap());
static MODULE_HINT: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("[data-module], .module, .subtitle").unwrap());
static LEGACY_PROPERTIES: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(".properties").unwrap());
static LEGACY_METHODS: LazyLock<Selector> = LazyLock::new(|| Selector::parse(".methods").unwrap());

/// Elements whose paragraphs are never the class description.
const NON_NARRATIVE_TAGS: &[&str] = &["table", "nav", "header", "footer", "aside"];
/// Classes marking containers whose paragraphs are never the class description.
const NON_NARRATIVE_CLASSES: &[&str] = &[
    "property",
    "method",
    "sidebar",
    "sphinxsidebar",
    "subtitle",
    "module",
];

const PROPERTY_SECTIONS: &[&str] = &["properties"];
const METHOD_SECTIONS: &[&str] = &["methods"];
const DESCRIPTION_SECTIONS: &[&str] = &["description", "overview"];
const SAMPLE_SECTIONS: &[&str] = &["samplecode", "sample", "example", "examples"];
const NOTES_SECTIONS: &[&str] = &["notes"];
const COMPATIBILITY_SECTIONS: &[&str] = &["compatibility"];
/// Sections whose tables look like member tables but list something else.
const NON_MEMBER_SECTIONS: &[&str] = &[
    "events",
    "eventhandlers",
    "constants",
    "enumerations",
    "enums",
    "delegates",
];

/// A fully extracted page: the class and its children.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedPage {
    pub class: ClassRecord,
    pub properties: Vec<PropertyRecord>,
    pub methods: Vec<MethodRecord>,
}

/// Everything the extractor looked for on a page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageFields {
    pub name: Option<String>,
    pub module: Option<String>,
    pub description: Option<String>,
    pub sample_code: Option<String>,
    pub compatibility: Option<String>,
    pub notes: Option<String>,
    pub properties: Vec<PropertyRecord>,
    pub methods: Vec<MethodRecord>,
}

impl PageFields {
    /// Reduce page markup to fields.
    ///
    /// The module comes from the page's directory, or from a module hint element when the
    /// path has no usable parent directory.
    pub fn from_html(html: &str, path: &Path) -> Self {
        let document = Html::parse_document(html);
        let page = Page::new(&document);

        let name = page.class_name();
        let module = module_from_path(path).or_else(|| page.module_hint());
        let class_key = name.as_deref().map(slug).unwrap_or_default();

        let mut properties = page.properties();
        let mut methods = page.methods();
        page.fill_member_details(&class_key, &mut properties, &mut methods);
        let member_keys = member_keys(&class_key, &properties, &methods);

        Self {
            description: page.description(),
            sample_code: page.sample_code(&class_key, &member_keys),
            compatibility: page.section_text(COMPATIBILITY_SECTIONS, " "),
            notes: page.section_text(NOTES_SECTIONS, "\n\n"),
            name,
            module,
            properties,
            methods,
        }
    }

    /// Promote the fields to records, or `None` when name or module is missing.
    pub fn into_page(self, path: &Path) -> Option<ExtractedPage> {
        let name = self.name.filter(|n| !n.is_empty())?;
        let module = self.module.filter(|m| !m.is_empty())?;

        Some(ExtractedPage {
            class: ClassRecord {
                name,
                module,
                description: self.description.unwrap_or_default(),
                sample_code: self.sample_code,
                compatibility: self.compatibility,
                notes: self.notes,
                file_path: path.to_string_lossy().to_string(),
            },
            properties: self.properties,
            methods: self.methods,
        })
    }
}

/// Extract a page from its markup.
pub fn extract_page(html: &str, path: &Path) -> Option<ExtractedPage> {
    let page = PageFields::from_html(html, path).into_page(path);
    if page.is_none() {
        debug!("No class data found in {}", path.display());
    }
    page
}

/// Read and extract a page file.
///
/// Only reading the file can fail; undecodable bytes are replaced rather than rejected.
pub fn extract_file(path: &Path) -> Result<Option<ExtractedPage>> {
    let bytes = std::fs::read(path).map_err(|e| DocError::io_with_path(e, path))?;
    let html = String::from_utf8_lossy(&bytes);
    Ok(extract_page(&html, path))
}

/// Module named by the page's parent directory.
fn module_from_path(path: &Path) -> Option<String> {
    path.parent()
        .and_then(|parent| parent.file_name())
        .map(|name| name.to_string_lossy().trim().to_string())
        .and_then(non_empty)
}

/// Parsed document with its sections indexed by slugged id and heading.
struct Page<'a> {
    document: &'a Html,
    sections: HashMap<String, ElementRef<'a>>,
}

impl<'a> Page<'a> {
    fn new(document: &'a Html) -> Self {
        let mut sections = HashMap::new();
        for section in document.select(&SECTION) {
            if let Some(id) = section.value().id() {
                sections.entry(slug(id)).or_insert(section);
            }
            if let Some(heading) = section_heading(section) {
                sections.entry(slug(&heading)).or_insert(section);
            }
        }
        Self { document, sections }
    }

    fn section(&self, keys: &[&str]) -> Option<ElementRef<'a>> {
        keys.iter().find_map(|key| self.sections.get(*key).copied())
    }

    fn class_name(&self) -> Option<String> {
        self.document
            .select(&TITLE_HEADING)
            .map(heading_text)
            .find(|text| !text.is_empty())
    }

    fn module_hint(&self) -> Option<String> {
        if let Some(meta) = self.document.select(&MODULE_META).next() {
            if let Some(content) = meta.value().attr("content").map(str::trim) {
                if !content.is_empty() {
                    return Some(content.to_string());
                }
            }
        }

        self.document.select(&MODULE_HINT).find_map(|hint| {
            let text = hint
                .value()
                .attr("data-module")
                .map(str::to_string)
                .unwrap_or_else(|| element_text(hint));
            let text = text.trim();
            let text = text
                .strip_suffix(" module")
                .or_else(|| text.strip_suffix(" Module"))
                .unwrap_or(text)
                .trim();
            // A hint is a single identifier such as `desktop`.
            if !text.is_empty() && !text.contains(char::is_whitespace) {
                Some(text.to_string())
            } else {
                None
            }
        })
    }

    fn description(&self) -> Option<String> {
        if let Some(section) = self.section(DESCRIPTION_SECTIONS) {
            if let Some(text) = first_paragraph(section) {
                return Some(text);
            }
        }

        self.document
            .select(&PARAGRAPH)
            .filter(|p| is_narrative(*p))
            .map(element_text)
            .find(|text| !text.is_empty())
    }

    fn sample_code(&self, class_key: &str, member_keys: &HashSet<String>) -> Option<String> {
        if let Some(section) = self.section(SAMPLE_SECTIONS) {
            if let Some(code) = section.select(&CODE_BLOCK).find_map(code_text) {
                return Some(code);
            }
        }

        // Code inside member details belongs to that member.
        self.document
            .select(&CODE_BLOCK)
            .filter(|pre| !in_member_detail(*pre, class_key, member_keys))
            .filter(|pre| !has_ancestor(*pre, &["table"]))
            .find_map(code_text)
    }

    fn section_text(&self, keys: &[&str], separator: &str) -> Option<String> {
        let section = self.section(keys)?;
        let paragraphs: Vec<String> = section
            .select(&PARAGRAPH)
            .map(element_text)
            .filter(|text| !text.is_empty())
            .collect();
        if !paragraphs.is_empty() {
            return Some(paragraphs.join(separator));
        }

        // Bare text directly under the section, minus its heading.
        let heading = section_heading(section).unwrap_or_default();
        let text = element_text(section);
        let text = text.strip_prefix(heading.as_str()).unwrap_or(text.as_str()).trim();
        non_empty(text.to_string())
    }

    fn properties(&self) -> Vec<PropertyRecord> {
        if let Some(table) = self.member_table(PROPERTY_SECTIONS, MemberKind::Property) {
            return MemberTable::read(table).properties();
        }
        self.document
            .select(&LEGACY_PROPERTIES)
            .next()
            .map(legacy_properties)
            .unwrap_or_default()
    }

    fn methods(&self) -> Vec<MethodRecord> {
        if let Some(table) = self.member_table(METHOD_SECTIONS, MemberKind::Method) {
            return MemberTable::read(table).methods();
        }
        self.document
            .select(&LEGACY_METHODS)
            .next()
            .map(legacy_methods)
            .unwrap_or_default()
    }

    /// The summary table for a member kind: first table in its section, or else the
    /// first headed table whose columns identify that kind outside event, constant and
    /// enumeration sections.
    fn member_table(&self, keys: &[&str], kind: MemberKind) -> Option<ElementRef<'a>> {
        if let Some(section) = self.section(keys) {
            if let Some(table) = section.select(&TABLE).next() {
                return Some(table);
            }
        }

        self.document.select(&TABLE).find(|table| {
            if in_non_member_section(*table) {
                return false;
            }
            let headers = MemberTable::read(*table).headers;
            !headers.is_empty() && ColumnMap::from_headers(&headers).kind() == Some(kind)
        })
    }

    /// Fill blank member descriptions (and method samples) from per-member detail sections.
    fn fill_member_details(
        &self,
        class_key: &str,
        properties: &mut [PropertyRecord],
        methods: &mut [MethodRecord],
    ) {
        for property in properties.iter_mut() {
            if property.description.is_some() {
                continue;
            }
            if let Some(section) = self.member_section(class_key, &property.name) {
                property.description = first_paragraph(section);
            }
        }

        for method in methods.iter_mut() {
            let Some(section) = self.member_section(class_key, &method.name) else {
                continue;
            };
            if method.description.is_none() {
                method.description = first_paragraph(section);
            }
            if method.sample_code.is_none() {
                method.sample_code = section.select(&CODE_BLOCK).find_map(code_text);
            }
        }
    }

    fn member_section(&self, class_key: &str, member: &str) -> Option<ElementRef<'a>> {
        let member_key = slug(member);
        if class_key.is_empty() || member_key.is_empty() {
            return None;
        }
        self.sections
            .get(&format!("{}{}", class_key, member_key))
            .copied()
    }
}

fn section_heading(section: ElementRef<'_>) -> Option<String> {
    section
        .children()
        .filter_map(ElementRef::wrap)
        .find(|child| matches!(child.value().name(), "h1" | "h2" | "h3" | "h4"))
        .map(heading_text)
}

fn first_paragraph(section: ElementRef<'_>) -> Option<String> {
    section
        .select(&PARAGRAPH)
        .filter(|p| !has_ancestor(*p, &["table"]))
        .map(element_text)
        .find(|text| !text.is_empty())
}

fn is_narrative(paragraph: ElementRef<'_>) -> bool {
    if paragraph
        .value()
        .classes()
        .any(|class| NON_NARRATIVE_CLASSES.contains(&class))
    {
        return false;
    }
    !paragraph.ancestors().any(|node| {
        node.value().as_element().is_some_and(|element| {
            NON_NARRATIVE_TAGS.contains(&element.name())
                || element
                    .classes()
                    .any(|class| NON_NARRATIVE_CLASSES.contains(&class))
        })
    })
}

/// Detail-section keys (`<class><member>` slugs) for every extracted member.
fn member_keys(
    class_key: &str,
    properties: &[PropertyRecord],
    methods: &[MethodRecord],
) -> HashSet<String> {
    if class_key.is_empty() {
        return HashSet::new();
    }
    properties
        .iter()
        .map(|p| slug(&p.name))
        .chain(methods.iter().map(|m| slug(&m.name)))
        .filter(|key| !key.is_empty())
        .map(|key| format!("{}{}", class_key, key))
        .collect()
}

/// Whether `element` sits in a member's detail section.
///
/// A detail section either carries the id of a known member or is headed
/// `<Class>.<Member>`.
fn in_member_detail(
    element: ElementRef<'_>,
    class_key: &str,
    member_keys: &HashSet<String>,
) -> bool {
    if class_key.is_empty() {
        return false;
    }
    element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .any(|ancestor| {
            if ancestor.value().id().is_some_and(|id| member_keys.contains(&slug(id))) {
                return true;
            }
            section_heading(ancestor)
                .and_then(|heading| {
                    heading
                        .split_once('.')
                        .map(|(class, member)| slug(class) == class_key && !slug(member).is_empty())
                })
                .unwrap_or(false)
        })
}

fn in_non_member_section(element: ElementRef<'_>) -> bool {
    element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .filter(|ancestor| {
            ancestor.value().name() == "section" || ancestor.value().classes().any(|c| c == "section")
        })
        .any(|section| {
            let by_id = section.value().id().map(slug);
            let by_heading = section_heading(section).map(|heading| slug(&heading));
            [by_id, by_heading]
                .into_iter()
                .flatten()
                .any(|key| NON_MEMBER_SECTIONS.contains(&key.as_str()))
        })
}
