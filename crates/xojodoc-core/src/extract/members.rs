//! Property and method parsing.
//!
//! Member listings come in two shapes: summary tables (`Name | Type | Read-Only | Shared`,
//! `Name | Parameters | Returns | Shared`) and the older `div.property` / `div.method`
//! blocks. A row that cannot produce a name is dropped on its own.

use super::text::{code_text, element_text, non_empty, normalize_whitespace, slug};
use crate::models::{MethodRecord, PropertyRecord};
use regex::Regex;
use scraper::{ElementRef, Selector};
use std::sync::LazyLock;

static ROW: LazyLock<Selector> = LazyLock::new(|| Selector::parse("tr").unwrap());
static LEGACY_PROPERTY: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(".property").unwrap());
static LEGACY_METHOD: LazyLock<Selector> = LazyLock::new(|| Selector::parse(".method").unwrap());
static LEGACY_NAME: LazyLock<Selector> = LazyLock::new(|| Selector::parse(".name").unwrap());
static LEGACY_TYPE: LazyLock<Selector> = LazyLock::new(|| Selector::parse(".type").unwrap());
static LEGACY_PARAMETERS: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(".parameters, .params").unwrap());
static LEGACY_RETURN: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(".return-type, .returns").unwrap());
static LEGACY_DESCRIPTION: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(".description").unwrap());
static CODE_BLOCK: LazyLock<Selector> = LazyLock::new(|| Selector::parse("pre").unwrap());
static MARKER_IMAGE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("img, [class*=check], [class*=tick]").unwrap());

/// Inline flags written next to a member name, e.g. `Height (read-only)` or `Open [Shared]`.
static NAME_MARKERS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)[\(\[]\s*(read[\s-]?only|shared)\s*[\)\]]").unwrap());

/// Cell texts that mean "not set" in a flag column.
const FALSE_MARKERS: &[&str] = &["no", "false", "0", "none", "na"];
const FALSE_SYMBOLS: &[&str] = &["-", "\u{2013}", "\u{2014}", "\u{2717}", "\u{2718}", "\u{00d7}"];

/// Return-type texts that mean the method returns nothing.
const NO_RETURN: &[&str] = &["", "-", "\u{2013}", "\u{2014}", "none", "nothing", "n/a", "void"];

/// What a member listing describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum MemberKind {
    Property,
    Method,
}

/// Column positions resolved from a table header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct ColumnMap {
    name: Option<usize>,
    type_name: Option<usize>,
    read_only: Option<usize>,
    shared: Option<usize>,
    parameters: Option<usize>,
    return_type: Option<usize>,
    description: Option<usize>,
}

impl ColumnMap {
    /// Map header labels to column roles.
    pub(crate) fn from_headers(headers: &[String]) -> Self {
        let mut map = ColumnMap::default();
        for (idx, header) in headers.iter().enumerate() {
            let slot = match slug(header).as_str() {
                "name" | "property" | "properties" | "method" | "methods" | "member" => {
                    &mut map.name
                }
                "type" | "datatype" => &mut map.type_name,
                "readonly" => &mut map.read_only,
                "shared" | "static" => &mut map.shared,
                "parameters" | "params" | "arguments" => &mut map.parameters,
                "returns" | "returntype" | "return" => &mut map.return_type,
                "description" | "summary" => &mut map.description,
                _ => continue,
            };
            slot.get_or_insert(idx);
        }
        if map.name.is_none() {
            map.name = Some(0);
        }
        map
    }

    /// Conventional column order for tables without a header row.
    pub(crate) fn positional(kind: MemberKind) -> Self {
        match kind {
            MemberKind::Property => ColumnMap {
                name: Some(0),
                type_name: Some(1),
                read_only: Some(2),
                shared: Some(3),
                ..Default::default()
            },
            MemberKind::Method => ColumnMap {
                name: Some(0),
                parameters: Some(1),
                return_type: Some(2),
                shared: Some(3),
                ..Default::default()
            },
        }
    }

    /// Guess what a headed table lists; `None` when it looks like neither.
    pub(crate) fn kind(&self) -> Option<MemberKind> {
        if self.parameters.is_some() || self.return_type.is_some() {
            Some(MemberKind::Method)
        } else if self.type_name.is_some() || self.read_only.is_some() {
            Some(MemberKind::Property)
        } else {
            None
        }
    }
}

/// A table split into header labels and body rows.
pub(crate) struct MemberTable<'a> {
    pub(crate) headers: Vec<String>,
    rows: Vec<(ElementRef<'a>, Vec<ElementRef<'a>>)>,
}

impl<'a> MemberTable<'a> {
    pub(crate) fn read(table: ElementRef<'a>) -> Self {
        let mut headers = Vec::new();
        let mut rows = Vec::new();

        for row in table.select(&ROW) {
            let cells: Vec<ElementRef<'a>> = row
                .children()
                .filter_map(ElementRef::wrap)
                .filter(|cell| matches!(cell.value().name(), "td" | "th"))
                .collect();
            if cells.is_empty() {
                continue;
            }

            let is_header = cells.iter().all(|cell| cell.value().name() == "th");
            if is_header {
                if headers.is_empty() {
                    headers = cells.iter().map(|cell| element_text(*cell)).collect();
                }
                continue;
            }
            rows.push((row, cells));
        }

        Self { headers, rows }
    }

    pub(crate) fn columns(&self, kind: MemberKind) -> ColumnMap {
        if self.headers.is_empty() {
            ColumnMap::positional(kind)
        } else {
            ColumnMap::from_headers(&self.headers)
        }
    }

    pub(crate) fn properties(&self) -> Vec<PropertyRecord> {
        let columns = self.columns(MemberKind::Property);
        self.rows
            .iter()
            .filter_map(|(row, cells)| property_from_row(*row, cells, &columns))
            .collect()
    }

    pub(crate) fn methods(&self) -> Vec<MethodRecord> {
        let columns = self.columns(MemberKind::Method);
        self.rows
            .iter()
            .filter_map(|(row, cells)| method_from_row(*row, cells, &columns))
            .collect()
    }
}

fn cell<'a>(cells: &[ElementRef<'a>], idx: Option<usize>) -> Option<ElementRef<'a>> {
    idx.and_then(|i| cells.get(i).copied())
}

fn cell_text(cells: &[ElementRef<'_>], idx: Option<usize>) -> Option<String> {
    cell(cells, idx).map(element_text).and_then(non_empty)
}

fn property_from_row(
    row: ElementRef<'_>,
    cells: &[ElementRef<'_>],
    columns: &ColumnMap,
) -> Option<PropertyRecord> {
    let name_cell = cell(cells, columns.name)?;
    let marked = NameMarkers::split(&element_text(name_cell));
    let name = member_name(&marked.name)?;

    let mut property = PropertyRecord::new(name);
    property.type_name = cell_text(cells, columns.type_name);
    property.read_only = marked.read_only
        || has_marker_class(row, "readonly")
        || has_marker_class(name_cell, "readonly")
        || cell(cells, columns.read_only).is_some_and(is_flag_set);
    property.shared = marked.shared
        || has_marker_class(row, "shared")
        || has_marker_class(name_cell, "shared")
        || cell(cells, columns.shared).is_some_and(is_flag_set);
    property.description = cell_text(cells, columns.description);
    Some(property)
}

fn method_from_row(
    row: ElementRef<'_>,
    cells: &[ElementRef<'_>],
    columns: &ColumnMap,
) -> Option<MethodRecord> {
    let name_cell = cell(cells, columns.name)?;
    let marked = NameMarkers::split(&element_text(name_cell));
    let (raw_name, inline_parameters) = split_inline_parameters(&marked.name);
    let name = member_name(raw_name)?;

    let mut method = MethodRecord::new(name);
    method.parameters = cell_text(cells, columns.parameters)
        .and_then(|text| parameter_list(&text))
        .or(inline_parameters);
    method.return_type = cell(cells, columns.return_type)
        .map(element_text)
        .and_then(|text| return_type(&text));
    method.shared = marked.shared
        || has_marker_class(row, "shared")
        || has_marker_class(name_cell, "shared")
        || cell(cells, columns.shared).is_some_and(is_flag_set);
    method.description = cell_text(cells, columns.description);
    Some(method)
}

/// Properties listed as `div.property` blocks inside `container`.
pub(crate) fn legacy_properties(container: ElementRef<'_>) -> Vec<PropertyRecord> {
    container
        .select(&LEGACY_PROPERTY)
        .filter_map(|block| {
            let name_el = block.select(&LEGACY_NAME).next()?;
            let marked = NameMarkers::split(&element_text(name_el));
            let name = member_name(&marked.name)?;

            let mut property = PropertyRecord::new(name);
            property.type_name = first_text(block, &LEGACY_TYPE);
            property.read_only = marked.read_only || has_marker_class(block, "readonly");
            property.shared = marked.shared || has_marker_class(block, "shared");
            property.description = first_text(block, &LEGACY_DESCRIPTION);
            Some(property)
        })
        .collect()
}

/// Methods listed as `div.method` blocks inside `container`.
pub(crate) fn legacy_methods(container: ElementRef<'_>) -> Vec<MethodRecord> {
    container
        .select(&LEGACY_METHOD)
        .filter_map(|block| {
            let name_el = block.select(&LEGACY_NAME).next()?;
            let marked = NameMarkers::split(&element_text(name_el));
            let (raw_name, inline_parameters) = split_inline_parameters(&marked.name);
            let name = member_name(raw_name)?;

            let mut method = MethodRecord::new(name);
            method.parameters = first_text(block, &LEGACY_PARAMETERS)
                .and_then(|text| parameter_list(&text))
                .or(inline_parameters);
            method.return_type = block
                .select(&LEGACY_RETURN)
                .next()
                .map(element_text)
                .and_then(|text| return_type(&text));
            method.shared = marked.shared || has_marker_class(block, "shared");
            method.description = first_text(block, &LEGACY_DESCRIPTION);
            method.sample_code = block.select(&CODE_BLOCK).next().and_then(code_text);
            Some(method)
        })
        .collect()
}

fn first_text(element: ElementRef<'_>, selector: &Selector) -> Option<String> {
    element
        .select(selector)
        .next()
        .map(element_text)
        .and_then(non_empty)
}

/// A member name with its inline flag markers removed.
struct NameMarkers {
    name: String,
    read_only: bool,
    shared: bool,
}

impl NameMarkers {
    fn split(text: &str) -> Self {
        let mut read_only = false;
        let mut shared = false;
        for captures in NAME_MARKERS.captures_iter(text) {
            match captures.get(1).map(|m| slug(m.as_str())).as_deref() {
                Some("readonly") => read_only = true,
                Some("shared") => shared = true,
                _ => {}
            }
        }
        let name = normalize_whitespace(&NAME_MARKERS.replace_all(text, " "));
        Self {
            name,
            read_only,
            shared,
        }
    }
}

/// Final member name: last segment of a dotted name, without a trailing `()`.
fn member_name(text: &str) -> Option<String> {
    let text = text.trim().trim_end_matches("()").trim();
    let name = text.rsplit('.').next().unwrap_or(text).trim();
    let valid = name
        .chars()
        .next()
        .is_some_and(|c| c.is_alphanumeric() || c == '_');
    if valid {
        Some(name.to_string())
    } else {
        None
    }
}

/// Split `DrawLine(x As Integer)` into the name and its parameter text.
fn split_inline_parameters(text: &str) -> (&str, Option<String>) {
    match text.find('(') {
        Some(open) if text.trim_end().ends_with(')') => {
            let (name, rest) = text.split_at(open);
            (name, parameter_list(rest))
        }
        _ => (text, None),
    }
}

/// Raw parameter-list text with one pair of enclosing parentheses removed.
fn parameter_list(text: &str) -> Option<String> {
    let text = normalize_whitespace(text);
    let inner = text
        .strip_prefix('(')
        .and_then(|rest| rest.strip_suffix(')'))
        .unwrap_or(&text)
        .trim();
    non_empty(inner.to_string())
}

fn return_type(text: &str) -> Option<String> {
    let text = normalize_whitespace(text);
    let text = text.strip_prefix("As ").unwrap_or(&text).trim();
    if NO_RETURN.contains(&text.to_lowercase().as_str()) {
        None
    } else {
        Some(text.to_string())
    }
}

fn has_marker_class(element: ElementRef<'_>, marker: &str) -> bool {
    element.value().classes().any(|class| slug(class) == marker)
}

/// Whether a flag column cell is set: a check mark, `Yes`, an icon, and so on.
fn is_flag_set(cell: ElementRef<'_>) -> bool {
    let text = element_text(cell);
    if text.is_empty() {
        return cell.select(&MARKER_IMAGE).next().is_some();
    }
    !FALSE_SYMBOLS.contains(&text.as_str()) && !FALSE_MARKERS.contains(&slug(&text).as_str())
}
