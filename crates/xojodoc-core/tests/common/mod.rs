//! Shared fixtures: a temporary corpus of documentation pages.

#![allow(dead_code)]

use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tempfile::TempDir;
use xojodoc_core::{DocConfig, DocLibrary};

/// A property row: name, type, read-only.
pub type PropertyRow<'a> = (&'a str, &'a str, bool);
/// A method row: name, parameters, return type.
pub type MethodRow<'a> = (&'a str, &'a str, &'a str);

/// Render a Sphinx-style class page.
pub fn class_page(
    name: &str,
    description: &str,
    properties: &[PropertyRow<'_>],
    methods: &[MethodRow<'_>],
) -> String {
    let property_rows: String = properties
        .iter()
        .map(|(prop, type_name, read_only)| {
            format!(
                "<tr><td>{}</td><td>{}</td><td>{}</td><td></td></tr>\n",
                prop,
                type_name,
                if *read_only { "&#10004;" } else { "" }
            )
        })
        .collect();
    let method_rows: String = methods
        .iter()
        .map(|(method, parameters, returns)| {
            format!(
                "<tr><td>{}</td><td>{}</td><td>{}</td><td></td></tr>\n",
                method, parameters, returns
            )
        })
        .collect();

    format!(
        r##"<!DOCTYPE html>
<html>
<head><title>{name} &#8212; Xojo documentation</title></head>
<body>
<div class="body" role="main">
<section id="{id}">
<h1>{name}<a class="headerlink" href="#{id}">¶</a></h1>
<section id="description">
<h2>Description</h2>
<p>{description}</p>
</section>
<section id="properties">
<h2>Properties</h2>
<table class="docutils">
<thead><tr><th>Name</th><th>Type</th><th>Read-only</th><th>Shared</th></tr></thead>
<tbody>
{property_rows}</tbody>
</table>
</section>
<section id="methods">
<h2>Methods</h2>
<table class="docutils">
<thead><tr><th>Name</th><th>Parameters</th><th>Returns</th><th>Shared</th></tr></thead>
<tbody>
{method_rows}</tbody>
</table>
</section>
<section id="sample-code">
<h2>Sample code</h2>
<div class="highlight"><pre>Var x As New {name}
</pre></div>
</section>
</section>
</div>
</body>
</html>
"##,
        name = name,
        id = name.to_lowercase(),
        description = description,
        property_rows = property_rows,
        method_rows = method_rows,
    )
}

/// A corpus directory plus a database path inside one temporary directory.
pub struct Corpus {
    pub temp_dir: TempDir,
    pub docs_root: PathBuf,
    pub database: PathBuf,
}

impl Corpus {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().unwrap();
        let docs_root = temp_dir.path().join("html").join("api");
        std::fs::create_dir_all(&docs_root).unwrap();
        let database = temp_dir.path().join("xojo.db");
        Self {
            temp_dir,
            docs_root,
            database,
        }
    }

    pub fn config(&self) -> DocConfig {
        DocConfig::new(&self.docs_root, &self.database)
    }

    pub fn library(&self) -> DocLibrary {
        DocLibrary::new(self.config())
    }

    pub fn page_path(&self, module: &str, name: &str) -> PathBuf {
        self.config().page_path(module, name)
    }

    /// Write raw page content and give it a fixed, old modification time.
    pub fn write_raw(&self, module: &str, file_name: &str, html: &str) -> PathBuf {
        let dir = self.docs_root.join(module);
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(file_name);
        std::fs::write(&path, html).unwrap();
        set_mtime(&path, SystemTime::UNIX_EPOCH + Duration::from_secs(1_600_000_000));
        path
    }

    /// Write a class page at its conventional path.
    pub fn write_class(
        &self,
        module: &str,
        name: &str,
        description: &str,
        properties: &[PropertyRow<'_>],
        methods: &[MethodRow<'_>],
    ) -> PathBuf {
        let file_name = format!("{}.html", name.to_lowercase());
        self.write_raw(
            module,
            &file_name,
            &class_page(name, description, properties, methods),
        )
    }

    /// The Graphics page: 2 properties and 3 methods.
    pub fn write_graphics(&self) -> PathBuf {
        self.write_class(
            "graphics",
            "Graphics",
            "A Graphics object is used to draw text, lines and pictures.",
            &[("Height", "Integer", true), ("PenSize", "Integer", false)],
            &[
                ("DrawLine", "x1 As Double, y1 As Double, x2 As Double, y2 As Double", ""),
                ("DrawString", "text As String, x As Double, y As Double", ""),
                ("TextWidth", "text As String", "Double"),
            ],
        )
    }
}

/// Move a file's modification time forward by `seconds`.
pub fn advance_mtime(path: &Path, seconds: u64) {
    let current = std::fs::metadata(path).unwrap().modified().unwrap();
    set_mtime(path, current + Duration::from_secs(seconds));
}

fn set_mtime(path: &Path, time: SystemTime) {
    let file = File::options().write(true).open(path).unwrap();
    file.set_modified(time).unwrap();
}
