//! EPUB format handler.

use crate::error::{AppError, Result};
use crate::formats::ContentReader;
use roxmltree::{Document, Node, ParsingOptions};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use zip::ZipArchive;

/// Manifest media types holding readable documents.
const DOCUMENT_MEDIA_TYPES: [&str; 2] = ["application/xhtml+xml", "text/html"];

/// Elements that end a line of text.
const BLOCK_TAGS: [&str; 17] = [
    "p", "div", "h1", "h2", "h3", "h4", "h5", "h6", "li", "tr", "blockquote", "pre", "section",
    "article", "header", "footer", "hr",
];

/// Handler for EPUB files.
pub struct EpubHandler;

/// A content document listed in the OPF manifest.
struct DocumentItem {
    id: String,
    href: String,
}

impl EpubHandler {
    /// Find the OPF file path from container.xml.
    fn find_opf_path(archive: &mut ZipArchive<File>) -> Result<String> {
        let mut container = archive.by_name("META-INF/container.xml")?;
        let mut content = String::new();
        container.read_to_string(&mut content)?;

        let doc = Document::parse(&content)?;

        doc.descendants()
            .find(|n| n.has_tag_name("rootfile"))
            .and_then(|n| n.attribute("full-path"))
            .map(String::from)
            .ok_or_else(|| AppError::InvalidFormat("No rootfile in container.xml".into()))
    }

    /// List manifest document items in manifest order, skipping the navigation document.
    fn document_items(opf: &str) -> Result<Vec<DocumentItem>> {
        let doc = Document::parse(opf)?;

        let items = doc
            .descendants()
            .filter(|n| n.tag_name().name() == "item")
            .filter(|n| {
                n.attribute("media-type")
                    .is_some_and(|t| DOCUMENT_MEDIA_TYPES.contains(&t))
            })
            .filter(|n| {
                !n.attribute("properties")
                    .is_some_and(|p| p.split_whitespace().any(|p| p == "nav"))
            })
            .filter_map(|n| {
                Some(DocumentItem {
                    id: n.attribute("id").unwrap_or_default().to_string(),
                    href: n.attribute("href")?.to_string(),
                })
            })
            .collect();

        Ok(items)
    }

    /// Resolve a manifest href against the OPF directory.
    fn resolve_href(opf_dir: &str, href: &str) -> String {
        let href = href.split('#').next().unwrap_or(href);
        let mut parts: Vec<&str> = opf_dir.split('/').filter(|s| !s.is_empty()).collect();

        for segment in href.split('/') {
            match segment {
                "" | "." => {}
                ".." => {
                    parts.pop();
                }
                _ => parts.push(segment),
            }
        }

        parts.join("/")
    }

    /// Read one archive entry, trying the resolved path first and the raw href second.
    fn read_entry(archive: &mut ZipArchive<File>, opf_dir: &str, href: &str) -> Result<Vec<u8>> {
        let resolved = Self::resolve_href(opf_dir, href);
        let name = if archive.file_names().any(|n| n == resolved) {
            resolved
        } else {
            href.to_string()
        };

        let mut data = Vec::new();
        archive.by_name(&name)?.read_to_end(&mut data)?;
        Ok(data)
    }

    /// Extract the readable text of an XHTML document.
    ///
    /// Documents that are not well-formed XML are returned as-is.
    fn document_text(xhtml: &str) -> String {
        let options = ParsingOptions {
            allow_dtd: true,
            ..ParsingOptions::default()
        };
        let Ok(doc) = Document::parse_with_options(xhtml, options) else {
            return xhtml.to_string();
        };

        let body = doc
            .descendants()
            .find(|n| n.tag_name().name() == "body")
            .unwrap_or_else(|| doc.root_element());

        let mut out = String::new();
        Self::push_text(body, &mut out);
        out.trim().to_string()
    }

    fn push_text(node: Node, out: &mut String) {
        for child in node.children() {
            if child.is_text() {
                let text = child.text().unwrap_or_default();
                if !text.trim().is_empty() {
                    out.push_str(text);
                } else if !out.is_empty() && !out.ends_with(char::is_whitespace) {
                    // Whitespace between inline elements separates words.
                    out.push(' ');
                }
                continue;
            }
            if !child.is_element() {
                continue;
            }

            let name = child.tag_name().name();
            match name {
                "script" | "style" | "head" => continue,
                "br" => {
                    out.push('\n');
                    continue;
                }
                _ => {}
            }

            Self::push_text(child, out);
            if BLOCK_TAGS.contains(&name) && !out.is_empty() && !out.ends_with('\n') {
                out.push('\n');
            }
        }
    }

    /// Concatenate the text of every document item, each followed by a newline.
    fn collect_text(path: &Path, file: File) -> Result<String> {
        let mut archive = ZipArchive::new(file)?;

        let opf_path = Self::find_opf_path(&mut archive)?;
        let opf_dir = opf_path.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("");

        let mut opf_content = String::new();
        archive
            .by_name(&opf_path)?
            .read_to_string(&mut opf_content)?;

        let items = Self::document_items(&opf_content)?;
        let mut content = String::new();

        for item in &items {
            let data = Self::read_entry(&mut archive, opf_dir, &item.href)?;
            let xhtml = String::from_utf8(data).map_err(|e| AppError::Decode {
                path: path.to_path_buf(),
                reason: format!("item {} ({}): {}", item.id, item.href, e.utf8_error()),
            })?;

            content.push_str(&Self::document_text(&xhtml));
            content.push('\n');
        }

        tracing::debug!(
            path = %path.display(),
            documents = items.len(),
            chars = content.len(),
            "Extracted EPUB text"
        );
        Ok(content)
    }
}

impl ContentReader for EpubHandler {
    fn read_text(&self, path: &Path) -> Result<String> {
        let file = File::open(path)?;

        Self::collect_text(path, file).map_err(|e| match e {
            AppError::Decode { .. } => e,
            other => AppError::UnsupportedFormat {
                path: path.to_path_buf(),
                reason: other.to_string(),
            },
        })
    }
}
