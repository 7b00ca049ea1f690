//! Minimal element tree for the Matroska tag and chapter documents.

use std::path::Path;

use anyhow::{Context, Result};
use quick_xml::Writer;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};

const DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="no"?>"#;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct XmlElement {
    pub name: String,
    pub text: Option<String>,
    pub children: Vec<XmlElement>,
}

impl XmlElement {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: None,
            children: Vec::new(),
        }
    }

    pub fn with_text(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: Some(text.into()),
            children: Vec::new(),
        }
    }

    /// Append `child` and return it for further nesting.
    pub fn push(&mut self, child: XmlElement) -> &mut XmlElement {
        self.children.push(child);
        let last = self.children.len() - 1;
        &mut self.children[last]
    }

    pub fn push_text(&mut self, name: impl Into<String>, text: impl Into<String>) {
        self.children.push(XmlElement::with_text(name, text));
    }

    pub fn find(&self, name: &str) -> impl Iterator<Item = &XmlElement> + '_ {
        let name = name.to_string();
        self.children.iter().filter(move |c| c.name == name)
    }

    fn write_to(&self, writer: &mut Writer<Vec<u8>>) -> Result<()> {
        writer
            .write_event(Event::Start(BytesStart::new(self.name.as_str())))
            .with_context(|| format!("write <{}>", self.name))?;
        if let Some(text) = &self.text {
            writer
                .write_event(Event::Text(BytesText::new(text)))
                .with_context(|| format!("write text of <{}>", self.name))?;
        }
        for child in &self.children {
            child.write_to(writer)?;
        }
        writer
            .write_event(Event::End(BytesEnd::new(self.name.as_str())))
            .with_context(|| format!("write </{}>", self.name))?;
        Ok(())
    }
}

/// Serialize `root` with the XML declaration and a `<!DOCTYPE root SYSTEM "dtd">` line.
pub fn to_document(root: &XmlElement, dtd: &str) -> Result<String> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    root.write_to(&mut writer)?;
    let body = String::from_utf8(writer.into_inner()).context("XML is not UTF-8")?;
    Ok(format!(
        "{DECLARATION}\n<!DOCTYPE {} SYSTEM \"{dtd}\">\n{body}\n",
        root.name
    ))
}

pub fn write_document(path: &Path, root: &XmlElement, dtd: &str) -> Result<()> {
    let document = to_document(root, dtd)?;
    std::fs::write(path, document).with_context(|| format!("write {:?}", path))?;
    tracing::info!(path = %path.display(), root = %root.name, "wrote XML document");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_has_declaration_and_doctype() {
        let mut root = XmlElement::new("Tags");
        let tag = root.push(XmlElement::new("Tag"));
        tag.push_text("Name", "R&B");
        let text = to_document(&root, "matroskatags.dtd").unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some(r#"<?xml version="1.0" encoding="UTF-8" standalone="no"?>"#)
        );
        assert_eq!(
            lines.next(),
            Some(r#"<!DOCTYPE Tags SYSTEM "matroskatags.dtd">"#)
        );
        assert_eq!(lines.next(), Some("<Tags>"));
        assert!(text.contains("<Name>R&amp;B</Name>"));
        assert!(text.ends_with("</Tags>\n"));
    }

    #[test]
    fn children_keep_insertion_order() {
        let mut root = XmlElement::new("Root");
        root.push_text("B", "2");
        root.push_text("A", "1");
        root.push_text("B", "3");
        let names: Vec<_> = root.children.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["B", "A", "B"]);
        let texts: Vec<_> = root.find("B").filter_map(|c| c.text.as_deref()).collect();
        assert_eq!(texts, ["2", "3"]);
    }
}
