//! HTML5 Parser implementation
//!
//! Uses html5ever's RcDom and converts it to our DOM format.

use html5ever::parse_document;
use html5ever::tendril::TendrilSink;
use markup5ever_rcdom::{Handle, NodeData as RcNodeData, RcDom};
use sid_dom::{Document, NodeId};

use crate::ParseError;

/// HTML5 parser
#[derive(Debug, Default)]
pub struct HtmlParser;

impl HtmlParser {
    /// Create a new HTML parser
    pub fn new() -> Self {
        Self
    }

    /// Parse HTML string into a Document
    pub fn parse(&self, html: &str) -> Result<Document, ParseError> {
        self.parse_with_url(html, "about:blank")
    }

    /// Parse HTML with a document URL
    pub fn parse_with_url(&self, html: &str, url: &str) -> Result<Document, ParseError> {
        tracing::debug!("Parsing HTML document: {}", url);

        let dom = parse_document(RcDom::default(), Default::default())
            .from_utf8()
            .read_from(&mut html.as_bytes())?;

        let mut document = Document::empty(url);
        let root = document.root();
        self.convert_node(&dom.document, &mut document, root)?;

        // Find html, head, body elements
        document.finalize();

        tracing::debug!("Parsed {} nodes", document.tree().len());
        Ok(document)
    }

    /// Convert an RcDom node (and its children) under `parent`
    fn convert_node(&self, handle: &Handle, document: &mut Document, parent: NodeId) -> Result<(), ParseError> {
        match &handle.data {
            RcNodeData::Document => {
                for child in handle.children.borrow().iter() {
                    self.convert_node(child, document, parent)?;
                }
            }
            RcNodeData::Doctype { name, .. } => {
                let id = document.create_doctype(name);
                document.append_child(parent, id)?;
            }
            RcNodeData::Text { contents } => {
                let text = contents.borrow().to_string();
                if !text.trim().is_empty() {
                    let id = document.create_text(&text);
                    document.append_child(parent, id)?;
                }
            }
            RcNodeData::Comment { contents } => {
                let id = document.create_comment(contents);
                document.append_child(parent, id)?;
            }
            RcNodeData::Element { name, attrs, .. } => {
                let id = document.create_element(&name.local);
                for attr in attrs.borrow().iter() {
                    document.set_attribute(id, &attr.name.local, &attr.value)?;
                }
                document.append_child(parent, id)?;

                for child in handle.children.borrow().iter() {
                    self.convert_node(child, document, id)?;
                }
            }
            RcNodeData::ProcessingInstruction { .. } => {
                // Ignore processing instructions
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple() {
        let html = "<html><head><title>Test</title></head><body><p>Hello</p></body></html>";
        let doc = HtmlParser::new().parse(html).unwrap();

        assert!(doc.tree().len() > 1, "Expected more than 1 node, got {}", doc.tree().len());
        assert!(doc.body().is_some());
    }

    #[test]
    fn test_parse_fragment() {
        let html = "<div><span>Text</span></div>";
        let doc = HtmlParser::new().parse(html).unwrap();

        // Even fragments get wrapped in html/head/body by html5ever
        let body = doc.body().unwrap();
        assert_eq!(doc.text_content(body), "Text");
    }

    #[test]
    fn test_attributes_kept() {
        let html = r#"<input data-sid="e1" data-sid-action="fill" type="email">"#;
        let doc = HtmlParser::new().parse(html).unwrap();

        let input = doc.query_selector("[data-sid=\"e1\"]").unwrap().unwrap();
        assert_eq!(doc.tag_name(input), Some("input"));
        assert_eq!(doc.get_attribute(input, "data-sid-action"), Some("fill"));
        assert_eq!(doc.get_attribute(input, "type"), Some("email"));
    }
}
