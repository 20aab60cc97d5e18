//! SID HTML Parser
//!
//! HTML5 parser built on html5ever. Parses markup and converts it into a
//! `sid-dom` [`Document`].

mod parser;

pub use parser::HtmlParser;
pub use sid_dom::{Document, NodeId};

/// Parse an HTML string into a Document
pub fn parse(html: &str) -> Result<Document, ParseError> {
    HtmlParser::new().parse(html)
}

/// Parse an HTML string with a document URL
pub fn parse_with_url(html: &str, url: &str) -> Result<Document, ParseError> {
    HtmlParser::new().parse_with_url(html, url)
}

/// Parse error
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("failed to read HTML input: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to build document: {0}")]
    Dom(#[from] sid_dom::DomError),
}
