//! XML front end
//!
//! Markup is parsed with `roxmltree`. This module maps its errors onto
//! [`ParseError`], bounds element nesting, and wraps element nodes with
//! the accessors the document builder uses. Names are matched by local
//! part, so `svg:rect` is a `rect` and `xlink:href` is an `href`.

use roxmltree::{Document, Edge, Node, ParsingOptions};

use crate::error::{ParseError, TextPos};

/// Deepest element nesting accepted; deeper documents are malformed
pub(crate) const MAX_DEPTH: usize = 256;

/// Parse source text into a `roxmltree` document
pub(crate) fn parse_tree(src: &str) -> Result<Document<'_>, ParseError> {
    if !src.trim_start().starts_with('<') {
        return Err(ParseError::NotAnSvgDocument);
    }
    let options = ParsingOptions {
        allow_dtd: true,
        ..ParsingOptions::default()
    };
    let doc = Document::parse_with_options(src, options).map_err(|e| match e {
        roxmltree::Error::NoRootNode => ParseError::NotAnSvgDocument,
        e => {
            let pos = e.pos();
            ParseError::MalformedMarkup {
                position: row_col_pos(src, pos.row, pos.col),
                message: e.to_string(),
            }
        }
    })?;
    check_depth(&doc)?;
    Ok(doc)
}

fn check_depth(doc: &Document<'_>) -> Result<(), ParseError> {
    let mut depth = 0usize;
    for edge in doc.root().traverse() {
        match edge {
            Edge::Open(node) if node.is_element() => {
                depth += 1;
                if depth > MAX_DEPTH {
                    return Err(ParseError::MalformedMarkup {
                        position: Element { node }.pos(),
                        message: format!("elements nested deeper than {MAX_DEPTH} levels"),
                    });
                }
            }
            Edge::Close(node) if node.is_element() => depth -= 1,
            _ => {}
        }
    }
    Ok(())
}

/// Position of a byte offset
pub(crate) fn offset_pos(src: &str, offset: usize) -> TextPos {
    let offset = offset.min(src.len());
    let before = src.get(..offset).unwrap_or(src);
    let line_start = before.rfind('\n').map_or(0, |i| i + 1);
    TextPos {
        offset,
        line: before.matches('\n').count() as u32 + 1,
        column: before[line_start..].chars().count() as u32 + 1,
    }
}

/// Position of a 1-based row and character column
fn row_col_pos(src: &str, row: u32, col: u32) -> TextPos {
    let line_start = match row {
        0 | 1 => 0,
        _ => src
            .match_indices('\n')
            .nth(row as usize - 2)
            .map_or(src.len(), |(i, _)| i + 1),
    };
    let offset = src[line_start..]
        .char_indices()
        .nth(col.saturating_sub(1) as usize)
        .map_or(src.len(), |(i, _)| line_start + i);
    TextPos {
        offset,
        line: row.max(1),
        column: col.max(1),
    }
}

/// An element node of the parsed tree
#[derive(Clone, Copy, Debug)]
pub(crate) struct Element<'a, 'input> {
    node: Node<'a, 'input>,
}

impl<'a, 'input: 'a> Element<'a, 'input> {
    /// The document element
    pub fn root(doc: &'a Document<'input>) -> Self {
        Self {
            node: doc.root_element(),
        }
    }

    /// Local element name
    pub fn name(&self) -> &'a str {
        self.node.tag_name().name()
    }

    /// Look up an attribute by local name
    pub fn attr(&self, name: &str) -> Option<&'a str> {
        self.node
            .attributes()
            .find(|a| a.name() == name)
            .map(|a| a.value())
    }

    /// Attributes as `(local name, value)` pairs in source order
    pub fn for_each_attr(&self, mut f: impl FnMut(&'a str, &'a str)) {
        for a in self.node.attributes() {
            f(a.name(), a.value());
        }
    }

    /// Child elements in document order
    pub fn children(&self) -> impl Iterator<Item = Element<'a, 'input>> + 'a {
        self.node
            .children()
            .filter(|n| n.is_element())
            .map(|node| Element { node })
    }

    /// Position of the opening `<`
    pub fn pos(&self) -> TextPos {
        let offset = self.node.range().start;
        let pos = self.node.document().text_pos_at(offset);
        TextPos {
            offset,
            line: pos.row,
            column: pos.col,
        }
    }
}
