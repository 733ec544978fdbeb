//! SVG error and diagnostic types
//!
//! Structural problems abort parsing with a [`ParseError`]. Localized
//! problems such as a bad attribute or an unknown element are absorbed and
//! recorded on the document as [`Diagnostic`]s. Rendering only fails through
//! the checked entry point, with a [`RenderError`].

use std::fmt;

use quill_core::ColorError;
use thiserror::Error;

use crate::path::Segment;

/// Location in the source text
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct TextPos {
    /// Byte offset from the start of the input
    pub offset: usize,
    /// 1-based line number
    pub line: u32,
    /// 1-based column, counted in characters
    pub column: u32,
}

impl fmt::Display for TextPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Structural failures that abort parsing
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    /// The input is empty or whitespace only
    #[error("SVG input is empty")]
    EmptyInput,

    /// The markup is well-formed but its root element is not `<svg>`
    #[error("no root <svg> element found")]
    NotAnSvgDocument,

    /// Unterminated or mismatched tags, bad attribute syntax, bad entities
    #[error("malformed markup at {position} (byte {}): {message}", .position.offset)]
    MalformedMarkup { position: TextPos, message: String },
}

/// Failures of the checked render entry point
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderError {
    /// The output would exceed the pixel budget
    #[error("output size {width}x{height} exceeds the limit of {max} pixels")]
    SizeTooLarge { width: u32, height: u32, max: u64 },
}

/// Kind of failure encountered while interpreting path data
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathErrorKind {
    /// A byte that is not a path command letter where one was expected
    #[error("invalid path command '{0}'")]
    InvalidCommand(char),

    /// A command's coordinate group ended early
    #[error("insufficient operands for path command '{0}'")]
    InsufficientOperands(char),

    /// Path data must begin with a moveto
    #[error("path data must start with a moveto, found '{0}'")]
    MissingMoveTo(char),
}

/// Path data interpretation failure
///
/// Carries the valid prefix of segments built before the failure so the
/// caller can choose between rendering the partial path and discarding it.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{kind} at offset {offset}")]
pub struct PathError {
    pub kind: PathErrorKind,
    /// Byte offset into the path data string
    pub offset: usize,
    /// Segments successfully decoded before the failure
    pub partial: Vec<Segment>,
}

/// A localized problem that was absorbed during parsing
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Diagnostic {
    /// An element the renderer does not support; it was skipped
    #[error("unsupported element <{name}> at {position}")]
    UnsupportedElement { name: String, position: TextPos },

    /// A `d` attribute failed to parse; the shape was dropped
    #[error("invalid path data on <{element}> at {position}: {error}")]
    InvalidPathData {
        element: String,
        position: TextPos,
        error: PathError,
    },

    /// A color or paint value failed to parse; the default was used
    #[error("invalid color '{value}' for {attribute} at {position}: {error}")]
    ColorParseFailure {
        attribute: String,
        value: String,
        position: TextPos,
        error: ColorError,
    },

    /// A paint references a gradient id that does not exist
    #[error("unresolved gradient reference '#{id}'")]
    GradientRefUnresolved { id: String },

    /// An attribute value could not be parsed; the default was used
    #[error("invalid value '{value}' for {attribute} on <{element}> at {position}")]
    InvalidAttribute {
        element: String,
        attribute: String,
        value: String,
        position: TextPos,
    },
}
