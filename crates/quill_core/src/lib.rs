//! Quill core types
//!
//! Foundational value types shared by the Quill crates:
//!
//! - **Geometry**: points, vectors, sizes, rectangles and 2D affine transforms
//! - **Color Model**: validated RGBA colors and the SVG color literal parser
//! - **Styles**: fill rules, line caps/joins and stroke configuration
//!
//! # Example
//!
//! ```rust
//! use quill_core::{parse_color, Affine2D, Point};
//!
//! let gold = parse_color("#ffd700").unwrap();
//! assert_eq!(gold.to_rgba8(), [255, 215, 0, 255]);
//!
//! let t = Affine2D::translation(10.0, 0.0).then(&Affine2D::scale(2.0, 2.0));
//! assert_eq!(t.transform_point(Point::new(1.0, 1.0)), Point::new(12.0, 2.0));
//! ```

pub mod color;
pub mod error;
pub mod geometry;
pub mod stroke;

pub use color::{named_color, parse_color, Color};
pub use error::ColorError;
pub use geometry::{Affine2D, Point, Rect, Size, Vec2};
pub use stroke::{FillRule, LineCap, LineJoin, StrokeStyle};
