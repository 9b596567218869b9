//! Presentation of a [`RenderBlock`](crate::RenderBlock) tree.
//!
//! The block tree is plain data and can be shown by any front end.  This
//! module contains one such front end, [`text_renderer`], which lays the
//! blocks out as wrapped lines of text annotated by a pluggable
//! [`TextDecorator`](text_renderer::TextDecorator).

pub mod text_renderer;
