//! Compile Markdown sources into a single book: one HTML page, a PDF
//! rendered from it, or an EPUB 3 package.

pub mod assemble;
pub mod config;
pub mod epub;
pub mod error;
pub mod markup;
pub mod render;
pub mod source;
pub mod util;
