//! Streaming markup scanning
//!
//! Pages are never parsed into a document tree. A [`Lexer`] pulls tokens
//! out of the html5ever tokenizer chunk by chunk, and a [`TagCursor`] layers
//! the handful of moves every extraction step needs on top of it:
//! - find the next tag with a given name and attribute value
//! - read the text that follows the current position
//! - read all text up to the close of the current element

mod cursor;
mod lexer;

pub use cursor::TagCursor;
pub use lexer::{LexError, Lexer, Tag, Token};
