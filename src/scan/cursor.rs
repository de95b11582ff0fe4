//! Tag cursor: the scanning moves every page protocol is built from

use crate::scan::lexer::{LexError, Lexer, Tag, Token};

/// Forward-only cursor over a page's tokens with one token of pushback
pub struct TagCursor<'a> {
    lexer: Lexer<'a>,
    pending: Option<Token>,
    tokens_read: usize,
}

impl<'a> TagCursor<'a> {
    pub fn new(input: &'a [u8]) -> Self {
        Self {
            lexer: Lexer::new(input),
            pending: None,
            tokens_read: 0,
        }
    }

    /// Next token, honouring a pushed-back one first
    pub fn next(&mut self) -> Result<Token, LexError> {
        if let Some(token) = self.pending.take() {
            return Ok(token);
        }
        let token = self.lexer.next_token()?;
        self.tokens_read += 1;
        Ok(token)
    }

    /// Returns a token so the next call to [`next`](Self::next) yields it again
    pub fn push_back(&mut self, token: Token) {
        debug_assert!(self.pending.is_none(), "only one token of pushback");
        self.pending = Some(token);
    }

    /// Number of tokens pulled from the lexer so far
    pub fn tokens_read(&self) -> usize {
        self.tokens_read
    }

    /// Advances to the next opening or self-closing tag
    ///
    /// Returns `None` at end of stream.
    pub fn next_open_tag(&mut self) -> Result<Option<Tag>, LexError> {
        loop {
            match self.next()? {
                Token::Open(tag) | Token::SelfClosing(tag) => return Ok(Some(tag)),
                Token::EndOfStream => return Ok(None),
                _ => {}
            }
        }
    }

    /// Advances past the first `<name attr="value">`
    ///
    /// Returns `None` when the stream ends first.
    pub fn find_tag_with_attr(
        &mut self,
        name: &str,
        attr: &str,
        value: &str,
    ) -> Result<Option<Tag>, LexError> {
        while let Some(tag) = self.next_open_tag()? {
            if tag.matches(name, attr, value) {
                return Ok(Some(tag));
            }
        }
        Ok(None)
    }

    /// Reads the text directly following the current position, trimmed
    ///
    /// Stops at (and leaves in place) the first token that is not text.
    pub fn read_text(&mut self) -> Result<String, LexError> {
        let mut text = String::new();
        loop {
            match self.next()? {
                Token::Text(chunk) => text.push_str(&chunk),
                other => {
                    self.push_back(other);
                    return Ok(text.trim().to_string());
                }
            }
        }
    }

    /// Finds `<name attr="value">` and reads the text right after it
    pub fn read_text_from_tag_with_attr(
        &mut self,
        name: &str,
        attr: &str,
        value: &str,
    ) -> Result<Option<String>, LexError> {
        match self.find_tag_with_attr(name, attr, value)? {
            Some(_) => self.read_text().map(Some),
            None => Ok(None),
        }
    }

    /// Reads all text up to the close of the element just opened, trimmed
    ///
    /// Nested elements with the same name are balanced. `<br>` and the end
    /// of a `<p>` become line breaks; other markup contributes only its
    /// text. Returns `None` if the stream ends before the element closes.
    pub fn read_text_until_close(&mut self, name: &str) -> Result<Option<String>, LexError> {
        let mut text = String::new();
        let mut depth = 1usize;

        loop {
            match self.next()? {
                Token::Text(chunk) => text.push_str(&chunk),
                Token::Open(tag) if tag.name() == name => depth += 1,
                Token::Open(tag) | Token::SelfClosing(tag) if tag.name() == "br" => {
                    text.push('\n')
                }
                Token::Close(closed) if closed == name => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(Some(text.trim().to_string()));
                    }
                }
                Token::Close(closed) if closed == "p" => text.push('\n'),
                Token::EndOfStream => return Ok(None),
                _ => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_tag_with_attr() {
        let html = br#"<div id="a"></div><div class="x" id="b">B</div>"#;
        let mut cursor = TagCursor::new(html);
        let tag = cursor.find_tag_with_attr("div", "id", "b").unwrap().unwrap();
        assert_eq!(tag.attr("class"), Some("x"));
        assert_eq!(cursor.read_text().unwrap(), "B");
    }

    #[test]
    fn test_find_tag_missing() {
        let mut cursor = TagCursor::new(br#"<div id="a"></div>"#);
        assert!(cursor.find_tag_with_attr("div", "id", "b").unwrap().is_none());
    }

    #[test]
    fn test_find_is_forward_only() {
        let html = br#"<h1 id="t">Title</h1><p>body</p>"#;
        let mut cursor = TagCursor::new(html);
        assert!(cursor.find_tag_with_attr("p", "id", "none").unwrap().is_none());
        assert!(cursor.find_tag_with_attr("h1", "id", "t").unwrap().is_none());
    }

    #[test]
    fn test_read_text_trims_and_stops_at_markup() {
        let html = b"<h1>\n\t  Lovely Home \n</h1>";
        let mut cursor = TagCursor::new(html);
        cursor.next_open_tag().unwrap();
        assert_eq!(cursor.read_text().unwrap(), "Lovely Home");
        assert_eq!(cursor.next().unwrap(), Token::Close("h1".to_string()));
    }

    #[test]
    fn test_read_text_stops_at_inline_tag() {
        let html = b"<li>Asking <b>$500</b></li>";
        let mut cursor = TagCursor::new(html);
        cursor.next_open_tag().unwrap();
        assert_eq!(cursor.read_text().unwrap(), "Asking");
    }

    #[test]
    fn test_read_text_from_tag_with_attr() {
        let html = br#"<ul><li id="price">$425,000</li></ul>"#;
        let mut cursor = TagCursor::new(html);
        let text = cursor.read_text_from_tag_with_attr("li", "id", "price").unwrap();
        assert_eq!(text.as_deref(), Some("$425,000"));
    }

    #[test]
    fn test_read_text_until_close_balances_nesting() {
        let html = b"<div>One<div>Two</div><br>Three<p>Four</p>Five</div><div>Outside</div>";
        let mut cursor = TagCursor::new(html);
        cursor.next_open_tag().unwrap();
        let text = cursor.read_text_until_close("div").unwrap().unwrap();
        assert_eq!(text, "OneTwo\nThreeFour\nFive");
    }

    #[test]
    fn test_read_text_until_close_unterminated() {
        let mut cursor = TagCursor::new(b"<div>never closed");
        cursor.next_open_tag().unwrap();
        assert!(cursor.read_text_until_close("div").unwrap().is_none());
    }

    #[test]
    fn test_push_back() {
        let mut cursor = TagCursor::new(b"<a></a>");
        let first = cursor.next().unwrap();
        cursor.push_back(first.clone());
        assert_eq!(cursor.next().unwrap(), first);
        assert_eq!(cursor.tokens_read(), 1);
    }
}
