//! Incremental HTML lexer
//!
//! Wraps the html5ever tokenizer behind a pull interface. Input bytes are
//! decoded and fed to the tokenizer one chunk at a time, only when the token
//! queue runs dry, so scanning stops consuming the document as soon as the
//! caller stops asking for tokens. No tree is ever built.

use html5ever::tendril::StrTendril;
use html5ever::tokenizer::states::RawKind;
use html5ever::tokenizer::{
    BufferQueue, Tag as RawTag, TagKind, Token as RawToken, TokenSink, TokenSinkResult,
    Tokenizer, TokenizerOpts,
};
use std::collections::{HashMap, VecDeque};
use thiserror::Error;

/// Bytes handed to the tokenizer per refill
const CHUNK_SIZE: usize = 8 * 1024;

/// The body ends in the middle of a multi-byte character
///
/// Happens when the transport cuts a body short. Everything before `offset`
/// has already been delivered as tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("markup is cut off mid-character at byte {offset}")]
pub struct LexError {
    pub offset: usize,
}

/// An opening (or self-closing) tag with its attributes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    name: String,
    attrs: HashMap<String, String>,
}

impl Tag {
    pub fn new(name: impl Into<String>, attrs: HashMap<String, String>) -> Self {
        Self {
            name: name.into(),
            attrs,
        }
    }

    /// Lowercase tag name
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(String::as_str)
    }

    /// True for `<name attr="value">`
    pub fn matches(&self, name: &str, attr: &str, value: &str) -> bool {
        self.name == name && self.attr(attr) == Some(value)
    }
}

/// One lexical unit of a page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Open(Tag),
    SelfClosing(Tag),
    Close(String),
    Text(String),
    Comment,
    EndOfStream,
}

impl Token {
    /// The tag carried by an opening or self-closing token
    pub fn as_tag(&self) -> Option<&Tag> {
        match self {
            Token::Open(tag) | Token::SelfClosing(tag) => Some(tag),
            _ => None,
        }
    }
}

/// Collects converted tokens and drives raw-text states
///
/// Without a tree builder the tokenizer cannot know that `<script>` content
/// is opaque, so the sink tells it, the same way the tree builder would.
#[derive(Default)]
struct QueueSink {
    tokens: VecDeque<Token>,
}

impl TokenSink for QueueSink {
    type Handle = ();

    fn process_token(&mut self, token: RawToken, _line_number: u64) -> TokenSinkResult<()> {
        match token {
            RawToken::TagToken(tag) => return self.push_tag(tag),
            RawToken::CharacterTokens(text) => self.push_text(&text),
            RawToken::NullCharacterToken => self.push_text("\u{FFFD}"),
            RawToken::CommentToken(_) => self.tokens.push_back(Token::Comment),
            // Doctypes, recoverable parse errors and the tokenizer's own EOF
            // carry nothing the scanners look at.
            RawToken::DoctypeToken(_) | RawToken::ParseError(_) | RawToken::EOFToken => {}
        }
        TokenSinkResult::Continue
    }
}

impl QueueSink {
    fn push_text(&mut self, text: &str) {
        if let Some(Token::Text(existing)) = self.tokens.back_mut() {
            existing.push_str(text);
        } else {
            self.tokens.push_back(Token::Text(text.to_string()));
        }
    }

    fn push_tag(&mut self, tag: RawTag) -> TokenSinkResult<()> {
        let name = tag.name.to_string();

        if tag.kind == TagKind::EndTag {
            self.tokens.push_back(Token::Close(name));
            return TokenSinkResult::Continue;
        }

        let mut attrs = HashMap::with_capacity(tag.attrs.len());
        for attr in tag.attrs {
            attrs
                .entry(attr.name.local.to_string())
                .or_insert_with(|| attr.value.to_string());
        }

        let raw_kind = match name.as_str() {
            _ if tag.self_closing => None,
            "script" => Some(RawKind::ScriptData),
            "style" | "xmp" | "iframe" | "noembed" | "noframes" => Some(RawKind::Rawtext),
            "title" | "textarea" => Some(RawKind::Rcdata),
            _ => None,
        };

        let parsed = Tag::new(name, attrs);
        if tag.self_closing {
            self.tokens.push_back(Token::SelfClosing(parsed));
        } else {
            self.tokens.push_back(Token::Open(parsed));
        }

        match raw_kind {
            Some(kind) => TokenSinkResult::RawData(kind),
            None => TokenSinkResult::Continue,
        }
    }
}

/// Pull lexer over a page body
pub struct Lexer<'a> {
    input: &'a [u8],
    offset: usize,
    tokenizer: Tokenizer<QueueSink>,
    buffer: BufferQueue,
    finished: bool,
    error: Option<LexError>,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a [u8]) -> Self {
        Self {
            input,
            offset: 0,
            tokenizer: Tokenizer::new(QueueSink::default(), TokenizerOpts::default()),
            buffer: BufferQueue::new(),
            finished: false,
            error: None,
        }
    }

    /// Returns the next token
    ///
    /// Adjacent text is always delivered as one `Text` token, even when it
    /// spans refills. After the last token this keeps returning
    /// `EndOfStream`, or the `LexError` that ended the body.
    pub fn next_token(&mut self) -> Result<Token, LexError> {
        loop {
            let queue = &self.tokenizer.sink.tokens;
            // A lone trailing text run may continue in the next chunk
            let text_may_continue =
                !self.finished && queue.len() == 1 && matches!(queue.front(), Some(Token::Text(_)));

            if !text_may_continue {
                if let Some(token) = self.tokenizer.sink.tokens.pop_front() {
                    return Ok(token);
                }

                if self.finished {
                    return match self.error {
                        Some(err) => Err(err),
                        None => Ok(Token::EndOfStream),
                    };
                }
            }

            self.refill();
        }
    }

    /// Feeds the next chunk, or finishes the tokenizer
    ///
    /// Invalid byte sequences decode to U+FFFD. A character split by the
    /// chunk edge is carried into the next chunk; one cut off by the end of
    /// the body is the only decoding failure.
    fn refill(&mut self) {
        if self.offset >= self.input.len() {
            self.finish();
            return;
        }

        let input = self.input;
        let end = (self.offset + CHUNK_SIZE).min(input.len());
        let mut rest = &input[self.offset..end];
        let mut text = String::with_capacity(rest.len());

        let truncated = loop {
            match std::str::from_utf8(rest) {
                Ok(valid) => {
                    text.push_str(valid);
                    self.offset = end;
                    break false;
                }
                Err(err) => {
                    let (valid, after) = rest.split_at(err.valid_up_to());
                    // `valid_up_to` always lands on a char boundary
                    text.push_str(std::str::from_utf8(valid).unwrap_or_default());

                    match err.error_len() {
                        Some(len) => {
                            text.push(char::REPLACEMENT_CHARACTER);
                            rest = &after[len..];
                        }
                        None => {
                            self.offset = end - after.len();
                            break end == input.len();
                        }
                    }
                }
            }
        };

        self.feed(&text);

        if truncated {
            self.error = Some(LexError {
                offset: self.offset,
            });
            self.finish();
        }
    }

    fn feed(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        self.buffer.push_back(StrTendril::from_slice(text));
        let _ = self.tokenizer.feed(&mut self.buffer);
    }

    fn finish(&mut self) {
        self.tokenizer.end();
        self.finished = true;
    }
}
