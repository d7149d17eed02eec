//! Incremental, literal-aware response receiver.
//!
//! The connection hands over one line at a time. A data line ending in a
//! literal prefix leaves a [`ParsingContext`] behind; the connection then
//! reads the announced number of bytes, passes them to
//! [`ResponseReceiver::receive_literal`] and continues with the next line.

use crate::types::{Condition, Tag};
use crate::{Error, Result};

use super::ImapData;
use super::lexer::{Lexer, Token, find_closing_bracket};
use super::response::{
    ContinuationRequest, DataResponse, DataResponseType, RawCode, Response, ResponseText,
    TaggedStatus, UntaggedStatus,
};

/// Partially parsed data response.
#[derive(Debug)]
struct ParsingContext {
    /// One entry per open parenthesis, plus the top level.
    stack: Vec<Vec<ImapData>>,
    /// Size of the literal that must be received next.
    literal: Option<usize>,
    /// Bytes consumed so far, for error positions.
    consumed: usize,
}

impl ParsingContext {
    fn new() -> Self {
        Self {
            stack: vec![Vec::new()],
            literal: None,
            consumed: 0,
        }
    }

    fn push(&mut self, item: ImapData) {
        if let Some(top) = self.stack.last_mut() {
            top.push(item);
        }
    }

    /// Tokenizes `input` into the open lists.
    fn feed(&mut self, input: &[u8]) -> Result<()> {
        let mut lexer = Lexer::with_offset(input, self.consumed);
        loop {
            match lexer.next_token()? {
                Token::Eof => break,
                Token::Space => {}
                Token::Atom(atom) => self.push(ImapData::Text(atom.to_vec())),
                Token::Quoted(bytes) => self.push(ImapData::Text(bytes)),
                Token::Nil => self.push(ImapData::Nil),
                Token::LParen => self.stack.push(Vec::new()),
                Token::RParen => {
                    if self.stack.len() < 2 {
                        return Err(malformed(lexer.position(), "unexpected ')'"));
                    }
                    let list = self.stack.pop().unwrap_or_default();
                    self.push(ImapData::List(list));
                }
                Token::LiteralPrefix { size, .. } => {
                    self.literal = Some(size);
                    break;
                }
            }
        }
        self.consumed += input.len();
        Ok(())
    }

    /// Closes the context, returning the top-level items.
    fn finish(mut self) -> Result<Vec<ImapData>> {
        if self.stack.len() != 1 {
            return Err(malformed(self.consumed, "unclosed '('"));
        }
        Ok(self.stack.pop().unwrap_or_default())
    }
}

/// Turns response lines into [`Response`] values.
#[derive(Debug, Default)]
pub struct ResponseReceiver {
    context: Option<ParsingContext>,
}

impl ResponseReceiver {
    /// Creates a receiver with no partial response.
    #[must_use]
    pub const fn new() -> Self {
        Self { context: None }
    }

    /// Returns true while a data response spans several lines.
    #[must_use]
    pub const fn is_continuing(&self) -> bool {
        self.context.is_some()
    }

    /// Returns the size of the literal the receiver is waiting for.
    #[must_use]
    pub fn pending_literal(&self) -> Option<usize> {
        self.context.as_ref().and_then(|ctx| ctx.literal)
    }

    /// Supplies the payload of the pending literal.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Protocol`] if no literal is pending or the length
    /// differs from the announced size. The partial response is discarded.
    pub fn receive_literal(&mut self, bytes: Vec<u8>) -> Result<()> {
        let Some(mut ctx) = self.context.take() else {
            return Err(Error::Protocol("literal received without a pending response".into()));
        };
        match ctx.literal {
            Some(size) if size == bytes.len() => {
                ctx.consumed += size;
                ctx.literal = None;
                ctx.push(ImapData::Text(bytes));
                self.context = Some(ctx);
                Ok(())
            }
            Some(size) => Err(Error::Protocol(format!(
                "literal of {size} bytes announced but {} received",
                bytes.len()
            ))),
            None => Err(Error::Protocol("no literal pending".into())),
        }
    }

    /// Parses one line, with or without its trailing CRLF.
    ///
    /// Returns `Ok(None)` when the line ends in a literal prefix and the
    /// response continues after the literal.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedResponse`] for lines that do not follow the
    /// response grammar. The partial response, if any, is discarded and the
    /// receiver is ready for a fresh line.
    pub fn receive_line(&mut self, line: &[u8]) -> Result<Option<Response>> {
        let line = strip_line_ending(line);

        if let Some(mut ctx) = self.context.take() {
            if let Some(size) = ctx.literal {
                return Err(Error::Protocol(format!(
                    "expected {size} literal bytes before the next line"
                )));
            }
            ctx.feed(line)?;
            return self.complete(ctx);
        }

        parse_fresh(line).and_then(|parsed| match parsed {
            Parsed::Response(response) => Ok(Some(response)),
            Parsed::Data(ctx) => self.complete(ctx),
        })
    }

    fn complete(&mut self, ctx: ParsingContext) -> Result<Option<Response>> {
        if ctx.literal.is_some() {
            self.context = Some(ctx);
            return Ok(None);
        }
        let items = ctx.finish()?;
        classify(items).map(|data| Some(Response::Data(data)))
    }
}

enum Parsed {
    Response(Response),
    Data(ParsingContext),
}

fn parse_fresh(line: &[u8]) -> Result<Parsed> {
    if line.first() == Some(&b'+') {
        let text = line[1..].strip_prefix(b" ").unwrap_or(&line[1..]);
        return Ok(Parsed::Response(Response::Continuation(ContinuationRequest {
            text: String::from_utf8_lossy(text).into_owned(),
        })));
    }

    let (tag, rest) = split_word(line);
    if tag.is_empty() {
        return Err(malformed(0, "empty tag"));
    }
    let rest_offset = tag.len() + 1;
    if rest.is_empty() {
        return Err(malformed(tag.len(), "missing response after tag"));
    }
    let untagged = tag == b"*";

    if untagged && rest.first() == Some(&b'[') {
        let text = parse_text(rest, rest_offset);
        return Ok(Parsed::Response(Response::Untagged(UntaggedStatus {
            condition: Condition::Ok,
            text,
        })));
    }

    let (word, text) = split_word(rest);
    if let Some(condition) = Condition::parse(word) {
        let text = parse_text(text, rest_offset + word.len() + 1);
        if untagged {
            return Ok(Parsed::Response(Response::Untagged(UntaggedStatus {
                condition,
                text,
            })));
        }
        if !condition.is_tagged_condition() {
            return Err(malformed(
                rest_offset,
                &format!("{condition} is not allowed in a tagged response"),
            ));
        }
        return Ok(Parsed::Response(Response::Tagged(TaggedStatus {
            tag: Tag::new(String::from_utf8_lossy(tag)),
            condition,
            text,
        })));
    }

    if !untagged {
        return Err(malformed(rest_offset, "tagged response without a status"));
    }

    let mut ctx = ParsingContext::new();
    ctx.consumed = rest_offset;
    ctx.feed(rest)?;
    Ok(Parsed::Data(ctx))
}

/// Parses `[CODE args] text`.
fn parse_text(input: &[u8], offset: usize) -> ResponseText {
    let lossy = |bytes: &[u8]| String::from_utf8_lossy(bytes).into_owned();

    if input.first() != Some(&b'[') {
        return ResponseText {
            code: None,
            text: lossy(input),
        };
    }
    let Some(end) = find_closing_bracket(input) else {
        return ResponseText {
            code: None,
            text: lossy(input),
        };
    };

    let (name, args) = split_word(&input[1..end]);
    let args = if args.is_empty() {
        Vec::new()
    } else {
        tokenize(args, offset + name.len() + 2)
            .unwrap_or_else(|_| vec![ImapData::Text(args.to_vec())])
    };
    let rest = &input[end + 1..];
    let rest = rest.strip_prefix(b" ").unwrap_or(rest);

    ResponseText {
        code: Some(RawCode {
            name: lossy(name).to_ascii_uppercase(),
            args,
        }),
        text: lossy(rest),
    }
}

/// Tokenizes a self-contained argument list; literals are not allowed.
fn tokenize(input: &[u8], offset: usize) -> Result<Vec<ImapData>> {
    let mut ctx = ParsingContext::new();
    ctx.consumed = offset;
    ctx.feed(input)?;
    if ctx.literal.is_some() {
        return Err(malformed(offset + input.len(), "literal inside response code"));
    }
    ctx.finish()
}

/// Determines the data type, moving the number of `* n WORD` forms after it.
fn classify(mut items: Vec<ImapData>) -> Result<DataResponse> {
    let numeric_first = matches!(
        items.as_slice(),
        [ImapData::Text(n), ImapData::Text(_), ..]
            if !n.is_empty() && n.iter().all(u8::is_ascii_digit)
    );
    let word = if numeric_first {
        items.remove(1)
    } else if items.is_empty() {
        return Err(malformed(0, "empty data response"));
    } else {
        items.remove(0)
    };

    let ImapData::Text(word) = word else {
        return Err(malformed(0, "data response must start with a keyword"));
    };
    Ok(DataResponse {
        kind: DataResponseType::parse(&word),
        data: items,
        keyword: String::from_utf8_lossy(&word).to_ascii_uppercase(),
    })
}

fn split_word(input: &[u8]) -> (&[u8], &[u8]) {
    match input.iter().position(|&b| b == b' ') {
        Some(i) => (&input[..i], &input[i + 1..]),
        None => (input, &[]),
    }
}

fn strip_line_ending(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}

fn malformed(position: usize, message: &str) -> Error {
    Error::MalformedResponse {
        position,
        message: message.to_string(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn parse(line: &[u8]) -> Response {
        ResponseReceiver::new().receive_line(line).unwrap().unwrap()
    }

    fn data(line: &[u8]) -> DataResponse {
        match parse(line) {
            Response::Data(data) => data,
            other => panic!("expected data, got {other:?}"),
        }
    }

    #[test]
    fn test_continuation() {
        assert_eq!(
            parse(b"+ Ready for literal\r\n"),
            Response::Continuation(ContinuationRequest {
                text: "Ready for literal".into()
            })
        );
        assert_eq!(
            parse(b"+\r\n"),
            Response::Continuation(ContinuationRequest::default())
        );
    }

    #[test]
    fn test_tagged_ok_with_code() {
        let Response::Tagged(tagged) = parse(b"0003 OK [READ-WRITE] SELECT completed\r\n") else {
            panic!("expected tagged");
        };
        assert_eq!(tagged.tag, "0003");
        assert_eq!(tagged.condition, Condition::Ok);
        assert_eq!(tagged.text.code.as_ref().unwrap().name, "READ-WRITE");
        assert!(tagged.text.code.as_ref().unwrap().args.is_empty());
        assert_eq!(tagged.text.text, "SELECT completed");
    }

    #[test]
    fn test_code_arguments_are_tokenized() {
        let Response::Untagged(status) =
            parse(b"* OK [PERMANENTFLAGS (\\Deleted \\Seen \\*)] Limited\r\n")
        else {
            panic!("expected untagged");
        };
        let code = status.text.code.unwrap();
        assert_eq!(code.name, "PERMANENTFLAGS");
        assert_eq!(code.args.len(), 1);
        assert_eq!(code.args[0].as_list().unwrap().len(), 3);
        assert_eq!(status.text.text, "Limited");
    }

    #[test]
    fn test_lowercase_condition_and_code() {
        let Response::Untagged(status) = parse(b"* ok [uidnext 4392] Predicted\r\n") else {
            panic!("expected untagged");
        };
        assert_eq!(status.condition, Condition::Ok);
        assert_eq!(status.text.code.unwrap().name, "UIDNEXT");
    }

    #[test]
    fn test_bracket_without_condition_is_untagged_ok() {
        let Response::Untagged(status) = parse(b"* [ALERT] Disk almost full\r\n") else {
            panic!("expected untagged");
        };
        assert_eq!(status.condition, Condition::Ok);
        assert!(status.text.has_code("ALERT"));
        assert_eq!(status.text.text, "Disk almost full");
    }

    #[test]
    fn test_tagged_bye_is_malformed() {
        let err = ResponseReceiver::new()
            .receive_line(b"0001 BYE later\r\n")
            .unwrap_err();
        assert!(matches!(err, Error::MalformedResponse { .. }));
    }

    #[test]
    fn test_tagged_without_status_is_malformed() {
        assert!(ResponseReceiver::new().receive_line(b"0001 FETCH\r\n").is_err());
    }

    #[test]
    fn test_empty_tag_is_malformed() {
        let err = ResponseReceiver::new().receive_line(b" OK\r\n").unwrap_err();
        assert!(matches!(err, Error::MalformedResponse { position: 0, .. }));
    }

    #[test]
    fn test_numeric_first_exists() {
        let data = data(b"* 23 EXISTS\r\n");
        assert_eq!(data.kind, DataResponseType::Exists);
        assert_eq!(data.data, vec![ImapData::text("23")]);
    }

    #[test]
    fn test_numeric_first_fetch() {
        let data = data(b"* 5 FETCH (FLAGS (\\Seen) UID 9)\r\n");
        assert_eq!(data.kind, DataResponseType::Fetch);
        assert_eq!(data.data.len(), 2);
        assert_eq!(data.data[0], ImapData::text("5"));
        assert_eq!(data.data[1].as_list().unwrap().len(), 4);
    }

    #[test]
    fn test_keyword_first_search_keeps_numbers() {
        let data = data(b"* SEARCH 2 84 882\r\n");
        assert_eq!(data.kind, DataResponseType::Search);
        assert_eq!(data.data.len(), 3);

        let empty = self::data(b"* SEARCH\r\n");
        assert_eq!(empty.kind, DataResponseType::Search);
        assert!(empty.data.is_empty());
    }

    #[test]
    fn test_unknown_type_is_preserved() {
        let data = data(b"* 12 X-GM-THING foo\r\n");
        assert_eq!(data.kind, DataResponseType::InvalidOrUnknown);
        assert_eq!(data.keyword, "X-GM-THING");
        assert_eq!(data.data, vec![ImapData::text("12"), ImapData::text("foo")]);
    }

    #[test]
    fn test_literal_with_embedded_crlf() {
        let mut receiver = ResponseReceiver::new();
        assert!(
            receiver
                .receive_line(b"* 1 FETCH (BODY[TEXT] {11}\r\n")
                .unwrap()
                .is_none()
        );
        assert!(receiver.is_continuing());
        assert_eq!(receiver.pending_literal(), Some(11));

        receiver.receive_literal(b"hello\r\nworl".to_vec()).unwrap();
        assert_eq!(receiver.pending_literal(), None);

        let Some(Response::Data(data)) = receiver.receive_line(b")\r\n").unwrap() else {
            panic!("expected data");
        };
        assert!(!receiver.is_continuing());
        let attrs = data.data[1].as_list().unwrap();
        assert_eq!(attrs[0], ImapData::text("BODY[TEXT]"));
        assert_eq!(attrs[1].as_bytes().unwrap(), b"hello\r\nworl");
    }

    #[test]
    fn test_literal_mailbox_name() {
        let mut receiver = ResponseReceiver::new();
        assert!(receiver.receive_line(b"* LIST () \"/\" {5}\r\n").unwrap().is_none());
        receiver.receive_literal(b"INBOX".to_vec()).unwrap();
        let Some(Response::Data(data)) = receiver.receive_line(b"\r\n").unwrap() else {
            panic!("expected data");
        };
        assert_eq!(data.kind, DataResponseType::List);
        assert_eq!(data.data[2].as_bytes().unwrap(), b"INBOX");
    }

    #[test]
    fn test_wrong_literal_length_resets() {
        let mut receiver = ResponseReceiver::new();
        receiver.receive_line(b"* 1 FETCH (RFC822 {4}\r\n").unwrap();
        assert!(receiver.receive_literal(b"abc".to_vec()).is_err());
        assert!(!receiver.is_continuing());
    }

    #[test]
    fn test_unclosed_paren_is_malformed() {
        let err = ResponseReceiver::new()
            .receive_line(b"* 1 FETCH (FLAGS (\\Seen)\r\n")
            .unwrap_err();
        assert!(matches!(err, Error::MalformedResponse { .. }));
    }

    #[test]
    fn test_unopened_paren_is_malformed() {
        assert!(
            ResponseReceiver::new()
                .receive_line(b"* FLAGS \\Seen)\r\n")
                .is_err()
        );
    }

    #[test]
    fn test_context_resets_after_error() {
        let mut receiver = ResponseReceiver::new();
        receiver.receive_line(b"* 1 FETCH (BODY[] {3}\r\n").unwrap();
        receiver.receive_literal(b"abc".to_vec()).unwrap();
        assert!(receiver.receive_line(b") ) )\r\n").is_err());
        assert!(!receiver.is_continuing());

        let response = receiver.receive_line(b"* 4 EXISTS\r\n").unwrap();
        assert!(matches!(response, Some(Response::Data(_))));
    }

    #[test]
    fn test_line_without_crlf() {
        assert!(matches!(parse(b"* 3 RECENT"), Response::Data(_)));
    }
}
