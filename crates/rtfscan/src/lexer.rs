//! RTF control-syntax lexer.
//!
//! Only the structure of the document matters here: groups, control words and
//! the literal text between them. Literal text is routed to the handler of the
//! innermost group, if it has one; everything else is skipped.
//!
//! The lexer is fed one chunk at a time and keeps its position between
//! chunks, so a control word may straddle a chunk boundary. Literal text runs
//! never do: a run ends at the end of its chunk, and handlers resume across
//! the split.

use bstr::BStr;
use tracing::{debug, trace, warn};

use crate::{
    actions::ActionTable,
    error::ScanError,
    group_stack::GroupStack,
    scanner::{ContentScanner, ScanCx, Verdict},
    state::ScanState,
};

/// Longest control word accepted, terminator included.
const MAX_CONTROL_WORD: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Position {
    Main,
    ControlEscape,
    ControlWord,
    ControlWordParam,
    ControlSymbol,
    InterpretControlWord,
}

/// `isspace` in the C locale.
#[inline]
fn is_space(byte: u8) -> bool {
    matches!(byte, b' ' | b'\t' | b'\n' | 0x0B | 0x0C | b'\r')
}

#[derive(Debug)]
struct ControlWord {
    bytes: [u8; MAX_CONTROL_WORD],
    len: usize,
    param: i64,
    negative: bool,
}

impl ControlWord {
    fn new() -> Self {
        Self {
            bytes: [0; MAX_CONTROL_WORD],
            len: 0,
            param: 0,
            negative: false,
        }
    }

    fn reset(&mut self) {
        self.len = 0;
    }

    fn is_full(&self) -> bool {
        self.len == MAX_CONTROL_WORD
    }

    fn push(&mut self, byte: u8) {
        self.bytes[self.len] = byte;
        self.len += 1;
    }

    fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len]
    }

    fn start_param(&mut self, negative: bool) {
        self.param = 0;
        self.negative = negative;
    }

    /// Returns `false` if the digit would overflow the parameter.
    fn push_digit(&mut self, digit: u8) -> bool {
        match self
            .param
            .checked_mul(10)
            .and_then(|p| p.checked_add(i64::from(digit - b'0')))
        {
            Some(param) => {
                self.param = param;
                true
            }
            None => false,
        }
    }

    fn finish_param(&mut self) {
        if self.negative {
            self.param = -self.param;
        }
    }
}

#[derive(Debug)]
pub(crate) struct Lexer {
    position: Position,
    word: ControlWord,
    state: ScanState,
    stack: GroupStack,
    actions: ActionTable,
}

impl Lexer {
    pub(crate) fn new() -> Self {
        Self {
            position: Position::Main,
            word: ControlWord::new(),
            state: ScanState::default(),
            stack: GroupStack::new(),
            actions: ActionTable::new(),
        }
    }

    #[cfg(test)]
    pub(crate) fn position(&self) -> Position {
        self.position
    }

    #[cfg(test)]
    pub(crate) fn state(&self) -> &ScanState {
        &self.state
    }

    /// Lexes one chunk. Stops early, returning the verdict, if a handler
    /// reports a non-clean one.
    pub(crate) fn feed<S: ContentScanner>(
        &mut self,
        chunk: &[u8],
        cx: &mut ScanCx<'_, S>,
    ) -> Result<Verdict, ScanError<S::Error>> {
        use Position::*;

        let mut pos = 0;
        loop {
            // a control word is interpreted as soon as it is terminated, even
            // when its terminator was the last byte of the chunk
            if self.position == InterpretControlWord {
                self.position = Main;
                let verdict = self.interpret(cx)?;
                if !verdict.is_clean() {
                    return Ok(verdict);
                }
            }
            let Some(&byte) = chunk.get(pos) else {
                break;
            };
            match self.position {
                Main => match byte {
                    b'{' => {
                        pos += 1;
                        self.stack
                            .push(&mut self.state)
                            .map_err(|_| ScanError::OutOfMemory {
                                what: "group stack",
                            })?;
                    }
                    b'}' => {
                        pos += 1;
                        let verdict = self.state.end_handler(cx)?;
                        if !verdict.is_clean() {
                            return Ok(verdict);
                        }
                        self.stack.pop(&mut self.state);
                    }
                    b'\\' => {
                        pos += 1;
                        self.position = ControlEscape;
                    }
                    _ => {
                        let rest = &chunk[pos + 1..];
                        let len = memchr::memchr3(b'{', b'}', b'\\', rest).unwrap_or(rest.len()) + 1;
                        let run = &chunk[pos..pos + len];
                        pos += len;

                        if let Some(handler) = self.state.handler.as_mut() {
                            if !handler.is_begun() {
                                handler.begin();
                            }
                            let verdict = handler.process(run, cx)?;
                            if !verdict.is_clean() {
                                return Ok(verdict);
                            }
                        }
                    }
                },

                ControlEscape => {
                    if byte.is_ascii_alphabetic() {
                        self.word.reset();
                        self.position = ControlWord;
                    } else {
                        self.position = ControlSymbol;
                    }
                }

                ControlSymbol => {
                    pos += 1;
                    self.position = Main;
                }

                ControlWord => {
                    if self.word.is_full() {
                        debug!(
                            "invalid control word: maximum size exceeded: {}",
                            BStr::new(self.word.as_bytes())
                        );
                        self.position = Main;
                    } else if byte.is_ascii_alphabetic() {
                        self.word.push(byte);
                        pos += 1;
                    } else if is_space(byte) {
                        self.word.push(byte);
                        pos += 1;
                        self.position = InterpretControlWord;
                    } else if byte.is_ascii_digit() {
                        self.word.start_param(false);
                        self.position = ControlWordParam;
                    } else if byte == b'-' {
                        pos += 1;
                        self.word.start_param(true);
                        self.position = ControlWordParam;
                    } else {
                        self.position = InterpretControlWord;
                    }
                }

                ControlWordParam => {
                    if byte.is_ascii_digit() {
                        if self.word.push_digit(byte) {
                            pos += 1;
                        } else {
                            debug!("invalid control word param: maximum size exceeded");
                            self.position = Main;
                        }
                    } else if byte.is_ascii_alphabetic() {
                        // tolerated, some writers put letters here
                        pos += 1;
                    } else {
                        self.word.finish_param();
                        self.position = InterpretControlWord;
                    }
                }

                // handled at the top of the loop
                InterpretControlWord => {}
            }
        }

        Ok(Verdict::Clean)
    }

    fn interpret<S: ContentScanner>(
        &mut self,
        cx: &mut ScanCx<'_, S>,
    ) -> Result<Verdict, ScanError<S::Error>> {
        let word = self.word.as_bytes();
        trace!("control word {:?} param {}", BStr::new(word), self.word.param);
        let Some(action) = self.actions.lookup(word) else {
            return Ok(Verdict::Clean);
        };

        let mut verdict = Verdict::Clean;
        if self.state.has_begun_handler() {
            debug!("premature end of object data at {:?}", BStr::new(word));
            verdict = self.state.end_handler(cx)?;
            self.state.handler = None;
        }
        self.state.apply(action);
        Ok(verdict)
    }

    /// Ends every handler still holding a context, innermost group first,
    /// and leaves the lexer empty.
    ///
    /// All handlers are ended even if some fail. The first error, or failing
    /// that the first non-clean verdict, is returned.
    pub(crate) fn unwind<S: ContentScanner>(
        &mut self,
        cx: &mut ScanCx<'_, S>,
    ) -> Result<Verdict, ScanError<S::Error>> {
        let current = core::mem::take(&mut self.state);
        let mut outcome = Ok(Verdict::Clean);
        for mut state in core::iter::once(current).chain(self.stack.drain()) {
            let ended = state.end_handler(cx);
            match (&outcome, ended) {
                (Ok(Verdict::Clean), ended) => outcome = ended,
                (_, Err(err)) => warn!("discarding error while unwinding: {err}"),
                (_, Ok(_)) => {}
            }
        }
        self.position = Position::Main;
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        actions::Action,
        scanner::DiscardScanner,
        state::Handler,
    };

    fn lex(chunks: &[&[u8]]) -> Lexer {
        let dir = tempfile::tempdir().unwrap();
        let mut scanner = DiscardScanner;
        let mut cx = ScanCx::new(&mut scanner, dir.path(), false);
        let mut lexer = Lexer::new();
        for chunk in chunks {
            lexer.feed(chunk, &mut cx).unwrap();
        }
        lexer
    }

    #[test]
    fn object_then_objdata_installs_handler() {
        let lexer = lex(&[b"{\\object{\\objdata "]);
        assert!(matches!(lexer.state().handler, Some(Handler::Object(None))));
    }

    #[test]
    fn objdata_alone_installs_nothing() {
        let lexer = lex(&[b"{\\objdata 0105000002000000"]);
        assert!(lexer.state().handler.is_none());
    }

    #[test]
    fn objdata_needs_a_space_terminator() {
        let lexer = lex(&[b"{\\object{\\objdata\n01"]);
        assert!(lexer.state().handler.is_none());
    }

    #[test]
    fn text_begins_the_handler() {
        let lexer = lex(&[b"{\\object{\\objdata 01"]);
        assert!(lexer.state().has_begun_handler());
    }

    #[test]
    fn control_word_split_across_chunks() {
        let lexer = lex(&[b"{\\obj", b"ect{\\objd", b"ata", b" "]);
        assert!(lexer.state().handler.is_some());
    }

    #[test]
    fn parameter_and_sign_are_consumed() {
        let lexer = lex(&[b"{\\object\\objw-1234\\objdata "]);
        assert!(lexer.state().handler.is_some());
        assert_eq!(lexer.word.param, -1234);
    }

    #[test]
    fn letters_inside_parameter_are_skipped() {
        let lexer = lex(&[b"\\object12ab34 "]);
        assert_eq!(lexer.word.param, 1234);
        assert_eq!(lexer.position(), Position::Main);
        assert!(lexer.state().top_level.contains(Action::Object));
    }

    #[test]
    fn word_ending_a_chunk_is_interpreted_immediately() {
        let lexer = lex(&[b"\\object\\objdata "]);
        assert_eq!(lexer.position(), Position::Main);
        assert!(lexer.state().handler.is_some());
    }

    #[test]
    fn largest_parameter_is_accepted() {
        let lexer = lex(&[b"\\objw9223372036854775807 "]);
        assert_eq!(lexer.word.param, i64::MAX);
        assert_eq!(lexer.position(), Position::Main);
    }

    #[test]
    fn one_digit_past_the_largest_parameter_is_abandoned() {
        let lexer = lex(&[b"\\objw92233720368547758070\\object\\objdata "]);
        assert_eq!(lexer.position(), Position::Main);
        assert!(lexer.state().handler.is_some());
    }

    #[test]
    fn parameter_overflow_resynchronises() {
        let lexer = lex(&[b"\\object99999999999999999999{\\object\\objdata "]);
        assert_eq!(lexer.position(), Position::Main);
        assert!(lexer.state().handler.is_some());
    }

    #[test]
    fn overlong_control_word_is_abandoned() {
        let long = format!("{{\\object\\{}{{\\objdata ", "a".repeat(40));
        let lexer = lex(&[long.as_bytes()]);
        assert!(lexer.state().handler.is_some());
        assert!(lexer.state().top_level.contains(Action::Object));
    }

    #[test]
    fn control_symbol_is_skipped() {
        let lexer = lex(&[b"{\\object\\*\\objdata "]);
        assert!(lexer.state().handler.is_some());
    }

    #[test]
    fn closing_group_restores_parent() {
        let lexer = lex(&[b"{\\object\\objdata {\\b bold}"]);
        assert!(matches!(lexer.state().handler, Some(Handler::Object(None))));
    }

    #[test]
    fn unbalanced_close_is_tolerated() {
        let lexer = lex(&[b"}}}{\\object\\objdata "]);
        assert!(lexer.state().handler.is_some());
    }
}
