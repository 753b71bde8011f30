//! Per-group scan state.

use tracing::trace;

use crate::{
    actions::Action,
    error::ScanError,
    object::ObjectDecoder,
    scanner::{ContentScanner, ScanCx, Verdict},
};

/// Top-level control words seen in the current lexical scope.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct TopLevel(u8);

impl TopLevel {
    fn bit(action: Action) -> u8 {
        1 << action as u8
    }

    pub(crate) fn insert(&mut self, action: Action) {
        self.0 |= Self::bit(action);
    }

    pub(crate) fn contains(self, action: Action) -> bool {
        self.0 & Self::bit(action) != 0
    }

    pub(crate) fn is_empty(self) -> bool {
        self.0 == 0
    }
}

/// A handler consuming the literal text of the group it was installed in.
///
/// Each variant owns its context; `None` means the handler is installed but
/// has not seen any text yet.
#[derive(Debug)]
pub(crate) enum Handler {
    /// Extracts the embedded object carried by `\objdata`.
    Object(Option<Box<ObjectDecoder>>),
}

impl Handler {
    pub(crate) fn object() -> Self {
        Self::Object(None)
    }

    pub(crate) fn is_begun(&self) -> bool {
        match self {
            Self::Object(decoder) => decoder.is_some(),
        }
    }

    pub(crate) fn begin(&mut self) {
        match self {
            Self::Object(decoder) => {
                trace!("begin object data");
                decoder.get_or_insert_with(|| Box::new(ObjectDecoder::new()));
            }
        }
    }

    pub(crate) fn process<S: ContentScanner>(
        &mut self,
        run: &[u8],
        cx: &mut ScanCx<'_, S>,
    ) -> Result<Verdict, ScanError<S::Error>> {
        match self {
            Self::Object(Some(decoder)) => decoder.process(run, cx),
            Self::Object(None) => Ok(Verdict::Clean),
        }
    }

    /// Releases the context, if any. The handler stays installed.
    pub(crate) fn end<S: ContentScanner>(
        &mut self,
        cx: &mut ScanCx<'_, S>,
    ) -> Result<Verdict, ScanError<S::Error>> {
        match self {
            Self::Object(decoder) => match decoder.take() {
                Some(decoder) => decoder.end(cx),
                None => Ok(Verdict::Clean),
            },
        }
    }
}

/// State of one nesting level.
#[derive(Debug, Default)]
pub(crate) struct ScanState {
    pub(crate) handler: Option<Handler>,
    pub(crate) top_level: TopLevel,
    /// Number of default-state groups opened on top of this one that were
    /// counted rather than pushed.
    pub(crate) default_run: usize,
}

impl ScanState {
    pub(crate) fn with_top_level(top_level: TopLevel) -> Self {
        Self {
            top_level,
            ..Self::default()
        }
    }

    /// No handler and no flags: indistinguishable from a fresh state.
    pub(crate) fn is_default(&self) -> bool {
        self.handler.is_none() && self.top_level.is_empty()
    }

    pub(crate) fn has_begun_handler(&self) -> bool {
        self.handler.as_ref().is_some_and(Handler::is_begun)
    }

    pub(crate) fn apply(&mut self, action: Action) {
        match action {
            Action::Object => self.top_level.insert(Action::Object),
            Action::ObjectData => {
                if self.top_level.contains(Action::Object) {
                    self.handler = Some(Handler::object());
                } else {
                    trace!("objdata outside of an object group, ignored");
                }
            }
        }
    }

    pub(crate) fn end_handler<S: ContentScanner>(
        &mut self,
        cx: &mut ScanCx<'_, S>,
    ) -> Result<Verdict, ScanError<S::Error>> {
        match self.handler.as_mut() {
            Some(handler) => handler.end(cx),
            None => Ok(Verdict::Clean),
        }
    }
}
