//! The upload slot as an explicit state machine.
//!
//! [`transition`] is a pure function from `(state, event)` to the next state
//! plus a list of [`Effect`]s for the front-end to carry out (send the upload,
//! show a notification, write the clipboard, ...). Front-ends keep no other UI
//! state: they render from the current [`UploadState`] and run the effects.
//!
//! ```text
//!            select (valid)          extract
//!   Empty ─────────────────▶ FileSelected ─────▶ Extracting
//!     ▲                          ▲   ▲               │
//!     │ clear (not while busy)   │   └── failed ─────┤
//!     └──────────────────────    │                   │ succeeded
//!                                └──── select ── ResultsShown ◀┘
//! ```

use crate::relay::ExtractionResult;
use crate::upload::{self, AcceptedType, ValidationError};
use serde::Serialize;

/// Filename offered for the JSON download.
pub const DOWNLOAD_FILE_NAME: &str = "marksheet-data.json";

/// A file the user picked, before validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileCandidate {
    pub name: String,
    pub content_type: String,
    pub size: u64,
}

/// A file that passed client-side validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectedFile {
    pub name: String,
    pub kind: AcceptedType,
    pub size: u64,
}

impl SelectedFile {
    pub fn preview(&self) -> Preview {
        if self.kind.is_image() {
            Preview::Image
        } else {
            Preview::Document
        }
    }
}

/// What the file preview shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Preview {
    /// The image itself, inline.
    Image,
    /// A generic document glyph.
    Document,
}

/// The single upload slot.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum UploadState {
    #[default]
    Empty,
    FileSelected {
        file: SelectedFile,
    },
    Extracting {
        file: SelectedFile,
    },
    ResultsShown {
        file: SelectedFile,
        result: ExtractionResult,
    },
}

impl UploadState {
    pub fn file(&self) -> Option<&SelectedFile> {
        match self {
            UploadState::Empty => None,
            UploadState::FileSelected { file }
            | UploadState::Extracting { file }
            | UploadState::ResultsShown { file, .. } => Some(file),
        }
    }

    pub fn result(&self) -> Option<&ExtractionResult> {
        match self {
            UploadState::ResultsShown { result, .. } => Some(result),
            _ => None,
        }
    }

    /// Whether the extract action is enabled.
    pub fn can_extract(&self) -> bool {
        matches!(
            self,
            UploadState::FileSelected { .. } | UploadState::ResultsShown { .. }
        )
    }

    pub fn is_busy(&self) -> bool {
        matches!(self, UploadState::Extracting { .. })
    }

    pub fn name(&self) -> &'static str {
        match self {
            UploadState::Empty => "empty",
            UploadState::FileSelected { .. } => "file-selected",
            UploadState::Extracting { .. } => "extracting",
            UploadState::ResultsShown { .. } => "results-shown",
        }
    }
}

/// Something the user (or the network) did.
#[derive(Debug, Clone, PartialEq)]
pub enum UiEvent {
    FileChosen(FileCandidate),
    ExtractRequested,
    ExtractSucceeded(ExtractionResult),
    ExtractFailed(String),
    Clear,
    CopyRequested,
    DownloadRequested,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeKind {
    Success,
    Error,
    Info,
}

/// A transient, dismissible notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Error,
            message: message.into(),
        }
    }
}

/// Work the front-end must do after a transition.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Notify(Notice),
    /// Post the file to the relay; answer with `ExtractSucceeded`/`ExtractFailed`.
    SendExtract(SelectedFile),
    ScrollToResults,
    CopyToClipboard(String),
    Download { file_name: String, contents: String },
}

/// Result of [`transition`].
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub state: UploadState,
    pub effects: Vec<Effect>,
}

impl Transition {
    fn stay(state: UploadState) -> Self {
        Self {
            state,
            effects: Vec::new(),
        }
    }

    fn to(state: UploadState, effects: Vec<Effect>) -> Self {
        Self { state, effects }
    }
}

/// Advance the upload slot by one event.
///
/// Events that make no sense in the current state (extract with no file, a
/// completion with no request in flight) leave the state untouched. While
/// `Extracting`, the slot is locked: selection and clear are ignored until
/// the one outstanding request settles.
pub fn transition(state: UploadState, event: UiEvent) -> Transition {
    match event {
        UiEvent::Clear if state.is_busy() => Transition::stay(state),
        UiEvent::Clear => Transition::stay(UploadState::Empty),

        UiEvent::FileChosen(candidate) => {
            if state.is_busy() {
                return Transition::stay(state);
            }
            match upload::validate(&candidate.content_type, candidate.size) {
                Ok(kind) => Transition::stay(UploadState::FileSelected {
                    file: SelectedFile {
                        name: candidate.name,
                        kind,
                        size: candidate.size,
                    },
                }),
                Err(e) => Transition::to(state, vec![Effect::Notify(Notice::error(rejection(&e)))]),
            }
        }

        UiEvent::ExtractRequested => match state {
            UploadState::FileSelected { file } | UploadState::ResultsShown { file, .. } => {
                Transition::to(
                    UploadState::Extracting { file: file.clone() },
                    vec![Effect::SendExtract(file)],
                )
            }
            other => Transition::stay(other),
        },

        UiEvent::ExtractSucceeded(result) => match state {
            UploadState::Extracting { file } => Transition::to(
                UploadState::ResultsShown { file, result },
                vec![
                    Effect::ScrollToResults,
                    Effect::Notify(Notice::success("Data extracted successfully!")),
                ],
            ),
            other => Transition::stay(other),
        },

        UiEvent::ExtractFailed(reason) => match state {
            UploadState::Extracting { file } => {
                let message = if reason.trim().is_empty() {
                    "Failed to extract data".to_string()
                } else {
                    reason
                };
                Transition::to(
                    UploadState::FileSelected { file },
                    vec![Effect::Notify(Notice::error(message))],
                )
            }
            other => Transition::stay(other),
        },

        UiEvent::CopyRequested => {
            let effect = match state.result() {
                Some(result) => Effect::CopyToClipboard(pretty_json(result)),
                None => Effect::Notify(Notice::error("No extracted data to copy")),
            };
            Transition::to(state, vec![effect])
        }

        UiEvent::DownloadRequested => {
            let effects = match state.result() {
                Some(result) => vec![
                    Effect::Download {
                        file_name: DOWNLOAD_FILE_NAME.to_string(),
                        contents: pretty_json(result),
                    },
                    Effect::Notify(Notice::success("Download started!")),
                ],
                None => vec![Effect::Notify(Notice::error("No extracted data to download"))],
            };
            Transition::to(state, effects)
        }
    }
}

/// Client-side wording for a rejected file.
fn rejection(error: &ValidationError) -> String {
    match error {
        ValidationError::InvalidFileType { .. } => {
            "Invalid file type. Please upload an image or PDF.".to_string()
        }
        other => other.to_string(),
    }
}

/// Two-space indented JSON, the format shown, copied and downloaded.
pub fn pretty_json(value: &ExtractionResult) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}
