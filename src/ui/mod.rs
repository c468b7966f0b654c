//! Presentation layer: the upload state machine and the results view.
//!
//! ```text
//!  UiEvent ──▶ state::transition ──▶ (UploadState, [Effect])
//!                                          │
//!  ExtractionResult ──▶ cards ──▶ view ────┘ results panel
//! ```
//!
//! - [`state`]: pure reducer over the single upload slot
//! - [`cards`]: student records and mark banding derived from a result
//! - [`view`]: askama fragment for the cards panel

pub mod cards;
pub mod state;
pub mod view;

pub use cards::{band_for, student_cards, Band, MarkRow, StudentCard};
pub use state::{
    pretty_json, transition, Effect, FileCandidate, Notice, NoticeKind, Preview, SelectedFile,
    Transition, UiEvent, UploadState, DOWNLOAD_FILE_NAME,
};
pub use view::render_results;
