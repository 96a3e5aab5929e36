use std::io::Error;

use ratatui::crossterm::event::KeyEvent;

use crate::view::SortKey;

#[derive(Debug)]
pub enum CtvError {
    IoError(Error),
    JsonError(serde_json::Error),
    LoadingFailed(String),
    FileNotFound,
    PermissionDenied,
}

impl From<Error> for CtvError {
    fn from(err: Error) -> Self {
        CtvError::IoError(err)
    }
}

impl From<serde_json::Error> for CtvError {
    fn from(err: serde_json::Error) -> Self {
        CtvError::JsonError(err)
    }
}

#[derive(Debug, Clone)]
pub struct CtvConfig {
    pub event_poll_time: u64,
    pub max_column_width: usize,
}

impl Default for CtvConfig {
    fn default() -> Self {
        Self {
            event_poll_time: 100,
            max_column_width: 32,
        }
    }
}

// Messages produced by the controller and consumed by the model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Message {
    Quit,
    NextPage,
    PrevPage,
    FirstPage,
    LastPage,
    SortBy(SortKey),
    CycleHasStatesFilter,
    GrowPageSize,
    ShrinkPageSize,
    EnterFilterInput,
    ClearFilters,
    MoveUp,
    MoveDown,
    CopyRow,
    Help,
    Exit,
    RawKey(KeyEvent),
}

pub const HELP_TEXT: &str = "\
ctv - country table viewer

Navigation
  h/Left, l/Right   previous / next page
  g, G              first / last page
  j/Down, k/Up      move row selection

Filtering
  /                 type a continent filter (Enter applies, Esc cancels)
  t                 cycle the hasStates filter (all -> yes -> no)
  c                 clear both filters

Sorting (pressing the active column again flips the direction)
  1  id    2  code    3  name    4  nameUn    5  continent    6  hasStates

Other
  [ / ]             smaller / larger page size
  y                 copy the selected row to the clipboard
  ?                 this help
  q                 quit
";
