use std::time::Duration;

use ratatui::crossterm::event::{self, Event, KeyCode};
use tracing::trace;

use crate::domain::{CtvConfig, CtvError, Message};
use crate::model::Model;
use crate::view::SortKey;

pub struct Controller {
    event_poll_time: u64,
}

impl Controller {
    pub fn new(cfg: &CtvConfig) -> Self {
        Self {
            event_poll_time: cfg.event_poll_time,
        }
    }

    pub fn handle_event(&self, model: &Model) -> Result<Option<Message>, CtvError> {
        if event::poll(Duration::from_millis(self.event_poll_time))?
            && let Event::Key(key) = event::read()?
            && key.kind == event::KeyEventKind::Press
        {
            // While the filter input is open the model consumes keys raw.
            if model.raw_keyevents() {
                return Ok(Some(Message::RawKey(key)));
            }
            return Ok(self.handle_key(key));
        }
        Ok(None)
    }

    fn handle_key(&self, key: event::KeyEvent) -> Option<Message> {
        let message = match key.code {
            KeyCode::Char('q') => Some(Message::Quit),
            KeyCode::Esc => Some(Message::Exit),
            KeyCode::Char('?') => Some(Message::Help),
            KeyCode::Left | KeyCode::Char('h') => Some(Message::PrevPage),
            KeyCode::Right | KeyCode::Char('l') => Some(Message::NextPage),
            KeyCode::Char('g') => Some(Message::FirstPage),
            KeyCode::Char('G') => Some(Message::LastPage),
            KeyCode::Up | KeyCode::Char('k') => Some(Message::MoveUp),
            KeyCode::Down | KeyCode::Char('j') => Some(Message::MoveDown),
            KeyCode::Char('1') => Some(Message::SortBy(SortKey::Id)),
            KeyCode::Char('2') => Some(Message::SortBy(SortKey::Code)),
            KeyCode::Char('3') => Some(Message::SortBy(SortKey::Name)),
            KeyCode::Char('4') => Some(Message::SortBy(SortKey::NameUn)),
            KeyCode::Char('5') => Some(Message::SortBy(SortKey::Continent)),
            KeyCode::Char('6') => Some(Message::SortBy(SortKey::HasStates)),
            KeyCode::Char('t') => Some(Message::CycleHasStatesFilter),
            KeyCode::Char('/') => Some(Message::EnterFilterInput),
            KeyCode::Char('c') => Some(Message::ClearFilters),
            KeyCode::Char(']') => Some(Message::GrowPageSize),
            KeyCode::Char('[') => Some(Message::ShrinkPageSize),
            KeyCode::Char('y') => Some(Message::CopyRow),
            _ => None,
        };
        trace!("Mapped: {key:?} => {message:?}");
        message
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::crossterm::event::KeyEvent;

    fn mapped(code: KeyCode) -> Option<Message> {
        Controller::new(&CtvConfig::default()).handle_key(KeyEvent::from(code))
    }

    #[test]
    fn sort_keys_map_to_the_six_columns() {
        assert_eq!(mapped(KeyCode::Char('1')), Some(Message::SortBy(SortKey::Id)));
        assert_eq!(
            mapped(KeyCode::Char('4')),
            Some(Message::SortBy(SortKey::NameUn))
        );
        assert_eq!(
            mapped(KeyCode::Char('6')),
            Some(Message::SortBy(SortKey::HasStates))
        );
    }

    #[test]
    fn unbound_keys_map_to_nothing() {
        assert_eq!(mapped(KeyCode::Char('z')), None);
        assert_eq!(mapped(KeyCode::Tab), None);
    }

    #[test]
    fn navigation_keys_map_to_paging() {
        assert_eq!(mapped(KeyCode::Left), Some(Message::PrevPage));
        assert_eq!(mapped(KeyCode::Char('l')), Some(Message::NextPage));
        assert_eq!(mapped(KeyCode::Char('G')), Some(Message::LastPage));
    }
}
