use std::time::Instant;

use arboard::Clipboard;
use ratatui::crossterm::event::KeyEvent;
use tracing::{info, trace, warn};

use crate::country::Country;
use crate::domain::{CtvConfig, CtvError, HELP_TEXT, Message};
use crate::inputter::{FilterInput, InputResult};
use crate::view::{
    self, HasStatesFilter, PAGE_SIZE_OPTIONS, SortDirection, SortKey, ViewEvent, ViewState,
};

#[derive(Debug, PartialEq)]
pub enum Status {
    READY,
    QUITTING,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Modus {
    TABLE,
    FILTERINPUT,
    POPUP,
}

/// One rendered column: header, render width and the cell text of the
/// visible page.
#[derive(Debug, Clone)]
pub struct ColumnView {
    pub name: String,
    pub width: usize,
    pub data: Vec<String>,
}

/// Everything the UI needs to draw one frame.
pub struct UIData {
    pub table: Vec<ColumnView>,
    pub nrows: usize,
    pub total_count: usize,
    pub page_index: usize,
    pub page_count: usize,
    pub page_size: usize,
    pub selected_row: usize,
    pub continent_filter: String,
    pub has_states_label: &'static str,
    pub sort_key: SortKey,
    pub sort_direction: SortDirection,
    pub continents: Vec<String>,
    pub show_popup: bool,
    pub popup_message: String,
    pub cmdinput: InputResult,
    pub active_cmdinput: bool,
    pub status_message: String,
    pub last_update: Instant,
}

impl UIData {
    fn empty() -> Self {
        UIData {
            table: Vec::new(),
            nrows: 0,
            total_count: 0,
            page_index: 0,
            page_count: 0,
            page_size: PAGE_SIZE_OPTIONS[0],
            selected_row: 0,
            continent_filter: String::new(),
            has_states_label: HasStatesFilter::All.label(),
            sort_key: SortKey::NameUn,
            sort_direction: SortDirection::Ascending,
            continents: Vec::new(),
            show_popup: false,
            popup_message: String::new(),
            cmdinput: InputResult::default(),
            active_cmdinput: false,
            status_message: String::new(),
            last_update: Instant::now(),
        }
    }
}

pub struct Model {
    config: CtvConfig,
    pub status: Status,
    modus: Modus,
    countries: Vec<Country>,
    continents: Vec<String>,
    view: ViewState,
    selected_row: usize,
    clipboard: Option<Clipboard>,
    input: FilterInput,
    last_input: InputResult,
    uidata: UIData,
    status_message: String,
}

impl Model {
    pub fn init(
        config: &CtvConfig,
        countries: Vec<Country>,
        initial_continent: Option<String>,
        initial_has_states: Option<HasStatesFilter>,
        initial_sort: Option<(SortKey, SortDirection)>,
    ) -> Result<Self, CtvError> {
        let continents = view::distinct_continents(&countries);
        info!(
            "Initializing model with {} records across {} continents",
            countries.len(),
            continents.len()
        );
        let mut model = Self {
            config: config.clone(),
            status: Status::READY,
            modus: Modus::TABLE,
            countries,
            continents,
            view: ViewState::with_overrides(initial_continent, initial_has_states, initial_sort),
            selected_row: 0,
            clipboard: Clipboard::new().ok(),
            input: FilterInput::default(),
            last_input: InputResult::default(),
            uidata: UIData::empty(),
            status_message: String::new(),
        };
        model.status_message = format!("Loaded {} countries", model.countries.len());
        model.refresh();
        Ok(model)
    }

    pub fn get_uidata(&self) -> &UIData {
        &self.uidata
    }

    /// Raw key events are forwarded unmapped while the filter input is open.
    pub fn raw_keyevents(&self) -> bool {
        self.modus == Modus::FILTERINPUT
    }

    pub fn quit(&mut self) {
        self.status = Status::QUITTING;
    }

    pub fn update(&mut self, message: Message) -> Result<(), CtvError> {
        trace!("Update: Modus {:?}, Message {:?}", self.modus, message);
        match self.modus {
            Modus::TABLE => match message {
                Message::Quit => self.quit(),
                Message::NextPage => self.goto_page(self.view.page_index.saturating_add(1)),
                Message::PrevPage => self.goto_page(self.view.page_index.saturating_sub(1)),
                Message::FirstPage => self.goto_page(0),
                Message::LastPage => self.goto_page(self.last_page()),
                Message::SortBy(key) => self.apply_event(ViewEvent::SetSortKey(key)),
                Message::CycleHasStatesFilter => {
                    let next = self.view.has_states_filter.cycled();
                    self.apply_event(ViewEvent::SetHasStatesFilter(next));
                    self.set_status_message(format!(
                        "hasStates filter: {}",
                        self.view.has_states_filter.label()
                    ));
                }
                Message::GrowPageSize => self.step_page_size(1),
                Message::ShrinkPageSize => self.step_page_size(-1),
                Message::EnterFilterInput => self.enter_filter_input(),
                Message::ClearFilters => self.clear_filters(),
                Message::MoveUp => self.move_selection(-1),
                Message::MoveDown => self.move_selection(1),
                Message::CopyRow => self.copy_selected_row(),
                Message::Help => self.show_help(),
                Message::Exit | Message::RawKey(_) => {}
            },
            Modus::FILTERINPUT => {
                if let Message::RawKey(key) = message {
                    self.filter_input_key(key);
                }
            }
            Modus::POPUP => match message {
                Message::Quit => self.quit(),
                Message::Exit | Message::Help => self.close_popup(),
                _ => {}
            },
        }
        Ok(())
    }

    // -------------------- Control handling functions ---------------------- //

    fn apply_event(&mut self, event: ViewEvent) {
        self.view.apply(event);
        self.refresh();
    }

    fn last_page(&self) -> usize {
        view::page_count(self.uidata.total_count, self.view.page_size).saturating_sub(1)
    }

    fn goto_page(&mut self, index: usize) {
        // The reducer takes any index, but there is no point in paging
        // past the last non-empty page from the keyboard.
        let target = std::cmp::min(index, self.last_page());
        self.apply_event(ViewEvent::SetPageIndex(target));
    }

    fn step_page_size(&mut self, step: i32) {
        let current = PAGE_SIZE_OPTIONS
            .iter()
            .position(|&s| s == self.view.page_size)
            .unwrap_or(0);
        let next = if step >= 0 {
            std::cmp::min(current + step as usize, PAGE_SIZE_OPTIONS.len() - 1)
        } else {
            current.saturating_sub(step.unsigned_abs() as usize)
        };
        if next != current {
            let size = PAGE_SIZE_OPTIONS[next];
            self.apply_event(ViewEvent::SetPageSize(size));
            self.set_status_message(format!("Page size: {size}"));
        }
    }

    fn enter_filter_input(&mut self) {
        trace!("Entering filter input ...");
        self.modus = Modus::FILTERINPUT;
        self.input.start(&self.view.continent_filter);
        self.last_input = self.input.snapshot();
        self.uidata.cmdinput = self.last_input.clone();
        self.uidata.active_cmdinput = true;
        self.uidata.last_update = Instant::now();
    }

    fn filter_input_key(&mut self, key: KeyEvent) {
        self.last_input = self.input.read(key);
        if self.last_input.finished {
            self.modus = Modus::TABLE;
            if self.last_input.canceled {
                self.set_status_message("Filter unchanged");
            } else {
                let filter = self.last_input.input.clone();
                self.set_status_message(if filter.is_empty() {
                    "Continent filter cleared".to_string()
                } else {
                    format!("Continent filter: \"{filter}\"")
                });
                self.apply_event(ViewEvent::SetContinentFilter(filter));
            }
        }
        self.uidata.cmdinput = self.last_input.clone();
        self.uidata.active_cmdinput = self.modus == Modus::FILTERINPUT;
        self.uidata.last_update = Instant::now();
    }

    fn clear_filters(&mut self) {
        self.apply_event(ViewEvent::SetContinentFilter(String::new()));
        self.apply_event(ViewEvent::SetHasStatesFilter(HasStatesFilter::All));
        self.set_status_message("Filters cleared");
    }

    fn move_selection(&mut self, step: i32) {
        if self.uidata.nrows == 0 {
            return;
        }
        self.selected_row = if step >= 0 {
            std::cmp::min(self.selected_row + step as usize, self.uidata.nrows - 1)
        } else {
            self.selected_row.saturating_sub(step.unsigned_abs() as usize)
        };
        self.uidata.selected_row = self.selected_row;
        self.uidata.last_update = Instant::now();
    }

    fn copy_selected_row(&mut self) {
        let row = {
            let output = view::recompute(&self.countries, &self.view);
            output.visible.get(self.selected_row).map(|record| {
                [
                    record.id.clone(),
                    record.code.clone(),
                    record.name.clone(),
                    record.name_un.clone(),
                    record.continent.clone(),
                    record.has_states.to_string(),
                ]
                .iter()
                .map(|cell| Self::wrap_cell_content(cell))
                .collect::<Vec<String>>()
                .join(",")
            })
        };
        let Some(row) = row else {
            return;
        };
        trace!("Row content: {}", row);
        let copied = match self.clipboard.as_mut() {
            Some(clipboard) => match clipboard.set_text(row) {
                Ok(_) => true,
                Err(e) => {
                    warn!("Error copying to clipboard: {:?}", e);
                    false
                }
            },
            None => {
                warn!("No clipboard available");
                false
            }
        };
        if copied {
            self.set_status_message("Copied row to clipboard");
        }
    }

    fn wrap_cell_content(cell: &str) -> String {
        let needs_escaping = cell.contains('"');
        let needs_wrapping = cell.chars().any(|c| c == ' ' || c == '\t' || c == ',');
        let mut out = cell.to_string();

        if needs_escaping {
            out = out.replace('"', "\"\"");
        }
        if needs_wrapping {
            out = format!("\"{out}\"");
        }
        out
    }

    fn show_help(&mut self) {
        self.modus = Modus::POPUP;
        self.uidata.popup_message = HELP_TEXT.to_string();
        self.uidata.show_popup = true;
        self.uidata.last_update = Instant::now();
    }

    fn close_popup(&mut self) {
        self.modus = Modus::TABLE;
        self.uidata.show_popup = false;
        self.uidata.last_update = Instant::now();
    }

    fn set_status_message(&mut self, message: impl Into<String>) {
        self.status_message = message.into();
        self.uidata.status_message = self.status_message.clone();
        self.uidata.last_update = Instant::now();
    }

    // -------------------- Derived UI data ---------------------- //

    /// Reruns the Filter -> Sort -> Page pipeline and rebuilds the UI data.
    fn refresh(&mut self) {
        let output = view::recompute(&self.countries, &self.view);
        let nrows = output.visible.len();
        self.selected_row = std::cmp::min(self.selected_row, nrows.saturating_sub(1));

        let table = self.build_columns(&output.visible);
        self.uidata = UIData {
            table,
            nrows,
            total_count: output.total_count,
            page_index: self.view.page_index,
            page_count: view::page_count(output.total_count, self.view.page_size),
            page_size: self.view.page_size,
            selected_row: self.selected_row,
            continent_filter: self.view.continent_filter.clone(),
            has_states_label: self.view.has_states_filter.label(),
            sort_key: self.view.sort_key,
            sort_direction: self.view.sort_direction,
            continents: self.continents.clone(),
            show_popup: self.uidata.show_popup,
            popup_message: self.uidata.popup_message.clone(),
            cmdinput: self.last_input.clone(),
            active_cmdinput: self.modus == Modus::FILTERINPUT,
            status_message: self.status_message.clone(),
            last_update: Instant::now(),
        };
    }

    fn build_columns(&self, visible: &[&Country]) -> Vec<ColumnView> {
        let first_serial = self.view.page_index.saturating_mul(self.view.page_size);
        let serials = visible
            .iter()
            .enumerate()
            .map(|(i, _)| (first_serial + i + 1).to_string())
            .collect();

        let columns = [
            ("S/N", None, serials),
            ("ID", Some(SortKey::Id), Self::cells(visible, |c| c.id.clone())),
            ("Code", Some(SortKey::Code), Self::cells(visible, |c| c.code.clone())),
            (
                "Name",
                Some(SortKey::NameUn),
                Self::cells(visible, |c| c.name_un.clone()),
            ),
            (
                "Continent",
                Some(SortKey::Continent),
                Self::cells(visible, |c| c.continent.clone()),
            ),
            (
                "Has States",
                Some(SortKey::HasStates),
                Self::cells(visible, |c| {
                    if c.has_states { "Yes" } else { "No" }.to_string()
                }),
            ),
        ];

        columns
            .into_iter()
            .map(|(header, key, data)| self.build_column(header, key, data))
            .collect()
    }

    fn cells(visible: &[&Country], cell: impl Fn(&Country) -> String) -> Vec<String> {
        visible.iter().map(|c| cell(c)).collect()
    }

    fn build_column(&self, header: &str, key: Option<SortKey>, data: Vec<String>) -> ColumnView {
        // The Name column carries the marker for both name keys.
        let sorted_by = match (key, self.view.sort_key) {
            (Some(SortKey::NameUn), SortKey::Name) => true,
            (Some(k), active) => k == active,
            (None, _) => false,
        };
        let name = if sorted_by {
            let marker = match self.view.sort_direction {
                SortDirection::Ascending => "▲",
                SortDirection::Descending => "▼",
            };
            format!("{header} {marker}")
        } else {
            header.to_string()
        };

        let content_width = data
            .iter()
            .map(|s| s.chars().count())
            .max()
            .unwrap_or(0)
            .max(name.chars().count());
        let width = std::cmp::min(content_width + 1, self.config.max_column_width);
        ColumnView { name, width, data }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::crossterm::event::KeyCode;

    fn country(id: &str, name_un: &str, continent: &str, has_states: bool) -> Country {
        Country {
            id: id.to_string(),
            code: id.to_string(),
            name: name_un.to_string(),
            name_un: name_un.to_string(),
            continent: continent.to_string(),
            has_states,
        }
    }

    fn many(n: usize) -> Vec<Country> {
        (0..n)
            .map(|i| {
                country(
                    &format!("{i:02}"),
                    &format!("Country {i:02}"),
                    "Europe",
                    i % 2 == 0,
                )
            })
            .collect()
    }

    fn model_with(countries: Vec<Country>) -> Model {
        Model::init(&CtvConfig::default(), countries, None, None, None).unwrap()
    }

    fn key(model: &mut Model, code: KeyCode) {
        model.update(Message::RawKey(KeyEvent::from(code))).unwrap();
    }

    #[test]
    fn paging_clamps_at_both_ends() {
        let mut model = model_with(many(25));
        assert_eq!(model.get_uidata().page_count, 3);

        model.update(Message::PrevPage).unwrap();
        assert_eq!(model.get_uidata().page_index, 0);

        model.update(Message::LastPage).unwrap();
        assert_eq!(model.get_uidata().page_index, 2);
        assert_eq!(model.get_uidata().nrows, 5);

        model.update(Message::NextPage).unwrap();
        assert_eq!(model.get_uidata().page_index, 2);
    }

    #[test]
    fn sort_message_keeps_the_page() {
        let mut model = model_with(many(25));
        model.update(Message::NextPage).unwrap();
        assert_eq!(model.get_uidata().page_index, 1);

        model.update(Message::SortBy(SortKey::Continent)).unwrap();
        assert_eq!(model.get_uidata().page_index, 1);
        assert_eq!(model.get_uidata().sort_key, SortKey::Continent);
    }

    #[test]
    fn has_states_cycle_filters_and_resets_the_page() {
        let mut model = model_with(many(25));
        model.update(Message::NextPage).unwrap();

        // all -> only true: 13 of the 25 records have states.
        model.update(Message::CycleHasStatesFilter).unwrap();
        let uidata = model.get_uidata();
        assert_eq!(uidata.page_index, 0);
        assert_eq!(uidata.total_count, 13);
        assert_eq!(uidata.has_states_label, "yes");
    }

    #[test]
    fn typed_filter_is_applied_on_enter() {
        let countries = vec![
            country("1", "Albania", "Europe", false),
            country("2", "Anguilla", "North America", false),
        ];
        let mut model = model_with(countries);

        model.update(Message::EnterFilterInput).unwrap();
        assert!(model.raw_keyevents());
        key(&mut model, KeyCode::Char('n'));
        key(&mut model, KeyCode::Char('o'));
        key(&mut model, KeyCode::Char('r'));
        key(&mut model, KeyCode::Enter);

        let uidata = model.get_uidata();
        assert!(!uidata.active_cmdinput);
        assert_eq!(uidata.continent_filter, "nor");
        assert_eq!(uidata.total_count, 1);
        assert_eq!(uidata.table[3].data, ["Anguilla"]);
    }

    #[test]
    fn escape_leaves_the_filter_untouched() {
        let mut model = model_with(many(5));
        model.update(Message::EnterFilterInput).unwrap();
        key(&mut model, KeyCode::Char('x'));
        key(&mut model, KeyCode::Esc);

        let uidata = model.get_uidata();
        assert!(!model.raw_keyevents());
        assert_eq!(uidata.continent_filter, "");
        assert_eq!(uidata.total_count, 5);
    }

    #[test]
    fn page_size_steps_through_the_options() {
        let mut model = model_with(many(60));
        model.update(Message::NextPage).unwrap();

        model.update(Message::GrowPageSize).unwrap();
        let uidata = model.get_uidata();
        assert_eq!(uidata.page_size, 25);
        assert_eq!(uidata.page_index, 0);

        model.update(Message::GrowPageSize).unwrap();
        assert_eq!(model.get_uidata().page_size, 50);
        // Already at the largest option.
        model.update(Message::GrowPageSize).unwrap();
        assert_eq!(model.get_uidata().page_size, 50);

        model.update(Message::ShrinkPageSize).unwrap();
        assert_eq!(model.get_uidata().page_size, 25);
    }

    #[test]
    fn selection_stays_within_the_visible_page() {
        let mut model = model_with(many(12));
        for _ in 0..20 {
            model.update(Message::MoveDown).unwrap();
        }
        assert_eq!(model.get_uidata().selected_row, 9);

        // The last page only has 2 rows, the selection must follow.
        model.update(Message::LastPage).unwrap();
        assert_eq!(model.get_uidata().selected_row, 1);

        model.update(Message::MoveUp).unwrap();
        assert_eq!(model.get_uidata().selected_row, 0);
    }

    #[test]
    fn sorted_column_header_carries_a_marker() {
        let mut model = model_with(many(3));
        let uidata = model.get_uidata();
        assert_eq!(uidata.table[3].name, "Name ▲");

        model.update(Message::SortBy(SortKey::NameUn)).unwrap();
        assert_eq!(model.get_uidata().table[3].name, "Name ▼");

        model.update(Message::SortBy(SortKey::Continent)).unwrap();
        let uidata = model.get_uidata();
        assert_eq!(uidata.table[3].name, "Name");
        assert_eq!(uidata.table[4].name, "Continent ▲");
    }

    #[test]
    fn help_popup_blocks_table_messages_until_closed() {
        let mut model = model_with(many(3));
        model.update(Message::Help).unwrap();
        assert!(model.get_uidata().show_popup);

        model.update(Message::NextPage).unwrap();
        assert_eq!(model.get_uidata().page_index, 0);

        model.update(Message::Exit).unwrap();
        assert!(!model.get_uidata().show_popup);
    }

    #[test]
    fn empty_dataset_renders_without_errors() {
        let mut model = model_with(Vec::new());
        let uidata = model.get_uidata();
        assert_eq!(uidata.total_count, 0);
        assert_eq!(uidata.nrows, 0);
        assert!(uidata.continents.is_empty());

        // Nothing to select, but nothing may panic either.
        model.update(Message::MoveDown).unwrap();
        model.update(Message::NextPage).unwrap();
        assert_eq!(model.get_uidata().page_index, 0);
    }

    #[test]
    fn initial_overrides_reach_the_view_state() {
        let countries = vec![
            country("1", "Albania", "Europe", false),
            country("2", "Argentina", "South America", true),
        ];
        let model = Model::init(
            &CtvConfig::default(),
            countries,
            Some("eu".to_string()),
            None,
            Some((SortKey::Id, SortDirection::Descending)),
        )
        .unwrap();
        let uidata = model.get_uidata();
        assert_eq!(uidata.continent_filter, "eu");
        assert_eq!(uidata.total_count, 1);
        assert_eq!(uidata.sort_key, SortKey::Id);
    }

    #[test]
    fn has_states_override_filters_from_the_start() {
        let countries = vec![
            country("1", "Albania", "Europe", false),
            country("2", "Argentina", "South America", true),
        ];
        let model = Model::init(
            &CtvConfig::default(),
            countries,
            None,
            Some(HasStatesFilter::Only(true)),
            None,
        )
        .unwrap();
        let uidata = model.get_uidata();
        assert_eq!(uidata.total_count, 1);
        assert_eq!(uidata.has_states_label, "yes");
        assert_eq!(uidata.table[3].data, ["Argentina"]);
    }

    #[test]
    fn csv_cells_are_escaped_when_needed() {
        assert_eq!(Model::wrap_cell_content("Albania"), "Albania");
        assert_eq!(
            Model::wrap_cell_content("North America"),
            "\"North America\""
        );
        assert_eq!(Model::wrap_cell_content("a\"b"), "a\"\"b");
        assert_eq!(Model::wrap_cell_content("a,b"), "\"a,b\"");
    }
}
