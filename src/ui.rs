use ratatui::{
    Frame,
    layout::{Constraint, Layout, Position, Rect},
    style::{Modifier, Style, Stylize},
    text::Line,
    widgets::{Block, Cell, Clear, Paragraph, Row, Table},
};

use crate::model::{Model, UIData};
use crate::view::SortDirection;

pub const CMDLINE_HEIGHT: u16 = 1;

pub struct TableUI;

impl TableUI {
    pub fn new() -> Self {
        Self
    }

    pub fn draw(&self, model: &Model, frame: &mut Frame) {
        let uidata = model.get_uidata();
        let [table_area, cmdline_area] =
            Layout::vertical([Constraint::Fill(1), Constraint::Length(CMDLINE_HEIGHT)])
                .areas(frame.area());

        self.draw_table(uidata, frame, table_area);
        if uidata.active_cmdinput {
            self.draw_filter_input(uidata, frame, cmdline_area);
        } else {
            self.draw_statusline(uidata, frame, cmdline_area);
        }
        if uidata.show_popup {
            self.draw_popup(uidata, frame);
        }
    }

    fn draw_table(&self, uidata: &UIData, frame: &mut Frame, area: Rect) {
        let title = Line::from(" Countries ".bold());
        let block = Block::bordered().title(title.centered());

        let header = Row::new(
            uidata
                .table
                .iter()
                .map(|column| Cell::from(column.name.clone())),
        )
        .style(Style::default().add_modifier(Modifier::BOLD));

        let rows = (0..uidata.nrows).map(|ridx| {
            let row = Row::new(
                uidata
                    .table
                    .iter()
                    .map(|column| Cell::from(column.data[ridx].clone())),
            );
            if ridx == uidata.selected_row {
                row.style(Style::default().add_modifier(Modifier::REVERSED))
            } else {
                row
            }
        });

        let widths: Vec<Constraint> = uidata
            .table
            .iter()
            .map(|column| Constraint::Length(column.width as u16))
            .collect();

        let table = Table::new(rows, widths).header(header).block(block);
        frame.render_widget(table, area);
    }

    fn draw_statusline(&self, uidata: &UIData, frame: &mut Frame, area: Rect) {
        let direction = match uidata.sort_direction {
            SortDirection::Ascending => "asc",
            SortDirection::Descending => "desc",
        };
        let continent = if uidata.continent_filter.is_empty() {
            "all".to_string()
        } else {
            format!("\"{}\"", uidata.continent_filter)
        };
        let status = format!(
            " Page {}/{} | {} rows | continent: {} | hasStates: {} | sort: {} {} | {}",
            uidata.page_index + 1,
            std::cmp::max(uidata.page_count, 1),
            uidata.total_count,
            continent,
            uidata.has_states_label,
            uidata.sort_key.label(),
            direction,
            uidata.status_message,
        );
        frame.render_widget(Paragraph::new(status), area);
    }

    fn draw_filter_input(&self, uidata: &UIData, frame: &mut Frame, area: Rect) {
        let prompt = format!(" Filter by continent ({}): ", uidata.continents.join(", "));
        let line = Line::from(vec![
            prompt.clone().bold(),
            uidata.cmdinput.input.clone().into(),
        ]);
        frame.render_widget(Paragraph::new(line), area);

        let cursor_x = area.x + (prompt.chars().count() + uidata.cmdinput.cursor_pos) as u16;
        frame.set_cursor_position(Position::new(cursor_x, area.y));
    }

    fn draw_popup(&self, uidata: &UIData, frame: &mut Frame) {
        let area = Self::centered_rect(frame.area(), 60, 24);
        let title = Line::from(" Help ".bold());
        let block = Block::bordered().title(title.centered());
        frame.render_widget(Clear, area);
        frame.render_widget(
            Paragraph::new(uidata.popup_message.clone()).block(block),
            area,
        );
    }

    fn centered_rect(area: Rect, width: u16, height: u16) -> Rect {
        let width = std::cmp::min(width, area.width);
        let height = std::cmp::min(height, area.height);
        Rect {
            x: area.x + (area.width - width) / 2,
            y: area.y + (area.height - height) / 2,
            width,
            height,
        }
    }
}

impl Default for TableUI {
    fn default() -> Self {
        Self::new()
    }
}
