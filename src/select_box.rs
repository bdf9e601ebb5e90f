use std::io::{self, Write};

use crate::input::InputBuffer;
use crate::record::Record;
use crate::terminal::Terminal;

use ratatui::prelude::*;
use ratatui::widgets::*;

use crossterm::event::{self, Event, KeyEventKind};
use unicode_width::UnicodeWidthStr;

use fuzzy_matcher::{skim::SkimMatcherV2, FuzzyMatcher};

const INFO_TEXT_NORMAL_MODE: &str =
    "(Esc) quit | (↑) move up | (↓) move down | (Enter) connect | (/) search";
const INFO_TEXT_SEARCH_MODE: &str =
    "(Esc) quit search | (↑) move up | (↓) move down | (Enter) connect";
const SEARCH_SYMBOL: &str = "🔍 ";

enum Mode {
    Normal,
    Search,
}

/// A row of the table: index into `data` plus matched char positions of
/// host, user and hostname.
type Match = (usize, [Vec<usize>; 3]);

/// Interactive table of cached hosts with fuzzy search.
pub struct SelectBox {
    pub data: Vec<Record>,
    state: TableState,
    longest_item_lens: (u16, u16, u16), // order is (host, user, hostname)
    matches: Vec<Match>,
    input_buffer: InputBuffer,
    mode: Mode,
}

impl SelectBox {
    pub fn new(data: Vec<Record>) -> Self {
        let longest = |field: fn(&Record) -> &str| {
            data.iter()
                .map(|d| UnicodeWidthStr::width(field(d)))
                .max()
                .unwrap_or(0) as u16
        };

        let mut select_box = Self {
            longest_item_lens: (
                longest(|d| d.alias.as_str()),
                longest(|d| d.user.as_str()),
                longest(|d| d.hostname.as_str()),
            ),
            matches: Vec::new(),
            state: TableState::default().with_selected(Some(0)),
            input_buffer: InputBuffer::new(SEARCH_SYMBOL),
            mode: Mode::Normal,
            data,
        };
        select_box.refresh();
        select_box
    }

    /// Height the inline viewport needs to show every row.
    pub fn height(&self) -> u16 {
        self.data.len() as u16 + 5
    }

    pub fn select(&mut self, terminal: &mut Terminal<impl Write>) -> io::Result<Option<Record>> {
        let mut selected: Option<Record> = None;
        loop {
            self.draw(terminal)?;
            let Event::Key(key) = event::read()? else {
                continue;
            };
            if key.kind != KeyEventKind::Press {
                continue;
            }

            use event::KeyCode::*;
            match key.code {
                Down => self.down(),
                Up => self.up(),
                Enter => {
                    // If no host is selected, do nothing
                    if let Some(record) = self.selected() {
                        selected = Some(record.clone());
                        terminal.clear()?;
                        break;
                    }
                }
                _ => match self.mode {
                    Mode::Normal => match key.code {
                        Esc => {
                            terminal.clear()?;
                            break;
                        }
                        Char('/') => {
                            self.mode = Mode::Search;
                            self.input_buffer.reset();
                        }
                        _ => {}
                    },
                    Mode::Search => {
                        if key.code == Esc {
                            self.input_buffer.reset();
                            self.mode = Mode::Normal;
                        } else {
                            self.input_buffer.handle_event(&Event::Key(key));
                        }
                        self.refresh();
                    }
                },
            }
        }
        Ok(selected)
    }

    /// The record under the cursor in the current, possibly filtered, view.
    pub fn selected(&self) -> Option<&Record> {
        let (index, _) = self.matches.get(self.state.selected()?)?;
        self.data.get(*index)
    }

    pub fn draw(&mut self, terminal: &mut Terminal<impl Write>) -> io::Result<()> {
        terminal.draw(|frame| {
            self.ui(frame);
        })?;
        Ok(())
    }

    fn ui(&mut self, f: &mut Frame) {
        let header = Row::new(vec![
            Cell::from("Host").style(Style::default().add_modifier(Modifier::UNDERLINED)),
            Cell::from("User").style(Style::default().add_modifier(Modifier::UNDERLINED)),
            Cell::from("HostName").style(Style::default().add_modifier(Modifier::UNDERLINED)),
            Cell::from("Logins").style(Style::default().add_modifier(Modifier::UNDERLINED)),
        ])
        .style(Style::default().add_modifier(Modifier::BOLD));

        let rows: Vec<Row> = self
            .matches
            .iter()
            .map(|(index, indices)| {
                let record = &self.data[*index];
                Row::new([
                    Text::from(Line::from(Self::get_highlight_spans(
                        &record.alias,
                        &indices[0],
                    ))),
                    Text::from(Line::from(Self::get_highlight_spans(
                        &record.user,
                        &indices[1],
                    ))),
                    Text::from(Line::from(Self::get_highlight_spans(
                        &record.hostname,
                        &indices[2],
                    ))),
                    Text::from(record.use_count.to_string()),
                ])
            })
            .collect();

        let table = Table::new(
            rows,
            [
                Constraint::Length(self.longest_item_lens.0 + 1),
                Constraint::Min(self.longest_item_lens.1 + 1),
                Constraint::Min(self.longest_item_lens.2 + 1),
                Constraint::Length(6),
            ],
        )
        .header(header)
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
        .highlight_spacing(HighlightSpacing::Always);

        let info = match self.mode {
            Mode::Normal => Paragraph::new(Line::from(INFO_TEXT_NORMAL_MODE)).centered(),
            Mode::Search => Paragraph::new(Line::from(INFO_TEXT_SEARCH_MODE)).centered(),
        };

        match self.mode {
            Mode::Search => {
                let recs = Layout::vertical([
                    Constraint::Length(self.data.len() as u16 + 2),
                    Constraint::Length(3),
                    Constraint::Length(1),
                ])
                .split(f.size());

                let input = Paragraph::new(
                    Text::from(self.input_buffer.line()).style(Style::default().fg(Color::Cyan)),
                )
                .block(Block::default().borders(Borders::ALL));

                StatefulWidget::render(table, recs[0], f.buffer_mut(), &mut self.state);
                input.render(recs[1], f.buffer_mut());
                info.render(recs[2], f.buffer_mut());

                f.set_cursor(
                    recs[1].x + 1 + self.input_buffer.visual_cursor() as u16,
                    recs[1].y + 1,
                );
            }
            Mode::Normal => {
                let recs = Layout::vertical([
                    Constraint::Length(self.data.len() as u16 + 2),
                    Constraint::Length(1),
                ])
                .split(f.size());

                StatefulWidget::render(table, recs[0], f.buffer_mut(), &mut self.state);
                info.render(recs[1], f.buffer_mut());
            }
        }
    }

    fn up(&mut self) {
        if self.matches.is_empty() {
            return;
        }
        let i = match self.state.selected() {
            Some(0) | None => self.matches.len() - 1,
            Some(i) => i - 1,
        };
        self.state.select(Some(i))
    }

    fn down(&mut self) {
        if self.matches.is_empty() {
            return;
        }
        let i = match self.state.selected() {
            Some(i) if i + 1 < self.matches.len() => i + 1,
            _ => 0,
        };
        self.state.select(Some(i))
    }

    /// Recomputes the visible rows after the search pattern changed.
    fn refresh(&mut self) {
        self.matches = self.fuzzy_match(self.input_buffer.pattern());
        let selected = if self.matches.is_empty() { None } else { Some(0) };
        self.state.select(selected);
    }

    // return order: host, user, hostname
    fn fuzzy_match(&self, pattern: &str) -> Vec<Match> {
        // if the pattern is empty, show all the data
        if pattern.is_empty() {
            return (0..self.data.len()).map(|i| (i, Default::default())).collect();
        }

        let matcher = SkimMatcherV2::default();
        let indices = |text: &str| {
            matcher
                .fuzzy_indices(text, pattern)
                .map(|(_, indices)| indices)
                .unwrap_or_default()
        };

        self.data
            .iter()
            .enumerate()
            .filter_map(|(i, record)| {
                let found = [
                    indices(&record.alias),
                    indices(&record.user),
                    indices(&record.hostname),
                ];
                if found.iter().all(Vec::is_empty) {
                    None
                } else {
                    Some((i, found))
                }
            })
            .collect()
    }

    fn get_highlight_spans<'b>(input: &str, indices: &[usize]) -> Vec<Span<'b>> {
        let mut spans = Vec::new();
        let mut current_segment = String::new();
        let mut index_set: Vec<usize> = indices.to_vec();
        index_set.sort_unstable();
        index_set.dedup();

        let highlight_style = Style::default()
            .fg(Color::Rgb(250, 0, 0))
            .bg(Color::Rgb(0xFF, 0xFC, 0x67))
            .add_modifier(Modifier::BOLD);
        for (i, c) in input.chars().enumerate() {
            if index_set.binary_search(&i).is_ok() {
                if !current_segment.is_empty() {
                    spans.push(Span::raw(std::mem::take(&mut current_segment)));
                }
                spans.push(Span::styled(c.to_string(), highlight_style));
            } else {
                current_segment.push(c);
            }
        }

        if !current_segment.is_empty() {
            spans.push(Span::raw(current_segment));
        }

        spans
    }
}
