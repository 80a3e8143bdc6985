//! # Diff Browser
//!
//! Read-only views over a finished comparison. Four display modes, cycled
//! with Tab:
//!
//! - **Summary**: sheet/cell counts and one line per changed sheet
//! - **By sheet**: one sheet at a time with its change table
//! - **By cell**: one change at a time, old and new side of it
//! - **Side by side**: old/new columns for every change, selected one highlighted
//!
//! Follows the persistent state + transient render pattern: `DiffBrowser`
//! owns the comparison and browsing position; `render` borrows it per frame.

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Padding, Paragraph};

use crate::sources::{CellChange, ChangeKind, DocumentDiff, SheetDiff};
use crate::tui::event::TuiEvent;
use crate::tui::text;

/// Rows the browser frame takes from the viewport (borders + padding).
pub const BROWSER_CHROME_ROWS: u16 = 4;

const TABLE_VALUE_WIDTH: usize = 30;
const DETAIL_WRAP_WIDTH: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayMode {
    Summary,
    BySheet,
    ByCell,
    SideBySide,
}

impl DisplayMode {
    pub fn next(self) -> Self {
        match self {
            DisplayMode::Summary => DisplayMode::BySheet,
            DisplayMode::BySheet => DisplayMode::ByCell,
            DisplayMode::ByCell => DisplayMode::SideBySide,
            DisplayMode::SideBySide => DisplayMode::Summary,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            DisplayMode::Summary => "Summary",
            DisplayMode::BySheet => "By sheet",
            DisplayMode::ByCell => "By cell",
            DisplayMode::SideBySide => "Side by side",
        }
    }
}

pub struct DiffBrowser {
    diff: DocumentDiff,
    mode: DisplayMode,
    scroll: usize,
    selected: usize,
    show_details: bool,
}

impl DiffBrowser {
    pub fn new(diff: DocumentDiff) -> Self {
        Self {
            diff,
            mode: DisplayMode::Summary,
            scroll: 0,
            selected: 0,
            show_details: false,
        }
    }

    pub fn diff(&self) -> &DocumentDiff {
        &self.diff
    }

    pub fn mode(&self) -> DisplayMode {
        self.mode
    }

    pub fn scroll(&self) -> usize {
        self.scroll
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn show_details(&self) -> bool {
        self.show_details
    }

    /// Number of discrete items left/right moves between in the current mode.
    pub fn selectable_count(&self) -> usize {
        match self.mode {
            DisplayMode::Summary => 0,
            DisplayMode::BySheet => self.diff.sheet_diffs.len(),
            DisplayMode::ByCell | DisplayMode::SideBySide => self.diff.change_count(),
        }
    }

    /// `viewport_rows` is the height available to the browser's content.
    pub fn handle_event(&mut self, event: TuiEvent, viewport_rows: usize) {
        match event {
            TuiEvent::Up | TuiEvent::Char('k') => self.scroll = self.scroll.saturating_sub(1),
            TuiEvent::Down | TuiEvent::Char('j') => {
                let max_scroll = self.line_count().saturating_sub(viewport_rows.max(1));
                self.scroll = (self.scroll + 1).min(max_scroll);
            }
            TuiEvent::Left | TuiEvent::Char('h') => self.selected = self.selected.saturating_sub(1),
            TuiEvent::Right | TuiEvent::Char('l') => {
                let count = self.selectable_count();
                if count > 0 {
                    self.selected = (self.selected + 1).min(count - 1);
                }
            }
            TuiEvent::Tab => {
                self.mode = self.mode.next();
                self.scroll = 0;
                self.selected = 0;
            }
            TuiEvent::Char('d') => self.show_details = !self.show_details,
            _ => {}
        }
    }

    pub fn line_count(&self) -> usize {
        self.lines().len()
    }

    /// The content of the current mode, unscrolled.
    pub fn lines(&self) -> Vec<Line<'static>> {
        if !self.diff.has_changes() {
            return vec![Line::styled(
                "✓ No changes detected",
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
            )];
        }
        match self.mode {
            DisplayMode::Summary => self.summary_lines(),
            DisplayMode::BySheet => self.sheet_lines(),
            DisplayMode::ByCell => self.cell_lines(),
            DisplayMode::SideBySide => self.side_by_side_lines(),
        }
    }

    fn summary_lines(&self) -> Vec<Line<'static>> {
        let summary = &self.diff.summary;
        let mut lines = vec![heading("Diff Summary"), Line::default()];
        let counts = [
            (summary.added_sheets, "Sheets added", Color::Green),
            (summary.modified_sheets, "Sheets modified", Color::Yellow),
            (summary.deleted_sheets, "Sheets deleted", Color::Red),
            (summary.cell_changes, "Cells changed", Color::Magenta),
        ];
        for (count, label, color) in counts {
            if count > 0 {
                lines.push(Line::from(vec![
                    Span::styled(format!("{count:>6}  "), Style::default().fg(color).add_modifier(Modifier::BOLD)),
                    Span::raw(label),
                ]));
            }
        }
        lines.push(Line::default());
        for sheet in &self.diff.sheet_diffs {
            let kind = sheet.action.change_kind();
            let mut spans = vec![
                Span::styled(format!("{} ", kind.symbol()), kind_style(kind)),
                Span::styled(sheet.sheet_name.clone(), kind_style(kind)),
            ];
            if !sheet.changes.is_empty() {
                spans.push(Span::styled(
                    format!(" ({} changes)", sheet.changes.len()),
                    muted(),
                ));
            }
            lines.push(Line::from(spans));
        }
        lines
    }

    fn sheet_lines(&self) -> Vec<Line<'static>> {
        let sheets = &self.diff.sheet_diffs;
        let Some(sheet) = sheets.get(self.selected.min(sheets.len().saturating_sub(1))) else {
            return vec![Line::styled("No sheet changes", muted())];
        };
        let mut lines = vec![
            heading(&format!("Sheet: {}", sheet.sheet_name)),
            Line::styled(
                format!("Action: {}", sheet.action),
                kind_style(sheet.action.change_kind()).add_modifier(Modifier::BOLD),
            ),
            Line::default(),
        ];
        lines.extend(change_table(sheet));
        lines.push(Line::default());
        lines.push(Line::styled(
            format!("Sheet {} of {}", self.selected + 1, sheets.len()),
            muted(),
        ));
        lines
    }

    fn cell_lines(&self) -> Vec<Line<'static>> {
        let total = self.diff.change_count();
        let Some((sheet, change)) = self.diff.changes().nth(self.selected) else {
            return vec![Line::styled("No cell changes", muted())];
        };
        let mut lines = vec![
            Line::from(vec![
                Span::styled(format!("{} ", change.kind.symbol()), kind_style(change.kind)),
                Span::styled(
                    format!("Cell {}", change.cell),
                    Style::default().add_modifier(Modifier::BOLD),
                ),
                Span::raw(" - "),
                Span::styled(change.kind.to_string(), kind_style(change.kind).add_modifier(Modifier::BOLD)),
            ]),
            Line::styled(format!("Sheet: {sheet}"), muted()),
            Line::default(),
        ];
        if change.old_value.is_some() || change.old_formula.is_some() {
            lines.extend(detailed_side("Old", change.old_value.as_ref(), change.old_formula.as_deref()));
        }
        if change.new_value.is_some() || change.new_formula.is_some() {
            lines.extend(detailed_side("New", change.new_value.as_ref(), change.new_formula.as_deref()));
        }
        if self.show_details {
            lines.push(Line::default());
            lines.extend(metadata_lines(change));
        }
        lines.push(Line::default());
        lines.push(Line::styled(
            format!("Change {} of {}", self.selected + 1, total),
            muted(),
        ));
        lines
    }

    fn side_by_side_lines(&self) -> Vec<Line<'static>> {
        let total = self.diff.change_count();
        if total == 0 {
            return vec![
                heading("Side-by-Side Comparison"),
                Line::default(),
                Line::styled("No changes to display", muted()),
            ];
        }
        let mut lines = vec![
            Line::styled(
                format!(
                    "{} {} {} {}",
                    text::fit("", 2),
                    text::fit("Cell", 12),
                    text::fit("Old Version", TABLE_VALUE_WIDTH),
                    "New Version"
                ),
                Style::default().add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
            ),
        ];
        for (i, (sheet, change)) in self.diff.changes().enumerate() {
            let old = if change.kind == ChangeKind::Add {
                String::new()
            } else {
                text::cell_summary(change.old_value.as_ref(), change.old_formula.as_deref())
            };
            let new = if change.kind == ChangeKind::Delete {
                String::new()
            } else {
                text::cell_summary(change.new_value.as_ref(), change.new_formula.as_deref())
            };
            let row = format!(
                "{} {} {} {}",
                text::fit(&change.kind.symbol().to_string(), 2),
                text::fit(&format!("{sheet}!{}", change.cell), 12),
                text::fit(&old, TABLE_VALUE_WIDTH),
                text::truncate(&new, TABLE_VALUE_WIDTH)
            );
            let style = if i == self.selected {
                kind_style(change.kind).add_modifier(Modifier::REVERSED | Modifier::BOLD)
            } else {
                kind_style(change.kind)
            };
            lines.push(Line::styled(row, style));
            if i == self.selected && self.show_details {
                for line in metadata_lines(change) {
                    lines.push(line);
                }
            }
        }
        lines.push(Line::default());
        lines.push(Line::styled(
            format!("Change {} of {}", self.selected + 1, total),
            muted(),
        ));
        lines
    }

    fn help(&self) -> &'static str {
        match self.mode {
            DisplayMode::Summary => " Tab View  d Details  ↑/↓ Scroll  Esc Back ",
            DisplayMode::BySheet => " ←/→ Sheets  Tab View  ↑/↓ Scroll  Esc Back ",
            DisplayMode::ByCell | DisplayMode::SideBySide => {
                " ←/→ Changes  Tab View  d Details  ↑/↓ Scroll  Esc Back "
            }
        }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray))
            .title(format!(" Diff: {} ", self.mode.label()))
            .title_bottom(Line::from(self.help()).centered())
            .padding(Padding::new(1, 1, 1, 0));
        let paragraph = Paragraph::new(self.lines())
            .block(block)
            .scroll((self.scroll.min(u16::MAX as usize) as u16, 0));
        frame.render_widget(paragraph, area);
    }
}

fn change_table(sheet: &SheetDiff) -> Vec<Line<'static>> {
    let mut lines = vec![Line::styled(
        format!(
            "{} {} {} {}",
            text::fit("Cell", 8),
            text::fit("Type", 8),
            text::fit("Old Value", TABLE_VALUE_WIDTH),
            "New Value"
        ),
        Style::default().add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
    )];
    for change in &sheet.changes {
        let old = text::cell_summary(change.old_value.as_ref(), change.old_formula.as_deref());
        let new = text::cell_summary(change.new_value.as_ref(), change.new_formula.as_deref());
        lines.push(Line::styled(
            format!(
                "{} {} {} {}",
                text::fit(&change.cell, 8),
                text::fit(change.kind.as_str(), 8),
                text::fit(&old, TABLE_VALUE_WIDTH),
                text::truncate(&new, TABLE_VALUE_WIDTH)
            ),
            kind_style(change.kind),
        ));
    }
    lines
}

fn detailed_side(label: &str, value: Option<&serde_json::Value>, formula: Option<&str>) -> Vec<Line<'static>> {
    let mut lines = vec![Line::styled(
        format!("{label}:"),
        Style::default().add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
    )];
    if let Some(formula) = formula {
        lines.push(Line::from(vec![
            Span::raw("  Formula: "),
            Span::styled(formula.to_string(), Style::default().fg(Color::Cyan)),
        ]));
    }
    if value.is_some() || formula.is_none() {
        let rendered = text::cell_value(value);
        for (i, part) in text::wrap(&rendered, DETAIL_WRAP_WIDTH).into_iter().enumerate() {
            let prefix = if i == 0 { "  Value: " } else { "         " };
            lines.push(Line::raw(format!("{prefix}{part}")));
        }
    }
    lines
}

fn metadata_lines(change: &CellChange) -> Vec<Line<'static>> {
    let yes_no = |flag: bool| if flag { "yes" } else { "no" };
    let mut lines = Vec::new();
    if let Some(value) = &change.old_value {
        lines.push(Line::styled(format!("    Old type: {}", text::value_type(value)), muted()));
    }
    if let Some(value) = &change.new_value {
        lines.push(Line::styled(format!("    New type: {}", text::value_type(value)), muted()));
    }
    lines.push(Line::styled(
        format!("    Style changed: {}", yes_no(change.style_changed)),
        muted(),
    ));
    lines.push(Line::styled(
        format!("    Comment changed: {}", yes_no(change.comment_changed)),
        muted(),
    ));
    lines
}

fn heading(text: &str) -> Line<'static> {
    Line::styled(
        text.to_string(),
        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
    )
}

fn muted() -> Style {
    Style::default().fg(Color::DarkGray)
}

fn kind_style(kind: ChangeKind) -> Style {
    match kind {
        ChangeKind::Add => Style::default().fg(Color::Green),
        ChangeKind::Modify => Style::default().fg(Color::Yellow),
        ChangeKind::Delete => Style::default().fg(Color::Red),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::{CellDiffEngine, DiffEngine, StructuredDocument};
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;
    use serde_json::json;

    fn two_sheet_diff() -> DocumentDiff {
        let old: StructuredDocument = serde_json::from_value(json!({"sheets": [
            {"name": "Budget", "cells": {"A1": {"value": 1}, "A2": {"value": 2}}},
            {"name": "Notes", "cells": {"B1": {"value": "draft"}}}
        ]}))
        .unwrap();
        let new: StructuredDocument = serde_json::from_value(json!({"sheets": [
            {"name": "Budget", "cells": {"A1": {"value": 10}, "A2": {"value": 2, "formula": "1+1"}}},
            {"name": "Notes", "cells": {"B1": {"value": "final"}}}
        ]}))
        .unwrap();
        CellDiffEngine.compute(&old, &new)
    }

    fn screen_text(browser: &DiffBrowser, width: u16, height: u16) -> String {
        let backend = TestBackend::new(width, height);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal.draw(|f| browser.render(f, f.area())).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect::<String>()
    }

    #[test]
    fn test_starts_in_summary() {
        let browser = DiffBrowser::new(two_sheet_diff());
        assert_eq!(browser.mode(), DisplayMode::Summary);
        assert_eq!(browser.scroll(), 0);
        assert_eq!(browser.selected(), 0);
        assert!(!browser.show_details());
        assert_eq!(browser.selectable_count(), 0);
    }

    #[test]
    fn test_tab_cycles_modes_and_resets_position() {
        let mut browser = DiffBrowser::new(two_sheet_diff());
        browser.handle_event(TuiEvent::Tab, 20);
        assert_eq!(browser.mode(), DisplayMode::BySheet);
        browser.handle_event(TuiEvent::Right, 20);
        assert_eq!(browser.selected(), 1);

        browser.handle_event(TuiEvent::Tab, 20);
        assert_eq!(browser.mode(), DisplayMode::ByCell);
        assert_eq!(browser.selected(), 0);
        browser.handle_event(TuiEvent::Tab, 20);
        assert_eq!(browser.mode(), DisplayMode::SideBySide);
        browser.handle_event(TuiEvent::Tab, 20);
        assert_eq!(browser.mode(), DisplayMode::Summary);
    }

    #[test]
    fn test_selection_bounded_by_mode_items() {
        let mut browser = DiffBrowser::new(two_sheet_diff());
        // Summary has nothing to select
        browser.handle_event(TuiEvent::Right, 20);
        assert_eq!(browser.selected(), 0);

        browser.handle_event(TuiEvent::Tab, 20);
        for _ in 0..5 {
            browser.handle_event(TuiEvent::Right, 20);
        }
        assert_eq!(browser.selected(), 1, "two sheets changed");

        browser.handle_event(TuiEvent::Tab, 20);
        for _ in 0..5 {
            browser.handle_event(TuiEvent::Right, 20);
        }
        assert_eq!(browser.selected(), 2, "three cells changed");
        browser.handle_event(TuiEvent::Left, 20);
        assert_eq!(browser.selected(), 1);
    }

    #[test]
    fn test_scroll_bounded_by_line_count() {
        let mut browser = DiffBrowser::new(two_sheet_diff());
        let lines = browser.line_count();
        for _ in 0..100 {
            browser.handle_event(TuiEvent::Down, 3);
        }
        assert_eq!(browser.scroll(), lines - 3);

        // Content that fits never scrolls
        let mut fits = DiffBrowser::new(two_sheet_diff());
        fits.handle_event(TuiEvent::Down, 100);
        assert_eq!(fits.scroll(), 0);

        browser.handle_event(TuiEvent::Up, 3);
        assert_eq!(browser.scroll(), lines - 4);
    }

    #[test]
    fn test_details_toggle() {
        let mut browser = DiffBrowser::new(two_sheet_diff());
        browser.handle_event(TuiEvent::Char('d'), 20);
        assert!(browser.show_details());
        browser.handle_event(TuiEvent::Char('d'), 20);
        assert!(!browser.show_details());
    }

    #[test]
    fn test_render_summary() {
        let browser = DiffBrowser::new(two_sheet_diff());
        let text = screen_text(&browser, 80, 20);
        assert!(text.contains("Diff Summary"));
        assert!(text.contains("Sheets modified"));
        assert!(text.contains("Cells changed"));
        assert!(text.contains("Budget (2 changes)"));
    }

    #[test]
    fn test_render_by_sheet_shows_position() {
        let mut browser = DiffBrowser::new(two_sheet_diff());
        browser.handle_event(TuiEvent::Tab, 20);
        let text = screen_text(&browser, 90, 20);
        assert!(text.contains("Sheet: Budget"));
        assert!(text.contains("Sheet 1 of 2"));
        assert!(text.contains("=1+1"));
    }

    #[test]
    fn test_render_by_cell_with_details() {
        let mut browser = DiffBrowser::new(two_sheet_diff());
        browser.handle_event(TuiEvent::Tab, 20);
        browser.handle_event(TuiEvent::Tab, 20);
        browser.handle_event(TuiEvent::Char('d'), 20);
        let text = screen_text(&browser, 80, 24);
        assert!(text.contains("Cell A1"));
        assert!(text.contains("Value: 10"));
        assert!(text.contains("Style changed: no"));
        assert!(text.contains("Change 1 of 3"));
    }

    #[test]
    fn test_render_side_by_side() {
        let mut browser = DiffBrowser::new(two_sheet_diff());
        for _ in 0..3 {
            browser.handle_event(TuiEvent::Tab, 20);
        }
        let text = screen_text(&browser, 100, 20);
        assert!(text.contains("Old Version"));
        assert!(text.contains("draft"));
        assert!(text.contains("final"));
    }

    #[test]
    fn test_render_no_changes() {
        let browser = DiffBrowser::new(DocumentDiff::default());
        let text = screen_text(&browser, 60, 10);
        assert!(text.contains("No changes detected"));
    }
}
