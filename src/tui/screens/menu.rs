//! The parent menu every other screen returns to.

use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Line;
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Padding, Paragraph};

use crate::ScreenKind;
use crate::core::SharedViewState;
use crate::tui::event::TuiEvent;
use crate::tui::screen::{Outcome, Screen, ScreenEvent, Task};

struct MenuItem {
    label: &'static str,
    hint: &'static str,
    action: MenuAction,
}

#[derive(Clone, Copy)]
enum MenuAction {
    Open(ScreenKind),
    Quit,
}

const ITEMS: &[MenuItem] = &[
    MenuItem {
        label: "Compare documents",
        hint: "Pick two workbooks and browse their differences",
        action: MenuAction::Open(ScreenKind::Diff),
    },
    MenuItem {
        label: "Browse logs",
        hint: "Filter and search the application log",
        action: MenuAction::Open(ScreenKind::Logs),
    },
    MenuItem {
        label: "Settings",
        hint: "Edit and save configuration",
        action: MenuAction::Open(ScreenKind::Settings),
    },
    MenuItem {
        label: "Quit",
        hint: "Leave cellview",
        action: MenuAction::Quit,
    },
];

pub struct MenuScreen {
    view: SharedViewState,
    list_state: ListState,
}

impl MenuScreen {
    pub fn new() -> Self {
        Self {
            view: SharedViewState::new(),
            list_state: ListState::default(),
        }
    }

    pub fn view(&self) -> &SharedViewState {
        &self.view
    }
}

impl Default for MenuScreen {
    fn default() -> Self {
        Self::new()
    }
}

impl Screen for MenuScreen {
    fn kind(&self) -> ScreenKind {
        ScreenKind::Menu
    }

    fn init(&mut self) -> Option<Task> {
        self.view.reset();
        None
    }

    fn handle_event(&mut self, event: ScreenEvent) -> Outcome {
        let ScreenEvent::Input(input) = event else {
            return Outcome::Stay;
        };
        match input {
            TuiEvent::Resize(width, height) => self.view.set_size(width, height),
            TuiEvent::Up | TuiEvent::Char('k') => self.view.move_cursor(-1, ITEMS.len()),
            TuiEvent::Down | TuiEvent::Char('j') => self.view.move_cursor(1, ITEMS.len()),
            TuiEvent::Enter | TuiEvent::Char(' ') => {
                return match ITEMS.get(self.view.cursor()).map(|item| item.action) {
                    Some(MenuAction::Open(kind)) => Outcome::Open(kind),
                    Some(MenuAction::Quit) => Outcome::Quit,
                    None => Outcome::Stay,
                };
            }
            TuiEvent::Escape | TuiEvent::Char('q') => return Outcome::Quit,
            _ => {}
        }
        Outcome::Stay
    }

    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let [title_area, list_area, hint_area] = Layout::vertical([
            Constraint::Length(3),
            Constraint::Min(ITEMS.len() as u16 + 2),
            Constraint::Length(2),
        ])
        .areas(area);

        let title = Paragraph::new(Line::from("cellview").centered())
            .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
            .block(Block::default().borders(Borders::BOTTOM));
        frame.render_widget(title, title_area);

        let cursor = self.view.cursor();
        let items: Vec<ListItem> = ITEMS
            .iter()
            .enumerate()
            .map(|(i, item)| {
                let style = if i == cursor {
                    Style::default()
                        .fg(Color::White)
                        .add_modifier(Modifier::BOLD | Modifier::REVERSED)
                } else {
                    Style::default().fg(Color::Gray)
                };
                ListItem::new(Line::styled(format!("  {}  ", item.label), style))
            })
            .collect();
        self.list_state.select(Some(cursor));
        let list = List::new(items).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::DarkGray))
                .title(" Menu ")
                .title_bottom(Line::from(" ↑/↓ Move  Enter Open  q Quit ").centered())
                .padding(Padding::horizontal(1)),
        );
        frame.render_stateful_widget(list, list_area, &mut self.list_state);

        let hint = ITEMS.get(cursor).map(|item| item.hint).unwrap_or_default();
        frame.render_widget(
            Paragraph::new(hint)
                .alignment(Alignment::Center)
                .style(Style::default().fg(Color::DarkGray)),
            hint_area,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    fn key(screen: &mut MenuScreen, event: TuiEvent) -> Outcome {
        screen.handle_event(ScreenEvent::Input(event))
    }

    #[test]
    fn test_enter_opens_selected_screen() {
        let mut menu = MenuScreen::new();
        assert!(menu.init().is_none());
        assert!(matches!(key(&mut menu, TuiEvent::Enter), Outcome::Open(ScreenKind::Diff)));

        key(&mut menu, TuiEvent::Down);
        assert!(matches!(key(&mut menu, TuiEvent::Enter), Outcome::Open(ScreenKind::Logs)));

        key(&mut menu, TuiEvent::Down);
        assert!(matches!(key(&mut menu, TuiEvent::Enter), Outcome::Open(ScreenKind::Settings)));
    }

    #[test]
    fn test_cursor_clamps_at_ends() {
        let mut menu = MenuScreen::new();
        key(&mut menu, TuiEvent::Up);
        assert_eq!(menu.view().cursor(), 0);
        for _ in 0..10 {
            key(&mut menu, TuiEvent::Down);
        }
        assert_eq!(menu.view().cursor(), ITEMS.len() - 1);
        assert!(matches!(key(&mut menu, TuiEvent::Enter), Outcome::Quit));
    }

    #[test]
    fn test_q_and_escape_quit() {
        let mut menu = MenuScreen::new();
        assert!(matches!(key(&mut menu, TuiEvent::Char('q')), Outcome::Quit));
        assert!(matches!(key(&mut menu, TuiEvent::Escape), Outcome::Quit));
    }

    #[test]
    fn test_render_lists_items() {
        let backend = TestBackend::new(60, 14);
        let mut terminal = Terminal::new(backend).unwrap();
        let mut menu = MenuScreen::new();

        terminal.draw(|f| menu.render(f, f.area())).unwrap();

        let text = terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect::<String>();
        assert!(text.contains("Compare documents"));
        assert!(text.contains("Browse logs"));
        assert!(text.contains("Settings"));
        assert!(text.contains("Pick two workbooks"));
    }
}
