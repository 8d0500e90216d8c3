//! Table of managed roles and their observed state.

use pf_protocol::role_models::{RoleKind, RoleObservation};
use ratatui::layout::{Constraint, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Cell, Row, Table};
use ratatui::Frame;
use std::collections::HashSet;

/// Render one row per role: name, running/stopped, last action.
///
/// Roles with an action in flight are marked busy next to their state.
pub fn render_role_table(
    frame: &mut Frame,
    area: Rect,
    roles: &[RoleObservation],
    in_flight: &HashSet<RoleKind>,
) {
    let rows: Vec<Row> = roles
        .iter()
        .map(|observation| {
            let (state, color) = if observation.running {
                ("Running", Color::Green)
            } else {
                ("Stopped", Color::Gray)
            };
            let state = if in_flight.contains(&observation.role) {
                format!("{state} (busy)")
            } else {
                state.to_string()
            };

            Row::new(vec![
                Cell::from(observation.role.label()),
                Cell::from(state).style(Style::default().fg(color)),
                Cell::from(observation.last_action.clone().unwrap_or_else(|| "-".to_string())),
            ])
        })
        .collect();

    let header = Row::new(vec!["Role", "State", "Last action"]).style(
        Style::default()
            .add_modifier(Modifier::BOLD)
            .fg(Color::Cyan),
    );

    let widths = [
        Constraint::Length(12),
        Constraint::Length(16),
        Constraint::Min(20),
    ];

    let table = Table::new(rows, widths).header(header).block(
        Block::default()
            .borders(Borders::ALL)
            .title("Roles"),
    );

    frame.render_widget(table, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    fn rendered(roles: &[RoleObservation], in_flight: &HashSet<RoleKind>) -> String {
        let mut terminal = Terminal::new(TestBackend::new(80, 8)).unwrap();
        terminal
            .draw(|frame| {
                let area = frame.area();
                render_role_table(frame, area, roles, in_flight);
            })
            .unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[test]
    fn test_role_table_shows_state_and_last_action() {
        let mut server = RoleObservation::new(RoleKind::Server);
        server.running = true;
        server.last_action = Some("Server starting...".to_string());
        let slideshow = RoleObservation::new(RoleKind::Slideshow);

        let content = rendered(&[server, slideshow], &HashSet::new());

        assert!(content.contains("Role"));
        assert!(content.contains("Last action"));
        assert!(content.contains("Running"));
        assert!(content.contains("Stopped"));
        assert!(content.contains("Server starting..."));
    }

    #[test]
    fn test_role_table_marks_busy_roles() {
        let roles = [
            RoleObservation::new(RoleKind::Server),
            RoleObservation::new(RoleKind::Slideshow),
        ];
        let in_flight = HashSet::from([RoleKind::Slideshow]);

        let content = rendered(&roles, &in_flight);

        assert!(content.contains("Stopped (busy)"));
    }
}
