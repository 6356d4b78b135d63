use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};
use serde_json::Value;

use crate::app::*;

pub fn draw(f: &mut Frame, app: &App) {
    let area = f.area();
    f.render_widget(Clear, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(10),
            Constraint::Length(3),
        ])
        .split(area);

    draw_header(f, app, chunks[0]);

    match app.phase {
        AppPhase::GatewaySelect => draw_gateway_select(f, app, chunks[1]),
        AppPhase::OperationSelect => draw_operation_select(f, app, chunks[1]),
        AppPhase::Input => draw_input(f, app, chunks[1]),
        AppPhase::Waiting => draw_waiting(f, app, chunks[1]),
        AppPhase::Result => draw_result(f, app, chunks[1]),
    }

    let help_text = match app.phase {
        AppPhase::GatewaySelect => "↑↓ select  Enter confirm  q quit",
        AppPhase::OperationSelect => "↑↓ select  Enter confirm  Esc back  q quit",
        AppPhase::Input => "Type arguments  Enter send  Esc back",
        AppPhase::Waiting => "Waiting for the gateway...  q quit",
        AppPhase::Result => "Enter/Esc back  q quit",
    };
    let help = Paragraph::new(help_text)
        .style(Style::default().fg(Color::DarkGray))
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(help, chunks[2]);
}

fn draw_header(f: &mut Frame, app: &App, area: Rect) {
    let mode = if app.config.demo {
        Span::styled("demo", Style::default().fg(Color::Magenta).add_modifier(Modifier::BOLD))
    } else {
        Span::styled("live", Style::default().fg(Color::Red).add_modifier(Modifier::BOLD))
    };

    let mut spans = vec![
        Span::styled("  paygate-cli ", Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)),
        Span::raw("│ "),
        mode,
        Span::raw(format!(" │ {} calls", app.history.len())),
    ];
    if app.phase != AppPhase::GatewaySelect {
        spans.push(Span::raw(format!(" │ {}", app.gateway.label())));
    }

    let header = Paragraph::new(Line::from(spans))
        .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(Color::Green)));
    f.render_widget(header, area);
}

fn menu_line(selected: bool, text: String, enabled: bool) -> Line<'static> {
    let marker = if selected { "▸ " } else { "  " };
    let style = if !enabled {
        Style::default().fg(Color::DarkGray)
    } else if selected {
        Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::White)
    };
    Line::from(Span::styled(format!("{}{}", marker, text), style))
}

fn draw_gateway_select(f: &mut Frame, app: &App, area: Rect) {
    let mut lines = vec![
        Line::from(Span::styled("Select a gateway:", Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))),
        Line::from(""),
    ];

    for (i, gateway) in GATEWAYS.iter().enumerate() {
        let enabled = app.gateway_enabled(*gateway);
        let text = if enabled {
            gateway.label().to_string()
        } else {
            format!("{} (not configured)", gateway.label())
        };
        lines.push(menu_line(i == app.cursor, text, enabled));
    }

    push_error(&mut lines, app);
    let p = Paragraph::new(lines).block(Block::default().borders(Borders::ALL));
    f.render_widget(p, area);
}

fn draw_operation_select(f: &mut Frame, app: &App, area: Rect) {
    let mut lines = vec![
        Line::from(Span::styled(
            format!("{} operations:", app.gateway.label()),
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
    ];

    for (i, op) in app.current_operations().iter().enumerate() {
        lines.push(menu_line(i == app.cursor, format!("{:<22} {}", op.label, op.action), true));
    }

    let p = Paragraph::new(lines).block(Block::default().borders(Borders::ALL));
    f.render_widget(p, area);
}

fn draw_input(f: &mut Frame, app: &App, area: Rect) {
    let Some(op) = app.selected_operation() else {
        return;
    };
    let prompt = match op.arg {
        ArgKind::Text => "Invoice number:",
        ArgKind::Object => "Arguments (JSON object):",
    };

    let mut lines = vec![
        Line::from(Span::styled(
            format!("{} › {}", app.gateway.label(), op.label),
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(format!("action: {}", op.action), Style::default().fg(Color::DarkGray))),
        Line::from(""),
        Line::from(prompt),
        Line::from(Span::styled(format!("▸ {}_", app.input), Style::default().fg(Color::Green))),
    ];

    push_error(&mut lines, app);
    let p = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(p, area);
}

fn draw_waiting(f: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let waiting = Paragraph::new(Line::from(vec![
        Span::styled("  Calling gateway", Style::default().fg(Color::DarkGray)),
        Span::styled(dots_animation(app.tick), Style::default().fg(Color::DarkGray)),
    ]));
    f.render_widget(waiting, centered_rect(40, 3, inner));
}

fn draw_result(f: &mut Frame, app: &App, area: Rect) {
    let Some(call) = app.last_call() else {
        return;
    };

    let mut lines = vec![
        Line::from(Span::styled(
            format!("{} › {}", call.gateway.label(), call.label),
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            format!("{}  {}", call.at.format("%H:%M:%S"), call.action),
            Style::default().fg(Color::DarkGray),
        )),
        Line::from(""),
    ];

    if call.results.is_empty() {
        lines.push(Line::from(Span::styled("No handler answered.", Style::default().fg(Color::Red))));
    }

    for result in &call.results {
        let style = Style::default().fg(result_color(result));
        let pretty = serde_json::to_string_pretty(result).unwrap_or_else(|_| result.to_string());
        for text in pretty.lines() {
            lines.push(Line::from(Span::styled(text.to_string(), style)));
        }
    }

    let p = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(p, area);
}

/// Green for a success result or a 200 raw response, red otherwise.
fn result_color(result: &Value) -> Color {
    let ok = result.get("status").and_then(Value::as_str) == Some("success")
        || result.get("status_code").and_then(Value::as_u64) == Some(200);
    if ok {
        Color::Green
    } else {
        Color::Red
    }
}

fn push_error(lines: &mut Vec<Line<'static>>, app: &App) {
    if let Some(ref err) = app.error_message {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(err.clone(), Style::default().fg(Color::Red))));
    }
}

fn dots_animation(tick: u32) -> String {
    ".".repeat((tick / 4 % 4) as usize)
}

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width.min(area.width), height.min(area.height))
}
