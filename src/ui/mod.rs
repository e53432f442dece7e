use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap};
use ratatui::Frame;

pub mod layout;

use crate::app::{App, InputMode, PromptKind, Screen, StatusLevel};
use crate::domain::{truncate_address, CategoryFilter, Nft, Rarity};
use crate::infrastructure::market::OperationKind;

pub fn draw(f: &mut Frame, app: &App) {
    let areas = layout::areas(f.size());

    draw_header(f, areas.header, app);
    draw_filter_bar(f, areas.filters, app);
    draw_list_panel(f, areas.list, app);
    draw_detail_panel(f, areas.details, app);
    draw_status_line(f, areas.status_line, app);
    draw_command_line(f, areas.command_line, app);

    if app.offers.is_some() {
        draw_offers_popup(f, areas.size, app);
    }
    if app.input_mode == InputMode::Prompt(PromptKind::ConfirmBuy) {
        draw_confirm_popup(f, areas.size, app);
    }
    if app.show_help {
        draw_help_popup(f, areas.size);
    }
}

pub fn rarity_color(rarity: Rarity) -> Color {
    match rarity {
        Rarity::Common => Color::Green,
        Rarity::Uncommon => Color::Blue,
        Rarity::Rare => Color::Magenta,
        Rarity::SuperRare => Color::Rgb(255, 165, 0),
    }
}

fn label(text: &'static str) -> Span<'static> {
    Span::styled(text, Style::default().fg(Color::DarkGray))
}

fn draw_header(f: &mut Frame, area: Rect, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(area);

    let mut tabs = vec![
        Span::styled(
            "Aptmart",
            Style::default()
                .fg(Color::LightCyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw("  "),
    ];
    for screen in [Screen::Market, Screen::Collection] {
        let style = if app.screen == screen {
            Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Gray)
        };
        tabs.push(Span::styled(
            format!(" {} {} ", screen.shortcut(), screen.title()),
            style,
        ));
        tabs.push(Span::raw(" "));
    }
    let left = Paragraph::new(Line::from(tabs))
        .block(Block::default().borders(Borders::ALL))
        .alignment(Alignment::Left);

    let account = app
        .config
        .account
        .as_deref()
        .map(truncate_address)
        .unwrap_or_else(|| "--".to_string());
    let right_line = Line::from(vec![
        label("Market "),
        Span::raw(format!("{}  ", truncate_address(&app.config.marketplace))),
        label("Account "),
        Span::raw(account),
    ]);
    let right = Paragraph::new(right_line)
        .block(Block::default().borders(Borders::ALL))
        .alignment(Alignment::Left);

    f.render_widget(left, chunks[0]);
    f.render_widget(right, chunks[1]);
}

fn draw_filter_bar(f: &mut Frame, area: Rect, app: &App) {
    let query = &app.current().query;
    let search = if query.search.is_empty() {
        "--".to_string()
    } else {
        format!("\"{}\"", query.search)
    };
    let category_style = match query.category {
        CategoryFilter::All => Style::default(),
        CategoryFilter::Rarity(rarity) => Style::default().fg(rarity_color(rarity)),
    };
    let line = Line::from(vec![
        label("Rarity "),
        Span::styled(format!("{}  ", query.category.label()), category_style),
        label("Sort "),
        Span::raw(format!("{}  ", query.sort.label())),
        label("Search "),
        Span::raw(search),
    ]);
    let paragraph = Paragraph::new(line).block(
        Block::default()
            .borders(Borders::ALL)
            .title("Filters (f rarity, s sort, / search)"),
    );
    f.render_widget(paragraph, area);
}

fn draw_list_panel(f: &mut Frame, area: Rect, app: &App) {
    let state = app.current();
    let page_size = app.page_size();
    let rows = state.page_items(page_size);
    let pages = state.page_count(page_size).max(1);

    let mut title = format!(
        "{} | page {}/{} | {} shown",
        app.screen.title(),
        state.page,
        pages,
        state.view().len()
    );
    if app.screen == Screen::Collection && state.loaded {
        title.push_str(&format!(" of {} owned", state.total));
    }
    if state.is_loading() {
        title.push_str(" | loading…");
    }

    let items: Vec<ListItem> = if rows.is_empty() {
        let text = if state.is_loading() && !state.loaded {
            "Loading…"
        } else if state.records.is_empty() {
            "No NFTs"
        } else {
            "No NFTs match the current filters"
        };
        vec![ListItem::new(Line::from(Span::styled(
            text,
            Style::default().fg(Color::DarkGray),
        )))]
    } else {
        rows.iter().map(|nft| nft_row(nft, app)).collect()
    };

    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(title)
                .border_style(Style::default().fg(Color::Cyan)),
        )
        .highlight_style(
            Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol(">> ");

    let mut list_state = ListState::default();
    if !rows.is_empty() {
        list_state.select(Some(state.selected));
    }
    f.render_stateful_widget(list, area, &mut list_state);
}

fn nft_row(nft: &Nft, app: &App) -> ListItem<'static> {
    let mut spans = vec![
        Span::styled(format!("#{:<5}", nft.id), Style::default().fg(Color::DarkGray)),
        Span::raw(format!("{:<22} ", truncate_str(&nft.name, 22))),
        Span::styled(
            format!("{:>12} APT ", format_apt(nft.price)),
            Style::default().fg(Color::LightYellow),
        ),
        Span::styled(
            format!("{:<10} ", nft.rarity.label()),
            Style::default().fg(rarity_color(nft.rarity)),
        ),
        Span::raw(format!("♥ {}", nft.likes)),
    ];
    if app.screen == Screen::Collection && nft.for_sale {
        spans.push(Span::styled("  [listed]", Style::default().fg(Color::LightGreen)));
    }
    if app.pending_ops.keys().any(|key| key.nft_id == nft.id) {
        spans.push(Span::styled("  …", Style::default().fg(Color::LightYellow)));
    }
    ListItem::new(Line::from(spans))
}

fn draw_detail_panel(f: &mut Frame, area: Rect, app: &App) {
    let mut lines = match app.selected_nft() {
        Some(nft) => detail_lines(nft, app),
        None => Vec::new(),
    };
    if lines.is_empty() {
        lines.push(Line::from("No data"));
    }

    let paragraph = Paragraph::new(Text::from(lines))
        .block(Block::default().borders(Borders::ALL).title("Details"))
        .wrap(Wrap { trim: true });

    f.render_widget(paragraph, area);
}

fn detail_lines(nft: &Nft, app: &App) -> Vec<Line<'static>> {
    let mut lines = vec![
        Line::from(Span::styled(
            nft.name.clone(),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(vec![label("ID       "), Span::raw(nft.id.to_string())]),
        Line::from(vec![
            label("Rarity   "),
            Span::styled(
                nft.rarity.label(),
                Style::default().fg(rarity_color(nft.rarity)),
            ),
        ]),
        Line::from(vec![
            label("Price    "),
            Span::raw(format!("{} APT", format_apt(nft.price))),
        ]),
        Line::from(vec![
            label("For sale "),
            Span::raw(if nft.for_sale { "yes" } else { "no" }),
        ]),
        Line::from(vec![label("Likes    "), Span::raw(nft.likes.to_string())]),
        Line::from(vec![label("Owner    "), Span::raw(truncate_address(&nft.owner))]),
    ];
    if !nft.creator.is_empty() {
        lines.push(Line::from(vec![
            label("Creator  "),
            Span::raw(truncate_address(&nft.creator)),
        ]));
    }
    lines.push(Line::from(vec![label("URI      "), Span::raw(nft.uri.clone())]));
    lines.push(Line::from(""));
    lines.push(Line::from(nft.description.clone()));

    let pending: Vec<&'static str> = app
        .pending_ops
        .keys()
        .filter(|key| key.nft_id == nft.id)
        .map(|key| key.kind.label())
        .collect();
    if !pending.is_empty() {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            format!("In progress: {}", pending.join(", ")),
            Style::default().fg(Color::LightYellow),
        )));
    }
    lines
}

fn draw_status_line(f: &mut Frame, area: Rect, app: &App) {
    let state = app.current();
    let (node, wallet) = match app.endpoints.as_ref() {
        Some((node, wallet)) => (node.as_str(), wallet.as_str()),
        None => (app.config.node_url.as_str(), app.config.wallet_url.as_str()),
    };
    let mut spans = vec![
        label("Node "),
        Span::raw(format!("{}  ", node)),
        label("Wallet "),
        Span::raw(format!("{}  ", wallet)),
        label("Records "),
        Span::raw(format!("{}  ", state.records.len())),
    ];
    if state.skipped > 0 {
        spans.push(label("Skipped "));
        spans.push(Span::styled(
            format!("{}  ", state.skipped),
            Style::default().fg(Color::LightYellow),
        ));
    }
    if let Some(at) = state.loaded_at {
        spans.push(label("Updated "));
        spans.push(Span::raw(format!("{}  ", at.format("%H:%M:%S"))));
    }
    if !app.pending_ops.is_empty() {
        spans.push(label("Pending "));
        spans.push(Span::raw(app.pending_ops.len().to_string()));
    }

    let paragraph = Paragraph::new(Line::from(spans))
        .style(Style::default().fg(Color::White))
        .alignment(Alignment::Left);
    f.render_widget(paragraph, area);
}

/// Get command hint for autocompletion
fn command_hint(input: &str) -> Option<&'static str> {
    let input = input.trim().to_lowercase();
    if input.is_empty() {
        return None;
    }

    let commands = [
        ("market", "Show marketplace listings"),
        ("mine", "Show my collection"),
        ("page", "Jump to page <n>"),
        ("next", "Next page"),
        ("prev", "Previous page"),
        ("rarity", "Filter by rarity (all, common, uncommon, rare, super)"),
        ("sort", "Sort (asc, desc, likes)"),
        ("search", "Search name/description"),
        ("buy", "Buy selected NFT"),
        ("offer", "Make offer <apt>"),
        ("sell", "List for sale <apt>"),
        ("transfer", "Transfer to <address>"),
        ("tip", "Tip owner <apt>"),
        ("like", "Like selected NFT"),
        ("offers", "Show offers on selected NFT"),
        ("accept", "Accept offer [address]"),
        ("decline", "Decline offer [address]"),
        ("refresh", "Refetch current screen"),
        ("help", "Toggle help"),
        ("quit", "Quit"),
    ];

    let word = input.split_whitespace().next().unwrap_or_default();
    for (cmd, desc) in commands {
        if cmd.starts_with(word) {
            return Some(desc);
        }
    }
    None
}

fn draw_command_line(f: &mut Frame, area: Rect, app: &App) {
    let content = match app.input_mode {
        InputMode::Command => {
            let hint_text = command_hint(&app.command.input).unwrap_or("type a command, Enter=run Esc=cancel");
            Line::from(vec![
                Span::styled(": ", Style::default().fg(Color::Yellow)),
                Span::raw(app.command.input.clone()),
                Span::styled(
                    format!("  {}", hint_text),
                    Style::default().fg(Color::DarkGray),
                ),
            ])
        }
        InputMode::Prompt(PromptKind::ConfirmBuy) => Line::from(vec![Span::styled(
            "Confirm purchase: y=buy n/Esc=cancel",
            Style::default().fg(Color::LightCyan),
        )]),
        InputMode::Prompt(kind) => Line::from(vec![
            Span::styled(
                format!("> {}: ", app.prompt_label(kind)),
                Style::default().fg(Color::LightCyan),
            ),
            Span::raw(app.command.input.clone()),
            Span::styled("  (Enter=ok Esc=cancel)", Style::default().fg(Color::DarkGray)),
        ]),
        InputMode::Normal => {
            if let Some((text, level)) = app.status_text() {
                let color = match level {
                    StatusLevel::Info => Color::LightCyan,
                    StatusLevel::Success => Color::LightGreen,
                    StatusLevel::Warn => Color::LightYellow,
                    StatusLevel::Error => Color::LightRed,
                };
                Line::from(vec![
                    Span::styled("msg: ", Style::default().fg(Color::DarkGray)),
                    Span::styled(text.to_string(), Style::default().fg(color)),
                ])
            } else {
                action_hints(app)
            }
        }
    };

    let paragraph = Paragraph::new(content).style(Style::default().fg(Color::White));
    f.render_widget(paragraph, area);
}

fn action_hints(app: &App) -> Line<'static> {
    let hints = match app.screen {
        Screen::Market => "b buy  o offer  l like  t tip  ←/→ page  : command  ? help  q quit",
        Screen::Collection if app.offers.is_some() => {
            "a accept  d decline  j/k select  Esc close"
        }
        Screen::Collection => {
            "S sell  T transfer  o offers  l like  t tip  ←/→ page  : command  ? help  q quit"
        }
    };
    Line::from(Span::styled(hints, Style::default().fg(Color::DarkGray)))
}

fn draw_offers_popup(f: &mut Frame, area: Rect, app: &App) {
    let Some(panel) = app.offers.as_ref() else {
        return;
    };
    let popup_area = centered_rect(60, 50, area);
    f.render_widget(Clear, popup_area);

    let items: Vec<ListItem> = if panel.offers.is_empty() {
        let text = if panel.loading { "Loading…" } else { "No offers" };
        vec![ListItem::new(Line::from(Span::styled(
            text,
            Style::default().fg(Color::DarkGray),
        )))]
    } else {
        panel
            .offers
            .iter()
            .map(|offer| {
                let mut spans = vec![
                    Span::raw(format!("{:<16}", truncate_address(&offer.offerer))),
                    Span::styled(
                        format!("{:>14} APT", format_apt(offer.amount)),
                        Style::default().fg(Color::LightYellow),
                    ),
                ];
                let resolving = app.is_pending(OperationKind::AcceptOffer, offer.nft_id)
                    || app.is_pending(OperationKind::DeclineOffer, offer.nft_id);
                if resolving {
                    spans.push(Span::styled("  …", Style::default().fg(Color::LightYellow)));
                }
                ListItem::new(Line::from(spans))
            })
            .collect()
    };

    let title = format!("Offers on #{} {} (a accept, d decline, Esc close)", panel.nft_id, panel.nft_name);
    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title(title))
        .highlight_style(
            Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol(">> ");

    let mut state = ListState::default();
    if !panel.offers.is_empty() {
        state.select(Some(panel.selected));
    }
    f.render_stateful_widget(list, popup_area, &mut state);
}

fn draw_confirm_popup(f: &mut Frame, area: Rect, app: &App) {
    let Some(nft) = app
        .prompt_target
        .and_then(|id| app.current().records.iter().find(|nft| nft.id == id))
    else {
        return;
    };
    let popup_area = centered_rect(50, 40, area);
    f.render_widget(Clear, popup_area);

    let lines = vec![
        Line::from(Span::styled(
            nft.name.clone(),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(vec![label("ID     "), Span::raw(nft.id.to_string())]),
        Line::from(vec![
            label("Rarity "),
            Span::styled(
                nft.rarity.label(),
                Style::default().fg(rarity_color(nft.rarity)),
            ),
        ]),
        Line::from(vec![
            label("Price  "),
            Span::raw(format!("{} APT", format_apt(nft.price))),
        ]),
        Line::from(vec![label("Owner  "), Span::raw(truncate_address(&nft.owner))]),
        Line::from(""),
        Line::from("y = buy    n / Esc = cancel"),
    ];

    let paragraph = Paragraph::new(Text::from(lines))
        .block(Block::default().title("Confirm purchase").borders(Borders::ALL))
        .wrap(Wrap { trim: true });
    f.render_widget(paragraph, popup_area);
}

fn draw_help_popup(f: &mut Frame, area: Rect) {
    let popup_area = centered_rect(72, 70, area);
    f.render_widget(Clear, popup_area);

    let lines = vec![
        Line::from("Navigation"),
        Line::from("  1 / 2      Marketplace / My collection"),
        Line::from("  j / k      Move selection"),
        Line::from("  ← / →      Previous / next page (also p / n)"),
        Line::from("  Esc        Close panel"),
        Line::from(""),
        Line::from("Filters"),
        Line::from("  f          Cycle rarity"),
        Line::from("  s          Cycle sort"),
        Line::from("  /          Search name or description"),
        Line::from(""),
        Line::from("Marketplace"),
        Line::from("  b          Buy selected"),
        Line::from("  o          Make offer"),
        Line::from(""),
        Line::from("My collection"),
        Line::from("  S          List for sale"),
        Line::from("  T          Transfer"),
        Line::from("  o          Offers (a accept, d decline)"),
        Line::from(""),
        Line::from("Both"),
        Line::from("  l          Like"),
        Line::from("  t          Tip"),
        Line::from("  r          Refresh"),
        Line::from("  :          Command bar (:help lists commands)"),
        Line::from("  ?          Toggle help"),
        Line::from("  q          Quit"),
    ];

    let paragraph = Paragraph::new(Text::from(lines))
        .block(Block::default().title("Help").borders(Borders::ALL))
        .alignment(Alignment::Left)
        .wrap(Wrap { trim: true });

    f.render_widget(paragraph, popup_area);
}

/// Display APT without trailing zeros
fn format_apt(value: f64) -> String {
    let text = format!("{:.8}", value);
    let trimmed = text.trim_end_matches('0').trim_end_matches('.');
    trimmed.to_string()
}

fn truncate_str(value: &str, max: usize) -> String {
    if value.chars().count() <= max {
        return value.to_string();
    }
    value.chars().take(max.saturating_sub(1)).collect::<String>() + "…"
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_apt() {
        assert_eq!(format_apt(1.5), "1.5");
        assert_eq!(format_apt(2.0), "2");
        assert_eq!(format_apt(0.00000001), "0.00000001");
    }

    #[test]
    fn test_command_hint() {
        assert_eq!(command_hint("off"), Some("Make offer <apt>"));
        assert_eq!(command_hint("offers"), Some("Show offers on selected NFT"));
        assert_eq!(command_hint("zzz"), None);
    }
}
