use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Wrap},
};

use crate::app::{App, ChatFocus, FocusPane, Screen};
use crate::conversation::Role;
use crate::suggestions;

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    // Main layout: header, body, footer
    let [header_area, body_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(frame, header_area);

    match app.screen {
        Screen::Browse => render_browse_screen(app, frame, body_area),
        Screen::Search => render_search_screen(app, frame, body_area),
    }

    render_footer(app, frame, footer_area);

    // The chat panel floats above whatever screen is behind it
    if app.chat_open {
        render_chat_panel(app, frame, body_area);
    }
}

fn render_header(frame: &mut Frame, area: Rect) {
    let title = Line::from(vec![
        Span::styled(" Visiter Lyon ", Style::default().fg(Color::Cyan).bold()),
        Span::styled(
            " Patrimoine, gastronomie et balades entre Rhône et Saône ",
            Style::default().fg(Color::Gray),
        ),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::Gray),
        ),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let mode_style = if app.chat_open || app.search_editing {
        Style::default().bg(Color::Yellow).fg(Color::Black)
    } else {
        Style::default().bg(Color::Blue).fg(Color::White)
    };

    let mode_text = if app.chat_open {
        " ASSISTANT "
    } else {
        match app.screen {
            Screen::Browse => " DÉCOUVRIR ",
            Screen::Search => " RECHERCHE ",
        }
    };

    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let hints = if app.chat_open {
        let mut hints = Vec::new();
        if app.conversation.pending() {
            hints.push(Span::styled(" l'assistant répond… ", label_style));
        } else {
            hints.extend(vec![
                Span::styled(" Enter ", key_style),
                Span::styled(" envoyer ", label_style),
            ]);
        }
        if app.suggestions_visible() {
            hints.extend(vec![
                Span::styled(" Tab ", key_style),
                Span::styled(" suggestions ", label_style),
            ]);
        }
        hints.extend(vec![
            Span::styled(" ↑/↓ ", key_style),
            Span::styled(" défiler ", label_style),
            Span::styled(" Esc ", key_style),
            Span::styled(" fermer ", label_style),
        ]);
        hints
    } else {
        match (app.screen, app.search_editing) {
            (Screen::Browse, _) => vec![
                Span::styled(" j/k ", key_style),
                Span::styled(" naviguer ", label_style),
                Span::styled(" Tab ", key_style),
                Span::styled(" panneau ", label_style),
                Span::styled(" / ", key_style),
                Span::styled(" rechercher ", label_style),
                Span::styled(" a ", key_style),
                Span::styled(" assistant ", label_style),
                Span::styled(" q ", key_style),
                Span::styled(" quitter ", label_style),
            ],
            (Screen::Search, false) => vec![
                Span::styled(" j/k ", key_style),
                Span::styled(" naviguer ", label_style),
                Span::styled(" Enter ", key_style),
                Span::styled(" voir ", label_style),
                Span::styled(" i ", key_style),
                Span::styled(" modifier ", label_style),
                Span::styled(" a ", key_style),
                Span::styled(" assistant ", label_style),
                Span::styled(" Esc ", key_style),
                Span::styled(" retour ", label_style),
            ],
            (Screen::Search, true) => vec![
                Span::styled(" Enter ", key_style),
                Span::styled(" rechercher ", label_style),
                Span::styled(" Esc ", key_style),
                Span::styled(" annuler ", label_style),
            ],
        }
    };

    let footer_content = Line::from(
        vec![
            Span::styled(mode_text, mode_style),
            Span::styled(" ", label_style),
        ]
        .into_iter()
        .chain(hints)
        .collect::<Vec<_>>(),
    );

    let footer = Paragraph::new(footer_content).style(Style::default().bg(Color::Black));
    frame.render_widget(footer, area);
}

fn render_browse_screen(app: &mut App, frame: &mut Frame, area: Rect) {
    let [nav_area, content_area] =
        Layout::horizontal([Constraint::Length(26), Constraint::Min(0)]).areas(area);

    render_categories(app, frame, nav_area);

    let [list_area, detail_area] =
        Layout::vertical([Constraint::Min(0), Constraint::Length(8)]).areas(content_area);

    render_place_list(app, frame, list_area);
    render_place_detail(app.selected_place(), frame, detail_area);
}

fn render_categories(app: &mut App, frame: &mut Frame, area: Rect) {
    let focused = app.focus == FocusPane::Categories;
    let border_color = if focused { Color::Cyan } else { Color::DarkGray };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(" Catégories ");

    let items: Vec<ListItem> = app
        .catalog
        .categories()
        .iter()
        .map(|c| ListItem::new(format!(" {c} ")))
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(
            Style::default()
                .bg(Color::Cyan)
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    frame.render_stateful_widget(list, area, &mut app.category_state);
}

fn render_place_list(app: &mut App, frame: &mut Frame, area: Rect) {
    let focused = app.focus == FocusPane::Places;
    let border_color = if focused { Color::Cyan } else { Color::DarkGray };

    let title = app
        .selected_category()
        .map(|c| format!(" {c} "))
        .unwrap_or_else(|| " Lieux ".to_string());

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(title);

    let items: Vec<ListItem> = app
        .cached_places
        .iter()
        .map(|place| {
            ListItem::new(Line::from(vec![
                Span::raw(format!(" {} ", place.name)),
                Span::styled(
                    format!("({})", place.district),
                    Style::default().fg(Color::DarkGray),
                ),
            ]))
        })
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(
            Style::default()
                .bg(Color::Cyan)
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    frame.render_stateful_widget(list, area, &mut app.place_state);
}

fn render_place_detail(place: Option<&crate::catalog::Place>, frame: &mut Frame, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(" Détail ");

    let text = match place {
        Some(place) => {
            let mut lines = vec![
                Line::from(Span::styled(
                    place.name.clone(),
                    Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                )),
                Line::from(Span::styled(
                    format!("{} · {}", place.category, place.district),
                    Style::default().fg(Color::DarkGray),
                )),
                Line::default(),
                Line::from(place.summary.clone()),
            ];
            if !place.tags.is_empty() {
                lines.push(Line::from(Span::styled(
                    place.tags.join(" · "),
                    Style::default().fg(Color::Magenta),
                )));
            }
            Text::from(lines)
        }
        None => Text::from(Span::styled(
            "Sélectionnez un lieu…",
            Style::default().fg(Color::DarkGray),
        )),
    };

    let detail = Paragraph::new(text).block(block).wrap(Wrap { trim: true });
    frame.render_widget(detail, area);
}

fn render_search_screen(app: &mut App, frame: &mut Frame, area: Rect) {
    let [input_area, results_area] =
        Layout::vertical([Constraint::Length(3), Constraint::Min(0)]).areas(area);

    let input_border = if app.search_editing {
        Color::Yellow
    } else {
        Color::DarkGray
    };
    let input_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(input_border))
        .title(" Rechercher un lieu ");
    let input = Paragraph::new(app.search_input.as_str())
        .style(Style::default().fg(Color::Cyan))
        .block(input_block);
    frame.render_widget(input, input_area);

    if app.search_editing {
        let cursor_x = app.search_input.chars().count() as u16;
        frame.set_cursor_position((input_area.x + cursor_x + 1, input_area.y + 1));
    }

    let [list_area, preview_area] =
        Layout::horizontal([Constraint::Percentage(45), Constraint::Percentage(55)])
            .areas(results_area);

    let results_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(format!(" Résultats ({}) ", app.search_results.len()));

    let items: Vec<ListItem> = app
        .search_results
        .iter()
        .map(|place| {
            ListItem::new(Line::from(vec![
                Span::raw(format!(" {} ", place.name)),
                Span::styled(
                    format!("({})", place.category),
                    Style::default().fg(Color::DarkGray),
                ),
            ]))
        })
        .collect();

    let list = List::new(items)
        .block(results_block)
        .highlight_style(
            Style::default()
                .bg(Color::Cyan)
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    frame.render_stateful_widget(list, list_area, &mut app.search_state);

    render_place_detail(app.selected_search_result(), frame, preview_area);
}

/// The chat panel is anchored bottom-right over the current screen, the
/// way the site floats its widget over the page.
fn chat_panel_area(area: Rect) -> Rect {
    let width = area.width.min((area.width * 9 / 20).max(44));
    let height = area.height.min((area.height * 4 / 5).max(16));
    Rect {
        x: area.x + area.width - width,
        y: area.y + area.height - height,
        width,
        height,
    }
}

fn render_chat_panel(app: &mut App, frame: &mut Frame, area: Rect) {
    let panel = chat_panel_area(area);
    frame.render_widget(Clear, panel);

    let suggestions_height = if app.suggestions_visible() {
        (suggestions::list().len() + 2) as u16
    } else {
        0
    };

    let [chat_area, suggestions_area, input_area] = Layout::vertical([
        Constraint::Min(0),
        Constraint::Length(suggestions_height),
        Constraint::Length(3),
    ])
    .areas(panel);

    // Inner size (minus borders) drives the scroll-to-bottom math
    app.chat_height = chat_area.height.saturating_sub(2);
    app.chat_width = chat_area.width.saturating_sub(2);

    let chat_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(" Assistant Tourisme Lyon ");

    let mut lines: Vec<Line> = Vec::new();
    for msg in app.conversation.messages() {
        match msg.role {
            Role::User => {
                lines.push(Line::from(Span::styled(
                    "Vous :",
                    Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                )));
            }
            Role::Assistant => {
                lines.push(Line::from(Span::styled(
                    "Assistant :",
                    Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
                )));
            }
        }
        for line in msg.content.lines() {
            lines.push(Line::from(line.to_string()));
        }
        lines.push(Line::default());
    }

    if app.conversation.pending() {
        lines.push(Line::from(Span::styled(
            "Assistant :",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        )));
        // Animated ellipsis: ".", "..", "..."
        let dots = ".".repeat((app.animation_frame as usize) + 1);
        lines.push(Line::from(Span::styled(
            format!("Réflexion{dots}"),
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),
        )));
    }

    let chat = Paragraph::new(Text::from(lines))
        .block(chat_block)
        .wrap(Wrap { trim: true })
        .scroll((app.chat_scroll, 0));
    frame.render_widget(chat, chat_area);

    if suggestions_height > 0 {
        render_suggestions(app, frame, suggestions_area);
    }

    render_chat_input(app, frame, input_area);
}

fn render_suggestions(app: &mut App, frame: &mut Frame, area: Rect) {
    let focused = app.chat_focus == ChatFocus::Suggestions;
    let border_color = if focused { Color::Yellow } else { Color::DarkGray };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(" Suggestions ");

    let items: Vec<ListItem> = suggestions::list()
        .iter()
        .enumerate()
        .map(|(i, s)| ListItem::new(format!(" {}. {} ", i + 1, s)))
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(
            Style::default()
                .bg(Color::Yellow)
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    frame.render_stateful_widget(list, area, &mut app.suggestion_state);
}

fn render_chat_input(app: &App, frame: &mut Frame, area: Rect) {
    let locked = app.conversation.input_locked();
    let focused = app.chat_focus == ChatFocus::Input;

    let border_color = if locked {
        Color::DarkGray
    } else if focused {
        Color::Yellow
    } else {
        Color::DarkGray
    };
    let title = if locked {
        " L'assistant répond… "
    } else {
        " Votre question "
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(title);

    // Horizontal scrolling keeps the cursor visible in a narrow input
    let inner_width = area.width.saturating_sub(2) as usize;
    let cursor_pos = app.chat_cursor;
    let scroll_offset = if inner_width == 0 {
        0
    } else if cursor_pos >= inner_width {
        cursor_pos - inner_width + 1
    } else {
        0
    };

    let visible_text: String = app
        .chat_input
        .chars()
        .skip(scroll_offset)
        .take(inner_width)
        .collect();

    let style = if locked {
        Style::default().fg(Color::DarkGray)
    } else {
        Style::default().fg(Color::Cyan)
    };
    let input = Paragraph::new(visible_text).style(style).block(block);
    frame.render_widget(input, area);

    if focused && !locked {
        let cursor_x = (cursor_pos - scroll_offset) as u16;
        frame.set_cursor_position((area.x + cursor_x + 1, area.y + 1));
    }
}
