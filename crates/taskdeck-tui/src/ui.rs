use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Wrap},
    Frame,
};
use taskdeck_shared::{api::SortOrder, Identified, Task, User};

use crate::app::{App, Mode};
use crate::route::Route;
use crate::state::{FormState, ListController, TaskListState, UserField};

pub fn draw(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Main content
            Constraint::Length(1), // Status bar
        ])
        .split(f.area());

    draw_header(f, chunks[0], app);
    match &app.tasks {
        Some(tasks) => draw_tasks(f, chunks[1], app, tasks),
        None => draw_users(f, chunks[1], app),
    }
    draw_status_bar(f, chunks[2], app);

    match app.mode {
        Mode::UserForm(field) => draw_user_form_popup(f, app, field),
        Mode::TaskForm => draw_task_form_popup(f, app),
        Mode::Browse | Mode::Search => {}
    }

    // List failures go to the error boundary; row action errors to a notice
    if let Some(error) = list_error(app) {
        draw_error_popup(f, &error, " r: retry ");
    } else if let Some(ref notice) = app.notice {
        draw_error_popup(f, notice, " any key: dismiss ");
    }
}

fn list_error(app: &App) -> Option<String> {
    match &app.tasks {
        Some(tasks) => tasks.list.error().map(str::to_string),
        None => app.users.error().map(str::to_string),
    }
}

fn draw_header(f: &mut Frame, area: Rect, app: &App) {
    let mut spans = vec![
        Span::styled(
            "TASKDECK",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
        Span::raw(" | "),
        Span::styled(app.route.path(), Style::default().fg(Color::Yellow)),
    ];

    if let Route::Tasks { user_id: Some(ref id) } = app.route {
        let name = app.scoped_user().map(|u| u.name).unwrap_or_else(|| id.clone());
        spans.push(Span::raw(" | "));
        spans.push(Span::styled(name, Style::default().fg(Color::Green)));
    }

    let header = Paragraph::new(Line::from(spans)).block(Block::default().borders(Borders::BOTTOM));
    f.render_widget(header, area);
}

/// Placeholder text for a list that has nothing to show yet.
pub fn placeholder<T: Identified + Clone>(list: &ListController<T>, visible: usize) -> Option<&'static str> {
    if !list.has_loaded() && list.error().is_none() {
        Some("Loading...")
    } else if visible == 0 {
        Some("List is empty")
    } else {
        None
    }
}

/// Footer text, only when there is more than one page.
pub fn pager_label(page: u32, total_pages: u32) -> Option<String> {
    (total_pages > 1).then(|| format!("Page {} of {}", page, total_pages))
}

fn draw_placeholder(f: &mut Frame, area: Rect, block: Block, text: &str) {
    let paragraph = Paragraph::new(text)
        .style(Style::default().fg(Color::DarkGray))
        .alignment(Alignment::Center)
        .block(block);
    f.render_widget(paragraph, area);
}

fn list_block(title: String, loading: bool) -> Block<'static> {
    let title = if loading {
        format!(" {} (refreshing) ", title)
    } else {
        format!(" {} ", title)
    };
    Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
}

fn draw_users(f: &mut Frame, area: Rect, app: &App) {
    let users = app.visible_users();
    let block = list_block(format!("Users ({})", users.len()), app.users.is_loading());

    if let Some(text) = placeholder(&app.users, users.len()) {
        draw_placeholder(f, area, block, text);
        return;
    }

    let items: Vec<ListItem> = users
        .iter()
        .enumerate()
        .map(|(i, user)| user_item(user, i == app.selected_user))
        .collect();

    f.render_widget(List::new(items).block(block), area);
}

fn user_item(user: &User, selected: bool) -> ListItem<'static> {
    let style = if selected {
        Style::default().bg(Color::DarkGray).fg(Color::White)
    } else {
        Style::default()
    };

    ListItem::new(Line::from(vec![
        Span::raw("  "),
        Span::styled(user.name.clone(), style.add_modifier(Modifier::BOLD)),
        Span::raw("  "),
        Span::styled(user.email.clone(), style.fg(Color::Gray)),
        Span::raw("  "),
        Span::styled(format!("({})", user.city), Style::default().fg(Color::DarkGray)),
    ]))
}

fn draw_tasks(f: &mut Frame, area: Rect, app: &App, tasks: &TaskListState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Search + filter
            Constraint::Min(0),    // List
            Constraint::Length(1), // Pager
        ])
        .split(area);

    draw_search_bar(f, chunks[0], app, tasks);

    let visible = app.visible_tasks();
    let order = match tasks.order() {
        SortOrder::Desc => "newest first",
        SortOrder::Asc => "oldest first",
    };
    let block = list_block(format!("Tasks, {}", order), tasks.list.is_loading());
    match placeholder(&tasks.list, visible.len()) {
        Some(text) => draw_placeholder(f, chunks[1], block, text),
        None => {
            let show_owner = tasks.scope().is_none();
            let items: Vec<ListItem> = visible
                .iter()
                .enumerate()
                .map(|(i, task)| task_item(task, i == app.selected_task, show_owner))
                .collect();
            f.render_widget(List::new(items).block(block), chunks[1]);
        }
    }

    if let Some(label) = pager_label(tasks.pagination.page, tasks.total_pages()) {
        let pager = Paragraph::new(label)
            .style(Style::default().fg(Color::Yellow))
            .alignment(Alignment::Center);
        f.render_widget(pager, chunks[2]);
    }
}

fn task_item(task: &Task, selected: bool, show_owner: bool) -> ListItem<'static> {
    let bg = if selected {
        Style::default().bg(Color::DarkGray)
    } else {
        Style::default()
    };
    let (mark, color) = if task.done {
        ("[x]", Color::Green)
    } else {
        ("[ ]", Color::Gray)
    };
    let title_style = if task.done {
        bg.fg(Color::DarkGray).add_modifier(Modifier::CROSSED_OUT)
    } else {
        bg.fg(Color::White)
    };

    let mut spans = vec![
        Span::styled(" ", bg),
        Span::styled(mark, bg.fg(color)),
        Span::styled(" ", bg),
        Span::styled(task.title.clone(), title_style),
    ];
    if show_owner {
        let owner = task.user_name.clone().unwrap_or_else(|| task.user_id.clone());
        spans.push(Span::styled(format!("  @{}", owner), bg.fg(Color::DarkGray)));
    }
    spans.push(Span::styled(
        format!("  {}", task.created_at.format("%b %d %H:%M")),
        bg.fg(Color::DarkGray),
    ));

    ListItem::new(Line::from(spans))
}

fn draw_search_bar(f: &mut Frame, area: Rect, app: &App, tasks: &TaskListState) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(0), Constraint::Length(24)])
        .split(area);

    let searching = app.mode == Mode::Search;
    let border = if searching { Color::Yellow } else { Color::Gray };
    let title = if tasks.search_pending() {
        " Search title ... "
    } else {
        " Search title "
    };
    let search = Paragraph::new(tasks.search_input()).block(
        Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border)),
    );
    f.render_widget(search, chunks[0]);

    let filter = Paragraph::new(tasks.filter().label())
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .title(" Filter ")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Gray)),
        );
    f.render_widget(filter, chunks[1]);

    if searching {
        f.set_cursor_position((
            chunks[0].x + 1 + tasks.search_input().chars().count() as u16,
            chunks[0].y + 1,
        ));
    }
}

fn draw_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let scoped = app.scope().is_some();

    let page_jump = format!("go to page {} | Enter: go | other key: cancel", app.page_input);

    let (mode, mode_color, hints) = match (app.mode, &app.route) {
        (Mode::Browse, Route::Tasks { .. }) if !app.page_input.is_empty() => {
            ("PAGE", Color::Yellow, page_jump.as_str())
        }
        (Mode::UserForm(_), _) | (Mode::TaskForm, _) => (
            "FORM",
            Color::Green,
            "Tab: next field | Enter: submit | Esc: cancel",
        ),
        (Mode::Search, _) => ("SEARCH", Color::Magenta, "type to search | Enter/Esc: done"),
        (Mode::Browse, Route::Users) => (
            "USERS",
            Color::Blue,
            "n: new | d: delete | Enter: tasks | t: all tasks | r: refresh | q: quit",
        ),
        (Mode::Browse, Route::Tasks { .. }) if scoped => (
            "TASKS",
            Color::Blue,
            "n: new | Space: done | d: delete | /: search | f: filter | o: order | h/l: page | 12 Enter: page 12 | u: users | q: quit",
        ),
        (Mode::Browse, Route::Tasks { .. }) => (
            "TASKS",
            Color::Blue,
            "/: search | f: filter | o: order | h/l: page | g/G: first/last | 12 Enter: page 12 | u: users | q: quit",
        ),
    };

    let status = Paragraph::new(Line::from(vec![
        Span::styled(
            format!(" {} ", mode),
            Style::default().bg(mode_color).fg(Color::White),
        ),
        Span::raw(" "),
        Span::styled(hints, Style::default().fg(Color::DarkGray)),
    ]));

    f.render_widget(status, area);
}

fn input_block(title: &'static str, focused: bool) -> Block<'static> {
    let style = if focused {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default().fg(Color::Gray)
    };
    Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(style)
}

fn form_footer<F>(state: &FormState<F>, submitting: bool) -> Paragraph<'static> {
    let footer = if let Some(ref error) = state.error {
        Paragraph::new(error.clone())
            .style(Style::default().fg(Color::Red))
            .wrap(Wrap { trim: true })
    } else if submitting {
        Paragraph::new("Saving...").style(Style::default().fg(Color::Yellow))
    } else {
        Paragraph::new("Enter: submit | Esc: cancel").style(Style::default().fg(Color::DarkGray))
    };
    footer.alignment(Alignment::Center)
}

fn draw_user_form_popup(f: &mut Frame, app: &App, field: UserField) {
    let area = centered_rect(60, 50, f.area());

    f.render_widget(Clear, area);

    let block = Block::default()
        .title(" New User ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let inner = block.inner(area);
    f.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(3), // Name
            Constraint::Length(3), // Email
            Constraint::Length(3), // City
            Constraint::Length(2), // Error or hint
            Constraint::Min(0),    // Spacer
        ])
        .split(inner);

    let form = &app.user_form.form;
    let fields = [
        (UserField::Name, " Name ", form.name.as_str(), chunks[0]),
        (UserField::Email, " Email ", form.email.as_str(), chunks[1]),
        (UserField::City, " City (optional) ", form.city.as_str(), chunks[2]),
    ];

    for (kind, title, value, rect) in fields {
        let input = Paragraph::new(value).block(input_block(title, kind == field));
        f.render_widget(input, rect);

        if kind == field {
            f.set_cursor_position((rect.x + 1 + value.chars().count() as u16, rect.y + 1));
        }
    }

    f.render_widget(form_footer(&app.user_form, app.submitting), chunks[3]);
}

fn draw_task_form_popup(f: &mut Frame, app: &App) {
    let area = centered_rect(60, 25, f.area());

    f.render_widget(Clear, area);

    let block = Block::default()
        .title(" New Task ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let inner = block.inner(area);
    f.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(3), // Title
            Constraint::Length(2), // Error or hint
            Constraint::Min(0),    // Spacer
        ])
        .split(inner);

    let title = app.task_form.form.title.as_str();
    let input = Paragraph::new(title).block(input_block(" Title ", true));
    f.render_widget(input, chunks[0]);
    f.render_widget(form_footer(&app.task_form, app.submitting), chunks[1]);

    f.set_cursor_position((
        chunks[0].x + 1 + title.chars().count() as u16,
        chunks[0].y + 1,
    ));
}

fn draw_error_popup(f: &mut Frame, error: &str, hint: &'static str) {
    let area = centered_rect(60, 20, f.area());

    f.render_widget(Clear, area);

    let block = Block::default()
        .title(" Error ")
        .title_bottom(Line::from(hint).alignment(Alignment::Right))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Red));

    let text = Paragraph::new(error)
        .style(Style::default().fg(Color::Red))
        .wrap(Wrap { trim: true })
        .block(block);

    f.render_widget(text, area);
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
    fn pager_hidden_for_single_page() {
        assert_eq!(pager_label(1, 0), None);
        assert_eq!(pager_label(1, 1), None);
        assert_eq!(pager_label(2, 3).as_deref(), Some("Page 2 of 3"));
    }

    #[test]
    fn placeholder_tracks_load_state() {
        let mut list: ListController<User> = ListController::new();
        assert_eq!(placeholder(&list, 0), Some("Loading..."));

        let generation = list.begin();
        list.commit(generation, Ok(vec![]));
        assert_eq!(placeholder(&list, 0), Some("List is empty"));
        assert_eq!(placeholder(&list, 3), None);
    }
}
