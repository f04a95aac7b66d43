//! Room management CLI commands: list, new, delete, history.
//!
//! Every command goes through the chat session, so the CLI sees exactly the
//! room ordering and history semantics the interactive chat does.

use anyhow::{Result, bail};
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;
use dialoguer::Confirm;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::broadcast;
use uuid::Uuid;

use lakechat_types::event::SessionEvent;
use lakechat_types::room::ChatRoom;

use crate::cli::chat::renderer::TimelinePrinter;
use crate::state::AppState;

/// Characters of the room id shown in tables.
const SHORT_ID_LEN: usize = 8;

/// List rooms, most recently active first.
pub async fn list_rooms(state: &AppState, json: bool) -> Result<()> {
    let rooms = state.session.refresh_rooms().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&rooms)?);
        return Ok(());
    }

    if rooms.is_empty() {
        println!();
        println!(
            "  {} No rooms yet. Create one with: {}",
            style("i").blue().bold(),
            style("lakechat new").yellow()
        );
        println!();
        return Ok(());
    }

    println!();
    print_rooms_table(&rooms, None);
    println!();
    Ok(())
}

/// Render the room table. `active` is highlighted.
pub fn print_rooms_table(rooms: &[ChatRoom], active: Option<Uuid>) {
    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec![
        Cell::new("Id").fg(Color::White),
        Cell::new("Title").fg(Color::White),
        Cell::new("Last message").fg(Color::White),
        Cell::new("Updated").fg(Color::White),
    ]);

    for room in rooms {
        let id_cell = if Some(room.id) == active {
            Cell::new(format!("* {}", short_id(&room.id))).fg(Color::Green)
        } else {
            Cell::new(short_id(&room.id)).fg(Color::DarkGrey)
        };
        let preview = room
            .last_message
            .as_deref()
            .map(|text| truncate(text, 48))
            .unwrap_or_else(|| "-".to_string());

        table.add_row(vec![
            id_cell,
            Cell::new(truncate(&room.title, 40)).fg(Color::Cyan),
            Cell::new(preview).fg(Color::White),
            Cell::new(room.updated_at.format("%Y-%m-%d %H:%M").to_string()).fg(Color::DarkGrey),
        ]);
    }

    for line in table.to_string().lines() {
        println!("  {line}");
    }
}

/// Create a room and print it.
pub async fn new_room(state: &AppState, title: Option<String>, json: bool) -> Result<()> {
    let mut events = state.session.subscribe();

    let spinner = spinner("cyan", "Creating room...");
    let room = state.session.create_room(title).await;
    spinner.finish_and_clear();
    let room = room?;

    if json {
        println!("{}", serde_json::to_string_pretty(&room)?);
        return Ok(());
    }

    println!();
    println!(
        "  {} Created room {} ({})",
        style("+").green().bold(),
        style(&room.title).cyan().bold(),
        style(room.id).dim()
    );
    print_notices(&mut events);
    println!();
    Ok(())
}

/// Delete a room after confirmation.
pub async fn delete_room(state: &AppState, query: &str, force: bool, json: bool) -> Result<()> {
    let rooms = state.session.refresh_rooms().await?;
    let room_id = resolve_room(&rooms, query)?;
    let title = rooms
        .iter()
        .find(|r| r.id == room_id)
        .map(|r| r.title.clone())
        .unwrap_or_else(|| room_id.to_string());

    if !force && !json {
        let confirmed = Confirm::new()
            .with_prompt(format!(
                "Permanently delete room '{}' and all its messages?",
                style(&title).red().bold()
            ))
            .default(false)
            .interact()?;

        if !confirmed {
            println!("  Cancelled.");
            return Ok(());
        }
    }

    let spinner = spinner("red", &format!("Deleting {title}..."));
    let result = state.session.delete_room(room_id).await;
    spinner.finish_and_clear();
    result?;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({ "deleted": room_id }))?
        );
    } else {
        println!(
            "  {} Deleted room {}",
            style("-").red().bold(),
            style(&title).cyan()
        );
    }
    Ok(())
}

/// Print a room's full history, oldest first.
pub async fn show_history(state: &AppState, query: &str, json: bool) -> Result<()> {
    let rooms = state.session.refresh_rooms().await?;
    let room_id = resolve_room(&rooms, query)?;

    state.session.select_room(room_id).await?;
    let timeline = state.session.timeline().await;

    if json {
        println!("{}", serde_json::to_string_pretty(&timeline)?);
        return Ok(());
    }

    if let Some(room) = rooms.iter().find(|r| r.id == room_id) {
        println!();
        println!("  History of '{}'", style(&room.title).cyan().bold());
    }
    println!();
    if timeline.is_empty() {
        println!("  {}", style("No messages yet.").dim());
    }
    let mut printer = TimelinePrinter::stdout();
    printer.print_new(&timeline, true)?;
    println!();
    Ok(())
}

/// Resolve a room argument: a full id, or a unique prefix of one.
pub fn resolve_room(rooms: &[ChatRoom], query: &str) -> Result<Uuid> {
    let query = query.trim().to_lowercase();
    if let Ok(id) = Uuid::parse_str(&query) {
        return Ok(id);
    }
    if query.is_empty() {
        bail!("Room id must not be empty");
    }

    let matches: Vec<&ChatRoom> = rooms
        .iter()
        .filter(|room| room.id.to_string().starts_with(&query))
        .collect();

    match matches.as_slice() {
        [room] => Ok(room.id),
        [] => bail!("No room matches '{query}'"),
        _ => bail!(
            "'{query}' matches {} rooms; use more characters of the id",
            matches.len()
        ),
    }
}

/// Print any `Notice` events queued on `events`.
pub fn print_notices(events: &mut broadcast::Receiver<SessionEvent>) {
    while let Ok(event) = events.try_recv() {
        if let SessionEvent::Notice { message } = event {
            println!("  {} {}", style("!").yellow().bold(), message);
        }
    }
}

/// Steady-tick spinner in the given color.
pub fn spinner(color: &str, message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    let template = format!("{{spinner:.{color}}} {{msg}}");
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template(&template)
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(std::time::Duration::from_millis(80));
    spinner
}

pub fn short_id(id: &Uuid) -> String {
    id.to_string().chars().take(SHORT_ID_LEN).collect()
}

/// Shorten `text` to at most `max` characters, ending in "...".
pub fn truncate(text: &str, max: usize) -> String {
    let single_line = text.replace('\n', " ");
    if single_line.chars().count() <= max {
        return single_line;
    }
    let kept: String = single_line.chars().take(max.saturating_sub(3)).collect();
    format!("{kept}...")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn room(id: &str) -> ChatRoom {
        ChatRoom {
            id: Uuid::parse_str(id).unwrap(),
            title: "Quarterly review".to_string(),
            last_message: None,
            updated_at: Utc::now(),
        }
    }

    fn rooms() -> Vec<ChatRoom> {
        vec![
            room("0190a1b2-0000-7000-8000-000000000001"),
            room("0190a1b2-0000-7000-8000-000000000002"),
            room("0190ffee-0000-7000-8000-000000000003"),
        ]
    }

    #[test]
    fn resolve_by_unique_prefix() {
        let id = resolve_room(&rooms(), "0190FF").unwrap();
        assert_eq!(id.to_string(), "0190ffee-0000-7000-8000-000000000003");
    }

    #[test]
    fn resolve_full_id_even_if_not_cached() {
        let id = resolve_room(&[], "0190a1b2-0000-7000-8000-00000000000f").unwrap();
        assert_eq!(id.to_string(), "0190a1b2-0000-7000-8000-00000000000f");
    }

    #[test]
    fn resolve_ambiguous_prefix_fails() {
        let err = resolve_room(&rooms(), "0190a1b2").unwrap_err();
        assert!(err.to_string().contains("matches 2 rooms"));
    }

    #[test]
    fn resolve_unknown_prefix_fails() {
        assert!(resolve_room(&rooms(), "dead").is_err());
        assert!(resolve_room(&rooms(), "  ").is_err());
    }

    #[test]
    fn truncate_is_char_safe() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("ümlaut ümlaut ümlaut", 10), "ümlaut ...");
        assert_eq!(truncate("two\nlines", 20), "two lines");
    }

    #[test]
    fn short_id_takes_prefix() {
        let id = Uuid::parse_str("0190ffee-0000-7000-8000-000000000003").unwrap();
        assert_eq!(short_id(&id), "0190ffee");
    }

    #[test]
    fn notices_are_drained() {
        let (tx, mut rx) = broadcast::channel(8);
        tx.send(SessionEvent::Notice {
            message: "Data source initialization failed".to_string(),
        })
        .unwrap();
        tx.send(SessionEvent::TimelineCleared).unwrap();

        print_notices(&mut rx);

        assert!(rx.try_recv().is_err());
    }
}
