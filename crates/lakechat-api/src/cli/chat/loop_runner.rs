//! Main chat loop orchestration.
//!
//! Picks the starting room, then alternates between reading a line and
//! either running a slash command or sending the line to the active room.
//! Output is printed from the session's timeline after each step, so the
//! terminal always shows what the session holds.

use console::style;
use tokio::sync::broadcast;
use tracing::warn;
use uuid::Uuid;

use lakechat_core::session::{IgnoredReason, SendOutcome};
use lakechat_types::event::SessionEvent;

use crate::cli::rooms::{print_notices, print_rooms_table, resolve_room, short_id, spinner};
use crate::state::AppState;

use super::commands::{self, ChatCommand};
use super::input::{ChatInput, InputEvent};
use super::renderer::TimelinePrinter;

/// Run the interactive chat loop, starting in `room` or the most recent room.
pub async fn run_chat_loop(state: &AppState, room: Option<String>) -> anyhow::Result<()> {
    let session = &state.session;
    let mut events = session.subscribe();
    let mut printer = TimelinePrinter::stdout();

    let rooms = match session.refresh_rooms().await {
        Ok(rooms) => rooms,
        Err(e) => {
            println!(
                "\n  {} Could not load rooms: {e}",
                style("!").yellow().bold()
            );
            Vec::new()
        }
    };

    print_banner(state);

    let start = match room {
        Some(query) => Some(resolve_room(&rooms, &query)?),
        None => rooms.first().map(|r| r.id),
    };
    match start {
        Some(room_id) => switch_to(state, &mut printer, room_id).await,
        None => print_no_room_hint(),
    }

    let (mut chat_input, _writer) = ChatInput::new(prompt(state).await)
        .map_err(|e| anyhow::anyhow!("Failed to initialize input: {e}"))?;

    loop {
        match chat_input.read_line().await {
            InputEvent::Eof => {
                println!("\n  {}", style("Chat ended.").dim());
                break;
            }
            InputEvent::Interrupted => {
                println!(
                    "\n  {}",
                    style("Press Ctrl+D or type /quit to exit.").dim()
                );
                continue;
            }
            InputEvent::Message(text) => {
                if text.is_empty() {
                    continue;
                }

                if let Some(cmd) = commands::parse(&text) {
                    let keep_going =
                        run_command(state, cmd, &mut printer, &mut chat_input, &mut events).await;
                    if !keep_going {
                        break;
                    }
                    continue;
                }

                let spinner = spinner("cyan", "thinking...");
                let outcome = session.send_message(&text).await;
                spinner.finish_and_clear();

                match outcome {
                    SendOutcome::Ignored(IgnoredReason::NoRoomSelected) => print_no_room_hint(),
                    SendOutcome::Ignored(IgnoredReason::ReplyPending) => println!(
                        "  {}",
                        style("Still waiting for the previous reply.").dim()
                    ),
                    SendOutcome::Ignored(IgnoredReason::EmptyInput) => {}
                    SendOutcome::Replied | SendOutcome::Failed | SendOutcome::Discarded => {}
                }

                print_timeline(state, &mut printer, false).await;
                print_notices(&mut events);
            }
        }
    }

    Ok(())
}

/// Execute a slash command. Returns false when the loop should end.
async fn run_command(
    state: &AppState,
    cmd: ChatCommand,
    printer: &mut TimelinePrinter<std::io::Stdout>,
    chat_input: &mut ChatInput,
    events: &mut broadcast::Receiver<SessionEvent>,
) -> bool {
    let session = &state.session;

    match cmd {
        ChatCommand::Help => commands::print_help(),
        ChatCommand::Clear => chat_input.clear(),
        ChatCommand::Exit => {
            println!("\n  {}", style("Chat ended.").dim());
            return false;
        }
        ChatCommand::New(title) => {
            let spinner = spinner("cyan", "Creating room...");
            let result = session.create_room(title).await;
            spinner.finish_and_clear();
            match result {
                Ok(room) => {
                    printer.reset();
                    println!(
                        "\n  {} Created room {} ({})\n",
                        style("+").green().bold(),
                        style(&room.title).cyan().bold(),
                        style(short_id(&room.id)).dim()
                    );
                }
                Err(e) => print_error("Could not create room", &e),
            }
            print_notices(events);
        }
        ChatCommand::Rooms => {
            if let Err(e) = session.refresh_rooms().await {
                print_error("Could not refresh rooms, showing cached list", &e);
            }
            let rooms = session.rooms().await;
            println!();
            if rooms.is_empty() {
                println!("  {}", style("No rooms yet.").dim());
            } else {
                print_rooms_table(&rooms, session.current_room_id().await);
            }
            println!();
        }
        ChatCommand::Switch(query) => match resolve_room(&session.rooms().await, &query) {
            Ok(room_id) => switch_to(state, printer, room_id).await,
            Err(e) => print_error("Cannot switch", &e),
        },
        ChatCommand::Delete(query) => match resolve_room(&session.rooms().await, &query) {
            Ok(room_id) => {
                let was_active = session.current_room_id().await == Some(room_id);
                match session.delete_room(room_id).await {
                    Ok(()) => {
                        println!(
                            "\n  {} Deleted room {}\n",
                            style("-").red().bold(),
                            style(short_id(&room_id)).dim()
                        );
                        if was_active {
                            printer.reset();
                            print_no_room_hint();
                        }
                    }
                    Err(e) => print_error("Could not delete room", &e),
                }
            }
            Err(e) => print_error("Cannot delete", &e),
        },
        ChatCommand::Unknown(name) => {
            println!(
                "\n  {} Unknown command: {}. Type /help for available commands.\n",
                style("?").yellow().bold(),
                style(name).dim()
            );
        }
    }

    chat_input.update_prompt(&prompt(state).await);
    true
}

/// Select `room_id` and print its history from the start.
async fn switch_to(state: &AppState, printer: &mut TimelinePrinter<std::io::Stdout>, room_id: Uuid) {
    match state.session.select_room(room_id).await {
        Ok(()) => {
            printer.reset();
            let title = room_title(state, room_id).await;
            println!(
                "\n  {} {}\n",
                style("Room").dim(),
                style(title).cyan().bold()
            );
            print_timeline(state, printer, true).await;
        }
        Err(e) => print_error("Could not open room", &e),
    }
}

async fn print_timeline(
    state: &AppState,
    printer: &mut TimelinePrinter<std::io::Stdout>,
    echo_user: bool,
) {
    let timeline = state.session.timeline().await;
    if let Err(e) = printer.print_new(&timeline, echo_user) {
        warn!(error = %e, "Failed to print timeline");
    }
}

async fn room_title(state: &AppState, room_id: Uuid) -> String {
    state
        .session
        .rooms()
        .await
        .into_iter()
        .find(|r| r.id == room_id)
        .map(|r| r.title)
        .unwrap_or_else(|| short_id(&room_id))
}

/// Prompt naming the active room.
async fn prompt(state: &AppState) -> String {
    match state.session.current_room_id().await {
        Some(room_id) => format!(
            "  {} ",
            style(format!("{} >", room_title(state, room_id).await)).green().bold()
        ),
        None => format!("  {} ", style("(no room) >").dim()),
    }
}

fn print_banner(state: &AppState) {
    println!();
    println!(
        "  {} {}",
        style("lakechat").cyan().bold(),
        style(format!(
            "connected to {} (data in {})",
            state.config.backend_url,
            state.data_dir.display()
        ))
        .dim()
    );
    if state.config.user_id.is_none() {
        println!(
            "  {} {}",
            style("!").yellow().bold(),
            style("No user id configured; queries will fail until one is set.").yellow()
        );
    }
    println!("  {}", style("Type /help for commands.").dim());
}

fn print_no_room_hint() {
    println!(
        "\n  {} No room selected. Use {} or {}.\n",
        style("i").blue().bold(),
        style("/new").yellow(),
        style("/switch <id>").yellow()
    );
}

fn print_error(context: &str, error: &dyn std::fmt::Display) {
    println!("\n  {} {context}: {error}\n", style("!").red().bold());
}
