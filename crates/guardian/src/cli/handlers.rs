//! Command handlers.
//!
//! Every handler writes its output to the given writer so the binary can hand
//! over stdout and tests can capture it.

use std::io::Write;
use std::time::Duration;

use anyhow::{bail, Context};
use chrono::{Local, NaiveDate};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::debug;

use super::commands::{
    AskCommand, ConfigCommand, DrillsCommand, FamilyCommand, GuideCommand, GuidesCommand,
    InventoryCommand, PlanCommand, StatusCommand,
};
use super::Command;
use crate::advisory::Advisor;
use crate::catalog::{Catalog, Category, EmergencyGuide};
use crate::config::Config;
use crate::drill::schedule::{self, DrillStatus};
use crate::drill::{DrillBook, DrillSession, SessionOutcome};
use crate::error::Error;
use crate::household::{
    expiry_status, ExpiryStatus, Family, Inventory, ItemCategory, NewItem, NewMember,
};
use crate::plan::{MarkerKind, PlanEditor, PlanPoint, Tool};
use crate::router::{Router, View};
use crate::storage::{DocumentStore, SqliteStore};

/// Execute `command`, writing its output to `out`.
///
/// # Errors
///
/// Returns an error if the store cannot be opened, the command fails, or
/// writing output fails.
pub async fn run(command: Command, config: &Config, out: &mut dyn Write) -> anyhow::Result<()> {
    match command {
        Command::Guides(cmd) => handle_guides(&cmd, out),
        Command::Guide(cmd) => handle_guide(&cmd, out),
        Command::Plan(cmd) => handle_plan(cmd, config, out).await,
        Command::Drills(cmd) => handle_drills(cmd, config, out).await,
        Command::Inventory(cmd) => handle_inventory(cmd, config, out),
        Command::Family(cmd) => handle_family(cmd, config, out),
        Command::Ask(cmd) => handle_ask(&cmd, config, out).await,
        Command::Status(cmd) => handle_status(&cmd, config, out),
        Command::Config(cmd) => handle_config(cmd, config, out),
    }
}

fn open_store(config: &Config) -> anyhow::Result<SqliteStore> {
    let path = config.database_path();
    SqliteStore::open(&path).with_context(|| format!("cannot open store at {}", path.display()))
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn handle_guides(cmd: &GuidesCommand, out: &mut dyn Write) -> anyhow::Result<()> {
    let catalog = Catalog::builtin();
    let mut router = Router::new();
    if cmd.all || cmd.category.is_some() {
        router.navigate(View::GuideList);
    }
    router.set_search(cmd.search.clone().unwrap_or_default());
    router.set_category(cmd.category.map(Category::from));

    let guides = router.visible_guides(&catalog);
    if cmd.json {
        writeln!(out, "{}", serde_json::to_string_pretty(&guides)?)?;
        return Ok(());
    }

    if guides.is_empty() {
        writeln!(out, "No guides match.")?;
        return Ok(());
    }
    for guide in &guides {
        let flag = if guide.has_critical_steps() { "!" } else { " " };
        writeln!(
            out,
            "{flag} {:<10} {:<9} {} - {}",
            guide.id,
            guide.category.as_str(),
            guide.title,
            guide.summary
        )?;
    }
    if router.shows_quick_actions() && guides.len() < catalog.len() {
        writeln!(out)?;
        writeln!(
            out,
            "Showing {} of {} guides. Use --all to list every guide.",
            guides.len(),
            catalog.len()
        )?;
    }
    Ok(())
}

fn handle_guide(cmd: &GuideCommand, out: &mut dyn Write) -> anyhow::Result<()> {
    let catalog = Catalog::builtin();
    let mut router = Router::new();
    if !router.open_guide(&catalog, &cmd.id) {
        return Err(Error::not_found("guide", &cmd.id).into());
    }
    let Some(guide) = router.selected_guide(&catalog) else {
        bail!("guide `{}` disappeared from the catalog", cmd.id);
    };

    if cmd.json {
        writeln!(out, "{}", serde_json::to_string_pretty(guide)?)?;
    } else {
        write_guide(guide, cmd.quick, out)?;
    }
    Ok(())
}

fn write_guide(guide: &EmergencyGuide, quick: bool, out: &mut dyn Write) -> anyhow::Result<()> {
    writeln!(out, "{}", guide.title)?;
    writeln!(out, "{}", "=".repeat(guide.title.chars().count()))?;
    writeln!(out, "{}", guide.summary)?;
    writeln!(out)?;

    if quick {
        for (n, step) in guide.quick_steps.iter().enumerate() {
            writeln!(out, "{}. {step}", n + 1)?;
        }
        return Ok(());
    }

    for (n, step) in guide.steps.iter().enumerate() {
        let mut heading = format!("{}. {}", n + 1, step.title);
        if step.is_critical {
            heading.push_str(" [CRITICAL]");
        }
        if let Some(seconds) = step.duration_seconds {
            heading.push_str(&format!(" ({})", format_duration(seconds)));
        }
        if let Some(bpm) = step.bpm {
            heading.push_str(&format!(" ({bpm} per minute)"));
        }
        writeln!(out, "{heading}")?;
        writeln!(out, "   {}", step.description)?;
    }
    Ok(())
}

fn format_duration(seconds: u32) -> String {
    if seconds >= 60 && seconds % 60 == 0 {
        format!("{} min", seconds / 60)
    } else {
        format!("{seconds} s")
    }
}

async fn handle_plan(cmd: PlanCommand, config: &Config, out: &mut dyn Write) -> anyhow::Result<()> {
    let store = open_store(config)?;
    let mut editor = PlanEditor::open(&store, config.plan.clone());

    match cmd {
        PlanCommand::Show { json } => {
            let summary = editor.summary();
            if json {
                let value = serde_json::json!({
                    "summary": summary,
                    "markers": editor.document().markers(),
                });
                writeln!(out, "{}", serde_json::to_string_pretty(&value)?)?;
                return Ok(());
            }

            let background = match editor.document().background() {
                Some(image) => match image.dimensions() {
                    Ok((w, h)) => format!("{w}x{h}"),
                    Err(_) => "unreadable".to_string(),
                },
                None => "none".to_string(),
            };
            writeln!(out, "Background:  {background}")?;
            writeln!(
                out,
                "Drawing:     {}",
                if summary.has_ink { "yes" } else { "none" }
            )?;
            writeln!(out, "Markers:     {}", summary.markers)?;
            for marker in editor.document().markers() {
                let at = marker.position();
                writeln!(
                    out,
                    "  {}  {:<18} {:>5.1}%, {:>5.1}%",
                    marker.id(),
                    marker.kind().label(),
                    at.x(),
                    at.y()
                )?;
            }
        }
        PlanCommand::Example => {
            editor.load_example()?;
            writeln!(out, "Background replaced with the example floor plan.")?;
        }
        PlanCommand::Background { file } => {
            let bytes = tokio::fs::read(&file)
                .await
                .with_context(|| format!("cannot read {}", file.display()))?;
            editor
                .set_background_image_async(bytes)
                .await
                .with_context(|| format!("{} is not a usable image", file.display()))?;
            writeln!(out, "Background set from {}.", file.display())?;
        }
        PlanCommand::Mark { kind, x, y } => {
            let kind = MarkerKind::from(kind);
            editor.select_tool(Tool::Marker(kind));
            let at = PlanPoint::new(x, y);
            let id = editor.tap(at).context("marker tool was not active")?;
            writeln!(out, "Placed {} at {:.1}%, {:.1}%: {id}", kind.label(), at.x(), at.y())?;
        }
        PlanCommand::Unmark { id } => {
            if !editor.tap_marker(&id) {
                return Err(Error::not_found("marker", id).into());
            }
            writeln!(out, "Removed marker {id}.")?;
        }
        PlanCommand::ClearMarkers => {
            editor.clear_markers();
            writeln!(out, "All markers removed.")?;
        }
        PlanCommand::ClearOverlay => {
            editor.clear_overlay();
            writeln!(out, "Drawing erased.")?;
        }
        PlanCommand::Draw { points } => {
            editor.select_tool(Tool::Pen);
            editor.draw_polyline(&points);
            writeln!(out, "Drew a stroke through {} points.", points.len())?;
        }
    }
    Ok(())
}

async fn handle_drills(
    cmd: DrillsCommand,
    config: &Config,
    out: &mut dyn Write,
) -> anyhow::Result<()> {
    let store = open_store(config)?;
    let mut book = DrillBook::open(&store);
    let today = today();

    match cmd {
        DrillsCommand::List { json } => {
            if json {
                let tasks: Vec<_> = book
                    .tasks()
                    .iter()
                    .map(|task| {
                        serde_json::json!({
                            "task": task,
                            "due": schedule::is_due(task, today),
                            "daysSince": book.days_since(task, today),
                            "nextDue": schedule::next_due_date(task),
                        })
                    })
                    .collect();
                writeln!(out, "{}", serde_json::to_string_pretty(&tasks)?)?;
                return Ok(());
            }

            for task in book.tasks() {
                let status = match schedule::status(task, today) {
                    DrillStatus::Never => "never performed".to_string(),
                    DrillStatus::Due { overdue_days: 0 } => "due today".to_string(),
                    DrillStatus::Due { overdue_days } => format!("overdue by {overdue_days} days"),
                    DrillStatus::Upcoming { days_left } => format!("due in {days_left} days"),
                };
                writeln!(
                    out,
                    "{:>3}  {:<32} every {:>3} days  {status}",
                    task.id, task.title, task.frequency_days
                )?;
            }
        }
        DrillsCommand::Run { id } => {
            let input = BufReader::new(tokio::io::stdin());
            let outcome =
                run_drill_session(&mut book, &id, config.tick_interval(), today, input, out)
                    .await?;
            debug!(?outcome, "Drill session ended");
        }
    }
    Ok(())
}

enum SessionEvent {
    Tick(Option<u64>),
    Line(Option<String>),
}

enum SessionInput {
    Toggle(usize),
    Done,
    Cancel,
    Unknown,
}

fn parse_session_input(line: &str) -> SessionInput {
    let line = line.trim();
    match line.to_ascii_lowercase().as_str() {
        "done" | "d" => SessionInput::Done,
        "q" | "quit" | "cancel" => SessionInput::Cancel,
        _ => match line.parse::<usize>() {
            Ok(n) if n > 0 => SessionInput::Toggle(n - 1),
            _ => SessionInput::Unknown,
        },
    }
}

fn progress_line(session: &DrillSession) -> String {
    format!(
        "Elapsed: {} | {}/{} steps ({}%)",
        session.formatted_elapsed(),
        session.checked_count(),
        session.task().steps.len(),
        session.progress_percent()
    )
}

fn write_checklist<W: Write + ?Sized>(session: &DrillSession, out: &mut W) -> std::io::Result<()> {
    for (index, step) in session.task().steps.iter().enumerate() {
        let mark = if session.is_checked(index) { 'x' } else { ' ' };
        writeln!(out, "  [{mark}] {}. {step}", index + 1)?;
    }
    writeln!(out, "{}", progress_line(session))
}

/// Run drill `id` interactively.
///
/// Lines read from `input` drive the session: a step number toggles that
/// step, `done` completes the drill once every step is checked, and `q` or
/// end of input cancels it. The clock advances every `tick`.
///
/// # Errors
///
/// Returns an error if there is no drill `id`, or reading input or writing
/// output fails.
pub async fn run_drill_session<S, R, W>(
    book: &mut DrillBook<S>,
    id: &str,
    tick: Duration,
    today: NaiveDate,
    input: R,
    out: &mut W,
) -> anyhow::Result<SessionOutcome>
where
    S: DocumentStore,
    R: AsyncBufRead + Unpin,
    W: Write + ?Sized,
{
    let Some(mut session) = book.start(id) else {
        return Err(Error::not_found("drill", id).into());
    };
    session.start_timer(tick);

    writeln!(out, "{}", session.task().title)?;
    write_checklist(&session, out)?;
    writeln!(
        out,
        "Type a step number to check it, `done` to finish, `q` to cancel."
    )?;

    let mut lines = input.lines();
    let mut ticking = true;
    loop {
        let event = tokio::select! {
            elapsed = session.next_tick(), if ticking => SessionEvent::Tick(elapsed),
            line = lines.next_line() => SessionEvent::Line(line?),
        };

        match event {
            SessionEvent::Tick(Some(_)) => {
                write!(out, "\r{}", progress_line(&session))?;
                out.flush()?;
            }
            SessionEvent::Tick(None) => ticking = false,
            SessionEvent::Line(None) => {
                writeln!(out)?;
                writeln!(out, "Input closed; drill cancelled.")?;
                return Ok(book.cancel(session));
            }
            SessionEvent::Line(Some(line)) => match parse_session_input(&line) {
                SessionInput::Toggle(index) => {
                    if session.toggle_step(index).is_none() {
                        writeln!(out, "No step {}.", index + 1)?;
                    }
                    write_checklist(&session, out)?;
                }
                SessionInput::Done => match book.complete(session, today) {
                    Ok(outcome) => {
                        writeln!(
                            out,
                            "Drill complete in {}. Next run recorded from {today}.",
                            crate::drill::session::format_clock(outcome.elapsed_seconds())
                        )?;
                        return Ok(outcome);
                    }
                    Err(unfinished) => {
                        session = unfinished;
                        writeln!(
                            out,
                            "Check every step before finishing ({}/{}).",
                            session.checked_count(),
                            session.task().steps.len()
                        )?;
                    }
                },
                SessionInput::Cancel => {
                    writeln!(out, "Drill cancelled.")?;
                    return Ok(book.cancel(session));
                }
                SessionInput::Unknown => {
                    writeln!(out, "Enter a step number, `done` or `q`.")?;
                }
            },
        }
    }
}

fn handle_inventory(
    cmd: InventoryCommand,
    config: &Config,
    out: &mut dyn Write,
) -> anyhow::Result<()> {
    let store = open_store(config)?;
    let mut inventory = Inventory::open(&store);

    match cmd {
        InventoryCommand::List { category, json } => {
            let items = inventory.filter(category.map(ItemCategory::from));
            if json {
                writeln!(out, "{}", serde_json::to_string_pretty(&items)?)?;
                return Ok(());
            }
            if items.is_empty() {
                writeln!(out, "No items.")?;
                return Ok(());
            }
            let today = today();
            for item in items {
                let expiry = match (item.expiry_date, expiry_status(item, today)) {
                    (None, _) => String::new(),
                    (Some(date), ExpiryStatus::Normal) => format!("expires {date}"),
                    (Some(date), ExpiryStatus::Warning) => format!("expires {date} (soon)"),
                    (Some(date), ExpiryStatus::Expired) => format!("EXPIRED {date}"),
                };
                writeln!(
                    out,
                    "{}  {:<7} {:>4} x {:<28} {expiry}",
                    item.id,
                    item.category.as_str(),
                    item.quantity,
                    item.name
                )?;
            }
        }
        InventoryCommand::Add {
            name,
            category,
            quantity,
            expires,
            location,
        } => {
            let new = NewItem {
                quantity,
                expiry_date: expires,
                location,
                ..NewItem::new(name, ItemCategory::from(category))
            };
            let Some(item) = inventory.add(new) else {
                bail!("an item needs a name");
            };
            writeln!(out, "Added {} ({}).", item.name, item.id)?;
        }
        InventoryCommand::Remove { id } => {
            if !inventory.remove(&id) {
                return Err(Error::not_found("item", id).into());
            }
            writeln!(out, "Removed item {id}.")?;
        }
    }
    Ok(())
}

fn handle_family(cmd: FamilyCommand, config: &Config, out: &mut dyn Write) -> anyhow::Result<()> {
    let store = open_store(config)?;
    let mut family = Family::open(&store);

    match cmd {
        FamilyCommand::List { json } => {
            if json {
                writeln!(out, "{}", serde_json::to_string_pretty(family.members())?)?;
                return Ok(());
            }
            if family.members().is_empty() {
                writeln!(out, "No family members recorded.")?;
                return Ok(());
            }
            for member in family.members() {
                writeln!(out, "{}  {} ({})", member.id, member.name, member.role)?;
                if !member.phone.is_empty() {
                    writeln!(out, "    Phone:   {}", member.phone)?;
                }
                if let Some(blood_type) = &member.blood_type {
                    writeln!(out, "    Blood:   {blood_type}")?;
                }
                if let Some(notes) = &member.medical_notes {
                    writeln!(out, "    Medical: {notes}")?;
                }
            }
        }
        FamilyCommand::Add {
            name,
            role,
            phone,
            blood_type,
            notes,
        } => {
            let member = family.add(NewMember {
                name,
                role,
                phone,
                blood_type,
                medical_notes: notes,
            })?;
            writeln!(out, "Added {} ({}).", member.name, member.id)?;
        }
        FamilyCommand::Remove { id } => {
            if !family.remove(&id) {
                return Err(Error::not_found("family member", id).into());
            }
            writeln!(out, "Removed family member {id}.")?;
        }
    }
    Ok(())
}

async fn handle_ask(cmd: &AskCommand, config: &Config, out: &mut dyn Write) -> anyhow::Result<()> {
    let advisor = Advisor::from_config(&config.advisory)?;
    let advice = advisor.ask(&cmd.query.join(" ")).await;
    writeln!(out, "{}", advice.text)?;
    if !advice.is_remote() {
        debug!(reason = ?advice.fallback, "Showed fallback advice");
    }
    Ok(())
}

fn handle_status(cmd: &StatusCommand, config: &Config, out: &mut dyn Write) -> anyhow::Result<()> {
    let store = open_store(config)?;
    let today = today();

    let stats = store.stats()?;
    let plan = PlanEditor::open(&store, config.plan.clone()).summary();
    let drills = DrillBook::open(&store);
    let due: Vec<_> = drills.due_tasks(today);
    let inventory = Inventory::open(&store);
    let attention = inventory.needs_attention(today);
    let expired = attention
        .iter()
        .filter(|(_, status)| *status == ExpiryStatus::Expired)
        .count();
    let family = Family::open(&store);
    let advisory = Advisor::from_config(&config.advisory)?.is_configured();

    if cmd.json {
        let status = serde_json::json!({
            "database_path": store.path(),
            "documents": stats.document_count,
            "document_bytes": stats.document_bytes,
            "db_size_bytes": stats.db_size_bytes,
            "plan": plan,
            "drills_due": due.iter().map(|t| t.id.as_str()).collect::<Vec<_>>(),
            "items_expired": expired,
            "items_expiring": attention.len() - expired,
            "family_members": family.members().len(),
            "advisory_configured": advisory,
        });
        writeln!(out, "{}", serde_json::to_string_pretty(&status)?)?;
        return Ok(());
    }

    writeln!(out, "guardian status")?;
    writeln!(out, "---------------")?;
    writeln!(out, "Database:      {}", store.path().display())?;
    writeln!(
        out,
        "Stored:        {} documents, {} bytes",
        stats.document_count, stats.document_bytes
    )?;
    writeln!(
        out,
        "Escape plan:   {} markers, {}",
        plan.markers,
        if plan.has_background {
            "background set"
        } else {
            "no background"
        }
    )?;
    writeln!(out, "Drills due:    {} of {}", due.len(), drills.tasks().len())?;
    for task in &due {
        writeln!(out, "  - {}", task.title)?;
    }
    writeln!(
        out,
        "Supplies:      {} items, {} expired, {} expiring soon",
        inventory.items().len(),
        expired,
        attention.len() - expired
    )?;
    writeln!(out, "Family:        {} members", family.members().len())?;
    writeln!(
        out,
        "Assistant:     {}",
        if advisory {
            "configured"
        } else {
            "offline only"
        }
    )?;
    Ok(())
}

fn handle_config(cmd: ConfigCommand, config: &Config, out: &mut dyn Write) -> anyhow::Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            let mut shown = config.clone();
            if shown.advisory.api_key.is_some() {
                shown.advisory.api_key = Some("********".to_string());
            }
            if json {
                writeln!(out, "{}", serde_json::to_string_pretty(&shown)?)?;
                return Ok(());
            }

            writeln!(out, "Current Configuration")?;
            writeln!(out, "=====================")?;
            writeln!(out)?;
            writeln!(out, "[Storage]")?;
            writeln!(out, "  Database path:      {}", config.database_path().display())?;
            writeln!(out)?;
            writeln!(out, "[Plan]")?;
            writeln!(out, "  Max background edge: {}", shown.plan.max_background_edge)?;
            writeln!(out, "  Background quality:  {}", shown.plan.background_quality)?;
            writeln!(
                out,
                "  Overlay size:        {}x{}",
                shown.plan.overlay_width, shown.plan.overlay_height
            )?;
            writeln!(out)?;
            writeln!(out, "[Drills]")?;
            writeln!(out, "  Tick interval (ms):  {}", shown.drills.tick_interval_ms)?;
            writeln!(out)?;
            writeln!(out, "[Advisory]")?;
            writeln!(out, "  Enabled:            {}", shown.advisory.enabled)?;
            writeln!(
                out,
                "  API key:            {}",
                shown.advisory.api_key.as_deref().unwrap_or("not set")
            )?;
            writeln!(out, "  Model:              {}", shown.advisory.model)?;
        }
        ConfigCommand::Path => {
            writeln!(out, "{}", Config::default_config_path().display())?;
        }
        ConfigCommand::Validate { file } => {
            let path = file.unwrap_or_else(Config::default_config_path);
            writeln!(out, "Validating configuration: {}", path.display())?;
            match Config::load_from(Some(path)) {
                Ok(_) => writeln!(out, "Configuration is valid.")?,
                Err(e) => writeln!(out, "Configuration error: {e}")?,
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{DocumentKey, MemoryStore};
    use tempfile::TempDir;

    const LONG_TICK: Duration = Duration::from_secs(3600);

    fn test_config(dir: &TempDir) -> Config {
        let mut config = Config::default();
        config.storage.database_path = Some(dir.path().join("guardian.db"));
        config
    }

    async fn run_to_string(command: Command, config: &Config) -> String {
        let mut out = Vec::new();
        run(command, config, &mut out).await.unwrap();
        String::from_utf8(out).unwrap()
    }

    fn is_not_found<T>(result: &anyhow::Result<T>) -> bool {
        result
            .as_ref()
            .err()
            .and_then(|e| e.downcast_ref::<Error>())
            .is_some_and(Error::is_not_found)
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 1).unwrap()
    }

    #[tokio::test]
    async fn test_drill_session_completes_when_every_step_checked() {
        let mut book = DrillBook::open(MemoryStore::new());
        let input: &[u8] = b"5\n4\n3\n2\n1\ndone\n";
        let mut out = Vec::new();

        let outcome = run_drill_session(&mut book, "2", LONG_TICK, today(), input, &mut out)
            .await
            .unwrap();

        assert!(outcome.is_completed());
        assert_eq!(book.task("2").unwrap().last_performed, Some(today()));
        assert!(!schedule::is_due(book.task("2").unwrap(), today()));
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("5/5 steps (100%)"));
    }

    #[tokio::test]
    async fn test_drill_session_refuses_early_done() {
        let mut book = DrillBook::open(MemoryStore::new());
        let input: &[u8] = b"1\n2\ndone\n";
        let mut out = Vec::new();

        let outcome = run_drill_session(&mut book, "1", LONG_TICK, today(), input, &mut out)
            .await
            .unwrap();

        // The early `done` is refused; end of input then cancels.
        assert!(!outcome.is_completed());
        assert_eq!(book.task("1").unwrap().last_performed, None);
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Check every step before finishing (2/5)"));
    }

    #[tokio::test]
    async fn test_drill_session_toggle_twice_unchecks() {
        let mut book = DrillBook::open(MemoryStore::new());
        let input: &[u8] = b"3\n3\nq\n";
        let mut out = Vec::new();

        let outcome = run_drill_session(&mut book, "1", LONG_TICK, today(), input, &mut out)
            .await
            .unwrap();

        assert!(matches!(outcome, SessionOutcome::Cancelled { .. }));
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("1/5 steps (20%)"));
        assert!(text.ends_with("Drill cancelled.\n"));
    }

    #[tokio::test]
    async fn test_drill_session_cancel_stores_nothing() {
        let store = MemoryStore::new();
        let mut book = DrillBook::open(&store);
        let before = store.raw(DocumentKey::Drills);
        let input: &[u8] = b"1\n2\n3\n4\n5\ncancel\n";

        run_drill_session(&mut book, "1", LONG_TICK, today(), input, &mut Vec::<u8>::new())
            .await
            .unwrap();

        assert_eq!(store.raw(DocumentKey::Drills), before);
    }

    #[tokio::test]
    async fn test_drill_session_unknown_input() {
        let mut book = DrillBook::open(MemoryStore::new());
        let input: &[u8] = b"0\n99\nhello\n";
        let mut out = Vec::new();

        run_drill_session(&mut book, "1", LONG_TICK, today(), input, &mut out)
            .await
            .unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("No step 99."));
        assert!(text.contains("Enter a step number, `done` or `q`."));
    }

    #[tokio::test]
    async fn test_drill_session_unknown_drill() {
        let mut book = DrillBook::open(MemoryStore::new());
        let input: &[u8] = b"";
        let result =
            run_drill_session(&mut book, "nope", LONG_TICK, today(), input, &mut Vec::<u8>::new())
                .await;
        assert!(is_not_found(&result));
    }

    #[tokio::test(start_paused = true)]
    async fn test_drill_session_clock_redraws() {
        let mut book = DrillBook::open(MemoryStore::new());
        let (reader, mut writer) = tokio::io::duplex(64);
        let mut out = Vec::new();

        let feed = async move {
            tokio::time::sleep(Duration::from_millis(2500)).await;
            tokio::io::AsyncWriteExt::write_all(&mut writer, b"q\n")
                .await
                .unwrap();
        };
        let session = run_drill_session(
            &mut book,
            "1",
            Duration::from_secs(1),
            today(),
            BufReader::new(reader),
            &mut out,
        );
        let (outcome, ()) = tokio::join!(session, feed);

        assert_eq!(outcome.unwrap().elapsed_seconds(), 2);
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("\rElapsed: 00:02"));
    }

    #[tokio::test]
    async fn test_guides_home_selection() {
        let dir = TempDir::new().unwrap();
        let config = test_config(&dir);
        let text = run_to_string(
            Command::Guides(GuidesCommand {
                search: None,
                category: None,
                all: false,
                json: false,
            }),
            &config,
        )
        .await;

        assert!(text.contains("CPR"));
        assert!(text.contains("Showing 6 of 9 guides"));
    }

    #[tokio::test]
    async fn test_guides_search_ignores_limit() {
        let dir = TempDir::new().unwrap();
        let config = test_config(&dir);
        let text = run_to_string(
            Command::Guides(GuidesCommand {
                search: Some("SNAKE".to_string()),
                category: None,
                all: false,
                json: false,
            }),
            &config,
        )
        .await;

        assert!(text.contains("snake"));
        assert!(!text.contains("Showing"));
    }

    #[tokio::test]
    async fn test_guide_detail_and_unknown() {
        let dir = TempDir::new().unwrap();
        let config = test_config(&dir);
        let text = run_to_string(
            Command::Guide(GuideCommand {
                id: "cpr".to_string(),
                quick: false,
                json: false,
            }),
            &config,
        )
        .await;
        assert!(text.starts_with("CPR\n===\n"));
        assert!(text.contains("[CRITICAL]"));
        assert!(text.contains("110 per minute"));

        let mut out = Vec::new();
        let result = run(
            Command::Guide(GuideCommand {
                id: "missing".to_string(),
                quick: false,
                json: false,
            }),
            &config,
            &mut out,
        )
        .await;
        assert!(is_not_found(&result));
    }

    #[tokio::test]
    async fn test_unknown_ids_are_not_found() {
        let dir = TempDir::new().unwrap();
        let config = test_config(&dir);
        let unknown = || "no-such-id".to_string();

        let commands = [
            Command::Plan(PlanCommand::Unmark { id: unknown() }),
            Command::Inventory(InventoryCommand::Remove { id: unknown() }),
            Command::Family(FamilyCommand::Remove { id: unknown() }),
        ];
        for command in commands {
            let mut out = Vec::new();
            let result = run(command, &config, &mut out).await;
            assert!(is_not_found(&result), "{result:?}");
            assert!(out.is_empty());
        }
    }

    #[tokio::test]
    async fn test_plan_mark_persists_between_runs() {
        let dir = TempDir::new().unwrap();
        let config = test_config(&dir);

        let text = run_to_string(
            Command::Plan(PlanCommand::Mark {
                kind: super::super::MarkerKindArg::Exit,
                x: 150.0,
                y: 25.0,
            }),
            &config,
        )
        .await;
        assert!(text.contains("Placed Exit at 100.0%, 25.0%"));

        let text = run_to_string(Command::Plan(PlanCommand::Show { json: true }), &config).await;
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["summary"]["markers"], 1);
        assert_eq!(value["markers"][0]["type"], "exit");
        assert_eq!(value["markers"][0]["x"], 100.0);
    }

    #[tokio::test]
    async fn test_plan_background_rejects_garbage() {
        let dir = TempDir::new().unwrap();
        let config = test_config(&dir);
        let file = dir.path().join("plan.png");
        std::fs::write(&file, b"not an image").unwrap();

        let mut out = Vec::new();
        let result = run(
            Command::Plan(PlanCommand::Background { file }),
            &config,
            &mut out,
        )
        .await;
        assert!(result.is_err());

        let text = run_to_string(Command::Plan(PlanCommand::Show { json: false }), &config).await;
        assert!(text.contains("Background:  none"));
    }

    #[tokio::test]
    async fn test_inventory_and_family_crud() {
        let dir = TempDir::new().unwrap();
        let config = test_config(&dir);

        let text = run_to_string(
            Command::Inventory(InventoryCommand::Add {
                name: "Whistle".to_string(),
                category: super::super::ItemCategoryArg::Tool,
                quantity: 2,
                expires: None,
                location: Some("Hall".to_string()),
            }),
            &config,
        )
        .await;
        assert!(text.starts_with("Added Whistle"));

        let text = run_to_string(
            Command::Inventory(InventoryCommand::List {
                category: Some(super::super::ItemCategoryArg::Tool),
                json: true,
            }),
            &config,
        )
        .await;
        let items: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(items.as_array().unwrap().len(), 2);

        let mut out = Vec::new();
        let result = run(
            Command::Family(FamilyCommand::Add {
                name: " ".to_string(),
                role: None,
                phone: None,
                blood_type: None,
                notes: None,
            }),
            &config,
            &mut out,
        )
        .await;
        assert!(result.is_err());

        let text =
            run_to_string(Command::Family(FamilyCommand::List { json: false }), &config).await;
        assert_eq!(text, "No family members recorded.\n");
    }

    #[tokio::test]
    async fn test_ask_without_key_falls_back() {
        let dir = TempDir::new().unwrap();
        let config = test_config(&dir);
        let text = run_to_string(
            Command::Ask(AskCommand {
                query: vec!["kitchen".to_string(), "fire".to_string()],
            }),
            &config,
        )
        .await;
        assert_eq!(text.trim(), crate::advisory::MISSING_KEY_MESSAGE);
    }

    #[tokio::test]
    async fn test_status_json() {
        let dir = TempDir::new().unwrap();
        let config = test_config(&dir);
        let text = run_to_string(Command::Status(StatusCommand { json: true }), &config).await;
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();

        // Fresh install: every default drill is due and nobody is recorded.
        assert_eq!(value["drills_due"].as_array().unwrap().len(), 4);
        assert_eq!(value["family_members"], 0);
        assert_eq!(value["advisory_configured"], false);
    }

    #[tokio::test]
    async fn test_config_show_masks_key() {
        let dir = TempDir::new().unwrap();
        let mut config = test_config(&dir);
        config.advisory.api_key = Some("secret-key".to_string());

        let text =
            run_to_string(Command::Config(ConfigCommand::Show { json: true }), &config).await;
        assert!(!text.contains("secret-key"));
        assert!(text.contains("********"));
    }
}
