//! Terminal rendering of the hub and the running block.

use training_core::controller::{NoticeLevel, SessionController, ViewState};
use training_core::rest_timer::{format_clock, RestTimer, TimerState};
use training_core::runner::{BlockRunner, ItemState};
use training_core::{CompletionSink, ExerciseLog, IntervalKind};

pub fn banner(title: &str) {
    println!("\n╭─────────────────────────────────────────╮");
    println!("│  {}", title);
    println!("╰─────────────────────────────────────────╯");
}

pub fn view<S: CompletionSink>(session: &SessionController<S>) {
    match session.state() {
        ViewState::Empty => println!("No workout scheduled."),
        ViewState::Hub => hub(session),
        ViewState::Running(_) => block(session),
        ViewState::AllComplete => {
            banner("SESSION COMPLETE");
            println!("  All {} blocks done.", session.blocks().len());
        }
    }
}

pub fn hub<S: CompletionSink>(session: &SessionController<S>) {
    banner("TODAY'S SESSION");
    println!();
    for (n, summary) in session.section_summaries().iter().enumerate() {
        let mark = if summary.done { "✓" } else { " " };
        println!(
            "  {}. [{}] {} ({}/{})",
            n + 1,
            mark,
            summary.name,
            summary.done_count,
            summary.members.len()
        );
    }
    println!();
    println!("Pick a section by number or name, 'q' to quit");
}

pub fn block<S: CompletionSink>(session: &SessionController<S>) {
    let (Some((index, block)), Some(runner)) = (session.current_block(), session.runner()) else {
        return;
    };

    banner(&format!(
        "{} · {}/{}",
        block.section.to_uppercase(),
        index + 1,
        session.blocks().len()
    ));
    println!();
    println!("  {}", block.name);
    println!();

    match runner {
        BlockRunner::Exercise(r) => {
            for set in 0..r.sets() {
                let weight = r.weight(set).filter(|w| !w.is_empty());
                println!(
                    "  [{}] Set {}: {} reps{}",
                    mark(r.is_set_done(set)),
                    set + 1,
                    r.spec().reps_for_set(set),
                    weight.map(|w| format!(" @ {}", w)).unwrap_or_default()
                );
            }
            if let Some(tips) = &r.spec().tips {
                println!();
                println!("  Tips: {}", tips);
            }
        }
        BlockRunner::Checklist(r) => {
            for (i, item) in r.items().iter().enumerate() {
                match r.item_state(i) {
                    Some(ItemState::Label) => println!("  {}", item.text().to_uppercase()),
                    Some(ItemState::Checkbox { checked }) => {
                        println!("  {:>2}. [{}] {}", i + 1, mark(checked), item.text())
                    }
                    Some(ItemState::Disclosure { expanded }) => {
                        let arrow = if expanded { "▾" } else { "▸" };
                        println!("  {:>2}. {} {}", i + 1, arrow, item.text());
                        if expanded {
                            if let training_core::ChecklistItem::Item { details, .. } = item {
                                for line in details {
                                    println!("        {}", line);
                                }
                            }
                        }
                    }
                    None => {}
                }
            }
        }
        BlockRunner::Superset(r) => {
            for (e, exercise) in r.spec().exercises.iter().enumerate() {
                let reps = exercise
                    .reps
                    .as_ref()
                    .map(|reps| format!(" x {}", reps))
                    .unwrap_or_default();
                let rounds: Vec<&str> = (0..r.rounds()).map(|round| mark(r.is_done(e, round))).collect();
                println!("  {}. {}{}  [{}]", e + 1, exercise.name, reps, rounds.join("]["));
                if let Some(sets) = session.drill_down(&exercise.name).and_then(|d| d.last_sets) {
                    println!("       last: {}", describe_sets(&sets));
                }
            }
        }
        BlockRunner::Timed(r) => match r.current_interval() {
            Some(interval) if interval.kind == IntervalKind::Card => {
                println!("  {}/{}: {}", r.current_index() + 1, r.intervals().len(), interval.zone);
            }
            Some(interval) => {
                println!(
                    "  {}/{}: {} for {}",
                    r.current_index() + 1,
                    r.intervals().len(),
                    interval.zone,
                    format_clock(interval.seconds)
                );
            }
            None => {}
        },
    }

    if let Some(note) = current_note(runner) {
        println!("  Note: {}", note);
    }

    if let Some(drill) = session.drill_down(&block.name) {
        println!();
        if let Some(info) = drill.info {
            for cue in &info.cues {
                println!("  • {}", cue);
            }
            if let Some(url) = &info.reference_url {
                println!("  ℹ Reference: {}", url);
            }
        }
        if let Some(last) = drill.last {
            println!(
                "  Last time: {} ({} XP)",
                last.recorded_at.format("%Y-%m-%d"),
                last.xp
            );
        }
        if let Some(sets) = drill.last_sets.filter(|log| !log.sets.is_empty()) {
            println!("  Last sets: {}", describe_sets(&sets));
        }
    }

    println!();
    println!("{}", help(runner));
}

fn describe_sets(log: &ExerciseLog) -> String {
    if log.sets.is_empty() {
        return "no sets".to_string();
    }
    log.sets
        .iter()
        .map(|set| format!("{}x{}", set.weight, set.reps))
        .collect::<Vec<_>>()
        .join(", ")
}

fn current_note(runner: &BlockRunner) -> Option<&str> {
    match runner {
        BlockRunner::Timed(r) => r.current_interval().and_then(|i| i.note.as_deref()),
        _ => None,
    }
}

fn help(runner: &BlockRunner) -> &'static str {
    match runner {
        BlockRunner::Exercise(_) => {
            "t N toggle set · w N KG weight · x skip rest · p/r pause/resume · d done · s skip · b hub"
        }
        BlockRunner::Checklist(_) => "t N toggle item · d done · s skip · b hub",
        BlockRunner::Superset(_) => {
            "t E R toggle · w E R KG weight · x skip rest · p/r pause/resume · d done · s skip · b hub"
        }
        BlockRunner::Timed(_) => "n next/continue · p/r pause/resume · rs restart · s skip · b hub",
    }
}

/// One-line countdown status, overwritten in place each second.
pub fn timer_status<S: CompletionSink>(session: &SessionController<S>) {
    let Some(timer) = session.runner().and_then(BlockRunner::timer) else {
        return;
    };
    if let Some(line) = status_line(timer) {
        print!("\r  {}   ", line);
        use std::io::Write;
        let _ = std::io::stdout().flush();
    }
}

fn status_line(timer: &RestTimer) -> Option<String> {
    match timer.state() {
        TimerState::Running => Some(format!("⏱ {}", format_clock(timer.remaining()))),
        TimerState::Paused => Some(format!("⏸ {} (paused)", format_clock(timer.remaining()))),
        TimerState::Finished if timer.duration() > 0 => Some("Time!".to_string()),
        _ => None,
    }
}

pub fn notices<S: CompletionSink>(session: &mut SessionController<S>) {
    for notice in session.take_notices() {
        match notice.level {
            NoticeLevel::Warning => eprintln!("  ! {}", notice.message),
            NoticeLevel::Info => println!("  ! {}", notice.message),
        }
    }
}

fn mark(done: bool) -> &'static str {
    if done {
        "x"
    } else {
        " "
    }
}
