//! Splits command implementation.

use std::fmt::Write as _;
use std::path::Path;

use anyhow::{Context, Result, bail};
use fables_core::{Split, SplitList, SplitMode};
use owo_colors::OwoColorize;

/// Load, validate and print a split file.
pub fn run(path: Option<&Path>) -> Result<()> {
    let Some(path) = path else {
        bail!("No split file given (use --splits FILE)");
    };
    let list = SplitList::load(path)
        .with_context(|| format!("Invalid split file {}", path.display()))?;

    print!("{}", format_list(&list));
    Ok(())
}

fn format_list(list: &SplitList) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "Mode    : {}", list.mode.bold());
    let _ = writeln!(
        output,
        "Ids     : new game flag {}, new game event {}, end room {}, level-up song {}",
        list.ids.new_game_started_flag,
        list.ids.new_game_event,
        list.ids.end_room,
        list.ids.level_up_song
    );

    if list.mode == SplitMode::StartEndOnly && !list.is_empty() {
        let _ = writeln!(
            output,
            "{}",
            "Intermediate splits are ignored in start_end_only mode".yellow()
        );
    }

    let mut group = "";
    for (i, split) in list.splits.iter().enumerate() {
        if !split.group.is_empty() && split.group != group {
            group = &split.group;
            let _ = writeln!(output, "{}", group.dimmed());
        }
        let _ = writeln!(output, "  {:>3}. {}", i, describe(split));
    }
    output
}

fn describe(split: &Split) -> String {
    let mut conditions = Vec::new();
    if let Some(room) = split.required_room {
        conditions.push(format!("room {}", room));
    }
    if !split.required_flags.is_empty() {
        conditions.push(format!("flags {:?}", split.required_flags));
    }
    if !split.required_enemies.is_empty() {
        conditions.push(format!("defeat {:?}", split.required_enemies));
    }

    if conditions.is_empty() {
        split.name.clone()
    } else {
        format!("{} ({})", split.name, conditions.join(", "))
    }
}
