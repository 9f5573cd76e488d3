//! Main auto-splitting loop.

use std::path::Path;
use std::time::{Duration, Instant};

use anyhow::Result;
use fables_core::config::polling;
use fables_core::{
    AutoSplitter, DiagnosticSink, FileLogSink, NullSink, SplitList, SplitMode, SystemProcessProvider,
};
use owo_colors::OwoColorize;
use tracing::{info, warn};

use super::split_source;
use crate::shutdown::ShutdownSignal;

/// What the timer did on one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    Started,
    Split { index: usize, total: usize },
    Finished,
}

/// Split index bookkeeping a timer would normally do.
#[derive(Debug, Clone, Default)]
pub struct RunProgress {
    current: Option<usize>,
}

impl RunProgress {
    pub fn current(&self) -> Option<usize> {
        self.current
    }

    pub fn start(&mut self) -> TimerEvent {
        self.current = Some(0);
        TimerEvent::Started
    }

    /// Complete the current split; the last one finishes the run.
    pub fn split(&mut self, total: usize) -> TimerEvent {
        let index = self.current.unwrap_or(0);
        if index + 1 >= total {
            self.current = None;
            TimerEvent::Finished
        } else {
            self.current = Some(index + 1);
            TimerEvent::Split { index, total }
        }
    }
}

/// Splits the timer walks through; start/end-only runs have just the end.
fn total_splits(list: &SplitList) -> usize {
    match list.mode {
        SplitMode::StartEndOnly => 1,
        SplitMode::All => list.len().max(1),
    }
}

fn open_sink(log_file: Option<&Path>) -> Box<dyn DiagnosticSink> {
    let Some(path) = log_file else {
        return Box::new(NullSink);
    };
    match FileLogSink::open(path) {
        Ok(sink) => {
            info!("Writing diagnostics to {}", path.display());
            Box::new(sink)
        }
        Err(e) => {
            warn!("Failed to open log file {}: {}", path.display(), e);
            Box::new(NullSink)
        }
    }
}

/// Run the auto-splitter until Ctrl+C.
pub fn run(splits: Option<&Path>, log_file: Option<&Path>, interval_ms: u64) -> Result<()> {
    let shutdown = ShutdownSignal::install_ctrlc()?;
    println!("fables-splitter v{}", env!("CARGO_PKG_VERSION"));

    let mut splitter = AutoSplitter::new(SystemProcessProvider, split_source(splits), open_sink(log_file));
    println!(
        "Loaded {} splits ({} mode)",
        splitter.splits().len(),
        splitter.splits().mode
    );
    println!("Waiting for Bug Fables... (Ctrl+C to quit)");

    let interval = Duration::from_millis(interval_ms);
    let mut progress = RunProgress::default();
    let mut run_started: Option<Instant> = None;
    let mut was_bound = false;

    while !shutdown.is_shutdown() {
        let bound = splitter.hook();
        if bound != was_bound {
            print_binding(&splitter, bound);
            was_bound = bound;
        }
        if !bound {
            if shutdown.wait(polling::UNBOUND_RETRY) {
                break;
            }
            continue;
        }

        let total = total_splits(splitter.splits());
        let event = match progress.current() {
            None if splitter.should_start() => Some(progress.start()),
            Some(index) if splitter.should_split(index, total) => Some(progress.split(total)),
            _ => None,
        };

        if let Some(event) = event {
            match event {
                TimerEvent::Started => run_started = Some(Instant::now()),
                TimerEvent::Finished => splitter.reset(),
                TimerEvent::Split { .. } => {}
            }
            let elapsed = run_started.map(|t| t.elapsed()).unwrap_or_default();
            let name = progress
                .current()
                .and_then(|i| i.checked_sub(1))
                .and_then(|i| splitter.splits().get(i))
                .map(|s| s.name.as_str());
            println!("{}", format_event(event, name, elapsed));
        }

        if shutdown.wait(interval) {
            break;
        }
    }

    println!("Stopped.");
    Ok(())
}

fn print_binding(splitter: &AutoSplitter<SystemProcessProvider>, bound: bool) {
    if !bound {
        println!("{}", "Game closed, waiting...".yellow());
        return;
    }
    let status = splitter.status();
    let version = status
        .version
        .map(|v| v.to_string())
        .unwrap_or_else(|| "unknown".to_string());
    println!(
        "{} (PID {}, version {})",
        "Connected to Bug Fables".green(),
        status.process_id.unwrap_or_default(),
        version
    );
    if status.fallback_layout {
        println!("{}", "Unrecognized game build, using the newest layout".yellow());
    }
}

fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    format!(
        "{}:{:02}:{:02}.{:03}",
        secs / 3600,
        (secs / 60) % 60,
        secs % 60,
        elapsed.subsec_millis()
    )
}

fn format_event(event: TimerEvent, split_name: Option<&str>, elapsed: Duration) -> String {
    let time = format_elapsed(elapsed);
    match event {
        TimerEvent::Started => format!("{} {}", "▶ Run started".bold().green(), time.dimmed()),
        TimerEvent::Split { index, total } => format!(
            "{} {}/{} {} {}",
            "✔ Split".cyan(),
            index + 1,
            total,
            split_name.unwrap_or("").bold(),
            time.dimmed()
        ),
        TimerEvent::Finished => format!("{} {}", "■ Run finished".bold().magenta(), time.bold()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_walks_splits() {
        let mut progress = RunProgress::default();
        assert_eq!(progress.current(), None);
        assert_eq!(progress.start(), TimerEvent::Started);
        assert_eq!(progress.current(), Some(0));
        assert_eq!(progress.split(3), TimerEvent::Split { index: 0, total: 3 });
        assert_eq!(progress.split(3), TimerEvent::Split { index: 1, total: 3 });
        assert_eq!(progress.split(3), TimerEvent::Finished);
        assert_eq!(progress.current(), None);
    }

    #[test]
    fn test_single_split_run_finishes_immediately() {
        let mut progress = RunProgress::default();
        progress.start();
        assert_eq!(progress.split(1), TimerEvent::Finished);
    }

    #[test]
    fn test_start_end_only_run_finishes_on_end() {
        use fables_core::Split;

        let list = SplitList::new(SplitMode::StartEndOnly, vec![Split::new("A"), Split::new("B")]);
        let total = total_splits(&list);
        assert_eq!(total, 1);

        let mut progress = RunProgress::default();
        progress.start();
        assert_eq!(progress.split(total), TimerEvent::Finished);
    }

    #[test]
    fn test_total_splits_in_all_mode() {
        use fables_core::Split;

        assert_eq!(total_splits(&SplitList::default()), 1);
        let list = SplitList::new(SplitMode::All, vec![Split::new("A"), Split::new("B")]);
        assert_eq!(total_splits(&list), 2);
    }

    #[test]
    fn test_format_elapsed() {
        assert_eq!(format_elapsed(Duration::from_millis(3_723_045)), "1:02:03.045");
        assert_eq!(format_elapsed(Duration::ZERO), "0:00:00.000");
    }

    #[test]
    fn test_format_event_mentions_split() {
        let line = format_event(
            TimerEvent::Split { index: 0, total: 2 },
            Some("Spuder"),
            Duration::from_secs(61),
        );
        assert!(line.contains("1/2"));
        assert!(line.contains("Spuder"));
        assert!(line.contains("0:01:01.000"));
    }
}
