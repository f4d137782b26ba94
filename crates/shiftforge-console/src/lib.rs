//! Colorful console output for optimizer runs.
//!
//! Provides a custom `tracing` layer that formats ShiftForge events with colors.
//!
//! ## Log Levels
//!
//! - **INFO**: Lifecycle events (solve/phase start and end)
//! - **WARN**: Input validation failures
//! - **ERROR**: Phase failures
//! - **DEBUG**: Improving solutions, search start and end

use num_format::{Locale, ToFormattedString};
use owo_colors::OwoColorize;
use std::io::{self, Write};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::OnceLock;
use std::time::Instant;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::Context;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

static INIT: OnceLock<()> = OnceLock::new();
static EPOCH: OnceLock<Instant> = OnceLock::new();
static SOLVE_START_NANOS: AtomicU64 = AtomicU64::new(0);

/// Filter used when `RUST_LOG` is not set.
pub const DEFAULT_FILTER: &str = "shiftforge=info,shiftforge_solver=info";

/// Package version for banner display.
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initializes the console output.
///
/// Safe to call multiple times - only the first call has effect.
/// Prints the ShiftForge banner and sets up tracing.
pub fn init() {
    INIT.get_or_init(|| {
        print_banner();

        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

        let _ = tracing_subscriber::registry()
            .with(filter)
            .with(ShiftForgeConsoleLayer)
            .try_init();
    });
}

// Marks the start of solving for elapsed time tracking.
fn mark_solve_start() {
    let epoch = EPOCH.get_or_init(Instant::now);
    let nanos = epoch.elapsed().as_nanos() as u64;
    SOLVE_START_NANOS.store(nanos, Ordering::Relaxed);
}

// Returns elapsed time since solve start.
fn elapsed_secs() -> f64 {
    let Some(epoch) = EPOCH.get() else {
        return 0.0;
    };
    let start_nanos = SOLVE_START_NANOS.load(Ordering::Relaxed);
    let now_nanos = epoch.elapsed().as_nanos() as u64;
    now_nanos.saturating_sub(start_nanos) as f64 / 1_000_000_000.0
}

fn print_banner() {
    let banner = r#"
 ____  _     _  __ _   _____
/ ___|| |__ (_)/ _| |_|  ___|__  _ __ __ _  ___
\___ \| '_ \| | |_| __| |_ / _ \| '__/ _` |/ _ \
 ___) | | | | |  _| |_|  _| (_) | | | (_| |  __/
|____/|_| |_|_|_|  \__|_|  \___/|_|  \__, |\___|
                                     |___/
"#;

    let version_line = format!(
        "              v{} - Lexicographic Shift Optimizer\n",
        VERSION
    );

    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{}", banner.bright_cyan());
    let _ = writeln!(stdout, "{}", version_line.bright_white().bold());
    let _ = stdout.flush();
}

/// A tracing layer that formats optimizer events with colors.
pub struct ShiftForgeConsoleLayer;

impl<S: Subscriber> Layer<S> for ShiftForgeConsoleLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        if !metadata.target().starts_with("shiftforge") {
            return;
        }

        let mut visitor = EventVisitor::default();
        event.record(&mut visitor);

        let output = format_event(&visitor, *metadata.level());
        if !output.is_empty() {
            let _ = writeln!(io::stdout(), "{}", output);
        }
    }
}

#[derive(Debug, Default)]
struct EventVisitor {
    event: Option<String>,
    phase: Option<String>,
    status: Option<String>,
    reason: Option<String>,
    message: Option<String>,
    total_cost: Option<String>,
    phase_index: Option<u64>,
    objective: Option<i64>,
    solution_count: Option<u64>,
    nodes: Option<u64>,
    speed: Option<u64>,
    duration_ms: Option<u64>,
    staff_count: Option<u64>,
    day_count: Option<u64>,
    variable_count: Option<u64>,
    constraint_count: Option<u64>,
    workers: Option<u64>,
    fairness_gap: Option<u64>,
    rows: Option<u64>,
}

impl Visit for EventVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        let s = format!("{:?}", value);
        let s = s.trim_matches('"').to_string();
        match field.name() {
            "event" => self.event = Some(s),
            "phase" => self.phase = Some(s),
            "status" => self.status = Some(s),
            "reason" | "error" => self.reason = Some(s),
            "message" => self.message = Some(s),
            "total_cost" => self.total_cost = Some(s),
            _ => {}
        }
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        match field.name() {
            "phase_index" => self.phase_index = Some(value),
            "solution_count" => self.solution_count = Some(value),
            "nodes" => self.nodes = Some(value),
            "speed" => self.speed = Some(value),
            "duration_ms" => self.duration_ms = Some(value),
            "staff_count" => self.staff_count = Some(value),
            "day_count" => self.day_count = Some(value),
            "variable_count" => self.variable_count = Some(value),
            "constraint_count" => self.constraint_count = Some(value),
            "workers" => self.workers = Some(value),
            "fairness_gap" => self.fairness_gap = Some(value),
            "rows" => self.rows = Some(value),
            "objective" => self.objective = Some(value as i64),
            _ => {}
        }
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        match field.name() {
            "objective" => self.objective = Some(value),
            _ => self.record_u64(field, value.max(0) as u64),
        }
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        if field.name() == "total_cost" {
            self.total_cost = Some(format!("{:.2}", value));
        }
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        match field.name() {
            "event" => self.event = Some(value.to_string()),
            "phase" => self.phase = Some(value.to_string()),
            "status" => self.status = Some(value.to_string()),
            "reason" | "error" => self.reason = Some(value.to_string()),
            "message" => self.message = Some(value.to_string()),
            "total_cost" => self.total_cost = Some(value.to_string()),
            _ => {}
        }
    }
}

fn format_event(v: &EventVisitor, level: Level) -> String {
    let event = v.event.as_deref().unwrap_or("");

    match event {
        "solve_start" => format_solve_start(v),
        "solve_end" => format_solve_end(v),
        "solve_failed" => format_solve_failed(v),
        "phase_start" => format_phase_start(v),
        "phase_end" => format_phase_end(v),
        "improved" => format_improved(v),
        "validation_failed" => format_validation_failed(v),
        _ if level == Level::ERROR => format_error(v),
        _ => String::new(),
    }
}

fn format_elapsed() -> String {
    format!("{:>7.3}s", elapsed_secs())
        .bright_black()
        .to_string()
}

fn format_count(n: u64) -> String {
    n.to_formatted_string(&Locale::en)
}

fn format_solve_start(v: &EventVisitor) -> String {
    mark_solve_start();
    let staff = v.staff_count.unwrap_or(0);
    let days = v.day_count.unwrap_or(0);
    let variables = v.variable_count.unwrap_or(0);

    let mut output = format!(
        "{} {} Solving │ {} staff │ {} days │ search space {}",
        format_elapsed(),
        "▶".bright_green().bold(),
        format_count(staff).bright_yellow(),
        format_count(days).bright_yellow(),
        search_space(variables).bright_magenta()
    );

    if let Some(constraints) = v.constraint_count.filter(|c| *c > 0) {
        output.push_str(&format!(
            " │ {} constraints",
            format_count(constraints).bright_yellow()
        ));
    }

    if let Some(workers) = v.workers {
        output.push_str(&format!(" │ {} workers", format_count(workers).bright_yellow()));
    }

    output
}

fn format_solve_end(v: &EventVisitor) -> String {
    let cost = v.total_cost.as_deref().unwrap_or("N/A");
    let gap = v.fairness_gap.unwrap_or(0);
    let rows = v.rows.unwrap_or(0);

    let mut output = format!(
        "{} {} Solving complete │ {} assignments",
        format_elapsed(),
        "■".bright_cyan().bold(),
        format_count(rows).white(),
    );

    output.push_str("\n\n");
    output.push_str(&BOX_TOP.bright_cyan().to_string());
    output.push('\n');
    output.push_str(&box_centered("SCHEDULE FOUND", true));
    output.push('\n');
    output.push_str(&BOX_SEPARATOR.bright_cyan().to_string());
    output.push('\n');
    output.push_str(&box_line("Total cost:", cost));
    output.push('\n');
    output.push_str(&box_line("Fairness gap:", &gap.to_string()));
    output.push('\n');
    output.push_str(&BOX_BOTTOM.bright_cyan().to_string());
    output.push('\n');

    output
}

fn format_solve_failed(v: &EventVisitor) -> String {
    let reason = v.reason.as_deref().unwrap_or("unknown failure");

    let mut output = format!(
        "{} {} Solving failed │ {}",
        format_elapsed(),
        "✗".bright_red().bold(),
        reason.bright_red()
    );

    output.push_str("\n\n");
    output.push_str(&BOX_TOP.bright_cyan().to_string());
    output.push('\n');
    output.push_str(&box_centered("EMPTY SCHEDULE", false));
    output.push('\n');
    output.push_str(&BOX_BOTTOM.bright_cyan().to_string());
    output.push('\n');

    output
}

fn format_validation_failed(v: &EventVisitor) -> String {
    let reason = v.reason.as_deref().or(v.message.as_deref()).unwrap_or("");
    format!(
        "{} {} Invalid input │ {}",
        format_elapsed(),
        "!".bright_yellow().bold(),
        reason.yellow()
    )
}

fn format_error(v: &EventVisitor) -> String {
    let message = v.message.as_deref().unwrap_or("");
    let mut output = format!(
        "{} {} {}",
        format_elapsed(),
        "✗".bright_red().bold(),
        message.bright_red()
    );
    if let Some(status) = v.status.as_deref() {
        output.push_str(&format!(" │ {}", format_status(status)));
    }
    output
}

fn format_phase_start(v: &EventVisitor) -> String {
    let phase = v.phase.as_deref().unwrap_or("Unknown");

    format!(
        "{} {} {} started",
        format_elapsed(),
        "▶".bright_blue(),
        phase.white().bold()
    )
}

fn format_phase_end(v: &EventVisitor) -> String {
    let phase = v.phase.as_deref().unwrap_or("Unknown");
    let status = v.status.as_deref().unwrap_or("UNKNOWN");
    let duration = v.duration_ms.unwrap_or(0);

    let mut output = format!(
        "{} {} {} ended │ {}",
        format_elapsed(),
        "◀".bright_blue(),
        phase.white().bold(),
        format_status(status),
    );

    if v.nodes.is_some() {
        output.push_str(&format!(
            " │ {} │ {} nodes │ {} nodes/s",
            format_duration_ms(duration).yellow(),
            format_count(v.nodes.unwrap_or(0)).white(),
            format_count(v.speed.unwrap_or(0)).bright_magenta().bold(),
        ));
    }

    if let Some(objective) = v.objective {
        output.push_str(&format!(" │ objective {}", objective.bright_green()));
    }

    output
}

fn format_improved(v: &EventVisitor) -> String {
    let phase = v.phase.as_deref().unwrap_or("");
    let count = v.solution_count.unwrap_or(0);
    let objective = v
        .objective
        .map(|o| o.to_string())
        .unwrap_or_else(|| "N/A".to_string());

    format!(
        "{} {} {} solution #{} │ objective {}",
        format_elapsed(),
        "⚡".bright_cyan(),
        phase.bright_black(),
        format_count(count).white(),
        objective.bright_green()
    )
}

fn format_status(status: &str) -> String {
    match status {
        "OPTIMAL" => status.bright_green().bold().to_string(),
        "FEASIBLE" => status.green().to_string(),
        "INFEASIBLE" | "MODEL_INVALID" => status.bright_red().bold().to_string(),
        _ => status.yellow().to_string(),
    }
}

fn format_duration_ms(ms: u64) -> String {
    if ms < 1000 {
        format!("{}ms", ms)
    } else if ms < 60_000 {
        format!("{:.2}s", ms as f64 / 1000.0)
    } else {
        let mins = ms / 60_000;
        let secs = (ms % 60_000) / 1000;
        format!("{}m {}s", mins, secs)
    }
}

// Number of complete assignments of `variables` booleans, as a power of ten.
fn search_space(variables: u64) -> String {
    if variables == 0 {
        return "1".to_string();
    }

    let log_scale = variables as f64 * 2f64.log10();
    let exponent = log_scale.floor() as i32;
    let mantissa = 10f64.powf(log_scale - exponent as f64);

    format!("{:.3} x 10^{}", mantissa, exponent)
}

const BOX_INNER_WIDTH: usize = 58;
const BOX_TOP: &str = "╔══════════════════════════════════════════════════════════╗";
const BOX_SEPARATOR: &str = "╠══════════════════════════════════════════════════════════╣";
const BOX_BOTTOM: &str = "╚══════════════════════════════════════════════════════════╝";

fn box_centered(text: &str, success: bool) -> String {
    let total_pad = BOX_INNER_WIDTH.saturating_sub(text.len());
    let left_pad = total_pad / 2;
    let right_pad = total_pad - left_pad;
    let colored = if success {
        text.bright_green().bold().to_string()
    } else {
        text.bright_red().bold().to_string()
    };
    format!(
        "{}{}{}{}{}",
        "║".bright_cyan(),
        " ".repeat(left_pad),
        colored,
        " ".repeat(right_pad),
        "║".bright_cyan()
    )
}

fn box_line(label: &str, value: &str) -> String {
    format!(
        "{}  {:<18}{:>36}  {}",
        "║".bright_cyan(),
        label,
        value,
        "║".bright_cyan()
    )
}
