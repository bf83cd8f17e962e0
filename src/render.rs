//! Text components shared by the screens. No network access here.

use chrono::NaiveDate;

use crate::models::{Activity, ActivityKind, Progress, Subtask, SubtaskStatus};

const BAR_WIDTH: usize = 20;

pub fn kind_badge(kind: ActivityKind) -> String {
    format!("[{}]", kind.label())
}

pub fn status_badge(status: SubtaskStatus) -> String {
    format!("({})", status.label())
}

pub fn progress_bar(percent: u8) -> String {
    let percent = percent.min(100) as usize;
    let filled = (percent * BAR_WIDTH + 50) / 100;
    format!(
        "[{}{}] {}%",
        "#".repeat(filled),
        "-".repeat(BAR_WIDTH - filled),
        percent
    )
}

const ERROR_MARK: &str = "✖";

pub fn error_alert(message: &str) -> String {
    format!("{} {}", ERROR_MARK, message)
}

pub fn is_error_alert(text: &str) -> bool {
    text.starts_with(ERROR_MARK)
}

pub fn success_notice(message: &str) -> String {
    format!("✔ {}", message)
}

pub fn short_date(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}

pub fn subtask_line(subtask: &Subtask) -> String {
    let check = if subtask.is_completed() { "[x]" } else { "[ ]" };
    let mut line = format!(
        "{} {} {} {}",
        check,
        subtask.id,
        subtask.name,
        status_badge(subtask.status)
    );
    if let Some(date) = subtask.target_date {
        line.push_str(&format!(" · {}", short_date(date)));
    }
    if let Some(hours) = subtask.estimated_hours {
        line.push_str(&format!(" · {}h", hours));
    }
    line
}

pub fn progress_summary(progress: &Progress) -> String {
    format!(
        "{}/{} completadas · {:.1}h estimadas",
        progress.done, progress.total, progress.hours
    )
}

pub fn activity_row(activity: &Activity) -> String {
    let progress = Progress::of(&activity.subtasks);
    let mut row = format!(
        "#{} {} {} - {}",
        activity.id,
        kind_badge(activity.kind),
        activity.title,
        activity.course
    );
    if let Some(due) = activity.due_date {
        row.push_str(&format!(" · entrega {}", short_date(due)));
    }
    if progress.total > 0 {
        row.push_str(&format!(" · {}%", progress.percent));
    }
    row
}
