use crate::models::session::EnrichedSession;

const COLUMN_WIDTH: usize = 15;
const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const HEADERS: [&str; 4] = ["User Name", "Log-in Type", "Status", "LogonTime"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
}

/// Case-insensitive by user name; equal names keep their original order.
pub fn sort_sessions(sessions: &mut [EnrichedSession]) {
    sessions.sort_by_cached_key(|s| s.user_name.to_lowercase());
}

pub fn render(sessions: &[EnrichedSession], format: OutputFormat) -> serde_json::Result<String> {
    match format {
        OutputFormat::Table => Ok(render_table(sessions)),
        OutputFormat::Json => render_json(sessions),
    }
}

/// Fixed-width table; callers sort first.
pub fn render_table(sessions: &[EnrichedSession]) -> String {
    let mut out = String::new();

    out.push_str(&format_row(HEADERS[0], HEADERS[1], HEADERS[2], HEADERS[3]));
    let underline: Vec<String> = HEADERS.iter().map(|h| "-".repeat(h.len())).collect();
    out.push_str(&format_row(&underline[0], &underline[1], &underline[2], &underline[3]));

    for session in sessions {
        let logon_time = session
            .logon_time
            .map(|t| t.format(TIME_FORMAT).to_string())
            .unwrap_or_default();
        out.push_str(&format_row(
            &session.user_name,
            session.login_type.label(),
            &session.status,
            &logon_time,
        ));
    }

    out
}

pub fn render_json(sessions: &[EnrichedSession]) -> serde_json::Result<String> {
    serde_json::to_string_pretty(sessions).map(|json| json + "\n")
}

fn format_row(user: &str, login_type: &str, status: &str, logon_time: &str) -> String {
    let line = format!(
        "{:<width$}{:<width$}{:<width$}{}",
        fit(user),
        fit(login_type),
        fit(status),
        logon_time,
        width = COLUMN_WIDTH
    );
    format!("{}\n", line.trim_end())
}

/// Values wider than a column are cut to exactly the column width.
fn fit(value: &str) -> String {
    if value.chars().count() <= COLUMN_WIDTH {
        value.to_string()
    } else {
        let kept: String = value.chars().take(COLUMN_WIDTH - 3).collect();
        format!("{}...", kept)
    }
}
