use chrono::{DateTime, Local};

pub fn now_local() -> DateTime<Local> {
    Local::now()
}

pub fn format_local(now: &DateTime<Local>, pattern: &str) -> String {
    now.format(pattern).to_string()
}
