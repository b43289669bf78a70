//! Draw slot normalization.
//!
//! Slots are typed by hand at terminals ("8:45pm", "08.45 PM", "8 PM").
//! Two strings that normalize to the same value are the same slot.

use chrono::NaiveTime;

/// Canonicalize a slot to `HH:MM AM|PM`.
///
/// Best effort: input that does not look like a 12-hour clock time comes
/// back trimmed and upper-cased instead of being rejected. Empty input → `""`.
pub fn normalize_slot(raw: &str) -> String {
    let clean = raw.trim().to_uppercase();
    if clean.is_empty() {
        return String::new();
    }
    parse_clock(&clean)
        .map(|(h, m, meridiem)| format!("{h:02}:{m:02} {meridiem}"))
        .unwrap_or(clean)
}

/// Normalize a stored slot list.
///
/// Accepts a JSON array of strings (possibly nested one level, as some
/// terminals send `[["11:45 AM"], ["12:00 PM"]]`), a JSON string, or a bare
/// slot. Blank entries are dropped; order and duplicates are preserved as
/// given except that duplicates after normalization collapse.
pub fn parse_slot_list(raw: &str) -> Vec<String> {
    let trimmed = raw.trim();
    let items: Vec<String> = match serde_json::from_str::<serde_json::Value>(trimmed) {
        Ok(serde_json::Value::Array(values)) => values.iter().flat_map(flatten_value).collect(),
        Ok(serde_json::Value::String(s)) => vec![s],
        _ if trimmed.is_empty() => Vec::new(),
        _ => vec![trimmed.to_string()],
    };
    normalize_slots(items.iter().map(String::as_str))
}

/// Normalize a list of raw slots, dropping blanks and collapsing duplicates.
pub fn normalize_slots<'a, I>(raw: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut out: Vec<String> = Vec::new();
    for slot in raw.into_iter().map(normalize_slot) {
        if !slot.is_empty() && !out.contains(&slot) {
            out.push(slot);
        }
    }
    out
}

/// Clock time of a slot, or `None` when it does not normalize to a time.
pub fn time_of_day(slot: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(&normalize_slot(slot), "%I:%M %p").ok()
}

fn flatten_value(value: &serde_json::Value) -> Vec<String> {
    match value {
        serde_json::Value::String(s) => vec![s.clone()],
        serde_json::Value::Array(inner) => inner
            .iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect(),
        _ => Vec::new(),
    }
}

/// `H[H][(:|.)[M[M]]][ ]AM|PM` → (hour, minute, meridiem).
fn parse_clock(clean: &str) -> Option<(u32, u32, &'static str)> {
    let (body, meridiem) = if let Some(b) = clean.strip_suffix("AM") {
        (b, "AM")
    } else if let Some(b) = clean.strip_suffix("PM") {
        (b, "PM")
    } else {
        return None;
    };
    let body = body.trim_end();

    let hour_len = body.bytes().take_while(u8::is_ascii_digit).count();
    if !(1..=2).contains(&hour_len) {
        return None;
    }
    let (hour, rest) = body.split_at(hour_len);
    let rest = rest
        .strip_prefix(':')
        .or_else(|| rest.strip_prefix('.'))
        .unwrap_or(rest);
    if rest.len() > 2 || !rest.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let h: u32 = hour.parse().ok()?;
    let m: u32 = if rest.is_empty() { 0 } else { rest.parse().ok()? };
    if !(1..=12).contains(&h) || m > 59 {
        return None;
    }
    Some((h, m, meridiem))
}
