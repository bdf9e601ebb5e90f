use unicode_width::UnicodeWidthStr;

use crate::record::Record;

const HEADER: [&str; 7] = [
    "#",
    "Host",
    "HostName",
    "User",
    "Port",
    "LoginTimes",
    "LastLoginTime",
];

/// Renders `records` as left aligned columns, one host per line.
pub fn render_table(records: &[Record]) -> String {
    if records.is_empty() {
        return "No cached hosts\n".to_string();
    }

    let rows: Vec<[String; 7]> = records
        .iter()
        .enumerate()
        .map(|(index, r)| {
            [
                index.to_string(),
                r.alias.clone(),
                r.hostname.clone(),
                r.user.clone(),
                r.port_or_default().to_string(),
                r.use_count.to_string(),
                r.last_used_at.clone().unwrap_or_default(),
            ]
        })
        .collect();

    let mut widths = HEADER.map(UnicodeWidthStr::width);
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(UnicodeWidthStr::width(cell.as_str()));
        }
    }

    let mut out = String::new();
    push_row(&mut out, HEADER.iter().copied(), &widths);
    for row in &rows {
        push_row(&mut out, row.iter().map(String::as_str), &widths);
    }
    out
}

fn push_row<'a>(out: &mut String, cells: impl Iterator<Item = &'a str>, widths: &[usize]) {
    let mut line = String::new();
    for (cell, width) in cells.zip(widths) {
        line.push_str(cell);
        let pad = width.saturating_sub(UnicodeWidthStr::width(cell)) + 2;
        line.extend(std::iter::repeat(' ').take(pad));
    }
    out.push_str(line.trim_end());
    out.push('\n');
}

pub fn render_json(records: &[Record]) -> serde_json::Result<String> {
    serde_json::to_string_pretty(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records() -> Vec<Record> {
        vec![
            Record {
                alias: "数据库".into(),
                hostname: "10.0.0.1".into(),
                user: "root".into(),
                port: "22".into(),
                secret: "hidden".into(),
                use_count: 3,
                last_used_at: Some("2023-07-01T12:00:00".into()),
            },
            Record {
                alias: "web".into(),
                hostname: "web.example.com".into(),
                user: "deploy".into(),
                ..Default::default()
            },
        ]
    }

    #[test]
    fn empty_table() {
        assert_eq!(render_table(&[]), "No cached hosts\n");
    }

    #[test]
    fn columns_are_aligned_by_display_width() {
        let table = render_table(&records());
        let lines: Vec<_> = table.lines().collect();

        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("#  Host    HostName"));
        assert!(lines[1].starts_with("0  数据库  10.0.0.1"));
        assert!(lines[2].starts_with("1  web     web.example.com  deploy  22"));
        assert!(!table.contains("hidden"));
    }

    #[test]
    fn json_leaves_out_passwords() {
        let json = render_json(&records()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value[0]["alias"], "数据库");
        assert_eq!(value[0]["use_count"], 3);
        assert!(value[0].get("secret").is_none());
        assert!(value[1]["last_used_at"].is_null());
    }
}
