//! `svn info` / `svn log` textual rendering (§4.9).

use chrono::DateTime;

use crate::model::RevisionInfo;

/// Normalizes a `YYYY-MM-DDTHH:MM:SS.<frac>Z` server date to
/// `YYYY-MM-DD HH:MM:SS`. Anything not matching that shape is
/// rejected rather than silently truncated (§9's `sanitize_svn_date`
/// caveat) — `DateTime::parse_from_rfc3339` already rejects malformed
/// input for us instead of slicing blind.
pub fn sanitize_svn_date(raw: &str) -> Option<String> {
    let parsed = DateTime::parse_from_rfc3339(raw).ok()?;
    Some(parsed.format("%Y-%m-%d %H:%M:%S").to_string())
}

/// Renders the `svn info` block. When `info.date`/`info.author` are
/// absent (a revision with no commit on record), only the `Revision:`
/// line is printed.
pub fn render_info(info: &RevisionInfo) -> String {
    let mut out = format!("Revision: {}\n", info.revision);
    if let Some(author) = &info.author {
        out.push_str(&format!("Last Changed Author: {author}\n"));
    }
    if let Some(date) = &info.date {
        let date = sanitize_svn_date(date).unwrap_or_else(|| date.clone());
        out.push_str(&format!("Last Changed Date: {date}\n"));
    }
    out
}

/// Renders one `svn log` entry. A revision with no commit on record
/// prints only the separator line.
pub fn render_log_entry(info: &RevisionInfo) -> String {
    let separator = "-".repeat(72);
    if info.author.is_none() && info.date.is_none() && info.log.is_none() {
        return format!("{separator}\n");
    }
    let author = info.author.as_deref().unwrap_or("(no author)");
    let date = info
        .date
        .as_deref()
        .and_then(sanitize_svn_date)
        .unwrap_or_else(|| "(no date)".to_string());
    let mut out = format!("{separator}\nr{} | {author} | {date}\n", info.revision);
    if let Some(log) = &info.log {
        out.push('\n');
        out.push_str(log);
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitizes_well_formed_date() {
        assert_eq!(
            sanitize_svn_date("2020-11-10T09:23:51.711212Z"),
            Some("2020-11-10 09:23:51".to_string())
        );
    }

    #[test]
    fn rejects_malformed_date() {
        assert_eq!(sanitize_svn_date("not a date"), None);
        assert_eq!(sanitize_svn_date("2020-13-45T99:99:99.123Z"), None);
    }

    #[test]
    fn accepts_rfc3339_without_fractional_seconds() {
        assert_eq!(
            sanitize_svn_date("2020-11-10T09:23:51Z"),
            Some("2020-11-10 09:23:51".to_string())
        );
    }

    #[test]
    fn info_without_commit_omits_last_changed_lines() {
        let info = RevisionInfo {
            revision: 5,
            url: "svn://example.org/repo".into(),
            ..Default::default()
        };
        let rendered = render_info(&info);
        assert_eq!(rendered, "Revision: 5\n");
    }

    #[test]
    fn log_without_commit_prints_only_separator() {
        let info = RevisionInfo {
            revision: 5,
            url: "svn://example.org/repo".into(),
            ..Default::default()
        };
        let rendered = render_log_entry(&info);
        assert_eq!(rendered, format!("{}\n", "-".repeat(72)));
    }
}
