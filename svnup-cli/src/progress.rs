//! Checkout progress bar, including the original's "elide the front
//! of an overlong path" rule (§12).

use indicatif::{ProgressBar, ProgressStyle};

/// Builds the per-file progress bar used during `checkout`.
pub fn make_progress_bar(len: u64) -> ProgressBar {
    let progress = ProgressBar::new(len);
    progress.set_style(
        ProgressStyle::with_template("{spinner:.green} [{elapsed_precise}] [{bar:30.cyan/blue}] {pos}/{len} {msg}")
            .unwrap()
            .progress_chars("=>-"),
    );
    progress
}

/// Terminal width from `COLUMNS`/`TIOCGWINSZ`, or `None` on a non-tty
/// (§6), in which case the caller must not clip at all.
pub fn terminal_width() -> Option<usize> {
    if let Ok(columns) = std::env::var("COLUMNS") {
        if let Ok(width) = columns.parse() {
            return Some(width);
        }
    }
    terminal_size::terminal_size().map(|(terminal_size::Width(w), _)| w as usize)
}

/// Elides the *front* of `path` with `...` so the tail (closest to
/// the filename) stays visible, keeping the rendered string at most
/// `width` characters. Unlike a typical tail-truncation, this mirrors
/// the original's behavior since the filename is usually the most
/// useful part of a long path.
pub fn elide_front(path: &str, width: usize) -> String {
    if path.chars().count() <= width || width <= 3 {
        return path.to_string();
    }
    let keep = width - 3;
    let tail: String = path
        .chars()
        .rev()
        .take(keep)
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    format!("...{tail}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_paths_pass_through_unchanged() {
        assert_eq!(elide_front("src/main.c", 80), "src/main.c");
    }

    #[test]
    fn long_paths_keep_the_tail() {
        let path = "a/very/deeply/nested/directory/tree/main.c";
        let elided = elide_front(path, 20);
        assert!(elided.ends_with("main.c"));
        assert!(elided.starts_with("..."));
        assert_eq!(elided.chars().count(), 20);
    }
}
