//! GitHub Actions step outputs (`$GITHUB_OUTPUT`).

use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

/// Append `name=value` pairs to the outputs file. Values containing a
/// newline use the heredoc form with a delimiter that does not occur in
/// the value.
pub fn write_outputs(path: &Path, outputs: &[(&str, &str)]) -> std::io::Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    for (name, value) in outputs {
        file.write_all(format_output(name, value).as_bytes())?;
    }
    Ok(())
}

fn format_output(name: &str, value: &str) -> String {
    if !value.contains('\n') {
        return format!("{name}={value}\n");
    }

    let mut delimiter = String::from("REDLIGHT_EOF");
    let mut n = 0;
    while value.lines().any(|l| l == delimiter) {
        n += 1;
        delimiter = format!("REDLIGHT_EOF_{n}");
    }
    format!("{name}<<{delimiter}\n{value}\n{delimiter}\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_line_uses_plain_form() {
        assert_eq!(format_output("excerpt-strategy", "tail"), "excerpt-strategy=tail\n");
    }

    #[test]
    fn multi_line_uses_heredoc() {
        assert_eq!(
            format_output("summary", "line one\nline two"),
            "summary<<REDLIGHT_EOF\nline one\nline two\nREDLIGHT_EOF\n"
        );
    }

    #[test]
    fn delimiter_avoids_value_lines() {
        let out = format_output("summary", "a\nREDLIGHT_EOF\nb");
        assert!(out.starts_with("summary<<REDLIGHT_EOF_1\n"));
        assert!(out.ends_with("\nREDLIGHT_EOF_1\n"));
    }

    #[test]
    fn appends_to_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("output");
        std::fs::write(&path, "previous=1\n").unwrap();

        write_outputs(
            &path,
            &[("notification-target", "C123"), ("summary", "x\ny")],
        )
        .unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            content,
            "previous=1\nnotification-target=C123\nsummary<<REDLIGHT_EOF\nx\ny\nREDLIGHT_EOF\n"
        );
    }
}
