// vocab.rs — Vocabulary loading.
//
// One entry per input line, in file order. Only the line terminator is removed:
// no trimming, no case folding, no dedup. Empty lines stay as empty entries.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use anyhow::Context;

/// Read a newline-delimited word list.
pub fn load_vocabulary(path: &Path) -> anyhow::Result<Vec<String>> {
    let file = File::open(path).with_context(|| format!("failed to open vocabulary {}", path.display()))?;
    read_vocabulary(BufReader::new(file)).with_context(|| format!("failed to read vocabulary {}", path.display()))
}

/// `lines()` strips both `\n` and `\r\n`, and keeps a final unterminated line.
fn read_vocabulary<R: BufRead>(reader: R) -> anyhow::Result<Vec<String>> {
    let mut vocab = Vec::new();
    for (i, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("line {}", i + 1))?;
        vocab.push(line);
    }
    Ok(vocab)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn read(s: &str) -> Vec<String> {
        read_vocabulary(Cursor::new(s.as_bytes())).unwrap()
    }

    #[test]
    fn test_preserves_order_and_duplicates() {
        assert_eq!(read("cat\ndog\ncat\n"), vec!["cat", "dog", "cat"]);
    }

    #[test]
    fn test_only_terminator_removed() {
        assert_eq!(read("  New York \nDog\n"), vec!["  New York ", "Dog"]);
        assert_eq!(read("cat\r\ndog\r\n"), vec!["cat", "dog"]);
    }

    #[test]
    fn test_empty_lines_kept() {
        assert_eq!(read("a\n\nb\n"), vec!["a", "", "b"]);
    }

    #[test]
    fn test_unterminated_last_line() {
        assert_eq!(read("a\nb"), vec!["a", "b"]);
        assert!(read("").is_empty());
    }

    #[test]
    fn test_missing_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_vocabulary(&dir.path().join("nope.txt")).unwrap_err();
        assert!(format!("{err:#}").contains("nope.txt"));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vocab.txt");
        std::fs::write(&path, "apple\nbanana\n").unwrap();
        assert_eq!(load_vocabulary(&path).unwrap(), vec!["apple", "banana"]);
    }

    #[test]
    fn test_invalid_utf8_is_error() {
        assert!(read_vocabulary(Cursor::new(vec![b'a', b'\n', 0xff, 0xfe, b'\n'])).is_err());
    }
}
