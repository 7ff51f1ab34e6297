// writer.rs — Plain-text vector output.
//
// One line per vector: every component followed by a single space, then '\n'.
// No header and no word label; line i belongs to vocabulary entry i.

use std::fmt::Debug;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::Context;

pub struct VectorWriter<W: Write> {
    out: W,
    path: PathBuf,
    lines: usize,
}

impl VectorWriter<BufWriter<File>> {
    /// Create (or truncate) the output file.
    pub fn create(path: &Path) -> anyhow::Result<Self> {
        let file = File::create(path).with_context(|| format!("failed to create output {}", path.display()))?;
        Ok(Self::new(BufWriter::new(file), path.to_path_buf()))
    }
}

impl<W: Write> VectorWriter<W> {
    pub fn new(out: W, path: PathBuf) -> Self {
        Self { out, path, lines: 0 }
    }

    pub fn write_vector<C: Copy + Debug>(&mut self, vector: &[C]) -> anyhow::Result<()> {
        let mut line = String::with_capacity(vector.len() * 12);
        for component in vector {
            push_component(&mut line, *component);
        }
        line.push('\n');
        self.out
            .write_all(line.as_bytes())
            .with_context(|| format!("failed writing line {} to {}", self.lines + 1, self.path.display()))?;
        self.lines += 1;
        Ok(())
    }

    /// Push buffered lines to disk, so an aborted run still leaves every finished line.
    pub fn flush(&mut self) -> anyhow::Result<()> {
        self.out
            .flush()
            .with_context(|| format!("failed flushing {}", self.path.display()))
    }

    /// Flush and return the number of lines written.
    pub fn finish(mut self) -> anyhow::Result<usize> {
        self.flush()?;
        Ok(self.lines)
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }
}

/// Write a whole collection at once (truncating the target).
pub fn write_vectors<C: Copy + Debug>(path: &Path, vectors: &[Vec<C>]) -> anyhow::Result<usize> {
    let mut writer = VectorWriter::create(path)?;
    for v in vectors {
        writer.write_vector(v)?;
    }
    writer.finish()
}

/// Shortest round-trip decimal form for the component's own width: `1.0`, `0.25`, `-3.5e-7`.
fn push_component<C: Debug>(line: &mut String, value: C) {
    use std::fmt::Write as _;
    // Writing into a String cannot fail.
    let _ = write!(line, "{value:?} ");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render<C: Copy + Debug>(vectors: &[Vec<C>]) -> String {
        let mut w = VectorWriter::new(Vec::new(), PathBuf::from("mem"));
        for v in vectors {
            w.write_vector(v).unwrap();
        }
        String::from_utf8(w.into_inner()).unwrap()
    }

    #[test]
    fn test_cat_dog_format() {
        let out = render(&[vec![1.0, 2.0], vec![3.0, 4.0]]);
        assert_eq!(out, "1.0 2.0 \n3.0 4.0 \n");
    }

    #[test]
    fn test_component_formatting() {
        assert_eq!(render(&[vec![0.25, -1.5, 0.1]]), "0.25 -1.5 0.1 \n");
        assert_eq!(render::<f32>(&[vec![]]), "\n");
    }

    #[test]
    fn test_f64_components_are_not_narrowed() {
        assert_eq!(render(&[vec![0.1_f64, 1.0]]), "0.1 1.0 \n");
        assert_eq!(render(&[vec![0.012345678901234_f64]]), "0.012345678901234 \n");
    }

    #[test]
    fn test_components_parse_back_exactly() {
        let v = vec![0.123_456_79_f32, -7.0e-8, 12345.678];
        let out = render(&[v.clone()]);
        let parsed: Vec<f32> = out.split_whitespace().map(|s| s.parse().unwrap()).collect();
        assert_eq!(parsed, v);
    }

    #[test]
    fn test_write_vectors_truncates_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.txt");
        std::fs::write(&path, "stale\nstale\nstale\n").unwrap();

        let n = write_vectors(&path, &[vec![1.0, 2.0]]).unwrap();
        assert_eq!(n, 1);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "1.0 2.0 \n");
    }

    #[test]
    fn test_unwritable_path_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = write_vectors(&dir.path().join("missing").join("out.txt"), &[vec![1.0]]).unwrap_err();
        assert!(format!("{err:#}").contains("out.txt"));
    }
}
