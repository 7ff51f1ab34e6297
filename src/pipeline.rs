// pipeline.rs — load vocabulary → embed each word in order → write vectors.
//
// Batch keeps every vector in memory and writes at the end (a failure writes
// nothing). Streaming truncates the output first and writes one line per
// vector as it arrives (a failure at word N leaves N finished lines).

use std::path::Path;

use anyhow::{bail, Context};

use crate::config;
use crate::embeddings::EmbeddingSource;
use crate::vocab::load_vocabulary;
use crate::writer::{write_vectors, VectorWriter};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteStrategy {
    Batch,
    Streaming,
}

/// Run one full pipeline. Returns the number of lines written.
pub fn run<S: EmbeddingSource>(
    source: &mut S,
    vocab_path: &Path,
    output_path: &Path,
    strategy: WriteStrategy,
) -> anyhow::Result<usize> {
    log::info!("building vocab...");
    let vocab = load_vocabulary(vocab_path)?;
    log::info!("loaded {} words from {}", vocab.len(), vocab_path.display());

    log::info!("getting embeds from {}", source.name());
    let written = match strategy {
        WriteStrategy::Batch => {
            let embeds = collect_embeddings(source, &vocab)?;
            log::info!("saving");
            write_vectors(output_path, &embeds)?
        }
        WriteStrategy::Streaming => stream_embeddings(source, &vocab, output_path)?,
    };

    log::info!("done: {} vectors written to {}", written, output_path.display());
    Ok(written)
}

/// Embed every word in order; the result is index-aligned with `vocab`.
pub fn collect_embeddings<S: EmbeddingSource>(
    source: &mut S,
    vocab: &[String],
) -> anyhow::Result<Vec<Vec<S::Component>>> {
    let mut progress = Progress::new(vocab.len());
    let mut dims = DimensionCheck::default();
    let mut embeds = Vec::with_capacity(vocab.len());

    for (i, word) in vocab.iter().enumerate() {
        let vector = embed_word(source, i, word)?;
        dims.check(i, word, vector.len())?;
        embeds.push(vector);
        progress.tick();
    }
    Ok(embeds)
}

/// Embed and write one line at a time, flushing after each line.
pub fn stream_embeddings<S: EmbeddingSource>(
    source: &mut S,
    vocab: &[String],
    output_path: &Path,
) -> anyhow::Result<usize> {
    let mut writer = VectorWriter::create(output_path)?;
    let mut progress = Progress::new(vocab.len());
    let mut dims = DimensionCheck::default();

    for (i, word) in vocab.iter().enumerate() {
        let vector = embed_word(source, i, word)?;
        dims.check(i, word, vector.len())?;
        writer.write_vector(&vector)?;
        writer.flush()?;
        progress.tick();
    }
    writer.finish()
}

fn embed_word<S: EmbeddingSource>(source: &mut S, index: usize, word: &str) -> anyhow::Result<Vec<S::Component>> {
    source
        .embed(word)
        .with_context(|| format!("vocabulary entry {} ({word:?})", index + 1))
}

/// Every vector of a run must have the length of the first one.
#[derive(Default)]
struct DimensionCheck {
    expected: Option<usize>,
}

impl DimensionCheck {
    fn check(&mut self, index: usize, word: &str, len: usize) -> anyhow::Result<()> {
        match self.expected {
            None => {
                log::info!("embedding dims: {len}");
                self.expected = Some(len);
            }
            Some(expected) if expected != len => {
                bail!(
                    "vocabulary entry {} ({word:?}) has {len} dims, expected {expected}",
                    index + 1
                );
            }
            Some(_) => {}
        }
        Ok(())
    }
}

struct Progress {
    total: usize,
    done: usize,
}

impl Progress {
    fn new(total: usize) -> Self {
        Self { total, done: 0 }
    }

    fn tick(&mut self) {
        self.done += 1;
        if self.done % config::logging::PROGRESS_EVERY_WORDS == 0 || self.done == self.total {
            log::info!("embedded {}/{} words", self.done, self.total);
        }
    }
}
