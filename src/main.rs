mod config;
mod embeddings;
mod logging;
mod pipeline;
mod vocab;
mod writer;

use anyhow::bail;

use crate::config::{Mode, RunConfig};
use crate::embeddings::download::ensure_model_files;
use crate::embeddings::engine::LocalModelSource;
use crate::embeddings::remote::RemoteSource;
use crate::pipeline::WriteStrategy;

fn main() {
    if let Err(e) = real_main() {
        eprintln!("[vocab-embed] fatal error: {e:?}");
        log::error!("Fatal error: {:?}", e);
        std::process::exit(1);
    }
}

fn real_main() -> anyhow::Result<()> {
    logging::init_logging()?;

    let args: Vec<String> = std::env::args().collect();
    let mode = match args.get(1).and_then(|a| Mode::parse(a)) {
        Some(m) => m,
        None => bail!("{}", Mode::USAGE),
    };

    let cfg = RunConfig::from_env(mode);
    log::info!(
        "=== vocab-embed {} ({}): {} -> {} ===",
        config::APP_VERSION,
        cfg.mode.as_str(),
        cfg.vocab_path.display(),
        cfg.output_path.display()
    );

    match cfg.mode {
        Mode::Remote | Mode::RemoteStream => {
            let strategy = if cfg.mode == Mode::RemoteStream {
                WriteStrategy::Streaming
            } else {
                WriteStrategy::Batch
            };
            let mut source = RemoteSource::with_default_pacing(cfg.remote.clone());
            pipeline::run(&mut source, &cfg.vocab_path, &cfg.output_path, strategy)?;
        }
        Mode::Local => {
            let model_dir = ensure_model_files(&cfg.resolve_model_dir()?)?;
            let mut source = LocalModelSource::load(&model_dir)?;
            pipeline::run(&mut source, &cfg.vocab_path, &cfg.output_path, WriteStrategy::Batch)?;
        }
    }

    Ok(())
}
