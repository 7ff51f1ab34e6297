// IMPORTANT:
// Keep ALL numeric values and defaults centralized here (no hardcoded values scattered around).

use std::path::PathBuf;

use anyhow::Context;

// NOTE: APP_VERSION must stay in sync with the `version` field in Cargo.toml.
pub const APP_VERSION: &str = "0.1.0";

pub mod logging {
    pub const LOG_DIR_REL: &str = ".vocab-embed/logs";
    pub const LOG_FILE_NAME: &str = "vocab_embed.log";

    pub const LOG_ROTATE_SIZE_BYTES: u64 = 10 * 1024 * 1024;
    pub const LOG_ROTATE_KEEP_FILES: usize = 5;

    // Local pipeline prints a progress line every N words.
    pub const PROGRESS_EVERY_WORDS: usize = 100;
}

pub mod paths {
    pub const DEFAULT_VOCAB_PATH: &str = "./barlow/valid_vocab.txt";
    pub const DEFAULT_REMOTE_OUTPUT_PATH: &str = "./barlow/gpt_ada.txt";
    pub const DEFAULT_LOCAL_OUTPUT_PATH: &str = "./barlow/bert_base.txt";

    pub const ENV_VOCAB_PATH: &str = "VOCAB_EMBED_VOCAB";
    pub const ENV_OUTPUT_PATH: &str = "VOCAB_EMBED_OUTPUT";
}

pub mod remote {
    pub const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";
    pub const DEFAULT_ENGINE: &str = "text-similarity-babbage-001";

    pub const REQUEST_TIMEOUT_SECS: u64 = 60;

    pub const ENV_API_KEY: &str = "OPENAI_API_KEY";
    pub const ENV_API_BASE: &str = "VOCAB_EMBED_API_BASE";
    pub const ENV_ENGINE: &str = "VOCAB_EMBED_ENGINE";
}

pub mod pacing {
    // Blind backoff: pause after every N-th request regardless of provider responses.
    pub const REQUESTS_PER_PAUSE: u64 = 30;
    pub const PAUSE_SECS: u64 = 120;
}

pub mod local {
    pub const MODEL_NAME: &str = "bert-base-uncased";

    // Model download URL base (lazy download on first use when the cache is empty).
    pub const MODEL_HUB_BASE: &str = "https://huggingface.co/google-bert/bert-base-uncased/resolve/main";

    pub const MODEL_FILE: &str = "model.safetensors";
    pub const TOKENIZER_FILE: &str = "tokenizer.json";
    pub const CONFIG_FILE: &str = "config.json";

    // `sha256sum`-format digests of the files above, written after download and
    // checked every time the cache is reused.
    pub const MANIFEST_FILE: &str = "sha256sums.txt";

    // Pinned SHA256 digests; `None` means "log the digest, do not enforce".
    pub const MODEL_SAFETENSORS_SHA256: Option<&str> = None;
    pub const TOKENIZER_JSON_SHA256: Option<&str> = None;
    pub const CONFIG_JSON_SHA256: Option<&str> = None;

    pub const DOWNLOAD_TIMEOUT_SECS: u64 = 600;

    // Local model storage directory (relative to home)
    pub const MODEL_DIR_REL: &str = ".vocab-embed/models/bert-base-uncased";

    pub const ENV_MODEL_DIR: &str = "VOCAB_EMBED_MODEL_DIR";
}

/// Which pipeline to run. Selected by the single positional argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Hosted API, all vectors collected then written.
    Remote,
    /// Hosted API, each vector written as soon as it arrives.
    RemoteStream,
    /// Local transformer, all vectors collected then written.
    Local,
}

impl Mode {
    pub const USAGE: &'static str = "usage: vocab_embed <remote|remote-stream|local>";

    pub fn parse(arg: &str) -> Option<Self> {
        match arg {
            "remote" => Some(Self::Remote),
            "remote-stream" => Some(Self::RemoteStream),
            "local" => Some(Self::Local),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Remote => "remote",
            Self::RemoteStream => "remote-stream",
            Self::Local => "local",
        }
    }

    fn default_output(self) -> &'static str {
        match self {
            Self::Remote | Self::RemoteStream => paths::DEFAULT_REMOTE_OUTPUT_PATH,
            Self::Local => paths::DEFAULT_LOCAL_OUTPUT_PATH,
        }
    }
}

/// Settings for the hosted embedding API.
#[derive(Debug, Clone)]
pub struct RemoteConfig {
    pub api_base: String,
    pub engine: String,
    /// Bearer credential. Absent means the first request fails with an auth error.
    pub api_key: Option<String>,
    pub timeout: std::time::Duration,
}

impl RemoteConfig {
    fn from_lookup(lookup: &dyn Fn(&str) -> Option<String>) -> Self {
        Self {
            api_base: lookup(remote::ENV_API_BASE).unwrap_or_else(|| remote::DEFAULT_API_BASE.to_string()),
            engine: lookup(remote::ENV_ENGINE).unwrap_or_else(|| remote::DEFAULT_ENGINE.to_string()),
            api_key: lookup(remote::ENV_API_KEY),
            timeout: std::time::Duration::from_secs(remote::REQUEST_TIMEOUT_SECS),
        }
    }
}

/// Everything a run needs, resolved once at startup.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub mode: Mode,
    pub vocab_path: PathBuf,
    pub output_path: PathBuf,
    pub remote: RemoteConfig,
    /// Explicit model directory override; otherwise the per-user cache is used.
    pub model_dir: Option<PathBuf>,
}

impl RunConfig {
    pub fn from_env(mode: Mode) -> Self {
        Self::from_lookup(mode, &env_var)
    }

    fn from_lookup(mode: Mode, lookup: &dyn Fn(&str) -> Option<String>) -> Self {
        Self {
            mode,
            vocab_path: PathBuf::from(
                lookup(paths::ENV_VOCAB_PATH).unwrap_or_else(|| paths::DEFAULT_VOCAB_PATH.to_string()),
            ),
            output_path: PathBuf::from(
                lookup(paths::ENV_OUTPUT_PATH).unwrap_or_else(|| mode.default_output().to_string()),
            ),
            remote: RemoteConfig::from_lookup(lookup),
            model_dir: lookup(local::ENV_MODEL_DIR).map(PathBuf::from),
        }
    }

    /// Resolve the model directory: explicit override, else ~/.vocab-embed/models/<name>.
    pub fn resolve_model_dir(&self) -> anyhow::Result<PathBuf> {
        match &self.model_dir {
            Some(dir) => Ok(dir.clone()),
            None => Ok(home_dir()
                .context("cannot determine home directory for model cache")?
                .join(local::MODEL_DIR_REL)),
        }
    }
}

/// Non-empty environment variable, or None.
fn env_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

pub fn home_dir() -> Option<PathBuf> {
    if let Some(v) = env_var("HOME") {
        return Some(PathBuf::from(v));
    }
    // Windows fallback
    env_var("USERPROFILE").map(PathBuf::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn test_mode_parse() {
        assert_eq!(Mode::parse("remote"), Some(Mode::Remote));
        assert_eq!(Mode::parse("remote-stream"), Some(Mode::RemoteStream));
        assert_eq!(Mode::parse("local"), Some(Mode::Local));
        assert_eq!(Mode::parse("Remote"), None);
        assert_eq!(Mode::parse(""), None);
    }

    #[test]
    fn test_defaults_without_env() {
        let cfg = RunConfig::from_lookup(Mode::Remote, &lookup_from(&[]));
        assert_eq!(cfg.mode, Mode::Remote);
        assert_eq!(cfg.vocab_path, PathBuf::from(paths::DEFAULT_VOCAB_PATH));
        assert_eq!(cfg.output_path, PathBuf::from(paths::DEFAULT_REMOTE_OUTPUT_PATH));
        assert_eq!(cfg.remote.engine, remote::DEFAULT_ENGINE);
        assert_eq!(cfg.remote.api_base, remote::DEFAULT_API_BASE);
        assert!(cfg.remote.api_key.is_none());
        assert!(cfg.model_dir.is_none());

        let local = RunConfig::from_lookup(Mode::Local, &lookup_from(&[]));
        assert_eq!(local.mode, Mode::Local);
        assert_eq!(local.output_path, PathBuf::from(paths::DEFAULT_LOCAL_OUTPUT_PATH));
    }

    #[test]
    fn test_env_overrides() {
        let cfg = RunConfig::from_lookup(
            Mode::Local,
            &lookup_from(&[
                ("VOCAB_EMBED_VOCAB", "words.txt"),
                ("VOCAB_EMBED_OUTPUT", "out.txt"),
                ("OPENAI_API_KEY", "sk-test"),
                ("VOCAB_EMBED_ENGINE", "text-embedding-3-small"),
                ("VOCAB_EMBED_API_BASE", "http://127.0.0.1:9999/v1"),
                ("VOCAB_EMBED_MODEL_DIR", "/tmp/models/bert"),
            ]),
        );
        assert_eq!(cfg.vocab_path, PathBuf::from("words.txt"));
        assert_eq!(cfg.output_path, PathBuf::from("out.txt"));
        assert_eq!(cfg.remote.api_key.as_deref(), Some("sk-test"));
        assert_eq!(cfg.remote.engine, "text-embedding-3-small");
        assert_eq!(cfg.remote.api_base, "http://127.0.0.1:9999/v1");
        assert_eq!(cfg.resolve_model_dir().unwrap(), PathBuf::from("/tmp/models/bert"));
    }
}
