// download.rs — Model file cache with SHA256 digests.
//
// A directory that already holds every model file is used as-is (shared caches
// work without network access). Otherwise the files are fetched from the model
// hub and written atomically, and their digests are recorded in a manifest that
// is verified on every later reuse of the cache.

use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use sha2::{Digest, Sha256};

use crate::config;

/// (file name, pinned SHA256 if any)
const MODEL_FILES: [(&str, Option<&str>); 3] = [
    (config::local::CONFIG_FILE, config::local::CONFIG_JSON_SHA256),
    (config::local::TOKENIZER_FILE, config::local::TOKENIZER_JSON_SHA256),
    (config::local::MODEL_FILE, config::local::MODEL_SAFETENSORS_SHA256),
];

/// Check if all required model files exist in `dir`.
pub fn model_files_exist(dir: &Path) -> bool {
    MODEL_FILES.iter().all(|(name, _)| dir.join(name).exists())
}

/// Download all model files into `dir` if not already cached. Returns `dir`.
pub fn ensure_model_files(dir: &Path) -> anyhow::Result<PathBuf> {
    if model_files_exist(dir) {
        log::info!("Model files already cached at {}", dir.display());
        if verify_manifest(dir)? {
            log::info!("Cached model files match {}", config::local::MANIFEST_FILE);
        } else {
            log::warn!(
                "No {} in {}; cached model files are not verified",
                config::local::MANIFEST_FILE,
                dir.display()
            );
        }
        return Ok(dir.to_path_buf());
    }

    log::info!("Downloading {} to {}", config::local::MODEL_NAME, dir.display());
    fs::create_dir_all(dir).with_context(|| format!("failed to create model dir {}", dir.display()))?;

    let base = config::local::MODEL_HUB_BASE;
    for (name, expected) in MODEL_FILES {
        let dest = dir.join(name);
        if dest.exists() {
            continue;
        }
        download_and_verify(&format!("{base}/{name}"), &dest, expected)?;
    }

    write_manifest(dir)?;
    log::info!("Model download complete");
    Ok(dir.to_path_buf())
}

/// Hex SHA256 of a file on disk, streamed.
fn file_sha256(path: &Path) -> anyhow::Result<String> {
    let mut file = fs::File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let mut hasher = Sha256::new();
    std::io::copy(&mut file, &mut hasher).with_context(|| format!("failed to hash {}", path.display()))?;
    Ok(hex::encode(hasher.finalize()))
}

/// Record `<sha256>  <name>` for every model file in `dir`.
fn write_manifest(dir: &Path) -> anyhow::Result<()> {
    let mut manifest = String::new();
    for (name, _) in MODEL_FILES {
        let digest = file_sha256(&dir.join(name))?;
        manifest.push_str(&format!("{digest}  {name}\n"));
    }

    let dest = dir.join(config::local::MANIFEST_FILE);
    let tmp_path = dest.with_extension("tmp");
    fs::write(&tmp_path, manifest).with_context(|| format!("failed to write {}", tmp_path.display()))?;
    fs::rename(&tmp_path, &dest)
        .with_context(|| format!("failed to rename {} -> {}", tmp_path.display(), dest.display()))?;
    Ok(())
}

/// Check every file listed in the manifest. Returns false when there is no manifest.
fn verify_manifest(dir: &Path) -> anyhow::Result<bool> {
    let path = dir.join(config::local::MANIFEST_FILE);
    if !path.exists() {
        return Ok(false);
    }
    let manifest = fs::read_to_string(&path).with_context(|| format!("failed to read {}", path.display()))?;

    for line in manifest.lines().filter(|l| !l.trim().is_empty()) {
        let Some((expected, name)) = line.split_once("  ") else {
            bail!("malformed line in {}: {line:?}", path.display());
        };
        let body_digest = file_sha256(&dir.join(name))?;
        if !body_digest.eq_ignore_ascii_case(expected) {
            bail!("SHA256 mismatch for cached {name}: expected {expected}, got {body_digest}");
        }
    }
    Ok(true)
}

/// Download a file from URL, check its SHA256 when pinned, and write it atomically.
fn download_and_verify(url: &str, dest: &Path, expected_sha256: Option<&str>) -> anyhow::Result<()> {
    let filename = dest.file_name().unwrap_or_default().to_string_lossy().to_string();
    log::info!("Downloading {} from {}", filename, url);

    let resp = ureq::get(url)
        .timeout(std::time::Duration::from_secs(config::local::DOWNLOAD_TIMEOUT_SECS))
        .call()
        .with_context(|| format!("failed to download {url}"))?;

    let status = resp.status();
    if status != 200 {
        bail!("HTTP {status} downloading {url}");
    }

    let mut body = Vec::new();
    resp.into_reader()
        .read_to_end(&mut body)
        .with_context(|| format!("failed to read response body for {url}"))?;

    let actual_hash = verify_digest(&filename, &body, expected_sha256)?;
    log::info!("SHA256 for {}: {}", filename, actual_hash);

    // Write atomically: write to .tmp, then rename
    let tmp_path = dest.with_extension("tmp");
    let mut file = fs::File::create(&tmp_path).with_context(|| format!("failed to create {}", tmp_path.display()))?;
    file.write_all(&body)?;
    file.flush()?;
    drop(file);

    fs::rename(&tmp_path, dest)
        .with_context(|| format!("failed to rename {} -> {}", tmp_path.display(), dest.display()))?;

    Ok(())
}

/// Hex SHA256 of `body`; fails when a pinned digest does not match.
fn verify_digest(filename: &str, body: &[u8], expected_sha256: Option<&str>) -> anyhow::Result<String> {
    let actual_hash = hex::encode(Sha256::digest(body));
    if let Some(expected) = expected_sha256 {
        if !actual_hash.eq_ignore_ascii_case(expected) {
            bail!("SHA256 mismatch for {filename}: expected {expected}, got {actual_hash}");
        }
    }
    Ok(actual_hash)
}
