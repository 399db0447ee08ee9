//! Download a pretrained model snapshot over HTTP.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

/// Default hub to resolve model repositories against.
pub const DEFAULT_HUB_URL: &str = "https://huggingface.co";

/// Files that make up a reloadable seq2seq snapshot.
pub const SNAPSHOT_FILES: &[&str] = &["config.json", "tokenizer.json", "model.safetensors"];

/// Resolved download URL for one snapshot file.
pub fn snapshot_url(base_url: &str, repo: &str, file: &str) -> String {
    format!("{base_url}/{repo}/resolve/main/{file}")
}

/// Download the snapshot files for `repo` into `dest`, skipping files
/// that are already present.
pub async fn fetch_pretrained(base_url: &str, repo: &str, dest: &Path) -> Result<()> {
    std::fs::create_dir_all(dest)
        .with_context(|| format!("failed to create {}", dest.display()))?;
    let client = reqwest::Client::new();

    for file in SNAPSHOT_FILES {
        let target = dest.join(file);
        if target.exists() {
            info!("{} already present, skipping", target.display());
            continue;
        }

        let url = snapshot_url(base_url, repo, file);
        info!("downloading {url}");
        let response = client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("request failed for {url}"))?
            .error_for_status()
            .with_context(|| format!("bad status for {url}"))?;
        let bytes = response
            .bytes()
            .await
            .with_context(|| format!("failed to read body of {url}"))?;
        std::fs::write(&target, &bytes)
            .with_context(|| format!("failed to write {}", target.display()))?;
        info!("saved {} ({} bytes)", target.display(), bytes.len());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_urls_follow_hub_layout() {
        let url = snapshot_url(DEFAULT_HUB_URL, "google/flan-t5-base", "config.json");
        assert_eq!(
            url,
            "https://huggingface.co/google/flan-t5-base/resolve/main/config.json"
        );
    }

    #[test]
    fn snapshot_covers_model_and_tokenizer() {
        assert!(SNAPSHOT_FILES.contains(&"model.safetensors"));
        assert!(SNAPSHOT_FILES.contains(&"tokenizer.json"));
        assert!(SNAPSHOT_FILES.contains(&"config.json"));
    }
}
