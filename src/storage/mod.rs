//! Persistence of the run result tree.
//!
//! The tree is written as pretty-printed JSON. Writes go through a staging
//! file and a rename so an interrupted run never leaves a truncated file.

use std::path::Path;

use crate::error::Result;
use crate::models::RunResult;
use crate::utils::fs::{ensure_dir, write_atomic};

/// Serialize `result` to `path`, creating parent directories as needed.
pub async fn save_run_result(path: &Path, result: &RunResult) -> Result<()> {
    if let Some(parent) = path.parent() {
        ensure_dir(parent).await?;
    }
    let json = serde_json::to_vec_pretty(result)?;
    write_atomic(path, &json).await?;
    log::info!("Saved run result to {}", path.display());
    Ok(())
}

/// Read a result tree written by [`save_run_result`].
pub async fn load_run_result(path: &Path) -> Result<RunResult> {
    let bytes = tokio::fs::read(path).await?;
    Ok(serde_json::from_slice(&bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ImageResult, KeywordResult, PageResult, Status};
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn sample() -> RunResult {
        let page = PageResult::completed(
            0,
            vec![
                ImageResult::success("https://a.test/1.jpg", PathBuf::from("out/cats/1.jpg")),
                ImageResult::fail("https://a.test/2.jpg", "[status] image response is not ok. status: 404 Not Found"),
            ],
        );
        RunResult::completed(vec![
            KeywordResult::completed("cats", vec![page, PageResult::failed(1, "Page response is not ok.", 30)]),
            KeywordResult::empty("qwzxv"),
        ])
    }

    #[tokio::test]
    async fn test_save_then_load_reproduces_tree() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("nested").join("result.json");
        let result = sample();

        save_run_result(&path, &result).await.unwrap();
        let loaded = load_run_result(&path).await.unwrap();

        assert_eq!(loaded, result);
        assert_eq!(loaded.total_errors(), 31);
        assert_eq!(loaded.keywords[0].pages[1].status, Status::Fail);
    }

    #[tokio::test]
    async fn test_output_is_pretty_printed() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("result.json");
        save_run_result(&path, &sample()).await.unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("\n  \"status\": \"success\""));
        // No staging file is left behind.
        assert_eq!(std::fs::read_dir(tmp.path()).unwrap().count(), 1);
    }

    #[tokio::test]
    async fn test_load_missing_file_fails() {
        let tmp = TempDir::new().unwrap();
        assert!(load_run_result(&tmp.path().join("absent.json")).await.is_err());
    }
}
