//! Endpoint list loading
//!
//! The endpoint list is read once, before dispatch begins, from a file or
//! from standard input. Lines are trimmed and blank lines are skipped; no
//! other validation happens here, normalization is the prober's job.

use anyhow::{Context, Result};
use std::path::Path;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader};

/// Read the endpoint list from a file or standard input
///
/// # Errors
///
/// Returns an error when the file cannot be opened or a read fails.
pub async fn read_endpoints(path: Option<&Path>) -> Result<Vec<String>> {
    match path {
        Some(path) => {
            let file = File::open(path)
                .await
                .with_context(|| format!("Failed to open endpoint list: {}", path.display()))?;
            collect_lines(BufReader::new(file)).await
        }
        None => collect_lines(BufReader::new(tokio::io::stdin())).await,
    }
}

async fn collect_lines<R>(reader: BufReader<R>) -> Result<Vec<String>>
where
    R: tokio::io::AsyncRead + Unpin,
{
    let mut endpoints = Vec::new();
    let mut lines = reader.lines();

    while let Some(line) = lines.next_line().await.context("Failed to read input")? {
        let endpoint = line.trim();
        if !endpoint.is_empty() {
            endpoints.push(endpoint.to_string());
        }
    }

    Ok(endpoints)
}
