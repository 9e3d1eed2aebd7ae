//! `warden mask` and `warden mask-metadata`: filter query results
//!
//! Input files are JSON arrays that name streams as declared in the
//! fixture world; output uses the same shape.

use anyhow::{anyhow, Context, Result};
use clap::Args;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use warden_core::{MetadataGroup, Principal, StreamId, Timestamp, TimeseriesRecord};

use super::Session;

/// Arguments for `warden mask`.
#[derive(Args, Debug)]
pub struct MaskArgs {
    /// Requesting principal
    #[arg(long)]
    pub principal: Principal,

    /// JSON array of `{ "stream", "time", "value" }` records
    #[arg(long)]
    pub records: PathBuf,
}

/// Arguments for `warden mask-metadata`.
#[derive(Args, Debug)]
pub struct MaskMetadataArgs {
    /// Requesting principal
    #[arg(long)]
    pub principal: Principal,

    /// JSON array of `{ "stream", "tags" }` groups
    #[arg(long)]
    pub groups: PathBuf,
}

#[derive(Debug, Serialize, Deserialize)]
struct RecordFile {
    stream: String,
    time: Timestamp,
    value: f64,
}

#[derive(Debug, Serialize, Deserialize)]
struct GroupFile {
    stream: String,
    #[serde(default)]
    tags: BTreeMap<String, String>,
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
}

fn stream_id(session: &Session, name: &str) -> Result<StreamId> {
    session
        .world
        .stream_id(name)
        .ok_or_else(|| anyhow!("Stream '{name}' is not declared in the fixture"))
}

fn stream_name(session: &Session, id: StreamId) -> String {
    session
        .world
        .stream_name(id)
        .map_or_else(|| id.to_string(), str::to_string)
}

/// Mask time-series records and print the survivors as JSON.
pub async fn run_timeseries(session: &Session, args: MaskArgs) -> Result<()> {
    let input: Vec<RecordFile> = read_json(&args.records)?;
    let total = input.len();
    let records = input
        .into_iter()
        .map(|r| Ok(TimeseriesRecord::new(stream_id(session, &r.stream)?, r.time, r.value)))
        .collect::<Result<Vec<_>>>()?;

    let kept = session.engine.mask_timeseries(&args.principal, records).await?;
    tracing::info!(principal = %args.principal, total, kept = kept.len(), "Masked records");

    let output: Vec<RecordFile> = kept
        .into_iter()
        .map(|r| RecordFile {
            stream: stream_name(session, r.stream),
            time: r.time,
            value: r.value,
        })
        .collect();
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

/// Mask metadata groups and print the visible ones as JSON.
pub async fn run_metadata(session: &Session, args: MaskMetadataArgs) -> Result<()> {
    let input: Vec<GroupFile> = read_json(&args.groups)?;
    let total = input.len();
    let groups = input
        .into_iter()
        .map(|g| {
            Ok(MetadataGroup {
                stream: stream_id(session, &g.stream)?,
                tags: g.tags,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let kept = session
        .engine
        .mask_metadata_groups(&args.principal, groups)
        .await?;
    tracing::info!(principal = %args.principal, total, kept = kept.len(), "Masked metadata groups");

    let output: Vec<GroupFile> = kept
        .into_iter()
        .map(|g| GroupFile {
            stream: stream_name(session, g.stream),
            tags: g.tags,
        })
        .collect();
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
