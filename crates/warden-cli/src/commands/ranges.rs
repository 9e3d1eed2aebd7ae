//! `warden ranges`: show when a principal held access

use anyhow::Result;
use clap::Args;
use serde_json::json;
use warden_core::{Permission, Principal, ResourceUri};

use super::{describe_interval, rfc3339, Session};

/// Arguments for `warden ranges`.
#[derive(Args, Debug)]
pub struct RangesArgs {
    /// Concrete resource, e.g. campus/bldg1/temp
    #[arg(long)]
    pub resource: ResourceUri,

    /// Requesting principal
    #[arg(long)]
    pub principal: Principal,

    /// Permission name or letter (can-consume, read, C, R, ...)
    #[arg(long, default_value = "read")]
    pub permission: Permission,

    /// Print JSON instead of text
    #[arg(long)]
    pub json: bool,
}

/// Compute and print the valid-range set and resolution report.
pub async fn run(session: &Session, args: RangesArgs) -> Result<()> {
    let (ranges, report) = session
        .engine
        .explain_valid_ranges(&args.resource, &args.principal, args.permission)
        .await?;

    if args.json {
        let rendered: Vec<_> = ranges
            .iter()
            .map(|r| {
                json!({
                    "start": r.start(),
                    "end": r.end(),
                    "start_rfc3339": rfc3339(r.start()),
                    "end_rfc3339": rfc3339(r.end()),
                })
            })
            .collect();
        let out = json!({
            "resource": args.resource,
            "principal": args.principal,
            "permission": args.permission,
            "ranges": rendered,
            "report": report,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!(
        "Valid ranges for {} on {} ({}):",
        args.principal, args.resource, args.permission
    );
    if ranges.is_empty() {
        println!("  none");
    }
    for range in &ranges {
        println!("  {range}  {}", describe_interval(range));
    }
    println!(
        "Chains: {} discovered, {} resolved, {} rejected",
        report.candidates,
        report.resolved,
        report.rejected_total()
    );
    for (reason, count) in &report.rejected {
        println!("  {reason}: {count}");
    }
    Ok(())
}
