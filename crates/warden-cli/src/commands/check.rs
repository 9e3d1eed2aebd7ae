//! `warden check`: was access held at a given instant

use anyhow::Result;
use clap::Args;
use warden_core::{Permission, Principal, ResourceUri};

use super::{parse_timestamp, rfc3339, Session};

/// Arguments for `warden check`.
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Concrete resource, e.g. campus/bldg1/temp
    #[arg(long)]
    pub resource: ResourceUri,

    /// Requesting principal
    #[arg(long)]
    pub principal: Principal,

    /// Permission name or letter (can-consume, read, C, R, ...)
    #[arg(long, default_value = "read")]
    pub permission: Permission,

    /// Instant to check, as nanoseconds or RFC 3339
    #[arg(long)]
    pub at: String,
}

/// Print whether access was held at the instant; returns the verdict.
pub async fn run(session: &Session, args: CheckArgs) -> Result<bool> {
    let at = parse_timestamp(&args.at)?;
    let ranges = session
        .engine
        .get_valid_ranges(&args.resource, &args.principal, args.permission)
        .await?;
    let granted = ranges.contains(at);

    println!(
        "{} {} {} on {} at {}",
        if granted { "GRANTED" } else { "DENIED" },
        args.principal,
        args.permission,
        args.resource,
        rfc3339(at)
    );
    Ok(granted)
}
