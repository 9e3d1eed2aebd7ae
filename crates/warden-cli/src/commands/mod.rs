//! CLI command handlers

pub mod check;
pub mod mask;
pub mod ranges;

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use std::path::PathBuf;
use warden_access::handlers::FixtureWorld;
use warden_access::AccessEngine;
use warden_core::{Interval, Timestamp};

use crate::config::CliConfig;

/// An engine wired to a fixture world.
pub struct Session {
    /// The access engine
    pub engine: AccessEngine,
    /// The world it was built from, for stream-name lookups
    pub world: FixtureWorld,
}

impl Session {
    /// Build the fixture world named by `--fixture` or the config file.
    pub fn open(config: &CliConfig, fixture: Option<PathBuf>) -> Result<Self> {
        let path = fixture
            .or_else(|| config.fixture.clone())
            .ok_or_else(|| anyhow!("No fixture world configured; pass --fixture or set `fixture` in the config file"))?;
        let world = FixtureWorld::load_from_file(&path)
            .with_context(|| format!("Failed to load fixture {}", path.display()))?;
        let handlers = world.build()?;
        let engine = AccessEngine::new(
            handlers.discovery,
            handlers.registry,
            handlers.streams,
            config.access.clone(),
        )?
        .with_span(tracing::info_span!("warden", fixture = %path.display()));
        Ok(Self { engine, world })
    }
}

/// Render a timestamp as RFC 3339 with nanosecond precision.
pub fn rfc3339(at: Timestamp) -> String {
    DateTime::<Utc>::from_timestamp_nanos(at.as_nanos()).to_rfc3339_opts(SecondsFormat::Nanos, true)
}

/// Render an interval as `start .. end` in RFC 3339.
pub fn describe_interval(interval: &Interval) -> String {
    format!("{} .. {}", rfc3339(interval.start()), rfc3339(interval.end()))
}

/// Parse a timestamp given as raw nanoseconds or as RFC 3339.
pub fn parse_timestamp(raw: &str) -> Result<Timestamp> {
    if let Ok(nanos) = raw.trim().parse::<i64>() {
        return Ok(Timestamp::from_nanos(nanos));
    }
    let parsed = DateTime::parse_from_rfc3339(raw.trim())
        .with_context(|| format!("'{raw}' is neither nanoseconds nor RFC 3339"))?;
    parsed
        .timestamp_nanos_opt()
        .map(Timestamp::from_nanos)
        .ok_or_else(|| anyhow!("'{raw}' is outside the representable range"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_timestamp() {
        assert_eq!(parse_timestamp("150").unwrap(), Timestamp::from_nanos(150));
        assert_eq!(
            parse_timestamp("1970-01-01T00:00:01Z").unwrap(),
            Timestamp::from_secs(1)
        );
        assert!(parse_timestamp("yesterday").is_err());
    }

    #[tokio::test]
    async fn test_sample_fixture_session() {
        let dir = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures");
        let config = CliConfig::load(&dir.join("warden.toml")).unwrap();
        let session = Session::open(&config, None).unwrap();

        let alice = warden_core::Principal::new("alice");
        let resource = "campus/bldg1/temp".parse().unwrap();
        let (ranges, report) = session
            .engine
            .explain_valid_ranges(&resource, &alice, warden_core::Permission::Read)
            .await
            .unwrap();
        // Q1 and Q2 collapse into a single range
        assert_eq!(ranges.len(), 1);
        assert_eq!(report.candidates, 3);
        assert_eq!(session.engine.config().lookup_timeout_ms, 1000);
        assert_eq!(report.rejected_total(), 1);
        assert!(ranges.contains(parse_timestamp("2024-03-01T00:00:00Z").unwrap()));
        assert!(ranges.contains(parse_timestamp("2024-03-31T23:59:59Z").unwrap()));
        assert!(ranges.contains(parse_timestamp("2024-05-01T00:00:00Z").unwrap()));
        assert!(!ranges.contains(parse_timestamp("2024-08-01T00:00:00Z").unwrap()));
    }

    #[test]
    fn test_session_requires_fixture() {
        assert!(Session::open(&CliConfig::default(), None).is_err());
    }

    #[test]
    fn test_rfc3339_round_trip() {
        let at = Timestamp::from_nanos(1_700_000_000_123_456_789);
        assert_eq!(parse_timestamp(&rfc3339(at)).unwrap(), at);
        assert_eq!(rfc3339(Timestamp::from_nanos(0)), "1970-01-01T00:00:00.000000000Z");
    }
}
