use chrono::{DateTime, Duration, SecondsFormat, Utc};
use svc_control_shared::health::{HealthTile, HealthTiles, HealthView};
use svc_control_shared::status::StatusColor;

use crate::db::Store;
use crate::response::{ServerError, ServerResult};

/// Upper bound on tiles produced for one request.
pub const MAX_TILES: i64 = 10_000;

/// Colors fixed-length buckets of a time window from the observation log.
pub struct HealthHistory {
    store: Store,
    default_tiles: u32,
}

impl HealthHistory {
    pub fn new(store: Store, default_tiles: u32) -> Self {
        Self {
            store,
            default_tiles,
        }
    }

    /// Partitions `[from, to)` into buckets sized for `view`. A bucket is red
    /// when at least one unhealthy observation falls inside it.
    pub async fn get_health_tiles(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        view: HealthView,
        tiles: Option<u32>,
        service: Option<&str>,
    ) -> ServerResult<HealthTiles> {
        let period_seconds = view.period_seconds(tiles.unwrap_or(self.default_tiles));
        let period = Duration::seconds(period_seconds);

        if from >= to {
            // Still validate the service filter for consistent errors.
            if let Some(name) = service {
                self.store.require_service_id(name).await?;
            }
            return Ok(HealthTiles {
                tiles: Vec::new(),
                period_seconds,
            });
        }

        let count = tile_count(from, to, period);
        if count > MAX_TILES {
            return Err(ServerError::bad_request(&format!(
                "window needs {count} tiles of {period_seconds}s, at most {MAX_TILES} are allowed"
            )));
        }

        let unhealthy = self.store.unhealthy_observations(from, to, service).await?;
        Ok(HealthTiles {
            tiles: bucketize(from, to, period, &unhealthy),
            period_seconds,
        })
    }
}

fn tile_count(from: DateTime<Utc>, to: DateTime<Utc>, period: Duration) -> i64 {
    let window_ms = (to - from).num_milliseconds();
    let period_ms = period.num_milliseconds().max(1);
    (window_ms + period_ms - 1) / period_ms
}

/// Contiguous buckets covering `[from, to)`; the last may be shorter than
/// `period`. `unhealthy` must be sorted ascending.
pub(crate) fn bucketize(
    from: DateTime<Utc>,
    to: DateTime<Utc>,
    period: Duration,
    unhealthy: &[DateTime<Utc>],
) -> Vec<HealthTile> {
    let mut tiles = Vec::new();
    let mut observations = unhealthy.iter().peekable();
    let mut start = from;

    while start < to {
        let end = (start + period).min(to);

        while observations.next_if(|t| **t < start).is_some() {}
        let red = observations.peek().is_some_and(|t| **t < end);

        tiles.push(HealthTile {
            date: start.to_rfc3339_opts(SecondsFormat::Secs, true),
            color: if red {
                StatusColor::Red
            } else {
                StatusColor::Green
            },
            length_seconds: (end - start).num_milliseconds() as f64 / 1000.0,
        });
        start = end;
    }
    tiles
}
