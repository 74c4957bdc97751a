// Chart data store - per-zone series aligned to one shared time axis
use super::telemetry::TimeSeriesPoint;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ZoneSeries {
    pub name: String,
    /// Samples ascending by time.
    pub points: Vec<TimeSeriesPoint>,
    /// One slot per shared axis timestamp; `None` where this zone has no sample at that time.
    pub values: Vec<Option<f64>>,
}

impl ZoneSeries {
    pub fn new(name: String, points: Vec<TimeSeriesPoint>, values: Vec<Option<f64>>) -> Self {
        Self {
            name,
            points,
            values,
        }
    }

    pub fn empty(name: String) -> Self {
        Self::new(name, Vec::new(), Vec::new())
    }
}

/// A single poll's worth of chart data. Rebuilt wholesale on every poll.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChartDataStore {
    pub labels: Vec<String>,
    pub timestamps: Vec<i64>,
    pub zones: Vec<ZoneSeries>,
    /// Zones whose sample times differ from the shared axis.
    pub misaligned_zones: Vec<String>,
}

impl ChartDataStore {
    pub fn zone(&self, name: &str) -> Option<&ZoneSeries> {
        self.zones.iter().find(|z| z.name == name)
    }

    pub fn is_degraded(&self) -> bool {
        !self.misaligned_zones.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zone_lookup() {
        let store = ChartDataStore {
            zones: vec![ZoneSeries::empty("A8".into()), ZoneSeries::empty("GRS BACA".into())],
            ..Default::default()
        };
        assert!(store.zone("GRS BACA").is_some());
        assert!(store.zone("A9").is_none());
        assert_eq!(store.zones[1].name, "GRS BACA");
        assert!(!store.is_degraded());
    }
}
