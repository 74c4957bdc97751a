// Data transformer - reshapes raw zone records into the per-zone chart store
use crate::domain::dashboard::{ChartDataStore, ZoneSeries};
use crate::domain::telemetry::{RawRecord, TimeSeriesPoint, RESERVED_ZONE};
use crate::infrastructure::config::{DisplaySettings, LabelFormat, ZoneConfig};
use chrono::{DateTime, FixedOffset, Offset, Utc};
use std::collections::{HashMap, HashSet};

/// Which zones end up in the store.
#[derive(Debug, Clone, PartialEq)]
pub enum ZoneRoster {
    /// Fixed, ordered list. Zones missing from a poll get an empty series.
    Fixed(Vec<String>),
    /// Whatever names the poll delivered, in delivery order.
    Inferred,
}

#[derive(Debug, Clone)]
pub struct Transformer {
    roster: ZoneRoster,
    axis_zone: Option<String>,
    label_format: LabelFormat,
    offset: FixedOffset,
}

impl Transformer {
    pub fn new(
        roster: ZoneRoster,
        axis_zone: Option<String>,
        label_format: LabelFormat,
        utc_offset_minutes: i32,
    ) -> Self {
        let offset = FixedOffset::east_opt(utc_offset_minutes * 60).unwrap_or_else(|| {
            tracing::warn!(
                "Invalid UTC offset of {} minutes, formatting labels in UTC",
                utc_offset_minutes
            );
            Utc.fix()
        });

        Self {
            roster,
            axis_zone,
            label_format,
            offset,
        }
    }

    pub fn from_settings(display: &DisplaySettings, zones: &[ZoneConfig]) -> Self {
        let roster = if zones.is_empty() {
            ZoneRoster::Inferred
        } else {
            ZoneRoster::Fixed(zones.iter().map(|z| z.name.clone()).collect())
        };

        Self::new(
            roster,
            display.axis_zone.clone(),
            display.label_format,
            display.utc_offset_minutes,
        )
    }

    pub fn format_label(&self, time_ms: i64) -> String {
        let Some(time) = DateTime::from_timestamp_millis(time_ms) else {
            return time_ms.to_string();
        };
        let local = time.with_timezone(&self.offset);
        match self.label_format {
            LabelFormat::DateTime => local.format("%d.%m.%Y-%H:%M:%S").to_string(),
            LabelFormat::TimeOfDay => local.format("%H:%M:%S").to_string(),
        }
    }

    pub fn transform(&self, records: Vec<RawRecord>) -> ChartDataStore {
        if records.is_empty() {
            return ChartDataStore::default();
        }

        let delivery_order: Vec<String> = records.iter().map(|r| r.name.clone()).collect();
        let mut by_zone: HashMap<String, Vec<TimeSeriesPoint>> = HashMap::new();
        for mut record in records {
            record.sort_by_time();
            let points = dedup_by_time(record.samples);
            if by_zone.insert(record.name.clone(), points).is_some() {
                tracing::warn!("Zone {} delivered twice, keeping the later record", record.name);
            }
        }

        let timestamps: Vec<i64> = self
            .axis_source(&delivery_order, &by_zone)
            .map(|points| points.iter().map(|p| p.time_ms).collect())
            .unwrap_or_default();
        let labels = timestamps.iter().map(|t| self.format_label(*t)).collect();
        let axis_set: HashSet<i64> = timestamps.iter().copied().collect();

        let mut zones = Vec::new();
        let mut misaligned_zones = Vec::new();
        for name in self.zone_names(&delivery_order) {
            let Some(points) = by_zone.remove(&name) else {
                zones.push(ZoneSeries::empty(name));
                continue;
            };

            let lookup: HashMap<i64, f64> = points.iter().map(|p| (p.time_ms, p.value)).collect();
            let values: Vec<Option<f64>> =
                timestamps.iter().map(|t| lookup.get(t).copied()).collect();

            let aligned =
                points.len() == axis_set.len() && points.iter().all(|p| axis_set.contains(&p.time_ms));
            if !aligned {
                tracing::warn!(
                    "Zone {} sample times differ from the shared axis ({} vs {} samples)",
                    name,
                    points.len(),
                    axis_set.len()
                );
                misaligned_zones.push(name.clone());
            }

            zones.push(ZoneSeries::new(name, points, values));
        }

        ChartDataStore {
            labels,
            timestamps,
            zones,
            misaligned_zones,
        }
    }

    fn axis_source<'a>(
        &self,
        delivery_order: &[String],
        by_zone: &'a HashMap<String, Vec<TimeSeriesPoint>>,
    ) -> Option<&'a Vec<TimeSeriesPoint>> {
        if let Some(points) = self.axis_zone.as_ref().and_then(|z| by_zone.get(z)) {
            return Some(points);
        }
        delivery_order
            .iter()
            .find(|name| name.as_str() != RESERVED_ZONE)
            .or_else(|| delivery_order.first())
            .and_then(|name| by_zone.get(name))
    }

    fn zone_names(&self, delivery_order: &[String]) -> Vec<String> {
        let candidates: Vec<String> = match &self.roster {
            ZoneRoster::Fixed(names) => names.clone(),
            ZoneRoster::Inferred => delivery_order.to_vec(),
        };

        let mut seen = HashSet::new();
        candidates
            .into_iter()
            .filter(|name| name.as_str() != RESERVED_ZONE)
            .filter(|name| seen.insert(name.clone()))
            .collect()
    }
}

/// Collapse samples sharing a timestamp, keeping the last one delivered.
fn dedup_by_time(sorted: Vec<TimeSeriesPoint>) -> Vec<TimeSeriesPoint> {
    let mut out: Vec<TimeSeriesPoint> = Vec::with_capacity(sorted.len());
    for point in sorted {
        match out.last_mut() {
            Some(last) if last.time_ms == point.time_ms => *last = point,
            _ => out.push(point),
        }
    }
    out
}
