// Dashboard service - grid/expanded view state and panel rendering
use crate::application::snapshot_store::{SnapshotStore, SnapshotView};
use crate::domain::chart::{present, ChartPanel, PanelStyle};
use crate::domain::dashboard::ChartDataStore;
use crate::infrastructure::config::ZoneConfig;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;

const FALLBACK_COLOR: &str = "#cccccc";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", content = "zone", rename_all = "snake_case")]
pub enum ViewMode {
    Grid,
    Expanded(String),
}

#[derive(Error, Debug, PartialEq)]
#[error("unknown zone: {0}")]
pub struct UnknownZone(pub String);

#[derive(Debug, Clone, Serialize)]
pub struct DashboardView {
    pub view: ViewMode,
    pub panels: Vec<ChartPanel>,
    pub label_count: usize,
    pub updated_at: Option<DateTime<Utc>>,
    pub status: Option<String>,
    pub degraded_zones: Vec<String>,
}

pub struct DashboardService {
    current: Arc<SnapshotStore>,
    historical: Option<Arc<SnapshotStore>>,
    roster: Vec<ZoneConfig>,
    colors: HashMap<String, String>,
    style: PanelStyle,
    mode: RwLock<ViewMode>,
}

impl DashboardService {
    pub fn new(
        current: Arc<SnapshotStore>,
        historical: Option<Arc<SnapshotStore>>,
        roster: Vec<ZoneConfig>,
        style: PanelStyle,
    ) -> Self {
        let colors = roster
            .iter()
            .map(|z| (z.name.clone(), z.color.clone()))
            .collect();

        Self {
            current,
            historical,
            roster,
            colors,
            style,
            mode: RwLock::new(ViewMode::Grid),
        }
    }

    /// Switch to the single full-height chart for `zone`.
    pub async fn expand(&self, zone: &str) -> Result<ViewMode, UnknownZone> {
        let known_in_roster = self.roster.iter().any(|z| z.name == zone);
        let known_in_data = self.current.snapshot().await.zone(zone).is_some();
        if !known_in_roster && !known_in_data {
            return Err(UnknownZone(zone.to_string()));
        }

        let mode = ViewMode::Expanded(zone.to_string());
        *self.mode.write().await = mode.clone();
        tracing::debug!("Expanded chart for zone {}", zone);
        Ok(mode)
    }

    /// Back to the grid of all zones.
    pub async fn close(&self) -> ViewMode {
        *self.mode.write().await = ViewMode::Grid;
        ViewMode::Grid
    }

    pub async fn mode(&self) -> ViewMode {
        self.mode.read().await.clone()
    }

    pub async fn current_view(&self) -> DashboardView {
        let mode = self.mode().await;
        let view = self.current.view().await;
        self.build_view(view, mode)
    }

    /// Historical data is always shown as a grid. `None` when the feed is not configured.
    pub async fn historical_view(&self) -> Option<DashboardView> {
        let store = self.historical.as_ref()?;
        let view = store.view().await;
        Some(self.build_view(view, ViewMode::Grid))
    }

    fn build_view(&self, view: SnapshotView, mode: ViewMode) -> DashboardView {
        let panels = self.render(&view.snapshot, &mode);
        DashboardView {
            view: mode,
            panels,
            label_count: view.snapshot.labels.len(),
            updated_at: view.updated_at,
            status: view.status,
            degraded_zones: view.snapshot.misaligned_zones.clone(),
        }
    }

    fn render(&self, snapshot: &ChartDataStore, mode: &ViewMode) -> Vec<ChartPanel> {
        match mode {
            ViewMode::Expanded(zone) => {
                let values = snapshot
                    .zone(zone)
                    .map(|z| z.values.as_slice())
                    .unwrap_or_default();
                vec![present(
                    values,
                    &snapshot.labels,
                    zone,
                    self.color_for(zone),
                    true,
                    &self.style,
                )]
            }
            ViewMode::Grid => snapshot
                .zones
                .iter()
                .map(|z| {
                    present(
                        &z.values,
                        &snapshot.labels,
                        &z.name,
                        self.color_for(&z.name),
                        false,
                        &self.style,
                    )
                })
                .collect(),
        }
    }

    fn color_for(&self, zone: &str) -> &str {
        self.colors
            .get(zone)
            .map(String::as_str)
            .unwrap_or(FALLBACK_COLOR)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::transformer::{Transformer, ZoneRoster};
    use crate::domain::telemetry::{RawRecord, TimeSeriesPoint};
    use crate::infrastructure::config::LabelFormat;

    fn roster() -> Vec<ZoneConfig> {
        ["A8", "A9", "GRS BACA"]
            .iter()
            .map(|n| ZoneConfig {
                name: n.to_string(),
                color: format!("#{}", n.len()),
            })
            .collect()
    }

    async fn service_with_data() -> DashboardService {
        let transformer = Transformer::new(
            ZoneRoster::Fixed(roster().into_iter().map(|z| z.name).collect()),
            None,
            LabelFormat::TimeOfDay,
            0,
        );
        let records = ["A8", "A9", "GRS BACA"]
            .iter()
            .map(|n| {
                RawRecord::new(
                    *n,
                    vec![TimeSeriesPoint::new(1_000, 20.0), TimeSeriesPoint::new(2_000, 30.0)],
                )
            })
            .collect();

        let store = Arc::new(SnapshotStore::new());
        let seq = store.begin_poll();
        store.replace(seq, transformer.transform(records)).await;

        DashboardService::new(store, None, roster(), PanelStyle::default())
    }

    #[tokio::test]
    async fn test_grid_shows_every_zone() {
        let service = service_with_data().await;
        let view = service.current_view().await;

        assert_eq!(view.view, ViewMode::Grid);
        assert_eq!(view.label_count, 2);
        let zones: Vec<_> = view.panels.iter().map(|p| p.zone.as_str()).collect();
        assert_eq!(zones, vec!["A8", "A9", "GRS BACA"]);
        assert!(view.panels.iter().all(|p| !p.expanded));

        let axis_panels: Vec<_> = view
            .panels
            .iter()
            .filter(|p| p.show_time_axis)
            .map(|p| p.zone.as_str())
            .collect();
        assert_eq!(axis_panels, vec!["GRS BACA"]);
    }

    #[tokio::test]
    async fn test_expand_then_close() {
        let service = service_with_data().await;

        service.expand("A9").await.unwrap();
        let view = service.current_view().await;
        assert_eq!(view.view, ViewMode::Expanded("A9".to_string()));
        assert_eq!(view.panels.len(), 1);
        let panel = &view.panels[0];
        assert_eq!(panel.zone, "A9");
        assert!(panel.expanded);
        assert!(panel.show_time_axis);
        assert_eq!(panel.bounds.unwrap().min, 10.0);

        service.close().await;
        let view = service.current_view().await;
        assert_eq!(view.view, ViewMode::Grid);
        assert_eq!(view.panels.len(), 3);
        let a9 = view.panels.iter().find(|p| p.zone == "A9").unwrap();
        assert!(!a9.expanded);
        assert_eq!(a9.height_px, 50);
    }

    #[tokio::test]
    async fn test_expand_unknown_zone_is_rejected() {
        let service = service_with_data().await;
        assert_eq!(
            service.expand("B1").await.unwrap_err(),
            UnknownZone("B1".to_string())
        );
        assert_eq!(service.mode().await, ViewMode::Grid);
    }

    #[tokio::test]
    async fn test_empty_store_renders_nothing() {
        let service = DashboardService::new(
            Arc::new(SnapshotStore::new()),
            None,
            roster(),
            PanelStyle::default(),
        );
        let view = service.current_view().await;
        assert!(view.panels.is_empty());
        assert!(view.updated_at.is_none());
        assert!(service.historical_view().await.is_none());
    }

    #[test]
    fn test_view_mode_serialization() {
        assert_eq!(
            serde_json::to_value(ViewMode::Expanded("A9".into())).unwrap(),
            serde_json::json!({"mode": "expanded", "zone": "A9"})
        );
        assert_eq!(
            serde_json::to_value(ViewMode::Grid).unwrap(),
            serde_json::json!({"mode": "grid"})
        );
    }
}
