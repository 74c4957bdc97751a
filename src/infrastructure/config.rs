use crate::domain::chart::PanelStyle;
use serde::Deserialize;

pub const ENV_PREFIX: &str = "DASHBOARD";

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerSettings,
    pub identity: Option<IdentitySettings>,
    pub data_api: Option<DataApiSettings>,
    #[serde(default)]
    pub source: SourceSettings,
    pub scrape: Option<ScrapeSettings>,
    pub historical: Option<HistoricalSettings>,
    #[serde(default)]
    pub polling: PollingSettings,
    #[serde(default)]
    pub display: DisplaySettings,
    #[serde(default = "default_roster")]
    pub zones: Vec<ZoneConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct IdentitySettings {
    #[serde(default = "default_identity_base_url")]
    pub base_url: String,
    pub app_id: String,
    /// Usually injected as `DASHBOARD__IDENTITY__EMAIL`.
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DataApiSettings {
    pub endpoint: String,
    pub collection: String,
    pub database: String,
    pub data_source: String,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    #[default]
    DataApi,
    Scrape,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct SourceSettings {
    #[serde(default)]
    pub kind: SourceKind,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ScrapeSettings {
    pub url: String,
    #[serde(default = "default_max_samples")]
    pub max_samples_per_zone: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct HistoricalSettings {
    pub url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PollingSettings {
    #[serde(default = "default_current_interval")]
    pub current_interval_secs: u64,
}

impl Default for PollingSettings {
    fn default() -> Self {
        Self {
            current_interval_secs: default_current_interval(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum LabelFormat {
    /// `17.10.2026-14:05:09`
    #[default]
    DateTime,
    /// `14:05:09`
    TimeOfDay,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DisplaySettings {
    #[serde(default)]
    pub label_format: LabelFormat,
    #[serde(default = "default_utc_offset")]
    pub utc_offset_minutes: i32,
    /// Zone whose sample times form the shared axis. Falls back to the first record.
    #[serde(default)]
    pub axis_zone: Option<String>,
    /// Zone that keeps its time axis visible in the grid view.
    #[serde(default = "default_x_axis_zone")]
    pub x_axis_zone: Option<String>,
    #[serde(default = "default_compact_height")]
    pub compact_height_px: u32,
    #[serde(default = "default_axis_height")]
    pub axis_height_px: u32,
    #[serde(default = "default_expanded_height")]
    pub expanded_height_px: u32,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            label_format: LabelFormat::default(),
            utc_offset_minutes: default_utc_offset(),
            axis_zone: None,
            x_axis_zone: default_x_axis_zone(),
            compact_height_px: default_compact_height(),
            axis_height_px: default_axis_height(),
            expanded_height_px: default_expanded_height(),
        }
    }
}

impl DisplaySettings {
    pub fn panel_style(&self) -> PanelStyle {
        PanelStyle {
            x_axis_zone: self.x_axis_zone.clone(),
            compact_height_px: self.compact_height_px,
            axis_height_px: self.axis_height_px,
            expanded_height_px: self.expanded_height_px,
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ZoneConfig {
    pub name: String,
    pub color: String,
}

fn default_bind_address() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_identity_base_url() -> String {
    "https://realm.mongodb.com".to_string()
}

fn default_max_samples() -> usize {
    720
}

fn default_current_interval() -> u64 {
    300
}

fn default_utc_offset() -> i32 {
    180
}

fn default_x_axis_zone() -> Option<String> {
    Some("GRS BACA".to_string())
}

fn default_compact_height() -> u32 {
    50
}

fn default_axis_height() -> u32 {
    150
}

fn default_expanded_height() -> u32 {
    400
}

fn default_roster() -> Vec<ZoneConfig> {
    [
        ("A8", "#ff9f1c"),
        ("A9", "#f9c159"),
        ("A10", "#f6e887"),
        ("A11", "#b0f5ba"),
        ("A12", "#9ceaef"),
        ("A13", "#d2d7e7"),
        ("A14", "#afbcc1"),
        ("A15", "#fdfdcc"),
        ("A16", "#e3e7e7"),
        ("A17", "#ffd7b5"),
        ("A18", "#ccd5ae"),
        ("A19", "#e9edc9"),
        ("A20", "#fefae0"),
        ("A21", "#faedcd"),
        ("A22", "#d4a373"),
        ("GRS BACA", "#e4b19b"),
    ]
    .into_iter()
    .map(|(name, color)| ZoneConfig {
        name: name.to_string(),
        color: color.to_string(),
    })
    .collect()
}

pub fn load_app_config() -> anyhow::Result<AppConfig> {
    load_app_config_from("config/dashboard")
}

/// File source is optional; environment variables such as
/// `DASHBOARD__IDENTITY__PASSWORD` override it.
pub fn load_app_config_from(path: &str) -> anyhow::Result<AppConfig> {
    load_with_environment(path, environment())
}

/// Values stay strings so secrets like `007123` keep their formatting.
fn environment() -> config::Environment {
    config::Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("__")
        .separator("__")
}

fn load_with_environment(path: &str, env: config::Environment) -> anyhow::Result<AppConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name(path).required(false))
        .add_source(env)
        .build()?;

    Ok(settings.try_deserialize()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn from_toml(text: &str) -> AppConfig {
        config::Config::builder()
            .add_source(config::File::from_str(text, config::FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn test_defaults_reproduce_deployment() {
        let cfg = from_toml("");

        assert_eq!(cfg.server.bind_address, "0.0.0.0:8080");
        assert_eq!(cfg.source.kind, SourceKind::DataApi);
        assert_eq!(cfg.polling.current_interval_secs, 300);
        assert_eq!(cfg.display.label_format, LabelFormat::DateTime);
        assert_eq!(cfg.zones.len(), 16);
        assert_eq!(cfg.zones[0].name, "A8");
        assert_eq!(cfg.zones[15].color, "#e4b19b");
        assert!(cfg.identity.is_none());
        assert!(cfg.historical.is_none());
    }

    #[test]
    fn test_full_config() {
        let cfg = from_toml(
            r##"
            [identity]
            app_id = "data-abc"
            email = "ops@example.com"
            password = "secret"

            [data_api]
            endpoint = "https://data.example.com/action/"
            collection = "tempV3"
            database = "temperature_data"
            data_source = "Cluster0"

            [source]
            kind = "scrape"

            [scrape]
            url = "http://plc.local/status"

            [polling]
            current_interval_secs = 5

            [display]
            label_format = "time_of_day"
            axis_zone = "A8"

            [[zones]]
            name = "A8"
            color = "#ff9f1c"
            "##,
        );

        let identity = cfg.identity.unwrap();
        assert_eq!(identity.base_url, "https://realm.mongodb.com");
        assert_eq!(identity.app_id, "data-abc");
        assert_eq!(cfg.data_api.unwrap().data_source, "Cluster0");
        assert_eq!(cfg.source.kind, SourceKind::Scrape);
        assert_eq!(cfg.scrape.unwrap().max_samples_per_zone, 720);
        assert_eq!(cfg.polling.current_interval_secs, 5);
        assert_eq!(cfg.display.label_format, LabelFormat::TimeOfDay);
        assert_eq!(cfg.display.axis_zone.as_deref(), Some("A8"));
        assert_eq!(cfg.zones.len(), 1);
    }

    fn env(vars: &[(&str, &str)]) -> config::Environment {
        let vars: config::Map<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        environment().source(Some(vars))
    }

    #[test]
    fn test_shipped_config_loads_without_secrets() {
        let cfg = load_with_environment("config/dashboard", env(&[])).unwrap();

        let identity = cfg.identity.unwrap();
        assert_eq!(identity.app_id, "data-xnlepwl");
        assert!(identity.email.is_none());
        assert!(identity.password.is_none());
        assert_eq!(cfg.data_api.unwrap().collection, "tempV3");
        assert_eq!(cfg.display.utc_offset_minutes, 180);
    }

    #[test]
    fn test_env_secrets_are_kept_verbatim() {
        let cfg = load_with_environment(
            "config/dashboard",
            env(&[
                ("DASHBOARD__IDENTITY__EMAIL", "ops@example.com"),
                ("DASHBOARD__IDENTITY__PASSWORD", "007123"),
                ("DASHBOARD__POLLING__CURRENT_INTERVAL_SECS", "5"),
            ]),
        )
        .unwrap();

        let identity = cfg.identity.unwrap();
        assert_eq!(identity.email.as_deref(), Some("ops@example.com"));
        assert_eq!(identity.password.as_deref(), Some("007123"));
        assert_eq!(cfg.polling.current_interval_secs, 5);
    }

    #[test]
    fn test_panel_style_from_display() {
        let style = DisplaySettings::default().panel_style();
        assert_eq!(style.x_axis_zone.as_deref(), Some("GRS BACA"));
        assert_eq!(style.compact_height_px, 50);
        assert_eq!(style.axis_height_px, 150);
    }
}
