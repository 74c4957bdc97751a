// Scrape fallback - reads zone readings out of a rendered status page table
use crate::application::data_source::ZoneDataSource;
use crate::application::session::Credential;
use crate::domain::telemetry::{RawRecord, TimeSeriesPoint};
use crate::error::FetchError;
use crate::infrastructure::config::ScrapeSettings;
use async_trait::async_trait;
use regex::Regex;
use std::collections::{HashMap, VecDeque};
use tokio::sync::Mutex;

/// A zone name and its reading from one table row
#[derive(Debug, Clone, PartialEq)]
pub struct ScrapedReading {
    pub zone: String,
    pub value: f64,
}

#[derive(Debug)]
pub struct RowParser {
    row: Regex,
    cell: Regex,
    tag: Regex,
    number: Regex,
}

impl RowParser {
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            row: Regex::new(r"(?is)<tr\b[^>]*>(.*?)</tr>")?,
            cell: Regex::new(r"(?is)<t[dh]\b[^>]*>(.*?)</t[dh]>")?,
            tag: Regex::new(r"(?s)<[^>]*>")?,
            number: Regex::new(r"^-?\d+(?:[.,]\d+)?")?,
        })
    }

    /// Rows whose first cell names a zone and a later cell starts with a number.
    /// Header rows and rows without a reading are skipped.
    pub fn parse(&self, html: &str) -> Vec<ScrapedReading> {
        let mut readings = Vec::new();
        for row in self.row.captures_iter(html) {
            let cells: Vec<String> = self
                .cell
                .captures_iter(&row[1])
                .map(|c| self.cell_text(&c[1]))
                .filter(|text| !text.is_empty())
                .collect();

            let Some((zone, rest)) = cells.split_first() else {
                continue;
            };
            if let Some(value) = rest.iter().find_map(|cell| self.parse_number(cell)) {
                readings.push(ScrapedReading {
                    zone: zone.clone(),
                    value,
                });
            }
        }
        readings
    }

    fn cell_text(&self, inner: &str) -> String {
        let text = self.tag.replace_all(inner, " ");
        let text = text
            .replace("&nbsp;", " ")
            .replace("&amp;", "&")
            .replace("&deg;", "°");
        text.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    fn parse_number(&self, cell: &str) -> Option<f64> {
        let found = self.number.find(cell)?;
        found.as_str().replace(',', ".").parse().ok()
    }
}

/// Samples accumulate across polls here, since the page only ever shows the latest reading.
pub struct ScrapeSource {
    client: reqwest::Client,
    url: String,
    max_samples_per_zone: usize,
    parser: RowParser,
    history: Mutex<ZoneHistory>,
}

#[derive(Default)]
struct ZoneHistory {
    order: Vec<String>,
    samples: HashMap<String, VecDeque<TimeSeriesPoint>>,
}

impl ZoneHistory {
    fn push(&mut self, zone: &str, point: TimeSeriesPoint, cap: usize) {
        if !self.samples.contains_key(zone) {
            self.order.push(zone.to_string());
        }
        let series = self.samples.entry(zone.to_string()).or_default();
        series.push_back(point);
        while series.len() > cap {
            series.pop_front();
        }
    }

    fn records(&self) -> Vec<RawRecord> {
        self.order
            .iter()
            .filter_map(|zone| {
                let series = self.samples.get(zone)?;
                Some(RawRecord::new(zone.clone(), series.iter().copied().collect()))
            })
            .collect()
    }
}

impl ScrapeSource {
    pub fn new(settings: &ScrapeSettings) -> Result<Self, regex::Error> {
        Ok(Self {
            client: reqwest::Client::new(),
            url: settings.url.clone(),
            max_samples_per_zone: settings.max_samples_per_zone.max(1),
            parser: RowParser::new()?,
            history: Mutex::new(ZoneHistory::default()),
        })
    }

    async fn fetch_page(&self) -> Result<String, FetchError> {
        let response = self.client.get(&self.url).send().await?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::Status { status, body });
        }
        Ok(response.text().await?)
    }
}

#[async_trait]
impl ZoneDataSource for ScrapeSource {
    fn name(&self) -> &str {
        "scrape"
    }

    fn requires_credential(&self) -> bool {
        false
    }

    async fn fetch(&self, _credential: Option<&Credential>) -> Result<Vec<RawRecord>, FetchError> {
        let html = self.fetch_page().await?;
        let readings = self.parser.parse(&html);
        if readings.is_empty() {
            return Err(FetchError::MalformedBody(
                "status page contains no zone rows".to_string(),
            ));
        }

        let now_ms = chrono::Utc::now().timestamp_millis();
        let mut history = self.history.lock().await;
        for reading in &readings {
            history.push(
                &reading.zone,
                TimeSeriesPoint::new(now_ms, reading.value),
                self.max_samples_per_zone,
            );
        }
        tracing::debug!("Scraped {} zone readings", readings.len());

        Ok(history.records())
    }
}
