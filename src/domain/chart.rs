// Chart presentation - display bounds and the declarative chart option handed to the browser
use serde::Serialize;

pub const UNAVAILABLE_LABEL: &str = "N/A";

const BOUNDS_PADDING: f64 = 10.0;
const BOUNDS_STEP: f64 = 10.0;
const AXIS_DIVISIONS: f64 = 4.0;

/// Y-axis range padded by 10 and snapped outward to multiples of 10.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DisplayBounds {
    pub min: f64,
    pub max: f64,
    pub interval: f64,
}

impl DisplayBounds {
    /// `None` when there is nothing to scale against.
    pub fn from_values(values: &[f64]) -> Option<Self> {
        let mut finite = values.iter().copied().filter(|v| v.is_finite());
        let first = finite.next()?;
        let (lo, hi) = finite.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v)));

        // `+ 0.0` folds a rounded -0.0 into 0.0
        let min = ((lo - BOUNDS_PADDING) / BOUNDS_STEP).floor() * BOUNDS_STEP + 0.0;
        let max = ((hi + BOUNDS_PADDING) / BOUNDS_STEP).ceil() * BOUNDS_STEP + 0.0;
        Some(Self {
            min,
            max,
            interval: (max - min) / AXIS_DIVISIONS,
        })
    }

    pub fn label(&self) -> String {
        format!("{}-{}", self.min, self.max)
    }
}

/// Heights and the zone that keeps its time axis in the grid.
#[derive(Debug, Clone)]
pub struct PanelStyle {
    pub x_axis_zone: Option<String>,
    pub compact_height_px: u32,
    pub axis_height_px: u32,
    pub expanded_height_px: u32,
}

impl Default for PanelStyle {
    fn default() -> Self {
        Self {
            x_axis_zone: Some("GRS BACA".to_string()),
            compact_height_px: 50,
            axis_height_px: 150,
            expanded_height_px: 400,
        }
    }
}

/// One rendered zone: layout facts plus the option object for the charting widget.
#[derive(Debug, Clone, Serialize)]
pub struct ChartPanel {
    pub zone: String,
    pub color: String,
    pub expanded: bool,
    pub show_time_axis: bool,
    pub height_px: u32,
    pub bounds: Option<DisplayBounds>,
    pub option: ChartOption,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartOption {
    pub tooltip: Tooltip,
    pub grid: Grid,
    pub toolbox: Toolbox,
    pub legend: Legend,
    pub x_axis: Vec<Axis>,
    pub y_axis: Vec<Axis>,
    pub series: Vec<LineSeries>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Tooltip {
    pub trigger: &'static str,
    pub axis_pointer: AxisPointer,
}

#[derive(Debug, Clone, Serialize)]
pub struct AxisPointer {
    #[serde(rename = "type")]
    pub kind: &'static str,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Grid {
    pub height: u32,
    pub background_color: String,
    pub show: bool,
    pub top: u32,
    pub bottom: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct Toolbox {
    pub feature: ToolboxFeatures,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolboxFeatures {
    pub data_view: DataView,
    pub restore: Toggle,
    pub save_as_image: Toggle,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DataView {
    pub show: bool,
    pub read_only: bool,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct Toggle {
    pub show: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct Legend {
    pub data: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Axis {
    #[serde(rename = "type")]
    pub kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub show: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name_location: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name_rotate: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub align_ticks: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interval: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub axis_tick: Option<Toggle>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub axis_line: Option<Toggle>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub axis_label: Option<Toggle>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub split_line: Option<SplitLine>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SplitLine {
    pub show: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_style: Option<SplitLineStyle>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SplitLineStyle {
    pub color: &'static str,
    #[serde(rename = "type")]
    pub kind: &'static str,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LineSeries {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub y_axis_index: u32,
    pub smooth: bool,
    pub data: Vec<Option<f64>>,
    pub item_style: ItemStyle,
    pub line_style: LineStyle,
    pub area_style: AreaStyle,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemStyle {
    pub color: String,
    pub border_color: String,
    pub border_width: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct LineStyle {
    pub width: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct AreaStyle {
    pub color: String,
    pub opacity: f64,
}

/// Build the panel for one zone.
pub fn present(
    values: &[Option<f64>],
    labels: &[String],
    zone: &str,
    color: &str,
    expanded: bool,
    style: &PanelStyle,
) -> ChartPanel {
    let plotted: Vec<f64> = values.iter().flatten().copied().collect();
    let bounds = DisplayBounds::from_values(&plotted);
    let show_time_axis = expanded || style.x_axis_zone.as_deref() == Some(zone);
    let height_px = if expanded {
        style.expanded_height_px
    } else if show_time_axis {
        style.axis_height_px
    } else {
        style.compact_height_px
    };

    let time_axis = Axis {
        kind: "category",
        axis_tick: Some(Toggle { show: show_time_axis }),
        axis_line: Some(Toggle { show: show_time_axis }),
        axis_label: Some(Toggle { show: show_time_axis }),
        split_line: Some(SplitLine {
            show: false,
            line_style: None,
        }),
        data: Some(labels.to_vec()),
        ..Default::default()
    };

    let value_axis = Axis {
        kind: "value",
        show: Some(bounds.is_some()),
        name: Some(
            bounds
                .map(|b| b.label())
                .unwrap_or_else(|| UNAVAILABLE_LABEL.to_string()),
        ),
        position: Some("left"),
        name_location: Some("center"),
        name_rotate: Some(0),
        align_ticks: Some(true),
        min: bounds.map(|b| b.min),
        max: bounds.map(|b| b.max),
        interval: bounds.map(|b| b.interval),
        axis_tick: Some(Toggle { show: true }),
        axis_line: Some(Toggle { show: true }),
        axis_label: Some(Toggle { show: false }),
        split_line: Some(SplitLine {
            show: true,
            line_style: Some(SplitLineStyle {
                color: "#ccc",
                kind: "dotted",
            }),
        }),
        ..Default::default()
    };

    let name_axis = Axis {
        kind: "category",
        name: Some(zone.to_string()),
        position: Some("right"),
        name_location: Some("center"),
        name_rotate: Some(0),
        align_ticks: Some(true),
        axis_line: Some(Toggle { show: true }),
        ..Default::default()
    };

    let option = ChartOption {
        tooltip: Tooltip {
            trigger: "axis",
            axis_pointer: AxisPointer { kind: "cross" },
        },
        grid: Grid {
            height: style.compact_height_px,
            background_color: color.to_string(),
            show: true,
            top: 0,
            bottom: 0,
        },
        toolbox: Toolbox {
            feature: ToolboxFeatures {
                data_view: DataView {
                    show: true,
                    read_only: false,
                },
                restore: Toggle { show: true },
                save_as_image: Toggle { show: true },
            },
        },
        legend: Legend {
            data: vec![zone.to_string()],
        },
        x_axis: vec![time_axis],
        y_axis: vec![value_axis, name_axis],
        series: vec![LineSeries {
            name: zone.to_string(),
            kind: "line",
            y_axis_index: 0,
            smooth: true,
            data: values.to_vec(),
            item_style: ItemStyle {
                color: color.to_string(),
                border_color: color.to_string(),
                border_width: 2,
            },
            line_style: LineStyle { width: 2 },
            area_style: AreaStyle {
                color: color.to_string(),
                opacity: 0.3,
            },
        }],
    };

    ChartPanel {
        zone: zone.to_string(),
        color: color.to_string(),
        expanded,
        show_time_axis,
        height_px,
        bounds,
        option,
    }
}
