pub mod catalog;
pub mod normalize;

use log::{info, warn};
use polars::prelude::*;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DataError {
    #[error("Failed to read catalog file: {0}")]
    FileReadError(#[from] std::io::Error),
    #[error("Failed to read or parse CSV file: {0}")]
    CsvError(#[from] PolarsError),
    #[error("Failed to parse JSON catalog: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("CSV file is missing required columns: '{0}'")]
    MissingColumns(String),
    #[error("Invalid category id {id} at row {row} (expected 1-8)")]
    InvalidCategory { row: usize, id: i64 },
    #[error("Invalid component at row {row}: {reason}")]
    ValidationError { row: usize, reason: String },
    #[error("Found {count} null values in required columns")]
    NullDataError { count: usize },
    #[error("Unsupported catalog format: '{0}' (expected .csv or .json)")]
    UnsupportedFormat(String),
}

/// The eight hardware categories a complete build needs, keyed by their catalog id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Category {
    Cpu = 1,
    Motherboard = 2,
    Gpu = 3,
    Ram = 4,
    Storage = 5,
    PowerSupply = 6,
    Casing = 7,
    FanCpu = 8,
}

impl Category {
    /// Every category, in slot order.
    pub const ALL: [Category; 8] = [
        Category::Cpu,
        Category::Motherboard,
        Category::Gpu,
        Category::Ram,
        Category::Storage,
        Category::PowerSupply,
        Category::Casing,
        Category::FanCpu,
    ];

    /// Catalog id (1-based).
    pub fn id(self) -> u8 {
        self as u8
    }

    /// Zero-based slot position, used to index fixed-size per-category arrays.
    pub fn index(self) -> usize {
        self as usize - 1
    }

    pub fn name(self) -> &'static str {
        match self {
            Category::Cpu => "CPU",
            Category::Motherboard => "Motherboard",
            Category::Gpu => "GPU",
            Category::Ram => "RAM",
            Category::Storage => "Storage",
            Category::PowerSupply => "Power Supply",
            Category::Casing => "Casing",
            Category::FanCpu => "Fan CPU",
        }
    }
}

impl TryFrom<u8> for Category {
    type Error = String;

    fn try_from(id: u8) -> Result<Self, Self::Error> {
        Category::ALL
            .iter()
            .copied()
            .find(|c| c.id() == id)
            .ok_or_else(|| format!("unknown category id {} (expected 1-8)", id))
    }
}

impl From<Category> for u8 {
    fn from(category: Category) -> Self {
        category.id()
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single catalog entry.
///
/// `performance` is the raw benchmark score as supplied by the catalog; the
/// compatibility balance rule reads it. `normalized_performance` is filled in by
/// [`normalize::min_max_normalize`] and is what the fitness function sums.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Component {
    #[serde(default, alias = "nama_komponen", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(alias = "id_kategori")]
    pub category: Category,
    #[serde(alias = "harga_komponen")]
    pub price: f64,
    #[serde(alias = "performa_komponen")]
    pub performance: f64,
    #[serde(default)]
    pub normalized_performance: f64,
    #[serde(
        default,
        alias = "soket_komponen",
        deserialize_with = "socket_from_any",
        skip_serializing_if = "Option::is_none"
    )]
    pub socket: Option<String>,
    #[serde(default, alias = "daya_komponen", skip_serializing_if = "Option::is_none")]
    pub power: Option<f64>,
    /// Any other fields of the inbound record, echoed back untouched.
    #[serde(flatten)]
    pub attributes: BTreeMap<String, Value>,
}

impl Component {
    pub fn new(category: Category, price: f64, performance: f64) -> Self {
        Self {
            name: None,
            category,
            price,
            performance,
            normalized_performance: 0.0,
            socket: None,
            power: None,
            attributes: BTreeMap::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_socket(mut self, socket: impl Into<String>) -> Self {
        self.socket = Some(socket.into());
        self
    }

    pub fn with_power(mut self, power: f64) -> Self {
        self.power = Some(power);
        self
    }

    pub fn with_normalized_performance(mut self, score: f64) -> Self {
        self.normalized_performance = score;
        self
    }

    /// Checks the record carries what the optimizer needs for its category.
    pub fn validate(&self) -> Result<(), String> {
        if !self.price.is_finite() || self.price < 0.0 {
            return Err(format!("Price ({}) must be finite and non-negative", self.price));
        }
        if !self.performance.is_finite() {
            return Err(format!("Invalid performance value: {}", self.performance));
        }
        if !self.normalized_performance.is_finite() {
            return Err(format!(
                "Invalid normalized performance value: {}",
                self.normalized_performance
            ));
        }

        let needs_socket = matches!(self.category, Category::Cpu | Category::Motherboard);
        if needs_socket && self.socket.as_deref().map_or(true, |s| s.trim().is_empty()) {
            return Err(format!("{} component has no socket identifier", self.category));
        }

        let needs_power = matches!(
            self.category,
            Category::Cpu | Category::Gpu | Category::PowerSupply
        );
        match self.power {
            Some(p) if !p.is_finite() || p < 0.0 => {
                return Err(format!("Power ({}) must be finite and non-negative", p));
            }
            None if needs_power => {
                return Err(format!("{} component has no power figure", self.category));
            }
            _ => {}
        }

        Ok(())
    }
}

/// Sockets show up both as strings ("AM5") and as bare numbers (1700).
fn socket_from_any<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(serde::de::Error::custom(format!(
            "invalid socket identifier: {}",
            other
        ))),
    }
}

/// Components read from disk, plus the budget when the source carried one.
#[derive(Debug, Clone, Default)]
pub struct LoadedCatalog {
    pub components: Vec<Component>,
    pub budget: Option<f64>,
}

/// Loads a catalog, picking the reader from the file extension.
pub fn load_catalog(file_path: &Path) -> Result<LoadedCatalog, DataError> {
    let extension = file_path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    let loaded = match extension.as_str() {
        "json" => parse_json(&fs::read_to_string(file_path)?)?,
        "csv" => LoadedCatalog {
            components: load_csv(file_path)?,
            budget: None,
        },
        _ => return Err(DataError::UnsupportedFormat(file_path.display().to_string())),
    };

    info!(
        "Loaded {} components from '{}'",
        loaded.components.len(),
        file_path.display()
    );
    Ok(loaded)
}

/// Parses either a bare array of components or a request-style object
/// `{ "budget": .., "komponen": [..] }`.
pub fn parse_json(content: &str) -> Result<LoadedCatalog, DataError> {
    let value: Value = serde_json::from_str(content)?;
    match value {
        Value::Array(records) => Ok(LoadedCatalog {
            components: serde_json::from_value(Value::Array(records))?,
            budget: None,
        }),
        Value::Object(mut map) => {
            let records = map
                .remove("komponen")
                .or_else(|| map.remove("components"))
                .ok_or_else(|| DataError::MissingColumns("komponen/components".to_string()))?;
            let budget = match map.remove("budget") {
                Some(raw) => Some(parse_budget(&raw)?),
                None => None,
            };
            Ok(LoadedCatalog {
                components: serde_json::from_value(records)?,
                budget,
            })
        }
        other => Err(DataError::ValidationError {
            row: 0,
            reason: format!("expected an array or object at the top level, found {}", other),
        }),
    }
}

fn parse_budget(raw: &Value) -> Result<f64, DataError> {
    let budget = match raw {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match budget {
        Some(b) if b.is_finite() && b >= 0.0 => Ok(b),
        _ => Err(DataError::ValidationError {
            row: 0,
            reason: format!("budget must be a non-negative number, got {}", raw),
        }),
    }
}

/// Resolved column names of a catalog CSV.
struct CatalogColumns {
    category: String,
    price: String,
    performance: String,
    socket: Option<String>,
    power: Option<String>,
    name: Option<String>,
}

fn find_column(columns: &[String], candidates: &[&str]) -> Option<String> {
    candidates
        .iter()
        .find(|&&col| columns.iter().any(|c| c == col))
        .map(|s| s.to_string())
}

/// Detects the column mapping for the CSV file
fn detect_columns(df: &DataFrame) -> Result<CatalogColumns, DataError> {
    let columns: Vec<String> = df
        .get_column_names()
        .iter()
        .map(|s| s.to_string())
        .collect();

    let category = find_column(&columns, &["category", "category_id", "id_kategori"])
        .ok_or_else(|| DataError::MissingColumns("category/id_kategori column".to_string()))?;
    let price = find_column(&columns, &["price", "harga_komponen"])
        .ok_or_else(|| DataError::MissingColumns("price/harga_komponen column".to_string()))?;
    let performance = find_column(&columns, &["performance", "performa_komponen"]).ok_or_else(
        || DataError::MissingColumns("performance/performa_komponen column".to_string()),
    )?;

    Ok(CatalogColumns {
        category,
        price,
        performance,
        socket: find_column(&columns, &["socket", "soket_komponen"]),
        power: find_column(&columns, &["power", "daya_komponen"]),
        name: find_column(&columns, &["name", "nama_komponen"]),
    })
}

/// Loads catalog components from a CSV file.
pub fn load_csv(file_path: &Path) -> Result<Vec<Component>, DataError> {
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .try_into_reader_with_file_path(Some(file_path.into()))?
        .finish()?;

    let columns = detect_columns(&df)?;

    let category_binding = df.column(&columns.category)?.cast(&DataType::Int64)?;
    let categories = category_binding.i64()?;
    let price_binding = df.column(&columns.price)?.cast(&DataType::Float64)?;
    let prices = price_binding.f64()?;
    let performance_binding = df.column(&columns.performance)?.cast(&DataType::Float64)?;
    let performances = performance_binding.f64()?;

    let null_count = categories.null_count() + prices.null_count() + performances.null_count();
    if null_count > 0 {
        return Err(DataError::NullDataError { count: null_count });
    }

    let socket_binding = match &columns.socket {
        Some(col) => Some(df.column(col)?.cast(&DataType::String)?),
        None => None,
    };
    let sockets = socket_binding.as_ref().map(|c| c.str()).transpose()?;
    let power_binding = match &columns.power {
        Some(col) => Some(df.column(col)?.cast(&DataType::Float64)?),
        None => None,
    };
    let powers = power_binding.as_ref().map(|c| c.f64()).transpose()?;
    let name_binding = match &columns.name {
        Some(col) => Some(df.column(col)?.cast(&DataType::String)?),
        None => None,
    };
    let names = name_binding.as_ref().map(|c| c.str()).transpose()?;

    let mut components = Vec::with_capacity(df.height());
    for row in 0..df.height() {
        let raw_category = categories.get(row).unwrap_or_default();
        let category = u8::try_from(raw_category)
            .ok()
            .and_then(|id| Category::try_from(id).ok())
            .ok_or(DataError::InvalidCategory {
                row,
                id: raw_category,
            })?;

        let mut component = Component::new(
            category,
            prices.get(row).unwrap_or_default(),
            performances.get(row).unwrap_or_default(),
        );
        component.socket = sockets
            .and_then(|s| s.get(row))
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
        component.power = powers.and_then(|p| p.get(row));
        component.name = names.and_then(|n| n.get(row)).map(str::to_string);

        components.push(component);
    }

    if components.is_empty() {
        warn!("Catalog '{}' contains no components", file_path.display());
    }

    Ok(components)
}
