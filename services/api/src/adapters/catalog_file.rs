//! services/api/src/adapters/catalog_file.rs
//!
//! Loads the local food catalog (a Ciqual-style composition table) from the
//! configured data directory. Implements the `CatalogLoader` port.
//!
//! Lookup order is `catalog.json`, `catalog.xlsx`, `catalog.xls`, then
//! `catalog.csv`. Without any of them a small built-in sample is served.

use async_trait::async_trait;
use nutrilog_core::{
    domain::{FoodReference, FoodSource, Per100g},
    ports::{CatalogLoader, PortError, PortResult},
};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub struct FileCatalogLoader {
    data_dir: PathBuf,
}

impl FileCatalogLoader {
    pub fn new(data_dir: PathBuf) -> Self {
        Self { data_dir }
    }
}

#[async_trait]
impl CatalogLoader for FileCatalogLoader {
    async fn load(&self) -> PortResult<Vec<FoodReference>> {
        let json = self.data_dir.join("catalog.json");
        let xlsx = self.data_dir.join("catalog.xlsx");
        let xls = self.data_dir.join("catalog.xls");
        let csv = self.data_dir.join("catalog.csv");

        let foods = if json.exists() {
            info!("Loading food catalog from {}", json.display());
            let content = tokio::fs::read_to_string(&json).await.map_err(io_error)?;
            parse_json(&content)?
        } else if xlsx.exists() || xls.exists() {
            let path = if xlsx.exists() { xlsx } else { xls };
            info!("Loading food catalog from {}", path.display());
            tokio::task::spawn_blocking(move || read_spreadsheet(&path))
                .await
                .map_err(|e| PortError::Unexpected(e.to_string()))??
        } else if csv.exists() {
            info!("Loading food catalog from {}", csv.display());
            let content = tokio::fs::read_to_string(&csv).await.map_err(io_error)?;
            parse_csv(&content)
        } else {
            warn!(
                "No catalog file found in {}, serving the built-in sample",
                self.data_dir.display()
            );
            sample_foods()
        };

        Ok(foods)
    }
}

fn io_error(e: std::io::Error) -> PortError {
    PortError::Unexpected(format!("Failed to read the food catalog: {}", e))
}

/// Parses a composition value. Decimal commas are accepted; anything that is
/// not a number ("traces", "-", "< 0,5") counts as zero.
pub fn parse_amount(raw: &str) -> f64 {
    raw.trim().replace(',', ".").parse::<f64>().unwrap_or(0.0)
}

//=========================================================================================
// JSON
//=========================================================================================

fn first_field<'a>(item: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|key| item.get(*key))
        .find(|v| !v.is_null() && v.as_str() != Some(""))
}

fn value_text(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

fn value_amount(value: Option<&Value>) -> f64 {
    match value {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => parse_amount(s),
        _ => 0.0,
    }
}

/// Accepts an array of objects using either English or Ciqual field names.
pub fn parse_json(content: &str) -> PortResult<Vec<FoodReference>> {
    let data: Value = serde_json::from_str(content)
        .map_err(|e| PortError::Unexpected(format!("Catalog JSON is malformed: {}", e)))?;
    let Some(items) = data.as_array() else {
        return Ok(Vec::new());
    };

    Ok(items
        .iter()
        .filter_map(|item| {
            let code = value_text(first_field(item, &["code", "alim_code", "id"]));
            let name = value_text(first_field(item, &["name", "alim_nom_fr", "libelle"]));
            if code.is_empty() || name.is_empty() {
                return None;
            }
            let brand = value_text(first_field(item, &["brand", "marque"]));
            Some(FoodReference {
                source: FoodSource::Catalog,
                external_id: code,
                name,
                brand: (!brand.is_empty()).then_some(brand),
                per_100g: Per100g {
                    kcal: value_amount(first_field(item, &["kcal100g", "energie_kcal_100g"])),
                    protein: value_amount(first_field(item, &["protein100g", "proteines_100g"])),
                    carbs: value_amount(first_field(item, &["carbs100g", "glucides_100g"])),
                    fat: value_amount(first_field(item, &["fat100g", "lipides_100g"])),
                    sugar: first_field(item, &["sugar100g", "sucres_100g"])
                        .map(|v| value_amount(Some(v))),
                    fiber: first_field(item, &["fiber100g", "fibres_100g"])
                        .map(|v| value_amount(Some(v))),
                },
            })
        })
        .collect())
}

//=========================================================================================
// Tabular Formats (CSV and spreadsheets)
//=========================================================================================

/// Column positions detected from a header row.
#[derive(Debug, Default, PartialEq)]
struct Columns {
    code: Option<usize>,
    name: Option<usize>,
    kcal: Option<usize>,
    protein: Option<usize>,
    carbs: Option<usize>,
    fat: Option<usize>,
    sugar: Option<usize>,
    fiber: Option<usize>,
}

fn find_column(header: &[String], fragments: &[&str]) -> Option<usize> {
    fragments
        .iter()
        .find_map(|fragment| header.iter().position(|h| h.contains(fragment)))
}

impl Columns {
    fn detect(header: &[String]) -> Self {
        let header: Vec<String> = header.iter().map(|h| h.trim().to_lowercase()).collect();
        // The energy column must be the kcal one, never kJ.
        let kcal = header
            .iter()
            .position(|h| h.contains("kcal"))
            .or_else(|| {
                header
                    .iter()
                    .position(|h| (h.contains("energie") || h.contains("energy")) && !h.contains("kj"))
            });

        Self {
            code: find_column(&header, &["alim_code", "code"]),
            name: find_column(&header, &["alim_nom_fr", "nom", "libelle", "name"]),
            kcal,
            protein: find_column(&header, &["protéines", "proteines", "protein"]),
            carbs: find_column(&header, &["glucides", "glucide", "carb"]),
            fat: find_column(&header, &["lipides", "lipide", "fat"]),
            sugar: find_column(&header, &["sucres", "sugar"]),
            fiber: find_column(&header, &["fibres", "fiber"]),
        }
    }
}

fn foods_from_rows(header: &[String], rows: impl Iterator<Item = Vec<String>>) -> Vec<FoodReference> {
    let columns = Columns::detect(header);
    let (Some(code_idx), Some(name_idx)) = (columns.code, columns.name) else {
        warn!("Catalog header has no code/name columns: {:?}", header);
        return Vec::new();
    };
    if columns.kcal.is_none() {
        warn!("Catalog header has no kcal column; energy values will be zero");
    }

    let cell = |row: &[String], idx: Option<usize>| -> Option<String> {
        idx.and_then(|i| row.get(i)).map(|s| s.trim().to_string())
    };
    let amount = |row: &[String], idx: Option<usize>| -> f64 {
        cell(row, idx).map(|s| parse_amount(&s)).unwrap_or(0.0)
    };

    rows.filter_map(|row| {
        let row = row.as_slice();
        let code = cell(row, Some(code_idx)).unwrap_or_default();
        let name = cell(row, Some(name_idx)).unwrap_or_default();
        if code.is_empty() || name.is_empty() || code.eq_ignore_ascii_case("alim_code") {
            return None;
        }
        Some(FoodReference {
            source: FoodSource::Catalog,
            external_id: code,
            name,
            brand: None,
            per_100g: Per100g {
                kcal: amount(row, columns.kcal),
                protein: amount(row, columns.protein),
                carbs: amount(row, columns.carbs),
                fat: amount(row, columns.fat),
                sugar: columns.sugar.map(|_| amount(row, columns.sugar)),
                fiber: columns.fiber.map(|_| amount(row, columns.fiber)),
            },
        })
    })
    .collect()
}

/// Parses a `;`-separated table whose first non-blank line is the header.
pub fn parse_csv(content: &str) -> Vec<FoodReference> {
    let split = |line: &str| -> Vec<String> { line.split(';').map(|c| c.trim().to_string()).collect() };
    let mut lines = content.lines().filter(|line| !line.trim().is_empty());
    let Some(header) = lines.next() else {
        return Vec::new();
    };
    foods_from_rows(&split(header), lines.map(split))
}

fn cell_to_string(cell: &calamine::Data) -> String {
    use calamine::Data;
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Int(n) => n.to_string(),
        Data::Float(f) => format!("{}", f),
        Data::Bool(b) => b.to_string(),
        Data::Error(e) => format!("#ERR({:?})", e),
        Data::DateTime(dt) => format!("{}", dt),
        Data::DateTimeIso(s) => s.clone(),
        Data::DurationIso(s) => s.clone(),
    }
}

/// Reads the first sheet of an `.xlsx`/`.xls` workbook.
fn read_spreadsheet(path: &Path) -> PortResult<Vec<FoodReference>> {
    use calamine::{open_workbook_auto, Reader};

    let mut workbook = open_workbook_auto(path)
        .map_err(|e| PortError::Unexpected(format!("Catalog spreadsheet unreadable: {}", e)))?;
    let Some(sheet_name) = workbook.sheet_names().first().cloned() else {
        return Ok(Vec::new());
    };
    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| PortError::Unexpected(format!("Catalog sheet unreadable: {}", e)))?;

    let mut rows = range
        .rows()
        .map(|row| row.iter().map(cell_to_string).collect::<Vec<String>>());
    let Some(header) = rows.next() else {
        return Ok(Vec::new());
    };
    Ok(foods_from_rows(&header, rows))
}

//=========================================================================================
// Built-in Sample
//=========================================================================================

pub fn sample_foods() -> Vec<FoodReference> {
    let food = |code: &str, name: &str, kcal, protein, carbs, fat| FoodReference {
        source: FoodSource::Catalog,
        external_id: code.to_string(),
        name: name.to_string(),
        brand: None,
        per_100g: Per100g {
            kcal,
            protein,
            carbs,
            fat,
            sugar: None,
            fiber: None,
        },
    };
    vec![
        food("1001", "Chicken breast, cooked", 165.0, 31.0, 0.0, 3.6),
        food("1002", "White rice, cooked", 130.0, 2.7, 28.0, 0.3),
    ]
}
