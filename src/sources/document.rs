//! The structured form of a workbook, as produced by a converter.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::config::ConverterSettings;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StructuredDocument {
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub sheets: Vec<Sheet>,
}

impl StructuredDocument {
    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|sheet| sheet.name == name)
    }

    pub fn cell_count(&self) -> usize {
        self.sheets.iter().map(|sheet| sheet.cells.len()).sum()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Sheet {
    pub name: String,
    #[serde(default)]
    pub index: usize,
    /// Keyed by A1-style address.
    #[serde(default)]
    pub cells: BTreeMap<String, Cell>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    #[serde(default)]
    pub value: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formula: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<Value>,
    #[serde(default, rename = "type")]
    pub cell_type: String,
}

impl Cell {
    pub fn with_value(value: impl Into<Value>) -> Self {
        Self {
            value: value.into(),
            ..Self::default()
        }
    }

    /// No value and no formula. Style or comment alone don't count.
    pub fn is_empty(&self) -> bool {
        let blank = match &self.value {
            Value::Null => true,
            Value::String(s) => s.is_empty(),
            _ => false,
        };
        blank && self.formula.as_deref().is_none_or(str::is_empty)
    }
}

/// What a converter keeps when it loads a workbook.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConvertOptions {
    pub preserve_formulas: bool,
    pub preserve_styles: bool,
    pub preserve_comments: bool,
    pub ignore_empty_cells: bool,
}

impl ConvertOptions {
    /// Everything kept, including empty cells, so a diff sees every difference.
    pub fn for_comparison() -> Self {
        Self {
            preserve_formulas: true,
            preserve_styles: true,
            preserve_comments: true,
            ignore_empty_cells: false,
        }
    }
}

impl From<&ConverterSettings> for ConvertOptions {
    fn from(settings: &ConverterSettings) -> Self {
        Self {
            preserve_formulas: settings.preserve_formulas,
            preserve_styles: settings.preserve_styles,
            preserve_comments: settings.preserve_comments,
            ignore_empty_cells: settings.ignore_empty_cells,
        }
    }
}

impl ConvertOptions {
    /// Strip whatever these options don't preserve, in place.
    pub fn apply(&self, document: &mut StructuredDocument) {
        for sheet in &mut document.sheets {
            if self.ignore_empty_cells {
                sheet.cells.retain(|_, cell| !cell.is_empty());
            }
            for cell in sheet.cells.values_mut() {
                if !self.preserve_formulas {
                    cell.formula = None;
                }
                if !self.preserve_styles {
                    cell.style = None;
                }
                if !self.preserve_comments {
                    cell.comment = None;
                }
            }
        }
    }
}
