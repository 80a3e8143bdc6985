//! # Structural Diff
//!
//! Sheet-by-name, cell-by-address comparison of two structured documents.
//!
//! Sheets keep the order of the old document, with sheets that only exist in
//! the new one appended in their own order. Changes within a sheet are ordered
//! by row, then column (`A2` before `A10`, `Z1` before `AA1`).

use std::collections::BTreeSet;
use std::fmt;

use serde::Serialize;
use serde_json::Value;

use super::document::{Cell, Sheet, StructuredDocument};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Add,
    Modify,
    Delete,
}

impl ChangeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ChangeKind::Add => "add",
            ChangeKind::Modify => "modify",
            ChangeKind::Delete => "delete",
        }
    }

    pub fn symbol(self) -> char {
        match self {
            ChangeKind::Add => '+',
            ChangeKind::Modify => '~',
            ChangeKind::Delete => '-',
        }
    }
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SheetAction {
    Added,
    Modified,
    Deleted,
}

impl SheetAction {
    /// The per-cell change kind this sheet action corresponds to.
    pub fn change_kind(self) -> ChangeKind {
        match self {
            SheetAction::Added => ChangeKind::Add,
            SheetAction::Modified => ChangeKind::Modify,
            SheetAction::Deleted => ChangeKind::Delete,
        }
    }
}

impl fmt::Display for SheetAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SheetAction::Added => "added",
            SheetAction::Modified => "modified",
            SheetAction::Deleted => "deleted",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CellChange {
    pub cell: String,
    pub kind: ChangeKind,
    pub old_value: Option<Value>,
    pub new_value: Option<Value>,
    pub old_formula: Option<String>,
    pub new_formula: Option<String>,
    pub style_changed: bool,
    pub comment_changed: bool,
}

impl CellChange {
    fn between(address: &str, old: Option<&Cell>, new: Option<&Cell>) -> Option<Self> {
        let kind = match (old, new) {
            (None, None) => return None,
            (None, Some(_)) => ChangeKind::Add,
            (Some(_), None) => ChangeKind::Delete,
            (Some(a), Some(b)) if a == b => return None,
            (Some(_), Some(_)) => ChangeKind::Modify,
        };
        let style = |cell: Option<&Cell>| cell.and_then(|c| c.style.clone());
        let comment = |cell: Option<&Cell>| cell.and_then(|c| c.comment.clone());
        Some(Self {
            cell: address.to_string(),
            kind,
            old_value: old.map(|c| c.value.clone()).filter(|v| !v.is_null()),
            new_value: new.map(|c| c.value.clone()).filter(|v| !v.is_null()),
            old_formula: old.and_then(|c| c.formula.clone()),
            new_formula: new.and_then(|c| c.formula.clone()),
            style_changed: style(old) != style(new),
            comment_changed: comment(old) != comment(new),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SheetDiff {
    pub sheet_name: String,
    pub action: SheetAction,
    pub changes: Vec<CellChange>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DiffSummary {
    /// Cell changes plus sheets added or deleted.
    pub total_changes: usize,
    pub cell_changes: usize,
    pub added_sheets: usize,
    pub modified_sheets: usize,
    pub deleted_sheets: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DocumentDiff {
    pub summary: DiffSummary,
    pub sheet_diffs: Vec<SheetDiff>,
}

impl DocumentDiff {
    pub fn new(sheet_diffs: Vec<SheetDiff>) -> Self {
        let mut summary = DiffSummary::default();
        for sheet in &sheet_diffs {
            summary.cell_changes += sheet.changes.len();
            match sheet.action {
                SheetAction::Added => summary.added_sheets += 1,
                SheetAction::Modified => summary.modified_sheets += 1,
                SheetAction::Deleted => summary.deleted_sheets += 1,
            }
        }
        summary.total_changes = summary.cell_changes + summary.added_sheets + summary.deleted_sheets;
        Self { summary, sheet_diffs }
    }

    pub fn has_changes(&self) -> bool {
        self.summary.total_changes > 0
    }

    /// Every cell change across all sheets, paired with its sheet name.
    pub fn changes(&self) -> impl Iterator<Item = (&str, &CellChange)> {
        self.sheet_diffs.iter().flat_map(|sheet| {
            sheet
                .changes
                .iter()
                .map(move |change| (sheet.sheet_name.as_str(), change))
        })
    }

    pub fn change_count(&self) -> usize {
        self.summary.cell_changes
    }
}

/// Computes the structural difference between two documents.
pub trait DiffEngine: Send + Sync {
    fn compute(&self, old: &StructuredDocument, new: &StructuredDocument) -> DocumentDiff;
}

/// Compares sheets by name and cells by address.
#[derive(Debug, Clone, Copy, Default)]
pub struct CellDiffEngine;

impl DiffEngine for CellDiffEngine {
    fn compute(&self, old: &StructuredDocument, new: &StructuredDocument) -> DocumentDiff {
        let mut sheet_diffs = Vec::new();

        for old_sheet in &old.sheets {
            match new.sheet(&old_sheet.name) {
                Some(new_sheet) => {
                    let changes = compare_cells(Some(old_sheet), Some(new_sheet));
                    if !changes.is_empty() {
                        sheet_diffs.push(SheetDiff {
                            sheet_name: old_sheet.name.clone(),
                            action: SheetAction::Modified,
                            changes,
                        });
                    }
                }
                None => sheet_diffs.push(SheetDiff {
                    sheet_name: old_sheet.name.clone(),
                    action: SheetAction::Deleted,
                    changes: compare_cells(Some(old_sheet), None),
                }),
            }
        }

        for new_sheet in &new.sheets {
            if old.sheet(&new_sheet.name).is_none() {
                sheet_diffs.push(SheetDiff {
                    sheet_name: new_sheet.name.clone(),
                    action: SheetAction::Added,
                    changes: compare_cells(None, Some(new_sheet)),
                });
            }
        }

        DocumentDiff::new(sheet_diffs)
    }
}

fn compare_cells(old: Option<&Sheet>, new: Option<&Sheet>) -> Vec<CellChange> {
    let addresses: BTreeSet<&str> = old
        .into_iter()
        .chain(new)
        .flat_map(|sheet| sheet.cells.keys().map(String::as_str))
        .collect();

    let mut changes: Vec<CellChange> = addresses
        .into_iter()
        .filter_map(|address| {
            CellChange::between(
                address,
                old.and_then(|s| s.cells.get(address)),
                new.and_then(|s| s.cells.get(address)),
            )
        })
        .collect();
    changes.sort_by_key(|change| address_order(&change.cell));
    changes
}

/// `(row, column, address)` so `A2` sorts before `A10`. Malformed addresses
/// sort last, alphabetically.
fn address_order(address: &str) -> (u32, u32, String) {
    let split = address
        .find(|c: char| c.is_ascii_digit())
        .unwrap_or(address.len());
    let (letters, digits) = address.split_at(split);
    let column = letters.chars().try_fold(0u32, |acc, c| {
        if !c.is_ascii_alphabetic() {
            return None;
        }
        acc.checked_mul(26)?
            .checked_add(c.to_ascii_uppercase() as u32 - 'A' as u32 + 1)
    });
    match (column, digits.parse::<u32>()) {
        (Some(column), Ok(row)) if column > 0 => (row, column, String::new()),
        _ => (u32::MAX, u32::MAX, address.to_string()),
    }
}
