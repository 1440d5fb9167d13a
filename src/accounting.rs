//! Filtered accounting ledger (balancete) normalizer.
//!
//! The balancete layout repeats the `Código`/`Descrição` pair: the first
//! occurrence is the chart-of-accounts entry, the second is the entity this
//! engine reconciles. A single occurrence is used as-is.

use log::info;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::code::{normalize_account_code, CodePrefix};
use crate::columns;
use crate::error::{ReconError, Result};
use crate::parsing;
use crate::table::Table;

/// Per-code aggregate of balancete balances.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountingTotal {
    pub code: String,
    pub name: String,
    pub value: f64,
}

/// Normalizes a balancete into per-code totals. Codes are aligned with the
/// financial side's convention; rows without a resolvable code are dropped,
/// unparseable balances count as zero.
pub fn normalize_accounting(table: &Table, prefix: CodePrefix) -> Result<Vec<AccountingTotal>> {
    let code_col = columns::resolve_occurrence(table, "codigo", 1);
    let name_col = columns::resolve_occurrence(table, "descricao", 1);
    let value_col = columns::resolve_occurrence(table, "saldo_atual", 0);

    let code_col = code_col.ok_or_else(|| ReconError::Layout {
        field: "Código".to_string(),
        columns: table.columns().to_vec(),
    })?;
    let value_col = value_col.ok_or_else(|| ReconError::Layout {
        field: "Saldo atual".to_string(),
        columns: table.columns().to_vec(),
    })?;

    let mut totals: BTreeMap<String, AccountingTotal> = BTreeMap::new();
    for row in table.rows() {
        let raw_code = parsing::cell_to_string(table.cell(row, code_col));
        let code = normalize_account_code(&raw_code, prefix);
        if code.is_empty() {
            continue;
        }

        let value = parsing::parse_brazilian_number_or_zero(table.cell(row, value_col));
        let name = name_col
            .map(|idx| parsing::cell_to_string(table.cell(row, idx)))
            .unwrap_or_default();

        let total = totals.entry(code.clone()).or_insert_with(|| AccountingTotal {
            code,
            name,
            value: 0.0,
        });
        total.value += value;
    }

    let result: Vec<AccountingTotal> = totals.into_values().collect();
    info!(
        "contabilidade normalizada: {} códigos, total {:.2}",
        result.len(),
        result.iter().map(|t| t.value).sum::<f64>()
    );
    Ok(result)
}
