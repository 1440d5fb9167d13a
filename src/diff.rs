//! Financeiro x contabilidade difference computation.
//!
//! Outer-joins the two aggregated sides on the canonical code and
//! classifies each pair. The accounting value is the reference, so the
//! signed difference is `contabilidade - financeiro`.

use log::info;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::accounting::AccountingTotal;
use crate::financial::FinancialTotal;
use crate::schema::{Classification, DiffDirection};
use crate::TOLERANCE;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiffEntry {
    pub code: String,
    pub name: String,
    pub financial_value: f64,
    pub accounting_value: f64,
    pub difference: f64,
    pub difference_pct: f64,
    pub classification: Classification,
    pub direction: DiffDirection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiffSummary {
    pub total_registros: usize,
    pub registros_ambos: usize,
    pub registros_so_financeiro: usize,
    pub registros_so_contabilidade: usize,
    pub registros_com_diferenca: usize,
    pub registros_sem_diferenca: usize,
    pub diferenca_total: f64,
    pub diferenca_absoluta_total: f64,
    pub maior_diferenca: f64,
    pub valor_total_financeiro: f64,
    pub valor_total_contabilidade: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiffReport {
    pub entries: Vec<DiffEntry>,
    pub summary: DiffSummary,
}

fn direction(financial: f64, accounting: f64, difference: f64) -> DiffDirection {
    if financial == 0.0 || accounting == 0.0 {
        DiffDirection::Exclusivo
    } else if difference > 0.0 {
        DiffDirection::ContabilidadeMaior
    } else if difference < 0.0 {
        DiffDirection::FinanceiroMaior
    } else {
        DiffDirection::SemDiferenca
    }
}

/// Computes per-code differences. Entries come out sorted by absolute
/// difference, largest first, so divergences lead the report.
pub fn compute_differences(
    financial: &[FinancialTotal],
    accounting: &[AccountingTotal],
) -> DiffReport {
    let mut joined: BTreeMap<String, (Option<&FinancialTotal>, Option<&AccountingTotal>)> =
        BTreeMap::new();
    for f in financial {
        joined.entry(f.code.clone()).or_default().0 = Some(f);
    }
    for a in accounting {
        joined.entry(a.code.clone()).or_default().1 = Some(a);
    }

    let mut entries: Vec<DiffEntry> = joined
        .into_iter()
        .map(|(code, (f, a))| {
            let financial_value = f.map(|t| t.value).unwrap_or(0.0);
            let accounting_value = a.map(|t| t.value).unwrap_or(0.0);
            let difference = accounting_value - financial_value;
            let name = f
                .map(|t| t.name.clone())
                .filter(|n| !n.is_empty())
                .or_else(|| a.map(|t| t.name.clone()))
                .unwrap_or_default();
            DiffEntry {
                code,
                name,
                financial_value,
                accounting_value,
                difference,
                difference_pct: if financial_value == 0.0 {
                    0.0
                } else {
                    difference / financial_value * 100.0
                },
                classification: Classification::classify(financial_value, accounting_value, difference),
                direction: direction(financial_value, accounting_value, difference),
            }
        })
        .collect();

    entries.sort_by(|a, b| {
        b.difference
            .abs()
            .partial_cmp(&a.difference.abs())
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let summary = DiffSummary {
        total_registros: entries.len(),
        registros_ambos: entries
            .iter()
            .filter(|e| e.financial_value != 0.0 && e.accounting_value != 0.0)
            .count(),
        registros_so_financeiro: entries
            .iter()
            .filter(|e| e.classification == Classification::SoFinanceiro)
            .count(),
        registros_so_contabilidade: entries
            .iter()
            .filter(|e| e.classification == Classification::SoContabilidade)
            .count(),
        registros_com_diferenca: entries.iter().filter(|e| e.difference.abs() > TOLERANCE).count(),
        registros_sem_diferenca: entries.iter().filter(|e| e.difference.abs() <= TOLERANCE).count(),
        diferenca_total: entries.iter().map(|e| e.difference).sum(),
        diferenca_absoluta_total: entries.iter().map(|e| e.difference.abs()).sum(),
        maior_diferenca: entries.first().map(|e| e.difference.abs()).unwrap_or(0.0),
        valor_total_financeiro: entries.iter().map(|e| e.financial_value).sum(),
        valor_total_contabilidade: entries.iter().map(|e| e.accounting_value).sum(),
    };

    info!(
        "diferencas: {} codigos, {} com diferenca, total {:.2}",
        summary.total_registros, summary.registros_com_diferenca, summary.diferenca_total
    );

    DiffReport { entries, summary }
}
