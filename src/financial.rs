//! Origin (financial ledger) normalizer.
//!
//! Receivables and payables reports share one pipeline; the differences
//! between them are pure configuration: the code prefix and the candidate
//! column lists for each logical field. A [`LedgerProfile`] captures that
//! configuration, with [`LedgerProfile::receivables`] and
//! [`LedgerProfile::payables`] documenting the two Protheus layouts the
//! engine ships support for.

use chrono::NaiveDate;
use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::code::{canonical_code, display_name, CodePrefix};
use crate::columns;
use crate::error::{ReconError, Result};
use crate::parsing;
use crate::table::Table;

/// Days overdue above which a receivable or payable is long-term.
pub const LONG_TERM_DAYS: i64 = 365;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Term {
    #[serde(rename = "CURTO PRAZO")]
    CurtoPrazo,
    #[serde(rename = "LONGO PRAZO")]
    LongoPrazo,
}

impl Term {
    pub fn classify(days_overdue: Option<i64>) -> Self {
        match days_overdue {
            Some(days) if days > LONG_TERM_DAYS => Term::LongoPrazo,
            _ => Term::CurtoPrazo,
        }
    }
}

/// Column mapping for one financial report layout.
#[derive(Debug, Clone)]
pub struct LedgerProfile {
    pub prefix: CodePrefix,
    pub entity: &'static [&'static str],
    pub overdue_value: &'static [&'static str],
    pub outstanding_value: &'static [&'static str],
    pub single_value: &'static [&'static str],
    pub due_date: &'static [&'static str],
    pub issue_date: &'static [&'static str],
    pub document: &'static [&'static str],
    pub installment: &'static [&'static str],
    pub overdue_substrings: &'static [&'static [&'static str]],
    pub outstanding_substrings: &'static [&'static [&'static str]],
}

impl LedgerProfile {
    /// Contas a receber (customers, prefix `C`).
    pub fn receivables() -> Self {
        LedgerProfile {
            prefix: CodePrefix::Customer,
            entity: &[
                "codigo_lj_nome_do_cliente",
                "codigo_lj_nome_cliente",
                "cliente",
                "nome_cliente",
                "cod_cliente",
                "codigo_cliente",
            ],
            overdue_value: &[
                "tit_vencidos_valor_corrigido",
                "tit_vencidos_valor_atual",
                "titulos_vencidos_valor_corrigido",
                "titulos_vencidos_valor_atual",
                "valor_vencido",
                "vencido",
            ],
            outstanding_value: &[
                "titulos_a_vencer_valor_atual",
                "tit_a_vencer_valor_atual",
                "titulos_a_vencer_valor_corrigido",
                "valor_a_vencer",
                "a_vencer",
            ],
            single_value: &["valor_corrigido", "valor_total", "valor", "saldo", "saldo_devedor"],
            due_date: &[
                "vencto_real",
                "venctoreal",
                "vencto_titulo",
                "venctotitulo",
                "vencto_orig",
                "vencimento_real",
                "vencimento_titulo",
                "vencimento_orig",
                "data_vencimento",
                "vencimento",
                "dt_vencimento",
            ],
            issue_date: &["data_de_emissao", "data_emissao", "dt_emissao", "emissao"],
            document: &[
                "prf_numero",
                "prf_num",
                "numero_titulo",
                "num_titulo",
                "numero_documento",
                "documento",
            ],
            installment: &["parcela", "num_parcela", "parcela_num"],
            overdue_substrings: &[
                &["tit", "vencidos", "valor", "corrigido"],
                &["tit", "venc", "valor", "corrig"],
                &["titulos", "vencidos", "valor"],
                &["valor", "vencido"],
            ],
            outstanding_substrings: &[
                &["titulos", "a_vencer", "valor", "atual"],
                &["tit", "a_vencer", "valor", "atual"],
                &["titulos", "a_vencer", "valor"],
                &["valor", "a_vencer"],
            ],
        }
    }

    /// Contas a pagar (suppliers, prefix `F`).
    pub fn payables() -> Self {
        LedgerProfile {
            prefix: CodePrefix::Supplier,
            entity: &[
                "codigo_nome_do_fornecedor",
                "codigo_nome_fornecedor",
                "codigo_lj_nome_do_fornecedor",
                "codigo_lj_nome_fornecedor",
                "cod_fornecedor",
                "codigo_fornecedor",
                "fornecedor",
                "nome_fornecedor",
                "credor",
                "cod_credor",
                "codigo_credor",
                "nome_credor",
            ],
            overdue_value: &[
                "tit_vencidos_valor_corrigido",
                "tit_vencidos_valor_nominal",
                "titulos_vencidos_valor_corrigido",
                "titulos_vencidos_valor_nominal",
                "titulos_vencidos_valor_atual",
                "valor_vencido",
                "vencido",
            ],
            outstanding_value: &[
                "titulos_a_vencer_valor_nominal",
                "titulos_a_vencer_valor_atual",
                "titulos_a_vencer_valor_corrigido",
                "tit_a_vencer_valor_nominal",
                "tit_a_vencer_valor_atual",
                "valor_a_vencer",
                "a_vencer",
            ],
            single_value: &[
                "valor_original",
                "valor_corrigido",
                "valor_total",
                "valor",
                "saldo",
                "saldo_a_pagar",
                "saldo_devedor",
                "valor_liquido",
            ],
            due_date: &[
                "vencto_real",
                "data_de_vencto",
                "venctoreal",
                "vencto_titulo",
                "venctotitulo",
                "vencto_orig",
                "vencimento_real",
                "vencimento_titulo",
                "vencimento_orig",
                "data_vencimento",
                "vencimento",
                "dt_vencimento",
            ],
            issue_date: &[
                "data_de_emissao",
                "data_emissao",
                "dt_emissao",
                "emissao",
                "data_entrada",
                "dt_entrada",
                "data_nf",
            ],
            document: &[
                "prf_numero_parcela",
                "prf_numero",
                "prf_num",
                "numero_titulo",
                "num_titulo",
                "numero_documento",
                "documento",
                "numero_nf",
                "nf_numero",
                "nota_fiscal",
                "nf",
            ],
            installment: &["parcela", "num_parcela", "parcela_num"],
            overdue_substrings: &[
                &["tit", "vencidos", "valor", "corrigido"],
                &["tit", "vencidos", "valor", "nominal"],
                &["tit", "venc", "valor", "corrig"],
                &["titulos", "vencidos", "valor"],
                &["valor", "vencido"],
            ],
            outstanding_substrings: &[
                &["titulos", "a_vencer", "valor", "nominal"],
                &["titulos", "a_vencer", "valor", "atual"],
                &["tit", "a_vencer", "valor"],
                &["valor", "a_vencer"],
            ],
        }
    }
}

/// One financial title, post-normalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancialEntry {
    pub code: String,
    pub name: String,
    pub value: f64,
    pub issue_date: String,
    pub due_date: Option<NaiveDate>,
    pub days_overdue: Option<i64>,
    pub document: String,
    pub installment: String,
}

/// Per-code aggregate of financial titles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancialTotal {
    pub code: String,
    pub name: String,
    pub value: f64,
    pub days_overdue: Option<i64>,
    pub term: Term,
}

/// Pre-computation layout check exposed to uploaders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutReport {
    pub valido: bool,
    pub mensagem: String,
    pub colunas_encontradas: Vec<String>,
    pub colunas_faltando: Vec<String>,
    pub colunas_arquivo: Vec<String>,
    pub avisos: Vec<String>,
}

fn resolve_overdue(table: &Table, profile: &LedgerProfile) -> Option<usize> {
    columns::resolve(table, profile.overdue_value)
        .or_else(|| columns::resolve_by_substrings(table, profile.overdue_substrings))
}

fn resolve_outstanding(table: &Table, profile: &LedgerProfile) -> Option<usize> {
    columns::resolve(table, profile.outstanding_value)
        .or_else(|| columns::resolve_by_substrings(table, profile.outstanding_substrings))
}

/// Checks that the required columns are resolvable before any computation
/// starts, so the uploader gets one actionable message instead of a mid-run
/// failure.
pub fn validate_layout(table: &Table, profile: &LedgerProfile) -> LayoutReport {
    let mut found = Vec::new();
    let mut missing = Vec::new();
    let mut warnings = Vec::new();

    let entity = columns::resolve(table, profile.entity);
    match entity {
        Some(idx) => found.push(format!("Código/Cliente: {}", table.columns()[idx])),
        None => missing.push("Código do Cliente/Fornecedor".to_string()),
    }

    let overdue = resolve_overdue(table, profile);
    let outstanding = resolve_outstanding(table, profile);
    let single = columns::resolve(table, profile.single_value);
    match (overdue, outstanding, single) {
        (Some(v), Some(a), _) => {
            found.push(format!("Valor Vencido: {}", table.columns()[v]));
            found.push(format!("Valor a Vencer: {}", table.columns()[a]));
        }
        (_, _, Some(u)) => found.push(format!("Valor: {}", table.columns()[u])),
        (Some(v), None, None) => {
            found.push(format!("Valor Vencido: {}", table.columns()[v]));
            warnings.push(
                "Coluna de valor a vencer não encontrada - usando apenas valor vencido".to_string(),
            );
        }
        (None, Some(a), None) => {
            found.push(format!("Valor a Vencer: {}", table.columns()[a]));
            warnings.push(
                "Coluna de valor vencido não encontrada - usando apenas valor a vencer".to_string(),
            );
        }
        (None, None, None) => {
            missing.push("Valor (vencido/a vencer ou valor único)".to_string());
        }
    }

    match columns::resolve(table, profile.due_date) {
        Some(idx) => found.push(format!("Data Vencimento: {}", table.columns()[idx])),
        None => missing.push("Data de Vencimento".to_string()),
    }

    match columns::resolve(table, profile.issue_date) {
        Some(idx) => found.push(format!("Data Emissão: {}", table.columns()[idx])),
        None => warnings.push("Coluna de data de emissão não encontrada (opcional)".to_string()),
    }

    match columns::resolve(table, profile.document) {
        Some(idx) => found.push(format!("Número Documento: {}", table.columns()[idx])),
        None => {
            warnings.push("Coluna de número do documento não encontrada (opcional)".to_string())
        }
    }

    let valido = missing.is_empty();
    let mensagem = if valido {
        format!("Layout válido. {} colunas mapeadas corretamente.", found.len())
    } else {
        format!(
            "Layout inválido! Colunas obrigatórias não encontradas: {}. Verifique se o arquivo possui o formato esperado.",
            missing.join(", ")
        )
    };

    if !valido {
        warn!("layout inválido, colunas faltando: {:?}", missing);
    }

    LayoutReport {
        valido,
        mensagem,
        colunas_encontradas: found,
        colunas_faltando: missing,
        colunas_arquivo: table.columns().to_vec(),
        avisos: warnings,
    }
}

/// Normalizes a financial report into per-title entries. `reference` is the
/// request's base date; using it instead of the wall clock keeps runs over
/// the same inputs identical.
pub fn normalize_detailed(
    table: &Table,
    profile: &LedgerProfile,
    reference: NaiveDate,
) -> Result<Vec<FinancialEntry>> {
    let entity_col = columns::resolve_required(table, "Código do Cliente/Fornecedor", profile.entity)?;
    let due_col = columns::resolve_required(table, "Data de Vencimento", profile.due_date)?;
    let issue_col = columns::resolve(table, profile.issue_date).or_else(|| {
        columns::resolve_by_substrings(
            table,
            &[&["data", "emissao"], &["data", "de", "emissao"], &["dt", "emissao"]],
        )
    });
    let doc_col = columns::resolve(table, profile.document).or_else(|| {
        columns::resolve_by_substrings(
            table,
            &[&["prf", "numero"], &["prf", "num"], &["numero", "documento"], &["num", "doc"]],
        )
    });
    let installment_col = columns::resolve(table, profile.installment);

    let overdue_col = resolve_overdue(table, profile);
    let outstanding_col = resolve_outstanding(table, profile);
    let single_col = if overdue_col.is_none() || outstanding_col.is_none() {
        match columns::resolve(table, profile.single_value) {
            Some(idx) => Some(idx),
            // Last resort: any column carrying "valor" in the name.
            None => table.normalized_columns().iter().position(|c| c.contains("valor")),
        }
    } else {
        None
    };

    if overdue_col.is_none() && outstanding_col.is_none() && single_col.is_none() {
        return Err(ReconError::Layout {
            field: "Valor (vencido/a vencer ou valor único)".to_string(),
            columns: table.columns().to_vec(),
        });
    }

    let mut entries = Vec::with_capacity(table.len());
    for row in table.rows() {
        let value = match (overdue_col, outstanding_col) {
            (Some(v), Some(a)) => {
                parsing::parse_brazilian_number_or_zero(table.cell(row, v))
                    + parsing::parse_brazilian_number_or_zero(table.cell(row, a))
            }
            _ => {
                let idx = single_col.ok_or_else(|| ReconError::Layout {
                    field: "Valor".to_string(),
                    columns: table.columns().to_vec(),
                })?;
                parsing::parse_brazilian_number(table.cell(row, idx))
            }
        };
        // A title without a parseable value carries no information.
        if value.is_nan() {
            continue;
        }

        let raw_entity = parsing::cell_to_string(table.cell(row, entity_col));
        let code = canonical_code(&raw_entity, profile.prefix);
        // No resolvable entity code means the row can never join anything.
        if code.is_empty() {
            continue;
        }
        let name = display_name(&raw_entity);

        let due_date = parsing::parse_date(table.cell(row, due_col));
        let days_overdue = due_date.map(|d| (reference - d).num_days());

        entries.push(FinancialEntry {
            code,
            name,
            value,
            issue_date: issue_col
                .map(|idx| parsing::format_date(table.cell(row, idx)))
                .unwrap_or_default(),
            due_date,
            days_overdue,
            document: doc_col
                .map(|idx| parsing::cell_to_string(table.cell(row, idx)))
                .unwrap_or_default(),
            installment: installment_col
                .map(|idx| parsing::cell_to_string(table.cell(row, idx)))
                .unwrap_or_default(),
        });
    }

    info!(
        "financeiro normalizado: {} de {} registros, total {:.2}",
        entries.len(),
        table.len(),
        entries.iter().map(|e| e.value).sum::<f64>()
    );
    Ok(entries)
}

/// Groups entries by code: values summed, days overdue maxed, first name
/// kept, term classified from the worst overdue.
pub fn aggregate(entries: &[FinancialEntry]) -> Vec<FinancialTotal> {
    let mut totals: std::collections::BTreeMap<String, FinancialTotal> =
        std::collections::BTreeMap::new();
    for entry in entries {
        let total = totals.entry(entry.code.clone()).or_insert_with(|| FinancialTotal {
            code: entry.code.clone(),
            name: entry.name.clone(),
            value: 0.0,
            days_overdue: None,
            term: Term::CurtoPrazo,
        });
        total.value += entry.value;
        total.days_overdue = match (total.days_overdue, entry.days_overdue) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (a, b) => a.or(b),
        };
    }
    let mut result: Vec<FinancialTotal> = totals.into_values().collect();
    for total in &mut result {
        total.term = Term::classify(total.days_overdue);
    }
    result
}
