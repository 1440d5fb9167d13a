//! Bank statement (FINR470) normalizer.
//!
//! Expected layout:
//! `BANCO, AGENCIA, CONTA, SALDO INICIAL, DATA, OPERACAO, DOCUMENTO,
//! PREFIXO/TITULO, ENTRADAS, SAIDAS, SALDO ATUAL, DESCRICAO, ...`

use log::info;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::columns;
use crate::error::{ReconError, Result};
use crate::parsing;
use crate::table::Table;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlowKind {
    #[serde(rename = "ENTRADA")]
    Entrada,
    #[serde(rename = "SAIDA")]
    Saida,
}

/// One statement movement, post-normalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatementEntry {
    pub date: String,
    pub document: String,
    pub prefix: String,
    pub number: String,
    pub document_key: String,
    pub description: String,
    pub inflow: f64,
    pub outflow: f64,
    pub value: f64,
    pub kind: FlowKind,
    pub balance: f64,
}

static PREFIX_NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^([A-Z]+)(\d+)$").unwrap());

fn strip_leading_zeros(raw: &str) -> String {
    let stripped = raw.trim_start_matches('0');
    if stripped.is_empty() {
        "0".to_string()
    } else {
        stripped.to_string()
    }
}

/// Splits a `PREFIXO/TITULO` field like `RA -01120253`, `BOL-501819069` or
/// `NF9-000034395` into prefix and number. The number loses its leading
/// zeros so both sides of the matching agree on one form.
pub fn split_prefix_number(raw: &str) -> (String, String) {
    let text: String = raw
        .trim()
        .to_uppercase()
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| if c == '/' { '-' } else { c })
        .collect();
    if text.is_empty() {
        return (String::new(), String::new());
    }

    if let Some((prefix, number)) = text.split_once('-') {
        return (prefix.to_string(), strip_leading_zeros(number));
    }
    if let Some(caps) = PREFIX_NUMBER.captures(&text) {
        return (caps[1].to_string(), strip_leading_zeros(&caps[2]));
    }
    (String::new(), strip_leading_zeros(&text))
}

/// Normalizes a bank statement. Rows with no movement on either side are
/// dropped; rows without a resolvable document key receive a synthetic
/// `SEM_DOC_{i}` key so they stay visible for the value-only match phase.
pub fn normalize_statement(table: &Table) -> Result<Vec<StatementEntry>> {
    let date_col = columns::resolve_loose(table, &["data", "dt", "data_movimento"]);
    let doc_col = columns::resolve_loose(table, &["documento", "doc", "num_documento"]);
    let prefix_col = columns::resolve_loose(table, &["prefixo_titulo", "prefixo", "titulo"]);
    let inflow_col = columns::resolve_loose(table, &["entradas", "entrada", "credito", "creditos"]);
    let outflow_col = columns::resolve_loose(table, &["saidas", "saida", "debito", "debitos"]);
    let balance_col = columns::resolve_loose(table, &["saldo_atual", "saldo", "saldo_final"]);
    let desc_col = columns::resolve_loose(table, &["descricao", "historico", "desc"]);

    let date_col = date_col.ok_or_else(|| ReconError::Layout {
        field: "DATA".to_string(),
        columns: table.columns().to_vec(),
    })?;
    if prefix_col.is_none() && doc_col.is_none() {
        return Err(ReconError::Layout {
            field: "PREFIXO/TITULO ou DOCUMENTO".to_string(),
            columns: table.columns().to_vec(),
        });
    }

    let mut entries = Vec::with_capacity(table.len());
    for (i, row) in table.rows().iter().enumerate() {
        let inflow = inflow_col
            .map(|idx| parsing::parse_brazilian_number_or_zero(table.cell(row, idx)))
            .unwrap_or(0.0);
        let outflow = outflow_col
            .map(|idx| parsing::parse_brazilian_number_or_zero(table.cell(row, idx)))
            .unwrap_or(0.0);
        if inflow == 0.0 && outflow == 0.0 {
            continue;
        }

        let document = doc_col
            .map(|idx| parsing::cell_to_string(table.cell(row, idx)))
            .unwrap_or_default();
        let raw_key = prefix_col
            .map(|idx| parsing::cell_to_string(table.cell(row, idx)))
            .unwrap_or_else(|| document.clone());
        let (prefix, number) = split_prefix_number(&raw_key);

        let document_key = if prefix.is_empty() && number.is_empty() {
            format!("SEM_DOC_{}", i)
        } else {
            format!("{}_{}", prefix, number)
        };

        entries.push(StatementEntry {
            date: parsing::format_date(table.cell(row, date_col)),
            document,
            prefix,
            number,
            document_key,
            description: desc_col
                .map(|idx| parsing::cell_to_string(table.cell(row, idx)))
                .unwrap_or_default(),
            inflow,
            outflow,
            value: inflow - outflow,
            kind: if outflow > 0.0 { FlowKind::Saida } else { FlowKind::Entrada },
            balance: balance_col
                .map(|idx| parsing::parse_brazilian_number_or_zero(table.cell(row, idx)))
                .unwrap_or(0.0),
        });
    }

    info!(
        "extrato normalizado: {} movimentos, entradas {:.2}, saidas {:.2}",
        entries.len(),
        entries.iter().map(|e| e.inflow).sum::<f64>(),
        entries.iter().map(|e| e.outflow).sum::<f64>()
    );
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_split_prefix_number() {
        assert_eq!(split_prefix_number("RA -01120253"), ("RA".into(), "1120253".into()));
        assert_eq!(split_prefix_number("BOL-501819069"), ("BOL".into(), "501819069".into()));
        assert_eq!(split_prefix_number("NF9-000034395"), ("NF9".into(), "34395".into()));
        assert_eq!(split_prefix_number("NF9/000034395"), ("NF9".into(), "34395".into()));
        // No separator: leading letters become the prefix.
        assert_eq!(split_prefix_number("FT101100848"), ("FT".into(), "101100848".into()));
        // Digits only: no prefix.
        assert_eq!(split_prefix_number("000123"), ("".into(), "123".into()));
        assert_eq!(split_prefix_number(""), ("".into(), "".into()));
    }

    fn statement() -> Table {
        Table::new(
            vec![
                "DATA".into(),
                "DOCUMENTO".into(),
                "PREFIXO/TITULO".into(),
                "ENTRADAS".into(),
                "SAIDAS".into(),
                "DESCRICAO".into(),
            ],
            vec![
                vec![
                    json!("05/01/2025"),
                    json!("000123"),
                    json!("NF -000123"),
                    json!("1.000,00"),
                    json!(""),
                    json!("RECEBIMENTO NF 123"),
                ],
                vec![
                    json!("05/01/2025"),
                    json!("000900"),
                    json!("BOL-000900"),
                    json!(""),
                    json!("450,00"),
                    json!("PAGAMENTO BOLETO"),
                ],
                // No movement at all: dropped.
                vec![json!("05/01/2025"), json!(""), json!(""), json!(""), json!(""), json!("")],
                // Movement without a document: kept with synthetic key.
                vec![
                    json!("06/01/2025"),
                    json!(""),
                    json!(""),
                    json!("10,00"),
                    json!(""),
                    json!("TARIFA ESTORNADA"),
                ],
            ],
        )
    }

    #[test]
    fn test_normalize_statement() {
        let entries = normalize_statement(&statement()).unwrap();
        assert_eq!(entries.len(), 3);

        assert_eq!(entries[0].document_key, "NF_123");
        assert_eq!(entries[0].value, 1000.0);
        assert_eq!(entries[0].kind, FlowKind::Entrada);

        assert_eq!(entries[1].document_key, "BOL_900");
        assert_eq!(entries[1].value, -450.0);
        assert_eq!(entries[1].kind, FlowKind::Saida);

        assert_eq!(entries[2].document_key, "SEM_DOC_3");
    }

    #[test]
    fn test_missing_date_column() {
        let table = Table::new(
            vec!["DOCUMENTO".into(), "ENTRADAS".into()],
            vec![vec![json!("1"), json!("10,00")]],
        );
        let err = normalize_statement(&table).unwrap_err();
        assert!(err.to_string().contains("DATA"));
    }
}
