//! Bank-account general ledger (CTBR400) normalizer.
//!
//! Expected layout:
//! `DATA, LOTE/SUB/DOC/LINHA, HISTORICO, XPARTIDA, C CUSTO, ITEM CONTA,
//! COD CL VAL, DEBITO, CREDITO, SALDO ATUAL`
//!
//! Unlike the statement, this report carries no document column worth
//! matching on; the reference is buried in free-text history such as
//! `CFOP: 5101 NF 000034619 - FAZENDAO IND.` or `COMP. NF9/000034395`.

use log::info;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::columns;
use crate::error::{ReconError, Result};
use crate::parsing;
use crate::table::Table;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PostingKind {
    #[serde(rename = "DEBITO")]
    Debito,
    #[serde(rename = "CREDITO")]
    Credito,
}

/// One bank-ledger posting, post-normalization. Debit and credit are kept
/// as absolute values; `value` follows the asset-account convention
/// (debit positive, credit negative) to mirror the statement's inflows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BankLedgerEntry {
    pub date: String,
    pub batch_document: String,
    pub history: String,
    pub extracted_document: String,
    pub prefix: String,
    pub number: String,
    pub document_key: String,
    pub debit: f64,
    pub credit: f64,
    pub value: f64,
    pub kind: PostingKind,
    pub balance: f64,
}

/// Boleto references appear with and without an embedded `NF`
/// (`BOL NF501816337`, `BOL501816337`), so they get their own pattern.
static BOL: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bBOL\s*(?:NF)?\s*(\d+)").unwrap());

/// Known prefixes in priority order; `NF9` must come before `NF`.
const KNOWN_PREFIXES: &[&str] = &[
    "NF9", "NF", "RA", "PA", "DV", "FT", "BOL", "DUP", "FAT", "REC", "PAG", "DEP", "TED", "DOC",
    "PIX", "CHQ", "CHEQUE",
];

static KNOWN: Lazy<Vec<(&'static str, Regex)>> = Lazy::new(|| {
    KNOWN_PREFIXES
        .iter()
        .map(|p| (*p, Regex::new(&format!(r"\b{}[\s/\-]*(\d+)", p)).unwrap()))
        .collect()
});

static GENERIC: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b([A-Z]{2,4})[\s/\-]*(\d{4,})").unwrap());

fn strip_leading_zeros(raw: &str) -> String {
    let stripped = raw.trim_start_matches('0');
    if stripped.is_empty() {
        "0".to_string()
    } else {
        stripped.to_string()
    }
}

/// Extracts `(document, prefix, number)` from a history text. Empty strings
/// when no recognizable reference exists.
pub fn extract_document_from_history(history: &str) -> (String, String, String) {
    let text = history.trim().to_uppercase();
    if text.is_empty() {
        return (String::new(), String::new(), String::new());
    }

    if let Some(caps) = BOL.captures(&text) {
        let raw = &caps[1];
        return (format!("BOL {}", raw), "BOL".to_string(), strip_leading_zeros(raw));
    }

    for (prefix, pattern) in KNOWN.iter() {
        if let Some(caps) = pattern.captures(&text) {
            let raw = &caps[1];
            return (
                format!("{} {}", prefix, raw),
                prefix.to_string(),
                strip_leading_zeros(raw),
            );
        }
    }

    if let Some(caps) = GENERIC.captures(&text) {
        let prefix = caps[1].to_string();
        let raw = &caps[2];
        return (format!("{} {}", prefix, raw), prefix, strip_leading_zeros(raw));
    }

    (String::new(), String::new(), String::new())
}

/// Normalizes a bank-account general ledger. Rows with no movement are
/// dropped; rows whose history yields no document reference keep a
/// synthetic `SEM_DOC_{i}` key.
pub fn normalize_bank_ledger(table: &Table) -> Result<Vec<BankLedgerEntry>> {
    let date_col = columns::resolve_loose(table, &["data", "dt", "data_lancamento", "data_lanc"]);
    let batch_col = columns::resolve_loose(table, &["lote_sub_doc_linha", "lote", "documento", "doc"]);
    let history_col = columns::resolve_loose(table, &["historico", "hist", "descricao"]);
    let debit_col = columns::resolve_loose(table, &["debito", "deb", "valor_debito"]);
    let credit_col = columns::resolve_loose(table, &["credito", "cred", "valor_credito"]);
    let balance_col = columns::resolve_loose(table, &["saldo_atual", "saldo", "saldo_final"]);

    let date_col = date_col.ok_or_else(|| ReconError::Layout {
        field: "DATA".to_string(),
        columns: table.columns().to_vec(),
    })?;
    let history_col = history_col.ok_or_else(|| ReconError::Layout {
        field: "HISTORICO".to_string(),
        columns: table.columns().to_vec(),
    })?;
    if debit_col.is_none() && credit_col.is_none() {
        return Err(ReconError::Layout {
            field: "DEBITO/CREDITO".to_string(),
            columns: table.columns().to_vec(),
        });
    }

    let mut entries = Vec::with_capacity(table.len());
    for (i, row) in table.rows().iter().enumerate() {
        let debit = debit_col
            .map(|idx| parsing::parse_brazilian_number_or_zero(table.cell(row, idx)).abs())
            .unwrap_or(0.0);
        let credit = credit_col
            .map(|idx| parsing::parse_brazilian_number_or_zero(table.cell(row, idx)).abs())
            .unwrap_or(0.0);
        if debit == 0.0 && credit == 0.0 {
            continue;
        }

        let history = parsing::cell_to_string(table.cell(row, history_col));
        let (extracted_document, prefix, number) = extract_document_from_history(&history);
        let document_key = if prefix.is_empty() && number.is_empty() {
            format!("SEM_DOC_{}", i)
        } else {
            format!("{}_{}", prefix, number)
        };

        entries.push(BankLedgerEntry {
            date: parsing::format_date(table.cell(row, date_col)),
            batch_document: batch_col
                .map(|idx| parsing::cell_to_string(table.cell(row, idx)))
                .unwrap_or_default(),
            history,
            extracted_document,
            prefix,
            number,
            document_key,
            debit,
            credit,
            value: debit - credit,
            kind: if credit > 0.0 { PostingKind::Credito } else { PostingKind::Debito },
            balance: balance_col
                .map(|idx| parsing::parse_brazilian_number_or_zero(table.cell(row, idx)))
                .unwrap_or(0.0),
        });
    }

    info!(
        "razao banco normalizado: {} lancamentos, debitos {:.2}, creditos {:.2}, documentos {}",
        entries.len(),
        entries.iter().map(|e| e.debit).sum::<f64>(),
        entries.iter().map(|e| e.credit).sum::<f64>(),
        entries.iter().filter(|e| !e.prefix.is_empty()).count()
    );
    Ok(entries)
}
