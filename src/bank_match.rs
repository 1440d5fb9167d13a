//! Day-by-day bank reconciliation: statement movements against the bank
//! account's ledger postings.
//!
//! Matching runs per day and per flow pipeline (statement inflows against
//! ledger debits, outflows against credits), in escalating phases:
//!
//! 1. same document key and same value;
//! 2. same document key, values matched as per-key sums (one boleto paid
//!    in several postings);
//! 3. related document keys, where the ledger key is a truncated prefix
//!    of the statement key;
//! 4. value only, for movements without a usable key.

use chrono::NaiveDate;
use log::info;
use std::collections::BTreeMap;

use crate::bank_ledger::{BankLedgerEntry, PostingKind};
use crate::schema::{
    BankLedgerRecord, BankSummary, DayMovement, Situation, StatementRecord,
};
use crate::statement::{FlowKind, StatementEntry};
use crate::TOLERANCE;

/// Outcome of the matcher, before report assembly.
#[derive(Debug, Clone)]
pub struct BankMatchResult {
    pub days: Vec<DayMovement>,
    pub summary: BankSummary,
    pub so_extrato: Vec<StatementRecord>,
    pub so_razao: Vec<BankLedgerRecord>,
}

/// Numeric match key behind a document reference: digits only, leading
/// zeros stripped. Empty when the reference carries no digits.
pub fn normalize_doc_key(raw: &str) -> String {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return String::new();
    }
    let stripped = digits.trim_start_matches('0');
    if stripped.is_empty() {
        "0".to_string()
    } else {
        stripped.to_string()
    }
}

struct Side {
    keys: Vec<String>,
    values: Vec<f64>,
    matched: Vec<bool>,
}

impl Side {
    fn new(items: Vec<(String, f64)>) -> Self {
        let (keys, values): (Vec<String>, Vec<f64>) = items.into_iter().unzip();
        let matched = vec![false; keys.len()];
        Side { keys, values, matched }
    }

    fn unmatched(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.keys.len()).filter(move |&i| !self.matched[i])
    }
}

fn run_phases(stmt: &mut Side, ledger: &mut Side) {
    // Phase 1: exact key and value.
    for i in 0..stmt.keys.len() {
        if stmt.matched[i] || stmt.keys[i].is_empty() {
            continue;
        }
        let hit = ledger.unmatched().find(|&j| {
            ledger.keys[j] == stmt.keys[i] && (ledger.values[j] - stmt.values[i]).abs() <= TOLERANCE
        });
        if let Some(j) = hit {
            stmt.matched[i] = true;
            ledger.matched[j] = true;
        }
    }

    // Phase 2: per-key sums, one title settled by several postings.
    let keys: Vec<String> = stmt
        .unmatched()
        .map(|i| stmt.keys[i].clone())
        .filter(|k| !k.is_empty())
        .collect();
    for key in keys {
        let stmt_idx: Vec<usize> = stmt.unmatched().filter(|&i| stmt.keys[i] == key).collect();
        let ledger_idx: Vec<usize> =
            ledger.unmatched().filter(|&j| ledger.keys[j] == key).collect();
        if stmt_idx.is_empty() || ledger_idx.is_empty() {
            continue;
        }
        let stmt_sum: f64 = stmt_idx.iter().map(|&i| stmt.values[i]).sum();
        let ledger_sum: f64 = ledger_idx.iter().map(|&j| ledger.values[j]).sum();
        if (stmt_sum - ledger_sum).abs() <= TOLERANCE {
            for i in stmt_idx {
                stmt.matched[i] = true;
            }
            for j in ledger_idx {
                ledger.matched[j] = true;
            }
        }
    }

    // Phase 3: related keys, the ledger carrying a truncated reference.
    for i in 0..stmt.keys.len() {
        if stmt.matched[i] || stmt.keys[i].len() < 4 {
            continue;
        }
        let related: Vec<usize> = ledger
            .unmatched()
            .filter(|&j| {
                let lk = &ledger.keys[j];
                lk.len() >= 3 && stmt.keys[i].starts_with(lk.as_str())
            })
            .collect();
        if related.is_empty() {
            continue;
        }
        let sum: f64 = related.iter().map(|&j| ledger.values[j]).sum();
        if (sum - stmt.values[i]).abs() <= TOLERANCE {
            stmt.matched[i] = true;
            for j in related {
                ledger.matched[j] = true;
            }
        }
    }

    // Phase 4: value only.
    for i in 0..stmt.keys.len() {
        if stmt.matched[i] {
            continue;
        }
        let hit = ledger
            .unmatched()
            .find(|&j| (ledger.values[j] - stmt.values[i]).abs() <= TOLERANCE);
        if let Some(j) = hit {
            stmt.matched[i] = true;
            ledger.matched[j] = true;
        }
    }
}

fn statement_record(entry: &StatementEntry) -> StatementRecord {
    StatementRecord {
        data: entry.date.clone(),
        documento: entry.document.clone(),
        prefixo: entry.prefix.clone(),
        numero: entry.number.clone(),
        descricao: entry.description.clone(),
        valor: entry.inflow.max(entry.outflow),
        tipo: match entry.kind {
            FlowKind::Entrada => "ENTRADA".to_string(),
            FlowKind::Saida => "SAIDA".to_string(),
        },
    }
}

fn ledger_record(entry: &BankLedgerEntry) -> BankLedgerRecord {
    BankLedgerRecord {
        data: entry.date.clone(),
        lote_doc: entry.batch_document.clone(),
        historico: entry.history.clone(),
        documento_extraido: entry.extracted_document.clone(),
        prefixo: entry.prefix.clone(),
        numero: entry.number.clone(),
        valor: entry.debit.max(entry.credit),
        tipo: match entry.kind {
            PostingKind::Debito => "DEBITO".to_string(),
            PostingKind::Credito => "CREDITO".to_string(),
        },
    }
}

fn match_pipeline<'a>(
    stmt_entries: &[&'a StatementEntry],
    ledger_entries: &[&'a BankLedgerEntry],
    stmt_value: impl Fn(&StatementEntry) -> f64,
    ledger_value: impl Fn(&BankLedgerEntry) -> f64,
) -> (Vec<StatementRecord>, Vec<StatementRecord>, Vec<BankLedgerRecord>, Vec<BankLedgerRecord>) {
    let mut stmt = Side::new(
        stmt_entries
            .iter()
            .map(|&e| (normalize_doc_key(&e.number), stmt_value(e)))
            .collect(),
    );
    let mut ledger = Side::new(
        ledger_entries
            .iter()
            .map(|&e| (normalize_doc_key(&e.number), ledger_value(e)))
            .collect(),
    );
    run_phases(&mut stmt, &mut ledger);

    let mut matched_stmt = Vec::new();
    let mut pending_stmt = Vec::new();
    for (i, &entry) in stmt_entries.iter().enumerate() {
        if stmt.matched[i] {
            matched_stmt.push(statement_record(entry));
        } else {
            pending_stmt.push(statement_record(entry));
        }
    }
    let mut matched_ledger = Vec::new();
    let mut pending_ledger = Vec::new();
    for (j, &entry) in ledger_entries.iter().enumerate() {
        if ledger.matched[j] {
            matched_ledger.push(ledger_record(entry));
        } else {
            pending_ledger.push(ledger_record(entry));
        }
    }
    (matched_stmt, pending_stmt, matched_ledger, pending_ledger)
}

fn day_sort_key(date: &str) -> (bool, NaiveDate, String) {
    match NaiveDate::parse_from_str(date, "%d/%m/%Y") {
        Ok(d) => (false, d, date.to_string()),
        Err(_) => (true, NaiveDate::MAX, date.to_string()),
    }
}

/// Runs the day-by-day matcher. `base_date` stamps the summary so two runs
/// over the same inputs produce identical reports.
pub fn reconcile_days(
    statement: &[StatementEntry],
    ledger: &[BankLedgerEntry],
    base_date: &str,
) -> BankMatchResult {
    let mut by_day: BTreeMap<String, (Vec<&StatementEntry>, Vec<&BankLedgerEntry>)> =
        BTreeMap::new();
    for entry in statement {
        by_day.entry(entry.date.clone()).or_default().0.push(entry);
    }
    for entry in ledger {
        by_day.entry(entry.date.clone()).or_default().1.push(entry);
    }

    let mut days = Vec::with_capacity(by_day.len());
    let mut so_extrato = Vec::new();
    let mut so_razao = Vec::new();

    for (date, (stmt_entries, ledger_entries)) in &by_day {
        let inflows: Vec<&StatementEntry> = stmt_entries
            .iter()
            .copied()
            .filter(|e| e.kind == FlowKind::Entrada)
            .collect();
        let outflows: Vec<&StatementEntry> = stmt_entries
            .iter()
            .copied()
            .filter(|e| e.kind == FlowKind::Saida)
            .collect();
        let debits: Vec<&BankLedgerEntry> = ledger_entries
            .iter()
            .copied()
            .filter(|e| e.kind == PostingKind::Debito)
            .collect();
        let credits: Vec<&BankLedgerEntry> = ledger_entries
            .iter()
            .copied()
            .filter(|e| e.kind == PostingKind::Credito)
            .collect();

        let (conc_ent, pend_ent, conc_deb, pend_deb) =
            match_pipeline(&inflows, &debits, |e| e.inflow, |e| e.debit);
        let (conc_sai, pend_sai, conc_cred, pend_cred) =
            match_pipeline(&outflows, &credits, |e| e.outflow, |e| e.credit);

        let entradas: f64 = inflows.iter().map(|e| e.inflow).sum();
        let saidas: f64 = outflows.iter().map(|e| e.outflow).sum();
        let debitos: f64 = debits.iter().map(|e| e.debit).sum();
        let creditos: f64 = credits.iter().map(|e| e.credit).sum();
        let dif_entradas = debitos - entradas;
        let dif_saidas = creditos - saidas;
        let status = if dif_entradas.abs() <= TOLERANCE && dif_saidas.abs() <= TOLERANCE {
            Situation::Conciliado
        } else {
            Situation::Divergente
        };

        if status == Situation::Divergente {
            so_extrato.extend(pend_ent.iter().cloned());
            so_extrato.extend(pend_sai.iter().cloned());
            so_razao.extend(pend_deb.iter().cloned());
            so_razao.extend(pend_cred.iter().cloned());
        }

        days.push(DayMovement {
            data: date.clone(),
            entradas_extrato: entradas,
            saidas_extrato: saidas,
            debitos_razao: debitos,
            creditos_razao: creditos,
            dif_entradas,
            dif_saidas,
            status,
            so_extrato_entradas: pend_ent,
            so_extrato_saidas: pend_sai,
            so_razao_debitos: pend_deb,
            so_razao_creditos: pend_cred,
            conciliados_extrato_entradas: conc_ent,
            conciliados_extrato_saidas: conc_sai,
            conciliados_razao_debitos: conc_deb,
            conciliados_razao_creditos: conc_cred,
        });
    }

    days.sort_by_key(|d| day_sort_key(&d.data));

    let total_entradas: f64 = days.iter().map(|d| d.entradas_extrato).sum();
    let total_saidas: f64 = days.iter().map(|d| d.saidas_extrato).sum();
    let total_debitos: f64 = days.iter().map(|d| d.debitos_razao).sum();
    let total_creditos: f64 = days.iter().map(|d| d.creditos_razao).sum();
    let dif_total_entradas = total_debitos - total_entradas;
    let dif_total_saidas = total_creditos - total_saidas;
    let qtd_conciliados = days.iter().filter(|d| d.status == Situation::Conciliado).count();
    let qtd_divergentes = days.len() - qtd_conciliados;

    let summary = BankSummary {
        total_entradas_extrato: total_entradas,
        total_saidas_extrato: total_saidas,
        total_debitos_razao: total_debitos,
        total_creditos_razao: total_creditos,
        dif_total_entradas,
        dif_total_saidas,
        // Offsetting day-level differences must not report as reconciled.
        situacao: if qtd_divergentes == 0 {
            Situation::Conciliado
        } else {
            Situation::Divergente
        },
        qtd_dias: days.len(),
        qtd_conciliados,
        qtd_divergentes,
        percentual_conciliacao: if days.is_empty() {
            0.0
        } else {
            qtd_conciliados as f64 / days.len() as f64 * 100.0
        },
        data_processamento: base_date.to_string(),
    };

    info!(
        "conciliação bancária: {} dias, {} conciliados, {} divergentes",
        summary.qtd_dias, summary.qtd_conciliados, summary.qtd_divergentes
    );

    BankMatchResult { days, summary, so_extrato, so_razao }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stmt(date: &str, prefix: &str, number: &str, inflow: f64, outflow: f64) -> StatementEntry {
        StatementEntry {
            date: date.to_string(),
            document: String::new(),
            prefix: prefix.to_string(),
            number: number.to_string(),
            document_key: format!("{}_{}", prefix, number),
            description: String::new(),
            inflow,
            outflow,
            value: inflow - outflow,
            kind: if outflow > 0.0 { FlowKind::Saida } else { FlowKind::Entrada },
            balance: 0.0,
        }
    }

    fn razao(date: &str, prefix: &str, number: &str, debit: f64, credit: f64) -> BankLedgerEntry {
        BankLedgerEntry {
            date: date.to_string(),
            batch_document: String::new(),
            history: String::new(),
            extracted_document: format!("{} {}", prefix, number),
            prefix: prefix.to_string(),
            number: number.to_string(),
            document_key: format!("{}_{}", prefix, number),
            debit,
            credit,
            value: debit - credit,
            kind: if credit > 0.0 { PostingKind::Credito } else { PostingKind::Debito },
            balance: 0.0,
        }
    }

    #[test]
    fn test_normalize_doc_key() {
        assert_eq!(normalize_doc_key("000123"), "123");
        assert_eq!(normalize_doc_key("12-34"), "1234");
        assert_eq!(normalize_doc_key("000"), "0");
        assert_eq!(normalize_doc_key("ABC"), "");
    }

    #[test]
    fn test_exact_match_day_is_reconciled() {
        let result = reconcile_days(
            &[stmt("05/01/2025", "NF", "123", 1000.0, 0.0)],
            &[razao("05/01/2025", "NF", "123", 1000.0, 0.0)],
            "31/01/2025",
        );
        assert_eq!(result.days.len(), 1);
        assert_eq!(result.days[0].status, Situation::Conciliado);
        assert_eq!(result.days[0].conciliados_extrato_entradas.len(), 1);
        assert!(result.so_extrato.is_empty());
        assert_eq!(result.summary.situacao, Situation::Conciliado);
        assert_eq!(result.summary.data_processamento, "31/01/2025");
    }

    #[test]
    fn test_sum_match_one_title_several_postings() {
        let result = reconcile_days(
            &[stmt("05/01/2025", "BOL", "900", 1000.0, 0.0)],
            &[
                razao("05/01/2025", "BOL", "900", 600.0, 0.0),
                razao("05/01/2025", "BOL", "900", 400.0, 0.0),
            ],
            "31/01/2025",
        );
        assert_eq!(result.days[0].status, Situation::Conciliado);
        assert_eq!(result.days[0].conciliados_razao_debitos.len(), 2);
        assert!(result.days[0].so_razao_debitos.is_empty());
    }

    #[test]
    fn test_sum_match_not_stolen_by_exact_phase() {
        // An exact candidate and a sum pair share the day; the exact pair
        // must not consume one leg of the sum.
        let result = reconcile_days(
            &[
                stmt("05/01/2025", "NF", "111", 600.0, 0.0),
                stmt("05/01/2025", "BOL", "900", 1000.0, 0.0),
            ],
            &[
                razao("05/01/2025", "NF", "111", 600.0, 0.0),
                razao("05/01/2025", "BOL", "900", 600.0, 0.0),
                razao("05/01/2025", "BOL", "900", 400.0, 0.0),
            ],
            "31/01/2025",
        );
        assert_eq!(result.days[0].status, Situation::Conciliado);
        assert_eq!(result.days[0].conciliados_razao_debitos.len(), 3);
    }

    #[test]
    fn test_related_key_prefix_match() {
        // Ledger carries a truncated reference of the statement number.
        let result = reconcile_days(
            &[stmt("05/01/2025", "NF", "1011008", 350.0, 0.0)],
            &[razao("05/01/2025", "NF", "101", 350.0, 0.0)],
            "31/01/2025",
        );
        assert_eq!(result.days[0].status, Situation::Conciliado);
        assert_eq!(result.days[0].conciliados_extrato_entradas.len(), 1);
    }

    #[test]
    fn test_related_key_ignores_longer_ledger_keys() {
        // The truncation runs on the ledger side only; ledger keys longer
        // than the statement key are not related even if they sum to the
        // statement value.
        let result = reconcile_days(
            &[stmt("05/01/2025", "NF", "1234", 100.0, 0.0)],
            &[
                razao("05/01/2025", "NF", "12345", 60.0, 0.0),
                razao("05/01/2025", "NF", "12340", 40.0, 0.0),
            ],
            "31/01/2025",
        );
        assert!(result.days[0].conciliados_extrato_entradas.is_empty());
        assert_eq!(result.days[0].so_extrato_entradas.len(), 1);
        assert_eq!(result.days[0].so_razao_debitos.len(), 2);
    }

    #[test]
    fn test_value_only_match_without_keys() {
        let mut tarifa = stmt("05/01/2025", "", "", 0.0, 45.0);
        tarifa.document_key = "SEM_DOC_0".to_string();
        let mut posting = razao("05/01/2025", "", "", 0.0, 45.0);
        posting.document_key = "SEM_DOC_0".to_string();
        let result = reconcile_days(&[tarifa], &[posting], "31/01/2025");
        assert_eq!(result.days[0].status, Situation::Conciliado);
        assert_eq!(result.days[0].conciliados_extrato_saidas.len(), 1);
    }

    #[test]
    fn test_divergent_day_feeds_global_lists() {
        let result = reconcile_days(
            &[stmt("05/01/2025", "NF", "123", 1000.0, 0.0)],
            &[razao("05/01/2025", "NF", "999", 700.0, 0.0)],
            "31/01/2025",
        );
        assert_eq!(result.days[0].status, Situation::Divergente);
        assert_eq!(result.so_extrato.len(), 1);
        assert_eq!(result.so_razao.len(), 1);
        assert_eq!(result.summary.qtd_divergentes, 1);
        assert_eq!(result.summary.situacao, Situation::Divergente);
    }

    #[test]
    fn test_days_sorted_chronologically() {
        let result = reconcile_days(
            &[
                stmt("03/02/2025", "NF", "3", 10.0, 0.0),
                stmt("10/01/2025", "NF", "2", 10.0, 0.0),
                stmt("02/01/2025", "NF", "1", 10.0, 0.0),
            ],
            &[],
            "28/02/2025",
        );
        let dates: Vec<&str> = result.days.iter().map(|d| d.data.as_str()).collect();
        assert_eq!(dates, vec!["02/01/2025", "10/01/2025", "03/02/2025"]);
    }
}
