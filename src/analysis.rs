//! Drill-down analysis of per-code differences against the razão geral.
//!
//! Two engines live here. [`detailed_analysis`] explains each divergent
//! code by picking the ledger postings whose values add up to the missing
//! amount. [`deep_analysis`] chases accounting-only balances through the
//! unfiltered general ledger to name the counter-account they came from.

use log::{debug, info};
use std::collections::HashMap;

use crate::accounting::AccountingTotal;
use crate::code::{code_variations, normalize_account_code, normalize_loose};
use crate::columns;
use crate::diff::DiffEntry;
use crate::financial::FinancialEntry;
use crate::parsing;
use crate::schema::{
    AnalysisSummary, Classification, CodeAnalysis, DeepAnalysis, LedgerPosting,
    MatchedAccountingRecord, MatchedFinancialRecord, MatchStatus, MovementKind, OriginStatus,
    RecordStatus,
};
use crate::table::Table;
use crate::TOLERANCE;

/// One razão posting in raw form. `side` is `"D"` or `"C"`; rows without a
/// value on either side are not loaded.
#[derive(Debug, Clone, PartialEq)]
pub struct RawPosting {
    pub item_account: String,
    pub item_account_norm: String,
    pub counter_account: String,
    pub code_raw: String,
    pub code_norm: String,
    pub date: String,
    pub document: String,
    pub history: String,
    pub value: f64,
    pub side: String,
}

/// In-memory view of a CTBR040-style general ledger.
#[derive(Debug, Clone, Default)]
pub struct GeneralLedger {
    pub postings: Vec<RawPosting>,
}

impl GeneralLedger {
    /// Loads postings from a razão table. Column resolution is loose and
    /// every column is optional; a table without debit and credit columns
    /// simply loads empty.
    pub fn from_table(table: &Table, prefix: crate::code::CodePrefix) -> Self {
        let item_col = columns::resolve_loose(table, &["itemconta", "item_conta", "item"]);
        let counter_col = columns::resolve_loose(
            table,
            &["xpartida", "x_partida", "contrapartida", "conta_contrapartida"],
        );
        let code_col = columns::resolve_loose(
            table,
            &["codclval", "cod_cl_val", "cod_cliente", "cod_fornecedor", "codigo"],
        );
        let debit_col = columns::resolve_loose(table, &["debito", "deb"]);
        let credit_col = columns::resolve_loose(table, &["credito", "cred"]);
        let date_col = columns::resolve_loose(table, &["data", "dt", "data_lancamento"]);
        let doc_col = columns::resolve_loose(table, &["lote_sub_doc_linha", "lote", "documento", "doc"]);
        let history_col = columns::resolve_loose(table, &["historico", "hist", "descricao"]);

        let mut postings = Vec::new();
        for row in table.rows() {
            let debit = debit_col
                .map(|idx| parsing::parse_brazilian_number_or_zero(table.cell(row, idx)).abs())
                .unwrap_or(0.0);
            let credit = credit_col
                .map(|idx| parsing::parse_brazilian_number_or_zero(table.cell(row, idx)).abs())
                .unwrap_or(0.0);
            let (value, side) = if debit > 0.0 {
                (debit, "D")
            } else if credit > 0.0 {
                (credit, "C")
            } else {
                continue;
            };

            let item_account = item_col
                .map(|idx| parsing::cell_to_string(table.cell(row, idx)))
                .unwrap_or_default();
            let code_raw = code_col
                .map(|idx| parsing::cell_to_string(table.cell(row, idx)))
                .unwrap_or_default();

            postings.push(RawPosting {
                item_account_norm: normalize_loose(&item_account),
                item_account,
                counter_account: counter_col
                    .map(|idx| parsing::cell_to_string(table.cell(row, idx)))
                    .unwrap_or_default(),
                code_norm: normalize_account_code(&code_raw, prefix),
                code_raw,
                date: date_col
                    .map(|idx| parsing::format_date(table.cell(row, idx)))
                    .unwrap_or_default(),
                document: doc_col
                    .map(|idx| parsing::cell_to_string(table.cell(row, idx)))
                    .unwrap_or_default(),
                history: history_col
                    .map(|idx| parsing::cell_to_string(table.cell(row, idx)))
                    .unwrap_or_default(),
                value,
                side: side.to_string(),
            });
        }

        debug!("razão carregado: {} lançamentos", postings.len());
        GeneralLedger { postings }
    }

    pub fn is_empty(&self) -> bool {
        self.postings.is_empty()
    }

    fn postings_for_code<'a>(&'a self, code: &str) -> Vec<&'a RawPosting> {
        let loose = normalize_loose(code);
        self.postings
            .iter()
            .filter(|p| p.code_norm == code || (!loose.is_empty() && p.item_account_norm == loose))
            .collect()
    }
}

/// Financial titles indexed by code and issue date, consumed as razão
/// postings are explained. Explained postings never re-enter a selection.
struct FinancialMatchIndex {
    values: HashMap<String, Vec<f64>>,
}

impl FinancialMatchIndex {
    fn new(entries: &[FinancialEntry]) -> Self {
        let mut values: HashMap<String, Vec<f64>> = HashMap::new();
        for entry in entries {
            values
                .entry(format!("{}|{}", entry.code, entry.issue_date))
                .or_default()
                .push(entry.value);
        }
        FinancialMatchIndex { values }
    }

    fn consume(&mut self, code: &str, date: &str, value: f64) -> bool {
        if let Some(vals) = self.values.get_mut(&format!("{}|{}", code, date)) {
            if let Some(pos) = vals.iter().position(|v| (v - value).abs() <= TOLERANCE) {
                vals.swap_remove(pos);
                return true;
            }
        }
        false
    }
}

fn truncate_history(history: &str) -> String {
    if history.chars().count() > 50 {
        let cut: String = history.chars().take(50).collect();
        format!("{}...", cut)
    } else {
        history.to_string()
    }
}

fn account_group(account: &str) -> &str {
    match account.find('.') {
        Some(pos) => &account[..pos],
        None => account.get(..1).unwrap_or(""),
    }
}

/// Infers what kind of movement a posting represents from its history text
/// and the relation between origin and analysed account.
pub fn classify_movement(origin: &str, analysed: &str, history: &str) -> MovementKind {
    let hist = history.to_uppercase();
    if hist.contains("TRANSF") {
        MovementKind::Transferencia
    } else if hist.contains("RECLASSIF") {
        MovementKind::Reclassificacao
    } else if hist.contains("ALOC") || hist.contains("APROPRI") {
        MovementKind::Alocacao
    } else if hist.contains("AUTO") || hist.contains("SISTEM") || hist.contains("INTEGR") {
        MovementKind::LancamentoAutomatico
    } else if !origin.is_empty()
        && !analysed.is_empty()
        && account_group(origin) != account_group(analysed)
    {
        MovementKind::Transferencia
    } else {
        MovementKind::NaoIdentificado
    }
}

fn to_posting(raw: &RawPosting, analysed: &str) -> LedgerPosting {
    let conta_origem = if raw.counter_account.is_empty() {
        raw.item_account.clone()
    } else {
        raw.counter_account.clone()
    };
    let tipo_movimento = classify_movement(&conta_origem, analysed, &raw.history);
    LedgerPosting {
        conta_origem,
        descricao_conta: raw.item_account.clone(),
        valor: raw.value,
        tipo_lancamento: raw.side.clone(),
        data_lancamento: raw.date.clone(),
        documento: raw.document.clone(),
        historico: raw.history.clone(),
        tipo_movimento,
    }
}

/// Greedy subset selection: picks postings on the given side whose values
/// add up to `target` within tolerance. Returns empty when no combination
/// closes the gap, so a partial explanation is never reported as complete.
pub fn select_by_difference(
    postings: &[LedgerPosting],
    target: f64,
    side: &str,
) -> Vec<LedgerPosting> {
    let target = target.abs();
    if target <= TOLERANCE {
        return Vec::new();
    }

    let mut candidates: Vec<&LedgerPosting> =
        postings.iter().filter(|p| p.tipo_lancamento == side).collect();
    candidates.sort_by(|a, b| {
        b.valor
            .abs()
            .partial_cmp(&a.valor.abs())
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut selection = Vec::new();
    let mut sum = 0.0;
    for posting in candidates {
        if sum + posting.valor.abs() - target > TOLERANCE {
            continue;
        }
        sum += posting.valor.abs();
        selection.push(posting.clone());
        if (sum - target).abs() <= TOLERANCE {
            break;
        }
    }

    if (sum - target).abs() <= TOLERANCE {
        selection
    } else {
        Vec::new()
    }
}

fn financial_detail_postings(entries: &[FinancialEntry], code: &str) -> Vec<LedgerPosting> {
    entries
        .iter()
        .filter(|e| e.code == code)
        .map(|e| {
            let documento = if e.installment.is_empty() {
                e.document.clone()
            } else {
                format!("{}-{}", e.document, e.installment)
            };
            LedgerPosting {
                conta_origem: e.code.clone(),
                descricao_conta: e.name.clone(),
                valor: e.value,
                tipo_lancamento: String::new(),
                data_lancamento: e.issue_date.clone(),
                documento,
                historico: "Título em aberto no financeiro".to_string(),
                tipo_movimento: MovementKind::NaoIdentificado,
            }
        })
        .collect()
}

/// Builds the per-code drill-down. `ledger` is the razão already filtered to
/// the analysed account; `detailed` is the title-level financial base used
/// both for echo lists and for excluding postings already explained by a
/// financial title.
pub fn detailed_analysis(
    diffs: &[DiffEntry],
    detailed: &[FinancialEntry],
    accounting: &[AccountingTotal],
    ledger: &GeneralLedger,
    account: &str,
) -> Vec<CodeAnalysis> {
    let mut index = FinancialMatchIndex::new(detailed);
    let mut records = Vec::with_capacity(diffs.len());

    for diff in diffs {
        let postings = ledger.postings_for_code(&diff.code);

        // Postings that mirror an open financial title are already
        // explained and must not be offered to the selection.
        let unexplained: Vec<LedgerPosting> = postings
            .iter()
            .filter(|p| !index.consume(&diff.code, &p.date, p.value))
            .map(|p| to_posting(*p, account))
            .collect();

        let sem_lancamentos = postings.is_empty()
            && diff.difference.abs() > TOLERANCE
            && diff.classification == Classification::SoContabilidade;
        let nota_razao = if sem_lancamentos {
            "Sem lançamentos no período.".to_string()
        } else {
            String::new()
        };

        let mut razao_detalhes = Vec::new();
        let mut financeiro_detalhes = Vec::new();
        match diff.classification {
            Classification::SoContabilidade => {
                razao_detalhes = select_by_difference(&unexplained, diff.difference, "D");
            }
            Classification::SoFinanceiro => {
                financeiro_detalhes = financial_detail_postings(detailed, &diff.code);
            }
            Classification::DivergenteValor => {
                if diff.difference > 0.0 {
                    razao_detalhes = select_by_difference(&unexplained, diff.difference, "D");
                } else {
                    razao_detalhes = select_by_difference(&unexplained, diff.difference, "C");
                }
            }
            Classification::Conciliado => {}
        }

        let status = if diff.classification == Classification::Conciliado {
            RecordStatus::Verde
        } else {
            RecordStatus::Vermelho
        };
        let match_status = if status == RecordStatus::Verde {
            MatchStatus::Conciliado
        } else {
            MatchStatus::Divergente
        };

        let registros_match_financeiro: Vec<MatchedFinancialRecord> = detailed
            .iter()
            .filter(|e| e.code == diff.code)
            .map(|e| MatchedFinancialRecord {
                descricao: e.name.clone(),
                valor: e.value,
                data_emissao: e.issue_date.clone(),
                documento: e.document.clone(),
                status: match_status,
            })
            .collect();
        let registros_match_contabilidade: Vec<MatchedAccountingRecord> = accounting
            .iter()
            .filter(|t| t.code == diff.code)
            .map(|t| MatchedAccountingRecord {
                descricao: t.name.clone(),
                valor: t.value,
                status: match_status,
            })
            .collect();

        // Posting count for the code, whether or not a selection explains it.
        let lancamentos_razao = postings.len();

        records.push(CodeAnalysis {
            codigo: diff.code.clone(),
            nome: if diff.name.is_empty() { diff.code.clone() } else { diff.name.clone() },
            conta_contabil: account.to_string(),
            valor_financeiro: diff.financial_value,
            valor_contabilidade: diff.accounting_value,
            diferenca: diff.difference,
            tipo_diferenca: diff.classification,
            status,
            lancamentos_razao,
            lancamentos_razao_detalhes: razao_detalhes,
            lancamentos_financeiro_detalhes: financeiro_detalhes,
            registros_match_financeiro,
            registros_match_contabilidade,
            sem_lancamentos_razao: sem_lancamentos,
            nota_razao,
        });
    }

    records.sort_by(|a, b| {
        let ka = (a.status == RecordStatus::Verde, a.diferenca.abs());
        let kb = (b.status == RecordStatus::Verde, b.diferenca.abs());
        ka.partial_cmp(&kb).unwrap_or(std::cmp::Ordering::Equal)
    });

    info!(
        "análise detalhada: {} códigos, {} divergentes",
        records.len(),
        records.iter().filter(|r| r.status == RecordStatus::Vermelho).count()
    );
    records
}

pub fn analysis_summary(records: &[CodeAnalysis]) -> AnalysisSummary {
    let conciliados = records.iter().filter(|r| r.status == RecordStatus::Verde).count();
    let divergentes = records.len() - conciliados;
    AnalysisSummary {
        total_registros: records.len(),
        conciliados,
        divergentes,
        percentual_conciliacao: if records.is_empty() {
            0.0
        } else {
            conciliados as f64 / records.len() as f64 * 100.0
        },
    }
}

fn single_origin_note(posting: &LedgerPosting) -> String {
    let hist = if posting.historico.is_empty() {
        String::new()
    } else {
        format!(" ({})", truncate_history(&posting.historico))
    };
    match posting.tipo_movimento {
        MovementKind::Transferencia => {
            format!("Contrapartida em {}{}", posting.conta_origem, hist)
        }
        MovementKind::Reclassificacao => {
            format!("Reclassificação da conta {}{}", posting.conta_origem, hist)
        }
        MovementKind::Alocacao => {
            format!("Apropriação da conta {}{}", posting.conta_origem, hist)
        }
        MovementKind::LancamentoAutomatico => {
            format!("Lançamento automático - contrapartida {}{}", posting.conta_origem, hist)
        }
        MovementKind::NaoIdentificado => {
            format!("Contrapartida identificada: {}{}", posting.conta_origem, hist)
        }
    }
}

/// Chases accounting-only codes through the unfiltered general ledger to
/// identify where each balance came from.
pub fn deep_analysis(
    records: &[CodeAnalysis],
    ledger: &GeneralLedger,
    account: &str,
) -> Vec<DeepAnalysis> {
    records
        .iter()
        .filter(|r| r.tipo_diferenca == Classification::SoContabilidade)
        .map(|record| {
            if ledger.is_empty() {
                return DeepAnalysis {
                    codigo: record.codigo.clone(),
                    nome: record.nome.clone(),
                    valor_contabilidade: record.valor_contabilidade,
                    conta_analisada: account.to_string(),
                    origens_identificadas: Vec::new(),
                    total_origens: 0,
                    status_analise: OriginStatus::NaoIdentificada,
                    nota_explicativa: "Razão geral não disponível para análise.".to_string(),
                };
            }

            let mut matches = ledger.postings_for_code(&record.codigo);
            if matches.is_empty() {
                let variations = code_variations(&record.codigo);
                matches = ledger
                    .postings
                    .iter()
                    .filter(|p| {
                        let raw = normalize_loose(&p.code_raw);
                        !raw.is_empty() && variations.iter().any(|v| *v == raw)
                    })
                    .collect();
            }
            let origins: Vec<LedgerPosting> =
                matches.iter().map(|p| to_posting(*p, account)).collect();

            let (status, nota) = match origins.len() {
                0 => (
                    OriginStatus::NaoIdentificada,
                    format!(
                        "Registro {} com valor R$ {:.2} existe na conta analisada, mas não foi localizado no razão geral. Verificar inconsistência contábil.",
                        record.codigo, record.valor_contabilidade
                    ),
                ),
                1 => (OriginStatus::Identificada, single_origin_note(&origins[0])),
                n => {
                    let mut contas: Vec<String> = Vec::new();
                    for origin in &origins {
                        if !contas.contains(&origin.conta_origem) {
                            contas.push(origin.conta_origem.clone());
                        }
                        if contas.len() == 5 {
                            break;
                        }
                    }
                    let total: f64 = origins.iter().map(|o| o.valor).sum();
                    (
                        OriginStatus::MultiplasOrigens,
                        format!(
                            "Múltiplos lançamentos ({}) - Contrapartidas: {}. Total: R$ {:.2}",
                            n,
                            contas.join(", "),
                            total
                        ),
                    )
                }
            };

            DeepAnalysis {
                codigo: record.codigo.clone(),
                nome: record.nome.clone(),
                valor_contabilidade: record.valor_contabilidade,
                conta_analisada: account.to_string(),
                total_origens: origins.len(),
                origens_identificadas: origins,
                status_analise: status,
                nota_explicativa: nota,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::code::CodePrefix;
    use crate::diff::compute_differences;
    use crate::financial::{FinancialTotal, Term};
    use serde_json::json;

    fn razao_table() -> Table {
        Table::new(
            vec![
                "DATA".into(),
                "LOTE/SUB/DOC/LINHA".into(),
                "HISTORICO".into(),
                "XPARTIDA".into(),
                "ITEM CONTA".into(),
                "COD CL VAL".into(),
                "DEBITO".into(),
                "CREDITO".into(),
            ],
            vec![
                vec![
                    json!("10/01/2025"),
                    json!("0001/1/000123/1"),
                    json!("TRANSF ENTRE CONTAS"),
                    json!("2.1.1.01"),
                    json!("C01234500"),
                    json!("01234500"),
                    json!("300,00"),
                    json!(""),
                ],
                vec![
                    json!("11/01/2025"),
                    json!("0002/1/000124/1"),
                    json!("LANCAMENTO DIVERSO"),
                    json!(""),
                    json!("C01234500"),
                    json!("01234500"),
                    json!(""),
                    json!("120,00"),
                ],
            ],
        )
    }

    fn posting(valor: f64, side: &str) -> LedgerPosting {
        LedgerPosting {
            conta_origem: "2.1.1.01".into(),
            descricao_conta: String::new(),
            valor,
            tipo_lancamento: side.into(),
            data_lancamento: "10/01/2025".into(),
            documento: String::new(),
            historico: String::new(),
            tipo_movimento: MovementKind::NaoIdentificado,
        }
    }

    #[test]
    fn test_ledger_loads_one_side_per_posting() {
        let ledger = GeneralLedger::from_table(&razao_table(), CodePrefix::Customer);
        assert_eq!(ledger.postings.len(), 2);
        assert_eq!(ledger.postings[0].side, "D");
        assert_eq!(ledger.postings[0].value, 300.0);
        assert_eq!(ledger.postings[1].side, "C");
        assert_eq!(ledger.postings[0].code_norm, "C01234500");
    }

    #[test]
    fn test_classify_movement() {
        assert_eq!(classify_movement("2.1", "1.1", "TRANSF BANCO"), MovementKind::Transferencia);
        assert_eq!(
            classify_movement("1.1.2", "1.1.2", "RECLASSIFICACAO SALDO"),
            MovementKind::Reclassificacao
        );
        assert_eq!(classify_movement("1.1", "1.1", "APROPRIACAO CUSTO"), MovementKind::Alocacao);
        assert_eq!(
            classify_movement("1.1", "1.1", "LCTO INTEGRACAO"),
            MovementKind::LancamentoAutomatico
        );
        // Differing account groups imply a transfer even without keywords.
        assert_eq!(classify_movement("2.1.1", "1.1.2", "PAGAMENTO"), MovementKind::Transferencia);
        assert_eq!(classify_movement("1.1.1", "1.1.2", "PAGAMENTO"), MovementKind::NaoIdentificado);
    }

    #[test]
    fn test_select_by_difference_exact_subset() {
        let postings = vec![posting(300.0, "D"), posting(120.0, "C"), posting(500.0, "D")];
        let selected = select_by_difference(&postings, 300.0, "D");
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].valor, 300.0);
    }

    #[test]
    fn test_select_by_difference_no_combination() {
        let postings = vec![posting(300.0, "D"), posting(500.0, "D")];
        assert!(select_by_difference(&postings, 450.0, "D").is_empty());
        // Inside tolerance nothing needs explaining.
        assert!(select_by_difference(&postings, 0.01, "D").is_empty());
    }

    #[test]
    fn test_detailed_analysis_accounting_only_code() {
        let financial: Vec<FinancialTotal> = vec![];
        let accounting = vec![AccountingTotal {
            code: "C01234500".into(),
            name: "CLIENTE ALFA".into(),
            value: 300.0,
        }];
        let report = compute_differences(&financial, &accounting);
        let ledger = GeneralLedger::from_table(&razao_table(), CodePrefix::Customer);

        let records = detailed_analysis(&report.entries, &[], &accounting, &ledger, "1.1.2.01");
        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.tipo_diferenca, Classification::SoContabilidade);
        assert_eq!(record.status, RecordStatus::Vermelho);
        assert!(!record.sem_lancamentos_razao);
        // Both postings for the code are counted, even though only the 300
        // debit is selected as the explanation.
        assert_eq!(record.lancamentos_razao, 2);
        assert_eq!(record.lancamentos_razao_detalhes.len(), 1);
        assert_eq!(record.lancamentos_razao_detalhes[0].valor, 300.0);
        assert_eq!(record.registros_match_contabilidade.len(), 1);
        assert_eq!(record.registros_match_contabilidade[0].status, MatchStatus::Divergente);
    }

    #[test]
    fn test_detailed_analysis_flags_missing_postings() {
        let accounting = vec![AccountingTotal {
            code: "C99999900".into(),
            name: "SEM RAZAO".into(),
            value: 50.0,
        }];
        let report = compute_differences(&[], &accounting);
        let ledger = GeneralLedger::default();
        let records = detailed_analysis(&report.entries, &[], &accounting, &ledger, "1.1.2.01");
        assert!(records[0].sem_lancamentos_razao);
        assert_eq!(records[0].nota_razao, "Sem lançamentos no período.");
    }

    #[test]
    fn test_analysis_summary_percentage() {
        let accounting = vec![
            AccountingTotal { code: "C01".into(), name: "A".into(), value: 100.0 },
            AccountingTotal { code: "C02".into(), name: "B".into(), value: 50.0 },
        ];
        let financial = vec![FinancialTotal {
            code: "C01".into(),
            name: "A".into(),
            value: 100.0,
            days_overdue: None,
            term: Term::CurtoPrazo,
        }];
        let report = compute_differences(&financial, &accounting);
        let records =
            detailed_analysis(&report.entries, &[], &accounting, &GeneralLedger::default(), "1.1");
        let summary = analysis_summary(&records);
        assert_eq!(summary.total_registros, 2);
        assert_eq!(summary.conciliados, 1);
        assert_eq!(summary.percentual_conciliacao, 50.0);
    }

    #[test]
    fn test_deep_analysis_identifies_counter_account() {
        let accounting = vec![AccountingTotal {
            code: "C01234500".into(),
            name: "CLIENTE ALFA".into(),
            value: 300.0,
        }];
        let report = compute_differences(&[], &accounting);
        let ledger = GeneralLedger::from_table(&razao_table(), CodePrefix::Customer);
        let records = detailed_analysis(&report.entries, &[], &accounting, &ledger, "1.1.2.01");

        let deep = deep_analysis(&records, &ledger, "1.1.2.01");
        assert_eq!(deep.len(), 1);
        assert_eq!(deep[0].status_analise, OriginStatus::MultiplasOrigens);
        assert_eq!(deep[0].total_origens, 2);
        assert!(deep[0].nota_explicativa.contains("Múltiplos lançamentos (2)"));
    }

    #[test]
    fn test_deep_analysis_single_origin_note() {
        let table = Table::new(
            vec![
                "DATA".into(),
                "HISTORICO".into(),
                "XPARTIDA".into(),
                "ITEM CONTA".into(),
                "COD CL VAL".into(),
                "DEBITO".into(),
                "CREDITO".into(),
            ],
            vec![vec![
                json!("10/01/2025"),
                json!("TRANSF SALDO CLIENTE"),
                json!("2.1.1.01"),
                json!("C00990001"),
                json!("00990001"),
                json!("250,00"),
                json!(""),
            ]],
        );
        let accounting = vec![AccountingTotal {
            code: "C00990001".into(),
            name: "CLIENTE BETA".into(),
            value: 250.0,
        }];
        let report = compute_differences(&[], &accounting);
        let ledger = GeneralLedger::from_table(&table, CodePrefix::Customer);
        let records = detailed_analysis(&report.entries, &[], &accounting, &ledger, "1.1.2.01");

        let deep = deep_analysis(&records, &ledger, "1.1.2.01");
        assert_eq!(deep[0].status_analise, OriginStatus::Identificada);
        assert_eq!(
            deep[0].nota_explicativa,
            "Contrapartida em 2.1.1.01 (TRANSF SALDO CLIENTE)"
        );
    }

    #[test]
    fn test_deep_analysis_without_ledger() {
        let accounting = vec![AccountingTotal {
            code: "C01234500".into(),
            name: "CLIENTE ALFA".into(),
            value: 300.0,
        }];
        let report = compute_differences(&[], &accounting);
        let records =
            detailed_analysis(&report.entries, &[], &accounting, &GeneralLedger::default(), "1.1");
        let deep = deep_analysis(&records, &GeneralLedger::default(), "1.1");
        assert_eq!(deep[0].status_analise, OriginStatus::NaoIdentificada);
        assert_eq!(deep[0].nota_explicativa, "Razão geral não disponível para análise.");
    }
}
