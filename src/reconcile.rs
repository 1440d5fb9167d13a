//! Reconciliation services: request validation, orchestration of the
//! normalizers and engines, and report assembly.

use chrono::NaiveDate;
use log::info;

use crate::accounting;
use crate::analysis::{self, GeneralLedger};
use crate::bank_ledger;
use crate::bank_match;
use crate::columns;
use crate::diff;
use crate::error::{ReconError, Result};
use crate::financial::{self, LedgerProfile};
use crate::parsing;
use crate::schema::{
    AccountingLargerDifference, AccountReconciliationReport, BankReconciliationReport,
    Classification, DiffDirection, OriginLargerDifference, ReconciliationSummary, Situation,
};
use crate::statement;
use crate::table::Table;
use crate::TOLERANCE;

/// Inputs of a financeiro x contabilidade run. `base_date` (`DD/MM/YYYY`)
/// is the reference for overdue computation and the processing stamp;
/// passing it instead of reading the clock makes runs reproducible.
pub struct AccountReconciliationRequest {
    pub origin: Table,
    pub accounting: Table,
    pub general_ledger: Table,
    pub account_code: String,
    pub profile: LedgerProfile,
    pub base_date: String,
}

/// Inputs of a bank run over one account.
pub struct BankReconciliationRequest {
    pub statement: Table,
    pub ledger: Table,
    pub account_code: String,
    pub base_date: String,
}

fn parse_base_date(base_date: &str) -> Result<NaiveDate> {
    if base_date.trim().is_empty() {
        return Err(ReconError::Validation("Data-base não informada".to_string()));
    }
    NaiveDate::parse_from_str(base_date.trim(), "%d/%m/%Y")
        .map_err(|_| ReconError::Validation(format!("Data-base inválida: {}", base_date)))
}

/// Keeps only the razão rows posted to the analysed account. Without a
/// resolvable account column the whole table passes through.
fn filter_ledger_by_account(table: &Table, account: &str) -> Table {
    let account_col = match columns::resolve_loose(table, &["conta_contabil", "conta"]) {
        Some(idx) => idx,
        None => return table.clone(),
    };
    let rows: Vec<Vec<serde_json::Value>> = table
        .rows()
        .iter()
        .filter(|row| parsing::cell_to_string(table.cell(row.as_slice(), account_col)) == account)
        .cloned()
        .collect();
    Table::new(table.columns().to_vec(), rows)
}

impl AccountReconciliationRequest {
    fn validate(&self) -> Result<NaiveDate> {
        if self.origin.is_empty() {
            return Err(ReconError::Validation("Base de origem vazia".to_string()));
        }
        if self.accounting.is_empty() {
            return Err(ReconError::Validation("Base contábil filtrada vazia".to_string()));
        }
        if self.general_ledger.is_empty() {
            return Err(ReconError::Validation(
                "Base geral da contabilidade vazia".to_string(),
            ));
        }
        parse_base_date(&self.base_date)
    }
}

/// Runs the full account reconciliation pipeline.
pub fn reconcile_account(
    request: &AccountReconciliationRequest,
) -> Result<AccountReconciliationReport> {
    let reference = request.validate()?;
    info!(
        "conciliação contábil da conta {} iniciada, data-base {}",
        request.account_code, request.base_date
    );

    let entries = financial::normalize_detailed(&request.origin, &request.profile, reference)?;
    let financial_totals = financial::aggregate(&entries);
    let accounting_totals =
        accounting::normalize_accounting(&request.accounting, request.profile.prefix)?;
    let report = diff::compute_differences(&financial_totals, &accounting_totals);

    let filtered = filter_ledger_by_account(&request.general_ledger, &request.account_code);
    let filtered_ledger = GeneralLedger::from_table(&filtered, request.profile.prefix);
    let full_ledger = GeneralLedger::from_table(&request.general_ledger, request.profile.prefix);

    let analysed = analysis::detailed_analysis(
        &report.entries,
        &entries,
        &accounting_totals,
        &filtered_ledger,
        &request.account_code,
    );
    let resumo_analise = analysis::analysis_summary(&analysed);
    let deep = analysis::deep_analysis(&analysed, &full_ledger, &request.account_code);

    let origem_maior: Vec<OriginLargerDifference> = report
        .entries
        .iter()
        .filter(|e| e.direction == DiffDirection::FinanceiroMaior)
        .map(|e| OriginLargerDifference {
            identificador: e.code.clone(),
            data: String::new(),
            valor: e.difference.abs(),
            cliente_fornecedor: e.name.clone(),
            descricao: "Valor maior no Financeiro".to_string(),
            encontrado_lancamentos: false,
            conta_contabil_encontrada: String::new(),
            conta_contabil_esperada: request.account_code.clone(),
            historico_lancamento: String::new(),
            data_lancamento: String::new(),
            criterio_match: String::new(),
            confianca_match: String::new(),
            situacao: "DIVERGENTE".to_string(),
        })
        .collect();
    let contabilidade_maior: Vec<AccountingLargerDifference> = report
        .entries
        .iter()
        .filter(|e| e.direction == DiffDirection::ContabilidadeMaior)
        .map(|e| AccountingLargerDifference {
            identificador: e.code.clone(),
            data: String::new(),
            valor: e.difference.abs(),
            conta_contabil: request.account_code.clone(),
            historico: "Valor maior na Contabilidade".to_string(),
            existe_origem: false,
            verificacoes_realizadas: vec!["Comparação por código".to_string()],
            situacao: "DIVERGENTE".to_string(),
        })
        .collect();

    let total_origem = report.summary.valor_total_financeiro;
    let total_destino = report.summary.valor_total_contabilidade;
    let diferenca = total_destino.abs() - total_origem.abs();
    let percentual_divergencia = if total_origem.abs() > 0.0 {
        diferenca.abs() / total_origem.abs() * 100.0
    } else {
        0.0
    };
    let resumo = ReconciliationSummary {
        total_origem,
        total_destino,
        diferenca,
        situacao: if diferenca.abs() <= TOLERANCE {
            Situation::Conciliado
        } else {
            Situation::Divergente
        },
        percentual_divergencia,
        quantidade_registros_origem: financial_totals.len(),
        quantidade_registros_destino: accounting_totals.len(),
        data_processamento: request.base_date.clone(),
    };

    let deep_count = analysed
        .iter()
        .filter(|r| r.tipo_diferenca == Classification::SoContabilidade)
        .count();
    let observacoes = vec![
        format!("Total de {} registros onde origem > contabilidade", origem_maior.len()),
        format!(
            "Total de {} registros onde contabilidade > origem",
            contabilidade_maior.len()
        ),
        format!("Percentual de divergência: {:.2}%", percentual_divergencia),
        format!("Total de {} registros SO_CONTABILIDADE analisados em profundidade", deep_count),
    ];
    let alertas = if diferenca.abs() > 1000.0 {
        vec!["Verificar diferenças significativas".to_string()]
    } else {
        vec!["Diferenças dentro do esperado".to_string()]
    };

    Ok(AccountReconciliationReport {
        resumo,
        diferencas_origem_maior: origem_maior,
        diferencas_contabilidade_maior: contabilidade_maior,
        analise_detalhada: analysed,
        resumo_analise,
        analise_profunda_contabil: deep,
        observacoes,
        alertas,
    })
}

impl BankReconciliationRequest {
    fn validate(&self) -> Result<NaiveDate> {
        if self.statement.is_empty() {
            return Err(ReconError::Validation("Base do extrato bancário vazia".to_string()));
        }
        if self.ledger.is_empty() {
            return Err(ReconError::Validation("Base do razão contábil vazia".to_string()));
        }
        parse_base_date(&self.base_date)
    }
}

/// Runs the full bank reconciliation pipeline.
pub fn reconcile_bank(request: &BankReconciliationRequest) -> Result<BankReconciliationReport> {
    request.validate()?;
    info!(
        "conciliação bancária da conta {} iniciada, data-base {}",
        request.account_code, request.base_date
    );

    let statement_entries = statement::normalize_statement(&request.statement)?;
    let ledger_entries = bank_ledger::normalize_bank_ledger(&request.ledger)?;
    let result = bank_match::reconcile_days(&statement_entries, &ledger_entries, &request.base_date);

    let observacoes = vec![
        format!("Conciliação bancária da conta {}", request.account_code),
        format!("Data-base: {}", request.base_date),
        format!("Total de {} dias analisados", result.summary.qtd_dias),
        format!("Percentual de conciliação: {:.2}%", result.summary.percentual_conciliacao),
    ];

    let mut alertas = Vec::new();
    if result.summary.dif_total_entradas.abs() > TOLERANCE {
        alertas.push(format!(
            "Diferença em entradas/débitos: R$ {:.2}",
            result.summary.dif_total_entradas
        ));
    }
    if result.summary.dif_total_saidas.abs() > TOLERANCE {
        alertas.push(format!(
            "Diferença em saídas/créditos: R$ {:.2}",
            result.summary.dif_total_saidas
        ));
    }
    if result.summary.qtd_divergentes > 0 {
        alertas.push(format!("{} dia(s) com divergência", result.summary.qtd_divergentes));
    }
    if !result.so_extrato.is_empty() {
        alertas.push(format!("{} registro(s) apenas no extrato", result.so_extrato.len()));
    }
    if !result.so_razao.is_empty() {
        alertas.push(format!("{} registro(s) apenas no razão", result.so_razao.len()));
    }
    if alertas.is_empty() {
        alertas.push("Conciliação OK - Todos os dias conferem".to_string());
    }

    let dias_divergentes: Vec<_> = result
        .days
        .iter()
        .filter(|d| d.status == Situation::Divergente)
        .cloned()
        .collect();
    let dias_conciliados: Vec<_> = result
        .days
        .iter()
        .filter(|d| d.status == Situation::Conciliado)
        .cloned()
        .collect();

    Ok(BankReconciliationReport {
        resumo: result.summary,
        movimentos_por_dia: result.days,
        dias_divergentes,
        dias_conciliados,
        registros_so_extrato: result.so_extrato,
        registros_so_razao: result.so_razao,
        observacoes,
        alertas,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn origin_table() -> Table {
        Table::new(
            vec![
                "Codigo-Lj-Nome do Cliente".into(),
                "Tit Vencidos Valor corrigido".into(),
                "Titulos a vencer Valor atual".into(),
                "Vencto Real".into(),
            ],
            vec![vec![
                json!("12345-00-CLIENTE ALFA"),
                json!("1.000,00"),
                json!("500,00"),
                json!("15/06/2025"),
            ]],
        )
    }

    fn accounting_table(balance: &str) -> Table {
        Table::new(
            vec!["Código".into(), "Descrição".into(), "Saldo atual".into()],
            vec![vec![json!("01234500"), json!("CLIENTE ALFA"), json!(balance)]],
        )
    }

    fn razao_table() -> Table {
        Table::new(
            vec![
                "Conta Contabil".into(),
                "DATA".into(),
                "HISTORICO".into(),
                "COD CL VAL".into(),
                "DEBITO".into(),
            ],
            vec![vec![
                json!("1.1.2.01"),
                json!("10/06/2025"),
                json!("LANCAMENTO"),
                json!("01234500"),
                json!("1.500,00"),
            ]],
        )
    }

    fn request(balance: &str) -> AccountReconciliationRequest {
        AccountReconciliationRequest {
            origin: origin_table(),
            accounting: accounting_table(balance),
            general_ledger: razao_table(),
            account_code: "1.1.2.01".to_string(),
            profile: LedgerProfile::receivables(),
            base_date: "30/06/2025".to_string(),
        }
    }

    #[test]
    fn test_reconciled_account_run() {
        let report = reconcile_account(&request("1.500,00")).unwrap();
        assert_eq!(report.resumo.situacao, Situation::Conciliado);
        assert_eq!(report.resumo.total_origem, 1500.0);
        assert_eq!(report.resumo.total_destino, 1500.0);
        assert_eq!(report.resumo.data_processamento, "30/06/2025");
        assert!(report.diferencas_origem_maior.is_empty());
        assert_eq!(report.resumo_analise.percentual_conciliacao, 100.0);
        assert_eq!(report.alertas, vec!["Diferenças dentro do esperado".to_string()]);
    }

    #[test]
    fn test_divergent_account_run() {
        let report = reconcile_account(&request("3.000,00")).unwrap();
        assert_eq!(report.resumo.situacao, Situation::Divergente);
        assert_eq!(report.resumo.diferenca, 1500.0);
        assert_eq!(report.diferencas_contabilidade_maior.len(), 1);
        assert_eq!(report.diferencas_contabilidade_maior[0].valor, 1500.0);
        assert_eq!(report.alertas, vec!["Verificar diferenças significativas".to_string()]);
        assert!(report
            .observacoes
            .iter()
            .any(|o| o == "Percentual de divergência: 100.00%"));
    }

    #[test]
    fn test_validation_messages() {
        let mut req = request("1.500,00");
        req.origin = Table::default();
        let err = reconcile_account(&req).unwrap_err();
        assert!(err.to_string().contains("Base de origem vazia"));

        let mut req = request("1.500,00");
        req.base_date = String::new();
        let err = reconcile_account(&req).unwrap_err();
        assert!(err.to_string().contains("Data-base não informada"));

        let mut req = request("1.500,00");
        req.base_date = "2025-06-30".to_string();
        let err = reconcile_account(&req).unwrap_err();
        assert!(err.to_string().contains("Data-base inválida"));
    }

    fn statement_table() -> Table {
        Table::new(
            vec![
                "DATA".into(),
                "PREFIXO/TITULO".into(),
                "ENTRADAS".into(),
                "SAIDAS".into(),
            ],
            vec![vec![json!("05/01/2025"), json!("NF-000123"), json!("1.000,00"), json!("")]],
        )
    }

    fn bank_ledger_table() -> Table {
        Table::new(
            vec!["DATA".into(), "HISTORICO".into(), "DEBITO".into(), "CREDITO".into()],
            vec![vec![
                json!("05/01/2025"),
                json!("CFOP: 5101 NF 000123 - CLIENTE ALFA"),
                json!("1.000,00"),
                json!(""),
            ]],
        )
    }

    #[test]
    fn test_bank_run_end_to_end() {
        let report = reconcile_bank(&BankReconciliationRequest {
            statement: statement_table(),
            ledger: bank_ledger_table(),
            account_code: "1.1.1.02".to_string(),
            base_date: "31/01/2025".to_string(),
        })
        .unwrap();
        assert_eq!(report.resumo.situacao, Situation::Conciliado);
        assert_eq!(report.dias_conciliados.len(), 1);
        assert!(report.dias_divergentes.is_empty());
        assert_eq!(report.alertas, vec!["Conciliação OK - Todos os dias conferem".to_string()]);
        assert!(report
            .observacoes
            .contains(&"Conciliação bancária da conta 1.1.1.02".to_string()));
    }

    #[test]
    fn test_bank_validation_messages() {
        let err = reconcile_bank(&BankReconciliationRequest {
            statement: Table::default(),
            ledger: bank_ledger_table(),
            account_code: "x".to_string(),
            base_date: "31/01/2025".to_string(),
        })
        .unwrap_err();
        assert!(err.to_string().contains("Base do extrato bancário vazia"));
    }
}
