//! Report types shared across the engines.
//!
//! These are the wire shapes consumed by reconciliation frontends, so field
//! names serialize in Portuguese exactly as the reporting contract defines
//! them. Closed vocabularies (classification, status, movement kind) are
//! enums rather than free strings.

use serde::{Deserialize, Serialize};

/// Outcome of comparing one entity code across the two ledgers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Classification {
    #[serde(rename = "CONCILIADO")]
    Conciliado,
    #[serde(rename = "SO_FINANCEIRO")]
    SoFinanceiro,
    #[serde(rename = "SO_CONTABILIDADE")]
    SoContabilidade,
    #[serde(rename = "DIVERGENTE_VALOR")]
    DivergenteValor,
}

impl Classification {
    /// Tolerance first, then presence on each side. A code carried with a
    /// negative financial balance and nothing on the accounting side is a
    /// value divergence, not a one-sided record.
    pub fn classify(financial: f64, accounting: f64, difference: f64) -> Self {
        if difference.abs() <= crate::TOLERANCE {
            Classification::Conciliado
        } else if financial > 0.0 && accounting == 0.0 {
            Classification::SoFinanceiro
        } else if accounting > 0.0 && financial == 0.0 {
            Classification::SoContabilidade
        } else {
            Classification::DivergenteValor
        }
    }
}

/// Directional label for a per-code difference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiffDirection {
    #[serde(rename = "Sem diferença")]
    SemDiferenca,
    #[serde(rename = "Contabilidade > Financeiro")]
    ContabilidadeMaior,
    #[serde(rename = "Financeiro > Contabilidade")]
    FinanceiroMaior,
    #[serde(rename = "Exclusivo")]
    Exclusivo,
}

/// Overall situation of a reconciliation run or of a single day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Situation {
    #[serde(rename = "CONCILIADO")]
    Conciliado,
    #[serde(rename = "DIVERGENTE")]
    Divergente,
}

/// Traffic-light status of one analysed code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecordStatus {
    #[serde(rename = "verde")]
    Verde,
    #[serde(rename = "vermelho")]
    Vermelho,
}

/// Status stamped on individual matched records inside a code analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchStatus {
    #[serde(rename = "conciliado")]
    Conciliado,
    #[serde(rename = "divergente")]
    Divergente,
}

/// Movement kind inferred from a general-ledger posting's history text and
/// counter-account group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MovementKind {
    #[serde(rename = "TRANSFERENCIA")]
    Transferencia,
    #[serde(rename = "RECLASSIFICACAO")]
    Reclassificacao,
    #[serde(rename = "ALOCACAO")]
    Alocacao,
    #[serde(rename = "LANCAMENTO_AUTOMATICO")]
    LancamentoAutomatico,
    #[serde(rename = "NAO_IDENTIFICADO")]
    NaoIdentificado,
}

/// Origin-identification status of a deep analysis row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OriginStatus {
    #[serde(rename = "ORIGEM_NAO_IDENTIFICADA")]
    NaoIdentificada,
    #[serde(rename = "ORIGEM_IDENTIFICADA")]
    Identificada,
    #[serde(rename = "MULTIPLAS_ORIGENS")]
    MultiplasOrigens,
}

/// One general-ledger posting surfaced in a drill-down list. The entry side
/// is `"D"`, `"C"` or empty when the row carried no value column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerPosting {
    pub conta_origem: String,
    pub descricao_conta: String,
    pub valor: f64,
    pub tipo_lancamento: String,
    pub data_lancamento: String,
    pub documento: String,
    pub historico: String,
    pub tipo_movimento: MovementKind,
}

/// A financial-side record echoed back for auditability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchedFinancialRecord {
    pub descricao: String,
    pub valor: f64,
    pub data_emissao: String,
    pub documento: String,
    pub status: MatchStatus,
}

/// An accounting-side record echoed back for auditability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchedAccountingRecord {
    pub descricao: String,
    pub valor: f64,
    pub status: MatchStatus,
}

/// Per-code drill-down produced by the detailed analysis engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodeAnalysis {
    pub codigo: String,
    pub nome: String,
    pub conta_contabil: String,
    pub valor_financeiro: f64,
    pub valor_contabilidade: f64,
    pub diferenca: f64,
    pub tipo_diferenca: Classification,
    pub status: RecordStatus,
    pub lancamentos_razao: usize,
    pub lancamentos_razao_detalhes: Vec<LedgerPosting>,
    pub lancamentos_financeiro_detalhes: Vec<LedgerPosting>,
    pub registros_match_financeiro: Vec<MatchedFinancialRecord>,
    pub registros_match_contabilidade: Vec<MatchedAccountingRecord>,
    pub sem_lancamentos_razao: bool,
    pub nota_razao: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisSummary {
    pub total_registros: usize,
    pub conciliados: usize,
    pub divergentes: usize,
    pub percentual_conciliacao: f64,
}

/// Deep analysis of one accounting-only code against the general ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeepAnalysis {
    pub codigo: String,
    pub nome: String,
    pub valor_contabilidade: f64,
    pub conta_analisada: String,
    pub origens_identificadas: Vec<LedgerPosting>,
    pub total_origens: usize,
    pub status_analise: OriginStatus,
    pub nota_explicativa: String,
}

/// A code whose financial value exceeds its accounting value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OriginLargerDifference {
    pub identificador: String,
    pub data: String,
    pub valor: f64,
    pub cliente_fornecedor: String,
    pub descricao: String,
    pub encontrado_lancamentos: bool,
    pub conta_contabil_encontrada: String,
    pub conta_contabil_esperada: String,
    pub historico_lancamento: String,
    pub data_lancamento: String,
    pub criterio_match: String,
    pub confianca_match: String,
    pub situacao: String,
}

/// A code whose accounting value exceeds its financial value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountingLargerDifference {
    pub identificador: String,
    pub data: String,
    pub valor: f64,
    pub conta_contabil: String,
    pub historico: String,
    pub existe_origem: bool,
    pub verificacoes_realizadas: Vec<String>,
    pub situacao: String,
}

/// Headline numbers of an account reconciliation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconciliationSummary {
    pub total_origem: f64,
    pub total_destino: f64,
    pub diferenca: f64,
    pub situacao: Situation,
    pub percentual_divergencia: f64,
    pub quantidade_registros_origem: usize,
    pub quantidade_registros_destino: usize,
    pub data_processamento: String,
}

/// Full account reconciliation report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountReconciliationReport {
    pub resumo: ReconciliationSummary,
    pub diferencas_origem_maior: Vec<OriginLargerDifference>,
    pub diferencas_contabilidade_maior: Vec<AccountingLargerDifference>,
    pub analise_detalhada: Vec<CodeAnalysis>,
    pub resumo_analise: AnalysisSummary,
    pub analise_profunda_contabil: Vec<DeepAnalysis>,
    pub observacoes: Vec<String>,
    pub alertas: Vec<String>,
}

/// Statement-side record without a ledger counterpart (or matched, when it
/// appears in a day's reconciled lists).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatementRecord {
    pub data: String,
    pub documento: String,
    pub prefixo: String,
    pub numero: String,
    pub descricao: String,
    pub valor: f64,
    pub tipo: String,
}

/// Bank-ledger record without a statement counterpart (or matched).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BankLedgerRecord {
    pub data: String,
    pub lote_doc: String,
    pub historico: String,
    pub documento_extraido: String,
    pub prefixo: String,
    pub numero: String,
    pub valor: f64,
    pub tipo: String,
}

/// One day of bank movement, with per-side totals, differences and the
/// matched and pending record lists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayMovement {
    pub data: String,
    pub entradas_extrato: f64,
    pub saidas_extrato: f64,
    pub debitos_razao: f64,
    pub creditos_razao: f64,
    pub dif_entradas: f64,
    pub dif_saidas: f64,
    pub status: Situation,
    pub so_extrato_entradas: Vec<StatementRecord>,
    pub so_extrato_saidas: Vec<StatementRecord>,
    pub so_razao_debitos: Vec<BankLedgerRecord>,
    pub so_razao_creditos: Vec<BankLedgerRecord>,
    pub conciliados_extrato_entradas: Vec<StatementRecord>,
    pub conciliados_extrato_saidas: Vec<StatementRecord>,
    pub conciliados_razao_debitos: Vec<BankLedgerRecord>,
    pub conciliados_razao_creditos: Vec<BankLedgerRecord>,
}

/// Headline numbers of a bank reconciliation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BankSummary {
    pub total_entradas_extrato: f64,
    pub total_saidas_extrato: f64,
    pub total_debitos_razao: f64,
    pub total_creditos_razao: f64,
    pub dif_total_entradas: f64,
    pub dif_total_saidas: f64,
    pub situacao: Situation,
    pub qtd_dias: usize,
    pub qtd_conciliados: usize,
    pub qtd_divergentes: usize,
    pub percentual_conciliacao: f64,
    pub data_processamento: String,
}

/// Full bank reconciliation report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BankReconciliationReport {
    pub resumo: BankSummary,
    pub movimentos_por_dia: Vec<DayMovement>,
    pub dias_divergentes: Vec<DayMovement>,
    pub dias_conciliados: Vec<DayMovement>,
    pub registros_so_extrato: Vec<StatementRecord>,
    pub registros_so_razao: Vec<BankLedgerRecord>,
    pub observacoes: Vec<String>,
    pub alertas: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification_tolerance() {
        assert_eq!(Classification::classify(100.0, 100.01, 0.01), Classification::Conciliado);
        assert_eq!(
            Classification::classify(100.0, 100.02, 0.02),
            Classification::DivergenteValor
        );
    }

    #[test]
    fn test_classification_one_sided() {
        assert_eq!(Classification::classify(100.0, 0.0, -100.0), Classification::SoFinanceiro);
        assert_eq!(Classification::classify(0.0, 100.0, 100.0), Classification::SoContabilidade);
        // Negative financial balance with no accounting side is a divergence.
        assert_eq!(
            Classification::classify(-100.0, 0.0, 100.0),
            Classification::DivergenteValor
        );
    }

    #[test]
    fn test_wire_names() {
        let json = serde_json::to_string(&Classification::SoFinanceiro).unwrap();
        assert_eq!(json, "\"SO_FINANCEIRO\"");
        let json = serde_json::to_string(&DiffDirection::FinanceiroMaior).unwrap();
        assert_eq!(json, "\"Financeiro > Contabilidade\"");
        let json = serde_json::to_string(&RecordStatus::Verde).unwrap();
        assert_eq!(json, "\"verde\"");
    }
}
