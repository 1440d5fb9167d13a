//! # Ledger Recon
//!
//! A library for reconciling Brazilian ERP exports: an origin ledger
//! (contas a receber or contas a pagar), the accounting balancete and
//! razão, and bank statements against the bank account's ledger.
//!
//! ## Core Concepts
//!
//! - **Origin ledger**: per-title financial report, aggregated per entity code
//! - **Balancete**: accounting balances filtered to the analysed account
//! - **Canonical code**: `C`/`F` + six-digit base + two-digit branch, the join key between ledgers
//! - **Tolerance**: differences of at most one cent count as reconciled
//! - **Base date**: every run is stamped and computed against a caller-supplied date, never the clock
//!
//! ## Example
//!
//! ```rust,ignore
//! use ledger_recon::*;
//! use serde_json::json;
//!
//! let request = AccountReconciliationRequest {
//!     origin: Table::new(
//!         vec![
//!             "Codigo-Lj-Nome do Cliente".into(),
//!             "Tit Vencidos Valor corrigido".into(),
//!             "Titulos a vencer Valor atual".into(),
//!             "Vencto Real".into(),
//!         ],
//!         vec![vec![
//!             json!("12345-00-CLIENTE ALFA"),
//!             json!("1.000,00"),
//!             json!("500,00"),
//!             json!("15/06/2025"),
//!         ]],
//!     ),
//!     accounting: Table::new(
//!         vec!["Código".into(), "Descrição".into(), "Saldo atual".into()],
//!         vec![vec![json!("01234500"), json!("CLIENTE ALFA"), json!("1.500,00")]],
//!     ),
//!     general_ledger: Table::new(
//!         vec!["Conta Contabil".into(), "DATA".into(), "HISTORICO".into(), "DEBITO".into()],
//!         vec![vec![json!("1.1.2.01"), json!("10/06/2025"), json!("NF 123"), json!("1.500,00")]],
//!     ),
//!     account_code: "1.1.2.01".to_string(),
//!     profile: LedgerProfile::receivables(),
//!     base_date: "30/06/2025".to_string(),
//! };
//!
//! let report = reconcile_account(&request).unwrap();
//! assert_eq!(report.resumo.situacao, Situation::Conciliado);
//! ```

pub mod accounting;
pub mod analysis;
pub mod bank_ledger;
pub mod bank_match;
pub mod code;
pub mod columns;
pub mod diff;
pub mod error;
pub mod financial;
pub mod parsing;
pub mod reconcile;
pub mod schema;
pub mod statement;
pub mod table;

pub use accounting::{normalize_accounting, AccountingTotal};
pub use analysis::{
    analysis_summary, classify_movement, deep_analysis, detailed_analysis, select_by_difference,
    GeneralLedger,
};
pub use bank_ledger::{
    extract_document_from_history, normalize_bank_ledger, BankLedgerEntry, PostingKind,
};
pub use bank_match::{normalize_doc_key, reconcile_days, BankMatchResult};
pub use code::{canonical_code, code_variations, display_name, normalize_account_code, CodePrefix};
pub use diff::{compute_differences, DiffEntry, DiffReport, DiffSummary};
pub use error::{ReconError, Result};
pub use financial::{
    aggregate, normalize_detailed, validate_layout, FinancialEntry, FinancialTotal, LayoutReport,
    LedgerProfile, Term,
};
pub use reconcile::{
    reconcile_account, reconcile_bank, AccountReconciliationRequest, BankReconciliationRequest,
};
pub use schema::*;
pub use statement::{normalize_statement, split_prefix_number, FlowKind, StatementEntry};
pub use table::Table;

/// Monetary comparison tolerance. Differences of at most one cent are
/// treated as equal everywhere in the crate.
pub const TOLERANCE: f64 = 0.01;
