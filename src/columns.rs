//! Column resolution against heterogeneous spreadsheet layouts.
//!
//! Every ledger normalizer carries an ordered candidate list of normalized
//! column names plus, for the fuzzier reports, substring groups that must
//! all appear in a column name. Candidates are data, not scattered string
//! literals, so the layouts each normalizer targets stay reviewable in one
//! place.

use crate::error::{ReconError, Result};
use crate::table::Table;

/// Lowercases, strips accents, and collapses every non-alphanumeric run to a
/// single underscore (trimmed at both ends).
pub fn normalize_column_name(name: &str) -> String {
    let folded: String = name.trim().chars().map(fold_accent).collect();
    let lower = folded.to_lowercase();

    let mut out = String::with_capacity(lower.len());
    let mut last_underscore = true;
    for ch in lower.chars() {
        if ch.is_ascii_alphanumeric() {
            out.push(ch);
            last_underscore = false;
        } else if !last_underscore {
            out.push('_');
            last_underscore = true;
        }
    }
    while out.ends_with('_') {
        out.pop();
    }
    out
}

/// Folds the accented characters that show up in Brazilian ERP headers.
fn fold_accent(ch: char) -> char {
    match ch {
        'á' | 'à' | 'â' | 'ã' | 'ä' | 'Á' | 'À' | 'Â' | 'Ã' | 'Ä' => 'a',
        'é' | 'è' | 'ê' | 'ë' | 'É' | 'È' | 'Ê' | 'Ë' => 'e',
        'í' | 'ì' | 'î' | 'ï' | 'Í' | 'Ì' | 'Î' | 'Ï' => 'i',
        'ó' | 'ò' | 'ô' | 'õ' | 'ö' | 'Ó' | 'Ò' | 'Ô' | 'Õ' | 'Ö' => 'o',
        'ú' | 'ù' | 'û' | 'ü' | 'Ú' | 'Ù' | 'Û' | 'Ü' => 'u',
        'ç' | 'Ç' => 'c',
        'ñ' | 'Ñ' => 'n',
        _ => ch,
    }
}

/// First column whose normalized name equals one of `candidates`, tried in
/// candidate priority order.
pub fn resolve(table: &Table, candidates: &[&str]) -> Option<usize> {
    let normalized = table.normalized_columns();
    for cand in candidates {
        if let Some(idx) = normalized.iter().position(|c| c == cand) {
            return Some(idx);
        }
    }
    None
}

/// Exact match first, then substring containment of the candidate inside a
/// column name. Used by the bank normalizers, whose reports abbreviate
/// headers inconsistently.
pub fn resolve_loose(table: &Table, candidates: &[&str]) -> Option<usize> {
    if let Some(idx) = resolve(table, candidates) {
        return Some(idx);
    }
    let normalized = table.normalized_columns();
    for cand in candidates {
        if let Some(idx) = normalized.iter().position(|c| c.contains(cand)) {
            return Some(idx);
        }
    }
    None
}

/// Column containing all substrings of one group, groups tried in priority
/// order.
pub fn resolve_by_substrings(table: &Table, groups: &[&[&str]]) -> Option<usize> {
    let normalized = table.normalized_columns();
    for group in groups {
        if let Some(idx) = normalized
            .iter()
            .position(|c| group.iter().all(|sub| c.contains(sub)))
        {
            return Some(idx);
        }
    }
    None
}

/// Nth column (0-based) whose normalized name starts with `prefix`. The
/// balancete layout duplicates `Código`/`Descrição`: the first pair is the
/// chart-of-accounts one, the second is the entity pair this crate wants.
pub fn resolve_occurrence(table: &Table, prefix: &str, occurrence: usize) -> Option<usize> {
    let matches: Vec<usize> = table
        .normalized_columns()
        .iter()
        .enumerate()
        .filter(|(_, c)| c.starts_with(prefix))
        .map(|(i, _)| i)
        .collect();
    matches
        .get(occurrence)
        .or_else(|| matches.first())
        .copied()
}

/// Like [`resolve`], but a miss is a hard layout failure naming the logical
/// field and the columns present.
pub fn resolve_required(table: &Table, field: &str, candidates: &[&str]) -> Result<usize> {
    resolve(table, candidates).ok_or_else(|| ReconError::Layout {
        field: field.to_string(),
        columns: table.columns().to_vec(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn table(cols: &[&str]) -> Table {
        Table::new(
            cols.iter().map(|c| c.to_string()).collect(),
            vec![cols.iter().map(|_| json!(null)).collect()],
        )
    }

    #[test]
    fn test_normalize_column_name() {
        assert_eq!(normalize_column_name("Saldo Atual"), "saldo_atual");
        assert_eq!(normalize_column_name("  DESCRIÇÃO  "), "descricao");
        assert_eq!(
            normalize_column_name("Codigo-Lj-Nome do Cliente"),
            "codigo_lj_nome_do_cliente"
        );
        assert_eq!(normalize_column_name("LOTE/SUB/DOC/LINHA"), "lote_sub_doc_linha");
        assert_eq!(normalize_column_name("Vlr.juros ou permanencia"), "vlr_juros_ou_permanencia");
    }

    #[test]
    fn test_resolve_priority_order() {
        let t = table(&["Cliente", "Codigo-Lj-Nome do Cliente"]);
        let idx = resolve(&t, &["codigo_lj_nome_do_cliente", "cliente"]).unwrap();
        assert_eq!(idx, 1);
    }

    #[test]
    fn test_resolve_by_substrings() {
        let t = table(&["Tit Vencidos Valor corrigido", "Titulos a vencer Valor nominal"]);
        let idx = resolve_by_substrings(&t, &[&["tit", "vencidos", "valor", "corrigido"]]).unwrap();
        assert_eq!(idx, 0);
        let idx = resolve_by_substrings(&t, &[&["titulos", "a_vencer", "valor"]]).unwrap();
        assert_eq!(idx, 1);
    }

    #[test]
    fn test_resolve_occurrence_prefers_second() {
        let t = table(&["Código", "Descrição", "Código", "Descrição", "Saldo atual"]);
        assert_eq!(resolve_occurrence(&t, "codigo", 1), Some(2));
        assert_eq!(resolve_occurrence(&t, "descricao", 1), Some(3));
        // single occurrence falls back to the only one
        let t = table(&["Código", "Saldo atual"]);
        assert_eq!(resolve_occurrence(&t, "codigo", 1), Some(0));
    }

    #[test]
    fn test_resolve_required_reports_layout_error() {
        let t = table(&["Foo", "Bar"]);
        let err = resolve_required(&t, "Data de Vencimento", &["data_vencimento"]).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("Data de Vencimento"));
        assert!(msg.contains("Foo"));
    }
}
