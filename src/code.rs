//! Canonical entity codes.
//!
//! Customers and suppliers are identified across ledgers by a code of the
//! form `{prefix}{base}{branch}`: prefix `C` (customer) or `F` (supplier),
//! a base of up to six digits and a two-digit branch, both zero-padded.
//! Source fields arrive as `BASE-BRANCH-NAME` free text, as bare digit
//! runs, or as account-plan shaped strings; one convention is applied on
//! every side so codes join cleanly.

use serde::{Deserialize, Serialize};

pub const BASE_WIDTH: usize = 6;
pub const BRANCH_WIDTH: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CodePrefix {
    Customer,
    Supplier,
}

impl CodePrefix {
    pub fn as_str(&self) -> &'static str {
        match self {
            CodePrefix::Customer => "C",
            CodePrefix::Supplier => "F",
        }
    }
}

fn alphanumeric(s: &str) -> String {
    s.chars().filter(|c| c.is_ascii_alphanumeric()).collect()
}

fn digits(s: &str) -> String {
    s.chars().filter(|c| c.is_ascii_digit()).collect()
}

fn pad(s: &str, width: usize) -> String {
    if s.len() >= width {
        s.to_string()
    } else {
        format!("{}{}", "0".repeat(width - s.len()), s)
    }
}

/// Splits a `BASE-BRANCH-NAME` field into its three parts. Without a
/// separator the branch is empty and the name echoes the input.
pub fn split_base_branch(text: &str) -> (String, String, String) {
    let text = text.trim();
    let mut parts = text.splitn(3, '-');
    let base = alphanumeric(parts.next().unwrap_or(""));
    let branch = parts.next().map(digits).unwrap_or_default();
    let name = parts
        .next()
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .unwrap_or_else(|| text.to_string());
    (base, branch, name)
}

/// Packs a bare digit run into the base-6 + branch-2 convention.
fn pack_digit_run(run: &str) -> (String, String) {
    if run.len() >= BASE_WIDTH + BRANCH_WIDTH {
        (
            run[..BASE_WIDTH].to_string(),
            run[BASE_WIDTH..BASE_WIDTH + BRANCH_WIDTH].to_string(),
        )
    } else if run.len() >= BASE_WIDTH {
        (run[..BASE_WIDTH].to_string(), "0".repeat(BRANCH_WIDTH))
    } else {
        (pad(run, BASE_WIDTH), "0".repeat(BRANCH_WIDTH))
    }
}

/// Canonical code for an entity field. Empty when no base can be extracted,
/// in which case the record should be discarded.
pub fn canonical_code(text: &str, prefix: CodePrefix) -> String {
    let (base, branch, _) = split_base_branch(text);
    if base.is_empty() {
        return String::new();
    }

    if !branch.is_empty() {
        let base_digits = digits(&base);
        if base_digits.len() == base.len() {
            // Digit-only base and branch reduce to one run so wide codes
            // pack the same way as bare digit streams.
            let run = format!("{}{}", pad(&base_digits, BASE_WIDTH), pad(&branch, BRANCH_WIDTH));
            let (b, l) = pack_digit_run(&run);
            return format!("{}{}{}", prefix.as_str(), b, l);
        }
        // Alphanumeric bases pass through unpadded.
        return format!("{}{}{}", prefix.as_str(), base, pad(&branch, BRANCH_WIDTH));
    }

    // No separator: all digits in the field form one run.
    let run = digits(text);
    if run.is_empty() {
        return format!("{}{}", prefix.as_str(), base);
    }
    let (b, l) = pack_digit_run(&run);
    format!("{}{}{}", prefix.as_str(), b, l)
}

/// Canonical code for an accounting-side field. Balancete codes come as a
/// bare account-plan string, so only the digit stream matters.
pub fn normalize_account_code(text: &str, prefix: CodePrefix) -> String {
    let run = digits(text);
    if run.is_empty() {
        return String::new();
    }
    let (base, branch) = pack_digit_run(&run);
    format!("{}{}{}", prefix.as_str(), base, branch)
}

/// Display name behind a `BASE-BRANCH-NAME` field.
pub fn display_name(text: &str) -> String {
    let (_, _, name) = split_base_branch(text);
    name
}

/// Alphanumeric-only view of a code-ish value, used to compare ITEMCONTA
/// style columns (which keep the prefix letter but vary punctuation).
pub fn normalize_loose(text: &str) -> String {
    alphanumeric(text.trim())
}

/// Lookup variations for flexible razão searches: the code itself, without
/// its prefix, and without leading zeros.
pub fn code_variations(code: &str) -> Vec<String> {
    let mut variations = vec![code.to_string()];
    if code.starts_with('C') || code.starts_with('F') {
        let bare = &code[1..];
        if !bare.is_empty() && !variations.iter().any(|v| v == bare) {
            variations.push(bare.to_string());
        }
        let stripped = bare.trim_start_matches('0');
        if !stripped.is_empty() && !variations.iter().any(|v| v == stripped) {
            variations.push(stripped.to_string());
        }
    }
    variations
}
