use serde::{Deserialize, Serialize};

use crate::error::WalletError;
use crate::models::Account;

/// What a label record points at (BIP-329 reference types).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LabelKind {
    Tx,
    Addr,
    Pubkey,
    Input,
    Output,
    Xpub,
}

/// One label record, BIP-329 shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelRecord {
    #[serde(rename = "type")]
    pub kind: LabelKind,
    #[serde(rename = "ref")]
    pub reference: String,
    pub label: String,
}

/// Parse a label import into a uniform record list.
///
/// Accepts a JSON array of records, JSON-lines (one record per line, the
/// canonical BIP-329 form) or a CSV block (`ref,label` or
/// `type,ref,label` per line). Any parse failure is reported as
/// `MalformedLabels` rather than panicking.
pub fn parse_labels(input: &str) -> Result<Vec<LabelRecord>, WalletError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }

    if trimmed.starts_with('[') {
        return serde_json::from_str(trimmed)
            .map_err(|e| WalletError::MalformedLabels(e.to_string()));
    }

    if trimmed.starts_with('{') {
        return trimmed
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(|line| {
                serde_json::from_str(line).map_err(|e| WalletError::MalformedLabels(e.to_string()))
            })
            .collect();
    }

    parse_csv(trimmed)
}

fn parse_csv(input: &str) -> Result<Vec<LabelRecord>, WalletError> {
    let mut records = Vec::new();

    for (number, line) in input.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        // Tolerate a header row
        if number == 0 && (line.eq_ignore_ascii_case("ref,label") || line.eq_ignore_ascii_case("type,ref,label")) {
            continue;
        }

        let fields: Vec<&str> = line.splitn(3, ',').map(str::trim).collect();
        let record = match fields.as_slice() {
            [reference, label] => LabelRecord {
                kind: infer_kind(reference),
                reference: reference.to_string(),
                label: label.to_string(),
            },
            [kind, reference, label] => LabelRecord {
                kind: parse_kind(kind).ok_or_else(|| {
                    WalletError::MalformedLabels(format!(
                        "line {}: unknown label type '{}'",
                        number + 1,
                        kind
                    ))
                })?,
                reference: reference.to_string(),
                label: label.to_string(),
            },
            _ => {
                return Err(WalletError::MalformedLabels(format!(
                    "line {}: expected 'ref,label' or 'type,ref,label'",
                    number + 1
                )))
            }
        };

        if record.reference.is_empty() {
            return Err(WalletError::MalformedLabels(format!(
                "line {}: empty reference",
                number + 1
            )));
        }
        records.push(record);
    }

    Ok(records)
}

/// `txid:vout` references are outputs, bare txids are transactions.
fn infer_kind(reference: &str) -> LabelKind {
    if reference.contains(':') {
        LabelKind::Output
    } else {
        LabelKind::Tx
    }
}

fn parse_kind(kind: &str) -> Option<LabelKind> {
    match kind.to_ascii_lowercase().as_str() {
        "tx" => Some(LabelKind::Tx),
        "addr" => Some(LabelKind::Addr),
        "pubkey" => Some(LabelKind::Pubkey),
        "input" => Some(LabelKind::Input),
        "output" => Some(LabelKind::Output),
        "xpub" => Some(LabelKind::Xpub),
        _ => None,
    }
}

/// Export an account's labels as a BIP-329 JSON array.
pub fn export_labels(account: &Account) -> Result<String, WalletError> {
    let mut records = Vec::new();

    for tx in &account.transactions {
        if let Some(label) = &tx.label {
            records.push(LabelRecord {
                kind: LabelKind::Tx,
                reference: tx.id.clone(),
                label: label.clone(),
            });
        }
    }
    for utxo in &account.utxos {
        if let Some(label) = &utxo.label {
            records.push(LabelRecord {
                kind: LabelKind::Output,
                reference: utxo.outpoint().to_string(),
                label: label.clone(),
            });
        }
    }

    serde_json::to_string_pretty(&records).map_err(|e| WalletError::Internal(e.to_string()))
}
