/// Publication and import status enums, with tolerant parsing of the
/// historical string values found in the store.
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Publication state of a department or commune.
///
/// Only `PUBLISHED` and `CANCELLED` are ever written back by this engine;
/// everything else the store may contain is mapped onto one of these three
/// variants at read time by [`PublicationStatus::from_raw`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PublicationStatus {
    Pending,
    Published,
    Cancelled,
}

/// Import state of an electoral cell (CEL).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImportStatus {
    NotImported,
    Imported,
    Processed,
}

lazy_static! {
    static ref NON_ALNUM: Regex = Regex::new(r"[^A-Z0-9]+").unwrap();
}

/// Collapse a raw status string to a comparable token: uppercase, accents
/// folded, every run of separators replaced by a single underscore.
fn normalize_token(raw: &str) -> String {
    let folded: String = raw
        .trim()
        .to_uppercase()
        .chars()
        .map(|c| match c {
            'À' | 'Â' | 'Ä' => 'A',
            'É' | 'È' | 'Ê' | 'Ë' => 'E',
            'Î' | 'Ï' => 'I',
            'Ô' | 'Ö' => 'O',
            'Ù' | 'Û' | 'Ü' => 'U',
            'Ç' => 'C',
            other => other,
        })
        .collect();
    NON_ALNUM
        .replace_all(&folded, "_")
        .trim_matches('_')
        .to_string()
}

impl PublicationStatus {
    /// Map any of the known historical spellings onto the closed enum.
    ///
    /// The published-equivalent set is tolerant on purpose: the store has
    /// accumulated `PUBLIE`, `ACTIF`, `EN COURS` and friends over time, and
    /// all of them must keep counting as published on the read path.
    pub fn from_raw(raw: &str) -> Self {
        match normalize_token(raw).as_str() {
            "PUBLISHED" | "PUBLIE" | "PUBLIEE" | "ACTIF" | "ACTIVE" | "EN_COURS"
            | "IN_PROGRESS" => Self::Published,
            "CANCELLED" | "CANCELED" | "ANNULE" | "ANNULEE" => Self::Cancelled,
            _ => Self::Pending,
        }
    }

    /// The canonical spelling written back to the store.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Published => "PUBLISHED",
            Self::Cancelled => "CANCELLED",
        }
    }

    pub fn is_published(&self) -> bool {
        matches!(self, Self::Published)
    }
}

impl ImportStatus {
    pub fn from_raw(raw: &str) -> Self {
        match normalize_token(raw).as_str() {
            "IMPORTED" | "IMPORTE" | "IMPORTEE" => Self::Imported,
            "PROCESSED" | "TRAITE" | "TRAITEE" | "COMPLETE" | "COMPLETED" => Self::Processed,
            _ => Self::NotImported,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotImported => "NOT_IMPORTED",
            Self::Imported => "IMPORTED",
            Self::Processed => "PROCESSED",
        }
    }

    /// A cell still blocking publication of its owning zone.
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::NotImported)
    }
}
