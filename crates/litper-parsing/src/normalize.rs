use std::sync::LazyLock;

use regex::Regex;

use litper_types::{Carrier, Country, ShipmentStatus};

static GUIDE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z]{0,4}\d{6,15}[A-Z]{0,3}$").expect("valid guide regex"));

static DAYS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d{1,3})\s*(?:DIAS?|D)\b").expect("valid days regex"));

/// Upper-case ASCII rendition of `text` with Spanish accents removed, so
/// keyword rules don't care how the carrier spelled things.
pub fn fold_accents(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            'á' | 'à' | 'ä' | 'â' | 'Á' | 'À' | 'Ä' | 'Â' => 'A',
            'é' | 'è' | 'ë' | 'ê' | 'É' | 'È' | 'Ë' | 'Ê' => 'E',
            'í' | 'ì' | 'ï' | 'î' | 'Í' | 'Ì' | 'Ï' | 'Î' => 'I',
            'ó' | 'ò' | 'ö' | 'ô' | 'Ó' | 'Ò' | 'Ö' | 'Ô' => 'O',
            'ú' | 'ù' | 'ü' | 'û' | 'Ú' | 'Ù' | 'Ü' | 'Û' => 'U',
            'ñ' | 'Ñ' => 'N',
            other => other.to_ascii_uppercase(),
        })
        .collect()
}

const ISSUE_KEYWORDS: &[&str] = &[
    "NO ENTREGAD",
    "NOVEDAD",
    "DEVOLU",
    "DEVUELT",
    "RECHAZ",
    "REHUS",
    "SINIESTR",
    "DIRECCION ERRADA",
    "DIRECCION INCORRECTA",
    "NO EXISTE",
    "CLIENTE AUSENTE",
    "NO SE ENCONTR",
    "INCIDENCIA",
    "PROBLEMA",
    "ISSUE",
];

const DELIVERED_KEYWORDS: &[&str] = &["ENTREGAD", "ENTREGA EXITOSA", "DELIVERED"];

const OFFICE_KEYWORDS: &[&str] = &[
    "OFICINA",
    "RECLAME EN",
    "DISPONIBLE PARA RECOGER",
    "PUNTO DE RETIRO",
    "RETIRO EN",
    "IN_OFFICE",
];

const TRANSIT_KEYWORDS: &[&str] = &[
    "TRANSITO",
    "TRANSPORTE",
    "EN CAMINO",
    "EN RUTA",
    "REPARTO",
    "DESPACHAD",
    "CENTRO LOGISTICO",
    "EN DISTRIBUCION",
    "VIAJANDO",
    "IN_TRANSIT",
];

/// Map carrier status text to the shared status enum.
///
/// Exception phrases are checked before delivery so "NO ENTREGADO" is an
/// issue. Text that matches nothing is treated as pending.
pub fn normalize_status(text: &str) -> ShipmentStatus {
    let folded = fold_accents(text);
    let has = |words: &[&str]| words.iter().any(|w| folded.contains(w));

    if has(ISSUE_KEYWORDS) {
        ShipmentStatus::Issue
    } else if has(DELIVERED_KEYWORDS) {
        ShipmentStatus::Delivered
    } else if has(OFFICE_KEYWORDS) {
        ShipmentStatus::InOffice
    } else if has(TRANSIT_KEYWORDS) {
        ShipmentStatus::InTransit
    } else {
        ShipmentStatus::Pending
    }
}

/// Recognize a carrier name anywhere in `text`.
pub fn detect_carrier(text: &str) -> Carrier {
    let folded = fold_accents(text);
    let words: Vec<&str> = folded
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();
    let has_word = |w: &str| words.contains(&w);

    if folded.contains("INTERRAPIDISIMO") || folded.contains("INTER RAPIDISIMO") {
        Carrier::Interrapidisimo
    } else if folded.contains("SERVIENTREGA") {
        Carrier::Servientrega
    } else if folded.contains("COORDINADORA") {
        Carrier::Coordinadora
    } else if folded.contains("DEPRISA") {
        Carrier::Deprisa
    } else if has_word("TCC") {
        Carrier::Tcc
    } else if has_word("ENVIA") {
        Carrier::Envia
    } else {
        Carrier::Unknown
    }
}

/// Normalize a phone number to its national mobile form for `country`.
///
/// Accepts separators (spaces, dashes, dots, parentheses) and an optional
/// international prefix. Returns `None` for anything that is not a mobile
/// number of the right shape.
pub fn normalize_phone(raw: &str, country: Country) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty()
        || !raw
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, ' ' | '+' | '-' | '.' | '(' | ')'))
    {
        return None;
    }

    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    let code = country.dialing_code();
    let mut national = if digits.len() > country.mobile_len() && digits.starts_with(code) {
        digits[code.len()..].to_string()
    } else {
        digits
    };

    // Ecuadorian numbers drop the trunk zero after the country code.
    if country == Country::Ecuador && national.len() == 9 && national.starts_with('9') {
        national.insert(0, '0');
    }

    (national.len() == country.mobile_len() && national.starts_with(country.mobile_prefix()))
        .then_some(national)
}

/// Whether `token` looks like a guía (tracking number).
pub fn is_guide(token: &str) -> bool {
    GUIDE_RE.is_match(&token.trim().to_ascii_uppercase())
}

/// Extract an explicit day count such as "5 días" or "3d".
pub fn extract_days(text: &str) -> Option<u32> {
    let folded = fold_accents(text);
    DAYS_RE
        .captures(&folded)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}
