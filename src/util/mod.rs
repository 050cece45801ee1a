//
//  bamboo-client
//  util/mod.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! Utility functions shared across the crate.
//!
//! - URL template filling (`/result/{plan_key}.json`)
//! - JSON value stringification for filtering and parameter inheritance
//! - Minimal HTML entity decoding for scraped form pages

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::api::common::{BambooError, Params, Result};

/// Placeholder syntax used by resource URL templates: `{name}`.
static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{([a-z_]+)\}").unwrap());

/// Lists the placeholder names of a template in order of appearance.
pub fn placeholders(template: &str) -> Vec<&str> {
    PLACEHOLDER
        .captures_iter(template)
        .filter_map(|c| c.get(1).map(|m| m.as_str()))
        .collect()
}

/// Substitutes every `{name}` in `template` with the matching parameter.
///
/// # Errors
///
/// Returns [`BambooError::MissingArgument`] listing every placeholder that
/// has no value in `params`.
pub fn fill_template(template: &str, params: &Params) -> Result<String> {
    let missing: Vec<String> = placeholders(template)
        .into_iter()
        .filter(|name| !params.contains_key(*name))
        .map(str::to_string)
        .collect();
    if !missing.is_empty() {
        return Err(BambooError::MissingArgument(missing));
    }

    Ok(PLACEHOLDER
        .replace_all(template, |caps: &regex::Captures| params[&caps[1]].clone())
        .into_owned())
}

/// Renders a JSON scalar the way it reads in a URL or a form field.
///
/// Strings are returned verbatim, numbers and booleans as their JSON text.
/// `null` yields `None`. Arrays and objects are rendered as compact JSON.
pub fn value_to_string(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        other => Some(other.to_string()),
    }
}

/// Character references: decimal, hexadecimal or named.
static ENTITY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"&(?:#([0-9]{1,7})|#[xX]([0-9a-fA-F]{1,6})|([a-zA-Z][a-zA-Z0-9]{1,31}));").unwrap());

/// Decodes HTML character references in scraped page text.
///
/// Numeric references (`&#39;`, `&#x27;`) are decoded for any valid code
/// point; named references for the HTML 4 Latin-1, markup and common
/// punctuation sets. Unknown or invalid references are left as written.
/// Decoding is a single pass, so `&amp;lt;` yields `&lt;`.
pub fn html_unescape(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }
    ENTITY
        .replace_all(text, |caps: &regex::Captures| {
            let decoded = if let Some(dec) = caps.get(1) {
                dec.as_str().parse::<u32>().ok().and_then(char::from_u32)
            } else if let Some(hex) = caps.get(2) {
                u32::from_str_radix(hex.as_str(), 16).ok().and_then(char::from_u32)
            } else {
                caps.get(3).and_then(|name| named_entity(name.as_str()))
            };
            match decoded {
                Some(c) => c.to_string(),
                None => caps[0].to_string(),
            }
        })
        .into_owned()
}

fn named_entity(name: &str) -> Option<char> {
    let c = match name {
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" => '\'',
        "nbsp" => '\u{a0}',
        "ndash" => '\u{2013}',
        "mdash" => '\u{2014}',
        "lsquo" => '\u{2018}',
        "rsquo" => '\u{2019}',
        "ldquo" => '\u{201c}',
        "rdquo" => '\u{201d}',
        "hellip" => '\u{2026}',
        "bull" => '\u{2022}',
        "euro" => '\u{20ac}',
        "trade" => '\u{2122}',
        _ => return latin1_entity(name),
    };
    Some(c)
}

/// HTML 4 Latin-1 entities, U+00A1 to U+00FF in code point order.
const LATIN1: [&str; 95] = [
    "iexcl", "cent", "pound", "curren", "yen", "brvbar", "sect", "uml", "copy", "ordf", "laquo",
    "not", "shy", "reg", "macr", "deg", "plusmn", "sup2", "sup3", "acute", "micro", "para",
    "middot", "cedil", "sup1", "ordm", "raquo", "frac14", "frac12", "frac34", "iquest", "Agrave",
    "Aacute", "Acirc", "Atilde", "Auml", "Aring", "AElig", "Ccedil", "Egrave", "Eacute", "Ecirc",
    "Euml", "Igrave", "Iacute", "Icirc", "Iuml", "ETH", "Ntilde", "Ograve", "Oacute", "Ocirc",
    "Otilde", "Ouml", "times", "Oslash", "Ugrave", "Uacute", "Ucirc", "Uuml", "Yacute", "THORN",
    "szlig", "agrave", "aacute", "acirc", "atilde", "auml", "aring", "aelig", "ccedil", "egrave",
    "eacute", "ecirc", "euml", "igrave", "iacute", "icirc", "iuml", "eth", "ntilde", "ograve",
    "oacute", "ocirc", "otilde", "ouml", "divide", "oslash", "ugrave", "uacute", "ucirc", "uuml",
    "yacute", "thorn", "yuml",
];

fn latin1_entity(name: &str) -> Option<char> {
    LATIN1
        .iter()
        .position(|n| *n == name)
        .and_then(|i| char::from_u32(0xA1 + i as u32))
}
