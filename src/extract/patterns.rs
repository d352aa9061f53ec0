//! Entity detectors
//!
//! `PatternLibrary` compiles every detector regex once at construction and
//! exposes one pure method per detector. Detectors only read their input
//! text; multiplicity rules (first-match-wins fields, positional dates) and
//! field-memory updates belong to the assembler.

use crate::config::ExtractorConfig;
use crate::error::{Error, Result};
use regex::Regex;
use std::collections::HashSet;

/// Word that switches the raw-address heuristic on
const ADDRESS_TRIGGER: &str = "street";

/// Which bucket a qualifying monetary token lands in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoneyBucket {
    Salary,
    Amount,
}

/// One line-item match from the product detector
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductMatch {
    pub name: String,
    pub quantity: String,
    pub price: String,
}

/// Compiled detector set
pub struct PatternLibrary {
    person: Regex,
    age: Regex,
    gender: Regex,
    phone: Regex,
    email: Regex,
    digit_run: Regex,
    money_keyword: Option<Regex>,
    date: Regex,
    pincode: Regex,
    txn_ref: Regex,
    product: Regex,
    address_line: Regex,
    cash: Regex,
    config: ExtractorConfig,
}

impl PatternLibrary {
    pub fn new(config: &ExtractorConfig) -> Result<Self> {
        let money_keyword = if config.money_keywords.is_empty() {
            None
        } else {
            let alts: Vec<String> = config
                .money_keywords
                .iter()
                .map(|k| regex::escape(k))
                .collect();
            Some(compile(&format!(r"(?i)\b(?:{})\b", alts.join("|")))?)
        };

        Ok(Self {
            person: compile(r"\b[A-Z][a-z]+(?:\s[A-Z][a-z]+)+")?,
            age: compile(r"\b([A-Z][a-z]+(?:\s[A-Z][a-z]+)*) is (\d{1,3}) years")?,
            gender: compile(r"\b([A-Z][a-z]+(?:\s[A-Z][a-z]+)*) is (?:a )?((?i:male|female))\b")?,
            phone: compile(r"\b\d{10}\b")?,
            email: compile(r"[\w.-]+@[\w.-]+\.\w+")?,
            digit_run: compile(r"\b\d{3,}\b")?,
            money_keyword,
            date: compile(r"\b\d{2}/\d{2}/\d{4}\b")?,
            pincode: compile(r"\b\d{6}\b")?,
            txn_ref: compile(r"\bTXN\d+\b")?,
            product: compile(
                r"(?is)product name is ([a-z ]+).*?quantity is (\d+).*?price is (\d+)",
            )?,
            address_line: compile(r"\d+.*,.*")?,
            cash: compile(r"(?i)\bcash\b")?,
            config: config.clone(),
        })
    }

    // ===== Person detectors =====

    /// Capitalized multi-word phrases that pass the plausibility filter,
    /// deduplicated in first-seen order.
    pub fn persons(&self, text: &str) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for m in self.person.find_iter(text) {
            let candidate = m.as_str();
            if !self.is_plausible_name(candidate) {
                continue;
            }
            if seen.insert(candidate.to_string()) {
                out.push(candidate.to_string());
            }
        }
        out
    }

    fn is_plausible_name(&self, candidate: &str) -> bool {
        let parts = candidate.split_whitespace().count();
        if parts < 2 || parts > self.config.max_name_tokens {
            return false;
        }
        let lower = candidate.to_lowercase();
        !self
            .config
            .name_blocklist
            .iter()
            .any(|blocked| lower.contains(blocked.as_str()))
    }

    /// `(name, age)` pairs from the "<Name> is <N> years" shape.
    pub fn ages(&self, text: &str) -> Vec<(String, String)> {
        self.age
            .captures_iter(text)
            .map(|c| (c[1].to_string(), c[2].to_string()))
            .collect()
    }

    /// `(name, gender)` pairs, gender normalized to `Male`/`Female`.
    pub fn genders(&self, text: &str) -> Vec<(String, String)> {
        self.gender
            .captures_iter(text)
            .map(|c| (c[1].to_string(), title_case(&c[2])))
            .collect()
    }

    // ===== Contact detectors =====

    /// 10-digit runs, optionally constrained to a 6-9 leading digit.
    pub fn phones(&self, text: &str) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for m in self.phone.find_iter(text) {
            let token = m.as_str();
            if self.config.restrict_phone_prefix
                && !matches!(token.as_bytes()[0], b'6'..=b'9')
            {
                continue;
            }
            if seen.insert(token.to_string()) {
                out.push(token.to_string());
            }
        }
        out
    }

    pub fn emails(&self, text: &str) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for m in self.email.find_iter(text) {
            if seen.insert(m.as_str().to_string()) {
                out.push(m.as_str().to_string());
            }
        }
        out
    }

    // ===== Monetary detectors =====

    /// Digit runs of 3+ that sit within `money_window` characters after a
    /// money keyword. Runs inside a date never qualify. Deduplicated,
    /// first-seen order.
    pub fn monetary(&self, text: &str) -> Vec<String> {
        let date_spans: Vec<(usize, usize)> = self
            .date
            .find_iter(text)
            .map(|m| (m.start(), m.end()))
            .collect();

        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for m in self.digit_run.find_iter(text) {
            let overlaps_date = date_spans
                .iter()
                .any(|(s, e)| m.start() < *e && m.end() > *s);
            if overlaps_date || !self.keyword_precedes(text, m.start()) {
                continue;
            }
            if seen.insert(m.as_str().to_string()) {
                out.push(m.as_str().to_string());
            }
        }
        out
    }

    fn keyword_precedes(&self, text: &str, start: usize) -> bool {
        let Some(keyword) = &self.money_keyword else {
            return false;
        };
        keyword
            .find_iter(text)
            .any(|k| k.end() <= start && start - k.end() <= self.config.money_window)
    }

    /// Route a qualifying token by the salary threshold. Strictly-greater
    /// goes to Salary; the threshold itself and unparseable tokens stay in
    /// Amount.
    pub fn classify_money(&self, token: &str) -> MoneyBucket {
        match token.parse::<u64>() {
            Ok(value) if value > self.config.salary_threshold => MoneyBucket::Salary,
            _ => MoneyBucket::Amount,
        }
    }

    // ===== Code and date detectors =====

    /// `DD/MM/YYYY` matches in encounter order, not deduplicated (assignment
    /// is positional).
    pub fn dates(&self, text: &str) -> Vec<String> {
        self.date
            .find_iter(text)
            .map(|m| m.as_str().to_string())
            .collect()
    }

    /// Standalone 6-digit runs, deduplicated, first-seen order.
    pub fn pincodes(&self, text: &str) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for m in self.pincode.find_iter(text) {
            if seen.insert(m.as_str().to_string()) {
                out.push(m.as_str().to_string());
            }
        }
        out
    }

    /// `TXN<digits>` references, deduplicated, first-seen order.
    pub fn transaction_refs(&self, text: &str) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for m in self.txn_ref.find_iter(text) {
            if seen.insert(m.as_str().to_string()) {
                out.push(m.as_str().to_string());
            }
        }
        out
    }

    /// True when the text mentions a cash payment.
    pub fn mentions_cash(&self, text: &str) -> bool {
        self.cash.is_match(text)
    }

    // ===== Line-based detectors =====

    /// Name/quantity/price triples in encounter order. Positional, no
    /// deduplication.
    pub fn products(&self, text: &str) -> Vec<ProductMatch> {
        self.product
            .captures_iter(text)
            .map(|c| ProductMatch {
                name: c[1].trim().to_string(),
                quantity: c[2].to_string(),
                price: c[3].to_string(),
            })
            .collect()
    }

    /// Lines containing a note keyword, trimmed, order preserved, verbatim
    /// (no deduplication).
    pub fn notes(&self, text: &str) -> Vec<String> {
        text.lines()
            .filter(|line| {
                let lower = line.to_lowercase();
                self.config
                    .note_keywords
                    .iter()
                    .any(|kw| lower.contains(kw.as_str()))
            })
            .map(|line| line.trim().to_string())
            .filter(|line| !line.is_empty())
            .collect()
    }

    /// Raw address lines (digit-led, comma-bearing) when the text mentions a
    /// street. Deduplicated, first-seen order.
    pub fn address_lines(&self, text: &str) -> Vec<String> {
        if !text.to_lowercase().contains(ADDRESS_TRIGGER) {
            return Vec::new();
        }
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for m in self.address_line.find_iter(text) {
            let line = m.as_str().trim().to_string();
            if seen.insert(line.clone()) {
                out.push(line);
            }
        }
        out
    }

    // ===== Dynamic fields =====

    /// Keyword-adjacency probe for a registered field: `<name>: value` or
    /// `<name> is value`, case-insensitive on the name, first match wins.
    pub fn custom_field(&self, text: &str, field_name: &str) -> Result<Option<String>> {
        let pattern = format!(
            r"(?i)\b{}\b\s*(?::|\bis\b)\s*(\S+)",
            regex::escape(field_name)
        );
        let probe = compile(&pattern)?;
        Ok(probe
            .captures(text)
            .map(|c| c[1].trim_end_matches(['.', ',', ';', ':', '!', '?']).to_string())
            .filter(|v| !v.is_empty()))
    }
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| Error::Pattern(e.to_string()))
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}
