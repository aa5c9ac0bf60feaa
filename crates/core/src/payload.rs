// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Typed payloads for each collection and their validation policies.
//!
//! Validation runs locally before any remote write; a payload that fails
//! validation is never sent.

use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::collection::Collection;
use crate::document::Fields;
use crate::error::{Error, Result};

/// A collection-specific document payload.
pub trait Payload: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// The collection this payload is stored in.
    const COLLECTION: Collection;

    /// Checks the collection's required-field policy.
    fn validate(&self) -> Result<()>;

    /// Short one-line description for listings.
    fn summary(&self) -> String;

    /// Serializes the payload into untyped document fields.
    fn to_fields(&self) -> Result<Fields> {
        match serde_json::to_value(self)? {
            serde_json::Value::Object(map) => Ok(map),
            other => Err(Error::InvalidInput(format!(
                "payload must serialize to an object, got {other}"
            ))),
        }
    }
}

fn require(field: &'static str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::FieldRequired { field });
    }
    Ok(())
}

fn require_positive(field: &'static str, amount: f64) -> Result<()> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(Error::InvalidField {
            field,
            reason: format!("must be a positive number, got {amount}"),
        });
    }
    Ok(())
}

/// A saved website login.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Credential {
    pub site: String,
    pub username: String,
    pub password: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Payload for Credential {
    const COLLECTION: Collection = Collection::Credentials;

    fn validate(&self) -> Result<()> {
        require("site", &self.site)?;
        require("username", &self.username)?;
        require("password", &self.password)
    }

    fn summary(&self) -> String {
        format!("{} ({})", self.site, self.username)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub title: String,
    #[serde(default)]
    pub content: String,
}

impl Payload for Note {
    const COLLECTION: Collection = Collection::Notes;

    fn validate(&self) -> Result<()> {
        require("title", &self.title)
    }

    fn summary(&self) -> String {
        self.title.clone()
    }
}

/// A checklist item. Tasks are the only orderable payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub title: String,
    #[serde(default)]
    pub done: bool,
}

impl Task {
    pub fn new(title: impl Into<String>) -> Self {
        Task {
            title: title.into(),
            done: false,
        }
    }
}

impl Payload for Task {
    const COLLECTION: Collection = Collection::Tasks;

    fn validate(&self) -> Result<()> {
        require("title", &self.title)
    }

    fn summary(&self) -> String {
        let mark = if self.done { "x" } else { " " };
        format!("[{}] {}", mark, self.title)
    }
}

/// An uploaded file. Metadata is copied verbatim from the object store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VaultItem {
    pub name: String,
    pub url: String,
    pub format: String,
    pub size_bytes: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
}

impl Payload for VaultItem {
    const COLLECTION: Collection = Collection::Vault;

    fn validate(&self) -> Result<()> {
        require("name", &self.name)?;
        require("url", &self.url)
    }

    fn summary(&self) -> String {
        match (self.width, self.height) {
            (Some(w), Some(h)) => format!("{} ({}, {}x{})", self.name, self.format, w, h),
            _ => format!("{} ({}, {} bytes)", self.name, self.format, self.size_bytes),
        }
    }
}

/// A single expense tracker transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    pub title: String,
    pub amount: f64,
    #[serde(default)]
    pub category: String,
    pub date: NaiveDate,
}

impl Payload for Expense {
    const COLLECTION: Collection = Collection::Expenses;

    fn validate(&self) -> Result<()> {
        require("title", &self.title)?;
        require_positive("amount", self.amount)
    }

    fn summary(&self) -> String {
        format!("{} {} {:.2}", self.date, self.title, self.amount)
    }
}

/// Direction of a ledger transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LedgerKind {
    Income,
    Expense,
}

impl LedgerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LedgerKind::Income => "income",
            LedgerKind::Expense => "expense",
        }
    }
}

impl fmt::Display for LedgerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for LedgerKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "income" => Ok(LedgerKind::Income),
            "expense" => Ok(LedgerKind::Expense),
            _ => Err(Error::InvalidLedgerKind(s.to_string())),
        }
    }
}

/// An income or expense transaction in the ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub title: String,
    pub amount: f64,
    pub kind: LedgerKind,
    #[serde(default)]
    pub category: String,
    pub date: NaiveDate,
}

impl LedgerEntry {
    /// Amount with income positive and expenses negative.
    pub fn signed_amount(&self) -> f64 {
        match self.kind {
            LedgerKind::Income => self.amount,
            LedgerKind::Expense => -self.amount,
        }
    }
}

impl Payload for LedgerEntry {
    const COLLECTION: Collection = Collection::Ledger;

    fn validate(&self) -> Result<()> {
        require("title", &self.title)?;
        require_positive("amount", self.amount)
    }

    fn summary(&self) -> String {
        format!(
            "{} {} {} {:.2}",
            self.date, self.kind, self.title, self.amount
        )
    }
}

fn decode<P: Payload>(fields: &Fields) -> Result<()> {
    serde_json::from_value::<P>(serde_json::Value::Object(fields.clone()))
        .map(drop)
        .map_err(|e| Error::InvalidDocument {
            collection: P::COLLECTION.to_string(),
            reason: e.to_string(),
        })
}

/// Checks that a full set of fields decodes into the collection's payload.
///
/// Only the shape is checked. Required-field policy is `Payload::validate`.
pub fn check_fields(collection: Collection, fields: &Fields) -> Result<()> {
    match collection {
        Collection::Credentials => decode::<Credential>(fields),
        Collection::Notes => decode::<Note>(fields),
        Collection::Tasks => decode::<Task>(fields),
        Collection::Vault => decode::<VaultItem>(fields),
        Collection::Expenses => decode::<Expense>(fields),
        Collection::Ledger => decode::<LedgerEntry>(fields),
    }
}

/// Net balance of a set of ledger entries.
pub fn ledger_balance<'a>(entries: impl IntoIterator<Item = &'a LedgerEntry>) -> f64 {
    entries.into_iter().map(LedgerEntry::signed_amount).sum()
}

#[cfg(test)]
#[path = "payload_tests.rs"]
mod tests;
