// SPDX-License-Identifier: GPL-3.0-only

//! Identification result types

use crate::constants::analysis::FUN_FACTS_RANGE;
use crate::errors::AnalysisError;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// One labelled property of the identified object, in display order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    pub label: String,
    pub value: String,
}

/// Structured description of the main object in a captured frame
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    /// Common name
    pub name: String,
    /// Scientific name for living things, technical name otherwise
    #[serde(default)]
    pub scientific_name: Option<String>,
    pub category: String,
    pub description: String,
    pub fun_facts: Vec<String>,
    pub attributes: Vec<Attribute>,
}

impl AnalysisResult {
    /// Parse the JSON text returned by the analysis service
    ///
    /// Missing required fields or wrong types are a malformed response. An
    /// unusual number of fun facts is only logged.
    pub fn from_json(text: &str) -> Result<Self, AnalysisError> {
        let result: AnalysisResult = serde_json::from_str(text)?;

        if !FUN_FACTS_RANGE.contains(&result.fun_facts.len()) {
            warn!(
                count = result.fun_facts.len(),
                name = %result.name,
                "Unexpected number of fun facts"
            );
        }

        Ok(result)
    }
}
