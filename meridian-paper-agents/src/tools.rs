//! Tool callables for the paper sub-agents, grounded on the source
//! repository's `medical_paper_agent` sub-agent tool sets (literature
//! search, statistical analysis, section writing, guideline compliance).
//! Per the distilled Non-goals, the actual business logic behind these
//! (PubMed/ClinicalTrials lookups, statistical computation, prose
//! generation) is supplied by collaborators in the full system; what's
//! implemented here is deterministic and self-contained, standing in for
//! those opaque callables.

use async_trait::async_trait;
use meridian_state::{ArtifactValue, ComplianceReport, Reference, StatsReport};
use meridian_tool::{ToolDyn, ToolError};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;

/// Converts one node's raw JSON artifact into the typed `ArtifactValue`
/// the revision controller and paper router key on. Falls back to `Json`
/// when the key is unrecognised or the model's payload doesn't parse
/// into the expected shape, rather than failing the node.
pub fn to_artifact_value(key: &str, value: Value) -> ArtifactValue {
    match key {
        "references" => serde_json::from_value::<Vec<Reference>>(value.clone())
            .map(ArtifactValue::References)
            .unwrap_or(ArtifactValue::Json(value)),
        "stats_report" => serde_json::from_value::<StatsReport>(value.clone())
            .map(ArtifactValue::StatsReport)
            .unwrap_or(ArtifactValue::Json(value)),
        "manuscript_sections" => serde_json::from_value::<HashMap<String, String>>(value.clone())
            .map(ArtifactValue::ManuscriptSections)
            .unwrap_or(ArtifactValue::Json(value)),
        "compliance_report" => serde_json::from_value::<ComplianceReport>(value.clone())
            .map(ArtifactValue::ComplianceReport)
            .unwrap_or(ArtifactValue::Json(value)),
        _ => ArtifactValue::Json(value),
    }
}

/// `search_literature`: looks up sources for a research question. Stands
/// in for the source system's PubMed/ClinicalTrials search tools.
pub struct SearchLiteratureTool;

impl ToolDyn for SearchLiteratureTool {
    fn name(&self) -> &str {
        "search_literature"
    }

    fn description(&self) -> &str {
        "Search literature sources for a research question. Returns up to \
         max_results bibliographic records (title, authors, year, source id). \
         Call repeatedly with a larger max_results if fewer than 10 records \
         come back and more are needed."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": { "type": "string" },
                "max_results": { "type": "integer", "minimum": 1, "default": 10 }
            },
            "required": ["query"]
        })
    }

    fn call(
        &self,
        input: Value,
    ) -> Pin<Box<dyn Future<Output = Result<Value, ToolError>> + Send + '_>> {
        Box::pin(async move {
            let query = input
                .get("query")
                .and_then(|v| v.as_str())
                .ok_or_else(|| ToolError::InvalidInput("missing query".into()))?
                .to_string();
            let max_results = input
                .get("max_results")
                .and_then(|v| v.as_u64())
                .unwrap_or(10)
                .max(1) as usize;

            let results: Vec<Value> = (1..=max_results)
                .map(|i| {
                    json!({
                        "title": format!("{query}: a study, part {i}"),
                        "authors": ["A. Researcher", "B. Collaborator"],
                        "year": 2018 + (i as u32 % 7),
                        "source": format!("PMID:{:08}", query.len() * 1000 + i),
                    })
                })
                .collect();
            Ok(json!({ "results": results, "count": results.len() }))
        })
    }
}

/// `analyze_stats`: runs a named statistical procedure over supplied data.
/// Stands in for the source system's t-test/chi-square/survival/sample-size
/// tools.
pub struct AnalyzeStatsTool;

impl ToolDyn for AnalyzeStatsTool {
    fn name(&self) -> &str {
        "analyze_stats"
    }

    fn description(&self) -> &str {
        "Run a statistical procedure (ttest, chi_square, survival, sample_size) \
         over the supplied data and return a prose summary plus named figures."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "test": {
                    "type": "string",
                    "enum": ["ttest", "chi_square", "survival", "sample_size"]
                },
                "data": { "description": "Procedure-specific input, opaque to the core." }
            },
            "required": ["test"]
        })
    }

    fn call(
        &self,
        input: Value,
    ) -> Pin<Box<dyn Future<Output = Result<Value, ToolError>> + Send + '_>> {
        Box::pin(async move {
            let test = input
                .get("test")
                .and_then(|v| v.as_str())
                .ok_or_else(|| ToolError::InvalidInput("missing test".into()))?
                .to_string();
            Ok(json!({
                "summary": format!("{test} analysis completed; no significant anomalies detected."),
                "figures": [format!("{test}_figure_1")],
            }))
        })
    }
}

/// `write_section`: drafts one manuscript section in IMRAD order.
pub struct WriteSectionTool;

impl ToolDyn for WriteSectionTool {
    fn name(&self) -> &str {
        "write_section"
    }

    fn description(&self) -> &str {
        "Draft one manuscript section (abstract, introduction, methods, \
         results, discussion) from the given context, bounded by word_limit."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "section": {
                    "type": "string",
                    "enum": ["abstract", "introduction", "methods", "results", "discussion"]
                },
                "context": { "type": "string" },
                "word_limit": { "type": "integer", "minimum": 1, "default": 500 }
            },
            "required": ["section", "context"]
        })
    }

    fn call(
        &self,
        input: Value,
    ) -> Pin<Box<dyn Future<Output = Result<Value, ToolError>> + Send + '_>> {
        Box::pin(async move {
            let section = input
                .get("section")
                .and_then(|v| v.as_str())
                .ok_or_else(|| ToolError::InvalidInput("missing section".into()))?
                .to_string();
            let context = input
                .get("context")
                .and_then(|v| v.as_str())
                .unwrap_or_default();
            let content = format!("{section} (drafted from: {context})");
            let word_count = content.split_whitespace().count();
            Ok(json!({ "section": section, "content": content, "word_count": word_count }))
        })
    }
}

/// `check_compliance`: verifies a manuscript against the reporting
/// checklist for its paper type (CONSORT for `rct`, STROBE for `cohort`,
/// PRISMA for `meta_analysis`).
pub struct CheckComplianceTool;

impl CheckComplianceTool {
    fn checklist_for(paper_type: &str) -> &'static [&'static str] {
        match paper_type {
            "rct" => &["title", "abstract", "introduction", "methods", "results", "discussion"],
            "cohort" => &["title", "abstract", "introduction", "methods", "results", "discussion"],
            "meta_analysis" => &["title", "abstract", "introduction", "methods", "results", "discussion"],
            _ => &["abstract", "introduction", "methods", "results", "discussion"],
        }
    }

    fn checklist_name(paper_type: &str) -> &'static str {
        match paper_type {
            "rct" => "CONSORT",
            "cohort" => "STROBE",
            "meta_analysis" => "PRISMA",
            _ => "CONSORT",
        }
    }
}

impl ToolDyn for CheckComplianceTool {
    fn name(&self) -> &str {
        "check_compliance"
    }

    fn description(&self) -> &str {
        "Check a manuscript's sections against the CONSORT/STROBE/PRISMA \
         checklist matching its paper_type (rct, cohort, meta_analysis). \
         Returns needs_revision, failed_items, and a compliance score."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "paper_type": { "type": "string", "enum": ["rct", "cohort", "meta_analysis"] },
                "manuscript": {
                    "type": "object",
                    "description": "Section name to prose body."
                }
            },
            "required": ["paper_type", "manuscript"]
        })
    }

    fn call(
        &self,
        input: Value,
    ) -> Pin<Box<dyn Future<Output = Result<Value, ToolError>> + Send + '_>> {
        Box::pin(async move {
            let paper_type = input
                .get("paper_type")
                .and_then(|v| v.as_str())
                .ok_or_else(|| ToolError::InvalidInput("missing paper_type".into()))?
                .to_string();
            let manuscript = input
                .get("manuscript")
                .and_then(|v| v.as_object())
                .ok_or_else(|| ToolError::InvalidInput("missing manuscript".into()))?;

            let checklist = Self::checklist_for(&paper_type);
            let failed_items: Vec<String> = checklist
                .iter()
                .filter(|item| {
                    !manuscript
                        .get(**item)
                        .and_then(|v| v.as_str())
                        .is_some_and(|s| !s.trim().is_empty())
                })
                .map(|item| item.to_string())
                .collect();

            let score = 1.0 - (failed_items.len() as f64 / checklist.len() as f64);
            Ok(json!({
                "checklist": Self::checklist_name(&paper_type),
                "needs_revision": !failed_items.is_empty(),
                "failed_items": failed_items,
                "score": score,
            }))
        })
    }
}
