// file: src/report.rs
// description: markdown rendering of execution results for the CLI and MCP surfaces
// reference: internal presentation helpers

use crate::models::{Citation, ExecutionResult, LegalOption};
use std::fmt::Write;

/// The sections a result is shown in, each already rendered as markdown.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportSections {
    pub summary: String,
    pub options: String,
    pub sources: String,
    pub draft: String,
    pub audio: Option<String>,
}

impl ReportSections {
    pub fn from_result(result: &ExecutionResult) -> Self {
        if !result.success {
            return Self {
                summary: format!(
                    "Error: {}",
                    result.error.as_deref().unwrap_or("unknown error")
                ),
                options: String::new(),
                sources: String::new(),
                draft: String::new(),
                audio: None,
            };
        }

        Self {
            summary: result
                .summary
                .clone()
                .unwrap_or_else(|| "No summary available".to_string()),
            options: render_options(&result.legal_options),
            sources: render_sources(&result.citations),
            draft: result
                .draft_document
                .clone()
                .unwrap_or_else(|| "No draft generated".to_string()),
            audio: result.audio_url.clone(),
        }
    }

    pub fn to_markdown(&self) -> String {
        let mut out = format!("## Summary:\n\n{}\n\n", self.summary);

        for section in [&self.options, &self.sources] {
            if !section.is_empty() {
                out.push_str(section);
            }
        }

        if !self.draft.is_empty() {
            let _ = write!(out, "## Draft Document:\n\n{}\n\n", self.draft);
        }

        if let Some(audio) = &self.audio {
            let _ = writeln!(out, "## Audio Summary:\n\n{}", audio);
        }

        out.trim_end().to_string()
    }
}

pub fn render_markdown(result: &ExecutionResult) -> String {
    ReportSections::from_result(result).to_markdown()
}

pub fn render_options(options: &[LegalOption]) -> String {
    if options.is_empty() {
        return String::new();
    }

    let mut out = String::from("## Legal Options:\n\n");
    for (i, option) in options.iter().enumerate() {
        let _ = writeln!(out, "### Option {}: {}", i + 1, option.title);
        let _ = writeln!(out, "{}\n", option.description);

        if !option.steps.is_empty() {
            out.push_str("**Steps:**\n");
            for step in &option.steps {
                let _ = writeln!(out, "- {}", step);
            }
        }
        if let Some(cost) = &option.estimated_cost {
            let _ = writeln!(out, "**Estimated Cost:** {}", cost);
        }
        if let Some(timeline) = &option.timeline {
            let _ = writeln!(out, "**Timeline:** {}", timeline);
        }
        out.push_str("\n---\n\n");
    }
    out
}

pub fn render_sources(citations: &[Citation]) -> String {
    if citations.is_empty() {
        return String::new();
    }

    let mut out = String::from("## Sources:\n\n");
    for citation in citations {
        let _ = writeln!(
            out,
            "- **{}** ({})",
            citation.title,
            citation.jurisdiction.as_str()
        );
        let _ = writeln!(
            out,
            "  Source: {} | Confidence: {:.2}",
            citation.source_type.as_str(),
            citation.confidence
        );
        let _ = writeln!(out, "  Excerpt: {}\n", citation.excerpt);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Jurisdiction, SourceType};
    use pretty_assertions::assert_eq;

    fn option() -> LegalOption {
        LegalOption {
            title: "Approach the Rent Controller".to_string(),
            description: "File a fair rent petition".to_string(),
            steps: vec!["Collect receipts".to_string(), "File petition".to_string()],
            estimated_cost: Some("Rs. 500".to_string()),
            timeline: None,
            success_probability: None,
        }
    }

    #[test]
    fn test_render_options() {
        assert_eq!(
            render_options(&[option()]),
            "## Legal Options:\n\n\
             ### Option 1: Approach the Rent Controller\n\
             File a fair rent petition\n\n\
             **Steps:**\n- Collect receipts\n- File petition\n\
             **Estimated Cost:** Rs. 500\n\n---\n\n"
        );
        assert_eq!(render_options(&[]), "");
    }

    #[test]
    fn test_render_sources() {
        let citation = Citation {
            doc_id: "tn_rent_control_act_2019".to_string(),
            title: "Tamil Nadu Rent Control Act 2019".to_string(),
            source_type: SourceType::Statute,
            jurisdiction: Jurisdiction::TamilNadu,
            confidence: 0.876,
            excerpt: "The Act...".to_string(),
        };

        let rendered = render_sources(&[citation]);
        assert!(rendered.contains("- **Tamil Nadu Rent Control Act 2019** (tamil_nadu)"));
        assert!(rendered.contains("Source: statute | Confidence: 0.88"));
        assert!(rendered.contains("Excerpt: The Act..."));
    }

    #[test]
    fn test_full_report() {
        let mut result = ExecutionResult::empty("q1");
        result.summary = Some("Tenants are protected.".to_string());
        result.legal_options = vec![option()];
        result.audio_url = Some("/tmp/audio_1.mp3".to_string());

        let markdown = render_markdown(&result);
        assert!(markdown.starts_with("## Summary:\n\nTenants are protected."));
        assert!(markdown.contains("### Option 1: Approach the Rent Controller"));
        assert!(markdown.contains("## Draft Document:\n\nNo draft generated"));
        assert!(markdown.ends_with("/tmp/audio_1.mp3"));
        assert!(!markdown.contains("## Sources:"));
    }

    #[test]
    fn test_failed_result() {
        let result = ExecutionResult::failure("q2", "Upstream API error: down".to_string(), vec![]);
        let sections = ReportSections::from_result(&result);
        assert_eq!(sections.summary, "Error: Upstream API error: down");
        assert!(sections.draft.is_empty());
        assert_eq!(render_markdown(&result), "## Summary:\n\nError: Upstream API error: down");
    }
}
