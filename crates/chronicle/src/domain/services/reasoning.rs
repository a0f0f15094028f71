//! Reasoning text
//!
//! Prompt construction, source footers and the deterministic template
//! answers used when no LLM is configured. Everything here is pure string
//! work; the LLM call itself lives in the server's reasoning service.

use crate::domain::entities::MemoryRecord;
use crate::domain::value_objects::ContentType;

/// Sampling settings for one kind of generation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationSettings {
    pub temperature: f32,
    pub max_tokens: u32,
}

pub const RECOMMEND_SETTINGS: GenerationSettings = GenerationSettings {
    temperature: 0.0,
    max_tokens: 800,
};

pub const SUMMARY_SETTINGS: GenerationSettings = GenerationSettings {
    temperature: 0.2,
    max_tokens: 400,
};

const RECOMMEND_TEMPLATE: &str = r#"Based on the following historical institutional memories, provide a comprehensive analysis and recommendation for the query: "{query}"

Historical Memories:
{memories}

Please structure your response as follows:
1. Summary of relevant past experiences (including any visual evidence from images)
2. Key lessons learned
3. Evidence-based recommendation
4. Potential risks or considerations

When referencing images or visual evidence, explicitly mention them (e.g., "As shown in the 2019 evacuation route map..." or "The visual evidence from the incident site photograph indicates...").

Ensure your response is grounded in the provided historical data and explain the reasoning clearly."#;

const SUMMARY_TEMPLATE: &str = r#"Summarize the following memories in the context of the query: "{query}"

Memories:
{memories}

Provide a concise summary highlighting patterns and outcomes."#;

/// Full recommendation prompt for `query` over `records`
pub fn recommendation_prompt(query: &str, records: &[MemoryRecord]) -> String {
    let memories = records
        .iter()
        .map(|r| {
            format!(
                "- ID: {}, Department: {}, Date: {}, Outcome: {}, Type: {}\n  Content: {}",
                r.id,
                r.department,
                r.date,
                r.outcome,
                r.content_type,
                r.content_line()
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    fill(RECOMMEND_TEMPLATE, query, &memories)
}

/// Full summary prompt for `query` over `records`
pub fn summary_prompt(query: &str, records: &[MemoryRecord]) -> String {
    let memories = records
        .iter()
        .map(|r| {
            format!(
                "- {} (Outcome: {}, Type: {})",
                r.content_line(),
                r.outcome,
                r.content_type
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    fill(SUMMARY_TEMPLATE, query, &memories)
}

fn fill(template: &str, query: &str, memories: &str) -> String {
    template
        .replace("{query}", query)
        .replace("{memories}", memories)
}

/// Footer appended to LLM recommendations
pub fn recommendation_sources(records: &[MemoryRecord]) -> String {
    sources(records, |r| {
        format!(
            "- {} ({}) - Outcome: {} - Type: {}",
            r.department, r.date, r.outcome, r.content_type
        )
    })
}

/// Footer appended to LLM summaries
pub fn summary_sources(records: &[MemoryRecord]) -> String {
    sources(records, |r| format!("- {} ({})", r.department, r.date))
}

fn template_sources(records: &[MemoryRecord]) -> String {
    sources(records, |r| {
        format!(
            "- {} ({}) - {}",
            r.department,
            r.date,
            r.content_type.to_uppercase()
        )
    })
}

fn sources(records: &[MemoryRecord], line: impl Fn(&MemoryRecord) -> String) -> String {
    let mut footer = String::from("Sources:");
    for record in records {
        footer.push('\n');
        footer.push_str(&line(record));
    }
    footer
}

/// Attach the sources footer to a generated answer
pub fn with_sources(generated: &str, footer: &str) -> String {
    format!("{}\n\n{}", generated.trim(), footer)
}

struct Counts {
    text: usize,
    image: usize,
}

fn count_by_type(records: &[MemoryRecord]) -> Counts {
    let mut counts = Counts { text: 0, image: 0 };
    for record in records {
        match record.kind() {
            Some(ContentType::Text) => counts.text += 1,
            Some(ContentType::Image) => counts.image += 1,
            None => {}
        }
    }
    counts
}

/// Distinct non-empty values in first-seen order
fn distinct<'a>(values: impl Iterator<Item = &'a str>) -> Vec<&'a str> {
    let mut seen: Vec<&str> = Vec::new();
    for value in values.filter(|v| !v.is_empty()) {
        if !seen.contains(&value) {
            seen.push(value);
        }
    }
    seen
}

/// Recommendation written without an LLM
pub fn fallback_recommendation(query: &str, records: &[MemoryRecord]) -> String {
    let counts = count_by_type(records);

    let mut out = format!("Analysis for query: '{}'\n\n", query);
    out.push_str(&format!(
        "Found {} relevant memories ({} text, {} images).\n\n",
        records.len(),
        counts.text,
        counts.image
    ));

    let images: Vec<&MemoryRecord> = records.iter().filter(|r| r.is_image()).collect();
    if !images.is_empty() {
        out.push_str("Visual evidence found:\n");
        for image in images {
            out.push_str(&format!(
                "- Image from {} ({}): {}\n",
                image.department,
                image.date,
                image.image_reference.as_deref().unwrap_or("(missing reference)")
            ));
            if let Some(description) = image.text.as_deref() {
                out.push_str(&format!("  Description: {}\n", description));
            }
        }
        out.push_str("\nThis visual evidence should be considered alongside textual records.\n\n");
    }

    out.push_str(
        "Recommendation: Consider historical patterns and visual evidence in decision making.\n\n",
    );
    out.push_str(&template_sources(records));
    out
}

/// Summary written without an LLM
pub fn fallback_summary(query: &str, records: &[MemoryRecord]) -> String {
    if records.is_empty() {
        return format!("Summary for '{}': Found 0 memories.\n\nSources:", query);
    }

    let counts = count_by_type(records);
    let mut parts = Vec::new();
    if counts.text > 0 {
        parts.push(format!("{} text documents", counts.text));
    }
    if counts.image > 0 {
        parts.push(format!("{} images", counts.image));
    }

    let mut out = format!("Summary for '{}': Found {} memories", query, records.len());
    if !parts.is_empty() {
        out.push_str(&format!(" ({})", parts.join(", ")));
    }
    out.push_str(".\n\n");

    let departments = distinct(records.iter().map(|r| r.department.as_str()));
    let outcomes = distinct(records.iter().map(|r| r.outcome.as_str()));
    out.push_str(&format!("Key departments involved: {}\n", departments.join(", ")));
    out.push_str(&format!("Historical outcomes: {}\n\n", outcomes.join(", ")));

    out.push_str(&template_sources(records));
    out
}

/// One-line comparison plus outcomes per department
pub fn comparison(records: &[MemoryRecord]) -> String {
    let mut out = format!("Comparing retrieved memories: {} items found.", records.len());

    for department in distinct(records.iter().map(|r| r.department.as_str())) {
        let outcomes = distinct(
            records
                .iter()
                .filter(|r| r.department == department)
                .map(|r| r.outcome.as_str()),
        );
        out.push_str(&format!("\n- {}: {}", department, outcomes.join(", ")));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{Payload, RecordId};

    fn record(id: u64, department: &str, outcome: &str, kind: &str) -> MemoryRecord {
        MemoryRecord {
            id: RecordId::new(id),
            text: (kind == "text").then(|| format!("{} report", department)),
            image_reference: (kind == "image").then(|| format!("images/{}.png", id)),
            department: department.to_string(),
            date: "2024-01-01".to_string(),
            outcome: outcome.to_string(),
            content_type: kind.to_string(),
            location: None,
            tags: None,
            attributes: Payload::new(),
        }
    }

    #[test]
    fn test_fallback_summary_on_empty_input_states_zero() {
        let summary = fallback_summary("flood response", &[]);
        assert!(summary.contains("0 memories"));
        assert!(summary.ends_with("\n\nSources:"));
    }

    #[test]
    fn test_fallback_summary_lists_departments_once_in_order() {
        let records = vec![
            record(1, "Finance", "success", "text"),
            record(2, "Parks", "failure", "image"),
            record(3, "Finance", "success", "text"),
        ];
        let summary = fallback_summary("budget", &records);

        assert!(summary.starts_with("Summary for 'budget': Found 3 memories (2 text documents, 1 images)."));
        assert!(summary.contains("Key departments involved: Finance, Parks\n"));
        assert!(summary.contains("Historical outcomes: success, failure\n"));
        assert!(summary.contains("Sources:\n- Finance (2024-01-01) - TEXT"));
    }

    #[test]
    fn test_fallback_summary_images_only() {
        let summary = fallback_summary("maps", &[record(1, "Emergency", "success", "image")]);
        assert!(summary.contains("Found 1 memories (1 images)."));
    }

    #[test]
    fn test_fallback_recommendation_calls_out_images() {
        let mut image = record(2, "Emergency", "success", "image");
        image.text = Some("Evacuation route map".into());
        let records = vec![record(1, "Finance", "success", "text"), image];

        let out = fallback_recommendation("evacuation", &records);
        assert!(out.starts_with("Analysis for query: 'evacuation'"));
        assert!(out.contains("Found 2 relevant memories (1 text, 1 images)."));
        assert!(out.contains("- Image from Emergency (2024-01-01): images/2.png"));
        assert!(out.contains("  Description: Evacuation route map"));
        assert!(out.ends_with("- Emergency (2024-01-01) - IMAGE"));
    }

    #[test]
    fn test_recommendation_prompt_includes_every_record() {
        let records = vec![
            record(1, "Finance", "success", "text"),
            record(2, "Parks", "mixed", "image"),
        ];
        let prompt = recommendation_prompt("budget cuts", &records);

        assert!(prompt.contains("for the query: \"budget cuts\""));
        assert!(prompt.contains("- ID: 1, Department: Finance, Date: 2024-01-01, Outcome: success, Type: text"));
        assert!(prompt.contains("  Content: Image: images/2.png"));
        assert!(!prompt.contains("{memories}"));
    }

    #[test]
    fn test_summary_prompt_line_format() {
        let prompt = summary_prompt("q", &[record(1, "Finance", "success", "text")]);
        assert!(prompt.contains("- Finance report (Outcome: success, Type: text)"));
    }

    #[test]
    fn test_sources_footers() {
        let records = vec![record(1, "Finance", "success", "text")];
        assert_eq!(
            recommendation_sources(&records),
            "Sources:\n- Finance (2024-01-01) - Outcome: success - Type: text"
        );
        assert_eq!(summary_sources(&records), "Sources:\n- Finance (2024-01-01)");
        assert_eq!(
            with_sources("  answer \n", &summary_sources(&records)),
            "answer\n\nSources:\n- Finance (2024-01-01)"
        );
    }

    #[test]
    fn test_comparison_groups_outcomes_by_department() {
        let records = vec![
            record(1, "Finance", "success", "text"),
            record(2, "Finance", "failure", "text"),
            record(3, "Parks", "success", "text"),
        ];
        assert_eq!(
            comparison(&records),
            "Comparing retrieved memories: 3 items found.\n- Finance: success, failure\n- Parks: success"
        );
    }
}
