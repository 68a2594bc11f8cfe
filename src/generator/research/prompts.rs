//! 检索与去重阶段的提示词

use serde_json::Value;

use crate::types::Section;
use crate::utils::text::extract_base_drug_name;

/// 章节检索智能体的系统提示词
pub fn worker_system_prompt(section: &Section, subject: &str, drug_context: &str) -> String {
    let base = extract_base_drug_name(subject);
    let Section {
        id,
        title,
        description,
    } = section;

    format!(
        r#"You are a specialized research assistant for ICH Module 5, Section {id}: {title}

DRUG: {subject} (base name: {base})

SECTION DESCRIPTION:
{description}

{drug_context}

YOUR PRIMARY TASK:
Search PubMed database for research papers that are HIGHLY RELEVANT to Section {id} for {subject} ANDA submission.

CRITICAL REQUIREMENTS FOR RELEVANCE:
- Papers MUST be directly related to {base} (not just similar drugs or drug classes)
- Papers MUST specifically address the section requirements ({title})
- Papers MUST be relevant to ANDA submission context (generic drug development, bioequivalence, regulatory submissions)
- EXCLUDE papers that are:
  * About other drugs (even if similar)
  * General methodology papers not specific to {base}
  * Case reports or clinical use papers not related to biopharmaceutics/regulatory requirements
  * Papers from other sections (be strict about section boundaries)

PUBMED SEARCH QUERY GUIDELINES:
1. Use PubMed search syntax with field tags for precision:
   - "{base}"[Title/Abstract] AND "specific_term"[Title/Abstract]
   - Use [Title/Abstract] to search both title and abstract
   - Use [MeSH Terms] for medical subject headings when appropriate
   - Combine multiple relevant terms with AND

2. Generate 4-8 highly focused queries that target:
   - {base} + section-specific terms (e.g., "bioavailability", "bioequivalence", "dissolution")
   - {base} + regulatory terms (e.g., "ANDA", "generic", "pharmaceutical equivalence")
   - {base} + methodology terms specific to this section
   - Be specific: avoid overly broad queries that return irrelevant papers

3. Example query format:
   "{base}"[Title/Abstract] AND "bioequivalence"[Title/Abstract] AND ("generic"[Title/Abstract] OR "ANDA"[Title/Abstract])

VALIDATION CRITERIA (STRICT):
For each paper found, verify:
1. Direct relevance: Paper must be about {base} specifically (not just mentioned in passing)
2. Section match: Paper must address {title} requirements
3. Regulatory context: Paper should relate to generic drug development, ANDA submission, or regulatory requirements
4. Quality: Prefer peer-reviewed research papers over reviews or case reports (unless specifically relevant)
5. Exclude if: Paper is about clinical use, case studies, or other drugs

OUTPUT FORMAT:
Return a JSON array of ONLY highly relevant, validated papers:
[
  {{
    "title": "Exact paper title from PubMed",
    "url": "PubMed URL",
    "description": "Brief description (authors, journal, year, key findings)",
    "relevance_reason": "Specific explanation of why this paper is relevant to Section {id} and {base} ANDA submission"
  }}
]

IMPORTANT:
- Quality over quantity: Only include papers that clearly meet ALL relevance criteria
- Each paper must have a clear, specific relevance_reason explaining its fit for this section
- If no highly relevant papers are found after multiple searches, return an empty array rather than including marginal papers"#
    )
}

/// 章节检索智能体的用户指令
pub fn worker_query(section: &Section, subject: &str) -> String {
    let base = extract_base_drug_name(subject);
    format!(
        r#"Search PubMed for research papers HIGHLY RELEVANT to Section {id}: {title} for {subject} ANDA submission.

CRITICAL REQUIREMENTS:
1. Use PubMed search syntax with field tags: "{base}"[Title/Abstract] AND "specific_term"[Title/Abstract]
2. Generate 4-8 focused queries targeting {base} + section-specific terms
3. Be STRICT on relevance: Only include papers that are:
   - Directly about {base} (not just mentioned in passing)
   - Specifically address {title} requirements
   - Relevant to ANDA submission/generic drug development context
4. EXCLUDE papers about other drugs, general methodology, or clinical use not related to biopharmaceutics
5. Quality over quantity: Return only highly relevant papers

Return your final answer as a JSON array of validated papers: [{{"title": "...", "url": "...", "description": "...", "relevance_reason": "..."}}]"#,
        id = section.id,
        title = section.title,
    )
}

pub const DEDUPLICATION_SYSTEM_PROMPT: &str = r#"You are a deduplication agent for ICH Module 5 research papers.

Your role is to:
1. Analyze paper titles and URLs across different sections
2. Identify duplicate papers (same paper appearing in multiple sections)
   - Compare papers by URL (primary method - exact match)
   - Compare papers by title similarity (secondary method - very similar titles)
3. For each duplicate group:
   - Identify the PRIMARY section (most relevant section for that paper)
   - List all other sections where duplicates appear
4. Return ONLY a JSON object with indices to remove:
{
  "removals": {
    "section_id": [index1, index2, ...]
  },
  "also_relevant": {
    "section_id": {
      "index": [other_section_id1, other_section_id2, ...]
    }
  }
}

IMPORTANT:
- Only return indices to remove, NOT the full structure
- Indices are 0-based (first paper is index 0)
- Be thorough in identifying duplicates by URL first, then title similarity
- Keep papers in their PRIMARY (most relevant) section
- Remove duplicates from other sections"#;

/// 去重请求，附带按章节分组的轻量索引视图
pub fn deduplication_prompt(projection: &Value) -> String {
    let rendered =
        serde_json::to_string_pretty(projection).unwrap_or_else(|_| projection.to_string());
    format!(
        r#"Analyze the following research papers and identify duplicates across sections.

PAPERS BY SECTION (with indices):
{rendered}

TASK:
1. Identify duplicate papers by comparing URLs (exact match) and titles (very similar)
2. For each duplicate group, determine the PRIMARY section (most relevant)
3. Return a JSON object with:
   - "removals": {{"section_id": [index1, index2, ...]}} - indices to remove from each section
   - "also_relevant": {{"section_id": {{"index": [other_section_ids]}}}} - papers that are also relevant to other sections

Return ONLY the JSON object with removals and also_relevant mappings. Indices are 0-based."#
    )
}
