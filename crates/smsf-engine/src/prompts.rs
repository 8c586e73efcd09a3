//! Prompt templates for synthesis and tool selection.
//!
//! Templates are plain functions so a prompt can be inspected in tests
//! without a language model.

use std::fmt::Write;

use smsf_core::DocumentChunk;

use crate::tools::ToolDescription;

/// Mandatory opening of every answer produced without retrieved documents.
pub const GENERAL_DISCLAIMER: &str = "[GENERAL INFORMATION ONLY: This answer is not based on your specific documents.]";

/// Sentinel the refine prompt asks for when a chunk adds nothing.
pub const NO_CHANGE: &str = "NO_CHANGE";

const HIERARCHY_RULES: &str = "\
### HIERARCHY OF AUTHORITY
1. STATUTE: if the SIS Act or SIS Regulations prohibit an action it is prohibited, whatever the trust deed or a ruling says.
2. TRUST DEED: a deed may be more restrictive than the SIS Act, never less restrictive.
3. ATO RULINGS AND INFORMAL GUIDANCE: use these to interpret how the law applies; they never override statute or deed.

### CITATION RULES
Cite legislation by section (for example 's 62 SIS Act') and deeds by clause (for example 'Clause 12.4') whenever the context shows the number.
Never invent a section, clause or ruling number.";

/// Context block with its locator so the model can cite it.
fn context_block(chunk: &DocumentChunk) -> String {
    let mut header = format!("[{} | {}", chunk.doc_type, chunk.source);
    if let Some(locator) = chunk.locator() {
        let _ = write!(header, " | {locator}");
    }
    header.push(']');
    format!("{header}\n{}", chunk.content.trim())
}

/// First pass: answer from one chunk.
pub fn qa_prompt(question: &str, chunk: &DocumentChunk) -> String {
    format!(
        "### ROLE\n\
         You are a precise SMSF compliance specialist. Answer only from the context below.\n\n\
         {HIERARCHY_RULES}\n\n\
         ### RESPONSE STRUCTURE\n\
         1. SUMMARY: a direct Yes, No or It Depends.\n\
         2. LEGAL BASIS: the sections or rulings relied on.\n\
         3. DEED POSITION: whether the fund's trust deed allows or restricts it, or is silent.\n\
         4. CONFLICTS: explicitly flag any conflict between the deed and the statute.\n\n\
         Context:\n---------------------\n{context}\n---------------------\n\
         Question: {question}\n\
         Answer: ",
        context = context_block(chunk),
    )
}

/// Folds one more chunk into an existing answer.
pub fn refine_prompt(question: &str, existing_answer: &str, chunk: &DocumentChunk) -> String {
    format!(
        "The question is: {question}\n\
         The existing compliance answer is:\n---------------------\n{existing_answer}\n---------------------\n\
         New context:\n---------------------\n{context}\n---------------------\n\n\
         {HIERARCHY_RULES}\n\n\
         ### REFINEMENT RULES\n\
         1. If the new context adds nothing to the existing answer, reply with exactly {NO_CHANGE} and nothing else.\n\
         2. If it supplies a more specific section or clause number, add that citation.\n\
         3. If it shows the statute prohibits something the deed allows (or the reverse), state the conflict explicitly, starting the line with 'CONFLICT:'.\n\
         4. Otherwise return the full updated answer. Do not mention that the answer was refined.\n\n\
         Refined answer: ",
        context = context_block(chunk),
    )
}

/// No-context answer; must open with [`GENERAL_DISCLAIMER`].
pub fn fallback_prompt(question: &str) -> String {
    format!(
        "You are a helpful SMSF assistant. The question below is not answered from the fund's documents \
         or from retrieved legislation.\n\n\
         INSTRUCTIONS:\n\
         1. Answer from general knowledge.\n\
         2. Start your response with this exact disclaimer: '{GENERAL_DISCLAIMER}'\n\
         3. Keep the tone professional.\n\
         4. Do not guess specific sections, clauses or ruling numbers.\n\n\
         Question: {question}\n\
         General answer: "
    )
}

/// Enumerates the tools 1-based and asks for a single JSON choice.
pub fn selector_prompt(question: &str, tools: &[ToolDescription]) -> String {
    let mut choices = String::new();
    for (i, tool) in tools.iter().enumerate() {
        let _ = writeln!(choices, "({}) {}: {}", i + 1, tool.name, tool.description);
    }
    format!(
        "Some choices are given below, numbered from 1 to {n}.\n\
         ---------------------\n{choices}---------------------\n\
         Using only the choices above, pick the single choice most relevant to the question: '{question}'\n\
         Reply with JSON only, in the form {{\"choice\": <number>, \"reason\": \"<short reason>\"}}.",
        n = tools.len(),
    )
}
