//! Prompt templates.
//!
//! Each template fixes an output format that the parsers in
//! [`super::parse`] and [`super::grade`] depend on: bracketed industry
//! lines, a bare `1`/`-1` grade, and a single bracketed verbatim thesis.

/// Asks for the industries the firm explicitly says it invests in.
pub fn industry_prompt(context: &str) -> String {
    format!(
        r#"List the industries that the private equity firm described below explicitly says it invests in.

RULES:
- Only name industries the text states plainly. Never guess or infer.
- Ignore employee and founder biographies.
- Ignore industries that only show up in deal or portfolio examples.
- Write nothing except industry names, one per line, each wrapped in square brackets.
- If no industry is stated, reply with nothing at all.
- Never write lines such as [No industry stated], [Software (implied)] or [Not explicitly mentioned].

FORMAT:
[Healthcare Services]
[Value-Added Distribution]
[Industrial Services]

TEXT:
{context}
"#
    )
}

/// Asks for a one-token sufficiency verdict on a draft.
pub fn grade_prompt(draft: &str) -> String {
    format!(
        r#"You check whether a draft answer contains real information about a private equity firm's investment focus.

Reply 1 if the draft names specific, explicitly stated focus areas.
Reply -1 if it is empty, vague, or only restates generic language.
Reply with the number only. No explanation.

Examples:
"[Healthcare Services]
[Industrial Services]" -> 1
"[We value partnership]" -> -1

DRAFT:
"""
{draft}
"""

Reply with 1 or -1."#
    )
}

/// Asks for the verbatim thesis sentence for one industry.
pub fn thesis_prompt(industry: &str, context: &str) -> String {
    format!(
        r#"You are a private equity research assistant.

Find the sentence in the text that states why the firm invests in the industry below.

RULES:
1. Assume there is no thesis unless a sentence clearly says why the firm invests in this industry.
2. Copy the words exactly. Do not summarise, shorten or rephrase.
3. Do not add labels such as "Investment Thesis:".
4. If there is no thesis, reply with exactly "" and nothing else.

OUTPUT:
- Thesis found: one line, [<exact sentence>]
- No thesis: one line, ""

Examples:
Correct: [We invest in asset-light healthcare businesses with recurring revenue.]
Wrong, label added: [Investment Thesis: We invest in asset-light healthcare businesses with recurring revenue.]
Wrong, invented: [We back great management teams across all industries.]
Correct, nothing found: ""

INDUSTRY:
{industry}

TEXT:
{context}"#
    )
}
