//! Prompt text for every model call the pipeline makes.

use domain::models::{PassageNode, Query};

pub const HYDE_PROMPT: &str = "Please write a passage to answer the question\n\
Try to include as many key details as possible.\n\
\n\
\n\
{query}\n\
\n\
\n\
Passage:\"\"\"\n";

pub const RANK_SYSTEM_PROMPT: &str = "You are RankGPT, an intelligent assistant that can rank passages based on their relevancy to the query.";

pub fn rank_prefix(query: &str, num: usize) -> String {
    format!(
        "I will provide you with {num} passages, each indicated by number identifier []. \n\
Rank the passages based on their relevance to query: {query}."
    )
}

pub fn rank_suffix(query: &str, num: usize) -> String {
    format!(
        "Search Query: {query}. \n\
Rank the {num} passages above based on their relevance to the search query. \
The passages should be listed in descending order using identifiers. \
The most relevant passages should be listed first. \
The output format should be [] > [], e.g., [1] > [2]. \
Only response the ranking results, do not say any word or explain."
    )
}

pub const DIAGNOSIS_TEMPLATE: &str = "you are a professional medical health service you have to provide three possible diseases and reasons why using bullet points as accurately as possible and based on the given context

ENSURE THE RESPONSE REMAINS FAITHFUL TO THE PROVIDED CONTEXT.
If you don't know the answer to a question, please don't share false information.

A patient presents with the following symptoms:

{symptoms},

Please provide three possible diseases/injuries and reasons using bullet points. Additionally, specify whether the patient should seek professional medical attention or opt for self-care at a pharmacy. Outline treatment options for each identified disease.

Ensure the response includes:
- Three possible diseases/injuries with reasons
- Whether the patient should seek medical attention or self-care
- Treatment options for each identified disease/injury

Response Format:
Possible diseases based on the symptoms described:

Treatment for each disease/injury:

Specify whether the patient should go to a doctor or pharmacy.";

/// Instruction block wrapped around the user's symptoms. `{symptoms}` marks
/// where the literal query text goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstructionTemplate {
    template: String,
}

impl InstructionTemplate {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }

    pub fn render(&self, query: &Query) -> String {
        self.template.replace("{symptoms}", query.as_str())
    }
}

impl Default for InstructionTemplate {
    fn default() -> Self {
        Self::new(DIAGNOSIS_TEMPLATE)
    }
}

pub fn hyde_prompt(query: &Query) -> String {
    HYDE_PROMPT.replace("{query}", query.as_str())
}

/// A passage as the model sees it: metadata lines, a blank line, the text.
pub fn passage_content(node: &PassageNode) -> String {
    if node.metadata().is_empty() {
        return node.text().to_string();
    }
    let header = node
        .metadata()
        .iter()
        .map(|(key, value)| format!("{key}: {value}"))
        .collect::<Vec<_>>()
        .join("\n");
    format!("{header}\n\n{}", node.text())
}

pub fn context_block(nodes: &[PassageNode]) -> String {
    nodes
        .iter()
        .map(passage_content)
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub fn context_qa_prompt(context: &str, query_str: &str) -> String {
    format!(
        "Context information is below.\n\
---------------------\n\
{context}\n\
---------------------\n\
Given the context information and not prior knowledge, answer the query.\n\
Query: {query_str}\n\
Answer: "
    )
}
