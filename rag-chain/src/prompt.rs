//! Built-in prompt templates.
//!
//! Templates are compiled in and looked up by name; nothing is read from disk
//! at request time. Placeholders are `{context}` and `{question}`.

use rag_store::RetrievableUnit;

/// Name of the product recommendation template.
pub const PRODUCT_BOT: &str = "product_bot";

/// Separator between unit bodies in the `{context}` block.
pub const CONTEXT_DELIMITER: &str = "\n\n";

const PRODUCT_BOT_TEMPLATE: &str = "You are an expert EcommerceBot specialized in product recommendations and handling customer queries. Analyze the provided product titles, ratings, and reviews to provide accurate, helpful responses. Stay relevant to the context, and keep your answers concise and informative.

CONTEXT:
{context}

QUESTION: {question}

YOUR ANSWER:";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PromptTemplate {
    pub name: &'static str,
    pub text: &'static str,
}

static REGISTRY: &[PromptTemplate] = &[PromptTemplate {
    name: PRODUCT_BOT,
    text: PRODUCT_BOT_TEMPLATE,
}];

/// Finds a registered template.
pub fn lookup(name: &str) -> Option<&'static PromptTemplate> {
    REGISTRY.iter().find(|t| t.name == name)
}

/// Names of all registered templates.
pub fn names() -> impl Iterator<Item = &'static str> {
    REGISTRY.iter().map(|t| t.name)
}

/// Joins unit bodies in retrieval order.
pub fn context_block(units: &[RetrievableUnit]) -> String {
    units
        .iter()
        .map(|u| u.body.as_str())
        .collect::<Vec<_>>()
        .join(CONTEXT_DELIMITER)
}

impl PromptTemplate {
    /// Substitutes placeholders in a single left-to-right pass.
    ///
    /// Inserted text is never scanned again, so a question containing
    /// `{context}` stays literal.
    pub fn render(&self, context: &str, question: &str) -> String {
        let mut out = String::with_capacity(self.text.len() + context.len() + question.len());
        let mut rest = self.text;
        while let Some(start) = rest.find('{') {
            out.push_str(&rest[..start]);
            let tail = &rest[start..];
            if let Some(after) = tail.strip_prefix("{context}") {
                out.push_str(context);
                rest = after;
            } else if let Some(after) = tail.strip_prefix("{question}") {
                out.push_str(question);
                rest = after;
            } else {
                out.push('{');
                rest = &tail[1..];
            }
        }
        out.push_str(rest);
        out
    }
}
