
/// What the model is told to answer when the context does not contain the answer
pub const NOT_FOUND_SENTINEL: &str = "Not found in documents.";

/// Instruction template; `{context}` and `{question}` are substituted once each
pub const PROMPT_TEMPLATE: &str = "
Answer the question using ONLY the context below.
If the answer is not present, say: Not found in documents.

Context:
{context}

Question:
{question}
";

/// Join chunk texts, in retrieval order, with blank lines
#[inline]
pub fn build_context<S: AsRef<str>>(chunks: &[S]) -> String {
    chunks
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[inline]
pub fn build_prompt<S: AsRef<str>>(question: &str, chunks: &[S]) -> String {
    let context = build_context(chunks);

    // substitute question first so braces inside the context are never re-expanded
    PROMPT_TEMPLATE
        .replacen("{question}", question, 1)
        .replacen("{context}", &context, 1)
}
