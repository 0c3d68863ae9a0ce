//! Prompt builders: fixed system instruction + document context + question.

/// System instruction sent with every model call.
pub const SYSTEM_INSTRUCTION: &str = "You are a Teacher in Khon Kaen University you can help me to answer any question about Khon Kaen University. Answer in Thai";

/// Answer used when the model returns no text.
pub const NO_ANSWER: &str = "ขออภัยค่ะ ไม่พบคำตอบในขณะนี้ (No response text found.)";

/// Build the answer prompt.
///
/// The whole document is inlined between `---` fences; the model is told to
/// answer from it only.
///
/// # Example
/// ```
/// # use api::core::prompt::build_answer_prompt;
/// let prompt = build_answer_prompt("Faculty list", "มีกี่คณะ");
/// assert!(prompt.contains("Question: มีกี่คณะ"));
/// ```
pub fn build_answer_prompt(document: &str, question: &str) -> String {
    format!(
        "\nContext from Khon Kaen University document:\n---\n{document}\n---\n\n\
         Based *only* on the context above, please answer the following question in Thai:\n\n\
         Question: {question}\n\nAnswer:",
        question = question.trim()
    )
}

/// Build the prompt for picking one illustration.
///
/// Carries the same document context as the answer prompt so the pick
/// matches what the answer will talk about.
pub fn build_image_prompt(document: &str, question: &str, options: &[String]) -> String {
    let mut out = format!(
        "\nContext from Khon Kaen University document:\n---\n{document}\n---\n\n\
         Pick the one image file that would best illustrate an answer to the question below.\n\
         Reply with the file name exactly as listed. If none of them fits, reply with the last option.\n\nOptions:\n"
    );
    for opt in options {
        out.push_str("- ");
        out.push_str(opt);
        out.push('\n');
    }
    out.push_str("\nQuestion: ");
    out.push_str(question.trim());
    out.push('\n');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn answer_prompt_keeps_document_and_question_in_order() {
        let p = build_answer_prompt("DOC BODY", "  ค่าเทอม?  ");
        let doc_at = p.find("DOC BODY").unwrap();
        let q_at = p.find("Question: ค่าเทอม?\n").unwrap();
        assert!(doc_at < q_at);
        assert!(p.trim_end().ends_with("Answer:"));
    }

    #[test]
    fn empty_document_still_yields_valid_prompt() {
        let p = build_answer_prompt("", "q");
        assert!(p.contains("---\n\n---"));
    }

    #[test]
    fn image_prompt_lists_all_options() {
        let opts = vec!["a.png".to_string(), "Not use any image.".to_string()];
        let p = build_image_prompt("DOC BODY", "where?", &opts);
        assert!(p.find("DOC BODY").unwrap() < p.find("Options:").unwrap());
        assert!(p.contains("- a.png\n- Not use any image.\n"));
        assert!(p.ends_with("Question: where?\n"));
    }
}
