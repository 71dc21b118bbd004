//! Computed-column function classification
//!
//! Providers do not always report which function backs a computed column.
//! When they don't, the callee is recovered from the `computed_with`
//! expression text.

use pipescope_core::{Column, FuncType};
use regex::Regex;
use std::sync::OnceLock;

/// Module namespaces whose functions ship with the pipeline runtime
const BUILTIN_NAMESPACES: &[&str] = &[
    "pxt", "pixeltable", "string", "image", "video", "audio", "document", "json", "math",
    "timestamp", "date", "openai", "anthropic", "huggingface", "together", "mistralai",
    "gemini", "ollama", "fireworks", "replicate", "whisper", "yolox", "vision",
];

fn callee_regex() -> Option<&'static Regex> {
    static CALLEE: OnceLock<Option<Regex>> = OnceLock::new();
    CALLEE
        .get_or_init(|| {
            Regex::new(r"^\s*([A-Za-z_][A-Za-z0-9_]*(?:\.[A-Za-z_][A-Za-z0-9_]*)*)\s*\(").ok()
        })
        .as_ref()
}

fn query_regex() -> Option<&'static Regex> {
    static QUERY: OnceLock<Option<Regex>> = OnceLock::new();
    QUERY
        .get_or_init(|| {
            Regex::new(r"(?:^|[.\s(])(?:query|retrieval|[A-Za-z0-9_]*_query)\s*\(|\.similarity\s*\(")
                .ok()
        })
        .as_ref()
}

/// Function recovered from a computed column expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionSignature {
    /// Fully dotted callee, e.g. "openai.chat_completions"
    pub qualified_name: String,

    pub func_type: FuncType,
}

impl FunctionSignature {
    /// Parse the callee from an expression such as `openai.chat_completions(messages=...)`
    pub fn parse(expression: &str) -> Option<Self> {
        let callee = callee_regex()?;

        if query_regex().is_some_and(|re| re.is_match(expression)) {
            let qualified_name = callee
                .captures(expression)
                .and_then(|caps| caps.get(1))
                .map(|m| m.as_str().to_string())
                .unwrap_or_else(|| "query".to_string());

            return Some(Self {
                qualified_name,
                func_type: FuncType::Query,
            });
        }

        let caps = callee.captures(expression)?;
        let qualified_name = caps.get(1)?.as_str().to_string();

        let func_type = match qualified_name.split_once('.') {
            Some((namespace, _)) if BUILTIN_NAMESPACES.contains(&namespace) => FuncType::Builtin,
            _ => FuncType::CustomUdf,
        };

        Some(Self {
            qualified_name,
            func_type,
        })
    }

    /// Last segment of the dotted name
    pub fn short_name(&self) -> &str {
        self.qualified_name
            .rsplit('.')
            .next()
            .unwrap_or(&self.qualified_name)
    }
}

/// Fill in `func_type` / `func_name` on computed columns that lack them
///
/// Values reported by the provider are never overwritten. Returns the number
/// of columns that were changed.
pub fn classify_columns(columns: &mut [Column]) -> usize {
    let mut changed = 0;

    for column in columns.iter_mut().filter(|c| c.is_computed) {
        if column.func_type.is_some() && column.func_name.is_some() {
            continue;
        }

        let signature = column.computed_with.as_deref().and_then(FunctionSignature::parse);

        if column.func_type.is_none() {
            column.func_type = Some(
                signature
                    .as_ref()
                    .map(|s| s.func_type)
                    .unwrap_or(FuncType::Unknown),
            );
        }

        if column.func_name.is_none() {
            column.func_name = signature.map(|s| s.short_name().to_string());
        }

        changed += 1;
    }

    changed
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn builtin_namespace() {
        let sig = FunctionSignature::parse("openai.chat_completions(messages=messages, model='gpt-4o')")
            .unwrap();
        assert_eq!(sig.qualified_name, "openai.chat_completions");
        assert_eq!(sig.func_type, FuncType::Builtin);
        assert_eq!(sig.short_name(), "chat_completions");
    }

    #[test]
    fn custom_udf() {
        let sig = FunctionSignature::parse("create_messages(prompt, memory_context)").unwrap();
        assert_eq!(sig.func_type, FuncType::CustomUdf);
        assert_eq!(sig.short_name(), "create_messages");

        let dotted = FunctionSignature::parse("functions.extract_text(doc)").unwrap();
        assert_eq!(dotted.func_type, FuncType::CustomUdf);
    }

    #[test]
    fn query_functions() {
        let sig = FunctionSignature::parse("search_memory_query(prompt)").unwrap();
        assert_eq!(sig.func_type, FuncType::Query);
        assert_eq!(sig.qualified_name, "search_memory_query");

        let sim = FunctionSignature::parse("chunks.text.similarity(prompt)").unwrap();
        assert_eq!(sim.func_type, FuncType::Query);
    }

    #[test]
    fn non_call_expression() {
        assert_eq!(FunctionSignature::parse("answer['choices'][0]['message']"), None);
        assert_eq!(FunctionSignature::parse(""), None);
    }

    #[test]
    fn classify_fills_missing_fields_only() {
        let mut columns = vec![
            Column::new("prompt", "String"),
            Column::computed("response", "Json", "anthropic.messages(msgs)"),
            Column::computed("answer", "String", "response.content[0].text"),
            Column::computed("summary", "String", "summarize(answer)")
                .with_function(FuncType::Builtin, "summarize"),
        ];

        assert_eq!(classify_columns(&mut columns), 2);

        assert_eq!(columns[0].func_type, None);
        assert_eq!(columns[1].func_type, Some(FuncType::Builtin));
        assert_eq!(columns[1].func_name.as_deref(), Some("messages"));
        assert_eq!(columns[2].func_type, Some(FuncType::Unknown));
        assert_eq!(columns[2].func_name, None);
        assert_eq!(columns[3].func_type, Some(FuncType::Builtin));
    }
}
