//! JavaScript/JSX extraction.
//!
//! Delegates to the TypeScript extractor: that grammar parses JavaScript,
//! and JSX maps onto TSX.

use super::{typescript, Extraction, Language, ParseFailure};

pub(super) fn extract(content: &str, language: Language) -> Result<Extraction, ParseFailure> {
    let ts_language = match language {
        Language::Jsx => Language::Tsx,
        _ => Language::TypeScript,
    };
    typescript::extract(content, ts_language)
}
