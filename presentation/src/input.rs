use crate::examples::{example, EXAMPLES};
use anyhow::anyhow;
use domain::models::Query;
use shared::types::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputSource {
    Literal,
    Example(usize),
}

/// Decide what gets analyzed: typed text when there is any, otherwise the
/// selected preset example. Runs before the pipeline and yields one `Query`.
pub fn resolve_query(
    literal: &str,
    example_number: usize,
    max_chars: usize,
) -> Result<(Query, InputSource)> {
    if !literal.trim().is_empty() {
        return Ok((Query::parse(literal, max_chars)?, InputSource::Literal));
    }
    let case = example(example_number).ok_or_else(|| {
        anyhow!(
            "no example {example_number}; choose between 1 and {}",
            EXAMPLES.len()
        )
    })?;
    Ok((
        Query::parse(case.text, max_chars)?,
        InputSource::Example(example_number),
    ))
}
