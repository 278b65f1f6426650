//! The policy engine.
//!
//! Maps the seven compatibility levels onto directional checker calls:
//! backward means the candidate reads the old data, forward means the
//! old schema reads the candidate's data, full is both. Transitive
//! variants run the same directional checks against every live
//! historical version instead of only the latest, failing at the first
//! incompatible one.

use crate::format::{self, ParsedSchema};
use schemata_model::{CheckResult, CompatibilityLevel};
use tracing::debug;

/// A historical live version in ascending version order.
pub struct HistoricalVersion {
    pub version: u32,
    pub schema: ParsedSchema,
}

/// Evaluate `candidate` against `history` under `level`.
///
/// `history` must be the live versions in ascending order; the engine
/// walks them newest-first so a non-transitive level only ever touches
/// the latest.
pub fn evaluate(
    level: CompatibilityLevel,
    candidate: &ParsedSchema,
    history: &[HistoricalVersion],
) -> CheckResult {
    if level == CompatibilityLevel::None || history.is_empty() {
        return CheckResult::Compatible;
    }

    let targets: Box<dyn Iterator<Item = &HistoricalVersion>> = if level.is_transitive() {
        Box::new(history.iter().rev())
    } else {
        Box::new(history.iter().rev().take(1))
    };

    for target in targets {
        let mut result = CheckResult::Compatible;
        if level.checks_backward() {
            result = result.merge(format::check(candidate, &target.schema));
        }
        if level.checks_forward() {
            result = result.merge(format::check(&target.schema, candidate));
        }
        if !result.is_compatible() {
            debug!(version = target.version, %level, "candidate incompatible");
            return result;
        }
    }
    CheckResult::Compatible
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::parse_with_closure;
    use schemata_model::SchemaFormat;

    fn avro(text: &str) -> ParsedSchema {
        parse_with_closure(SchemaFormat::Avro, text, &[], &[]).unwrap()
    }

    fn history(texts: &[&str]) -> Vec<HistoricalVersion> {
        texts
            .iter()
            .enumerate()
            .map(|(i, text)| HistoricalVersion {
                version: (i + 1) as u32,
                schema: avro(text),
            })
            .collect()
    }

    #[test]
    fn none_accepts_anything() {
        let result = evaluate(
            CompatibilityLevel::None,
            &avro(r#""string""#),
            &history(&[r#""long""#]),
        );
        assert!(result.is_compatible());
    }

    #[test]
    fn empty_history_accepts_first_version() {
        let result = evaluate(CompatibilityLevel::Full, &avro(r#""string""#), &[]);
        assert!(result.is_compatible());
    }

    #[test]
    fn backward_and_forward_are_directional() {
        // int -> long promotion reads one way only.
        let candidate = avro(r#""long""#);
        let old = history(&[r#""int""#]);
        assert!(evaluate(CompatibilityLevel::Backward, &candidate, &old).is_compatible());
        assert!(!evaluate(CompatibilityLevel::Forward, &candidate, &old).is_compatible());
        assert!(!evaluate(CompatibilityLevel::Full, &candidate, &old).is_compatible());
    }

    #[test]
    fn non_transitive_checks_only_latest() {
        // v1 is long (candidate int cannot read it), v2 is int.
        let candidate = avro(r#""int""#);
        let old = history(&[r#""long""#, r#""int""#]);
        assert!(evaluate(CompatibilityLevel::Backward, &candidate, &old).is_compatible());
        assert!(!evaluate(CompatibilityLevel::BackwardTransitive, &candidate, &old).is_compatible());
    }

    #[test]
    fn transitive_requires_every_live_version() {
        let candidate = avro(r#""double""#);
        let old = history(&[r#""int""#, r#""long""#, r#""float""#]);
        assert!(evaluate(CompatibilityLevel::BackwardTransitive, &candidate, &old).is_compatible());

        // long reads the ints at v2 and v3 but not the string at v1.
        let narrower = avro(r#""long""#);
        let old = history(&[r#""string""#, r#""int""#, r#""int""#]);
        assert!(evaluate(CompatibilityLevel::Backward, &narrower, &old).is_compatible());
        assert!(!evaluate(CompatibilityLevel::BackwardTransitive, &narrower, &old).is_compatible());
    }
}
