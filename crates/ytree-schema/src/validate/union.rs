//! Union type validation.
//!
//! Alternatives are tried in schema declaration order and the first
//! alternative that fully validates wins. This ordering is an explicit
//! contract: no most-specific-match selection is attempted, so for
//! ambiguous unions the declared order is the only disambiguator.

use ytree_value::{LeafValue, ScalarValue};

use crate::schema::SchemaNodeId;
use crate::types::TypeDescriptor;

use super::context::ValidationContext;
use super::error::ValidationError;
use super::leaf::check_scalar;

/// Validate a union-typed leaf value.
///
/// A wrapper produced by decoding is unwrapped first; a wrapper whose
/// recorded alternative disagrees with its payload is a structural
/// error. Every alternative is then tried in declaration order against
/// the unwrapped scalar; a single full success validates the union and
/// discards all prior per-alternative failures, otherwise the
/// aggregated failures are attached to the no-match error.
pub fn validate_union(
    ctx: &ValidationContext<'_>,
    at: SchemaNodeId,
    desc: &TypeDescriptor,
    leaf: &LeafValue,
) {
    let path = ctx.path();

    let value: &ScalarValue = match leaf {
        LeafValue::Scalar(v) => v,
        LeafValue::Union(wrapper) => {
            if !wrapper.is_consistent() {
                ctx.record_error(ValidationError::Structural {
                    recorded: wrapper.kind.name().to_string(),
                    actual: wrapper.value.kind().name().to_string(),
                    path,
                });
                return;
            }
            &wrapper.value
        }
    };

    let alternatives = match ctx.schema.concrete_alternatives(at, desc) {
        Ok(alts) => alts,
        Err(e) => {
            ctx.record_error(ValidationError::SchemaInvalid {
                node: desc.name.clone(),
                reason: e.to_string(),
                path,
            });
            return;
        }
    };

    let mut collected = Vec::new();
    for alt in &alternatives {
        let errors = check_scalar(alt, value, &path);
        if errors.is_empty() {
            // First success wins; earlier per-alternative failures are
            // discarded.
            return;
        }
        collected.extend(errors);
    }

    ctx.record_error(ValidationError::NoMatch {
        value: value.to_string(),
        tried: alternatives.len(),
        errors: collected,
        path,
    });
}
