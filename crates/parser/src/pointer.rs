//! JSON Pointer fragments as used by `$ref`

use percent_encoding::percent_decode_str;
use serde_json::Value;
use swagger_pipeline_common::ResolutionCause;

/// Percent-decode a fragment (the part after `#`) into a JSON Pointer
///
/// An empty fragment addresses the whole document.
fn decode_fragment(fragment: &str) -> Result<String, ResolutionCause> {
    let decoded = percent_decode_str(fragment)
        .decode_utf8()
        .map_err(|_| ResolutionCause::Malformed(format!("#{}", fragment)))?;

    if !decoded.is_empty() && !decoded.starts_with('/') {
        return Err(ResolutionCause::Malformed(format!("#{}", fragment)));
    }

    Ok(decoded.into_owned())
}

/// Split a fragment into unescaped reference tokens
pub fn parse_fragment(fragment: &str) -> Result<Vec<String>, ResolutionCause> {
    let pointer = decode_fragment(fragment)?;

    Ok(pointer
        .split('/')
        .skip(1)
        .map(|token| token.replace("~1", "/").replace("~0", "~"))
        .collect())
}

/// Resolve a fragment against `root`
pub fn lookup_fragment<'a>(root: &'a Value, fragment: &str) -> Result<&'a Value, ResolutionCause> {
    let pointer = decode_fragment(fragment)?;
    root.pointer(&pointer)
        .ok_or_else(|| ResolutionCause::MissingTarget(format!("#{}", fragment)))
}
