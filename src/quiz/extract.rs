/// Returns the slice from the first `{` to the last `}`.
///
/// Models tend to wrap the requested JSON in prose or code fences; only the
/// outermost brace span is handed to the JSON parser.
pub fn json_object_slice(response: &str) -> Option<&str> {
    let start = response.find('{')?;
    let end = response.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&response[start..=end])
}
