use scraper::{Html, Selector};

#[derive(Debug)]
pub enum ParseError {
    SelectorError(String),
    FieldNotFound(String),
    EmptyValue(String),
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseError::SelectorError(s) => write!(f, "HTML selector error: {}", s),
            ParseError::FieldNotFound(name) => write!(f, "Input element '{}' not found in HTML", name),
            ParseError::EmptyValue(name) => write!(f, "Input element '{}' has no value", name),
        }
    }
}

impl std::error::Error for ParseError {}

/// Extracts the `value` attribute of the first `<input name="...">` element
/// matching `field_name`. A missing element or an absent/empty value is an
/// error, never an empty-string default: callers treat these fields as hard
/// preconditions for authentication and signing.
pub fn extract_input_value(html_content: &str, field_name: &str) -> Result<String, ParseError> {
    let document = Html::parse_document(html_content);
    let selector_str = format!("input[name=\"{}\"]", field_name);
    let selector = Selector::parse(&selector_str)
        .map_err(|e| ParseError::SelectorError(format!("{}: {:?}", selector_str, e)))?;

    let element = document
        .select(&selector)
        .next()
        .ok_or_else(|| ParseError::FieldNotFound(field_name.to_string()))?;

    match element.value().attr("value") {
        Some(value) if !value.is_empty() => Ok(value.to_string()),
        _ => Err(ParseError::EmptyValue(field_name.to_string())),
    }
}
