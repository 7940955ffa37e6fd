//! Input elements and where they come from.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::SpindleError;

/// One input element of a batch.
///
/// Elements are carried as JSON values so procedures can receive structured
/// input; file-sourced elements are always plain strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Element(serde_json::Value);

impl Element {
    pub fn new(value: serde_json::Value) -> Self {
        Self(value)
    }

    pub fn value(&self) -> &serde_json::Value {
        &self.0
    }

    pub fn into_value(self) -> serde_json::Value {
        self.0
    }

    /// String rendering used for diagnostics and progress previews.
    ///
    /// Strings render without JSON quoting.
    pub fn text(&self) -> String {
        match &self.0 {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

impl From<serde_json::Value> for Element {
    fn from(value: serde_json::Value) -> Self {
        Self(value)
    }
}

impl From<String> for Element {
    fn from(s: String) -> Self {
        Self(serde_json::Value::String(s))
    }
}

impl From<&str> for Element {
    fn from(s: &str) -> Self {
        Self(serde_json::Value::String(s.to_string()))
    }
}

/// Where a batch reads its elements from.
#[derive(Debug, Clone)]
pub enum InputSource {
    Single(Element),
    Sequence(Vec<Element>),
    /// A text file read line by line; every line becomes a string element.
    File(PathBuf),
}

impl InputSource {
    pub fn sequence<I, E>(items: I) -> Self
    where
        I: IntoIterator<Item = E>,
        E: Into<Element>,
    {
        Self::Sequence(items.into_iter().map(Into::into).collect())
    }

    /// Materialize the elements in encounter order.
    pub async fn into_elements(self) -> Result<Vec<Element>, SpindleError> {
        match self {
            InputSource::Single(element) => Ok(vec![element]),
            InputSource::Sequence(elements) => Ok(elements),
            InputSource::File(path) => {
                let contents = tokio::fs::read_to_string(&path)
                    .await
                    .map_err(|source| SpindleError::InputFile {
                        path: path.clone(),
                        source,
                    })?;
                Ok(contents.lines().map(Element::from).collect())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;

    #[test]
    fn text_renders_strings_without_quotes() {
        assert_eq!(Element::from("host1").text(), "host1");
        assert_eq!(Element::from(json!(42)).text(), "42");
        assert_eq!(Element::from(json!({"a": 1})).text(), r#"{"a":1}"#);
    }

    #[tokio::test]
    async fn file_lines_become_string_elements() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "alpha").unwrap();
        writeln!(file, "42").unwrap();
        writeln!(file, "true").unwrap();

        let elements = InputSource::File(file.path().to_path_buf())
            .into_elements()
            .await
            .unwrap();

        // 型変換はしない: "42" は文字列のまま
        assert_eq!(
            elements,
            vec![
                Element::from(json!("alpha")),
                Element::from(json!("42")),
                Element::from(json!("true")),
            ]
        );
    }

    #[tokio::test]
    async fn missing_file_is_reported() {
        let err = InputSource::File(PathBuf::from("/definitely/not/here.txt"))
            .into_elements()
            .await
            .unwrap_err();
        assert!(matches!(err, SpindleError::InputFile { .. }));
    }

    #[tokio::test]
    async fn single_value_is_a_batch_of_one() {
        let elements = InputSource::Single(Element::from("only"))
            .into_elements()
            .await
            .unwrap();
        assert_eq!(elements.len(), 1);
    }
}
