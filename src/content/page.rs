use std::path::Path;

use serde_yaml::{
    Mapping,
    Value,
};

use crate::error::RecordError;

/// Front matter delimiter line.
const DELIMITER: &str = "---";

/// A content page: YAML front matter followed by a free-form body.
#[derive(Debug, Clone, PartialEq)]
pub struct PageRecord {
    /// Parsed front matter, `None` when the page has no front matter block
    pub header: Option<Mapping>,
    pub body: String,
}

impl PageRecord {
    /// Splits a page into front matter and body.
    ///
    /// The front matter must start on the first line with `---` and ends at
    /// the next line consisting only of `---`.
    ///
    /// # Errors
    /// Returns error if the front matter is not closed or is not a YAML mapping.
    pub fn parse(path: &Path, text: &str) -> Result<Self, RecordError> {
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);

        let mut lines = text.split_inclusive('\n');
        let Some(first) = lines.next().filter(|line| is_delimiter(line)) else {
            return Ok(Self { header: None, body: text.to_string() });
        };

        let rest = &text[first.len()..];
        let mut offset = 0;
        for line in rest.split_inclusive('\n') {
            if is_delimiter(line) {
                let header = parse_header(path, &rest[..offset])?;
                let body = rest[offset + line.len()..].to_string();
                return Ok(Self { header: Some(header), body });
            }
            offset += line.len();
        }

        Err(RecordError::malformed(path, "front matter is not closed by a '---' line"))
    }

    /// Renders the page back to text: `---`, the YAML header, `---`, then
    /// the trimmed body followed by one newline.
    ///
    /// # Errors
    /// Returns error if the header cannot be serialized.
    pub fn render(&self) -> Result<String, serde_yaml::Error> {
        let Some(header) = &self.header else {
            return Ok(self.body.clone());
        };

        let yaml = serde_yaml::to_string(header)?;
        let body = self.body.trim();
        if body.is_empty() {
            Ok(format!("{DELIMITER}\n{yaml}{DELIMITER}\n"))
        } else {
            Ok(format!("{DELIMITER}\n{yaml}{DELIMITER}\n{body}\n"))
        }
    }
}

fn is_delimiter(line: &str) -> bool {
    line.trim_end_matches(['\r', '\n']) == DELIMITER
}

fn parse_header(path: &Path, yaml: &str) -> Result<Mapping, RecordError> {
    if yaml.trim().is_empty() {
        return Ok(Mapping::new());
    }

    match serde_yaml::from_str::<Value>(yaml) {
        Ok(Value::Mapping(mapping)) => Ok(mapping),
        Ok(Value::Null) => Ok(Mapping::new()),
        Ok(_) => Err(RecordError::malformed(path, "front matter is not a mapping")),
        Err(e) => Err(RecordError::malformed(path, format!("invalid front matter: {e}"))),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use googletest::prelude::*;
    use rstest::rstest;

    use super::*;

    fn parse(text: &str) -> Result<PageRecord, RecordError> {
        PageRecord::parse(Path::new("index.md"), text)
    }

    #[googletest::test]
    fn parse_splits_header_and_body() {
        let page = parse("---\ntitle: Home\n---\n# Hello\n\nText with --- inside\n").unwrap();

        let header = page.header.unwrap();
        expect_that!(header.get("title").and_then(Value::as_str), some(eq("Home")));
        expect_that!(page.body, eq("# Hello\n\nText with --- inside\n"));
    }

    #[googletest::test]
    fn parse_handles_crlf_delimiters() {
        let page = parse("---\r\ntitle: Home\r\n---\r\nBody\r\n").unwrap();

        expect_that!(page.header.is_some(), eq(true));
        expect_that!(page.body, eq("Body\r\n"));
    }

    #[googletest::test]
    fn parse_without_front_matter_keeps_body() {
        let page = parse("# Just markdown\n").unwrap();

        expect_that!(page.header, none());
        expect_that!(page.body, eq("# Just markdown\n"));
    }

    #[rstest]
    #[case::unclosed("---\ntitle: Home\n")]
    #[case::not_mapping("---\n- a\n---\n")]
    #[case::invalid_yaml("---\ntitle: [x\n---\n")]
    fn parse_malformed(#[case] text: &str) {
        assert!(matches!(parse(text), Err(RecordError::Malformed { .. })));
    }

    #[rstest]
    fn render_normalizes_layout() {
        let page = parse("---\ntitle: Home\n---\n\n  Body  \n\n").unwrap();

        assert_that!(page.render().unwrap(), eq("---\ntitle: Home\n---\nBody\n"));
    }

    #[rstest]
    fn render_is_stable_after_one_round() {
        let once = parse("---\ntitle:   'Home'\nlist: [a, b]\n---\nBody").unwrap().render().unwrap();
        let twice = parse(&once).unwrap().render().unwrap();

        assert_that!(twice, eq(&once));
    }
}
