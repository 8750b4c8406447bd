//! `.docx` parsing: unzips the OOXML container, walks `word/document.xml`,
//! and turns the paragraph stream into `(heading_path, body_text)` sections
//! keyed by a heading stack.

use std::io::Read;

use quick_xml::events::Event;
use quick_xml::reader::Reader;
use regex::Regex;
use std::sync::OnceLock;

use crate::error::DocxParserError;

/// One paragraph extracted from the document body, with its resolved style
/// name (if any) and its text run content concatenated.
#[derive(Debug, Clone, PartialEq)]
pub struct ParagraphRecord {
    pub style_name: Option<String>,
    pub text: String,
}

fn heading_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"Heading (\d+)").expect("static pattern is valid"))
}

/// Returns the heading level of a paragraph's style, or `None` if it isn't
/// a heading style.
pub fn parse_level(paragraph: &ParagraphRecord) -> Option<usize> {
    let style = paragraph.style_name.as_deref()?;
    heading_regex()
        .captures(style)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<usize>().ok())
}

/// Collapses any run of whitespace to a single space and trims the ends.
pub fn remove_extra_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last_was_space = false;
    for ch in text.chars() {
        if ch.is_whitespace() {
            if !last_was_space && !out.is_empty() {
                out.push(' ');
            }
            last_was_space = true;
        } else {
            out.push(ch);
            last_was_space = false;
        }
    }
    if out.ends_with(' ') {
        out.pop();
    }
    out
}

/// Turns a paragraph stream into heading-stacked sections.
///
/// On a heading paragraph at level `L`: emits the section accumulated so
/// far, truncates the heading stack to `L - 1` entries, pushes the new
/// heading text, and resets the body to the heading text itself (the
/// heading line is part of the body of the section it opens). On a body
/// paragraph: appends its text to the body with a blank-line separator.
/// Always emits one final section after the stream ends, including for an
/// empty stream (an empty heading path paired with empty body text).
pub fn parse_sections(paragraphs: &[ParagraphRecord]) -> Vec<(Vec<String>, String)> {
    let mut sections = Vec::new();
    let mut headers: Vec<String> = Vec::new();
    let mut contents: Vec<String> = Vec::new();

    for paragraph in paragraphs {
        let text = remove_extra_whitespace(&paragraph.text);
        match parse_level(paragraph) {
            Some(level) => {
                sections.push((headers.clone(), contents.join("\n\n")));

                let keep = level.saturating_sub(1);
                headers.truncate(keep);
                headers.push(text.clone());
                contents = vec![text];
            }
            None => {
                contents.push(text);
            }
        }
    }

    sections.push((headers, contents.join("\n\n")));
    sections
}

/// Extracts the paragraph stream from a raw `.docx` byte buffer.
pub fn extract_paragraphs(bytes: &[u8]) -> Result<Vec<ParagraphRecord>, DocxParserError> {
    let cursor = std::io::Cursor::new(bytes);
    let mut archive = zip::ZipArchive::new(cursor)
        .map_err(|e| DocxParserError(format!("failed to open docx as a zip archive: {e}")))?;

    let mut document_xml = String::new();
    archive
        .by_name("word/document.xml")
        .map_err(|e| DocxParserError(format!("missing word/document.xml: {e}")))?
        .read_to_string(&mut document_xml)
        .map_err(|e| DocxParserError(format!("word/document.xml is not valid UTF-8: {e}")))?;

    parse_document_xml(&document_xml)
}

/// Walks `word/document.xml` and collects one [`ParagraphRecord`] per `<w:p>`.
fn parse_document_xml(xml: &str) -> Result<Vec<ParagraphRecord>, DocxParserError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text = false;

    let mut paragraphs = Vec::new();
    let mut buf = Vec::new();

    let mut in_paragraph = false;
    let mut in_text_run = false;
    let mut current_style: Option<String> = None;
    let mut current_text = String::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Err(e) => {
                return Err(DocxParserError(format!(
                    "malformed XML in word/document.xml: {e}"
                )));
            }
            Ok(Event::Eof) => break,
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"p" => {
                    in_paragraph = true;
                    current_style = None;
                    current_text.clear();
                }
                b"pStyle" if in_paragraph => {
                    for attr in e.attributes().flatten() {
                        if attr.key.local_name().as_ref() == b"val" {
                            current_style = Some(
                                String::from_utf8_lossy(&attr.value).into_owned(),
                            );
                        }
                    }
                }
                b"t" if in_paragraph => in_text_run = true,
                _ => {}
            },
            Ok(Event::Empty(e)) => {
                if e.local_name().as_ref() == b"pStyle" && in_paragraph {
                    for attr in e.attributes().flatten() {
                        if attr.key.local_name().as_ref() == b"val" {
                            current_style = Some(
                                String::from_utf8_lossy(&attr.value).into_owned(),
                            );
                        }
                    }
                }
            }
            Ok(Event::Text(e)) => {
                if in_text_run {
                    let decoded = e
                        .unescape()
                        .map_err(|err| {
                            DocxParserError(format!("invalid text run encoding: {err}"))
                        })?
                        .into_owned();
                    current_text.push_str(&decoded);
                }
            }
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"t" => in_text_run = false,
                b"p" => {
                    paragraphs.push(ParagraphRecord {
                        style_name: current_style.take(),
                        text: std::mem::take(&mut current_text),
                    });
                    in_paragraph = false;
                }
                _ => {}
            },
            _ => {}
        }
        buf.clear();
    }

    Ok(paragraphs)
}

/// Parses a `.docx` byte buffer straight into heading-stacked sections.
pub fn parse(bytes: &[u8]) -> Result<Vec<(Vec<String>, String)>, DocxParserError> {
    let paragraphs = extract_paragraphs(bytes)?;
    Ok(parse_sections(&paragraphs))
}

/// Mints a fresh source id for a source that wasn't given one explicitly.
pub fn new_source_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Pairs sources with source ids, padding missing ids with fresh ones and
/// truncating extras, matching the original's `iter_sources` positional
/// contract: shorter `source_ids` is padded with generated ids, longer
/// `source_ids` is truncated to `sources`' length.
pub fn iter_sources<T>(sources: Vec<T>, source_ids: Option<Vec<String>>) -> Vec<(T, String)> {
    let mut ids = source_ids.unwrap_or_default();
    let diff = sources.len() as isize - ids.len() as isize;
    if diff > 0 {
        ids.extend((0..diff).map(|_| new_source_id()));
    } else if diff < 0 {
        ids.truncate(sources.len());
    }
    sources.into_iter().zip(ids).collect()
}


#[cfg(test)]
mod tests {
    use super::*;

    fn para(text: &str, level: Option<usize>) -> ParagraphRecord {
        ParagraphRecord {
            style_name: level.map(|l| format!("Heading {l}")),
            text: text.to_string(),
        }
    }

    #[test]
    fn parse_level_reads_the_captured_digit() {
        assert_eq!(parse_level(&para("x", Some(1))), Some(1));
        assert_eq!(parse_level(&para("x", Some(3))), Some(3));
        assert_eq!(parse_level(&para("x", None)), None);
    }

    #[test]
    fn parse_walks_a_real_docx_byte_buffer() {
        let bytes = test_support::build_docx(&[
            ("Intro", Some("Heading 1")),
            ("Active content has to be disabled.", None),
        ]);
        let sections = parse(&bytes).unwrap();
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].0, vec!["Intro".to_string()]);
        assert_eq!(
            sections[0].1,
            "Intro\n\nActive content has to be disabled."
        );
    }

    #[test]
    fn parse_surfaces_an_error_for_a_non_zip_buffer() {
        let err = parse(b"not a docx").unwrap_err();
        assert!(err.0.contains("zip"));
    }

    #[test]
    fn empty_document_yields_one_empty_section() {
        let sections = parse_sections(&[]);
        assert_eq!(sections, vec![(vec![], String::new())]);
    }

    #[test]
    fn single_body_paragraph_has_no_heading_path() {
        let sections = parse_sections(&[para("Content 1", None)]);
        assert_eq!(sections, vec![(vec![], "Content 1".to_string())]);
    }

    #[test]
    fn single_heading_opens_a_section_with_itself_as_body() {
        let sections = parse_sections(&[para("Heading 1", Some(1))]);
        assert_eq!(
            sections,
            vec![(vec!["Heading 1".to_string()], "Heading 1".to_string())]
        );
    }

    #[test]
    fn heading_then_body_accumulates_into_one_section() {
        let sections = parse_sections(&[
            para("Heading 1", Some(1)),
            para("Content 1", None),
            para("Content 2", None),
        ]);
        assert_eq!(
            sections,
            vec![(
                vec!["Heading 1".to_string()],
                "Heading 1\n\nContent 1\n\nContent 2".to_string()
            )]
        );
    }

    #[test]
    fn nested_headings_build_a_growing_path() {
        let sections = parse_sections(&[
            para("Heading 1", Some(1)),
            para("Content 1", None),
            para("Heading 2", Some(2)),
            para("Content 2", None),
            para("Content 3", None),
            para("Heading 3", Some(3)),
            para("Content 4", None),
        ]);
        assert_eq!(
            sections,
            vec![
                (
                    vec!["Heading 1".to_string()],
                    "Heading 1\n\nContent 1".to_string()
                ),
                (
                    vec!["Heading 1".to_string(), "Heading 2".to_string()],
                    "Heading 2\n\nContent 2\n\nContent 3".to_string()
                ),
                (
                    vec![
                        "Heading 1".to_string(),
                        "Heading 2".to_string(),
                        "Heading 3".to_string()
                    ],
                    "Heading 3\n\nContent 4".to_string()
                ),
            ]
        );
    }

    #[test]
    fn sibling_headings_at_the_same_level_reset_the_stack() {
        let sections = parse_sections(&[
            para("Heading 1", Some(1)),
            para("Heading 2", Some(1)),
            para("Heading 3", Some(1)),
        ]);
        assert_eq!(
            sections,
            vec![
                (vec!["Heading 1".to_string()], "Heading 1".to_string()),
                (vec!["Heading 2".to_string()], "Heading 2".to_string()),
                (vec!["Heading 3".to_string()], "Heading 3".to_string()),
            ]
        );
    }

    #[test]
    fn a_shallower_heading_truncates_a_deeper_stack() {
        let sections = parse_sections(&[
            para("Heading 1", Some(1)),
            para("Heading 2", Some(3)),
            para("Heading 3", Some(2)),
        ]);
        assert_eq!(
            sections,
            vec![
                (vec!["Heading 1".to_string()], "Heading 1".to_string()),
                (
                    vec!["Heading 1".to_string(), "Heading 2".to_string()],
                    "Heading 2".to_string()
                ),
                (
                    vec!["Heading 1".to_string(), "Heading 3".to_string()],
                    "Heading 3".to_string()
                ),
            ]
        );
    }

    #[test]
    fn whitespace_collapses_to_single_spaces() {
        assert_eq!(remove_extra_whitespace("  a   b\tc\n\nd  "), "a b c d");
    }

    #[test]
    fn iter_sources_pads_missing_ids_with_fresh_uuids() {
        let paired = iter_sources(vec!["a", "b", "c"], Some(vec!["id1".to_string()]));
        assert_eq!(paired[0], ("a", "id1".to_string()));
        assert_eq!(paired[1].0, "b");
        assert_eq!(paired[2].0, "c");
        assert_ne!(paired[1].1, paired[2].1);
    }

    #[test]
    fn iter_sources_truncates_excess_ids() {
        let paired = iter_sources(
            vec!["only"],
            Some(vec!["id1".to_string(), "id2".to_string(), "id3".to_string()]),
        );
        assert_eq!(paired, vec![("only", "id1".to_string())]);
    }

    #[test]
    fn iter_sources_matches_equal_lengths_positionally() {
        let paired = iter_sources(
            vec!["a", "b"],
            Some(vec!["id1".to_string(), "id2".to_string()]),
        );
        assert_eq!(
            paired,
            vec![("a", "id1".to_string()), ("b", "id2".to_string())]
        );
    }

    #[test]
    fn iter_sources_generates_all_ids_when_none() {
        let paired = iter_sources(vec!["a", "b"], None);
        assert_eq!(paired[0].0, "a");
        assert_eq!(paired[1].0, "b");
        assert_ne!(paired[0].1, paired[1].1);
    }
}
