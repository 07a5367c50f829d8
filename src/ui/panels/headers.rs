//! Headers pane rows: a General section followed by request and response
//! headers, each collapsible.

use crate::app::modes::Section;
use crate::domain::request::{format_duration, format_size};
use crate::domain::Request;
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderRow {
    Section {
        section: Section,
        collapsed: bool,
        count: usize,
    },
    Field {
        section: Section,
        name: String,
        value: String,
    },
}

impl HeaderRow {
    #[must_use]
    pub const fn section(&self) -> Section {
        match self {
            Self::Section { section, .. } | Self::Field { section, .. } => *section,
        }
    }

    /// Plain text of the row, used for in-pane search.
    #[must_use]
    pub fn text(&self) -> String {
        match self {
            Self::Section { section, .. } => section.title().to_string(),
            Self::Field { name, value, .. } => format!("{name}: {value}"),
        }
    }
}

fn general_fields(request: &Request) -> Vec<(String, String)> {
    let status = if request.failed {
        format!("(failed) {}", request.status_text)
    } else if request.status == 0 {
        "(pending)".to_string()
    } else {
        format!("{} {}", request.status, request.status_text).trim_end().to_string()
    };

    let mut fields = vec![
        ("Request URL".to_string(), request.url.clone()),
        ("Request Method".to_string(), request.method.clone()),
        ("Status Code".to_string(), status),
        ("Type".to_string(), request.resource_type.label().to_string()),
    ];
    if let Some(mime) = &request.mime_type {
        fields.push(("MIME Type".to_string(), mime.clone()));
    }
    if request.transferred_size > 0 {
        fields.push(("Transferred".to_string(), format_size(request.transferred_size)));
    }
    if request.duration > 0.0 {
        fields.push(("Duration".to_string(), format_duration(request.duration)));
    }
    fields
}

/// Flattens the request into header pane rows, omitting fields of
/// collapsed sections.
#[must_use]
pub fn header_rows(request: &Request, collapsed: &BTreeSet<Section>) -> Vec<HeaderRow> {
    let mut rows = Vec::new();
    for section in Section::ALL {
        let fields: Vec<(String, String)> = match section {
            Section::General => general_fields(request),
            Section::RequestHeaders => request
                .request_headers
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
            Section::ResponseHeaders => request
                .response_headers
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        };
        let is_collapsed = collapsed.contains(&section);
        rows.push(HeaderRow::Section {
            section,
            collapsed: is_collapsed,
            count: fields.len(),
        });
        if !is_collapsed {
            rows.extend(fields.into_iter().map(|(name, value)| HeaderRow::Field {
                section,
                name,
                value,
            }));
        }
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapsed_sections_hide_fields() {
        let mut request = Request::new("1", "https://a.test/x", "GET");
        request.response_headers.insert("etag".into(), "abc".into());

        let all = header_rows(&request, &BTreeSet::new());
        assert!(all.iter().any(|row| row.text() == "etag: abc"));

        let collapsed: BTreeSet<Section> = [Section::ResponseHeaders].into_iter().collect();
        let rows = header_rows(&request, &collapsed);
        assert_eq!(rows.len(), all.len() - 1);
        assert_eq!(
            rows.last(),
            Some(&HeaderRow::Section {
                section: Section::ResponseHeaders,
                collapsed: true,
                count: 1
            })
        );
    }
}
