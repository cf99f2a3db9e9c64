//! HTML entity handling for index keys and labels.
//!
//! The generator writes keys and labels with markup characters escaped
//! (`&lt;`, `&amp;`, numeric references for leading digits, ...). Matching
//! and display work on the decoded text; [`escape_html`] produces the
//! escaped forms again for renderers that emit markup.

/// Longest reference body we hand to the decoder
const MAX_ENTITY_LEN: usize = 32;

/// Decode named and numeric HTML character references.
///
/// Each `&...;` reference is decoded on its own, so an unknown name or a
/// malformed reference is kept verbatim without affecting its neighbours.
pub fn decode_entities(s: &str) -> String {
    if !s.contains('&') {
        return s.to_string();
    }

    let mut out = String::with_capacity(s.len());
    let mut rest = s;

    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp + 1..];

        let decoded = tail
            .find(';')
            .filter(|&semi| semi > 0 && semi <= MAX_ENTITY_LEN)
            .and_then(|semi| {
                let body = &tail[..semi];
                if body.contains(['&', ' ']) {
                    return None;
                }
                htmlescape::decode_html(&format!("&{};", body))
                    .ok()
                    .map(|text| (text, semi))
            });

        match decoded {
            Some((text, semi)) => {
                out.push_str(&text);
                rest = &tail[semi + 1..];
            }
            None => {
                out.push('&');
                rest = tail;
            }
        }
    }

    out.push_str(rest);
    out
}

/// Escape reserved markup characters for display in HTML.
pub fn escape_html(s: &str) -> String {
    htmlescape::encode_minimal(s)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_named() {
        assert_eq!(decode_entities("VmaVector&lt; T &gt;"), "VmaVector< T >");
        assert_eq!(decode_entities("a &amp;&amp; b"), "a && b");
        assert_eq!(decode_entities("&quot;x&quot;"), "\"x\"");
    }

    #[test]
    fn test_decode_full_entity_table() {
        assert_eq!(
            decode_entities("Copy&ndash;on&ndash;write &copy; &hellip;"),
            "Copy\u{2013}on\u{2013}write \u{a9} \u{2026}"
        );
        assert_eq!(decode_entities("a&nbsp;b"), "a\u{a0}b");
    }

    #[test]
    fn test_decode_numeric() {
        assert_eq!(decode_entities("&#50;d textures"), "2d textures");
        assert_eq!(decode_entities("&#x41;&#98;"), "Ab");
    }

    #[test]
    fn test_decode_keeps_unknown_and_malformed() {
        assert_eq!(decode_entities("&bogus; & &;"), "&bogus; & &;");
        assert_eq!(decode_entities("&#xZZ;"), "&#xZZ;");
        assert_eq!(decode_entities("tail &amp"), "tail &amp");
        assert_eq!(decode_entities("&bogus; &lt;b&gt;"), "&bogus; <b>");
    }

    #[test]
    fn test_escape_roundtrip_reserved() {
        for ch in ["&", "<", ">", "\"", "'"] {
            let escaped = escape_html(ch);
            assert_ne!(escaped, ch);
            assert_eq!(decode_entities(&escaped), ch);
            assert_eq!(escape_html(&decode_entities(&escaped)), escaped);
        }

        let label = "operator&lt;&lt; for &quot;Vma&quot; &amp; co";
        assert_eq!(escape_html(&decode_entities(label)), label);
    }
}
