//! Naming and output paths
//!
//! Pure functions mapping a schema's title and location to a slug, a page
//! file name and the directory the page lives in. Directory placement and
//! cross-links both go through [`file_name`] and [`file_path`], so a link
//! always points at the place the page was written to.
//!
//! A location is `<path>#<anchor>`, e.g. `test/ref.schema.json#/definitions/a`.

use std::path::PathBuf;
use std::sync::OnceLock;

use percent_encoding::percent_decode_str;
use regex::Regex;

/// Anchor prefixes whose targets are placed in a nested `definitions` directory
pub const DEFINITION_CONTAINERS: &[&str] = &["/definitions", "/$defs"];

/// Name of the directory definition pages are written to
pub const DEFINITIONS_DIR: &str = "definitions";

fn non_word() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^A-Za-z0-9]+").expect("valid regex"))
}

fn remote_scheme() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^https?://").expect("valid regex"))
}

/// Convert camelCase / PascalCase / spaced words to kebab-case
///
/// `HelloWorld` -> `hello-world`, `JSONSchema` -> `json-schema`. Characters
/// other than word separators are kept; [`slugify`] strips them afterwards.
pub fn to_kebab_case(s: &str) -> String {
    let chars: Vec<char> = s.chars().collect();
    let mut result = String::with_capacity(s.len() + 4);

    for (i, &c) in chars.iter().enumerate() {
        if c == ' ' || c == '_' || c == '-' || c == '.' {
            result.push('-');
            continue;
        }

        if c.is_uppercase() && i > 0 {
            let prev = chars[i - 1];
            let next_lower = chars.get(i + 1).map(|n| n.is_lowercase()).unwrap_or(false);
            if prev.is_lowercase() || prev.is_ascii_digit() || (prev.is_uppercase() && next_lower) {
                result.push('-');
            }
        }

        result.extend(c.to_lowercase());
    }

    result
}

/// URL and filesystem safe slug
///
/// Runs of anything other than ASCII letters and digits collapse to a single
/// hyphen; leading and trailing hyphens are trimmed.
pub fn slugify(s: &str) -> String {
    let kebab = to_kebab_case(s);
    non_word()
        .replace_all(&kebab, "-")
        .trim_matches('-')
        .to_string()
}

/// Last path segment with the final extension removed
///
/// `test/ref.schema.json#` -> `ref.schema`, `/sample/file.ext` -> `file`.
pub fn filename_without_ext(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    let base = trimmed.rsplit('/').next().unwrap_or(trimmed);
    match base.rfind('.') {
        Some(i) => &base[..i],
        None => base,
    }
}

/// Path before the anchor: `/a/b/c#d/e` -> `/a/b/c`
pub fn trim_anchor(location: &str) -> &str {
    match location.find('#') {
        Some(i) => &location[..i],
        None => location,
    }
}

/// Path after the anchor: `/a/b/c#d/e` -> `d/e`
pub fn anchor_path(location: &str) -> &str {
    match location.find('#') {
        Some(i) => &location[i + 1..],
        None => "",
    }
}

/// Human readable label for an untitled schema
pub fn humanize(location: &str) -> String {
    percent_decode(filename_without_ext(location).trim_end_matches('#'))
}

/// Decode `%XX` escapes, keeping the input when it is not valid UTF-8 once decoded
pub(crate) fn percent_decode(s: &str) -> String {
    percent_decode_str(s)
        .decode_utf8()
        .map(|decoded| decoded.into_owned())
        .unwrap_or_else(|_| s.to_string())
}

/// Whether a location is an absolute network address
pub fn is_remote_ref(location: &str) -> bool {
    remote_scheme().is_match(location)
}

/// Whether `reference` points into the same document as `location`
pub fn is_internal_ref(location: &str, reference: &str) -> bool {
    trim_anchor(location) == trim_anchor(reference)
}

/// First non-empty value, or the empty string
pub fn first_non_empty<'a>(values: &[&'a str]) -> &'a str {
    values.iter().copied().find(|v| !v.is_empty()).unwrap_or("")
}

/// Capitalize the first letter of every word and lowercase the rest
pub fn title_case(s: &str) -> String {
    s.split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Page name for a schema
///
/// The slugified title, or the slugified last location segment when the
/// title is absent or has no word characters.
pub fn file_name(title: &str, location: &str) -> String {
    let name = slugify(title);
    if name.is_empty() {
        return slugify(filename_without_ext(location));
    }
    name
}

/// Output directory for a schema, relative to the destination root
///
/// `<file-stem-slug>` for anything in a document, `<file-stem-slug>/definitions`
/// when the anchor starts in a definitions container, empty when the location
/// has no anchor.
pub fn file_path(location: &str) -> PathBuf {
    let Some(i) = location.rfind('#') else {
        return PathBuf::new();
    };

    let root = PathBuf::from(slugify(filename_without_ext(&location[..i])));
    let anchor = &location[i + 1..];
    let in_container = DEFINITION_CONTAINERS.iter().any(|prefix| {
        anchor
            .strip_prefix(prefix)
            .map(|rest| rest.is_empty() || rest.starts_with('/'))
            .unwrap_or(false)
    });

    if in_container {
        root.join(DEFINITIONS_DIR)
    } else {
        root
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify() {
        let cases = [
            ("/properties/dimensions", "properties-dimensions"),
            ("test/ref.schema.json#", "test-ref-schema-json"),
            ("Hello World", "hello-world"),
            ("HelloWorld", "hello-world"),
            ("JSONSchema", "json-schema"),
            ("snake_case__name", "snake-case-name"),
            ("#$%#", ""),
            ("Café", "caf"),
            ("naïve Type", "na-ve-type"),
        ];
        for (input, expected) in cases {
            assert_eq!(slugify(input), expected, "slugify({input:?})");
        }
    }

    #[test]
    fn test_percent_decode() {
        assert_eq!(percent_decode("my%20schema"), "my schema");
        assert_eq!(percent_decode("caf%C3%A9"), "café");
        assert_eq!(percent_decode("50%"), "50%");
        assert_eq!(percent_decode("bad%FF"), "bad%FF");
    }

    #[test]
    fn test_filename_without_ext() {
        assert_eq!(filename_without_ext("test/ref.schema.json#"), "ref.schema");
        assert_eq!(filename_without_ext("/sample/file.ext"), "file");
        assert_eq!(filename_without_ext("test/"), "test");
    }

    #[test]
    fn test_anchor_helpers() {
        let cases = [
            ("ref.schema.json#/definitions/pagination/properties/first", "ref.schema.json", "/definitions/pagination/properties/first"),
            ("test/ref.schema.json#/attributes", "test/ref.schema.json", "/attributes"),
            ("ref.schema.json#", "ref.schema.json", ""),
            ("ref.schema.json", "ref.schema.json", ""),
        ];
        for (location, path, anchor) in cases {
            assert_eq!(trim_anchor(location), path);
            assert_eq!(anchor_path(location), anchor);
        }
    }

    #[test]
    fn test_humanize() {
        assert_eq!(humanize("test/ref.schema.json#"), "ref.schema");
        assert_eq!(humanize("http://json-schema.org/draft-04/schema#"), "schema");
        assert_eq!(humanize("a/my%20file.json#"), "my file");
        assert_eq!(humanize("a/bad%zzname.json#"), "bad%zzname");
    }

    #[test]
    fn test_is_remote_ref() {
        let cases = [
            ("https://spandigital.com", true),
            ("http://ref.schema.json#", true),
            ("http://json-schema.org/draft-06/schema#", true),
            ("file://json-schema.org/draft-06/schema#", false),
            ("http:/json-schema.org/draft-06/schema#", false),
            ("https//json-schema.org/draft-06/schema#", false),
        ];
        for (location, expected) in cases {
            assert_eq!(is_remote_ref(location), expected, "{location}");
        }
    }

    #[test]
    fn test_is_internal_ref() {
        let location = "http://ref.schema.json";
        assert!(!is_internal_ref(location, "https://spandigital.com"));
        assert!(is_internal_ref(location, "http://ref.schema.json#"));
        assert!(is_internal_ref(location, "http://ref.schema.json#/properties/attributes"));
        assert!(is_internal_ref("http://ref.schema.json#/a", "http://ref.schema.json"));
    }

    #[test]
    fn test_first_non_empty() {
        assert_eq!(first_non_empty(&["", "", "c"]), "c");
        assert_eq!(first_non_empty(&["", "b"]), "b");
        assert_eq!(first_non_empty(&["", ""]), "");
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("hello World"), "Hello World");
        assert_eq!(title_case("helloWorld"), "Helloworld");
        assert_eq!(title_case("wORLD"), "World");
    }

    #[test]
    fn test_file_name() {
        assert_eq!(file_name("", "a/b.schema.json#"), "b-schema");
        assert_eq!(file_name("", "test/ref.schema.json#"), "ref-schema");
        assert_eq!(file_name("", "/test/sample.schema.json#/properties/dimensions"), "dimensions");
        assert_eq!(file_name("Ref", "test/ref.schema.json#"), "ref");
        assert_eq!(file_name("Hello World", "anything.json#/x"), "hello-world");
        assert_eq!(file_name("#$%#", "test/ref.schema.json#"), "ref-schema");
        assert_eq!(file_name("#$%#", "test/"), "test");
    }

    #[test]
    fn test_file_path() {
        let cases = [
            ("ref.schema.json#/definitions/pagination/properties/first", "ref-schema/definitions"),
            ("test/ref.schema.json#/attributes", "ref-schema"),
            ("test/ref.schema.json#/definitions/attributes/dimensions", "ref-schema/definitions"),
            ("test/ref.schema.json#/$defs/attributes", "ref-schema/definitions"),
            ("test/ref.schema.json#/definitionsExtra", "ref-schema"),
            ("test/ref.schema.json#/attributes/dimensions", "ref-schema"),
            ("ref.schema.json#", "ref-schema"),
            ("ref.schema.json", ""),
        ];
        for (location, expected) in cases {
            assert_eq!(file_path(location), PathBuf::from(expected), "{location}");
        }
    }
}
