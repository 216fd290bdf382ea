//! Annotation micro-protocol
//!
//! Run metadata annotations carry provenance hints under a fixed key
//! prefix. Submitter identity uses positional keys
//! (`provenance.submitter.identifier.<n>`, `provenance.submitter.name.<n>`);
//! the rest are single-valued.

use std::collections::BTreeMap;

/// Key prefix of the positional submitter fields.
pub const SUBMITTER_PREFIX: &str = "provenance.submitter.";

/// License URL applied to every dataset of the run.
pub const LICENSE_KEY: &str = "provenance.license";

/// Comma-separated keyword list.
pub const KEYWORDS_KEY: &str = "provenance.keywords";

/// Root dataset name override.
pub const NAME_KEY: &str = "provenance.name";

/// Root dataset description override.
pub const DESCRIPTION_KEY: &str = "provenance.description";

/// One submitter decoded from the positional keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submitter {
    /// Positional index the fields were keyed under
    pub index: u32,
    /// Stable identity (an ORCID or similar URL)
    pub identifier: String,
    /// Display name, when one was annotated
    pub name: Option<String>,
}

/// Split one submitter key into its field name and positional index.
fn parse_submitter_key(key: &str) -> Option<(u32, &str)> {
    let rest = key.strip_prefix(SUBMITTER_PREFIX)?;
    let (field, index) = rest.rsplit_once('.')?;
    let index = index.parse().ok()?;
    Some((index, field))
}

/// Decode the submitters of a run, ascending by index.
///
/// An index without an identifier is incomplete and dropped; a display
/// name alone names nobody.
#[must_use]
pub fn submitters(annotations: &BTreeMap<String, String>) -> Vec<Submitter> {
    let mut fields: BTreeMap<u32, (Option<String>, Option<String>)> = BTreeMap::new();
    for (key, value) in annotations {
        let Some((index, field)) = parse_submitter_key(key) else {
            continue;
        };
        let entry = fields.entry(index).or_default();
        match field {
            "identifier" => entry.0 = Some(value.clone()),
            "name" => entry.1 = Some(value.clone()),
            _ => {}
        }
    }
    fields
        .into_iter()
        .filter_map(|(index, (identifier, name))| {
            let identifier = identifier?;
            Some(Submitter {
                index,
                identifier,
                name,
            })
        })
        .collect()
}

/// License URL of the run, if annotated.
#[must_use]
pub fn license(annotations: &BTreeMap<String, String>) -> Option<String> {
    annotations.get(LICENSE_KEY).cloned()
}

/// Keywords of the run; empty entries of the comma list are dropped.
#[must_use]
pub fn keywords(annotations: &BTreeMap<String, String>) -> Vec<String> {
    annotations
        .get(KEYWORDS_KEY)
        .map(|list| {
            list.split(',')
                .map(str::trim)
                .filter(|keyword| !keyword.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Annotated root dataset name.
#[must_use]
pub fn title(annotations: &BTreeMap<String, String>) -> Option<String> {
    annotations.get(NAME_KEY).cloned()
}

/// Annotated root dataset description.
#[must_use]
pub fn description(annotations: &BTreeMap<String, String>) -> Option<String> {
    annotations.get(DESCRIPTION_KEY).cloned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn annotations(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect()
    }

    #[test]
    fn submitters_are_decoded_positionally() {
        let annotations = annotations(&[
            ("provenance.submitter.identifier.1", "https://orcid.org/1"),
            ("provenance.submitter.name.1", "Ada"),
            ("provenance.submitter.identifier.2", "https://orcid.org/2"),
        ]);
        assert_eq!(
            submitters(&annotations),
            vec![
                Submitter {
                    index: 1,
                    identifier: "https://orcid.org/1".to_string(),
                    name: Some("Ada".to_string()),
                },
                Submitter {
                    index: 2,
                    identifier: "https://orcid.org/2".to_string(),
                    name: None,
                },
            ]
        );
    }

    #[test]
    fn submitter_order_is_ascending_by_index() {
        let annotations = annotations(&[
            ("provenance.submitter.identifier.10", "https://orcid.org/10"),
            ("provenance.submitter.identifier.2", "https://orcid.org/2"),
        ]);
        let indices: Vec<u32> = submitters(&annotations).iter().map(|s| s.index).collect();
        assert_eq!(indices, [2, 10]);
    }

    #[test]
    fn name_without_identifier_names_nobody() {
        let annotations = annotations(&[("provenance.submitter.name.1", "Ghost")]);
        assert!(submitters(&annotations).is_empty());
    }

    #[test]
    fn unrelated_and_malformed_keys_are_ignored() {
        let annotations = annotations(&[
            ("workflows.argoproj.io/pod-name-format", "v2"),
            ("provenance.submitter.identifier.x", "https://orcid.org/x"),
            ("provenance.submitter.identifier", "https://orcid.org/y"),
            ("provenance.submitter.unknown.1", "z"),
        ]);
        assert!(submitters(&annotations).is_empty());
    }

    #[test]
    fn keywords_split_on_commas_and_trim() {
        let annotations = annotations(&[("provenance.keywords", "GBIF, Occurrence,,SDM ")]);
        assert_eq!(keywords(&annotations), ["GBIF", "Occurrence", "SDM"]);
    }

    #[test]
    fn single_valued_keys_read_back() {
        let annotations = annotations(&[
            ("provenance.license", "https://spdx.org/licenses/CC-BY-SA-2.0"),
            ("provenance.name", "Species distribution models"),
            ("provenance.description", "Model output"),
        ]);
        assert_eq!(
            license(&annotations).as_deref(),
            Some("https://spdx.org/licenses/CC-BY-SA-2.0")
        );
        assert_eq!(
            title(&annotations).as_deref(),
            Some("Species distribution models")
        );
        assert_eq!(description(&annotations).as_deref(), Some("Model output"));
        assert!(keywords(&annotations).is_empty());
    }
}
