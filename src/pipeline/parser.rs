use std::collections::HashMap;
use std::fs;
use std::io::Read;
use std::path::Path;

use quick_xml::escape::resolve_predefined_entity;
use quick_xml::events::{BytesRef, Event};
use quick_xml::Reader;
use serde::Deserialize;
use tracing::{debug, info};

use crate::config::SourcesConfig;
use crate::error::{Result, RosterError};
use crate::types::{PlacementRecord, RefField, ReferenceMap, RegistryRecord};

/// Everything the parser stage hands to the rest of the pipeline. Either all
/// four sources parse cleanly or the run dies here; no partial results leave
/// this stage.
#[derive(Debug, Clone)]
pub struct ParsedSources {
    pub placements: Vec<PlacementRecord>,
    pub groups: ReferenceMap,
    pub units: ReferenceMap,
    pub registry: Vec<RegistryRecord>,
}

/// Parse the three Primus XML exports and the citizen registry CSV
pub fn parse_sources(sources: &SourcesConfig) -> Result<ParsedSources> {
    let placements = parse_placements(&sources.placement)?;
    let groups = parse_reference(&sources.department, "department", "luokkaryhmaid", "ryhmanimi")?;
    let units = parse_reference(&sources.unit, "unit", "paivakodinid", "paivakodinnimi")?;
    let registry = parse_registry(&sources.registry)?;

    info!(
        placements = placements.len(),
        groups = groups.len(),
        units = units.len(),
        registry = registry.len(),
        "all sources parsed"
    );

    Ok(ParsedSources {
        placements,
        groups,
        units,
        registry,
    })
}

const PLACEMENT_SOURCE: &str = "placement";

fn parse_placements(path: &Path) -> Result<Vec<PlacementRecord>> {
    let cards = read_cards(path)?;
    debug!(path = %path.display(), cards = cards.len(), "placement export read");

    let mut records = Vec::with_capacity(cards.len());
    for card in &cards {
        records.push(PlacementRecord {
            identifier: required(card, PLACEMENT_SOURCE, "hetu")?.to_string(),
            given_name: None,
            family_name: None,
            preferred_name: None,
            group: RefField::Unresolved(numeric_field(card, PLACEMENT_SOURCE, "luokkaryhmaid")?),
            unit: RefField::Unresolved(numeric_field(card, PLACEMENT_SOURCE, "paivakodinid")?),
            student_category: required(card, PLACEMENT_SOURCE, "opiskelijalaji")?.to_string(),
        });
    }
    Ok(records)
}

/// Parse one of the two sibling lookup exports (department or unit) into a
/// reference map keyed by its numeric id field.
fn parse_reference(
    path: &Path,
    source_name: &'static str,
    id_field: &'static str,
    name_field: &'static str,
) -> Result<ReferenceMap> {
    let cards = read_cards(path)?;
    debug!(path = %path.display(), cards = cards.len(), source = source_name, "reference export read");

    let mut map = ReferenceMap::new();
    for card in &cards {
        let id = numeric_field(card, source_name, id_field)?;
        let name = required(card, source_name, name_field)?.to_string();
        map.insert(id, name, source_name);
    }
    Ok(map)
}

/// Raw registry row as exported; the combined NIMI column still needs
/// splitting into family and given parts.
#[derive(Debug, Deserialize)]
struct RegistryRow {
    #[serde(rename = "C_HENKTUNN")]
    identifier: String,
    #[serde(rename = "NIMI")]
    name: String,
}

fn parse_registry(path: &Path) -> Result<Vec<RegistryRecord>> {
    let content = read_to_utf8(path)?;
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(content.as_bytes());

    let mut records = Vec::new();
    for row in reader.deserialize::<RegistryRow>() {
        let row = row?;
        let (family_name, given_name) = split_registry_name(&row.name)?;
        records.push(RegistryRecord {
            identifier: row.identifier,
            given_name,
            family_name,
        });
    }
    debug!(path = %path.display(), rows = records.len(), "registry read");
    Ok(records)
}

/// Registry convention: the combined name field carries the family name
/// first, then the given name(s). A row without both parts is malformed.
fn split_registry_name(name: &str) -> Result<(String, String)> {
    let mut tokens = name.split_whitespace();
    let family = tokens
        .next()
        .ok_or_else(|| RosterError::MalformedRegistryName(name.to_string()))?;
    let given = tokens.collect::<Vec<_>>().join(" ");
    if given.is_empty() {
        return Err(RosterError::MalformedRegistryName(name.to_string()));
    }
    Ok((family.to_string(), given))
}

/// Read every `<CARD>` element of a Primus export as a flat field → text map.
/// Field text can arrive split across several events (entity and character
/// references come through as separate `GeneralRef` events), so the value is
/// accumulated and only stored once the field element closes.
fn read_cards(path: &Path) -> Result<Vec<HashMap<String, String>>> {
    let content = read_to_utf8(path)?;
    let mut reader = Reader::from_str(&content);

    let mut cards = Vec::new();
    let mut current: Option<HashMap<String, String>> = None;
    let mut current_field: Option<String> = None;
    let mut current_value = String::new();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(ref e) => {
                let tag = String::from_utf8_lossy(e.name().as_ref()).to_string();
                if tag == "CARD" {
                    current = Some(HashMap::new());
                    current_field = None;
                } else if current.is_some() {
                    current_field = Some(tag);
                    current_value.clear();
                }
            }
            Event::Text(ref e) => {
                if current.is_some() && current_field.is_some() {
                    current_value.push_str(&String::from_utf8_lossy(e.as_ref()));
                }
            }
            Event::GeneralRef(ref e) => {
                if current.is_some() && current_field.is_some() {
                    current_value.push_str(&resolve_reference(e)?);
                }
            }
            Event::End(ref e) => {
                if e.name().as_ref() == b"CARD" {
                    if let Some(card) = current.take() {
                        cards.push(card);
                    }
                } else {
                    if let (Some(card), Some(field)) = (current.as_mut(), current_field.take()) {
                        let value = current_value.trim();
                        if !value.is_empty() {
                            card.insert(field, value.to_string());
                        }
                    }
                    current_value.clear();
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    Ok(cards)
}

/// Decode one `&...;` reference: numeric character references resolve to
/// their character, named ones to the five predefined XML entities. Anything
/// else means the export is malformed.
fn resolve_reference(reference: &BytesRef) -> Result<String> {
    if let Some(ch) = reference
        .resolve_char_ref()
        .map_err(quick_xml::Error::from)?
    {
        return Ok(ch.to_string());
    }
    let name = reference.decode().map_err(quick_xml::Error::from)?;
    resolve_predefined_entity(&name)
        .map(str::to_string)
        .ok_or_else(|| RosterError::UnknownEntity(name.into_owned()))
}

/// Read a source file as UTF-8, falling back to Windows-1252 for exports
/// produced by legacy tooling.
fn read_to_utf8(path: &Path) -> Result<String> {
    let mut file = fs::File::open(path)?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)?;

    match String::from_utf8(bytes) {
        Ok(s) => Ok(s),
        Err(e) => {
            let bytes = e.into_bytes();
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(&bytes);
            Ok(decoded.into_owned())
        }
    }
}

fn required<'a>(
    card: &'a HashMap<String, String>,
    source_name: &'static str,
    field: &'static str,
) -> Result<&'a str> {
    card.get(field)
        .map(String::as_str)
        .ok_or(RosterError::MissingField { source_name, field })
}

fn numeric_field(
    card: &HashMap<String, String>,
    source_name: &'static str,
    field: &'static str,
) -> Result<i64> {
    let value = required(card, source_name, field)?;
    value
        .trim()
        .parse()
        .map_err(|_| RosterError::InvalidField {
            source_name,
            field,
            value: value.to_string(),
        })
}
