pub mod encoding;

use std::collections::HashSet;
use std::path::Path;

use tracing::{debug, info, warn};

use crate::domain::{ControlPoint, Parcel, ParcelSource, PlanePoint, PointRef};
use crate::error::{Error, Result};

const TAG_POINT: &str = "A01";
const TAG_LEGACY_PARCEL: &str = "A02";
const TAG_LINKED_PARCEL: &str = "D00";
const TAG_PARCEL_VERTEX: &str = "B01";
const TAG_PARCEL_ANNOTATION: &str = "C03";
const TAG_PARCEL_END: &str = "D99";

/// Kind of a non-fatal problem met while parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    MalformedPoint,
    DuplicatePoint,
    MalformedParcel,
    MalformedCoordinate,
    UnresolvedReference,
    ShortParcel,
}

/// A skipped or partially-used record. `line` is 1-based.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseDiagnostic {
    pub line: usize,
    pub kind: DiagnosticKind,
    pub message: String,
}

/// A parsed survey network: points and parcels in file order.
#[derive(Debug, Clone, Default)]
pub struct SurveyNetwork {
    pub points: Vec<ControlPoint>,
    pub parcels: Vec<Parcel>,
    /// Name of the encoding that decoded the file.
    pub encoding: &'static str,
    pub diagnostics: Vec<ParseDiagnostic>,
}

impl SurveyNetwork {
    pub fn point_by_id(&self, id: &str) -> Option<&ControlPoint> {
        self.points.iter().find(|p| p.id == id)
    }

    /// Resolve a reference by id first, then by non-empty name.
    pub fn find_point(&self, reference: &str) -> Option<&ControlPoint> {
        let reference = reference.trim();
        self.point_by_id(reference).or_else(|| {
            self.points
                .iter()
                .find(|p| !p.name.is_empty() && p.name == reference)
        })
    }
}

/// Read and parse a network file from disk.
pub fn load_network(path: &Path) -> Result<SurveyNetwork> {
    let bytes = std::fs::read(path)?;
    parse_network(&bytes)
}

/// Decode raw bytes by probing candidate encodings in order and parse the
/// first decoding that yields at least one point.
pub fn parse_network(bytes: &[u8]) -> Result<SurveyNetwork> {
    let mut tried = Vec::new();

    for &candidate in encoding::CANDIDATES {
        tried.push(candidate.name());

        let text = match encoding::decode_strict(bytes, candidate) {
            Some(text) => text,
            None => {
                debug!(encoding = candidate.name(), "network does not decode cleanly");
                continue;
            }
        };

        let parsed = parse_text(&text);
        if parsed.points.is_empty() {
            debug!(encoding = candidate.name(), "decoded network has no point records");
            continue;
        }

        for d in &parsed.diagnostics {
            warn!(line = d.line, kind = ?d.kind, "{}", d.message);
        }
        info!(
            encoding = candidate.name(),
            points = parsed.points.len(),
            parcels = parsed.parcels.len(),
            skipped = parsed.diagnostics.len(),
            "survey network parsed"
        );

        return Ok(SurveyNetwork {
            encoding: candidate.name(),
            ..parsed
        });
    }

    Err(Error::NetworkDecode { tried })
}

/// Parse already-decoded text. Never fails: every bad record becomes a
/// diagnostic and parsing continues.
pub fn parse_text(text: &str) -> SurveyNetwork {
    let lines: Vec<&str> = text.lines().map(str::trim).collect();
    let mut parser = Parser {
        lines: &lines,
        points: Vec::new(),
        parcels: Vec::new(),
        diagnostics: Vec::new(),
        seen_ids: HashSet::new(),
        seen_names: HashSet::new(),
    };
    parser.run();

    SurveyNetwork {
        points: parser.points,
        parcels: parser.parcels,
        encoding: "",
        diagnostics: parser.diagnostics,
    }
}

fn split_fields(line: &str) -> Vec<&str> {
    line.split(',').map(str::trim).collect()
}

fn tag_of(line: &str) -> &str {
    line.split(',').next().unwrap_or("").trim()
}

/// Tags that end a linked parcel block without being consumed by it.
fn starts_new_section(tag: &str) -> bool {
    tag == TAG_LINKED_PARCEL || tag.starts_with('A') || tag == "Z00"
}

fn parse_number(field: Option<&&str>) -> Option<f64> {
    let s = field?;
    if s.is_empty() {
        return None;
    }
    s.parse::<f64>().ok().filter(|v| v.is_finite())
}

struct Parser<'a> {
    lines: &'a [&'a str],
    points: Vec<ControlPoint>,
    parcels: Vec<Parcel>,
    diagnostics: Vec<ParseDiagnostic>,
    seen_ids: HashSet<String>,
    seen_names: HashSet<String>,
}

impl Parser<'_> {
    fn run(&mut self) {
        let mut i = 0;
        while i < self.lines.len() {
            i = match tag_of(self.lines[i]) {
                TAG_POINT => {
                    self.parse_point(i);
                    i + 1
                }
                TAG_LEGACY_PARCEL => i + 1 + self.parse_legacy_parcel(i),
                TAG_LINKED_PARCEL => self.parse_linked_parcel(i),
                _ => i + 1,
            };
        }
    }

    fn diag(&mut self, index: usize, kind: DiagnosticKind, message: String) {
        self.diagnostics.push(ParseDiagnostic {
            line: index + 1,
            kind,
            message,
        });
    }

    /// `A01, id, name, x, y[, z]`
    fn parse_point(&mut self, index: usize) {
        let line = self.lines[index];
        let fields = split_fields(line);
        if fields.len() < 5 {
            self.diag(index, DiagnosticKind::MalformedPoint, format!("point record needs 5 fields: {line}"));
            return;
        }

        let id = fields[1].to_string();
        let name = fields[2].to_string();
        if id.is_empty() {
            self.diag(index, DiagnosticKind::MalformedPoint, format!("point record without id: {line}"));
            return;
        }

        let (x, y) = match (parse_number(fields.get(3)), parse_number(fields.get(4))) {
            (Some(x), Some(y)) => (x, y),
            _ => {
                self.diag(index, DiagnosticKind::MalformedPoint, format!("missing or invalid coordinates: {line}"));
                return;
            }
        };

        let z = match fields.get(5) {
            None => 0.0,
            Some(s) if s.is_empty() => 0.0,
            Some(_) => match parse_number(fields.get(5)) {
                Some(z) => z,
                None => {
                    self.diag(index, DiagnosticKind::MalformedPoint, format!("invalid elevation: {line}"));
                    return;
                }
            },
        };

        if self.seen_ids.contains(&id) {
            self.diag(index, DiagnosticKind::DuplicatePoint, format!("duplicate point id {id}"));
            return;
        }
        if !name.is_empty() && self.seen_names.contains(&name) {
            self.diag(index, DiagnosticKind::DuplicatePoint, format!("duplicate point name {name}"));
            return;
        }

        self.seen_ids.insert(id.clone());
        if !name.is_empty() {
            self.seen_names.insert(name.clone());
        }
        self.points.push(ControlPoint { id, name, x, y, z });
    }

    /// `A02, id, name, count` followed by exactly `count` lines of `y, x`.
    /// Returns the number of following lines consumed.
    fn parse_legacy_parcel(&mut self, index: usize) -> usize {
        let line = self.lines[index];
        let fields = split_fields(line);
        if fields.len() < 4 {
            self.diag(index, DiagnosticKind::MalformedParcel, format!("legacy parcel needs 4 fields: {line}"));
            return 0;
        }
        let count: usize = match fields[3].parse() {
            Ok(n) => n,
            Err(_) => {
                self.diag(index, DiagnosticKind::MalformedParcel, format!("invalid vertex count: {line}"));
                return 0;
            }
        };

        let available = self.lines.len() - index - 1;
        let consumed = count.min(available);
        let mut vertices = Vec::with_capacity(consumed);

        for offset in 1..=consumed {
            let coord_line = self.lines[index + offset];
            let parts = split_fields(coord_line);
            // Legacy vertex lines store the pair as (y, x).
            match (parse_number(parts.first()), parse_number(parts.get(1))) {
                (Some(y), Some(x)) => vertices.push(PlanePoint::new(x, y)),
                _ => self.diag(
                    index + offset,
                    DiagnosticKind::MalformedCoordinate,
                    format!("invalid parcel vertex: {coord_line}"),
                ),
            }
        }

        if consumed < count {
            self.diag(
                index,
                DiagnosticKind::MalformedParcel,
                format!("parcel {} declares {count} vertices, file ends after {consumed}", fields[2]),
            );
        }

        if vertices.is_empty() {
            self.diag(index, DiagnosticKind::ShortParcel, format!("parcel {} has no vertices", fields[2]));
        } else {
            self.parcels.push(Parcel {
                id: fields[1].to_string(),
                name: fields[2].to_string(),
                source: ParcelSource::Legacy,
                refs: Vec::new(),
                vertices,
            });
        }

        consumed
    }

    /// `D00, type, name[, id, ...]` followed by `B01`/`C03` lines up to `D99`
    /// or the next section. Returns the index of the next unconsumed line.
    fn parse_linked_parcel(&mut self, index: usize) -> usize {
        let line = self.lines[index];
        let fields = split_fields(line);
        if fields.len() < 3 {
            self.diag(index, DiagnosticKind::MalformedParcel, format!("linked parcel needs 3 fields: {line}"));
            return index + 1;
        }
        let type_code = fields[1].to_string();
        let name = fields[2].to_string();
        let id = fields.get(3).map(|s| s.to_string()).unwrap_or_default();

        let mut refs = Vec::new();
        let mut vertices = Vec::new();
        let mut i = index + 1;

        while i < self.lines.len() {
            let current = self.lines[i];
            if current.is_empty() {
                i += 1;
                continue;
            }
            let tag = tag_of(current);
            if tag == TAG_PARCEL_END {
                i += 1;
                break;
            }
            if starts_new_section(tag) {
                break;
            }
            if tag == TAG_PARCEL_VERTEX {
                let parts = split_fields(current);
                if parts.len() < 2 || parts[1].is_empty() {
                    self.diag(i, DiagnosticKind::MalformedParcel, format!("vertex reference without id: {current}"));
                } else {
                    let point_id = parts[1];
                    let point_name = parts.get(2).copied().unwrap_or("");
                    let resolved = self
                        .points
                        .iter()
                        .find(|p| p.id == point_id)
                        .or_else(|| {
                            self.points
                                .iter()
                                .find(|p| !point_name.is_empty() && p.name == point_name)
                        })
                        .map(|p| (PointRef { id: p.id.clone(), name: p.name.clone() }, p.position()));

                    match resolved {
                        Some((r, pos)) => {
                            refs.push(r);
                            vertices.push(pos);
                        }
                        None => self.diag(
                            i,
                            DiagnosticKind::UnresolvedReference,
                            format!("parcel {name}: no point {point_id} / {point_name}"),
                        ),
                    }
                }
            } else if tag != TAG_PARCEL_ANNOTATION {
                debug!(line = i + 1, tag, "ignoring record inside linked parcel");
            }
            i += 1;
        }

        if refs.len() >= 3 {
            debug!(parcel = %name, vertices = refs.len(), "linked parcel resolved");
            self.parcels.push(Parcel {
                id,
                name,
                source: ParcelSource::Linked { type_code },
                refs,
                vertices,
            });
        } else {
            self.diag(
                index,
                DiagnosticKind::ShortParcel,
                format!("parcel {name} resolves only {} vertices", refs.len()),
            );
        }

        i
    }
}
