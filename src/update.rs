//! Update merger: validates pixel update requests and applies them to a grid.
//!
//! Requests come from an [`UpdateSource`]. Batch sources (a directory of JSON
//! files, or an in-memory list) are merged leniently: a bad request is logged,
//! counted and skipped. A direct source carries exactly one request and any
//! rejection aborts the merge before the grid is touched.
//!
//! Conflicts are resolved by order alone: the last accepted write to a
//! coordinate wins.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::Value;

use crate::store::{Coord, Grid};
use crate::{Color, Error, Origin, Result};

/// An update as received, before any checks.
///
/// Fields stay untyped so that "wrong type" can be told apart from "missing".
/// Unknown fields are ignored.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PixelUpdateRequest {
    #[serde(default)]
    pub x: Value,
    #[serde(default)]
    pub y: Value,
    #[serde(default)]
    pub color: Value,
}

impl PixelUpdateRequest {
    pub fn new(x: i64, y: i64, color: &str) -> Self {
        Self {
            x: x.into(),
            y: y.into(),
            color: color.into(),
        }
    }

    /// Build a request from a JSON document. Non-objects are malformed.
    pub fn from_value(value: Value) -> Result<Self> {
        if !value.is_object() {
            return Err(Error::MalformedRequest(format!(
                "expected an object with x, y and color, got {value}"
            )));
        }
        serde_json::from_value(value).map_err(|e| Error::MalformedRequest(e.to_string()))
    }

    /// Build a request from three positional command line values.
    pub fn from_args(x: &str, y: &str, color: &str) -> Result<Self> {
        let axis = |name: &str, s: &str| -> Result<Value> {
            let s = s.trim();
            s.parse::<i64>()
                .map(Value::from)
                .or_else(|_| s.parse::<u64>().map(Value::from))
                .map_err(|_| {
                    Error::MalformedRequest(format!("{name} must be an integer, got {s:?}"))
                })
        };
        Ok(Self {
            x: axis("x", x)?,
            y: axis("y", y)?,
            color: color.into(),
        })
    }

    /// Run the type, bounds and color checks, in that order.
    ///
    /// Any JSON integer passes the type check, including ones too large for
    /// an `i64`; those are simply out of bounds.
    pub fn validate(&self, grid: &Grid, origin: Origin) -> Result<PixelUpdate> {
        let axis = |v: &Value| v.as_i64().map(i128::from).or_else(|| v.as_u64().map(i128::from));
        let (x, y, color) = match (axis(&self.x), axis(&self.y), self.color.as_str()) {
            (Some(x), Some(y), Some(color)) => (x, y, color),
            _ => {
                return Err(Error::MalformedRequest(format!(
                    "x and y must be integers and color a string, got x={}, y={}, color={}",
                    self.x, self.y, self.color
                )))
            }
        };

        let coord = match (i64::try_from(x), i64::try_from(y)) {
            (Ok(cx), Ok(cy)) => Some(Coord::new(cx, cy)),
            _ => None,
        };
        let coord = match coord.filter(|c| grid.contains(*c, origin)) {
            Some(coord) => coord,
            None => {
                return Err(Error::OutOfBounds {
                    x,
                    y,
                    width: grid.width,
                    height: grid.height,
                })
            }
        };

        let color = Color::parse(color)?;
        Ok(PixelUpdate { coord, color })
    }
}

/// A request that passed validation against a particular grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelUpdate {
    pub coord: Coord,
    pub color: Color,
}

impl PixelUpdate {
    pub fn apply(self, grid: &mut Grid) {
        grid.set(self.coord, self.color);
    }
}

/// How rejections are treated by [`merge`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeMode {
    /// Skip rejected requests and keep going.
    Batch,
    /// Abort on the first rejection.
    Direct,
}

/// One item pulled from an update source.
#[derive(Debug)]
pub struct SourcedRequest {
    /// Where the request came from (a file name); `None` for direct requests.
    pub label: Option<String>,
    /// The request, or the reason it could not even be read.
    pub request: Result<PixelUpdateRequest>,
}

/// Anything that can hand the merger a finite run of update requests.
pub trait UpdateSource {
    fn mode(&self) -> MergeMode;

    /// Enumerate the pending requests. Called once per merge.
    ///
    /// An error here means the source itself could not be read, which aborts
    /// the merge in either mode.
    fn requests(&mut self) -> Result<Box<dyn Iterator<Item = SourcedRequest> + '_>>;
}

/// Batch source backed by a directory of `*.json` update files.
///
/// The listing is taken once and sorted by file name, so two updates to the
/// same cell always resolve the same way. Files are read lazily as the merger
/// pulls them.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    dir: PathBuf,
}

impl DirectorySource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Sorted `*.json` files of the directory. A missing directory is an
    /// empty batch; any other failure to list it is an error.
    fn list(&self) -> Result<Vec<PathBuf>> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                log::warn!("No updates read from {}: {}", self.dir.display(), e);
                return Ok(Vec::new());
            }
            Err(e) => {
                return Err(Error::Io(io::Error::new(
                    e.kind(),
                    format!("cannot list updates in {}: {}", self.dir.display(), e),
                )))
            }
        };
        let mut files = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.is_file() && path.extension().is_some_and(|ext| ext == "json") {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }

    fn read(path: &Path) -> Result<PixelUpdateRequest> {
        let data = fs::read_to_string(path)
            .map_err(|e| Error::MalformedRequest(format!("unreadable: {e}")))?;
        let value: Value = serde_json::from_str(&data)
            .map_err(|e| Error::MalformedRequest(format!("not valid JSON: {e}")))?;
        PixelUpdateRequest::from_value(value)
    }
}

impl UpdateSource for DirectorySource {
    fn mode(&self) -> MergeMode {
        MergeMode::Batch
    }

    fn requests(&mut self) -> Result<Box<dyn Iterator<Item = SourcedRequest> + '_>> {
        Ok(Box::new(self.list()?.into_iter().map(|path| {
            let label = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string());
            SourcedRequest {
                label: Some(label),
                request: Self::read(&path),
            }
        })))
    }
}

/// Batch source over labelled requests held in memory, merged in insertion order.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    items: Vec<(String, PixelUpdateRequest)>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, label: impl Into<String>, request: PixelUpdateRequest) {
        self.items.push((label.into(), request));
    }

    pub fn with(mut self, label: impl Into<String>, request: PixelUpdateRequest) -> Self {
        self.push(label, request);
        self
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl UpdateSource for MemorySource {
    fn mode(&self) -> MergeMode {
        MergeMode::Batch
    }

    fn requests(&mut self) -> Result<Box<dyn Iterator<Item = SourcedRequest> + '_>> {
        Ok(Box::new(self.items.iter().map(|(label, request)| SourcedRequest {
            label: Some(label.clone()),
            request: Ok(request.clone()),
        })))
    }
}

/// A single unlabelled request; any rejection fails the merge.
#[derive(Debug, Clone)]
pub struct DirectRequest {
    request: PixelUpdateRequest,
}

impl DirectRequest {
    pub fn new(request: PixelUpdateRequest) -> Self {
        Self { request }
    }
}

impl UpdateSource for DirectRequest {
    fn mode(&self) -> MergeMode {
        MergeMode::Direct
    }

    fn requests(&mut self) -> Result<Box<dyn Iterator<Item = SourcedRequest> + '_>> {
        Ok(Box::new(std::iter::once(SourcedRequest {
            label: None,
            request: Ok(self.request.clone()),
        })))
    }
}

/// A request the merger turned down.
#[derive(Debug)]
pub struct Rejected {
    pub label: Option<String>,
    pub error: Error,
}

/// Outcome of a merge.
#[derive(Debug, Default)]
pub struct MergeSummary {
    pub applied: usize,
    pub rejected: Vec<Rejected>,
}

impl MergeSummary {
    pub fn total(&self) -> usize {
        self.applied + self.rejected.len()
    }

    /// True when there was at least one request and none was applied.
    pub fn all_rejected(&self) -> bool {
        self.applied == 0 && !self.rejected.is_empty()
    }
}

/// Validate and apply every request of `source` to `grid`.
///
/// Batch sources only fail here when the source itself cannot be read;
/// rejections end up in the summary. A direct source returns the rejection as
/// the error and leaves `grid` untouched.
pub fn merge<S: UpdateSource + ?Sized>(
    grid: &mut Grid,
    source: &mut S,
    origin: Origin,
) -> Result<MergeSummary> {
    let mode = source.mode();
    let mut summary = MergeSummary::default();

    for SourcedRequest { label, request } in source.requests()? {
        let name = label.as_deref().unwrap_or("direct request");
        match request.and_then(|r| r.validate(grid, origin)) {
            Ok(update) => {
                log::info!(
                    "Applied pixel update from {}: ({}) -> {}",
                    name,
                    update.coord,
                    update.color
                );
                update.apply(grid);
                summary.applied += 1;
            }
            Err(error) if mode == MergeMode::Direct => return Err(error),
            Err(error) => {
                log::warn!("Skipping update {}: {}", name, error);
                summary.rejected.push(Rejected { label, error });
            }
        }
    }

    Ok(summary)
}
