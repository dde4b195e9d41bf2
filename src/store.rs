//! Grid store: the persistent board state and its JSON artifact.
//!
//! ```json
//! { "width": 100, "height": 50, "pixels": { "3,4": "#ff0000" } }
//! ```
//!
//! Loading is strict: anything that does not describe a complete grid is a
//! [`Error::StoreUnavailable`], including pixel keys that no coordinate origin
//! could address. Saving writes the whole document to a temporary
//! file next to the artifact and renames it into place, so a reader never sees
//! a half-written grid.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{Color, Error, Origin, Result};

/// Default board geometry for freshly initialised artifacts.
pub const DEFAULT_WIDTH: u32 = 100;
pub const DEFAULT_HEIGHT: u32 = 50;

/// A cell address. Written `x,y` in the artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Coord {
    pub x: i64,
    pub y: i64,
}

impl Coord {
    pub fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.x, self.y)
    }
}

// Decimal integer with no sign other than '-', no padding and no leading zeros.
fn parse_axis(s: &str) -> Option<i64> {
    let digits = s.strip_prefix('-').unwrap_or(s);
    let canonical = !digits.is_empty()
        && digits.bytes().all(|b| b.is_ascii_digit())
        && (digits == "0" || !digits.starts_with('0'));
    if !canonical {
        return None;
    }
    s.parse().ok()
}

impl FromStr for Coord {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let bad = || Error::StoreUnavailable(format!("invalid pixel key {s:?}, expected \"x,y\""));
        let (x, y) = s.split_once(',').ok_or_else(bad)?;
        Ok(Coord {
            x: parse_axis(x).ok_or_else(bad)?,
            y: parse_axis(y).ok_or_else(bad)?,
        })
    }
}

/// The board: fixed geometry plus a sparse map of painted cells.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid {
    pub width: u32,
    pub height: u32,
    #[serde(with = "pixel_map")]
    pixels: BTreeMap<Coord, Color>,
}

impl Grid {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: BTreeMap::new(),
        }
    }

    pub fn get(&self, coord: Coord) -> Option<&Color> {
        self.pixels.get(&coord)
    }

    /// Write a cell, replacing whatever was there. Returns the previous color.
    ///
    /// No checks happen here; the merger is responsible for only handing over
    /// coordinates inside the grid.
    pub fn set(&mut self, coord: Coord, color: Color) -> Option<Color> {
        self.pixels.insert(coord, color)
    }

    pub fn len(&self) -> usize {
        self.pixels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    /// Painted cells in ascending `(x, y)` order.
    pub fn iter(&self) -> impl Iterator<Item = (&Coord, &Color)> {
        self.pixels.iter()
    }

    /// Whether `coord` addresses a cell of this grid under the given origin.
    pub fn contains(&self, coord: Coord, origin: Origin) -> bool {
        let lo = origin.lower_bound();
        (lo..lo + i64::from(self.width)).contains(&coord.x)
            && (lo..lo + i64::from(self.height)).contains(&coord.y)
    }

    fn within_any_origin(&self, coord: Coord) -> bool {
        Origin::ALL.iter().any(|origin| self.contains(coord, *origin))
    }
}

mod pixel_map {
    use std::collections::BTreeMap;

    use serde::de::{Error as _, MapAccess, Visitor};
    use serde::ser::SerializeMap;
    use serde::{Deserializer, Serializer};

    use super::Coord;
    use crate::Color;

    pub fn serialize<S: Serializer>(
        pixels: &BTreeMap<Coord, Color>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(pixels.len()))?;
        for (coord, color) in pixels {
            map.serialize_entry(&coord.to_string(), color)?;
        }
        map.end()
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<BTreeMap<Coord, Color>, D::Error> {
        struct PixelVisitor;

        impl<'de> Visitor<'de> for PixelVisitor {
            type Value = BTreeMap<Coord, Color>;

            fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                f.write_str("a map of \"x,y\" keys to \"#rrggbb\" colors")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut pixels = BTreeMap::new();
                while let Some((key, color)) = access.next_entry::<String, Color>()? {
                    let coord: Coord = key.parse().map_err(A::Error::custom)?;
                    pixels.insert(coord, color);
                }
                Ok(pixels)
            }
        }

        deserializer.deserialize_map(PixelVisitor)
    }
}

/// Loads and saves one grid artifact.
#[derive(Debug, Clone)]
pub struct GridStore {
    path: PathBuf,
}

impl GridStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Read the artifact. Never falls back to an empty grid.
    pub fn load(&self) -> Result<Grid> {
        let unavailable =
            |what: String| Error::StoreUnavailable(format!("{}: {}", self.path.display(), what));

        let data = fs::read_to_string(&self.path).map_err(|e| unavailable(e.to_string()))?;
        let grid: Grid = serde_json::from_str(&data).map_err(|e| unavailable(e.to_string()))?;
        if grid.width == 0 || grid.height == 0 {
            return Err(unavailable(format!(
                "grid dimensions must be positive, got {}x{}",
                grid.width, grid.height
            )));
        }
        // The origin is a deployment setting, so only keys that are invalid
        // under every origin are refused here.
        if let Some((coord, _)) = grid.iter().find(|(c, _)| !grid.within_any_origin(**c)) {
            return Err(unavailable(format!(
                "pixel key \"{}\" is outside the {}x{} grid",
                coord, grid.width, grid.height
            )));
        }

        log::debug!(
            "Loaded {}x{} grid with {} painted cells from {}",
            grid.width,
            grid.height,
            grid.len(),
            self.path.display()
        );
        Ok(grid)
    }

    /// Replace the artifact with `grid`.
    pub fn save(&self, grid: &Grid) -> Result<()> {
        let mut json = serde_json::to_string_pretty(grid)
            .map_err(|e| Error::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))?;
        json.push('\n');
        write_atomic(&self.path, json.as_bytes())?;
        log::debug!("Saved grid ({} painted cells) to {}", grid.len(), self.path.display());
        Ok(())
    }

    /// Create an empty `width`x`height` artifact.
    ///
    /// An existing artifact is left alone unless `overwrite` is set.
    pub fn init(&self, width: u32, height: u32, overwrite: bool) -> Result<Grid> {
        if width == 0 || height == 0 {
            return Err(Error::ConfigError(format!(
                "grid dimensions must be positive, got {width}x{height}"
            )));
        }
        if self.exists() && !overwrite {
            return Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::AlreadyExists,
                format!("{} already exists", self.path.display()),
            )));
        }
        let grid = Grid::new(width, height);
        self.save(&grid)?;
        log::info!("Initialised {}x{} grid at {}", width, height, self.path.display());
        Ok(grid)
    }
}

/// Write `bytes` to a sibling temp file, then rename it over `path`.
///
/// The replacement keeps the permissions of the file it replaces. New files
/// get the usual umask-filtered `0666`, like a plain create would.
pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut builder = tempfile::Builder::new();
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        builder.permissions(fs::Permissions::from_mode(0o666));
    }
    let mut tmp = builder.tempfile_in(dir)?;
    if let Ok(existing) = fs::metadata(path) {
        tmp.as_file().set_permissions(existing.permissions())?;
    }
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| Error::Io(e.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coord_keys_are_canonical() {
        assert_eq!("3,14".parse::<Coord>().unwrap(), Coord::new(3, 14));
        assert_eq!("0,0".parse::<Coord>().unwrap(), Coord::new(0, 0));
        assert_eq!("-1,2".parse::<Coord>().unwrap(), Coord::new(-1, 2));
        for bad in ["", "1", "1,", ",1", "01,2", "1, 2", " 1,2", "+1,2", "1,2,3", "a,b", "-,1"] {
            assert!(bad.parse::<Coord>().is_err(), "{bad:?} should not parse");
        }
        assert_eq!(Coord::new(12, 7).to_string(), "12,7");
    }

    #[test]
    fn contains_respects_origin() {
        let g = Grid::new(4, 3);
        assert!(g.contains(Coord::new(0, 0), Origin::Zero));
        assert!(g.contains(Coord::new(3, 2), Origin::Zero));
        assert!(!g.contains(Coord::new(4, 0), Origin::Zero));
        assert!(!g.contains(Coord::new(0, 0), Origin::One));
        assert!(g.contains(Coord::new(4, 3), Origin::One));
        assert!(!g.contains(Coord::new(5, 1), Origin::One));
    }

    #[test]
    fn serializes_pixels_as_string_keys() {
        let mut g = Grid::new(2, 2);
        g.set(Coord::new(1, 0), Color::parse("#00FF00").unwrap());
        let v = serde_json::to_value(&g).unwrap();
        assert_eq!(
            v,
            serde_json::json!({"width": 2, "height": 2, "pixels": {"1,0": "#00FF00"}})
        );
    }

    #[cfg(unix)]
    #[test]
    fn save_keeps_artifact_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let store = GridStore::new(dir.path().join("grid.json"));
        store.init(2, 2, false).unwrap();

        for mode in [0o644, 0o664] {
            fs::set_permissions(store.path(), fs::Permissions::from_mode(mode)).unwrap();
            store.save(&store.load().unwrap()).unwrap();
            let after = fs::metadata(store.path()).unwrap().permissions().mode() & 0o777;
            assert_eq!(after, mode, "mode {mode:o} became {after:o}");
        }
    }

    #[cfg(unix)]
    #[test]
    fn new_files_get_plain_create_mode() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("grid.png");
        write_atomic(&path, b"png").unwrap();
        let mode = fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        // owner read/write always; beyond that only the umask decides
        assert_eq!(mode & 0o600, 0o600);
        assert_eq!(mode & 0o111, 0);
    }

    #[test]
    fn set_overwrites() {
        let mut g = Grid::new(2, 2);
        let c = Coord::new(0, 1);
        assert!(g.set(c, Color::from_rgb(1, 2, 3)).is_none());
        let prev = g.set(c, Color::from_rgb(4, 5, 6)).unwrap();
        assert_eq!(prev.rgb(), [1, 2, 3]);
        assert_eq!(g.get(c).unwrap().rgb(), [4, 5, 6]);
        assert_eq!(g.len(), 1);
    }
}
