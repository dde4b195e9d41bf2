//! One invocation: load → merge → save → render.
//!
//! Nothing is written unless the merge succeeded, so every fatal error leaves
//! the grid artifact exactly as it was.

use std::path::{Path, PathBuf};

use crate::rendering::{self, Snapshot};
use crate::store::{Grid, GridStore};
use crate::update::{self, MergeSummary, UpdateSource};
use crate::{BoardConfig, Result};

/// What a pipeline run produced.
#[derive(Debug)]
pub struct PipelineReport {
    pub summary: MergeSummary,
    pub grid: Grid,
    /// `None` when rendering was switched off.
    pub snapshot: Option<Snapshot>,
}

#[derive(Debug, Clone)]
pub struct Pipeline {
    config: BoardConfig,
    store: GridStore,
    output: PathBuf,
    render: bool,
}

impl Pipeline {
    pub fn new(config: BoardConfig, grid_path: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            store: GridStore::new(grid_path),
            output: output.into(),
            render: true,
        })
    }

    /// Skip the render step (the grid is still saved).
    pub fn without_render(mut self) -> Self {
        self.render = false;
        self
    }

    pub fn config(&self) -> &BoardConfig {
        &self.config
    }

    pub fn store(&self) -> &GridStore {
        &self.store
    }

    pub fn output(&self) -> &Path {
        &self.output
    }

    /// Merge `source` into the stored grid, save it and render it.
    pub fn run<S: UpdateSource + ?Sized>(&self, source: &mut S) -> Result<PipelineReport> {
        let mut grid = self.store.load()?;
        let summary = update::merge(&mut grid, source, self.config.origin)?;

        log::info!(
            "Merged {} of {} pixel updates ({} rejected)",
            summary.applied,
            summary.total(),
            summary.rejected.len()
        );
        if summary.all_rejected() {
            log::warn!("Every pixel update in this batch was rejected");
        }

        self.store.save(&grid)?;
        let snapshot = if self.render { Some(self.render_grid(&grid)?) } else { None };

        Ok(PipelineReport { summary, grid, snapshot })
    }

    /// Render the stored grid without merging anything.
    pub fn render_only(&self) -> Result<Snapshot> {
        let grid = self.store.load()?;
        self.render_grid(&grid)
    }

    fn render_grid(&self, grid: &Grid) -> Result<Snapshot> {
        let snapshot = rendering::render(grid, &self.config)?;
        snapshot.write_to(&self.output)?;
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::update::{DirectRequest, DirectorySource, MemorySource, PixelUpdateRequest};
    use crate::Error;

    fn setup(w: u32, h: u32) -> (tempfile::TempDir, Pipeline) {
        let dir = tempfile::tempdir().unwrap();
        let grid = dir.path().join("grid.json");
        GridStore::new(&grid).init(w, h, false).unwrap();
        let cfg = BoardConfig { labels: false, cell_size: 2, ..Default::default() };
        let p = Pipeline::new(cfg, grid, dir.path().join("grid.png")).unwrap();
        (dir, p)
    }

    #[test]
    fn run_saves_and_renders() {
        let (_dir, p) = setup(3, 3);
        let mut src = MemorySource::new().with("one.json", PixelUpdateRequest::new(2, 2, "#123456"));
        let report = p.run(&mut src).unwrap();
        assert_eq!(report.summary.applied, 1);
        assert!(p.output().is_file());
        assert_eq!(p.store().load().unwrap(), report.grid);
        assert_eq!(report.snapshot.unwrap().width, 6);
    }

    #[test]
    fn rejected_direct_request_writes_nothing() {
        let (_dir, p) = setup(4, 4);
        let before = std::fs::read(p.store().path()).unwrap();
        let mut src = DirectRequest::new(PixelUpdateRequest::new(5, 5, "#0000ff"));
        assert!(matches!(p.run(&mut src), Err(Error::OutOfBounds { .. })));
        assert_eq!(std::fs::read(p.store().path()).unwrap(), before);
        assert!(!p.output().exists());
    }

    #[test]
    fn unreadable_update_directory_aborts_before_save() {
        let (dir, p) = setup(4, 4);
        let updates = dir.path().join("pixel-updates");
        std::fs::write(&updates, "not a directory").unwrap();
        let before = std::fs::read(p.store().path()).unwrap();

        let mut src = DirectorySource::new(&updates);
        assert!(matches!(p.run(&mut src), Err(Error::Io(_))));
        assert_eq!(std::fs::read(p.store().path()).unwrap(), before);
        assert!(!p.output().exists());
    }

    #[test]
    fn missing_grid_aborts_before_merge() {
        let dir = tempfile::tempdir().unwrap();
        let p = Pipeline::new(BoardConfig::default(), dir.path().join("nope.json"), dir.path().join("out.png"))
            .unwrap()
            .without_render();
        let mut src = MemorySource::new();
        assert!(matches!(p.run(&mut src), Err(Error::StoreUnavailable(_))));
        assert!(!dir.path().join("nope.json").exists());
    }
}
