//! Scene files - initial paint operations loaded from RON

use anyhow::{Context, Result};
use glam::IVec2;
use sandmod_core::world::Grid;
use sandmod_simulation::Elements;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One paint operation, applied in file order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PaintOp {
    /// Single cell
    Cell { x: i32, y: i32, element: String },
    /// Filled rectangle with its top-left corner at (x, y)
    Rect {
        x: i32,
        y: i32,
        width: i32,
        height: i32,
        element: String,
    },
    /// Whole row
    Row { y: i32, element: String },
}

impl PaintOp {
    fn element(&self) -> &str {
        match self {
            PaintOp::Cell { element, .. }
            | PaintOp::Rect { element, .. }
            | PaintOp::Row { element, .. } => element,
        }
    }
}

/// Initial grid contents
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    /// Grid size override as (width, height)
    #[serde(default)]
    pub size: Option<(usize, usize)>,

    #[serde(default)]
    pub paint: Vec<PaintOp>,
}

impl Scene {
    /// Load scene from RON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read scene file: {}", path.display()))?;

        ron::from_str(&content)
            .with_context(|| format!("Failed to parse RON scene: {}", path.display()))
    }

    /// Paint every operation onto `grid`, stopping at the first failure
    pub fn apply(&self, grid: &mut Grid, elements: &Elements) -> Result<()> {
        for (index, op) in self.paint.iter().enumerate() {
            let element = elements
                .id_of(op.element())
                .with_context(|| format!("Paint op {index}: unknown element `{}`", op.element()))?;

            let result = match op {
                PaintOp::Cell { x, y, .. } => grid.set(IVec2::new(*x, *y), element),
                PaintOp::Rect {
                    x,
                    y,
                    width,
                    height,
                    ..
                } => grid.fill_rect(IVec2::new(*x, *y), IVec2::new(*width, *height), element),
                PaintOp::Row { y, .. } => grid.fill_row(*y, element),
            };
            result.with_context(|| format!("Paint op {index} failed"))?;
        }
        log::debug!("Applied {} paint operations", self.paint.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sandmod_simulation::{Declarations, compile};

    const SCENE: &str = r#"(
        size: Some((8, 6)),
        paint: [
            Row(y: 5, element: "Wall"),
            Rect(x: 2, y: 1, width: 3, height: 2, element: "Sand"),
            Cell(x: 0, y: 0, element: "Spring"),
        ],
    )"#;

    #[test]
    fn test_scene_paints_grid() {
        let rules = compile(&Declarations::default_mod()).unwrap();
        let elements = rules.elements();
        let scene: Scene = ron::from_str(SCENE).unwrap();
        assert_eq!(scene.size, Some((8, 6)));

        let mut grid = Grid::new(8, 6).unwrap();
        scene.apply(&mut grid, elements).unwrap();

        let wall = elements.id_of("Wall").unwrap();
        let sand = elements.id_of("Sand").unwrap();
        assert!(grid.row(5).all(|e| e == wall));
        assert_eq!(grid.count(sand), 6);
        assert_eq!(grid.get(IVec2::new(0, 0)), elements.id_of("Spring"));
    }

    #[test]
    fn test_scene_errors() {
        let rules = compile(&Declarations::default_mod()).unwrap();
        let mut grid = Grid::new(4, 4).unwrap();

        let unknown = Scene {
            size: None,
            paint: vec![PaintOp::Cell {
                x: 0,
                y: 0,
                element: "Lava".to_string(),
            }],
        };
        assert!(unknown.apply(&mut grid, rules.elements()).is_err());

        let outside = Scene {
            size: None,
            paint: vec![PaintOp::Row {
                y: 9,
                element: "Sand".to_string(),
            }],
        };
        assert!(outside.apply(&mut grid, rules.elements()).is_err());
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scene.ron");
        std::fs::write(&path, SCENE).unwrap();
        assert_eq!(Scene::from_file(&path).unwrap().paint.len(), 3);
        assert!(Scene::from_file(dir.path().join("missing.ron")).is_err());
    }
}
