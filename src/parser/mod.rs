use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::model::{Dataset, Point, PointElement, Ring, Team, VectorMap};

/// Parse one map document into a `VectorMap`.
///
/// The document is expected to contain numeric `width` and `height` and an
/// `elements` object whose keys are
///   • "outerWall"                       – `[[x, y], …]`
///   • "islands"                         – `[[[x, y], …], …]`
///   • "gates"                           – `[{points, team?}, …]`
///   • "boosts", "flags"                 – `[{x, y, team?}, …]`
///   • "bombs", "spikes", "portals", "powerups" – `[{x, y}, …]`
///
/// Missing element keys mean "none of that kind"; unknown keys are errors.
pub fn load_from_json(json: &str, fallback_name: &str) -> Result<VectorMap> {
    let root: Value = serde_json::from_str(json)?;

    let name = root
        .get("name")
        .and_then(|v| v.as_str())
        .unwrap_or(fallback_name)
        .to_string();

    let width = root
        .get("width")
        .and_then(|v| v.as_f64())
        .ok_or_else(|| anyhow!("map `{name}` missing numeric `width`"))?;
    let height = root
        .get("height")
        .and_then(|v| v.as_f64())
        .ok_or_else(|| anyhow!("map `{name}` missing numeric `height`"))?;
    if width <= 0.0 || height <= 0.0 {
        return Err(anyhow!("map `{name}` has non-positive extent {width}×{height}"));
    }

    let elements = root
        .get("elements")
        .and_then(|v| v.as_object())
        .ok_or_else(|| anyhow!("map `{name}` has no `elements` object"))?;

    let mut map = VectorMap::empty(name, width, height);

    for (key, value) in elements {
        match key.as_str() {
            "outerWall" => map.outer_wall = Ring {
                points: parse_points(value).with_context(|| "outerWall")?,
                team: Team::None,
            },
            "islands" => {
                let rings: Vec<Vec<[f64; 2]>> =
                    serde_json::from_value(value.clone()).with_context(|| "islands")?;
                map.islands = rings
                    .into_iter()
                    .map(|r| Ring {
                        points: to_points(r),
                        team: Team::None,
                    })
                    .collect();
            }
            "gates" => {
                let gates: Vec<RawRing> =
                    serde_json::from_value(value.clone()).with_context(|| "gates")?;
                map.gates = gates
                    .into_iter()
                    .map(|g| Ring {
                        points: to_points(g.points),
                        team: g.team,
                    })
                    .collect();
            }
            "boosts" => map.boosts = parse_point_elements(value, key)?,
            "bombs" => map.bombs = parse_point_elements(value, key)?,
            "spikes" => map.spikes = parse_point_elements(value, key)?,
            "portals" => map.portals = parse_point_elements(value, key)?,
            "powerups" => map.powerups = parse_point_elements(value, key)?,
            "flags" => map.flags = parse_point_elements(value, key)?,
            other => return Err(anyhow!("unknown element kind `{other}`")),
        }
    }

    debug!(
        map = %map.name,
        wall_points = map.outer_wall.points.len(),
        islands = map.islands.len(),
        flags = map.flags.len(),
        "map parsed"
    );
    Ok(map)
}

pub fn load_map_file(path: &Path) -> Result<VectorMap> {
    let json =
        std::fs::read_to_string(path).with_context(|| format!("Reading {}", path.display()))?;
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("unnamed");
    load_from_json(&json, stem).with_context(|| format!("Parsing {}", path.display()))
}

/// All `.json` map files of one source directory, sorted by file name.
pub fn list_map_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir).with_context(|| format!("Listing {}", dir.display()))? {
        let path = entry?.path();
        if path.extension().is_some_and(|e| e == "json") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

pub fn load_dataset(json: &str) -> Result<Dataset> {
    let dataset: Dataset = serde_json::from_str(json).with_context(|| "Parsing dataset JSON")?;
    Ok(dataset)
}

// ─────────────────────────────────────────────────────
/// Raw element shapes as they appear in the document.
#[derive(Debug, Deserialize)]
struct RawPoint {
    x: f64,
    y: f64,
    #[serde(default)]
    team: Team,
}

#[derive(Debug, Deserialize)]
struct RawRing {
    points: Vec<[f64; 2]>,
    #[serde(default)]
    team: Team,
}

fn to_points(raw: Vec<[f64; 2]>) -> Vec<Point> {
    raw.into_iter().map(|[x, y]| Point::new(x, y)).collect()
}

fn parse_points(value: &Value) -> Result<Vec<Point>> {
    let raw: Vec<[f64; 2]> = serde_json::from_value(value.clone())?;
    Ok(to_points(raw))
}

fn parse_point_elements(value: &Value, kind: &str) -> Result<Vec<PointElement>> {
    let raw: Vec<RawPoint> =
        serde_json::from_value(value.clone()).with_context(|| format!("`{kind}` elements"))?;
    Ok(raw
        .into_iter()
        .map(|p| PointElement {
            position: Point::new(p.x, p.y),
            team: p.team,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_map() {
        let json = r#"{
            "width": 40, "height": 30,
            "elements": {
                "outerWall": [[0,0],[40,0],[40,30],[0,30]],
                "flags": [{"x": 5, "y": 15, "team": "red"}, {"x": 35, "y": 15, "team": "BLUE"}],
                "boosts": [{"x": 20, "y": 15}]
            }
        }"#;
        let map = load_from_json(json, "fallback").unwrap();

        assert_eq!(map.name, "fallback");
        assert_eq!(map.extents.width, 40.0);
        assert_eq!(map.outer_wall.points.len(), 4);
        assert_eq!(map.flags[0].team, Team::Red);
        assert_eq!(map.flags[1].team, Team::Blue);
        assert_eq!(map.boosts[0].team, Team::None);
        assert!(map.islands.is_empty());
    }

    #[test]
    fn test_parse_rings() {
        let json = r#"{
            "name": "rings", "width": 10, "height": 10,
            "elements": {
                "islands": [[[1,1],[2,1],[2,2]]],
                "gates": [{"points": [[4,4],[5,4]], "team": "blue"}]
            }
        }"#;
        let map = load_from_json(json, "x").unwrap();
        assert_eq!(map.name, "rings");
        assert_eq!(map.islands[0].points[2], Point::new(2.0, 2.0));
        assert_eq!(map.gates[0].team, Team::Blue);
    }

    #[test]
    fn test_missing_width() {
        let err = load_from_json(r#"{"height": 3, "elements": {}}"#, "m").unwrap_err();
        assert!(err.to_string().contains("width"), "got {err}");
    }

    #[test]
    fn test_unknown_element_kind() {
        let json = r#"{"width": 3, "height": 3, "elements": {"lava": []}}"#;
        let err = load_from_json(json, "m").unwrap_err();
        assert!(err.to_string().contains("lava"), "got {err}");
    }

    #[test]
    fn test_bad_team() {
        let json = r#"{"width": 3, "height": 3, "elements": {"flags": [{"x":1,"y":1,"team":"green"}]}}"#;
        assert!(load_from_json(json, "m").is_err());
    }
}
