//! JSON input documents for the three plot kinds

use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::activity::ActivityTable;
use crate::cube::FieldCube;
use crate::error::Result;
use crate::units::{Quantity, QuantityArray, SpikeTrain, Unit};

/// Read and deserialize a JSON file
pub fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

/// `[{"times": [...], "unit": "ms"}, ...]`
pub type RasterDocument = Vec<SpikeTrain>;

/// `{"data": [[[...]]], "dt": {"value": 0.5, "unit": "ms"}}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CubeDocument {
    pub data: Vec<Vec<Vec<f64>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dt: Option<Quantity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<Unit>,
}

impl CubeDocument {
    pub fn into_cube(self) -> Result<FieldCube> {
        let mut cube = FieldCube::from_nested(self.data)?;
        if let Some(dt) = self.dt {
            cube = cube.with_dt(dt);
        }
        if let Some(unit) = self.unit {
            cube = cube.with_unit(unit);
        }
        Ok(cube)
    }
}

/// Spike lists per grid cell plus the sample times and grid positions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityDocument {
    /// `cells[x][y]`
    pub cells: Vec<Vec<SpikeTrain>>,
    pub times: QuantityArray,
    pub positions: QuantityArray,
}

impl ActivityDocument {
    pub fn into_parts(self) -> Result<(ActivityTable, QuantityArray, QuantityArray)> {
        let table = ActivityTable::from_rows(self.cells)?;
        Ok((table, self.times, self.positions))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::VizError;

    #[test]
    fn test_raster_document() {
        let trains: RasterDocument =
            serde_json::from_str(r#"[{"times": [1.0, 2.5], "unit": "ms"}, {"times": [], "unit": "s"}]"#)
                .unwrap();
        assert_eq!(trains.len(), 2);
        assert_eq!(trains[0].unit, Unit::Millisecond);
        assert!(trains[1].is_empty());
    }

    #[test]
    fn test_cube_document() {
        let doc: CubeDocument = serde_json::from_str(
            r#"{"data": [[[0.0, 1.0]], [[-1.0, 2.0]]], "dt": {"value": 0.5, "unit": "ms"}}"#,
        )
        .unwrap();
        let cube = doc.into_cube().unwrap();
        assert_eq!(cube.shape(), (2, 1, 2));
        assert_eq!(cube.dt(), Some(&Quantity::new(0.5, Unit::Millisecond)));
        assert_eq!(cube.unit(), None);
    }

    #[test]
    fn test_activity_document() {
        let doc: ActivityDocument = serde_json::from_str(
            r#"{
                "cells": [[{"times": [2.0], "unit": "ms"}]],
                "times": {"values": [0.0, 1.0, 2.0], "unit": "ms"},
                "positions": {"values": [0.0], "unit": "deg"}
            }"#,
        )
        .unwrap();
        let (table, times, positions) = doc.into_parts().unwrap();
        assert_eq!(table.shape(), (1, 1));
        assert_eq!(times.len(), 3);
        assert_eq!(positions.unit, Unit::Degree);
    }

    #[test]
    fn test_load_json_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(matches!(
            load_json::<CubeDocument>(&path).unwrap_err(),
            VizError::ParseError(_)
        ));
        assert!(matches!(
            load_json::<CubeDocument>(&dir.path().join("missing.json")).unwrap_err(),
            VizError::IoError(_)
        ));
    }
}
