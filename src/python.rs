use crate::config::Config;
use crate::error::CpError;
use crate::logging;
use crate::planner::StepMode;
use crate::search::{CpSearch, SearchRequest};

use pyo3::exceptions::{PyRuntimeError, PyValueError};
use pyo3::prelude::*;

fn to_py_err(err: CpError) -> PyErr {
    if err.is_user_input() {
        PyValueError::new_err(err.to_string())
    } else {
        PyRuntimeError::new_err(err.to_string())
    }
}

/// Suggests command post parkings around a last known position, as GeoJSON
#[pyfunction]
#[pyo3(signature = (location, hours, speed, max_candidates=50, incremental=false))]
fn find_command_posts(
    location: String,
    hours: f64,
    speed: f64,
    max_candidates: usize,
    incremental: bool,
) -> PyResult<String> {
    logging::init_cli_logger(false);

    let mut config = Config::default();
    config.apply_env();
    let search = CpSearch::from_config(&config).map_err(to_py_err)?;

    let request = SearchRequest {
        step_mode: if incremental {
            StepMode::Incremental
        } else {
            StepMode::Single
        },
        max_candidates: Some(max_candidates),
        ..SearchRequest::new(location, hours, speed)
    };

    // Create a new Tokio runtime
    let rt = tokio::runtime::Runtime::new().map_err(|e| PyRuntimeError::new_err(e.to_string()))?;
    let outcome = rt.block_on(search.run(&request)).map_err(to_py_err)?;

    Ok(outcome.candidates.to_geojson_string())
}

/// Python module for command post selection
#[pymodule]
fn cp_selection(_py: Python, m: &PyModule) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(find_command_posts, m)?)?;
    Ok(())
}
