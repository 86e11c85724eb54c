// Python bindings (feature "python"). All functions exchange JSON strings;
// every error surfaces as ValueError with the JSON path when parsing failed.

use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use pyo3::wrap_pyfunction;

use crate::analyze;
use crate::error::AnalyzeError;
use crate::metrics;

fn to_py_err(e: AnalyzeError) -> PyErr {
    PyValueError::new_err(e.to_string())
}

#[pyfunction]
#[pyo3(signature = (timeseries_json, profile_json = None))]
fn analyze_activity_json(timeseries_json: &str, profile_json: Option<&str>) -> PyResult<String> {
    analyze::analyze_activity_json(timeseries_json, profile_json).map_err(to_py_err)
}

#[pyfunction]
#[pyo3(signature = (timeseries_json, config_json = None))]
fn average_heart_rate_json(timeseries_json: &str, config_json: Option<&str>) -> PyResult<f64> {
    analyze::average_heart_rate_json(timeseries_json, config_json).map_err(to_py_err)
}

#[pyfunction]
#[pyo3(signature = (timeseries_json, config_json = None))]
fn max_heart_rate_json(timeseries_json: &str, config_json: Option<&str>) -> PyResult<u8> {
    analyze::max_heart_rate_json(timeseries_json, config_json).map_err(to_py_err)
}

#[pyfunction]
fn analyze_thresholds_json(timeseries_json: &str, config_json: &str) -> PyResult<String> {
    analyze::analyze_thresholds_json(timeseries_json, config_json).map_err(to_py_err)
}

/// Prometheus text exposition of the process-wide counters.
#[pyfunction]
fn metrics_text() -> PyResult<String> {
    metrics::global()
        .and_then(|m| m.render())
        .map_err(|e| PyValueError::new_err(format!("metrics error: {e}")))
}

#[pymodule]
fn stride_core(_py: Python, m: &PyModule) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(analyze_activity_json, m)?)?;
    m.add_function(wrap_pyfunction!(average_heart_rate_json, m)?)?;
    m.add_function(wrap_pyfunction!(max_heart_rate_json, m)?)?;
    m.add_function(wrap_pyfunction!(analyze_thresholds_json, m)?)?;
    m.add_function(wrap_pyfunction!(metrics_text, m)?)?;
    Ok(())
}
