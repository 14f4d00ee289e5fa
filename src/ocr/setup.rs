use anyhow::{Result, anyhow};
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::log;
use crate::paths::get_tesseract_dir;

#[cfg(windows)]
const EXECUTABLE_NAME: &str = "tesseract.exe";
#[cfg(not(windows))]
const EXECUTABLE_NAME: &str = "tesseract";

/// Install locations checked when tesseract is not on PATH.
const COMMON_PATHS: [&str; 5] = [
    r"C:\Program Files\Tesseract-OCR\tesseract.exe",
    r"C:\Program Files (x86)\Tesseract-OCR\tesseract.exe",
    "/usr/bin/tesseract",
    "/usr/local/bin/tesseract",
    "/opt/homebrew/bin/tesseract",
];

#[derive(Debug, Clone)]
pub struct TesseractPaths {
    pub executable: PathBuf,
    /// `None` lets tesseract use its compiled-in tessdata location
    pub tessdata: Option<PathBuf>,
}

/// Resolves the tesseract executable and tessdata directory.
///
/// Explicit config values win; otherwise the bundled directory, PATH and
/// common install locations are tried in that order.
pub fn resolve_tesseract(
    executable_override: Option<&Path>,
    tessdata_override: Option<&Path>,
) -> Result<TesseractPaths> {
    let executable = match executable_override {
        Some(path) if path.exists() => path.to_path_buf(),
        Some(path) => {
            return Err(anyhow!(
                "Configured tesseract_path does not exist: {}",
                path.display()
            ));
        }
        None => find_tesseract_executable()?,
    };

    let tessdata = match tessdata_override {
        Some(dir) => Some(dir.to_path_buf()),
        None => find_tessdata_dir(),
    };

    log(&format!(
        "Using tesseract at {} (tessdata: {})",
        executable.display(),
        tessdata
            .as_deref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "default".to_string())
    ));

    Ok(TesseractPaths {
        executable,
        tessdata,
    })
}

/// Finds the Tesseract executable, checking our local dir first, then system
pub fn find_tesseract_executable() -> Result<PathBuf> {
    let local_exe = get_tesseract_dir().join(EXECUTABLE_NAME);

    if local_exe.exists() {
        return Ok(local_exe);
    }

    // Check PATH
    if let Ok(output) = Command::new("tesseract").arg("--version").output() {
        if output.status.success() {
            return Ok(PathBuf::from("tesseract"));
        }
    }

    COMMON_PATHS
        .iter()
        .map(PathBuf::from)
        .find(|p| p.exists())
        .ok_or_else(|| anyhow!("Tesseract not found. Please install Tesseract-OCR."))
}

/// Finds a tessdata directory holding eng.traineddata, if any.
pub fn find_tessdata_dir() -> Option<PathBuf> {
    let local_tessdata = get_tesseract_dir().join("tessdata");

    if local_tessdata.join("eng.traineddata").exists() {
        return Some(local_tessdata);
    }

    // Check TESSDATA_PREFIX environment variable
    let prefix = PathBuf::from(std::env::var("TESSDATA_PREFIX").ok()?);
    [prefix.clone(), prefix.join("tessdata")]
        .into_iter()
        .find(|p| p.join("eng.traineddata").exists())
}
