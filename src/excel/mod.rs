//! Módulo `excel`: lectura y escritura de tablas.
//!
//! Submódulos:
//! - `io`: `Tabla` genérica y lectura de planillas (calamine) y CSV
//! - `alumnos`: nómina de alumnos
//! - `encuesta`: exportación de respuestas
//! - `referencial`: metas ("N referencial") y conteos por categoría
//! - `escritura`: resúmenes a `.xlsx` / `.csv`

pub mod io;
pub mod alumnos;
pub mod encuesta;
pub mod referencial;
pub mod escritura;

pub use io::{Tabla, leer_tabla, leer_tabla_desde_bytes, leer_csv_bytes, normalize_header, normalize_name};
pub use alumnos::{leer_alumnos, alumnos_desde_tabla};
pub use encuesta::{leer_encuesta, respuestas_desde_tabla, normalizar_columna_identificador};
pub use referencial::{leer_metas, leer_conteos, MetasReferenciales, ConteosCategoria, ConteoCategoria};
pub use escritura::{escribir_resumen, escribir_tabla, filas_resumen, Celda};

use anyhow::{Result, anyhow};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::debug;

use crate::config::ENV_DATAFILES_DIR;

/// Extensiones que se consideran tablas de entrada
const EXTENSIONES_TABLA: &[&str] = &["xlsx", "xls", "xlsm", "ods", "csv"];

/// Directorio de datos: `ENCUESTA_DATAFILES_DIR` si existe, si no
/// `./datafiles` o `./data` desde el directorio de trabajo.
pub fn get_datafiles_dir() -> PathBuf {
    if let Ok(path) = std::env::var(ENV_DATAFILES_DIR) {
        let p = PathBuf::from(path);
        if p.is_dir() {
            debug!("usando {}: {:?}", ENV_DATAFILES_DIR, p);
            return p;
        }
    }

    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    for candidate in [cwd.join("datafiles"), cwd.join("data")] {
        if candidate.is_dir() {
            debug!("datafiles encontrados en {:?}", candidate);
            return candidate;
        }
    }
    cwd.join("datafiles")
}

/// Resuelve un archivo de entrada: la ruta tal cual si existe, si no
/// relativa al directorio de datos.
pub fn resolver_archivo(nombre: &Path) -> Result<PathBuf> {
    resolver_archivo_en(nombre, &get_datafiles_dir())
}

pub fn resolver_archivo_en(nombre: &Path, data_dir: &Path) -> Result<PathBuf> {
    if nombre.is_file() {
        return Ok(nombre.to_path_buf());
    }
    let candidate = data_dir.join(nombre);
    if candidate.is_file() {
        return Ok(candidate);
    }
    Err(anyhow!(
        "archivo '{}' no encontrado ni en el directorio actual ni en {:?}",
        nombre.display(),
        data_dir
    ))
}

/// Devuelve la tabla más reciente de `dir` cuyo nombre contenga alguna de
/// las `keywords` (sin distinguir mayúsculas). Ignora archivos ocultos y
/// temporales de editores (`~$...`, `.~...`, `...~`).
pub fn latest_file_matching(dir: &Path, keywords: &[&str]) -> Option<PathBuf> {
    let read = fs::read_dir(dir).ok()?;

    let mut best: Option<(SystemTime, PathBuf)> = None;
    for entry in read.flatten() {
        let p = entry.path();
        if !p.is_file() {
            continue;
        }
        let Some(name_raw) = p.file_name().and_then(|s| s.to_str()) else {
            continue;
        };
        if name_raw.starts_with('.') || name_raw.starts_with('~') || name_raw.ends_with('~') {
            continue;
        }
        let ext_ok = p
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| EXTENSIONES_TABLA.contains(&e.to_lowercase().as_str()));
        if !ext_ok {
            continue;
        }

        let name = name_raw.to_lowercase();
        if !keywords.iter().any(|kw| name.contains(&kw.to_lowercase())) {
            continue;
        }
        let Ok(modified) = entry.metadata().and_then(|m| m.modified()) else {
            continue;
        };
        // empate en fecha: gana el nombre mayor para que el resultado sea estable
        let mejor = match &best {
            None => true,
            Some((t, bp)) => modified > *t || (modified == *t && p > *bp),
        };
        if mejor {
            best = Some((modified, p));
        }
    }
    best.map(|(_, p)| p)
}

/// Palabras clave con que se buscan las entradas cuando no se indican.
pub const KEYWORDS_ALUMNOS: &[&str] = &["alumnos", "nomina", "matricula"];
pub const KEYWORDS_ENCUESTA: &[&str] = &["encuesta", "respuestas"];
